use serde_json::Value;

/// The comparable part of one `prices` entry
#[derive(Debug, Clone, PartialEq)]
pub struct PriceEntry {
    pub price: Option<f64>,
    pub is_advertised: bool,
    pub is_campaign: bool,
}

impl PriceEntry {
    /// Reads an entry leniently: numeric strings count as prices, and absent
    /// or non-boolean flags read as `false`.
    pub fn from_value(value: &Value) -> Self {
        let price = match value.get("price") {
            Some(Value::Number(n)) => n.as_f64(),
            Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
            _ => None,
        };

        Self {
            price,
            is_advertised: flag(value, "is_advertised"),
            is_campaign: flag(value, "is_campaign"),
        }
    }
}

fn flag(value: &Value, key: &str) -> bool {
    value.get(key).and_then(Value::as_bool).unwrap_or(false)
}

/// Compares two price lists position by position
///
/// Lists of different length always differ. Equal-length lists are zipped and
/// compared entry by entry; entries are never matched by any secondary key.
pub fn prices_differ(stored: &[PriceEntry], fresh: &[PriceEntry]) -> bool {
    stored.len() != fresh.len() || stored.iter().zip(fresh).any(|(a, b)| a != b)
}
