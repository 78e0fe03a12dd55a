use crate::record::JsonObject;
use serde_json::Value;

/// The `department` sub-object of a product record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Department {
    pub id: Option<u64>,
    pub name: String,
}

impl Department {
    /// Reads the nested `department` object of a record, if any
    ///
    /// Ids may arrive as numbers or numeric strings.
    pub fn from_record(fields: &JsonObject) -> Option<Self> {
        let department = fields.get("department")?.as_object()?;

        let id = match department.get("id") {
            Some(Value::Number(n)) => n.as_u64(),
            Some(Value::String(s)) => s.trim().parse().ok(),
            _ => None,
        };
        let name = department
            .get("name")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        Some(Self { id, name })
    }
}

/// One predicate → label rule
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CategoryRule {
    /// Matches a department by exact id
    DepartmentId { id: u64, category: String },

    /// Matches when the lower-cased department name contains `keyword`
    Keyword { keyword: String, category: String },
}

impl CategoryRule {
    pub fn department_id(id: u64, category: impl Into<String>) -> Self {
        Self::DepartmentId {
            id,
            category: category.into(),
        }
    }

    /// Keywords are stored lower-cased so matching is case-insensitive
    pub fn keyword(keyword: &str, category: impl Into<String>) -> Self {
        Self::Keyword {
            keyword: keyword.trim().to_lowercase(),
            category: category.into(),
        }
    }

    /// Returns the rule's label when the department satisfies its predicate
    pub fn apply(&self, department: &Department) -> Option<&str> {
        match self {
            Self::DepartmentId { id, category } => {
                (department.id == Some(*id)).then_some(category.as_str())
            }
            Self::Keyword { keyword, category } => department
                .name
                .to_lowercase()
                .contains(keyword.as_str())
                .then_some(category.as_str()),
        }
    }
}

/// Label used when no rule matches
pub fn fallback_label(department: &Department) -> String {
    let id = department
        .id
        .map(|id| id.to_string())
        .unwrap_or_else(|| "?".to_string());
    format!("Ukategoriseret (department {}: {})", id, department.name)
}
