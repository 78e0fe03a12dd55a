use serde::Deserialize;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Main configuration structure for Catalog-Harvester
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub source: SourceConfig,
    #[serde(rename = "user-agent", default)]
    pub user_agent: UserAgentConfig,
    #[serde(default)]
    pub retry: RetryConfig,
    #[serde(default)]
    pub throttle: ThrottleConfig,
    #[serde(default)]
    pub pagination: PaginationConfig,
    #[serde(default)]
    pub categories: CategoryConfig,
    #[serde(default)]
    pub filter: FilterConfig,
    pub output: OutputConfig,
    #[serde(default)]
    pub import: Option<ImportConfig>,
}

/// Source API endpoints
#[derive(Debug, Clone, Deserialize)]
pub struct SourceConfig {
    /// Base URL of the retailer API (e.g., "https://api.example.com")
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Path of the paginated listing endpoint
    #[serde(rename = "list-path", default = "default_products_path")]
    pub list_path: String,

    /// Path prefix of the per-item detail endpoint; the item id is appended
    #[serde(rename = "detail-path", default = "default_products_path")]
    pub detail_path: String,

    /// Comma-separated `include` fields for listing requests
    #[serde(rename = "include-list", default)]
    pub include_list: Option<String>,

    /// Comma-separated `include` fields for detail requests
    #[serde(rename = "include-detail", default)]
    pub include_detail: Option<String>,

    /// Items requested per listing page
    #[serde(rename = "per-page", default = "default_per_page")]
    pub per_page: u32,

    /// Static credential sent as a bearer token
    #[serde(rename = "api-key", default)]
    pub api_key: Option<String>,
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    #[serde(rename = "harvester-name")]
    pub harvester_name: String,

    #[serde(rename = "harvester-version")]
    pub harvester_version: String,

    /// URL with information about the harvester
    #[serde(rename = "contact-url")]
    pub contact_url: String,

    #[serde(rename = "contact-email")]
    pub contact_email: String,
}

impl UserAgentConfig {
    /// Formats the header value: `Name/Version (+ContactURL; ContactEmail)`
    pub fn header_value(&self) -> String {
        format!(
            "{}/{} (+{}; {})",
            self.harvester_name, self.harvester_version, self.contact_url, self.contact_email
        )
    }
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            harvester_name: "CatalogHarvester".to_string(),
            harvester_version: env!("CARGO_PKG_VERSION").to_string(),
            contact_url: "https://example.com/catalog-harvester".to_string(),
            contact_email: "harvester@example.com".to_string(),
        }
    }
}

/// Retry and timeout behavior of the fetcher
#[derive(Debug, Clone, Deserialize)]
pub struct RetryConfig {
    /// Total attempts per request, across rate-limit and other failures
    #[serde(rename = "max-attempts", default = "default_max_attempts")]
    pub max_attempts: u32,

    #[serde(rename = "initial-backoff-ms", default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,

    #[serde(rename = "max-backoff-ms", default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,

    /// Per-request timeout (seconds)
    #[serde(rename = "timeout-secs", default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_backoff_ms: default_initial_backoff_ms(),
            max_backoff_ms: default_max_backoff_ms(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Fixed delays between requests (milliseconds)
#[derive(Debug, Clone, Deserialize)]
pub struct ThrottleConfig {
    #[serde(rename = "listing-delay-ms", default = "default_listing_delay_ms")]
    pub listing_delay_ms: u64,

    #[serde(rename = "detail-delay-ms", default = "default_detail_delay_ms")]
    pub detail_delay_ms: u64,

    #[serde(rename = "reconcile-delay-ms", default = "default_reconcile_delay_ms")]
    pub reconcile_delay_ms: u64,

    /// Per-item delay of the bookkeeping pass
    #[serde(rename = "tally-delay-ms", default = "default_tally_delay_ms")]
    pub tally_delay_ms: u64,
}

impl ThrottleConfig {
    pub fn listing_delay(&self) -> Duration {
        Duration::from_millis(self.listing_delay_ms)
    }

    pub fn detail_delay(&self) -> Duration {
        Duration::from_millis(self.detail_delay_ms)
    }

    pub fn reconcile_delay(&self) -> Duration {
        Duration::from_millis(self.reconcile_delay_ms)
    }

    pub fn tally_delay(&self) -> Duration {
        Duration::from_millis(self.tally_delay_ms)
    }
}

impl Default for ThrottleConfig {
    fn default() -> Self {
        Self {
            listing_delay_ms: default_listing_delay_ms(),
            detail_delay_ms: default_detail_delay_ms(),
            reconcile_delay_ms: default_reconcile_delay_ms(),
            tally_delay_ms: default_tally_delay_ms(),
        }
    }
}

/// Which pagination strategy a run commits to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StrategyKind {
    /// Page counter with `links.next` / `meta.total_pages` stop hints
    #[default]
    Link,
    /// Page counter fanned out over department-scoped queries
    Department,
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Link => write!(f, "link"),
            Self::Department => write!(f, "department"),
        }
    }
}

impl FromStr for StrategyKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "link" => Ok(Self::Link),
            "department" => Ok(Self::Department),
            other => Err(format!(
                "unknown pagination strategy '{}' (expected 'link' or 'department')",
                other
            )),
        }
    }
}

/// Pagination behavior
#[derive(Debug, Clone, Deserialize)]
pub struct PaginationConfig {
    #[serde(default)]
    pub strategy: StrategyKind,

    /// Page-index ceiling of the department walk
    #[serde(rename = "max-pages", default = "default_max_pages")]
    pub max_pages: u32,

    /// Departments per selectable batch
    #[serde(rename = "department-batch-size", default = "default_department_batch_size")]
    pub department_batch_size: usize,

    #[serde(rename = "department", default = "default_departments")]
    pub departments: Vec<DepartmentEntry>,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            strategy: StrategyKind::default(),
            max_pages: default_max_pages(),
            department_batch_size: default_department_batch_size(),
            departments: default_departments(),
        }
    }
}

/// A catalog department used for scoped listing queries
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DepartmentEntry {
    pub id: u64,
    pub name: String,
}

/// Category classification rules
#[derive(Debug, Clone, Deserialize)]
pub struct CategoryConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Direct department id → category table, tried first
    #[serde(rename = "department-id", default = "default_department_categories")]
    pub department_ids: Vec<DepartmentCategory>,

    /// Ordered keyword rules matched against the department name
    #[serde(rename = "keyword-rule", default = "default_keyword_rules")]
    pub keyword_rules: Vec<KeywordRule>,
}

impl Default for CategoryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            department_ids: default_department_categories(),
            keyword_rules: default_keyword_rules(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DepartmentCategory {
    pub id: u64,
    pub category: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct KeywordRule {
    pub keyword: String,
    pub category: String,
}

/// Non-food filter used by the `filter` utility
#[derive(Debug, Clone, Deserialize)]
pub struct FilterConfig {
    #[serde(rename = "non-food-keywords", default = "default_non_food_keywords")]
    pub non_food_keywords: Vec<String>,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            non_food_keywords: default_non_food_keywords(),
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Path of the JSON Lines record stream
    pub path: String,
}

/// Downstream import endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct ImportConfig {
    pub endpoint: String,

    #[serde(rename = "batch-size", default = "default_import_batch_size")]
    pub batch_size: usize,

    #[serde(rename = "api-key", default)]
    pub api_key: Option<String>,
}

fn default_products_path() -> String {
    "/api/v3/products".to_string()
}

fn default_per_page() -> u32 {
    100
}

fn default_max_attempts() -> u32 {
    6
}

fn default_initial_backoff_ms() -> u64 {
    1_000
}

fn default_max_backoff_ms() -> u64 {
    32_000
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_listing_delay_ms() -> u64 {
    250
}

fn default_detail_delay_ms() -> u64 {
    100
}

fn default_reconcile_delay_ms() -> u64 {
    50
}

fn default_tally_delay_ms() -> u64 {
    10
}

fn default_max_pages() -> u32 {
    50
}

fn default_department_batch_size() -> usize {
    2
}

fn default_import_batch_size() -> usize {
    50
}

fn default_true() -> bool {
    true
}

fn default_departments() -> Vec<DepartmentEntry> {
    [
        (1, "Frugt & Grønt"),
        (2, "Kød & Fisk"),
        (3, "Mejeriprodukter"),
        (4, "Brød & Kager"),
        (5, "Frost"),
        (6, "Drikkevarer"),
        (7, "Snacks & Slik"),
        (8, "Konserves"),
        (9, "Husholdning"),
    ]
    .into_iter()
    .map(|(id, name)| DepartmentEntry {
        id,
        name: name.to_string(),
    })
    .collect()
}

fn default_department_categories() -> Vec<DepartmentCategory> {
    [
        (50, "Færdigretter & takeaway"),
        (70, "Ost & mejeri"),
        (80, "Kolonial"),
        (81, "Frugt & grønt"),
        (82, "Kød, fisk & fjerkræ"),
        (83, "Mejeri"),
        (84, "Frost"),
        (85, "Brød & kager"),
        (86, "Drikkevarer"),
        (87, "Snacks & slik"),
        (88, "Husholdning & rengøring"),
        (89, "Baby & børn"),
        (90, "Kæledyr"),
        (100, "Husholdning & rengøring"),
        (120, "Personlig pleje"),
        (130, "Snacks & slik"),
    ]
    .into_iter()
    .map(|(id, category)| DepartmentCategory {
        id,
        category: category.to_string(),
    })
    .collect()
}

// "frost" must precede "ost", and "færdigret" must precede the meat rules.
fn default_keyword_rules() -> Vec<KeywordRule> {
    [
        ("færdigret", "Færdigretter & takeaway"),
        ("takeaway", "Færdigretter & takeaway"),
        ("frost", "Frost"),
        ("frugt", "Frugt & grønt"),
        ("grønt", "Frugt & grønt"),
        ("fjerkræ", "Kød, fisk & fjerkræ"),
        ("fisk", "Kød, fisk & fjerkræ"),
        ("kød", "Kød, fisk & fjerkræ"),
        ("ost", "Ost & mejeri"),
        ("mejeri", "Mejeri"),
        ("brød", "Brød & kager"),
        ("kage", "Brød & kager"),
        ("drikke", "Drikkevarer"),
        ("snack", "Snacks & slik"),
        ("slik", "Snacks & slik"),
        ("baby", "Baby & børn"),
        ("kæledyr", "Kæledyr"),
        ("rengøring", "Husholdning & rengøring"),
        ("husholdning", "Husholdning & rengøring"),
        ("pleje", "Personlig pleje"),
        ("kolonial", "Kolonial"),
    ]
    .into_iter()
    .map(|(keyword, category)| KeywordRule {
        keyword: keyword.to_string(),
        category: category.to_string(),
    })
    .collect()
}

fn default_non_food_keywords() -> Vec<String> {
    [
        // Clothing & accessories
        "STRØMPE",
        "HANDSKE",
        "HUE",
        "T-SHIRT",
        "UNDERTØJ",
        "BOXER",
        "TRUSSE",
        "ANKELSOKKER",
        "GOLFSOK",
        "SNEAKER",
        // Household
        "LÆSEBRILLER",
        "PARAPLY",
        "INSEKTGEL",
        "REGN PONCHO",
        "KONDITORFARVE",
        "BAGEENZYM",
        // Supplements
        "VITAMIN",
        "FISKEOLIE",
        "MAGNESIUM",
        "D3-DRÅBER",
        "HALSTABLETTER",
        "GRAVIDITETSTEST",
        "BRUSETABLETTER",
        // Tools
        "SKOHORN",
        "KINASKO",
    ]
    .into_iter()
    .map(str::to_string)
    .collect()
}
