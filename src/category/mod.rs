//! Category classification for enriched records
//!
//! A record's category is derived from its nested `department` object by an
//! ordered rule list: the department-id table first, then the keyword rules in
//! their configured order, then a synthesized fallback label.

mod rules;

pub use rules::{fallback_label, CategoryRule, Department};

use crate::config::CategoryConfig;
use crate::record::JsonObject;

/// Resolves department sub-objects to category labels
#[derive(Debug, Clone, Default)]
pub struct CategoryResolver {
    rules: Vec<CategoryRule>,
}

impl CategoryResolver {
    /// Creates a resolver that evaluates `rules` in the given order
    pub fn new(rules: Vec<CategoryRule>) -> Self {
        Self { rules }
    }

    /// Builds the two-tier resolver from configuration
    ///
    /// All id rules are placed ahead of all keyword rules, whatever order the
    /// configuration lists them in; keyword rules keep their configured order.
    pub fn from_config(config: &CategoryConfig) -> Self {
        let id_rules = config
            .department_ids
            .iter()
            .map(|entry| CategoryRule::department_id(entry.id, entry.category.clone()));
        let keyword_rules = config
            .keyword_rules
            .iter()
            .map(|rule| CategoryRule::keyword(&rule.keyword, rule.category.clone()));

        Self::new(id_rules.chain(keyword_rules).collect())
    }

    pub fn rules(&self) -> &[CategoryRule] {
        &self.rules
    }

    /// Resolves a department to a category label
    ///
    /// The first matching rule wins; if none matches, the fallback label
    /// embeds the raw department id and name.
    pub fn resolve(&self, department: &Department) -> String {
        self.rules
            .iter()
            .find_map(|rule| rule.apply(department))
            .map(str::to_string)
            .unwrap_or_else(|| fallback_label(department))
    }

    /// Resolves the category of a record, or `None` when it has no
    /// `department` object
    pub fn resolve_record(&self, fields: &JsonObject) -> Option<String> {
        Department::from_record(fields).map(|department| self.resolve(&department))
    }
}
