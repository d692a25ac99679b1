use serde::{Deserialize, Serialize};

/// Row for the settings table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Setting {
    pub key: String,
    pub value: String,
    pub description: String,
}

impl Setting {
    fn new(key: &str, value: &str, description: &str) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            description: description.into(),
        }
    }

    /// Settings written on first migration.
    pub fn defaults() -> Vec<Setting> {
        vec![
            Setting::new("dividend_income_goal", "5000", "Annual dividend income target in GBP"),
            Setting::new("salary", "45000", "Annual salary for UK tax calculations"),
            Setting::new("tax_year", "2024-25", "Current tax year"),
            Setting::new("default_currency", "GBP", "Display currency"),
        ]
    }
}
