use serde::{Deserialize, Serialize};

/// Row for the symbols table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Symbol {
    pub symbol: String,
    pub name: String,
    pub sector: Option<String>,
    pub strategy: Option<String>,
}
