use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::TradeType;

/// Row for the transactions table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub symbol: String,
    pub name: String,
    #[serde(rename = "type")]
    pub trade_type: TradeType,
    pub price: Decimal,
    /// Always non-negative; direction lives in `trade_type`.
    pub shares: Decimal,
    pub amount: Decimal,
    pub eps: Option<Decimal>,
    pub date: Option<NaiveDate>,
    pub platform: Option<String>,
}
