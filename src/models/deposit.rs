use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Row for the deposits table: one platform's deposit for one month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Deposit {
    pub month: NaiveDate,
    pub amount: Decimal,
    pub platform: String,
    /// Filled in later by the FX backfill.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount_usd: Option<Decimal>,
}
