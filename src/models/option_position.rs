use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Row for the options table. Columns a source table lacks stay `None`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct OptionPosition {
    pub ticker: String,
    pub opened: Option<NaiveDate>,
    pub strategy_type: String,
    pub call_put: Option<String>,
    pub buy_sell: Option<String>,
    pub expiration: Option<NaiveDate>,
    pub strike: Option<Decimal>,
    pub delta: Option<Decimal>,
    pub iv_pct: Option<Decimal>,
    pub moneyness: Option<String>,
    pub qty: Option<i64>,
    pub premium: Option<Decimal>,
    pub collateral: Option<Decimal>,
    pub status: Option<String>,
    pub close_date: Option<NaiveDate>,
    pub close_premium: Option<Decimal>,
    pub profit: Option<Decimal>,
    pub days_held: Option<i64>,
    pub return_pct: Option<Decimal>,
    pub annualised_return_pct: Option<Decimal>,
    pub outer_strike: Option<Decimal>,
    pub commission: Option<Decimal>,
    pub platform: String,
    pub notes: Option<String>,
}
