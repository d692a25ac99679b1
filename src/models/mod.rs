pub mod deposit;
pub mod option_position;
pub mod setting;
pub mod snapshot;
pub mod symbol;
pub mod transaction;

pub use deposit::Deposit;
pub use option_position::OptionPosition;
pub use setting::Setting;
pub use snapshot::MonthlySnapshot;
pub use symbol::Symbol;
pub use transaction::Transaction;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// TradeType
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TradeType {
    Buy,
    Sell,
}

impl TradeType {
    /// Sheets record sells as negative share counts.
    pub fn from_signed_shares(shares: Decimal) -> Self {
        if shares.is_sign_negative() && !shares.is_zero() {
            TradeType::Sell
        } else {
            TradeType::Buy
        }
    }
}

impl fmt::Display for TradeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TradeType::Buy => write!(f, "Buy"),
            TradeType::Sell => write!(f, "Sell"),
        }
    }
}
