use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Row for the monthly_snapshots table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlySnapshot {
    pub month: NaiveDate,
    pub total_invested: Decimal,
    pub portfolio_value: Decimal,
    pub gain_loss: Decimal,
    pub gain_loss_pct: Decimal,
    pub dividend_income: Decimal,
    pub options_premium: Decimal,
    pub options_capital_gains: Decimal,
    pub total_deposits: Decimal,
}

impl MonthlySnapshot {
    /// Gain/loss as a percentage of money invested, 0 when nothing is invested
    /// or the ratio does not fit in a `Decimal`.
    pub fn gain_loss_pct(gain_loss: Decimal, total_invested: Decimal) -> Decimal {
        if total_invested.is_zero() {
            return Decimal::ZERO;
        }
        let pct = gain_loss
            .checked_div(total_invested)
            .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED));
        match pct {
            Some(pct) => pct.round_dp(4),
            None => {
                tracing::warn!(
                    gain_loss = %gain_loss,
                    total_invested = %total_invested,
                    "Gain/loss percentage out of range, storing 0"
                );
                Decimal::ZERO
            }
        }
    }
}
