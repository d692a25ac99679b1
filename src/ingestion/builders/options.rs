use crate::ingestion::coerce::{duration_to_days, to_decimal, to_int, to_iso_date};
use crate::ingestion::normalize::{self, Normalizer};
use crate::ingestion::row_accessor::HeaderMap;
use crate::ingestion::sheet::{SourceError, Table};
use crate::models::OptionPosition;

/// Broker for option rows when the table has no platform column.
pub const DEFAULT_OPTIONS_PLATFORM: &str = "IBKR";

pub(crate) const TICKER: &[&str] = &["ticker", "symbol"];

/// Build option positions from either options table.
///
/// The Wheel table carries outer strike, collateral and notes columns; the
/// LEAPS table does not. Absent columns simply come through as `None`.
pub fn build_options(table: &Table, normalizer: &Normalizer) -> Result<Vec<OptionPosition>, SourceError> {
    let h = HeaderMap::from_header_row(table.header()?);

    let records = table
        .data_rows()
        .iter()
        .filter_map(|row| {
            let ticker = h.cell(row, TICKER).as_text()?.to_uppercase();
            let outer_strike = to_decimal(h.cell(row, &["outer strike"]), None);

            Some(OptionPosition {
                ticker,
                opened: to_iso_date(h.cell(row, &["opened"])),
                strategy_type: normalizer.strategy(h.cell(row, &["strategy"]), outer_strike),
                call_put: normalize::call_put(h.cell(row, &["c / p", "c/p"])),
                buy_sell: normalize::buy_sell(h.cell(row, &["buy/sell", "buy / sell"])),
                expiration: to_iso_date(h.cell(row, &["expiration"])),
                strike: to_decimal(h.cell(row, &["strike"]), None),
                delta: to_decimal(h.cell(row, &["greeks (delta)", "delta"]), None),
                iv_pct: to_decimal(h.cell(row, &["greeks (iv%)", "iv%"]), None),
                moneyness: normalize::moneyness(h.cell(row, &["moneyness"])),
                qty: to_int(h.cell(row, &["qty"]), None),
                premium: to_decimal(h.cell(row, &["premium"]), None),
                collateral: to_decimal(h.cell(row, &["collateral"]), None),
                status: normalizer.status(h.cell(row, &["status"])),
                close_date: to_iso_date(h.cell(row, &["date closed"])),
                close_premium: to_decimal(h.cell(row, &["closing cost"]), None),
                profit: to_decimal(h.cell(row, &["profit"]), None),
                days_held: duration_to_days(h.cell(row, &["days held"])),
                return_pct: to_decimal(h.cell(row, &["return", "profit yield"]), None),
                annualised_return_pct: to_decimal(h.cell(row, &["annualised return", "annualized return"]), None),
                outer_strike,
                commission: to_decimal(h.cell(row, &["commision", "commission"]), None),
                platform: normalizer
                    .platform(h.cell(row, &["platform"]))
                    .unwrap_or_else(|| DEFAULT_OPTIONS_PLATFORM.to_string()),
                notes: h.cell(row, &["notes"]).as_text(),
            })
        })
        .collect();

    Ok(records)
}
