use rust_decimal::Decimal;

use crate::ingestion::coerce::{to_decimal, to_iso_date};
use crate::ingestion::row_accessor::HeaderMap;
use crate::ingestion::sheet::{Cell, SourceError, Table};
use crate::models::MonthlySnapshot;

const MONTH: &[&str] = &["month"];
const INVESTED: &[&str] = &["invested so far", "total invested", "invested"];
const PORTFOLIO_VALUE: &[&str] = &["portfolio value"];
const GAIN_LOSS: &[&str] = &["gain/loss", "gain / loss"];
const DIVIDEND: &[&str] = &["dividend", "dividends", "dividend income"];
const OPTIONS_CAPITAL: &[&str] = &["options capital", "options capital gains"];
const PREMIUM: &[&str] = &["premium", "options premium"];

/// One snapshot per month row; summary rows without a date are dropped.
pub fn build_snapshots(table: &Table) -> Result<Vec<MonthlySnapshot>, SourceError> {
    let h = HeaderMap::from_header_row(table.header()?);
    let zero = Some(Decimal::ZERO);
    let money = |row: &[Cell], names: &[&str]| to_decimal(h.cell(row, names), zero).unwrap_or_default();

    let mut snapshots = Vec::new();
    for row in table.data_rows() {
        // The month column is usually unlabelled; fall back to the first column.
        let month_cell = h.get(row, MONTH).or_else(|| row.first());
        let Some(month) = month_cell.and_then(to_iso_date) else {
            continue;
        };

        let total_invested = money(row, INVESTED);
        let gain_loss = money(row, GAIN_LOSS);

        snapshots.push(MonthlySnapshot {
            month,
            total_invested,
            portfolio_value: money(row, PORTFOLIO_VALUE),
            gain_loss,
            gain_loss_pct: MonthlySnapshot::gain_loss_pct(gain_loss, total_invested),
            dividend_income: money(row, DIVIDEND),
            options_premium: money(row, PREMIUM),
            options_capital_gains: money(row, OPTIONS_CAPITAL),
            total_deposits: total_invested,
        });
    }

    Ok(snapshots)
}
