use rust_decimal::Decimal;

use crate::ingestion::coerce::{to_decimal, to_iso_date};
use crate::ingestion::normalize::Normalizer;
use crate::ingestion::row_accessor::HeaderMap;
use crate::ingestion::sheet::{SourceError, Table};
use crate::models::{TradeType, Transaction};

pub(crate) const SYMBOL: &[&str] = &["symbol", "ticker"];
pub(crate) const NAME: &[&str] = &["name", "company name"];
const PRICE: &[&str] = &["price"];
const SHARES: &[&str] = &["shares", "qty", "quantity"];
const EPS: &[&str] = &["eps"];
const DATE: &[&str] = &["date"];
const PLATFORM: &[&str] = &["platform", "broker"];
const AMOUNT: &[&str] = &["amount", "total"];

/// One transaction per row with a symbol. Negative share counts are sells.
pub fn build_transactions(table: &Table, normalizer: &Normalizer) -> Result<Vec<Transaction>, SourceError> {
    let header = HeaderMap::from_header_row(table.header()?);

    let records = table
        .data_rows()
        .iter()
        .filter_map(|row| {
            let symbol = header.cell(row, SYMBOL).as_text()?.to_uppercase();
            let shares_raw = to_decimal(header.cell(row, SHARES), Some(Decimal::ZERO)).unwrap_or_default();

            Some(Transaction {
                symbol,
                name: header.cell(row, NAME).as_text().unwrap_or_default(),
                trade_type: TradeType::from_signed_shares(shares_raw),
                price: to_decimal(header.cell(row, PRICE), Some(Decimal::ZERO)).unwrap_or_default(),
                shares: shares_raw.abs(),
                amount: to_decimal(header.cell(row, AMOUNT), Some(Decimal::ZERO)).unwrap_or_default(),
                eps: to_decimal(header.cell(row, EPS), None),
                date: to_iso_date(header.cell(row, DATE)),
                platform: normalizer.platform(header.cell(row, PLATFORM)),
            })
        })
        .collect();

    Ok(records)
}
