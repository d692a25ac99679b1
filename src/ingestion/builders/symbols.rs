use std::collections::{BTreeMap, HashMap};

use crate::ingestion::normalize::Normalizer;
use crate::ingestion::row_accessor::HeaderMap;
use crate::ingestion::sheet::{SourceError, Table};
use crate::models::Symbol;

use super::options::TICKER;
use super::transactions::{NAME, SYMBOL};

/// Company details from the portfolio reference table, keyed by ticker.
#[derive(Debug, Clone, Default)]
pub struct SymbolReference {
    names: HashMap<String, String>,
    sectors: HashMap<String, String>,
    strategies: HashMap<String, String>,
}

impl SymbolReference {
    pub fn from_table(table: &Table, normalizer: &Normalizer) -> Result<Self, SourceError> {
        let h = HeaderMap::from_header_row(table.header()?);
        let mut reference = Self::default();

        for row in table.data_rows() {
            let Some(symbol) = h.cell(row, SYMBOL).as_text() else {
                continue;
            };
            let symbol = symbol.to_uppercase();

            if let Some(name) = h.cell(row, &["company name", "name"]).as_text() {
                reference.names.insert(symbol.clone(), name);
            }

            let raw_sector = h.cell(row, &["sector"]);
            match normalizer.sector(raw_sector) {
                Some(sector) => {
                    reference.sectors.insert(symbol.clone(), sector);
                }
                None if !raw_sector.is_empty() => {
                    tracing::warn!(symbol = %symbol, sector = %raw_sector, "Unknown sector, leaving blank");
                }
                None => {}
            }

            let raw_strategy = h.cell(row, &["strategy"]);
            match normalizer.symbol_strategy(raw_strategy) {
                Some(strategy) => {
                    reference.strategies.insert(symbol, strategy);
                }
                None if !raw_strategy.is_empty() => {
                    tracing::warn!(symbol = %symbol, strategy = %raw_strategy, "Unknown strategy, leaving blank");
                }
                None => {}
            }
        }

        Ok(reference)
    }
}

/// Unique tickers across transactions and both option tables, sorted.
pub fn build_symbols(
    transactions: &Table,
    option_tables: &[&Table],
    reference: &SymbolReference,
) -> Result<Vec<Symbol>, SourceError> {
    let mut names: BTreeMap<String, String> = BTreeMap::new();

    let tx = HeaderMap::from_header_row(transactions.header()?);
    for row in transactions.data_rows() {
        let Some(symbol) = tx.cell(row, SYMBOL).as_text() else {
            continue;
        };
        let name = tx.cell(row, NAME).as_text().unwrap_or_default();
        let entry = names.entry(symbol.to_uppercase()).or_default();
        if entry.is_empty() {
            *entry = name;
        }
    }

    for table in option_tables {
        let h = HeaderMap::from_header_row(table.header()?);
        for row in table.data_rows() {
            if let Some(ticker) = h.cell(row, TICKER).as_text() {
                names.entry(ticker.to_uppercase()).or_default();
            }
        }
    }

    let symbols = names
        .into_iter()
        .map(|(symbol, name)| {
            let name = if name.is_empty() {
                reference.names.get(&symbol).cloned().unwrap_or_default()
            } else {
                name
            };
            Symbol {
                name,
                sector: reference.sectors.get(&symbol).cloned(),
                strategy: reference.strategies.get(&symbol).cloned(),
                symbol,
            }
        })
        .collect();

    Ok(symbols)
}
