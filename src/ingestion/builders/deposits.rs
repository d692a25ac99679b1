use crate::ingestion::coerce::{to_decimal, to_iso_date};
use crate::ingestion::normalize::Normalizer;
use crate::ingestion::sheet::{Cell, Table};
use crate::models::Deposit;

/// Column holding the month in the wide deposits table.
const MONTH_COLUMN: usize = 0;

/// Platform label → column index in the wide deposits table.
/// Layout: Month, Total, IBKR, (blank), Trading 212, Freetrade, Stake, Etoro, Hood.
pub const DEPOSIT_COLUMNS: &[(&str, usize)] = &[
    ("IBKR", 2),
    ("Trading 212", 4),
    ("Freetrade", 5),
    ("Stake", 6),
    ("Etoro", 7),
    ("Hood", 8),
];

#[derive(Debug, Clone, Default)]
pub struct DepositExtract {
    pub records: Vec<Deposit>,
    /// Source rows with a parseable month.
    pub months: usize,
}

/// Unpivot one row per month into one record per platform with a non-zero amount.
pub fn build_deposits(table: &Table, normalizer: &Normalizer, columns: &[(&str, usize)]) -> DepositExtract {
    let mut extract = DepositExtract::default();

    for row in table.data_rows() {
        let Some(month) = row.get(MONTH_COLUMN).and_then(to_iso_date) else {
            continue;
        };
        extract.months += 1;

        for (label, idx) in columns {
            let Some(amount) = row.get(*idx).and_then(|c| to_decimal(c, None)) else {
                continue;
            };
            if amount.is_zero() {
                continue;
            }
            let platform = normalizer
                .platform(&Cell::text(*label))
                .unwrap_or_else(|| label.to_string());

            extract.records.push(Deposit {
                month,
                amount,
                platform,
                amount_usd: None,
            });
        }
    }

    extract
}
