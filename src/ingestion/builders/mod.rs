pub mod deposits;
pub mod options;
pub mod snapshots;
pub mod symbols;
pub mod transactions;

pub use deposits::{build_deposits, DepositExtract, DEPOSIT_COLUMNS};
pub use options::build_options;
pub use snapshots::build_snapshots;
pub use symbols::{build_symbols, SymbolReference};
pub use transactions::build_transactions;

use crate::ingestion::normalize::Normalizer;
use crate::ingestion::sheet::{SheetSource, SourceError, Table};
use crate::models::{Deposit, MonthlySnapshot, OptionPosition, Symbol, Transaction};

/// Location of a table inside the workbook.
#[derive(Debug, Clone)]
pub struct TableRef {
    pub sheet: String,
    pub table: String,
}

impl TableRef {
    pub fn new(sheet: &str, table: &str) -> Self {
        Self {
            sheet: sheet.into(),
            table: table.into(),
        }
    }

    fn resolve<'s, S: SheetSource + ?Sized>(&self, source: &'s S) -> Result<&'s Table, SourceError> {
        source.table(&self.sheet, &self.table)
    }
}

/// Where each source table lives in the workbook.
#[derive(Debug, Clone)]
pub struct SourceLayout {
    pub reference: TableRef,
    pub transactions: TableRef,
    pub deposits: TableRef,
    pub monthly_tracker: TableRef,
    pub options_wheel: TableRef,
    pub options_leaps: TableRef,
}

impl Default for SourceLayout {
    fn default() -> Self {
        Self {
            reference: TableRef::new("Portfolio", "Table 1"),
            transactions: TableRef::new("Transactions", "Transactions"),
            deposits: TableRef::new("Transactions", "Deposited"),
            // Spelled this way in the workbook.
            monthly_tracker: TableRef::new("Transactions", "Montly Tracker"),
            options_wheel: TableRef::new("Options", "Options Wheel Strategy"),
            options_leaps: TableRef::new("Options", "Options LEAPS"),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct OptionsExtract {
    pub wheel: usize,
    pub leaps: usize,
    pub records: Vec<OptionPosition>,
}

/// Everything the migration writes, extracted before any network call.
#[derive(Debug, Clone, Default)]
pub struct Extraction {
    pub symbols: Vec<Symbol>,
    pub transactions: Vec<Transaction>,
    pub deposits: Vec<Deposit>,
    pub deposit_months: usize,
    pub options: OptionsExtract,
    pub snapshots: Vec<MonthlySnapshot>,
}

pub fn extract_options<S: SheetSource + ?Sized>(
    source: &S,
    layout: &SourceLayout,
    normalizer: &Normalizer,
) -> Result<OptionsExtract, SourceError> {
    let wheel = build_options(layout.options_wheel.resolve(source)?, normalizer)?;
    let leaps = build_options(layout.options_leaps.resolve(source)?, normalizer)?;

    tracing::info!(wheel = wheel.len(), leaps = leaps.len(), "Extracted option positions");

    let mut extract = OptionsExtract {
        wheel: wheel.len(),
        leaps: leaps.len(),
        records: wheel,
    };
    extract.records.extend(leaps);
    Ok(extract)
}

/// Read every source table. The portfolio reference table is optional;
/// all others are required.
pub fn extract_all<S: SheetSource + ?Sized>(
    source: &S,
    layout: &SourceLayout,
    normalizer: &Normalizer,
) -> Result<Extraction, SourceError> {
    let reference = match layout
        .reference
        .resolve(source)
        .and_then(|t| SymbolReference::from_table(t, normalizer))
    {
        Ok(r) => r,
        Err(e) => {
            tracing::warn!(error = %e, "Could not read symbol reference table, sectors left blank");
            SymbolReference::default()
        }
    };

    let tx_table = layout.transactions.resolve(source)?;
    let wheel_table = layout.options_wheel.resolve(source)?;
    let leaps_table = layout.options_leaps.resolve(source)?;

    let symbols = build_symbols(tx_table, &[wheel_table, leaps_table], &reference)?;
    tracing::info!(count = symbols.len(), "Extracted symbols");

    let transactions = build_transactions(tx_table, normalizer)?;
    tracing::info!(count = transactions.len(), "Extracted transactions");

    let deposits = build_deposits(layout.deposits.resolve(source)?, normalizer, DEPOSIT_COLUMNS);
    tracing::info!(
        count = deposits.records.len(),
        months = deposits.months,
        "Extracted deposits"
    );

    let options = extract_options(source, layout, normalizer)?;

    let snapshots = build_snapshots(layout.monthly_tracker.resolve(source)?)?;
    tracing::info!(count = snapshots.len(), "Extracted monthly snapshots");

    Ok(Extraction {
        symbols,
        transactions,
        deposits: deposits.records,
        deposit_months: deposits.months,
        options,
        snapshots,
    })
}
