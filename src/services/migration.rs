use std::collections::BTreeMap;
use std::time::Duration;

use crate::errors::AppError;
use crate::ingestion::{extract_all, Normalizer, SheetSource, SourceLayout};
use crate::models::Setting;
use crate::nocodb::schemas::{self, table_schemas};
use crate::nocodb::TableStore;
use crate::sync;

/// What to do when the target tables already hold records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportMode {
    /// Insert alongside the existing records (duplicates possible).
    Append,
    /// Delete every record in every managed table first.
    Replace,
}

#[derive(Debug, Clone)]
pub struct MigrationOptions {
    /// `None` refuses to write into populated tables.
    pub mode: Option<ImportMode>,
    /// Pause before appending to populated tables, so the run can be cancelled.
    pub cancel_window: Duration,
}

impl Default for MigrationOptions {
    fn default() -> Self {
        Self {
            mode: None,
            cancel_window: Duration::from_secs(3),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MigrationSummary {
    pub table_ids: BTreeMap<String, String>,
    pub purged: usize,
    pub symbols: usize,
    pub transactions: usize,
    pub deposits: usize,
    pub deposit_months: usize,
    pub options_wheel: usize,
    pub options_leaps: usize,
    pub snapshots: usize,
    pub settings: usize,
}

impl MigrationSummary {
    pub fn options_total(&self) -> usize {
        self.options_wheel + self.options_leaps
    }
}

fn table_id<'a>(table_ids: &'a BTreeMap<String, String>, name: &str) -> Result<&'a str, AppError> {
    table_ids
        .get(name)
        .map(String::as_str)
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("table '{name}' was not ensured")))
}

/// Tables that already contain at least one record.
async fn populated_tables<S: TableStore + ?Sized>(
    store: &S,
    table_ids: &BTreeMap<String, String>,
) -> Result<Vec<String>, AppError> {
    let mut populated = Vec::new();
    for (name, id) in table_ids {
        let count = sync::count_records(store, id).await?;
        if count > 0 {
            tracing::warn!(table = %name, count, "Table already has records");
            populated.push(name.clone());
        }
    }
    Ok(populated)
}

/// Full spreadsheet → store migration.
///
/// Every source table is read and normalized before the first request, so a
/// malformed workbook fails without touching the store.
pub async fn run_migration<S, Src>(
    store: &S,
    source: &Src,
    layout: &SourceLayout,
    normalizer: &Normalizer,
    options: &MigrationOptions,
) -> Result<MigrationSummary, AppError>
where
    S: TableStore + ?Sized,
    Src: SheetSource + ?Sized,
{
    let extraction = extract_all(source, layout, normalizer)?;

    tracing::info!("Ensuring tables exist");
    let table_ids = sync::ensure_tables(store, &table_schemas()).await?;

    let mut summary = MigrationSummary::default();

    match options.mode {
        Some(ImportMode::Replace) => {
            tracing::info!("Replace mode: clearing existing records");
            for (name, id) in &table_ids {
                let deleted = sync::delete_all_records(store, id).await?;
                if deleted > 0 {
                    tracing::info!(table = %name, deleted, "Cleared table");
                }
                summary.purged += deleted;
            }
        }
        mode => {
            let populated = populated_tables(store, &table_ids).await?;
            if !populated.is_empty() {
                if mode.is_none() {
                    return Err(AppError::ExistingData { tables: populated });
                }
                tracing::warn!(
                    wait_secs = options.cancel_window.as_secs_f64(),
                    "Appending to populated tables, duplicates are possible. Press Ctrl+C to abort"
                );
                tokio::time::sleep(options.cancel_window).await;
            }
        }
    }

    summary.symbols = sync::insert_all(store, table_id(&table_ids, schemas::SYMBOLS)?, &extraction.symbols).await?;
    summary.transactions =
        sync::insert_all(store, table_id(&table_ids, schemas::TRANSACTIONS)?, &extraction.transactions).await?;
    summary.deposits = sync::insert_all(store, table_id(&table_ids, schemas::DEPOSITS)?, &extraction.deposits).await?;
    summary.deposit_months = extraction.deposit_months;

    sync::insert_all(store, table_id(&table_ids, schemas::OPTIONS)?, &extraction.options.records).await?;
    summary.options_wheel = extraction.options.wheel;
    summary.options_leaps = extraction.options.leaps;

    summary.snapshots =
        sync::insert_all(store, table_id(&table_ids, schemas::MONTHLY_SNAPSHOTS)?, &extraction.snapshots).await?;
    summary.settings = sync::insert_all(store, table_id(&table_ids, schemas::SETTINGS)?, &Setting::defaults()).await?;

    summary.table_ids = table_ids;
    log_summary(&summary);
    Ok(summary)
}

fn log_summary(summary: &MigrationSummary) {
    tracing::info!(
        symbols = summary.symbols,
        transactions = summary.transactions,
        options_wheel = summary.options_wheel,
        options_leaps = summary.options_leaps,
        options_total = summary.options_total(),
        deposits = summary.deposits,
        deposit_months = summary.deposit_months,
        snapshots = summary.snapshots,
        settings = summary.settings,
        "Migration complete"
    );
    for (name, id) in &summary.table_ids {
        tracing::info!(table = %name, id = %id, "Table id");
    }
}
