use std::collections::BTreeMap;

use crate::errors::AppError;
use crate::ingestion::{extract_options, Normalizer, SheetSource, SourceLayout};
use crate::nocodb::TableStore;
use crate::sync;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReimportSummary {
    pub wheel: usize,
    pub leaps: usize,
    pub deleted: usize,
    pub inserted: usize,
    /// Record count per normalized strategy.
    pub strategies: BTreeMap<String, usize>,
}

/// Replace the contents of the options table with a fresh extraction of
/// both option tables.
pub async fn run_options_reimport<S, Src>(
    store: &S,
    source: &Src,
    layout: &SourceLayout,
    normalizer: &Normalizer,
    table_id: &str,
) -> Result<ReimportSummary, AppError>
where
    S: TableStore + ?Sized,
    Src: SheetSource + ?Sized,
{
    let extract = extract_options(source, layout, normalizer)?;

    let mut strategies = BTreeMap::new();
    for record in &extract.records {
        *strategies.entry(record.strategy_type.clone()).or_insert(0) += 1;
    }

    let deleted = sync::delete_all_records(store, table_id).await?;
    tracing::info!(deleted, "Cleared existing option records");

    let inserted = sync::insert_all(store, table_id, &extract.records).await?;

    for (strategy, count) in &strategies {
        tracing::info!(strategy = %strategy, count, "Strategy breakdown");
    }
    tracing::info!(
        wheel = extract.wheel,
        leaps = extract.leaps,
        total = inserted,
        "Options re-import complete"
    );

    Ok(ReimportSummary {
        wheel: extract.wheel,
        leaps: extract.leaps,
        deleted,
        inserted,
        strategies,
    })
}
