use std::time::Duration;

use chrono::{Local, NaiveDate};

use crate::backfill::{fetch_window, plan_backfill, BackfillPlan, SkipReason, StoredDeposit};
use crate::errors::AppError;
use crate::nocodb::TableStore;
use crate::sync::{self, UPDATE_BATCH_DELAY, UPDATE_BATCH_SIZE};
use crate::tiingo::RateSource;

#[derive(Debug, Clone)]
pub struct BackfillOptions {
    /// Without this the run only reports what would change.
    pub apply: bool,
    pub update_delay: Duration,
    /// End of the rate window.
    pub today: NaiveDate,
}

impl Default for BackfillOptions {
    fn default() -> Self {
        Self {
            apply: false,
            update_delay: UPDATE_BATCH_DELAY,
            today: Local::now().date_naive(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BackfillSummary {
    pub deposits: usize,
    pub window: Option<(NaiveDate, NaiveDate)>,
    pub rates_fetched: usize,
    pub plan: BackfillPlan,
    /// Records actually written; zero on a dry run.
    pub applied: usize,
}

/// Recompute `amount_usd` for every stored deposit from historical rates.
pub async fn run_deposit_backfill<S, R>(
    store: &S,
    rates: &R,
    table_id: &str,
    options: &BackfillOptions,
) -> Result<BackfillSummary, AppError>
where
    S: TableStore + ?Sized,
    R: RateSource + ?Sized,
{
    let mode = if options.apply { "apply" } else { "dry-run" };
    tracing::info!(mode, "Backfilling deposit amount_usd");

    let records = sync::fetch_all_records(store, table_id).await?;
    let deposits: Vec<StoredDeposit> = records
        .iter()
        .filter_map(|r| {
            let parsed = StoredDeposit::from_record(r);
            if parsed.is_none() {
                tracing::warn!("Skipping deposit record without an Id");
            }
            parsed
        })
        .collect();

    let mut summary = BackfillSummary {
        deposits: deposits.len(),
        ..Default::default()
    };
    tracing::info!(count = deposits.len(), "Loaded deposit records");

    let Some((start, end)) = fetch_window(&deposits, options.today) else {
        tracing::info!("No deposits with a month, nothing to backfill");
        return Ok(summary);
    };
    summary.window = Some((start, end));

    let table = rates.fetch_historical_rates(start, end).await?;
    summary.rates_fetched = table.len();

    let plan = plan_backfill(&deposits, &table);
    log_plan(&plan);

    if !options.apply {
        tracing::info!(pending = plan.updates.len(), "Dry run, no changes made. Pass --apply to write");
    } else if plan.updates.is_empty() {
        tracing::info!("No updates needed");
    } else {
        summary.applied = sync::bulk_update(
            store,
            table_id,
            &plan.update_records(),
            UPDATE_BATCH_SIZE,
            options.update_delay,
        )
        .await?;
    }

    tracing::info!(
        total_amount = %plan.total_amount,
        total_converted = %plan.total_converted,
        unconverted = plan.unconverted,
        "Deposit totals"
    );
    if plan.totals_overflowed {
        tracing::warn!("Deposit totals exceeded the decimal range and are incomplete");
    }
    summary.plan = plan;
    Ok(summary)
}

fn log_plan(plan: &BackfillPlan) {
    for (month, rate) in &plan.month_rates {
        match rate {
            Some(rate) => tracing::info!(month = %month, rate = %rate, "Rate"),
            None => tracing::warn!(month = %month, "No rate within lookback, deposits skipped"),
        }
    }
    tracing::info!(
        matched = plan.matched_months(),
        months = plan.month_rates.len(),
        "Rates matched"
    );

    for skip in &plan.skipped {
        let reason = match skip.reason {
            SkipReason::NoMonth => "no month",
            SkipReason::NoRate => "no rate",
            SkipReason::Overflow => "amount out of range",
        };
        tracing::info!(id = skip.id, reason, "Skipped deposit");
    }

    for update in &plan.updates {
        tracing::info!(
            id = update.id,
            month = %update.month,
            platform = update.platform.as_deref().unwrap_or("?"),
            amount = %update.amount,
            rate = %update.rate,
            amount_usd = %update.amount_usd,
            "Update"
        );
    }
    tracing::info!(
        updates = plan.updates.len(),
        unchanged = plan.unchanged,
        skipped = plan.skipped.len(),
        "Backfill plan"
    );
}
