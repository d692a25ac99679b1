//! Idempotent, batched operations layered over a [`TableStore`].
//!
//! Every call here is sequential: one request in flight at a time.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::Serialize;
use serde_json::Value;

use crate::nocodb::types::{record_id, PageParams, Record, TableSchema, ID_FIELD};
use crate::nocodb::{StoreError, TableStore};

/// Page size for paginated reads.
pub const PAGE_SIZE: u32 = 200;
pub const INSERT_BATCH_SIZE: usize = 100;
pub const UPDATE_BATCH_SIZE: usize = 50;
pub const DELETE_BATCH_SIZE: usize = 100;
/// Pause between partial-update batches.
pub const UPDATE_BATCH_DELAY: Duration = Duration::from_millis(300);

// ---------------------------------------------------------------------------
// Tables
// ---------------------------------------------------------------------------

/// Create whichever tables are missing and return name → table id for all of
/// them. Existing tables are matched by title and reused untouched.
pub async fn ensure_tables<S: TableStore + ?Sized>(
    store: &S,
    schemas: &[TableSchema],
) -> Result<BTreeMap<String, String>, StoreError> {
    let existing: BTreeMap<String, String> = store
        .list_tables()
        .await?
        .into_iter()
        .map(|t| (t.title, t.id))
        .collect();

    let mut table_ids = BTreeMap::new();
    for schema in schemas {
        let name = &schema.table_name;
        if let Some(id) = existing.get(name) {
            tracing::info!(table = %name, id = %id, "Table already exists");
            table_ids.insert(name.clone(), id.clone());
        } else {
            let created = store.create_table(schema).await?;
            tracing::info!(table = %name, id = %created.id, "Created table");
            table_ids.insert(name.clone(), created.id);
        }
    }
    Ok(table_ids)
}

/// Total row count from a single one-row page.
pub async fn count_records<S: TableStore + ?Sized>(store: &S, table_id: &str) -> Result<u64, StoreError> {
    let page = store.get_records(table_id, &PageParams::new(1, 0)).await?;
    Ok(page
        .page_info
        .total_rows
        .unwrap_or(page.list.len() as u64))
}

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// Serialize domain records into store records.
pub fn to_records<T: Serialize>(items: &[T]) -> Result<Vec<Record>, StoreError> {
    items
        .iter()
        .map(|item| match serde_json::to_value(item)? {
            Value::Object(map) => Ok(map),
            other => Err(StoreError::Unexpected(format!("record is not an object: {other}"))),
        })
        .collect()
}

/// Every record in the table, following `offset` until the last page.
pub async fn fetch_all_records<S: TableStore + ?Sized>(
    store: &S,
    table_id: &str,
) -> Result<Vec<Record>, StoreError> {
    let mut records = Vec::new();
    let mut offset = 0;

    loop {
        let page = store.get_records(table_id, &PageParams::new(PAGE_SIZE, offset)).await?;
        let last = page.is_last();
        records.extend(page.list);
        if last {
            break;
        }
        offset += PAGE_SIZE;
    }

    tracing::debug!(table_id, count = records.len(), "Fetched records");
    Ok(records)
}

/// Insert in order, `batch_size` records per request. The first failing batch
/// aborts the run; earlier batches stay committed.
pub async fn bulk_insert<S: TableStore + ?Sized>(
    store: &S,
    table_id: &str,
    records: &[Record],
    batch_size: usize,
) -> Result<usize, StoreError> {
    if records.is_empty() {
        return Ok(0);
    }

    let batch_size = batch_size.max(1);
    let total_batches = records.len().div_ceil(batch_size);
    let mut inserted = 0;

    for (i, batch) in records.chunks(batch_size).enumerate() {
        store.insert_records(table_id, batch).await?;
        inserted += batch.len();
        tracing::info!(
            table_id,
            batch = i + 1,
            total_batches,
            inserted,
            "Inserted batch"
        );
    }
    Ok(inserted)
}

/// Serialize and insert with the default batch size.
pub async fn insert_all<S, T>(store: &S, table_id: &str, items: &[T]) -> Result<usize, StoreError>
where
    S: TableStore + ?Sized,
    T: Serialize,
{
    let records = to_records(items)?;
    bulk_insert(store, table_id, &records, INSERT_BATCH_SIZE).await
}

/// Partial updates in batches with a fixed pause between batches.
pub async fn bulk_update<S: TableStore + ?Sized>(
    store: &S,
    table_id: &str,
    updates: &[Record],
    batch_size: usize,
    delay: Duration,
) -> Result<usize, StoreError> {
    let batch_size = batch_size.max(1);
    let mut updated = 0;

    for (i, batch) in updates.chunks(batch_size).enumerate() {
        if i > 0 && !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        store.update_records(table_id, batch).await?;
        updated += batch.len();
        tracing::info!(table_id, updated, total = updates.len(), "Updated batch");
    }
    Ok(updated)
}

/// Drain a table: read the first page of ids, delete them, repeat until the
/// table comes back empty. Returns the number of records deleted.
pub async fn delete_all_records<S: TableStore + ?Sized>(store: &S, table_id: &str) -> Result<usize, StoreError> {
    let params = PageParams::new(PAGE_SIZE, 0).with_fields(&[ID_FIELD]);
    let mut deleted = 0;

    loop {
        let page = store.get_records(table_id, &params).await?;
        if page.list.is_empty() {
            break;
        }

        let ids: Vec<i64> = page.list.iter().filter_map(record_id).collect();
        if ids.is_empty() {
            return Err(StoreError::Unexpected(format!(
                "table {table_id} returned records without an {ID_FIELD} field"
            )));
        }

        for batch in ids.chunks(DELETE_BATCH_SIZE) {
            store.delete_records(table_id, batch).await?;
            deleted += batch.len();
        }
    }

    if deleted > 0 {
        tracing::info!(table_id, deleted, "Deleted records");
    }
    Ok(deleted)
}
