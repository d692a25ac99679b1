use async_trait::async_trait;
use thiserror::Error;

use super::types::{PageParams, Record, RecordPage, TableMeta, TableSchema};
use crate::retry::HttpStatusError;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{method} {path} returned {status}: {body}")]
    Status {
        method: String,
        path: String,
        status: u16,
        body: String,
    },

    #[error("invalid record payload: {0}")]
    Payload(#[from] serde_json::Error),

    #[error("NOCODB_BASE_ID is required for table metadata calls")]
    MissingBaseId,

    #[error("unexpected response: {0}")]
    Unexpected(String),
}

impl HttpStatusError for StoreError {
    fn http_status(&self) -> Option<u16> {
        match self {
            StoreError::Status { status, .. } => Some(*status),
            StoreError::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

/// The table store's HTTP surface, one method per endpoint.
///
/// Higher-level operations (idempotent ensure, batching, paging) live in
/// [`crate::sync`] and only talk to the store through this trait.
#[async_trait]
pub trait TableStore: Send + Sync {
    async fn list_tables(&self) -> Result<Vec<TableMeta>, StoreError>;

    async fn create_table(&self, schema: &TableSchema) -> Result<TableMeta, StoreError>;

    async fn get_records(&self, table_id: &str, params: &PageParams) -> Result<RecordPage, StoreError>;

    async fn insert_records(&self, table_id: &str, records: &[Record]) -> Result<(), StoreError>;

    /// Partial update; every record must carry its `Id`.
    async fn update_records(&self, table_id: &str, records: &[Record]) -> Result<(), StoreError>;

    async fn delete_records(&self, table_id: &str, ids: &[i64]) -> Result<(), StoreError>;
}
