pub mod client;
pub mod schemas;
pub mod store;
pub mod types;

pub use client::NocoClient;
pub use schemas::table_schemas;
pub use store::{StoreError, TableStore};
pub use types::{record_id, ColumnDef, ColumnType, PageParams, Record, RecordPage, TableMeta, TableSchema, ID_FIELD};
