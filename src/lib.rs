pub mod backfill;
pub mod config;
pub mod errors;
pub mod ingestion;
pub mod models;
pub mod nocodb;
pub mod retry;
pub mod services;
pub mod sync;
pub mod tiingo;
