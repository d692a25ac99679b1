pub mod deposit_backfill;
pub mod migration;
pub mod options_reimport;

pub use deposit_backfill::{run_deposit_backfill, BackfillOptions, BackfillSummary};
pub use migration::{run_migration, ImportMode, MigrationOptions, MigrationSummary};
pub use options_reimport::{run_options_reimport, ReimportSummary};
