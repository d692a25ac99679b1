use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use folio_sync::config::AppConfig;
use folio_sync::errors::{AppError, EXIT_INTERRUPTED};
use folio_sync::ingestion::{JsonWorkbook, Normalizer, SourceLayout};
use folio_sync::nocodb::NocoClient;
use folio_sync::services::{
    run_deposit_backfill, run_migration, run_options_reimport, BackfillOptions, ImportMode, MigrationOptions,
};
use folio_sync::tiingo::TiingoClient;

#[derive(Debug, Parser)]
#[command(name = "folio-sync", version, about = "Sync a portfolio workbook into NocoDB and backfill FX-converted deposits")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Create the tables if needed and import every workbook table.
    Migrate {
        /// Workbook JSON export (defaults to SPREADSHEET_PATH).
        #[arg(long)]
        source: Option<PathBuf>,

        /// How to treat tables that already hold records.
        #[arg(long, value_enum)]
        mode: Option<ModeArg>,

        /// Shorthand for `--mode replace`.
        #[arg(long, conflicts_with = "mode")]
        clean: bool,
    },

    /// Clear the options table and import both option tables again.
    ReimportOptions {
        #[arg(long)]
        source: Option<PathBuf>,
    },

    /// Fill deposits.amount_usd from historical GBP/USD closes.
    BackfillDeposits {
        /// Write the updates. Without it the run is a dry run.
        #[arg(long)]
        apply: bool,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ModeArg {
    Append,
    Replace,
}

impl From<ModeArg> for ImportMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Append => ImportMode::Append,
            ModeArg::Replace => ImportMode::Replace,
        }
    }
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();

    let code = tokio::select! {
        result = run(cli) => match result {
            Ok(()) => 0,
            Err(e) => {
                tracing::error!(error = %e, "Run failed");
                e.exit_code()
            }
        },
        _ = tokio::signal::ctrl_c() => {
            tracing::warn!("{}", AppError::Interrupted);
            EXIT_INTERRUPTED
        }
    };

    std::process::exit(code);
}

async fn run(cli: Cli) -> Result<(), AppError> {
    let config = AppConfig::from_env()?;
    let http = http_client(&config)?;

    let store = NocoClient::new(http.clone(), &config.nocodb_base_url, config.nocodb_api_token.clone())
        .with_retry(config.store_retry.clone());
    let normalizer = Normalizer::default();
    let layout = SourceLayout::default();

    match cli.command {
        Command::Migrate { source, mode, clean } => {
            let store = store.with_base_id(config.require_base_id()?.to_string());
            let path = source.unwrap_or_else(|| config.spreadsheet_path.clone());
            tracing::info!(path = %path.display(), "Reading workbook");
            let workbook = JsonWorkbook::open(&path)?;

            let mode = match (mode, clean || config.clean) {
                (_, true) => Some(ImportMode::Replace),
                (Some(m), false) => Some(m.into()),
                (None, false) => None,
            };
            let options = MigrationOptions {
                mode,
                ..Default::default()
            };
            run_migration(&store, &workbook, &layout, &normalizer, &options).await?;
        }
        Command::ReimportOptions { source } => {
            let table_id = config.require_options_table()?;
            let path = source.unwrap_or_else(|| config.spreadsheet_path.clone());
            tracing::info!(path = %path.display(), "Reading workbook");
            let workbook = JsonWorkbook::open(&path)?;
            run_options_reimport(&store, &workbook, &layout, &normalizer, table_id).await?;
        }
        Command::BackfillDeposits { apply } => {
            let table_id = config.require_deposits_table()?;
            let rates = TiingoClient::new(http, config.require_tiingo_token()?.to_string())
                .with_base_url(&config.tiingo_base_url)
                .with_pair(&config.rate_pair)
                .with_retry(config.rate_retry.clone());
            let options = BackfillOptions {
                apply: apply || config.apply,
                update_delay: config.update_batch_delay,
                ..Default::default()
            };
            run_deposit_backfill(&store, &rates, table_id, &options).await?;
        }
    }

    Ok(())
}

fn http_client(config: &AppConfig) -> Result<reqwest::Client, AppError> {
    let mut builder = reqwest::Client::builder();
    if let Some(timeout) = config.http_timeout {
        builder = builder.timeout(timeout);
    }
    builder
        .build()
        .map_err(|e| AppError::Internal(anyhow::anyhow!("failed to build HTTP client: {e}")))
}

/// `RUST_LOG` filters (default `info`); `LOG_FORMAT=json` switches to JSON lines.
fn init_tracing() {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json = std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer()).init();
    }
}
