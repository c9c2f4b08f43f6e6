//! Batch entry point for the medstock import pipeline.
//!
//! Exit status reflects setup failures only (unreachable store, unreadable
//! file, missing identifying column). Row-level skips and failures are
//! reported in the printed summary and leave the exit status at zero.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use medstock_core::AppConfig;
use medstock_import::ColumnMap;

#[derive(Debug, Parser)]
#[command(name = "medstock-cli")]
#[command(about = "Catalog and order-history import tools for the medstock store")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Ensure the schema exists, optionally clearing all data first
    Init {
        /// Truncate every table before the next import. Irreversible.
        #[arg(long)]
        reset: bool,
    },
    /// Import a product catalog export (bulk upsert keyed on name)
    ImportProducts {
        /// Path to the catalog CSV file
        path: PathBuf,

        /// YAML file overriding the default column mapping
        #[arg(long)]
        columns: Option<PathBuf>,
    },
    /// Import an order-history export (per-row fault isolation)
    ImportOrders {
        /// Path to the order-history CSV file
        path: PathBuf,

        /// YAML file overriding the default column mapping
        #[arg(long)]
        columns: Option<PathBuf>,
    },
    /// Print row counts and a catalog sample
    Status,
    /// Database utilities
    Db {
        #[command(subcommand)]
        command: DbCommands,
    },
}

#[derive(Debug, Subcommand)]
enum DbCommands {
    /// Check store connectivity
    Ping,
}

/// Resolve the column mapping: an explicit `--columns` file wins, then the
/// configured path, then the built-in defaults.
fn load_columns(
    cli_override: Option<&Path>,
    config: &AppConfig,
) -> Result<ColumnMap, medstock_import::ImportError> {
    match cli_override.or(config.columns_path.as_deref()) {
        Some(path) => ColumnMap::from_yaml_file(path),
        None => Ok(ColumnMap::default()),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let config = medstock_core::load_app_config_from_env()?;

    let pool_config = medstock_db::PoolConfig {
        max_connections: config.db_max_connections,
        min_connections: config.db_min_connections,
        acquire_timeout_secs: config.db_acquire_timeout_secs,
    };
    let pool = medstock_db::connect_pool(&config.database_url, pool_config).await?;
    tracing::info!(env = %config.env, "connected to store");

    match cli.command {
        Commands::Init { reset } => {
            medstock_db::ensure_schema(&pool).await?;
            println!("schema ready");
            if reset {
                medstock_db::reset_data(&pool).await?;
                println!("all existing data cleared");
            }
        }
        Commands::ImportProducts { path, columns } => {
            let map = load_columns(columns.as_deref(), &config)?;
            let report = medstock_import::import_products(&pool, &path, &map).await?;
            println!(
                "catalog: {} of {} rows committed ({} skipped)",
                report.committed, report.rows, report.skipped
            );
        }
        Commands::ImportOrders { path, columns } => {
            let map = load_columns(columns.as_deref(), &config)?;
            let report = medstock_import::import_orders(&pool, &path, &map).await?;
            println!(
                "orders: {} of {} rows imported ({} failed, {} skipped)",
                report.succeeded, report.rows, report.failed, report.skipped
            );
        }
        Commands::Status => {
            let medicines = medstock_db::count_medicines(&pool).await?;
            let orders = medstock_db::count_orders(&pool).await?;
            let items = medstock_db::count_order_items(&pool).await?;
            println!("medicines:   {medicines}");
            println!("orders:      {orders}");
            println!("order items: {items}");

            let sample = medstock_db::list_medicine_summaries(&pool, 5).await?;
            if !sample.is_empty() {
                println!("sample catalog rows:");
                for m in sample {
                    println!(
                        "  {} [{}] {} packets x {} tablets = {} total @ {}",
                        m.name,
                        m.category.as_deref().unwrap_or("-"),
                        m.stock_packets,
                        m.tablets_per_packet,
                        m.total_tablets,
                        m.price_per_tablet
                    );
                }
            }
        }
        Commands::Db { command } => match command {
            DbCommands::Ping => {
                medstock_db::health_check(&pool).await?;
                println!("store reachable");
            }
        },
    }

    Ok(())
}

#[cfg(test)]
mod tests;
