//! Datadesk - a lightweight analytics-reporting toolkit.

mod cli;

use std::path::PathBuf;

use cli::{parse_params, protection_from_flags, Cli, Command};
use datadesk::config::Config;
use datadesk::db::{self, QueryBackend};
use datadesk::descriptor::ConnectionDescriptor;
use datadesk::error::{DatadeskError, Result};
use datadesk::export::{release_then_export, Exporter};
use datadesk::logging;
use datadesk::provider::Provider;
use datadesk::query::QueryRunner;
use datadesk::vault::{self, KeyringStore};
use tracing::{error, info};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    logging::init(logging::LogMode::Stderr);

    if let Err(e) = run().await {
        error!("{}: {}", e.category(), e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse_args();

    let config_path = cli.config_path();
    info!("Loading config from: {}", config_path.display());
    let config = Config::load_from_file(&config_path)?;

    let root = workspace_root(&cli)?;
    let workspace = config.workspace(&root);

    match cli.command {
        Command::Init => {
            let workspace = config.init_workspace(&root)?;
            println!("Workspace created under {}", root.display());
            println!("  queries: {}", workspace.query_dir.display());
            println!("  output:  {}", workspace.output_dir.display());
            println!("  input:   {}", workspace.input_dir.display());
            println!("  tracker: {}", workspace.tracker_dir.display());
        }

        Command::Probe { provider } => {
            let handle = open_handle(&provider, &config).await?;
            let alive = db::probe_connection(handle.as_ref()).await;
            handle.close().await?;
            println!("{provider}: {}", if alive { "reachable" } else { "unreachable" });
        }

        Command::Exec {
            provider,
            query,
            params,
        } => {
            let params = parse_params(&params)?;
            let handle = open_handle(&provider, &config).await?;

            let outcome = {
                let runner = QueryRunner::new(handle.as_ref(), &workspace.query_dir);
                runner.execute(&query, &params).await
            };
            handle.close().await?;
            outcome?;

            println!("Statement executed.");
        }

        Command::Run {
            provider,
            query,
            params,
            out,
            protect,
            tag,
            grants,
        } => {
            let params = parse_params(&params)?;
            let handle = open_handle(&provider, &config).await?;

            let fetched = {
                let runner = QueryRunner::new(handle.as_ref(), &workspace.query_dir);
                runner.run(&query, &params).await
            };
            let table = match fetched {
                Ok(table) => table,
                Err(e) => {
                    // The handle must not outlive a failed query.
                    let _ = handle.close().await;
                    return Err(e);
                }
            };

            let exporter = Exporter::new(&workspace.output_dir, &workspace.tracker_dir);
            let protection =
                protection_from_flags(protect, tag.as_deref(), &config.report.key, &grants);
            let path =
                release_then_export(handle, &exporter, &table, out.as_deref(), protection).await?;

            println!("Exported {} rows to {}", table.row_count, path.display());
        }
    }

    Ok(())
}

/// Resolves credentials, builds the descriptor, and opens the handle:
/// the strict front half of every task.
async fn open_handle(provider: &str, config: &Config) -> Result<Box<dyn QueryBackend>> {
    let provider = Provider::parse(provider)?;
    let credentials = vault::resolve(provider, &KeyringStore::new())?;
    let descriptor = ConnectionDescriptor::build(
        provider,
        &credentials,
        config.warehouse.schema.as_deref(),
        config.warehouse.warehouse.as_deref(),
    )?;
    db::connect(&descriptor).await
}

/// Returns the workspace root: `--root` if given, the current directory
/// otherwise.
fn workspace_root(cli: &Cli) -> Result<PathBuf> {
    match &cli.root {
        Some(root) => Ok(root.clone()),
        None => std::env::current_dir()
            .map_err(|e| DatadeskError::config(format!("Cannot determine working directory: {e}"))),
    }
}
