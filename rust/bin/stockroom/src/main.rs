//! `stockroom`: offline product catalog CLI.
//!
//! Edits a local replica of the product catalog while disconnected and,
//! once the backend is reachable again, reports how the replica differs
//! from it.

mod commands;
mod config;
mod remote;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use stockroom_catalog::{Code, RemoteCatalog, SnapshotCatalog};

use commands::Output;

/// Offline product catalog tool.
#[derive(Parser, Debug)]
#[command(name = "stockroom", about = "Offline product catalog replica")]
struct Cli {
    /// Path to client config file (default: ~/.stockroom/config.toml).
    #[arg(long = "config", global = true)]
    config: Option<PathBuf>,

    /// Path to the local replica database (overrides the config file).
    #[arg(long = "db", global = true)]
    db: Option<PathBuf>,

    /// Output format.
    #[arg(long = "output", short = 'o', global = true, value_enum, default_value = "table")]
    output: Output,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Product records in the local replica.
    Product {
        #[command(subcommand)]
        action: ProductAction,
    },

    /// Categories in the local replica.
    Category {
        #[command(subcommand)]
        action: CategoryAction,
    },

    /// Compare the local replica with the remote catalog.
    Diff {
        /// Read the remote catalog from a JSON file instead of the server.
        #[arg(long)]
        snapshot: Option<PathBuf>,
        /// Only print per-kind counts.
        #[arg(long)]
        summary: bool,
        /// Exit with status 1 when the replica is out of sync.
        #[arg(long)]
        check: bool,
    },

    /// Remote server settings.
    Remote {
        #[command(subcommand)]
        action: RemoteAction,
    },

    /// Show version.
    Version,
}

#[derive(Subcommand, Debug)]
enum ProductAction {
    /// Create a product; a code is allocated when the body has none.
    Add {
        /// JSON body.
        #[arg(long = "json")]
        json_body: Option<String>,
        /// Read JSON from file.
        #[arg(short = 'f', long = "file")]
        file: Option<String>,
    },
    /// List products.
    List {
        /// Only products created offline.
        #[arg(long)]
        offline: bool,
    },
    /// Show one product.
    Get { code: Code },
    /// Merge fields into a product (`null` removes a field).
    Update {
        code: Code,
        /// JSON body.
        #[arg(long = "json")]
        json_body: Option<String>,
        /// Read JSON from file.
        #[arg(short = 'f', long = "file")]
        file: Option<String>,
    },
    /// Delete a product.
    Delete { code: Code },
}

#[derive(Subcommand, Debug)]
enum CategoryAction {
    /// Create or replace a category (body must include `id`).
    Put {
        #[arg(long = "json")]
        json_body: Option<String>,
        #[arg(short = 'f', long = "file")]
        file: Option<String>,
    },
    /// List categories.
    List,
    /// Show one category.
    Get { id: String },
    /// Delete a category.
    Delete { id: String },
}

#[derive(Subcommand, Debug)]
enum RemoteAction {
    /// Set the server URL and/or token.
    Set {
        #[arg(long)]
        server: Option<String>,
        #[arg(long)]
        token: Option<String>,
    },
    /// Show the effective configuration.
    Show,
}

fn main() -> anyhow::Result<()> {
    // Logs go to stderr so stdout stays parseable with `-o json`.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(config::ClientConfig::default_path);
    let db = cli.db.as_deref();
    let output = cli.output;

    match cli.command {
        Commands::Product { action } => {
            let config = config::ClientConfig::load(&config_path)?;
            let stores = commands::open_stores(&config, db)?;
            match action {
                ProductAction::Add { json_body, file } => {
                    let body = commands::read_body(json_body, file)?;
                    commands::product::add(&stores, body, output)?;
                }
                ProductAction::List { offline } => {
                    commands::product::list(&stores, offline, output)?;
                }
                ProductAction::Get { code } => {
                    commands::product::get(&stores, code, output)?;
                }
                ProductAction::Update {
                    code,
                    json_body,
                    file,
                } => {
                    let body = commands::read_body(json_body, file)?;
                    commands::product::update(&stores, code, body, output)?;
                }
                ProductAction::Delete { code } => {
                    commands::product::delete(&stores, code)?;
                }
            }
        }

        Commands::Category { action } => {
            let config = config::ClientConfig::load(&config_path)?;
            let stores = commands::open_stores(&config, db)?;
            match action {
                CategoryAction::Put { json_body, file } => {
                    let body = commands::read_body(json_body, file)?;
                    commands::category::put(&stores, body, output)?;
                }
                CategoryAction::List => commands::category::list(&stores, output)?,
                CategoryAction::Get { id } => commands::category::get(&stores, &id, output)?,
                CategoryAction::Delete { id } => commands::category::delete(&stores, &id)?,
            }
        }

        Commands::Diff {
            snapshot,
            summary,
            check,
        } => {
            let config = config::ClientConfig::load(&config_path)?;
            let stores = commands::open_stores(&config, db)?;
            let remote: Box<dyn RemoteCatalog> = match snapshot {
                Some(path) => Box::new(SnapshotCatalog::new(path)),
                None => Box::new(remote::HttpCatalog::new(&config.remote)?),
            };
            let out_of_sync = commands::diff::run(&stores, remote.as_ref(), output, summary)?;
            if check && out_of_sync > 0 {
                std::process::exit(1);
            }
        }

        Commands::Remote { action } => match action {
            RemoteAction::Set { server, token } => {
                commands::context::set_remote(server.as_deref(), token.as_deref(), &config_path)?;
            }
            RemoteAction::Show => {
                commands::context::show(&config_path, db)?;
            }
        },

        Commands::Version => {
            println!("stockroom v{}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}
