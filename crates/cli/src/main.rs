//! `walkoff-playbooks` CLI entry-point.
//!
//! Available sub-commands:
//! - `serve`: migrate, then start the API server.
//! - `migrate`: run pending database migrations.
//! - `validate`: check a workflow or playbook JSON file offline.

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use engine::{validate_graph, NewPlaybook, NewWorkflow};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "walkoff-playbooks",
    about = "Playbook and workflow management service",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Args)]
struct DatabaseArgs {
    #[arg(long, env = "DATABASE_URL", default_value = "sqlite://data/walkoff.db?mode=rwc")]
    database_url: String,

    #[arg(long, default_value_t = 10)]
    max_connections: u32,
}

impl DatabaseArgs {
    async fn connect(&self) -> anyhow::Result<db::DbPool> {
        let options = db::pool::PoolOptions {
            max_connections: self.max_connections,
            ..Default::default()
        };
        db::pool::create_pool(&self.database_url, options)
            .await
            .with_context(|| format!("failed to connect to {}", self.database_url))
    }
}

#[derive(Subcommand)]
enum Command {
    /// Start the REST API server.
    Serve {
        #[command(flatten)]
        database: DatabaseArgs,

        #[arg(long, default_value = "127.0.0.1:5000")]
        bind: String,

        /// HS256 secret access tokens are signed with.
        #[arg(long, env = "JWT_SECRET", hide_env_values = true)]
        jwt_secret: String,

        /// JSON role table; the built-in admin/guest table when absent.
        #[arg(long, env = "WALKOFF_ROLES")]
        roles: Option<PathBuf>,
    },
    /// Run pending database migrations.
    Migrate {
        #[command(flatten)]
        database: DatabaseArgs,
    },
    /// Validate a workflow (or a playbook of workflows) JSON file.
    Validate {
        /// Path to the JSON file.
        path: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Serve { database, bind, jwt_secret, roles } => {
            let config = api::ApiConfig::load(jwt_secret, roles.as_deref())?;
            let pool = database.connect().await?;
            db::pool::run_migrations(&pool).await.context("migration failed")?;

            info!("Starting API server on {bind}");
            api::serve(&bind, api::AppState::from_config(pool, config))
                .await
                .with_context(|| format!("server on {bind} failed"))?;
        }
        Command::Migrate { database } => {
            info!("Running migrations against {}", database.database_url);
            let pool = database.connect().await?;
            db::pool::run_migrations(&pool).await.context("migration failed")?;
            info!("Migrations applied successfully");
        }
        Command::Validate { path } => match validate_file(&path) {
            Ok(count) => println!("✅ {count} workflow(s) valid."),
            Err(e) => {
                eprintln!("❌ Validation failed: {e:#}");
                std::process::exit(1);
            }
        },
    }

    Ok(())
}

/// Validate every workflow graph in `path`; returns how many were checked.
///
/// A document with a `workflows` array is read as a playbook, anything else
/// as a single workflow.
fn validate_file(path: &Path) -> anyhow::Result<usize> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("cannot read file {}", path.display()))?;
    let document: serde_json::Value = serde_json::from_str(&content).context("invalid JSON")?;

    let workflows = if document.get("workflows").is_some_and(|w| w.is_array()) {
        serde_json::from_value::<NewPlaybook>(document)
            .context("not a playbook")?
            .workflows
    } else {
        vec![serde_json::from_value::<NewWorkflow>(document).context("not a workflow")?]
    };

    for workflow in &workflows {
        validate_graph(&workflow.graph).with_context(|| format!("workflow {}", workflow.name))?;
    }
    Ok(workflows.len())
}
