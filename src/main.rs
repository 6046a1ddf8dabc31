use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use sqlx::postgres::PgPoolOptions;

mod catalog;
mod config;
mod db;
mod models;
mod report;
mod risk;
mod session;
mod stats;
mod store;
mod telemetry;
mod tracking;

use crate::catalog::WeightTable;
use crate::config::AppConfig;
use crate::db::PgStore;
use crate::models::{CheckMeta, ClientInfo, SelectionSet};
use crate::session::Session;

#[derive(Parser)]
#[command(name = "vitaguide")]
#[command(about = "Symptom screening and community statistics for VitaGuide", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Args)]
struct ClientArgs {
    #[arg(long, default_value = "vitaguide-cli")]
    user_agent: String,
    #[arg(long, default_value = "unknown")]
    platform: String,
    #[arg(long, default_value = "en-US")]
    language: String,
    #[arg(long, default_value = "0x0")]
    screen: String,
}

impl ClientArgs {
    fn client_info(&self) -> ClientInfo {
        ClientInfo {
            user_agent: self.user_agent.clone(),
            platform: self.platform.clone(),
            language: self.language.clone(),
            screen_resolution: self.screen.clone(),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Create or upgrade the database schema
    InitDb,
    /// Load realistic seed visits and checks
    Seed,
    /// Backfill symptom checks from a CSV export
    Import {
        #[arg(long)]
        csv: PathBuf,
    },
    /// List the symptom catalog
    Symptoms,
    /// Start a session and record its visit
    Visit {
        #[arg(long)]
        session: Option<String>,
        #[command(flatten)]
        client: ClientArgs,
    },
    /// Score selected symptoms and record the check
    Analyze {
        /// Comma separated symptom ids
        #[arg(long, default_value = "")]
        symptoms: String,
        /// Reuse a session started with `visit`
        #[arg(long)]
        session: Option<String>,
        /// Seconds spent on the quiz page, recorded as 0 when omitted
        #[arg(long)]
        duration: Option<u32>,
        #[command(flatten)]
        client: ClientArgs,
    },
    /// Print community statistics
    Stats {
        #[arg(long)]
        json: bool,
    },
    /// Generate a markdown community report
    Report {
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = AppConfig::load().context("invalid configuration")?;
    telemetry::init(&config.log_level)?;
    let table = WeightTable::builtin().context("symptom weight table is corrupt")?;

    match cli.command {
        Commands::InitDb => {
            let store = connect(&config).await?;
            db::init_db(store.pool()).await?;
            println!("Schema ready.");
        }
        Commands::Seed => {
            let store = connect(&config).await?;
            db::seed(&store, &table).await?;
            println!("Seed data inserted.");
        }
        Commands::Import { csv } => {
            let store = connect(&config).await?;
            let inserted = db::import_csv(&store, &table, &csv).await?;
            println!("Inserted {inserted} symptom checks from {}.", csv.display());
        }
        Commands::Symptoms => {
            for (category, symptoms) in table.by_category() {
                println!("{category}");
                for symptom in symptoms {
                    println!("  {:<22} {}", symptom.id, symptom.prompt);
                }
            }
        }
        Commands::Visit { session, client } => {
            let store = connect(&config).await?;
            let mut session = match session {
                Some(id) => Session::resume(id),
                None => Session::start(),
            };
            tracking::record_visit(&store, &mut session, &client.client_info()).await;
            println!("{}", session.id());
        }
        Commands::Analyze {
            symptoms,
            session,
            duration,
            client,
        } => {
            let selection = SelectionSet::parse_list(&symptoms);
            if selection.is_empty() {
                println!("Select at least one symptom (see `vitaguide symptoms`).");
                return Ok(());
            }
            for unknown in selection.iter().filter(|id| !table.contains(id)) {
                tracing::warn!(symptom = unknown, "ignoring unknown symptom id");
            }

            tracing::debug!(
                scheme = config.risk_scheme.name(),
                symptoms = selection.len(),
                "scoring selection"
            );
            let record = risk::analyze(&selection, &table);
            print!("{}", report::render_assessment(&record, config.risk_scheme));

            let Some(database_url) = config.database_url.as_deref() else {
                tracing::warn!("DATABASE_URL not set, skipping community statistics");
                return Ok(());
            };
            let store = lazy_store(database_url, config.max_connections)?;

            let mut session = match session {
                Some(id) => Session::resume(id),
                None => Session::start(),
            };
            let client = client.client_info();
            tracking::record_visit(&store, &mut session, &client).await;

            let meta = CheckMeta::for_client(&client, duration);
            tracking::record_check(&store, &session, &selection, &record, &meta).await;

            let statistics = stats::global_statistics_or_default(&store).await;
            println!();
            print!("{}", report::render_statistics(&statistics, &table));
        }
        Commands::Stats { json } => {
            let store = lazy_store(config.require_database_url()?, config.max_connections)?;
            let statistics = stats::global_statistics_or_default(&store).await;
            if json {
                println!("{}", serde_json::to_string_pretty(&statistics)?);
            } else {
                print!("{}", report::render_statistics(&statistics, &table));
            }
        }
        Commands::Report { out } => {
            let store = lazy_store(config.require_database_url()?, config.max_connections)?;
            let statistics = stats::global_statistics_or_default(&store).await;
            let report = report::build_report(&statistics, &table, chrono::Utc::now());
            std::fs::write(&out, report)?;
            println!("Report written to {}.", out.display());
        }
    }

    Ok(())
}

async fn connect(config: &AppConfig) -> anyhow::Result<PgStore> {
    let database_url = config.require_database_url()?;
    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .connect(database_url)
        .await
        .context("failed to connect to Postgres")?;
    Ok(PgStore::new(pool))
}

// Statistics and tracking degrade instead of failing when Postgres is down,
// so the pool connects on first use with a short acquire timeout.
fn lazy_store(database_url: &str, max_connections: u32) -> anyhow::Result<PgStore> {
    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(Duration::from_secs(5))
        .connect_lazy(database_url)
        .context("invalid DATABASE_URL")?;
    Ok(PgStore::new(pool))
}
