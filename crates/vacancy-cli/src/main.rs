mod menu;

use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use vacancy_client::{DEFAULT_BASE_URL, HhClient};
use vacancy_core::{IngestOutcome, IngestReport, IngestService};
use vacancy_db::{Database, DatabaseConfig, VacancyRepository};

/// Employers loaded when no `--employer-id` is given.
const DEFAULT_EMPLOYER_IDS: [u64; 10] = [
    15478, 80, 2324020, 1740, 9694561, 1180205, 1122462, 8121, 67611, 123422,
];

#[derive(Parser)]
#[command(
    name = "vacancies",
    version,
    about = "Load hh.ru vacancies into PostgreSQL and query them"
)]
struct Cli {
    /// hh.ru employer ids to load into an empty database
    #[arg(
        long = "employer-id",
        env = "HH_EMPLOYER_IDS",
        value_delimiter = ',',
        default_values_t = DEFAULT_EMPLOYER_IDS
    )]
    employer_ids: Vec<u64>,

    /// Base URL of the hh.ru API
    #[arg(long, env = "HH_API_BASE_URL", default_value = DEFAULT_BASE_URL)]
    api_base_url: String,

    /// Per-request HTTP timeout in seconds (no timeout if unset)
    #[arg(long, env = "HH_HTTP_TIMEOUT_SECS")]
    http_timeout_secs: Option<u64>,

    /// Skip ingestion and go straight to the menu
    #[arg(long, default_value_t = false)]
    skip_ingest: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("vacancy=info".parse()?)
                .add_directive("vacancies=info".parse()?),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = DatabaseConfig::from_env().context("Invalid database configuration")?;

    if let Err(e) = Database::create_database(&config).await {
        tracing::warn!(error = %e, "Could not ensure the database exists");
    }

    let db = Database::connect(&config)
        .await
        .context("Failed to connect to database")?;

    let result = run(&cli, &db).await;
    db.close().await;
    result
}

async fn run(cli: &Cli, db: &Database) -> Result<()> {
    if let Err(e) = db.create_tables().await {
        tracing::error!(error = %e, "Failed to create tables");
    }

    let repo = db.vacancy_repo();
    if !cli.skip_ingest {
        ingest(cli, &repo).await?;
    }

    let stdin = std::io::stdin();
    menu::run(&repo, stdin.lock(), std::io::stdout().lock()).await
}

async fn ingest(cli: &Cli, repo: &VacancyRepository) -> Result<()> {
    let mut client =
        HhClient::with_base_url(&cli.api_base_url).context("Failed to create HTTP client")?;
    if let Some(secs) = cli.http_timeout_secs {
        client = client
            .with_timeout(Duration::from_secs(secs))
            .context("Failed to create HTTP client")?;
    }

    let svc = IngestService::new(client, repo.clone());
    match svc.run(&cli.employer_ids).await {
        Ok(IngestOutcome::AlreadyPopulated { existing }) => {
            println!("Database already holds {existing} vacancies, skipping download.");
        }
        Ok(IngestOutcome::Loaded(report)) => print_report(&report),
        // Without a count we cannot tell whether loading would duplicate rows.
        Err(e) => tracing::error!(error = %e, "Could not check existing vacancies, skipping ingestion"),
    }

    Ok(())
}

fn print_report(report: &IngestReport) {
    println!(
        "Loaded {} of {} employers and {} vacancies.",
        report.employers_inserted, report.companies_fetched, report.vacancies_inserted
    );
    if !report.is_complete() {
        println!("Skipped {} item(s):", report.skipped.len());
        for skipped in &report.skipped {
            println!("  - {skipped}");
        }
    }
}
