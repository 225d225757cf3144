use std::path::PathBuf;
use std::sync::Arc;

use axum::routing::get;
use axum::{Json, Router};
use clap::{Args, Parser, Subcommand};
use serde_json::json;
use tracing::info;
use trialiq::config::AppConfig;
use trialiq::error::AppError;
use trialiq::matching::{
    country_from_locale, matching_router, InMemorySubmissionRepository, MatchService,
    MatchingEngine, PatientProfile, ScoringWeights, TrialCatalog,
};
use trialiq::telemetry;

#[derive(Parser, Debug)]
#[command(
    name = "TrialIQ",
    about = "Match patient profiles against the clinical trial catalog",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Evaluate a profile from a JSON file and print the partition
    Match(MatchArgs),
}

#[derive(Args, Debug, Default)]
struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    port: Option<u16>,
}

#[derive(Args, Debug)]
struct MatchArgs {
    /// Path to a JSON file with the patient's answers (key -> value map)
    #[arg(long)]
    profile: PathBuf,
    /// Locale tag supplying the country subtag (defaults to the configured locale)
    #[arg(long)]
    locale: Option<String>,
}

#[tokio::main]
async fn main() {
    if let Err(err) = run_cli().await {
        eprintln!("application error: {err}");
        std::process::exit(1);
    }
}

async fn run_cli() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => run_server(args).await,
        Command::Match(args) => run_match(args),
    }
}

async fn run_server(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let catalog = Arc::new(TrialCatalog::builtin()?);
    let engine = MatchingEngine::new(
        ScoringWeights::default(),
        config.matching.apply_base_url.as_str(),
    );
    let repository = Arc::new(InMemorySubmissionRepository::default());
    let service = Arc::new(MatchService::new(catalog.clone(), engine, repository));

    let app = Router::new()
        .route("/health", get(healthcheck))
        .merge(matching_router(service));

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;

    info!(?config.environment, %addr, trials = catalog.len(), "trial matching service ready");

    axum::serve(listener, app).await?;
    Ok(())
}

fn run_match(args: MatchArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;

    let raw = std::fs::read_to_string(&args.profile)?;
    let profile: PatientProfile = serde_json::from_str(&raw)?;

    let locale = args
        .locale
        .unwrap_or_else(|| config.matching.default_locale.clone());
    let country = country_from_locale(&locale)?;

    let catalog = TrialCatalog::builtin()?;
    let engine = MatchingEngine::new(
        ScoringWeights::default(),
        config.matching.apply_base_url.as_str(),
    );
    let outcome = engine
        .match_patient(&catalog, &profile, &country)
        .map_err(trialiq::matching::MatchServiceError::from)?;

    println!("Trial matching for country {country} ({locale})");

    if outcome.matches.is_empty() {
        println!("\nMatched trials: none");
    } else {
        println!("\nMatched trials");
        for result in &outcome.matches {
            println!(
                "- {} | {}% | {} | apply: {}",
                result.trial_id,
                result.match_percentage,
                result.status.label(),
                result.next_steps
            );
        }
    }

    if outcome.exclusions.is_empty() {
        println!("\nExcluded trials: none");
    } else {
        println!("\nExcluded trials");
        for exclusion in &outcome.exclusions {
            println!("- {} | {}", exclusion.trial_id, exclusion.reason);
        }
    }

    Ok(())
}

async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}
