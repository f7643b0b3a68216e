use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use leadflow::error::AppError;
use leadflow::leads::scoring;
use leadflow::leads::LeadSubmission;

use crate::server;

#[derive(Parser, Debug)]
#[command(
    name = "Leadflow",
    about = "Run the lead capture and CRM relay service from the command line",
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
    /// Score a lead submission from a JSON file and print the breakdown
    Score(ScoreArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

#[derive(Args, Debug)]
pub(crate) struct ScoreArgs {
    /// Path to a JSON file holding one form submission
    pub(crate) submission: PathBuf,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Score(args) => run_score(args),
    }
}

fn run_score(args: ScoreArgs) -> Result<(), AppError> {
    let raw = std::fs::read_to_string(&args.submission)?;
    let submission: LeadSubmission = serde_json::from_str(&raw)
        .map_err(|err| AppError::Input(format!("invalid submission JSON: {err}")))?;

    for component in scoring::score_components(&submission) {
        println!("{:+} {}", component.points, component.factor);
    }
    println!("quality score: {}", scoring::quality_score(&submission));
    Ok(())
}
