use crate::evaluate::{run_evaluate, EvaluateArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use survey_criteria::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "Survey Criteria",
    about = "Serve and evaluate respondent qualification criteria",
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
    /// Evaluate respondent answers against a criteria document and print the results
    Evaluate(EvaluateArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
    /// JSON array of criteria documents to preload (overrides CRITERIA_SEED_PATH)
    #[arg(long)]
    pub(crate) seed: Option<PathBuf>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Evaluate(args) => run_evaluate(args),
    }
}
