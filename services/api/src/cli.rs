use crate::render::{run_render, run_sample, RenderArgs, SampleArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use ffw_enrollment::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "FFW Apfeltrang Anmeldung",
    about = "Serve the membership enrollment form backend or render forms from the command line",
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
    /// Validate a submission JSON file and render it as PDF
    Render(RenderArgs),
    /// Render the built-in sample registration
    Sample(SampleArgs),
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

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Render(args) => run_render(args),
        Command::Sample(args) => run_sample(args),
    }
}
