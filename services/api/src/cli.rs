use crate::demo::{run_demo, run_lease_report, DemoArgs};
use crate::infra::parse_date;
use crate::server;
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use lettings::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "Lettings Occupancy Service",
    about = "Run and demonstrate the property availability and lease coordination service",
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
    /// Lease horizon reporting for operators
    Lease {
        #[command(subcommand)]
        command: LeaseCommand,
    },
    /// Run an end-to-end CLI demo covering the daily and annual rental paths
    Demo(DemoArgs),
}

#[derive(Subcommand, Debug)]
enum LeaseCommand {
    /// List leases expiring inside a horizon, plus leases already lapsed
    Report(LeaseReportArgs),
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
pub(crate) struct LeaseReportArgs {
    /// Days ahead to scan for expiring leases
    #[arg(long, default_value_t = 60)]
    pub(crate) days_ahead: u32,
    /// Evaluation date for the report (defaults to today)
    #[arg(long, value_parser = parse_date)]
    pub(crate) today: Option<NaiveDate>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Lease {
            command: LeaseCommand::Report(args),
        } => run_lease_report(args),
        Command::Demo(args) => run_demo(args),
    }
}
