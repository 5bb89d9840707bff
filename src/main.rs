use clap::{Parser, Subcommand};
use serde::Serialize;
use std::io::Read;
use std::path::PathBuf;

use wealthplan::api::params::{
    BudgetPayload, EquityArgs, MortgageArgs, NetWorthArgs, PropertyArgs, build_equity,
    build_mortgage, build_net_worth, build_property,
};
use wealthplan::api::{
    budget_response, equity_response, mortgage_response, net_worth_response, property_response,
    run_http_server,
};
use wealthplan::config::Config;

#[derive(Parser, Debug)]
#[command(
    name = "wealthplan",
    about = "Mortgage, equity compensation and net-worth projections"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP API.
    Serve {
        #[arg(long, help = "Overrides PORT")]
        port: Option<u16>,
    },
    /// Amortization schedule for one mortgage.
    Mortgage(MortgageArgs),
    /// Property price affordable for a monthly payment.
    Property(PropertyArgs),
    /// Month-by-month household net worth.
    NetWorth(NetWorthArgs),
    /// RSU, ESPP and self-bought share projection.
    Equity(EquityArgs),
    /// Income and expense summary from a JSON file (stdin when omitted).
    Budget {
        #[arg(long)]
        file: Option<PathBuf>,
    },
}

type CliResult = Result<(), Box<dyn std::error::Error>>;

fn print_json<T: Serialize>(value: &T) -> CliResult {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn read_budget(file: Option<PathBuf>) -> Result<BudgetPayload, Box<dyn std::error::Error>> {
    let raw = match file {
        Some(path) => std::fs::read_to_string(path)?,
        None => {
            let mut raw = String::new();
            std::io::stdin().read_to_string(&mut raw)?;
            raw
        }
    };
    let payload: BudgetPayload = serde_json::from_str(&raw)?;
    payload.validate()?;
    Ok(payload)
}

async fn run(command: Command, mut config: Config) -> CliResult {
    let max_years = config.max_projection_years;
    match command {
        Command::Serve { port } => {
            if let Some(port) = port {
                config.port = port;
            }
            run_http_server(config).await?;
            Ok(())
        }
        Command::Mortgage(args) => print_json(&mortgage_response(&build_mortgage(&args, max_years)?)),
        Command::Property(args) => print_json(&property_response(&build_property(&args, max_years)?)),
        Command::NetWorth(args) => {
            let response = net_worth_response(&build_net_worth(&args, max_years)?);
            if let Some(warning) = &response.warning {
                tracing::warn!("{warning}");
            }
            print_json(&response)
        }
        Command::Equity(args) => print_json(&equity_response(&build_equity(&args, None, max_years)?)),
        Command::Budget { file } => print_json(&budget_response(&read_budget(file)?)),
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {e}");
            std::process::exit(1);
        }
    };

    if let Err(e) = run(cli.command, config).await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
