// Yahoo Finance client for daily bars.
mod marketdata {
    // Fetches daily bars for a symbol.
    pub mod api_caller;
    // Response structures for the chart API.
    pub mod response;
}
// HTTP client module.
mod http {
    // HTTP client implementation.
    pub mod client;
}
// Data models.
mod model;
// Data storage module.
mod store {
    /// SQLite connection handling.
    pub mod sqlite;
    /// Stocks table.
    pub mod stock;
}
// Runtime settings.
mod config;
// Add/view/update/delete actions.
mod controller;
// Terminal front end.
mod console;

use std::{io, path::PathBuf, process::ExitCode};

use clap::{Parser, Subcommand};
use dotenv::dotenv;

use config::Config;
use console::{Action, Console};
use controller::Controller;
use marketdata::api_caller::YahooChart;
use store::sqlite::Store;

// Command-line argument parser.
#[derive(Parser, Debug)]
#[command(about, long_about = None)]
struct Args {
    /// SQLite database file (default: $stocks_db, then stocks.db).
    #[arg(long)]
    db: Option<PathBuf>,
    #[command(subcommand)]
    command: Option<Commands>,
}

// Subcommands for the application. Without one, the interactive menu starts.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Fetch the last 7 daily bars of a symbol and store them.
    Add { symbol: String },
    /// List every stored bar.
    View,
    /// Set the close price of the bars of a symbol on a date.
    Update {
        symbol: String,
        date: String,
        price: String,
    },
    /// Delete the bars of a symbol on a date.
    Delete { symbol: String, date: String },
    /// Menu-driven session.
    Interactive,
}

#[tokio::main]
// Main function entry point.
async fn main() -> ExitCode {
    dotenv().ok();

    env_logger::init();

    let args = Args::parse();

    let config = match Config::from_env(args.db) {
        Ok(config) => config,
        Err(err) => {
            log::error!("Error loading configuration: {}", err);
            return ExitCode::FAILURE;
        }
    };

    let store = Store::new(&config.db_path);
    if let Err(err) = store.ensure_schema() {
        log::error!("Error initializing database: {}", err);
        return ExitCode::FAILURE;
    }
    log::info!("Using database {}", store.path().display());

    let controller = Controller::new(
        store,
        YahooChart::new(config.chart_base_url, config.request_timeout),
    );

    let action = match args.command.unwrap_or(Commands::Interactive) {
        Commands::Interactive => {
            let mut console = Console::new(io::stdin().lock(), io::stdout(), io::stderr(), true);
            return match console.run(&controller).await {
                Ok(()) => ExitCode::SUCCESS,
                Err(err) => {
                    log::error!("Terminal error: {}", err);
                    ExitCode::FAILURE
                }
            };
        }
        Commands::Add { symbol } => Action::Add { symbol },
        Commands::View => Action::View,
        Commands::Update {
            symbol,
            date,
            price,
        } => Action::Update {
            symbol,
            date,
            price,
        },
        Commands::Delete { symbol, date } => Action::Delete { symbol, date },
    };

    let mut console = Console::new(io::stdin().lock(), io::stdout(), io::stderr(), false);
    match console.perform(&controller, action).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(err) => {
            log::error!("Terminal error: {}", err);
            ExitCode::FAILURE
        }
    }
}
