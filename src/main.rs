use clap::Parser;
use mintpipe::args::{Args, CacheSubcommand, Command};
use mintpipe::{commands, Config, Mode, Result};
use std::process::ExitCode;
use tracing::{debug, error, trace};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    let log_level = args.common().log_level();
    init_logger(log_level);
    debug!("Log level set to {}", log_level.to_string().to_lowercase());

    match main_inner(args).await {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Exiting with error: {e}");
            ExitCode::FAILURE
        }
    }
}

pub async fn main_inner(args: Args) -> Result<()> {
    trace!("{args:?}");
    let home = args.common().mintpipe_home().path();

    // This allows for testing the program without any provider export data. When
    // MINTPIPE_IN_TEST_MODE is set and non-zero in length, then the mode will be
    // Mode::Test, otherwise it will be Mode::File.
    let mode = Mode::from_env();

    // Route to appropriate command handler
    let _: () = match args.command() {
        Command::Init => commands::init(home).await?.print(),

        Command::Networth => {
            let config = Config::load(home).await?;
            commands::networth(config, mode).await?.print()
        }

        Command::Categories => {
            let config = Config::load(home).await?;
            commands::categories(config, mode).await?.print()
        }

        Command::Transactions(transactions_args) => {
            let config = Config::load(home).await?;
            commands::transactions(config, mode, transactions_args.clone())
                .await?
                .print()
        }

        Command::Cache(cache_args) => {
            let config = Config::load(home).await?;
            match cache_args.subcommand() {
                CacheSubcommand::Clear => commands::cache_clear(config).await?.print(),
            }
        }
    };
    Ok(())
}

/// Initializes the tracing subscriber.
pub fn init_logger(level: LevelFilter) {
    let filter = match std::env::var("RUST_LOG").ok() {
        Some(_) => {
            // RUST_LOG exists; use it.
            EnvFilter::from_default_env()
        }
        None => {
            // RUST_LOG does not exist; use default log level for this crate only.
            EnvFilter::new(format!(
                "{}={},{}={}",
                env!("CARGO_CRATE_NAME"),
                level,
                env!("CARGO_BIN_NAME"),
                level
            ))
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
