//! These structs provide the CLI interface for the mintpipe CLI.

use clap::{Parser, Subcommand};
use std::convert::Infallible;
use std::fmt::{Display, Formatter};
use std::ops::Deref;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::error;
use tracing_subscriber::filter::LevelFilter;

/// mintpipe: A command-line tool for caching and summarizing personal finance data.
///
/// The purpose of this program is to take the raw data exported from your financial data
/// provider (accounts, categories and a transactions CSV), process it into query-ready
/// tables, and cache both the raw and processed forms locally so that the expensive export
/// step runs at most once per time-to-live window.
#[derive(Debug, Parser, Clone)]
pub struct Args {
    #[clap(flatten)]
    common: Common,

    #[command(subcommand)]
    command: Command,
}

impl Args {
    pub fn new(common: Common, command: Command) -> Self {
        Self { common, command }
    }

    pub fn common(&self) -> &Common {
        &self.common
    }

    pub fn command(&self) -> &Command {
        &self.command
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Create the data directory and initialize the configuration files.
    ///
    /// This is the first command you should run. Decide what directory you want to store
    /// data in and pass this as --mintpipe-home (by default it will be $HOME/mintpipe).
    /// After initializing, edit config/budgets.json so that every category your provider
    /// knows about appears in exactly one budget group.
    Init,
    /// Print the net-worth summary computed from active accounts.
    Networth,
    /// Print the category to parent-category mapping.
    Categories,
    /// Write the processed transactions table as CSV.
    Transactions(TransactionsArgs),
    /// Manage the local cache.
    Cache(CacheArgs),
}

/// Arguments common to all subcommands.
#[derive(Debug, Parser, Clone)]
pub struct Common {
    /// The logging verbosity. One of, from least to most verbose:
    /// off, error, warn, info, debug, trace
    ///
    /// This can be overridden by RUST_LOG.
    #[arg(long, default_value_t = LevelFilter::INFO)]
    log_level: LevelFilter,

    /// The directory where mintpipe data and configuration is held. Defaults to ~/mintpipe
    #[arg(long, env = "MINTPIPE_HOME", default_value_t = default_mintpipe_home())]
    mintpipe_home: DisplayPath,
}

impl Common {
    pub fn new(log_level: LevelFilter, mintpipe_home: PathBuf) -> Self {
        Self {
            log_level,
            mintpipe_home: mintpipe_home.into(),
        }
    }

    pub fn log_level(&self) -> LevelFilter {
        self.log_level
    }

    pub fn mintpipe_home(&self) -> &DisplayPath {
        &self.mintpipe_home
    }
}

/// Args for the `mintpipe transactions` command.
#[derive(Debug, Parser, Clone)]
pub struct TransactionsArgs {
    /// Where to write the processed transactions CSV.
    #[arg(long, default_value = "transactions.csv")]
    output: PathBuf,
}

impl TransactionsArgs {
    pub fn new(output: impl Into<PathBuf>) -> Self {
        Self {
            output: output.into(),
        }
    }

    pub fn output(&self) -> &Path {
        &self.output
    }
}

/// Args for the `mintpipe cache` command.
#[derive(Debug, Parser, Clone)]
pub struct CacheArgs {
    #[command(subcommand)]
    subcommand: CacheSubcommand,
}

impl CacheArgs {
    pub fn subcommand(&self) -> &CacheSubcommand {
        &self.subcommand
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum CacheSubcommand {
    /// Delete every cache entry regardless of age.
    Clear,
}

fn default_mintpipe_home() -> DisplayPath {
    DisplayPath(match dirs::home_dir() {
        Some(home) => home.join("mintpipe"),
        None => {
            error!(
                "There was an error when trying to get your home directory. You can get around \
                this by providing --mintpipe-home or MINTPIPE_HOME instead of relying on the \
                default mintpipe home directory. If you continue using the program right now, \
                you may have problems!",
            );
            PathBuf::from("mintpipe")
        }
    })
}

#[derive(Debug, Default, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct DisplayPath(PathBuf);

impl From<PathBuf> for DisplayPath {
    fn from(value: PathBuf) -> Self {
        DisplayPath(value)
    }
}

impl Deref for DisplayPath {
    type Target = Path;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AsRef<Path> for DisplayPath {
    fn as_ref(&self) -> &Path {
        &self.0
    }
}

impl Display for DisplayPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.to_string_lossy())
    }
}

impl FromStr for DisplayPath {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(PathBuf::from(s)))
    }
}

impl DisplayPath {
    pub fn new(path: PathBuf) -> Self {
        Self(path)
    }

    pub fn path(&self) -> &Path {
        &self.0
    }
}
