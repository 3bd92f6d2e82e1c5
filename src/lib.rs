pub mod api;
pub mod args;
mod budget;
mod cache;
pub mod commands;
mod config;
mod error;
mod fetcher;
pub mod model;
#[cfg(test)]
mod test;
mod utils;

pub use api::Mode;
pub use budget::{BudgetError, BudgetGroups, BudgetsFile};
pub use cache::{CacheStore, PurgePolicy};
pub use config::Config;
pub use error::Error;
pub use error::Result;
pub use fetcher::{Dataset, DatasetKind, Fetcher};
