//! Data types for the raw provider payloads and the processed datasets built from them.

mod account;
mod amount;
mod category;
mod transaction;

pub use account::{AccountRow, AccountsData, RawAccount, RawAccounts};
pub use amount::{Amount, AmountError};
pub use category::{CategoriesData, CategoryRow, ParentRef, RawCategories, RawCategory};
pub use transaction::{TransactionRow, TransactionType, TransactionsData};

/// Implemented by the processed datasets so the cache layer can detect entries written by
/// an older build. A cached object whose schema version does not match the current one is
/// treated as a cache miss instead of a deserialization failure.
pub trait Versioned {
    /// The schema version written by the current build.
    const CURRENT_SCHEMA: u32;

    /// The schema version embedded in this instance when it was serialized.
    fn schema_version(&self) -> u32;

    fn is_current_schema(&self) -> bool {
        self.schema_version() == Self::CURRENT_SCHEMA
    }
}
