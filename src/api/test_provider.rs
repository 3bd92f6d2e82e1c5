//! Implements the `Provider` trait using in-memory seed data.
//!
//! Note: this is compiled even in the "production" version of this app so that we can run
//! the whole app, top-to-bottom, without any export data on disk (see `Mode::from_env`).
//! It also counts calls, which the pipeline tests use to prove that cache hits avoid
//! provider fetches.

use crate::api::Provider;
use crate::model::{RawAccounts, RawCategories};
use crate::Result;
use anyhow::Context;
use std::sync::{Arc, Mutex};

/// How many times each provider method has been called on a `TestProvider`.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ProviderCalls {
    pub accounts: usize,
    pub categories: usize,
    pub transactions_csv: usize,
    pub closes: usize,
}

/// An implementation of the `Provider` trait that serves seeded data from memory.
pub struct TestProvider {
    accounts_json: String,
    categories_json: String,
    transactions_csv: Vec<u8>,
    calls: Arc<Mutex<ProviderCalls>>,
}

impl Default for TestProvider {
    fn default() -> Self {
        Self {
            accounts_json: ACCOUNT_DATA.to_string(),
            categories_json: CATEGORY_DATA.to_string(),
            transactions_csv: TRANSACTION_DATA.as_bytes().to_vec(),
            calls: Arc::new(Mutex::new(ProviderCalls::default())),
        }
    }
}

impl TestProvider {
    /// Returns a handle to the call counters, shared with this provider.
    pub fn call_counts(&self) -> Arc<Mutex<ProviderCalls>> {
        Arc::clone(&self.calls)
    }

    fn bump(&self, f: impl FnOnce(&mut ProviderCalls)) {
        if let Ok(mut calls) = self.calls.lock() {
            f(&mut calls);
        }
    }
}

#[async_trait::async_trait]
impl Provider for TestProvider {
    async fn get_accounts(&mut self) -> Result<RawAccounts> {
        self.bump(|c| c.accounts += 1);
        serde_json::from_str(&self.accounts_json).context("Bad seeded accounts data")
    }

    async fn get_categories(&mut self) -> Result<RawCategories> {
        self.bump(|c| c.categories += 1);
        serde_json::from_str(&self.categories_json).context("Bad seeded categories data")
    }

    async fn get_transactions_csv(&mut self) -> Result<Vec<u8>> {
        self.bump(|c| c.transactions_csv += 1);
        Ok(self.transactions_csv.clone())
    }

    async fn close(&mut self) {
        self.bump(|c| c.closes += 1);
    }
}

/// Seed account data.
const ACCOUNT_DATA: &str = r#"[
  { "id": 1001, "accountType": "bank", "fiName": "Big Bank", "accountName": "Checking",
    "isActive": true, "isError": false, "value": 2500.00 },
  { "id": 1002, "accountType": "credit", "fiName": "Big Bank", "accountName": "Rewards Card",
    "isActive": true, "isError": false, "value": -430.25 },
  { "id": 1003, "accountType": "investment", "fiName": "Brokerage Co", "accountName": "Brokerage",
    "isActive": true, "isError": false, "value": 12000.00 },
  { "id": 1004, "accountType": "bank", "fiName": "Old Bank", "accountName": "Closed Savings",
    "isActive": false, "isError": false, "value": 0.00 }
]"#;

/// Seed category data, keyed by category id.
const CATEGORY_DATA: &str = r#"{
  "10": { "name": "Food & Dining", "depth": 1, "parent": { "name": "Root" } },
  "11": { "name": "Groceries", "depth": 2, "parent": { "name": "Food & Dining" } },
  "12": { "name": "Restaurants", "depth": 2, "parent": { "name": "Food & Dining" } },
  "20": { "name": "Auto & Transport", "depth": 1, "parent": { "name": "Root" } },
  "21": { "name": "Gas & Fuel", "depth": 2, "parent": { "name": "Auto & Transport" } },
  "30": { "name": "Income", "depth": 1, "parent": { "name": "Root" } },
  "31": { "name": "Paycheck", "depth": 2, "parent": { "name": "Income" } }
}"#;

/// Seed transaction data. The first row predates the reporting epoch on purpose.
const TRANSACTION_DATA: &str = "\
Date,Description,Original Description,Amount,Transaction Type,Category,Account Name,Labels,Notes
06/15/2009,Ancient Grocer,ANCIENT GROCER,12.00,debit,Groceries,Checking,,
10/21/2019,Safeway,SAFEWAY 123,87.43,debit,Groceries,Rewards Card,,
10/22/2019,Chevron,CHEVRON 42,52.30,debit,Gas & Fuel,Rewards Card,,
10/24/2019,Olive Garden,OLIVE GARDEN,42.30,debit,Restaurants,Rewards Card,,
10/25/2019,Employer Inc,EMPLOYER INC PAYROLL,3200.00,credit,Paycheck,Checking,,
";
