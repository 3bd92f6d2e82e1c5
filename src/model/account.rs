//! Account records and the processed accounts dataset.

use crate::model::{Amount, Versioned};
use crate::Result;
use anyhow::Context;
use serde::{Deserialize, Serialize};

/// A single account exactly as the provider reports it. Unknown fields are ignored so that
/// provider payload additions do not break deserialization of older cached entries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawAccount {
    pub id: i64,
    pub account_type: String,
    pub fi_name: String,
    #[serde(default)]
    pub fi_login_display_name: String,
    pub account_name: String,
    #[serde(default)]
    pub yodlee_account_number_last4: String,
    pub is_active: bool,
    #[serde(default)]
    pub last_updated: i64,
    #[serde(default)]
    pub is_error: bool,
    pub value: f64,
}

/// The unprocessed accounts payload: every account the provider knows about.
pub type RawAccounts = Vec<RawAccount>;

/// One row of the processed accounts table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct AccountRow {
    pub id: i64,
    pub account_type: String,
    pub fi_name: String,
    pub account_name: String,
    pub value: Amount,
}

/// The processed accounts dataset. Holds only active accounts. The net-worth summary is
/// recomputed on demand and never cached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct AccountsData {
    schema_version: u32,
    rows: Vec<AccountRow>,
}

impl Versioned for AccountsData {
    const CURRENT_SCHEMA: u32 = 1;

    fn schema_version(&self) -> u32 {
        self.schema_version
    }
}

impl AccountsData {
    /// Builds the processed table from the raw payload, dropping inactive accounts.
    pub fn process(raw: &RawAccounts) -> Result<Self> {
        let mut rows = Vec::new();
        for account in raw.iter().filter(|a| a.is_active) {
            let value = Amount::try_from(account.value).with_context(|| {
                format!("Bad value for account '{}'", account.account_name)
            })?;
            rows.push(AccountRow {
                id: account.id,
                account_type: account.account_type.clone(),
                fi_name: account.fi_name.clone(),
                account_name: account.account_name.clone(),
                value,
            });
        }
        Ok(Self {
            schema_version: Self::CURRENT_SCHEMA,
            rows,
        })
    }

    pub fn rows(&self) -> &[AccountRow] {
        &self.rows
    }

    /// Computes the net-worth summary as ordered label/value pairs.
    pub fn summary(&self) -> Vec<(String, Amount)> {
        let savings = self.sum_by_type(&["bank", "credit"]);
        let investments = self.sum_by_type(&["investment"]);
        let assets = self.sum_by_type(&["real estate", "vehicle"]);
        let total: Amount = self.rows.iter().map(|r| r.value).sum();
        let unaccounted = total - savings - investments - assets;
        let total_wo_assets = total - assets;
        vec![
            ("Savings".to_string(), savings),
            ("Investments".to_string(), investments),
            ("Assets".to_string(), assets),
            ("Unaccounted".to_string(), unaccounted),
            ("Total (w/o assets)".to_string(), total_wo_assets),
            ("Grand Total".to_string(), total),
        ]
    }

    fn sum_by_type(&self, types: &[&str]) -> Amount {
        self.rows
            .iter()
            .filter(|r| types.contains(&r.account_type.as_str()))
            .map(|r| r.value)
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn raw(id: i64, account_type: &str, name: &str, is_active: bool, value: f64) -> RawAccount {
        RawAccount {
            id,
            account_type: account_type.to_string(),
            fi_name: "Test Bank".to_string(),
            fi_login_display_name: String::new(),
            account_name: name.to_string(),
            yodlee_account_number_last4: String::new(),
            is_active,
            last_updated: 0,
            is_error: false,
            value,
        }
    }

    #[test]
    fn drops_inactive_accounts() {
        let raw_accounts = vec![
            raw(1, "bank", "Checking", true, 100.0),
            raw(2, "bank", "Old Checking", false, 55.0),
        ];
        let data = AccountsData::process(&raw_accounts).unwrap();
        assert_eq!(data.rows().len(), 1);
        assert_eq!(data.rows()[0].account_name, "Checking");
    }

    #[test]
    fn summary_groups_by_account_type() {
        let raw_accounts = vec![
            raw(1, "bank", "Checking", true, 1000.0),
            raw(2, "credit", "Card", true, -200.0),
            raw(3, "investment", "Brokerage", true, 5000.0),
            raw(4, "real estate", "House", true, 300000.0),
            raw(5, "loan", "Mortgage", true, -250000.0),
        ];
        let data = AccountsData::process(&raw_accounts).unwrap();
        let summary = data.summary();
        let get = |label: &str| {
            summary
                .iter()
                .find(|(l, _)| l == label)
                .map(|(_, v)| *v)
                .unwrap()
        };
        assert_eq!(get("Savings"), Amount::from_str("800").unwrap());
        assert_eq!(get("Investments"), Amount::from_str("5000").unwrap());
        assert_eq!(get("Assets"), Amount::from_str("300000").unwrap());
        assert_eq!(get("Unaccounted"), Amount::from_str("-250000").unwrap());
        assert_eq!(get("Grand Total"), Amount::from_str("55800").unwrap());
    }

    #[test]
    fn raw_account_parses_provider_json() {
        let json = r#"{
            "id": 9212055,
            "accountType": "bank",
            "fiName": "Big Bank",
            "accountName": "Checking",
            "isActive": true,
            "isError": false,
            "value": 123.45,
            "currency": "USD"
        }"#;
        let account: RawAccount = serde_json::from_str(json).unwrap();
        assert_eq!(account.account_type, "bank");
        assert!(account.is_active);
    }
}
