//! Transaction records and the processed transactions dataset.
//!
//! The provider hands transactions over as a CSV byte stream with a fixed column set. The
//! processed table keeps only rows on or after the epoch date, derives calendar columns,
//! tags each row with its parent category and budget group, and normalizes the sign of the
//! amount by transaction type.

use crate::model::{Amount, Versioned};
use crate::Result;
use anyhow::{bail, Context};
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Transactions before this date are discarded: older provider data predates reliable
/// categorization and is not worth reporting on.
fn epoch() -> NaiveDate {
    NaiveDate::from_ymd_opt(2011, 1, 1).expect("the epoch is a valid date")
}

/// The debit/credit marker on a provider transaction row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    Debit,
    Credit,
}

impl FromStr for TransactionType {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "debit" => Ok(TransactionType::Debit),
            "credit" => Ok(TransactionType::Credit),
            other => bail!("Unknown transaction type '{other}'"),
        }
    }
}

impl Display for TransactionType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            TransactionType::Debit => write!(f, "debit"),
            TransactionType::Credit => write!(f, "credit"),
        }
    }
}

/// One record of the provider's transactions CSV, column names as found in the header row.
#[derive(Debug, Clone, Deserialize)]
struct CsvRecord {
    #[serde(rename = "Date")]
    date: String,
    #[serde(rename = "Description")]
    description: String,
    #[serde(rename = "Original Description", default)]
    original_description: String,
    #[serde(rename = "Amount")]
    amount: String,
    #[serde(rename = "Transaction Type")]
    transaction_type: String,
    #[serde(rename = "Category")]
    category: String,
    #[serde(rename = "Account Name")]
    account_name: String,
    #[serde(rename = "Labels", default)]
    labels: String,
    #[serde(rename = "Notes", default)]
    notes: String,
}

/// One row of the processed transactions table.
///
/// Sign convention: debit amounts are positive and credit amounts are negative, so that
/// spending sums positive in expense reports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct TransactionRow {
    pub date: NaiveDate,
    pub description: String,
    pub original_description: String,
    pub amount: Amount,
    pub transaction_type: TransactionType,
    pub category: String,
    pub account_name: String,
    pub labels: String,
    pub notes: String,
    pub year: i32,
    pub month: u32,
    pub day_of_year: u32,
    pub parent: Option<String>,
    pub budget_group: Option<String>,
}

/// The processed transactions dataset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct TransactionsData {
    schema_version: u32,
    rows: Vec<TransactionRow>,
}

impl Versioned for TransactionsData {
    const CURRENT_SCHEMA: u32 = 1;

    fn schema_version(&self) -> u32 {
        self.schema_version
    }
}

impl TransactionsData {
    /// Builds the processed table from the raw CSV bytes.
    ///
    /// `parents` maps category to parent category and `budget_parents` maps category to
    /// budget group. Both lookups are optional per row: a category missing from either map
    /// leaves the corresponding column empty rather than failing the whole table.
    pub fn process(
        raw_csv: &[u8],
        parents: &HashMap<String, String>,
        budget_parents: &HashMap<String, String>,
    ) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new().from_reader(raw_csv);
        let mut rows = Vec::new();
        for (ix, record) in reader.deserialize::<CsvRecord>().enumerate() {
            let record = record.with_context(|| {
                format!("Unable to parse transactions CSV at record {}", ix + 1)
            })?;
            let date = parse_date(&record.date)
                .with_context(|| format!("Bad date '{}' at record {}", record.date, ix + 1))?;
            if date < epoch() {
                continue;
            }
            let transaction_type = TransactionType::from_str(&record.transaction_type)
                .with_context(|| format!("Bad transaction type at record {}", ix + 1))?;
            let unsigned = Amount::from_str(&record.amount)
                .with_context(|| format!("Bad amount '{}' at record {}", record.amount, ix + 1))?;
            let amount = match transaction_type {
                TransactionType::Debit => unsigned.abs(),
                TransactionType::Credit => -unsigned.abs(),
            };
            rows.push(TransactionRow {
                date,
                description: record.description,
                original_description: record.original_description,
                amount,
                transaction_type,
                category: record.category.clone(),
                account_name: record.account_name,
                labels: record.labels,
                notes: record.notes,
                year: date.year(),
                month: date.month(),
                day_of_year: date.ordinal(),
                parent: parents.get(&record.category).cloned(),
                budget_group: budget_parents.get(&record.category).cloned(),
            });
        }
        Ok(Self {
            schema_version: Self::CURRENT_SCHEMA,
            rows,
        })
    }

    pub fn rows(&self) -> &[TransactionRow] {
        &self.rows
    }

    /// Sums amounts by budget group. Rows without a budget group are skipped.
    pub fn totals_by_budget_group(&self) -> HashMap<String, Amount> {
        let mut totals: HashMap<String, Amount> = HashMap::new();
        for row in &self.rows {
            if let Some(group) = &row.budget_group {
                let entry = totals.entry(group.clone()).or_insert(Amount::ZERO);
                *entry = *entry + row.amount;
            }
        }
        totals
    }

    /// Writes the processed table as CSV.
    pub fn to_csv(&self) -> Result<String> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        for row in &self.rows {
            writer
                .serialize(row)
                .context("Unable to serialize a transaction row as CSV")?;
        }
        let bytes = writer
            .into_inner()
            .map_err(|e| anyhow::anyhow!("Unable to finish writing transactions CSV: {}", e.into_error()))?;
        String::from_utf8(bytes).context("Transactions CSV is not valid UTF-8")
    }
}

/// The provider has exported dates both as `10/21/2019` and as `2019-10-21` over time.
fn parse_date(s: &str) -> Result<NaiveDate> {
    let s = s.trim();
    if let Ok(date) = NaiveDate::parse_from_str(s, "%m/%d/%Y") {
        return Ok(date);
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .with_context(|| format!("Unable to parse '{s}' as a date"))
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str =
        "Date,Description,Original Description,Amount,Transaction Type,Category,Account Name,Labels,Notes\n";

    fn maps() -> (HashMap<String, String>, HashMap<String, String>) {
        let parents = HashMap::from([
            ("Groceries".to_string(), "Food & Dining".to_string()),
            ("Paycheck".to_string(), "Income".to_string()),
        ]);
        let budget_parents = HashMap::from([
            ("Groceries".to_string(), "Food".to_string()),
            ("Paycheck".to_string(), "Income".to_string()),
        ]);
        (parents, budget_parents)
    }

    #[test]
    fn debit_is_positive_credit_is_negative() {
        let csv = format!(
            "{HEADER}\
             10/21/2019,Safeway,SAFEWAY 123,50.00,debit,Groceries,Checking,,\n\
             10/22/2019,Employer,EMPLOYER INC,30.00,credit,Paycheck,Checking,,\n"
        );
        let (parents, budget_parents) = maps();
        let data = TransactionsData::process(csv.as_bytes(), &parents, &budget_parents).unwrap();
        assert_eq!(data.rows()[0].amount.to_string(), "50.00");
        assert_eq!(data.rows()[1].amount.to_string(), "-30.00");
    }

    #[test]
    fn sign_is_normalized_even_when_export_is_already_signed() {
        let csv = format!(
            "{HEADER}\
             10/21/2019,Safeway,SAFEWAY 123,-50.00,debit,Groceries,Checking,,\n"
        );
        let (parents, budget_parents) = maps();
        let data = TransactionsData::process(csv.as_bytes(), &parents, &budget_parents).unwrap();
        assert_eq!(data.rows()[0].amount.to_string(), "50.00");
    }

    #[test]
    fn rows_before_the_epoch_are_dropped() {
        let csv = format!(
            "{HEADER}\
             12/31/2010,Old,OLD,10.00,debit,Groceries,Checking,,\n\
             01/01/2011,New,NEW,10.00,debit,Groceries,Checking,,\n"
        );
        let (parents, budget_parents) = maps();
        let data = TransactionsData::process(csv.as_bytes(), &parents, &budget_parents).unwrap();
        assert_eq!(data.rows().len(), 1);
        assert_eq!(data.rows()[0].description, "New");
    }

    #[test]
    fn derives_calendar_and_lookup_columns() {
        let csv = format!(
            "{HEADER}\
             02/05/2019,Safeway,SAFEWAY 123,50.00,debit,Groceries,Checking,,\n"
        );
        let (parents, budget_parents) = maps();
        let data = TransactionsData::process(csv.as_bytes(), &parents, &budget_parents).unwrap();
        let row = &data.rows()[0];
        assert_eq!(row.year, 2019);
        assert_eq!(row.month, 2);
        assert_eq!(row.day_of_year, 36);
        assert_eq!(row.parent.as_deref(), Some("Food & Dining"));
        assert_eq!(row.budget_group.as_deref(), Some("Food"));
    }

    #[test]
    fn unknown_category_leaves_lookup_columns_empty() {
        let csv = format!(
            "{HEADER}\
             02/05/2019,Mystery,MYSTERY,5.00,debit,Unmapped,Checking,,\n"
        );
        let (parents, budget_parents) = maps();
        let data = TransactionsData::process(csv.as_bytes(), &parents, &budget_parents).unwrap();
        assert_eq!(data.rows()[0].parent, None);
        assert_eq!(data.rows()[0].budget_group, None);
    }

    #[test]
    fn unknown_transaction_type_is_an_error() {
        let csv = format!(
            "{HEADER}\
             02/05/2019,Odd,ODD,5.00,transfer,Groceries,Checking,,\n"
        );
        let (parents, budget_parents) = maps();
        assert!(TransactionsData::process(csv.as_bytes(), &parents, &budget_parents).is_err());
    }

    #[test]
    fn totals_by_budget_group_sums_signed_amounts() {
        let csv = format!(
            "{HEADER}\
             10/21/2019,Safeway,SAFEWAY,50.00,debit,Groceries,Checking,,\n\
             10/22/2019,Safeway,SAFEWAY,25.00,debit,Groceries,Checking,,\n\
             10/23/2019,Employer,EMPLOYER,30.00,credit,Paycheck,Checking,,\n"
        );
        let (parents, budget_parents) = maps();
        let data = TransactionsData::process(csv.as_bytes(), &parents, &budget_parents).unwrap();
        let totals = data.totals_by_budget_group();
        assert_eq!(totals.get("Food").unwrap().to_string(), "75.00");
        assert_eq!(totals.get("Income").unwrap().to_string(), "-30.00");
    }
}
