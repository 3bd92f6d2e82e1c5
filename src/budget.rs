//! Budget group configuration and validation.
//!
//! Users describe their budget in `budgets.json` as a mapping of group name to a target
//! dollar value and the list of categories that belong to the group. The mapping is
//! cross-checked against the full category set: every category must belong to exactly one
//! group. Violations are configuration errors that abort the request, never silently
//! tolerated, because a miscategorized budget makes every downstream report wrong.

use crate::Result;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::error::Error as StdError;
use std::fmt::{Display, Formatter};
use std::path::Path;

/// A budget validation failure. These are typed so callers can distinguish them from
/// provider or I/O failures, and so tests can assert the exact violation.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum BudgetError {
    /// One or more categories are listed in more than one budget group.
    Duplicated(Vec<String>),
    /// One or more provider categories are missing from the budget configuration.
    Unbudgeted(Vec<String>),
}

impl Display for BudgetError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            BudgetError::Duplicated(categories) => {
                write!(f, "Categories listed in more than one budget group: {}", categories.join(", "))
            }
            BudgetError::Unbudgeted(categories) => {
                write!(f, "Categories missing from the budget configuration: {}", categories.join(", "))
            }
        }
    }
}

impl StdError for BudgetError {}

/// One group in the budgets file: a target dollar value and the categories in the group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetGroupDef(f64, Vec<String>);

impl BudgetGroupDef {
    pub fn target(&self) -> f64 {
        self.0
    }

    pub fn categories(&self) -> &[String] {
        &self.1
    }
}

/// The parsed `budgets.json` file, group name to group definition.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BudgetsFile(BTreeMap<String, BudgetGroupDef>);

impl BudgetsFile {
    /// Loads and parses the budgets file.
    pub async fn load(path: &Path) -> Result<Self> {
        let content = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Unable to read the budgets file at '{}'", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Unable to parse the budgets file at '{}'", path.display()))
    }

    pub fn groups(&self) -> &BTreeMap<String, BudgetGroupDef> {
        &self.0
    }
}

/// The validated category to budget-group mapping.
///
/// This is cheap to build and is rebuilt on every transactions cache miss rather than
/// cached, so edits to `budgets.json` take effect without waiting out the cache TTL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BudgetGroups {
    budget_parents: HashMap<String, String>,
}

impl BudgetGroups {
    /// Validates `budgets` against the full set of provider categories in `parents` and
    /// builds the category to group lookup.
    pub fn new(
        budgets: &BudgetsFile,
        parents: &HashMap<String, String>,
    ) -> std::result::Result<Self, BudgetError> {
        let mut budget_parents = HashMap::new();
        let mut duplicated = Vec::new();
        for (group, def) in budgets.groups() {
            for category in def.categories() {
                if budget_parents.insert(category.clone(), group.clone()).is_some() {
                    duplicated.push(category.clone());
                }
            }
        }
        if !duplicated.is_empty() {
            duplicated.sort();
            duplicated.dedup();
            return Err(BudgetError::Duplicated(duplicated));
        }

        let mut unbudgeted: Vec<String> = parents
            .keys()
            .filter(|category| !budget_parents.contains_key(*category))
            .cloned()
            .collect();
        if !unbudgeted.is_empty() {
            unbudgeted.sort();
            return Err(BudgetError::Unbudgeted(unbudgeted));
        }

        Ok(Self { budget_parents })
    }

    /// Returns the category to budget-group mapping.
    pub fn budget_parents(&self) -> &HashMap<String, String> {
        &self.budget_parents
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn budgets(json: &str) -> BudgetsFile {
        serde_json::from_str(json).unwrap()
    }

    fn parents(categories: &[&str]) -> HashMap<String, String> {
        categories
            .iter()
            .map(|c| (c.to_string(), "Parent".to_string()))
            .collect()
    }

    #[test]
    fn valid_configuration_builds_the_lookup() {
        let file = budgets(r#"{ "Food": [600, ["Groceries", "Restaurants"]], "Income": [0, ["Paycheck"]] }"#);
        assert_eq!(file.groups().get("Food").unwrap().target(), 600.0);
        let groups =
            BudgetGroups::new(&file, &parents(&["Groceries", "Restaurants", "Paycheck"])).unwrap();
        assert_eq!(groups.budget_parents().get("Groceries").unwrap(), "Food");
        assert_eq!(groups.budget_parents().get("Paycheck").unwrap(), "Income");
    }

    #[test]
    fn duplicated_category_is_a_configuration_error() {
        let file = budgets(r#"{ "Food": [600, ["Groceries"]], "Home": [100, ["Groceries"]] }"#);
        let err = BudgetGroups::new(&file, &parents(&["Groceries"])).unwrap_err();
        assert_eq!(err, BudgetError::Duplicated(vec!["Groceries".to_string()]));
    }

    #[test]
    fn unbudgeted_category_is_a_configuration_error() {
        let file = budgets(r#"{ "Food": [600, ["Groceries"]] }"#);
        let err = BudgetGroups::new(&file, &parents(&["Groceries", "Gas & Fuel"])).unwrap_err();
        assert_eq!(err, BudgetError::Unbudgeted(vec!["Gas & Fuel".to_string()]));
    }
}
