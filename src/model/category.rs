//! Category records and the processed categories dataset.
//!
//! The provider models categories as a two-level tree: a root-level category has the
//! synthetic parent `Root`, and every other category hangs off exactly one root-level
//! parent. Deeper nesting is not supported by this data model.

use crate::model::Versioned;
use crate::Result;
use anyhow::bail;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// The name the provider gives the synthetic root of the category tree.
const ROOT: &str = "Root";

/// The maximum category depth the data model supports.
const MAX_DEPTH: u8 = 2;

/// A single category exactly as the provider reports it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawCategory {
    pub name: String,
    pub depth: u8,
    pub parent: ParentRef,
    #[serde(default)]
    pub notification_name: Option<String>,
}

/// The parent reference embedded in a raw category record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParentRef {
    pub name: String,
}

/// The unprocessed categories payload, keyed by the provider's category id.
pub type RawCategories = BTreeMap<String, RawCategory>;

/// One row of the processed categories table. `parent_category` is normalized: a root-level
/// category is its own parent, which makes grouping transactions by parent straightforward.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct CategoryRow {
    pub id: String,
    pub name: String,
    pub depth: u8,
    pub parent_category: String,
}

/// The processed categories dataset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct CategoriesData {
    schema_version: u32,
    rows: Vec<CategoryRow>,
}

impl Versioned for CategoriesData {
    const CURRENT_SCHEMA: u32 = 1;

    fn schema_version(&self) -> u32 {
        self.schema_version
    }
}

impl CategoriesData {
    /// Builds the processed table from the raw payload.
    ///
    /// # Errors
    /// Returns an error if any category is deeper than two levels.
    pub fn process(raw: &RawCategories) -> Result<Self> {
        let mut rows = Vec::new();
        for (id, category) in raw {
            if category.depth > MAX_DEPTH {
                bail!(
                    "Category '{}' has depth {}, categories deeper than {} levels are not supported",
                    category.name,
                    category.depth,
                    MAX_DEPTH
                );
            }
            let parent_category = if category.parent.name == ROOT {
                category.name.clone()
            } else {
                category.parent.name.clone()
            };
            rows.push(CategoryRow {
                id: id.clone(),
                name: category.name.clone(),
                depth: category.depth,
                parent_category,
            });
        }
        Ok(Self {
            schema_version: Self::CURRENT_SCHEMA,
            rows,
        })
    }

    pub fn rows(&self) -> &[CategoryRow] {
        &self.rows
    }

    /// Returns the category name to parent-category name mapping for all categories.
    pub fn parent_map(&self) -> HashMap<String, String> {
        self.rows
            .iter()
            .map(|r| (r.name.clone(), r.parent_category.clone()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(name: &str, depth: u8, parent: &str) -> RawCategory {
        RawCategory {
            name: name.to_string(),
            depth,
            parent: ParentRef {
                name: parent.to_string(),
            },
            notification_name: None,
        }
    }

    fn raw_map(items: &[(&str, RawCategory)]) -> RawCategories {
        items
            .iter()
            .map(|(id, c)| (id.to_string(), c.clone()))
            .collect()
    }

    #[test]
    fn root_categories_parent_to_themselves() {
        let raw_categories = raw_map(&[
            ("1", raw("Food & Dining", 1, "Root")),
            ("2", raw("Groceries", 2, "Food & Dining")),
        ]);
        let data = CategoriesData::process(&raw_categories).unwrap();
        let parents = data.parent_map();
        assert_eq!(parents.get("Food & Dining").unwrap(), "Food & Dining");
        assert_eq!(parents.get("Groceries").unwrap(), "Food & Dining");
    }

    #[test]
    fn depth_beyond_two_is_an_error() {
        let raw_categories = raw_map(&[("1", raw("Too Deep", 3, "Groceries"))]);
        let result = CategoriesData::process(&raw_categories);
        assert!(result.is_err());
        let message = result.unwrap_err().to_string();
        assert!(message.contains("Too Deep"));
    }

    #[test]
    fn raw_category_parses_provider_json() {
        let json = r#"{
            "name": "Groceries",
            "depth": 2,
            "parent": { "name": "Food & Dining" },
            "notificationName": "Groceries"
        }"#;
        let category: RawCategory = serde_json::from_str(json).unwrap();
        assert_eq!(category.parent.name, "Food & Dining");
    }
}
