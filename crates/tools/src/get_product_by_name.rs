//! Fuzzy product search by name.
//!
//! The search term is split on whitespace; a product matches when every
//! token appears somewhere in its name, ignoring case.

use async_trait::async_trait;
use shopdesk_core::error::ToolError;
use shopdesk_core::{CatalogStore, Tool};
use shopdesk_security::is_valid_search_term;
use std::sync::Arc;

use crate::outcome::{LookupOutcome, string_arg};

pub struct GetProductByNameTool {
    store: Arc<dyn CatalogStore>,
}

impl GetProductByNameTool {
    pub fn new(store: Arc<dyn CatalogStore>) -> Self {
        Self { store }
    }

    pub async fn lookup(&self, product_name: &str) -> Result<LookupOutcome, ToolError> {
        let tokens: Vec<String> = product_name.split_whitespace().map(str::to_string).collect();
        // A blank term has no tokens to match on.
        if tokens.is_empty() {
            return Ok(LookupOutcome::error("Product name is required."));
        }
        if !is_valid_search_term(product_name) {
            return Ok(LookupOutcome::error("Invalid Product name provided."));
        }

        let mut products = self.store.find_products_by_name(&tokens).await?;

        match products.len() {
            0 => Ok(LookupOutcome::no_match(format!(
                "No products found for the provided name: '{product_name}'."
            ))),
            1 => LookupOutcome::success(products.remove(0)),
            _ => Ok(LookupOutcome::MultipleMatches {
                message: format!("Multiple products found for '{product_name}'."),
                matches: Some(products.into_iter().map(|p| p.product_name).collect()),
            }),
        }
    }
}

#[async_trait]
impl Tool for GetProductByNameTool {
    fn name(&self) -> &str {
        "get_product_by_name"
    }

    fn description(&self) -> &str {
        "Gets product information for a given product_name."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "product_name": {
                    "type": "string",
                    "description": "Product name, case insensitive, fuzzy search."
                }
            },
            "required": ["product_name"]
        })
    }

    async fn execute(&self, input: serde_json::Value) -> Result<String, ToolError> {
        self.lookup(string_arg(&input, "product_name")).await?.to_json()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::catalog;

    #[tokio::test]
    async fn blank_name_is_required_error() {
        let store = catalog();
        let tool = GetProductByNameTool::new(store.clone());
        for blank in ["", "   "] {
            assert_eq!(
                tool.lookup(blank).await.unwrap(),
                LookupOutcome::error("Product name is required.")
            );
        }
        assert_eq!(store.query_count(), 0);
    }

    #[tokio::test]
    async fn blocked_characters_are_rejected() {
        let store = catalog();
        let tool = GetProductByNameTool::new(store.clone());
        assert_eq!(
            tool.lookup("mouse; DROP TABLE products").await.unwrap(),
            LookupOutcome::error("Invalid Product name provided.")
        );
        assert_eq!(store.query_count(), 0);
    }

    #[tokio::test]
    async fn single_hit_returns_the_product() {
        let tool = GetProductByNameTool::new(catalog());
        match tool.lookup("WIRELESS mouse").await.unwrap() {
            LookupOutcome::Success { data } => assert_eq!(data["id"], 10),
            other => panic!("expected success, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn several_hits_list_product_names() {
        let tool = GetProductByNameTool::new(catalog());
        assert_eq!(
            tool.lookup("mouse").await.unwrap(),
            LookupOutcome::MultipleMatches {
                message: "Multiple products found for 'mouse'.".into(),
                matches: Some(vec![
                    "Wireless Mouse".into(),
                    "Wired Mouse".into(),
                    "Mouse Pad".into(),
                ]),
            }
        );
    }

    #[tokio::test]
    async fn no_hits_is_no_match() {
        let tool = GetProductByNameTool::new(catalog());
        assert_eq!(
            tool.lookup("keyboard").await.unwrap(),
            LookupOutcome::no_match("No products found for the provided name: 'keyboard'.")
        );
    }

    #[tokio::test]
    async fn repeated_search_is_idempotent() {
        let tool = GetProductByNameTool::new(catalog());
        let input = serde_json::json!({"product_name": "wire mouse"});
        let first = tool.execute(input.clone()).await.unwrap();
        let second = tool.execute(input).await.unwrap();
        assert_eq!(first, second);
    }
}
