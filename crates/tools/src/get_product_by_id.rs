//! Look up a single product by its id.

use async_trait::async_trait;
use shopdesk_core::error::ToolError;
use shopdesk_core::{CatalogStore, Tool};
use shopdesk_security::is_valid_identifier;
use std::sync::Arc;

use crate::outcome::{LookupOutcome, string_arg};

pub struct GetProductByIdTool {
    store: Arc<dyn CatalogStore>,
}

impl GetProductByIdTool {
    pub fn new(store: Arc<dyn CatalogStore>) -> Self {
        Self { store }
    }

    pub async fn lookup(&self, product_id: &str) -> Result<LookupOutcome, ToolError> {
        if !is_valid_identifier(product_id) {
            return Ok(LookupOutcome::error("Invalid Product ID provided."));
        }

        let not_found = || {
            LookupOutcome::no_match(format!(
                "No product data available for product ID: '{product_id}'."
            ))
        };

        let Ok(id) = product_id.parse::<i64>() else {
            return Ok(not_found());
        };

        match self.store.find_product_by_id(id).await? {
            Some(product) => LookupOutcome::success(product),
            None => Ok(not_found()),
        }
    }
}

#[async_trait]
impl Tool for GetProductByIdTool {
    fn name(&self) -> &str {
        "get_product_by_id"
    }

    fn description(&self) -> &str {
        "Gets product information for a given product_id."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "product_id": {
                    "type": "string",
                    "description": "The product_id for which to look up the product"
                }
            },
            "required": ["product_id"]
        })
    }

    async fn execute(&self, input: serde_json::Value) -> Result<String, ToolError> {
        self.lookup(string_arg(&input, "product_id")).await?.to_json()
    }
}
