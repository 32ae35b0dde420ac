//! Look up a single order by its id.

use async_trait::async_trait;
use shopdesk_core::error::ToolError;
use shopdesk_core::{CatalogStore, Tool};
use shopdesk_security::is_valid_identifier;
use std::sync::Arc;

use crate::outcome::{LookupOutcome, string_arg};

pub struct GetOrderTool {
    store: Arc<dyn CatalogStore>,
}

impl GetOrderTool {
    pub fn new(store: Arc<dyn CatalogStore>) -> Self {
        Self { store }
    }

    pub async fn lookup(&self, order_id: &str) -> Result<LookupOutcome, ToolError> {
        if !is_valid_identifier(order_id) {
            return Ok(LookupOutcome::error("Invalid Order ID provided."));
        }

        let not_found = || {
            LookupOutcome::no_match(format!("No order data available for Order ID: '{order_id}'."))
        };

        // Digits that overflow i64 cannot name a stored row.
        let Ok(id) = order_id.parse::<i64>() else {
            return Ok(not_found());
        };

        match self.store.find_order_by_id(id).await? {
            Some(order) => LookupOutcome::success(order),
            None => Ok(not_found()),
        }
    }
}

#[async_trait]
impl Tool for GetOrderTool {
    fn name(&self) -> &str {
        "get_order"
    }

    fn description(&self) -> &str {
        "Gets a single order for a given order_id."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "order_id": {
                    "type": "string",
                    "description": "The order_id for which to look up the order"
                }
            },
            "required": ["order_id"]
        })
    }

    async fn execute(&self, input: serde_json::Value) -> Result<String, ToolError> {
        self.lookup(string_arg(&input, "order_id")).await?.to_json()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::catalog;

    #[tokio::test]
    async fn finds_existing_order() {
        let store = catalog();
        let tool = GetOrderTool::new(store.clone());
        let outcome = tool.lookup("1001").await.unwrap();
        match outcome {
            LookupOutcome::Success { data } => {
                assert_eq!(data["id"], 1001);
                assert_eq!(data["order_date"], "2025-03-14");
                assert_eq!(data["total"], 49.98);
            }
            other => panic!("expected success, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn unknown_order_is_no_match() {
        let tool = GetOrderTool::new(catalog());
        assert_eq!(
            tool.lookup("4242").await.unwrap(),
            LookupOutcome::no_match("No order data available for Order ID: '4242'.")
        );
    }

    #[tokio::test]
    async fn invalid_id_never_reaches_the_store() {
        let store = catalog();
        let tool = GetOrderTool::new(store.clone());
        for bad in ["", "abc", "10-01", "1001 ", "1;DROP TABLE orders"] {
            assert_eq!(
                tool.lookup(bad).await.unwrap(),
                LookupOutcome::error("Invalid Order ID provided.")
            );
        }
        assert_eq!(store.query_count(), 0);
    }

    #[tokio::test]
    async fn overflowing_id_is_no_match_without_query() {
        let store = catalog();
        let tool = GetOrderTool::new(store.clone());
        let outcome = tool.lookup("99999999999999999999999").await.unwrap();
        assert_eq!(outcome.status(), "no_match");
        assert_eq!(store.query_count(), 0);
    }

    #[tokio::test]
    async fn numeric_argument_is_rejected() {
        let tool = GetOrderTool::new(catalog());
        let json = tool
            .execute(serde_json::json!({"order_id": 1001}))
            .await
            .unwrap();
        assert_eq!(
            json,
            r#"{"status":"error","message":"Invalid Order ID provided."}"#
        );
    }
}
