//! List a customer's orders by name, narrowing ambiguous last names.
//!
//! The lookup walks a fixed decision tree with seven terminal outcomes:
//!
//! | last name matches | first name      | result                                 |
//! |-------------------|-----------------|----------------------------------------|
//! | (missing/invalid) | -               | `error`                                |
//! | none              | ignored         | `no_match`                             |
//! | one               | ignored         | `success` with that customer's orders  |
//! | many              | absent          | `multiple_matches`, ask for first name |
//! | many              | invalid         | `error`                                |
//! | many              | matches none    | `no_match`                             |
//! | many              | matches one     | `success`                              |
//! | many              | matches several | `multiple_matches`, ask for order id   |

use async_trait::async_trait;
use shopdesk_core::error::ToolError;
use shopdesk_core::{CatalogStore, Tool};
use shopdesk_security::is_valid_person_name;
use std::sync::Arc;
use tracing::debug;

use crate::outcome::{LookupOutcome, string_arg};

pub struct GetOrdersTool {
    store: Arc<dyn CatalogStore>,
}

impl GetOrdersTool {
    pub fn new(store: Arc<dyn CatalogStore>) -> Self {
        Self { store }
    }

    /// An empty `first_name` counts as not supplied.
    pub async fn lookup(
        &self,
        last_name: &str,
        first_name: Option<&str>,
    ) -> Result<LookupOutcome, ToolError> {
        if last_name.is_empty() {
            return Ok(LookupOutcome::error("Last name is required."));
        }
        if !is_valid_person_name(last_name) {
            return Ok(LookupOutcome::error("Invalid name provided."));
        }

        let customers = self.store.find_customers_by_last_name(last_name).await?;
        debug!(matches = customers.len(), "Customers by last name");

        match customers.as_slice() {
            [] => {
                return Ok(LookupOutcome::no_match(format!(
                    "No customers found for the last name: '{last_name}'."
                )));
            }
            [customer] => return self.orders_for(customer.id).await,
            _ => {}
        }

        let Some(first_name) = first_name.filter(|f| !f.is_empty()) else {
            return Ok(LookupOutcome::multiple_matches(format!(
                "Multiple customers found with the last name: '{last_name}'. \
                 Please provide a first name to further narrow the results."
            )));
        };
        if !is_valid_person_name(first_name) {
            return Ok(LookupOutcome::error("Invalid name provided."));
        }

        let narrowed = self
            .store
            .find_customers_by_name(last_name, first_name)
            .await?;
        debug!(matches = narrowed.len(), "Customers by full name");

        match narrowed.as_slice() {
            [] => Ok(LookupOutcome::no_match(format!(
                "No customers found for the last name: '{last_name}' and first name: '{first_name}'."
            ))),
            [customer] => self.orders_for(customer.id).await,
            _ => Ok(LookupOutcome::multiple_matches(format!(
                "Multiple customers found with the last name: '{last_name}' and first name: \
                 '{first_name}'. Please provide your order ID to proceed."
            ))),
        }
    }

    async fn orders_for(&self, customer_id: i64) -> Result<LookupOutcome, ToolError> {
        let orders = self.store.find_orders_by_customer_id(customer_id).await?;
        LookupOutcome::success(orders)
    }
}

#[async_trait]
impl Tool for GetOrdersTool {
    fn name(&self) -> &str {
        "get_orders"
    }

    fn description(&self) -> &str {
        "Gets all orders for a given customer_name."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "last_name": {
                    "type": "string",
                    "description": "Customer's last name, case insensitive."
                },
                "first_name": {
                    "type": "string",
                    "description": "Customer's first name, optional. Provide if you have it to narrow results."
                }
            },
            "required": ["last_name"]
        })
    }

    async fn execute(&self, input: serde_json::Value) -> Result<String, ToolError> {
        let last_name = string_arg(&input, "last_name");
        let first_name = string_arg(&input, "first_name");
        self.lookup(last_name, Some(first_name)).await?.to_json()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::catalog;

    fn order_ids(outcome: &LookupOutcome) -> Vec<i64> {
        match outcome {
            LookupOutcome::Success { data } => data
                .as_array()
                .unwrap()
                .iter()
                .map(|o| o["id"].as_i64().unwrap())
                .collect(),
            other => panic!("expected success, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn missing_last_name_is_an_error() {
        let store = catalog();
        let tool = GetOrdersTool::new(store.clone());
        assert_eq!(
            tool.lookup("", Some("Jane")).await.unwrap(),
            LookupOutcome::error("Last name is required.")
        );
        let json = tool.execute(serde_json::json!({"first_name": "Jane"})).await.unwrap();
        assert!(json.contains("Last name is required."));
        assert_eq!(store.query_count(), 0);
    }

    #[tokio::test]
    async fn invalid_last_name_is_an_error() {
        let store = catalog();
        let tool = GetOrdersTool::new(store.clone());
        assert_eq!(
            tool.lookup("Sm1th", None).await.unwrap(),
            LookupOutcome::error("Invalid name provided.")
        );
        assert_eq!(store.query_count(), 0);
    }

    #[tokio::test]
    async fn unknown_last_name_is_no_match_regardless_of_first_name() {
        let tool = GetOrdersTool::new(catalog());
        let expected = LookupOutcome::no_match("No customers found for the last name: 'Nobody'.");
        assert_eq!(tool.lookup("Nobody", None).await.unwrap(), expected);
        assert_eq!(tool.lookup("Nobody", Some("Jane")).await.unwrap(), expected);
    }

    #[tokio::test]
    async fn unique_last_name_succeeds_with_or_without_first_name() {
        let tool = GetOrdersTool::new(catalog());
        let plain = tool.lookup("haddad", None).await.unwrap();
        assert_eq!(order_ids(&plain), vec![1002, 1003]);
        // The first name is ignored once the last name is unique.
        let with_first = tool.lookup("Haddad", Some("Zed")).await.unwrap();
        assert_eq!(with_first, plain);
    }

    #[tokio::test]
    async fn shared_last_name_asks_for_first_name() {
        let tool = GetOrdersTool::new(catalog());
        let expected = LookupOutcome::multiple_matches(
            "Multiple customers found with the last name: 'Smith'. \
             Please provide a first name to further narrow the results.",
        );
        assert_eq!(tool.lookup("Smith", None).await.unwrap(), expected);
        assert_eq!(tool.lookup("Smith", Some("")).await.unwrap(), expected);
    }

    #[tokio::test]
    async fn shared_last_name_with_invalid_first_name() {
        let tool = GetOrdersTool::new(catalog());
        assert_eq!(
            tool.lookup("Smith", Some("J4ne")).await.unwrap(),
            LookupOutcome::error("Invalid name provided.")
        );
    }

    #[tokio::test]
    async fn first_name_matching_nobody() {
        let tool = GetOrdersTool::new(catalog());
        assert_eq!(
            tool.lookup("Smith", Some("Zoe")).await.unwrap(),
            LookupOutcome::no_match(
                "No customers found for the last name: 'Smith' and first name: 'Zoe'."
            )
        );
    }

    #[tokio::test]
    async fn first_name_unique_to_one_customer() {
        let tool = GetOrdersTool::new(catalog());
        let outcome = tool.lookup("Smith", Some("jane")).await.unwrap();
        assert_eq!(order_ids(&outcome), vec![1001]);
    }

    #[tokio::test]
    async fn first_name_substring_still_ambiguous() {
        let tool = GetOrdersTool::new(catalog());
        // "Jan" is a substring of both "Jane" and "Jan".
        let outcome = tool.lookup("Smith", Some("Jan")).await.unwrap();
        assert_eq!(
            outcome,
            LookupOutcome::multiple_matches(
                "Multiple customers found with the last name: 'Smith' and first name: \
                 'Jan'. Please provide your order ID to proceed."
            )
        );
    }

    #[tokio::test]
    async fn execute_reads_both_arguments() {
        let tool = GetOrdersTool::new(catalog());
        let json = tool
            .execute(serde_json::json!({"last_name": "Smith", "first_name": "Jane"}))
            .await
            .unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["status"], "success");
        assert_eq!(value["data"][0]["id"], 1001);
    }
}
