//! JSON catalog fixtures.
//!
//! ```json
//! {
//!   "customers": [{"id": 1, "first_name": "Jane", "last_name": "Smith"}],
//!   "products":  [{"id": 10, "product_name": "Wireless Mouse", "price": 24.99, "stock": 40}],
//!   "orders":    [{"id": 1001, "customer_id": 1, "product_id": 10, "quantity": 2,
//!                  "order_date": "2025-03-14", "status": "shipped", "total": 49.98}]
//! }
//! ```

use serde::{Deserialize, Serialize};
use shopdesk_core::error::StoreError;
use shopdesk_core::{Customer, Order, Product};

/// A full catalog snapshot that can be loaded into any backend.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CatalogSeed {
    #[serde(default)]
    pub customers: Vec<Customer>,
    #[serde(default)]
    pub products: Vec<Product>,
    #[serde(default)]
    pub orders: Vec<Order>,
}

impl CatalogSeed {
    pub fn from_json(json: &str) -> Result<Self, StoreError> {
        serde_json::from_str(json)
            .map_err(|e| StoreError::Corrupt(format!("catalog fixture: {e}")))
    }

    /// Every order must point at a customer and a product in the same fixture.
    pub fn validate(&self) -> Result<(), StoreError> {
        for order in &self.orders {
            if !self.customers.iter().any(|c| c.id == order.customer_id) {
                return Err(StoreError::Corrupt(format!(
                    "order {} references unknown customer {}",
                    order.id, order.customer_id
                )));
            }
            if !self.products.iter().any(|p| p.id == order.product_id) {
                return Err(StoreError::Corrupt(format!(
                    "order {} references unknown product {}",
                    order.id, order.product_id
                )));
            }
        }
        Ok(())
    }

    pub fn summary(&self) -> SeedSummary {
        SeedSummary {
            customers: self.customers.len(),
            products: self.products.len(),
            orders: self.orders.len(),
        }
    }
}

/// Row counts written by a seed run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeedSummary {
    pub customers: usize,
    pub products: usize,
    pub orders: usize,
}

impl std::fmt::Display for SeedSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} customers, {} products, {} orders",
            self.customers, self.products, self.orders
        )
    }
}
