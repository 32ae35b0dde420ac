//! Catalog entities and the parameterized queries the lookup tools run.
//!
//! The store speaks only in these typed rows. Every argument that reaches a
//! `CatalogStore` method has already passed input validation.

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::StoreError;

/// A customer record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// An order line as stored. `order_date` serializes as an ISO-8601 date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: i64,
    pub customer_id: i64,
    pub product_id: i64,
    pub quantity: i64,
    pub order_date: NaiveDate,
    pub status: String,
    /// Order total in currency units.
    pub total: f64,
}

/// A product record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: i64,
    pub product_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Unit price in currency units.
    pub price: f64,
    pub stock: i64,
}

/// Convert a fixed-point amount in cents to floating-point currency units.
pub fn cents_to_units(cents: i64) -> f64 {
    cents as f64 / 100.0
}

/// Convert floating-point currency units to cents, rounding to the nearest cent.
pub fn units_to_cents(units: f64) -> i64 {
    (units * 100.0).round() as i64
}

/// Read-only queries over customers, orders, and products.
///
/// Implementations: SQLite, in-memory (for testing).
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// The backend name (e.g., "sqlite", "in_memory").
    fn name(&self) -> &str;

    async fn find_order_by_id(&self, order_id: i64)
        -> std::result::Result<Option<Order>, StoreError>;

    /// Customers whose last name equals `last_name`, ignoring case.
    async fn find_customers_by_last_name(
        &self,
        last_name: &str,
    ) -> std::result::Result<Vec<Customer>, StoreError>;

    /// Customers with exactly `last_name` (ignoring case) whose first name
    /// contains `first_name` (ignoring case).
    async fn find_customers_by_name(
        &self,
        last_name: &str,
        first_name: &str,
    ) -> std::result::Result<Vec<Customer>, StoreError>;

    async fn find_orders_by_customer_id(
        &self,
        customer_id: i64,
    ) -> std::result::Result<Vec<Order>, StoreError>;

    async fn find_product_by_id(
        &self,
        product_id: i64,
    ) -> std::result::Result<Option<Product>, StoreError>;

    /// Products whose name contains every one of `tokens`, ignoring case.
    async fn find_products_by_name(
        &self,
        tokens: &[String],
    ) -> std::result::Result<Vec<Product>, StoreError>;
}
