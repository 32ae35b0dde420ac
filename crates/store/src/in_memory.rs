//! In-memory store, useful for testing and demos.
//!
//! Matching mirrors the SQLite backend: names and product tokens compare
//! with ASCII case folding, which is what `COLLATE NOCASE` and `LIKE` do.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use shopdesk_core::error::StoreError;
use shopdesk_core::message::{ChatMessage, SessionId, Turn};
use shopdesk_core::{CatalogStore, ConversationStore, Customer, Order, Product};
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::RwLock;

use crate::seed::CatalogSeed;

/// Keeps the catalog and the conversation log in `Vec`s.
///
/// Every `CatalogStore` call bumps [`InMemoryStore::query_count`], so tests can
/// assert that rejected input never reached the data layer.
pub struct InMemoryStore {
    customers: RwLock<Vec<Customer>>,
    products: RwLock<Vec<Product>>,
    orders: RwLock<Vec<Order>>,
    turns: RwLock<Vec<Turn>>,
    queries: AtomicUsize,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::with_catalog(CatalogSeed::default())
    }

    pub fn with_catalog(seed: CatalogSeed) -> Self {
        Self {
            customers: RwLock::new(seed.customers),
            products: RwLock::new(seed.products),
            orders: RwLock::new(seed.orders),
            turns: RwLock::new(Vec::new()),
            queries: AtomicUsize::new(0),
        }
    }

    /// Number of catalog queries served so far.
    pub fn query_count(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }

    fn count_query(&self) {
        self.queries.fetch_add(1, Ordering::SeqCst);
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack
        .to_ascii_lowercase()
        .contains(&needle.to_ascii_lowercase())
}

#[async_trait]
impl CatalogStore for InMemoryStore {
    fn name(&self) -> &str {
        "in_memory"
    }

    async fn find_order_by_id(&self, order_id: i64) -> Result<Option<Order>, StoreError> {
        self.count_query();
        let orders = self.orders.read().await;
        Ok(orders.iter().find(|o| o.id == order_id).cloned())
    }

    async fn find_customers_by_last_name(
        &self,
        last_name: &str,
    ) -> Result<Vec<Customer>, StoreError> {
        self.count_query();
        let customers = self.customers.read().await;
        let mut found: Vec<Customer> = customers
            .iter()
            .filter(|c| c.last_name.eq_ignore_ascii_case(last_name))
            .cloned()
            .collect();
        found.sort_by_key(|c| c.id);
        Ok(found)
    }

    async fn find_customers_by_name(
        &self,
        last_name: &str,
        first_name: &str,
    ) -> Result<Vec<Customer>, StoreError> {
        self.count_query();
        let customers = self.customers.read().await;
        let mut found: Vec<Customer> = customers
            .iter()
            .filter(|c| {
                c.last_name.eq_ignore_ascii_case(last_name)
                    && contains_ignore_case(&c.first_name, first_name)
            })
            .cloned()
            .collect();
        found.sort_by_key(|c| c.id);
        Ok(found)
    }

    async fn find_orders_by_customer_id(&self, customer_id: i64) -> Result<Vec<Order>, StoreError> {
        self.count_query();
        let orders = self.orders.read().await;
        let mut found: Vec<Order> = orders
            .iter()
            .filter(|o| o.customer_id == customer_id)
            .cloned()
            .collect();
        found.sort_by_key(|o| o.id);
        Ok(found)
    }

    async fn find_product_by_id(&self, product_id: i64) -> Result<Option<Product>, StoreError> {
        self.count_query();
        let products = self.products.read().await;
        Ok(products.iter().find(|p| p.id == product_id).cloned())
    }

    async fn find_products_by_name(&self, tokens: &[String]) -> Result<Vec<Product>, StoreError> {
        self.count_query();
        if tokens.is_empty() {
            return Ok(Vec::new());
        }
        let products = self.products.read().await;
        let mut found: Vec<Product> = products
            .iter()
            .filter(|p| tokens.iter().all(|t| contains_ignore_case(&p.product_name, t)))
            .cloned()
            .collect();
        found.sort_by_key(|p| p.id);
        Ok(found)
    }
}

#[async_trait]
impl ConversationStore for InMemoryStore {
    fn name(&self) -> &str {
        "in_memory"
    }

    async fn append_turn(&self, turn: &Turn) -> Result<(), StoreError> {
        self.turns.write().await.push(turn.clone());
        Ok(())
    }

    async fn load_since(
        &self,
        session_id: &SessionId,
        since: DateTime<Utc>,
    ) -> Result<Vec<ChatMessage>, StoreError> {
        let turns = self.turns.read().await;
        let mut selected: Vec<&Turn> = turns
            .iter()
            .filter(|t| &t.session_id == session_id && t.created_at > since)
            .collect();
        // Stable sort: equal timestamps keep append order.
        selected.sort_by_key(|t| t.created_at);
        Ok(selected.into_iter().map(Turn::to_message).collect())
    }
}
