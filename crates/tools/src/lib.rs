//! Lookup tools for the Shopdesk agent.
//!
//! Four read-only tools let the model answer order and product questions:
//! `get_order`, `get_orders`, `get_product_by_id`, and `get_product_by_name`.
//! Each one validates its arguments before touching the catalog and answers
//! with a [`LookupOutcome`] serialized as JSON.

pub mod get_order;
pub mod get_orders;
pub mod get_product_by_id;
pub mod get_product_by_name;
pub mod outcome;

pub use get_order::GetOrderTool;
pub use get_orders::GetOrdersTool;
pub use get_product_by_id::GetProductByIdTool;
pub use get_product_by_name::GetProductByNameTool;
pub use outcome::LookupOutcome;

use shopdesk_core::CatalogStore;
use shopdesk_core::tool::ToolRegistry;
use std::sync::Arc;

/// Create the registry of lookup tools, all sharing one catalog.
pub fn default_registry(store: Arc<dyn CatalogStore>) -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    registry.register(Box::new(GetOrderTool::new(store.clone())));
    registry.register(Box::new(GetOrdersTool::new(store.clone())));
    registry.register(Box::new(GetProductByIdTool::new(store.clone())));
    registry.register(Box::new(GetProductByNameTool::new(store)));
    registry
}
