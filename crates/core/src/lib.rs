//! # Shopdesk Core
//!
//! Domain types, traits, and error definitions for the Shopdesk support agent.
//! This crate has **no framework dependencies**: it defines the conversation
//! model, the catalog entities, and the seams (LLM provider, tools, stores)
//! that every other crate implements against.
//!
//! ## Design Philosophy
//!
//! Every external collaborator is a trait here. Implementations live in their
//! respective crates, which keeps the agent loop testable with scripted
//! providers and in-memory stores.

pub mod catalog;
pub mod error;
pub mod message;
pub mod provider;
pub mod store;
pub mod tool;

// Re-export key types at crate root for ergonomics
pub use catalog::{CatalogStore, Customer, Order, Product};
pub use error::{Error, Result};
pub use message::{ChatMessage, ContentBlock, MessageContent, MessageType, Role, SessionId, Turn};
pub use provider::{ModelRequest, ModelResponse, Provider, StopReason, ToolDefinition, Usage};
pub use store::ConversationStore;
pub use tool::{Tool, ToolCall, ToolRegistry, ToolResult};
