//! The Shopdesk agent loop.
//!
//! One invocation answers one user message:
//!
//! 1. **Persist** the user message and **load** the session's recent history
//! 2. **Ask the model** with the system prompt and the lookup tool schemas
//! 3. **If tool calls**: persist the request, run the tools, persist the
//!    results, and go back to step 2
//! 4. **If text**: persist the answer and stream its fragments to the caller
//!
//! Every turn is written to the conversation store before the next model
//! call that depends on it.

pub mod loop_runner;
pub mod prompt;
pub mod stream_event;

pub use loop_runner::AgentLoop;
pub use prompt::{FALLBACK_ANSWER, SYSTEM_PROMPT};
pub use stream_event::AgentStreamEvent;
