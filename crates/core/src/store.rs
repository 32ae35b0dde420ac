//! Conversation store trait: append-only turn persistence.
//!
//! Turns are never updated or deleted. Reads apply a recency window: anything
//! older than the window is simply not returned.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};

use crate::error::StoreError;
use crate::message::{ChatMessage, MessageContent, MessageType, Role, SessionId, Turn};

/// How far back `load` looks by default.
pub const DEFAULT_HISTORY_WINDOW_DAYS: i64 = 3;

/// The core ConversationStore trait.
///
/// Implementations: SQLite, in-memory (for testing).
#[async_trait]
pub trait ConversationStore: Send + Sync {
    /// The backend name (e.g., "sqlite", "in_memory").
    fn name(&self) -> &str;

    /// Durably persist one turn. Atomic: the turn is either fully recorded or not at all.
    async fn append_turn(&self, turn: &Turn) -> std::result::Result<(), StoreError>;

    /// All turns of a session created strictly after `since`, oldest first.
    async fn load_since(
        &self,
        session_id: &SessionId,
        since: DateTime<Utc>,
    ) -> std::result::Result<Vec<ChatMessage>, StoreError>;

    /// Persist a turn stamped with the current time and return it.
    async fn append(
        &self,
        session_id: &SessionId,
        role: Role,
        content: MessageContent,
        message_type: MessageType,
    ) -> std::result::Result<Turn, StoreError> {
        let turn = Turn::new(session_id.clone(), role, content, message_type);
        self.append_turn(&turn).await?;
        Ok(turn)
    }

    /// History within the default three-day window.
    async fn load(
        &self,
        session_id: &SessionId,
    ) -> std::result::Result<Vec<ChatMessage>, StoreError> {
        self.load_within(session_id, Duration::days(DEFAULT_HISTORY_WINDOW_DAYS))
            .await
    }

    /// History within an arbitrary window measured back from now.
    async fn load_within(
        &self,
        session_id: &SessionId,
        window: Duration,
    ) -> std::result::Result<Vec<ChatMessage>, StoreError> {
        self.load_since(session_id, Utc::now() - window).await
    }
}
