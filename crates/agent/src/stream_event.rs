//! Events the agent emits while answering one message.
//!
//! The gateway forwards each event as one SSE `data:` frame:
//! - `chunk`: one text fragment of the final answer
//! - `done` : the answer is complete; carries the session id
//! - `error`: the invocation failed

use serde::{Deserialize, Serialize};

/// Zero or more `Chunk`s, then exactly one `Done` or `Error`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AgentStreamEvent {
    Chunk { text: String },
    Done { session_id: String },
    Error { message: String },
}

impl AgentStreamEvent {
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::Chunk { .. } => "chunk",
            Self::Done { .. } => "done",
            Self::Error { .. } => "error",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Chunk { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunk_wire_format() {
        let event = AgentStreamEvent::Chunk {
            text: "Hello".into(),
        };
        assert_eq!(
            serde_json::to_string(&event).unwrap(),
            r#"{"type":"chunk","text":"Hello"}"#
        );
    }

    #[test]
    fn done_wire_format() {
        let event = AgentStreamEvent::Done {
            session_id: "abc".into(),
        };
        assert_eq!(
            serde_json::to_string(&event).unwrap(),
            r#"{"type":"done","session_id":"abc"}"#
        );
    }

    #[test]
    fn error_wire_format() {
        let event = AgentStreamEvent::Error {
            message: "boom".into(),
        };
        assert_eq!(
            serde_json::to_string(&event).unwrap(),
            r#"{"type":"error","message":"boom"}"#
        );
    }

    #[test]
    fn event_type_names() {
        let chunk = AgentStreamEvent::Chunk { text: "x".into() };
        assert_eq!(chunk.event_type(), "chunk");
        assert!(!chunk.is_terminal());
        let done = AgentStreamEvent::Done {
            session_id: "s".into(),
        };
        assert_eq!(done.event_type(), "done");
        assert!(done.is_terminal());
        assert_eq!(
            AgentStreamEvent::Error {
                message: "m".into()
            }
            .event_type(),
            "error"
        );
    }
}
