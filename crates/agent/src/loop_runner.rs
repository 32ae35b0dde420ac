//! The agent reasoning loop implementation.

use chrono::Duration;
use shopdesk_config::AppConfig;
use shopdesk_core::message::{ChatMessage, MessageContent, MessageType, Role, SessionId};
use shopdesk_core::provider::{ModelRequest, Provider};
use shopdesk_core::store::{ConversationStore, DEFAULT_HISTORY_WINDOW_DAYS};
use shopdesk_core::tool::ToolRegistry;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::{OwnedMutexGuard, mpsc};
use tracing::{debug, error, info, warn};

use crate::prompt::{FALLBACK_ANSWER, SYSTEM_PROMPT};
use crate::stream_event::AgentStreamEvent;

const STREAM_BUFFER: usize = 32;

/// Orchestrates model calls, tool execution, and turn persistence.
pub struct AgentLoop {
    /// The LLM provider to use
    provider: Arc<dyn Provider>,

    /// Where every turn is recorded
    store: Arc<dyn ConversationStore>,

    /// Tool registry
    tools: Arc<ToolRegistry>,

    /// The model to use
    model: String,

    /// Max tokens per response
    max_tokens: u32,

    /// Temperature setting
    temperature: Option<f32>,

    system_prompt: String,

    /// Maximum model calls per user message
    max_iterations: u32,

    /// How far back history is replayed
    history_window: Duration,

    /// One async lock per session id, so turns of a session never interleave
    sessions: Mutex<HashMap<SessionId, Arc<tokio::sync::Mutex<()>>>>,
}

impl AgentLoop {
    /// Create a new agent loop.
    pub fn new(
        provider: Arc<dyn Provider>,
        store: Arc<dyn ConversationStore>,
        tools: Arc<ToolRegistry>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            provider,
            store,
            tools,
            model: model.into(),
            max_tokens: 1024,
            temperature: None,
            system_prompt: SYSTEM_PROMPT.to_string(),
            max_iterations: 10,
            history_window: Duration::days(DEFAULT_HISTORY_WINDOW_DAYS),
            sessions: Mutex::new(HashMap::new()),
        }
    }

    /// Build from the application config.
    pub fn from_config(
        config: &AppConfig,
        provider: Arc<dyn Provider>,
        store: Arc<dyn ConversationStore>,
        tools: Arc<ToolRegistry>,
    ) -> Self {
        let mut agent = Self::new(provider, store, tools, &config.default_model)
            .with_max_tokens(config.max_tokens)
            .with_max_iterations(config.agent.max_iterations)
            .with_history_window(Duration::days(config.agent.history_window_days));
        if let Some(t) = config.temperature {
            agent = agent.with_temperature(t);
        }
        if let Some(prompt) = &config.agent.system_prompt_override {
            agent = agent.with_system_prompt(prompt);
        }
        agent
    }

    /// Set the maximum number of model calls per user message.
    pub fn with_max_iterations(mut self, max: u32) -> Self {
        self.max_iterations = max;
        self
    }

    /// Set the max tokens per LLM response.
    pub fn with_max_tokens(mut self, max: u32) -> Self {
        self.max_tokens = max;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Replace the built-in support instructions.
    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    /// Set how far back a session's history is replayed.
    pub fn with_history_window(mut self, window: Duration) -> Self {
        self.history_window = window;
        self
    }

    /// Answer `message` in the background and stream the result.
    ///
    /// A missing session id gets a freshly generated one, which is returned
    /// alongside the event receiver. Dropping the receiver stops the
    /// invocation at its next model call.
    pub fn stream(
        self: &Arc<Self>,
        message: impl Into<String>,
        session_id: Option<SessionId>,
    ) -> (SessionId, mpsc::Receiver<AgentStreamEvent>) {
        let session_id = session_id.unwrap_or_default();
        let (tx, rx) = mpsc::channel(STREAM_BUFFER);

        let agent = Arc::clone(self);
        let message = message.into();
        let session = session_id.clone();
        tokio::spawn(async move {
            agent.run(&session, &message, &tx).await;
        });

        (session_id, rx)
    }

    /// Answer `message`, sending fragments then exactly one terminal event to `tx`.
    pub async fn run(
        &self,
        session_id: &SessionId,
        message: &str,
        tx: &mpsc::Sender<AgentStreamEvent>,
    ) {
        let _guard = self.lock_session(session_id).await;

        match self.answer(session_id, message, || tx.is_closed()).await {
            Ok(Some(fragments)) => {
                for text in fragments {
                    if tx.send(AgentStreamEvent::Chunk { text }).await.is_err() {
                        debug!(session = %session_id, "Receiver dropped mid-answer");
                        return;
                    }
                }
                let _ = tx
                    .send(AgentStreamEvent::Done {
                        session_id: session_id.to_string(),
                    })
                    .await;
            }
            Ok(None) => debug!(session = %session_id, "Receiver dropped, invocation stopped"),
            Err(e) => {
                error!(session = %session_id, error = %e, "Agent invocation failed");
                let _ = tx
                    .send(AgentStreamEvent::Error {
                        message: e.to_string(),
                    })
                    .await;
            }
        }
    }

    /// Answer `message` and return the final answer's text fragments.
    pub async fn respond(
        &self,
        session_id: &SessionId,
        message: &str,
    ) -> shopdesk_core::Result<Vec<String>> {
        let _guard = self.lock_session(session_id).await;
        Ok(self
            .answer(session_id, message, || false)
            .await?
            .unwrap_or_default())
    }

    /// Wait for exclusive use of a session.
    async fn lock_session(&self, session_id: &SessionId) -> OwnedMutexGuard<()> {
        let lock = {
            let mut sessions = self.sessions.lock().unwrap_or_else(|p| p.into_inner());
            // Drop locks nobody is holding or waiting on.
            sessions.retain(|_, l| Arc::strong_count(l) > 1);
            Arc::clone(sessions.entry(session_id.clone()).or_default())
        };
        lock.lock_owned().await
    }

    /// Drive one message to a final answer.
    ///
    /// Returns `None` when `closed` reports the caller gone at the start of a
    /// model round. The final answer is persisted before it is returned.
    async fn answer(
        &self,
        session_id: &SessionId,
        message: &str,
        closed: impl Fn() -> bool,
    ) -> shopdesk_core::Result<Option<Vec<String>>> {
        info!(session = %session_id, "Processing message");

        self.store
            .append(session_id, Role::User, MessageContent::from(message), MessageType::Text)
            .await?;
        let mut messages = self
            .store
            .load_within(session_id, self.history_window)
            .await?;
        trim_to_user_text(&mut messages);

        let tool_definitions = self.tools.definitions();

        for iteration in 1..=self.max_iterations {
            if closed() {
                return Ok(None);
            }

            debug!(session = %session_id, iteration, messages = messages.len(), "Agent loop iteration");

            let request = ModelRequest {
                model: self.model.clone(),
                system: Some(self.system_prompt.clone()),
                messages: messages.clone(),
                tools: tool_definitions.clone(),
                max_tokens: self.max_tokens,
                temperature: self.temperature,
            };

            let response = self.provider.complete(request).await?;
            let calls = response.tool_calls();

            // Anything but a tool request with tool_use blocks is a final answer.
            if !response.stop_reason.wants_tools() || calls.is_empty() {
                let mut fragments: Vec<String> = response
                    .text_fragments()
                    .into_iter()
                    .map(str::to_string)
                    .collect();
                if fragments.concat().trim().is_empty() {
                    warn!(session = %session_id, iteration, "Model returned an empty answer");
                    fragments = vec![FALLBACK_ANSWER.to_string()];
                }
                self.store
                    .append(
                        session_id,
                        Role::Assistant,
                        MessageContent::Text(fragments.concat()),
                        MessageType::Text,
                    )
                    .await?;
                info!(session = %session_id, iteration, "Answer complete");
                return Ok(Some(fragments));
            }

            debug!(tool_count = calls.len(), "Executing tool calls");

            let request_turn = ChatMessage::assistant_blocks(response.content);
            self.store
                .append(
                    session_id,
                    Role::Assistant,
                    request_turn.content.clone(),
                    MessageType::ToolUse,
                )
                .await?;
            messages.push(request_turn);

            let mut results = Vec::with_capacity(calls.len());
            for call in &calls {
                debug!(tool = %call.name, id = %call.id, "Running tool");
                results.push(self.tools.execute(call).await?);
            }

            let result_turn = ChatMessage::tool_results(results);
            self.store
                .append(
                    session_id,
                    Role::User,
                    result_turn.content.clone(),
                    MessageType::ToolResult,
                )
                .await?;
            messages.push(result_turn);
        }

        warn!(
            session = %session_id,
            max_iterations = self.max_iterations,
            "Max model calls reached, answering with fallback"
        );
        self.store
            .append(
                session_id,
                Role::Assistant,
                MessageContent::from(FALLBACK_ANSWER),
                MessageType::Text,
            )
            .await?;
        Ok(Some(vec![FALLBACK_ANSWER.to_string()]))
    }
}

/// Drop leading turns until the first plain user message.
///
/// The recency window can cut a tool exchange in half, leaving a tool
/// result whose request is gone. The model only accepts a history that
/// opens with a user text turn.
fn trim_to_user_text(messages: &mut Vec<ChatMessage>) {
    let start = messages
        .iter()
        .position(|m| m.role == Role::User && matches!(m.content, MessageContent::Text(_)))
        .unwrap_or(messages.len());
    if start > 0 {
        debug!(dropped = start, "Trimmed history to the first user message");
        messages.drain(..start);
    }
}
