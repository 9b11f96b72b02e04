use tracing::debug;

use crate::errors::AppError;
use crate::models::{ChatMessage, ChatRequest, StreamEvent, MAX_MESSAGE_LENGTH};

/// Assistant reply shown when the backend cannot be reached.
pub const FALLBACK_REPLY: &str = "I\u{2019}m sorry, I\u{2019}m having trouble connecting right now. \
                                  Please try again or contact the spa directly.";

/// Where the current send is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    /// Request issued, no token received yet.
    Sending,
    Streaming,
    /// A terminal event arrived; anything after it is ignored until end of body.
    Settled(Terminal),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Terminal {
    Finalized,
    ProtocolError,
}

/// How one send ended.
#[derive(Debug, Clone, PartialEq)]
pub enum TurnOutcome {
    /// `done` received. `reply` is `None` when no tokens preceded it.
    Completed {
        reply: Option<ChatMessage>,
        lead_id: Option<String>,
        escalated: bool,
    },
    /// `error` received; nothing was committed.
    ProtocolError,
    /// Body ended before any terminal event; the partial reply was dropped.
    Incomplete { discarded_chars: usize },
    /// Transport failed; the fallback reply was appended.
    Failed { reason: String },
    Cancelled,
}

/// Snapshot of the chat surface for UI collaborators.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChatView {
    pub messages: Vec<ChatMessage>,
    pub streaming_content: String,
    pub is_loading: bool,
    pub conversation_id: Option<String>,
}

/// Owned state of one conversation: history, streaming buffer and the in-flight guard.
#[derive(Debug)]
pub struct ChatSession {
    tenant_id: String,
    conversation_id: Option<String>,
    messages: Vec<ChatMessage>,
    streaming: String,
    phase: Phase,
    settled: Option<TurnOutcome>,
}

impl ChatSession {
    pub fn new(tenant_id: impl Into<String>) -> Self {
        Self {
            tenant_id: tenant_id.into(),
            conversation_id: None,
            messages: Vec::new(),
            streaming: String::new(),
            phase: Phase::Idle,
            settled: None,
        }
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn streaming_content(&self) -> &str {
        &self.streaming
    }

    pub fn conversation_id(&self) -> Option<&str> {
        self.conversation_id.as_deref()
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_loading(&self) -> bool {
        self.phase != Phase::Idle
    }

    pub fn view(&self) -> ChatView {
        ChatView {
            messages: self.messages.clone(),
            streaming_content: self.streaming.clone(),
            is_loading: self.is_loading(),
            conversation_id: self.conversation_id.clone(),
        }
    }

    /// `Idle → Sending`: validates the input, appends the user turn and builds the request.
    ///
    /// Fails without touching state if a send is already in flight or the text is
    /// empty or too long.
    pub fn begin_send(&mut self, text: &str) -> Result<ChatRequest, AppError> {
        if self.is_loading() {
            return Err(AppError::SendInFlight);
        }
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(AppError::EmptyField { field_name: "message".to_string() });
        }
        let length = trimmed.chars().count();
        if length > MAX_MESSAGE_LENGTH {
            return Err(AppError::FieldTooLong {
                field_name: "message".to_string(),
                max_length: MAX_MESSAGE_LENGTH,
                actual_length: length,
            });
        }

        self.messages.push(ChatMessage::user(trimmed));
        self.streaming.clear();
        self.settled = None;
        self.phase = Phase::Sending;

        Ok(ChatRequest {
            message: trimmed.to_string(),
            tenant_id: Some(self.tenant_id.clone()),
            conversation_id: self.conversation_id.clone(),
        })
    }

    /// Applies one stream event. Returns `true` when observable state changed.
    pub fn apply(&mut self, event: StreamEvent) -> bool {
        match self.phase {
            Phase::Sending | Phase::Streaming => {}
            Phase::Idle | Phase::Settled(_) => {
                debug!("Ignoring stream event outside an open turn: {event:?}");
                return false;
            }
        }

        match event {
            StreamEvent::Token { content } => {
                self.streaming.push_str(&content);
                self.phase = Phase::Streaming;
                true
            }
            StreamEvent::Done { conversation_id, lead_id, escalated } => {
                let reply = if self.streaming.is_empty() {
                    None
                } else {
                    let message = ChatMessage::assistant(std::mem::take(&mut self.streaming));
                    self.messages.push(message.clone());
                    Some(message)
                };
                self.adopt_conversation_id(conversation_id);
                self.phase = Phase::Settled(Terminal::Finalized);
                self.settled = Some(TurnOutcome::Completed { reply, lead_id, escalated });
                true
            }
            StreamEvent::Error { conversation_id } => {
                self.adopt_conversation_id(conversation_id);
                self.phase = Phase::Settled(Terminal::ProtocolError);
                self.settled = Some(TurnOutcome::ProtocolError);
                true
            }
            StreamEvent::Unknown => false,
        }
    }

    /// End of body: returns to `Idle`, dropping any reply `done` never committed.
    pub fn finish(&mut self) -> TurnOutcome {
        let outcome = self.settled.take().unwrap_or_else(|| TurnOutcome::Incomplete {
            discarded_chars: self.streaming.chars().count(),
        });
        self.streaming.clear();
        self.phase = Phase::Idle;
        outcome
    }

    /// Transport failure: appends the fallback reply and returns to `Idle`.
    pub fn fail(&mut self, error: &AppError) -> TurnOutcome {
        self.messages.push(ChatMessage::assistant(FALLBACK_REPLY));
        self.streaming.clear();
        self.settled = None;
        self.phase = Phase::Idle;
        TurnOutcome::Failed { reason: error.to_string() }
    }

    /// Stops the current turn. A reply already committed by `done` is kept.
    pub fn cancel(&mut self) -> TurnOutcome {
        let outcome = self.settled.take().unwrap_or(TurnOutcome::Cancelled);
        self.streaming.clear();
        self.phase = Phase::Idle;
        outcome
    }

    fn adopt_conversation_id(&mut self, id: Option<String>) {
        if let Some(id) = id.filter(|id| !id.is_empty()) {
            self.conversation_id = Some(id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn done(id: Option<&str>) -> StreamEvent {
        StreamEvent::Done {
            conversation_id: id.map(str::to_string),
            lead_id: None,
            escalated: false,
        }
    }

    #[test]
    fn begin_send_appends_trimmed_user_message() {
        let mut session = ChatSession::new("org_1");
        let req = session.begin_send("  Hello there \n").unwrap();
        assert_eq!(req.message, "Hello there");
        assert_eq!(req.tenant_id.as_deref(), Some("org_1"));
        assert_eq!(req.conversation_id, None);
        assert_eq!(session.messages().len(), 1);
        assert_eq!(session.messages()[0].content, "Hello there");
        assert_eq!(session.phase(), Phase::Sending);
    }

    #[test]
    fn second_begin_send_is_rejected_while_in_flight() {
        let mut session = ChatSession::new("org_1");
        session.begin_send("one").unwrap();
        let err = session.begin_send("two").unwrap_err();
        assert!(matches!(err, AppError::SendInFlight));
        assert_eq!(session.messages().len(), 1);
    }

    #[test]
    fn invalid_input_leaves_state_untouched() {
        let mut session = ChatSession::new("org_1");
        assert!(session.begin_send("   ").unwrap_err().is_validation());
        let long = "a".repeat(MAX_MESSAGE_LENGTH + 1);
        assert!(session.begin_send(&long).unwrap_err().is_validation());
        assert!(session.messages().is_empty());
        assert_eq!(session.phase(), Phase::Idle);
    }

    #[test]
    fn tokens_then_done_commit_one_reply() {
        let mut session = ChatSession::new("org_1");
        session.begin_send("hi").unwrap();
        assert!(session.apply(StreamEvent::token("Hel")));
        assert_eq!(session.streaming_content(), "Hel");
        session.apply(StreamEvent::token("lo"));
        session.apply(done(Some("conv-1")));
        assert_eq!(session.streaming_content(), "");

        let reply = match session.finish() {
            TurnOutcome::Completed { reply: Some(reply), .. } => reply,
            other => panic!("expected completed reply, got {other:?}"),
        };
        assert_eq!(reply.content, "Hello");
        assert_eq!(session.messages().len(), 2);
        assert_eq!(session.conversation_id(), Some("conv-1"));
        assert_eq!(session.phase(), Phase::Idle);
    }

    #[test]
    fn events_after_terminal_are_ignored() {
        let mut session = ChatSession::new("org_1");
        session.begin_send("hi").unwrap();
        session.apply(StreamEvent::token("A"));
        session.apply(done(None));
        assert!(!session.apply(StreamEvent::token("B")));
        assert!(!session.apply(done(Some("late"))));
        session.finish();
        assert_eq!(session.messages().last().unwrap().content, "A");
        assert_eq!(session.conversation_id(), None);
    }

    #[test]
    fn end_of_body_without_done_discards_buffer() {
        let mut session = ChatSession::new("org_1");
        session.begin_send("hi").unwrap();
        session.apply(StreamEvent::token("par"));
        session.apply(StreamEvent::token("tial"));
        assert_eq!(session.finish(), TurnOutcome::Incomplete { discarded_chars: 7 });
        assert_eq!(session.messages().len(), 1);
        assert_eq!(session.streaming_content(), "");
    }

    #[test]
    fn error_event_adopts_id_without_reply() {
        let mut session = ChatSession::new("org_1");
        session.begin_send("hi").unwrap();
        session.apply(StreamEvent::token("I apologize"));
        session.apply(StreamEvent::Error { conversation_id: Some("conv-9".into()) });
        assert_eq!(session.finish(), TurnOutcome::ProtocolError);
        assert_eq!(session.messages().len(), 1);
        assert_eq!(session.conversation_id(), Some("conv-9"));
    }

    #[test]
    fn fail_appends_fallback_regardless_of_partial_tokens() {
        let mut session = ChatSession::new("org_1");
        session.begin_send("hi").unwrap();
        session.apply(StreamEvent::token("half an ans"));
        let outcome = session.fail(&AppError::MissingBody);
        assert!(matches!(outcome, TurnOutcome::Failed { .. }));
        assert_eq!(session.messages().len(), 2);
        assert_eq!(session.messages()[1].content, FALLBACK_REPLY);
        assert_eq!(session.streaming_content(), "");
        assert!(!session.is_loading());
    }

    #[test]
    fn done_without_tokens_commits_nothing() {
        let mut session = ChatSession::new("org_1");
        session.begin_send("hi").unwrap();
        session.apply(done(Some("c")));
        let outcome = session.finish();
        assert!(matches!(outcome, TurnOutcome::Completed { reply: None, .. }));
        assert_eq!(session.messages().len(), 1);
    }

    #[test]
    fn cancel_keeps_committed_reply() {
        let mut session = ChatSession::new("org_1");
        session.begin_send("hi").unwrap();
        session.apply(StreamEvent::token("x"));
        assert_eq!(session.cancel(), TurnOutcome::Cancelled);
        assert_eq!(session.messages().len(), 1);

        session.begin_send("again").unwrap();
        session.apply(StreamEvent::token("y"));
        session.apply(done(None));
        assert!(matches!(session.cancel(), TurnOutcome::Completed { .. }));
        assert_eq!(session.messages().len(), 3);
    }

    #[test]
    fn unknown_events_do_not_change_state() {
        let mut session = ChatSession::new("org_1");
        session.begin_send("hi").unwrap();
        assert!(!session.apply(StreamEvent::Unknown));
        assert_eq!(session.phase(), Phase::Sending);
    }
}
