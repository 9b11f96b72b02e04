use std::sync::{Mutex, PoisonError};

use futures_util::StreamExt;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::errors::AppError;
use crate::models::{ChatRequest, StreamEvent};
use crate::session::{ChatSession, ChatView, TurnOutcome};
use crate::stream::SseLineDecoder;
use crate::transport::ChatTransport;

/// Sends chat turns and materialises the streamed reply into a [`ChatSession`].
///
/// One instance backs one chat surface. At most one send is in flight; a second
/// call made meanwhile is rejected with [`AppError::SendInFlight`]. Every state
/// change, each streamed token included, is republished as a [`ChatView`].
pub struct StreamingChatClient<T> {
    transport: T,
    session: Mutex<ChatSession>,
    view_tx: watch::Sender<ChatView>,
}

impl<T: ChatTransport> StreamingChatClient<T> {
    pub fn new(transport: T, tenant_id: impl Into<String>) -> Self {
        let session = ChatSession::new(tenant_id);
        let (view_tx, _) = watch::channel(session.view());
        Self { transport, session: Mutex::new(session), view_tx }
    }

    pub fn subscribe(&self) -> watch::Receiver<ChatView> {
        self.view_tx.subscribe()
    }

    pub fn view(&self) -> ChatView {
        self.view_tx.borrow().clone()
    }

    pub fn conversation_id(&self) -> Option<String> {
        self.with_session(|s| s.conversation_id().map(str::to_string))
    }

    pub async fn send_message(&self, text: &str) -> Result<TurnOutcome, AppError> {
        self.send_message_with_cancel(text, &CancellationToken::new()).await
    }

    /// Like [`send_message`](Self::send_message), stopping early once `cancel` fires.
    ///
    /// Returns `Err` only when the send was refused up front (validation or a
    /// send already in flight). Transport failures are absorbed into
    /// [`TurnOutcome::Failed`] after the fallback reply is appended.
    pub async fn send_message_with_cancel(
        &self,
        text: &str,
        cancel: &CancellationToken,
    ) -> Result<TurnOutcome, AppError> {
        let request = self.update(|s| s.begin_send(text))?;
        let mut guard = InFlight { client: self, armed: true };

        let outcome = self.run_turn(&request, cancel).await;
        guard.armed = false;

        match &outcome {
            TurnOutcome::Failed { reason } => warn!("Chat turn failed: {reason}"),
            other => info!(
                conversation_id = ?self.conversation_id(),
                "Chat turn finished: {other:?}"
            ),
        }
        Ok(outcome)
    }

    async fn run_turn(&self, request: &ChatRequest, cancel: &CancellationToken) -> TurnOutcome {
        let opened = tokio::select! {
            biased;
            _ = cancel.cancelled() => return self.update(ChatSession::cancel),
            opened = self.transport.open(request) => opened,
        };
        let mut body = match opened {
            Ok(body) => body,
            Err(e) => return self.fail(e),
        };

        let mut decoder = SseLineDecoder::new();
        loop {
            let next = tokio::select! {
                biased;
                _ = cancel.cancelled() => return self.update(ChatSession::cancel),
                next = body.next() => next,
            };
            match next {
                Some(Ok(chunk)) => {
                    for event in decoder.feed(&chunk) {
                        self.apply(event);
                    }
                }
                Some(Err(e)) => return self.fail(e),
                None => break,
            }
        }

        if let Some(event) = decoder.finish() {
            self.apply(event);
        }
        if decoder.malformed() > 0 {
            debug!("Dropped {} malformed fragment(s) this turn", decoder.malformed());
        }
        self.update(ChatSession::finish)
    }

    fn fail(&self, error: AppError) -> TurnOutcome {
        if !error.is_transport() {
            warn!("Non-transport error while streaming, showing fallback reply: {error}");
        }
        self.update(|s| s.fail(&error))
    }

    fn apply(&self, event: StreamEvent) {
        let mut session = self.session.lock().unwrap_or_else(PoisonError::into_inner);
        if session.apply(event) {
            self.view_tx.send_replace(session.view());
        }
    }

    /// Runs `f` on the session and publishes the resulting view.
    fn update<R>(&self, f: impl FnOnce(&mut ChatSession) -> R) -> R {
        let mut session = self.session.lock().unwrap_or_else(PoisonError::into_inner);
        let result = f(&mut session);
        self.view_tx.send_replace(session.view());
        result
    }

    fn with_session<R>(&self, f: impl FnOnce(&ChatSession) -> R) -> R {
        let session = self.session.lock().unwrap_or_else(PoisonError::into_inner);
        f(&session)
    }
}

/// Releases the in-flight guard if a send future is dropped mid-turn.
struct InFlight<'a, T: ChatTransport> {
    client: &'a StreamingChatClient<T>,
    armed: bool,
}

impl<T: ChatTransport> Drop for InFlight<'_, T> {
    fn drop(&mut self) {
        if self.armed {
            debug!("Send abandoned mid-turn; discarding partial reply");
            self.client.update(|s| {
                s.cancel();
            });
        }
    }
}
