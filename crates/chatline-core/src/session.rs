//! Chat session store.
//!
//! A session is an append-only message log plus a `pending` flag. At most one
//! request is in flight: a submission while pending is rejected, never
//! queued, so a reply is always appended right after the user message that
//! triggered it.

use std::sync::atomic::{AtomicU64, Ordering};

use tracing::{debug, info, warn};

use crate::composer;
use crate::error::{Rejected, TransportError};
use crate::message::Message;
use crate::transport::{Transport, NO_REPLY};

/// Notice appended in place of a reply whenever the transport fails.
pub const FAILURE_NOTICE: &str = "Could not reach your LLM. Check URL/token and try again.";

static NEXT_SESSION: AtomicU64 = AtomicU64::new(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(u64);

/// A request the session wants sent. Produced by [`Session::append_user`].
#[derive(Debug, Clone)]
pub struct Outbound {
    pub session: SessionId,
    pub latest: String,
    /// Conversation before `latest`.
    pub history: Vec<Message>,
}

impl Outbound {
    /// Run the transport call and tag the outcome with this request's session.
    pub async fn dispatch(self, transport: &dyn Transport) -> Completion {
        let outcome = transport.send(&self.latest, &self.history).await;
        Completion {
            session: self.session,
            outcome,
        }
    }
}

/// Outcome of one transport call, addressed to the session that issued it.
#[derive(Debug)]
pub struct Completion {
    pub session: SessionId,
    pub outcome: Result<String, TransportError>,
}

/// Read-only view for the presentation layer.
#[derive(Debug, Clone, Copy)]
pub struct SessionSnapshot<'a> {
    pub messages: &'a [Message],
    pub pending: bool,
}

#[derive(Debug)]
pub struct Session {
    id: SessionId,
    messages: Vec<Message>,
    pending: bool,
    last_failed: bool,
}

impl Session {
    pub fn new() -> Self {
        Self {
            id: SessionId(NEXT_SESSION.fetch_add(1, Ordering::Relaxed)),
            messages: Vec::new(),
            pending: false,
            last_failed: false,
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }

    /// Whether the most recent reply was the failure notice.
    pub fn last_failed(&self) -> bool {
        self.last_failed
    }

    pub fn snapshot(&self) -> SessionSnapshot<'_> {
        SessionSnapshot {
            messages: &self.messages,
            pending: self.pending,
        }
    }

    pub fn set_pending(&mut self, pending: bool) {
        self.pending = pending;
    }

    /// Append a user message and mark the session pending. The returned
    /// request must be handed to a transport.
    pub fn append_user(&mut self, message: Message) -> Outbound {
        debug_assert_eq!(message.role(), crate::message::Role::User);

        let history = self.messages.clone();
        let latest = message.text().to_string();
        self.messages.push(message);
        self.pending = true;

        info!(
            session = self.id.0,
            history = history.len(),
            "sending message"
        );

        Outbound {
            session: self.id,
            latest,
            history,
        }
    }

    pub fn append_assistant(&mut self, text: &str) {
        let text = if text.trim().is_empty() { NO_REPLY } else { text };
        self.messages.push(Message::assistant(text));
        self.pending = false;
        self.last_failed = false;
    }

    /// Append the generic failure notice. `detail` goes to the log only.
    pub fn append_error(&mut self, detail: &str) {
        warn!(session = self.id.0, "chat request failed: {}", detail);
        self.messages.push(Message::assistant(FAILURE_NOTICE));
        self.pending = false;
        self.last_failed = true;
    }

    /// Compose `raw` and append it, returning the request to send.
    pub fn submit(&mut self, raw: &str) -> Result<Outbound, Rejected> {
        let message = composer::prepare(raw, self.pending).map_err(|reason| {
            debug!(session = self.id.0, %reason, "submission ignored");
            reason
        })?;
        Ok(self.append_user(message))
    }

    /// Apply a transport outcome. Returns false when the completion was not
    /// for this session or nothing was pending.
    pub fn complete(&mut self, completion: Completion) -> bool {
        if completion.session != self.id {
            warn!(
                session = self.id.0,
                stale = completion.session.0,
                "dropping completion for another session"
            );
            return false;
        }
        if !self.pending {
            warn!(session = self.id.0, "dropping completion with nothing pending");
            return false;
        }

        match completion.outcome {
            Ok(reply) => {
                debug!(session = self.id.0, chars = reply.len(), "reply received");
                self.append_assistant(&reply);
            }
            Err(e) => self.append_error(&e.to_string()),
        }
        true
    }

    /// One full send cycle, awaited inline. Returns the appended reply (or
    /// failure notice).
    pub async fn send(
        &mut self,
        raw: &str,
        transport: &dyn Transport,
    ) -> Result<&Message, Rejected> {
        let outbound = self.submit(raw)?;
        let completion = outbound.dispatch(transport).await;
        self.complete(completion);

        // submit appended a user message and complete always appends after it
        Ok(&self.messages[self.messages.len() - 1])
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::Role;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Records every call and answers from a fixed outcome.
    struct ScriptedTransport {
        reply: Option<String>,
        calls: Mutex<Vec<(String, usize)>>,
    }

    impl ScriptedTransport {
        fn replying(text: &str) -> Self {
            Self {
                reply: Some(text.to_string()),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn failing() -> Self {
            Self {
                reply: None,
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl Transport for ScriptedTransport {
        async fn send(&self, latest: &str, history: &[Message]) -> Result<String, TransportError> {
            self.calls
                .lock()
                .unwrap()
                .push((latest.to_string(), history.len()));
            match &self.reply {
                Some(text) => Ok(text.clone()),
                None => Err(TransportError::Network("connection refused".to_string())),
            }
        }
    }

    fn roles_and_texts(session: &Session) -> Vec<(Role, String)> {
        session
            .messages()
            .iter()
            .map(|m| (m.role(), m.text().to_string()))
            .collect()
    }

    #[tokio::test]
    async fn test_successful_send() {
        let transport = ScriptedTransport::replying("Hi! How can I help?");
        let mut session = Session::new();

        let reply = session.send("Hello", &transport).await.unwrap();
        assert_eq!(reply.text(), "Hi! How can I help?");

        assert_eq!(
            roles_and_texts(&session),
            vec![
                (Role::User, "Hello".to_string()),
                (Role::Assistant, "Hi! How can I help?".to_string()),
            ]
        );
        assert!(!session.is_pending());
    }

    #[tokio::test]
    async fn test_failed_send_appends_notice() {
        let transport = ScriptedTransport::failing();
        let mut session = Session::new();

        session.send("Hi", &transport).await.unwrap();

        assert_eq!(
            roles_and_texts(&session),
            vec![
                (Role::User, "Hi".to_string()),
                (Role::Assistant, FAILURE_NOTICE.to_string()),
            ]
        );
        assert!(!session.is_pending());
        assert!(session.last_failed());
    }

    #[tokio::test]
    async fn test_session_usable_after_failure() {
        let mut session = Session::new();
        session.send("Hi", &ScriptedTransport::failing()).await.unwrap();
        session
            .send("Again", &ScriptedTransport::replying("back"))
            .await
            .unwrap();

        assert_eq!(session.messages().len(), 4);
        assert_eq!(session.messages()[3].text(), "back");
        assert!(!session.last_failed());
    }

    #[tokio::test]
    async fn test_history_excludes_latest() {
        let transport = ScriptedTransport::replying("ok");
        let mut session = Session::new();

        session.send("one", &transport).await.unwrap();
        session.send("two", &transport).await.unwrap();

        let calls = transport.calls.lock().unwrap().clone();
        assert_eq!(calls, vec![("one".to_string(), 0), ("two".to_string(), 2)]);
    }

    #[test]
    fn test_submit_while_pending_is_noop() {
        let mut session = Session::new();
        let first = session.submit("first").unwrap();

        assert_eq!(session.submit("second").unwrap_err(), Rejected::Busy);
        assert_eq!(session.messages().len(), 1);
        assert!(session.is_pending());

        session.complete(Completion {
            session: first.session,
            outcome: Ok("reply".to_string()),
        });

        assert_eq!(
            roles_and_texts(&session),
            vec![
                (Role::User, "first".to_string()),
                (Role::Assistant, "reply".to_string()),
            ]
        );
    }

    #[test]
    fn test_blank_submit_is_noop() {
        let mut session = Session::new();
        assert_eq!(session.submit("   ").unwrap_err(), Rejected::Empty);
        assert!(session.messages().is_empty());
        assert!(!session.is_pending());
    }

    #[test]
    fn test_empty_reply_uses_sentinel() {
        let mut session = Session::new();
        let outbound = session.submit("Hello").unwrap();
        session.complete(Completion {
            session: outbound.session,
            outcome: Ok(String::new()),
        });

        assert_eq!(session.messages()[1].text(), NO_REPLY);
    }

    #[test]
    fn test_set_pending_gates_submit() {
        let mut session = Session::new();
        session.set_pending(true);
        assert_eq!(session.submit("Hello").unwrap_err(), Rejected::Busy);

        session.set_pending(false);
        assert!(session.submit("Hello").is_ok());
        assert!(session.snapshot().pending);
    }

    #[test]
    fn test_completion_for_other_session_is_dropped() {
        let mut old = Session::new();
        let outbound = old.submit("Hello").unwrap();

        let mut fresh = Session::new();
        let applied = fresh.complete(Completion {
            session: outbound.session,
            outcome: Ok("late".to_string()),
        });

        assert!(!applied);
        assert!(fresh.messages().is_empty());
    }

    #[test]
    fn test_completion_without_pending_is_dropped() {
        let mut session = Session::new();
        let outbound = session.submit("Hello").unwrap();
        let id = outbound.session;

        assert!(session.complete(Completion {
            session: id,
            outcome: Ok("first".to_string()),
        }));
        assert!(!session.complete(Completion {
            session: id,
            outcome: Ok("duplicate".to_string()),
        }));
        assert_eq!(session.messages().len(), 2);
    }

    #[test]
    fn test_log_only_grows() {
        let mut session = Session::new();
        let mut last_len = 0;

        for input in ["a", "", "b", "  ", "c"] {
            if let Ok(outbound) = session.submit(input) {
                assert!(session.messages().len() > last_len);
                last_len = session.messages().len();
                session.complete(Completion {
                    session: outbound.session,
                    outcome: Err(TransportError::Status {
                        status: 500,
                        body: String::new(),
                    }),
                });
            }
            assert!(session.messages().len() >= last_len);
            last_len = session.messages().len();
        }

        assert_eq!(session.messages().len(), 6);
        let snapshot = session.snapshot();
        assert!(!snapshot.pending);
        assert_eq!(snapshot.messages[4].text(), "c");
    }

    #[test]
    fn test_sessions_get_distinct_ids() {
        assert_ne!(Session::new().id(), Session::new().id());
    }
}
