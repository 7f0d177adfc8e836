//! Chat surface state machine.
//!
//! At most one request is in flight. Its cancellation token is the only
//! handle to it and is cleared on every exit path by [`InFlight`].

use crate::backend::{BackendError, ChatBackend};
use crate::transcript::{Message, Transcript};
use service_core::contracts::ChatRequest;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tokio_util::sync::CancellationToken;

/// Prefix of every assistant message that reports a failure.
pub const APOLOGY: &str = "Sorry, something went wrong: ";

/// What a call to [`ChatSurface::submit`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Blank input or a request already in flight; nothing was sent.
    Ignored,
    /// The backend answered.
    Answered,
    /// The request failed or was stopped; an apology was appended.
    Failed,
}

#[derive(Debug, Default)]
struct SurfaceState {
    transcript: Transcript,
    input: String,
    in_flight: Option<CancellationToken>,
}

pub struct ChatSurface<B> {
    backend: B,
    state: Mutex<SurfaceState>,
}

/// Clears the in-flight handle when dropped.
struct InFlight<'a> {
    state: &'a Mutex<SurfaceState>,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        lock(self.state).in_flight = None;
    }
}

fn lock(state: &Mutex<SurfaceState>) -> MutexGuard<'_, SurfaceState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

impl<B: ChatBackend> ChatSurface<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            state: Mutex::new(SurfaceState::default()),
        }
    }

    pub fn set_input(&self, text: impl Into<String>) {
        lock(&self.state).input = text.into();
    }

    pub fn input(&self) -> String {
        lock(&self.state).input.clone()
    }

    pub fn is_loading(&self) -> bool {
        lock(&self.state).in_flight.is_some()
    }

    pub fn messages(&self) -> Vec<Message> {
        lock(&self.state).transcript.messages().to_vec()
    }

    pub fn last_message(&self) -> Option<Message> {
        lock(&self.state).transcript.last().cloned()
    }

    /// Cancel the in-flight request. Returns `false` when there is none.
    pub fn stop(&self) -> bool {
        match &lock(&self.state).in_flight {
            Some(token) => {
                token.cancel();
                true
            }
            None => false,
        }
    }

    /// Send the current input as a question.
    ///
    /// The user message is appended before the request goes out; exactly
    /// one assistant message follows, whether the request succeeds, fails
    /// or is stopped.
    pub async fn submit(&self) -> SubmitOutcome {
        let (request, token) = {
            let mut state = lock(&self.state);
            let message = state.input.trim().to_string();
            if message.is_empty() || state.in_flight.is_some() {
                return SubmitOutcome::Ignored;
            }

            let history = state.transcript.history();
            state.transcript.push(Message::user(message.clone()));
            state.input.clear();

            let token = CancellationToken::new();
            state.in_flight = Some(token.clone());

            (ChatRequest { message, history }, token)
        };
        let _in_flight = InFlight { state: &self.state };

        tracing::debug!(history_len = request.history.len(), "Submitting question");

        let result = tokio::select! {
            biased;
            _ = token.cancelled() => Err(BackendError::Aborted),
            result = self.backend.send(&request) => result,
        };

        let mut state = lock(&self.state);
        match result {
            Ok(response) => {
                state
                    .transcript
                    .push(Message::assistant(response.answer, response.sources));
                SubmitOutcome::Answered
            }
            Err(e) => {
                tracing::warn!(error = %e, "Chat request failed");
                state
                    .transcript
                    .push(Message::assistant(format!("{}{}", APOLOGY, e), Vec::new()));
                SubmitOutcome::Failed
            }
        }
    }
}
