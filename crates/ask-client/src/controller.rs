//! Streaming query controller.
//!
//! Runs one cancellable question at a time: sends it with the current
//! context, pumps the chunked answer into an [`OutputBuffer`] and settles
//! into a terminal [`QueryPhase`]. Display updates go out as [`ChatEvent`]s.

use std::sync::Arc;

use ask_core::{ChatEvent, ContextStore, OutputBuffer, QueryPhase, RenderStyle, Rendered};
use futures::StreamExt;
use parking_lot::{Mutex, RwLock};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::backend::{AskRequest, Backend};
use crate::error::{BackendError, QueryError};

/// Inline message when neither a transcript nor an indexed document exists.
pub const NO_CONTEXT_MESSAGE: &str = "Error: You must upload a PDF or an Audio file first.";

/// Final state of one question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryReport {
    pub question: String,
    pub phase: QueryPhase,
    /// Rendered answer including any terminal marker.
    pub output: String,
    /// Set for `Cancelled` and `Failed`.
    pub error: Option<QueryError>,
}

#[derive(Debug)]
struct ActiveQuery {
    session_id: String,
    cancel_token: CancellationToken,
}

#[derive(Debug)]
struct ControllerState {
    phase: QueryPhase,
    active: Option<ActiveQuery>,
    submit_enabled: bool,
    stop_enabled: bool,
}

pub struct QueryController {
    backend: Arc<dyn Backend>,
    context: Arc<RwLock<ContextStore>>,
    style: RenderStyle,
    state: Arc<Mutex<ControllerState>>,
    event_tx: mpsc::UnboundedSender<ChatEvent>,
}

impl QueryController {
    pub fn new(
        backend: Arc<dyn Backend>,
        context: Arc<RwLock<ContextStore>>,
        style: RenderStyle,
    ) -> (Self, mpsc::UnboundedReceiver<ChatEvent>) {
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let controller = Self {
            backend,
            context,
            style,
            state: Arc::new(Mutex::new(ControllerState {
                phase: QueryPhase::Idle,
                active: None,
                submit_enabled: true,
                stop_enabled: false,
            })),
            event_tx,
        };
        (controller, event_rx)
    }

    pub fn phase(&self) -> QueryPhase {
        self.state.lock().phase
    }

    pub fn is_active(&self) -> bool {
        self.state.lock().active.is_some()
    }

    pub fn submit_enabled(&self) -> bool {
        self.state.lock().submit_enabled
    }

    pub fn stop_enabled(&self) -> bool {
        self.state.lock().stop_enabled
    }

    /// Ask `question` against the current context and stream the answer.
    ///
    /// Returns `Err` only when the question is rejected before anything is
    /// sent (validation, or another question still running). Server errors,
    /// transport failures and cancellation end in the report's phase.
    pub async fn submit_question(&self, question: &str) -> Result<QueryReport, QueryError> {
        let question = question.trim();
        if question.is_empty() {
            return Err(QueryError::Validation("Question must not be empty".to_string()));
        }

        let context = self.context.read().snapshot();
        if !context.has_source() {
            self.emit(ChatEvent::Status {
                message: NO_CONTEXT_MESSAGE.to_string(),
                is_error: true,
            });
            return Err(QueryError::Validation(NO_CONTEXT_MESSAGE.to_string()));
        }

        let cancel_token = CancellationToken::new();
        let _guard = self.begin(&context.session_id, cancel_token.clone())?;

        self.emit(ChatEvent::Question {
            content: question.to_string(),
        });
        self.emit(ChatEvent::Placeholder {
            content: self.style.placeholder.clone(),
        });

        let request = AskRequest {
            question: question.to_string(),
            transcript: context.transcript,
            pdf_indexed: context.document_indexed,
            session_id: context.session_id,
        };
        log::info!(
            "[{}] Asking question ({} chars, transcript: {}, pdf_indexed: {})",
            request.session_id,
            question.len(),
            request.transcript.is_some(),
            request.pdf_indexed
        );

        let mut output = OutputBuffer::new(self.style.clone());
        let outcome = self.run(&request, &cancel_token, &mut output).await;

        let (phase, error) = match outcome {
            Ok(()) => (QueryPhase::Completed, None),
            Err(QueryError::Cancelled) => (QueryPhase::Cancelled, Some(QueryError::Cancelled)),
            Err(err) => (QueryPhase::Failed, Some(err)),
        };
        log::info!("[{}] Question finished: {:?}", request.session_id, phase);

        self.state.lock().phase = phase;
        self.emit(ChatEvent::Finished { phase });

        Ok(QueryReport {
            question: request.question,
            phase,
            output: output.into_string(),
            error,
        })
    }

    async fn run(
        &self,
        request: &AskRequest,
        cancel_token: &CancellationToken,
        output: &mut OutputBuffer,
    ) -> Result<(), QueryError> {
        let opened = tokio::select! {
            biased;
            _ = cancel_token.cancelled() => return Err(self.stopped(request, output)),
            opened = self.backend.ask(request) => opened,
        };

        let mut stream = match opened {
            Ok(stream) => stream,
            Err(BackendError::Server { status, message }) => {
                log::warn!("[{}] Server rejected question ({}): {}", request.session_id, status, message);
                output.replace(&message);
                self.emit(ChatEvent::Replaced {
                    content: output.as_str().to_string(),
                });
                return Err(QueryError::Server(message));
            }
            Err(err) => return Err(self.failed(request, output, err)),
        };

        self.state.lock().phase = QueryPhase::Streaming;
        self.emit(ChatEvent::AnswerStarted);

        loop {
            let next = tokio::select! {
                biased;
                _ = cancel_token.cancelled() => return Err(self.stopped(request, output)),
                next = stream.next() => next,
            };

            match next {
                Some(Ok(chunk)) => {
                    let delta = output.push_chunk(&chunk);
                    if !delta.is_empty() {
                        self.emit(ChatEvent::Token { content: delta });
                    }
                }
                Some(Err(err)) => return Err(self.failed(request, output, err)),
                None => break,
            }
        }

        let tail = output.finish_stream();
        if !tail.is_empty() {
            self.emit(ChatEvent::Token { content: tail });
        }
        log::debug!("[{}] Answer stream completed", request.session_id);
        Ok(())
    }

    fn stopped(&self, request: &AskRequest, output: &mut OutputBuffer) -> QueryError {
        log::info!("[{}] Generation stopped by user", request.session_id);
        let marker = output.mark_stopped().to_string();
        self.emit(ChatEvent::Stopped { marker });
        QueryError::Cancelled
    }

    fn failed(&self, request: &AskRequest, output: &mut OutputBuffer, err: BackendError) -> QueryError {
        log::error!("[{}] Error asking question: {}", request.session_id, err);
        let cause = err.to_string();
        match output.fail(&cause) {
            Rendered::Replaced(content) => self.emit(ChatEvent::Replaced { content }),
            Rendered::Appended(content) => self.emit(ChatEvent::Error { content }),
        }
        QueryError::Transport(cause)
    }

    /// Stop the running question, if any.
    ///
    /// Tells the backend to halt generation on a detached task (its result is
    /// ignored) and trips the local cancellation token. Returns false and does
    /// nothing when no question is running or it was already cancelled.
    pub fn cancel(&self) -> bool {
        let (session_id, cancel_token) = {
            let mut state = self.state.lock();
            let Some(active) = state.active.as_ref() else {
                return false;
            };
            if active.cancel_token.is_cancelled() {
                return false;
            }
            let taken = (active.session_id.clone(), active.cancel_token.clone());
            state.stop_enabled = false;
            taken
        };
        self.emit(ChatEvent::Controls {
            submit_enabled: false,
            stop_enabled: false,
        });

        self.notify_stop(session_id);
        cancel_token.cancel();
        true
    }

    fn notify_stop(&self, session_id: String) {
        let backend = Arc::clone(&self.backend);
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    if let Err(err) = backend.stop(&session_id).await {
                        log::debug!("[{}] Stop notification failed: {}", session_id, err);
                    }
                });
            }
            Err(_) => log::debug!("[{}] No runtime, skipping stop notification", session_id),
        }
    }

    fn begin(&self, session_id: &str, cancel_token: CancellationToken) -> Result<ActiveGuard, QueryError> {
        {
            let mut state = self.state.lock();
            if state.active.is_some() {
                log::warn!("[{}] Question rejected, another one is running", session_id);
                return Err(QueryError::Busy);
            }
            state.active = Some(ActiveQuery {
                session_id: session_id.to_string(),
                cancel_token,
            });
            state.phase = QueryPhase::Sending;
            state.submit_enabled = false;
            state.stop_enabled = true;
        }
        self.emit(ChatEvent::Controls {
            submit_enabled: false,
            stop_enabled: true,
        });
        Ok(ActiveGuard {
            state: Arc::clone(&self.state),
            event_tx: self.event_tx.clone(),
        })
    }

    fn emit(&self, event: ChatEvent) {
        let _ = self.event_tx.send(event);
    }
}

/// Terminal cleanup for one question. Runs on every exit path, including the
/// submitting future being dropped mid-flight.
struct ActiveGuard {
    state: Arc<Mutex<ControllerState>>,
    event_tx: mpsc::UnboundedSender<ChatEvent>,
}

impl Drop for ActiveGuard {
    fn drop(&mut self) {
        {
            let mut state = self.state.lock();
            state.active = None;
            state.submit_enabled = true;
            state.stop_enabled = false;
            if state.phase.is_active() {
                state.phase = QueryPhase::Cancelled;
            }
        }
        let _ = self.event_tx.send(ChatEvent::Controls {
            submit_enabled: true,
            stop_enabled: false,
        });
        let _ = self.event_tx.send(ChatEvent::FocusInput);
    }
}
