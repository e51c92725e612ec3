use std::sync::Arc;

use chrono::Utc;
use parking_lot::Mutex;
use rand::rngs::OsRng;
use rand::{Rng, RngCore};

use crate::storage::KeyValueStore;

/// Storage key under which the session identifier is persisted.
pub const SESSION_ID_KEY: &str = "session_id";

/// Everything that has to accompany a question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionContext {
    pub session_id: String,
    pub transcript: Option<String>,
    pub document_indexed: bool,
}

impl SessionContext {
    /// True when at least one context source is available.
    pub fn has_source(&self) -> bool {
        self.document_indexed || self.transcript.as_deref().is_some_and(|t| !t.is_empty())
    }
}

/// Accumulated conversational context plus the durable session identity.
pub struct ContextStore {
    storage: Arc<dyn KeyValueStore>,
    /// Identifier handed out while storage refused to persist it.
    unsaved_session_id: Mutex<Option<String>>,
    transcript: Option<String>,
    document_indexed: bool,
}

impl ContextStore {
    pub fn new(storage: Arc<dyn KeyValueStore>) -> Self {
        Self {
            storage,
            unsaved_session_id: Mutex::new(None),
            transcript: None,
            document_indexed: false,
        }
    }

    /// Return the persisted session identifier, creating and persisting one
    /// on first use. Never fails: if persisting does not work the generated
    /// value is kept in memory and reused until a write succeeds.
    pub fn get_or_create_session_id(&self) -> String {
        if let Some(existing) = self.storage.get(SESSION_ID_KEY) {
            if !existing.is_empty() {
                return existing;
            }
        }

        let mut unsaved = self.unsaved_session_id.lock();
        let session_id = match unsaved.take() {
            Some(pending) => pending,
            None => generate_session_id(),
        };
        match self.storage.set(SESSION_ID_KEY, &session_id) {
            Ok(()) => log::info!("[{}] Persisted session id", session_id),
            Err(err) => {
                log::warn!("[{}] Failed to persist session id: {}", session_id, err);
                *unsaved = Some(session_id.clone());
            }
        }
        session_id
    }

    pub fn set_transcript(&mut self, transcript: Option<String>) {
        self.transcript = transcript;
    }

    pub fn set_document_indexed(&mut self, indexed: bool) {
        self.document_indexed = indexed;
    }

    pub fn transcript(&self) -> Option<&str> {
        self.transcript.as_deref()
    }

    pub fn document_indexed(&self) -> bool {
        self.document_indexed
    }

    /// Forget transcript and document state. The session id is kept.
    pub fn clear(&mut self) {
        self.transcript = None;
        self.document_indexed = false;
    }

    pub fn snapshot(&self) -> SessionContext {
        SessionContext {
            session_id: self.get_or_create_session_id(),
            transcript: self.transcript.clone(),
            document_indexed: self.document_indexed,
        }
    }
}

/// New globally unique session identifier.
///
/// Uses OS randomness for a v4 UUID. When the OS source is unavailable the
/// identifier falls back to `sid-<unix millis>-<random integer>`.
pub fn generate_session_id() -> String {
    let mut bytes = [0u8; 16];
    match OsRng.try_fill_bytes(&mut bytes) {
        Ok(()) => uuid::Builder::from_random_bytes(bytes)
            .into_uuid()
            .to_string(),
        Err(err) => {
            log::warn!("OS randomness unavailable ({}), using fallback session id", err);
            fallback_session_id()
        }
    }
}

fn fallback_session_id() -> String {
    format!(
        "sid-{}-{}",
        Utc::now().timestamp_millis(),
        rand::thread_rng().gen_range(0..1_000_000u32)
    )
}
