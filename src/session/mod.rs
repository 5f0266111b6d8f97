pub mod backend;

use crate::config::prompt::PromptConfig;
use crate::export::{ ExportError, Exporter };
use crate::models::case::BodyRegion;
use crate::models::chat::{ Message, Transcript };
use self::backend::{ BackendError, PersonaBackend };

use log::{ debug, info, warn };
use std::path::{ Path, PathBuf };
use std::sync::atomic::{ AtomicBool, Ordering };
use std::sync::{ Arc, Mutex, MutexGuard };
use std::time::Duration;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(90);

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("a request is already in flight")]
    Busy,
    #[error("the case has already been generated for this session")]
    AlreadyInitialized,
    #[error("no reply within {0:?}")]
    TimedOut(Duration),
    #[error("request cancelled")]
    Cancelled,
    #[error(transparent)]
    Backend(#[from] BackendError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendOutcome {
    /// Blank input; nothing was sent and the log is untouched.
    Ignored,
    Replied(String),
}

/// Releases the busy flag however the request ends.
struct PendingGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> PendingGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Result<Self, SessionError> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map(|_| Self { flag })
            .map_err(|_| SessionError::Busy)
    }
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

/// One student's conversation with one simulated patient.
///
/// Owns the append-only log and the busy flag. Operations take `&self` so a
/// front-end can keep rendering (and show the typing indicator) while a
/// request is in flight; the log lock is never held across an await.
pub struct ChatSession {
    id: Uuid,
    backend: Arc<dyn PersonaBackend>,
    prompts: Arc<PromptConfig>,
    transcript: Mutex<Transcript>,
    pending: AtomicBool,
    initialized: AtomicBool,
    request_timeout: Duration,
}

impl ChatSession {
    pub fn new(backend: Arc<dyn PersonaBackend>, prompts: Arc<PromptConfig>) -> Self {
        let id = Uuid::new_v4();
        info!("Session {} created", id);
        Self {
            id,
            backend,
            prompts,
            transcript: Mutex::new(Transcript::new()),
            pending: AtomicBool::new(false),
            initialized: AtomicBool::new(false),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn is_pending(&self) -> bool {
        self.pending.load(Ordering::Acquire)
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::Acquire)
    }

    pub fn snapshot(&self) -> Transcript {
        self.log().clone()
    }

    fn log(&self) -> MutexGuard<'_, Transcript> {
        self.transcript.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Generates the case and makes it the first bot message. Only the first
    /// call per session reaches the backend, whatever its outcome.
    pub async fn initialize(&self, cancel: &CancellationToken) -> Result<(), SessionError> {
        self.initialize_with(BodyRegion::random(), cancel).await
    }

    pub async fn initialize_with(
        &self,
        region: BodyRegion,
        cancel: &CancellationToken
    ) -> Result<(), SessionError> {
        let _pending = PendingGuard::acquire(&self.pending)?;
        if self.initialized.swap(true, Ordering::AcqRel) {
            return Err(SessionError::AlreadyInitialized);
        }

        info!("Session {}: generating case for region '{}'", self.id, region);
        let prompt = self.prompts.case_prompt(region);
        let opening = self.call_backend(&prompt, cancel).await?;

        let mut log = self.log();
        if !log.is_empty() {
            warn!("Session {}: discarding {} messages on case initialization", self.id, log.len());
        }
        *log = Transcript::new();
        log.push(Message::bot(opening));
        Ok(())
    }

    pub async fn send(
        &self,
        user_text: &str,
        cancel: &CancellationToken
    ) -> Result<SendOutcome, SessionError> {
        if user_text.trim().is_empty() {
            return Ok(SendOutcome::Ignored);
        }

        let _pending = PendingGuard::acquire(&self.pending)?;
        let reply = self.call_backend(user_text, cancel).await?;

        self.log().push_exchange(Message::user(user_text), Message::bot(reply.clone()));
        Ok(SendOutcome::Replied(reply))
    }

    /// Writes the conversation pane as it currently looks to `dir`.
    pub fn export(&self, exporter: &Exporter, dir: &Path) -> Result<PathBuf, ExportError> {
        let transcript = self.snapshot();
        let path = exporter.save(transcript.messages(), self.is_pending(), dir)?;
        info!("Session {}: transcript exported to {}", self.id, path.display());
        Ok(path)
    }

    async fn call_backend(
        &self,
        message: &str,
        cancel: &CancellationToken
    ) -> Result<String, SessionError> {
        debug!("Session {}: waiting for persona reply", self.id);
        tokio::select! {
            _ = cancel.cancelled() => Err(SessionError::Cancelled),
            result = tokio::time::timeout(self.request_timeout, self.backend.ask(message)) => {
                match result {
                    Ok(reply) => Ok(reply?),
                    Err(_) => Err(SessionError::TimedOut(self.request_timeout)),
                }
            }
        }
    }
}
