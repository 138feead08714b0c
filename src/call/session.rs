use super::client::{CallEvent, VoiceClient};
use super::status::{CallOutcome, CallSnapshot, CallStatus};
use crate::config::VoiceConfig;
use crate::error::{AppError, AppResult};
use crate::insight::{CreateInsight, InsightManager, TranscriptMessage};
use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, watch, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// A live voice call bound to one therapy session
///
/// Accumulates final transcript fragments while the call runs and, on
/// `call-end`, hands the transcript to the `InsightManager` exactly once.
pub struct CallSession {
    /// Session the call belongs to
    session_id: String,

    /// Caller; must own the session for the insight to be written
    user_id: String,

    /// Insight document to overwrite, if the caller chose one
    insight_id: Option<String>,

    /// Voice client driving the call
    voice: Arc<dyn VoiceClient>,

    /// Post-call analysis
    insights: InsightManager,

    /// When the call session was created
    started_at: DateTime<Utc>,

    /// Lifecycle status
    status: Arc<Mutex<CallStatus>>,

    /// Whether the call still needs a teardown request
    is_active: Arc<AtomicBool>,

    /// Local microphone state
    muted: Arc<AtomicBool>,

    /// Final utterances received so far
    transcript: Arc<Mutex<Vec<TranscriptMessage>>>,

    /// Last error reported by the voice client
    last_error: Arc<Mutex<Option<String>>>,

    /// Set once the post-call work is done
    outcome: Arc<watch::Sender<Option<CallOutcome>>>,

    /// Handle for the event processing task
    event_task_handle: Arc<Mutex<Option<JoinHandle<()>>>>,
}

impl CallSession {
    pub fn new(
        session_id: impl Into<String>,
        user_id: impl Into<String>,
        insight_id: Option<String>,
        voice: Arc<dyn VoiceClient>,
        insights: InsightManager,
    ) -> Self {
        let (outcome, _) = watch::channel(None);

        Self {
            session_id: session_id.into(),
            user_id: user_id.into(),
            insight_id,
            voice,
            insights,
            started_at: Utc::now(),
            status: Arc::new(Mutex::new(CallStatus::Idle)),
            is_active: Arc::new(AtomicBool::new(false)),
            muted: Arc::new(AtomicBool::new(false)),
            transcript: Arc::new(Mutex::new(Vec::new())),
            last_error: Arc::new(Mutex::new(None)),
            outcome: Arc::new(outcome),
            event_task_handle: Arc::new(Mutex::new(None)),
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    /// Start the call
    ///
    /// Configuration is checked before the voice client is touched.
    pub async fn start(&self, config: &VoiceConfig) -> AppResult<()> {
        config.validate()?;

        {
            let mut status = self.status.lock().await;
            if *status != CallStatus::Idle {
                warn!("Call for session {} already started", self.session_id);
                return Err(AppError::validation("call already started"));
            }
            *status = CallStatus::Connecting;
        }

        info!(
            "Starting call for session {} via {} client",
            self.session_id,
            self.voice.name()
        );

        let mut events = match self.voice.start(&config.assistant_id).await {
            Ok(events) => events,
            Err(e) => {
                error!("Failed to start call for session {}: {:#}", self.session_id, e);
                *self.status.lock().await = CallStatus::Idle;
                return Err(AppError::external("voice", e));
            }
        };

        self.is_active.store(true, Ordering::SeqCst);

        // Spawn event processing task
        let session_id = self.session_id.clone();
        let user_id = self.user_id.clone();
        let insight_id = self.insight_id.clone();
        let voice = Arc::clone(&self.voice);
        let insights = self.insights.clone();
        let status = Arc::clone(&self.status);
        let is_active = Arc::clone(&self.is_active);
        let transcript = Arc::clone(&self.transcript);
        let last_error = Arc::clone(&self.last_error);
        let outcome = Arc::clone(&self.outcome);

        let event_task = tokio::spawn(async move {
            info!("Call event task started for session {}", session_id);

            let ended = Self::process_events(
                &session_id,
                &mut events,
                voice.as_ref(),
                &status,
                &transcript,
                &last_error,
            )
            .await;

            if !ended {
                warn!(
                    "Event stream for session {} closed without call-end; treating call as ended",
                    session_id
                );
            }

            is_active.store(false, Ordering::SeqCst);
            *status.lock().await = CallStatus::Ended;

            // The transcript is consumed here and never read again
            let transcript = std::mem::take(&mut *transcript.lock().await);
            let result = Self::finish_call(&insights, session_id.clone(), user_id, insight_id, transcript).await;
            outcome.send_replace(Some(result));

            info!("Call event task stopped for session {}", session_id);
        });

        {
            let mut handle = self.event_task_handle.lock().await;
            *handle = Some(event_task);
        }

        Ok(())
    }

    /// Request the call to end; the post-call work runs once `call-end` arrives
    pub fn stop(&self) {
        if !self.is_active.load(Ordering::SeqCst) {
            warn!("Call for session {} not active", self.session_id);
            return;
        }

        info!("Stopping call for session {}", self.session_id);
        self.voice.stop();
    }

    pub fn set_muted(&self, muted: bool) -> AppResult<()> {
        if !self.is_active.load(Ordering::SeqCst) {
            return Err(AppError::validation("no active call"));
        }

        self.voice.set_muted(muted);
        self.muted.store(muted, Ordering::SeqCst);
        info!(
            "Microphone {} for session {}",
            if muted { "muted" } else { "unmuted" },
            self.session_id
        );
        Ok(())
    }

    pub fn is_active(&self) -> bool {
        self.is_active.load(Ordering::SeqCst)
    }

    /// Outcome of the post-call work, if it has finished
    pub fn outcome(&self) -> Option<CallOutcome> {
        self.outcome.borrow().clone()
    }

    /// Wait until the post-call work has finished
    pub async fn wait_for_outcome(&self) -> Option<CallOutcome> {
        let mut rx = self.outcome.subscribe();
        let result = rx.wait_for(Option::is_some).await;
        result.ok().and_then(|outcome| outcome.clone())
    }

    /// Wait for the event task to exit
    pub async fn join(&self) {
        let task = self.event_task_handle.lock().await.take();
        if let Some(task) = task {
            if let Err(e) = task.await {
                error!("Call event task panicked: {}", e);
            }
        }
    }

    pub async fn snapshot(&self) -> CallSnapshot {
        CallSnapshot {
            session_id: self.session_id.clone(),
            status: *self.status.lock().await,
            muted: self.muted.load(Ordering::SeqCst),
            started_at: self.started_at,
            transcript: self.transcript.lock().await.clone(),
            last_error: self.last_error.lock().await.clone(),
            outcome: self.outcome(),
        }
    }

    /// Consume events until `call-end`; returns false if the stream closed first
    async fn process_events(
        session_id: &str,
        events: &mut mpsc::Receiver<CallEvent>,
        voice: &dyn VoiceClient,
        status: &Mutex<CallStatus>,
        transcript: &Mutex<Vec<TranscriptMessage>>,
        last_error: &Mutex<Option<String>>,
    ) -> bool {
        while let Some(event) = events.recv().await {
            match event {
                CallEvent::CallStart => {
                    *status.lock().await = CallStatus::Active;
                    info!("Call for session {} is active", session_id);
                }
                CallEvent::Message(message) => match message.to_transcript_message() {
                    Some(entry) => {
                        debug!("{} said {} chars", entry.role, entry.content.len());
                        transcript.lock().await.push(entry);
                    }
                    None => debug!("Ignoring {} message", message.kind),
                },
                CallEvent::Error(reason) => {
                    error!("Voice call error for session {}: {}", session_id, reason);
                    *last_error.lock().await = Some(reason);
                    voice.stop();
                }
                CallEvent::CallEnd => {
                    info!("Call for session {} ended", session_id);
                    return true;
                }
            }
        }
        false
    }

    async fn finish_call(
        insights: &InsightManager,
        session_id: String,
        user_id: String,
        insight_id: Option<String>,
        transcript: Vec<TranscriptMessage>,
    ) -> CallOutcome {
        if transcript.is_empty() {
            warn!("No conversation recorded for session {}", session_id);
            return CallOutcome::NoConversation;
        }

        let params = CreateInsight {
            session_id: session_id.clone(),
            user_id,
            transcript,
            insight_id,
        };

        match insights.create_insight(params).await {
            Ok(insight) => CallOutcome::InsightCreated { insight },
            Err(e) => {
                error!("Failed to create insight for session {}: {}", session_id, e);
                CallOutcome::Failed {
                    error: e.to_string(),
                }
            }
        }
    }
}

impl Drop for CallSession {
    fn drop(&mut self) {
        // Release the call even if nobody asked to stop it
        if self.is_active.load(Ordering::SeqCst) {
            info!("Tearing down call for session {} on drop", self.session_id);
            self.voice.stop();
        }
    }
}
