use super::client::{CallEvent, VoiceClient};
use anyhow::{bail, Context, Result};
use std::sync::Mutex;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

const EVENT_BUFFER: usize = 256;

/// Voice client whose events are pushed in by the HTTP layer
///
/// The browser holds the real audio call and forwards every SDK event to
/// the service; this client turns them into the call's event stream.
pub struct RelayVoiceClient {
    api_token: String,
    sender: Mutex<Option<mpsc::Sender<CallEvent>>>,
}

impl RelayVoiceClient {
    pub fn new(api_token: impl Into<String>) -> Self {
        Self {
            api_token: api_token.into(),
            sender: Mutex::new(None),
        }
    }

    /// Forward one event to the running call
    pub async fn relay(&self, event: CallEvent) -> Result<()> {
        let sender = {
            let mut guard = self.lock_sender();
            if event == CallEvent::CallEnd {
                // Closing the stream after call-end keeps later events out
                guard.take()
            } else {
                guard.clone()
            }
        };

        let Some(sender) = sender else {
            bail!("No active call to relay events to");
        };

        sender
            .send(event)
            .await
            .context("Call event loop is no longer running")
    }

    fn lock_sender(&self) -> std::sync::MutexGuard<'_, Option<mpsc::Sender<CallEvent>>> {
        self.sender
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait::async_trait]
impl VoiceClient for RelayVoiceClient {
    async fn start(&self, assistant_id: &str) -> Result<mpsc::Receiver<CallEvent>> {
        if self.api_token.trim().is_empty() {
            bail!("Voice API token is missing");
        }

        let mut guard = self.lock_sender();
        if guard.is_some() {
            bail!("Call already started");
        }

        let (tx, rx) = mpsc::channel(EVENT_BUFFER);
        *guard = Some(tx);

        info!("Relay call opened for assistant {}", assistant_id);
        Ok(rx)
    }

    fn stop(&self) {
        let Some(sender) = self.lock_sender().take() else {
            return;
        };

        info!("Relay call stop requested");
        if let Err(e) = sender.try_send(CallEvent::CallEnd) {
            warn!("Failed to deliver call-end on stop: {}", e);
        }
    }

    fn set_muted(&self, muted: bool) {
        // The browser owns the microphone and reads the state from the call snapshot
        debug!("Relay call mute set to {}", muted);
    }

    fn name(&self) -> &str {
        "relay"
    }
}
