use crate::call::{CallSession, RelayVoiceClient};
use crate::config::VoiceConfig;
use crate::generation::StructuredGenerator;
use crate::insight::InsightManager;
use crate::session::SessionManager;
use crate::store::DocumentStore;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// A call together with the relay feeding it
#[derive(Clone)]
pub struct ActiveCall {
    pub call: Arc<CallSession>,
    pub relay: Arc<RelayVoiceClient>,
}

/// Shared application state for HTTP handlers
#[derive(Clone)]
pub struct AppState {
    pub sessions: SessionManager,
    pub insights: InsightManager,

    /// Voice settings checked before every call
    pub voice: Arc<VoiceConfig>,

    /// Calls by session (session_id → call)
    pub calls: Arc<RwLock<HashMap<String, ActiveCall>>>,
}

impl AppState {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        generator: Arc<dyn StructuredGenerator>,
        voice: VoiceConfig,
    ) -> Self {
        Self {
            sessions: SessionManager::new(Arc::clone(&store), Arc::clone(&generator)),
            insights: InsightManager::new(store, generator),
            voice: Arc::new(voice),
            calls: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}
