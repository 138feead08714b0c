pub mod call;
pub mod config;
pub mod error;
pub mod generation;
pub mod http;
pub mod insight;
pub mod session;
pub mod store;

pub use call::{CallEvent, CallOutcome, CallSession, CallStatus, RelayVoiceClient, VoiceClient};
pub use config::Config;
pub use error::{AppError, AppResult};
pub use generation::{GeminiClient, GenerationRequest, StructuredGenerator};
pub use http::{create_router, AppState};
pub use insight::{CreateInsight, Insight, InsightManager, TranscriptMessage};
pub use session::{NewSession, Session, SessionManager};
pub use store::{DocumentStore, MemoryStore};
