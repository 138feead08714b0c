//! Voice call orchestration
//!
//! This module provides the `CallSession` abstraction that manages:
//! - Starting and stopping a call through a `VoiceClient`
//! - Mute control
//! - Transcript collection from final speech fragments
//! - Handing the transcript to insight generation when the call ends

mod client;
mod relay;
mod session;
mod status;

pub use client::{CallEvent, VoiceClient, VoiceMessage};
pub use relay::RelayVoiceClient;
pub use session::CallSession;
pub use status::{CallOutcome, CallSnapshot, CallStatus};
