//! Live Call Monitor
//!
//! Drives the risk sampler on a fixed-period timer while a call is active,
//! tracks the live severity tier, and raises alerts when the tier escalates.

mod language;
mod monitor;
mod session;

pub use language::{find_language, Language, LanguageError, LanguagePreferences, LANGUAGES};
pub use monitor::{CallMonitor, MonitorConfig, MonitorEvent, DEMO_TRANSCRIPT};
pub use session::{format_duration, CallStatus, CallerInfo, LiveSnapshot, VoiceAnalysis};

use thiserror::Error;

/// Call lifecycle errors
#[derive(Debug, Error)]
pub enum MonitorError {
    #[error("A call is already being monitored")]
    CallAlreadyActive,

    #[error("No active call")]
    NoActiveCall,

    #[error(transparent)]
    Language(#[from] LanguageError),
}
