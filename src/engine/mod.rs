//! Recognition Engine Interface
//!
//! Engines deliver events from their own threads; the resolver only asks
//! them to start, stop or restart an attempt.

pub mod script;

use crate::audio_signal::AudioSignalProblem;
use crate::error::ResolverResult;
use crate::rule::Rule;
use serde::{Deserialize, Serialize};

pub use script::{RecognitionScript, ScriptedEngine};

/// Trait for recognition backends
pub trait EngineProvider: Send + Sync {
    /// Begin listening for the active prompt's grammar
    fn start(&self) -> ResolverResult<()>;

    /// Stop listening, the attempt is over
    fn stop(&self) -> ResolverResult<()>;

    /// Throw away the current attempt and listen again
    fn restart(&self) -> ResolverResult<()>;
}

/// Event reported by a recognition engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RecognitionEvent {
    /// A new attempt begins
    Started,
    AudioLevelUpdated {
        level: i32,
    },
    AudioSignalProblemOccurred {
        problem: AudioSignalProblem,
    },
    /// Interim result while speech continues
    SpeechDetected {
        rules: Vec<Rule>,
    },
    /// Attempt ended without a confident match
    RecognitionRejected {
        #[serde(default)]
        rules: Vec<Rule>,
    },
    /// Attempt ended with final candidates
    RecognitionCompleted {
        rules: Vec<Rule>,
    },
}

impl RecognitionEvent {
    /// Whether the event ends an attempt
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            RecognitionEvent::RecognitionRejected { .. }
                | RecognitionEvent::RecognitionCompleted { .. }
        )
    }

    pub fn kind(&self) -> &'static str {
        match self {
            RecognitionEvent::Started => "started",
            RecognitionEvent::AudioLevelUpdated { .. } => "audio_level_updated",
            RecognitionEvent::AudioSignalProblemOccurred { .. } => "audio_signal_problem_occurred",
            RecognitionEvent::SpeechDetected { .. } => "speech_detected",
            RecognitionEvent::RecognitionRejected { .. } => "recognition_rejected",
            RecognitionEvent::RecognitionCompleted { .. } => "recognition_completed",
        }
    }
}
