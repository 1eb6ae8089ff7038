//! What observers hear about a recognition attempt

use crate::audio_signal::AudioSignalProblem;
use crate::prompt::PromptResult;
use crate::rule::Rule;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Why an attempt was rejected. Rejections are normal outcomes; the prompt
/// stays active for another attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectReason {
    /// The engine found no confident grammar match
    NoConfidentMatch,
    /// No candidate resolved to a usable choice
    NoMatchingChoice,
    /// Accepted candidate didn't translate into valid choices
    UndefinedResult,
    /// Would have passed without the audio penalty
    AudioSignalPenalty,
    /// Too many audio problems during the attempt
    AudioSignalProblems,
    InsufficientConfidence,
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            RejectReason::NoConfidentMatch => "no confident match",
            RejectReason::NoMatchingChoice => "no matching choice",
            RejectReason::UndefinedResult => "empty/undefined result",
            RejectReason::AudioSignalPenalty => "audio signal problem penalty",
            RejectReason::AudioSignalProblems => "audio signal problems",
            RejectReason::InsufficientConfidence => "insufficient confidence",
        };
        f.write_str(reason)
    }
}

/// Broadcast to every subscriber of a resolver
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Notification {
    Started,
    AudioLevel {
        level: i32,
    },
    AudioSignalProblem {
        problem: AudioSignalProblem,
        total: u32,
    },
    /// Audio got too bad, the engine was asked to start over
    RestartRequested,
    Hypothesis {
        rule: Rule,
        probability: f32,
    },
    Rejected {
        reason: RejectReason,
        rule: Option<Rule>,
    },
    /// The caller may want to react to the rejection, e.g. by prompting again
    HandlerInvocation {
        reason: RejectReason,
    },
    Accepted {
        result: PromptResult,
    },
    Dismissed,
    Faulted {
        message: String,
    },
}

impl Notification {
    /// Whether the notification reports an accept/reject decision
    pub fn is_decision(&self) -> bool {
        matches!(
            self,
            Notification::Rejected { .. } | Notification::Accepted { .. } | Notification::Faulted { .. }
        )
    }
}
