//! TuxTalks Resolver Library
//!
//! Turns ambiguous, probabilistic speech recognition output into a definite
//! prompt choice, or rejects it, while an utterance is spoken and after it
//! completes.

pub mod audio_signal;
pub mod audit;
pub mod choices;
pub mod confidence;
pub mod config;
pub mod engine;
pub mod error;
pub mod hypothesis;
pub mod prompt;
pub mod resolver;
pub mod rule;
pub mod text;

pub use audio_signal::{AudioSignalProblem, AudioSignalProblems};
pub use choices::{PhraseChoices, PreparedChoices, SlicedPhrases};
pub use confidence::{Confidence, ConfidenceWeighting, Intent};
pub use config::ResolverConfig;
pub use engine::{EngineProvider, RecognitionEvent};
pub use error::{ResolverError, ResolverResult};
pub use hypothesis::Hypothesis;
pub use prompt::{AcceptedResult, ChoicePrompt, Prompt, PromptResult, Selection};
pub use resolver::{Notification, RejectReason, Resolver};
pub use rule::{Rule, RuleIndicesList};
