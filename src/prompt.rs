//! Prompt Interface
//!
//! The prompt owns show/dismiss and receives the final result. The resolver
//! only reads what kind of answer the prompt accepts and signals it once.

use crate::choices::PreparedChoices;
use crate::confidence::Confidence;
use crate::error::{ResolverError, ResolverResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::sync::{Arc, Mutex};
use tokio::sync::oneshot;
use tracing::{debug, warn};

/// Whether a prompt expects one choice or allows several at once
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AcceptedResult {
    Distinct,
    Multiple,
}

/// The choice(s) a prompt resolved to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Selection {
    Single(usize),
    Multiple(BTreeSet<usize>),
}

impl Selection {
    pub fn choices(&self) -> Vec<usize> {
        match self {
            Selection::Single(choice) => vec![*choice],
            Selection::Multiple(choices) => choices.iter().copied().collect(),
        }
    }
}

/// Accepted recognition result handed to the prompt
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromptResult {
    pub selection: Selection,
    pub probability: f32,
    pub confidence: Confidence,
    pub text: Option<String>,
}

/// A prompt waiting for a spoken answer
pub trait Prompt: Send + Sync + fmt::Debug {
    fn accepted_result(&self) -> AcceptedResult;

    fn choices(&self) -> Arc<dyn PreparedChoices>;

    /// Deliver the accepted result
    fn signal(&self, result: PromptResult);

    /// Deliver a failure that ended the attempt
    fn set_error(&self, error: ResolverError);
}

type ResultSender = oneshot::Sender<ResolverResult<PromptResult>>;

/// Prompt delivering its outcome through a oneshot channel.
///
/// The first `signal` or `set_error` wins; later ones are logged and dropped.
pub struct ChoicePrompt {
    choices: Arc<dyn PreparedChoices>,
    accepted: AcceptedResult,
    sender: Mutex<Option<ResultSender>>,
}

impl ChoicePrompt {
    pub fn new(
        choices: Arc<dyn PreparedChoices>,
        accepted: AcceptedResult,
    ) -> (Arc<Self>, oneshot::Receiver<ResolverResult<PromptResult>>) {
        let (tx, rx) = oneshot::channel();
        let prompt = Arc::new(Self {
            choices,
            accepted,
            sender: Mutex::new(Some(tx)),
        });
        (prompt, rx)
    }

    /// Whether the outcome has been delivered already
    pub fn is_done(&self) -> bool {
        match self.sender.lock() {
            Ok(sender) => sender.is_none(),
            Err(_) => true,
        }
    }

    fn deliver(&self, outcome: ResolverResult<PromptResult>) {
        let sender = match self.sender.lock() {
            Ok(mut sender) => sender.take(),
            Err(e) => {
                warn!("⚠️ Prompt lock poisoned, dropping outcome: {}", e);
                return;
            }
        };

        match sender {
            Some(tx) => {
                if tx.send(outcome).is_err() {
                    debug!("Prompt receiver dropped before outcome arrived");
                }
            }
            None => warn!("⚠️ Prompt already completed, ignoring {:?}", outcome),
        }
    }
}

impl fmt::Debug for ChoicePrompt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChoicePrompt")
            .field("choices", &self.choices)
            .field("accepted", &self.accepted)
            .finish()
    }
}

impl Prompt for ChoicePrompt {
    fn accepted_result(&self) -> AcceptedResult {
        self.accepted
    }

    fn choices(&self) -> Arc<dyn PreparedChoices> {
        self.choices.clone()
    }

    fn signal(&self, result: PromptResult) {
        self.deliver(Ok(result));
    }

    fn set_error(&self, error: ResolverError) {
        self.deliver(Err(error));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::choices::PhraseChoices;
    use crate::confidence::Intent;

    fn prompt() -> (Arc<ChoicePrompt>, oneshot::Receiver<ResolverResult<PromptResult>>) {
        let choices = PhraseChoices::new(Intent::Confirm, vec![vec!["yes"], vec!["no"]]);
        ChoicePrompt::new(Arc::new(choices), AcceptedResult::Distinct)
    }

    fn result(choice: usize) -> PromptResult {
        PromptResult {
            selection: Selection::Single(choice),
            probability: 0.9,
            confidence: Confidence::High,
            text: Some("yes".to_string()),
        }
    }

    #[tokio::test]
    async fn test_signal_delivers_result() {
        let (prompt, rx) = prompt();
        assert!(!prompt.is_done());
        prompt.signal(result(0));
        assert!(prompt.is_done());

        let outcome = rx.await.expect("sender kept").expect("accepted");
        assert_eq!(outcome.selection, Selection::Single(0));
    }

    #[test]
    fn test_first_outcome_wins() {
        let (prompt, rx) = prompt();
        prompt.set_error(ResolverError::Engine("boom".to_string()));
        prompt.signal(result(1));

        let outcome = tokio_test::block_on(rx).expect("sender kept");
        assert!(matches!(outcome, Err(ResolverError::Engine(_))));
    }

    #[test]
    fn test_selection_choices() {
        assert_eq!(Selection::Single(3).choices(), vec![3]);
        let multiple = Selection::Multiple([2, 0].into_iter().collect());
        assert_eq!(multiple.choices(), vec![0, 2]);
    }
}
