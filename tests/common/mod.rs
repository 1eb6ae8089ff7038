#![allow(dead_code)]

pub mod mock_engine;

pub use mock_engine::{GatedEngine, MockEngine};

use std::sync::Arc;
use tokio::sync::{broadcast, oneshot};
use tuxtalks_resolver::choices::PhraseSlice;
use tuxtalks_resolver::{
    AcceptedResult, ChoicePrompt, EngineProvider, Intent, Notification, PhraseChoices,
    PreparedChoices, Prompt, PromptResult, RecognitionEvent, RejectReason, Resolver, ResolverConfig,
    ResolverResult, Rule, SlicedPhrases,
};

pub type Outcome = oneshot::Receiver<ResolverResult<PromptResult>>;

pub fn resolver() -> Resolver<MockEngine> {
    Resolver::new(MockEngine::new(), ResolverConfig::default())
}

/// Phrases 0 "yes", 1 "yes miss" (choice 0), 2 "no", 3 "no miss" (choice 1)
pub fn yes_no(intent: Intent) -> Arc<PhraseChoices> {
    Arc::new(PhraseChoices::new(
        intent,
        vec![vec!["yes", "yes miss"], vec!["no", "no miss"]],
    ))
}

/// Phrase index equals choice index
pub fn colors(intent: Intent) -> Arc<PhraseChoices> {
    Arc::new(PhraseChoices::new(
        intent,
        vec![vec!["red"], vec!["green"], vec!["blue"]],
    ))
}

/// Show a fresh prompt over `choices`
pub fn show<E: EngineProvider>(
    resolver: &Resolver<E>,
    choices: Arc<dyn PreparedChoices>,
    accepted: AcceptedResult,
) -> (Arc<dyn Prompt>, Outcome) {
    let (prompt, outcome) = ChoicePrompt::new(choices, accepted);
    let prompt: Arc<dyn Prompt> = prompt;
    resolver.show(prompt.clone()).expect("Failed to show prompt");
    (prompt, outcome)
}

pub fn speech(rules: Vec<Rule>) -> RecognitionEvent {
    RecognitionEvent::SpeechDetected { rules }
}

pub fn rejected(rules: Vec<Rule>) -> RecognitionEvent {
    RecognitionEvent::RecognitionRejected { rules }
}

pub fn completed(rules: Vec<Rule>) -> RecognitionEvent {
    RecognitionEvent::RecognitionCompleted { rules }
}

/// Everything broadcast so far
pub fn drain(notifications: &mut broadcast::Receiver<Notification>) -> Vec<Notification> {
    let mut received = Vec::new();
    while let Ok(notification) = notifications.try_recv() {
        received.push(notification);
    }
    received
}

pub fn rejections(notifications: &[Notification]) -> Vec<RejectReason> {
    notifications
        .iter()
        .filter_map(|n| match n {
            Notification::Rejected { reason, .. } => Some(*reason),
            _ => None,
        })
        .collect()
}

pub fn accepted_count(notifications: &[Notification]) -> usize {
    notifications
        .iter()
        .filter(|n| matches!(n, Notification::Accepted { .. }))
        .count()
}

/// Grammar with explicit word slices.
///
/// Phrase 0 "yes miss" is choice 0, phrase 1 "miss" is choice 1. The short
/// phrase is aligned to the second word, so only "yes" fits before "miss".
#[derive(Debug)]
pub struct AlignedChoices {
    sliced: SlicedPhrases,
}

impl AlignedChoices {
    pub fn new() -> Self {
        let slice = |text: &str, indices: &[usize]| PhraseSlice {
            text: text.to_string(),
            indices: indices.iter().copied().collect(),
        };
        Self {
            sliced: SlicedPhrases::new(vec![
                vec![slice("yes", &[0])],
                vec![slice("miss", &[0, 1])],
            ]),
        }
    }
}

impl PreparedChoices for AlignedChoices {
    fn intent(&self) -> Intent {
        Intent::Confirm
    }

    fn choice_count(&self) -> usize {
        2
    }

    fn map_phrase_to_choice(&self, phrase: usize) -> usize {
        phrase.min(2)
    }

    fn sliced_phrases(&self) -> Option<&SlicedPhrases> {
        Some(&self.sliced)
    }
}
