//! Confidence Model
//!
//! Ordinal confidence levels with baseline probabilities, plus the policy that
//! turns an interaction intent and an utterance length into the probability a
//! recognition result has to reach before it is accepted.

use crate::config::ResolverConfig;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Confidence classification of a recognition result
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Confidence {
    Noise,
    Low,
    Normal,
    High,
}

impl Confidence {
    /// All levels, lowest first
    pub const ALL: [Confidence; 4] = [
        Confidence::Noise,
        Confidence::Low,
        Confidence::Normal,
        Confidence::High,
    ];

    /// Baseline probability of this level
    pub fn probability(self) -> f32 {
        match self {
            Confidence::Noise => 0.0,
            Confidence::Low => 0.25,
            Confidence::Normal => 0.5,
            Confidence::High => 0.75,
        }
    }

    /// Next lower level, saturating at `Noise`
    pub fn lower(self) -> Confidence {
        match self {
            Confidence::Noise | Confidence::Low => Confidence::Noise,
            Confidence::Normal => Confidence::Low,
            Confidence::High => Confidence::Normal,
        }
    }

    /// Next higher level, saturating at `High`
    pub fn higher(self) -> Confidence {
        match self {
            Confidence::Noise => Confidence::Low,
            Confidence::Low => Confidence::Normal,
            Confidence::Normal | Confidence::High => Confidence::High,
        }
    }

    /// Midpoint between this level and the next lower one
    pub fn reduced_probability(self) -> f32 {
        (self.probability() + self.lower().probability()) / 2.0
    }

    pub fn is_as_high_as(self, other: Confidence) -> bool {
        self >= other
    }

    /// Highest level whose baseline probability is not above `probability`
    pub fn from_probability(probability: f32) -> Confidence {
        Confidence::ALL
            .iter()
            .rev()
            .copied()
            .find(|c| c.probability() <= probability)
            .unwrap_or(Confidence::Noise)
    }
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Confidence::Noise => "Noise",
            Confidence::Low => "Low",
            Confidence::Normal => "Normal",
            Confidence::High => "High",
        };
        f.write_str(name)
    }
}

/// What the prompt asks of the user, which sets how sure we have to be
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    /// Casual conversation, a misunderstanding is cheap
    Chat,
    /// Yes/no style confirmation
    Confirm,
    /// A choice with consequences
    Decide,
}

impl Intent {
    pub fn confidence(self) -> Confidence {
        match self {
            Intent::Chat => Confidence::Low,
            Intent::Confirm => Confidence::Normal,
            Intent::Decide => Confidence::High,
        }
    }
}

/// Maps intent, utterance length and awareness to a required probability.
///
/// Acoustic probability mass spreads over the words of an utterance, so long
/// phrases score lower even when recognized correctly. Utterances up to
/// `full_weight_words` use the intent baseline; every further word lowers the
/// threshold by `decay_per_word`, never below `Confidence::Low`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConfidenceWeighting {
    pub full_weight_words: usize,
    pub decay_per_word: f32,
}

impl Default for ConfidenceWeighting {
    fn default() -> Self {
        Self {
            full_weight_words: 3,
            decay_per_word: 0.025,
        }
    }
}

impl ConfidenceWeighting {
    pub fn from_config(config: &ResolverConfig) -> Self {
        Self {
            full_weight_words: config.full_weight_words,
            decay_per_word: config.word_weight_decay,
        }
    }

    /// Threshold for `confidence` after length weighting, before awareness
    pub fn weighted(&self, confidence: Confidence, word_count: usize) -> f32 {
        let base = confidence.probability();
        let extra_words = word_count.saturating_sub(self.full_weight_words) as f32;
        let floor = Confidence::Low.probability().min(base);
        (base - self.decay_per_word * extra_words).max(floor)
    }

    /// Probability a result must reach to be accepted
    pub fn required_confidence(&self, intent: Intent, word_count: usize, awareness_bonus: f32) -> f32 {
        self.weighted(intent.confidence(), word_count) * awareness_bonus
    }
}
