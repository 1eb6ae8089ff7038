//! Running best guess while an utterance is still being spoken

use crate::confidence::Confidence;
use crate::rule::{Indices, Rule, HYPOTHESIS};
use std::fmt;

/// An interim recognition result whose confidence follows its probability
#[derive(Debug, Clone, PartialEq)]
pub struct Hypothesis {
    rule: Rule,
}

impl Hypothesis {
    pub fn new(rule: Rule) -> Self {
        let confidence = Confidence::from_probability(rule.probability());
        Self {
            rule: rule.with_name(HYPOTHESIS).with_confidence(confidence),
        }
    }

    pub fn rule(&self) -> &Rule {
        &self.rule
    }

    pub fn probability(&self) -> f32 {
        self.rule.probability()
    }

    pub fn confidence(&self) -> Confidence {
        self.rule.confidence()
    }

    /// Phrase indices the hypothesis is consistent with
    pub fn indices(&self) -> Indices {
        self.rule.intersection()
    }

    /// Whether `candidate` stays within this hypothesis' choices rather than
    /// moving on to another one. Other phrasings of the same choice continue it.
    pub fn is_continued_by(&self, candidate: &Rule, mapper: &impl Fn(usize) -> usize) -> bool {
        let candidate = candidate.choices(mapper);
        !candidate.is_empty() && self.rule.choices(mapper).is_superset(&candidate)
    }

    /// Accumulate `candidate` into this hypothesis.
    ///
    /// Both probabilities are averaged, weighted by child count, and the
    /// result never drops below the candidate's own probability. The
    /// candidate's tree becomes the new hypothesis tree.
    pub fn continued_with(&self, candidate: Rule, probability: f32) -> Hypothesis {
        let own_weight = self.rule.children().len().max(1) as f32;
        let candidate_weight = candidate.children().len().max(1) as f32;
        let blended = (self.probability() * own_weight + probability * candidate_weight)
            / (own_weight + candidate_weight);
        Hypothesis::new(candidate.with_probability(blended.max(probability)))
    }
}

impl fmt::Display for Hypothesis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.rule.fmt(f)
    }
}
