//! Prepared Choices
//!
//! The grammar side of a prompt: which phrase index belongs to which choice,
//! how to weight a recognized rule, and optionally the phrases sliced into
//! word positions for gap repair.
//!
//! Grammar compilers implement `PreparedChoices`. `PhraseChoices` is a plain
//! implementation over lists of phrasings.

use crate::confidence::Intent;
use crate::rule::{Indices, Rule};
use crate::text;
use std::collections::BTreeMap;
use std::fmt;

/// Compiled grammar of one prompt
pub trait PreparedChoices: Send + Sync + fmt::Debug {
    fn intent(&self) -> Intent;

    /// Number of choices the prompt offers
    fn choice_count(&self) -> usize;

    /// Phrase index to choice index
    fn map_phrase_to_choice(&self, phrase: usize) -> usize;

    /// Probability of `rule` as the acceptance policy sees it
    fn weighted_probability(&self, rule: &Rule) -> f32 {
        rule.probability()
    }

    /// Phrases sliced by word position, if the grammar supports repair
    fn sliced_phrases(&self) -> Option<&SlicedPhrases> {
        None
    }
}

/// One candidate text at a word position and the phrases containing it
#[derive(Debug, Clone, PartialEq)]
pub struct PhraseSlice {
    pub text: String,
    pub indices: Indices,
}

/// Candidate phrase parts by word position.
///
/// Slice `k` holds the `k`-th words of the phrases. A gap in a rule is filled
/// from the slice at its word offset within that rule.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SlicedPhrases {
    slices: Vec<Vec<PhraseSlice>>,
}

impl SlicedPhrases {
    pub fn new(slices: Vec<Vec<PhraseSlice>>) -> Self {
        Self { slices }
    }

    /// Slice phrases word by word. Identical words at the same position are
    /// merged, case-insensitively.
    pub fn by_word<S: AsRef<str>>(phrases: &[S]) -> Self {
        let mut slices: Vec<BTreeMap<String, PhraseSlice>> = Vec::new();
        for (index, phrase) in phrases.iter().enumerate() {
            for (position, word) in text::words(phrase.as_ref()).into_iter().enumerate() {
                if slices.len() <= position {
                    slices.push(BTreeMap::new());
                }
                slices[position]
                    .entry(word.to_lowercase())
                    .or_insert_with(|| PhraseSlice {
                        text: word.clone(),
                        indices: Indices::new(),
                    })
                    .indices
                    .insert(index);
            }
        }

        Self {
            slices: slices
                .into_iter()
                .map(|slice| slice.into_values().collect())
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.slices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slices.is_empty()
    }

    pub fn slice(&self, position: usize) -> &[PhraseSlice] {
        self.slices.get(position).map(Vec::as_slice).unwrap_or(&[])
    }
}

/// Choices given as lists of phrasings, one list per choice
#[derive(Debug, Clone)]
pub struct PhraseChoices {
    intent: Intent,
    phrases: Vec<String>,
    phrase_to_choice: Vec<usize>,
    choice_count: usize,
    sliced: SlicedPhrases,
}

impl PhraseChoices {
    pub fn new<S: Into<String>>(intent: Intent, choices: Vec<Vec<S>>) -> Self {
        let choice_count = choices.len();
        let mut phrases = Vec::new();
        let mut phrase_to_choice = Vec::new();

        for (choice, phrasings) in choices.into_iter().enumerate() {
            for phrase in phrasings {
                phrases.push(phrase.into());
                phrase_to_choice.push(choice);
            }
        }

        let sliced = SlicedPhrases::by_word(&phrases);
        Self {
            intent,
            phrases,
            phrase_to_choice,
            choice_count,
            sliced,
        }
    }

    pub fn phrases(&self) -> &[String] {
        &self.phrases
    }

}

impl PreparedChoices for PhraseChoices {
    fn intent(&self) -> Intent {
        self.intent
    }

    fn choice_count(&self) -> usize {
        self.choice_count
    }

    /// Unknown phrase indices map past the last choice and fail range checks
    fn map_phrase_to_choice(&self, phrase: usize) -> usize {
        self.phrase_to_choice
            .get(phrase)
            .copied()
            .unwrap_or(self.choice_count)
    }

    fn sliced_phrases(&self) -> Option<&SlicedPhrases> {
        Some(&self.sliced)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn yes_no() -> PhraseChoices {
        PhraseChoices::new(
            Intent::Confirm,
            vec![vec!["Yes", "Yes Miss"], vec!["No", "No Miss"]],
        )
    }

    #[test]
    fn test_phrase_mapping() {
        let choices = yes_no();
        assert_eq!(choices.choice_count(), 2);
        assert_eq!(choices.phrases().len(), 4);
        assert_eq!(choices.map_phrase_to_choice(0), 0);
        assert_eq!(choices.map_phrase_to_choice(1), 0);
        assert_eq!(choices.map_phrase_to_choice(3), 1);
        assert_eq!(choices.map_phrase_to_choice(99), 2);
        assert_eq!(choices.phrases()[2], "No");
    }

    #[test]
    fn test_slices_by_word() {
        let choices = yes_no();
        let sliced = choices.sliced_phrases().expect("slices");
        assert_eq!(sliced.len(), 2);

        let first = sliced.slice(0);
        assert_eq!(first.len(), 2);
        let yes = first.iter().find(|s| s.text == "Yes").expect("yes slice");
        assert_eq!(yes.indices, [0, 1].into_iter().collect());

        let second = sliced.slice(1);
        assert_eq!(second.len(), 1);
        assert_eq!(second[0].text, "Miss");
        assert_eq!(second[0].indices, [1, 3].into_iter().collect());

        assert!(sliced.slice(5).is_empty());
    }

    #[test]
    fn test_default_weighting_is_rule_probability() {
        let choices = yes_no();
        let rule = Rule::new("Main", "yes", 0..1, [0], 0.42);
        assert_eq!(choices.weighted_probability(&rule), 0.42);
    }
}
