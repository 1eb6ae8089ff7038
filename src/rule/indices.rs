//! Ambiguity sets gathered from a derivation tree

use super::Rule;
use std::collections::BTreeSet;

/// Set of phrase indices a rule node is consistent with
pub type Indices = BTreeSet<usize>;

/// Marks a node that belongs to no phrase; such sets are never gathered
pub const DISMISSED_INDEX: usize = usize::MAX;

/// The ambiguity sets of a rule tree, collected depth-first.
///
/// Empty sets and sets carrying `DISMISSED_INDEX` are skipped.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RuleIndicesList {
    sets: Vec<Indices>,
}

impl RuleIndicesList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one ambiguity set, skipping empty and dismissed ones
    pub fn push(&mut self, indices: &Indices) {
        if indices.is_empty() || indices.contains(&DISMISSED_INDEX) {
            return;
        }
        self.sets.push(indices.clone());
    }

    pub fn len(&self) -> usize {
        self.sets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Indices> {
        self.sets.iter()
    }

    /// Phrase indices consistent with every gathered set
    pub fn intersection(&self) -> Indices {
        let mut sets = self.sets.iter();
        let Some(first) = sets.next() else {
            return Indices::new();
        };
        sets.fold(first.clone(), |acc, set| {
            acc.intersection(set).copied().collect()
        })
    }

    /// The only consistent phrase index, if there is exactly one
    pub fn single_result(&self) -> Option<usize> {
        let intersection = self.intersection();
        if intersection.len() == 1 {
            intersection.into_iter().next()
        } else {
            None
        }
    }

    fn gather(&mut self, rule: &Rule) {
        self.push(rule.indices());
        for child in rule.children() {
            self.gather(child);
        }
    }
}

impl From<&Rule> for RuleIndicesList {
    fn from(rule: &Rule) -> Self {
        let mut list = Self::new();
        list.gather(rule);
        list
    }
}

impl FromIterator<Indices> for RuleIndicesList {
    fn from_iter<I: IntoIterator<Item = Indices>>(iter: I) -> Self {
        let mut list = Self::new();
        for indices in iter {
            list.push(&indices);
        }
        list
    }
}
