//! Derivation Trees
//!
//! A `Rule` is one candidate interpretation of a recognized phrase: the
//! grammar rule that matched, the words it accounts for and the set of
//! phrase indices (grammar alternatives) it is still consistent with.
//!
//! Rules are values. Transformations return new rules and never touch the
//! original, so hypotheses can be shared between threads freely.

pub mod indices;
pub mod repair;

pub use indices::{Indices, RuleIndicesList, DISMISSED_INDEX};

use crate::confidence::Confidence;
use crate::error::{ResolverError, ResolverResult};
use crate::text;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Range;

/// Name of rules built from interim recognition results
pub const HYPOTHESIS: &str = "Hypothesis";
/// Name of rules rebuilt by `Rule::repair`
pub const REPAIRED: &str = "Repaired";

/// A node of a derivation tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawRule")]
pub struct Rule {
    name: String,
    text: Option<String>,
    from: usize,
    to: usize,
    indices: Indices,
    probability: f32,
    confidence: Confidence,
    children: Vec<Rule>,
}

/// Wire form of a rule; confidence defaults to the probability's class
#[derive(Deserialize)]
struct RawRule {
    name: String,
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    from: usize,
    #[serde(default)]
    to: usize,
    #[serde(default)]
    indices: Indices,
    probability: f32,
    #[serde(default)]
    confidence: Option<Confidence>,
    #[serde(default)]
    children: Vec<Rule>,
}

impl From<RawRule> for Rule {
    fn from(raw: RawRule) -> Self {
        Self {
            confidence: raw
                .confidence
                .unwrap_or_else(|| Confidence::from_probability(raw.probability)),
            name: raw.name,
            text: raw.text,
            from: raw.from,
            to: raw.to,
            indices: raw.indices,
            probability: raw.probability,
            children: raw.children,
        }
    }
}

impl Rule {
    /// Leaf rule matching `text` over the word span `span`
    pub fn new(
        name: impl Into<String>,
        text: impl Into<String>,
        span: Range<usize>,
        indices: impl IntoIterator<Item = usize>,
        probability: f32,
    ) -> Self {
        Self {
            name: name.into(),
            text: Some(text.into()),
            from: span.start,
            to: span.end,
            indices: indices.into_iter().collect(),
            probability,
            confidence: Confidence::from_probability(probability),
            children: Vec::new(),
        }
    }

    /// Rule that matched nothing at word position `at`.
    ///
    /// Empty `indices` mark a skipped optional branch. Otherwise they are the
    /// phrases expecting words here, and the gap is a candidate for `repair`.
    pub fn null(name: impl Into<String>, at: usize, indices: impl IntoIterator<Item = usize>) -> Self {
        Self {
            name: name.into(),
            text: None,
            from: at,
            to: at,
            indices: indices.into_iter().collect(),
            probability: 0.0,
            confidence: Confidence::Noise,
            children: Vec::new(),
        }
    }

    pub fn with_children(self, children: Vec<Rule>) -> Self {
        Self { children, ..self }
    }

    pub fn with_probability(self, probability: f32) -> Self {
        Self {
            probability,
            ..self
        }
    }

    pub fn with_confidence(self, confidence: Confidence) -> Self {
        Self { confidence, ..self }
    }

    pub fn with_name(self, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..self
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    pub fn word_span(&self) -> Range<usize> {
        self.from..self.to
    }

    pub fn indices(&self) -> &Indices {
        &self.indices
    }

    pub fn probability(&self) -> f32 {
        self.probability
    }

    pub fn confidence(&self) -> Confidence {
        self.confidence
    }

    pub fn children(&self) -> &[Rule] {
        &self.children
    }

    pub fn is_null(&self) -> bool {
        self.text.is_none()
    }

    pub fn word_count(&self) -> usize {
        self.text.as_deref().map(text::word_count).unwrap_or(0)
    }

    /// Ambiguity sets of this tree, depth-first
    pub fn indices_list(&self) -> RuleIndicesList {
        RuleIndicesList::from(self)
    }

    /// Phrase indices consistent with the whole tree
    pub fn intersection(&self) -> Indices {
        self.indices_list().intersection()
    }

    /// Choice indices consistent with the whole tree
    pub fn choices(&self, mapper: &impl Fn(usize) -> usize) -> Indices {
        self.intersection().into_iter().map(mapper).collect()
    }

    /// The choice this tree resolves to, if it resolves to exactly one
    pub fn single_choice(&self, mapper: &impl Fn(usize) -> usize) -> Option<usize> {
        let choices = self.choices(mapper);
        if choices.len() == 1 {
            choices.into_iter().next()
        } else {
            None
        }
    }

    /// Choices of the topmost nodes that resolve to a single choice each.
    ///
    /// Used for prompts that accept several choices in one utterance, where
    /// the tree as a whole is ambiguous but its parts aren't.
    pub fn distinct_choices(&self, mapper: &impl Fn(usize) -> usize) -> Indices {
        let mut choices = Indices::new();
        self.collect_distinct_choices(mapper, &mut choices);
        choices
    }

    fn collect_distinct_choices(&self, mapper: &impl Fn(usize) -> usize, choices: &mut Indices) {
        if self.is_null() {
            return;
        }
        if let Some(choice) = self.single_choice(mapper) {
            choices.insert(choice);
            return;
        }
        for child in &self.children {
            child.collect_distinct_choices(mapper, choices);
        }
    }

    /// Whether every node's children add up to its text and word span
    pub fn is_valid(&self) -> bool {
        self.find_defect().is_none()
    }

    /// Like `is_valid`, naming the first offending node
    pub fn validate(&self) -> ResolverResult<()> {
        match self.find_defect() {
            Some(defect) => Err(ResolverError::InvalidRule(defect)),
            None => Ok(()),
        }
    }

    fn find_defect(&self) -> Option<String> {
        if self.from > self.to {
            return Some(format!("{}: reversed word span", self));
        }

        match &self.text {
            None => {
                if self.children.iter().any(|child| !child.is_null()) {
                    return Some(format!("{}: null rule with non-null children", self));
                }
            }
            Some(text) => {
                if text::word_count(text) != self.to - self.from {
                    return Some(format!("{}: text doesn't fit word span", self));
                }
                if !self.children.is_empty() {
                    if let Some(defect) = self.find_children_defect(text) {
                        return Some(defect);
                    }
                }
            }
        }

        self.children.iter().find_map(Rule::find_defect)
    }

    fn find_children_defect(&self, text: &str) -> Option<String> {
        let matched: Vec<&Rule> = self.children.iter().filter(|c| !c.is_null()).collect();

        let joined = matched
            .iter()
            .filter_map(|child| child.text())
            .collect::<Vec<_>>()
            .join(" ");
        if !text::same_words(&joined, text) {
            return Some(format!("{}: children spell \"{}\"", self, joined));
        }

        let mut expected = self.from;
        for child in &matched {
            if child.from != expected {
                return Some(format!("{}: gap or overlap before {}", self, child));
            }
            expected = child.to;
        }
        if expected != self.to {
            return Some(format!("{}: children end at word {}", self, expected));
        }

        None
    }

    /// Same tree, moved so that it starts at word `from`
    fn moved_to(&self, from: usize) -> Rule {
        let offset = from as isize - self.from as isize;
        self.shifted(offset)
    }

    fn shifted(&self, offset: isize) -> Rule {
        let shift = |position: usize| (position as isize + offset).max(0) as usize;
        Rule {
            from: shift(self.from),
            to: shift(self.to),
            children: self.children.iter().map(|c| c.shifted(offset)).collect(),
            ..self.clone()
        }
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({},{})", self.name, self.from, self.to)?;
        match &self.text {
            Some(text) => write!(f, " \"{}\"", text)?,
            None => write!(f, " <null>")?,
        }
        write!(
            f,
            " {:?} {:.2} {}",
            self.indices, self.probability, self.confidence
        )
    }
}

/// Most probable rule that resolves to exactly one choice.
///
/// Ties go to the rule seen first.
pub fn best_single_result(rules: &[Rule], mapper: impl Fn(usize) -> usize) -> Option<Rule> {
    let mut best: Option<&Rule> = None;
    for rule in rules {
        if rule.single_choice(&mapper).is_none() {
            continue;
        }
        if best.map_or(true, |b| rule.probability > b.probability) {
            best = Some(rule);
        }
    }
    best.cloned()
}

/// Most probable rule, ambiguous or not. Ties go to the rule seen first.
pub fn best_multiple_choices(rules: &[Rule]) -> Option<Rule> {
    let mut best: Option<&Rule> = None;
    for rule in rules {
        if best.map_or(true, |b| rule.probability > b.probability) {
            best = Some(rule);
        }
    }
    best.cloned()
}
