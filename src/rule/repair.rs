//! Gap repair
//!
//! Engines sometimes match the words around a gap but not the gap itself.
//! When the matched neighbours pin down which phrases are possible, the gap
//! can be filled from the grammar's sliced phrases, yielding complete trees.

use super::{Indices, Rule, RuleIndicesList, REPAIRED};
use crate::choices::SlicedPhrases;
use tracing::debug;

impl Rule {
    /// Fill null children from `sliced` where the non-null siblings allow it.
    ///
    /// A gap is filled from the slice at its word offset within this rule,
    /// counting the words of the children before it. Returns every consistent
    /// repaired tree, or nothing when the tree has no gaps or no gap can be
    /// filled.
    pub fn repair(&self, sliced: &SlicedPhrases) -> Vec<Rule> {
        if !self.children.iter().any(|c| c.is_null() && !c.indices.is_empty()) {
            return Vec::new();
        }

        let mut anchors = RuleIndicesList::new();
        anchors.push(&self.indices);
        for child in self.children.iter().filter(|c| !c.is_null()) {
            for indices in child.indices_list().iter() {
                anchors.push(indices);
            }
        }
        if anchors.is_empty() {
            // Nothing matched, nothing pins the gaps down
            return Vec::new();
        }

        let known = anchors.intersection();
        if known.is_empty() {
            return Vec::new();
        }

        let mut repaired = Vec::new();
        self.repair_from(0, &known, Vec::new(), sliced, &mut repaired);
        debug!("Repaired {} into {} candidate(s)", self, repaired.len());
        repaired
    }

    fn repair_from(
        &self,
        position: usize,
        candidates: &Indices,
        done: Vec<Rule>,
        sliced: &SlicedPhrases,
        repaired: &mut Vec<Rule>,
    ) {
        let Some(child) = self.children.get(position) else {
            if let Some(rule) = self.assemble(done, candidates) {
                repaired.push(rule);
            }
            return;
        };

        let fillable = child.is_null() && !child.indices.is_disjoint(candidates);
        if !fillable {
            let mut next = done;
            next.push(child.clone());
            self.repair_from(position + 1, candidates, next, sliced, repaired);
            return;
        }

        let offset: usize = done.iter().map(Rule::word_count).sum();
        for phrase in sliced.slice(offset) {
            let narrowed: Indices = candidates
                .intersection(&child.indices)
                .filter(|i| phrase.indices.contains(i))
                .copied()
                .collect();
            if narrowed.is_empty() {
                continue;
            }

            let filler = Rule::new(
                REPAIRED,
                phrase.text.clone(),
                0..crate::text::word_count(&phrase.text),
                narrowed.clone(),
                self.probability,
            )
            .with_confidence(self.confidence.lower());

            let mut next = done.clone();
            next.push(filler);
            self.repair_from(position + 1, &narrowed, next, sliced, repaired);
        }
    }

    /// Lay out repaired children one after another and rebuild the parent
    fn assemble(&self, children: Vec<Rule>, indices: &Indices) -> Option<Rule> {
        let mut at = self.from;
        let mut laid_out = Vec::with_capacity(children.len());
        for child in children {
            if child.is_null() {
                laid_out.push(Rule { from: at, to: at, ..child });
            } else {
                let moved = child.moved_to(at);
                at = moved.to;
                laid_out.push(moved);
            }
        }

        let text = laid_out
            .iter()
            .filter_map(Rule::text)
            .collect::<Vec<_>>()
            .join(" ");
        if text.is_empty() {
            return None;
        }

        Some(Rule {
            name: REPAIRED.to_string(),
            text: Some(text),
            from: self.from,
            to: at,
            indices: indices.clone(),
            probability: self.probability,
            confidence: self.confidence,
            children: laid_out,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::choices::{PhraseChoices, PreparedChoices};
    use crate::confidence::Intent;

    fn choices() -> PhraseChoices {
        // 0: "yes miss", 1: "yes sir", 2: "no miss", 3: "no sir"
        PhraseChoices::new(
            Intent::Confirm,
            vec![vec!["yes miss", "yes sir"], vec!["no miss", "no sir"]],
        )
    }

    #[test]
    fn test_gap_pinned_by_neighbour_is_filled() {
        let choices = choices();
        let sliced = choices.sliced_phrases().expect("slices");

        // Heard "... miss", the first word went missing
        let rule = Rule::new("Main", "miss", 1..2, [], 0.6).with_children(vec![
            Rule::null("Answer", 1, [0, 1, 2, 3]),
            Rule::new("Title", "miss", 1..2, [0, 2], 0.6),
        ]);
        assert!(rule.is_valid());

        let repaired = rule.repair(sliced);
        assert_eq!(repaired.len(), 2);
        for candidate in &repaired {
            assert!(candidate.is_valid(), "{} should be valid", candidate);
            assert_eq!(candidate.name(), REPAIRED);
            assert_eq!(candidate.word_span(), 1..3);
            assert_eq!(candidate.probability(), 0.6);
        }

        let texts: Vec<&str> = repaired.iter().filter_map(Rule::text).collect();
        assert!(texts.contains(&"yes miss"));
        assert!(texts.contains(&"no miss"));

        let yes = repaired
            .iter()
            .find(|r| r.text() == Some("yes miss"))
            .expect("yes miss repaired");
        assert_eq!(yes.intersection(), [0].into_iter().collect());
    }

    #[test]
    fn test_gap_after_multi_word_child_uses_word_offset() {
        // 0: "yes please miss", 1: "yes please sir", 2: "no thanks"
        let choices = PhraseChoices::new(
            Intent::Confirm,
            vec![vec!["yes please miss", "yes please sir"], vec!["no thanks"]],
        );
        let sliced = choices.sliced_phrases().expect("slices");

        // Heard "yes please ...", the title went missing
        let rule = Rule::new("Main", "yes please", 0..2, [], 0.6).with_children(vec![
            Rule::new("Answer", "yes please", 0..2, [0, 1], 0.6),
            Rule::null("Title", 2, [0, 1]),
        ]);
        assert!(rule.is_valid());

        let repaired = rule.repair(sliced);
        let texts: Vec<&str> = repaired.iter().filter_map(Rule::text).collect();
        assert_eq!(texts, vec!["yes please miss", "yes please sir"]);
        for candidate in &repaired {
            assert!(candidate.is_valid(), "{} should be valid", candidate);
            assert_eq!(candidate.word_span(), 0..3);
        }
    }

    #[test]
    fn test_nothing_to_repair() {
        let choices = choices();
        let sliced = choices.sliced_phrases().expect("slices");

        let complete = Rule::new("Main", "yes miss", 0..2, [0], 0.9).with_children(vec![
            Rule::new("Answer", "yes", 0..1, [0, 1], 0.9),
            Rule::new("Title", "miss", 1..2, [0, 2], 0.9),
        ]);
        assert!(complete.repair(sliced).is_empty());

        let all_gaps = Rule::new("Main", "", 0..0, [], 0.1).with_children(vec![
            Rule::null("Answer", 0, [0, 1]),
            Rule::null("Title", 0, [0, 2]),
        ]);
        assert!(all_gaps.repair(sliced).is_empty());
    }

    #[test]
    fn test_inconsistent_neighbours_block_repair() {
        let choices = choices();
        let sliced = choices.sliced_phrases().expect("slices");

        let rule = Rule::new("Main", "miss", 1..2, [1, 3], 0.6).with_children(vec![
            Rule::null("Answer", 1, [0, 1, 2, 3]),
            Rule::new("Title", "miss", 1..2, [0, 2], 0.6),
        ]);
        assert!(rule.repair(sliced).is_empty());
    }
}
