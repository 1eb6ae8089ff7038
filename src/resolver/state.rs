//! Attempt state behind a single swappable reference

use crate::audio_signal::AudioSignalProblems;
use crate::error::ResolverResult;
use crate::hypothesis::Hypothesis;
use crate::prompt::Prompt;
use std::sync::{Arc, Mutex};

/// Everything one recognition attempt knows, as one immutable snapshot
#[derive(Debug, Clone)]
pub(crate) struct AttemptState {
    pub prompt: Option<Arc<dyn Prompt>>,
    pub hypothesis: Option<Hypothesis>,
    pub audio_problems: AudioSignalProblems,
    pub awareness_bonus: f32,
}

impl AttemptState {
    pub fn new(audio_problems: AudioSignalProblems) -> Self {
        Self {
            prompt: None,
            hypothesis: None,
            audio_problems,
            awareness_bonus: 1.0,
        }
    }

    /// Fresh attempt for `prompt`
    pub fn showing(&self, prompt: Arc<dyn Prompt>) -> Self {
        Self {
            prompt: Some(prompt),
            ..self.cleared()
        }
    }

    /// Same prompt, no hypothesis, no audio problems
    pub fn cleared(&self) -> Self {
        let mut audio_problems = self.audio_problems.clone();
        audio_problems.clear();
        Self {
            prompt: self.prompt.clone(),
            hypothesis: None,
            audio_problems,
            awareness_bonus: self.awareness_bonus,
        }
    }

    /// No attempt in progress
    pub fn idle(&self) -> Self {
        Self {
            prompt: None,
            ..self.cleared()
        }
    }

    pub fn with_hypothesis(&self, hypothesis: Option<Hypothesis>) -> Self {
        Self {
            hypothesis,
            ..self.clone()
        }
    }

    pub fn is_showing(&self, prompt: &Arc<dyn Prompt>) -> bool {
        self.prompt
            .as_ref()
            .is_some_and(|active| Arc::ptr_eq(active, prompt))
    }
}

/// Holds the current snapshot; transitions replace it by compare-and-swap.
///
/// The lock only guards the pointer exchange, never a transition itself.
pub(crate) struct AttemptCell {
    current: Mutex<Arc<AttemptState>>,
}

impl AttemptCell {
    pub fn new(state: AttemptState) -> Self {
        Self {
            current: Mutex::new(Arc::new(state)),
        }
    }

    pub fn load(&self) -> ResolverResult<Arc<AttemptState>> {
        Ok(self.current.lock()?.clone())
    }

    fn compare_and_swap(
        &self,
        expected: &Arc<AttemptState>,
        next: Arc<AttemptState>,
    ) -> ResolverResult<bool> {
        let mut current = self.current.lock()?;
        if !Arc::ptr_eq(&current, expected) {
            return Ok(false);
        }
        *current = next;
        Ok(true)
    }

    /// Run `transition` against the current snapshot until its result can be
    /// installed without an intervening change.
    ///
    /// `transition` returns the next state, or `None` to leave the state
    /// alone, plus an output. An error leaves the state untouched.
    pub fn update<T, F>(&self, mut transition: F) -> ResolverResult<T>
    where
        F: FnMut(&AttemptState) -> ResolverResult<(Option<AttemptState>, T)>,
    {
        loop {
            let snapshot = self.load()?;
            let (next, output) = transition(&snapshot)?;
            match next {
                None => return Ok(output),
                Some(next) => {
                    if self.compare_and_swap(&snapshot, Arc::new(next))? {
                        return Ok(output);
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio_signal::AudioSignalProblem;
    use std::thread;

    #[test]
    fn test_cleared_keeps_awareness() {
        let mut state = AttemptState::new(AudioSignalProblems::default());
        state.awareness_bonus = 0.5;
        state.audio_problems.record(AudioSignalProblem::Noise);

        let cleared = state.cleared();
        assert_eq!(cleared.awareness_bonus, 0.5);
        assert_eq!(cleared.audio_problems.total(), 0);
        assert!(cleared.prompt.is_none());
    }

    #[test]
    fn test_update_without_change_keeps_snapshot() {
        let cell = AttemptCell::new(AttemptState::new(AudioSignalProblems::default()));
        let before = cell.load().expect("load");
        let output = cell.update(|_| Ok((None, 7))).expect("update");
        assert_eq!(output, 7);
        assert!(Arc::ptr_eq(&before, &cell.load().expect("load")));
    }

    #[test]
    fn test_failed_transition_leaves_state() {
        let cell = AttemptCell::new(AttemptState::new(AudioSignalProblems::default()));
        let result: ResolverResult<()> = cell.update(|_| {
            Err(crate::error::ResolverError::Engine("boom".to_string()))
        });
        assert!(result.is_err());
        assert_eq!(cell.load().expect("load").awareness_bonus, 1.0);
    }

    #[test]
    fn test_concurrent_updates_are_not_lost() {
        let cell = Arc::new(AttemptCell::new(AttemptState::new(AudioSignalProblems::new(
            u32::MAX, 0.0,
        ))));

        let workers: Vec<_> = (0..8)
            .map(|_| {
                let cell = cell.clone();
                thread::spawn(move || {
                    for _ in 0..250 {
                        cell.update(|state| {
                            let mut next = state.clone();
                            next.audio_problems.record(AudioSignalProblem::Noise);
                            Ok((Some(next), ()))
                        })
                        .expect("update");
                    }
                })
            })
            .collect();
        for worker in workers {
            worker.join().expect("worker panicked");
        }

        assert_eq!(cell.load().expect("load").audio_problems.total(), 2000);
    }
}
