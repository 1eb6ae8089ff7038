//! Audio Signal Problems
//!
//! Counts acoustic problems reported by the engine during one recognition
//! attempt. Too many of them gate hypothesis evaluation; every occurrence
//! costs a little probability on the final result.

use crate::config::ResolverConfig;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Problem category reported by the recognition engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AudioSignalProblem {
    None,
    Noise,
    NoSignal,
    TooLoud,
    TooQuiet,
    TooFast,
    TooSlow,
}

impl AudioSignalProblem {
    const COUNT: usize = 7;

    fn slot(self) -> usize {
        match self {
            AudioSignalProblem::None => 0,
            AudioSignalProblem::Noise => 1,
            AudioSignalProblem::NoSignal => 2,
            AudioSignalProblem::TooLoud => 3,
            AudioSignalProblem::TooQuiet => 4,
            AudioSignalProblem::TooFast => 5,
            AudioSignalProblem::TooSlow => 6,
        }
    }
}

impl fmt::Display for AudioSignalProblem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AudioSignalProblem::None => "none",
            AudioSignalProblem::Noise => "noise",
            AudioSignalProblem::NoSignal => "no signal",
            AudioSignalProblem::TooLoud => "too loud",
            AudioSignalProblem::TooQuiet => "too quiet",
            AudioSignalProblem::TooFast => "too fast",
            AudioSignalProblem::TooSlow => "too slow",
        };
        f.write_str(name)
    }
}

/// Per-attempt problem counters.
///
/// `AudioSignalProblem::None` is accepted by `record` but never counts as a
/// problem.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioSignalProblems {
    counts: [u32; AudioSignalProblem::COUNT],
    limit: u32,
    weight: f32,
}

impl Default for AudioSignalProblems {
    fn default() -> Self {
        Self::new(3, 0.005)
    }
}

impl AudioSignalProblems {
    /// `limit` occurrences of one category exceed the gate, each occurrence
    /// costs `weight` probability
    pub fn new(limit: u32, weight: f32) -> Self {
        Self {
            counts: [0; AudioSignalProblem::COUNT],
            limit,
            weight,
        }
    }

    pub fn from_config(config: &ResolverConfig) -> Self {
        Self::new(config.audio_problem_limit, config.audio_problem_penalty)
    }

    pub fn record(&mut self, problem: AudioSignalProblem) {
        self.counts[problem.slot()] = self.counts[problem.slot()].saturating_add(1);
    }

    pub fn clear(&mut self) {
        self.counts = [0; AudioSignalProblem::COUNT];
    }

    pub fn count(&self, problem: AudioSignalProblem) -> u32 {
        if problem == AudioSignalProblem::None {
            return 0;
        }
        self.counts[problem.slot()]
    }

    /// Total number of recorded problems
    pub fn total(&self) -> u32 {
        self.counts
            .iter()
            .skip(AudioSignalProblem::None.slot() + 1)
            .sum()
    }

    /// True once any single category reached the configured limit
    pub fn exceeded_limits(&self) -> bool {
        self.counts
            .iter()
            .skip(AudioSignalProblem::None.slot() + 1)
            .any(|&count| count >= self.limit)
    }

    /// Probability deduction for the recorded problems
    pub fn penalty(&self) -> f32 {
        self.total() as f32 * self.weight
    }
}
