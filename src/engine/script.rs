//! Recorded recognition sessions
//!
//! A script holds a prompt's choices and the engine events of one session,
//! so the resolver can be replayed without a live recognizer.

use super::{EngineProvider, RecognitionEvent};
use crate::choices::PhraseChoices;
use crate::confidence::Intent;
use crate::error::ResolverResult;
use crate::prompt::AcceptedResult;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::info;

fn default_accepted() -> AcceptedResult {
    AcceptedResult::Distinct
}

/// Prompt and events of one recorded session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecognitionScript {
    pub intent: Intent,
    #[serde(default = "default_accepted")]
    pub accepted: AcceptedResult,
    /// Phrasings per choice
    pub choices: Vec<Vec<String>>,
    /// Whether the user is known to be paying attention
    #[serde(default)]
    pub aware: bool,
    pub events: Vec<RecognitionEvent>,
}

impl RecognitionScript {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read script {}", path.display()))?;
        let script: Self = serde_json::from_str(&content)
            .with_context(|| format!("Invalid recognition script {}", path.display()))?;

        if script.choices.is_empty() {
            anyhow::bail!("Recognition script {} offers no choices", path.display());
        }
        Ok(script)
    }

    pub fn prepared_choices(&self) -> PhraseChoices {
        PhraseChoices::new(self.intent, self.choices.clone())
    }
}

/// Engine stand-in for replays; events come from the script, not from audio
#[derive(Debug, Default)]
pub struct ScriptedEngine {
    starts: AtomicUsize,
    stops: AtomicUsize,
    restarts: AtomicUsize,
}

impl ScriptedEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn starts(&self) -> usize {
        self.starts.load(Ordering::SeqCst)
    }

    pub fn stops(&self) -> usize {
        self.stops.load(Ordering::SeqCst)
    }

    pub fn restarts(&self) -> usize {
        self.restarts.load(Ordering::SeqCst)
    }
}

impl EngineProvider for ScriptedEngine {
    fn start(&self) -> ResolverResult<()> {
        self.starts.fetch_add(1, Ordering::SeqCst);
        info!("🎙️ Replay engine started");
        Ok(())
    }

    fn stop(&self) -> ResolverResult<()> {
        self.stops.fetch_add(1, Ordering::SeqCst);
        info!("🔇 Replay engine stopped");
        Ok(())
    }

    fn restart(&self) -> ResolverResult<()> {
        self.restarts.fetch_add(1, Ordering::SeqCst);
        info!("🔁 Replay engine restart requested");
        Ok(())
    }
}
