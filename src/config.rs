use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::ResolverError;

/// Tunable resolver policy
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    // Audio signal problems
    pub audio_problem_limit: u32,
    pub audio_problem_penalty: f32,

    // Confidence weighting
    pub awareness_bonus: f32,
    pub full_weight_words: usize,
    pub word_weight_decay: f32,

    // Observers
    pub notification_capacity: usize,

    // Meta
    pub log_level: String,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            audio_problem_limit: 3,
            audio_problem_penalty: 0.005,
            awareness_bonus: 0.6666,
            full_weight_words: 3,
            word_weight_decay: 0.025,
            notification_capacity: 64,
            log_level: "INFO".to_string(),
        }
    }
}

impl ResolverConfig {
    /// Load config from the default location, or fall back to defaults
    pub fn load() -> Result<Self> {
        Self::load_from(&config_path())
    }

    /// Load config from `path`; a missing file yields defaults
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let parsed = serde_json::from_str::<Self>(&content)
            .map_err(ResolverError::from)
            .and_then(|config| config.validate().map(|_| config));

        match parsed {
            Ok(config) => Ok(config),
            Err(e) => {
                // Graceful degradation: log warning and use defaults
                tracing::warn!("⚠️ Resolver config invalid, using defaults: {}", e);
                let backup_path = path.with_extension("json.corrupt");
                let _ = std::fs::rename(path, &backup_path);
                Ok(Self::default())
            }
        }
    }

    /// Save config to the default location
    pub fn save(&self) -> Result<()> {
        self.save_to(&config_path())
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Reject values the resolver can't work with
    pub fn validate(&self) -> Result<(), ResolverError> {
        if !(self.awareness_bonus > 0.0 && self.awareness_bonus <= 1.0) {
            return Err(ResolverError::Config(format!(
                "awareness_bonus must be in (0, 1], got {}",
                self.awareness_bonus
            )));
        }
        if self.audio_problem_penalty < 0.0 {
            return Err(ResolverError::Config(format!(
                "audio_problem_penalty must not be negative, got {}",
                self.audio_problem_penalty
            )));
        }
        if self.word_weight_decay < 0.0 {
            return Err(ResolverError::Config(format!(
                "word_weight_decay must not be negative, got {}",
                self.word_weight_decay
            )));
        }
        if self.audio_problem_limit == 0 {
            return Err(ResolverError::Config(
                "audio_problem_limit must be at least 1".to_string(),
            ));
        }
        if self.notification_capacity == 0 {
            return Err(ResolverError::Config(
                "notification_capacity must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

pub fn config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("tuxtalks-resolver")
        .join("config.json")
}
