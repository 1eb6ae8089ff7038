//! Decision audit log
//!
//! Appends accept/reject decisions to `<config_dir>/tuxtalks/resolver-audit.log`.
//! Blocking file IO, so it belongs to observers, never to the resolver itself.

use crate::resolver::Notification;
use anyhow::Result;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Default audit log location (respecting XDG)
pub fn log_path() -> PathBuf {
    let config_dir = dirs::config_dir().unwrap_or_else(|| PathBuf::from(".config"));
    config_dir.join("tuxtalks").join("resolver-audit.log")
}

/// Write an entry to the audit log at `path`
pub fn log_to(path: &Path, entry: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let mut file = OpenOptions::new().create(true).append(true).open(path)?;

    writeln!(
        file,
        "[{}] {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
        entry
    )?;
    Ok(())
}

/// Record a decision notification; other notifications are skipped.
///
/// Returns whether an entry was written.
pub fn log_decision(path: &Path, notification: &Notification) -> Result<bool> {
    let entry = match notification {
        Notification::Accepted { result } => format!(
            "ACCEPTED: {:?} | p={:.3} ({}) | \"{}\"",
            result.selection,
            result.probability,
            result.confidence,
            result.text.as_deref().unwrap_or("")
        ),
        Notification::Rejected { reason, rule } => match rule {
            Some(rule) => format!("REJECTED: {} | {}", reason, rule),
            None => format!("REJECTED: {}", reason),
        },
        Notification::Faulted { message } => format!("FAULTED: {}", message),
        _ => return Ok(false),
    };

    log_to(path, &entry)?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::confidence::Confidence;
    use crate::prompt::{PromptResult, Selection};
    use crate::resolver::RejectReason;

    #[test]
    fn test_decisions_are_appended() {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let path = dir.path().join("audit/resolver-audit.log");

        let accepted = Notification::Accepted {
            result: PromptResult {
                selection: Selection::Single(1),
                probability: 0.9,
                confidence: Confidence::High,
                text: Some("no".to_string()),
            },
        };
        let rejected = Notification::Rejected {
            reason: RejectReason::AudioSignalPenalty,
            rule: None,
        };

        assert!(log_decision(&path, &accepted).expect("write"));
        assert!(log_decision(&path, &rejected).expect("write"));
        assert!(!log_decision(&path, &Notification::Started).expect("skip"));

        let content = std::fs::read_to_string(&path).expect("Failed to read log");
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("ACCEPTED: Single(1)"));
        assert!(lines[1].contains("REJECTED: audio signal problem penalty"));
    }
}
