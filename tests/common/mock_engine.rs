//! Mock Recognition Engine for Testing
//!
//! Counts lifecycle calls so tests can verify what the resolver asked for.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::mpsc::{Receiver, Sender};
use std::sync::Mutex;
use tuxtalks_resolver::{EngineProvider, ResolverError, ResolverResult};

#[derive(Debug, Default)]
pub struct MockEngine {
    starts: AtomicUsize,
    stops: AtomicUsize,
    restarts: AtomicUsize,
    /// Make `start` fail, as a missing microphone would
    fail_start: AtomicBool,
}

impl MockEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Engine whose `start` always fails
    pub fn failing() -> Self {
        let engine = Self::default();
        engine.fail_start.store(true, Ordering::SeqCst);
        engine
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

impl EngineProvider for MockEngine {
    fn start(&self) -> ResolverResult<()> {
        self.starts.fetch_add(1, Ordering::SeqCst);
        if self.fail_start.load(Ordering::SeqCst) {
            return Err(ResolverError::Engine("no audio input device".to_string()));
        }
        Ok(())
    }

    fn stop(&self) -> ResolverResult<()> {
        self.stops.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn restart(&self) -> ResolverResult<()> {
        self.restarts.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Engine whose first `start` blocks until released and then fails.
///
/// Lets a test run control-thread calls while a `show` is still starting.
pub struct GatedEngine {
    entered: Mutex<Option<Sender<()>>>,
    release: Mutex<Option<Receiver<()>>>,
}

impl GatedEngine {
    /// `entered` fires once the first start is blocked; sending on the
    /// sender paired with `release` lets it fail.
    pub fn new(entered: Sender<()>, release: Receiver<()>) -> Self {
        Self {
            entered: Mutex::new(Some(entered)),
            release: Mutex::new(Some(release)),
        }
    }
}

impl EngineProvider for GatedEngine {
    fn start(&self) -> ResolverResult<()> {
        let entered = self.entered.lock()?.take();
        let Some(entered) = entered else {
            return Ok(());
        };
        let release = self.release.lock()?.take();

        let _ = entered.send(());
        if let Some(release) = release {
            let _ = release.recv();
        }
        Err(ResolverError::Engine("audio device vanished".to_string()))
    }

    fn stop(&self) -> ResolverResult<()> {
        Ok(())
    }

    fn restart(&self) -> ResolverResult<()> {
        Ok(())
    }
}
