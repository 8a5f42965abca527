//! Progress reporting and cooperative cancellation
//!
//! A long-running phase calls [`ProgressReporter::advance`] once per finished
//! unit of work. That call is the only place a cancellation request is
//! observed; work that is already in flight always runs to the end.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Outcome of advancing a progress reporter by one step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Continue,
    Cancelled,
}

/// Receives progress of a batch phase and relays cancellation requests
pub trait ProgressReporter {
    /// Begin a phase of `total` steps
    fn start(&mut self, message: &str, total: usize);

    /// Record one finished step
    fn advance(&mut self) -> Step;

    /// End the current phase
    fn stop(&mut self);

    /// Whether the user has asked to abort
    fn is_cancelled(&self) -> bool;
}

/// Shared flag used to request cancellation from another thread
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Clear a previous request so the token can be reused for the next run
    pub fn reset(&self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Reports progress through `tracing`
#[derive(Debug, Default)]
pub struct LogProgress {
    token: CancellationToken,
    message: String,
    total: usize,
    current: usize,
}

impl LogProgress {
    pub fn new(token: CancellationToken) -> Self {
        Self {
            token,
            ..Self::default()
        }
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// Steps finished in the current phase
    pub fn current(&self) -> usize {
        self.current
    }
}

impl ProgressReporter for LogProgress {
    fn start(&mut self, message: &str, total: usize) {
        self.message = message.to_string();
        self.total = total;
        self.current = 0;
        tracing::info!("{}", message);
    }

    fn advance(&mut self) -> Step {
        self.current += 1;
        tracing::debug!("{} [{}/{}]", self.message, self.current, self.total);
        if self.token.is_cancelled() {
            Step::Cancelled
        } else {
            Step::Continue
        }
    }

    fn stop(&mut self) {
        tracing::debug!("{} finished ({}/{})", self.message, self.current, self.total);
        self.total = 0;
    }

    fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_is_shared() {
        let token = CancellationToken::new();
        let clone = token.clone();
        assert!(!token.is_cancelled());
        clone.cancel();
        assert!(token.is_cancelled());
        token.reset();
        assert!(!clone.is_cancelled());
    }

    #[test]
    fn test_log_progress_steps() {
        let token = CancellationToken::new();
        let mut progress = LogProgress::new(token.clone());

        progress.start("Meshing 3 objects...", 3);
        assert_eq!(progress.advance(), Step::Continue);
        token.cancel();
        assert!(progress.is_cancelled());
        assert_eq!(progress.advance(), Step::Cancelled);
        assert_eq!(progress.current(), 2);
        progress.stop();

        progress.start("Exporting 1 objects...", 1);
        assert_eq!(progress.current(), 0);
    }

    #[test]
    fn test_token_crosses_threads() {
        let token = CancellationToken::new();
        let remote = token.clone();
        std::thread::spawn(move || remote.cancel()).join().unwrap();
        assert!(token.is_cancelled());
    }
}
