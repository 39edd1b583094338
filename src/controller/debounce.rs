//! Debounced search coupling.
//!
//! Search edits are held back until the input has been quiet for the
//! configured delay. Only the last value of a burst is ever committed.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;

/// Deadline-based debouncer for a single text input.
///
/// Pure state: the owner feeds it edits with the current time and polls it
/// when the deadline passes. The screen event loop uses this form so the
/// timer lives in the same `select!` as everything else.
#[derive(Debug, Clone)]
pub struct Debouncer {
    delay: Duration,
    pending: Option<(String, Instant)>,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: None,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Record an edit; restarts the quiet window
    pub fn edit(&mut self, term: impl Into<String>, now: Instant) {
        self.pending = Some((term.into(), now + self.delay));
    }

    /// When the pending value becomes committable
    pub fn deadline(&self) -> Option<Instant> {
        self.pending.as_ref().map(|(_, deadline)| *deadline)
    }

    pub fn pending(&self) -> Option<&str> {
        self.pending.as_ref().map(|(term, _)| term.as_str())
    }

    /// Take the pending value if its quiet window has elapsed
    pub fn poll(&mut self, now: Instant) -> Option<String> {
        match &self.pending {
            Some((_, deadline)) if *deadline <= now => self.pending.take().map(|(term, _)| term),
            _ => None,
        }
    }

    /// Drop any pending value without committing it
    pub fn cancel(&mut self) {
        self.pending = None;
    }
}

/// Spawn a task that turns a stream of edits into a stream of committed
/// search terms.
///
/// The task ends when the edit sender is dropped; a value still pending at
/// that point is committed first. It also ends if the receiver of committed
/// terms goes away.
pub fn spawn_debounced(
    delay: Duration,
    mut edits: mpsc::Receiver<String>,
    committed: mpsc::Sender<String>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            // Wait for the first edit of a burst
            let Some(mut latest) = edits.recv().await else {
                break;
            };

            // Keep taking edits until the input goes quiet
            loop {
                match tokio::time::timeout(delay, edits.recv()).await {
                    Ok(Some(term)) => latest = term,
                    Ok(None) => {
                        let _ = committed.send(latest).await;
                        return;
                    }
                    Err(_) => break,
                }
            }

            tracing::debug!(search = %latest, "search committed");
            if committed.send(latest).await.is_err() {
                break;
            }
        }
    })
}
