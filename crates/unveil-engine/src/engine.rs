//! Timer-driven reveal of a source document.
//!
//! The engine owns a `(state, revealed length)` pair over a fixed source
//! string and advances the revealed prefix on a tick cadence. Subscribers
//! receive a [`RevealUpdate`] on every tick and every transition (the same
//! push-based inbox shape the rest of the crate consumes).
//!
//! All state lives behind one mutex; public operations are synchronous but
//! spawn the ticker onto the ambient tokio runtime, so they must be called
//! from within one. Cancellation is deterministic: a cancelling call
//! cancels the ticker's token and bumps the epoch under the lock, so a
//! stale ticker that wakes afterwards observes the change and exits
//! without touching state.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use crate::config::{EngineOptions, RevealSpeed};
use crate::events::{RevealState, RevealUpdate};

/// Bounds of the pseudo-random chunk revealed by a single tick, in chars.
/// The jitter emulates a typing cadence instead of a uniform crawl.
const MIN_CHUNK: usize = 1;
const MAX_CHUNK: usize = 3;

/// Streaming reveal engine over a single in-memory document.
pub struct RevealEngine {
    inner: Arc<Mutex<Inner>>,
}

struct Inner {
    source: String,
    /// Byte offset of every char boundary in `source`, including the end;
    /// `boundaries[n]` is where a prefix of `n` chars stops.
    boundaries: Vec<usize>,
    /// Revealed length in chars. Non-decreasing while streaming.
    revealed: usize,
    state: RevealState,
    speed: RevealSpeed,
    /// Bumped on every (re)start and resume; a ticker spawned for an older
    /// epoch bails out on its next wakeup.
    epoch: u64,
    cancel: CancellationToken,
    subscribers: Vec<mpsc::UnboundedSender<RevealUpdate>>,
    rng: StdRng,
}

impl Inner {
    /// Total document length in chars.
    fn total(&self) -> usize {
        self.boundaries.len() - 1
    }

    fn prefix(&self) -> &str {
        &self.source[..self.boundaries[self.revealed]]
    }

    fn set_source(&mut self, source: String) {
        self.boundaries = char_boundaries(&source);
        self.source = source;
    }

    /// Pushes the current `(prefix, state)` to all live subscribers.
    fn emit(&mut self) {
        let update = RevealUpdate {
            prefix: self.prefix().to_string(),
            state: self.state,
        };
        self.subscribers.retain(|tx| tx.send(update.clone()).is_ok());
    }

    /// Cancels the current ticker and installs a fresh token and epoch.
    fn new_run(&mut self) -> (CancellationToken, u64) {
        self.cancel.cancel();
        self.cancel = CancellationToken::new();
        self.epoch += 1;
        (self.cancel.clone(), self.epoch)
    }
}

fn char_boundaries(source: &str) -> Vec<usize> {
    let mut boundaries: Vec<usize> = source.char_indices().map(|(offset, _)| offset).collect();
    boundaries.push(source.len());
    boundaries
}

impl RevealEngine {
    /// Creates an engine over `source`, initially `Idle` with nothing
    /// revealed.
    pub fn new(source: impl Into<String>, options: EngineOptions) -> Self {
        let source = source.into();
        let rng = match options.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            inner: Arc::new(Mutex::new(Inner {
                boundaries: char_boundaries(&source),
                source,
                revealed: 0,
                state: RevealState::Idle,
                speed: options.speed,
                epoch: 0,
                cancel: CancellationToken::new(),
                subscribers: Vec::new(),
                rng,
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Subscribes to `(prefix, state)` updates. Every tick and every
    /// transition pushes one update to each subscriber.
    pub fn subscribe(&self) -> mpsc::UnboundedReceiver<RevealUpdate> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.lock().subscribers.push(tx);
        rx
    }

    /// Starts streaming from the beginning. Valid from any state; always
    /// restarts at zero and invalidates any ticker from a prior run.
    pub fn start(&self) {
        let mut inner = self.lock();
        let (cancel, epoch) = inner.new_run();
        inner.revealed = 0;
        inner.state = RevealState::Streaming;
        debug!(chars = inner.total(), "reveal started");
        inner.emit();
        drop(inner);
        self.spawn_ticker(cancel, epoch);
    }

    /// Freezes the reveal at its current length. No-op unless `Streaming`.
    pub fn pause(&self) {
        let mut inner = self.lock();
        if inner.state != RevealState::Streaming {
            return;
        }
        inner.cancel.cancel();
        inner.state = RevealState::Paused;
        debug!(revealed = inner.revealed, "reveal paused");
        inner.emit();
    }

    /// Continues streaming from the current length. No-op unless `Paused`.
    pub fn resume(&self) {
        let mut inner = self.lock();
        if inner.state != RevealState::Paused {
            return;
        }
        let (cancel, epoch) = inner.new_run();
        inner.state = RevealState::Streaming;
        debug!(revealed = inner.revealed, "reveal resumed");
        inner.emit();
        drop(inner);
        self.spawn_ticker(cancel, epoch);
    }

    /// Cancels any run and returns to `Idle` with nothing revealed.
    pub fn reset(&self) {
        let mut inner = self.lock();
        inner.cancel.cancel();
        inner.revealed = 0;
        inner.state = RevealState::Idle;
        debug!("reveal reset");
        inner.emit();
    }

    /// Hard skip to the end: reveals everything and transitions to
    /// `Complete`. Callable from any state; a second call while already
    /// `Complete` is a no-op.
    pub fn complete(&self) {
        let mut inner = self.lock();
        if inner.state == RevealState::Complete && inner.revealed == inner.total() {
            return;
        }
        inner.cancel.cancel();
        inner.revealed = inner.total();
        inner.state = RevealState::Complete;
        debug!("reveal completed");
        inner.emit();
    }

    /// Replaces the source document. The document's identity is its
    /// content, so this forces an implicit `reset()`.
    pub fn set_source(&self, source: impl Into<String>) {
        let mut inner = self.lock();
        inner.cancel.cancel();
        inner.set_source(source.into());
        inner.revealed = 0;
        inner.state = RevealState::Idle;
        debug!(chars = inner.total(), "source replaced");
        inner.emit();
    }

    /// Changes the tick cadence; takes effect on the next scheduled tick.
    pub fn set_speed(&self, speed: RevealSpeed) {
        self.lock().speed = speed;
    }

    pub fn state(&self) -> RevealState {
        self.lock().state
    }

    /// Revealed length in chars.
    pub fn revealed_len(&self) -> usize {
        self.lock().revealed
    }

    /// Source length in chars.
    pub fn source_len(&self) -> usize {
        self.lock().total()
    }

    pub fn revealed_prefix(&self) -> String {
        self.lock().prefix().to_string()
    }

    /// Percentage of the document revealed, in `[0, 100]`; `0` for the
    /// empty document.
    pub fn progress(&self) -> f64 {
        let inner = self.lock();
        let total = inner.total();
        if total == 0 {
            return 0.0;
        }
        inner.revealed as f64 / total as f64 * 100.0
    }

    fn spawn_ticker(&self, cancel: CancellationToken, epoch: u64) {
        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move {
            loop {
                let cadence = {
                    let guard = inner.lock().unwrap_or_else(PoisonError::into_inner);
                    guard.speed.tick_interval()
                };
                tokio::select! {
                    () = cancel.cancelled() => return,
                    () = tokio::time::sleep(cadence) => {}
                }

                let mut guard = inner.lock().unwrap_or_else(PoisonError::into_inner);
                // A cancelling call may have won the race between our sleep
                // and this lock; the epoch and state checks make that tick
                // a no-op.
                if guard.epoch != epoch || guard.state != RevealState::Streaming {
                    return;
                }
                let chunk = guard.rng.gen_range(MIN_CHUNK..=MAX_CHUNK);
                guard.revealed = (guard.revealed + chunk).min(guard.total());
                trace!(revealed = guard.revealed, chunk, "reveal tick");
                if guard.revealed == guard.total() {
                    guard.state = RevealState::Complete;
                    guard.cancel.cancel();
                    debug!("reveal reached end of document");
                    guard.emit();
                    return;
                }
                guard.emit();
            }
        });
    }
}

impl Drop for RevealEngine {
    fn drop(&mut self) {
        self.lock().cancel.cancel();
    }
}
