use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tracing::{debug, warn};

use super::Phase;
use crate::errors::AppError;
use crate::models::Statistics;

/// Cached statistics snapshot with its refresh flags.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DashboardState {
    pub stats: Option<Statistics>,
    pub busy: bool,
    pub last_error: Option<String>,
    /// Local time of the last successful refresh.
    pub last_refreshed_at: Option<DateTime<Utc>>,
}

impl DashboardState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> Phase {
        Phase::from_flags(self.busy, self.last_error.is_some())
    }

    /// Entering a fetch clears the previous error; going idle keeps it.
    pub fn set_busy(&mut self, busy: bool) {
        self.busy = busy;
        if busy {
            self.last_error = None;
        }
    }

    pub fn set_stats(&mut self, stats: Statistics) {
        self.stats = Some(stats);
        self.busy = false;
        self.last_error = None;
        self.last_refreshed_at = Some(Utc::now());
    }

    /// Last-known-good statistics stay visible next to the error.
    pub fn set_error(&mut self, error: impl Into<String>) {
        self.last_error = Some(error.into());
        self.busy = false;
    }

    pub fn clear_error(&mut self) {
        self.last_error = None;
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Identifies the refresh started by one [`DashboardStore::begin_refresh`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshTicket(u64);

/// Shared handle over a [`DashboardState`]; see
/// [`ConversationStore`](super::ConversationStore) for the publishing rules.
#[derive(Clone)]
pub struct DashboardStore {
    tx: Arc<watch::Sender<DashboardState>>,
    // Bumped by `begin_refresh` and `reset`; only touched under the watch lock.
    generation: Arc<AtomicU64>,
}

impl Default for DashboardStore {
    fn default() -> Self {
        Self::new()
    }
}

impl DashboardStore {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(DashboardState::new());
        Self {
            tx: Arc::new(tx),
            generation: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<DashboardState> {
        self.tx.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    pub fn snapshot(&self) -> DashboardState {
        self.tx.borrow().clone()
    }

    pub fn set_busy(&self, busy: bool) {
        self.tx.send_modify(|state| state.set_busy(busy));
    }

    pub fn set_stats(&self, stats: Statistics) {
        debug!(
            "Statistics refreshed: {} articles, {} projects, {} conversations",
            stats.article_count, stats.project_count, stats.conversation_count
        );
        self.tx.send_modify(|state| state.set_stats(stats));
    }

    pub fn set_error(&self, error: impl Into<String>) {
        let error = error.into();
        debug!("Statistics refresh failed: {error}");
        self.tx.send_modify(|state| state.set_error(error));
    }

    pub fn clear_error(&self) {
        self.tx.send_modify(DashboardState::clear_error);
    }

    /// Also invalidates any refresh still running.
    pub fn reset(&self) {
        self.tx.send_modify(|state| {
            self.generation.fetch_add(1, Ordering::Relaxed);
            state.reset();
        });
    }

    /// Marks a refresh as started unless one is already running.
    pub fn begin_refresh(&self) -> Result<RefreshTicket, AppError> {
        let mut ticket = None;
        self.tx.send_if_modified(|state| {
            if state.busy {
                return false;
            }
            state.set_busy(true);
            let generation = self.generation.fetch_add(1, Ordering::Relaxed) + 1;
            ticket = Some(RefreshTicket(generation));
            true
        });
        ticket.ok_or_else(|| {
            warn!("Statistics refresh already in progress");
            AppError::RequestInFlight
        })
    }

    /// Applies the result of the refresh behind `ticket`; returns `false` and
    /// changes nothing if a reset or a newer refresh came in between.
    pub fn complete_refresh(&self, ticket: RefreshTicket, stats: Statistics) -> bool {
        self.finish(ticket, |state| state.set_stats(stats))
    }

    pub fn fail_refresh(&self, ticket: RefreshTicket, error: impl Into<String>) -> bool {
        let error = error.into();
        self.finish(ticket, |state| state.set_error(error))
    }

    fn finish(&self, ticket: RefreshTicket, apply: impl FnOnce(&mut DashboardState)) -> bool {
        let applied = self.tx.send_if_modified(|state| {
            if self.generation.load(Ordering::Relaxed) != ticket.0 {
                return false;
            }
            apply(state);
            true
        });
        if applied {
            debug!("Refresh {} finished", ticket.0);
        } else {
            warn!("Dropping outcome of superseded refresh {}", ticket.0);
        }
        applied
    }
}
