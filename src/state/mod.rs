//! In-memory state containers driven by gateway results.
//!
//! Each container is a plain state type holding the transition rules plus a
//! cloneable store handle that applies one transition per call and publishes the
//! new state to subscribers.

pub mod conversation;
pub mod dashboard;

pub use conversation::{ConversationState, ConversationStore, Exchange};
pub use dashboard::{DashboardState, DashboardStore, RefreshTicket};

/// Presentational phase shared by both containers. `Idle` and `Errored` are
/// both "not busy"; they differ only in whether an error is on display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Busy,
    Errored,
}

impl Phase {
    pub(crate) fn from_flags(busy: bool, has_error: bool) -> Self {
        match (busy, has_error) {
            (true, _) => Phase::Busy,
            (false, true) => Phase::Errored,
            (false, false) => Phase::Idle,
        }
    }
}
