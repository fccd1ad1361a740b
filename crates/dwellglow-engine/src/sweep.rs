//! Periodic presence sweeping.
//!
//! Occupancy is a snapshot derived from "which non-expired sessions point
//! at this receiver right now", not an incrementally maintained counter:
//! sessions can lapse silently between events, so only a periodic sweep
//! can notice them. The sweep also refreshes the global popularity range
//! the animation controller reads.

use std::time::Duration;

use chrono::Utc;
use dwellglow_core::GlowRange;

use crate::aggregate::PresenceState;

/// What one sweep did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SweepSummary {
    /// Sessions removed for idling past the timeout.
    pub expired: usize,
    /// Total occupants counted across all receivers.
    pub occupied: u32,
    /// Global range after the refresh.
    pub range: GlowRange,
}

/// Periodic task that runs [`PresenceState::sweep`] on a fixed interval.
pub struct PresenceSweeper {
    state: PresenceState,
    interval_ms: u64,
    session_timeout_ms: u64,
}

impl PresenceSweeper {
    /// Create a sweeper for the given state and periods.
    pub fn new(state: PresenceState, interval_ms: u64, session_timeout_ms: u64) -> Self {
        Self {
            state,
            interval_ms,
            session_timeout_ms,
        }
    }

    /// Run the sweep loop until the task is aborted.
    pub async fn run(self) {
        let mut interval = tokio::time::interval(Duration::from_millis(self.interval_ms));
        // Relative cadence: a delayed tick shifts the schedule instead of
        // bursting to catch up.
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            interval.tick().await;

            let now_ms = Utc::now().timestamp_millis();
            let summary = self.state.sweep(now_ms, self.session_timeout_ms);

            tracing::debug!(
                expired = summary.expired,
                occupied = summary.occupied,
                min_total_ms = summary.range.min_total_ms,
                max_total_ms = summary.range.max_total_ms,
                "presence sweep"
            );
        }
    }
}
