//! Receiver aggregation and the shared presence state.
//!
//! [`ReceiverAggregator`] keeps the cumulative dwell total and occupancy
//! count per configured receiver plus the global popularity range.
//! [`PresenceState`] wraps the aggregator and the session store behind a
//! cloneable handle; every task holds a clone and all mutation funnels
//! through the named operations here.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use dwellglow_core::{GlowRange, GlowSample, ProximityEvent, ReceiverId};

use crate::session::{DwellAttribution, SessionStore};
use crate::sweep::SweepSummary;

/// Aggregated state of one receiver.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReceiverState {
    /// Running sum of attributed dwell increments, in milliseconds.
    /// Only ever increases during the process lifetime.
    pub total_dwell_ms: u64,
    /// Occupancy count; fully replaced by each sweep, never incremented
    /// outside one.
    pub presences: u32,
}

/// Cumulative dwell totals and occupancy per receiver, plus the global range.
#[derive(Debug)]
pub struct ReceiverAggregator {
    receivers: HashMap<ReceiverId, ReceiverState>,
    range: GlowRange,
}

impl ReceiverAggregator {
    /// Create an aggregator with one zeroed entry per configured receiver.
    ///
    /// The receiver set is fixed for the process lifetime; entries are
    /// never added or removed afterwards.
    pub fn new(receivers: impl IntoIterator<Item = ReceiverId>) -> Self {
        Self {
            receivers: receivers
                .into_iter()
                .map(|id| (id, ReceiverState::default()))
                .collect(),
            range: GlowRange::RESET,
        }
    }

    /// Returns `true` if the receiver is configured.
    pub fn contains(&self, receiver_id: &ReceiverId) -> bool {
        self.receivers.contains_key(receiver_id)
    }

    /// Add a dwell increment to a receiver's total.
    ///
    /// Returns `false` if the receiver is not configured.
    pub fn accumulate(&mut self, receiver_id: &ReceiverId, increment_ms: u64) -> bool {
        match self.receivers.get_mut(receiver_id) {
            Some(state) => {
                state.total_dwell_ms += increment_ms;
                true
            }
            None => false,
        }
    }

    /// Zero every occupancy count and reset the range sentinels.
    ///
    /// First step of a sweep.
    pub fn begin_sweep(&mut self) {
        for state in self.receivers.values_mut() {
            state.presences = 0;
        }
        self.range = GlowRange::RESET;
    }

    /// Fold every receiver's total into the global range.
    ///
    /// The range then reflects the totals as of this moment; accumulation
    /// that happens later is picked up by the next sweep.
    pub fn refresh_range(&mut self) {
        for state in self.receivers.values() {
            self.range.observe(state.total_dwell_ms);
        }
    }

    /// Count one occupant on a receiver.
    ///
    /// Returns `false` if the receiver is not configured.
    pub fn count_presence(&mut self, receiver_id: &ReceiverId) -> bool {
        match self.receivers.get_mut(receiver_id) {
            Some(state) => {
                state.presences += 1;
                true
            }
            None => false,
        }
    }

    /// Snapshot one receiver's popularity for the animation controller.
    pub fn sample(&self, receiver_id: &ReceiverId) -> Option<GlowSample> {
        self.receivers.get(receiver_id).map(|state| GlowSample {
            total_dwell_ms: state.total_dwell_ms,
            presences: state.presences,
            range: self.range,
        })
    }

    /// One receiver's cumulative dwell total.
    pub fn total(&self, receiver_id: &ReceiverId) -> Option<u64> {
        self.receivers.get(receiver_id).map(|s| s.total_dwell_ms)
    }

    /// One receiver's occupancy count.
    pub fn presences(&self, receiver_id: &ReceiverId) -> Option<u32> {
        self.receivers.get(receiver_id).map(|s| s.presences)
    }

    /// The global popularity range.
    pub fn range(&self) -> GlowRange {
        self.range
    }

    /// Iterate over configured receiver ids.
    pub fn receiver_ids(&self) -> impl Iterator<Item = &ReceiverId> {
        self.receivers.keys()
    }
}

/// Session store and receiver aggregator, guarded together.
struct Board {
    sessions: SessionStore,
    receivers: ReceiverAggregator,
}

/// Shared presence state handle.
///
/// Cloned per task; thread-safe access to the session store and the
/// receiver aggregator behind one lock, so an event and a sweep can never
/// interleave mid-operation.
#[derive(Clone)]
pub struct PresenceState {
    inner: Arc<PresenceStateInner>,
}

struct PresenceStateInner {
    board: RwLock<Board>,
}

impl PresenceState {
    /// Create the state for a fixed receiver set.
    pub fn new(receivers: impl IntoIterator<Item = ReceiverId>) -> Self {
        Self {
            inner: Arc::new(PresenceStateInner {
                board: RwLock::new(Board {
                    sessions: SessionStore::new(),
                    receivers: ReceiverAggregator::new(receivers),
                }),
            }),
        }
    }

    /// Feed one inbound event through the filter and attribution path.
    ///
    /// Events that are not from a likely person, or that name an
    /// unconfigured receiver, are discarded and return `None`. Accepted
    /// events mutate the session store and credit the attributed receiver.
    pub fn record_event(&self, event: &ProximityEvent) -> Option<DwellAttribution> {
        if !event.is_person.is_likely() {
            return None;
        }

        let mut board = self.inner.board.write();
        let Board {
            sessions,
            receivers,
        } = &mut *board;

        if !receivers.contains(&event.receiver_id) {
            return None;
        }

        let attribution = sessions.attribute(event);
        receivers.accumulate(&attribution.receiver_id, attribution.increment_ms);
        Some(attribution)
    }

    /// Run one presence sweep.
    ///
    /// Under a single write lock: reset occupancy and range sentinels,
    /// fold every total into the range, expire sessions idle longer than
    /// `session_timeout_ms`, and recount occupancy from the surviving
    /// sessions.
    pub fn sweep(&self, now_ms: i64, session_timeout_ms: u64) -> SweepSummary {
        let mut board = self.inner.board.write();
        let Board {
            sessions,
            receivers,
        } = &mut *board;

        receivers.begin_sweep();
        receivers.refresh_range();

        let cutoff_ms = now_ms - session_timeout_ms as i64;
        let expired = sessions.expire_before(cutoff_ms);
        for (device_id, session) in &expired {
            tracing::debug!(
                device_id = %device_id,
                receiver_id = %session.last_receiver_id,
                "session lapsed"
            );
        }

        let mut occupied = 0;
        for (_, session) in sessions.iter() {
            if receivers.count_presence(&session.last_receiver_id) {
                occupied += 1;
            }
        }

        SweepSummary {
            expired: expired.len(),
            occupied,
            range: receivers.range(),
        }
    }

    /// Snapshot one receiver's popularity.
    pub fn sample(&self, receiver_id: &ReceiverId) -> Option<GlowSample> {
        self.inner.board.read().receivers.sample(receiver_id)
    }

    /// One receiver's cumulative dwell total.
    pub fn total(&self, receiver_id: &ReceiverId) -> Option<u64> {
        self.inner.board.read().receivers.total(receiver_id)
    }

    /// One receiver's occupancy count.
    pub fn presences(&self, receiver_id: &ReceiverId) -> Option<u32> {
        self.inner.board.read().receivers.presences(receiver_id)
    }

    /// The global popularity range.
    pub fn range(&self) -> GlowRange {
        self.inner.board.read().receivers.range()
    }

    /// Number of live sessions.
    pub fn session_count(&self) -> usize {
        self.inner.board.read().sessions.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dwellglow_core::{DeviceId, EventKind, PersonLikelihood};

    fn state(receivers: &[&str]) -> PresenceState {
        PresenceState::new(receivers.iter().map(|r| ReceiverId::new(*r)))
    }

    fn event(device: &str, receiver: &str, duration_ms: u64, time_ms: i64) -> ProximityEvent {
        ProximityEvent {
            kind: EventKind::Displacement,
            receiver_id: ReceiverId::new(receiver),
            device_id: DeviceId::new(device),
            is_person: PersonLikelihood::Possibly,
            session_duration_ms: duration_ms,
            time_ms,
        }
    }

    #[test]
    fn test_non_person_events_discarded() {
        let state = state(&["lobby"]);
        let mut ev = event("d1", "lobby", 1_000, 0);
        ev.is_person = PersonLikelihood::No;

        assert!(state.record_event(&ev).is_none());
        assert_eq!(state.session_count(), 0);
    }

    #[test]
    fn test_unknown_receiver_discarded() {
        let state = state(&["lobby"]);
        assert!(state.record_event(&event("d1", "garage", 1_000, 0)).is_none());
        assert_eq!(state.session_count(), 0);
    }

    #[test]
    fn test_accumulation_is_monotonic() {
        let state = state(&["lobby"]);
        let lobby = ReceiverId::new("lobby");

        state.record_event(&event("d1", "lobby", 1_000, 0));
        state.record_event(&event("d1", "lobby", 3_000, 1_000));
        assert_eq!(state.total(&lobby), Some(2_000));

        // A counter reset never decreases the total.
        state.record_event(&event("d1", "lobby", 500, 2_000));
        assert_eq!(state.total(&lobby), Some(2_000));
    }

    #[test]
    fn test_sweep_counts_presences() {
        let state = state(&["lobby", "cafe"]);

        state.record_event(&event("d1", "lobby", 1_000, 9_000));
        state.record_event(&event("d2", "lobby", 2_000, 9_500));
        state.record_event(&event("d3", "cafe", 500, 9_900));

        let summary = state.sweep(10_000, 60_000);
        assert_eq!(summary.expired, 0);
        assert_eq!(summary.occupied, 3);
        assert_eq!(state.presences(&ReceiverId::new("lobby")), Some(2));
        assert_eq!(state.presences(&ReceiverId::new("cafe")), Some(1));
    }

    #[test]
    fn test_sweep_is_idempotent_without_new_events() {
        let state = state(&["lobby"]);
        state.record_event(&event("d1", "lobby", 1_000, 9_000));

        let first = state.sweep(10_000, 60_000);
        let second = state.sweep(11_000, 60_000);

        assert_eq!(first.occupied, second.occupied);
        assert_eq!(first.range, second.range);
        assert_eq!(state.presences(&ReceiverId::new("lobby")), Some(1));
    }

    #[test]
    fn test_sweep_expires_and_recounts() {
        let state = state(&["lobby"]);
        let lobby = ReceiverId::new("lobby");

        state.record_event(&event("d1", "lobby", 1_000, 0));
        state.record_event(&event("d2", "lobby", 1_000, 55_000));

        // d1 idle for 70 s, d2 for 15 s; timeout 60 s.
        let summary = state.sweep(70_000, 60_000);
        assert_eq!(summary.expired, 1);
        assert_eq!(state.presences(&lobby), Some(1));
        assert_eq!(state.session_count(), 1);

        // The expired session stays gone on the next sweep.
        let next = state.sweep(71_000, 60_000);
        assert_eq!(next.expired, 0);
        assert_eq!(state.presences(&lobby), Some(1));
    }

    #[test]
    fn test_sweep_range_tracks_totals() {
        let state = state(&["lobby", "cafe", "atrium"]);

        state.record_event(&event("d1", "lobby", 0, 0));
        state.record_event(&event("d1", "lobby", 8_000, 1_000));
        state.record_event(&event("d2", "cafe", 0, 0));
        state.record_event(&event("d2", "cafe", 3_000, 1_000));

        let summary = state.sweep(2_000, 60_000);
        // atrium never saw dwell, so the minimum is zero.
        assert_eq!(summary.range.min_total_ms, 0);
        assert_eq!(summary.range.max_total_ms, 8_000);
    }
}
