//! Per-device session tracking and dwell attribution.
//!
//! A session is the record of the most recent event for one device. Dwell
//! time is attributed incrementally: each event carries the cumulative
//! duration of the device's visit, and the difference against the stored
//! session becomes the increment credited to a receiver.
//!
//! The handoff rule: when a device moves between receivers mid-visit, the
//! increment is credited to the receiver recorded at the *previous* event,
//! i.e. the one the device was leaving, not the one it is entering.

use std::collections::HashMap;

use dwellglow_core::{DeviceId, ProximityEvent, ReceiverId};

/// Most recent observation of one device.
#[derive(Debug, Clone)]
pub struct Session {
    /// Cumulative visit duration reported by the most recent event.
    pub last_session_duration_ms: u64,
    /// Timestamp of the most recent event, epoch milliseconds.
    pub last_event_time_ms: i64,
    /// Receiver that produced the most recent event.
    pub last_receiver_id: ReceiverId,
}

/// Outcome of attributing one event's dwell increment.
#[derive(Debug, Clone)]
pub struct DwellAttribution {
    /// Receiver the increment is credited to.
    pub receiver_id: ReceiverId,
    /// Non-negative dwell increment, in milliseconds.
    pub increment_ms: u64,
    /// Raw cumulative delta before clamping. Negative when the upstream
    /// feed reset the device's visit counter.
    pub raw_delta_ms: i64,
}

impl DwellAttribution {
    /// Returns `true` if a negative delta was clamped to zero.
    #[must_use]
    pub fn was_clamped(&self) -> bool {
        self.raw_delta_ms < 0
    }
}

/// Store of live sessions, keyed by device.
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: HashMap<DeviceId, Session>,
}

impl SessionStore {
    /// Create an empty session store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Attribute the event's dwell increment and update the session record.
    ///
    /// A first sighting establishes the baseline: zero increment, credited
    /// to the event's own receiver. Every later event credits the
    /// cumulative delta to the receiver of the previous event (handoff
    /// rule). Negative deltas clamp to zero; the raw value stays on the
    /// returned [`DwellAttribution`].
    ///
    /// The session record is overwritten unconditionally.
    pub fn attribute(&mut self, event: &ProximityEvent) -> DwellAttribution {
        let (receiver_id, raw_delta_ms) = match self.sessions.get(&event.device_id) {
            Some(session) => (
                session.last_receiver_id.clone(),
                event.session_duration_ms as i64 - session.last_session_duration_ms as i64,
            ),
            None => (event.receiver_id.clone(), 0),
        };

        self.sessions.insert(
            event.device_id.clone(),
            Session {
                last_session_duration_ms: event.session_duration_ms,
                last_event_time_ms: event.time_ms,
                last_receiver_id: event.receiver_id.clone(),
            },
        );

        if raw_delta_ms < 0 {
            tracing::debug!(
                device_id = %event.device_id,
                raw_delta_ms,
                "visit counter reset upstream; clamping increment to zero"
            );
        }

        DwellAttribution {
            receiver_id,
            increment_ms: raw_delta_ms.max(0) as u64,
            raw_delta_ms,
        }
    }

    /// Remove every session whose last event predates `cutoff_ms`.
    ///
    /// Returns the removed sessions so the sweeper can report them.
    pub fn expire_before(&mut self, cutoff_ms: i64) -> Vec<(DeviceId, Session)> {
        let expired: Vec<DeviceId> = self
            .sessions
            .iter()
            .filter(|(_, session)| session.last_event_time_ms < cutoff_ms)
            .map(|(device_id, _)| device_id.clone())
            .collect();

        expired
            .into_iter()
            .filter_map(|device_id| {
                self.sessions
                    .remove(&device_id)
                    .map(|session| (device_id, session))
            })
            .collect()
    }

    /// Look up the session for a device.
    pub fn get(&self, device_id: &DeviceId) -> Option<&Session> {
        self.sessions.get(device_id)
    }

    /// Iterate over all live sessions.
    pub fn iter(&self) -> impl Iterator<Item = (&DeviceId, &Session)> {
        self.sessions.iter()
    }

    /// Number of live sessions.
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Returns `true` if no sessions are live.
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
