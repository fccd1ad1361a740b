//! Core data types for the dwellglow system.
//!
//! This module defines the fundamental data structures shared across the
//! dwellglow ecosystem for representing inbound proximity events, the
//! aggregated popularity range, and outbound light commands.
//!
//! # Type Categories
//!
//! - **Identifiers**: [`DeviceId`], [`ReceiverId`], [`LightId`]
//! - **Wire Event**: [`ProximityEvent`], [`EventKind`], [`PersonLikelihood`]
//! - **Animation Types**: [`LightCommand`], [`GlowRange`], [`GlowSample`]

use serde::{Deserialize, Serialize};

// =============================================================================
// Identifiers
// =============================================================================

/// Unique identifier for a mobile device observed by the receiver network.
///
/// Device identifiers arrive on the wire as opaque strings and are never
/// minted locally.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DeviceId(String);

impl DeviceId {
    /// Creates a device ID from a string.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the device ID as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for DeviceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a fixed proximity receiver.
///
/// The set of receivers is enumerated in [`GlowConfig`](crate::GlowConfig)
/// at startup and never changes during the process lifetime.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReceiverId(String);

impl ReceiverId {
    /// Creates a receiver ID from a string.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the receiver ID as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ReceiverId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a physical light, paired 1:1 with a receiver.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LightId(String);

impl LightId {
    /// Creates a light ID from a string.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the light ID as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for LightId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// =============================================================================
// Wire Event
// =============================================================================

/// Classification of whether the detected device is carried by a person.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PersonLikelihood {
    /// Confirmed person.
    Yes,
    /// Probable person.
    Possibly,
    /// Not a person (fixed infrastructure, asset tag, ...).
    No,
}

impl PersonLikelihood {
    /// Returns `true` if the device should count toward presence.
    ///
    /// Both confirmed and probable classifications qualify.
    #[must_use]
    pub fn is_likely(&self) -> bool {
        matches!(self, Self::Yes | Self::Possibly)
    }
}

/// Kind of proximity event reported by the detection feed.
///
/// All three kinds carry the same payload and are processed identically;
/// the distinction only matters to the upstream service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    /// Device seen for the first time in a visit.
    Appearance,
    /// Device moved to a different strongest receiver.
    Displacement,
    /// Device about to lapse from the feed.
    Disappearance,
}

/// A single proximity-detection event from the inbound feed.
///
/// `session_duration_ms` is the *cumulative* dwell duration of the device's
/// current visit as reported by the feed; it is monotonically non-decreasing
/// while the visit continues, and resets when the feed opens a new visit.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProximityEvent {
    /// Event kind.
    #[serde(rename = "type")]
    pub kind: EventKind,
    /// Receiver that observed the device.
    pub receiver_id: ReceiverId,
    /// The observed device.
    pub device_id: DeviceId,
    /// Person classification.
    pub is_person: PersonLikelihood,
    /// Cumulative visit duration in milliseconds.
    #[serde(rename = "sessionDuration")]
    pub session_duration_ms: u64,
    /// Event timestamp, epoch milliseconds.
    #[serde(rename = "time")]
    pub time_ms: i64,
}

// =============================================================================
// Animation Types
// =============================================================================

/// Global range of cumulative dwell totals across all receivers.
///
/// Recomputed from scratch at the start of every presence sweep; between
/// sweeps it is a snapshot of the totals as of sweep start, stale by at
/// most one sweep interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlowRange {
    /// Smallest cumulative dwell total, in milliseconds.
    pub min_total_ms: u64,
    /// Largest cumulative dwell total, in milliseconds.
    pub max_total_ms: u64,
}

impl GlowRange {
    /// Sentinel value a sweep starts from before folding in any receiver.
    pub const RESET: Self = Self {
        min_total_ms: u64::MAX,
        max_total_ms: 0,
    };

    /// Folds one receiver's total into the range.
    pub fn observe(&mut self, total_ms: u64) {
        self.min_total_ms = self.min_total_ms.min(total_ms);
        self.max_total_ms = self.max_total_ms.max(total_ms);
    }

    /// Returns `true` if at least one total has been folded in.
    #[must_use]
    pub fn is_observed(&self) -> bool {
        self.min_total_ms <= self.max_total_ms
    }
}

impl Default for GlowRange {
    fn default() -> Self {
        Self::RESET
    }
}

/// Read-only snapshot of one receiver's popularity, consumed by the
/// animation controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GlowSample {
    /// Cumulative dwell total attributed to the receiver, in milliseconds.
    pub total_dwell_ms: u64,
    /// Occupancy count as of the last sweep.
    pub presences: u32,
    /// Global range as of the last sweep.
    pub range: GlowRange,
}

/// Outbound command for a single light.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LightCommand {
    /// Target hue.
    pub hue: u32,
    /// Target brightness.
    pub brightness: u8,
    /// Target saturation (always the configured maximum).
    pub saturation: u8,
    /// Transition duration toward the target, in milliseconds.
    #[serde(rename = "transitionDuration")]
    pub transition_ms: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_person_likelihood_filter() {
        assert!(PersonLikelihood::Yes.is_likely());
        assert!(PersonLikelihood::Possibly.is_likely());
        assert!(!PersonLikelihood::No.is_likely());
    }

    #[test]
    fn test_event_parses_wire_json() {
        let json = r#"{
            "type": "displacement",
            "receiverId": "001bc50940810000",
            "deviceId": "fee150bada55",
            "isPerson": "possibly",
            "sessionDuration": 42000,
            "time": 1714070400000
        }"#;

        let event: ProximityEvent = serde_json::from_str(json).unwrap();
        assert_eq!(event.kind, EventKind::Displacement);
        assert_eq!(event.receiver_id.as_str(), "001bc50940810000");
        assert_eq!(event.device_id.as_str(), "fee150bada55");
        assert!(event.is_person.is_likely());
        assert_eq!(event.session_duration_ms, 42_000);
        assert_eq!(event.time_ms, 1_714_070_400_000);
    }

    #[test]
    fn test_event_rejects_unknown_likelihood() {
        let json = r#"{
            "type": "appearance",
            "receiverId": "r1",
            "deviceId": "d1",
            "isPerson": "maybe",
            "sessionDuration": 0,
            "time": 0
        }"#;

        assert!(serde_json::from_str::<ProximityEvent>(json).is_err());
    }

    #[test]
    fn test_glow_range_observe() {
        let mut range = GlowRange::RESET;
        assert!(!range.is_observed());

        range.observe(5_000);
        range.observe(1_000);
        range.observe(9_000);

        assert!(range.is_observed());
        assert_eq!(range.min_total_ms, 1_000);
        assert_eq!(range.max_total_ms, 9_000);
    }

    #[test]
    fn test_light_command_wire_names() {
        let cmd = LightCommand {
            hue: 48_000,
            brightness: 254,
            saturation: 254,
            transition_ms: 3_000,
        };

        let json = serde_json::to_value(cmd).unwrap();
        assert_eq!(json["hue"], 48_000);
        assert_eq!(json["brightness"], 254);
        assert_eq!(json["transitionDuration"], 3_000);
    }

    #[test]
    fn test_id_display_roundtrip() {
        let receiver = ReceiverId::new("lobby");
        assert_eq!(receiver.to_string(), "lobby");
        assert_eq!(receiver, ReceiverId::new(String::from("lobby")));
    }
}
