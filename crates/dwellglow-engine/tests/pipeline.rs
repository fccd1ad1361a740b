//! Integration tests for the dwell-to-light pipeline.
//!
//! These tests drive the public engine surface with deterministic event
//! sequences: events in -> attribution -> sweep -> animation commands out.
//! No mocks, no random data; hue jitter is configured to zero so every
//! expected value is exact.

use std::sync::Arc;
use std::time::Duration;

use dwellglow_core::{
    DeviceId, EventKind, GlowConfig, PersonLikelihood, ProximityEvent, ReceiverId,
};
use dwellglow_engine::{animation, GlowEngine, RecordingLightBridge};

fn event(device: &str, receiver: &str, duration_ms: u64, time_ms: i64) -> ProximityEvent {
    ProximityEvent {
        kind: EventKind::Displacement,
        receiver_id: ReceiverId::new(receiver),
        device_id: DeviceId::new(device),
        is_person: PersonLikelihood::Yes,
        session_duration_ms: duration_ms,
        time_ms,
    }
}

fn two_receiver_config() -> GlowConfig {
    GlowConfig::builder()
        .receiver_light_pair("receiver-a", "lamp-a")
        .receiver_light_pair("receiver-b", "lamp-b")
        .hue_range(0, 400)
        .hue_jitter(0)
        .session_timeout_ms(60_000)
        .build()
}

#[test]
fn test_handoff_credits_the_receiver_being_left() {
    let engine = GlowEngine::new(two_receiver_config()).unwrap();

    // First sighting at receiver A: baseline only, nothing credited yet.
    let first = engine
        .process_event(&event("d1", "receiver-a", 1_000, 0))
        .unwrap();
    assert_eq!(first.increment_ms, 0);
    assert_eq!(engine.state().total(&ReceiverId::new("receiver-a")), Some(0));

    // The device moves to receiver B having dwelt 3 more seconds. That
    // dwell happened at A, so A is credited and B stays untouched.
    let second = engine
        .process_event(&event("d1", "receiver-b", 4_000, 3_000))
        .unwrap();
    assert_eq!(second.receiver_id.as_str(), "receiver-a");
    assert_eq!(second.increment_ms, 3_000);

    assert_eq!(
        engine.state().total(&ReceiverId::new("receiver-a")),
        Some(3_000)
    );
    assert_eq!(engine.state().total(&ReceiverId::new("receiver-b")), Some(0));
}

#[test]
fn test_increments_telescope_across_a_visit() {
    let engine = GlowEngine::new(two_receiver_config()).unwrap();
    let durations = [500u64, 500, 2_000, 6_500, 6_500, 11_000];

    let mut credited = 0;
    for (i, duration_ms) in durations.iter().enumerate() {
        if let Some(attribution) =
            engine.process_event(&event("d1", "receiver-a", *duration_ms, i as i64 * 1_000))
        {
            credited += attribution.increment_ms;
        }
    }

    assert_eq!(credited, durations[durations.len() - 1] - durations[0]);
}

#[test]
fn test_sweep_drives_occupancy_and_hue() {
    let engine = GlowEngine::new(two_receiver_config()).unwrap();
    let receiver_a = ReceiverId::new("receiver-a");
    let receiver_b = ReceiverId::new("receiver-b");

    // Two people dwell at A, one at B; A accumulates more dwell.
    engine.process_event(&event("d1", "receiver-a", 0, 0));
    engine.process_event(&event("d1", "receiver-a", 10_000, 10_000));
    engine.process_event(&event("d2", "receiver-a", 0, 10_000));
    engine.process_event(&event("d3", "receiver-b", 0, 0));
    engine.process_event(&event("d3", "receiver-b", 2_000, 10_000));

    let summary = engine.state().sweep(11_000, 60_000);
    assert_eq!(summary.expired, 0);
    assert_eq!(summary.occupied, 3);
    assert_eq!(engine.state().presences(&receiver_a), Some(2));
    assert_eq!(engine.state().presences(&receiver_b), Some(1));
    assert_eq!(summary.range.min_total_ms, 2_000);
    assert_eq!(summary.range.max_total_ms, 10_000);

    // The busiest receiver renders at the top of the hue range, the
    // quietest at the bottom.
    let sample_a = engine.state().sample(&receiver_a).unwrap();
    let sample_b = engine.state().sample(&receiver_b).unwrap();
    assert_eq!(
        animation::hue_for(sample_a.total_dwell_ms, sample_a.range, 0, 400),
        400
    );
    assert_eq!(
        animation::hue_for(sample_b.total_dwell_ms, sample_b.range, 0, 400),
        0
    );
}

#[test]
fn test_expired_sessions_leave_occupancy_for_good() {
    let engine = GlowEngine::new(two_receiver_config()).unwrap();
    let receiver_a = ReceiverId::new("receiver-a");

    engine.process_event(&event("d1", "receiver-a", 1_000, 0));

    let occupied = engine.state().sweep(30_000, 60_000);
    assert_eq!(occupied.occupied, 1);

    // Past the timeout the session is removed, not merely uncounted.
    let lapsed = engine.state().sweep(61_000, 60_000);
    assert_eq!(lapsed.expired, 1);
    assert_eq!(engine.state().presences(&receiver_a), Some(0));
    assert_eq!(engine.state().session_count(), 0);

    // And it stays gone on every subsequent sweep.
    let after = engine.state().sweep(62_000, 60_000);
    assert_eq!(after.expired, 0);
    assert_eq!(after.occupied, 0);
}

#[tokio::test]
async fn test_running_engine_emits_breathing_commands() {
    let config = GlowConfig::builder()
        .receiver_light_pair("receiver-a", "lamp-a")
        .receiver_light_pair("receiver-b", "lamp-b")
        .hue_range(0, 400)
        .hue_jitter(0)
        .breathing_base_ms(100)
        .update_interval_ms(100)
        .build();

    let bridge = Arc::new(RecordingLightBridge::default());
    let mut engine = GlowEngine::new(config).unwrap();
    engine.start(Arc::clone(&bridge) as Arc<dyn dwellglow_engine::LightBridge>);

    tokio::time::sleep(Duration::from_millis(350)).await;
    engine.stop();

    let commands = bridge.commands();
    let lamp_a: Vec<_> = commands
        .iter()
        .filter(|(light, _)| light.as_str() == "lamp-a")
        .collect();
    let lamp_b: Vec<_> = commands
        .iter()
        .filter(|(light, _)| light.as_str() == "lamp-b")
        .collect();

    // Both lamps breathed at least one full cycle.
    assert!(lamp_a.len() >= 2, "lamp-a got {} commands", lamp_a.len());
    assert!(lamp_b.len() >= 2, "lamp-b got {} commands", lamp_b.len());

    // Brightness alternates between the breathe endpoints, starting bright.
    assert_eq!(lamp_a[0].1.brightness, 254);
    assert_eq!(lamp_a[1].1.brightness, 2);

    // No events arrived: every receiver is tied at zero dwell, which
    // renders at the top of the hue range, and the empty rooms keep the
    // base rhythm.
    for (_, command) in &commands {
        assert_eq!(command.hue, 400);
        assert_eq!(command.transition_ms, 100);
    }

    // A stopped engine goes quiet.
    let settled = bridge.len();
    tokio::time::sleep(Duration::from_millis(150)).await;
    assert_eq!(bridge.len(), settled);
}
