//! Inbound proximity event receivers.
//!
//! Two sources are supported:
//! - UDP datagrams carrying one JSON event each (live feed relay)
//! - JSONL capture files replayed with original timing (offline runs)
//!
//! Both keep [`FeedStats`] so a misbehaving feed is visible without
//! debug logging.

use std::path::Path;
use std::time::Duration;

use chrono::{DateTime, Utc};

use dwellglow_core::ProximityEvent;

use super::IntegrationError;

/// Statistics kept by event receivers.
#[derive(Debug, Clone, Copy, Default)]
pub struct FeedStats {
    /// Total datagrams or lines received.
    pub events_received: u64,
    /// Successfully parsed events.
    pub events_parsed: u64,
    /// Payloads that failed to parse.
    pub parse_errors: u64,
}

impl FeedStats {
    /// Fraction of received payloads that parsed.
    pub fn success_rate(&self) -> f64 {
        if self.events_received > 0 {
            self.events_parsed as f64 / self.events_received as f64
        } else {
            0.0
        }
    }
}

/// Receiver for JSON proximity events over UDP.
pub struct UdpEventReceiver {
    socket: tokio::net::UdpSocket,
    buffer: Vec<u8>,
    timeout_ms: u64,
    stats: FeedStats,
}

impl UdpEventReceiver {
    /// Bind the receiver to the given address.
    pub async fn bind(addr: &str) -> Result<Self, IntegrationError> {
        let socket = tokio::net::UdpSocket::bind(addr).await?;
        tracing::info!("event feed bound to {}", addr);

        Ok(Self {
            socket,
            buffer: vec![0u8; 65536],
            timeout_ms: 5_000,
            stats: FeedStats::default(),
        })
    }

    /// Set the receive timeout in milliseconds.
    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    /// Receive the next event.
    ///
    /// Returns `Ok(None)` on timeout or when a datagram fails to parse;
    /// parse failures are counted and logged at debug, never fatal.
    pub async fn receive(&mut self) -> Result<Option<ProximityEvent>, IntegrationError> {
        let timeout = Duration::from_millis(self.timeout_ms);

        match tokio::time::timeout(timeout, self.socket.recv_from(&mut self.buffer)).await {
            Ok(Ok((len, addr))) => {
                self.stats.events_received += 1;

                match serde_json::from_slice::<ProximityEvent>(&self.buffer[..len]) {
                    Ok(event) => {
                        self.stats.events_parsed += 1;
                        Ok(Some(event))
                    }
                    Err(error) => {
                        self.stats.parse_errors += 1;
                        tracing::debug!("failed to parse event from {}: {}", addr, error);
                        Ok(None)
                    }
                }
            }
            Ok(Err(error)) => Err(IntegrationError::Io(error)),
            Err(_) => Ok(None), // Timeout
        }
    }

    /// Receiver statistics.
    pub fn stats(&self) -> &FeedStats {
        &self.stats
    }
}

/// Replays a JSONL event capture with its original timing.
pub struct ReplayEventReceiver {
    events: Vec<ProximityEvent>,
    current_index: usize,
    playback_speed: f64,
    loop_playback: bool,
    feed_start_ms: Option<i64>,
    wall_start: Option<DateTime<Utc>>,
    stats: FeedStats,
}

impl ReplayEventReceiver {
    /// Load a capture file, one JSON event per line.
    ///
    /// Blank lines are skipped; unparseable lines are counted and logged
    /// at debug.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, IntegrationError> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let mut stats = FeedStats::default();
        let mut events = Vec::new();

        for (line_no, line) in text.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            stats.events_received += 1;
            match serde_json::from_str::<ProximityEvent>(line) {
                Ok(event) => {
                    stats.events_parsed += 1;
                    events.push(event);
                }
                Err(error) => {
                    stats.parse_errors += 1;
                    tracing::debug!("skipping capture line {}: {}", line_no + 1, error);
                }
            }
        }

        tracing::info!(
            events = events.len(),
            parse_errors = stats.parse_errors,
            "loaded event capture from {}",
            path.as_ref().display()
        );

        Ok(Self {
            events,
            current_index: 0,
            playback_speed: 1.0,
            loop_playback: false,
            feed_start_ms: None,
            wall_start: None,
            stats,
        })
    }

    /// Build a replay source from in-memory events.
    pub fn from_events(events: Vec<ProximityEvent>) -> Self {
        Self {
            events,
            current_index: 0,
            playback_speed: 1.0,
            loop_playback: false,
            feed_start_ms: None,
            wall_start: None,
            stats: FeedStats::default(),
        }
    }

    /// Set the playback speed multiplier (1.0 = realtime, 0.0 = no pacing)
    /// and whether to loop when the capture ends.
    pub fn with_playback(mut self, speed: f64, loop_playback: bool) -> Self {
        self.playback_speed = speed;
        self.loop_playback = loop_playback;
        self
    }

    /// Next event from the capture, paced against the event timestamps.
    ///
    /// Returns `None` once the capture is exhausted and looping is off.
    pub async fn next_event(&mut self) -> Option<ProximityEvent> {
        if self.current_index >= self.events.len() {
            if self.loop_playback && !self.events.is_empty() {
                self.current_index = 0;
                self.feed_start_ms = None;
                self.wall_start = None;
            } else {
                return None;
            }
        }

        let event = self.events[self.current_index].clone();
        self.current_index += 1;

        if self.playback_speed > 0.0 {
            let feed_start_ms = *self.feed_start_ms.get_or_insert(event.time_ms);
            let wall_start = *self.wall_start.get_or_insert_with(Utc::now);

            let feed_offset_ms = event.time_ms - feed_start_ms;
            let scaled_offset_ms = (feed_offset_ms as f64 / self.playback_speed) as i64;
            let real_offset_ms = (Utc::now() - wall_start).num_milliseconds();

            let delay_ms = scaled_offset_ms - real_offset_ms;
            if delay_ms > 0 {
                tokio::time::sleep(Duration::from_millis(delay_ms as u64)).await;
            }
        }

        Some(event)
    }

    /// Current position as (next index, total events).
    pub fn position(&self) -> (usize, usize) {
        (self.current_index, self.events.len())
    }

    /// Receiver statistics.
    pub fn stats(&self) -> &FeedStats {
        &self.stats
    }
}
