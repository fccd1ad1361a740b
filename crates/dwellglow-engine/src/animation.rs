//! Breathing animation controller.
//!
//! One [`LightAnimator`] runs per light, forever alternating between a
//! bright breathe-in and a dim breathe-out. Color encodes the paired
//! receiver's popularity relative to the global range; rhythm encodes its
//! occupancy. The cycle clock never waits on the bridge: commands are
//! fired detached behind a per-light idle flag, and a busy light simply
//! drops the cycle's command.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use rand::Rng;

use dwellglow_core::{GlowConfig, GlowRange, GlowSample, LightCommand, LightId, ReceiverId};

use crate::aggregate::PresenceState;
use crate::integration::LightBridge;

// ---------------------------------------------------------------------------
// BreathePhase
// ---------------------------------------------------------------------------

/// Phase of the breathing cycle.
///
/// The animator starts in [`BreathePhase::Out`] and flips on every cycle;
/// there is no terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreathePhase {
    /// Brightness rising toward the high endpoint.
    In,
    /// Brightness falling toward the low endpoint.
    Out,
}

impl BreathePhase {
    /// The opposite phase.
    #[must_use]
    pub fn flip(self) -> Self {
        match self {
            Self::In => Self::Out,
            Self::Out => Self::In,
        }
    }

    /// Brightness endpoint for this phase.
    #[must_use]
    pub fn brightness(self, config: &AnimationConfig) -> u8 {
        match self {
            Self::In => config.brightness_high,
            Self::Out => config.brightness_low,
        }
    }
}

// ---------------------------------------------------------------------------
// AnimationConfig
// ---------------------------------------------------------------------------

/// Numeric policy of the animation.
#[derive(Debug, Clone)]
pub struct AnimationConfig {
    /// Base breathing transition duration, in milliseconds.
    pub breathing_base_ms: u64,
    /// Hue at the bottom of the popularity range.
    pub min_hue: u32,
    /// Hue at the top of the popularity range.
    pub max_hue: u32,
    /// Magnitude of the symmetric per-cycle hue jitter.
    pub hue_jitter: u32,
    /// Brightness at the top of a breath.
    pub brightness_high: u8,
    /// Brightness at the bottom of a breath.
    pub brightness_low: u8,
    /// Fixed saturation for every command.
    pub saturation: u8,
}

impl AnimationConfig {
    /// Extract the animation policy from the startup configuration.
    pub fn from_glow(config: &GlowConfig) -> Self {
        Self {
            breathing_base_ms: config.breathing_base_ms,
            min_hue: config.min_hue,
            max_hue: config.max_hue,
            hue_jitter: config.hue_jitter,
            brightness_high: config.brightness_high,
            brightness_low: config.brightness_low,
            saturation: config.saturation,
        }
    }
}

// ---------------------------------------------------------------------------
// Numeric policy
// ---------------------------------------------------------------------------

/// Interpolate a receiver's dwell total onto the configured hue range.
///
/// The max clamp is checked first: totals at or above the global maximum
/// render `max_hue`, so a fully tied field (every receiver equal,
/// including the idle startup state) sits at the top of the range. Totals
/// at or below the global minimum clamp to `min_hue`. In between, linear
/// interpolation with a `+1` in the denominator so the fraction stays
/// defined when the range collapses.
pub fn hue_for(total_ms: u64, range: GlowRange, min_hue: u32, max_hue: u32) -> u32 {
    if total_ms >= range.max_total_ms {
        return max_hue;
    }
    if total_ms <= range.min_total_ms {
        return min_hue;
    }

    let span_ms = (range.max_total_ms - range.min_total_ms) as f64 + 1.0;
    let fraction = (total_ms - range.min_total_ms) as f64 / span_ms;
    min_hue + (fraction * f64::from(max_hue - min_hue)).round() as u32
}

/// Transition duration for one breath: busier receivers breathe faster.
///
/// `ln` is not positive for occupancies of 0 or 1, so the divisor floors
/// at 1 and the base duration is the slowest rhythm.
pub fn transition_for(presences: u32, base_ms: u64) -> u64 {
    let divisor = f64::from(presences.max(1)).ln().max(1.0);
    (base_ms as f64 / divisor).round() as u64
}

/// Apply symmetric random jitter to a hue, saturating at zero.
pub fn jittered(hue: u32, jitter: u32, rng: &mut impl Rng) -> u32 {
    if jitter == 0 {
        return hue;
    }
    let offset = rng.gen_range(-i64::from(jitter)..=i64::from(jitter));
    (i64::from(hue) + offset).max(0) as u32
}

// ---------------------------------------------------------------------------
// LightAnimator
// ---------------------------------------------------------------------------

/// What one breathing cycle did.
#[derive(Debug, Clone, Copy)]
pub struct CycleOutcome {
    /// The command computed for this cycle.
    pub command: LightCommand,
    /// Delay until the next cycle, in milliseconds.
    pub transition_ms: u64,
    /// Whether the command was handed to the bridge or dropped busy.
    pub dispatched: bool,
}

/// Breathing cycle driver for one light.
pub struct LightAnimator {
    light_id: LightId,
    receiver_id: ReceiverId,
    state: PresenceState,
    bridge: Arc<dyn LightBridge>,
    config: AnimationConfig,
    phase: BreathePhase,
    idle: Arc<AtomicBool>,
}

impl LightAnimator {
    /// Create an animator for one light/receiver pair.
    pub fn new(
        light_id: LightId,
        receiver_id: ReceiverId,
        state: PresenceState,
        bridge: Arc<dyn LightBridge>,
        config: AnimationConfig,
    ) -> Self {
        Self {
            light_id,
            receiver_id,
            state,
            bridge,
            config,
            phase: BreathePhase::Out,
            idle: Arc::new(AtomicBool::new(true)),
        }
    }

    /// Advance one breath.
    ///
    /// Samples the receiver, computes the cycle's command, flips the
    /// phase, and dispatches the command detached if the light is idle.
    /// A busy light drops the command; the returned transition applies
    /// either way.
    pub fn cycle(&mut self) -> CycleOutcome {
        let sample = self
            .state
            .sample(&self.receiver_id)
            .unwrap_or(GlowSample {
                total_dwell_ms: 0,
                presences: 0,
                range: GlowRange::RESET,
            });

        let base_hue = hue_for(
            sample.total_dwell_ms,
            sample.range,
            self.config.min_hue,
            self.config.max_hue,
        );
        let hue = jittered(base_hue, self.config.hue_jitter, &mut rand::thread_rng());
        let transition_ms = transition_for(sample.presences, self.config.breathing_base_ms);

        self.phase = self.phase.flip();
        let command = LightCommand {
            hue,
            brightness: self.phase.brightness(&self.config),
            saturation: self.config.saturation,
            transition_ms,
        };

        let dispatched = self.idle.swap(false, Ordering::SeqCst);
        if dispatched {
            let bridge = Arc::clone(&self.bridge);
            let idle = Arc::clone(&self.idle);
            let light_id = self.light_id.clone();
            tokio::spawn(async move {
                // The guard is restored after failures too; a dead bridge
                // must not stall the breathing.
                if let Err(error) = bridge.send(&light_id, &command).await {
                    tracing::warn!(light_id = %light_id, error = %error, "light command failed");
                }
                idle.store(true, Ordering::SeqCst);
            });
        } else {
            tracing::debug!(light_id = %self.light_id, "light still busy; dropping command");
        }

        CycleOutcome {
            command,
            transition_ms,
            dispatched,
        }
    }

    /// Run the breathing loop until the task is aborted.
    pub async fn run(mut self) {
        tracing::debug!(
            light_id = %self.light_id,
            receiver_id = %self.receiver_id,
            "animator started"
        );

        loop {
            let outcome = self.cycle();
            tokio::time::sleep(Duration::from_millis(outcome.transition_ms)).await;
        }
    }
}
