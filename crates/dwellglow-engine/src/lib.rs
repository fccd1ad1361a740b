//! # dwellglow Engine
//!
//! Session attribution, presence aggregation, and the breathing animation
//! for the dwellglow ambient-lighting system.
//!
//! The engine turns a stream of proximity-detection events into per-light
//! color and rhythm: dwell time is attributed per receiver as events
//! arrive, occupancy and the global popularity range are refreshed by a
//! periodic sweep, and one animator per light maps the result into
//! breathing commands.
//!
//! ## Architecture
//!
//! ```text
//! event feed ──► PresenceState ◄──── PresenceSweeper (periodic)
//!                (sessions +              │
//!                 receivers +             ▼
//!                 global range)      occupancy, range
//!                      │
//!                      ▼
//!               LightAnimator × N ──► LightBridge ──► lights
//! ```
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use dwellglow_core::GlowConfig;
//! use dwellglow_engine::{GlowEngine, TracingLightBridge};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> dwellglow_engine::Result<()> {
//!     let config = GlowConfig::builder()
//!         .receiver_light_pair("lobby-receiver", "lobby-lamp")
//!         .build();
//!
//!     let mut engine = GlowEngine::new(config)?;
//!     engine.start(Arc::new(TracingLightBridge));
//!
//!     // ... feed events via engine.process_event(&event) ...
//!
//!     engine.stop();
//!     Ok(())
//! }
//! ```

#![forbid(unsafe_code)]

pub mod aggregate;
pub mod animation;
pub mod integration;
pub mod session;
pub mod sweep;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use dwellglow_core::{GlowConfig, ProximityEvent};

// Re-export main types
pub use aggregate::{PresenceState, ReceiverAggregator, ReceiverState};
pub use animation::{AnimationConfig, BreathePhase, CycleOutcome, LightAnimator};
pub use integration::{
    FeedStats, IntegrationError, LightBridge, RecordingLightBridge, ReplayEventReceiver,
    TracingLightBridge, UdpEventReceiver,
};
pub use session::{DwellAttribution, Session, SessionStore};
pub use sweep::{PresenceSweeper, SweepSummary};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Common result type for engine operations
pub type Result<T> = std::result::Result<T, EngineError>;

/// Unified error type for engine operations
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Configuration rejected
    #[error("Configuration error: {0}")]
    Config(#[from] dwellglow_core::CoreError),

    /// Integration seam failure
    #[error("Integration error: {0}")]
    Integration(#[from] IntegrationError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Top-level coordinator wiring the engine together.
///
/// Owns the shared [`PresenceState`], validates the configuration, pairs
/// receivers with lights, and manages the lifetime of the sweeper and
/// animator tasks as a unit.
pub struct GlowEngine {
    config: GlowConfig,
    state: PresenceState,
    running: AtomicBool,
    tasks: Vec<tokio::task::JoinHandle<()>>,
}

impl GlowEngine {
    /// Validate the configuration and build the engine.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Config`] when the configuration is
    /// internally inconsistent.
    pub fn new(config: GlowConfig) -> Result<Self> {
        config.validate()?;
        let state = PresenceState::new(config.receivers.iter().cloned());

        Ok(Self {
            config,
            state,
            running: AtomicBool::new(false),
            tasks: Vec::new(),
        })
    }

    /// The shared presence state handle.
    pub fn state(&self) -> &PresenceState {
        &self.state
    }

    /// The startup configuration.
    pub fn config(&self) -> &GlowConfig {
        &self.config
    }

    /// Returns `true` while the periodic tasks are spawned.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Feed one inbound event through the filter and attribution path.
    ///
    /// Returns the attribution for accepted events, `None` for events the
    /// filter discarded. Never fails: a discarded event is normal input,
    /// not an error.
    pub fn process_event(&self, event: &ProximityEvent) -> Option<DwellAttribution> {
        let attribution = self.state.record_event(event);

        match &attribution {
            Some(a) => tracing::debug!(
                device_id = %event.device_id,
                receiver_id = %a.receiver_id,
                increment_ms = a.increment_ms,
                clamped = a.was_clamped(),
                "dwell attributed"
            ),
            None => tracing::debug!(
                device_id = %event.device_id,
                receiver_id = %event.receiver_id,
                "event discarded by filter"
            ),
        }

        attribution
    }

    /// Spawn the presence sweeper and one animator per configured light.
    ///
    /// Idempotent: calling it while running does nothing.
    pub fn start(&mut self, bridge: Arc<dyn LightBridge>) {
        if self.running.swap(true, Ordering::SeqCst) {
            return;
        }

        let sweeper = PresenceSweeper::new(
            self.state.clone(),
            self.config.update_interval_ms,
            self.config.session_timeout_ms,
        );
        self.tasks.push(tokio::spawn(sweeper.run()));

        let animation = AnimationConfig::from_glow(&self.config);
        for (receiver_id, light_id) in self.config.pairs() {
            let animator = LightAnimator::new(
                light_id.clone(),
                receiver_id.clone(),
                self.state.clone(),
                Arc::clone(&bridge),
                animation.clone(),
            );
            self.tasks.push(tokio::spawn(animator.run()));
        }

        tracing::info!(
            receivers = self.config.receivers.len(),
            lights = self.config.lights.len(),
            bridge = bridge.name(),
            "engine started"
        );
    }

    /// Abort every periodic task.
    ///
    /// Idempotent: calling it while stopped does nothing.
    pub fn stop(&mut self) {
        if !self.running.swap(false, Ordering::SeqCst) {
            return;
        }

        for task in self.tasks.drain(..) {
            task.abort();
        }
        tracing::info!("engine stopped");
    }
}

impl Drop for GlowEngine {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        AnimationConfig, BreathePhase, DwellAttribution, EngineError, FeedStats, GlowEngine,
        LightAnimator, LightBridge, PresenceState, PresenceSweeper, RecordingLightBridge,
        ReplayEventReceiver, Result, Session, SessionStore, SweepSummary, TracingLightBridge,
        UdpEventReceiver,
    };
}
