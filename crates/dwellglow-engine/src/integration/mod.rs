//! Integration seams toward the external collaborators.
//!
//! The inbound detection feed and the outbound light bridge live outside
//! the engine; this module provides the narrow surfaces they plug into:
//!
//! - [`LightBridge`]: outbound command seam plus shipped handlers
//! - [`UdpEventReceiver`]: inbound JSON datagram feed
//! - [`ReplayEventReceiver`]: offline capture replay

pub mod event_source;
pub mod light_bridge;

pub use event_source::{FeedStats, ReplayEventReceiver, UdpEventReceiver};
pub use light_bridge::{LightBridge, RecordingLightBridge, TracingLightBridge};

use thiserror::Error;

/// Errors from the integration layer.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum IntegrationError {
    /// Invalid seam configuration
    #[error("Integration config error: {0}")]
    Config(String),

    /// Light bridge rejected or failed a command
    #[error("Bridge error: {0}")]
    Bridge(String),

    /// Inbound payload could not be understood
    #[error("Data format error: {0}")]
    DataFormat(String),

    /// Underlying I/O failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
