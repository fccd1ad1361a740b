//! # dwellglow Core
//!
//! Core types, configuration, and errors for the dwellglow
//! presence-lighting system.
//!
//! This crate provides the foundational building blocks used throughout the
//! dwellglow ecosystem, including:
//!
//! - **Core Data Types**: [`ProximityEvent`], [`LightCommand`], [`GlowRange`],
//!   and the [`DeviceId`]/[`ReceiverId`]/[`LightId`] identifier newtypes.
//!
//! - **Error Types**: Structured error handling via the [`error`] module.
//!
//! - **Configuration**: [`GlowConfig`] describing the receiver/light layout
//!   and the numeric policy of the animation effect, loaded once at startup.
//!
//! ## Example
//!
//! ```rust
//! use dwellglow_core::GlowConfig;
//!
//! let config = GlowConfig::builder()
//!     .receiver_light_pair("lobby-receiver", "lobby-lamp")
//!     .session_timeout_ms(60_000)
//!     .build();
//!
//! assert!(config.validate().is_ok());
//! ```

#![forbid(unsafe_code)]

pub mod config;
pub mod error;
pub mod types;

// Re-export commonly used types at the crate root
pub use config::{GlowConfig, GlowConfigBuilder};
pub use error::{CoreError, CoreResult};
pub use types::{
    // Identifiers
    DeviceId, LightId, ReceiverId,
    // Wire event
    EventKind, PersonLikelihood, ProximityEvent,
    // Animation output
    GlowRange, GlowSample, LightCommand,
};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude module for convenient imports.
///
/// ```rust
/// use dwellglow_core::prelude::*;
/// ```
pub mod prelude {
    pub use crate::config::{GlowConfig, GlowConfigBuilder};
    pub use crate::error::{CoreError, CoreResult};
    pub use crate::types::{
        DeviceId, EventKind, GlowRange, GlowSample, LightCommand, LightId, PersonLikelihood,
        ProximityEvent, ReceiverId,
    };
}
