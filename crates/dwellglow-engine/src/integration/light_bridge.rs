//! Outbound light command seam.
//!
//! The real bridge transport (HTTP toward a lighting hub) is an external
//! collaborator; the engine only ever talks to the [`LightBridge`] trait.

use async_trait::async_trait;

use dwellglow_core::{LightCommand, LightId};

use super::IntegrationError;

/// Handler for outbound light commands.
#[async_trait]
pub trait LightBridge: Send + Sync {
    /// Handler name, for logs.
    fn name(&self) -> &str;

    /// Deliver one command to one light.
    async fn send(&self, light_id: &LightId, command: &LightCommand)
        -> Result<(), IntegrationError>;
}

/// Bridge that logs every command instead of actuating hardware.
///
/// Useful for dry runs and as the default when no bridge is configured.
pub struct TracingLightBridge;

#[async_trait]
impl LightBridge for TracingLightBridge {
    fn name(&self) -> &str {
        "tracing"
    }

    async fn send(
        &self,
        light_id: &LightId,
        command: &LightCommand,
    ) -> Result<(), IntegrationError> {
        tracing::info!(
            light_id = %light_id,
            hue = command.hue,
            brightness = command.brightness,
            saturation = command.saturation,
            transition_ms = command.transition_ms,
            "light command"
        );
        Ok(())
    }
}

/// Bridge that records every command it is handed.
///
/// Used by tests and dry runs to inspect what the animation produced.
#[derive(Default)]
pub struct RecordingLightBridge {
    commands: parking_lot::Mutex<Vec<(LightId, LightCommand)>>,
}

impl RecordingLightBridge {
    /// All commands recorded so far, in delivery order.
    pub fn commands(&self) -> Vec<(LightId, LightCommand)> {
        self.commands.lock().clone()
    }

    /// Number of recorded commands.
    pub fn len(&self) -> usize {
        self.commands.lock().len()
    }

    /// Returns `true` if nothing was recorded.
    pub fn is_empty(&self) -> bool {
        self.commands.lock().is_empty()
    }
}

#[async_trait]
impl LightBridge for RecordingLightBridge {
    fn name(&self) -> &str {
        "recording"
    }

    async fn send(
        &self,
        light_id: &LightId,
        command: &LightCommand,
    ) -> Result<(), IntegrationError> {
        self.commands.lock().push((light_id.clone(), *command));
        Ok(())
    }
}
