//! Startup configuration for the dwellglow system.
//!
//! The configuration enumerates the fixed receiver network, the lights
//! paired with it, and the numeric policy of the animation effect. It is
//! loaded once at startup and immutable thereafter; nothing in the engine
//! re-reads it at runtime.

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::types::{LightId, ReceiverId};

/// Configuration for the dwellglow engine and its transports.
///
/// `receivers` and `lights` are positionally paired: the light at index `i`
/// renders the popularity of the receiver at index `i`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GlowConfig {
    /// Ordered list of receiver identifiers.
    pub receivers: Vec<ReceiverId>,
    /// Ordered list of light identifiers, positionally paired with `receivers`.
    pub lights: Vec<LightId>,
    /// Idle time after which a device's session lapses, in milliseconds.
    pub session_timeout_ms: u64,
    /// Presence sweep period, in milliseconds.
    pub update_interval_ms: u64,
    /// Base breathing transition duration, in milliseconds.
    pub breathing_base_ms: u64,
    /// Hue assigned to the least popular receiver.
    pub min_hue: u32,
    /// Hue assigned to the most popular receiver.
    pub max_hue: u32,
    /// Magnitude of the symmetric random hue jitter applied per cycle.
    pub hue_jitter: u32,
    /// Brightness at the top of a breath.
    pub brightness_high: u8,
    /// Brightness at the bottom of a breath.
    pub brightness_low: u8,
    /// Fixed saturation for every command.
    pub saturation: u8,
    /// Bind address for the inbound event feed.
    pub event_bind_addr: String,
    /// Hostname of the light bridge.
    pub bridge_host: String,
    /// Access token for the light bridge.
    pub bridge_token: String,
}

impl Default for GlowConfig {
    fn default() -> Self {
        Self {
            receivers: Vec::new(),
            lights: Vec::new(),
            session_timeout_ms: 60_000,
            update_interval_ms: 5_000,
            breathing_base_ms: 4_000,
            min_hue: 0,
            max_hue: 46_920,
            hue_jitter: 800,
            brightness_high: 254,
            brightness_low: 2,
            saturation: 254,
            event_bind_addr: "0.0.0.0:5600".to_string(),
            bridge_host: "localhost".to_string(),
            bridge_token: String::new(),
        }
    }
}

impl GlowConfig {
    /// Create a new configuration builder.
    pub fn builder() -> GlowConfigBuilder {
        GlowConfigBuilder::default()
    }

    /// Iterate over (receiver, light) pairs in configured order.
    pub fn pairs(&self) -> impl Iterator<Item = (&ReceiverId, &LightId)> {
        self.receivers.iter().zip(self.lights.iter())
    }

    /// Checks the configuration for internal consistency.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Validation`] when the receiver list is empty,
    /// receivers and lights do not pair up, an identifier repeats, the hue
    /// or brightness ranges are inverted, or a period is zero.
    pub fn validate(&self) -> CoreResult<()> {
        if self.receivers.is_empty() {
            return Err(CoreError::validation("at least one receiver is required"));
        }
        if self.receivers.len() != self.lights.len() {
            return Err(CoreError::validation(format!(
                "receivers and lights must pair up: {} receivers, {} lights",
                self.receivers.len(),
                self.lights.len()
            )));
        }

        let mut seen_receivers = std::collections::HashSet::new();
        for receiver in &self.receivers {
            if !seen_receivers.insert(receiver) {
                return Err(CoreError::validation(format!(
                    "duplicate receiver id '{receiver}'"
                )));
            }
        }
        let mut seen_lights = std::collections::HashSet::new();
        for light in &self.lights {
            if !seen_lights.insert(light) {
                return Err(CoreError::validation(format!("duplicate light id '{light}'")));
            }
        }

        if self.min_hue > self.max_hue {
            return Err(CoreError::validation(format!(
                "min_hue {} exceeds max_hue {}",
                self.min_hue, self.max_hue
            )));
        }
        if self.brightness_low > self.brightness_high {
            return Err(CoreError::validation(format!(
                "brightness_low {} exceeds brightness_high {}",
                self.brightness_low, self.brightness_high
            )));
        }
        if self.session_timeout_ms == 0 {
            return Err(CoreError::validation("session_timeout_ms must be non-zero"));
        }
        if self.update_interval_ms == 0 {
            return Err(CoreError::validation("update_interval_ms must be non-zero"));
        }
        if self.breathing_base_ms == 0 {
            return Err(CoreError::validation("breathing_base_ms must be non-zero"));
        }

        Ok(())
    }
}

/// Builder for [`GlowConfig`].
#[derive(Debug, Default)]
pub struct GlowConfigBuilder {
    config: GlowConfig,
}

impl GlowConfigBuilder {
    /// Append a receiver and the light that renders it.
    pub fn receiver_light_pair(
        mut self,
        receiver: impl Into<String>,
        light: impl Into<String>,
    ) -> Self {
        self.config.receivers.push(ReceiverId::new(receiver));
        self.config.lights.push(LightId::new(light));
        self
    }

    /// Set the session idle timeout.
    pub fn session_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.config.session_timeout_ms = timeout_ms;
        self
    }

    /// Set the presence sweep period. Clamped to at least 100 ms.
    pub fn update_interval_ms(mut self, interval_ms: u64) -> Self {
        self.config.update_interval_ms = interval_ms.max(100);
        self
    }

    /// Set the base breathing transition duration. Clamped to at least 100 ms.
    pub fn breathing_base_ms(mut self, base_ms: u64) -> Self {
        self.config.breathing_base_ms = base_ms.max(100);
        self
    }

    /// Set the hue range rendered across the popularity spectrum.
    pub fn hue_range(mut self, min_hue: u32, max_hue: u32) -> Self {
        self.config.min_hue = min_hue;
        self.config.max_hue = max_hue;
        self
    }

    /// Set the per-cycle hue jitter magnitude.
    pub fn hue_jitter(mut self, jitter: u32) -> Self {
        self.config.hue_jitter = jitter;
        self
    }

    /// Set the breathing brightness endpoints.
    pub fn brightness_range(mut self, low: u8, high: u8) -> Self {
        self.config.brightness_low = low;
        self.config.brightness_high = high;
        self
    }

    /// Set the bind address for the inbound event feed.
    pub fn event_bind_addr(mut self, addr: impl Into<String>) -> Self {
        self.config.event_bind_addr = addr.into();
        self
    }

    /// Set the light bridge endpoint.
    pub fn bridge(mut self, host: impl Into<String>, token: impl Into<String>) -> Self {
        self.config.bridge_host = host.into();
        self.config.bridge_token = token.into();
        self
    }

    /// Build the configuration.
    pub fn build(self) -> GlowConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_pair_config() -> GlowConfig {
        GlowConfig::builder()
            .receiver_light_pair("lobby", "lobby-lamp")
            .receiver_light_pair("cafe", "cafe-lamp")
            .build()
    }

    #[test]
    fn test_builder_pairs() {
        let config = two_pair_config();
        assert!(config.validate().is_ok());

        let pairs: Vec<_> = config.pairs().collect();
        assert_eq!(pairs.len(), 2);
        assert_eq!(pairs[0].0.as_str(), "lobby");
        assert_eq!(pairs[0].1.as_str(), "lobby-lamp");
    }

    #[test]
    fn test_empty_receivers_rejected() {
        let config = GlowConfig::default();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_unpaired_lights_rejected() {
        let mut config = two_pair_config();
        config.lights.pop();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_duplicate_receiver_rejected() {
        let config = GlowConfig::builder()
            .receiver_light_pair("lobby", "lamp-1")
            .receiver_light_pair("lobby", "lamp-2")
            .build();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_inverted_hue_range_rejected() {
        let config = GlowConfig::builder()
            .receiver_light_pair("lobby", "lamp")
            .hue_range(50_000, 10_000)
            .build();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_interval_clamping() {
        let config = GlowConfig::builder()
            .receiver_light_pair("lobby", "lamp")
            .update_interval_ms(1)
            .breathing_base_ms(0)
            .build();

        assert_eq!(config.update_interval_ms, 100);
        assert_eq!(config.breathing_base_ms, 100);
    }

    #[test]
    fn test_deserialize_partial_json() {
        let json = r#"{
            "receivers": ["lobby", "cafe"],
            "lights": ["lobby-lamp", "cafe-lamp"],
            "session_timeout_ms": 120000
        }"#;

        let config: GlowConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.receivers.len(), 2);
        assert_eq!(config.update_interval_ms, 5_000);
        assert_eq!(config.session_timeout_ms, 120_000);
    }
}
