//! Device configuration.
//!
//! Per-device config structs plus [`InputConfig`], a TOML document describing a
//! whole board. Debounce windows are expressed in whole milliseconds on the
//! wire (`debounce_ms`).
//!
//! ```toml
//! [[button]]
//! id = "select"
//! pin = 14
//!
//! [[encoder]]
//! id = "volume"
//! pin_a = 26
//! pin_b = 27
//! reversed = true
//!
//! [encoder.button]
//! pin = 25
//! debounce_ms = 30
//! ```
//!
//! Configuration is read-only: nothing in this crate writes it back.

use crate::backends::Hal;
use crate::button::Button;
use crate::debounce::DEFAULT_DEBOUNCE;
use crate::error::{Error, Result};
use crate::manager::DeviceManager;
use crate::rotary_encoder::RotaryEncoder;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::time::Duration;
use tracing::{debug, warn};

/// Configuration for a [`Button`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ButtonConfig {
    pub pin: u8,
    /// Enable the internal pull-up on `pin`.
    pub enable_pullup: bool,
    /// Low level means pressed (pull-up wiring).
    pub active_low: bool,
    #[serde(rename = "debounce_ms", with = "millis")]
    pub debounce: Duration,
}

impl Default for ButtonConfig {
    fn default() -> Self {
        Self {
            pin: 0,
            enable_pullup: true,
            active_low: true,
            debounce: DEFAULT_DEBOUNCE,
        }
    }
}

impl ButtonConfig {
    /// Default config on `pin`.
    pub fn on_pin(pin: u8) -> Self {
        Self {
            pin,
            ..Self::default()
        }
    }
}

/// Configuration for a [`RotaryEncoder`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RotaryEncoderConfig {
    pub pin_a: u8,
    pub pin_b: u8,
    /// Negate the direction of rotation.
    pub reversed: bool,
    /// Pull-ups on the A/B phase pins.
    pub enable_pullups: bool,
    /// Push switch built into the shaft, if wired.
    ///
    /// In TOML either a table, or `button = false` for encoders without one.
    #[serde(with = "optional_button")]
    pub button: Option<ButtonConfig>,
}

impl Default for RotaryEncoderConfig {
    fn default() -> Self {
        Self {
            pin_a: 32,
            pin_b: 33,
            reversed: false,
            enable_pullups: true,
            button: Some(ButtonConfig::on_pin(25)),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ButtonEntry {
    pub id: String,
    #[serde(flatten)]
    pub config: ButtonConfig,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncoderEntry {
    pub id: String,
    #[serde(flatten)]
    pub config: RotaryEncoderConfig,
}

/// A board's worth of device declarations.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    #[serde(rename = "button")]
    pub buttons: Vec<ButtonEntry>,
    #[serde(rename = "encoder")]
    pub encoders: Vec<EncoderEntry>,
}

impl InputConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(src: &str) -> Result<Self> {
        let config: Self = toml::from_str(src)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject documents that declare the same id twice.
    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for id in self.ids() {
            if id.is_empty() {
                return Err(Error::Config("device id must not be empty".into()));
            }
            if !seen.insert(id) {
                return Err(Error::Config(format!("device id `{id}` declared twice")));
            }
        }
        Ok(())
    }

    /// Every declared id, buttons first.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.buttons
            .iter()
            .map(|b| b.id.as_str())
            .chain(self.encoders.iter().map(|e| e.id.as_str()))
    }

    /// Build every declared device against `hal` and register it.
    ///
    /// Buttons are registered first, then encoders, each in document order.
    /// If any declared id is already taken in `manager`, nothing is registered.
    pub fn register(&self, manager: &mut DeviceManager, hal: &mut dyn Hal) -> Result<()> {
        self.validate()?;
        if let Some(taken) = self.ids().find(|id| manager.has_device(id)) {
            warn!(id = taken, "config declares an id that is already registered");
            return Err(Error::DuplicateId(taken.to_owned()));
        }
        for entry in &self.buttons {
            let pin = hal.input(entry.config.pin);
            let button = Button::new(entry.id.clone(), entry.config.clone(), pin, hal.clock());
            manager.add(button)?;
        }
        for entry in &self.encoders {
            let counter = hal.quadrature_counter();
            let button_pin = entry.config.button.as_ref().map(|b| hal.input(b.pin));
            let encoder = RotaryEncoder::new(
                entry.id.clone(),
                entry.config.clone(),
                counter,
                button_pin,
                hal.clock(),
            );
            manager.add(encoder)?;
        }
        debug!(
            buttons = self.buttons.len(),
            encoders = self.encoders.len(),
            "registered devices from config"
        );
        Ok(())
    }
}

/// Encoder push switch: a [`ButtonConfig`] table, or a bare bool.
///
/// `true` selects the default switch wiring, `false` means no switch.
mod optional_button {
    use super::ButtonConfig;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Enabled(bool),
        Config(ButtonConfig),
    }

    pub fn serialize<S: Serializer>(
        value: &Option<ButtonConfig>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(config) => config.serialize(serializer),
            None => serializer.serialize_bool(false),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<ButtonConfig>, D::Error> {
        Ok(match Repr::deserialize(deserializer)? {
            Repr::Enabled(true) => super::RotaryEncoderConfig::default().button,
            Repr::Enabled(false) => None,
            Repr::Config(config) => Some(config),
        })
    }
}

/// `Duration` as integer milliseconds.
mod millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        let ms = u64::try_from(value.as_millis()).unwrap_or(u64::MAX);
        serializer.serialize_u64(ms)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BOARD: &str = r#"
        [[button]]
        id = "button1"
        pin = 14

        [[button]]
        id = "button2"
        pin = 12
        active_low = false
        enable_pullup = false
        debounce_ms = 20

        [[encoder]]
        id = "main_encoder"

        [[encoder]]
        id = "volume_encoder"
        pin_a = 26
        pin_b = 27
        reversed = true
        button = { pin = 4, debounce_ms = 10 }
    "#;

    #[test]
    fn parses_a_board() {
        let cfg = InputConfig::from_toml_str(BOARD).unwrap();
        assert_eq!(cfg.buttons.len(), 2);
        assert_eq!(cfg.buttons[0].config, ButtonConfig::on_pin(14));
        assert_eq!(cfg.buttons[1].config.debounce, Duration::from_millis(20));
        assert!(!cfg.buttons[1].config.active_low);

        assert_eq!(cfg.encoders[0].config, RotaryEncoderConfig::default());
        let volume = &cfg.encoders[1].config;
        assert!(volume.reversed);
        assert_eq!((volume.pin_a, volume.pin_b), (26, 27));
        let button = volume.button.as_ref().unwrap();
        assert_eq!(button.pin, 4);
        assert_eq!(button.debounce, Duration::from_millis(10));
        assert!(button.active_low);
    }

    #[test]
    fn encoder_without_switch() {
        let src = r#"
            [[encoder]]
            id = "volume"
            button = false
        "#;
        let cfg = InputConfig::from_toml_str(src).unwrap();
        assert_eq!(cfg.encoders[0].config.button, None);

        let out = toml::to_string(&cfg).unwrap();
        assert!(out.contains("button = false"), "{out}");
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let src = r#"
            [[button]]
            id = "a"
            [[encoder]]
            id = "a"
        "#;
        let err = InputConfig::from_toml_str(src).unwrap_err();
        assert!(matches!(err, Error::Config(_)), "{err}");
    }

    #[test]
    fn malformed_toml_is_a_toml_error() {
        let err = InputConfig::from_toml_str("[[button]]\nid = 3").unwrap_err();
        assert!(matches!(err, Error::Toml(_)));
    }

    #[test]
    fn debounce_round_trips_as_millis() {
        let json = serde_json::to_value(ButtonConfig::default()).unwrap();
        assert_eq!(json["debounce_ms"], 50);
    }
}
