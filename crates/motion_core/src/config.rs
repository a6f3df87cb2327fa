//! Engine-wide motion configuration
//!
//! Defaults applied when a descriptor leaves a field unset. Loaded from TOML:
//!
//! ```toml
//! [timing]
//! duration_ms = 600
//! easing = "easeOut"
//!
//! [trigger]
//! threshold = 0.1
//! trigger_once = true
//! root_margin = "0px 0px -50px 0px"
//!
//! [spring]
//! stiffness = 0.2
//! damping = 20.0
//!
//! [store]
//! initial_translate_y = 20.0
//!
//! [frame]
//! fps = 60
//! ```
//!
//! Every section and field is optional.

use crate::error::{MotionError, Result};
use crate::geometry::Margins;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Default timing for timed motions
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    pub duration_ms: u32,
    pub delay_ms: u32,
    /// Easing name, resolved by the easing library (unknown names fall back)
    pub easing: String,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            duration_ms: 600,
            delay_ms: 0,
            easing: "easeOut".to_string(),
        }
    }
}

/// Default visibility trigger policy
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TriggerConfig {
    /// Visible fraction in [0, 1] required to trigger
    pub threshold: f32,
    pub trigger_once: bool,
    pub auto_start: bool,
    /// CSS-style margin shorthand applied to the viewport
    pub root_margin: Option<String>,
}

impl TriggerConfig {
    /// Parsed root margin, zero when unset or unparseable
    pub fn margins(&self) -> Margins {
        match self.root_margin.as_deref() {
            None => Margins::ZERO,
            Some(css) => Margins::from_css(css).unwrap_or_else(|| {
                crate::error::report_fallback("root margin", css, "0px");
                Margins::ZERO
            }),
        }
    }
}

impl Default for TriggerConfig {
    fn default() -> Self {
        Self {
            threshold: 0.1,
            trigger_once: true,
            auto_start: true,
            root_margin: None,
        }
    }
}

/// Default spring constants, expressed per frame
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpringSettings {
    pub stiffness: f32,
    /// Percentage of velocity removed each frame (0-100)
    pub damping: f32,
    pub mass: f32,
    pub rest_speed: f32,
    pub rest_delta: f32,
    /// Frames after which a spring is forced to rest
    pub max_frames: u32,
}

impl Default for SpringSettings {
    fn default() -> Self {
        Self {
            stiffness: 0.2,
            damping: 20.0,
            mass: 1.0,
            rest_speed: 0.01,
            rest_delta: 0.01,
            max_frames: 3600,
        }
    }
}

/// Initial values for new central store entries
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreDefaults {
    pub initial_opacity: f32,
    pub initial_translate_y: f32,
    pub initial_scale: f32,
}

impl Default for StoreDefaults {
    fn default() -> Self {
        Self {
            initial_opacity: 0.0,
            initial_translate_y: 20.0,
            initial_scale: 0.95,
        }
    }
}

/// Frame pacing for simulated clocks
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FrameConfig {
    pub fps: u32,
}

impl FrameConfig {
    pub fn frame_ms(&self) -> f64 {
        1000.0 / self.fps.max(1) as f64
    }
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self { fps: 60 }
    }
}

/// Complete engine configuration
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MotionConfig {
    pub timing: TimingConfig,
    pub trigger: TriggerConfig,
    pub spring: SpringSettings,
    pub store: StoreDefaults,
    pub frame: FrameConfig,
}

impl MotionConfig {
    /// Parse configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: MotionConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|source| MotionError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&content)?;
        tracing::debug!("Loaded motion config from {}", path.display());
        Ok(config)
    }

    /// Reject values that no fallback can make sense of
    pub fn validate(&self) -> Result<()> {
        if self.frame.fps == 0 {
            return Err(MotionError::InvalidConfig("frame.fps must be > 0".into()));
        }
        if !(0.0..=1.0).contains(&self.trigger.threshold) {
            return Err(MotionError::InvalidConfig(format!(
                "trigger.threshold must be within [0, 1], got {}",
                self.trigger.threshold
            )));
        }
        if !self.spring.stiffness.is_finite() || !self.spring.mass.is_finite() {
            return Err(MotionError::InvalidConfig(
                "spring constants must be finite".into(),
            ));
        }
        Ok(())
    }

    /// Set the default duration
    pub fn with_duration(mut self, duration_ms: u32) -> Self {
        self.timing.duration_ms = duration_ms;
        self
    }

    /// Set the default easing name
    pub fn with_easing(mut self, easing: impl Into<String>) -> Self {
        self.timing.easing = easing.into();
        self
    }

    /// Set the default trigger threshold
    pub fn with_threshold(mut self, threshold: f32) -> Self {
        self.trigger.threshold = threshold;
        self
    }

    /// Set the default trigger-once policy
    pub fn with_trigger_once(mut self, once: bool) -> Self {
        self.trigger.trigger_once = once;
        self
    }

    /// Set the simulated frame rate
    pub fn with_fps(mut self, fps: u32) -> Self {
        self.frame.fps = fps;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = MotionConfig::default();
        assert_eq!(config.timing.duration_ms, 600);
        assert_eq!(config.timing.easing, "easeOut");
        assert!(config.trigger.trigger_once);
        assert_eq!(config.store.initial_translate_y, 20.0);
        assert_eq!(config.store.initial_scale, 0.95);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml() {
        let config = MotionConfig::from_toml_str(
            r#"
            [timing]
            duration_ms = 250

            [trigger]
            root_margin = "0px 0px -50px 0px"
            "#,
        )
        .unwrap();

        assert_eq!(config.timing.duration_ms, 250);
        assert_eq!(config.timing.easing, "easeOut");
        assert_eq!(config.trigger.margins().bottom, -50.0);
        assert_eq!(config.frame.fps, 60);
    }

    #[test]
    fn test_invalid_values_rejected() {
        let err = MotionConfig::from_toml_str("[frame]\nfps = 0\n").unwrap_err();
        assert!(matches!(err, MotionError::InvalidConfig(_)));

        let err = MotionConfig::from_toml_str("[trigger]\nthreshold = 1.5\n").unwrap_err();
        assert!(matches!(err, MotionError::InvalidConfig(_)));

        let err = MotionConfig::from_toml_str("timing = 3").unwrap_err();
        assert!(matches!(err, MotionError::ConfigParse(_)));
    }

    #[test]
    fn test_unparseable_margin_falls_back() {
        let trigger = TriggerConfig {
            root_margin: Some("10%".into()),
            ..TriggerConfig::default()
        };
        assert_eq!(trigger.margins(), Margins::ZERO);
    }

    #[test]
    fn test_missing_file() {
        let err = MotionConfig::load(Path::new("/nonexistent/motion.toml")).unwrap_err();
        assert!(matches!(err, MotionError::ConfigRead { .. }));
    }

    #[test]
    fn test_builders() {
        let config = MotionConfig::default()
            .with_duration(300)
            .with_easing("linear")
            .with_threshold(0.5)
            .with_trigger_once(false)
            .with_fps(120);
        assert_eq!(config.timing.duration_ms, 300);
        assert_eq!(config.timing.easing, "linear");
        assert_eq!(config.trigger.threshold, 0.5);
        assert!(!config.trigger.trigger_once);
        assert!((config.frame.frame_ms() - 1000.0 / 120.0).abs() < 1e-9);
    }
}
