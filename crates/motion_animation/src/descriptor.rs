//! Motion descriptors
//!
//! A [`MotionDescriptor`] is the declarative input for one animated element.
//! Exactly one motion source is active at evaluation time, chosen by priority:
//!
//! 1. an explicit per-property map
//! 2. a non-empty effect set
//! 3. an entrance type
//! 4. fade, when nothing else is given
//!
//! Unset timing and trigger fields fall back to the engine [`MotionConfig`].
//! Descriptors deserialize from TOML or JSON with camelCase keys.

use crate::easing::Easing;
use crate::engine::{PropertyMap, ResolvedMotion};
use crate::observer::ObserverOptions;
use crate::player::PlayDirection;
use crate::presets::{EffectSet, EntranceType, DEFAULT_DISTANCE};
use motion_core::{report_fallback, Margins, MotionConfig, VisualState};
use serde::{Deserialize, Serialize};

/// Timing overrides; unset fields use the engine defaults
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TimingDescriptor {
    pub duration: Option<u32>,
    pub delay: Option<u32>,
    pub easing: Option<Easing>,
}

/// A single threshold or a list of thresholds
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Threshold {
    Single(f32),
    Many(Vec<f32>),
}

impl Threshold {
    pub fn values(&self) -> Vec<f32> {
        match self {
            Threshold::Single(value) => vec![*value],
            Threshold::Many(values) => values.clone(),
        }
    }
}

/// Trigger overrides; unset fields use the engine defaults
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TriggerDescriptor {
    pub threshold: Option<Threshold>,
    pub root_margin: Option<String>,
    pub trigger_once: Option<bool>,
    pub auto_start: Option<bool>,
}

/// The motion source selected for evaluation
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum MotionSource<'a> {
    Properties(&'a PropertyMap),
    Effects(&'a EffectSet),
    Entrance(EntranceType),
    Default,
}

/// Declarative motion configuration for one element
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MotionDescriptor {
    pub entrance: Option<EntranceType>,
    pub effects: EffectSet,
    pub properties: PropertyMap,
    /// Slide distance for entrance shorthand
    pub distance: Option<f32>,
    /// Visible opacity
    pub opacity: Option<f32>,
    pub timing: TimingDescriptor,
    pub trigger: TriggerDescriptor,
    pub direction: PlayDirection,
    #[serde(rename = "loop")]
    pub looping: bool,
}

impl MotionDescriptor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entrance(entrance: EntranceType) -> Self {
        Self {
            entrance: Some(entrance),
            ..Self::default()
        }
    }

    pub fn effects(effects: EffectSet) -> Self {
        Self {
            effects,
            ..Self::default()
        }
    }

    pub fn properties(properties: PropertyMap) -> Self {
        Self {
            properties,
            ..Self::default()
        }
    }

    pub fn with_duration(mut self, duration_ms: u32) -> Self {
        self.timing.duration = Some(duration_ms);
        self
    }

    pub fn with_delay(mut self, delay_ms: u32) -> Self {
        self.timing.delay = Some(delay_ms);
        self
    }

    pub fn with_easing(mut self, easing: impl Into<Easing>) -> Self {
        self.timing.easing = Some(easing.into());
        self
    }

    pub fn with_distance(mut self, distance: f32) -> Self {
        self.distance = Some(distance);
        self
    }

    pub fn with_opacity(mut self, opacity: f32) -> Self {
        self.opacity = Some(opacity);
        self
    }

    pub fn with_threshold(mut self, threshold: f32) -> Self {
        self.trigger.threshold = Some(Threshold::Single(threshold));
        self
    }

    pub fn with_trigger_once(mut self, once: bool) -> Self {
        self.trigger.trigger_once = Some(once);
        self
    }

    pub fn with_auto_start(mut self, auto_start: bool) -> Self {
        self.trigger.auto_start = Some(auto_start);
        self
    }

    pub fn with_direction(mut self, direction: PlayDirection) -> Self {
        self.direction = direction;
        self
    }

    pub fn with_loop(mut self, looping: bool) -> Self {
        self.looping = looping;
        self
    }

    /// The motion source that wins by priority
    pub fn active_source(&self) -> MotionSource<'_> {
        if !self.properties.is_empty() {
            MotionSource::Properties(&self.properties)
        } else if !self.effects.is_empty() {
            MotionSource::Effects(&self.effects)
        } else if let Some(entrance) = self.entrance {
            MotionSource::Entrance(entrance)
        } else {
            MotionSource::Default
        }
    }

    fn resolve_properties(&self) -> PropertyMap {
        match self.active_source() {
            MotionSource::Properties(map) => {
                let mut clean = PropertyMap::with_capacity(map.len());
                for (property, value) in map {
                    if value.is_finite() {
                        clean.insert(*property, *value);
                    } else {
                        report_fallback("property range", property.name(), "dropped");
                    }
                }
                if clean.is_empty() {
                    EffectSet::fade().to_properties(self.opacity)
                } else {
                    clean
                }
            }
            MotionSource::Effects(effects) => effects.to_properties(self.opacity),
            MotionSource::Entrance(entrance) => entrance
                .effects(self.distance())
                .to_properties(self.opacity),
            MotionSource::Default => EffectSet::fade().to_properties(self.opacity),
        }
    }

    fn distance(&self) -> f32 {
        match self.distance {
            Some(distance) if distance.is_finite() => distance,
            Some(distance) => {
                report_fallback(
                    "slide distance",
                    &distance.to_string(),
                    &DEFAULT_DISTANCE.to_string(),
                );
                DEFAULT_DISTANCE
            }
            None => DEFAULT_DISTANCE,
        }
    }

    fn resolve_easing(&self, config: &MotionConfig) -> Easing {
        if let Some(easing) = &self.timing.easing {
            return easing.clone();
        }
        if let MotionSource::Entrance(entrance) = self.active_source() {
            if let Some(easing) = entrance.default_easing() {
                return easing;
            }
        }
        Easing::from_name(&config.timing.easing)
    }

    /// Resolve into a concrete motion
    pub fn resolve(&self, config: &MotionConfig) -> ResolvedMotion {
        ResolvedMotion::new(self.resolve_properties())
            .with_easing(self.resolve_easing(config))
            .with_duration(self.timing.duration.unwrap_or(config.timing.duration_ms))
            .with_delay(self.timing.delay.unwrap_or(config.timing.delay_ms))
            .with_direction(self.direction)
            .with_loop(self.looping)
    }

    /// Observer settings for this element
    pub fn observer_options(&self, config: &MotionConfig) -> ObserverOptions {
        let thresholds = match &self.trigger.threshold {
            Some(threshold) => threshold.values(),
            None => vec![config.trigger.threshold],
        };
        let margins = match &self.trigger.root_margin {
            Some(css) => Margins::from_css(css).unwrap_or_else(|| {
                report_fallback("root margin", css, "0px");
                Margins::ZERO
            }),
            None => config.trigger.margins(),
        };
        let once = self
            .trigger
            .trigger_once
            .unwrap_or(config.trigger.trigger_once);
        ObserverOptions::new(thresholds, margins, once)
    }

    pub fn auto_start(&self, config: &MotionConfig) -> bool {
        self.trigger.auto_start.unwrap_or(config.trigger.auto_start)
    }
}

/// Visual state of `descriptor` at linear progress `t` in `[0, 1]`
///
/// Pure function of its inputs.
pub fn compute(descriptor: &MotionDescriptor, config: &MotionConfig, t: f32) -> VisualState {
    descriptor.resolve(config).sample(t)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{Property, PropertyValue};
    use crate::presets::SlideDirection;

    fn config() -> MotionConfig {
        MotionConfig::default()
    }

    #[test]
    fn test_default_is_fade() {
        let descriptor = MotionDescriptor::new();
        assert_eq!(descriptor.active_source(), MotionSource::Default);

        let motion = descriptor.resolve(&config());
        assert_eq!(motion.properties, EffectSet::fade().to_properties(None));
        assert_eq!(motion.duration_ms, 600);
        assert_eq!(motion.easing, Easing::EaseOut);
    }

    #[test]
    fn test_effects_beat_entrance() {
        let mut descriptor = MotionDescriptor::entrance(EntranceType::SlideLeft);
        descriptor.effects = EffectSet::default().with_scale(0.5, 1.0);
        assert_eq!(
            descriptor.active_source(),
            MotionSource::Effects(&descriptor.effects)
        );

        let hidden = compute(&descriptor, &config(), 0.0);
        assert_eq!(hidden.transform.to_css(), "scale(0.5)");
    }

    #[test]
    fn test_properties_beat_effects() {
        let mut map = PropertyMap::new();
        map.insert(Property::Rotate, PropertyValue::range(-90.0, 0.0));
        let mut descriptor = MotionDescriptor::properties(map);
        descriptor.effects = EffectSet::fade();
        descriptor.entrance = Some(EntranceType::BounceIn);

        assert!(matches!(
            descriptor.active_source(),
            MotionSource::Properties(_)
        ));
        let hidden = compute(&descriptor, &config(), 0.0);
        assert_eq!(hidden.transform.to_css(), "rotate(-90deg)");
        assert_eq!(hidden.opacity, 1.0);
    }

    #[test]
    fn test_non_finite_properties_fall_back() {
        let mut map = PropertyMap::new();
        map.insert(Property::Scale, PropertyValue::range(f32::NAN, 1.0));
        let motion = MotionDescriptor::properties(map).resolve(&config());
        assert_eq!(motion.properties, EffectSet::fade().to_properties(None));
    }

    #[test]
    fn test_entrance_uses_distance() {
        let descriptor = MotionDescriptor::entrance(EntranceType::SlideDown).with_distance(48.0);
        let hidden = compute(&descriptor, &config(), 0.0);
        assert_eq!(hidden.transform.translate_y, -48.0);
    }

    #[test]
    fn test_timing_falls_back_to_config() {
        let config = config().with_duration(900).with_easing("linear");
        let motion = MotionDescriptor::new().with_delay(50).resolve(&config);
        assert_eq!(motion.duration_ms, 900);
        assert_eq!(motion.delay_ms, 50);
        assert_eq!(motion.easing, Easing::Linear);
    }

    #[test]
    fn test_bounce_easing_unless_overridden() {
        let bounce = MotionDescriptor::entrance(EntranceType::BounceIn);
        assert_eq!(bounce.resolve(&config()).easing, Easing::EaseOutBack);

        let linear = bounce.with_easing("linear");
        assert_eq!(linear.resolve(&config()).easing, Easing::Linear);
    }

    #[test]
    fn test_compute_is_pure() {
        let descriptor = MotionDescriptor::entrance(EntranceType::SlideUp).with_easing("linear");
        let a = compute(&descriptor, &config(), 0.5);
        let b = compute(&descriptor, &config(), 0.5);
        assert_eq!(a, b);
        assert_eq!(a.opacity, 0.5);
        assert_eq!(a.transform.translate_y, 10.0);
    }

    #[test]
    fn test_observer_options() {
        let descriptor = MotionDescriptor {
            trigger: TriggerDescriptor {
                threshold: Some(Threshold::Many(vec![0.5, 0.2])),
                root_margin: Some("0px 0px -40px 0px".into()),
                trigger_once: Some(false),
                auto_start: None,
            },
            ..MotionDescriptor::default()
        };
        let options = descriptor.observer_options(&config());
        assert_eq!(options.min_threshold(), 0.2);
        assert_eq!(options.root_margin.bottom, -40.0);
        assert!(!options.trigger_once);
        assert!(descriptor.auto_start(&config()));
    }

    #[test]
    fn test_bad_root_margin_falls_back() {
        let descriptor = MotionDescriptor {
            trigger: TriggerDescriptor {
                root_margin: Some("10%".into()),
                ..TriggerDescriptor::default()
            },
            ..MotionDescriptor::default()
        };
        assert_eq!(descriptor.observer_options(&config()).root_margin, Margins::ZERO);
    }

    #[test]
    fn test_deserialize_from_json() {
        let descriptor: MotionDescriptor = serde_json::from_str(
            r#"{
                "entrance": "slideRight",
                "effects": {"slide": {"direction": "left", "distance": 30}},
                "timing": {"duration": 400, "easing": "ease-in-out"},
                "trigger": {"threshold": [0.1, 0.5], "triggerOnce": false},
                "direction": "alternate",
                "loop": true
            }"#,
        )
        .unwrap();

        assert_eq!(descriptor.entrance, Some(EntranceType::SlideRight));
        assert_eq!(
            descriptor.effects.slide.map(|s| s.direction),
            Some(SlideDirection::Left)
        );
        assert_eq!(descriptor.timing.duration, Some(400));
        assert_eq!(descriptor.timing.easing, Some(Easing::EaseInOut));
        assert_eq!(descriptor.trigger.trigger_once, Some(false));
        assert_eq!(descriptor.direction, PlayDirection::Alternate);
        assert!(descriptor.looping);
    }

    #[test]
    fn test_deserialize_from_toml() {
        let descriptor: MotionDescriptor = toml::from_str(
            r#"
            entrance = "scale-in"
            opacity = 0.8

            [timing]
            delay = 120

            [properties]
            blur = { from = 6.0, to = 0.0 }
            "#,
        )
        .unwrap();
        assert_eq!(descriptor.entrance, Some(EntranceType::ScaleIn));
        assert_eq!(descriptor.timing.delay, Some(120));
        assert_eq!(
            descriptor.properties[&Property::Blur],
            PropertyValue::range(6.0, 0.0)
        );
    }
}
