//! Multi-property animation engine
//!
//! Every animated property is normalized to a `{from, to}` pair. A bare
//! scalar is static (`from == to`). At progress `t` the easing is applied
//! first and every property is interpolated with the same eased value:
//!
//! ```text
//! value = from + (to - from) * ease(t)
//! ```
//!
//! The interpolated properties are assembled into one [`VisualState`].

use crate::easing::Easing;
use crate::player::{PlayDirection, PlayerConfig};
use indexmap::IndexMap;
use motion_core::{MotionVars, Transform2D, VisualState};
use serde::{Deserialize, Serialize};

/// Trait for values that can be linearly interpolated
pub trait Interpolate: Clone {
    /// Linearly interpolate between self and other by factor t (0.0 to 1.0)
    fn lerp(&self, other: &Self, t: f32) -> Self;

    /// Check if two values are approximately equal
    fn approx_eq(&self, other: &Self, epsilon: f32) -> bool;
}

impl Interpolate for f32 {
    fn lerp(&self, other: &Self, t: f32) -> Self {
        self + (other - self) * t
    }

    fn approx_eq(&self, other: &Self, epsilon: f32) -> bool {
        (self - other).abs() < epsilon
    }
}

impl Interpolate for Transform2D {
    fn lerp(&self, other: &Self, t: f32) -> Self {
        Transform2D {
            translate_x: self.translate_x.lerp(&other.translate_x, t),
            translate_y: self.translate_y.lerp(&other.translate_y, t),
            scale: self.scale.lerp(&other.scale, t),
            rotate: self.rotate.lerp(&other.rotate, t),
        }
    }

    fn approx_eq(&self, other: &Self, epsilon: f32) -> bool {
        self.translate_x.approx_eq(&other.translate_x, epsilon)
            && self.translate_y.approx_eq(&other.translate_y, epsilon)
            && self.scale.approx_eq(&other.scale, epsilon)
            && self.rotate.approx_eq(&other.rotate, epsilon)
    }
}

/// Visual properties interpolate; metadata is taken from `other`
impl Interpolate for VisualState {
    fn lerp(&self, other: &Self, t: f32) -> Self {
        VisualState {
            opacity: self.opacity.lerp(&other.opacity, t),
            transform: self.transform.lerp(&other.transform, t),
            blur: self.blur.lerp(&other.blur, t),
            vars: other.vars.clone(),
        }
    }

    fn approx_eq(&self, other: &Self, epsilon: f32) -> bool {
        self.opacity.approx_eq(&other.opacity, epsilon)
            && self.transform.approx_eq(&other.transform, epsilon)
            && self.blur.approx_eq(&other.blur, epsilon)
    }
}

// ============================================================================
// Properties
// ============================================================================

/// An animatable visual property
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Property {
    Opacity,
    TranslateX,
    TranslateY,
    Scale,
    /// Degrees
    Rotate,
    /// Blur radius in px
    Blur,
}

impl Property {
    pub const ALL: [Property; 6] = [
        Property::Opacity,
        Property::TranslateX,
        Property::TranslateY,
        Property::Scale,
        Property::Rotate,
        Property::Blur,
    ];

    /// Value that leaves the element unchanged
    pub fn identity(self) -> f32 {
        match self {
            Property::Opacity | Property::Scale => 1.0,
            Property::TranslateX | Property::TranslateY | Property::Rotate | Property::Blur => 0.0,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Property::Opacity => "opacity",
            Property::TranslateX => "translateX",
            Property::TranslateY => "translateY",
            Property::Scale => "scale",
            Property::Rotate => "rotate",
            Property::Blur => "blur",
        }
    }

    /// Parse a property name, accepting the usual shorthands (`x`, `y`, `rotation`)
    pub fn parse(name: &str) -> Option<Property> {
        match crate::easing::normalize(name).as_str() {
            "opacity" => Some(Property::Opacity),
            "x" | "translatex" => Some(Property::TranslateX),
            "y" | "translatey" => Some(Property::TranslateY),
            "scale" => Some(Property::Scale),
            "rotate" | "rotation" => Some(Property::Rotate),
            "blur" => Some(Property::Blur),
            _ => None,
        }
    }

    /// Write this property into a visual state
    pub fn write(self, state: &mut VisualState, value: f32) {
        match self {
            Property::Opacity => state.opacity = value.clamp(0.0, 1.0),
            Property::TranslateX => state.transform.translate_x = value,
            Property::TranslateY => state.transform.translate_y = value,
            Property::Scale => state.transform.scale = value,
            Property::Rotate => state.transform.rotate = value,
            Property::Blur => state.blur = value.max(0.0),
        }
    }
}

/// A property's animation range; a bare number is static
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Static(f32),
    Range { from: f32, to: f32 },
}

impl PropertyValue {
    pub fn range(from: f32, to: f32) -> Self {
        PropertyValue::Range { from, to }
    }

    /// Value at progress 0
    pub fn start(&self) -> f32 {
        match *self {
            PropertyValue::Static(value) => value,
            PropertyValue::Range { from, .. } => from,
        }
    }

    /// Value at progress 1
    pub fn end(&self) -> f32 {
        match *self {
            PropertyValue::Static(value) => value,
            PropertyValue::Range { to, .. } => to,
        }
    }

    pub fn is_static(&self) -> bool {
        self.start() == self.end()
    }

    pub fn is_finite(&self) -> bool {
        self.start().is_finite() && self.end().is_finite()
    }

    /// Value at an already-eased progress
    pub fn sample(&self, eased: f32) -> f32 {
        self.start().lerp(&self.end(), eased)
    }
}

impl From<f32> for PropertyValue {
    fn from(value: f32) -> Self {
        PropertyValue::Static(value)
    }
}

impl From<(f32, f32)> for PropertyValue {
    fn from((from, to): (f32, f32)) -> Self {
        PropertyValue::Range { from, to }
    }
}

/// Ordered per-property animation ranges
pub type PropertyMap = IndexMap<Property, PropertyValue>;

/// Interpolate every property at an eased progress
///
/// Properties absent from the map keep their identity value.
pub fn interpolate(properties: &PropertyMap, eased: f32) -> VisualState {
    let mut state = VisualState::visible();
    for (property, value) in properties {
        property.write(&mut state, value.sample(eased));
    }
    state
}

// ============================================================================
// Resolved motion
// ============================================================================

/// A fully resolved motion: what to animate and how
///
/// Produced from a descriptor; sampling is a pure function of progress.
#[derive(Clone, Debug, PartialEq)]
pub struct ResolvedMotion {
    pub properties: PropertyMap,
    pub easing: Easing,
    pub duration_ms: u32,
    pub delay_ms: u32,
    pub direction: PlayDirection,
    pub looping: bool,
}

impl ResolvedMotion {
    pub fn new(properties: PropertyMap) -> Self {
        Self {
            properties,
            easing: Easing::default(),
            duration_ms: 600,
            delay_ms: 0,
            direction: PlayDirection::Forward,
            looping: false,
        }
    }

    pub fn with_easing(mut self, easing: Easing) -> Self {
        self.easing = easing;
        self
    }

    pub fn with_duration(mut self, duration_ms: u32) -> Self {
        self.duration_ms = duration_ms;
        self
    }

    pub fn with_delay(mut self, delay_ms: u32) -> Self {
        self.delay_ms = delay_ms;
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

    /// Metadata attached to every sampled state
    pub fn vars(&self, progress: f32) -> MotionVars {
        MotionVars {
            delay_ms: self.delay_ms,
            duration_ms: self.duration_ms,
            easing: self.easing.to_css(),
            progress: progress.clamp(0.0, 1.0),
        }
    }

    /// Eased progress; the endpoints are exact regardless of the curve
    fn ease(&self, t: f32) -> f32 {
        if t <= 0.0 {
            0.0
        } else if t >= 1.0 {
            1.0
        } else {
            self.easing.apply(t)
        }
    }

    /// Entrance state at linear progress `t` (hidden → visible)
    pub fn sample(&self, t: f32) -> VisualState {
        let t = t.clamp(0.0, 1.0);
        interpolate(&self.properties, self.ease(t)).with_vars(self.vars(t))
    }

    /// Exit state at linear progress `t` (visible → hidden)
    pub fn sample_exit(&self, t: f32) -> VisualState {
        let t = t.clamp(0.0, 1.0);
        interpolate(&self.properties, 1.0 - self.ease(t)).with_vars(self.vars(t))
    }

    pub fn hidden_state(&self) -> VisualState {
        interpolate(&self.properties, 0.0).with_vars(self.vars(0.0))
    }

    pub fn visible_state(&self) -> VisualState {
        interpolate(&self.properties, 1.0).with_vars(self.vars(1.0))
    }

    /// Playback timing for this motion
    pub fn player_config(&self) -> PlayerConfig {
        PlayerConfig::new(self.duration_ms)
            .with_delay(self.delay_ms)
            .with_direction(self.direction)
            .with_loop(self.looping)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slide_map() -> PropertyMap {
        let mut map = PropertyMap::new();
        map.insert(Property::Opacity, PropertyValue::range(0.0, 1.0));
        map.insert(Property::TranslateY, PropertyValue::range(20.0, 0.0));
        map
    }

    #[test]
    fn test_f32_lerp() {
        assert_eq!(0.0_f32.lerp(&10.0, 0.25), 2.5);
        assert!(1.0_f32.approx_eq(&1.0005, 0.001));
    }

    #[test]
    fn test_transform_lerp() {
        let a = Transform2D::translate(0.0, 20.0).then(&Transform2D::scale(0.5));
        let b = Transform2D::IDENTITY;
        let mid = a.lerp(&b, 0.5);
        assert_eq!(mid.translate_y, 10.0);
        assert_eq!(mid.scale, 0.75);
    }

    #[test]
    fn test_static_value_does_not_move() {
        let value = PropertyValue::Static(0.5);
        assert!(value.is_static());
        assert_eq!(value.sample(0.0), 0.5);
        assert_eq!(value.sample(1.0), 0.5);
    }

    #[test]
    fn test_property_value_deserializes_both_forms() {
        let map: PropertyMap =
            serde_json::from_str(r#"{"opacity": {"from": 0, "to": 1}, "scale": 1.2}"#).unwrap();
        assert_eq!(map[&Property::Opacity], PropertyValue::range(0.0, 1.0));
        assert_eq!(map[&Property::Scale], PropertyValue::Static(1.2));
    }

    #[test]
    fn test_interpolate_defaults_to_identity() {
        let state = interpolate(&PropertyMap::new(), 0.3);
        assert_eq!(state.opacity, 1.0);
        assert!(state.transform.is_identity());
        assert_eq!(state.blur, 0.0);
    }

    #[test]
    fn test_interpolate_clamps_opacity_and_blur() {
        let mut map = PropertyMap::new();
        map.insert(Property::Opacity, PropertyValue::range(0.0, 2.0));
        map.insert(Property::Blur, PropertyValue::range(-4.0, 0.0));
        let state = interpolate(&map, 0.75);
        assert_eq!(state.opacity, 1.0);
        assert_eq!(state.blur, 0.0);
    }

    #[test]
    fn test_easing_applies_before_interpolation() {
        let motion = ResolvedMotion::new(slide_map()).with_easing(Easing::EaseInCubic);
        let state = motion.sample(0.5);
        // ease-in-cubic(0.5) = 0.125
        assert!((state.opacity - 0.125).abs() < 1e-6);
        assert!((state.transform.translate_y - 17.5).abs() < 1e-4);
    }

    #[test]
    fn test_sample_endpoints() {
        let motion = ResolvedMotion::new(slide_map()).with_easing(Easing::EaseOutBack);
        assert_eq!(motion.sample(0.0), motion.hidden_state());
        assert_eq!(motion.sample(1.0), motion.visible_state());
        assert_eq!(motion.hidden_state().opacity, 0.0);
        assert_eq!(motion.visible_state().transform.to_css(), "none");
    }

    #[test]
    fn test_sample_exit_runs_backwards() {
        let motion = ResolvedMotion::new(slide_map()).with_easing(Easing::Linear);
        let exit = motion.sample_exit(0.25);
        assert!((exit.opacity - 0.75).abs() < 1e-6);
        assert!((exit.transform.translate_y - 5.0).abs() < 1e-6);
        assert_eq!(exit.vars.progress, 0.25);
        assert_eq!(motion.sample_exit(1.0).opacity, 0.0);
    }

    #[test]
    fn test_vars_carry_timing() {
        let motion = ResolvedMotion::new(slide_map())
            .with_duration(400)
            .with_delay(100)
            .with_easing(Easing::Linear);
        let state = motion.sample(0.5);
        assert_eq!(state.vars.duration_ms, 400);
        assert_eq!(state.vars.delay_ms, 100);
        assert_eq!(state.vars.easing, "linear");
        assert_eq!(state.vars.progress, 0.5);
    }

    #[test]
    fn test_player_config_from_motion() {
        let motion = ResolvedMotion::new(slide_map())
            .with_duration(250)
            .with_direction(PlayDirection::Alternate)
            .with_loop(true);
        let config = motion.player_config();
        assert_eq!(config.duration_ms, 250);
        assert_eq!(config.direction, PlayDirection::Alternate);
        assert!(config.looping);
    }

    #[test]
    fn test_property_parse() {
        assert_eq!(Property::parse("translate-x"), Some(Property::TranslateX));
        assert_eq!(Property::parse("y"), Some(Property::TranslateY));
        assert_eq!(Property::parse("rotation"), Some(Property::Rotate));
        assert_eq!(Property::parse("skew"), None);
    }
}
