//! Spring physics animation
//!
//! Frame-stepped spring physics for smooth, natural animations. Each frame:
//!
//! ```text
//! force        = (target - value) * stiffness
//! acceleration = force / mass
//! velocity     = (velocity + acceleration) * (1 - damping / 100)
//! value       += velocity
//! ```
//!
//! Configurations are sanitized on construction so every spring reaches rest
//! in a finite number of frames. Supports preset configurations and custom
//! spring parameters.

use indexmap::IndexMap;
use motion_core::{report_fallback, SpringSettings};
use serde::{Deserialize, Serialize};
use std::hash::Hash;

/// Fraction of the discrete stability bound that stiffness may reach
const STABILITY_MARGIN: f32 = 0.9;

/// Configuration for a spring animation
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpringConfig {
    pub stiffness: f32,
    /// Percentage of velocity removed each frame
    pub damping: f32,
    pub mass: f32,
    pub rest_speed: f32,
    pub rest_delta: f32,
    /// Frames after which the spring snaps to its target
    pub max_frames: u32,
}

impl SpringConfig {
    /// Create a new spring configuration with default rest thresholds
    pub fn new(stiffness: f32, damping: f32, mass: f32) -> Self {
        Self {
            stiffness,
            damping,
            mass,
            ..Self::default()
        }
    }

    /// A gentle, slow spring (good for page transitions)
    pub fn gentle() -> Self {
        Self::new(0.08, 15.0, 1.0)
    }

    /// A wobbly spring with overshoot (good for playful UI)
    pub fn wobbly() -> Self {
        Self::new(0.18, 8.0, 1.0)
    }

    /// A stiff spring (good for buttons)
    pub fn stiff() -> Self {
        Self::new(0.3, 25.0, 1.0)
    }

    /// A very stiff spring with minimal oscillation (good for quick responses)
    pub fn snappy() -> Self {
        Self::new(0.45, 35.0, 1.0)
    }

    /// A slow, heavily damped spring
    pub fn molasses() -> Self {
        Self::new(0.05, 30.0, 1.0)
    }

    /// Look up a preset by name
    pub fn preset(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "gentle" => Some(Self::gentle()),
            "wobbly" => Some(Self::wobbly()),
            "stiff" => Some(Self::stiff()),
            "snappy" => Some(Self::snappy()),
            "molasses" => Some(Self::molasses()),
            _ => None,
        }
    }

    pub fn with_rest_thresholds(mut self, rest_speed: f32, rest_delta: f32) -> Self {
        self.rest_speed = rest_speed;
        self.rest_delta = rest_delta;
        self
    }

    pub fn with_max_frames(mut self, max_frames: u32) -> Self {
        self.max_frames = max_frames;
        self
    }

    /// Fraction of velocity kept each frame
    pub fn velocity_retention(&self) -> f32 {
        1.0 - self.damping / 100.0
    }

    /// Largest stiffness/mass ratio for which the per-frame update converges
    pub fn stability_bound(&self) -> f32 {
        let c = self.velocity_retention();
        if c <= 0.0 {
            return f32::INFINITY;
        }
        2.0 * (1.0 + c) / c
    }

    /// Check if the spring is underdamped (will overshoot and oscillate)
    pub fn is_underdamped(&self) -> bool {
        let c = self.velocity_retention();
        let s = self.stiffness / self.mass;
        let trace = 1.0 + c - c * s;
        trace * trace < 4.0 * c
    }

    /// Return a copy that is guaranteed to converge
    ///
    /// Non-positive or non-finite mass falls back to 1, damping is clamped
    /// into `[1, 99]`, stiffness is kept below the stability bound, and
    /// non-positive rest thresholds or frame caps fall back to defaults.
    pub fn sanitized(&self) -> Self {
        let defaults = Self::default();
        let mut config = *self;

        if !(config.mass.is_finite() && config.mass > 0.0) {
            report_fallback("spring mass", &config.mass.to_string(), "1");
            config.mass = 1.0;
        }
        if !config.damping.is_finite() || !(1.0..=99.0).contains(&config.damping) {
            let clamped = if config.damping.is_finite() {
                config.damping.clamp(1.0, 99.0)
            } else {
                defaults.damping
            };
            report_fallback(
                "spring damping",
                &config.damping.to_string(),
                &clamped.to_string(),
            );
            config.damping = clamped;
        }
        if !(config.stiffness.is_finite() && config.stiffness > 0.0) {
            report_fallback(
                "spring stiffness",
                &config.stiffness.to_string(),
                &defaults.stiffness.to_string(),
            );
            config.stiffness = defaults.stiffness;
        }

        let max_stiffness = config.stability_bound() * STABILITY_MARGIN * config.mass;
        if config.stiffness > max_stiffness {
            report_fallback(
                "spring stiffness",
                &config.stiffness.to_string(),
                &max_stiffness.to_string(),
            );
            config.stiffness = max_stiffness;
        }

        if !(config.rest_speed.is_finite() && config.rest_speed > 0.0) {
            config.rest_speed = defaults.rest_speed;
        }
        if !(config.rest_delta.is_finite() && config.rest_delta > 0.0) {
            config.rest_delta = defaults.rest_delta;
        }
        if config.max_frames == 0 {
            config.max_frames = defaults.max_frames;
        }
        config
    }
}

impl Default for SpringConfig {
    fn default() -> Self {
        (&SpringSettings::default()).into()
    }
}

impl From<&SpringSettings> for SpringConfig {
    fn from(settings: &SpringSettings) -> Self {
        Self {
            stiffness: settings.stiffness,
            damping: settings.damping,
            mass: settings.mass,
            rest_speed: settings.rest_speed,
            rest_delta: settings.rest_delta,
            max_frames: settings.max_frames,
        }
    }
}

/// A spring-based animator for a single value
#[derive(Clone, Copy, Debug)]
pub struct Spring {
    config: SpringConfig,
    value: f32,
    velocity: f32,
    target: f32,
    from: f32,
    frames: u32,
    at_rest: bool,
}

impl Spring {
    pub fn new(config: SpringConfig, initial: f32) -> Self {
        Self {
            config: config.sanitized(),
            value: initial,
            velocity: 0.0,
            target: initial,
            from: initial,
            frames: 0,
            at_rest: true,
        }
    }

    pub fn value(&self) -> f32 {
        self.value
    }

    pub fn velocity(&self) -> f32 {
        self.velocity
    }

    pub fn target(&self) -> f32 {
        self.target
    }

    /// Value the current motion started from
    pub fn origin(&self) -> f32 {
        self.from
    }

    pub fn config(&self) -> &SpringConfig {
        &self.config
    }

    /// Retarget the spring, keeping its current velocity
    pub fn set_target(&mut self, target: f32) {
        self.from = self.value;
        self.target = target;
        self.frames = 0;
        self.at_rest = false;
    }

    /// Jump to a value with no motion
    pub fn snap(&mut self, value: f32) {
        self.value = value;
        self.from = value;
        self.target = value;
        self.velocity = 0.0;
        self.frames = 0;
        self.at_rest = true;
    }

    pub fn is_at_rest(&self) -> bool {
        self.at_rest
    }

    fn within_rest_thresholds(&self) -> bool {
        self.velocity.abs() < self.config.rest_speed
            && (self.target - self.value).abs() < self.config.rest_delta
    }

    /// Advance one frame
    ///
    /// Returns `true` once the spring is at rest. On reaching rest the value
    /// is snapped exactly to the target.
    pub fn step(&mut self) -> bool {
        if self.at_rest {
            return true;
        }

        let force = (self.target - self.value) * self.config.stiffness;
        let acceleration = force / self.config.mass;
        self.velocity = (self.velocity + acceleration) * self.config.velocity_retention();
        self.value += self.velocity;
        self.frames += 1;

        if self.within_rest_thresholds() || self.frames >= self.config.max_frames {
            if self.frames >= self.config.max_frames {
                tracing::debug!(frames = self.frames, "spring hit frame cap, snapping");
            }
            self.value = self.target;
            self.velocity = 0.0;
            self.at_rest = true;
        }
        self.at_rest
    }
}

/// Callback fired when a spring group comes to rest
pub type RestCallback = Box<dyn FnMut()>;

/// A set of springs, one per animated property, that rest together
///
/// The group is at rest when every spring is. The rest callback fires once
/// per motion and is re-armed by [`SpringGroup::set_target`].
pub struct SpringGroup<K> {
    springs: IndexMap<K, Spring>,
    config: SpringConfig,
    rest_reported: bool,
    on_rest: Option<RestCallback>,
}

impl<K: Hash + Eq + Clone> SpringGroup<K> {
    pub fn new(config: SpringConfig) -> Self {
        Self {
            springs: IndexMap::new(),
            config: config.sanitized(),
            rest_reported: true,
            on_rest: None,
        }
    }

    /// Add a property resting at `initial`, replacing any existing spring
    pub fn insert(&mut self, key: K, initial: f32) {
        self.springs.insert(key, Spring::new(self.config, initial));
    }

    /// Retarget one property, inserting it at the target if absent
    pub fn set_target(&mut self, key: K, target: f32) {
        match self.springs.get_mut(&key) {
            Some(spring) => {
                if spring.is_at_rest() && spring.value() == target {
                    return;
                }
                spring.set_target(target);
            }
            None => {
                self.springs.insert(key, Spring::new(self.config, target));
                return;
            }
        }
        self.rest_reported = false;
    }

    /// Jump one property to `value` with no motion
    pub fn snap(&mut self, key: &K, value: f32) {
        if let Some(spring) = self.springs.get_mut(key) {
            spring.snap(value);
        }
    }

    /// Snap every spring to its target
    pub fn finish(&mut self) {
        for spring in self.springs.values_mut() {
            let target = spring.target();
            spring.snap(target);
        }
    }

    pub fn on_rest<F>(&mut self, callback: F)
    where
        F: FnMut() + 'static,
    {
        self.on_rest = Some(Box::new(callback));
    }

    /// Advance every spring one frame
    ///
    /// Returns `true` only on the frame the group comes to rest.
    pub fn step(&mut self) -> bool {
        for spring in self.springs.values_mut() {
            spring.step();
        }
        if !self.rest_reported && self.is_at_rest() {
            self.rest_reported = true;
            if let Some(callback) = self.on_rest.as_mut() {
                callback();
            }
            return true;
        }
        false
    }

    pub fn is_at_rest(&self) -> bool {
        self.springs.values().all(Spring::is_at_rest)
    }

    /// Combined normalized distance traveled in `[0, 1]`
    pub fn progress(&self) -> f32 {
        let (traveled, total) = self
            .springs
            .values()
            .fold((0.0, 0.0), |(traveled, total), spring| {
                (
                    traveled + (spring.value() - spring.origin()).abs(),
                    total + (spring.target() - spring.origin()).abs(),
                )
            });
        if total == 0.0 {
            1.0
        } else {
            (traveled / total).clamp(0.0, 1.0)
        }
    }

    pub fn value(&self, key: &K) -> Option<f32> {
        self.springs.get(key).map(Spring::value)
    }

    pub fn get(&self, key: &K) -> Option<&Spring> {
        self.springs.get(key)
    }

    /// Current values in insertion order
    pub fn values(&self) -> impl Iterator<Item = (&K, f32)> {
        self.springs.iter().map(|(key, spring)| (key, spring.value()))
    }

    pub fn len(&self) -> usize {
        self.springs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.springs.is_empty()
    }

    pub fn config(&self) -> &SpringConfig {
        &self.config
    }
}
