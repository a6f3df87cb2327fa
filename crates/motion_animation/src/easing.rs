//! Easing functions
//!
//! Pure curves mapping linear progress in `[0, 1]` to eased progress. Named
//! curves clamp their input; custom functions are passed through untouched.
//!
//! Easings are usually referenced by name in descriptors. [`Easing::from_name`]
//! accepts camelCase (`easeOutCubic`), kebab-case (`ease-out-cubic`) and CSS
//! `cubic-bezier(x1, y1, x2, y2)` forms. Unknown names never fail; they
//! resolve through a fallback table and log a warning in debug builds.

use motion_core::report_fallback;
use std::fmt;
use std::sync::Arc;

/// A user-supplied easing curve
#[derive(Clone)]
pub struct CustomEasing {
    name: Arc<str>,
    curve: Arc<dyn Fn(f32) -> f32 + Send + Sync>,
}

impl CustomEasing {
    pub fn new<F>(name: &str, curve: F) -> Self
    where
        F: Fn(f32) -> f32 + Send + Sync + 'static,
    {
        Self {
            name: Arc::from(name),
            curve: Arc::new(curve),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Debug for CustomEasing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("CustomEasing").field(&self.name).finish()
    }
}

impl PartialEq for CustomEasing {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.curve, &other.curve)
    }
}

/// Easing curve applied to animation progress
#[derive(Clone, Debug, Default, PartialEq)]
pub enum Easing {
    Linear,
    /// CSS `ease`
    Ease,
    EaseIn,
    #[default]
    EaseOut,
    EaseInOut,
    EaseInCubic,
    EaseOutCubic,
    EaseInOutCubic,
    EaseInQuart,
    EaseOutQuart,
    EaseInOutQuart,
    /// Overshoots the target slightly before settling
    EaseOutBack,
    EaseOutElastic,
    EaseOutBounce,
    /// CSS `cubic-bezier(x1, y1, x2, y2)`
    CubicBezier(f32, f32, f32, f32),
    Custom(CustomEasing),
}

impl Easing {
    /// Wrap an arbitrary curve
    pub fn custom<F>(name: &str, curve: F) -> Self
    where
        F: Fn(f32) -> f32 + Send + Sync + 'static,
    {
        Easing::Custom(CustomEasing::new(name, curve))
    }

    /// Apply the easing to linear progress `t`
    pub fn apply(&self, t: f32) -> f32 {
        match self {
            Easing::Custom(custom) => (custom.curve)(t),
            named => named.apply_named(t.clamp(0.0, 1.0)),
        }
    }

    fn apply_named(&self, t: f32) -> f32 {
        match self {
            Easing::Linear | Easing::Custom(_) => t,
            Easing::Ease => cubic_bezier(0.25, 0.1, 0.25, 1.0, t),
            Easing::EaseIn => t * t,
            Easing::EaseOut => t * (2.0 - t),
            Easing::EaseInOut => {
                if t < 0.5 {
                    2.0 * t * t
                } else {
                    -1.0 + (4.0 - 2.0 * t) * t
                }
            }
            Easing::EaseInCubic => t * t * t,
            Easing::EaseOutCubic => {
                let inv = 1.0 - t;
                1.0 - inv * inv * inv
            }
            Easing::EaseInOutCubic => {
                if t < 0.5 {
                    4.0 * t * t * t
                } else {
                    let f = -2.0 * t + 2.0;
                    1.0 - f * f * f / 2.0
                }
            }
            Easing::EaseInQuart => t * t * t * t,
            Easing::EaseOutQuart => {
                let inv = 1.0 - t;
                1.0 - inv * inv * inv * inv
            }
            Easing::EaseInOutQuart => {
                if t < 0.5 {
                    8.0 * t * t * t * t
                } else {
                    let f = -2.0 * t + 2.0;
                    1.0 - f * f * f * f / 2.0
                }
            }
            Easing::EaseOutBack => {
                const C1: f32 = 1.70158;
                const C3: f32 = C1 + 1.0;
                let f = t - 1.0;
                1.0 + C3 * f * f * f + C1 * f * f
            }
            Easing::EaseOutElastic => {
                if t <= 0.0 || t >= 1.0 {
                    return t;
                }
                let c4 = (2.0 * std::f32::consts::PI) / 3.0;
                2.0_f32.powf(-10.0 * t) * ((t * 10.0 - 0.75) * c4).sin() + 1.0
            }
            Easing::EaseOutBounce => bounce_out(t),
            Easing::CubicBezier(x1, y1, x2, y2) => cubic_bezier(*x1, *y1, *x2, *y2, t),
        }
    }

    /// Resolve an easing by name, falling back for unknown names
    pub fn from_name(name: &str) -> Easing {
        match Self::parse(name) {
            Some(easing) => easing,
            None => {
                let fallback = fallback_for(name);
                report_fallback("easing", name, &fallback.name());
                fallback
            }
        }
    }

    /// Strictly parse an easing name, `None` if unrecognized
    pub fn parse(name: &str) -> Option<Easing> {
        let trimmed = name.trim();
        if let Some(args) = trimmed
            .strip_prefix("cubic-bezier(")
            .and_then(|rest| rest.strip_suffix(')'))
        {
            return parse_bezier_args(args);
        }

        let easing = match normalize(trimmed).as_str() {
            "linear" => Easing::Linear,
            "ease" => Easing::Ease,
            "easein" => Easing::EaseIn,
            "easeout" => Easing::EaseOut,
            "easeinout" => Easing::EaseInOut,
            "easeincubic" => Easing::EaseInCubic,
            "easeoutcubic" => Easing::EaseOutCubic,
            "easeinoutcubic" => Easing::EaseInOutCubic,
            "easeinquart" => Easing::EaseInQuart,
            "easeoutquart" => Easing::EaseOutQuart,
            "easeinoutquart" => Easing::EaseInOutQuart,
            "easeoutback" => Easing::EaseOutBack,
            "easeoutelastic" => Easing::EaseOutElastic,
            "easeoutbounce" => Easing::EaseOutBounce,
            _ => return None,
        };
        Some(easing)
    }

    /// Canonical camelCase name
    pub fn name(&self) -> String {
        match self {
            Easing::Linear => "linear".into(),
            Easing::Ease => "ease".into(),
            Easing::EaseIn => "easeIn".into(),
            Easing::EaseOut => "easeOut".into(),
            Easing::EaseInOut => "easeInOut".into(),
            Easing::EaseInCubic => "easeInCubic".into(),
            Easing::EaseOutCubic => "easeOutCubic".into(),
            Easing::EaseInOutCubic => "easeInOutCubic".into(),
            Easing::EaseInQuart => "easeInQuart".into(),
            Easing::EaseOutQuart => "easeOutQuart".into(),
            Easing::EaseInOutQuart => "easeInOutQuart".into(),
            Easing::EaseOutBack => "easeOutBack".into(),
            Easing::EaseOutElastic => "easeOutElastic".into(),
            Easing::EaseOutBounce => "easeOutBounce".into(),
            Easing::CubicBezier(..) => self.to_css(),
            Easing::Custom(custom) => custom.name().to_string(),
        }
    }

    /// CSS timing function equivalent
    ///
    /// Curves with no CSS equivalent (elastic, bounce, custom) report their
    /// engine name instead.
    pub fn to_css(&self) -> String {
        match self {
            Easing::Linear => "linear".into(),
            Easing::Ease => "ease".into(),
            Easing::EaseIn => bezier_css(0.55, 0.085, 0.68, 0.53),
            Easing::EaseOut => bezier_css(0.25, 0.46, 0.45, 0.94),
            Easing::EaseInOut => bezier_css(0.455, 0.03, 0.515, 0.955),
            Easing::EaseInCubic => bezier_css(0.32, 0.0, 0.67, 0.0),
            Easing::EaseOutCubic => bezier_css(0.33, 1.0, 0.68, 1.0),
            Easing::EaseInOutCubic => bezier_css(0.65, 0.0, 0.35, 1.0),
            Easing::EaseInQuart => bezier_css(0.5, 0.0, 0.75, 0.0),
            Easing::EaseOutQuart => bezier_css(0.25, 1.0, 0.5, 1.0),
            Easing::EaseInOutQuart => bezier_css(0.76, 0.0, 0.24, 1.0),
            Easing::EaseOutBack => bezier_css(0.34, 1.56, 0.64, 1.0),
            Easing::CubicBezier(x1, y1, x2, y2) => bezier_css(*x1, *y1, *x2, *y2),
            Easing::EaseOutElastic | Easing::EaseOutBounce | Easing::Custom(_) => self.name(),
        }
    }
}

impl From<Easing> for String {
    fn from(easing: Easing) -> Self {
        easing.name()
    }
}

impl From<String> for Easing {
    fn from(name: String) -> Self {
        Easing::from_name(&name)
    }
}

impl From<&str> for Easing {
    fn from(name: &str) -> Self {
        Easing::from_name(name)
    }
}

impl serde::Serialize for Easing {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.name())
    }
}

impl<'de> serde::Deserialize<'de> for Easing {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        Ok(Easing::from_name(&name))
    }
}

/// Lowercase and strip separators: `ease-in-out`, `ease_in_out`, `easeInOut` → `easeinout`
pub(crate) fn normalize(name: &str) -> String {
    name.chars()
        .filter(|c| !matches!(c, '-' | '_' | ' '))
        .flat_map(char::to_lowercase)
        .collect()
}

/// Fallback table for unknown names
///
/// Families map to their nearest supported member, everything else to `EaseOut`.
fn fallback_for(name: &str) -> Easing {
    let key = normalize(name);
    if key.contains("bounce") {
        Easing::EaseOutBounce
    } else if key.contains("elastic") {
        Easing::EaseOutElastic
    } else if key.contains("back") || key.contains("spring") {
        Easing::EaseOutBack
    } else if key.contains("inout") {
        Easing::EaseInOutCubic
    } else if key.contains("easein") {
        Easing::EaseInCubic
    } else if key.contains("easeout") {
        Easing::EaseOutCubic
    } else {
        Easing::EaseOut
    }
}

fn parse_bezier_args(args: &str) -> Option<Easing> {
    let values = args
        .split(',')
        .map(|v| v.trim().parse::<f32>().ok().filter(|v| v.is_finite()))
        .collect::<Option<Vec<f32>>>()?;
    match values.as_slice() {
        // x control points must stay within [0, 1] for the curve to be a function
        [x1, y1, x2, y2] if (0.0..=1.0).contains(x1) && (0.0..=1.0).contains(x2) => {
            Some(Easing::CubicBezier(*x1, *y1, *x2, *y2))
        }
        _ => None,
    }
}

fn bezier_css(x1: f32, y1: f32, x2: f32, y2: f32) -> String {
    use motion_core::format_number as n;
    format!(
        "cubic-bezier({}, {}, {}, {})",
        n(x1),
        n(y1),
        n(x2),
        n(y2)
    )
}

fn bounce_out(t: f32) -> f32 {
    const N1: f32 = 7.5625;
    const D1: f32 = 2.75;

    if t < 1.0 / D1 {
        N1 * t * t
    } else if t < 2.0 / D1 {
        let t = t - 1.5 / D1;
        N1 * t * t + 0.75
    } else if t < 2.5 / D1 {
        let t = t - 2.25 / D1;
        N1 * t * t + 0.9375
    } else {
        let t = t - 2.625 / D1;
        N1 * t * t + 0.984375
    }
}

/// Evaluate a CSS cubic-bezier timing function at `x`
///
/// Solves for the curve parameter with Newton-Raphson, falling back to
/// bisection when the slope is too flat.
fn cubic_bezier(x1: f32, y1: f32, x2: f32, y2: f32, x: f32) -> f32 {
    if x <= 0.0 {
        return 0.0;
    }
    if x >= 1.0 {
        return 1.0;
    }

    let cx = 3.0 * x1;
    let bx = 3.0 * (x2 - x1) - cx;
    let ax = 1.0 - cx - bx;
    let cy = 3.0 * y1;
    let by = 3.0 * (y2 - y1) - cy;
    let ay = 1.0 - cy - by;

    let sample_x = |t: f32| ((ax * t + bx) * t + cx) * t;
    let sample_y = |t: f32| ((ay * t + by) * t + cy) * t;
    let slope_x = |t: f32| (3.0 * ax * t + 2.0 * bx) * t + cx;

    let mut t = x;
    for _ in 0..8 {
        let err = sample_x(t) - x;
        if err.abs() < 1e-6 {
            return sample_y(t);
        }
        let slope = slope_x(t);
        if slope.abs() < 1e-6 {
            break;
        }
        t -= err / slope;
    }

    let (mut lo, mut hi) = (0.0_f32, 1.0_f32);
    t = x;
    for _ in 0..32 {
        let current = sample_x(t);
        if (current - x).abs() < 1e-6 {
            break;
        }
        if current < x {
            lo = t;
        } else {
            hi = t;
        }
        t = (lo + hi) / 2.0;
    }
    sample_y(t)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn all_named() -> Vec<Easing> {
        vec![
            Easing::Linear,
            Easing::Ease,
            Easing::EaseIn,
            Easing::EaseOut,
            Easing::EaseInOut,
            Easing::EaseInCubic,
            Easing::EaseOutCubic,
            Easing::EaseInOutCubic,
            Easing::EaseInQuart,
            Easing::EaseOutQuart,
            Easing::EaseInOutQuart,
            Easing::EaseOutBack,
            Easing::EaseOutElastic,
            Easing::EaseOutBounce,
            Easing::CubicBezier(0.4, 0.0, 0.2, 1.0),
        ]
    }

    #[test]
    fn test_easing_boundaries() {
        for easing in all_named() {
            assert!(easing.apply(0.0).abs() < 1e-3, "{:?} at t=0", easing);
            assert!((easing.apply(1.0) - 1.0).abs() < 1e-3, "{:?} at t=1", easing);
        }
    }

    #[test]
    fn test_input_is_clamped() {
        for easing in all_named() {
            assert_eq!(easing.apply(-0.5), easing.apply(0.0), "{:?}", easing);
            assert_eq!(easing.apply(1.5), easing.apply(1.0), "{:?}", easing);
        }
    }

    #[test]
    fn test_monotonic_curves() {
        for easing in [
            Easing::Linear,
            Easing::EaseIn,
            Easing::EaseOut,
            Easing::EaseInOut,
            Easing::EaseInCubic,
            Easing::EaseOutCubic,
            Easing::EaseOutQuart,
            Easing::Ease,
        ] {
            let mut prev = 0.0;
            for i in 0..=20 {
                let v = easing.apply(i as f32 / 20.0);
                assert!(v + 1e-5 >= prev, "{:?} not monotonic at step {}", easing, i);
                prev = v;
            }
        }
    }

    #[test]
    fn test_back_overshoots() {
        let peak = (0..=100)
            .map(|i| Easing::EaseOutBack.apply(i as f32 / 100.0))
            .fold(f32::MIN, f32::max);
        assert!(peak > 1.0);
    }

    #[test]
    fn test_bezier_matches_linear() {
        let linear = Easing::CubicBezier(0.0, 0.0, 1.0, 1.0);
        for i in 0..=10 {
            let t = i as f32 / 10.0;
            assert!((linear.apply(t) - t).abs() < 1e-3);
        }
    }

    #[test]
    fn test_custom_is_passed_through() {
        let easing = Easing::custom("double", |t| t * 2.0);
        assert_eq!(easing.apply(0.75), 1.5);
        assert_eq!(easing.apply(-1.0), -2.0);
        assert_eq!(easing.name(), "double");
    }

    #[test]
    fn test_name_resolution() {
        assert_eq!(Easing::from_name("linear"), Easing::Linear);
        assert_eq!(Easing::from_name("easeInOut"), Easing::EaseInOut);
        assert_eq!(Easing::from_name("ease-in-out"), Easing::EaseInOut);
        assert_eq!(Easing::from_name("ease_out_cubic"), Easing::EaseOutCubic);
        assert_eq!(
            Easing::from_name("cubic-bezier(0.4, 0, 0.2, 1)"),
            Easing::CubicBezier(0.4, 0.0, 0.2, 1.0)
        );
    }

    #[test]
    fn test_unknown_names_fall_back() {
        assert_eq!(Easing::from_name("wiggle"), Easing::EaseOut);
        assert_eq!(Easing::from_name("easeInOutSine"), Easing::EaseInOutCubic);
        assert_eq!(Easing::from_name("easeInExpo"), Easing::EaseInCubic);
        assert_eq!(Easing::from_name("easeOutCirc"), Easing::EaseOutCubic);
        assert_eq!(Easing::from_name("easeInBounce"), Easing::EaseOutBounce);
        assert_eq!(Easing::from_name("spring"), Easing::EaseOutBack);
        // x control points outside [0, 1] are rejected
        assert_eq!(Easing::from_name("cubic-bezier(1.5, 0, 0, 1)"), Easing::EaseOut);
        assert!(Easing::parse("wiggle").is_none());
    }

    #[test]
    fn test_css_output() {
        assert_eq!(Easing::Linear.to_css(), "linear");
        assert_eq!(
            Easing::EaseOutCubic.to_css(),
            "cubic-bezier(0.33, 1, 0.68, 1)"
        );
        assert_eq!(Easing::EaseOutBounce.to_css(), "easeOutBounce");
    }

    #[test]
    fn test_serde_by_name() {
        let json = serde_json::to_string(&Easing::EaseInOut).unwrap();
        assert_eq!(json, "\"easeInOut\"");
        let parsed: Easing = serde_json::from_str("\"ease-out-back\"").unwrap();
        assert_eq!(parsed, Easing::EaseOutBack);
        let fallback: Easing = serde_json::from_str("\"nope\"").unwrap();
        assert_eq!(fallback, Easing::EaseOut);
    }
}
