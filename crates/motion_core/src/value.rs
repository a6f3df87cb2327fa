//! Visual property vector produced by the motion engine
//!
//! A [`VisualState`] is what a consumer applies to a rendered element each
//! frame: opacity, a transform made of translate/scale/rotate components, a
//! blur filter, and metadata describing the running motion. [`MotionValues`]
//! is the partial form used for merging updates into the central store.

use serde::{Deserialize, Serialize};
use std::fmt::Write as _;

// ─────────────────────────────────────────────────────────────────────────────
// Transform components
// ─────────────────────────────────────────────────────────────────────────────

/// Decomposed 2D transform: translation in px, uniform scale, rotation in degrees
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Transform2D {
    pub translate_x: f32,
    pub translate_y: f32,
    pub scale: f32,
    pub rotate: f32,
}

impl Transform2D {
    pub const IDENTITY: Transform2D = Transform2D {
        translate_x: 0.0,
        translate_y: 0.0,
        scale: 1.0,
        rotate: 0.0,
    };

    pub fn translate(x: f32, y: f32) -> Self {
        Self {
            translate_x: x,
            translate_y: y,
            ..Self::IDENTITY
        }
    }

    pub fn scale(scale: f32) -> Self {
        Self {
            scale,
            ..Self::IDENTITY
        }
    }

    pub fn rotate(degrees: f32) -> Self {
        Self {
            rotate: degrees,
            ..Self::IDENTITY
        }
    }

    /// Combine two transforms: translations and rotations add, scales multiply
    pub fn then(&self, other: &Transform2D) -> Transform2D {
        Transform2D {
            translate_x: self.translate_x + other.translate_x,
            translate_y: self.translate_y + other.translate_y,
            scale: self.scale * other.scale,
            rotate: self.rotate + other.rotate,
        }
    }

    pub fn is_identity(&self) -> bool {
        self.translate_x == 0.0
            && self.translate_y == 0.0
            && self.scale == 1.0
            && self.rotate == 0.0
    }

    /// Render as a CSS transform list
    ///
    /// Components are always emitted in translate, scale, rotate order;
    /// identity components are skipped and a full identity renders as `none`.
    pub fn to_css(&self) -> String {
        let mut out = String::new();
        if self.translate_x != 0.0 {
            push_component(&mut out, "translateX", self.translate_x, "px");
        }
        if self.translate_y != 0.0 {
            push_component(&mut out, "translateY", self.translate_y, "px");
        }
        if self.scale != 1.0 {
            push_component(&mut out, "scale", self.scale, "");
        }
        if self.rotate != 0.0 {
            push_component(&mut out, "rotate", self.rotate, "deg");
        }
        if out.is_empty() {
            out.push_str("none");
        }
        out
    }
}

impl Default for Transform2D {
    fn default() -> Self {
        Self::IDENTITY
    }
}

fn push_component(out: &mut String, name: &str, value: f32, unit: &str) {
    if !out.is_empty() {
        out.push(' ');
    }
    let _ = write!(out, "{}({}{})", name, format_number(value), unit);
}

/// Format a number for CSS output without trailing zeros or negative zero
pub fn format_number(value: f32) -> String {
    let rounded = (value * 1000.0).round() / 1000.0;
    // -0.0 + 0.0 == +0.0
    format!("{}", rounded + 0.0)
}

// ─────────────────────────────────────────────────────────────────────────────
// Motion metadata
// ─────────────────────────────────────────────────────────────────────────────

/// Diagnostic metadata attached to every visual state
///
/// Exposed to consumers as CSS custom properties via [`MotionVars::css_variables`].
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MotionVars {
    pub delay_ms: u32,
    pub duration_ms: u32,
    /// CSS timing function equivalent of the active easing
    pub easing: String,
    /// Normalized progress in [0, 1]
    pub progress: f32,
}

impl MotionVars {
    pub fn css_variables(&self) -> [(&'static str, String); 4] {
        [
            ("--motion-delay", format!("{}ms", self.delay_ms)),
            ("--motion-duration", format!("{}ms", self.duration_ms)),
            ("--motion-easing", self.easing.clone()),
            ("--motion-progress", format_number(self.progress)),
        ]
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Visual state
// ─────────────────────────────────────────────────────────────────────────────

/// The full visual-property vector for one element at one instant
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VisualState {
    pub opacity: f32,
    pub transform: Transform2D,
    /// Gaussian blur radius in px (0 = no filter)
    pub blur: f32,
    pub vars: MotionVars,
}

impl VisualState {
    /// Fully visible, untransformed state
    pub fn visible() -> Self {
        Self {
            opacity: 1.0,
            transform: Transform2D::IDENTITY,
            blur: 0.0,
            vars: MotionVars::default(),
        }
    }

    /// Transparent, untransformed state
    pub fn hidden() -> Self {
        Self {
            opacity: 0.0,
            ..Self::visible()
        }
    }

    pub fn with_vars(mut self, vars: MotionVars) -> Self {
        self.vars = vars;
        self
    }

    pub fn transform_css(&self) -> String {
        self.transform.to_css()
    }

    /// CSS filter value, `None` when no filter applies
    pub fn filter_css(&self) -> Option<String> {
        if self.blur > 0.0 {
            Some(format!("blur({}px)", format_number(self.blur)))
        } else {
            None
        }
    }
}

impl Default for VisualState {
    fn default() -> Self {
        Self::visible()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Partial values
// ─────────────────────────────────────────────────────────────────────────────

/// A partial set of visual values; `None` fields are left untouched on merge
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MotionValues {
    pub opacity: Option<f32>,
    pub translate_x: Option<f32>,
    pub translate_y: Option<f32>,
    pub scale: Option<f32>,
    pub rotate: Option<f32>,
    pub blur: Option<f32>,
    pub progress: Option<f32>,
}

impl MotionValues {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_opacity(mut self, opacity: f32) -> Self {
        self.opacity = Some(opacity);
        self
    }

    pub fn with_translate(mut self, x: f32, y: f32) -> Self {
        self.translate_x = Some(x);
        self.translate_y = Some(y);
        self
    }

    pub fn with_translate_y(mut self, y: f32) -> Self {
        self.translate_y = Some(y);
        self
    }

    pub fn with_scale(mut self, scale: f32) -> Self {
        self.scale = Some(scale);
        self
    }

    pub fn with_rotate(mut self, degrees: f32) -> Self {
        self.rotate = Some(degrees);
        self
    }

    pub fn with_blur(mut self, blur: f32) -> Self {
        self.blur = Some(blur);
        self
    }

    pub fn with_progress(mut self, progress: f32) -> Self {
        self.progress = Some(progress);
        self
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

impl From<&VisualState> for MotionValues {
    fn from(state: &VisualState) -> Self {
        Self {
            opacity: Some(state.opacity),
            translate_x: Some(state.transform.translate_x),
            translate_y: Some(state.transform.translate_y),
            scale: Some(state.transform.scale),
            rotate: Some(state.transform.rotate),
            blur: Some(state.blur),
            progress: Some(state.vars.progress),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transform_css() {
        assert_eq!(Transform2D::IDENTITY.to_css(), "none");
        assert_eq!(
            Transform2D::translate(0.0, -30.0).to_css(),
            "translateY(-30px)"
        );

        let combined = Transform2D::translate(12.5, 20.0)
            .then(&Transform2D::scale(0.95))
            .then(&Transform2D::rotate(-5.0));
        assert_eq!(
            combined.to_css(),
            "translateX(12.5px) translateY(20px) scale(0.95) rotate(-5deg)"
        );
    }

    #[test]
    fn test_transform_composition() {
        let a = Transform2D {
            translate_x: 10.0,
            translate_y: 5.0,
            scale: 0.5,
            rotate: 10.0,
        };
        let b = Transform2D {
            translate_x: -4.0,
            translate_y: 5.0,
            scale: 0.5,
            rotate: 5.0,
        };
        let c = a.then(&b);
        assert_eq!(c.translate_x, 6.0);
        assert_eq!(c.translate_y, 10.0);
        assert_eq!(c.scale, 0.25);
        assert_eq!(c.rotate, 15.0);
    }

    #[test]
    fn test_format_number_normalizes() {
        assert_eq!(format_number(-0.0), "0");
        assert_eq!(format_number(1.0), "1");
        assert_eq!(format_number(0.333_333), "0.333");
    }

    #[test]
    fn test_filter_css() {
        let mut state = VisualState::visible();
        assert_eq!(state.filter_css(), None);
        state.blur = 4.0;
        assert_eq!(state.filter_css().as_deref(), Some("blur(4px)"));
    }

    #[test]
    fn test_css_variables() {
        let vars = MotionVars {
            delay_ms: 100,
            duration_ms: 600,
            easing: "ease-out".into(),
            progress: 0.5,
        };
        let css = vars.css_variables();
        assert_eq!(css[0], ("--motion-delay", "100ms".to_string()));
        assert_eq!(css[1], ("--motion-duration", "600ms".to_string()));
        assert_eq!(css[2], ("--motion-easing", "ease-out".to_string()));
        assert_eq!(css[3], ("--motion-progress", "0.5".to_string()));
    }

    #[test]
    fn test_values_from_state() {
        let mut state = VisualState::hidden();
        state.transform.translate_y = 20.0;
        let values = MotionValues::from(&state);
        assert_eq!(values.opacity, Some(0.0));
        assert_eq!(values.translate_y, Some(20.0));
        assert_eq!(values.scale, Some(1.0));
        assert!(!values.is_empty());
        assert!(MotionValues::new().is_empty());
    }
}
