//! Entrance presets and effect descriptors
//!
//! Effects (`fade`, `slide`, `scale`, `bounce`) describe how an element
//! enters. Any combination may be given; they merge into one transform and
//! one opacity range. Entrance-type shorthand resolves to an [`EffectSet`]
//! first so both forms share one code path.

use crate::easing::{normalize, Easing};
use crate::engine::{Property, PropertyMap, PropertyValue};
use motion_core::{report_fallback, Transform2D};
use serde::{Deserialize, Serialize};

/// Slide distance in px when none is configured
pub const DEFAULT_DISTANCE: f32 = 20.0;

// ============================================================================
// Entrance types
// ============================================================================

/// Named entrance shorthand
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum EntranceType {
    #[default]
    FadeIn,
    SlideUp,
    SlideDown,
    SlideLeft,
    SlideRight,
    ScaleIn,
    BounceIn,
}

impl EntranceType {
    pub const ALL: [EntranceType; 7] = [
        EntranceType::FadeIn,
        EntranceType::SlideUp,
        EntranceType::SlideDown,
        EntranceType::SlideLeft,
        EntranceType::SlideRight,
        EntranceType::ScaleIn,
        EntranceType::BounceIn,
    ];

    pub fn name(self) -> &'static str {
        match self {
            EntranceType::FadeIn => "fadeIn",
            EntranceType::SlideUp => "slideUp",
            EntranceType::SlideDown => "slideDown",
            EntranceType::SlideLeft => "slideLeft",
            EntranceType::SlideRight => "slideRight",
            EntranceType::ScaleIn => "scaleIn",
            EntranceType::BounceIn => "bounceIn",
        }
    }

    /// Strictly parse an entrance name (`slideUp`, `slide-up`, `slide_up`, `scale`)
    pub fn parse(name: &str) -> Option<EntranceType> {
        let entrance = match normalize(name).as_str() {
            "fade" | "fadein" => EntranceType::FadeIn,
            "slideup" => EntranceType::SlideUp,
            "slidedown" => EntranceType::SlideDown,
            "slideleft" => EntranceType::SlideLeft,
            "slideright" => EntranceType::SlideRight,
            "scale" | "scalein" => EntranceType::ScaleIn,
            "bounce" | "bouncein" => EntranceType::BounceIn,
            _ => return None,
        };
        Some(entrance)
    }

    /// Resolve an entrance by name, falling back to fade
    pub fn from_name(name: &str) -> EntranceType {
        Self::parse(name).unwrap_or_else(|| {
            report_fallback("entrance", name, EntranceType::FadeIn.name());
            EntranceType::FadeIn
        })
    }

    /// Equivalent effect descriptors
    pub fn effects(self, distance: f32) -> EffectSet {
        let slide = |direction| EffectSet {
            slide: Some(SlideEffect {
                direction,
                distance,
            }),
            ..EffectSet::default()
        };
        match self {
            EntranceType::FadeIn => EffectSet::fade(),
            EntranceType::SlideUp => slide(SlideDirection::Up),
            EntranceType::SlideDown => slide(SlideDirection::Down),
            EntranceType::SlideLeft => slide(SlideDirection::Left),
            EntranceType::SlideRight => slide(SlideDirection::Right),
            EntranceType::ScaleIn => EffectSet {
                scale: Some(ScaleEffect::default()),
                ..EffectSet::default()
            },
            EntranceType::BounceIn => EffectSet {
                bounce: Some(BounceEffect::default()),
                ..EffectSet::default()
            },
        }
    }

    /// Easing this entrance uses when none is configured
    pub fn default_easing(self) -> Option<Easing> {
        match self {
            EntranceType::BounceIn => Some(Easing::EaseOutBack),
            _ => None,
        }
    }
}

impl Serialize for EntranceType {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

impl<'de> Deserialize<'de> for EntranceType {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        Ok(EntranceType::from_name(&name))
    }
}

// ============================================================================
// Effect descriptors
// ============================================================================

/// Opacity (and optional blur) transition
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FadeEffect {
    pub from: f32,
    pub to: f32,
    /// Starting blur radius in px, cleared as the element appears
    pub blur: Option<f32>,
}

impl Default for FadeEffect {
    fn default() -> Self {
        Self {
            from: 0.0,
            to: 1.0,
            blur: None,
        }
    }
}

/// Direction an element travels while sliding in
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SlideDirection {
    #[default]
    Up,
    Down,
    Left,
    Right,
}

impl SlideDirection {
    /// Hidden-state offset `(x, y)` for a slide of `distance` px
    ///
    /// The element starts displaced opposite to its travel and comes to
    /// rest at 0: sliding up starts below (`+y`), sliding left starts to the
    /// right (`+x`).
    pub fn offset(self, distance: f32) -> (f32, f32) {
        match self {
            SlideDirection::Up => (0.0, distance),
            SlideDirection::Down => (0.0, -distance),
            SlideDirection::Left => (distance, 0.0),
            SlideDirection::Right => (-distance, 0.0),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SlideEffect {
    pub direction: SlideDirection,
    pub distance: f32,
}

impl Default for SlideEffect {
    fn default() -> Self {
        Self {
            direction: SlideDirection::Up,
            distance: DEFAULT_DISTANCE,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScaleEffect {
    pub from: f32,
    pub to: f32,
}

impl Default for ScaleEffect {
    fn default() -> Self {
        Self { from: 0.95, to: 1.0 }
    }
}

/// Scale up from small with overshoot, optionally dropping in from above
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BounceEffect {
    pub scale: f32,
    /// Hidden vertical offset in px
    pub distance: f32,
}

impl Default for BounceEffect {
    fn default() -> Self {
        Self {
            scale: 0.3,
            distance: 0.0,
        }
    }
}

/// A combination of entrance effects
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EffectSet {
    pub fade: Option<FadeEffect>,
    pub slide: Option<SlideEffect>,
    pub scale: Option<ScaleEffect>,
    pub bounce: Option<BounceEffect>,
}

impl EffectSet {
    pub fn fade() -> Self {
        Self {
            fade: Some(FadeEffect::default()),
            ..Self::default()
        }
    }

    pub fn with_fade(mut self, fade: FadeEffect) -> Self {
        self.fade = Some(fade);
        self
    }

    pub fn with_slide(mut self, direction: SlideDirection, distance: f32) -> Self {
        self.slide = Some(SlideEffect {
            direction,
            distance,
        });
        self
    }

    pub fn with_scale(mut self, from: f32, to: f32) -> Self {
        self.scale = Some(ScaleEffect { from, to });
        self
    }

    pub fn with_bounce(mut self, bounce: BounceEffect) -> Self {
        self.bounce = Some(bounce);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.fade.is_none() && self.slide.is_none() && self.scale.is_none() && self.bounce.is_none()
    }

    /// Hidden and visible transforms with every effect combined
    pub fn transforms(&self) -> (Transform2D, Transform2D) {
        let mut hidden = Transform2D::IDENTITY;
        let mut visible = Transform2D::IDENTITY;

        if let Some(slide) = self.slide {
            let (x, y) = slide.direction.offset(slide.distance);
            hidden = hidden.then(&Transform2D::translate(x, y));
        }
        if let Some(scale) = self.scale {
            hidden = hidden.then(&Transform2D::scale(scale.from));
            visible = visible.then(&Transform2D::scale(scale.to));
        }
        if let Some(bounce) = self.bounce {
            hidden = hidden
                .then(&Transform2D::scale(bounce.scale))
                .then(&Transform2D::translate(0.0, -bounce.distance));
        }
        (hidden, visible)
    }

    /// Normalize into per-property ranges
    ///
    /// `opacity_target`, when given, overrides the visible opacity. An empty
    /// set behaves as a plain fade. Without a fade effect the hidden opacity
    /// is still 0.
    pub fn to_properties(&self, opacity_target: Option<f32>) -> PropertyMap {
        if self.is_empty() {
            return Self::fade().to_properties(opacity_target);
        }

        let (hidden, visible) = self.transforms();
        let (opacity_from, fade_to) = self
            .fade
            .map(|fade| (fade.from, fade.to))
            .unwrap_or((0.0, 1.0));
        let opacity_to = opacity_target.unwrap_or(fade_to);

        let mut map = PropertyMap::new();
        map.insert(
            Property::Opacity,
            PropertyValue::range(opacity_from, opacity_to),
        );

        let ranges = [
            (Property::TranslateX, hidden.translate_x, visible.translate_x),
            (Property::TranslateY, hidden.translate_y, visible.translate_y),
            (Property::Scale, hidden.scale, visible.scale),
            (Property::Rotate, hidden.rotate, visible.rotate),
        ];
        for (property, from, to) in ranges {
            let identity = property.identity();
            if from != identity || to != identity {
                map.insert(property, PropertyValue::range(from, to));
            }
        }

        if let Some(blur) = self.fade.and_then(|fade| fade.blur).filter(|b| *b > 0.0) {
            map.insert(Property::Blur, PropertyValue::range(blur, 0.0));
        }
        map
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::interpolate;

    fn hidden(set: &EffectSet) -> motion_core::VisualState {
        interpolate(&set.to_properties(None), 0.0)
    }

    fn visible(set: &EffectSet) -> motion_core::VisualState {
        interpolate(&set.to_properties(None), 1.0)
    }

    #[test]
    fn test_every_entrance_hides_and_shows() {
        for entrance in EntranceType::ALL {
            let set = entrance.effects(DEFAULT_DISTANCE);
            assert_eq!(hidden(&set).opacity, 0.0, "{entrance:?}");
            assert_eq!(visible(&set).opacity, 1.0, "{entrance:?}");
            assert!(visible(&set).transform.is_identity(), "{entrance:?}");
        }
    }

    #[test]
    fn test_opacity_target_overrides_visible_opacity() {
        for entrance in EntranceType::ALL {
            let map = entrance.effects(DEFAULT_DISTANCE).to_properties(Some(0.6));
            assert_eq!(interpolate(&map, 0.0).opacity, 0.0);
            assert!((interpolate(&map, 1.0).opacity - 0.6).abs() < 1e-6);
        }
    }

    #[test]
    fn test_slide_direction_table() {
        let css = |entrance: EntranceType| hidden(&entrance.effects(30.0)).transform.to_css();
        assert_eq!(css(EntranceType::SlideUp), "translateY(30px)");
        assert_eq!(css(EntranceType::SlideDown), "translateY(-30px)");
        assert_eq!(css(EntranceType::SlideLeft), "translateX(30px)");
        assert_eq!(css(EntranceType::SlideRight), "translateX(-30px)");
    }

    #[test]
    fn test_effects_combine_into_one_transform() {
        let set = EffectSet::default()
            .with_slide(SlideDirection::Up, 40.0)
            .with_scale(0.5, 1.0)
            .with_bounce(BounceEffect {
                scale: 0.8,
                distance: 10.0,
            });
        let state = hidden(&set);
        assert_eq!(state.transform.translate_y, 30.0);
        assert!((state.transform.scale - 0.4).abs() < 1e-6);
        assert_eq!(state.opacity, 0.0);
    }

    #[test]
    fn test_fade_from_is_respected() {
        let set = EffectSet::default()
            .with_fade(FadeEffect {
                from: 0.3,
                to: 0.9,
                blur: Some(8.0),
            })
            .with_slide(SlideDirection::Left, 12.0);
        let start = hidden(&set);
        assert!((start.opacity - 0.3).abs() < 1e-6);
        assert_eq!(start.filter_css().as_deref(), Some("blur(8px)"));

        let end = visible(&set);
        assert!((end.opacity - 0.9).abs() < 1e-6);
        assert_eq!(end.filter_css(), None);
    }

    #[test]
    fn test_empty_set_is_fade() {
        assert_eq!(
            EffectSet::default().to_properties(None),
            EffectSet::fade().to_properties(None)
        );
    }

    #[test]
    fn test_scale_entrance_properties() {
        let map = EntranceType::ScaleIn.effects(DEFAULT_DISTANCE).to_properties(None);
        assert_eq!(map.len(), 2);
        assert_eq!(map[&Property::Scale], PropertyValue::range(0.95, 1.0));
    }

    #[test]
    fn test_entrance_names() {
        assert_eq!(EntranceType::parse("slide-up"), Some(EntranceType::SlideUp));
        assert_eq!(EntranceType::parse("bounce"), Some(EntranceType::BounceIn));
        assert_eq!(EntranceType::from_name("zoomIn"), EntranceType::FadeIn);
        for entrance in EntranceType::ALL {
            assert_eq!(EntranceType::parse(entrance.name()), Some(entrance));
        }
    }

    #[test]
    fn test_entrance_serde_by_name() {
        let json = serde_json::to_string(&EntranceType::SlideLeft).unwrap();
        assert_eq!(json, r#""slideLeft""#);
        let parsed: EntranceType = serde_json::from_str(r#""unknown""#).unwrap();
        assert_eq!(parsed, EntranceType::FadeIn);
    }

    #[test]
    fn test_effect_set_deserializes_partial() {
        let set: EffectSet =
            toml::from_str("[slide]\ndirection = \"left\"\n\n[scale]\nfrom = 0.8\n").unwrap();
        assert_eq!(set.fade, None);
        assert_eq!(
            set.slide,
            Some(SlideEffect {
                direction: SlideDirection::Left,
                distance: DEFAULT_DISTANCE
            })
        );
        assert_eq!(set.scale, Some(ScaleEffect { from: 0.8, to: 1.0 }));
    }

    #[test]
    fn test_bounce_default_easing() {
        assert_eq!(EntranceType::BounceIn.default_easing(), Some(Easing::EaseOutBack));
        assert_eq!(EntranceType::FadeIn.default_easing(), None);
    }
}
