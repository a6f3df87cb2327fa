//! Geometry primitives for visibility tests
//!
//! Only what intersection testing needs: an axis-aligned rectangle and
//! CSS-style margins used to grow or shrink the observation root.

use serde::{Deserialize, Serialize};

/// An axis-aligned rectangle in viewport coordinates
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub const ZERO: Rect = Rect {
        x: 0.0,
        y: 0.0,
        width: 0.0,
        height: 0.0,
    };

    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    /// Area of the rectangle, zero for degenerate rectangles
    pub fn area(&self) -> f32 {
        self.width.max(0.0) * self.height.max(0.0)
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }

    /// Overlapping region of two rectangles, if any
    pub fn intersection(&self, other: &Rect) -> Option<Rect> {
        let x = self.x.max(other.x);
        let y = self.y.max(other.y);
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());

        if right < x || bottom < y {
            return None;
        }

        Some(Rect::new(x, y, right - x, bottom - y))
    }

    /// Grow the rectangle by the given margins (negative margins shrink it)
    pub fn inflate(&self, margins: &Margins) -> Rect {
        Rect::new(
            self.x - margins.left,
            self.y - margins.top,
            (self.width + margins.left + margins.right).max(0.0),
            (self.height + margins.top + margins.bottom).max(0.0),
        )
    }

    /// Translate the rectangle
    pub fn offset(&self, dx: f32, dy: f32) -> Rect {
        Rect::new(self.x + dx, self.y + dy, self.width, self.height)
    }
}

/// Margins around a rectangle, in pixels
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Margins {
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
    pub left: f32,
}

impl Margins {
    pub const ZERO: Margins = Margins {
        top: 0.0,
        right: 0.0,
        bottom: 0.0,
        left: 0.0,
    };

    pub const fn new(top: f32, right: f32, bottom: f32, left: f32) -> Self {
        Self {
            top,
            right,
            bottom,
            left,
        }
    }

    pub const fn uniform(value: f32) -> Self {
        Self::new(value, value, value, value)
    }

    /// Parse a CSS margin shorthand such as `"10px"`, `"0px 20px"` or
    /// `"0 0 -50px 0"`.
    ///
    /// Accepts one to four pixel (or unitless) lengths with the usual CSS
    /// expansion rules. Percentages and other units are rejected.
    pub fn from_css(input: &str) -> Option<Margins> {
        let values = input
            .split_whitespace()
            .map(parse_px)
            .collect::<Option<Vec<f32>>>()?;

        match values.as_slice() {
            [all] => Some(Margins::uniform(*all)),
            [vertical, horizontal] => Some(Margins::new(
                *vertical,
                *horizontal,
                *vertical,
                *horizontal,
            )),
            [top, horizontal, bottom] => {
                Some(Margins::new(*top, *horizontal, *bottom, *horizontal))
            }
            [top, right, bottom, left] => Some(Margins::new(*top, *right, *bottom, *left)),
            _ => None,
        }
    }
}

fn parse_px(token: &str) -> Option<f32> {
    let number = token.strip_suffix("px").unwrap_or(token);
    number.parse::<f32>().ok().filter(|v| v.is_finite())
}
