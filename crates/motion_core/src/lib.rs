//! Motion Core
//!
//! Foundational types shared by the motion engine and its consumers:
//!
//! - **Visual State**: the per-frame property vector (opacity, transform, filter, metadata)
//! - **Central Store**: keyed per-element motion state with OR-combined visibility and subscriptions
//! - **Configuration**: TOML-loadable engine defaults
//! - **Geometry**: rectangles and margins for visibility testing

pub mod config;
pub mod error;
pub mod geometry;
pub mod store;
pub mod value;

pub use config::{
    FrameConfig, MotionConfig, SpringSettings, StoreDefaults, TimingConfig, TriggerConfig,
};
pub use error::{report_fallback, MotionError, Result};
pub use geometry::{Margins, Rect};
pub use store::{ListenerId, MotionEntry, MotionStore, Subscription};
pub use value::{format_number, MotionValues, MotionVars, Transform2D, VisualState};
