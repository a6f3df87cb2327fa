//! Motion Animation
//!
//! Declarative entrance motion for UI elements, driven frame by frame.
//!
//! # Features
//!
//! - **Easing**: named curves with CSS timing-function output
//! - **Springs**: frame-stepped springs with rest detection and presets
//! - **Playback**: a clock-driven state machine with pause, seek, reverse and loop
//! - **Presets**: entrance types and composable fade/slide/scale/bounce effects
//! - **Descriptors**: serde-loadable motion descriptions resolved against config
//! - **Visibility Triggers**: viewport observers with thresholds and root margins
//! - **Stagger**: one trigger fanning out to N delayed items
//! - **Controllers**: timed and spring controllers publishing to a central store
//! - **Scheduler**: cancellable frame and timer callbacks

pub mod clock;
pub mod controller;
pub mod descriptor;
pub mod easing;
pub mod engine;
pub mod observer;
pub mod player;
pub mod presets;
pub mod scheduler;
pub mod spring;
pub mod stagger;

pub use clock::{Clock, ManualClock};
pub use controller::{MotionController, MotionRuntimeState, SpringController};
pub use descriptor::{
    compute, MotionDescriptor, MotionSource, Threshold, TimingDescriptor, TriggerDescriptor,
};
pub use easing::{CustomEasing, Easing};
pub use engine::{
    interpolate, Interpolate, Property, PropertyMap, PropertyValue, ResolvedMotion,
};
pub use observer::{ObserverOptions, ObserverStatus, TargetRef, VisibilityObserver};
pub use player::{MotionPlayer, PlayDirection, PlaybackState, PlayerConfig};
pub use presets::{
    BounceEffect, EffectSet, EntranceType, FadeEffect, ScaleEffect, SlideDirection, SlideEffect,
    DEFAULT_DISTANCE,
};
pub use scheduler::{FrameCallback, FrameId, FrameScheduler, SchedulerHandle, TimerId};
pub use spring::{RestCallback, Spring, SpringConfig, SpringGroup};
pub use stagger::{StaggerDirection, StaggerItem, StaggerOrchestrator, StaggerPlan};
