//! Shake gesture detection for the Tapp client.
//!
//! A [`shake::ShakeDetector`] feeds accelerometer samples from a
//! [`shake::MotionSource`] through the shake classifier and broadcasts each
//! detected shake on a [`shake::ShakeEventChannel`]. The group screen's
//! [`shake::ShakeTappLoop`] subscribes and turns shakes into tapps.

pub mod shake;

pub use shake::{
    AccelerationSample, ShakeClassifier, ShakeDetector, ShakeEvent, ShakeEventChannel,
    ShakeTappLoop,
};
