use core::fmt;
use std::collections::VecDeque;

use super::types::{AccelerationSample, SampleRate};

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum MotionSourceError {
    SensorUnavailable,
    RegistrationRejected,
}

impl fmt::Display for MotionSourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SensorUnavailable => write!(f, "no accelerometer available"),
            Self::RegistrationRejected => write!(f, "sensor registration rejected"),
        }
    }
}

impl std::error::Error for MotionSourceError {}

/// Platform accelerometer seen from the detector.
///
/// Delivery is serialized: `poll_sample` is never called concurrently and
/// yields nothing while unregistered.
pub trait MotionSource {
    fn register(&mut self, rate: SampleRate) -> Result<(), MotionSourceError>;
    fn unregister(&mut self);
    fn poll_sample(&mut self) -> Option<AccelerationSample>;
}

/// Plays back a fixed sample list. Used by the replay tool and tests.
#[derive(Debug, Default)]
pub struct ScriptedSource {
    samples: VecDeque<AccelerationSample>,
    rate: Option<SampleRate>,
    fail_with: Option<MotionSourceError>,
    registrations: u32,
    unregistrations: u32,
}

impl ScriptedSource {
    pub fn new(samples: impl IntoIterator<Item = AccelerationSample>) -> Self {
        Self {
            samples: samples.into_iter().collect(),
            ..Self::default()
        }
    }

    pub fn failing(err: MotionSourceError) -> Self {
        Self {
            fail_with: Some(err),
            ..Self::default()
        }
    }

    pub fn push(&mut self, sample: AccelerationSample) {
        self.samples.push_back(sample);
    }

    pub fn is_registered(&self) -> bool {
        self.rate.is_some()
    }

    pub fn rate(&self) -> Option<SampleRate> {
        self.rate
    }

    pub fn registrations(&self) -> u32 {
        self.registrations
    }

    pub fn unregistrations(&self) -> u32 {
        self.unregistrations
    }

    pub fn remaining(&self) -> usize {
        self.samples.len()
    }
}

impl MotionSource for ScriptedSource {
    fn register(&mut self, rate: SampleRate) -> Result<(), MotionSourceError> {
        if let Some(err) = self.fail_with {
            return Err(err);
        }
        self.rate = Some(rate);
        self.registrations += 1;
        Ok(())
    }

    fn unregister(&mut self) {
        if self.rate.take().is_some() {
            self.unregistrations += 1;
        }
    }

    fn poll_sample(&mut self) -> Option<AccelerationSample> {
        if !self.is_registered() {
            return None;
        }
        self.samples.pop_front()
    }
}
