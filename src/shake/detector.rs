use core::{
    fmt,
    ops::{Deref, DerefMut},
};

use embassy_sync::blocking_mutex::raw::{CriticalSectionRawMutex, RawMutex};

use super::{
    channel::ShakeEventChannel,
    config::{active_config, ShakeDetectorConfig},
    shake_hsm::{ClassifierOutput, ShakeClassifier},
    source::{MotionSource, MotionSourceError},
    types::{AccelerationSample, ShakeEvent},
};

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum DetectorError {
    Source(MotionSourceError),
}

impl fmt::Display for DetectorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Source(err) => write!(f, "motion source: {err}"),
        }
    }
}

impl std::error::Error for DetectorError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Source(err) => Some(err),
        }
    }
}

impl From<MotionSourceError> for DetectorError {
    fn from(err: MotionSourceError) -> Self {
        Self::Source(err)
    }
}

/// Binds a classifier to a motion source and publishes its shakes.
///
/// Dropping the detector stops it, so a sensor registration never outlives
/// its owner.
pub struct ShakeDetector<'c, S: MotionSource, M: RawMutex = CriticalSectionRawMutex> {
    classifier: ShakeClassifier,
    source: S,
    channel: &'c ShakeEventChannel<M>,
    shakes_emitted: u32,
}

impl<'c, S: MotionSource, M: RawMutex> ShakeDetector<'c, S, M> {
    pub fn new(source: S, channel: &'c ShakeEventChannel<M>) -> Self {
        Self::with_config(active_config(), source, channel)
    }

    pub fn with_config(
        config: &'static ShakeDetectorConfig,
        source: S,
        channel: &'c ShakeEventChannel<M>,
    ) -> Self {
        Self {
            classifier: ShakeClassifier::new(config),
            source,
            channel,
            shakes_emitted: 0,
        }
    }

    pub fn start(&mut self) -> Result<(), DetectorError> {
        if self.classifier.is_listening() {
            return Ok(());
        }

        let rate = self.classifier.config().sample_rate;
        if let Err(err) = self.source.register(rate) {
            log::warn!("shake: register_failed err={err}");
            return Err(err.into());
        }
        let _ = self.classifier.start();
        log::info!("shake: listening rate={rate:?}");
        Ok(())
    }

    pub fn stop(&mut self) {
        if !self.classifier.is_listening() {
            return;
        }

        self.source.unregister();
        let _ = self.classifier.stop();
        log::info!("shake: stopped");
    }

    /// Starts listening for the lifetime of the returned guard.
    pub fn listen(&mut self) -> Result<ListeningGuard<'_, 'c, S, M>, DetectorError> {
        self.start()?;
        Ok(ListeningGuard { detector: self })
    }

    pub fn on_sample(&mut self, sample: AccelerationSample) -> ClassifierOutput {
        let output = self.classifier.on_sample(sample);
        if output.shake_detected() {
            self.shakes_emitted = self.shakes_emitted.saturating_add(1);
            log::info!("shake: detected at_ms={}", sample.now_ms);
            self.channel.emit(ShakeEvent);
        }
        output
    }

    /// Feeds every sample the source has ready. Returns the shakes emitted.
    pub fn pump(&mut self) -> usize {
        let mut shakes = 0;
        while self.classifier.is_listening() {
            let Some(sample) = self.source.poll_sample() else {
                break;
            };
            if self.on_sample(sample).shake_detected() {
                shakes += 1;
            }
        }
        shakes
    }

    pub fn is_listening(&self) -> bool {
        self.classifier.is_listening()
    }

    pub fn classifier(&self) -> &ShakeClassifier {
        &self.classifier
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }

    pub fn shakes_emitted(&self) -> u32 {
        self.shakes_emitted
    }
}

impl<S: MotionSource, M: RawMutex> Drop for ShakeDetector<'_, S, M> {
    fn drop(&mut self) {
        self.stop();
    }
}

pub struct ListeningGuard<'d, 'c, S: MotionSource, M: RawMutex> {
    detector: &'d mut ShakeDetector<'c, S, M>,
}

impl<'c, S: MotionSource, M: RawMutex> Deref for ListeningGuard<'_, 'c, S, M> {
    type Target = ShakeDetector<'c, S, M>;

    fn deref(&self) -> &Self::Target {
        &*self.detector
    }
}

impl<S: MotionSource, M: RawMutex> DerefMut for ListeningGuard<'_, '_, S, M> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut *self.detector
    }
}

impl<S: MotionSource, M: RawMutex> Drop for ListeningGuard<'_, '_, S, M> {
    fn drop(&mut self) {
        self.detector.stop();
    }
}

#[cfg(test)]
mod tests {
    use embassy_sync::blocking_mutex::raw::NoopRawMutex;

    use super::super::{
        channel::Delivery, features::STANDARD_GRAVITY, source::ScriptedSource, types::SampleRate,
    };
    use super::*;

    type TestChannel = ShakeEventChannel<NoopRawMutex>;

    fn g_sample(now_ms: u64, g: f32) -> AccelerationSample {
        AccelerationSample::new(now_ms, g * STANDARD_GRAVITY, 0.0, 0.0)
    }

    fn shake_at(start_ms: u64) -> [AccelerationSample; 2] {
        [g_sample(start_ms, 2.0), g_sample(start_ms + 150, 2.0)]
    }

    #[test]
    fn start_registers_once_at_configured_rate() {
        let channel = TestChannel::new();
        let mut detector = ShakeDetector::new(ScriptedSource::default(), &channel);

        detector.start().expect("first start");
        detector.start().expect("second start");

        assert!(detector.is_listening());
        assert_eq!(detector.source().registrations(), 1);
        assert_eq!(detector.source().rate(), Some(SampleRate::Ui));
    }

    #[test]
    fn stop_is_idempotent_and_unregisters_once() {
        let channel = TestChannel::new();
        let mut detector = ShakeDetector::new(ScriptedSource::default(), &channel);

        detector.stop();
        detector.start().expect("start");
        detector.stop();
        detector.stop();

        assert!(!detector.is_listening());
        assert_eq!(detector.source().unregistrations(), 1);
        assert!(!detector.source().is_registered());
    }

    #[test]
    fn failed_registration_leaves_detector_stopped() {
        let channel = TestChannel::new();
        let mut detector = ShakeDetector::new(
            ScriptedSource::failing(MotionSourceError::SensorUnavailable),
            &channel,
        );

        let err = detector.start().expect_err("start should fail");
        assert_eq!(
            err,
            DetectorError::Source(MotionSourceError::SensorUnavailable)
        );
        assert!(!detector.is_listening());
        assert!(detector.listen().is_err());
    }

    #[test]
    fn pumped_shake_reaches_subscribers() {
        let channel = TestChannel::new();
        let mut subscriber = channel.subscribe().expect("subscriber");
        let mut detector = ShakeDetector::new(ScriptedSource::new(shake_at(1_000)), &channel);

        detector.start().expect("start");
        assert_eq!(detector.pump(), 1);
        assert_eq!(detector.shakes_emitted(), 1);
        assert_eq!(subscriber.try_next(), Some(Delivery::Shake(ShakeEvent)));
        assert_eq!(subscriber.try_next(), None);
    }

    #[test]
    fn samples_before_start_emit_nothing() {
        let channel = TestChannel::new();
        let mut subscriber = channel.subscribe().expect("subscriber");
        let mut detector = ShakeDetector::new(ScriptedSource::new(shake_at(0)), &channel);

        assert_eq!(detector.pump(), 0);
        for sample in shake_at(1_000) {
            assert!(!detector.on_sample(sample).shake_detected());
        }
        assert_eq!(subscriber.try_next(), None);
        assert_eq!(detector.source().remaining(), 2);
    }

    #[test]
    fn guard_releases_registration_when_scope_ends() {
        let channel = TestChannel::new();
        let mut detector = ShakeDetector::new(ScriptedSource::new(shake_at(0)), &channel);

        {
            let mut guard = detector.listen().expect("listen");
            assert!(guard.is_listening());
            assert_eq!(guard.pump(), 1);
        }

        assert!(!detector.is_listening());
        assert_eq!(detector.source().registrations(), 1);
        assert_eq!(detector.source().unregistrations(), 1);
    }

    #[test]
    fn guard_releases_registration_on_early_return() {
        fn pump_until_first_shake(
            detector: &mut ShakeDetector<'_, ScriptedSource, NoopRawMutex>,
        ) -> Result<usize, DetectorError> {
            let mut guard = detector.listen()?;
            if guard.source().remaining() == 0 {
                return Ok(0);
            }
            Ok(guard.pump())
        }

        let channel = TestChannel::new();
        let mut detector = ShakeDetector::new(ScriptedSource::default(), &channel);
        assert_eq!(pump_until_first_shake(&mut detector), Ok(0));
        assert!(!detector.is_listening());
        assert_eq!(detector.source().unregistrations(), 1);
    }

    #[test]
    fn restart_after_stop_detects_again() {
        let channel = TestChannel::new();
        let mut subscriber = channel.subscribe().expect("subscriber");
        let mut detector = ShakeDetector::new(ScriptedSource::new(shake_at(0)), &channel);

        detector.start().expect("start");
        assert_eq!(detector.pump(), 1);
        detector.stop();

        for sample in shake_at(2_000) {
            detector.source_mut().push(sample);
        }
        assert_eq!(detector.pump(), 0);

        detector.start().expect("restart");
        assert_eq!(detector.pump(), 1);
        assert_eq!(detector.source().registrations(), 2);
        assert_eq!(subscriber.try_next(), Some(Delivery::Shake(ShakeEvent)));
        assert_eq!(subscriber.try_next(), Some(Delivery::Shake(ShakeEvent)));
    }
}
