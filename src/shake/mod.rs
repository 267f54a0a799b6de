pub mod channel;
pub mod config;
pub mod detector;
pub mod features;
pub mod shake_hsm;
pub mod source;
pub mod tapp;
pub mod trace;
pub mod types;

pub use channel::{ChannelError, Delivery, ShakeEventChannel, ShakeSubscription};
pub use config::{active_config, ShakeDetectorConfig};
pub use detector::{DetectorError, ListeningGuard, ShakeDetector};
pub use shake_hsm::{ClassifierOutput, ShakeClassifier};
pub use source::{MotionSource, MotionSourceError, ScriptedSource};
pub use tapp::{ShakeTappLoop, TappAction, TappError, TappOutcome, TappStats};
pub use trace::ClassifierTrace;
pub use types::{
    AccelerationSample, ActionBuffer, ClassifierAction, ClassifierStateId, RejectReason,
    SampleRate, ShakeEvent,
};
