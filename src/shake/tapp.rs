use core::{cmp::min, fmt};

use embassy_sync::blocking_mutex::raw::RawMutex;
use embedded_hal_async::delay::DelayNs;

use super::{
    channel::{Delivery, ShakeSubscription},
    config::{active_config, ShakeDetectorConfig},
};

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum TappError {
    Transport(String),
    Status(u16),
}

impl fmt::Display for TappError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transport(msg) => write!(f, "transport: {msg}"),
            Self::Status(code) => write!(f, "status={code}"),
        }
    }
}

impl std::error::Error for TappError {}

/// Sends one tapp to the active group through the remote service.
#[allow(async_fn_in_trait)]
pub trait TappAction {
    async fn tapp(&mut self) -> Result<(), TappError>;
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum TappOutcome {
    Sent,
    Failed,
    Lagged(u64),
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct TappStats {
    pub sent: u32,
    pub failed: u32,
    pub lagged: u64,
}

/// Turns shakes into tapps while a group view is active.
///
/// After every tapp attempt the loop waits the configured pacing delay before
/// taking the next event, so a burst of shakes cannot flood the service.
/// Failures are logged and never retried.
pub struct ShakeTappLoop<'a, M: RawMutex, A: TappAction, D: DelayNs> {
    subscription: ShakeSubscription<'a, M>,
    action: A,
    delay: D,
    pacing_ms: u32,
    stats: TappStats,
}

impl<'a, M: RawMutex, A: TappAction, D: DelayNs> ShakeTappLoop<'a, M, A, D> {
    pub fn new(subscription: ShakeSubscription<'a, M>, action: A, delay: D) -> Self {
        Self::with_config(active_config(), subscription, action, delay)
    }

    pub fn with_config(
        config: &ShakeDetectorConfig,
        subscription: ShakeSubscription<'a, M>,
        action: A,
        delay: D,
    ) -> Self {
        Self {
            subscription,
            action,
            delay,
            pacing_ms: min(config.tapp.pacing_ms, u32::MAX as u64) as u32,
            stats: TappStats::default(),
        }
    }

    pub async fn step(&mut self) -> TappOutcome {
        if let Delivery::Lagged(missed) = self.subscription.next().await {
            self.stats.lagged = self.stats.lagged.saturating_add(missed);
            log::warn!("tapp: lagged missed={missed}");
            return TappOutcome::Lagged(missed);
        }

        let outcome = match self.action.tapp().await {
            Ok(()) => {
                self.stats.sent = self.stats.sent.saturating_add(1);
                log::info!("tapp: sent");
                TappOutcome::Sent
            }
            Err(err) => {
                self.stats.failed = self.stats.failed.saturating_add(1);
                log::warn!("tapp: failed err={err}");
                TappOutcome::Failed
            }
        };

        if self.pacing_ms > 0 {
            self.delay.delay_ms(self.pacing_ms).await;
        }
        outcome
    }

    pub async fn run(&mut self) {
        loop {
            let _ = self.step().await;
        }
    }

    pub fn stats(&self) -> TappStats {
        self.stats
    }

    pub fn action(&self) -> &A {
        &self.action
    }

    pub fn delay(&self) -> &D {
        &self.delay
    }
}
