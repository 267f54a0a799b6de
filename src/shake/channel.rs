use core::fmt;

use embassy_sync::{
    blocking_mutex::raw::{CriticalSectionRawMutex, RawMutex},
    pubsub::{self, PubSubChannel, Subscriber, WaitResult},
};

use super::types::ShakeEvent;

/// Events a subscriber may fall behind before it observes a lag notice.
pub const SHAKE_EVENT_QUEUE: usize = 4;
pub const SHAKE_SUBSCRIBERS_MAX: usize = 4;
const SHAKE_PUBLISHERS_MAX: usize = 1;

type ShakePubSub<M> = PubSubChannel<
    M,
    ShakeEvent,
    SHAKE_EVENT_QUEUE,
    SHAKE_SUBSCRIBERS_MAX,
    SHAKE_PUBLISHERS_MAX,
>;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ChannelError {
    SubscribersExhausted,
    PublishersExhausted,
}

impl fmt::Display for ChannelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SubscribersExhausted => write!(
                f,
                "shake channel already has {SHAKE_SUBSCRIBERS_MAX} subscribers"
            ),
            Self::PublishersExhausted => write!(f, "shake channel has no publisher slot left"),
        }
    }
}

impl std::error::Error for ChannelError {}

impl From<pubsub::Error> for ChannelError {
    fn from(err: pubsub::Error) -> Self {
        match err {
            pubsub::Error::MaximumSubscribersReached => Self::SubscribersExhausted,
            pubsub::Error::MaximumPublishersReached => Self::PublishersExhausted,
        }
    }
}

/// Fire-and-forget broadcast of shake events.
///
/// Subscribers only see events emitted after they subscribed. With nobody
/// subscribed an emitted event is dropped. Emission never blocks: a full
/// queue evicts its oldest event and slow subscribers get a lag notice.
pub struct ShakeEventChannel<M: RawMutex = CriticalSectionRawMutex> {
    inner: ShakePubSub<M>,
}

impl<M: RawMutex> ShakeEventChannel<M> {
    pub const fn new() -> Self {
        Self {
            inner: PubSubChannel::new(),
        }
    }

    pub fn subscribe(&self) -> Result<ShakeSubscription<'_, M>, ChannelError> {
        let inner = self.inner.subscriber()?;
        Ok(ShakeSubscription { inner })
    }

    pub fn emit(&self, event: ShakeEvent) {
        self.inner.immediate_publisher().publish_immediate(event);
    }
}

impl<M: RawMutex> Default for ShakeEventChannel<M> {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Delivery {
    Shake(ShakeEvent),
    Lagged(u64),
}

impl From<WaitResult<ShakeEvent>> for Delivery {
    fn from(result: WaitResult<ShakeEvent>) -> Self {
        match result {
            WaitResult::Message(event) => Self::Shake(event),
            WaitResult::Lagged(missed) => Self::Lagged(missed),
        }
    }
}

/// A live view of future shake events. Dropping it frees the subscriber slot.
pub struct ShakeSubscription<'a, M: RawMutex> {
    inner: Subscriber<
        'a,
        M,
        ShakeEvent,
        SHAKE_EVENT_QUEUE,
        SHAKE_SUBSCRIBERS_MAX,
        SHAKE_PUBLISHERS_MAX,
    >,
}

impl<M: RawMutex> ShakeSubscription<'_, M> {
    pub async fn next(&mut self) -> Delivery {
        self.inner.next_message().await.into()
    }

    pub fn try_next(&mut self) -> Option<Delivery> {
        self.inner.try_next_message().map(Delivery::from)
    }

    pub fn pending(&self) -> u64 {
        self.inner.available()
    }
}

#[cfg(test)]
mod tests {
    use embassy_sync::blocking_mutex::raw::NoopRawMutex;

    use super::*;

    #[test]
    fn every_subscriber_receives_each_event() {
        let channel = ShakeEventChannel::<NoopRawMutex>::new();
        let mut first = channel.subscribe().expect("first subscriber");
        let mut second = channel.subscribe().expect("second subscriber");

        channel.emit(ShakeEvent);

        assert_eq!(first.try_next(), Some(Delivery::Shake(ShakeEvent)));
        assert_eq!(second.try_next(), Some(Delivery::Shake(ShakeEvent)));
        assert_eq!(first.try_next(), None);
    }

    #[test]
    fn late_subscriber_sees_no_past_events() {
        let channel = ShakeEventChannel::<NoopRawMutex>::new();
        let mut early = channel.subscribe().expect("early subscriber");

        channel.emit(ShakeEvent);
        let mut late = channel.subscribe().expect("late subscriber");

        assert_eq!(late.try_next(), None);
        assert_eq!(late.pending(), 0);
        assert_eq!(early.pending(), 1);

        channel.emit(ShakeEvent);
        assert_eq!(late.try_next(), Some(Delivery::Shake(ShakeEvent)));
    }

    #[test]
    fn events_without_subscribers_are_dropped() {
        let channel = ShakeEventChannel::<NoopRawMutex>::new();
        channel.emit(ShakeEvent);
        channel.emit(ShakeEvent);

        let mut subscriber = channel.subscribe().expect("subscriber");
        assert_eq!(subscriber.try_next(), None);
    }

    #[test]
    fn slow_subscriber_observes_lag_then_newest_events() {
        let channel = ShakeEventChannel::<NoopRawMutex>::new();
        let mut slow = channel.subscribe().expect("subscriber");

        for _ in 0..SHAKE_EVENT_QUEUE + 2 {
            channel.emit(ShakeEvent);
        }

        assert_eq!(slow.try_next(), Some(Delivery::Lagged(2)));
        for _ in 0..SHAKE_EVENT_QUEUE {
            assert_eq!(slow.try_next(), Some(Delivery::Shake(ShakeEvent)));
        }
        assert_eq!(slow.try_next(), None);
    }

    #[test]
    fn subscriber_slots_are_bounded_and_released_on_drop() {
        let channel = ShakeEventChannel::<NoopRawMutex>::new();
        let mut held = Vec::new();
        for _ in 0..SHAKE_SUBSCRIBERS_MAX {
            held.push(channel.subscribe().expect("slot available"));
        }

        assert_eq!(
            channel.subscribe().err(),
            Some(ChannelError::SubscribersExhausted)
        );

        held.pop();
        assert!(channel.subscribe().is_ok());
    }

    #[test]
    fn async_next_resolves_pending_event() {
        let channel = ShakeEventChannel::<NoopRawMutex>::new();
        let mut subscriber = channel.subscribe().expect("subscriber");
        channel.emit(ShakeEvent);

        let delivery = embassy_futures::block_on(subscriber.next());
        assert_eq!(delivery, Delivery::Shake(ShakeEvent));
    }
}
