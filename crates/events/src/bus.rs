//! In-process event bus backed by a `tokio::sync::broadcast` channel.
//!
//! [`EventBus`] is shared via `Arc<EventBus<T>>`. The service runs two of
//! them: one carrying device reports into the moisture monitor and one
//! carrying local notifications out to whoever presents them.

use tokio::sync::broadcast;

/// Default buffer capacity for the broadcast channel.
const DEFAULT_CAPACITY: usize = 1024;

/// In-process fan-out event bus.
///
/// Wraps a [`broadcast::Sender`] so that any number of subscribers can
/// independently receive every published event.
///
/// # Usage
///
/// ```rust
/// use kapruka_events::EventBus;
///
/// let bus: EventBus<String> = EventBus::default();
/// let _rx = bus.subscribe();
///
/// assert_eq!(bus.publish("reading.received".to_string()), 1);
/// ```
pub struct EventBus<T> {
    sender: broadcast::Sender<T>,
}

impl<T: Clone> EventBus<T> {
    /// Create a bus with a specific channel capacity.
    ///
    /// When the buffer is full, the oldest un-consumed messages are dropped
    /// and slow receivers will observe a `RecvError::Lagged`.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all current subscribers.
    ///
    /// Returns how many subscribers the event reached. Zero means it was
    /// dropped.
    pub fn publish(&self, event: T) -> usize {
        // A SendError only means there are zero receivers.
        self.sender.send(event).unwrap_or(0)
    }

    /// Subscribe to all events published on this bus from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<T> {
        self.sender.subscribe()
    }

    /// Number of live subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl<T: Clone> Default for EventBus<T> {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
