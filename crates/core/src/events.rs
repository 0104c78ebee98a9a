//! Event System
//!
//! Pub/sub bus carrying keyword changes and message verdicts to whoever
//! presents them (the CLI prints them, a UI would refresh its list).

use crossbeam_channel::{unbounded, Receiver, Sender};
use parking_lot::RwLock;
use tracing::debug;

/// Events emitted by the filter
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// A keyword was added to the list
    KeywordAdded { keyword: String },
    /// A keyword was removed from the list
    KeywordRemoved { keyword: String },
    /// The whole list was cleared
    KeywordsCleared,
    /// A message arrived and is about to be classified
    MessageReceived { sender: Option<String> },
    /// A message was let through
    MessageAllowed { sender: Option<String> },
    /// A message was classified as spam
    MessageSuppressed { sender: Option<String>, keyword: String },
    /// The host could not carry out a suppression
    SuppressionFailed { sender: Option<String>, reason: String },
    /// Application shutdown
    Shutdown,
}

/// Subscriber handle for receiving events
#[derive(Clone)]
pub struct EventSubscription {
    receiver: Receiver<Event>,
}

impl EventSubscription {
    /// Try to receive an event (non-blocking)
    pub fn try_recv(&self) -> Result<Event, crossbeam_channel::TryRecvError> {
        self.receiver.try_recv()
    }

    /// Drain the events that are already queued
    pub fn drain(&self) -> Vec<Event> {
        self.receiver.try_iter().collect()
    }
}

/// Event bus for publish/subscribe pattern
pub struct EventBus {
    subscribers: RwLock<Vec<Sender<Event>>>,
}

impl EventBus {
    /// Create a new event bus
    pub fn new() -> Self {
        Self {
            subscribers: RwLock::new(Vec::new()),
        }
    }

    /// Subscribe to events
    pub fn subscribe(&self) -> EventSubscription {
        let (sender, receiver) = unbounded();
        self.subscribers.write().push(sender);
        EventSubscription { receiver }
    }

    /// Emit an event to all subscribers, returns how many received it.
    ///
    /// Subscribers whose receiving end has been dropped are pruned.
    pub fn emit(&self, event: Event) -> usize {
        let mut subscribers = self.subscribers.write();
        subscribers.retain(|sender| sender.send(event.clone()).is_ok());

        let delivered = subscribers.len();
        debug!("Event {:?} delivered to {} subscribers", event, delivered);
        delivered
    }

    /// Get the number of live subscribers as of the last emit
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.read().len()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
