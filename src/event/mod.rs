//! Event system for session notifications.
//!
//! A session publishes three kinds of notification: connection status
//! changes, received messages and errors. They travel on one broadcast
//! channel as [`Event`] variants. Each [`Subscription`] is an independent
//! receiver; dropping it (or calling [`Subscription::unsubscribe`]) cancels
//! delivery.
//!
//! Delivery does not assume any particular thread. A GUI must move events
//! onto its own thread before touching widgets.

use std::sync::Arc;

use tokio::sync::broadcast;

use crate::protocol::CommandKind;

/// Notifications emitted by a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// Connection established.
    Connected,
    /// Connection closed or lost.
    Disconnected,
    /// A reply was read and decoded.
    MessageReceived { kind: CommandKind, payload: String },
    /// An operation failed.
    Error { message: String },
}

impl Event {
    /// Returns the kind of this event.
    #[must_use]
    pub const fn kind(&self) -> EventKind {
        match self {
            Self::Connected | Self::Disconnected => EventKind::ConnectionStatus,
            Self::MessageReceived { .. } => EventKind::MessageReceived,
            Self::Error { .. } => EventKind::Error,
        }
    }

    /// Returns the new connection status if this is a status event.
    #[must_use]
    pub const fn connection_status(&self) -> Option<bool> {
        match self {
            Self::Connected => Some(true),
            Self::Disconnected => Some(false),
            _ => None,
        }
    }

    /// Returns the payload if this is a received message.
    #[must_use]
    pub fn payload(&self) -> Option<&str> {
        match self {
            Self::MessageReceived { payload, .. } => Some(payload),
            _ => None,
        }
    }
}

/// Notification channels a subscriber can select.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// Connected/disconnected.
    ConnectionStatus,
    /// Decoded replies.
    MessageReceived,
    /// Error reports.
    Error,
}

/// Subscription filter for specific event kinds.
#[derive(Debug, Clone, Default)]
pub struct EventFilter {
    /// Kinds to deliver. `None` delivers everything.
    pub kinds: Option<Vec<EventKind>>,
}

impl EventFilter {
    /// Creates a filter for specific event kinds.
    #[must_use]
    pub const fn kinds(kinds: Vec<EventKind>) -> Self {
        Self { kinds: Some(kinds) }
    }

    /// Creates a filter for a single event kind.
    #[must_use]
    pub fn only(kind: EventKind) -> Self {
        Self::kinds(vec![kind])
    }

    /// Checks if an event matches this filter.
    #[must_use]
    pub fn matches(&self, event: &Event) -> bool {
        self.kinds
            .as_ref()
            .is_none_or(|kinds| kinds.contains(&event.kind()))
    }
}

/// A subscription to session events.
#[derive(Debug)]
pub struct Subscription {
    receiver: broadcast::Receiver<Event>,
    filter: EventFilter,
}

impl Subscription {
    /// Receives the next matching event.
    ///
    /// Returns `None` once the session is gone. If this subscriber fell
    /// behind, the missed events are skipped.
    pub async fn recv(&mut self) -> Option<Event> {
        loop {
            match self.receiver.recv().await {
                Ok(event) if self.filter.matches(&event) => return Some(event),
                Ok(_) => {}
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!("subscriber lagged, {} events dropped", n);
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// Returns the next matching event if one is already queued.
    pub fn try_recv(&mut self) -> Option<Event> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) if self.filter.matches(&event) => return Some(event),
                Ok(_) | Err(broadcast::error::TryRecvError::Lagged(_)) => {}
                Err(
                    broadcast::error::TryRecvError::Empty | broadcast::error::TryRecvError::Closed,
                ) => return None,
            }
        }
    }

    /// Cancels the subscription.
    pub fn unsubscribe(self) {
        drop(self);
    }
}

struct EventDispatcherInner {
    sender: broadcast::Sender<Event>,
}

/// Dispatches events to subscribers.
#[derive(Clone)]
pub struct EventDispatcher {
    inner: Arc<EventDispatcherInner>,
}

impl EventDispatcher {
    /// Creates a new event dispatcher buffering up to `capacity` events
    /// per subscriber.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self {
            inner: Arc::new(EventDispatcherInner { sender }),
        }
    }

    /// Dispatches an event to all subscribers.
    pub fn dispatch(&self, event: Event) {
        // No receivers is fine
        let _ = self.inner.sender.send(event);
    }

    /// Dispatches an error event and logs it.
    pub fn error(&self, message: impl Into<String>) {
        let message = message.into();
        tracing::warn!("{}", message);
        self.dispatch(Event::Error { message });
    }

    /// Subscribes to events with an optional filter.
    #[must_use]
    pub fn subscribe(&self, filter: Option<EventFilter>) -> Subscription {
        Subscription {
            receiver: self.inner.sender.subscribe(),
            filter: filter.unwrap_or_default(),
        }
    }

    /// Returns the number of live subscriptions.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.inner.sender.receiver_count()
    }
}

impl std::fmt::Debug for EventDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventDispatcher")
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}
