//! Device session: one connection to one controller.
//!
//! A [`Session`] owns the transport and drives the protocol state machine:
//!
//! ```text
//! Disconnected --connect()--> Connecting --socket up--> Connected
//!      ^                                                    |
//!      +-------------- disconnect() or I/O failure ---------+
//! ```
//!
//! Every exchange is one write followed by exactly one read. Replies carry
//! no request identifier and are matched by order, so the session is meant
//! for one caller issuing requests sequentially.

mod correlation;

use std::sync::atomic::{AtomicU8, Ordering};
use std::time::Duration;

use tokio::sync::Mutex;

use crate::error::{Error, Result};
use crate::event::{Event, EventDispatcher, EventFilter, Subscription};
use crate::protocol::{ProtocolMessage, decode, encode};
use crate::transport::{TcpConfig, TcpTransport, Transport};
use crate::types::Endpoint;

use correlation::Correlator;

/// Default deadline for correlated requests.
pub const DEFAULT_REPLY_TIMEOUT: Duration = Duration::from_secs(3);

/// Default per-subscriber event buffer.
pub const DEFAULT_EVENT_CAPACITY: usize = 256;

/// Session configuration.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Deadline used by the typed requests that await a reply.
    pub reply_timeout: Duration,
    /// Events buffered per subscriber before it starts lagging.
    pub event_capacity: usize,
    /// Send a system status request right after connecting.
    pub probe_on_connect: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            reply_timeout: DEFAULT_REPLY_TIMEOUT,
            event_capacity: DEFAULT_EVENT_CAPACITY,
            probe_on_connect: true,
        }
    }
}

impl SessionConfig {
    /// Creates a session configuration with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the reply timeout.
    #[must_use]
    pub const fn reply_timeout(mut self, timeout: Duration) -> Self {
        self.reply_timeout = timeout;
        self
    }

    /// Sets the event buffer capacity.
    #[must_use]
    pub const fn event_capacity(mut self, capacity: usize) -> Self {
        self.event_capacity = capacity;
        self
    }

    /// Enables or disables the connection probe.
    #[must_use]
    pub const fn probe_on_connect(mut self, probe: bool) -> Self {
        self.probe_on_connect = probe;
        self
    }
}

/// Connection state of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum SessionState {
    /// No socket.
    Disconnected = 0,
    /// Socket being opened.
    Connecting = 1,
    /// Socket open and usable.
    Connected = 2,
}

impl SessionState {
    const fn from_u8(value: u8) -> Self {
        match value {
            1 => Self::Connecting,
            2 => Self::Connected,
            _ => Self::Disconnected,
        }
    }
}

struct Link<T> {
    transport: T,
    endpoint: Option<Endpoint>,
}

/// Outcome of an exchange whose write succeeded.
struct Exchange {
    reply: Option<ProtocolMessage>,
    // The link is already torn down when this is a lost connection.
    read_error: Option<Error>,
}

/// Session with one Yacode controller.
pub struct Session<T> {
    link: Mutex<Link<T>>,
    // Written only while `link` is held; read lock-free.
    state: AtomicU8,
    dispatcher: EventDispatcher,
    correlator: Correlator,
    request_gate: Mutex<()>,
    config: SessionConfig,
}

impl Session<TcpTransport> {
    /// Creates a TCP session with default settings.
    ///
    /// # Returns
    ///
    /// A new session (not yet connected).
    #[must_use]
    pub fn tcp() -> Self {
        Self::with_tcp_config(TcpConfig::default(), SessionConfig::default())
    }

    /// Creates a TCP session with custom configuration.
    #[must_use]
    pub fn with_tcp_config(tcp: TcpConfig, config: SessionConfig) -> Self {
        Self::new(TcpTransport::new(tcp), config)
    }
}

impl<T: Transport> Session<T> {
    /// Creates a session over the given transport.
    #[must_use]
    pub fn new(transport: T, config: SessionConfig) -> Self {
        Self {
            link: Mutex::new(Link {
                transport,
                endpoint: None,
            }),
            state: AtomicU8::new(SessionState::Disconnected as u8),
            dispatcher: EventDispatcher::new(config.event_capacity),
            correlator: Correlator::new(),
            request_gate: Mutex::new(()),
            config,
        }
    }

    /// Returns the current connection state.
    #[must_use]
    pub fn state(&self) -> SessionState {
        SessionState::from_u8(self.state.load(Ordering::SeqCst))
    }

    /// Returns true if connected.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.state() == SessionState::Connected
    }

    /// Returns the endpoint of the live connection.
    pub async fn endpoint(&self) -> Option<Endpoint> {
        self.link.lock().await.endpoint.clone()
    }

    /// Returns the session configuration.
    #[must_use]
    pub const fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Subscribes to all session events.
    #[must_use]
    pub fn subscribe(&self) -> Subscription {
        self.dispatcher.subscribe(None)
    }

    /// Subscribes to the event kinds selected by `filter`.
    #[must_use]
    pub fn subscribe_filtered(&self, filter: EventFilter) -> Subscription {
        self.dispatcher.subscribe(Some(filter))
    }

    /// Returns true if a correlated request is waiting for its reply.
    #[must_use]
    pub fn has_pending_reply(&self) -> bool {
        self.correlator.is_pending()
    }

    pub(crate) const fn dispatcher(&self) -> &EventDispatcher {
        &self.dispatcher
    }

    /// Moves to `next`, emitting a status event when connectedness changes.
    ///
    /// Callers must hold the link lock.
    fn transition(&self, next: SessionState) {
        let prev = SessionState::from_u8(self.state.swap(next as u8, Ordering::SeqCst));
        let was_connected = prev == SessionState::Connected;
        let now_connected = next == SessionState::Connected;

        if was_connected != now_connected {
            tracing::debug!("session {:?} -> {:?}", prev, next);
            self.dispatcher.dispatch(if now_connected {
                Event::Connected
            } else {
                Event::Disconnected
            });
        }
    }

    /// Closes the transport and moves to `Disconnected` whatever happens.
    async fn teardown(&self, link: &mut Link<T>) -> Result<()> {
        let result = link.transport.disconnect().await;
        link.endpoint = None;
        self.transition(SessionState::Disconnected);
        result
    }

    // ==================== Connection ====================

    /// Connects to `host:port`.
    ///
    /// Returns true if connected, including when already connected. On
    /// failure an [`Event::Error`] is emitted and the session is left
    /// disconnected.
    pub async fn connect(&self, host: &str, port: u16) -> bool {
        self.connect_endpoint(Endpoint::new(host).port(port)).await
    }

    /// Connects to `host` on the default port.
    pub async fn connect_default(&self, host: &str) -> bool {
        self.connect_endpoint(Endpoint::new(host)).await
    }

    /// Connects to a prebuilt endpoint.
    pub async fn connect_endpoint(&self, endpoint: Endpoint) -> bool {
        match self.try_connect(endpoint).await {
            Ok(()) => true,
            Err(e) => {
                self.dispatcher.error(format!("connection failed: {e}"));
                self.disconnect().await;
                false
            }
        }
    }

    /// Connects, returning the failure instead of reporting it.
    ///
    /// This will:
    /// 1. Open the transport connection
    /// 2. Emit [`Event::Connected`]
    /// 3. Send a system status probe (if enabled); its reply is only
    ///    published as [`Event::MessageReceived`]
    ///
    /// The session is disconnected again if any step fails.
    pub async fn try_connect(&self, endpoint: Endpoint) -> Result<()> {
        {
            let mut link = self.link.lock().await;
            if self.is_connected() && link.transport.is_connected() {
                tracing::debug!("already connected to {}", endpoint);
                return Ok(());
            }

            self.transition(SessionState::Connecting);
            if let Err(e) = link.transport.connect(&endpoint).await {
                tracing::warn!("connect to {} failed: {}", endpoint, e);
                if let Err(close_err) = self.teardown(&mut link).await {
                    tracing::debug!("cleanup after failed connect: {}", close_err);
                }
                return Err(e);
            }

            link.endpoint = Some(endpoint);
            self.transition(SessionState::Connected);
        }

        if self.config.probe_on_connect {
            tracing::debug!("sending connection probe");
            let probe = self
                .exchange(&ProtocolMessage::system_status_request())
                .await?;
            if let Some(e) = probe.read_error {
                return Err(e);
            }
        }

        Ok(())
    }

    /// Disconnects. Safe to call in any state.
    ///
    /// Teardown failures are reported as [`Event::Error`]; the session ends
    /// up disconnected regardless.
    pub async fn disconnect(&self) {
        if let Err(e) = self.try_disconnect().await {
            self.dispatcher.error(format!("error while disconnecting: {e}"));
        }
    }

    /// Disconnects, returning any teardown failure.
    pub async fn try_disconnect(&self) -> Result<()> {
        let mut link = self.link.lock().await;
        self.teardown(&mut link).await
    }

    /// Disconnects and consumes the session.
    pub async fn shutdown(self) {
        self.disconnect().await;
    }

    // ==================== Messaging ====================

    /// Sends a message and reads one reply.
    ///
    /// Returns true once the write succeeded, whether or not a reply was
    /// decoded. Decoded replies are published as [`Event::MessageReceived`].
    /// Failures are reported as [`Event::Error`].
    pub async fn send(&self, message: &ProtocolMessage) -> bool {
        match self.try_send(message).await {
            Ok(_) => true,
            Err(e) => {
                self.dispatcher.error(format!("failed to send {}: {e}", message.kind()));
                false
            }
        }
    }

    /// Sends a message and reads one reply, returning the decoded reply.
    ///
    /// `Ok(None)` means the write succeeded but no usable reply arrived.
    /// A write failure drops the connection and is returned as an error. A
    /// read failure after a successful write also drops the connection, but
    /// is only reported as [`Event::Error`] because the request did go out.
    pub async fn try_send(&self, message: &ProtocolMessage) -> Result<Option<ProtocolMessage>> {
        let exchange = self.exchange(message).await?;
        if let Some(e) = exchange.read_error {
            self.dispatcher.error(format!("failed to receive reply: {e}"));
        }
        Ok(exchange.reply)
    }

    /// One write followed by one read, under the link lock.
    ///
    /// Bytes left over from an earlier exchange are dropped before writing.
    /// Nothing is reported here; callers decide how a read failure surfaces.
    async fn exchange(&self, message: &ProtocolMessage) -> Result<Exchange> {
        let mut link = self.link.lock().await;
        if !self.is_connected() || !link.transport.is_connected() {
            return Err(Error::NotConnected);
        }

        match link.transport.discard_unread() {
            Ok(0) => {}
            Ok(n) => tracing::warn!("dropped {} unread bytes before sending {}", n, message.kind()),
            Err(e) => {
                tracing::error!("connection lost before sending: {}", e);
                if let Err(close_err) = self.teardown(&mut link).await {
                    tracing::debug!("cleanup after lost connection: {}", close_err);
                }
                return Err(e);
            }
        }

        let frame = encode(message);
        tracing::debug!("sending {} ({} bytes)", message.kind(), frame.len());

        if let Err(e) = link.transport.write_frame(frame).await {
            tracing::error!("write failed: {}", e);
            if let Err(close_err) = self.teardown(&mut link).await {
                tracing::debug!("cleanup after failed write: {}", close_err);
            }
            return Err(e);
        }

        let exchange = match link.transport.read_chunk().await {
            Ok(Some(chunk)) => Exchange {
                reply: decode(&chunk),
                read_error: None,
            },
            Ok(None) => Exchange {
                reply: None,
                read_error: None,
            },
            Err(e) => {
                tracing::warn!("read failed: {}", e);
                if e.is_connection_lost() {
                    if let Err(close_err) = self.teardown(&mut link).await {
                        tracing::debug!("cleanup after failed read: {}", close_err);
                    }
                }
                Exchange {
                    reply: None,
                    read_error: Some(e),
                }
            }
        };
        drop(link);

        if let Some(reply) = &exchange.reply {
            self.publish(reply);
        }
        Ok(exchange)
    }

    /// Publishes a decoded reply to subscribers and to the pending waiter.
    fn publish(&self, reply: &ProtocolMessage) {
        tracing::debug!("received {} ({} chars)", reply.kind(), reply.payload().len());
        self.dispatcher.dispatch(Event::MessageReceived {
            kind: reply.kind(),
            payload: reply.payload().to_owned(),
        });
        self.correlator.resolve(reply);
    }

    /// Sends a request and waits for the reply of the same kind.
    ///
    /// Correlated requests are serialized with each other. The deadline
    /// covers both the exchange and the wait. A disconnect while waiting
    /// ends in a timeout.
    ///
    /// # Errors
    ///
    /// - [`Error::Timeout`] if no reply arrived in time
    /// - [`Error::NotConnected`] if the session is not connected
    /// - [`Error::ConnectionClosed`] or [`Error::Io`] if the connection was lost
    pub async fn request(&self, message: &ProtocolMessage, timeout: Duration) -> Result<String> {
        let _gate = self.request_gate.lock().await;

        // Register before sending so the reply cannot slip past.
        let mut pending = self.correlator.register(message.kind());

        let attempt = async {
            if let Some(e) = self.exchange(message).await?.read_error {
                return Err(e);
            }
            pending.recv().await.ok_or(Error::ConnectionClosed)
        };

        tokio::time::timeout(timeout, attempt)
            .await
            .unwrap_or_else(|_| Err(Error::timeout(timeout)))
    }

    /// Sends a request and returns the correlated reply payload.
    ///
    /// Returns `None` on send failure (reported as [`Event::Error`]), on
    /// timeout, or when the reply payload is empty. Timeouts are not
    /// reported as errors.
    pub async fn request_and_correlate(
        &self,
        message: &ProtocolMessage,
        timeout: Duration,
    ) -> Option<String> {
        match self.request(message, timeout).await {
            Ok(payload) if payload.trim().is_empty() => {
                tracing::debug!("empty reply to {}", message.kind());
                None
            }
            Ok(payload) => Some(payload),
            Err(Error::Timeout { timeout_ms }) => {
                tracing::debug!("no reply to {} within {}ms", message.kind(), timeout_ms);
                None
            }
            Err(e) => {
                self.dispatcher
                    .error(format!("request {} failed: {e}", message.kind()));
                None
            }
        }
    }
}

impl<T> Drop for Session<T> {
    fn drop(&mut self) {
        // The transport closes its socket when dropped with us.
        let prev = SessionState::from_u8(
            self.state
                .swap(SessionState::Disconnected as u8, Ordering::SeqCst),
        );
        if prev == SessionState::Connected {
            tracing::info!("session dropped while connected, closing");
            self.dispatcher.dispatch(Event::Disconnected);
        }
    }
}
