//! # yacode
//!
//! A Rust client library for Yacode label/print-head controllers.
//!
//! This library provides async communication with a controller over TCP.
//!
//! ## Features
//!
//! - Async/await based API using Tokio
//! - Framed request/reply protocol with typed command kinds
//! - Notification channels for connection status, replies and errors
//! - Failures reported as values, never as panics
//!
//! ## Quick Start
//!
//! ```no_run
//! use yacode::{DynamicContent, Session, TEXT_AND_IMAGE};
//!
//! #[tokio::main]
//! async fn main() {
//!     let session = Session::tcp();
//!     let mut events = session.subscribe();
//!
//!     if !session.connect_default("192.168.11.50").await {
//!         eprintln!("{:?}", events.recv().await);
//!         return;
//!     }
//!
//!     let content = DynamicContent::text("LOT 2024-118");
//!     if session.send_dynamic_content(TEXT_AND_IMAGE, &content).await {
//!         session.start_printing("100.ym").await;
//!     }
//!
//!     if let Some(names) = session.get_recent_template_names().await {
//!         println!("recent templates: {names:?}");
//!     }
//!
//!     session.shutdown().await;
//! }
//! ```
//!
//! ## Architecture
//!
//! The library is organized into several modules:
//!
//! - [`protocol`] - Command kinds, frame codec, messages and reply parsing
//! - [`types`] - Endpoints and dynamic content payloads
//! - [`transport`] - Transport implementations (currently TCP)
//! - [`event`] - Notification channels
//! - [`session`] - The [`Session`] state machine and reply correlation
//! - [`commands`] - Typed device requests on [`Session`]

pub mod commands;
pub mod error;
pub mod event;
pub mod protocol;
pub mod session;
pub mod transport;
pub mod types;

#[cfg(test)]
pub(crate) mod test_support;

// Re-exports for convenience
pub use error::{Error, FrameError, Result};
pub use event::{Event, EventDispatcher, EventFilter, EventKind, Subscription};
pub use protocol::{CommandKind, ProtocolMessage, decode, decode_frame, encode};
pub use session::{DEFAULT_REPLY_TIMEOUT, Session, SessionConfig, SessionState};
pub use transport::{TcpConfig, TcpTransport, Transport};
pub use types::{DEFAULT_PORT, DynamicContent, Endpoint, TEXT_AND_IMAGE};
