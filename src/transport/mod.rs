//! Transport layer for Yacode communication.
//!
//! This module provides the abstraction the session drives: open one
//! connection, write whole frames, read one chunk per reply. TCP is the only
//! production transport.

pub mod tcp;

#[cfg(test)]
pub(crate) mod mock;

use bytes::Bytes;
use futures::future::BoxFuture;

use crate::error::Result;
use crate::types::Endpoint;

/// Trait for transport implementations.
pub trait Transport: Send + Sync {
    /// Opens a connection to the endpoint.
    fn connect<'a>(&'a mut self, endpoint: &'a Endpoint) -> BoxFuture<'a, Result<()>>;

    /// Flushes and closes the connection.
    ///
    /// The connection handle must be released even if this returns an error.
    fn disconnect(&mut self) -> BoxFuture<'_, Result<()>>;

    /// Drops any bytes already received but not read, without waiting.
    ///
    /// Called before each write so a reply that missed its read deadline
    /// is never taken for the reply to the next request. Returns the number
    /// of bytes dropped. A closed peer is an error.
    fn discard_unread(&mut self) -> Result<usize>;

    /// Writes a whole frame and flushes it.
    fn write_frame(&mut self, frame: Bytes) -> BoxFuture<'_, Result<()>>;

    /// Performs exactly one read.
    ///
    /// Returns `Ok(None)` if nothing arrived before the read deadline. A
    /// closed peer is an error.
    fn read_chunk(&mut self) -> BoxFuture<'_, Result<Option<Bytes>>>;

    /// Returns true if connected.
    fn is_connected(&self) -> bool;
}

pub use tcp::{TcpConfig, TcpTransport};
