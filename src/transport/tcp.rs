//! TCP transport implementation.
//!
//! This module provides the socket transport for controllers reachable on
//! the local network.

use std::io;
use std::time::Duration;

use bytes::Bytes;
use futures::future::BoxFuture;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

use crate::error::{Error, Result};
use crate::transport::Transport;
use crate::types::Endpoint;

/// Default time allowed for the TCP handshake.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Default time to wait for a reply after a write.
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(3);

/// Default size of the single reply read.
pub const DEFAULT_READ_BUFFER_SIZE: usize = 4096;

/// Configuration for TCP transport.
#[derive(Debug, Clone)]
pub struct TcpConfig {
    /// Time allowed for the TCP handshake.
    pub connect_timeout: Duration,
    /// Time to wait for reply bytes after a write.
    pub read_timeout: Duration,
    /// Maximum bytes taken by one read.
    pub read_buffer_size: usize,
    /// Disable Nagle's algorithm.
    pub nodelay: bool,
}

impl Default for TcpConfig {
    fn default() -> Self {
        Self {
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            read_timeout: DEFAULT_READ_TIMEOUT,
            read_buffer_size: DEFAULT_READ_BUFFER_SIZE,
            nodelay: true,
        }
    }
}

impl TcpConfig {
    /// Creates a new TCP configuration with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the connect timeout.
    #[must_use]
    pub const fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Sets the read timeout.
    #[must_use]
    pub const fn read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }

    /// Sets the read buffer size.
    #[must_use]
    pub const fn read_buffer_size(mut self, size: usize) -> Self {
        self.read_buffer_size = size;
        self
    }

    /// Enables or disables `TCP_NODELAY`.
    #[must_use]
    pub const fn nodelay(mut self, nodelay: bool) -> Self {
        self.nodelay = nodelay;
        self
    }
}

/// TCP transport for Yacode communication.
#[derive(Debug)]
pub struct TcpTransport {
    config: TcpConfig,
    stream: Option<TcpStream>,
    buf: Vec<u8>,
}

impl TcpTransport {
    /// Creates a new TCP transport with the given configuration.
    #[must_use]
    pub fn new(config: TcpConfig) -> Self {
        let buf = vec![0u8; config.read_buffer_size.max(1)];
        Self {
            config,
            stream: None,
            buf,
        }
    }

    /// Returns the configuration.
    #[must_use]
    pub const fn config(&self) -> &TcpConfig {
        &self.config
    }
}

impl Default for TcpTransport {
    fn default() -> Self {
        Self::new(TcpConfig::default())
    }
}

impl Transport for TcpTransport {
    fn connect<'a>(&'a mut self, endpoint: &'a Endpoint) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            if self.stream.is_some() {
                return Ok(());
            }

            let addr = endpoint.socket_addr();
            tracing::info!("connecting to {}", addr);

            let stream = tokio::time::timeout(self.config.connect_timeout, TcpStream::connect(&addr))
                .await
                .map_err(|_| Error::timeout(self.config.connect_timeout))??;

            if self.config.nodelay {
                if let Err(e) = stream.set_nodelay(true) {
                    tracing::warn!("failed to set TCP_NODELAY: {}", e);
                }
            }

            self.stream = Some(stream);
            tracing::info!("connected to {}", addr);
            Ok(())
        })
    }

    fn disconnect(&mut self) -> BoxFuture<'_, Result<()>> {
        Box::pin(async move {
            // Taking the stream first releases the socket on every path.
            let Some(mut stream) = self.stream.take() else {
                return Ok(());
            };

            tracing::info!("disconnecting");
            stream.flush().await?;
            stream.shutdown().await?;
            Ok(())
        })
    }

    fn discard_unread(&mut self) -> Result<usize> {
        let Some(stream) = self.stream.as_ref() else {
            return Ok(0);
        };

        let mut discarded = 0;
        loop {
            match stream.try_read(&mut self.buf) {
                Ok(0) => {
                    tracing::debug!("connection closed by peer");
                    return Err(Error::ConnectionClosed);
                }
                Ok(n) => {
                    tracing::trace!("discarding {} bytes: {}", n, hex::encode(&self.buf[..n]));
                    discarded += n;
                }
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => return Ok(discarded),
                Err(e) => return Err(Error::Io(e)),
            }
        }
    }

    fn write_frame(&mut self, frame: Bytes) -> BoxFuture<'_, Result<()>> {
        Box::pin(async move {
            let stream = self.stream.as_mut().ok_or(Error::NotConnected)?;

            tracing::trace!("sending frame: {}", hex::encode(&frame));
            stream.write_all(&frame).await?;
            stream.flush().await?;
            Ok(())
        })
    }

    fn read_chunk(&mut self) -> BoxFuture<'_, Result<Option<Bytes>>> {
        Box::pin(async move {
            let stream = self.stream.as_mut().ok_or(Error::NotConnected)?;

            let n = match tokio::time::timeout(self.config.read_timeout, stream.read(&mut self.buf))
                .await
            {
                Err(_) => {
                    tracing::debug!("no reply within {:?}", self.config.read_timeout);
                    return Ok(None);
                }
                Ok(Ok(0)) => {
                    tracing::debug!("connection closed by peer");
                    return Err(Error::ConnectionClosed);
                }
                Ok(Ok(n)) => n,
                Ok(Err(e)) => {
                    tracing::error!("read error: {}", e);
                    return Err(Error::Io(e));
                }
            };

            tracing::trace!("received {} bytes: {}", n, hex::encode(&self.buf[..n]));
            Ok(Some(Bytes::copy_from_slice(&self.buf[..n])))
        })
    }

    fn is_connected(&self) -> bool {
        self.stream.is_some()
    }
}
