//! Device endpoint addressing.

use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// Default TCP port of the controller.
pub const DEFAULT_PORT: u16 = 20001;

/// Host and port of one controller.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Endpoint {
    /// Host name or IP address.
    pub host: String,
    /// TCP port.
    pub port: u16,
}

impl Endpoint {
    /// Creates an endpoint on the default port.
    #[must_use]
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: DEFAULT_PORT,
        }
    }

    /// Sets the port.
    #[must_use]
    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Returns the `host:port` string used to open the socket.
    #[must_use]
    pub fn socket_addr(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Bracket bare IPv6 literals so the port separator stays unambiguous.
        if self.host.contains(':') && !self.host.starts_with('[') {
            write!(f, "[{}]:{}", self.host, self.port)
        } else {
            write!(f, "{}:{}", self.host, self.port)
        }
    }
}

impl FromStr for Endpoint {
    type Err = Error;

    /// Parses `host` or `host:port`. IPv6 hosts with a port use brackets.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(Error::InvalidEndpoint {
                reason: "empty address".into(),
            });
        }

        let (host, port) = if let Some(rest) = s.strip_prefix('[') {
            let (host, tail) = rest.split_once(']').ok_or_else(|| Error::InvalidEndpoint {
                reason: format!("unterminated IPv6 literal: {s}"),
            })?;
            (host, tail.strip_prefix(':'))
        } else {
            match s.rsplit_once(':') {
                Some((host, port)) if !host.contains(':') => (host, Some(port)),
                _ => (s, None),
            }
        };

        if host.is_empty() {
            return Err(Error::InvalidEndpoint {
                reason: format!("missing host: {s}"),
            });
        }

        let port = match port {
            Some(p) => p.parse::<u16>().map_err(|e| Error::InvalidEndpoint {
                reason: format!("bad port {p:?}: {e}"),
            })?,
            None => DEFAULT_PORT,
        };

        Ok(Self {
            host: host.to_owned(),
            port,
        })
    }
}
