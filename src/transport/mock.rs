//! Scripted in-memory transport for session tests.

use std::collections::VecDeque;
use std::io;
use std::sync::{Arc, Mutex};

use bytes::Bytes;
use futures::future::BoxFuture;

use crate::error::{Error, Result};
use crate::transport::Transport;
use crate::types::Endpoint;

/// What the next `read_chunk` call yields.
#[derive(Debug, Clone)]
pub(crate) enum Reply {
    Data(Bytes),
    Silence,
    Closed,
}

#[derive(Debug, Default)]
pub(crate) struct MockState {
    pub connects: usize,
    pub disconnects: usize,
    pub reads: usize,
    pub written: Vec<Bytes>,
    pub replies: VecDeque<Reply>,
    /// Bytes that arrived after their read gave up.
    pub unread: Vec<Bytes>,
    pub discarded: usize,
    pub refuse_connect: bool,
    pub fail_writes: bool,
    pub connected: bool,
}

/// Transport whose behaviour is scripted through a shared [`MockState`].
#[derive(Debug, Clone, Default)]
pub(crate) struct MockTransport {
    state: Arc<Mutex<MockState>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> std::sync::MutexGuard<'_, MockState> {
        self.state.lock().unwrap()
    }

    pub fn push_reply(&self, reply: Reply) {
        self.state().replies.push_back(reply);
    }
}

impl Transport for MockTransport {
    fn connect<'a>(&'a mut self, _endpoint: &'a Endpoint) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            let mut state = self.state();
            if state.refuse_connect {
                return Err(Error::Io(io::Error::from(io::ErrorKind::ConnectionRefused)));
            }
            state.connects += 1;
            state.connected = true;
            Ok(())
        })
    }

    fn disconnect(&mut self) -> BoxFuture<'_, Result<()>> {
        Box::pin(async move {
            let mut state = self.state();
            if state.connected {
                state.disconnects += 1;
            }
            state.connected = false;
            Ok(())
        })
    }

    fn discard_unread(&mut self) -> Result<usize> {
        let mut state = self.state();
        let n = state.unread.drain(..).map(|bytes| bytes.len()).sum();
        state.discarded += n;
        Ok(n)
    }

    fn write_frame(&mut self, frame: Bytes) -> BoxFuture<'_, Result<()>> {
        Box::pin(async move {
            let mut state = self.state();
            if !state.connected {
                return Err(Error::NotConnected);
            }
            if state.fail_writes {
                return Err(Error::Io(io::Error::from(io::ErrorKind::BrokenPipe)));
            }
            state.written.push(frame);
            Ok(())
        })
    }

    fn read_chunk(&mut self) -> BoxFuture<'_, Result<Option<Bytes>>> {
        Box::pin(async move {
            let mut state = self.state();
            state.reads += 1;
            match state.replies.pop_front().unwrap_or(Reply::Silence) {
                Reply::Data(bytes) => Ok(Some(bytes)),
                Reply::Silence => Ok(None),
                Reply::Closed => Err(Error::ConnectionClosed),
            }
        })
    }

    fn is_connected(&self) -> bool {
        self.state().connected
    }
}
