//! Shared test helpers: a loopback mock controller and tracing setup.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

use crate::event::{Event, Subscription};
use crate::protocol::{CommandKind, ProtocolMessage, decode, encode};

type Responder = dyn Fn(&ProtocolMessage) -> Option<ProtocolMessage> + Send + Sync;
type Delay = dyn Fn(&ProtocolMessage) -> Duration + Send + Sync;

/// Installs a test subscriber honouring `RUST_LOG`.
pub(crate) fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Collects every event already queued on a subscription.
pub(crate) fn drain(subscription: &mut Subscription) -> Vec<Event> {
    std::iter::from_fn(|| subscription.try_recv()).collect()
}

/// A controller stand-in listening on 127.0.0.1.
///
/// Each received frame is decoded, recorded and passed to the responder;
/// a returned message is written back as one frame, optionally after a
/// per-request delay.
pub(crate) struct MockDevice {
    port: u16,
    accepts: Arc<AtomicUsize>,
    received: Arc<Mutex<Vec<ProtocolMessage>>>,
    task: JoinHandle<()>,
}

impl MockDevice {
    pub const STATUS_REPLY: &'static str = r#"{"status":"idle"}"#;

    /// Replies to status queries only.
    pub fn status_responder(request: &ProtocolMessage) -> Option<ProtocolMessage> {
        (request.kind() == CommandKind::SystemStatus)
            .then(|| ProtocolMessage::new(CommandKind::SystemStatus, Self::STATUS_REPLY))
    }

    pub async fn start<F>(responder: F) -> Self
    where
        F: Fn(&ProtocolMessage) -> Option<ProtocolMessage> + Send + Sync + 'static,
    {
        Self::start_with_delay(responder, |_| Duration::ZERO).await
    }

    /// Like [`MockDevice::start`], holding each reply back for `delay(request)`.
    pub async fn start_with_delay<F, D>(responder: F, delay: D) -> Self
    where
        F: Fn(&ProtocolMessage) -> Option<ProtocolMessage> + Send + Sync + 'static,
        D: Fn(&ProtocolMessage) -> Duration + Send + Sync + 'static,
    {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let accepts = Arc::new(AtomicUsize::new(0));
        let received = Arc::new(Mutex::new(Vec::new()));
        let responder: Arc<Responder> = Arc::new(responder);
        let delay: Arc<Delay> = Arc::new(delay);

        let task = {
            let accepts = Arc::clone(&accepts);
            let received = Arc::clone(&received);
            tokio::spawn(async move {
                while let Ok((stream, _)) = listener.accept().await {
                    accepts.fetch_add(1, Ordering::SeqCst);
                    tokio::spawn(serve(
                        stream,
                        Arc::clone(&responder),
                        Arc::clone(&delay),
                        Arc::clone(&received),
                    ));
                }
            })
        };

        Self {
            port,
            accepts,
            received,
            task,
        }
    }

    /// Returns a port nothing is listening on.
    pub async fn unused_port() -> u16 {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        listener.local_addr().unwrap().port()
    }

    pub const fn port(&self) -> u16 {
        self.port
    }

    pub fn accepts(&self) -> usize {
        self.accepts.load(Ordering::SeqCst)
    }

    pub fn received(&self) -> Vec<ProtocolMessage> {
        self.received.lock().unwrap().clone()
    }
}

impl Drop for MockDevice {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn serve(
    mut stream: TcpStream,
    responder: Arc<Responder>,
    delay: Arc<Delay>,
    received: Arc<Mutex<Vec<ProtocolMessage>>>,
) {
    let mut buf = vec![0u8; 8192];
    loop {
        let n = match stream.read(&mut buf).await {
            Ok(0) | Err(_) => return,
            Ok(n) => n,
        };
        let Some(request) = decode(&buf[..n]) else {
            continue;
        };
        let reply = responder(&request);
        let pause = delay(&request);
        received.lock().unwrap().push(request);

        if let Some(reply) = reply {
            if !pause.is_zero() {
                tokio::time::sleep(pause).await;
            }
            if stream.write_all(&encode(&reply)).await.is_err() {
                return;
            }
        }
    }
}
