//! WebSocket transport implementation using `tokio-tungstenite`.
//!
//! Every admitted peer gets two tasks: a reader that turns frames into
//! [`TransportEvent`]s on a shared channel, and a writer that drains an
//! outbound queue into the socket. The relay core only ever sees the shared
//! event channel and the non-blocking [`Transport::send`].
//!
//! Admission happens during the HTTP upgrade: the peer must present the
//! connection key, either in the [`CONNECTION_KEY_HEADER`] header or as the
//! [`CONNECTION_KEY_QUERY`] query parameter. Peers without it are refused
//! with `403 Forbidden` and never produce an event.

use std::borrow::Cow;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use bytes::Bytes;
use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::handshake::server::{
    ErrorResponse, Request, Response,
};
use tokio_tungstenite::tungstenite::http::StatusCode;

use crate::{
    ConnectionId, DeliveryMode, Transport, TransportError, TransportEvent,
};

/// Header a peer may use to present the connection key.
pub const CONNECTION_KEY_HEADER: &str = "x-connection-key";

/// Query parameter a peer may use to present the connection key
/// (for clients that cannot set upgrade headers, such as browsers).
pub const CONNECTION_KEY_QUERY: &str = "key";

/// Upper bound on events handed out by a single `poll_events` call.
const EVENT_BATCH_LIMIT: usize = 256;

/// Packets that may wait in one peer's outbound queue before `send` starts
/// failing with [`TransportError::QueueFull`].
const PEER_QUEUE_CAPACITY: usize = 1024;

/// Counter for generating unique connection IDs.
static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(1);

/// Outbound queues of every admitted peer.
type PeerMap = Arc<Mutex<HashMap<ConnectionId, mpsc::Sender<Message>>>>;

/// A WebSocket-based [`Transport`] listening on a TCP socket.
pub struct WebSocketTransport {
    local_addr: SocketAddr,
    events: mpsc::UnboundedReceiver<TransportEvent>,
    peers: PeerMap,
    accept_task: JoinHandle<()>,
    stopped: bool,
}

impl WebSocketTransport {
    /// Binds a new WebSocket transport to the given address.
    ///
    /// `connection_key` is the shared secret peers must present to be
    /// admitted.
    pub async fn bind(
        addr: &str,
        connection_key: impl Into<String>,
    ) -> Result<Self, TransportError> {
        let listener =
            TcpListener::bind(addr).await.map_err(TransportError::BindFailed)?;
        let local_addr =
            listener.local_addr().map_err(TransportError::BindFailed)?;

        let (event_tx, events) = mpsc::unbounded_channel();
        let peers = PeerMap::default();
        let key: Arc<str> = Arc::from(connection_key.into());

        let accept_task = tokio::spawn(accept_loop(
            listener,
            key,
            Arc::clone(&peers),
            event_tx,
        ));

        tracing::info!(%local_addr, "WebSocket transport listening");
        Ok(Self {
            local_addr,
            events,
            peers,
            accept_task,
            stopped: false,
        })
    }

    /// Returns the address the listener is bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Returns the number of currently admitted peers.
    pub fn peer_count(&self) -> usize {
        lock(&self.peers).len()
    }
}

impl Transport for WebSocketTransport {
    async fn poll_events(&mut self, events: &mut Vec<TransportEvent>) -> usize {
        if self.stopped {
            return 0;
        }
        self.events.recv_many(events, EVENT_BATCH_LIMIT).await
    }

    fn send(
        &self,
        connection: ConnectionId,
        data: Bytes,
        mode: DeliveryMode,
    ) -> Result<(), TransportError> {
        if self.stopped {
            return Err(TransportError::Shutdown);
        }
        // WebSocket frames are always reliable and ordered, so every mode
        // degrades to that.
        if mode != DeliveryMode::ReliableOrdered {
            tracing::trace!(%connection, ?mode, "delivering as reliable-ordered");
        }
        let peers = lock(&self.peers);
        let queue = peers
            .get(&connection)
            .ok_or(TransportError::UnknownConnection(connection))?;
        enqueue(queue, connection, Message::Binary(data))
    }

    async fn shutdown(&mut self) -> Result<(), TransportError> {
        if self.stopped {
            return Ok(());
        }
        self.stopped = true;
        self.accept_task.abort();

        // Dropping the queues lets each writer flush and send a close frame.
        let dropped = {
            let mut peers = lock(&self.peers);
            let count = peers.len();
            peers.clear();
            count
        };
        tracing::info!(peers = dropped, "WebSocket transport shut down");
        Ok(())
    }
}

impl Drop for WebSocketTransport {
    fn drop(&mut self) {
        self.accept_task.abort();
    }
}

/// Locks the peer map, recovering the data if a holder panicked.
fn lock(
    peers: &PeerMap,
) -> MutexGuard<'_, HashMap<ConnectionId, mpsc::Sender<Message>>> {
    peers.lock().unwrap_or_else(PoisonError::into_inner)
}

async fn accept_loop(
    listener: TcpListener,
    key: Arc<str>,
    peers: PeerMap,
    events: mpsc::UnboundedSender<TransportEvent>,
) {
    loop {
        match listener.accept().await {
            Ok((stream, peer)) => {
                tracing::debug!(%peer, "connection request");
                tokio::spawn(serve_connection(
                    stream,
                    peer,
                    Arc::clone(&key),
                    Arc::clone(&peers),
                    events.clone(),
                ));
            }
            Err(e) => {
                let event = TransportEvent::Error {
                    peer: None,
                    error: TransportError::AcceptFailed(e),
                };
                if events.send(event).is_err() {
                    break;
                }
            }
        }
    }
}

/// Runs one peer from upgrade to close.
async fn serve_connection(
    stream: TcpStream,
    peer: SocketAddr,
    key: Arc<str>,
    peers: PeerMap,
    events: mpsc::UnboundedSender<TransportEvent>,
) {
    let callback = |request: &Request, response: Response| {
        admit(request, response, &key)
    };
    let ws = match tokio_tungstenite::accept_hdr_async(stream, callback).await {
        Ok(ws) => ws,
        Err(e) => {
            tracing::info!(%peer, error = %e, "connection refused");
            return;
        }
    };

    let connection =
        ConnectionId::new(NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed));
    let (mut sink, mut inbound) = ws.split();
    let (queue_tx, mut queue_rx) = mpsc::channel::<Message>(PEER_QUEUE_CAPACITY);
    lock(&peers).insert(connection, queue_tx);
    tracing::debug!(%connection, %peer, "accepted WebSocket connection");

    if events
        .send(TransportEvent::Connected { connection, peer })
        .is_err()
    {
        lock(&peers).remove(&connection);
        return;
    }

    tokio::spawn(async move {
        while let Some(message) = queue_rx.recv().await {
            if let Err(e) = sink.send(message).await {
                tracing::debug!(%connection, error = %e, "write failed");
                return;
            }
        }
        let _ = sink.close().await;
    });

    let reason = loop {
        let data = match inbound.next().await {
            Some(Ok(Message::Binary(data))) => data,
            Some(Ok(Message::Text(text))) => {
                Bytes::copy_from_slice(text.as_bytes())
            }
            Some(Ok(Message::Close(_))) | None => {
                break String::from("closed by peer");
            }
            Some(Ok(_)) => continue, // ping/pong/raw frame
            Some(Err(e)) => break e.to_string(),
        };
        let event = TransportEvent::Received {
            connection,
            data,
            mode: DeliveryMode::ReliableOrdered,
        };
        if events.send(event).is_err() {
            break String::from("transport stopped");
        }
    };

    // Removing the queue ends the writer task.
    lock(&peers).remove(&connection);
    let _ = events.send(TransportEvent::Disconnected { connection, reason });
}

/// Queues `message` for a peer's writer without waiting.
fn enqueue(
    queue: &mpsc::Sender<Message>,
    connection: ConnectionId,
    message: Message,
) -> Result<(), TransportError> {
    queue.try_send(message).map_err(|e| match e {
        TrySendError::Full(_) => TransportError::QueueFull(connection),
        TrySendError::Closed(_) => TransportError::ConnectionClosed(connection),
    })
}

/// Handshake callback: accepts the upgrade only if the key matches.
fn admit(
    request: &Request,
    response: Response,
    key: &str,
) -> Result<Response, ErrorResponse> {
    if presented_key(request).is_some_and(|p| keys_match(p.as_bytes(), key.as_bytes())) {
        return Ok(response);
    }
    let mut refusal = ErrorResponse::new(Some("invalid connection key".into()));
    *refusal.status_mut() = StatusCode::FORBIDDEN;
    Err(refusal)
}

/// The key from the header, or else the percent-decoded `key` query value.
fn presented_key(request: &Request) -> Option<Cow<'_, str>> {
    if let Some(value) = request
        .headers()
        .get(CONNECTION_KEY_HEADER)
        .and_then(|v| v.to_str().ok())
    {
        return Some(Cow::Borrowed(value));
    }
    let query = request.uri().query()?;
    url::form_urlencoded::parse(query.as_bytes())
        .find(|(name, _)| name == CONNECTION_KEY_QUERY)
        .map(|(_, value)| value)
}

/// Byte comparison whose running time depends only on the lengths.
fn keys_match(presented: &[u8], expected: &[u8]) -> bool {
    if presented.len() != expected.len() {
        return false;
    }
    presented
        .iter()
        .zip(expected)
        .fold(0u8, |diff, (a, b)| diff | (a ^ b))
        == 0
}
