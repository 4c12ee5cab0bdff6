use std::sync::Arc;
use uuid::Uuid;
use dashmap::DashMap;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::{mpsc, oneshot, Notify};
use tracing::{debug, error};

/// A write queued for delivery to one client.
///
/// When `ack` is present the writer task reports whether the payload reached
/// the transport; otherwise the write is fire-and-forget.
pub(crate) struct SendRequest {
    pub payload: Vec<u8>,
    pub ack: Option<oneshot::Sender<bool>>,
}

/// One active client connection, addressable by its peer identity string.
///
/// Owns the sending side of the connection: payloads are queued on an
/// unbounded channel and drained by a dedicated writer task, so callers never
/// contend on the socket itself.
pub struct ClientConnection {
    /// Unique identifier for this connection. A reconnect from the same peer
    /// address is a new connection with a new id even though the identity
    /// string repeats.
    pub id: Uuid,
    /// The peer's `host:port` identity token.
    pub identity: String,
    /// Channel feeding the writer task.
    sender: mpsc::UnboundedSender<SendRequest>,
    /// Signal that asks the connection's read loop to shut down.
    shutdown: Arc<Notify>,
}

impl ClientConnection {
    /// Creates a connection around the write half of an accepted stream and
    /// spawns its writer task.
    pub(crate) fn new<W>(identity: String, writer: W, shutdown: Arc<Notify>) -> Self
    where
        W: AsyncWrite + Unpin + Send + 'static,
    {
        let (sender, mut receiver) = mpsc::unbounded_channel::<SendRequest>();
        let id = Uuid::new_v4();

        tokio::spawn({
            let identity = identity.clone();
            async move {
                let mut writer = writer;
                while let Some(request) = receiver.recv().await {
                    let delivered = writer.write_all(&request.payload).await.is_ok()
                        && writer.flush().await.is_ok();
                    if let Some(ack) = request.ack {
                        let _ = ack.send(delivered);
                    }
                    if !delivered {
                        error!("Write to {} failed, stopping writer", identity);
                        break;
                    }
                }
                let _ = writer.shutdown().await;
                debug!("Writer task for {} finished", identity);
            }
        });

        ClientConnection {
            id,
            identity,
            sender,
            shutdown,
        }
    }

    /// Queues a payload for delivery. Returns `false` if the writer task has
    /// already stopped.
    pub(crate) fn queue(&self, payload: &[u8], ack: Option<oneshot::Sender<bool>>) -> bool {
        self.sender
            .send(SendRequest {
                payload: payload.to_vec(),
                ack,
            })
            .is_ok()
    }

    /// Asks the connection's read loop to terminate, which tears the
    /// connection down and fires the disconnect event.
    pub(crate) fn request_disconnect(&self) {
        self.shutdown.notify_one();
    }
}

/// Tracks the set of active client connections by identity string.
pub struct ClientRegistry {
    clients: Arc<DashMap<String, ClientConnection>>,
}

// Manual Clone implementation
impl Clone for ClientRegistry {
    fn clone(&self) -> Self {
        ClientRegistry {
            clients: Arc::clone(&self.clients),
        }
    }
}

impl ClientRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self {
            clients: Arc::new(DashMap::new()),
        }
    }

    /// Adds a connection, replacing any stale entry with the same identity.
    pub(crate) fn add(&self, connection: ClientConnection) {
        self.clients.insert(connection.identity.clone(), connection);
    }

    /// Removes the connection with the given identity, but only if it is
    /// still the connection identified by `id`. A reconnect from the same
    /// peer address must not be evicted by its predecessor's cleanup.
    pub(crate) fn remove(&self, identity: &str, id: Uuid) {
        self.clients.remove_if(identity, |_, connection| {
            let same_connection = connection.id == id;
            if same_connection {
                debug!("Removing client {} ({})", identity, id);
            }
            same_connection
        });
    }

    /// Queues a payload for the given identity. Returns `false` when the
    /// identity is unknown or its writer has stopped.
    pub(crate) fn queue_send(
        &self,
        identity: &str,
        payload: &[u8],
        ack: Option<oneshot::Sender<bool>>,
    ) -> bool {
        match self.clients.get(identity) {
            Some(connection) => connection.queue(payload, ack),
            None => false,
        }
    }

    /// Signals the given identity's connection to shut down. Unknown
    /// identities are a silent no-op.
    pub(crate) fn disconnect(&self, identity: &str) {
        if let Some(connection) = self.clients.get(identity) {
            connection.request_disconnect();
        }
    }

    /// Signals every connection to shut down.
    pub(crate) fn disconnect_all(&self) {
        for entry in self.clients.iter() {
            entry.value().request_disconnect();
        }
    }

    /// The identities of all active connections, in registry order.
    pub fn list(&self) -> Vec<String> {
        self.clients.iter().map(|entry| entry.key().clone()).collect()
    }

    /// Number of active connections.
    pub fn len(&self) -> usize {
        self.clients.len()
    }

    /// Whether the registry has no active connections.
    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }
}

impl Default for ClientRegistry {
    fn default() -> Self {
        Self::new()
    }
}
