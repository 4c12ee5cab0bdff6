// src/server/mod.rs
pub mod client;
pub mod events;
pub mod handler;
pub mod stream;

// Re-export public components
pub use client::{ClientConnection, ClientRegistry};
pub use events::ServerEventHandler;

// Import internal dependencies
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::config::ServerConfig;
use crate::utils::error::ServerError;

/// State shared between the server handle and its connection tasks.
pub(crate) struct ServerState {
    pub registry: ClientRegistry,
    pub events: Arc<dyn ServerEventHandler>,
    pub debug: AtomicBool,
}

/// The server collaborator driven by the operator console.
///
/// Owns the set of active client connections, a debug-logging flag, and a
/// rotatable preshared key. Event handlers are injected at construction and
/// therefore registered before `start` can run, so no early event can be
/// missed. Exactly one instance exists per process run.
///
/// All control operations are safe to call concurrently with the connection
/// tasks delivering events.
pub struct ConsoleServer {
    config: Arc<ServerConfig>,
    state: Arc<ServerState>,
    tls_acceptor: Option<Arc<tokio_native_tls::TlsAcceptor>>,
    preshared_key: RwLock<Option<String>>,
    accept_invalid_certs: AtomicBool,
    mutually_authenticate: AtomicBool,
    accept_task: Mutex<Option<JoinHandle<()>>>,
    local_addr: Mutex<Option<SocketAddr>>,
    disposed: AtomicBool,
}

impl ConsoleServer {
    /// Creates a server from a validated configuration, registering the
    /// event handler that connection tasks will invoke.
    ///
    /// The TLS acceptor is built here, so a bad certificate path or password
    /// fails construction rather than the first connection.
    ///
    /// # Errors
    /// Returns `ServerError` if the configuration is invalid or the TLS
    /// identity cannot be loaded.
    pub fn new(
        config: ServerConfig,
        events: Arc<dyn ServerEventHandler>,
    ) -> Result<Self, ServerError> {
        config.validate()?;
        let tls_acceptor = config.create_tls_acceptor()?;

        Ok(Self {
            config: Arc::new(config),
            state: Arc::new(ServerState {
                registry: ClientRegistry::new(),
                events,
                debug: AtomicBool::new(false),
            }),
            tls_acceptor,
            preshared_key: RwLock::new(None),
            accept_invalid_certs: AtomicBool::new(false),
            mutually_authenticate: AtomicBool::new(false),
            accept_task: Mutex::new(None),
            local_addr: Mutex::new(None),
            disposed: AtomicBool::new(false),
        })
    }

    /// Binds the listener and spawns the accept loop.
    ///
    /// Returns once the loop is running; the server then accepts connections
    /// for the remainder of the process lifetime or until `dispose`.
    ///
    /// # Errors
    /// Returns `ServerError::BindError` if the address cannot be bound,
    /// `ServerError::AlreadyStarted` on a second call, and
    /// `ServerError::Disposed` after `dispose`.
    pub async fn start(&self) -> Result<(), ServerError> {
        if self.disposed.load(Ordering::SeqCst) {
            return Err(ServerError::Disposed);
        }

        let addr = self.config.bind_address();
        let listener = TcpListener::bind(&addr).await.map_err(|e| ServerError::BindError {
            addr: addr.clone(),
            source: e,
        })?;
        let local_addr = listener.local_addr()?;

        {
            let mut task = self.accept_task.lock().unwrap();
            if task.is_some() {
                return Err(ServerError::AlreadyStarted);
            }
            *task = Some(tokio::spawn(handler::accept_connections(
                listener,
                self.tls_acceptor.clone(),
                self.state.clone(),
            )));
        }

        *self.local_addr.lock().unwrap() = Some(local_addr);
        info!("Server listening on {}", local_addr);
        Ok(())
    }

    /// Tears the server down: stops accepting and disconnects every client.
    ///
    /// Connection teardown still delivers each client's disconnect event.
    /// Further `send` calls return `false`; a later `start` fails with
    /// `ServerError::Disposed`. Idempotent.
    pub fn dispose(&self) {
        if self.disposed.swap(true, Ordering::SeqCst) {
            return;
        }

        if let Some(task) = self.accept_task.lock().unwrap().take() {
            task.abort();
        }
        self.state.registry.disconnect_all();
        info!("Server disposed");
    }

    /// The identities of all active clients, in registry order.
    pub fn list_clients(&self) -> Vec<String> {
        self.state.registry.list()
    }

    /// Queues a payload for the given client.
    ///
    /// Returns `true` if the payload was handed to the connection's writer,
    /// `false` for an unknown identity or a disposed server. Delivery itself
    /// is not awaited; use [`send_async`](Self::send_async) for that.
    pub fn send(&self, identity: &str, payload: &[u8]) -> bool {
        if self.disposed.load(Ordering::SeqCst) {
            return false;
        }
        self.state.registry.queue_send(identity, payload, None)
    }

    /// Sends a payload to the given client and waits until the connection's
    /// writer has flushed it to the transport.
    ///
    /// Returns `false` for an unknown identity, a disposed server, or a
    /// write failure.
    pub async fn send_async(&self, identity: &str, payload: &[u8]) -> bool {
        if self.disposed.load(Ordering::SeqCst) {
            return false;
        }

        let (ack, delivered) = oneshot::channel();
        if !self.state.registry.queue_send(identity, payload, Some(ack)) {
            return false;
        }
        delivered.await.unwrap_or(false)
    }

    /// Disconnects the given client. Unknown identities (including the empty
    /// string) are a silent no-op; the disconnect event fires from the
    /// connection's own teardown.
    pub fn disconnect(&self, identity: &str) {
        self.state.registry.disconnect(identity);
    }

    /// Current value of the debug-logging flag.
    pub fn debug(&self) -> bool {
        self.state.debug.load(Ordering::Relaxed)
    }

    /// Sets the debug-logging flag.
    pub fn set_debug(&self, enabled: bool) {
        self.state.debug.store(enabled, Ordering::Relaxed);
    }

    /// Flips the debug-logging flag and returns the new value.
    pub fn toggle_debug(&self) -> bool {
        !self.state.debug.fetch_xor(true, Ordering::Relaxed)
    }

    /// The preshared key clients authenticate with, if one has been set.
    pub fn preshared_key(&self) -> Option<String> {
        self.preshared_key.read().unwrap().clone()
    }

    /// Rotates the preshared key. Takes effect for subsequent authentication
    /// attempts; established connections are unaffected.
    pub fn set_preshared_key(&self, key: impl Into<String>) {
        let key = key.into();
        debug!("Preshared key rotated ({} bytes)", key.len());
        *self.preshared_key.write().unwrap() = Some(key);
    }

    /// Whether invalid peer certificates are accepted.
    pub fn accept_invalid_certs(&self) -> bool {
        self.accept_invalid_certs.load(Ordering::Relaxed)
    }

    /// Records the accept-invalid-certificates policy flag.
    pub fn set_accept_invalid_certs(&self, accept: bool) {
        self.accept_invalid_certs.store(accept, Ordering::Relaxed);
    }

    /// Whether clients are required to present a certificate of their own.
    pub fn mutually_authenticate(&self) -> bool {
        self.mutually_authenticate.load(Ordering::Relaxed)
    }

    /// Records the mutual-authentication policy flag.
    pub fn set_mutually_authenticate(&self, mutual: bool) {
        self.mutually_authenticate.store(mutual, Ordering::Relaxed);
    }

    /// The address the listener is bound to, once `start` has succeeded.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        *self.local_addr.lock().unwrap()
    }

    /// The configuration the server was constructed with.
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }
}
