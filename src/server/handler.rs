use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::Ordering;
use tokio::io::{AsyncReadExt, ReadHalf};
use tokio::net::TcpListener;
use tokio::sync::Notify;
use tokio_native_tls::TlsAcceptor;
use tracing::{debug, error, info, instrument};

use crate::server::{ClientConnection, ServerState};
use crate::server::stream::ServerStream;

/// Size of the per-connection read buffer. Each nonempty read yields one
/// `message_received` callback with exactly the bytes the transport produced.
const READ_BUFFER_SIZE: usize = 4096;

/// Main connection acceptance loop.
///
/// Runs until the owning server aborts it via `dispose`. Each accepted
/// connection gets its own task; a failed TLS handshake drops only that
/// connection.
pub(crate) async fn accept_connections(
    listener: TcpListener,
    tls_acceptor: Option<Arc<TlsAcceptor>>,
    state: Arc<ServerState>,
) {
    loop {
        match listener.accept().await {
            Ok((stream, addr)) => {
                let state = state.clone();
                let tls_acceptor = tls_acceptor.clone();
                tokio::spawn(async move {
                    let stream = match &tls_acceptor {
                        Some(acceptor) => match acceptor.accept(stream).await {
                            Ok(tls_stream) => ServerStream::Tls(tls_stream),
                            Err(e) => {
                                error!("TLS handshake failed for {}: {}", addr, e);
                                return;
                            }
                        },
                        None => ServerStream::Plain(stream),
                    };

                    handle_connection(stream, addr, state).await;
                });
            }
            Err(e) => error!("Accept error: {}", e),
        }
    }
}

/// Drives one client connection from registration to teardown.
///
/// Fires `client_connected` before entering the read loop and
/// `client_disconnected` after leaving it, so per-client event order is
/// connect, messages, disconnect.
#[instrument(skip(stream, state))]
pub(crate) async fn handle_connection(stream: ServerStream, addr: SocketAddr, state: Arc<ServerState>) {
    let identity = addr.to_string();
    let shutdown = Arc::new(Notify::new());

    let (reader, writer) = tokio::io::split(stream);
    let connection = ClientConnection::new(identity.clone(), writer, shutdown.clone());
    let connection_id = connection.id;

    state.registry.add(connection);
    if state.debug.load(Ordering::Relaxed) {
        debug!("Client {} registered as {}", identity, connection_id);
    }
    state.events.client_connected(&identity);

    read_loop(reader, &identity, &shutdown, &state).await;

    state.registry.remove(&identity, connection_id);
    if state.debug.load(Ordering::Relaxed) {
        debug!("Client {} ({}) removed", identity, connection_id);
    }
    state.events.client_disconnected(&identity);
}

/// Reads payload chunks from the client until EOF, a transport error, or a
/// disconnect request, delivering each chunk to the message callback.
async fn read_loop(
    mut reader: ReadHalf<ServerStream>,
    identity: &str,
    shutdown: &Notify,
    state: &ServerState,
) {
    let mut buffer = vec![0u8; READ_BUFFER_SIZE];

    loop {
        tokio::select! {
            _ = shutdown.notified() => {
                info!("Disconnect requested for {}", identity);
                break;
            }
            read = reader.read(&mut buffer) => match read {
                Ok(0) => {
                    if state.debug.load(Ordering::Relaxed) {
                        debug!("Client {} closed the connection", identity);
                    }
                    break;
                }
                Ok(n) => state.events.message_received(identity, &buffer[..n]),
                Err(e) => {
                    error!("Read error from {}: {}", identity, e);
                    break;
                }
            }
        }
    }
}
