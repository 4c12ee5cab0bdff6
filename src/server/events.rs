/// Callback seam between the server and whoever is observing it.
///
/// The server invokes these methods from its own connection tasks, so an
/// implementation must tolerate concurrent calls from multiple clients as
/// well as calls racing with control operations on the server handle. Bodies
/// are expected to be quick; a handler that blocks stalls only the connection
/// that invoked it.
///
/// For one client the invocation order is fixed: `client_connected`, then
/// zero or more `message_received`, then `client_disconnected`. No order is
/// guaranteed across different clients.
pub trait ServerEventHandler: Send + Sync + 'static {
    /// A client finished connecting (and, when TLS is enabled, completed the
    /// handshake). `identity` is the peer's `host:port` token.
    fn client_connected(&self, identity: &str);

    /// A client's connection ended, whether by its own close, a `disconnect`
    /// call, or a transport error.
    fn client_disconnected(&self, identity: &str);

    /// A chunk of payload bytes arrived from a client. Payloads are the raw
    /// chunks the transport yields; the server imposes no framing on them.
    fn message_received(&self, identity: &str, payload: &[u8]);
}
