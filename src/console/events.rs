use std::sync::Arc;
use tracing::error;

use crate::console::sink::ConsoleSink;
use crate::server::ServerEventHandler;

/// The console's event handlers: one log line per client lifecycle event.
///
/// Invoked from the server's connection tasks concurrently with the command
/// loop; the shared sink serializes the writes. The handlers mutate nothing,
/// so they need no synchronization of their own.
pub struct ConsoleEvents {
    sink: Arc<ConsoleSink>,
}

impl ConsoleEvents {
    pub fn new(sink: Arc<ConsoleSink>) -> Self {
        Self { sink }
    }

    fn emit(&self, line: String) {
        if let Err(e) = self.sink.line(&line) {
            error!("Console write failed: {}", e);
        }
    }
}

impl ServerEventHandler for ConsoleEvents {
    fn client_connected(&self, identity: &str) {
        self.emit(format!("Client connected: {}", identity));
    }

    fn client_disconnected(&self, identity: &str) {
        self.emit(format!("Client disconnected: {}", identity));
    }

    fn message_received(&self, identity: &str, payload: &[u8]) {
        // An empty payload renders as an empty string, never an error.
        let text = if payload.is_empty() {
            String::new()
        } else {
            String::from_utf8_lossy(payload).into_owned()
        };
        self.emit(format!("Message received from {}: {}", identity, text));
    }
}
