use thiserror::Error;

/// Represents the errors that can occur while configuring or running the
/// console server.
#[derive(Error, Debug)]
pub enum ServerError {
    /// Represents an error in the server configuration.
    ///
    /// This occurs when an invalid or inconsistent configuration is detected,
    /// such as a port of zero or a missing certificate file.
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    /// Indicates a failure while loading the TLS identity or building the
    /// TLS acceptor.
    #[error("TLS error: {0}")]
    TlsError(String),

    /// Indicates that the listener could not be bound to the requested
    /// address.
    #[error("Failed to bind {addr}: {source}")]
    BindError {
        addr: String,
        source: std::io::Error,
    },

    /// Indicates that `start` was called on a server whose accept loop is
    /// already running.
    #[error("Server already started")]
    AlreadyStarted,

    /// Indicates that an operation was attempted on a disposed server.
    #[error("Server has been disposed")]
    Disposed,

    /// Represents a general I/O error.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}
