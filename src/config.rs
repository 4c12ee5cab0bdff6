use std::{fs, path::PathBuf, sync::Arc};
use config::Config;
use serde::Deserialize;
use tokio_native_tls::TlsAcceptor;
use crate::utils::error::ServerError;

/// TLS identity settings collected at startup.
///
/// The certificate file is a PKCS#12 archive holding the server certificate
/// and private key, unlocked with `cert_password`.
#[derive(Debug, Clone)]
pub struct TlsSettings {
    /// Path to the PKCS#12 certificate file.
    pub cert_file: PathBuf,
    /// Password protecting the certificate file.
    pub cert_password: String,
}

/// Configuration settings for the console server.
///
/// Built once at startup from operator input and immutable afterwards. The
/// TLS-only fields are structurally absent when TLS is disabled.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// The address the server will bind to.
    pub bind_addr: String,
    /// The port on which the server will listen.
    pub port: u16,
    /// TLS identity settings, present only when TLS is enabled.
    pub tls: Option<TlsSettings>,
}

impl ServerConfig {
    /// Creates a plaintext server configuration.
    pub fn plain(bind_addr: impl Into<String>, port: u16) -> Self {
        Self {
            bind_addr: bind_addr.into(),
            port,
            tls: None,
        }
    }

    /// Creates a TLS server configuration backed by a PKCS#12 identity file.
    pub fn with_tls(
        bind_addr: impl Into<String>,
        port: u16,
        cert_file: impl Into<PathBuf>,
        cert_password: impl Into<String>,
    ) -> Self {
        Self {
            bind_addr: bind_addr.into(),
            port,
            tls: Some(TlsSettings {
                cert_file: cert_file.into(),
                cert_password: cert_password.into(),
            }),
        }
    }

    /// The `host:port` string the listener binds to.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.bind_addr, self.port)
    }

    /// Validates the configuration settings.
    ///
    /// Ensures the bind address is non-empty, the port is nonzero, and the
    /// certificate file exists when TLS is enabled.
    ///
    /// # Errors
    /// Returns a `ServerError::ConfigurationError` if validation fails.
    pub fn validate(&self) -> Result<(), ServerError> {
        if self.bind_addr.is_empty() {
            return Err(ServerError::ConfigurationError(
                "bind address must not be empty".into(),
            ));
        }

        if self.port == 0 {
            return Err(ServerError::ConfigurationError(
                "port must be greater than 0".into(),
            ));
        }

        if let Some(tls) = &self.tls {
            if !tls.cert_file.exists() {
                return Err(ServerError::ConfigurationError(format!(
                    "Certificate file not found: {:?}",
                    tls.cert_file
                )));
            }
        }

        Ok(())
    }

    /// Creates a TLS acceptor for secure connections.
    ///
    /// If TLS is disabled, returns `None`. Otherwise, loads the PKCS#12
    /// identity from disk and initializes a native-tls acceptor.
    ///
    /// # Errors
    /// Returns a `ServerError::TlsError` if any part of the TLS setup fails.
    pub fn create_tls_acceptor(&self) -> Result<Option<Arc<TlsAcceptor>>, ServerError> {
        let Some(tls) = &self.tls else {
            return Ok(None);
        };

        let archive = fs::read(&tls.cert_file).map_err(|e| {
            ServerError::TlsError(format!(
                "Certificate error: {} (path: {:?})",
                e, tls.cert_file
            ))
        })?;

        let identity = native_tls::Identity::from_pkcs12(&archive, &tls.cert_password)
            .map_err(|e| ServerError::TlsError(format!("Identity error: {}", e)))?;

        let acceptor = native_tls::TlsAcceptor::builder(identity)
            .build()
            .map_err(|e| ServerError::TlsError(format!("TLS acceptor error: {}", e)))?;

        Ok(Some(Arc::new(TlsAcceptor::from(acceptor))))
    }
}

/// Defaults for the startup prompts.
///
/// Every field can be overridden from the environment with a `CONSOLE_`
/// prefix (e.g. `CONSOLE_PORT=9001`); unset values fall back to the stock
/// defaults below.
#[derive(Debug, Deserialize, Clone)]
pub struct PromptDefaults {
    /// Default server bind address.
    pub bind_addr: String,
    /// Default server port.
    pub port: u16,
    /// Whether the TLS prompt defaults to yes.
    pub use_tls: bool,
    /// Default PKCS#12 certificate file path.
    pub cert_file: String,
    /// Default certificate password.
    pub cert_password: String,
    /// Whether the accept-invalid-certificates prompt defaults to yes.
    pub accept_invalid_certs: bool,
    /// Whether the mutual-authentication prompt defaults to yes.
    pub mutually_authenticate: bool,
}

impl PromptDefaults {
    /// Loads prompt defaults, applying `CONSOLE_`-prefixed environment
    /// overrides on top of the stock values.
    ///
    /// # Errors
    /// Returns a `ServerError::ConfigurationError` if an override cannot be
    /// parsed into the target type.
    pub fn from_env() -> Result<Self, ServerError> {
        Self::build().map_err(|e| ServerError::ConfigurationError(e.to_string()))
    }

    fn build() -> Result<Self, config::ConfigError> {
        Config::builder()
            .set_default("bind_addr", "127.0.0.1")?
            .set_default("port", 9000)?
            .set_default("use_tls", false)?
            .set_default("cert_file", "test.pfx")?
            .set_default("cert_password", "password")?
            .set_default("accept_invalid_certs", true)?
            .set_default("mutually_authenticate", false)?
            .add_source(config::Environment::with_prefix("CONSOLE"))
            .build()?
            .try_deserialize()
    }
}
