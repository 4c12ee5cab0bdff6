use std::sync::Arc;
use tokio::io::AsyncRead;

use crate::config::{PromptDefaults, ServerConfig};
use crate::console::command::CommandDispatcher;
use crate::console::events::ConsoleEvents;
use crate::console::input::InputCollector;
use crate::console::sink::ConsoleSink;
use crate::server::ConsoleServer;
use crate::utils::error::ServerError;

/// Everything the startup prompts produce: the server configuration plus the
/// TLS policy flags that are applied to the server after construction.
#[derive(Debug, Clone)]
pub struct SessionSettings {
    pub config: ServerConfig,
    pub accept_invalid_certs: bool,
    pub mutually_authenticate: bool,
}

/// Runs a full console session against standard input and output.
///
/// # Errors
/// Returns an error when the startup configuration is invalid, the server
/// fails to construct or bind, or console I/O fails. All of these are fatal;
/// there is no recovery or retry beyond the prompt-level re-asking.
pub async fn run() -> anyhow::Result<()> {
    let sink = ConsoleSink::stdout();
    let input = InputCollector::new(tokio::io::stdin(), sink.clone());
    let defaults = PromptDefaults::from_env()?;
    run_with(input, sink, &defaults).await
}

/// Runs a session over an arbitrary input source and sink.
///
/// Startup is strictly linear: collect the configuration, construct the
/// server with the console's event handlers injected (registration happens
/// before the accept loop can observe anything), start the accept loop
/// without awaiting it, then hand control to the command dispatcher for the
/// rest of the session.
pub async fn run_with<R: AsyncRead + Unpin>(
    mut input: InputCollector<R>,
    sink: Arc<ConsoleSink>,
    defaults: &PromptDefaults,
) -> anyhow::Result<()> {
    let settings = collect_settings(&mut input, defaults).await?;

    let events = Arc::new(ConsoleEvents::new(sink.clone()));
    let server = ConsoleServer::new(settings.config, events)?;

    if server.config().tls.is_some() {
        server.set_accept_invalid_certs(settings.accept_invalid_certs);
        server.set_mutually_authenticate(settings.mutually_authenticate);
    }
    server.set_debug(false);

    server.start().await?;

    CommandDispatcher::new(input, sink).run(&server).await?;
    Ok(())
}

/// Collects the startup configuration from the operator.
///
/// The TLS-only prompts are asked only when TLS is enabled, so a plaintext
/// configuration never carries certificate fields.
pub async fn collect_settings<R: AsyncRead + Unpin>(
    input: &mut InputCollector<R>,
    defaults: &PromptDefaults,
) -> anyhow::Result<SessionSettings> {
    let bind_addr = input
        .ask_string("Server IP:", &defaults.bind_addr, false)
        .await?
        .unwrap_or_default();
    let port = input
        .ask_int("Server port:", i32::from(defaults.port), true, false)
        .await?;
    let port = u16::try_from(port)
        .map_err(|_| ServerError::ConfigurationError(format!("port out of range: {}", port)))?;
    let use_tls = input.ask_bool("Use TLS:", defaults.use_tls).await?;

    if !use_tls {
        return Ok(SessionSettings {
            config: ServerConfig::plain(bind_addr, port),
            accept_invalid_certs: false,
            mutually_authenticate: false,
        });
    }

    let cert_file = input
        .ask_string("Certificate file:", &defaults.cert_file, false)
        .await?
        .unwrap_or_default();
    let cert_password = input
        .ask_string("Certificate password:", &defaults.cert_password, false)
        .await?
        .unwrap_or_default();
    let accept_invalid_certs = input
        .ask_bool("Accept invalid certs:", defaults.accept_invalid_certs)
        .await?;
    let mutually_authenticate = input
        .ask_bool("Mutually authenticate:", defaults.mutually_authenticate)
        .await?;

    Ok(SessionSettings {
        config: ServerConfig::with_tls(bind_addr, port, cert_file, cert_password),
        accept_invalid_certs,
        mutually_authenticate,
    })
}
