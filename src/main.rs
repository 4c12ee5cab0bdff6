//! Entry point for the operator console.
//!
//! Initializes logging, loads prompt defaults from the environment, and runs
//! one interactive session: startup prompts, then the command loop, with the
//! server's event callbacks printing between commands for as long as the
//! session lasts.

use tcp_console::console::session;

/// Startup failures (invalid configuration, unloadable certificate, port
/// already bound) are fatal; everything after the command loop starts is
/// handled inside the session.
#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    let _ = dotenv::dotenv();
    tracing_subscriber::fmt::init();

    session::run().await
}
