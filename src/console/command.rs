use std::io;
use std::sync::Arc;
use tokio::io::AsyncRead;

use crate::console::input::InputCollector;
use crate::console::sink::ConsoleSink;
use crate::server::ConsoleServer;

/// Default offered when rotating the preshared key.
const DEFAULT_PRESHARED_KEY: &str = "1234567812345678";

/// One operator command, parsed fresh from each input line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Help,
    Quit,
    ClearScreen,
    ListClients,
    Dispose,
    Send,
    SendAsync,
    DisconnectClient,
    SetPresharedKey,
    ToggleDebug,
    Unrecognized,
}

impl Command {
    /// Maps an input line to a command. Tokens are matched case-sensitively
    /// and exactly; anything else is `Unrecognized`.
    pub fn parse(token: &str) -> Self {
        match token {
            "?" => Command::Help,
            "q" => Command::Quit,
            "cls" => Command::ClearScreen,
            "list" => Command::ListClients,
            "dispose" => Command::Dispose,
            "send" => Command::Send,
            "sendasync" => Command::SendAsync,
            "remove" => Command::DisconnectClient,
            "psk" => Command::SetPresharedKey,
            "debug" => Command::ToggleDebug,
            _ => Command::Unrecognized,
        }
    }
}

/// The interactive command loop.
///
/// Reads one line per cycle, executes the matched command against the server,
/// and prints the result. Commands that target a client re-collect the
/// identity every cycle; membership may have changed since the last prompt,
/// so an identity is never held across cycles.
pub struct CommandDispatcher<R> {
    input: InputCollector<R>,
    sink: Arc<ConsoleSink>,
}

impl<R: AsyncRead + Unpin> CommandDispatcher<R> {
    pub fn new(input: InputCollector<R>, sink: Arc<ConsoleSink>) -> Self {
        Self { input, sink }
    }

    /// Runs the loop until `q` or end of input.
    ///
    /// No command propagates an error across the dispatch boundary: invalid
    /// sub-inputs re-prompt inside the collector, and operations on unknown
    /// identities surface only as a printed `false` or as silence, per the
    /// server's contract. `dispose` does not end the loop; later commands
    /// run against the disposed server and see its post-dispose behavior.
    pub async fn run(mut self, server: &ConsoleServer) -> io::Result<()> {
        loop {
            self.sink.prompt("Command [? for help]: ")?;

            let Some(line) = self.input.next_line().await? else {
                break;
            };
            if line.is_empty() {
                continue;
            }

            match Command::parse(&line) {
                Command::Quit => break,
                Command::Help => self.print_help(server)?,
                Command::ClearScreen => self.sink.clear_screen()?,
                Command::ListClients => self.list_clients(server)?,
                Command::Dispose => server.dispose(),
                Command::Send => self.send(server, false).await?,
                Command::SendAsync => self.send(server, true).await?,
                Command::DisconnectClient => self.disconnect_client(server).await?,
                Command::SetPresharedKey => self.set_preshared_key(server).await?,
                Command::ToggleDebug => {
                    let enabled = server.toggle_debug();
                    self.sink.line(&format!("Debug set to: {}", enabled))?;
                }
                Command::Unrecognized => {}
            }
        }

        Ok(())
    }

    fn print_help(&self, server: &ConsoleServer) -> io::Result<()> {
        self.sink.line("Available commands:")?;
        self.sink.line("  ?          help (this menu)")?;
        self.sink.line("  q          quit")?;
        self.sink.line("  cls        clear screen")?;
        self.sink.line("  list       list clients")?;
        self.sink.line("  dispose    dispose of the server")?;
        self.sink.line("  send       send message to client")?;
        self.sink.line("  sendasync  send message to a client asynchronously")?;
        self.sink.line("  remove     disconnect client")?;
        self.sink.line("  psk        set preshared key")?;
        self.sink.line(&format!(
            "  debug      enable/disable debug (currently {})",
            server.debug()
        ))
    }

    fn list_clients(&self, server: &ConsoleServer) -> io::Result<()> {
        let clients = server.list_clients();
        if clients.is_empty() {
            return self.sink.line("None");
        }

        self.sink.line("Clients")?;
        for identity in &clients {
            self.sink.line(&format!("  {}", identity))?;
        }
        Ok(())
    }

    /// Shared body of `send` and `sendasync`; the two differ only in whether
    /// delivery is awaited before the result prints. An empty identity or
    /// payload aborts the command silently.
    async fn send(&mut self, server: &ConsoleServer, wait_for_delivery: bool) -> io::Result<()> {
        let Some(identity) = self.input.ask_string("IP:Port:", "", true).await? else {
            return Ok(());
        };
        let Some(data) = self.input.ask_string("Data:", "", true).await? else {
            return Ok(());
        };

        let success = if wait_for_delivery {
            server.send_async(&identity, data.as_bytes()).await
        } else {
            server.send(&identity, data.as_bytes())
        };
        self.sink.line(&success.to_string())
    }

    /// Collects an identity (which may be empty) and asks the server to
    /// disconnect it. No success or failure is reported; an unknown identity
    /// is the server's silent no-op.
    async fn disconnect_client(&mut self, server: &ConsoleServer) -> io::Result<()> {
        let identity = self
            .input
            .ask_string("IP:Port:", "", true)
            .await?
            .unwrap_or_default();
        server.disconnect(&identity);
        Ok(())
    }

    async fn set_preshared_key(&mut self, server: &ConsoleServer) -> io::Result<()> {
        if let Some(key) = self
            .input
            .ask_string("Preshared key:", DEFAULT_PRESHARED_KEY, false)
            .await?
        {
            server.set_preshared_key(key);
        }
        Ok(())
    }
}
