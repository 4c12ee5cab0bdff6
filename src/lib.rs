//! # TCP Operator Console
//!
//! An interactive console for exercising a TCP server: configure and start a
//! server from a handful of prompts, watch client lifecycle events as they
//! happen, and issue ad-hoc commands against live connections.
//!
//! The crate has two halves:
//!
//! - [`server`] is the server component itself: a tokio accept loop, a
//!   concurrent client registry, per-connection reader and writer tasks, and
//!   optional TLS via a PKCS#12 identity. Control operations (`send`,
//!   `disconnect`, `dispose`, key rotation, the debug flag) are safe to call
//!   while connections are live.
//! - [`console`] is the operator-facing core: the input collector, the
//!   serialized output sink, the event handlers, the command dispatcher, and
//!   the session controller that wires everything together.
//!
//! The two halves meet at exactly two seams: the
//! [`ServerEventHandler`](server::ServerEventHandler) trait, injected at
//! construction so handlers are registered before the accept loop starts,
//! and the [`ConsoleServer`](server::ConsoleServer) control surface the
//! dispatcher drives.

pub mod config;
pub mod console;
pub mod server;
pub mod utils;
