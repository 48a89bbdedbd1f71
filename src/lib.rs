// Library root
// -----------
// This crate exposes the pieces of the `magnet2qb` CLI as a library. The
// binary (`main.rs`) only parses arguments and calls `ui::run`.
//
// Module responsibilities:
// - `api`: Session client for the qBittorrent Web API (login, add magnet)
//   and the cookie session it keeps between the two calls.
// - `transport`: The HTTP exchange the client goes through; swappable
//   for a stub in tests.
// - `error`: Error taxonomy returned by the client.
// - `config`: JSON config file discovery, load and save.
// - `cli`, `ui`, `logging`: Argument parsing, the interactive flow and
//   tracing setup.
pub mod api;
pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod transport;
pub mod ui;

pub use api::{SessionClient, TorrentClient};
pub use error::ClientError;
pub use transport::{ReqwestTransport, Transport, TransportError};
