// src/socket/mod.rs
mod address;
mod error;
mod listener;
mod transport;
#[cfg(unix)]
mod unix;

pub use address::{join_host_port, parse, split_host_port, AddrParseError};
pub use error::ListenError;
pub use listener::{bind, listen, Listener, Socket};
pub use transport::{Transport, UnknownTransport};
