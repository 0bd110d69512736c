// src/lib.rs
pub mod config;
pub mod socket;

pub use socket::{bind, listen, parse, ListenError, Listener, Transport};
