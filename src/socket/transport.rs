// src/socket/transport.rs
use std::fmt;
use std::str::FromStr;

/// Network kind handed to [`listen`](crate::socket::listen), named the way
/// address specs and config files spell it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Transport {
    Tcp,
    Tcp4,
    Tcp6,
    Unix,
    UnixDatagram,
    UnixPacket,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("Unknown transport: {0:?}")]
pub struct UnknownTransport(pub String);

impl Transport {
    pub fn as_str(&self) -> &'static str {
        match self {
            Transport::Tcp => "tcp",
            Transport::Tcp4 => "tcp4",
            Transport::Tcp6 => "tcp6",
            Transport::Unix => "unix",
            Transport::UnixDatagram => "unixgram",
            Transport::UnixPacket => "unixpacket",
        }
    }

    /// True for the transports whose address is a filesystem path.
    pub fn is_unix(&self) -> bool {
        matches!(
            self,
            Transport::Unix | Transport::UnixDatagram | Transport::UnixPacket
        )
    }
}

impl fmt::Display for Transport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Transport {
    type Err = UnknownTransport;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "tcp" => Ok(Transport::Tcp),
            "tcp4" => Ok(Transport::Tcp4),
            "tcp6" => Ok(Transport::Tcp6),
            "unix" => Ok(Transport::Unix),
            "unixgram" => Ok(Transport::UnixDatagram),
            "unixpacket" => Ok(Transport::UnixPacket),
            other => Err(UnknownTransport(other.to_string())),
        }
    }
}
