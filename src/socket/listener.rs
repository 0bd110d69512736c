// src/socket/listener.rs
use super::address::{join_host_port, parse, split_host_port};
use super::{ListenError, Transport};
use std::io;
use std::net::{SocketAddr, TcpListener, ToSocketAddrs};
use tracing::debug;

#[cfg(unix)]
use std::os::fd::{AsFd, AsRawFd, BorrowedFd, RawFd};
#[cfg(unix)]
use std::os::unix::net::{UnixDatagram, UnixListener};

/// The OS socket behind a [`Listener`].
#[derive(Debug)]
pub enum Socket {
    Tcp(TcpListener),
    #[cfg(unix)]
    Unix(UnixListener),
    #[cfg(unix)]
    UnixDatagram(UnixDatagram),
    /// `SOCK_SEQPACKET` listener; std has no type for it.
    #[cfg(unix)]
    UnixPacket(socket2::Socket),
}

/// A bound, listening socket handed over to the caller.
///
/// Dropping it closes the descriptor. A Unix socket file is left in place;
/// removing it is up to the owner.
#[derive(Debug)]
pub struct Listener {
    transport: Transport,
    socket: Socket,
    address: String,
}

impl Listener {
    pub(crate) fn new(transport: Transport, socket: Socket, address: String) -> Self {
        Self {
            transport,
            socket,
            address,
        }
    }

    pub fn transport(&self) -> Transport {
        self.transport
    }

    /// The address this listener was requested at: the socket path for Unix
    /// transports, the `host:port` string for TCP.
    pub fn address(&self) -> &str {
        &self.address
    }

    /// Bound address for display. TCP reports the kernel's view, so a
    /// requested port 0 shows up as the port actually assigned.
    pub fn local_addr_string(&self) -> io::Result<String> {
        match &self.socket {
            Socket::Tcp(listener) => Ok(listener.local_addr()?.to_string()),
            #[cfg(unix)]
            _ => Ok(self.address.clone()),
        }
    }

    pub fn set_nonblocking(&self, nonblocking: bool) -> io::Result<()> {
        match &self.socket {
            Socket::Tcp(listener) => listener.set_nonblocking(nonblocking),
            #[cfg(unix)]
            Socket::Unix(listener) => listener.set_nonblocking(nonblocking),
            #[cfg(unix)]
            Socket::UnixDatagram(socket) => socket.set_nonblocking(nonblocking),
            #[cfg(unix)]
            Socket::UnixPacket(socket) => socket.set_nonblocking(nonblocking),
        }
    }

    pub fn socket(&self) -> &Socket {
        &self.socket
    }

    pub fn into_socket(self) -> Socket {
        self.socket
    }

    /// Closes the socket now rather than at end of scope.
    pub fn close(self) {
        drop(self);
    }
}

#[cfg(unix)]
impl AsFd for Listener {
    fn as_fd(&self) -> BorrowedFd<'_> {
        match &self.socket {
            Socket::Tcp(listener) => listener.as_fd(),
            Socket::Unix(listener) => listener.as_fd(),
            Socket::UnixDatagram(socket) => socket.as_fd(),
            Socket::UnixPacket(socket) => socket.as_fd(),
        }
    }
}

#[cfg(unix)]
impl AsRawFd for Listener {
    fn as_raw_fd(&self) -> RawFd {
        self.as_fd().as_raw_fd()
    }
}

/// Binds `address` for `transport`.
///
/// Unix transports get a socket file at `address` carrying exactly `mode`
/// (see the `unix` module for how). For TCP `mode` is ignored and an empty
/// host binds every interface.
///
/// Nothing is retried; the first failing step is returned.
pub fn listen(transport: Transport, address: &str, mode: u32) -> Result<Listener, ListenError> {
    if transport.is_unix() {
        return listen_unix(transport, address, mode);
    }
    listen_tcp(transport, address)
}

/// [`parse`] followed by [`listen`].
pub fn bind(spec: &str, mode: u32) -> Result<Listener, ListenError> {
    let (transport, address) = parse(spec);
    listen(transport, &address, mode)
}

#[cfg(unix)]
fn listen_unix(transport: Transport, address: &str, mode: u32) -> Result<Listener, ListenError> {
    super::unix::listen_unix(transport, address, mode)
}

#[cfg(not(unix))]
fn listen_unix(transport: Transport, _address: &str, _mode: u32) -> Result<Listener, ListenError> {
    Err(ListenError::UnsupportedTransport(transport))
}

fn wildcard_hosts(transport: Transport) -> &'static [&'static str] {
    match transport {
        Transport::Tcp4 => &["0.0.0.0"],
        Transport::Tcp6 => &["::"],
        // dual-stack first; IPv4 only when the IPv6 family is unavailable
        _ => &["::", "0.0.0.0"],
    }
}

fn listen_tcp(transport: Transport, address: &str) -> Result<Listener, ListenError> {
    let (host, port) = split_host_port(address).map_err(|err| ListenError::Resolve {
        address: address.to_string(),
        source: io::Error::new(io::ErrorKind::InvalidInput, err),
    })?;

    let candidates: Vec<String> = if host.is_empty() {
        wildcard_hosts(transport)
            .iter()
            .map(|wildcard| join_host_port(wildcard, port))
            .collect()
    } else {
        vec![address.to_string()]
    };

    let mut candidates = candidates.iter().peekable();
    while let Some(candidate) = candidates.next() {
        match bind_tcp(transport, candidate) {
            Ok(listener) => {
                debug!(address = %candidate, %transport, "bound tcp listener");
                return Ok(Listener::new(
                    transport,
                    Socket::Tcp(listener),
                    address.to_string(),
                ));
            }
            Err(err) if candidates.peek().is_some() && family_unavailable(&err) => {
                debug!(address = %candidate, %err, "address family unavailable, trying next wildcard");
            }
            Err(err) => return Err(err),
        }
    }

    Err(ListenError::Resolve {
        address: address.to_string(),
        source: io::Error::new(io::ErrorKind::AddrNotAvailable, "no candidate addresses"),
    })
}

/// True when the failure means the address family itself cannot be used,
/// as opposed to the port being taken or access being denied.
fn family_unavailable(err: &ListenError) -> bool {
    let Some(source) = err.io_error() else {
        return false;
    };
    #[cfg(unix)]
    let no_family = source.raw_os_error() == Some(libc::EAFNOSUPPORT);
    #[cfg(not(unix))]
    let no_family = false;
    no_family || source.kind() == io::ErrorKind::AddrNotAvailable
}

fn bind_tcp(transport: Transport, address: &str) -> Result<TcpListener, ListenError> {
    let resolved = address.to_socket_addrs().map_err(|source| ListenError::Resolve {
        address: address.to_string(),
        source,
    })?;

    let addrs: Vec<SocketAddr> = resolved
        .filter(|addr| match transport {
            Transport::Tcp4 => addr.is_ipv4(),
            Transport::Tcp6 => addr.is_ipv6(),
            _ => true,
        })
        .collect();
    if addrs.is_empty() {
        return Err(ListenError::Resolve {
            address: address.to_string(),
            source: io::Error::new(
                io::ErrorKind::AddrNotAvailable,
                format!("no {transport} address"),
            ),
        });
    }

    TcpListener::bind(&addrs[..]).map_err(|source| ListenError::Bind {
        address: address.to_string(),
        source,
    })
}
