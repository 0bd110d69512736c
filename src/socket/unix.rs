// src/socket/unix.rs
// Unix-domain listeners are bound at `<path>.tmp` under a closed umask,
// chmod'ed, then renamed over `<path>`. The final path therefore only ever
// holds a socket that already carries the requested mode.
use super::{Listener, ListenError, Socket, Transport};
use socket2::{Domain, SockAddr, Type};
use std::fs::{self, Permissions};
use std::io;
use std::os::unix::fs::PermissionsExt;
use std::os::unix::net::{UnixDatagram, UnixListener};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::{debug, trace};

const TEMP_SUFFIX: &str = ".tmp";
const PERMISSION_BITS: u32 = 0o7777;
const SEQPACKET_BACKLOG: i32 = 128;

// The umask is process-wide. Each listen_unix call holds this lock from stale
// removal through publish, so umask changes and same-path calls never overlap.
static UMASK_LOCK: Mutex<()> = Mutex::new(());

fn lock_umask() -> MutexGuard<'static, ()> {
    UMASK_LOCK.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Holds the umask at `0o777` until dropped, then puts the old one back.
///
/// Only constructible while `UMASK_LOCK` is held.
struct UmaskGuard {
    previous: libc::mode_t,
}

impl UmaskGuard {
    fn restrict(_held: &MutexGuard<'static, ()>) -> Self {
        let previous = unsafe { libc::umask(0o777) };
        trace!(previous = %format!("{previous:#o}"), "umask narrowed");
        Self { previous }
    }
}

impl Drop for UmaskGuard {
    fn drop(&mut self) {
        unsafe { libc::umask(self.previous) };
    }
}

/// Removes the temporary socket file on drop unless disarmed.
#[derive(Debug)]
struct TempPath {
    path: PathBuf,
    armed: bool,
}

impl TempPath {
    fn new(path: PathBuf) -> Self {
        Self { path, armed: true }
    }

    fn path(&self) -> &Path {
        &self.path
    }

    fn disarm(&mut self) {
        self.armed = false;
    }
}

impl Drop for TempPath {
    fn drop(&mut self) {
        if self.armed {
            let _ = fs::remove_file(&self.path);
        }
    }
}

/// Socket bound at its temporary path with no permission bits set.
///
/// Fields drop in order, so the descriptor is closed before the file is
/// removed.
#[derive(Debug)]
struct TempSocket {
    socket: Socket,
    temp: TempPath,
}

/// Socket whose temporary file carries the requested mode but is not yet
/// visible at the final path.
#[derive(Debug)]
struct ConfiguredSocket {
    socket: Socket,
    temp: TempPath,
}

impl TempSocket {
    fn bind(
        transport: Transport,
        path: PathBuf,
        held: &MutexGuard<'static, ()>,
    ) -> Result<Self, ListenError> {
        let bound = Self::bind_with(path, held, |path| bind_socket(transport, path))?;
        debug!(path = %bound.temp.path().display(), %transport, "bound temporary socket");
        Ok(bound)
    }

    // The temp guard is armed before binding: a bind that creates the file
    // and then fails (e.g. listen on a seqpacket socket) still cleans up.
    fn bind_with<F>(
        path: PathBuf,
        held: &MutexGuard<'static, ()>,
        bind: F,
    ) -> Result<Self, ListenError>
    where
        F: FnOnce(&Path) -> io::Result<Socket>,
    {
        remove_stale(&path);
        let temp = TempPath::new(path);

        let bound = {
            let _umask = UmaskGuard::restrict(held);
            bind(temp.path())
        };
        let socket = bound.map_err(|source| ListenError::Bind {
            address: temp.path().display().to_string(),
            source,
        })?;

        Ok(Self { socket, temp })
    }

    fn apply_mode(self, mode: u32) -> Result<ConfiguredSocket, ListenError> {
        fs::set_permissions(self.temp.path(), Permissions::from_mode(mode)).map_err(
            |source| ListenError::Permissions {
                path: self.temp.path().to_path_buf(),
                mode,
                source,
            },
        )?;
        debug!(path = %self.temp.path().display(), mode = %format!("{mode:#o}"), "applied socket mode");

        Ok(ConfiguredSocket {
            socket: self.socket,
            temp: self.temp,
        })
    }
}

impl ConfiguredSocket {
    fn publish(self, path: &Path) -> Result<Socket, ListenError> {
        fs::rename(self.temp.path(), path).map_err(|source| ListenError::Publish {
            from: self.temp.path().to_path_buf(),
            to: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), "published socket");

        let ConfiguredSocket { socket, mut temp } = self;
        temp.disarm();
        Ok(socket)
    }
}

/// Best-effort removal of a leftover temporary socket from an earlier run.
fn remove_stale(path: &Path) {
    match fs::remove_file(path) {
        Ok(()) => debug!(path = %path.display(), "removed stale temporary socket"),
        Err(err) if err.kind() == io::ErrorKind::NotFound => {}
        Err(err) => debug!(path = %path.display(), %err, "could not remove stale temporary socket"),
    }
}

fn bind_socket(transport: Transport, path: &Path) -> io::Result<Socket> {
    match transport {
        Transport::Unix => UnixListener::bind(path).map(Socket::Unix),
        Transport::UnixDatagram => UnixDatagram::bind(path).map(Socket::UnixDatagram),
        Transport::UnixPacket => {
            let socket = socket2::Socket::new(Domain::UNIX, Type::SEQPACKET, None)?;
            socket.bind(&SockAddr::unix(path)?)?;
            socket.listen(SEQPACKET_BACKLOG)?;
            Ok(Socket::UnixPacket(socket))
        }
        Transport::Tcp | Transport::Tcp4 | Transport::Tcp6 => Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("{transport} is not a Unix-domain transport"),
        )),
    }
}

fn temp_path_for(address: &str) -> PathBuf {
    PathBuf::from(format!("{address}{TEMP_SUFFIX}"))
}

/// Creates a Unix-domain socket at `address` whose file has exactly `mode`
/// (permission bits only) from the moment it appears there.
///
/// The umask is narrowed to `0o777` around the bind. That change is visible to
/// every thread of the process; calls through this crate are serialized from
/// stale-temp removal to publish, but files created concurrently by other code
/// may come out with no permissions.
pub(crate) fn listen_unix(
    transport: Transport,
    address: &str,
    mode: u32,
) -> Result<Listener, ListenError> {
    // declared first so any rollback of the temp file also runs under it
    let held = lock_umask();
    let socket = TempSocket::bind(transport, temp_path_for(address), &held)?
        .apply_mode(mode & PERMISSION_BITS)?
        .publish(Path::new(address))?;

    Ok(Listener::new(transport, socket, address.to_string()))
}
