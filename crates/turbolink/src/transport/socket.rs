//! JSON-lines transport over TCP and Unix stream sockets.
//!
//! [`SocketConnector::open`] parses the address, then hands the dial to a
//! worker thread and returns a handle in the `Connecting` state. Once the dial
//! succeeds the worker spawns a reader and itself becomes the writer, draining
//! frames queued by [`Transport::send`] until a close is requested or the
//! handle is dropped.

use std::io::{self, BufReader, Read, Write};
use std::net::{Shutdown, SocketAddr, TcpStream, ToSocketAddrs};
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::Duration;

#[cfg(unix)]
use std::os::fd::OwnedFd;
#[cfg(unix)]
use std::os::unix::net::UnixStream;

#[cfg(unix)]
use socket2::{Domain, SockAddr, Socket, Type};
use tracing::{debug, info, warn};
use turbolink_config::{Config, DEFAULT_CONNECT_TIMEOUT_MS, SocketEndpoint};

use super::frame::{self, FrameReader};
use super::{Connector, EventSink, ReadyState, TRANSPORT_TARGET, Transport, TransportError};

/// Dials `tcp://` and `unix://` addresses and speaks newline-delimited text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SocketConnector {
    connect_timeout: Duration,
}

impl SocketConnector {
    /// Creates a connector that gives up dialling after `connect_timeout`.
    #[must_use]
    pub const fn new(connect_timeout: Duration) -> Self {
        Self { connect_timeout }
    }

    /// Creates a connector using the configured connect timeout.
    #[must_use]
    pub const fn from_config(config: &Config) -> Self {
        Self::new(config.connect_timeout())
    }

    /// Time allowed for a dial to complete.
    #[must_use]
    pub const fn connect_timeout(&self) -> Duration {
        self.connect_timeout
    }
}

impl Default for SocketConnector {
    fn default() -> Self {
        Self::new(Duration::from_millis(DEFAULT_CONNECT_TIMEOUT_MS))
    }
}

impl Connector for SocketConnector {
    fn open(&self, address: &str, events: EventSink) -> Result<Box<dyn Transport>, TransportError> {
        let endpoint: SocketEndpoint =
            address
                .parse()
                .map_err(|source| TransportError::Address {
                    address: address.to_owned(),
                    source,
                })?;

        #[cfg(not(unix))]
        if let SocketEndpoint::Unix { .. } = endpoint {
            return Err(TransportError::UnsupportedUnix(endpoint.to_string()));
        }

        let state = SharedState::new();
        let (outbound, queue) = mpsc::channel();
        let worker = Worker {
            endpoint,
            connect_timeout: self.connect_timeout,
            state: state.clone(),
            events,
            queue,
        };
        thread::Builder::new()
            .name(String::from("turbolink-socket"))
            .spawn(move || worker.run())
            .map_err(TransportError::Spawn)?;

        Ok(Box::new(SocketTransport { state, outbound }))
    }
}

/// Work queued for the writer.
#[derive(Debug)]
enum Outbound {
    Frame(String),
    Close { code: u16, reason: String },
}

/// Host-side handle; everything it does is a queue push or an atomic read.
struct SocketTransport {
    state: SharedState,
    outbound: Sender<Outbound>,
}

impl Transport for SocketTransport {
    fn send(&mut self, text: &str) -> Result<(), TransportError> {
        let framed = frame::encode(text)?;
        self.outbound
            .send(Outbound::Frame(framed))
            .map_err(|_| TransportError::Closed)
    }

    fn close(&mut self, code: u16, reason: &str) {
        if !self.state.begin_close() {
            debug!(target: TRANSPORT_TARGET, "close requested on a finished socket");
            return;
        }
        let request = Outbound::Close {
            code,
            reason: reason.to_owned(),
        };
        if self.outbound.send(request).is_err() {
            debug!(target: TRANSPORT_TARGET, "socket writer already stopped");
        }
    }

    fn ready_state(&self) -> ReadyState {
        self.state.load()
    }
}

/// Ready state shared between the handle and the worker threads.
#[derive(Debug, Clone)]
struct SharedState(Arc<AtomicU8>);

impl SharedState {
    fn new() -> Self {
        Self(Arc::new(AtomicU8::new(ReadyState::Connecting.to_u8())))
    }

    fn load(&self) -> ReadyState {
        ReadyState::from_u8(self.0.load(Ordering::Acquire))
    }

    fn store(&self, state: ReadyState) {
        self.0.store(state.to_u8(), Ordering::Release);
    }

    /// Moves `Connecting` to `Open`; fails when a close got there first.
    fn begin_open(&self) -> bool {
        self.0
            .compare_exchange(
                ReadyState::Connecting.to_u8(),
                ReadyState::Open.to_u8(),
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok()
    }

    /// Moves `Connecting` or `Open` to `Closing`.
    fn begin_close(&self) -> bool {
        self.0
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |raw| {
                match ReadyState::from_u8(raw) {
                    ReadyState::Connecting | ReadyState::Open => {
                        Some(ReadyState::Closing.to_u8())
                    }
                    ReadyState::Closing | ReadyState::Closed => None,
                }
            })
            .is_ok()
    }
}

struct Worker {
    endpoint: SocketEndpoint,
    connect_timeout: Duration,
    state: SharedState,
    events: EventSink,
    queue: Receiver<Outbound>,
}

impl Worker {
    fn run(self) {
        let mut connection = match connect(&self.endpoint, self.connect_timeout) {
            Ok(connection) => connection,
            Err(error) => {
                self.finish_with_error(&error.to_string());
                warn!(target: TRANSPORT_TARGET, endpoint = %self.endpoint, %error, "dial failed");
                return;
            }
        };

        if !self.state.begin_open() {
            connection.shutdown();
            self.state.store(ReadyState::Closed);
            self.events.closed();
            debug!(target: TRANSPORT_TARGET, endpoint = %self.endpoint, "closed while dialling");
            return;
        }

        let reader = match connection.try_clone() {
            Ok(reader) => reader,
            Err(error) => {
                connection.shutdown();
                self.finish_with_error(&error.to_string());
                warn!(target: TRANSPORT_TARGET, %error, "failed to clone socket for reading");
                return;
            }
        };

        // Emit before logging; a log writer may block.
        self.events.opened();
        info!(target: TRANSPORT_TARGET, endpoint = %self.endpoint, "socket connected");

        let read_state = self.state.clone();
        let read_events = self.events.clone();
        let spawned = thread::Builder::new()
            .name(String::from("turbolink-socket-reader"))
            .spawn(move || read_frames(reader, &read_state, &read_events));
        if let Err(error) = spawned {
            connection.shutdown();
            self.finish_with_error(&error.to_string());
            warn!(target: TRANSPORT_TARGET, %error, "failed to start socket reader");
            return;
        }

        self.write_frames(&mut connection);
    }

    fn write_frames(&self, connection: &mut Connection) {
        // A dropped handle ends the loop just like an explicit close.
        while let Ok(request) = self.queue.recv() {
            match request {
                Outbound::Frame(text) => {
                    let written = connection
                        .write_all(text.as_bytes())
                        .and_then(|()| connection.flush());
                    if let Err(error) = written {
                        warn!(target: TRANSPORT_TARGET, %error, "socket write failed");
                        break;
                    }
                    debug!(target: TRANSPORT_TARGET, bytes = text.len(), "frame written");
                }
                Outbound::Close { code, reason } => {
                    info!(target: TRANSPORT_TARGET, code, reason = %reason, "closing socket");
                    break;
                }
            }
        }
        self.state.store(ReadyState::Closing);
        connection.shutdown();
    }

    fn finish_with_error(&self, detail: &str) {
        self.state.store(ReadyState::Closed);
        self.events.error(detail);
        self.events.closed();
    }
}

fn read_frames(connection: Connection, state: &SharedState, events: &EventSink) {
    let mut frames = FrameReader::new(BufReader::new(connection));
    loop {
        match frames.next_frame() {
            Ok(Some(text)) => events.message(text),
            Ok(None) => {
                debug!(target: TRANSPORT_TARGET, "socket reached end of stream");
                break;
            }
            Err(error) => {
                if state.load() == ReadyState::Closing {
                    debug!(target: TRANSPORT_TARGET, %error, "read interrupted by close");
                } else {
                    events.error(error.to_string());
                    warn!(target: TRANSPORT_TARGET, %error, "socket read failed");
                }
                break;
            }
        }
    }
    state.store(ReadyState::Closed);
    events.closed();
}

enum Connection {
    Tcp(TcpStream),
    #[cfg(unix)]
    Unix(UnixStream),
}

impl Connection {
    fn try_clone(&self) -> io::Result<Self> {
        match self {
            Self::Tcp(stream) => stream.try_clone().map(Self::Tcp),
            #[cfg(unix)]
            Self::Unix(stream) => stream.try_clone().map(Self::Unix),
        }
    }

    /// Shuts both directions down; the reader then sees end of stream.
    fn shutdown(&self) {
        let result = match self {
            Self::Tcp(stream) => stream.shutdown(Shutdown::Both),
            #[cfg(unix)]
            Self::Unix(stream) => stream.shutdown(Shutdown::Both),
        };
        if let Err(error) = result {
            debug!(target: TRANSPORT_TARGET, %error, "socket shutdown failed");
        }
    }
}

impl Read for Connection {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            Self::Tcp(stream) => stream.read(buf),
            #[cfg(unix)]
            Self::Unix(stream) => stream.read(buf),
        }
    }
}

impl Write for Connection {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Self::Tcp(stream) => stream.write(buf),
            #[cfg(unix)]
            Self::Unix(stream) => stream.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Self::Tcp(stream) => stream.flush(),
            #[cfg(unix)]
            Self::Unix(stream) => stream.flush(),
        }
    }
}

fn connect(endpoint: &SocketEndpoint, timeout: Duration) -> Result<Connection, TransportError> {
    match endpoint {
        SocketEndpoint::Tcp { host, port } => {
            let address =
                resolve_tcp_address(host, *port).map_err(|source| TransportError::Resolve {
                    endpoint: endpoint.to_string(),
                    source,
                })?;
            let stream = TcpStream::connect_timeout(&address, timeout).map_err(|source| {
                TransportError::Connect {
                    endpoint: endpoint.to_string(),
                    source,
                }
            })?;
            if let Err(error) = stream.set_nodelay(true) {
                debug!(target: TRANSPORT_TARGET, %error, "failed to disable Nagle");
            }
            Ok(Connection::Tcp(stream))
        }
        SocketEndpoint::Unix { path } => {
            #[cfg(unix)]
            {
                connect_unix(path.as_str(), timeout).map_err(|source| TransportError::Connect {
                    endpoint: endpoint.to_string(),
                    source,
                })
            }

            #[cfg(not(unix))]
            {
                Err(TransportError::UnsupportedUnix(endpoint.to_string()))
            }
        }
    }
}

fn resolve_tcp_address(host: &str, port: u16) -> io::Result<SocketAddr> {
    let mut addrs = (host, port).to_socket_addrs()?;
    addrs
        .next()
        .ok_or_else(|| io::Error::new(io::ErrorKind::AddrNotAvailable, "no resolved addresses"))
}

#[cfg(unix)]
fn connect_unix(path: &str, timeout: Duration) -> io::Result<Connection> {
    let socket = Socket::new(Domain::UNIX, Type::STREAM, None)?;
    let address = SockAddr::unix(path)?;
    socket.connect_timeout(&address, timeout)?;
    Ok(Connection::Unix(UnixStream::from(OwnedFd::from(socket))))
}
