//! What the terminal attaches to, and how each transport is set up.
//!
//! ```text
//! tcp <port>                      listen, one session per connection
//! tcp <host>:<port>               connect
//! udp <port>                      listen, reply to the last sender
//! udp <host>:<port>[_<bindport>]  send to host, optionally from bindport
//! serial <device>[:<baud>]        read/write a serial device
//! child <program> [args...]       talk to a child's stdin/stdout
//! file <path>                     dump a file
//! ```

use std::io;
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr};
use std::path::{Path, PathBuf};
use std::process::Stdio;

use clap::Subcommand;
use tokio::io::{ReadHalf, WriteHalf};
use tokio::net::{TcpListener, UdpSocket};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio_serial::{SerialPortBuilderExt, SerialStream};
use tracing::{debug, info, warn};

use hexterm_core::{
    Console, HextermError, Session, SessionConfig, StreamTransport, TcpTransport, Transport,
    UdpTransport,
};

/// Baud rate assumed when a serial target names none.
pub const DEFAULT_BAUD: u32 = 38_400;

/// Transport selected on the command line.
#[derive(Subcommand, Debug, Clone)]
pub enum Target {
    /// Listen on <port> or connect to <host>:<port>.
    Tcp { endpoint: String },
    /// Listen on <port> or send to <host>:<port>[_<bindport>].
    Udp { endpoint: String },
    /// Serial device as <device>[:<baud>].
    Serial { device: String },
    /// Program to run, followed by its arguments.
    Child {
        #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
        command: Vec<String>,
    },
    /// File whose contents are dumped as received data.
    File { path: PathBuf },
}

// ── Endpoint parsing ─────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TcpEndpoint {
    Listen(u16),
    Connect { host: String, port: u16 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UdpEndpoint {
    Listen(u16),
    Send {
        host: String,
        port: u16,
        bind_port: Option<u16>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerialEndpoint {
    pub device: String,
    pub baud: u32,
}

fn parse_port(s: &str) -> Result<u16, HextermError> {
    s.parse()
        .map_err(|_| HextermError::InvalidConfig(format!("bad port {s:?}")))
}

fn parse_host_port(s: &str) -> Result<(String, u16), HextermError> {
    match s.rsplit_once(':') {
        Some((host, port)) if !host.is_empty() => {
            let host = host.trim_start_matches('[').trim_end_matches(']');
            Ok((host.to_string(), parse_port(port)?))
        }
        _ => Err(HextermError::InvalidConfig(format!(
            "expected <port> or <host>:<port>, got {s:?}"
        ))),
    }
}

pub fn parse_tcp(s: &str) -> Result<TcpEndpoint, HextermError> {
    if let Ok(port) = s.parse() {
        return Ok(TcpEndpoint::Listen(port));
    }
    let (host, port) = parse_host_port(s)?;
    Ok(TcpEndpoint::Connect { host, port })
}

pub fn parse_udp(s: &str) -> Result<UdpEndpoint, HextermError> {
    if let Ok(port) = s.parse() {
        return Ok(UdpEndpoint::Listen(port));
    }
    let (addr, bind_port) = match s.rsplit_once('_') {
        Some((addr, bind)) => (addr, Some(parse_port(bind)?)),
        None => (s, None),
    };
    let (host, port) = parse_host_port(addr)?;
    Ok(UdpEndpoint::Send {
        host,
        port,
        bind_port,
    })
}

pub fn parse_serial(s: &str) -> Result<SerialEndpoint, HextermError> {
    let (device, baud) = match s.rsplit_once(':') {
        Some((device, baud)) if !device.is_empty() => {
            let baud = baud
                .parse()
                .map_err(|_| HextermError::InvalidConfig(format!("bad baud rate {baud:?}")))?;
            (device, baud)
        }
        _ => (s, DEFAULT_BAUD),
    };
    if device.is_empty() {
        return Err("serial device path is empty".into());
    }
    Ok(SerialEndpoint {
        device: device.to_string(),
        baud,
    })
}

// ── Running ──────────────────────────────────────────────────────

/// Set up the selected transport and run sessions on it until the
/// console closes or the transport fails.
pub async fn run<C>(target: &Target, config: &SessionConfig, console: &mut C) -> Result<(), HextermError>
where
    C: Console,
{
    match target {
        Target::Tcp { endpoint } => match parse_tcp(endpoint)? {
            TcpEndpoint::Listen(port) => {
                let listener = listen_tcp(port).await?;
                serve_tcp(listener, config, console).await
            }
            TcpEndpoint::Connect { host, port } => {
                let mut transport = TcpTransport::connect(&format!("{host}:{port}")).await?;
                info!("connected to {}", transport.peer_addr()?);
                run_session(config, &mut transport, console).await
            }
        },
        Target::Udp { endpoint } => {
            let mut transport = open_udp(&parse_udp(endpoint)?).await?;
            run_session(config, &mut transport, console).await
        }
        Target::Serial { device } => {
            let mut transport = open_serial(&parse_serial(device)?)?;
            run_session(config, &mut transport, console).await
        }
        Target::Child { command } => run_child(command, config, console).await,
        Target::File { path } => {
            let mut transport = open_file(path).await?;
            run_session(config, &mut transport, console).await
        }
    }
}

/// Bind a TCP listener on every interface, dual-stack where the host
/// supports IPv6.
pub async fn listen_tcp(port: u16) -> io::Result<TcpListener> {
    match TcpListener::bind((Ipv6Addr::UNSPECIFIED, port)).await {
        Ok(listener) => Ok(listener),
        Err(e) => {
            debug!("no IPv6 listener on port {port} ({e}); using IPv4 only");
            TcpListener::bind((Ipv4Addr::UNSPECIFIED, port)).await
        }
    }
}

async fn bind_udp_any(port: u16) -> io::Result<UdpSocket> {
    match UdpSocket::bind((Ipv6Addr::UNSPECIFIED, port)).await {
        Ok(socket) => Ok(socket),
        Err(e) => {
            debug!("no IPv6 socket on port {port} ({e}); using IPv4 only");
            UdpSocket::bind((Ipv4Addr::UNSPECIFIED, port)).await
        }
    }
}

/// Accept connections one at a time. A session that fails goes back to
/// accepting; a closed console ends the server.
pub async fn serve_tcp<C>(
    listener: TcpListener,
    config: &SessionConfig,
    console: &mut C,
) -> Result<(), HextermError>
where
    C: Console,
{
    info!("listening on {}", listener.local_addr()?);
    loop {
        let (stream, peer) = listener.accept().await?;
        info!("accepted connection from {peer}");
        let mut transport = TcpTransport::new(stream);
        match run_session(config, &mut transport, console).await {
            Ok(()) => return Ok(()),
            Err(e) => warn!("connection from {peer} ended ({e}); waiting for the next one"),
        }
    }
}

pub async fn open_udp(endpoint: &UdpEndpoint) -> Result<UdpTransport, HextermError> {
    match endpoint {
        UdpEndpoint::Listen(port) => {
            let socket = bind_udp_any(*port).await?;
            info!("listening for datagrams on {}", socket.local_addr()?);
            Ok(UdpTransport::new(socket, None))
        }
        UdpEndpoint::Send {
            host,
            port,
            bind_port,
        } => {
            let destination = resolve(host, *port).await?;
            let local: SocketAddr = if destination.is_ipv6() {
                ([0u16; 8], bind_port.unwrap_or(0)).into()
            } else {
                ([0u8; 4], bind_port.unwrap_or(0)).into()
            };
            let socket = UdpSocket::bind(local).await?;
            info!("sending datagrams from {} to {destination}", socket.local_addr()?);
            Ok(UdpTransport::new(socket, Some(destination)))
        }
    }
}

async fn resolve(host: &str, port: u16) -> Result<SocketAddr, HextermError> {
    tokio::net::lookup_host((host, port))
        .await?
        .next()
        .ok_or_else(|| HextermError::InvalidConfig(format!("{host} did not resolve")))
}

pub async fn open_file(path: &Path) -> Result<StreamTransport<tokio::fs::File>, HextermError> {
    let file = tokio::fs::File::open(path).await?;
    info!("reading {}", path.display());
    Ok(StreamTransport::read_only(file))
}

/// Open a serial device at the requested baud rate, 8N1, no flow control.
pub fn open_serial(
    endpoint: &SerialEndpoint,
) -> Result<StreamTransport<ReadHalf<SerialStream>, WriteHalf<SerialStream>>, HextermError> {
    let port = tokio_serial::new(endpoint.device.as_str(), endpoint.baud)
        .open_native_async()
        .map_err(io::Error::from)?;
    info!("opened {} at {} baud", endpoint.device, endpoint.baud);
    let (reader, writer) = tokio::io::split(port);
    Ok(StreamTransport::new(reader, writer))
}

/// Spawn `command[0]` with the remaining words as its arguments, stdout
/// and stdin piped into a transport. The child dies with its handle.
pub fn spawn_child(command: &[String]) -> Result<(Child, StreamTransport<ChildStdout, ChildStdin>), HextermError> {
    let (program, args) = command.split_first().ok_or("no child program given")?;

    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .kill_on_drop(true)
        .spawn()?;
    info!("spawned {program} (pid {:?})", child.id());

    let (Some(stdin), Some(stdout)) = (child.stdin.take(), child.stdout.take()) else {
        return Err(HextermError::Io(io::Error::other("child pipes unavailable")));
    };
    Ok((child, StreamTransport::new(stdout, stdin)))
}

async fn run_child<C>(command: &[String], config: &SessionConfig, console: &mut C) -> Result<(), HextermError>
where
    C: Console,
{
    let (mut child, mut transport) = spawn_child(command)?;
    let result = run_session(config, &mut transport, console).await;

    drop(transport);
    if let Err(e) = child.kill().await {
        debug!("killing child: {e}");
    }
    result
}

/// One session with stdout as the dump sink; stats are logged at the end.
pub async fn run_session<T, C>(config: &SessionConfig, transport: &mut T, console: &mut C) -> Result<(), HextermError>
where
    T: Transport + ?Sized,
    C: Console + ?Sized,
{
    let mut session = Session::new(config, std::io::stdout());
    let result = session.run(transport, console).await;
    info!("session {}: {}", session.state(), session.stats());
    result
}

// ── Tests ────────────────────────────────────────────────────────
