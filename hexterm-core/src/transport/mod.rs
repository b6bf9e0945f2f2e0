//! The capability a session needs from whatever it is attached to.
//!
//! A transport reports readiness through `poll_*` methods so that the
//! session can wait on it together with the console and the spam timer,
//! then performs non-blocking reads and awaited full writes.
//!
//! | Implementation      | Backing                                   |
//! |---------------------|-------------------------------------------|
//! | [`TcpTransport`]    | connected `tokio::net::TcpStream`         |
//! | [`UdpTransport`]    | `tokio::net::UdpSocket`, reports sources  |
//! | [`StreamTransport`] | any `AsyncRead` + optional `AsyncWrite`   |

use std::io;
use std::net::SocketAddr;
use std::task::{Context, Poll};

use async_trait::async_trait;

pub mod stream;
pub mod tcp;
pub mod udp;

pub use stream::StreamTransport;
pub use tcp::TcpTransport;
pub use udp::UdpTransport;

/// Byte endpoint bridged to the console by a session.
///
/// The session borrows a transport for its whole run and never closes it.
#[async_trait]
pub trait Transport: Send {
    /// Ready once a call to [`try_read`](Self::try_read) can make progress
    /// (data, end of stream or an error).
    fn poll_read_ready(&mut self, cx: &mut Context<'_>) -> Poll<io::Result<()>>;

    /// Ready once a write would be accepted without waiting.
    fn poll_write_ready(&mut self, cx: &mut Context<'_>) -> Poll<io::Result<()>>;

    /// Non-blocking read.
    ///
    /// `Ok(0)` means nothing is available right now. End of stream and
    /// failures are errors; both end the session.
    fn try_read(&mut self, buf: &mut [u8]) -> io::Result<usize>;

    /// Write all of `data`, returning how many bytes the transport took.
    async fn write_fully(&mut self, data: &[u8]) -> io::Result<usize>;

    /// Where the last packet came from. Only packet transports know.
    fn source_of_last_packet(&self) -> Option<SocketAddr> {
        None
    }
}

pub(crate) fn end_of_stream() -> io::Error {
    io::Error::new(io::ErrorKind::UnexpectedEof, "end of stream")
}
