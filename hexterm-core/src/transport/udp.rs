//! UDP datagram transport.
//!
//! Each read returns one datagram and remembers its source, so dumps can
//! say who sent it. Writes go to the configured destination, or back to
//! the last source when the socket is only listening.

use std::io;
use std::net::SocketAddr;
use std::task::{Context, Poll};

use async_trait::async_trait;
use tokio::net::UdpSocket;

use crate::transport::Transport;

#[derive(Debug)]
pub struct UdpTransport {
    socket: UdpSocket,
    destination: Option<SocketAddr>,
    last_source: Option<SocketAddr>,
}

impl UdpTransport {
    pub fn new(socket: UdpSocket, destination: Option<SocketAddr>) -> Self {
        Self {
            socket,
            destination,
            last_source: None,
        }
    }

    pub fn destination(&self) -> Option<SocketAddr> {
        self.destination
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.socket.local_addr()
    }
}

#[async_trait]
impl Transport for UdpTransport {
    fn poll_read_ready(&mut self, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        self.socket.poll_recv_ready(cx)
    }

    fn poll_write_ready(&mut self, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        self.socket.poll_send_ready(cx)
    }

    fn try_read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self.socket.try_recv_from(buf) {
            Ok((n, from)) => {
                self.last_source = Some(from);
                Ok(n)
            }
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => Ok(0),
            Err(e) => Err(e),
        }
    }

    async fn write_fully(&mut self, data: &[u8]) -> io::Result<usize> {
        let target = self.destination.or(self.last_source).ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotConnected,
                "no destination: nothing received yet to reply to",
            )
        })?;
        self.socket.send_to(data, target).await
    }

    fn source_of_last_packet(&self) -> Option<SocketAddr> {
        self.last_source
    }
}

// ── Tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::future::poll_fn;

    use super::*;

    async fn bound() -> UdpSocket {
        UdpSocket::bind("127.0.0.1:0").await.unwrap()
    }

    #[tokio::test]
    async fn records_source_of_each_datagram() {
        let listener = bound().await;
        let listen_addr = listener.local_addr().unwrap();
        let mut transport = UdpTransport::new(listener, None);

        let peer = bound().await;
        peer.send_to(b"\x01\x02", listen_addr).await.unwrap();

        poll_fn(|cx| transport.poll_read_ready(cx)).await.unwrap();
        let mut buf = [0u8; 16];
        let n = transport.try_read(&mut buf).unwrap();
        assert_eq!(&buf[..n], b"\x01\x02");
        assert_eq!(transport.source_of_last_packet(), Some(peer.local_addr().unwrap()));
    }

    #[tokio::test]
    async fn listener_replies_to_last_source() {
        let listener = bound().await;
        let listen_addr = listener.local_addr().unwrap();
        let mut transport = UdpTransport::new(listener, None);

        let err = transport.write_fully(b"x").await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotConnected);

        let peer = bound().await;
        peer.send_to(b"ping", listen_addr).await.unwrap();
        poll_fn(|cx| transport.poll_read_ready(cx)).await.unwrap();
        let mut buf = [0u8; 16];
        transport.try_read(&mut buf).unwrap();

        assert_eq!(transport.write_fully(b"pong").await.unwrap(), 4);
        let (n, _) = peer.recv_from(&mut buf).await.unwrap();
        assert_eq!(&buf[..n], b"pong");
    }
}
