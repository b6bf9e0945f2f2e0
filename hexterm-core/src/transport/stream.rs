//! Transport over plain async byte streams.
//!
//! Child process pipes, serial devices and files have no readiness API of
//! their own. Here readiness means "a read has completed into the staging
//! buffer", and [`Transport::try_read`] drains that buffer.

use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};

use async_trait::async_trait;
use bytes::{Buf, BytesMut};
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt, ReadBuf};

use crate::transport::{Transport, end_of_stream};

const STAGING_CHUNK: usize = 2048;

/// Reader half plus optional writer half.
#[derive(Debug)]
pub struct StreamTransport<R, W = tokio::io::Sink> {
    reader: R,
    writer: Option<W>,
    staged: BytesMut,
    eof: bool,
    error: Option<io::Error>,
}

impl<R, W> StreamTransport<R, W>
where
    R: AsyncRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    pub fn new(reader: R, writer: W) -> Self {
        Self {
            reader,
            writer: Some(writer),
            staged: BytesMut::with_capacity(STAGING_CHUNK),
            eof: false,
            error: None,
        }
    }
}

impl<R> StreamTransport<R, tokio::io::Sink>
where
    R: AsyncRead + Unpin + Send,
{
    /// A transport whose writes always fail, e.g. an input file.
    pub fn read_only(reader: R) -> Self {
        Self {
            reader,
            writer: None,
            staged: BytesMut::with_capacity(STAGING_CHUNK),
            eof: false,
            error: None,
        }
    }
}

#[async_trait]
impl<R, W> Transport for StreamTransport<R, W>
where
    R: AsyncRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    fn poll_read_ready(&mut self, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        if !self.staged.is_empty() || self.eof || self.error.is_some() {
            return Poll::Ready(Ok(()));
        }

        let mut scratch = [0u8; STAGING_CHUNK];
        let mut read_buf = ReadBuf::new(&mut scratch);
        match Pin::new(&mut self.reader).poll_read(cx, &mut read_buf) {
            Poll::Ready(Ok(())) => {
                if read_buf.filled().is_empty() {
                    self.eof = true;
                } else {
                    self.staged.extend_from_slice(read_buf.filled());
                }
                Poll::Ready(Ok(()))
            }
            // Reported from try_read, where the session expects failures.
            Poll::Ready(Err(e)) => {
                self.error = Some(e);
                Poll::Ready(Ok(()))
            }
            Poll::Pending => Poll::Pending,
        }
    }

    fn poll_write_ready(&mut self, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn try_read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if !self.staged.is_empty() {
            let n = buf.len().min(self.staged.len());
            buf[..n].copy_from_slice(&self.staged[..n]);
            self.staged.advance(n);
            return Ok(n);
        }
        if let Some(e) = self.error.take() {
            self.eof = true;
            return Err(e);
        }
        if self.eof {
            return Err(end_of_stream());
        }
        Ok(0)
    }

    async fn write_fully(&mut self, data: &[u8]) -> io::Result<usize> {
        let Some(writer) = self.writer.as_mut() else {
            return Err(io::Error::new(
                io::ErrorKind::Unsupported,
                "transport is read-only",
            ));
        };
        writer.write_all(data).await?;
        writer.flush().await?;
        Ok(data.len())
    }
}

// ── Tests ────────────────────────────────────────────────────────
