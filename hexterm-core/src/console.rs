//! Operator input: line sources and the per-wake aggregator.

use std::io;
use std::task::{Context, Poll};

use bytes::{Bytes, BytesMut};
use futures::task::noop_waker_ref;
use futures::{Stream, StreamExt};

use crate::codec::parse_hex;
use crate::config::DisplayMode;

/// Result of a non-blocking console read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleLine {
    Line(String),
    /// Nothing right now; the console is still open.
    Empty,
    Closed,
}

/// Line-oriented operator input.
pub trait Console: Send {
    /// Ready when a line is waiting or the console has closed.
    fn poll_line_ready(&mut self, cx: &mut Context<'_>) -> Poll<()>;

    /// Take the next line without waiting.
    fn try_line(&mut self) -> ConsoleLine;
}

// ── LineConsole ──────────────────────────────────────────────────

/// [`Console`] over any stream of lines (a stdin reader thread, a test
/// channel, ...). A stream error closes the console.
#[derive(Debug)]
pub struct LineConsole<S> {
    lines: S,
    staged: Option<String>,
    closed: bool,
}

impl<S> LineConsole<S>
where
    S: Stream<Item = io::Result<String>> + Unpin + Send,
{
    pub fn new(lines: S) -> Self {
        Self {
            lines,
            staged: None,
            closed: false,
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed && self.staged.is_none()
    }
}

impl<S> Console for LineConsole<S>
where
    S: Stream<Item = io::Result<String>> + Unpin + Send,
{
    fn poll_line_ready(&mut self, cx: &mut Context<'_>) -> Poll<()> {
        if self.staged.is_some() || self.closed {
            return Poll::Ready(());
        }
        match self.lines.poll_next_unpin(cx) {
            Poll::Ready(Some(Ok(line))) => self.staged = Some(line),
            Poll::Ready(Some(Err(e))) => {
                tracing::warn!("console read failed: {e}");
                self.closed = true;
            }
            Poll::Ready(None) => self.closed = true,
            Poll::Pending => return Poll::Pending,
        }
        Poll::Ready(())
    }

    fn try_line(&mut self) -> ConsoleLine {
        let mut cx = Context::from_waker(noop_waker_ref());
        if self.poll_line_ready(&mut cx).is_pending() {
            return ConsoleLine::Empty;
        }
        match self.staged.take() {
            Some(line) => ConsoleLine::Line(line),
            None => ConsoleLine::Closed,
        }
    }
}

// ── ConsoleAggregator ────────────────────────────────────────────

/// Coalesces every line read during one wake into a single outbound
/// buffer, so a peer hexterm prints one block instead of fragments.
#[derive(Debug)]
pub struct ConsoleAggregator {
    display: DisplayMode,
    pending: BytesMut,
}

/// What one drain of the console produced.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Drained {
    pub lines: usize,
    pub closed: bool,
}

impl ConsoleAggregator {
    pub fn new(display: DisplayMode) -> Self {
        Self {
            display,
            pending: BytesMut::new(),
        }
    }

    /// Decode one line and append it to the pending buffer.
    pub fn push_line(&mut self, line: &str) {
        match self.display {
            DisplayMode::Hex => {
                let parsed = parse_hex(line);
                if !parsed.rejected.is_empty() {
                    tracing::warn!("ignoring non-hex input: {}", parsed.rejected.join(" "));
                }
                self.pending.extend_from_slice(&parsed.bytes);
            }
            DisplayMode::Ascii => {
                self.pending.extend_from_slice(line.as_bytes());
                self.pending.extend_from_slice(b"\n");
            }
        }
    }

    /// Pull every line the console has ready right now.
    pub fn drain<C: Console + ?Sized>(&mut self, console: &mut C) -> Drained {
        let mut drained = Drained::default();
        loop {
            match console.try_line() {
                ConsoleLine::Line(line) => {
                    drained.lines += 1;
                    self.push_line(&line);
                }
                ConsoleLine::Empty => break,
                ConsoleLine::Closed => {
                    drained.closed = true;
                    break;
                }
            }
        }
        drained
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Hand over the pending bytes, leaving the aggregator empty.
    pub fn take(&mut self) -> Bytes {
        self.pending.split().freeze()
    }
}

// ── Tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use tokio::sync::mpsc;
    use tokio_stream::wrappers::UnboundedReceiverStream;

    use super::*;

    fn console_from(lines: &[&str]) -> LineConsole<impl Stream<Item = io::Result<String>> + Unpin + Send> {
        let owned: Vec<io::Result<String>> = lines.iter().map(|l| Ok(l.to_string())).collect();
        LineConsole::new(futures::stream::iter(owned))
    }

    #[test]
    fn hex_lines_are_decoded_and_joined() {
        let mut agg = ConsoleAggregator::new(DisplayMode::Hex);
        let mut console = console_from(&["41 42", "0a", "zz"]);
        let drained = agg.drain(&mut console);
        assert_eq!(drained, Drained { lines: 3, closed: true });
        assert_eq!(&agg.take()[..], &[0x41, 0x42, 0x0a]);
        assert!(agg.is_empty());
    }

    #[test]
    fn ascii_lines_get_newlines() {
        let mut agg = ConsoleAggregator::new(DisplayMode::Ascii);
        agg.push_line("hi");
        agg.push_line("");
        assert_eq!(&agg.take()[..], b"hi\n\n");
    }

    #[test]
    fn open_console_yields_empty_not_closed() {
        let (tx, rx) = mpsc::unbounded_channel::<io::Result<String>>();
        let mut console = LineConsole::new(UnboundedReceiverStream::new(rx));
        assert_eq!(console.try_line(), ConsoleLine::Empty);

        tx.send(Ok("01".into())).unwrap();
        assert_eq!(console.try_line(), ConsoleLine::Line("01".into()));
        assert_eq!(console.try_line(), ConsoleLine::Empty);
        assert!(!console.is_closed());

        drop(tx);
        assert_eq!(console.try_line(), ConsoleLine::Closed);
        assert!(console.is_closed());
    }

    #[test]
    fn stream_error_closes_console() {
        let items = vec![
            Ok("01".to_string()),
            Err(io::Error::new(io::ErrorKind::InvalidData, "not utf-8")),
        ];
        let mut console = LineConsole::new(futures::stream::iter(items));
        let mut agg = ConsoleAggregator::new(DisplayMode::Hex);
        assert_eq!(agg.drain(&mut console), Drained { lines: 1, closed: true });
    }
}
