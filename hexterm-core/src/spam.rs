//! Self-describing load packets.
//!
//! ## Packet layout
//!
//! ```text
//! length:   u32 LE (4)   total packet size, header included
//! payload:  [u8]         seed, seed+1, seed+2, ... (mod 256)
//! ```
//!
//! Packets shorter than four bytes carry no header, only the sequence.

use bytes::{BufMut, Bytes, BytesMut};
use tokio::time::Instant;

use crate::config::SpamRate;
use crate::error::SpamError;

/// Size of the little-endian length prefix.
pub const SPAM_HEADER_SIZE: usize = 4;

/// Build one spam packet of `size` bytes.
pub fn generate(size: usize, seed: u8) -> Bytes {
    let mut buf = BytesMut::with_capacity(size);
    let payload_len = if size >= SPAM_HEADER_SIZE {
        buf.put_u32_le(size as u32);
        size - SPAM_HEADER_SIZE
    } else {
        size
    };
    let mut v = seed;
    for _ in 0..payload_len {
        buf.put_u8(v);
        v = v.wrapping_add(1);
    }
    buf.freeze()
}

/// Check a received buffer against the spam layout.
///
/// Checks run in order and stop at the first failure: header fits,
/// advertised length equals actual length, payload increments by one.
pub fn verify(buf: &[u8]) -> Result<(), SpamError> {
    let Some(header) = buf.first_chunk::<SPAM_HEADER_SIZE>() else {
        return Err(SpamError::TooShort(buf.len()));
    };

    let advertised = u32::from_le_bytes(*header);
    if advertised as usize != buf.len() {
        return Err(SpamError::LengthMismatch {
            advertised,
            actual: buf.len(),
        });
    }

    let payload = &buf[SPAM_HEADER_SIZE..];
    if let Some((&first, rest)) = payload.split_first() {
        let mut expected = first;
        for (i, &actual) in rest.iter().enumerate() {
            expected = expected.wrapping_add(1);
            if actual != expected {
                return Err(SpamError::UnexpectedByte {
                    offset: SPAM_HEADER_SIZE + 1 + i,
                    expected,
                    actual,
                });
            }
        }
    }
    Ok(())
}

// ── SpamSchedule ─────────────────────────────────────────────────

/// Fixed-rate deadline bookkeeping.
///
/// Deadlines advance from the previous deadline, never from "now", so a
/// late wake does not push every later transmission back.
#[derive(Debug, Clone)]
pub struct SpamSchedule {
    rate: SpamRate,
    next: Option<Instant>,
}

impl SpamSchedule {
    /// First timed deadline is `start`; unlimited and disabled rates have none.
    pub fn new(rate: SpamRate, start: Instant) -> Self {
        let next = match rate {
            SpamRate::PerSecond(_) => Some(start),
            _ => None,
        };
        Self { rate, next }
    }

    /// Next mandatory wake, if any.
    pub fn deadline(&self) -> Option<Instant> {
        self.next
    }

    /// Move the deadline forward by one period.
    pub fn advance(&mut self) {
        if let (Some(next), Some(period)) = (self.next, self.rate.period()) {
            self.next = Some(next + period);
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────
