//! # hexterm-core
//!
//! Core library for the hexterm diagnostic terminal.
//!
//! This crate contains:
//! - **Codec**: hex text <-> bytes and dump rendering (`DumpFormatter`)
//! - **Checksum**: djb2 `checksum32` and its 5-group text form
//! - **Spam**: self-describing load packets, their verifier and `SpamSchedule`
//! - **Console**: `Console` line sources and the `ConsoleAggregator`
//! - **Transport**: the `Transport` capability with TCP, UDP and stream backends
//! - **Session**: the readiness loop tying all of the above together
//! - **Timer**: `PhaseTimer` and interval formatting
//! - **Error**: `HextermError` and `SpamError`, `thiserror`-based

pub mod checksum;
pub mod codec;
pub mod config;
pub mod console;
pub mod error;
pub mod session;
pub mod spam;
pub mod timer;
pub mod transport;

// ── Re-exports for ergonomic usage ───────────────────────────────

pub use checksum::{checksum_text, checksum32};
pub use codec::{DumpFormatter, ParsedHex, bytes_to_hex, hex_to_bytes, parse_hex};
pub use config::{DisplayMode, SessionConfig, SpamConfig, SpamRate};
pub use console::{Console, ConsoleAggregator, ConsoleLine, LineConsole};
pub use error::{HextermError, SpamError};
pub use session::{READ_BUFFER_SIZE, Session, SessionState, SessionStats};
pub use spam::SpamSchedule;
pub use timer::PhaseTimer;
pub use transport::{StreamTransport, TcpTransport, Transport, UdpTransport};
