//! # hexterm — interactive hex/ascii terminal
//!
//! Attaches a [`hexterm_core::Session`] to a TCP stream or listener, a UDP
//! socket, a serial device, a child process or a file, with stdin as the
//! console and stdout as the dump sink.

pub mod config;
pub mod console;
pub mod target;
