//! Session lifecycle and counters.

use std::fmt;

/// Where a session is in its life.
///
/// ```text
///  Running ──(console closed)──► Draining ──(nothing pending)──► Terminated
///     │                                                              ▲
///     └────────────(transport failure / short write / wait error)────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    Running,
    /// Console closed, transport still being serviced.
    Draining,
    Terminated,
}

impl SessionState {
    /// Whether the console should still be waited on.
    pub fn accepts_console(&self) -> bool {
        matches!(self, Self::Running)
    }

    pub fn is_terminated(&self) -> bool {
        matches!(self, Self::Terminated)
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Running => write!(f, "Running"),
            Self::Draining => write!(f, "Draining"),
            Self::Terminated => write!(f, "Terminated"),
        }
    }
}

// ── SessionStats ─────────────────────────────────────────────────

/// Traffic counters for one session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionStats {
    pub spam_packets: u64,
    pub spam_bytes: u64,
    pub packets_received: u64,
    pub bytes_received: u64,
    /// Physical writes made on behalf of the console.
    pub console_writes: u64,
    pub console_bytes: u64,
    pub verify_passed: u64,
    pub verify_failed: u64,
}

impl fmt::Display for SessionStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "received {} bytes in {} reads, sent {} console bytes in {} writes, {} spam packets ({} bytes)",
            self.bytes_received,
            self.packets_received,
            self.console_bytes,
            self.console_writes,
            self.spam_packets,
            self.spam_bytes,
        )?;
        if self.verify_passed + self.verify_failed > 0 {
            write!(
                f,
                ", spam verification {} passed / {} failed",
                self.verify_passed, self.verify_failed
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_running_sessions_read_the_console() {
        assert!(SessionState::Running.accepts_console());
        assert!(!SessionState::Draining.accepts_console());
        assert!(!SessionState::Terminated.accepts_console());
        assert!(SessionState::Terminated.is_terminated());
    }

    #[test]
    fn stats_summary_mentions_verification_only_when_used() {
        let mut stats = SessionStats {
            bytes_received: 10,
            packets_received: 2,
            ..Default::default()
        };
        assert!(stats.to_string().contains("received 10 bytes in 2 reads"));
        assert!(!stats.to_string().contains("verification"));

        stats.verify_failed = 1;
        assert!(stats.to_string().contains("0 passed / 1 failed"));
    }
}
