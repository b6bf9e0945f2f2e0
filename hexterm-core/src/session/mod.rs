//! The session engine.
//!
//! One session bridges one borrowed [`Transport`] to one [`Console`]. Each
//! iteration waits once for readiness and then, in this order:
//!
//! 1. sends a spam packet if one is due,
//! 2. performs one bounded read and dumps it,
//! 3. forwards all pending console lines as a single write.
//!
//! Read failures, write failures and short writes end the session with an
//! error. A closed console ends it normally once nothing is pending.

mod state;
mod wait;

use std::io::Write;

use tokio::time::Instant;
use tracing::{debug, error, info};

use crate::codec::DumpFormatter;
use crate::config::SessionConfig;
use crate::console::{Console, ConsoleAggregator};
use crate::error::HextermError;
use crate::spam::{self, SpamSchedule};
use crate::timer::{PhaseTimer, gap_text};
use crate::transport::Transport;

pub use state::{SessionState, SessionStats};
use wait::{Registration, wait_for_events};

/// Size of the buffer used for each transport read.
pub const READ_BUFFER_SIZE: usize = 2048;

/// Per-session runtime state plus the sink dumps are written to.
pub struct Session<'a, W> {
    config: &'a SessionConfig,
    formatter: DumpFormatter,
    out: W,
    schedule: SpamSchedule,
    started: Instant,
    prev_receive: Option<Instant>,
    aggregator: ConsoleAggregator,
    state: SessionState,
    stats: SessionStats,
}

impl<'a, W: Write + Send> Session<'a, W> {
    pub fn new(config: &'a SessionConfig, out: W) -> Self {
        let now = Instant::now();
        Self {
            config,
            formatter: DumpFormatter::new(config),
            out,
            schedule: SpamSchedule::new(config.spam.rate, now),
            started: now,
            prev_receive: None,
            aggregator: ConsoleAggregator::new(config.display),
            state: SessionState::Running,
            stats: SessionStats::default(),
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn stats(&self) -> &SessionStats {
        &self.stats
    }

    pub fn into_output(self) -> W {
        self.out
    }

    /// Drive the session until the console closes (`Ok`) or the transport
    /// fails (`Err`). The transport is left open either way.
    pub async fn run<T, C>(&mut self, transport: &mut T, console: &mut C) -> Result<(), HextermError>
    where
        T: Transport + ?Sized,
        C: Console + ?Sized,
    {
        if let Err(e) = self.config.validate() {
            self.state = SessionState::Terminated;
            error!("{e}, not starting session");
            return Err(e);
        }

        self.started = Instant::now();
        self.schedule = SpamSchedule::new(self.config.spam.rate, self.started);
        self.prev_receive = None;
        self.state = SessionState::Running;

        let mut timer = PhaseTimer::new("session", "waiting");
        let result = self.run_loop(transport, console, &mut timer).await;
        self.state = SessionState::Terminated;

        if let Err(e) = &result {
            error!("{e}, aborting session");
        }
        result
    }

    async fn run_loop<T, C>(
        &mut self,
        transport: &mut T,
        console: &mut C,
        timer: &mut PhaseTimer,
    ) -> Result<(), HextermError>
    where
        T: Transport + ?Sized,
        C: Console + ?Sized,
    {
        let mut sleep = Box::pin(tokio::time::sleep_until(self.started));

        loop {
            timer.set_phase("waiting");
            let reg = Registration {
                deadline: self.schedule.deadline(),
                write: self.config.spam.rate.is_unlimited(),
                console: self.state.accepts_console(),
            };
            let events = wait_for_events(transport, console, sleep.as_mut(), reg)
                .await
                .map_err(HextermError::WaitFailed)?;

            if events.deadline || events.writable {
                timer.set_phase("spam");
                self.send_spam(transport).await?;
            }

            if events.readable {
                timer.set_phase("receive");
                self.receive(transport)?;
            }

            if events.console {
                timer.set_phase("console");
                self.forward_console(transport, console).await?;
            }

            if self.state == SessionState::Draining && self.aggregator.is_empty() {
                debug!("console drained, session done");
                return Ok(());
            }
        }
    }

    async fn send_spam<T: Transport + ?Sized>(&mut self, transport: &mut T) -> Result<(), HextermError> {
        let size = self.config.spam.size as usize;
        let at = self.schedule.deadline().unwrap_or_else(Instant::now);
        let seed = (at.saturating_duration_since(self.started).as_micros() % 256) as u8;
        let packet = spam::generate(size, seed);

        let written = transport
            .write_fully(&packet)
            .await
            .map_err(|source| HextermError::WriteFailed { expected: size, source })?;
        self.schedule.advance();

        if !self.config.quiet_send && self.config.decorate {
            info!("Sent {written}/{size} bytes of spam!");
        }
        if written != size {
            return Err(HextermError::ShortWrite { written, expected: size });
        }
        self.stats.spam_packets += 1;
        self.stats.spam_bytes += written as u64;
        Ok(())
    }

    fn receive<T: Transport + ?Sized>(&mut self, transport: &mut T) -> Result<(), HextermError> {
        let mut buf = [0u8; READ_BUFFER_SIZE];
        let n = transport.try_read(&mut buf).map_err(HextermError::ReadFailed)?;
        if n == 0 {
            return Ok(());
        }
        let data = &buf[..n];

        let now = Instant::now();
        let gap = now.saturating_duration_since(self.prev_receive.unwrap_or(now));
        self.prev_receive = Some(now);
        let since = gap_text(gap);

        self.stats.packets_received += 1;
        self.stats.bytes_received += n as u64;

        if self.config.spam.verify {
            match spam::verify(data) {
                Ok(()) => {
                    self.stats.verify_passed += 1;
                    info!("Received {n}-byte packet passed the spam verification check.");
                }
                Err(e) => {
                    self.stats.verify_failed += 1;
                    error!("spam verification failed: {e}");
                }
            }
        }

        if self.config.print_received {
            let desc = match transport.source_of_last_packet() {
                Some(from) => format!("Received from {from} ({since} since prev)"),
                None => format!("Received ({since} since prev)"),
            };
            self.emit(data, &desc);
        } else {
            debug!("Received {n}/{READ_BUFFER_SIZE} bytes of data ({since} since prev).");
        }
        Ok(())
    }

    async fn forward_console<T, C>(&mut self, transport: &mut T, console: &mut C) -> Result<(), HextermError>
    where
        T: Transport + ?Sized,
        C: Console + ?Sized,
    {
        let drained = self.aggregator.drain(console);
        if drained.closed && self.state == SessionState::Running {
            self.state = SessionState::Draining;
            info!("Stdin has been closed; exiting...");
        }
        if self.aggregator.is_empty() {
            return Ok(());
        }

        let outbound = self.aggregator.take();
        let expected = outbound.len();
        let written = transport
            .write_fully(&outbound)
            .await
            .map_err(|source| HextermError::WriteFailed { expected, source })?;
        if written != expected {
            return Err(HextermError::ShortWrite { written, expected });
        }

        self.stats.console_writes += 1;
        self.stats.console_bytes += expected as u64;
        if self.config.decorate {
            self.emit(&outbound, "Sent");
        }
        Ok(())
    }

    fn emit(&mut self, data: &[u8], desc: &str) {
        let text = self.formatter.render(data, Some(desc));
        if let Err(e) = self.out.write_all(&text).and_then(|()| self.out.flush()) {
            debug!("dump output failed: {e}");
        }
    }
}
