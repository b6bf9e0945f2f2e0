//! The one suspension point of a session: wait until any registered
//! source is ready or the spam deadline passes.

use std::future::{Future, poll_fn};
use std::io;
use std::pin::Pin;
use std::task::Poll;

use tokio::time::{Instant, Sleep};

use crate::console::Console;
use crate::transport::Transport;

/// What to wait on this iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Registration {
    /// Spam deadline; `None` waits without timeout.
    pub deadline: Option<Instant>,
    /// Watch write readiness (unlimited spam only).
    pub write: bool,
    pub console: bool,
}

/// Sources found ready by one wait.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Events {
    pub deadline: bool,
    pub writable: bool,
    pub readable: bool,
    pub console: bool,
}

impl Events {
    fn any(&self) -> bool {
        self.deadline || self.writable || self.readable || self.console
    }
}

/// Poll every registered source once per wake and report all that are
/// ready, so no source starves behind another.
pub(crate) async fn wait_for_events<T, C>(
    transport: &mut T,
    console: &mut C,
    mut sleep: Pin<&mut Sleep>,
    reg: Registration,
) -> io::Result<Events>
where
    T: Transport + ?Sized,
    C: Console + ?Sized,
{
    if let Some(deadline) = reg.deadline {
        sleep.as_mut().reset(deadline);
    }

    poll_fn(|cx| {
        let mut events = Events::default();

        if reg.deadline.is_some() && sleep.as_mut().poll(cx).is_ready() {
            events.deadline = true;
        }
        if reg.write {
            match transport.poll_write_ready(cx) {
                Poll::Ready(Ok(())) => events.writable = true,
                Poll::Ready(Err(e)) => return Poll::Ready(Err(e)),
                Poll::Pending => {}
            }
        }
        match transport.poll_read_ready(cx) {
            Poll::Ready(Ok(())) => events.readable = true,
            Poll::Ready(Err(e)) => return Poll::Ready(Err(e)),
            Poll::Pending => {}
        }
        if reg.console && console.poll_line_ready(cx).is_ready() {
            events.console = true;
        }

        if events.any() {
            Poll::Ready(Ok(events))
        } else {
            Poll::Pending
        }
    })
    .await
}
