//! Stdin as a session console.

use std::io::{self, BufRead};

use hexterm_core::LineConsole;
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;

pub type StdinConsole = LineConsole<UnboundedReceiverStream<io::Result<String>>>;

/// Read stdin on a dedicated thread and feed its lines to a console.
///
/// End of stdin drops the sender, which closes the console. A read error
/// is forwarded once and also closes it.
pub fn spawn_stdin_console() -> io::Result<StdinConsole> {
    let (tx, rx) = mpsc::unbounded_channel();
    std::thread::Builder::new()
        .name("hexterm-stdin".into())
        .spawn(move || {
            for line in io::stdin().lock().lines() {
                let failed = line.is_err();
                if tx.send(line).is_err() || failed {
                    break;
                }
            }
            tracing::debug!("stdin reader finished");
        })?;
    Ok(LineConsole::new(UnboundedReceiverStream::new(rx)))
}
