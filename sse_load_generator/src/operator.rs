//! Interactive prompt that grows the load batch by batch.
use crate::counter::ConnectionCounter;
use crate::runner::BatchLauncher;
use std::io::{self, BufRead, Write};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperatorState {
    Prompting,
    ShuttingDown,
}

pub struct OperatorLoop<L, W> {
    launcher: L,
    counter: Arc<ConnectionCounter>,
    cancel: CancellationToken,
    out: W,
    state: OperatorState,
}

impl<L: BatchLauncher, W: Write> OperatorLoop<L, W> {
    pub fn new(
        launcher: L,
        counter: Arc<ConnectionCounter>,
        cancel: CancellationToken,
        out: W,
    ) -> Self {
        Self {
            launcher,
            counter,
            cancel,
            out,
            state: OperatorState::Prompting,
        }
    }

    pub fn state(&self) -> OperatorState {
        self.state
    }

    pub fn into_output(self) -> W {
        self.out
    }

    /// Launches the initial batch, then prompts for more until cancelled.
    ///
    /// `lines` yields raw input lines; when it closes the loop stops prompting
    /// and only waits for cancellation. Returns [`OperatorState::ShuttingDown`].
    pub async fn run(
        &mut self,
        initial: i64,
        mut lines: mpsc::Receiver<String>,
    ) -> io::Result<OperatorState> {
        if self.state == OperatorState::ShuttingDown {
            return Ok(self.state);
        }
        writeln!(self.out, "Testing with {initial} connection(s) initially...")?;
        self.launcher.launch_batch(&self.cancel, initial);

        while !self.cancel.is_cancelled() {
            writeln!(self.out, "\nCurrent total connections: {}", self.counter.current())?;
            write!(
                self.out,
                "Enter the number of additional connections to add (e.g., 10000): "
            )?;
            self.out.flush()?;

            let line = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => break,
                line = lines.recv() => line,
            };
            let Some(line) = line else {
                writeln!(self.out, "\nInput closed; waiting for interrupt.")?;
                self.cancel.cancelled().await;
                break;
            };
            self.handle_line(&line)?;
        }

        self.state = OperatorState::ShuttingDown;
        Ok(self.state)
    }

    fn handle_line(&mut self, line: &str) -> io::Result<()> {
        match parse_batch_size(line) {
            Some(count) => {
                writeln!(self.out, "Adding {count} connections...")?;
                self.launcher.launch_batch(&self.cancel, count);
            }
            None => writeln!(self.out, "Invalid input, please enter a valid number.")?,
        }
        Ok(())
    }
}

/// Signed decimal integer, surrounding whitespace ignored.
pub fn parse_batch_size(line: &str) -> Option<i64> {
    line.trim().parse().ok()
}

/// Forwards stdin lines from a dedicated thread.
///
/// A blocking read on stdin inside the runtime would keep it from shutting
/// down, so the reader lives on its own OS thread and is simply abandoned at
/// exit. The channel closes on end of input or a read error.
pub fn spawn_stdin_reader() -> mpsc::Receiver<String> {
    let (tx, rx) = mpsc::channel(16);
    std::thread::spawn(move || {
        for line in io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            if tx.blocking_send(line).is_err() {
                break;
            }
        }
    });
    rx
}
