use std::future::Future;
use std::io;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Raises `cancel` on the first SIGINT or SIGTERM.
///
/// Handler registration happens before returning so a failure surfaces at
/// startup. Later signals are not observed; cancelling is idempotent anyway.
pub fn spawn_signal_listener(cancel: CancellationToken) -> io::Result<JoinHandle<()>> {
    let signal = shutdown_signal()?;
    Ok(tokio::spawn(cancel_on(signal, cancel)))
}

/// Cancels once `signal` resolves. A failed wait also cancels, since the
/// process would otherwise have no clean way to stop.
pub async fn cancel_on<F>(signal: F, cancel: CancellationToken)
where
    F: Future<Output = io::Result<()>>,
{
    tokio::select! {
        _ = cancel.cancelled() => return,
        received = signal => {
            if let Err(err) = received {
                tracing::error!(error = %err, "waiting for shutdown signal failed");
            }
        }
    }
    println!("\nShutting down...");
    cancel.cancel();
}

#[cfg(unix)]
fn shutdown_signal() -> io::Result<impl Future<Output = io::Result<()>> + Send + 'static> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut terminate = signal(SignalKind::terminate())?;
    Ok(async move {
        tokio::select! {
            res = tokio::signal::ctrl_c() => res,
            _ = terminate.recv() => Ok(()),
        }
    })
}

#[cfg(not(unix))]
fn shutdown_signal() -> io::Result<impl Future<Output = io::Result<()>> + Send + 'static> {
    Ok(tokio::signal::ctrl_c())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn listener_exits_when_already_cancelled() {
        let cancel = CancellationToken::new();
        let handle = spawn_signal_listener(cancel.clone()).expect("register");
        cancel.cancel();
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("listener did not exit")
            .expect("join");
    }

    #[tokio::test]
    async fn received_signal_cancels() {
        let cancel = CancellationToken::new();
        cancel_on(async { Ok(()) }, cancel.clone()).await;
        assert!(cancel.is_cancelled());
    }

    #[tokio::test]
    async fn failed_signal_wait_still_cancels() {
        let cancel = CancellationToken::new();
        cancel_on(async { Err(io::Error::other("no handler")) }, cancel.clone()).await;
        assert!(cancel.is_cancelled());
    }
}
