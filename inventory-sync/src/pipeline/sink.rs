//! Error lane: every stage reports non-fatal errors here.

use crate::utils::errors::SyncError;
use tokio::sync::mpsc;
use tracing::error;

pub type ErrorSender = mpsc::UnboundedSender<SyncError>;
pub type ErrorReceiver = mpsc::UnboundedReceiver<SyncError>;

/// Hand an error to the sink. Never blocks the reporting stage.
pub fn report(errors: &ErrorSender, err: SyncError) {
    if let Err(mpsc::error::SendError(err)) = errors.send(err) {
        // Sink is gone; don't lose the error entirely.
        error!("{}", err);
    }
}

/// Log every error in arrival order until all senders are dropped.
/// Returns the number of errors seen.
pub async fn drain(errors: ErrorReceiver) -> usize {
    drain_with(errors, |err| error!("{}", err)).await
}

/// Like [`drain`], with a custom reporter called once per error.
pub async fn drain_with<F>(mut errors: ErrorReceiver, mut reporter: F) -> usize
where
    F: FnMut(&SyncError),
{
    let mut count = 0;
    while let Some(err) = errors.recv().await {
        reporter(&err);
        count += 1;
    }
    count
}
