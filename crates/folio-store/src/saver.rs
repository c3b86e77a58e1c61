//! Debounced reading-progress saver.
//!
//! A reader reports progress on every scroll event. [`ProgressSaver`] keeps
//! only the latest report and writes it once the reader has been quiet for
//! the debounce period, so the store sees one write per pause rather than
//! one per event.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{Instant, sleep_until};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use folio_types::ProgressUpdate;

use crate::handle::ContentStore;

enum Command {
    Record(ProgressUpdate),
    Flush(oneshot::Sender<()>),
}

/// Background task that debounces progress writes for one content item.
pub struct ProgressSaver {
    content_id: String,
    tx: mpsc::UnboundedSender<Command>,
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl ProgressSaver {
    /// Spawn a saver using the debounce period from the store's configuration.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn spawn(store: Arc<ContentStore>, content_id: &str) -> Self {
        let quiet = store.config().progress.debounce();
        Self::with_debounce(store, content_id, quiet)
    }

    /// Spawn a saver with an explicit debounce period.
    pub fn with_debounce(store: Arc<ContentStore>, content_id: &str, quiet: Duration) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();

        let task = tokio::spawn(run(
            store,
            content_id.to_string(),
            quiet,
            rx,
            cancel.clone(),
        ));

        Self {
            content_id: content_id.to_string(),
            tx,
            cancel,
            task,
        }
    }

    /// Content item this saver writes progress for.
    pub fn content_id(&self) -> &str {
        &self.content_id
    }

    /// Report new progress, replacing any report not yet written.
    pub fn record(&self, update: ProgressUpdate) {
        if self.tx.send(Command::Record(update)).is_err() {
            warn!("Progress saver for {} has stopped", self.content_id);
        }
    }

    /// Report a scroll position; see [`ProgressUpdate::from_scroll`].
    pub fn record_scroll(&self, position: f64, total_length: f64) {
        self.record(ProgressUpdate::from_scroll(position, total_length));
    }

    /// Write the pending report now, if there is one.
    pub async fn flush(&self) {
        let (ack_tx, ack_rx) = oneshot::channel();
        if self.tx.send(Command::Flush(ack_tx)).is_ok() {
            let _ = ack_rx.await;
        }
    }

    /// Write the pending report and stop the background task.
    pub async fn shutdown(self) {
        self.cancel.cancel();
        if let Err(e) = self.task.await {
            warn!("Progress saver for {} panicked: {}", self.content_id, e);
        }
    }
}

async fn run(
    store: Arc<ContentStore>,
    content_id: String,
    quiet: Duration,
    mut rx: mpsc::UnboundedReceiver<Command>,
    cancel: CancellationToken,
) {
    let mut pending: Option<ProgressUpdate> = None;
    let mut deadline = Instant::now() + quiet;

    loop {
        tokio::select! {
            biased;

            _ = cancel.cancelled() => break,

            command = rx.recv() => match command {
                Some(Command::Record(update)) => {
                    pending = Some(update);
                    deadline = Instant::now() + quiet;
                }
                Some(Command::Flush(ack)) => {
                    write(&store, &content_id, pending.take()).await;
                    let _ = ack.send(());
                }
                None => break,
            },

            _ = sleep_until(deadline), if pending.is_some() => {
                write(&store, &content_id, pending.take()).await;
            }
        }
    }

    // Reports queued before cancellation still count.
    rx.close();
    let mut acks = Vec::new();
    while let Ok(command) = rx.try_recv() {
        match command {
            Command::Record(update) => pending = Some(update),
            Command::Flush(ack) => acks.push(ack),
        }
    }

    write(&store, &content_id, pending.take()).await;
    for ack in acks {
        let _ = ack.send(());
    }
    debug!("Progress saver for {} stopped", content_id);
}

async fn write(store: &ContentStore, content_id: &str, update: Option<ProgressUpdate>) {
    let Some(update) = update else {
        return;
    };

    // Errors are already logged by the store; the saver keeps running.
    if store
        .save_reading_progress(content_id, &update)
        .await
        .is_ok()
    {
        debug!(
            "Wrote progress for {}: {:.1}%",
            content_id, update.completion_percentage
        );
    }
}
