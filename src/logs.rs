//! Fan-in channel carrying progress messages to the console
//!
//! Launcher tasks run concurrently across regions; their human-readable
//! progress lines funnel through one mpsc channel to a single drain task so
//! output is never interleaved mid-line. The drain exits when the last
//! [`LogSink`] drops and the channel closes.

use tokio::sync::mpsc;

/// Cloneable sending half handed to every launcher task.
#[derive(Debug, Clone)]
pub struct LogSink {
    tx: mpsc::UnboundedSender<String>,
}

impl LogSink {
    /// Send a message. A closed channel means the drain is already gone and
    /// the message has nowhere useful to go, so the error is discarded.
    pub fn send(&self, message: impl Into<String>) {
        let _ = self.tx.send(message.into());
    }
}

/// Create the sink / receiver pair for one run.
pub fn channel() -> (LogSink, mpsc::UnboundedReceiver<String>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (LogSink { tx }, rx)
}

/// Write every message to stdout until the channel closes.
pub async fn drain(mut rx: mpsc::UnboundedReceiver<String>) {
    while let Some(message) = rx.recv().await {
        println!("{message}");
    }
}
