//! Timer-reset debouncing for local edits.
//!
//! Each [`Debouncer::push`] restarts the quiet-period timer; when the timer
//! fires, only the most recent value is handed to the handler. Values pushed
//! while the handler is running are held until it returns.

use std::future::Future;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

pub struct Debouncer<T> {
    tx: mpsc::UnboundedSender<T>,
    task: JoinHandle<()>,
}

impl<T> Debouncer<T>
where
    T: Send + 'static,
{
    /// Spawn the debouncing task on the current tokio runtime.
    pub fn spawn<F, Fut>(delay: Duration, handler: F) -> Self
    where
        F: Fn(T) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let (tx, mut rx) = mpsc::unbounded_channel::<T>();
        let task = tokio::spawn(async move {
            let mut pending: Option<T> = None;
            loop {
                match pending.take() {
                    None => match rx.recv().await {
                        Some(value) => pending = Some(value),
                        None => break,
                    },
                    Some(value) => {
                        tokio::select! {
                            next = rx.recv() => match next {
                                Some(newer) => pending = Some(newer),
                                None => {
                                    // Closed with a value still waiting: flush it.
                                    handler(value).await;
                                    break;
                                }
                            },
                            _ = tokio::time::sleep(delay) => handler(value).await,
                        }
                    }
                }
            }
        });
        Self { tx, task }
    }

    /// Schedule `value`, replacing any value still waiting for its timer.
    ///
    /// Returns `false` if the debouncer has shut down.
    pub fn push(&self, value: T) -> bool {
        self.tx.send(value).is_ok()
    }

    /// Flush any pending value and wait for the handler to finish.
    pub async fn shutdown(self) {
        let Self { tx, task } = self;
        drop(tx);
        if let Err(e) = task.await {
            tracing::warn!(target: "collab::debounce", error = %e, "debounce task failed");
        }
    }
}
