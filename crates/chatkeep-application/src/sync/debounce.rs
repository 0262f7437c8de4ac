//! Cancelable restore timer.

use std::future::Future;
use std::sync::Mutex;
use std::time::Duration;
use tokio::task::JoinHandle;

/// Coalesces bursts of signals into one piece of work.
///
/// Each [`schedule`](Self::schedule) cancels the pending timer and starts a
/// new one, so only the last signal of a burst runs. Once the window has
/// elapsed the work is detached from the timer: a later signal can no
/// longer cancel it halfway.
#[derive(Debug)]
pub struct RestoreDebouncer {
    window: Duration,
    pending: Mutex<Option<JoinHandle<()>>>,
}

impl RestoreDebouncer {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            pending: Mutex::new(None),
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Runs `work` after the window unless another call comes first.
    pub fn schedule<F>(&self, work: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let window = self.window;
        let timer = tokio::spawn(async move {
            tokio::time::sleep(window).await;
            tokio::spawn(work);
        });

        let mut pending = self.pending.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(previous) = pending.replace(timer) {
            previous.abort();
        }
    }

    /// Cancels the pending timer, if any.
    pub fn cancel(&self) {
        let mut pending = self.pending.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(previous) = pending.take() {
            previous.abort();
        }
    }
}

impl Drop for RestoreDebouncer {
    fn drop(&mut self) {
        self.cancel();
    }
}
