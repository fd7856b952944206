use std::future::Future;
use std::time::Duration;

use tokio::task::JoinHandle;

/// A single delayed phase-advance, cancellable exactly once.
///
/// Wraps one spawned task per phase: `arm` refuses while a pending task is
/// live, `cancel` aborts it. Cancelling an unarmed, already-cancelled, or
/// already-fired timer is a no-op, so callers never risk a double advance.
/// The pending task is aborted on drop.
#[derive(Debug, Default)]
pub struct PhaseTimer {
    handle: Option<JoinHandle<()>>,
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum TimerError {
    #[error("timer already armed for this phase")]
    AlreadyArmed,
}

impl PhaseTimer {
    pub fn new() -> Self {
        Self { handle: None }
    }

    /// Schedule `task` to run after `delay`. Errors while a previously armed
    /// task is still pending; a fired timer may be re-armed.
    pub fn arm<F>(&mut self, delay: Duration, task: F) -> Result<(), TimerError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        if self.is_armed() {
            return Err(TimerError::AlreadyArmed);
        }
        self.handle = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            task.await;
        }));
        Ok(())
    }

    /// Abort the pending task, if any. Idempotent.
    pub fn cancel(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }

    pub fn is_armed(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }
}

impl Drop for PhaseTimer {
    fn drop(&mut self) {
        self.cancel();
    }
}
