use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use super::{CaptureOutcome, FailureReason};

/// Handle to one in-flight capture task.
pub struct CaptureHandle {
    cancel: CancellationToken,
    join: JoinHandle<CaptureOutcome>,
}

impl CaptureHandle {
    /// Request cooperative cancellation. Idempotent; a no-op once the task
    /// has finished.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// A clone of the task's cancellation token, for wiring to signal
    /// handlers or timeouts.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }

    /// Wait for the capture's terminal outcome.
    pub async fn wait(self) -> CaptureOutcome {
        match self.join.await {
            Ok(outcome) => outcome,
            Err(err) => {
                tracing::error!("Capture task aborted: {}", err);
                CaptureOutcome::Failure {
                    reason: FailureReason::EngineFailed,
                }
            }
        }
    }
}

/// Registry of in-flight captures keyed by owner, with a defined lifecycle:
/// an owner's token is inserted before their task starts and removed when the
/// task reaches its terminal outcome. Cancelling an owner with no live task
/// is a no-op.
#[derive(Clone, Default)]
pub struct TaskRegistry {
    live: Arc<Mutex<HashMap<String, Entry>>>,
}

struct Entry {
    id: Uuid,
    cancel: CancellationToken,
}

impl TaskRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawn a capture task for `owner`. The factory receives the task's
    /// cancellation token; the produced future runs on the tokio runtime and
    /// deregisters itself once it resolves.
    pub fn spawn<F, Fut>(&self, owner: &str, make_capture: F) -> CaptureHandle
    where
        F: FnOnce(CancellationToken) -> Fut,
        Fut: Future<Output = CaptureOutcome> + Send + 'static,
    {
        let cancel = CancellationToken::new();
        let id = Uuid::new_v4();
        let capture = make_capture(cancel.clone());

        {
            let mut live = self.live.lock().unwrap();
            let entry = Entry {
                id,
                cancel: cancel.clone(),
            };
            // A new capture for the same owner supersedes a stale entry
            if let Some(previous) = live.insert(owner.to_string(), entry) {
                previous.cancel.cancel();
            }
        }

        let live = Arc::clone(&self.live);
        let owner = owner.to_string();
        let join = tokio::spawn(async move {
            let outcome = capture.await;

            let mut live = live.lock().unwrap();
            // Only remove our own entry; a superseding capture may have
            // replaced it already
            if live.get(&owner).is_some_and(|entry| entry.id == id) {
                live.remove(&owner);
            }
            outcome
        });

        CaptureHandle { cancel, join }
    }

    /// Cancel the owner's in-flight capture, if any. Returns whether a live
    /// task was found.
    pub fn cancel(&self, owner: &str) -> bool {
        let live = self.live.lock().unwrap();
        match live.get(owner) {
            Some(entry) => {
                entry.cancel.cancel();
                true
            }
            None => false,
        }
    }

    pub fn is_active(&self, owner: &str) -> bool {
        self.live.lock().unwrap().contains_key(owner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_registry_removes_entry_on_completion() {
        let registry = TaskRegistry::new();
        let handle = registry.spawn("alice", |_cancel| async {
            CaptureOutcome::Failure {
                reason: FailureReason::EngineFailed,
            }
        });

        handle.wait().await;
        // Deregistration happens inside the task, so it is already done here
        assert!(!registry.is_active("alice"));
        assert!(!registry.cancel("alice"));
    }

    #[tokio::test]
    async fn test_cancel_reaches_running_task() {
        let registry = TaskRegistry::new();
        let handle = registry.spawn("bob", |cancel| async move {
            cancel.cancelled().await;
            CaptureOutcome::Failure {
                reason: FailureReason::Cancelled,
            }
        });

        assert!(registry.is_active("bob"));
        assert!(registry.cancel("bob"));

        let outcome = tokio::time::timeout(Duration::from_secs(1), handle.wait())
            .await
            .unwrap();
        assert!(outcome.was_cancelled());
    }

    #[tokio::test]
    async fn test_cancel_unknown_owner_is_noop() {
        let registry = TaskRegistry::new();
        assert!(!registry.cancel("nobody"));
    }

    #[tokio::test]
    async fn test_handle_cancel_is_idempotent() {
        let registry = TaskRegistry::new();
        let handle = registry.spawn("carol", |_cancel| async {
            CaptureOutcome::Failure {
                reason: FailureReason::EngineFailed,
            }
        });

        handle.cancel();
        handle.cancel();
        let outcome = handle.wait().await;
        // The task never observed the token, so cancellation changed nothing
        assert!(!outcome.was_cancelled());
    }
}
