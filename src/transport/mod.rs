use async_trait::async_trait;
use std::path::Path;

pub mod console;

pub use console::ConsoleSink;

/// Why an artifact could not be handed to the caller's transport.
#[derive(thiserror::Error, Debug)]
pub enum DeliveryError {
    #[error("transport rejected the artifact: {0}")]
    Rejected(String),

    #[error("i/o error while delivering artifact: {0}")]
    Io(#[from] std::io::Error),
}

/// The caller-supplied side of a capture: status notifications plus artifact
/// delivery. The capture core never assumes what is behind it (a console, a
/// chat transport, a test recorder).
#[async_trait]
pub trait EventSink: Send + Sync {
    /// Surface a human-readable status line. Best effort; implementations
    /// swallow their own transport errors so a flaky notification channel
    /// can never fail a capture.
    async fn notify(&self, text: &str);

    /// Hand the finished (or partial) artifact to the caller.
    async fn deliver_artifact(&self, path: &Path) -> Result<(), DeliveryError>;
}

#[cfg(test)]
pub mod testing {
    use super::*;
    use std::path::PathBuf;
    use std::sync::Mutex;

    /// Records notifications and delivery attempts; optionally refuses delivery.
    pub struct RecordingSink {
        notifications: Mutex<Vec<String>>,
        deliveries: Mutex<Vec<PathBuf>>,
        fail_delivery: bool,
    }

    impl RecordingSink {
        pub fn new() -> Self {
            Self {
                notifications: Mutex::new(Vec::new()),
                deliveries: Mutex::new(Vec::new()),
                fail_delivery: false,
            }
        }

        pub fn failing_delivery() -> Self {
            Self {
                fail_delivery: true,
                ..Self::new()
            }
        }

        pub fn notifications(&self) -> Vec<String> {
            self.notifications.lock().unwrap().clone()
        }

        pub fn deliveries(&self) -> Vec<PathBuf> {
            self.deliveries.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl EventSink for RecordingSink {
        async fn notify(&self, text: &str) {
            self.notifications.lock().unwrap().push(text.to_string());
        }

        async fn deliver_artifact(&self, path: &Path) -> Result<(), DeliveryError> {
            self.deliveries.lock().unwrap().push(path.to_path_buf());
            if self.fail_delivery {
                Err(DeliveryError::Rejected("recording sink configured to fail".to_string()))
            } else {
                Ok(())
            }
        }
    }
}
