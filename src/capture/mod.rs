use std::path::PathBuf;

pub mod engine;
pub mod orchestrator;
pub mod progress;
pub mod recovery;
pub mod registry;

pub use engine::EngineInvocation;
pub use orchestrator::{CaptureOrchestrator, CapturePlan, CaptureSettings};
pub use progress::{ProgressEvent, ProgressReporter};
pub use registry::{CaptureHandle, TaskRegistry};

/// Artifacts below this size are noise: never a success, never worth
/// delivering as a partial result.
pub const MIN_ARTIFACT_BYTES: u64 = 1024;

/// One capture to perform: a resolved, directly playable stream address and
/// the staging path the engine writes to. The caller owns unique paths; no
/// two concurrent captures may target the same one.
#[derive(Debug, Clone)]
pub struct CaptureRequest {
    pub stream_url: String,
    pub output_path: PathBuf,
}

/// Why a capture fell short of a clean success.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureReason {
    /// Both engine strategies failed, or the engine produced no usable output
    EngineFailed,
    /// The artifact was below the minimum size floor and was discarded
    ArtifactTooSmall,
    /// The transport refused the artifact; it was retained on disk
    DeliveryFailed,
    /// The caller cancelled the capture
    Cancelled,
}

impl std::fmt::Display for FailureReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FailureReason::EngineFailed => write!(f, "engine failed"),
            FailureReason::ArtifactTooSmall => write!(f, "captured file too small"),
            FailureReason::DeliveryFailed => write!(f, "delivery failed"),
            FailureReason::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Terminal result of one orchestrated capture. Produced exactly once per
/// request; everything before it is advisory notification traffic.
#[derive(Debug)]
pub enum CaptureOutcome {
    /// The capture completed and the artifact was delivered
    Success { path: PathBuf, size_bytes: u64 },

    /// Something survived on disk and was offered to the caller
    Partial {
        path: PathBuf,
        size_bytes: u64,
        reason: FailureReason,
    },

    /// Nothing worth delivering
    Failure { reason: FailureReason },
}

impl CaptureOutcome {
    /// Distinguishes caller-initiated cancellation from ordinary failure.
    pub fn was_cancelled(&self) -> bool {
        matches!(
            self,
            CaptureOutcome::Partial {
                reason: FailureReason::Cancelled,
                ..
            } | CaptureOutcome::Failure {
                reason: FailureReason::Cancelled,
            }
        )
    }
}
