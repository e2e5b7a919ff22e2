use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use super::engine::{self, EngineInvocation};
use super::progress::ProgressReporter;
use super::recovery;
use super::{CaptureOutcome, CaptureRequest, FailureReason, MIN_ARTIFACT_BYTES};
use crate::transport::EventSink;
use crate::utils::format_file_size;
use crate::CaptureError;

/// Knobs for one orchestrator instance, lifted out of [crate::config::Config].
#[derive(Debug, Clone)]
pub struct CaptureSettings {
    pub ffmpeg_path: String,
    pub progress_cooldown: Duration,
    pub fallback_bitrate: String,
}

impl Default for CaptureSettings {
    fn default() -> Self {
        Self {
            ffmpeg_path: "ffmpeg".to_string(),
            progress_cooldown: Duration::from_secs(30),
            fallback_bitrate: "128k".to_string(),
        }
    }
}

/// The primary/fallback pair of engine launches for one capture.
#[derive(Debug, Clone)]
pub struct CapturePlan {
    pub primary: EngineInvocation,
    pub fallback: EngineInvocation,
}

/// Coordinates one capture end to end: primary engine attempt, fallback on
/// failure, artifact validation and delivery, and partial-result recovery on
/// every failure or cancellation path. Exactly one engine subprocess is alive
/// at any instant; the caller is never left without a notification.
pub struct CaptureOrchestrator {
    sink: Arc<dyn EventSink>,
    settings: CaptureSettings,
}

impl CaptureOrchestrator {
    pub fn new(sink: Arc<dyn EventSink>, settings: CaptureSettings) -> Self {
        Self { sink, settings }
    }

    /// Run one capture with the default stream-copy/re-encode strategy pair.
    pub async fn capture(&self, request: &CaptureRequest, cancel: &CancellationToken) -> CaptureOutcome {
        let plan = CapturePlan {
            primary: EngineInvocation::stream_copy(
                &self.settings.ffmpeg_path,
                &request.stream_url,
                &request.output_path,
            ),
            fallback: EngineInvocation::reencode(
                &self.settings.ffmpeg_path,
                &request.stream_url,
                &request.output_path,
                &self.settings.fallback_bitrate,
            ),
        };
        self.capture_with_plan(plan, &request.output_path, cancel).await
    }

    /// Run one capture with caller-supplied engine invocations.
    pub async fn capture_with_plan(
        &self,
        plan: CapturePlan,
        output_path: &Path,
        cancel: &CancellationToken,
    ) -> CaptureOutcome {
        match self.run_attempts(plan, output_path, cancel).await {
            Ok(outcome) => outcome,
            Err(CaptureError::Cancelled) => {
                self.sink.notify("Capture was interrupted.").await;
                // Recovery runs to completion even though the capture was
                // cancelled; the outcome carries the cancellation flavor.
                self.recover(output_path, FailureReason::Cancelled).await
            }
            Err(err) => {
                tracing::warn!("Capture failed: {}", err);
                self.sink.notify("Failed to capture audio.").await;
                self.recover(output_path, FailureReason::from(&err)).await
            }
        }
    }

    async fn run_attempts(
        &self,
        plan: CapturePlan,
        output_path: &Path,
        cancel: &CancellationToken,
    ) -> Result<CaptureOutcome, CaptureError> {
        if let Some(parent) = output_path.parent() {
            fs_err::create_dir_all(parent)?;
        }

        // One reporter per capture; its throttling state spans both attempts.
        let mut reporter = ProgressReporter::new(self.settings.progress_cooldown);

        let primary = engine::run_engine(&plan.primary, &mut reporter, self.sink.as_ref(), cancel).await;
        let primary_ok = match primary {
            Ok(run) if run.success() => true,
            Ok(run) => {
                tracing::warn!(
                    "Stream-copy attempt exited with {}; log tail: {}",
                    run.status,
                    log_tail(&run.log)
                );
                false
            }
            Err(CaptureError::Cancelled) => return Err(CaptureError::Cancelled),
            Err(err) => {
                tracing::warn!("Stream-copy attempt failed to run: {}", err);
                false
            }
        };

        if !primary_ok {
            self.sink
                .notify("Fast method failed, trying alternative approach...")
                .await;

            let fallback = engine::run_engine(&plan.fallback, &mut reporter, self.sink.as_ref(), cancel).await?;
            if !fallback.success() {
                tracing::warn!(
                    "Re-encode attempt exited with {}; log tail: {}",
                    fallback.status,
                    log_tail(&fallback.log)
                );
                return Err(CaptureError::EngineExit {
                    code: fallback.status.code(),
                });
            }
        }

        self.validate_and_deliver(output_path).await
    }

    /// Size-check the artifact, announce it, and hand it to the transport.
    async fn validate_and_deliver(&self, output_path: &Path) -> Result<CaptureOutcome, CaptureError> {
        let metadata = fs_err::metadata(output_path).map_err(|_| CaptureError::EngineExit { code: None })?;
        let size_bytes = metadata.len();

        if size_bytes < MIN_ARTIFACT_BYTES {
            self.sink.notify("Captured file is too small.").await;
            let _ = fs_err::remove_file(output_path);
            return Ok(CaptureOutcome::Failure {
                reason: FailureReason::ArtifactTooSmall,
            });
        }

        self.sink
            .notify(&format!(
                "File size: {}, attempting to send...",
                format_file_size(size_bytes)
            ))
            .await;

        match self.sink.deliver_artifact(output_path).await {
            Ok(()) => {
                self.sink.notify("Capture complete! File sent.").await;
                let _ = fs_err::remove_file(output_path);
                Ok(CaptureOutcome::Success {
                    path: output_path.to_path_buf(),
                    size_bytes,
                })
            }
            Err(err) => {
                // The artifact is retained so delivery can be retried by hand.
                self.sink
                    .notify(&format!(
                        "Failed to send file: {}. The file was kept at {}.",
                        err,
                        output_path.display()
                    ))
                    .await;
                Ok(CaptureOutcome::Partial {
                    path: output_path.to_path_buf(),
                    size_bytes,
                    reason: FailureReason::DeliveryFailed,
                })
            }
        }
    }

    /// Salvage whatever bytes exist at the output path and offer them to the
    /// caller. Delivery trouble here degrades to a textual notice naming the
    /// on-disk path; it never hard-fails the capture.
    async fn recover(&self, output_path: &Path, reason: FailureReason) -> CaptureOutcome {
        let Some((path, size_bytes)) = recovery::salvage(output_path) else {
            return CaptureOutcome::Failure { reason };
        };

        match self.sink.deliver_artifact(&path).await {
            Ok(()) => {
                self.sink.notify("Sent partially captured audio.").await;
            }
            Err(err) => {
                tracing::warn!("Partial delivery failed: {}", err);
                self.sink
                    .notify(&format!(
                        "Partial file available at: {} ({})",
                        path.display(),
                        format_file_size(size_bytes)
                    ))
                    .await;
            }
        }

        CaptureOutcome::Partial {
            path,
            size_bytes,
            reason,
        }
    }
}

fn log_tail(log: &str) -> &str {
    let tail_at = log.len().saturating_sub(400);
    match log.char_indices().find(|(i, _)| *i >= tail_at) {
        Some((i, _)) => &log[i..],
        None => "",
    }
}

impl From<&CaptureError> for FailureReason {
    fn from(err: &CaptureError) -> Self {
        match err {
            CaptureError::Cancelled => FailureReason::Cancelled,
            CaptureError::ArtifactTooSmall(_) => FailureReason::ArtifactTooSmall,
            CaptureError::Delivery(_) => FailureReason::DeliveryFailed,
            _ => FailureReason::EngineFailed,
        }
    }
}
