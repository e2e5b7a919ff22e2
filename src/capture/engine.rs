use std::path::Path;
use std::process::{ExitStatus, Stdio};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tokio_util::sync::CancellationToken;

use super::progress::{self, ProgressReporter};
use crate::transport::EventSink;
use crate::CaptureError;

/// One engine launch: program plus argument vector. Constructed fresh per
/// attempt since the primary and fallback strategies differ.
#[derive(Debug, Clone)]
pub struct EngineInvocation {
    pub program: String,
    pub args: Vec<String>,
}

impl EngineInvocation {
    /// Stream-copy capture: no re-encoding, fastest, preserves the original
    /// codec. The ADTS-to-ASC bitstream filter is needed to put raw AAC from
    /// an HLS stream into an MP4-family container.
    pub fn stream_copy(ffmpeg_path: &str, input_url: &str, output_path: &Path) -> Self {
        Self {
            program: ffmpeg_path.to_string(),
            args: vec![
                "-y".to_string(),
                "-i".to_string(),
                input_url.to_string(),
                "-c".to_string(),
                "copy".to_string(),
                "-bsf:a".to_string(),
                "aac_adtstoasc".to_string(),
                "-progress".to_string(),
                "pipe:1".to_string(),
                "-nostats".to_string(),
                output_path.to_string_lossy().to_string(),
            ],
        }
    }

    /// Re-encode capture: slower, but recovers from stream irregularities
    /// that break stream-copy mode.
    pub fn reencode(ffmpeg_path: &str, input_url: &str, output_path: &Path, bitrate: &str) -> Self {
        Self {
            program: ffmpeg_path.to_string(),
            args: vec![
                "-y".to_string(),
                "-i".to_string(),
                input_url.to_string(),
                "-c:a".to_string(),
                "libmp3lame".to_string(),
                "-b:a".to_string(),
                bitrate.to_string(),
                "-progress".to_string(),
                "pipe:1".to_string(),
                "-nostats".to_string(),
                output_path.to_string_lossy().to_string(),
            ],
        }
    }
}

/// Exit status and accumulated output of one engine run.
#[derive(Debug)]
pub struct EngineRun {
    pub status: ExitStatus,
    pub log: String,
}

impl EngineRun {
    pub fn success(&self) -> bool {
        self.status.success()
    }
}

/// Run one engine invocation to completion, streaming its output through the
/// progress reporter into the caller's sink.
///
/// Both stdout (the progress protocol) and stderr (diagnostics) are drained
/// line by line into the combined log, so engine output is preserved even on
/// failure. The cancellation token is observed at every await point; on
/// cancellation the child is force-killed and reaped before `Cancelled` is
/// returned, so no orphaned engine process can outlive the capture task.
pub async fn run_engine(
    invocation: &EngineInvocation,
    reporter: &mut ProgressReporter,
    sink: &dyn EventSink,
    cancel: &CancellationToken,
) -> Result<EngineRun, CaptureError> {
    tracing::debug!("Launching engine: {} {:?}", invocation.program, invocation.args);

    let mut child = Command::new(&invocation.program)
        .args(&invocation.args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(CaptureError::EngineLaunch)?;

    let stdout = child.stdout.take().expect("child stdout is piped");
    let stderr = child.stderr.take().expect("child stderr is piped");
    let mut out_lines = BufReader::new(stdout).lines();
    let mut err_lines = BufReader::new(stderr).lines();

    let mut log = String::new();
    let mut out_done = false;
    let mut err_done = false;

    while !(out_done && err_done) {
        tokio::select! {
            _ = cancel.cancelled() => {
                return Err(terminate(&mut child).await);
            }
            line = out_lines.next_line(), if !out_done => match line? {
                Some(line) => handle_line(&line, &mut log, reporter, sink).await,
                None => out_done = true,
            },
            line = err_lines.next_line(), if !err_done => match line? {
                Some(line) => handle_line(&line, &mut log, reporter, sink).await,
                None => err_done = true,
            },
        }
    }

    let status = tokio::select! {
        _ = cancel.cancelled() => {
            return Err(terminate(&mut child).await);
        }
        status = child.wait() => status?,
    };

    tracing::debug!("Engine exited with status {}", status);
    Ok(EngineRun { status, log })
}

async fn handle_line(line: &str, log: &mut String, reporter: &mut ProgressReporter, sink: &dyn EventSink) {
    let line = line.trim();
    log.push_str(line);
    log.push('\n');

    if let Some(event) = progress::parse_line(line) {
        if let Some(message) = reporter.observe(&event) {
            sink.notify(&message).await;
        }
    }
}

/// Force-kill the child and reap it before reporting cancellation.
async fn terminate(child: &mut tokio::process::Child) -> CaptureError {
    if let Err(err) = child.start_kill() {
        tracing::warn!("Failed to signal engine process: {}", err);
    }
    if let Err(err) = child.wait().await {
        tracing::warn!("Failed to reap engine process: {}", err);
    }
    CaptureError::Cancelled
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::testing::RecordingSink;
    use std::path::PathBuf;
    use std::time::Duration;

    fn shell(script: &str) -> EngineInvocation {
        EngineInvocation {
            program: "sh".to_string(),
            args: vec!["-c".to_string(), script.to_string()],
        }
    }

    #[test]
    fn test_stream_copy_invocation_shape() {
        let inv = EngineInvocation::stream_copy("ffmpeg", "https://host/playlist.m3u8", &PathBuf::from("/tmp/out.m4a"));
        assert_eq!(inv.program, "ffmpeg");
        assert!(inv.args.windows(2).any(|w| w == ["-c", "copy"]));
        assert!(inv.args.windows(2).any(|w| w == ["-bsf:a", "aac_adtstoasc"]));
        assert!(inv.args.windows(2).any(|w| w == ["-progress", "pipe:1"]));
        assert_eq!(inv.args.last().map(String::as_str), Some("/tmp/out.m4a"));
    }

    #[test]
    fn test_reencode_invocation_shape() {
        let inv = EngineInvocation::reencode("ffmpeg", "https://host/playlist.m3u8", &PathBuf::from("/tmp/out.m4a"), "128k");
        assert!(inv.args.windows(2).any(|w| w == ["-c:a", "libmp3lame"]));
        assert!(inv.args.windows(2).any(|w| w == ["-b:a", "128k"]));
        assert!(!inv.args.iter().any(|a| a == "copy"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_run_collects_log_and_reports_progress() {
        let sink = RecordingSink::new();
        let mut reporter = ProgressReporter::new(Duration::from_secs(30));
        let cancel = CancellationToken::new();

        let inv = shell("printf 'out_time_ms=120000000\\nprogress=end\\n'; echo 'banner text' >&2");
        let run = run_engine(&inv, &mut reporter, &sink, &cancel).await.unwrap();

        assert!(run.success());
        assert!(run.log.contains("out_time_ms=120000000"));
        assert!(run.log.contains("banner text"));

        let messages = sink.notifications();
        assert_eq!(messages[0], "Captured ~2 minutes so far...");
        assert_eq!(messages[1], "Processing complete.");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_run_reports_nonzero_exit() {
        let sink = RecordingSink::new();
        let mut reporter = ProgressReporter::new(Duration::from_secs(30));
        let cancel = CancellationToken::new();

        let run = run_engine(&shell("exit 3"), &mut reporter, &sink, &cancel)
            .await
            .unwrap();
        assert!(!run.success());
        assert_eq!(run.status.code(), Some(3));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_missing_program_is_launch_failure() {
        let sink = RecordingSink::new();
        let mut reporter = ProgressReporter::new(Duration::from_secs(30));
        let cancel = CancellationToken::new();

        let inv = EngineInvocation {
            program: "definitely-not-a-real-engine".to_string(),
            args: vec![],
        };
        let err = run_engine(&inv, &mut reporter, &sink, &cancel).await.unwrap_err();
        assert!(matches!(err, CaptureError::EngineLaunch(_)));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_cancellation_kills_engine_promptly() {
        let sink = RecordingSink::new();
        let mut reporter = ProgressReporter::new(Duration::from_secs(30));
        let cancel = CancellationToken::new();

        let token = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            token.cancel();
        });

        let started = std::time::Instant::now();
        let err = run_engine(&shell("sleep 30"), &mut reporter, &sink, &cancel)
            .await
            .unwrap_err();

        assert!(matches!(err, CaptureError::Cancelled));
        assert!(started.elapsed() < Duration::from_secs(5));
    }
}
