//! Universal Capturer - A Rust CLI tool for capturing audio streams from various platforms
//!
//! This library provides functionality to resolve playable audio streams from platforms like
//! Twitter/X Spaces and direct media URLs, capture them to disk by driving ffmpeg as an
//! external engine, and deliver the result (or whatever partial result survived a failure
//! or cancellation) through a caller-supplied transport sink.

pub mod capture;
pub mod cli;
pub mod config;
pub mod resolvers;
pub mod transport;
pub mod utils;

pub use capture::{CaptureOrchestrator, CaptureOutcome, CaptureRequest, FailureReason};
pub use cli::{Cli, Commands};
pub use config::Config;
pub use resolvers::{ResolverRegistry, StreamInfo, StreamResolver};
pub use transport::{DeliveryError, EventSink};

/// Result type used throughout the library
pub type Result<T> = anyhow::Result<T>;

/// Error taxonomy for one orchestrated capture. Failures of an individual engine
/// attempt are absorbed by the orchestrator (fallback, then recovery) and reach the
/// caller only as notifications; these variants are what flows between the capture
/// components themselves.
#[derive(thiserror::Error, Debug)]
pub enum CaptureError {
    #[error("no playable stream found for {0}")]
    Resolution(String),

    #[error("failed to launch capture engine: {0}")]
    EngineLaunch(#[source] std::io::Error),

    #[error("capture engine exited with code {code:?}")]
    EngineExit { code: Option<i32> },

    #[error("captured file is too small ({0} bytes)")]
    ArtifactTooSmall(u64),

    #[error("artifact delivery failed: {0}")]
    Delivery(#[from] transport::DeliveryError),

    #[error("capture was cancelled")]
    Cancelled,

    #[error("i/o error during capture: {0}")]
    Io(#[from] std::io::Error),
}
