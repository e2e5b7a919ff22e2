use std::time::{Duration, Instant};

/// One `key=value` pair of engine progress output, decoded into what the
/// capture layer cares about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressEvent {
    /// Whole minutes of media processed so far
    Elapsed(u64),

    /// The engine reported end of processing
    Completed,

    /// A well-formed pair we don't interpret
    Unrecognized { key: String, value: String },
}

/// Parse one line of the engine's progress stream.
///
/// ffmpeg's `-progress pipe:1` protocol is one `key=value` pair per line with an
/// unspecified key set; anything else on the combined stream (stderr banners,
/// stream mapping info) yields `None`. `out_time_ms` is, despite the name, a
/// count of microseconds; malformed values (`N/A` during startup) also yield
/// `None` rather than failing the capture.
pub fn parse_line(line: &str) -> Option<ProgressEvent> {
    let (key, value) = line.split_once('=')?;

    match key {
        "out_time_ms" => {
            let micros: u64 = value.trim().parse().ok()?;
            Some(ProgressEvent::Elapsed(micros / 60_000_000))
        }
        "progress" if value.trim().eq_ignore_ascii_case("end") => Some(ProgressEvent::Completed),
        _ => Some(ProgressEvent::Unrecognized {
            key: key.to_string(),
            value: value.to_string(),
        }),
    }
}

/// Throttles progress events into user-meaningful notifications.
///
/// An elapsed-minutes message is emitted only when the cooldown has passed since
/// the last emission AND the minute bucket changed, so the caller is neither
/// flooded nor starved. The completion message bypasses the cooldown and is
/// emitted at most once per capture. One reporter instance belongs to exactly
/// one capture; state never leaks across requests.
pub struct ProgressReporter {
    cooldown: Duration,
    last_emit: Option<Instant>,
    last_minute: Option<u64>,
    completed: bool,
}

impl ProgressReporter {
    pub fn new(cooldown: Duration) -> Self {
        Self {
            cooldown,
            last_emit: None,
            last_minute: None,
            completed: false,
        }
    }

    /// Feed one event; returns the notification text to surface, if any.
    pub fn observe(&mut self, event: &ProgressEvent) -> Option<String> {
        self.observe_at(event, Instant::now())
    }

    fn observe_at(&mut self, event: &ProgressEvent, now: Instant) -> Option<String> {
        match event {
            ProgressEvent::Elapsed(minutes) => {
                let cooled_down = self
                    .last_emit
                    .map(|at| now.duration_since(at) >= self.cooldown)
                    .unwrap_or(true);
                let new_bucket = self.last_minute != Some(*minutes);

                if cooled_down && new_bucket {
                    self.last_emit = Some(now);
                    self.last_minute = Some(*minutes);
                    Some(format!("Captured ~{} minutes so far...", minutes))
                } else {
                    None
                }
            }
            ProgressEvent::Completed => {
                if self.completed {
                    None
                } else {
                    self.completed = true;
                    Some("Processing complete.".to_string())
                }
            }
            ProgressEvent::Unrecognized { .. } => None,
        }
    }
}
