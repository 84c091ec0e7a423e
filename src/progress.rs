//! Download progress reporting.
//!
//! Page-by-page acquisition from an archive can run for an hour on a long
//! volume, so `folio download` reports what it is doing on **stderr**,
//! keeping stdout parseable for scripts.

use std::io::Write;

/// A single progress event during page acquisition.
#[derive(Clone, Debug)]
pub enum DownloadEvent {
    /// Sequence `seq` of `total` was fetched and saved.
    Saved { id: String, seq: i64, total: i64 },
    /// Sequence `seq` already existed on disk and was skipped.
    Skipped { id: String, seq: i64, total: i64 },
}

/// Reports acquisition progress. Implementations write to stderr.
pub trait DownloadReporter: Send + Sync {
    fn report(&self, event: DownloadEvent);
}

/// Human-friendly progress: "download work00test  page 14 / 418".
pub struct StderrProgress;

impl DownloadReporter for StderrProgress {
    fn report(&self, event: DownloadEvent) {
        let line = match &event {
            DownloadEvent::Saved { id, seq, total } => {
                format!("download {}  page {} / {}\n", id, seq, total)
            }
            DownloadEvent::Skipped { id, seq, total } => {
                format!("download {}  page {} / {} (exists, skipped)\n", id, seq, total)
            }
        };
        let _ = std::io::stderr().lock().write_all(line.as_bytes());
    }
}

/// Machine-readable progress: one JSON object per line on stderr.
pub struct JsonProgress;

impl DownloadReporter for JsonProgress {
    fn report(&self, event: DownloadEvent) {
        let obj = match &event {
            DownloadEvent::Saved { id, seq, total } => serde_json::json!({
                "event": "progress",
                "id": id,
                "action": "saved",
                "seq": seq,
                "total": total
            }),
            DownloadEvent::Skipped { id, seq, total } => serde_json::json!({
                "event": "progress",
                "id": id,
                "action": "skipped",
                "seq": seq,
                "total": total
            }),
        };
        if let Ok(line) = serde_json::to_string(&obj) {
            let _ = writeln!(std::io::stderr().lock(), "{}", line);
        }
    }
}

/// No-op reporter when progress is disabled.
pub struct NoProgress;

impl DownloadReporter for NoProgress {
    fn report(&self, _event: DownloadEvent) {}
}

/// Progress mode for the CLI: off, human (stderr), or JSON (stderr).
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ProgressMode {
    Off,
    Human,
    Json,
}

impl ProgressMode {
    /// Default: human progress when stderr is a TTY, otherwise off.
    pub fn default_for_tty() -> Self {
        if atty::is(atty::Stream::Stderr) {
            ProgressMode::Human
        } else {
            ProgressMode::Off
        }
    }

    pub fn from_flag(flag: Option<&str>) -> Self {
        match flag {
            Some("off") => ProgressMode::Off,
            Some("human") => ProgressMode::Human,
            Some("json") => ProgressMode::Json,
            _ => ProgressMode::default_for_tty(),
        }
    }

    /// Build a reporter for this mode.
    pub fn reporter(&self) -> Box<dyn DownloadReporter> {
        match self {
            ProgressMode::Off => Box::new(NoProgress),
            ProgressMode::Human => Box::new(StderrProgress),
            ProgressMode::Json => Box::new(JsonProgress),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_flags_override_tty_detection() {
        assert_eq!(ProgressMode::from_flag(Some("off")), ProgressMode::Off);
        assert_eq!(ProgressMode::from_flag(Some("human")), ProgressMode::Human);
        assert_eq!(ProgressMode::from_flag(Some("json")), ProgressMode::Json);
    }
}
