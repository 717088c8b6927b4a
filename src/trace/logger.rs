use std::fs::{self, File, OpenOptions};
use std::io::{LineWriter, Write};
use std::path::Path;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use tracing::{debug, warn};

use crate::error::Result;
use crate::navigation::controller::BacktrackOutcome;

use super::trace::TraceEvent;

/// Exploration trace: one JSON object per line, flushed line by line so an
/// interrupted run still leaves a readable file.
///
/// Tracing never fails a run. A path that cannot be opened leaves the logger
/// disabled.
pub struct TraceLogger {
    sink: Option<Mutex<LineWriter<File>>>,
    written: AtomicU64,
}

impl TraceLogger {
    /// Append to `path`, creating missing parent directories.
    pub fn open(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        let sink = match open_append(path) {
            Ok(file) => {
                debug!(path = %path.display(), "exploration trace enabled");
                Some(Mutex::new(LineWriter::new(file)))
            }
            Err(e) => {
                warn!(path = %path.display(), "exploration trace disabled: {}", e);
                None
            }
        };
        Self {
            sink,
            written: AtomicU64::new(0),
        }
    }

    pub fn disabled() -> Self {
        Self {
            sink: None,
            written: AtomicU64::new(0),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.sink.is_some()
    }

    /// Events written since the logger was opened.
    pub fn written(&self) -> u64 {
        self.written.load(Ordering::Relaxed)
    }

    pub fn log(&self, event: &TraceEvent) {
        let Some(sink) = &self.sink else {
            return;
        };

        let line = match serde_json::to_string(event) {
            Ok(line) => line,
            Err(e) => {
                warn!(step = event.step, "trace event not serializable: {}", e);
                return;
            }
        };
        let mut writer = match sink.lock() {
            Ok(writer) => writer,
            Err(e) => {
                warn!("trace sink lock poisoned: {}", e);
                return;
            }
        };
        match writeln!(writer, "{}", line) {
            Ok(()) => {
                self.written.fetch_add(1, Ordering::Relaxed);
            }
            Err(e) => warn!(step = event.step, "trace write failed: {}", e),
        }
    }

    /// Record one backtrack started from `from`: the strategy and state it
    /// settled on, or the error that ended it.
    pub fn backtrack(&self, step: u64, from: &str, result: &Result<BacktrackOutcome>) {
        let event = TraceEvent::now(step, from).with_outcome("backtrack");
        let event = match result {
            Ok(outcome) => event
                .with_strategy(&outcome.strategy)
                .with_new_state(&outcome.reached),
            Err(e) => event.with_error(e),
        };
        self.log(&event);
    }
}

fn open_append(path: &Path) -> std::io::Result<File> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    OpenOptions::new().create(true).append(true).open(path)
}
