use std::path::PathBuf;
use std::time::{Duration, Instant};

use tracing::{info, warn};

/// Channel to a human operator for the assisted-recovery fallback.
pub trait Operator {
    fn announce(&mut self, message: &str);

    /// Block until the operator signals completion or `timeout` elapses.
    /// Returns `true` when the operator responded.
    fn wait_for_acknowledgement(&mut self, timeout: Duration) -> bool;
}

/// Operator who acknowledges by creating a signal file.
///
/// The file is removed once seen so each request needs a fresh signal.
pub struct SignalFileOperator {
    signal_path: PathBuf,
    poll_interval: Duration,
}

impl SignalFileOperator {
    pub fn new(signal_path: impl Into<PathBuf>) -> Self {
        Self {
            signal_path: signal_path.into(),
            poll_interval: Duration::from_millis(200),
        }
    }
}

impl Operator for SignalFileOperator {
    fn announce(&mut self, message: &str) {
        warn!("operator assistance needed: {}", message);
        eprintln!(
            "\n>>> {}\n>>> Create '{}' when done.\n",
            message,
            self.signal_path.display()
        );
    }

    fn wait_for_acknowledgement(&mut self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            if self.signal_path.exists() {
                let _ = std::fs::remove_file(&self.signal_path);
                info!("operator acknowledged");
                return true;
            }
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            std::thread::sleep(self.poll_interval.min(deadline - now));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn existing_signal_is_consumed() {
        let dir = tempfile::tempdir().unwrap();
        let signal = dir.path().join("done");
        std::fs::write(&signal, "").unwrap();

        let mut operator = SignalFileOperator::new(&signal);
        assert!(operator.wait_for_acknowledgement(Duration::from_millis(50)));
        assert!(!signal.exists());

        // each request needs a fresh signal
        assert!(!operator.wait_for_acknowledgement(Duration::ZERO));
    }
}
