use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, TryRecvError};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use rdev::{Button, EventType};
use tracing::{debug, error, info};

use crate::error::{ExplorerError, Result};
use crate::graph::geometry::Point;

/// Global (OS-level) recorder of left-click positions in screen coordinates.
pub trait ClickRecorder {
    fn start(&mut self) -> Result<()>;

    /// Stop recording and hand back every click seen since `start`.
    fn stop(&mut self) -> Vec<Point>;
}

/// Scoped recording: the recorder is stopped exactly once, either through
/// [`RecordingSession::finish`] or when the session is dropped.
pub struct RecordingSession<'r> {
    recorder: &'r mut dyn ClickRecorder,
    active: bool,
}

impl<'r> RecordingSession<'r> {
    pub fn begin(recorder: &'r mut dyn ClickRecorder) -> Result<Self> {
        recorder.start()?;
        Ok(Self {
            recorder,
            active: true,
        })
    }

    pub fn finish(mut self) -> Vec<Point> {
        self.active = false;
        self.recorder.stop()
    }
}

impl Drop for RecordingSession<'_> {
    fn drop(&mut self) {
        if self.active {
            self.active = false;
            let _ = self.recorder.stop();
        }
    }
}

// ============================================================================
// rdev-backed recorder
// ============================================================================

/// How long `start` waits for the hook to report a failed install.
const HOOK_INSTALL_WAIT: Duration = Duration::from_millis(200);

/// Recorder backed by an `rdev` low-level input hook.
///
/// `rdev::listen` cannot be unhooked once installed, so the listener thread
/// is spawned on the first `start` and then lives for the rest of the
/// process, outliving the human-assist call that started it. It is gated:
/// while stopped, its callback discards every event and the buffer is never
/// written. A hook that fails to install, or dies later, is reported by the
/// next `start` as [`ExplorerError::HookInstall`].
pub struct RdevClickRecorder {
    recording: Arc<AtomicBool>,
    clicks: Arc<Mutex<Vec<Point>>>,
    hook_errors: Option<Receiver<String>>,
}

impl RdevClickRecorder {
    pub fn new() -> Self {
        Self {
            recording: Arc::new(AtomicBool::new(false)),
            clicks: Arc::new(Mutex::new(Vec::new())),
            hook_errors: None,
        }
    }

    fn spawn_listener(&mut self) -> Result<()> {
        let recording = Arc::clone(&self.recording);
        let clicks = Arc::clone(&self.clicks);
        let (tx, rx) = mpsc::channel();

        std::thread::Builder::new()
            .name("click-recorder".into())
            .spawn(move || {
                let mut last_position = Point::new(0, 0);
                let result = rdev::listen(move |event: rdev::Event| {
                    match event.event_type {
                        EventType::MouseMove { x, y } => {
                            last_position = Point::new(x as i32, y as i32);
                        }
                        EventType::ButtonPress(Button::Left) => {
                            if !recording.load(Ordering::SeqCst) {
                                return;
                            }
                            if let Ok(mut buffer) = clicks.lock() {
                                buffer.push(last_position);
                            }
                        }
                        _ => {}
                    }
                });
                if let Err(e) = result {
                    error!("click recorder hook failed: {:?}", e);
                    let _ = tx.send(format!("{:?}", e));
                }
            })
            .map_err(|e| ExplorerError::HookInstall(e.to_string()))?;

        await_hook(&rx, HOOK_INSTALL_WAIT)?;
        self.hook_errors = Some(rx);
        Ok(())
    }
}

/// Wait up to `timeout` for the listener to report an install failure.
/// Silence means the hook is up.
pub fn await_hook(errors: &Receiver<String>, timeout: Duration) -> Result<()> {
    match errors.recv_timeout(timeout) {
        Ok(reason) => Err(ExplorerError::HookInstall(reason)),
        Err(RecvTimeoutError::Timeout) => Ok(()),
        Err(RecvTimeoutError::Disconnected) => Err(ExplorerError::HookInstall("listener exited".into())),
    }
}

/// Whether a hook that installed earlier is still alive.
pub fn hook_alive(errors: &Receiver<String>) -> Result<()> {
    match errors.try_recv() {
        Ok(reason) => Err(ExplorerError::HookInstall(reason)),
        Err(TryRecvError::Empty) => Ok(()),
        Err(TryRecvError::Disconnected) => Err(ExplorerError::HookInstall("listener exited".into())),
    }
}

impl Default for RdevClickRecorder {
    fn default() -> Self {
        Self::new()
    }
}

impl ClickRecorder for RdevClickRecorder {
    fn start(&mut self) -> Result<()> {
        if let Ok(mut buffer) = self.clicks.lock() {
            buffer.clear();
        }
        match self.hook_errors.as_ref().map(hook_alive) {
            Some(Ok(())) => {}
            Some(Err(e)) => {
                self.hook_errors = None;
                return Err(e);
            }
            None => self.spawn_listener()?,
        }
        self.recording.store(true, Ordering::SeqCst);
        info!("global click recording started");
        Ok(())
    }

    fn stop(&mut self) -> Vec<Point> {
        self.recording.store(false, Ordering::SeqCst);
        let clicks = match self.clicks.lock() {
            Ok(mut buffer) => std::mem::take(&mut *buffer),
            Err(e) => {
                error!("click buffer lock poisoned: {}", e);
                Vec::new()
            }
        };
        debug!(count = clicks.len(), "global click recording stopped");
        clicks
    }
}
