use thiserror::Error;

/// Typed navigation failures. Every variant carries the last state the
/// controller knows it reached, so callers never have to guess where the
/// application was left.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum NavigationError {
    #[error("no path from '{from}' to '{to}'")]
    NoPathFound { from: String, to: String },

    #[error("hop via element '{trigger_element_id}' failed after reaching '{reached}': {reason}")]
    HopFailed {
        reached: String,
        trigger_element_id: String,
        reason: String,
    },

    #[error("all backtrack strategies exhausted returning from '{last_state}' to '{target}'")]
    BacktrackExhausted { last_state: String, target: String },
}

impl NavigationError {
    /// State the application was last confirmed to be in.
    pub fn last_state(&self) -> &str {
        match self {
            NavigationError::NoPathFound { from, .. } => from,
            NavigationError::HopFailed { reached, .. } => reached,
            NavigationError::BacktrackExhausted { last_state, .. } => last_state,
        }
    }
}

#[derive(Error, Debug)]
pub enum ExplorerError {
    /// Missing or empty target element/state; rejected before any side effect.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("unknown state '{0}'")]
    UnknownState(String),

    #[error("unknown element '{element_id}' in state '{state_id}'")]
    UnknownElement { state_id: String, element_id: String },

    #[error("element '{element_id}' cannot move from {from} to {to}")]
    InvalidStatusTransition {
        element_id: String,
        from: String,
        to: String,
    },

    #[error(transparent)]
    Navigation(#[from] NavigationError),

    /// A window, pointer or capture collaborator reported a failure.
    #[error("platform error: {0}")]
    Platform(String),

    #[error("failed to install input hook: {0}")]
    HookInstall(String),

    /// The application could not be brought back after a failed recovery.
    #[error("unrecoverable: {0}")]
    Unrecoverable(String),

    #[error("I/O error ({context}): {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error ({context}): {source}")]
    Json {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("image error ({context}): {source}")]
    Image {
        context: String,
        #[source]
        source: image::ImageError,
    },
}

pub type Result<T, E = ExplorerError> = std::result::Result<T, E>;
