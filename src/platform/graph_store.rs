use std::path::PathBuf;

use crate::error::{ExplorerError, Result};
use crate::graph::state_graph::StateGraph;

/// Save hook invoked after every change to element status or exit
/// strategies. It must round-trip the in-memory graph.
pub trait GraphStore {
    fn save(&mut self, graph: &StateGraph) -> Result<()>;
}

impl<F> GraphStore for F
where
    F: FnMut(&StateGraph) -> Result<()>,
{
    fn save(&mut self, graph: &StateGraph) -> Result<()> {
        self(graph)
    }
}

/// Pretty-printed JSON file.
pub struct JsonGraphStore {
    path: PathBuf,
}

impl JsonGraphStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn load(&self) -> Result<StateGraph> {
        load_graph(&self.path.display().to_string())
    }
}

impl GraphStore for JsonGraphStore {
    fn save(&mut self, graph: &StateGraph) -> Result<()> {
        let json = serde_json::to_string_pretty(graph).map_err(|e| ExplorerError::Json {
            context: "serializing state graph".into(),
            source: e,
        })?;
        std::fs::write(&self.path, json).map_err(|e| ExplorerError::Io {
            context: format!("writing {}", self.path.display()),
            source: e,
        })
    }
}

/// Read a graph previously written by [`JsonGraphStore`].
pub fn load_graph(path: &str) -> Result<StateGraph> {
    let content = std::fs::read_to_string(path).map_err(|e| ExplorerError::Io {
        context: format!("reading {}", path),
        source: e,
    })?;
    serde_json::from_str(&content).map_err(|e| ExplorerError::Json {
        context: format!("parsing {}", path),
        source: e,
    })
}
