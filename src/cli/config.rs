use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::click::executor::ClickConfig;
use crate::navigation::controller::NavigationConfig;
use crate::session::session::SessionConfig;
use crate::visual::verifier::VerifierConfig;

// ============================================================================
// CLI Argument Parsing (clap derive)
// ============================================================================

#[derive(Parser, Debug)]
#[command(
    name = "ui-explorer",
    version,
    about = "Inspect frames and state graphs recorded by UI exploration"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to config file (default: ui-explorer.yaml in current dir)
    #[arg(long, global = true)]
    pub config: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Compare two PNG frames: hashes, changed region and similarity
    Diff {
        /// Frame captured before the action
        #[arg(long)]
        before: String,

        /// Frame captured after the action
        #[arg(long)]
        after: String,
    },

    /// Print the shortest recorded path between two states
    Route {
        /// Saved state graph (JSON)
        #[arg(long)]
        graph: String,

        #[arg(long, default_value = "root")]
        from: String,

        #[arg(long)]
        to: String,
    },

    /// Summarize a saved state graph
    Summary {
        /// Saved state graph (JSON)
        #[arg(long)]
        graph: String,

        /// Also list every element with its status
        #[arg(long, default_value_t = false)]
        elements: bool,
    },
}

// ============================================================================
// Config File Model (optional YAML)
// ============================================================================

/// Optional YAML config file: `ui-explorer.yaml`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExplorerSettings {
    #[serde(default)]
    pub verifier: VerifierConfig,
    #[serde(default)]
    pub click: ClickConfig,
    #[serde(default)]
    pub navigation: NavigationConfig,
    #[serde(default)]
    pub session: SessionConfig,
}

// ============================================================================
// Config File Loading
// ============================================================================

/// Load settings from a YAML file. Returns defaults if the file is missing
/// or malformed.
pub fn load_settings(path: Option<&str>) -> ExplorerSettings {
    let config_path = path.unwrap_or("ui-explorer.yaml");
    match std::fs::read_to_string(config_path) {
        Ok(content) => parse_settings(&content).unwrap_or_else(|e| {
            warn!("ignoring malformed config '{}': {}", config_path, e);
            ExplorerSettings::default()
        }),
        Err(_) => ExplorerSettings::default(),
    }
}

pub fn parse_settings(yaml: &str) -> Result<ExplorerSettings, serde_yaml::Error> {
    serde_yaml::from_str(yaml)
}
