use clap::Parser;
use tracing_subscriber::EnvFilter;
use ui_explorer::cli::commands::{cmd_diff, cmd_route, cmd_summary};
use ui_explorer::cli::config::{Cli, Commands, load_settings};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    let settings = load_settings(cli.config.as_deref());

    match cli.command {
        Commands::Diff { before, after } => cmd_diff(&before, &after, &settings.verifier)?,
        Commands::Route { graph, from, to } => cmd_route(&graph, &from, &to)?,
        Commands::Summary { graph, elements } => cmd_summary(&graph, elements)?,
    }

    Ok(())
}

/// RUST_LOG wins; otherwise -v raises the default level.
fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
