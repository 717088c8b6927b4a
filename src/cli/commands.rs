use crate::error::{ExplorerError, NavigationError};
use crate::graph::state_graph::{ElementStatus, StateGraph};
use crate::platform::frame_store::load_frame;
use crate::platform::graph_store::load_graph;
use crate::visual::verifier::{VerifierConfig, VisualVerifier};

// ============================================================================
// diff subcommand
// ============================================================================

pub fn cmd_diff(
    before: &str,
    after: &str,
    config: &VerifierConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let verifier = VisualVerifier::new(config.clone());
    let before_frame = load_frame(before)?;
    let after_frame = load_frame(after)?;

    let before_hash = verifier.hash(&before_frame);
    let after_hash = verifier.hash(&after_frame);
    println!("before: {} ({}x{})", before_hash, before_frame.width(), before_frame.height());
    println!("after:  {} ({}x{})", after_hash, after_frame.width(), after_frame.height());

    if before_hash == after_hash {
        println!("hashes equal: no change");
    }

    match verifier.extract_changed_region(&before_frame, &after_frame) {
        Ok(region) => println!(
            "changed region: x={} y={} {}x{}",
            region.x, region.y, region.width, region.height
        ),
        Err(_) => println!("changed region: none above noise floor"),
    }

    let similarity = verifier.similarity_percentage(&before_frame, &after_frame);
    println!(
        "similarity: {:.2}% ({})",
        similarity,
        if similarity >= config.same_state_similarity { "same state" } else { "different state" }
    );
    Ok(())
}

// ============================================================================
// route subcommand
// ============================================================================

pub fn cmd_route(graph_path: &str, from: &str, to: &str) -> Result<(), Box<dyn std::error::Error>> {
    let graph = load_graph(graph_path)?;
    for line in describe_route(&graph, from, to)? {
        println!("{}", line);
    }
    Ok(())
}

/// One line per hop: `from --[action]--> to`.
pub fn describe_route(graph: &StateGraph, from: &str, to: &str) -> Result<Vec<String>, ExplorerError> {
    graph.state(from)?;
    graph.state(to)?;
    let path = graph.shortest_path(from, to).ok_or_else(|| NavigationError::NoPathFound {
        from: from.to_string(),
        to: to.to_string(),
    })?;

    if path.len() == 1 {
        return Ok(vec![format!("already at '{}'", from)]);
    }
    let lines = path
        .windows(2)
        .filter_map(|hop| graph.edge_between(&hop[0], &hop[1]))
        .map(|edge| format!("{} --[{}]--> {}", edge.from_state_id, edge.action_label, edge.to_state_id))
        .collect();
    Ok(lines)
}

// ============================================================================
// summary subcommand
// ============================================================================

pub fn cmd_summary(graph_path: &str, list_elements: bool) -> Result<(), Box<dyn std::error::Error>> {
    let graph = load_graph(graph_path)?;
    print!("{}", format_summary(&graph, list_elements));
    Ok(())
}

pub fn format_summary(graph: &StateGraph, list_elements: bool) -> String {
    let counts = graph.status_counts();
    let count = |status: ElementStatus| counts.get(&status).copied().unwrap_or(0);

    let mut out = format!(
        "{} states, {} edges\nelements: {} pending, {} explored, {} non-interactive\n",
        graph.state_count(),
        graph.edges.len(),
        count(ElementStatus::Pending),
        count(ElementStatus::Explored),
        count(ElementStatus::NonInteractive),
    );

    for state in graph.states_in_order() {
        let parent = state.parent_state_id.as_deref().unwrap_or("-");
        out.push_str(&format!(
            "  {} (parent {}, {} elements, {} learned exits)\n",
            state.id,
            parent,
            state.elements.len(),
            state.exit_strategies.len()
        ));
        if !list_elements {
            continue;
        }
        for element in state.elements.values() {
            let note = element
                .annotation
                .as_deref()
                .map(|a| format!(" [{}]", a))
                .unwrap_or_default();
            out.push_str(&format!("    {} '{}' {}{}\n", element.id, element.name, element.status, note));
        }
    }
    out
}
