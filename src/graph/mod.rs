pub mod chain;
pub mod exit_strategy;
pub mod geometry;
pub mod state_graph;
