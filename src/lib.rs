//! Control plane for automated exploration of desktop application UIs.
//!
//! Clicks are verified purely from pixels ([`visual`]), discovered screens
//! are recorded in a [`graph::state_graph::StateGraph`], and the
//! [`navigation`] controller moves between them, forward along recorded
//! edges or back through a cascade of recovery strategies. The
//! [`session::session::ExplorationSession`] ties these together into a
//! worklist over pending elements.

pub mod cli;
pub mod click;
pub mod error;
pub mod graph;
pub mod navigation;
pub mod platform;
pub mod session;
pub mod trace;
pub mod visual;
