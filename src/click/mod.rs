pub mod candidates;
pub mod executor;
