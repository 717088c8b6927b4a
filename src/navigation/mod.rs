pub mod context;
pub mod controller;
pub mod learning;
pub mod safe_area;
pub mod strategies;
