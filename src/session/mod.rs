pub mod detector;
pub mod operation;
pub mod session;
