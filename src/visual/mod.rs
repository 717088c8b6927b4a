pub mod frame;
pub mod mask;
pub mod verifier;
