//! Mapping configuration

pub mod null_handling;
pub mod placeholders;

pub use null_handling::*;
pub use placeholders::*;
