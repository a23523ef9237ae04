//! Shared foundation: errors, configuration, common enums and the transport
//! kernel every higher-level client builds on.

pub mod config;
pub mod errors;
pub mod kernel;
pub mod types;
