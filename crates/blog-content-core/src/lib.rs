pub mod config;
pub mod error;
pub mod fetch;
pub mod llm;
pub mod model;
pub mod orchestrator;
pub mod prompts;
pub mod quality;
pub mod runner;

pub use error::*;

/// Crate version, for diagnostics and UI "about" panels.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
