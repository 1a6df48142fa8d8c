//! Narrative report generation: prompt assembly from a peer analysis and a
//! client for an external text-generation service.

pub mod client;
pub mod prompt;

pub use client::{LlmClient, LlmConfig};
pub use prompt::build_prompt;
