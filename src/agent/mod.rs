// file: src/agent/mod.rs
// description: conversational agent module exports
// reference: internal module structure

pub mod assistant;
pub mod prompt;
pub mod tools;

pub use assistant::Agent;
pub use prompt::{FAREWELL, build_system_prompt, greeting};
