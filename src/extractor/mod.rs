// file: src/extractor/mod.rs
// description: entity extraction module exports
// reference: internal module structure

pub mod entity;
pub mod patterns;

pub use entity::EntityProcessor;
