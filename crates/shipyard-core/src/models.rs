//! Domain models for Shipyard.
//!
//! These are the core types shared across all crates.

pub mod builder;
pub mod idea;
pub mod resource;
pub mod step;
