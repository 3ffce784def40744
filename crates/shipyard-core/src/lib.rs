//! Shipyard Core: domain models, repository traits and the shared
//! error type.
//!
//! Nothing in this crate talks to a store; the `shipyard-db` crate
//! implements [`repository`] against SurrealDB and `shipyard-api`
//! builds the public operation set on top of the traits.

pub mod error;
pub mod models;
pub mod repository;
