//! SurrealDB repository implementations.

mod idea;
mod resource;

pub use idea::SurrealIdeaRepository;
pub use resource::SurrealResourceRepository;
