//! Shipyard API, the operation set the UI calls into.
//!
//! Idea, step and resource management behind an ownership guard, plus
//! public telemetry and leaderboard aggregation.
//!
//! [`TrackerService`] is generic over the `shipyard-core` repository
//! traits and an [`IdentityProvider`], so this crate has no dependency
//! on the database crate.

pub mod config;
pub mod error;
pub mod guard;
pub mod identity;
pub mod leaderboard;
pub mod service;

pub use config::{SessionConfig, TrackerConfig};
pub use error::{ApiError, ApiResult, ErrorCode};
pub use identity::{IdentityProvider, StaticIdentity, TokenIdentity};
pub use service::TrackerService;
