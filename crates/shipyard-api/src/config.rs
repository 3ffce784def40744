//! Tracker and session configuration.

/// Configuration for [`crate::TrackerService`].
#[derive(Debug, Clone)]
pub struct TrackerConfig {
    /// Page size for public project listings when the caller gives none
    /// (default: 20).
    pub default_project_limit: u64,
    /// Leaderboard length when the caller gives none (default: 10).
    pub default_builder_limit: u64,
    /// Display name for builders without a twitter handle.
    pub anonymous_builder_name: String,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            default_project_limit: 20,
            default_builder_limit: 10,
            anonymous_builder_name: "Anonymous Builder".into(),
        }
    }
}

/// Configuration for session tokens issued by the auth provider.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// PEM-encoded Ed25519 private key for signing session tokens.
    pub jwt_private_key_pem: String,
    /// PEM-encoded Ed25519 public key for verifying session tokens.
    pub jwt_public_key_pem: String,
    /// Session token lifetime in seconds (default: 3600 = 1 hour).
    pub session_lifetime_secs: u64,
    /// JWT issuer (`iss` claim).
    pub jwt_issuer: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            jwt_private_key_pem: String::new(),
            jwt_public_key_pem: String::new(),
            session_lifetime_secs: 3600,
            jwt_issuer: "shipyard".into(),
        }
    }
}
