//! Resource domain model.
//!
//! Resources are links attached to one step of one idea. They reference
//! their idea by id only; removing an idea does not remove them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ResourceType {
    Inspiration,
    Tutorial,
    Tool,
    Documentation,
    #[default]
    Other,
}

impl ResourceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceType::Inspiration => "inspiration",
            ResourceType::Tutorial => "tutorial",
            ResourceType::Tool => "tool",
            ResourceType::Documentation => "documentation",
            ResourceType::Other => "other",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Resource {
    pub id: Uuid,
    pub idea_id: Uuid,
    pub step_id: String,
    pub user_id: String,
    pub title: String,
    pub url: String,
    pub added_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    pub resource_type: ResourceType,
    pub notes: Option<String>,
}

/// Caller-supplied fields for a new resource.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct NewResource {
    pub title: String,
    pub url: String,
    #[serde(default)]
    pub resource_type: ResourceType,
    pub notes: Option<String>,
}

/// Fully resolved record handed to the store on creation.
#[derive(Debug, Clone)]
pub struct CreateResource {
    pub idea_id: Uuid,
    pub step_id: String,
    pub user_id: String,
    pub title: String,
    pub url: String,
    pub resource_type: ResourceType,
    pub notes: Option<String>,
}

/// Partial update. Owner, idea, step and `added_at` are fixed.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdateResource {
    pub title: Option<String>,
    pub url: Option<String>,
    pub resource_type: Option<ResourceType>,
    /// `Some(Some(val))` = set, `Some(None)` = clear, `None` = no change.
    pub notes: Option<Option<String>>,
}
