//! Builder leaderboard statistics. Derived on demand, never stored.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::idea::ProjectCategory;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BuilderStats {
    pub user_id: String,
    pub builder_name: String,
    pub completed_projects: u64,
    pub total_views: u64,
    pub total_clicks: u64,
    /// Distinct categories shipped, in first-seen order.
    pub project_categories: Vec<ProjectCategory>,
    /// Latest `metrics.last_updated` across shipped projects; Unix epoch
    /// when there are none.
    pub last_shipped: DateTime<Utc>,
    pub average_time_to_complete: Option<f64>,
    /// 1-based leaderboard position; only set on ranked listings.
    pub rank: Option<u32>,
}
