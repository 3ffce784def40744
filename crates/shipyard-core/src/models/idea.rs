//! Idea domain model.
//!
//! An idea is a tracked project owned by a single user. Its `status` is
//! derived from the roadmap steps, and its metrics block is maintained
//! by the tracker rather than written by callers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::step::Step;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
pub enum IdeaStatus {
    #[default]
    #[serde(rename = "Not Started")]
    NotStarted,
    #[serde(rename = "In Progress")]
    InProgress,
    Completed,
}

impl IdeaStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            IdeaStatus::NotStarted => "Not Started",
            IdeaStatus::InProgress => "In Progress",
            IdeaStatus::Completed => "Completed",
        }
    }

    /// Status implied by the roadmap: `Completed` when every step is
    /// done, `In Progress` when some are, `Not Started` otherwise (also
    /// for an empty roadmap).
    pub fn from_steps(steps: &[Step]) -> Self {
        let done = steps.iter().filter(|s| s.is_completed).count();
        match done {
            0 => IdeaStatus::NotStarted,
            n if n == steps.len() => IdeaStatus::Completed,
            _ => IdeaStatus::InProgress,
        }
    }
}

/// Resolve an idea's status. A shipped idea (one with a production URL)
/// stays `Completed` regardless of its steps.
pub fn derive_status(steps: &[Step], shipped: bool) -> IdeaStatus {
    if shipped {
        IdeaStatus::Completed
    } else {
        IdeaStatus::from_steps(steps)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ProjectType {
    Personal,
    Client,
}

impl ProjectType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectType::Personal => "personal",
            ProjectType::Client => "client",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum ProjectCategory {
    #[serde(rename = "Web App")]
    WebApp,
    #[serde(rename = "Mobile App")]
    MobileApp,
    #[serde(rename = "Chrome Extension")]
    ChromeExtension,
    #[serde(rename = "API")]
    Api,
    #[serde(rename = "CLI Tool")]
    CliTool,
    Library,
    Other,
}

impl ProjectCategory {
    pub const ALL: [ProjectCategory; 7] = [
        ProjectCategory::WebApp,
        ProjectCategory::MobileApp,
        ProjectCategory::ChromeExtension,
        ProjectCategory::Api,
        ProjectCategory::CliTool,
        ProjectCategory::Library,
        ProjectCategory::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectCategory::WebApp => "Web App",
            ProjectCategory::MobileApp => "Mobile App",
            ProjectCategory::ChromeExtension => "Chrome Extension",
            ProjectCategory::Api => "API",
            ProjectCategory::CliTool => "CLI Tool",
            ProjectCategory::Library => "Library",
            ProjectCategory::Other => "Other",
        }
    }
}

/// Public telemetry and completion bookkeeping for an idea.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IdeaMetrics {
    pub views: u64,
    pub clicks: u64,
    pub last_updated: DateTime<Utc>,
    /// Set once, when the idea first reaches `Completed`.
    pub completed_at: Option<DateTime<Utc>>,
    /// Whole days between creation and `completed_at`.
    pub time_to_complete: Option<u32>,
}

impl IdeaMetrics {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            views: 0,
            clicks: 0,
            last_updated: now,
            completed_at: None,
            time_to_complete: None,
        }
    }
}

/// Completion stamp written on the first transition into `Completed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Completion {
    pub completed_at: DateTime<Utc>,
    pub time_to_complete: u32,
}

impl Completion {
    pub fn at(created_at: DateTime<Utc>, now: DateTime<Utc>) -> Self {
        let secs = (now - created_at).num_seconds().max(0) as f64;
        Self {
            completed_at: now,
            time_to_complete: (secs / 86_400.0).round() as u32,
        }
    }
}

/// Public builder details shown next to shipped projects.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct BuilderProfile {
    pub twitter: Option<String>,
    pub github: Option<String>,
    pub website: Option<String>,
    pub bio: Option<String>,
    #[serde(default)]
    pub skills: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Idea {
    pub id: Uuid,
    /// Owner; immutable after creation.
    pub user_id: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub status: IdeaStatus,
    pub steps: Vec<Step>,
    pub is_public: bool,
    pub project_type: Option<ProjectType>,
    pub production_url: Option<String>,
    pub description: Option<String>,
    pub category: Option<ProjectCategory>,
    pub tags: Vec<String>,
    pub metrics: IdeaMetrics,
    pub builder_profile: Option<BuilderProfile>,
}

impl Idea {
    /// Percentage of completed steps, rounded; 0 without steps.
    pub fn progress(&self) -> u8 {
        if self.steps.is_empty() {
            return 0;
        }
        let done = self.steps.iter().filter(|s| s.is_completed).count();
        ((done as f64 / self.steps.len() as f64) * 100.0).round() as u8
    }

    pub fn step(&self, step_id: &str) -> Option<&Step> {
        self.steps.iter().find(|s| s.id == step_id)
    }

    pub fn is_shipped(&self) -> bool {
        self.production_url.is_some()
    }

    /// Progress write needed to bring status and completion metrics in
    /// line with `steps`. Completion is only produced on the first
    /// transition into `Completed`.
    pub fn progress_for(&self, steps: &[Step], now: DateTime<Utc>) -> ProgressUpdate {
        let status = derive_status(steps, self.is_shipped());
        let completion = (status == IdeaStatus::Completed && self.metrics.completed_at.is_none())
            .then(|| Completion::at(self.created_at, now));
        ProgressUpdate { status, completion }
    }
}

/// Caller-supplied fields for a new idea.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct NewIdea {
    pub name: String,
    pub description: Option<String>,
    pub category: Option<ProjectCategory>,
    pub project_type: Option<ProjectType>,
    #[serde(default)]
    pub is_public: bool,
    #[serde(default)]
    pub tags: Vec<String>,
    pub builder_profile: Option<BuilderProfile>,
}

/// Fully resolved record handed to the store on creation.
#[derive(Debug, Clone)]
pub struct CreateIdea {
    pub user_id: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub steps: Vec<Step>,
    pub is_public: bool,
    pub project_type: Option<ProjectType>,
    pub description: Option<String>,
    pub category: Option<ProjectCategory>,
    pub tags: Vec<String>,
    pub builder_profile: Option<BuilderProfile>,
}

impl CreateIdea {
    pub fn from_new(user_id: String, input: NewIdea, steps: Vec<Step>, now: DateTime<Utc>) -> Self {
        Self {
            user_id,
            name: input.name,
            created_at: now,
            steps,
            is_public: input.is_public,
            project_type: input.project_type,
            description: input.description,
            category: input.category,
            tags: input.tags,
            builder_profile: input.builder_profile,
        }
    }
}

/// Partial update; `None` leaves a field untouched.
///
/// For optional fields `Some(Some(v))` sets, `Some(None)` clears.
/// Ownership, creation time, status and metrics are not writable here.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdateIdea {
    pub name: Option<String>,
    pub description: Option<Option<String>>,
    pub category: Option<Option<ProjectCategory>>,
    pub project_type: Option<Option<ProjectType>>,
    pub tags: Option<Vec<String>>,
    pub is_public: Option<bool>,
    pub production_url: Option<Option<String>>,
    pub builder_profile: Option<Option<BuilderProfile>>,
    /// Whole-roadmap replacement; status is re-derived afterwards.
    pub steps: Option<Vec<Step>>,
}

impl UpdateIdea {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.category.is_none()
            && self.project_type.is_none()
            && self.tags.is_none()
            && self.is_public.is_none()
            && self.production_url.is_none()
            && self.builder_profile.is_none()
            && self.steps.is_none()
    }
}

/// Status write, optionally carrying the one-time completion stamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressUpdate {
    pub status: IdeaStatus,
    pub completion: Option<Completion>,
}

/// Public counters that can be bumped without an owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricCounter {
    Views,
    Clicks,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::step::default_steps;

    fn idea_with(steps: Vec<Step>) -> Idea {
        let now = Utc::now();
        Idea {
            id: Uuid::new_v4(),
            user_id: "alice".into(),
            name: "Tracker".into(),
            created_at: now,
            status: IdeaStatus::NotStarted,
            steps,
            is_public: false,
            project_type: None,
            production_url: None,
            description: None,
            category: None,
            tags: Vec::new(),
            metrics: IdeaMetrics::new(now),
            builder_profile: None,
        }
    }

    #[test]
    fn status_follows_steps() {
        let mut steps = default_steps();
        assert_eq!(IdeaStatus::from_steps(&steps), IdeaStatus::NotStarted);

        steps[0].is_completed = true;
        assert_eq!(IdeaStatus::from_steps(&steps), IdeaStatus::InProgress);

        steps.iter_mut().for_each(|s| s.is_completed = true);
        assert_eq!(IdeaStatus::from_steps(&steps), IdeaStatus::Completed);

        assert_eq!(IdeaStatus::from_steps(&[]), IdeaStatus::NotStarted);
    }

    #[test]
    fn shipped_idea_stays_completed() {
        assert_eq!(derive_status(&default_steps(), true), IdeaStatus::Completed);
    }

    #[test]
    fn completion_rounds_to_days() {
        let created = Utc::now();
        let done = created + chrono::Duration::hours(36);
        let completion = Completion::at(created, done);
        assert_eq!(completion.time_to_complete, 2);
        assert_eq!(completion.completed_at, done);
    }

    #[test]
    fn progress_for_stamps_completion_once() {
        let mut steps = default_steps();
        steps.iter_mut().for_each(|s| s.is_completed = true);
        let mut idea = idea_with(default_steps());
        let now = Utc::now();

        let first = idea.progress_for(&steps, now);
        assert_eq!(first.status, IdeaStatus::Completed);
        assert!(first.completion.is_some());

        idea.metrics.completed_at = Some(now);
        let again = idea.progress_for(&steps, now + chrono::Duration::days(3));
        assert_eq!(again.status, IdeaStatus::Completed);
        assert!(again.completion.is_none());
    }

    #[test]
    fn progress_percentage() {
        let mut idea = idea_with(default_steps());
        assert_eq!(idea.progress(), 0);
        idea.steps[0].is_completed = true;
        idea.steps[1].is_completed = true;
        idea.steps[2].is_completed = true;
        assert_eq!(idea.progress(), 33);
        idea.steps.clear();
        assert_eq!(idea.progress(), 0);
    }

    #[test]
    fn status_serializes_as_display_string() {
        let json = serde_json::to_string(&IdeaStatus::InProgress).unwrap();
        assert_eq!(json, "\"In Progress\"");
        let category: ProjectCategory = serde_json::from_str("\"CLI Tool\"").unwrap();
        assert_eq!(category, ProjectCategory::CliTool);
    }
}
