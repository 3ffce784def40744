//! Repository trait definitions for data access abstraction.
//!
//! All repository operations are async. Repositories do not check
//! ownership; the API layer guards every mutation before calling in.

use uuid::Uuid;

use crate::error::TrackerResult;
use crate::models::{
    idea::{
        Completion, CreateIdea, Idea, IdeaStatus, MetricCounter, ProgressUpdate, ProjectCategory,
        UpdateIdea,
    },
    resource::{CreateResource, Resource, UpdateResource},
    step::Step,
};

/// Sort order for idea queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IdeaOrder {
    /// Oldest first.
    #[default]
    CreatedAsc,
    /// Most recently updated first.
    LastUpdatedDesc,
    /// Most viewed first, ties broken by most recently updated.
    ViewsDesc,
}

/// Conjunctive filter over the idea collection.
#[derive(Debug, Clone, Default)]
pub struct IdeaQuery {
    pub user_id: Option<String>,
    pub is_public: Option<bool>,
    pub status: Option<IdeaStatus>,
    pub category: Option<ProjectCategory>,
    /// `Some(true)` keeps only ideas with a production URL.
    pub has_production_url: Option<bool>,
    pub order: IdeaOrder,
    pub limit: Option<u64>,
}

impl IdeaQuery {
    /// Every idea owned by `user_id`.
    pub fn owned_by(user_id: impl Into<String>) -> Self {
        Self {
            user_id: Some(user_id.into()),
            ..Default::default()
        }
    }

    /// Public, completed ideas: the leaderboard population.
    pub fn showcase() -> Self {
        Self {
            is_public: Some(true),
            status: Some(IdeaStatus::Completed),
            ..Default::default()
        }
    }

    pub fn ordered(mut self, order: IdeaOrder) -> Self {
        self.order = order;
        self
    }

    pub fn limited(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// Conjunctive filter over the resource collection.
#[derive(Debug, Clone, Default)]
pub struct ResourceQuery {
    pub idea_id: Option<Uuid>,
    pub step_id: Option<String>,
    pub user_id: Option<String>,
}

pub trait IdeaRepository: Send + Sync {
    fn create(&self, input: CreateIdea) -> impl Future<Output = TrackerResult<Idea>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = TrackerResult<Idea>> + Send;
    fn query(&self, query: IdeaQuery) -> impl Future<Output = TrackerResult<Vec<Idea>>> + Send;
    /// Partial merge; also bumps `metrics.last_updated`.
    fn update(
        &self,
        id: Uuid,
        input: UpdateIdea,
    ) -> impl Future<Output = TrackerResult<Idea>> + Send;
    fn delete(&self, id: Uuid) -> impl Future<Output = TrackerResult<()>> + Send;

    /// Append a step to the end of the roadmap.
    ///
    /// Status is re-derived from the stored roadmap in the same write.
    /// `completion` is stored only if this write completes the idea and
    /// no stamp is present yet.
    fn append_step(
        &self,
        id: Uuid,
        step: Step,
        completion: Completion,
    ) -> impl Future<Output = TrackerResult<Idea>> + Send;

    /// Overwrite the single step at `index`, provided it still carries
    /// `step.id`. Other steps are not rewritten. Status and completion
    /// follow the same rules as [`append_step`](Self::append_step).
    fn replace_step(
        &self,
        id: Uuid,
        index: usize,
        step: Step,
        completion: Completion,
    ) -> impl Future<Output = TrackerResult<Idea>> + Send;

    /// Write the derived status. A completion stamp is only stored when
    /// none is present yet.
    fn set_progress(
        &self,
        id: Uuid,
        progress: ProgressUpdate,
    ) -> impl Future<Output = TrackerResult<Idea>> + Send;

    /// Atomically add one to a public counter and bump `last_updated`.
    fn increment(
        &self,
        id: Uuid,
        counter: MetricCounter,
    ) -> impl Future<Output = TrackerResult<Idea>> + Send;
}

pub trait ResourceRepository: Send + Sync {
    fn create(&self, input: CreateResource) -> impl Future<Output = TrackerResult<Resource>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = TrackerResult<Resource>> + Send;
    /// Matching resources, oldest first.
    fn query(
        &self,
        query: ResourceQuery,
    ) -> impl Future<Output = TrackerResult<Vec<Resource>>> + Send;
    fn update(
        &self,
        id: Uuid,
        input: UpdateResource,
    ) -> impl Future<Output = TrackerResult<Resource>> + Send;
    fn delete(&self, id: Uuid) -> impl Future<Output = TrackerResult<()>> + Send;
}
