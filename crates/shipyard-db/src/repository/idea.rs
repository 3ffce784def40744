//! SurrealDB implementation of [`IdeaRepository`].
//!
//! Rows are parsed into typed models on the way out: absent metrics,
//! steps, visibility and status fall back to their defaults, while
//! unknown enum strings or malformed ids are reported as
//! [`DbError::InvalidRecord`] instead of being passed through.

use chrono::{DateTime, Utc};
use shipyard_core::error::TrackerResult;
use shipyard_core::models::idea::{
    BuilderProfile, Completion, CreateIdea, Idea, IdeaMetrics, IdeaStatus, MetricCounter,
    ProgressUpdate, ProjectCategory, ProjectType, UpdateIdea,
};
use shipyard_core::models::step::Step;
use shipyard_core::repository::{IdeaOrder, IdeaQuery, IdeaRepository};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tracing::debug;
use uuid::Uuid;

use crate::error::DbError;
use crate::retry::retry_on_conflict;

#[derive(Debug, Clone, SurrealValue)]
struct StepRow {
    id: String,
    name: String,
    description: String,
    is_completed: bool,
    completed_at: Option<DateTime<Utc>>,
}

impl From<Step> for StepRow {
    fn from(step: Step) -> Self {
        Self {
            id: step.id,
            name: step.name,
            description: step.description,
            is_completed: step.is_completed,
            completed_at: step.completed_at,
        }
    }
}

impl From<StepRow> for Step {
    fn from(row: StepRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            description: row.description,
            is_completed: row.is_completed,
            completed_at: row.completed_at,
        }
    }
}

#[derive(Debug, SurrealValue)]
struct MetricsRow {
    views: Option<u64>,
    clicks: Option<u64>,
    last_updated: Option<DateTime<Utc>>,
    completed_at: Option<DateTime<Utc>>,
    time_to_complete: Option<u32>,
}

impl MetricsRow {
    fn into_metrics(self, now: DateTime<Utc>) -> IdeaMetrics {
        IdeaMetrics {
            views: self.views.unwrap_or(0),
            clicks: self.clicks.unwrap_or(0),
            last_updated: self.last_updated.unwrap_or(now),
            completed_at: self.completed_at,
            time_to_complete: self.time_to_complete,
        }
    }
}

#[derive(Debug, Clone, SurrealValue)]
struct BuilderProfileRow {
    twitter: Option<String>,
    github: Option<String>,
    website: Option<String>,
    bio: Option<String>,
    skills: Option<Vec<String>>,
}

impl From<BuilderProfile> for BuilderProfileRow {
    fn from(profile: BuilderProfile) -> Self {
        Self {
            twitter: profile.twitter,
            github: profile.github,
            website: profile.website,
            bio: profile.bio,
            skills: Some(profile.skills),
        }
    }
}

impl From<BuilderProfileRow> for BuilderProfile {
    fn from(row: BuilderProfileRow) -> Self {
        Self {
            twitter: row.twitter,
            github: row.github,
            website: row.website,
            bio: row.bio,
            skills: row.skills.unwrap_or_default(),
        }
    }
}

/// DB-side row struct for queries where the UUID is already known.
#[derive(Debug, SurrealValue)]
struct IdeaRow {
    user_id: String,
    name: String,
    created_at: Option<DateTime<Utc>>,
    status: Option<String>,
    steps: Option<Vec<StepRow>>,
    is_public: Option<bool>,
    project_type: Option<String>,
    production_url: Option<String>,
    description: Option<String>,
    category: Option<String>,
    tags: Option<Vec<String>>,
    metrics: Option<MetricsRow>,
    builder_profile: Option<BuilderProfileRow>,
}

/// DB-side row struct that includes the record ID via `record::id(id)`.
#[derive(Debug, SurrealValue)]
struct IdeaRowWithId {
    record_id: String,
    user_id: String,
    name: String,
    created_at: Option<DateTime<Utc>>,
    status: Option<String>,
    steps: Option<Vec<StepRow>>,
    is_public: Option<bool>,
    project_type: Option<String>,
    production_url: Option<String>,
    description: Option<String>,
    category: Option<String>,
    tags: Option<Vec<String>>,
    metrics: Option<MetricsRow>,
    builder_profile: Option<BuilderProfileRow>,
}

fn parse_status(s: &str) -> Result<IdeaStatus, DbError> {
    match s {
        "Not Started" => Ok(IdeaStatus::NotStarted),
        "In Progress" => Ok(IdeaStatus::InProgress),
        "Completed" => Ok(IdeaStatus::Completed),
        other => Err(DbError::InvalidRecord(format!("unknown idea status: {other}"))),
    }
}

fn parse_category(s: &str) -> Result<ProjectCategory, DbError> {
    ProjectCategory::ALL
        .into_iter()
        .find(|c| c.as_str() == s)
        .ok_or_else(|| DbError::InvalidRecord(format!("unknown project category: {s}")))
}

fn parse_project_type(s: &str) -> Result<ProjectType, DbError> {
    match s {
        "personal" => Ok(ProjectType::Personal),
        "client" => Ok(ProjectType::Client),
        other => Err(DbError::InvalidRecord(format!("unknown project type: {other}"))),
    }
}

impl IdeaRow {
    fn into_idea(self, id: Uuid) -> Result<Idea, DbError> {
        let now = Utc::now();
        Ok(Idea {
            id,
            user_id: self.user_id,
            name: self.name,
            created_at: self.created_at.unwrap_or(now),
            status: self
                .status
                .as_deref()
                .map(parse_status)
                .transpose()?
                .unwrap_or_default(),
            steps: self
                .steps
                .unwrap_or_default()
                .into_iter()
                .map(Step::from)
                .collect(),
            is_public: self.is_public.unwrap_or(false),
            project_type: self
                .project_type
                .as_deref()
                .map(parse_project_type)
                .transpose()?,
            production_url: self.production_url,
            description: self.description,
            category: self.category.as_deref().map(parse_category).transpose()?,
            tags: self.tags.unwrap_or_default(),
            metrics: self
                .metrics
                .map(|m| m.into_metrics(now))
                .unwrap_or_else(|| IdeaMetrics::new(now)),
            builder_profile: self.builder_profile.map(BuilderProfile::from),
        })
    }
}

impl IdeaRowWithId {
    fn try_into_idea(self) -> Result<Idea, DbError> {
        let id = Uuid::parse_str(&self.record_id)
            .map_err(|e| DbError::InvalidRecord(format!("invalid idea UUID: {e}")))?;
        IdeaRow {
            user_id: self.user_id,
            name: self.name,
            created_at: self.created_at,
            status: self.status,
            steps: self.steps,
            is_public: self.is_public,
            project_type: self.project_type,
            production_url: self.production_url,
            description: self.description,
            category: self.category,
            tags: self.tags,
            metrics: self.metrics,
            builder_profile: self.builder_profile,
        }
        .into_idea(id)
    }
}

fn first_idea(rows: Vec<IdeaRow>, id: Uuid) -> Result<Idea, DbError> {
    let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
        entity: "idea".into(),
        id: id.to_string(),
    })?;
    row.into_idea(id)
}

fn order_clause(order: IdeaOrder) -> &'static str {
    match order {
        IdeaOrder::CreatedAsc => "ORDER BY created_at ASC",
        IdeaOrder::LastUpdatedDesc => "ORDER BY metrics.last_updated DESC",
        IdeaOrder::ViewsDesc => "ORDER BY metrics.views DESC, metrics.last_updated DESC",
    }
}

/// Re-derive `status` from the roadmap as it stands after a step write
/// and stamp completion the first time the idea reaches it. A shipped
/// idea stays completed. SET assignments apply in order, so these read
/// the patched `steps` and the new `status`.
const DERIVE_PROGRESS: &str = "\
    status = (IF production_url != NONE \
        OR (array::len(steps) > 0 AND array::all(steps[*].is_completed)) { 'Completed' } \
        ELSE IF array::any(steps[*].is_completed) { 'In Progress' } \
        ELSE { 'Not Started' }), \
    metrics.completed_at = (IF status = 'Completed' \
        { metrics.completed_at ?? $completed_at } \
        ELSE { metrics.completed_at }), \
    metrics.time_to_complete = (IF status = 'Completed' \
        { metrics.time_to_complete ?? $time_to_complete } \
        ELSE { metrics.time_to_complete })";

fn counter_field(counter: MetricCounter) -> &'static str {
    match counter {
        MetricCounter::Views => "metrics.views",
        MetricCounter::Clicks => "metrics.clicks",
    }
}

/// SurrealDB implementation of the Idea repository.
#[derive(Clone)]
pub struct SurrealIdeaRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealIdeaRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> IdeaRepository for SurrealIdeaRepository<C> {
    async fn create(&self, input: CreateIdea) -> TrackerResult<Idea> {
        let id = Uuid::new_v4();
        let steps: Vec<StepRow> = input.steps.into_iter().map(StepRow::from).collect();

        let result = self
            .db
            .query(
                "CREATE type::record('idea', $id) SET \
                 user_id = $user_id, name = $name, \
                 created_at = $created_at, \
                 status = 'Not Started', \
                 steps = $steps, \
                 is_public = $is_public, \
                 project_type = $project_type, \
                 production_url = NONE, \
                 description = $description, \
                 category = $category, \
                 tags = $tags, \
                 metrics = { views: 0, clicks: 0, last_updated: $created_at }, \
                 builder_profile = $builder_profile",
            )
            .bind(("id", id.to_string()))
            .bind(("user_id", input.user_id))
            .bind(("name", input.name))
            .bind(("created_at", input.created_at))
            .bind(("steps", steps))
            .bind(("is_public", input.is_public))
            .bind((
                "project_type",
                input.project_type.map(|t| t.as_str().to_string()),
            ))
            .bind(("description", input.description))
            .bind(("category", input.category.map(|c| c.as_str().to_string())))
            .bind(("tags", input.tags))
            .bind((
                "builder_profile",
                input.builder_profile.map(BuilderProfileRow::from),
            ))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;

        let rows: Vec<IdeaRow> = result.take(0).map_err(DbError::from)?;
        Ok(first_idea(rows, id)?)
    }

    async fn get_by_id(&self, id: Uuid) -> TrackerResult<Idea> {
        let mut result = self
            .db
            .query("SELECT * FROM type::record('idea', $id)")
            .bind(("id", id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<IdeaRow> = result.take(0).map_err(DbError::from)?;
        Ok(first_idea(rows, id)?)
    }

    async fn query(&self, query: IdeaQuery) -> TrackerResult<Vec<Idea>> {
        let mut conditions = Vec::new();
        if query.user_id.is_some() {
            conditions.push("user_id = $user_id");
        }
        if query.is_public.is_some() {
            conditions.push("is_public = $is_public");
        }
        if query.status.is_some() {
            conditions.push("status = $status");
        }
        if query.category.is_some() {
            conditions.push("category = $category");
        }
        match query.has_production_url {
            Some(true) => conditions.push("production_url != NONE"),
            Some(false) => conditions.push("production_url = NONE"),
            None => {}
        }

        let mut sql = String::from("SELECT record::id(id) AS record_id, * FROM idea");
        if !conditions.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&conditions.join(" AND "));
        }
        sql.push(' ');
        sql.push_str(order_clause(query.order));
        if query.limit.is_some() {
            sql.push_str(" LIMIT $limit");
        }
        debug!(%sql, "Querying ideas");

        let mut builder = self.db.query(sql);
        if let Some(user_id) = query.user_id {
            builder = builder.bind(("user_id", user_id));
        }
        if let Some(is_public) = query.is_public {
            builder = builder.bind(("is_public", is_public));
        }
        if let Some(status) = query.status {
            builder = builder.bind(("status", status.as_str().to_string()));
        }
        if let Some(category) = query.category {
            builder = builder.bind(("category", category.as_str().to_string()));
        }
        if let Some(limit) = query.limit {
            builder = builder.bind(("limit", limit));
        }

        let mut result = builder.await.map_err(DbError::from)?;
        let rows: Vec<IdeaRowWithId> = result.take(0).map_err(DbError::from)?;

        rows.into_iter()
            .map(|row| row.try_into_idea())
            .collect::<Result<Vec<_>, DbError>>()
            .map_err(Into::into)
    }

    async fn update(&self, id: Uuid, input: UpdateIdea) -> TrackerResult<Idea> {
        let mut sets = Vec::new();
        if input.name.is_some() {
            sets.push("name = $name");
        }
        if input.description.is_some() {
            sets.push("description = $description");
        }
        if input.category.is_some() {
            sets.push("category = $category");
        }
        if input.project_type.is_some() {
            sets.push("project_type = $project_type");
        }
        if input.tags.is_some() {
            sets.push("tags = $tags");
        }
        if input.is_public.is_some() {
            sets.push("is_public = $is_public");
        }
        if input.production_url.is_some() {
            sets.push("production_url = $production_url");
        }
        if input.builder_profile.is_some() {
            sets.push("builder_profile = $builder_profile");
        }
        if input.steps.is_some() {
            sets.push("steps = $steps");
        }
        sets.push("metrics.last_updated = time::now()");

        let query = format!(
            "UPDATE type::record('idea', $id) SET {}",
            sets.join(", ")
        );
        let query = query.as_str();
        let db = &self.db;

        let rows = retry_on_conflict("idea.update", move || {
            let input = input.clone();
            async move {
                let mut builder = db.query(query).bind(("id", id.to_string()));

                if let Some(name) = input.name {
                    builder = builder.bind(("name", name));
                }
                if let Some(description) = input.description {
                    builder = builder.bind(("description", description));
                }
                if let Some(category) = input.category {
                    builder =
                        builder.bind(("category", category.map(|c| c.as_str().to_string())));
                }
                if let Some(project_type) = input.project_type {
                    builder = builder.bind((
                        "project_type",
                        project_type.map(|t| t.as_str().to_string()),
                    ));
                }
                if let Some(tags) = input.tags {
                    builder = builder.bind(("tags", tags));
                }
                if let Some(is_public) = input.is_public {
                    builder = builder.bind(("is_public", is_public));
                }
                if let Some(production_url) = input.production_url {
                    builder = builder.bind(("production_url", production_url));
                }
                if let Some(profile) = input.builder_profile {
                    builder =
                        builder.bind(("builder_profile", profile.map(BuilderProfileRow::from)));
                }
                if let Some(steps) = input.steps {
                    let steps: Vec<StepRow> = steps.into_iter().map(StepRow::from).collect();
                    builder = builder.bind(("steps", steps));
                }

                let response = builder.await.map_err(DbError::from_query)?;
                let mut response = response.check().map_err(DbError::from_query)?;
                let rows: Vec<IdeaRow> = response.take(0).map_err(DbError::from)?;
                Ok::<_, DbError>(rows)
            }
        })
        .await?;

        Ok(first_idea(rows, id)?)
    }

    async fn delete(&self, id: Uuid) -> TrackerResult<()> {
        self.db
            .query("DELETE type::record('idea', $id)")
            .bind(("id", id.to_string()))
            .await
            .map_err(DbError::from)?;

        Ok(())
    }

    async fn append_step(
        &self,
        id: Uuid,
        step: Step,
        completion: Completion,
    ) -> TrackerResult<Idea> {
        let query = format!(
            "UPDATE type::record('idea', $id) SET \
             steps = array::append(steps, $step), \
             {DERIVE_PROGRESS}, \
             metrics.last_updated = time::now()"
        );
        let query = query.as_str();
        let db = &self.db;
        let step = StepRow::from(step);

        let rows = retry_on_conflict("idea.append_step", move || {
            let step = step.clone();
            async move {
                let response = db
                    .query(query)
                    .bind(("id", id.to_string()))
                    .bind(("step", step))
                    .bind(("completed_at", completion.completed_at))
                    .bind(("time_to_complete", completion.time_to_complete))
                    .await
                    .map_err(DbError::from_query)?;
                let mut response = response.check().map_err(DbError::from_query)?;
                let rows: Vec<IdeaRow> = response.take(0).map_err(DbError::from)?;
                Ok::<_, DbError>(rows)
            }
        })
        .await?;

        Ok(first_idea(rows, id)?)
    }

    async fn replace_step(
        &self,
        id: Uuid,
        index: usize,
        step: Step,
        completion: Completion,
    ) -> TrackerResult<Idea> {
        let step_id = step.id.clone();

        // Only the addressed element is written; the WHERE clause makes
        // the patch a no-op if the step at `index` is not `step_id`.
        let query = format!(
            "UPDATE type::record('idea', $id) SET \
             steps[{index}] = $step, \
             {DERIVE_PROGRESS}, \
             metrics.last_updated = time::now() \
             WHERE steps[{index}].id = $step_id"
        );
        let query = query.as_str();
        let db = &self.db;
        let step = StepRow::from(step);
        let guard_id = step_id.as_str();

        let rows = retry_on_conflict("idea.replace_step", move || {
            let step = step.clone();
            async move {
                let response = db
                    .query(query)
                    .bind(("id", id.to_string()))
                    .bind(("step", step))
                    .bind(("step_id", guard_id.to_string()))
                    .bind(("completed_at", completion.completed_at))
                    .bind(("time_to_complete", completion.time_to_complete))
                    .await
                    .map_err(DbError::from_query)?;
                let mut response = response.check().map_err(DbError::from_query)?;
                let rows: Vec<IdeaRow> = response.take(0).map_err(DbError::from)?;
                Ok::<_, DbError>(rows)
            }
        })
        .await?;

        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "step".into(),
            id: format!("{id}/{step_id}"),
        })?;

        Ok(row.into_idea(id)?)
    }

    async fn set_progress(&self, id: Uuid, progress: ProgressUpdate) -> TrackerResult<Idea> {
        let mut sets = vec!["status = $status", "metrics.last_updated = time::now()"];
        if progress.completion.is_some() {
            // Never overwrite an existing stamp.
            sets.push("metrics.completed_at = metrics.completed_at ?? $completed_at");
            sets.push("metrics.time_to_complete = metrics.time_to_complete ?? $time_to_complete");
        }

        let query = format!(
            "UPDATE type::record('idea', $id) SET {}",
            sets.join(", ")
        );
        let query = query.as_str();
        let db = &self.db;

        let rows = retry_on_conflict("idea.set_progress", move || async move {
            let mut builder = db
                .query(query)
                .bind(("id", id.to_string()))
                .bind(("status", progress.status.as_str().to_string()));

            if let Some(completion) = progress.completion {
                builder = builder
                    .bind(("completed_at", completion.completed_at))
                    .bind(("time_to_complete", completion.time_to_complete));
            }

            let response = builder.await.map_err(DbError::from_query)?;
            let mut response = response.check().map_err(DbError::from_query)?;
            let rows: Vec<IdeaRow> = response.take(0).map_err(DbError::from)?;
            Ok::<_, DbError>(rows)
        })
        .await?;

        Ok(first_idea(rows, id)?)
    }

    async fn increment(&self, id: Uuid, counter: MetricCounter) -> TrackerResult<Idea> {
        let query = format!(
            "UPDATE type::record('idea', $id) SET \
             {} += 1, \
             metrics.last_updated = time::now()",
            counter_field(counter)
        );
        let query = query.as_str();
        let db = &self.db;

        let rows = retry_on_conflict("idea.increment", move || async move {
            let response = db
                .query(query)
                .bind(("id", id.to_string()))
                .await
                .map_err(DbError::from_query)?;
            let mut response = response.check().map_err(DbError::from_query)?;
            let rows: Vec<IdeaRow> = response.take(0).map_err(DbError::from)?;
            Ok::<_, DbError>(rows)
        })
        .await?;

        Ok(first_idea(rows, id)?)
    }
}
