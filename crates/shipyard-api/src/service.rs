//! Tracker service: the operations the UI calls.
//!
//! Every mutation resolves the caller through the injected
//! [`IdentityProvider`], loads the target record and runs it through the
//! ownership guard before anything is written. A missing record is
//! reported as not found before the guard runs.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use shipyard_core::error::{TrackerError, TrackerResult};
use shipyard_core::models::idea::{
    BuilderProfile, Completion, CreateIdea, Idea, IdeaMetrics, IdeaStatus, MetricCounter,
    NewIdea, ProjectCategory, UpdateIdea,
};
use shipyard_core::models::resource::{CreateResource, NewResource, Resource, UpdateResource};
use shipyard_core::models::step::{Step, default_steps};
use shipyard_core::repository::{
    IdeaOrder, IdeaQuery, IdeaRepository, ResourceQuery, ResourceRepository,
};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::config::TrackerConfig;
use crate::error::ApiResult;
use crate::guard::{ensure_owner, ensure_resource_owner};
use crate::identity::{IdentityProvider, resolve_user};

/// Idea, step and resource management.
///
/// Generic over repository implementations so that the API layer
/// has no dependency on the database crate.
pub struct TrackerService<I: IdeaRepository, R: ResourceRepository, P: IdentityProvider> {
    pub(crate) ideas: I,
    pub(crate) resources: R,
    pub(crate) identity: P,
    pub(crate) config: TrackerConfig,
}

fn require_text(value: &str, message: &str) -> TrackerResult<()> {
    if value.trim().is_empty() {
        Err(TrackerError::validation(message))
    } else {
        Ok(())
    }
}

fn validate_production_url(url: &str) -> TrackerResult<()> {
    let rest = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"));
    match rest {
        Some(host) if !host.trim().is_empty() => Ok(()),
        _ => Err(TrackerError::validation(
            "Production URL must start with http:// or https://",
        )),
    }
}

fn validate_step(step: &Step) -> TrackerResult<()> {
    require_text(&step.id, "Step id is required")?;
    require_text(&step.name, "Step name is required")
}

impl<I: IdeaRepository, R: ResourceRepository, P: IdentityProvider> TrackerService<I, R, P> {
    pub fn new(ideas: I, resources: R, identity: P, config: TrackerConfig) -> Self {
        Self {
            ideas,
            resources,
            identity,
            config,
        }
    }

    fn current_user(&self) -> TrackerResult<String> {
        resolve_user(&self.identity)
    }

    async fn owned_idea(&self, id: Uuid, actor: &str) -> TrackerResult<Idea> {
        let idea = self.ideas.get_by_id(id).await?;
        ensure_owner(idea, actor)
    }

    /// Re-derive status from the stored steps and write it back when it
    /// changed or when the idea completes for the first time.
    async fn sync_progress(&self, idea: Idea, now: DateTime<Utc>) -> TrackerResult<Idea> {
        let progress = idea.progress_for(&idea.steps, now);
        if progress.status == idea.status && progress.completion.is_none() {
            return Ok(idea);
        }
        self.ideas.set_progress(idea.id, progress).await
    }

    // -----------------------------------------------------------------
    // Ideas
    // -----------------------------------------------------------------

    /// Create an idea for the caller with the default roadmap.
    #[instrument(skip_all, err(level = "warn"))]
    pub async fn add_idea(&self, input: NewIdea) -> ApiResult<Idea> {
        let user_id = self.current_user()?;
        require_text(&input.name, "Project name is required")?;

        let create = CreateIdea::from_new(user_id, input, default_steps(), Utc::now());
        let idea = self.ideas.create(create).await?;

        info!(idea_id = %idea.id, user_id = %idea.user_id, "Idea created");
        Ok(idea)
    }

    /// All of the caller's ideas, oldest first.
    #[instrument(skip_all, err(level = "warn"))]
    pub async fn get_ideas(&self) -> ApiResult<Vec<Idea>> {
        let user_id = self.current_user()?;
        Ok(self.ideas.query(IdeaQuery::owned_by(user_id)).await?)
    }

    #[instrument(skip_all, err(level = "warn"))]
    pub async fn get_ideas_by_status(&self, status: IdeaStatus) -> ApiResult<Vec<Idea>> {
        let user_id = self.current_user()?;
        let query = IdeaQuery {
            status: Some(status),
            ..IdeaQuery::owned_by(user_id)
        };
        Ok(self.ideas.query(query).await?)
    }

    #[instrument(skip_all, err(level = "warn"))]
    pub async fn get_idea(&self, idea_id: Uuid) -> ApiResult<Idea> {
        let user_id = self.current_user()?;
        Ok(self.owned_idea(idea_id, &user_id).await?)
    }

    /// Partial update of an owned idea.
    ///
    /// Supplied steps replace the roadmap and have their completion
    /// timestamps normalized. Status is re-derived whenever the steps or
    /// the production URL change.
    #[instrument(skip_all, err(level = "warn"))]
    pub async fn update_idea(&self, idea_id: Uuid, mut input: UpdateIdea) -> ApiResult<Idea> {
        let user_id = self.current_user()?;
        if let Some(name) = &input.name {
            require_text(name, "Project name is required")?;
        }
        if let Some(Some(url)) = &input.production_url {
            validate_production_url(url)?;
        }
        if let Some(steps) = &input.steps {
            steps.iter().try_for_each(validate_step)?;
        }

        let idea = self.owned_idea(idea_id, &user_id).await?;
        if input.is_empty() {
            return Ok(idea);
        }

        let now = Utc::now();
        let resync = input.steps.is_some() || input.production_url.is_some();
        input.steps = input
            .steps
            .map(|steps| steps.into_iter().map(|s| s.normalized(now)).collect());

        let mut updated = self.ideas.update(idea.id, input).await?;
        if resync {
            updated = self.sync_progress(updated, now).await?;
        }

        info!(idea_id = %updated.id, status = updated.status.as_str(), "Idea updated");
        Ok(updated)
    }

    /// Hard delete. Resources attached to the idea are left in place.
    #[instrument(skip_all, err(level = "warn"))]
    pub async fn delete_idea(&self, idea_id: Uuid) -> ApiResult<()> {
        let user_id = self.current_user()?;
        let idea = self.owned_idea(idea_id, &user_id).await?;
        self.ideas.delete(idea.id).await?;

        info!(idea_id = %idea.id, "Idea deleted");
        Ok(())
    }

    // -----------------------------------------------------------------
    // Steps
    // -----------------------------------------------------------------

    #[instrument(skip_all, err(level = "warn"))]
    pub async fn add_step(&self, idea_id: Uuid, step: Step) -> ApiResult<Idea> {
        Ok(self.upsert_step(idea_id, step).await?)
    }

    #[instrument(skip_all, err(level = "warn"))]
    pub async fn update_step(&self, idea_id: Uuid, step: Step) -> ApiResult<Idea> {
        Ok(self.upsert_step(idea_id, step).await?)
    }

    /// Replace the step with the same id, or append it when the roadmap
    /// has none. Only that one step is written, and status is derived
    /// from the stored roadmap in the same write so concurrent saves
    /// cannot leave it stale.
    async fn upsert_step(&self, idea_id: Uuid, step: Step) -> TrackerResult<Idea> {
        validate_step(&step)?;
        let user_id = self.current_user()?;
        let idea = self.owned_idea(idea_id, &user_id).await?;
        let now = Utc::now();
        let completion = Completion::at(idea.created_at, now);

        let position = idea.steps.iter().position(|s| s.id == step.id);
        let updated = match position {
            Some(index) => {
                let previous = &idea.steps[index];
                let step = if step.is_completed && step.completed_at.is_none() {
                    Step {
                        completed_at: previous.completed_at,
                        ..step
                    }
                } else {
                    step
                };
                self.ideas
                    .replace_step(idea.id, index, step.normalized(now), completion)
                    .await?
            }
            None => {
                self.ideas
                    .append_step(idea.id, step.normalized(now), completion)
                    .await?
            }
        };

        info!(
            idea_id = %updated.id,
            progress = updated.progress(),
            status = updated.status.as_str(),
            "Step saved"
        );
        Ok(updated)
    }

    // -----------------------------------------------------------------
    // Resources
    // -----------------------------------------------------------------

    /// Attach a resource to a step of an owned idea.
    #[instrument(skip_all, err(level = "warn"))]
    pub async fn add_resource(
        &self,
        idea_id: Uuid,
        step_id: &str,
        input: NewResource,
    ) -> ApiResult<Resource> {
        let user_id = self.current_user()?;
        require_text(&input.title, "Resource title is required")?;
        require_text(&input.url, "Resource URL is required")?;

        let idea = self.owned_idea(idea_id, &user_id).await?;
        if idea.step(step_id).is_none() {
            return Err(
                TrackerError::validation(format!("Step {step_id} does not exist on this project"))
                    .into(),
            );
        }

        let resource = self
            .resources
            .create(CreateResource {
                idea_id: idea.id,
                step_id: step_id.to_string(),
                user_id,
                title: input.title,
                url: input.url,
                resource_type: input.resource_type,
                notes: input.notes,
            })
            .await?;

        info!(resource_id = %resource.id, idea_id = %idea.id, step_id, "Resource added");
        Ok(resource)
    }

    /// The caller's resources on one step, oldest first.
    #[instrument(skip_all, err(level = "warn"))]
    pub async fn get_step_resources(
        &self,
        idea_id: Uuid,
        step_id: &str,
    ) -> ApiResult<Vec<Resource>> {
        let user_id = self.current_user()?;
        let query = ResourceQuery {
            idea_id: Some(idea_id),
            step_id: Some(step_id.to_string()),
            user_id: Some(user_id),
        };
        Ok(self.resources.query(query).await?)
    }

    /// The caller's resources on an idea, grouped by step id.
    #[instrument(skip_all, err(level = "warn"))]
    pub async fn get_idea_resources(
        &self,
        idea_id: Uuid,
    ) -> ApiResult<BTreeMap<String, Vec<Resource>>> {
        let user_id = self.current_user()?;
        let query = ResourceQuery {
            idea_id: Some(idea_id),
            user_id: Some(user_id),
            ..Default::default()
        };
        let resources = self.resources.query(query).await?;

        let mut grouped: BTreeMap<String, Vec<Resource>> = BTreeMap::new();
        for resource in resources {
            grouped
                .entry(resource.step_id.clone())
                .or_default()
                .push(resource);
        }
        Ok(grouped)
    }

    #[instrument(skip_all, err(level = "warn"))]
    pub async fn update_resource(
        &self,
        idea_id: Uuid,
        resource_id: Uuid,
        input: UpdateResource,
    ) -> ApiResult<Resource> {
        let user_id = self.current_user()?;
        if let Some(title) = &input.title {
            require_text(title, "Resource title is required")?;
        }
        if let Some(url) = &input.url {
            require_text(url, "Resource URL is required")?;
        }

        let resource = self.resources.get_by_id(resource_id).await?;
        let resource = ensure_resource_owner(resource, &user_id, idea_id)?;
        let updated = self.resources.update(resource.id, input).await?;

        info!(resource_id = %updated.id, "Resource updated");
        Ok(updated)
    }

    #[instrument(skip_all, err(level = "warn"))]
    pub async fn delete_resource(&self, idea_id: Uuid, resource_id: Uuid) -> ApiResult<()> {
        let user_id = self.current_user()?;
        let resource = self.resources.get_by_id(resource_id).await?;
        let resource = ensure_resource_owner(resource, &user_id, idea_id)?;
        self.resources.delete(resource.id).await?;

        info!(resource_id = %resource.id, "Resource deleted");
        Ok(())
    }

    // -----------------------------------------------------------------
    // Showcase
    // -----------------------------------------------------------------

    #[instrument(skip_all, err(level = "warn"))]
    pub async fn update_project_visibility(
        &self,
        idea_id: Uuid,
        is_public: bool,
    ) -> ApiResult<Idea> {
        let user_id = self.current_user()?;
        let idea = self.owned_idea(idea_id, &user_id).await?;
        let update = UpdateIdea {
            is_public: Some(is_public),
            ..Default::default()
        };
        let updated = self.ideas.update(idea.id, update).await?;

        info!(idea_id = %updated.id, is_public, "Visibility changed");
        Ok(updated)
    }

    /// Mark an owned idea as shipped. A shipped idea is `Completed`
    /// whatever its steps say.
    #[instrument(skip_all, err(level = "warn"))]
    pub async fn update_production_url(&self, idea_id: Uuid, url: String) -> ApiResult<Idea> {
        let user_id = self.current_user()?;
        validate_production_url(&url)?;

        let idea = self.owned_idea(idea_id, &user_id).await?;
        let now = Utc::now();
        let update = UpdateIdea {
            production_url: Some(Some(url)),
            ..Default::default()
        };
        let updated = self.ideas.update(idea.id, update).await?;
        let updated = self.sync_progress(updated, now).await?;

        info!(idea_id = %updated.id, "Project shipped");
        Ok(updated)
    }

    #[instrument(skip_all, err(level = "warn"))]
    pub async fn update_builder_profile(
        &self,
        idea_id: Uuid,
        profile: BuilderProfile,
    ) -> ApiResult<Idea> {
        let user_id = self.current_user()?;
        let idea = self.owned_idea(idea_id, &user_id).await?;
        let update = UpdateIdea {
            builder_profile: Some(Some(profile)),
            ..Default::default()
        };
        let updated = self.ideas.update(idea.id, update).await?;

        info!(idea_id = %updated.id, "Builder profile updated");
        Ok(updated)
    }

    /// Count a view of a public project. No session required.
    #[instrument(skip_all, err(level = "warn"))]
    pub async fn track_project_view(&self, idea_id: Uuid) -> ApiResult<IdeaMetrics> {
        let idea = self.ideas.increment(idea_id, MetricCounter::Views).await?;
        Ok(idea.metrics)
    }

    /// Count a click through to a project's production URL.
    #[instrument(skip_all, err(level = "warn"))]
    pub async fn track_project_click(&self, idea_id: Uuid) -> ApiResult<IdeaMetrics> {
        let idea = self.ideas.increment(idea_id, MetricCounter::Clicks).await?;
        Ok(idea.metrics)
    }

    /// Public completed projects, most recently updated first.
    #[instrument(skip_all, err(level = "warn"))]
    pub async fn get_public_projects(
        &self,
        limit: Option<u64>,
        category: Option<ProjectCategory>,
    ) -> ApiResult<Vec<Idea>> {
        let query = IdeaQuery {
            category,
            ..IdeaQuery::showcase()
        }
        .ordered(IdeaOrder::LastUpdatedDesc)
        .limited(limit.unwrap_or(self.config.default_project_limit));
        Ok(self.ideas.query(query).await?)
    }

    /// Shipped public projects in one category, most viewed first.
    #[instrument(skip_all, err(level = "warn"))]
    pub async fn get_projects_by_category(
        &self,
        category: ProjectCategory,
        limit: Option<u64>,
    ) -> ApiResult<Vec<Idea>> {
        let query = IdeaQuery {
            category: Some(category),
            has_production_url: Some(true),
            ..IdeaQuery::showcase()
        }
        .ordered(IdeaOrder::ViewsDesc)
        .limited(limit.unwrap_or(self.config.default_project_limit));
        Ok(self.ideas.query(query).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn production_url_needs_http_scheme() {
        assert!(validate_production_url("https://shipyard.dev").is_ok());
        assert!(validate_production_url("http://localhost:3000").is_ok());
        assert!(validate_production_url("ftp://shipyard.dev").is_err());
        assert!(validate_production_url("shipyard.dev").is_err());
        assert!(validate_production_url("https://").is_err());
    }

    #[test]
    fn blank_text_is_rejected() {
        assert!(require_text("  ", "required").is_err());
        assert!(require_text("Tracker", "required").is_ok());
    }

    #[test]
    fn steps_need_id_and_name() {
        assert!(validate_step(&Step::new("launch", "Launch", "")).is_ok());
        assert!(validate_step(&Step::new("", "Launch", "")).is_err());
        assert!(validate_step(&Step::new("launch", " ", "")).is_err());
    }
}
