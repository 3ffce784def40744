//! Builder statistics and the top-builders leaderboard.
//!
//! Aggregation is a pure fold over public completed ideas; the service
//! methods at the bottom only decide which ideas to scan.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use shipyard_core::models::builder::BuilderStats;
use shipyard_core::models::idea::{Idea, ProjectCategory};
use shipyard_core::repository::{IdeaOrder, IdeaQuery, IdeaRepository, ResourceRepository};
use tracing::{debug, instrument};

use crate::error::ApiResult;
use crate::identity::IdentityProvider;
use crate::service::TrackerService;

/// Accumulates one builder's shipped projects.
#[derive(Debug, Clone)]
pub struct BuilderStatsBuilder {
    user_id: String,
    builder_name: Option<String>,
    completed_projects: u64,
    total_views: u64,
    total_clicks: u64,
    categories: Vec<ProjectCategory>,
    last_shipped: Option<DateTime<Utc>>,
    completion_days: Vec<u32>,
}

impl BuilderStatsBuilder {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            builder_name: None,
            completed_projects: 0,
            total_views: 0,
            total_clicks: 0,
            categories: Vec::new(),
            last_shipped: None,
            completion_days: Vec::new(),
        }
    }

    pub fn add(&mut self, idea: &Idea) {
        // The name comes from the first project only.
        if self.completed_projects == 0 {
            self.builder_name = idea
                .builder_profile
                .as_ref()
                .and_then(|p| p.twitter.clone())
                .filter(|handle| !handle.trim().is_empty());
        }

        self.completed_projects += 1;
        self.total_views += idea.metrics.views;
        self.total_clicks += idea.metrics.clicks;

        if let Some(category) = idea.category {
            if !self.categories.contains(&category) {
                self.categories.push(category);
            }
        }

        let updated = idea.metrics.last_updated;
        self.last_shipped = Some(self.last_shipped.map_or(updated, |prev| prev.max(updated)));

        if let Some(days) = idea.metrics.time_to_complete {
            self.completion_days.push(days);
        }
    }

    pub fn build(self, anonymous_name: &str) -> BuilderStats {
        let average_time_to_complete = (!self.completion_days.is_empty()).then(|| {
            let total: u64 = self.completion_days.iter().map(|&d| u64::from(d)).sum();
            total as f64 / self.completion_days.len() as f64
        });

        BuilderStats {
            user_id: self.user_id,
            builder_name: self
                .builder_name
                .unwrap_or_else(|| anonymous_name.to_string()),
            completed_projects: self.completed_projects,
            total_views: self.total_views,
            total_clicks: self.total_clicks,
            project_categories: self.categories,
            last_shipped: self.last_shipped.unwrap_or(DateTime::<Utc>::UNIX_EPOCH),
            average_time_to_complete,
            rank: None,
        }
    }
}

/// Fold `user_id`'s ideas, in the order given, into their stats.
pub fn builder_stats(user_id: &str, ideas: &[Idea], anonymous_name: &str) -> BuilderStats {
    let mut builder = BuilderStatsBuilder::new(user_id);
    ideas
        .iter()
        .filter(|idea| idea.user_id == user_id)
        .for_each(|idea| builder.add(idea));
    builder.build(anonymous_name)
}

/// Group ideas by owner, order builders by total views (ties keep
/// first-seen order), keep the first `limit` and number them from 1.
pub fn rank_builders(ideas: &[Idea], limit: usize, anonymous_name: &str) -> Vec<BuilderStats> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut builders: Vec<BuilderStatsBuilder> = Vec::new();

    for idea in ideas {
        let slot = *index.entry(idea.user_id.as_str()).or_insert_with(|| {
            builders.push(BuilderStatsBuilder::new(idea.user_id.as_str()));
            builders.len() - 1
        });
        builders[slot].add(idea);
    }

    let mut stats: Vec<BuilderStats> = builders
        .into_iter()
        .map(|b| b.build(anonymous_name))
        .collect();
    stats.sort_by(|a, b| b.total_views.cmp(&a.total_views));
    stats.truncate(limit);

    for (position, entry) in stats.iter_mut().enumerate() {
        entry.rank = Some(position as u32 + 1);
    }
    stats
}

impl<I: IdeaRepository, R: ResourceRepository, P: IdentityProvider> TrackerService<I, R, P> {
    /// Public statistics for one builder. No session required.
    #[instrument(skip_all, err(level = "warn"))]
    pub async fn get_builder_stats(&self, user_id: &str) -> ApiResult<BuilderStats> {
        let query = IdeaQuery {
            user_id: Some(user_id.to_string()),
            ..IdeaQuery::showcase()
        }
        .ordered(IdeaOrder::CreatedAsc);
        let ideas = self.ideas.query(query).await?;

        Ok(builder_stats(
            user_id,
            &ideas,
            &self.config.anonymous_builder_name,
        ))
    }

    /// Builders ranked by the total views of their shipped projects.
    #[instrument(skip_all, err(level = "warn"))]
    pub async fn get_top_builders(&self, limit: Option<u64>) -> ApiResult<Vec<BuilderStats>> {
        let limit = limit.unwrap_or(self.config.default_builder_limit);
        let ideas = self
            .ideas
            .query(IdeaQuery::showcase().ordered(IdeaOrder::ViewsDesc))
            .await?;
        debug!(projects = ideas.len(), limit, "Ranking builders");

        Ok(rank_builders(
            &ideas,
            usize::try_from(limit).unwrap_or(usize::MAX),
            &self.config.anonymous_builder_name,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use shipyard_core::models::idea::{BuilderProfile, IdeaMetrics, IdeaStatus};
    use shipyard_core::models::step::default_steps;
    use uuid::Uuid;

    fn shipped(user_id: &str, views: u64) -> Idea {
        let now = Utc::now();
        Idea {
            id: Uuid::new_v4(),
            user_id: user_id.into(),
            name: format!("{user_id}-project"),
            created_at: now,
            status: IdeaStatus::Completed,
            steps: default_steps(),
            is_public: true,
            project_type: None,
            production_url: Some("https://example.com".into()),
            description: None,
            category: Some(ProjectCategory::WebApp),
            tags: Vec::new(),
            metrics: IdeaMetrics {
                views,
                ..IdeaMetrics::new(now)
            },
            builder_profile: None,
        }
    }

    #[test]
    fn top_builders_sorted_after_grouping() {
        let ideas = vec![
            shipped("dora", 10),
            shipped("bob", 20),
            shipped("alice", 50),
            shipped("carol", 30),
            shipped("bob", 10),
        ];
        let ranked = rank_builders(&ideas, 3, "Anonymous Builder");

        let views: Vec<u64> = ranked.iter().map(|s| s.total_views).collect();
        assert_eq!(views, vec![50, 30, 30]);
        // bob and carol tie at 30; bob was seen first.
        assert_eq!(ranked[1].user_id, "bob");
        assert_eq!(ranked[2].user_id, "carol");
        let ranks: Vec<Option<u32>> = ranked.iter().map(|s| s.rank).collect();
        assert_eq!(ranks, vec![Some(1), Some(2), Some(3)]);
    }

    #[test]
    fn stats_fold_categories_and_averages() {
        let first = Idea {
            builder_profile: Some(BuilderProfile {
                twitter: Some("@alice".into()),
                ..Default::default()
            }),
            metrics: IdeaMetrics {
                time_to_complete: Some(2),
                ..shipped("alice", 5).metrics
            },
            ..shipped("alice", 5)
        };
        let later = Utc::now() + Duration::days(1);
        let second = Idea {
            category: Some(ProjectCategory::CliTool),
            metrics: IdeaMetrics {
                views: 7,
                clicks: 3,
                last_updated: later,
                time_to_complete: Some(5),
                completed_at: None,
            },
            ..shipped("alice", 7)
        };
        let third = Idea {
            category: Some(ProjectCategory::WebApp),
            ..shipped("alice", 1)
        };

        let stats = builder_stats("alice", &[first, second, third], "Anonymous Builder");
        assert_eq!(stats.builder_name, "@alice");
        assert_eq!(stats.completed_projects, 3);
        assert_eq!(stats.total_views, 13);
        assert_eq!(stats.total_clicks, 3);
        assert_eq!(
            stats.project_categories,
            vec![ProjectCategory::WebApp, ProjectCategory::CliTool]
        );
        assert_eq!(stats.last_shipped, later);
        assert_eq!(stats.average_time_to_complete, Some(3.5));
        assert_eq!(stats.rank, None);
    }

    #[test]
    fn builder_without_projects() {
        let stats = builder_stats("nobody", &[], "Anonymous Builder");
        assert_eq!(stats.builder_name, "Anonymous Builder");
        assert_eq!(stats.completed_projects, 0);
        assert_eq!(stats.last_shipped, DateTime::<Utc>::UNIX_EPOCH);
        assert_eq!(stats.average_time_to_complete, None);
    }
}
