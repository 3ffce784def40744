//! SurrealDB implementation of [`ResourceRepository`].

use chrono::{DateTime, Utc};
use shipyard_core::error::TrackerResult;
use shipyard_core::models::resource::{CreateResource, Resource, ResourceType, UpdateResource};
use shipyard_core::repository::{ResourceQuery, ResourceRepository};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use crate::error::DbError;

#[derive(Debug, SurrealValue)]
struct ResourceRow {
    idea_id: String,
    step_id: String,
    user_id: String,
    title: String,
    url: String,
    resource_type: Option<String>,
    notes: Option<String>,
    added_at: Option<DateTime<Utc>>,
    updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, SurrealValue)]
struct ResourceRowWithId {
    record_id: String,
    idea_id: String,
    step_id: String,
    user_id: String,
    title: String,
    url: String,
    resource_type: Option<String>,
    notes: Option<String>,
    added_at: Option<DateTime<Utc>>,
    updated_at: Option<DateTime<Utc>>,
}

fn parse_resource_type(s: &str) -> Result<ResourceType, DbError> {
    match s {
        "inspiration" => Ok(ResourceType::Inspiration),
        "tutorial" => Ok(ResourceType::Tutorial),
        "tool" => Ok(ResourceType::Tool),
        "documentation" => Ok(ResourceType::Documentation),
        "other" => Ok(ResourceType::Other),
        other => Err(DbError::InvalidRecord(format!(
            "unknown resource type: {other}"
        ))),
    }
}

fn row_to_resource(row: ResourceRow, id: Uuid) -> Result<Resource, DbError> {
    let idea_id = Uuid::parse_str(&row.idea_id)
        .map_err(|e| DbError::InvalidRecord(format!("invalid idea UUID: {e}")))?;
    Ok(Resource {
        id,
        idea_id,
        step_id: row.step_id,
        user_id: row.user_id,
        title: row.title,
        url: row.url,
        added_at: row.added_at.unwrap_or_else(Utc::now),
        updated_at: row.updated_at,
        resource_type: row
            .resource_type
            .as_deref()
            .map(parse_resource_type)
            .transpose()?
            .unwrap_or_default(),
        notes: row.notes,
    })
}

impl ResourceRowWithId {
    fn try_into_resource(self) -> Result<Resource, DbError> {
        let id = Uuid::parse_str(&self.record_id)
            .map_err(|e| DbError::InvalidRecord(format!("invalid resource UUID: {e}")))?;
        row_to_resource(
            ResourceRow {
                idea_id: self.idea_id,
                step_id: self.step_id,
                user_id: self.user_id,
                title: self.title,
                url: self.url,
                resource_type: self.resource_type,
                notes: self.notes,
                added_at: self.added_at,
                updated_at: self.updated_at,
            },
            id,
        )
    }
}

fn first_resource(rows: Vec<ResourceRow>, id: Uuid) -> Result<Resource, DbError> {
    let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
        entity: "resource".into(),
        id: id.to_string(),
    })?;
    row_to_resource(row, id)
}

/// SurrealDB implementation of the Resource repository.
#[derive(Clone)]
pub struct SurrealResourceRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealResourceRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> ResourceRepository for SurrealResourceRepository<C> {
    async fn create(&self, input: CreateResource) -> TrackerResult<Resource> {
        let id = Uuid::new_v4();

        let result = self
            .db
            .query(
                "CREATE type::record('resource', $id) SET \
                 idea_id = $idea_id, step_id = $step_id, \
                 user_id = $user_id, \
                 title = $title, url = $url, \
                 resource_type = $resource_type, \
                 notes = $notes",
            )
            .bind(("id", id.to_string()))
            .bind(("idea_id", input.idea_id.to_string()))
            .bind(("step_id", input.step_id))
            .bind(("user_id", input.user_id))
            .bind(("title", input.title))
            .bind(("url", input.url))
            .bind(("resource_type", input.resource_type.as_str().to_string()))
            .bind(("notes", input.notes))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;

        let rows: Vec<ResourceRow> = result.take(0).map_err(DbError::from)?;
        Ok(first_resource(rows, id)?)
    }

    async fn get_by_id(&self, id: Uuid) -> TrackerResult<Resource> {
        let mut result = self
            .db
            .query("SELECT * FROM type::record('resource', $id)")
            .bind(("id", id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<ResourceRow> = result.take(0).map_err(DbError::from)?;
        Ok(first_resource(rows, id)?)
    }

    async fn query(&self, query: ResourceQuery) -> TrackerResult<Vec<Resource>> {
        let mut conditions = Vec::new();
        if query.idea_id.is_some() {
            conditions.push("idea_id = $idea_id");
        }
        if query.step_id.is_some() {
            conditions.push("step_id = $step_id");
        }
        if query.user_id.is_some() {
            conditions.push("user_id = $user_id");
        }

        let mut sql = String::from("SELECT record::id(id) AS record_id, * FROM resource");
        if !conditions.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&conditions.join(" AND "));
        }
        sql.push_str(" ORDER BY added_at ASC");

        let mut builder = self.db.query(sql);
        if let Some(idea_id) = query.idea_id {
            builder = builder.bind(("idea_id", idea_id.to_string()));
        }
        if let Some(step_id) = query.step_id {
            builder = builder.bind(("step_id", step_id));
        }
        if let Some(user_id) = query.user_id {
            builder = builder.bind(("user_id", user_id));
        }

        let mut result = builder.await.map_err(DbError::from)?;
        let rows: Vec<ResourceRowWithId> = result.take(0).map_err(DbError::from)?;

        rows.into_iter()
            .map(|row| row.try_into_resource())
            .collect::<Result<Vec<_>, DbError>>()
            .map_err(Into::into)
    }

    async fn update(&self, id: Uuid, input: UpdateResource) -> TrackerResult<Resource> {
        let mut sets = Vec::new();
        if input.title.is_some() {
            sets.push("title = $title");
        }
        if input.url.is_some() {
            sets.push("url = $url");
        }
        if input.resource_type.is_some() {
            sets.push("resource_type = $resource_type");
        }
        if input.notes.is_some() {
            sets.push("notes = $notes");
        }
        sets.push("updated_at = time::now()");

        let query = format!(
            "UPDATE type::record('resource', $id) SET {}",
            sets.join(", ")
        );

        let mut builder = self.db.query(&query).bind(("id", id.to_string()));

        if let Some(title) = input.title {
            builder = builder.bind(("title", title));
        }
        if let Some(url) = input.url {
            builder = builder.bind(("url", url));
        }
        if let Some(resource_type) = input.resource_type {
            builder = builder.bind(("resource_type", resource_type.as_str().to_string()));
        }
        if let Some(notes) = input.notes {
            builder = builder.bind(("notes", notes));
        }

        let result = builder.await.map_err(DbError::from)?;
        let mut result = result
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;

        let rows: Vec<ResourceRow> = result.take(0).map_err(DbError::from)?;
        Ok(first_resource(rows, id)?)
    }

    async fn delete(&self, id: Uuid) -> TrackerResult<()> {
        self.db
            .query("DELETE type::record('resource', $id)")
            .bind(("id", id.to_string()))
            .await
            .map_err(DbError::from)?;

        Ok(())
    }
}
