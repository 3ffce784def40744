//! Integration tests for the Resource repository using in-memory SurrealDB.

use shipyard_core::error::TrackerError;
use shipyard_core::models::resource::{CreateResource, ResourceType, UpdateResource};
use shipyard_core::repository::{ResourceQuery, ResourceRepository};
use shipyard_db::repository::SurrealResourceRepository;
use surrealdb::Surreal;
use surrealdb::engine::local::{Db, Mem};
use uuid::Uuid;

async fn setup() -> SurrealResourceRepository<Db> {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    shipyard_db::run_migrations(&db).await.unwrap();
    SurrealResourceRepository::new(db)
}

fn new_resource(idea_id: Uuid, step_id: &str, user_id: &str, title: &str) -> CreateResource {
    CreateResource {
        idea_id,
        step_id: step_id.into(),
        user_id: user_id.into(),
        title: title.into(),
        url: "https://example.com".into(),
        resource_type: ResourceType::Tutorial,
        notes: None,
    }
}

#[tokio::test]
async fn create_and_get_resource() {
    let repo = setup().await;
    let idea_id = Uuid::new_v4();

    let resource = repo
        .create(CreateResource {
            notes: Some("Read before planning".into()),
            ..new_resource(idea_id, "planning", "alice", "Roadmap guide")
        })
        .await
        .unwrap();

    assert_eq!(resource.idea_id, idea_id);
    assert_eq!(resource.step_id, "planning");
    assert_eq!(resource.user_id, "alice");
    assert_eq!(resource.resource_type, ResourceType::Tutorial);
    assert!(resource.updated_at.is_none());

    let fetched = repo.get_by_id(resource.id).await.unwrap();
    assert_eq!(fetched.title, "Roadmap guide");
    assert_eq!(fetched.notes.as_deref(), Some("Read before planning"));
}

#[tokio::test]
async fn query_scopes_by_idea_step_and_user() {
    let repo = setup().await;
    let idea_id = Uuid::new_v4();

    repo.create(new_resource(idea_id, "planning", "alice", "First"))
        .await
        .unwrap();
    repo.create(new_resource(idea_id, "planning", "alice", "Second"))
        .await
        .unwrap();
    repo.create(new_resource(idea_id, "launch", "alice", "Launch kit"))
        .await
        .unwrap();
    repo.create(new_resource(idea_id, "planning", "bob", "Not mine"))
        .await
        .unwrap();
    repo.create(new_resource(Uuid::new_v4(), "planning", "alice", "Elsewhere"))
        .await
        .unwrap();

    let planning = repo
        .query(ResourceQuery {
            idea_id: Some(idea_id),
            step_id: Some("planning".into()),
            user_id: Some("alice".into()),
        })
        .await
        .unwrap();
    let titles: Vec<&str> = planning.iter().map(|r| r.title.as_str()).collect();
    assert_eq!(titles, vec!["First", "Second"]);

    let all_for_idea = repo
        .query(ResourceQuery {
            idea_id: Some(idea_id),
            user_id: Some("alice".into()),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(all_for_idea.len(), 3);
}

#[tokio::test]
async fn update_resource_sets_updated_at() {
    let repo = setup().await;
    let resource = repo
        .create(CreateResource {
            notes: Some("draft".into()),
            ..new_resource(Uuid::new_v4(), "idea", "alice", "Old title")
        })
        .await
        .unwrap();

    let updated = repo
        .update(
            resource.id,
            UpdateResource {
                title: Some("New title".into()),
                resource_type: Some(ResourceType::Documentation),
                notes: Some(None),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.title, "New title");
    assert_eq!(updated.resource_type, ResourceType::Documentation);
    assert!(updated.notes.is_none());
    assert_eq!(updated.url, resource.url);
    assert!(updated.updated_at.is_some());
}

#[tokio::test]
async fn delete_resource() {
    let repo = setup().await;
    let resource = repo
        .create(new_resource(Uuid::new_v4(), "idea", "alice", "Gone soon"))
        .await
        .unwrap();

    repo.delete(resource.id).await.unwrap();

    let err = repo.get_by_id(resource.id).await.unwrap_err();
    assert!(matches!(err, TrackerError::NotFound { .. }));
}
