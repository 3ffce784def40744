//! Ownership guard applied before every mutation.

use shipyard_core::error::{TrackerError, TrackerResult};
use shipyard_core::models::idea::Idea;
use shipyard_core::models::resource::Resource;
use uuid::Uuid;

/// A record owned by exactly one user.
pub trait Owned {
    const ENTITY: &'static str;

    fn owner_id(&self) -> &str;
    fn record_id(&self) -> Uuid;
}

impl Owned for Idea {
    const ENTITY: &'static str = "idea";

    fn owner_id(&self) -> &str {
        &self.user_id
    }

    fn record_id(&self) -> Uuid {
        self.id
    }
}

impl Owned for Resource {
    const ENTITY: &'static str = "resource";

    fn owner_id(&self) -> &str {
        &self.user_id
    }

    fn record_id(&self) -> Uuid {
        self.id
    }
}

/// Hand the record back only if `actor` owns it.
pub fn ensure_owner<T: Owned>(record: T, actor: &str) -> TrackerResult<T> {
    if record.owner_id() == actor {
        Ok(record)
    } else {
        Err(TrackerError::PermissionDenied {
            reason: format!(
                "user {actor} does not own {} {}",
                T::ENTITY,
                record.record_id()
            ),
        })
    }
}

/// Resources must match both the acting user and the idea the caller
/// addressed them through.
pub fn ensure_resource_owner(
    resource: Resource,
    actor: &str,
    idea_id: Uuid,
) -> TrackerResult<Resource> {
    let resource = ensure_owner(resource, actor)?;
    if resource.idea_id != idea_id {
        return Err(TrackerError::PermissionDenied {
            reason: format!(
                "resource {} does not belong to idea {idea_id}",
                resource.id
            ),
        });
    }
    Ok(resource)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use shipyard_core::models::resource::ResourceType;

    fn resource(owner: &str, idea_id: Uuid) -> Resource {
        Resource {
            id: Uuid::new_v4(),
            idea_id,
            step_id: "planning".into(),
            user_id: owner.into(),
            title: "Roadmap template".into(),
            url: "https://example.com".into(),
            added_at: Utc::now(),
            updated_at: None,
            resource_type: ResourceType::Tool,
            notes: None,
        }
    }

    #[test]
    fn owner_passes() {
        let idea_id = Uuid::new_v4();
        assert!(ensure_resource_owner(resource("alice", idea_id), "alice", idea_id).is_ok());
    }

    #[test]
    fn other_user_is_denied() {
        let idea_id = Uuid::new_v4();
        let err = ensure_resource_owner(resource("alice", idea_id), "bob", idea_id).unwrap_err();
        assert!(matches!(err, TrackerError::PermissionDenied { .. }));
    }

    #[test]
    fn wrong_idea_is_denied() {
        let err =
            ensure_resource_owner(resource("alice", Uuid::new_v4()), "alice", Uuid::new_v4())
                .unwrap_err();
        assert!(matches!(err, TrackerError::PermissionDenied { .. }));
    }
}
