//! Schema definitions and migration runner for SurrealDB.
//!
//! Tables are SCHEMAFULL. Record ids and foreign keys are UUID strings;
//! enums are stored as their display strings with ASSERT constraints.
//! Nested objects (`steps[*]`, `metrics`, `builder_profile`) declare
//! every sub-field so nothing is silently dropped.

use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tracing::info;

use crate::error::DbError;

// -----------------------------------------------------------------------
// Migration tracking
// -----------------------------------------------------------------------

const MIGRATION_TABLE_DDL: &str = "\
DEFINE TABLE IF NOT EXISTS _migration SCHEMAFULL;
DEFINE FIELD IF NOT EXISTS version ON TABLE _migration TYPE int;
DEFINE FIELD IF NOT EXISTS name ON TABLE _migration TYPE string;
DEFINE FIELD IF NOT EXISTS applied_at ON TABLE _migration TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX IF NOT EXISTS idx_migration_version ON TABLE _migration \
    COLUMNS version UNIQUE;
";

#[derive(Debug, SurrealValue)]
struct MigrationRecord {
    version: u32,
    #[allow(dead_code)]
    name: String,
}

struct Migration {
    version: u32,
    name: &'static str,
    sql: &'static str,
}

static MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    name: "initial_schema",
    sql: SCHEMA_V1,
}];

// -----------------------------------------------------------------------
// Schema v1
// -----------------------------------------------------------------------

const SCHEMA_V1: &str = "\
-- =======================================================================
-- Ideas (owned by user_id)
-- =======================================================================
DEFINE TABLE idea SCHEMAFULL;
DEFINE FIELD user_id ON TABLE idea TYPE string;
DEFINE FIELD name ON TABLE idea TYPE string;
DEFINE FIELD created_at ON TABLE idea TYPE datetime DEFAULT time::now();
DEFINE FIELD status ON TABLE idea TYPE string DEFAULT 'Not Started' \
    ASSERT $value IN ['Not Started', 'In Progress', 'Completed'];
DEFINE FIELD is_public ON TABLE idea TYPE bool DEFAULT false;
DEFINE FIELD project_type ON TABLE idea TYPE option<string> \
    ASSERT $value = NONE OR $value IN ['personal', 'client'];
DEFINE FIELD production_url ON TABLE idea TYPE option<string>;
DEFINE FIELD description ON TABLE idea TYPE option<string>;
DEFINE FIELD category ON TABLE idea TYPE option<string> \
    ASSERT $value = NONE OR $value IN ['Web App', 'Mobile App', \
    'Chrome Extension', 'API', 'CLI Tool', 'Library', 'Other'];
DEFINE FIELD tags ON TABLE idea TYPE array<string> DEFAULT [];

DEFINE FIELD steps ON TABLE idea TYPE array<object> DEFAULT [];
DEFINE FIELD steps[*].id ON TABLE idea TYPE string;
DEFINE FIELD steps[*].name ON TABLE idea TYPE string;
DEFINE FIELD steps[*].description ON TABLE idea TYPE string;
DEFINE FIELD steps[*].is_completed ON TABLE idea TYPE bool DEFAULT false;
DEFINE FIELD steps[*].completed_at ON TABLE idea TYPE option<datetime>;

DEFINE FIELD metrics ON TABLE idea TYPE object DEFAULT {};
DEFINE FIELD metrics.views ON TABLE idea TYPE int DEFAULT 0;
DEFINE FIELD metrics.clicks ON TABLE idea TYPE int DEFAULT 0;
DEFINE FIELD metrics.last_updated ON TABLE idea TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD metrics.completed_at ON TABLE idea TYPE option<datetime>;
DEFINE FIELD metrics.time_to_complete ON TABLE idea TYPE option<int>;

DEFINE FIELD builder_profile ON TABLE idea TYPE option<object>;
DEFINE FIELD builder_profile.twitter ON TABLE idea TYPE option<string>;
DEFINE FIELD builder_profile.github ON TABLE idea TYPE option<string>;
DEFINE FIELD builder_profile.website ON TABLE idea TYPE option<string>;
DEFINE FIELD builder_profile.bio ON TABLE idea TYPE option<string>;
DEFINE FIELD builder_profile.skills ON TABLE idea \
    TYPE option<array<string>>;

DEFINE INDEX idx_idea_user ON TABLE idea COLUMNS user_id;
DEFINE INDEX idx_idea_showcase ON TABLE idea COLUMNS is_public, status;

-- =======================================================================
-- Resources (owned by user_id, weakly linked to idea_id / step_id)
-- =======================================================================
DEFINE TABLE resource SCHEMAFULL;
DEFINE FIELD idea_id ON TABLE resource TYPE string;
DEFINE FIELD step_id ON TABLE resource TYPE string;
DEFINE FIELD user_id ON TABLE resource TYPE string;
DEFINE FIELD title ON TABLE resource TYPE string;
DEFINE FIELD url ON TABLE resource TYPE string;
DEFINE FIELD resource_type ON TABLE resource TYPE string DEFAULT 'other' \
    ASSERT $value IN ['inspiration', 'tutorial', 'tool', \
    'documentation', 'other'];
DEFINE FIELD notes ON TABLE resource TYPE option<string>;
DEFINE FIELD added_at ON TABLE resource TYPE datetime DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE resource TYPE option<datetime>;

DEFINE INDEX idx_resource_idea_step ON TABLE resource \
    COLUMNS idea_id, step_id;
DEFINE INDEX idx_resource_user ON TABLE resource COLUMNS user_id;
";

/// Apply all pending migrations.
///
/// Creates a `_migration` tracking table on first run, then applies
/// each migration whose version exceeds the current maximum.
pub async fn run_migrations<C: Connection>(db: &Surreal<C>) -> Result<(), DbError> {
    db.query(MIGRATION_TABLE_DDL)
        .await?
        .check()
        .map_err(|e| DbError::Migration(e.to_string()))?;

    let mut result = db
        .query("SELECT * FROM _migration ORDER BY version DESC LIMIT 1")
        .await?;
    let records: Vec<MigrationRecord> = result.take(0)?;
    let current_version = records.first().map(|m| m.version).unwrap_or(0);

    for migration in MIGRATIONS {
        if migration.version > current_version {
            info!(
                version = migration.version,
                name = migration.name,
                "Applying migration"
            );
            db.query(migration.sql).await?.check().map_err(|e| {
                DbError::Migration(format!(
                    "Migration v{} '{}' failed: {}",
                    migration.version, migration.name, e,
                ))
            })?;

            db.query(
                "CREATE _migration SET version = $version, \
                 name = $name",
            )
            .bind(("version", migration.version))
            .bind(("name", migration.name))
            .await?
            .check()
            .map_err(|e| {
                DbError::Migration(format!(
                    "Failed to record migration v{}: {}",
                    migration.version, e,
                ))
            })?;

            info!(
                version = migration.version,
                "Migration applied successfully"
            );
        }
    }

    Ok(())
}

/// Returns the raw schema DDL for version 1.
pub fn schema_v1() -> &'static str {
    SCHEMA_V1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_v1_defines_both_collections() {
        assert!(SCHEMA_V1.contains("DEFINE TABLE idea SCHEMAFULL"));
        assert!(SCHEMA_V1.contains("DEFINE TABLE resource SCHEMAFULL"));
    }

    #[test]
    fn migrations_are_ordered() {
        for window in MIGRATIONS.windows(2) {
            assert!(
                window[0].version < window[1].version,
                "Migrations must be in ascending version order"
            );
        }
    }
}
