//! Workflow CRUD operations.
//!
//! Workflows are always addressed through their owning playbook: a workflow
//! id paired with the wrong playbook id behaves exactly like a missing row.

use chrono::{SecondsFormat, Utc};
use sqlx::SqliteConnection;
use uuid::Uuid;

use crate::{
    DbError,
    models::{decode_all, RawWorkflowNameRow, RawWorkflowRow, WorkflowNameRow, WorkflowRow},
};

/// Insert a new workflow under `playbook_id`.
///
/// `definition` must be a valid JSON object produced by serialising the
/// domain workflow graph from the `engine` crate.  Returns
/// `DbError::Conflict` if the playbook already has a workflow called `name`.
pub async fn insert_workflow(
    conn: &mut SqliteConnection,
    id: Uuid,
    playbook_id: Uuid,
    name: &str,
    definition: &serde_json::Value,
) -> Result<WorkflowRow, DbError> {
    let now = Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true);

    let row: RawWorkflowRow = sqlx::query_as(
        r#"
        INSERT INTO workflows (id, playbook_id, name, definition, created_at)
        VALUES (?, ?, ?, ?, ?)
        RETURNING id, playbook_id, name, definition, created_at
        "#,
    )
    .bind(id.to_string())
    .bind(playbook_id.to_string())
    .bind(name)
    .bind(serde_json::to_string(definition)?)
    .bind(now)
    .fetch_one(&mut *conn)
    .await?;

    row.try_into()
}

/// Fetch a single workflow by id, scoped to its owning playbook.
pub async fn get_workflow(
    conn: &mut SqliteConnection,
    playbook_id: Uuid,
    id: Uuid,
) -> Result<Option<WorkflowRow>, DbError> {
    let row: Option<RawWorkflowRow> = sqlx::query_as(
        r#"
        SELECT id, playbook_id, name, definition, created_at
        FROM workflows
        WHERE id = ? AND playbook_id = ?
        "#,
    )
    .bind(id.to_string())
    .bind(playbook_id.to_string())
    .fetch_optional(&mut *conn)
    .await?;

    row.map(WorkflowRow::try_from).transpose()
}

/// Whether `id` names a workflow owned by `playbook_id`.
pub async fn workflow_exists(
    conn: &mut SqliteConnection,
    playbook_id: Uuid,
    id: Uuid,
) -> Result<bool, DbError> {
    let found: bool = sqlx::query_scalar(
        r#"SELECT EXISTS(SELECT 1 FROM workflows WHERE id = ? AND playbook_id = ?)"#,
    )
    .bind(id.to_string())
    .bind(playbook_id.to_string())
    .fetch_one(&mut *conn)
    .await?;

    Ok(found)
}

/// Return every workflow of a playbook ordered by name, case-insensitively.
pub async fn list_workflows(
    conn: &mut SqliteConnection,
    playbook_id: Uuid,
) -> Result<Vec<WorkflowRow>, DbError> {
    let rows: Vec<RawWorkflowRow> = sqlx::query_as(
        r#"
        SELECT id, playbook_id, name, definition, created_at
        FROM workflows
        WHERE playbook_id = ?
        ORDER BY name COLLATE NOCASE ASC, name ASC
        "#,
    )
    .bind(playbook_id.to_string())
    .fetch_all(&mut *conn)
    .await?;

    decode_all(rows)
}

/// Id/name pairs of all workflows across all playbooks, ordered by name
/// case-insensitively.
pub async fn list_workflow_names(
    conn: &mut SqliteConnection,
) -> Result<Vec<WorkflowNameRow>, DbError> {
    let rows: Vec<RawWorkflowNameRow> = sqlx::query_as(
        r#"
        SELECT id, playbook_id, name
        FROM workflows
        ORDER BY name COLLATE NOCASE ASC, name ASC
        "#,
    )
    .fetch_all(&mut *conn)
    .await?;

    decode_all(rows)
}

/// Number of workflows currently owned by a playbook.
pub async fn count_workflows(conn: &mut SqliteConnection, playbook_id: Uuid) -> Result<i64, DbError> {
    let count: i64 = sqlx::query_scalar(r#"SELECT COUNT(*) FROM workflows WHERE playbook_id = ?"#)
        .bind(playbook_id.to_string())
        .fetch_one(&mut *conn)
        .await?;

    Ok(count)
}

/// Overwrite a workflow's name and graph in place.
///
/// Returns `DbError::NotFound` if no row was updated and `DbError::Conflict`
/// if the new name is taken within the playbook.
pub async fn update_workflow(
    conn: &mut SqliteConnection,
    playbook_id: Uuid,
    id: Uuid,
    name: &str,
    definition: &serde_json::Value,
) -> Result<(), DbError> {
    let result = sqlx::query(
        r#"
        UPDATE workflows
        SET name = ?, definition = ?
        WHERE id = ? AND playbook_id = ?
        "#,
    )
    .bind(name)
    .bind(serde_json::to_string(definition)?)
    .bind(id.to_string())
    .bind(playbook_id.to_string())
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }

    Ok(())
}

/// Permanently delete a workflow.
///
/// Returns `DbError::NotFound` if no row was deleted.
pub async fn delete_workflow(
    conn: &mut SqliteConnection,
    playbook_id: Uuid,
    id: Uuid,
) -> Result<(), DbError> {
    let result = sqlx::query("DELETE FROM workflows WHERE id = ? AND playbook_id = ?")
        .bind(id.to_string())
        .bind(playbook_id.to_string())
        .execute(&mut *conn)
        .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }

    Ok(())
}
