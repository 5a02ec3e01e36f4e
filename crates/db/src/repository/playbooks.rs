//! Playbook CRUD operations.

use chrono::{SecondsFormat, Utc};
use sqlx::SqliteConnection;
use uuid::Uuid;

use crate::{
    DbError,
    models::{decode_all, PlaybookRow, RawPlaybookRow},
};

/// Insert a new playbook.
///
/// Returns `DbError::Conflict` if another playbook already uses `name`.
pub async fn insert_playbook(
    conn: &mut SqliteConnection,
    id: Uuid,
    name: &str,
) -> Result<PlaybookRow, DbError> {
    let now = Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true);

    let row: RawPlaybookRow = sqlx::query_as(
        r#"
        INSERT INTO playbooks (id, name, created_at)
        VALUES (?, ?, ?)
        RETURNING id, name, created_at
        "#,
    )
    .bind(id.to_string())
    .bind(name)
    .bind(now)
    .fetch_one(&mut *conn)
    .await?;

    row.try_into()
}

/// Fetch a single playbook by its primary key.
pub async fn get_playbook(
    conn: &mut SqliteConnection,
    id: Uuid,
) -> Result<Option<PlaybookRow>, DbError> {
    let row: Option<RawPlaybookRow> =
        sqlx::query_as(r#"SELECT id, name, created_at FROM playbooks WHERE id = ?"#)
            .bind(id.to_string())
            .fetch_optional(&mut *conn)
            .await?;

    row.map(PlaybookRow::try_from).transpose()
}

/// Whether a playbook with this primary key exists.
pub async fn playbook_exists(conn: &mut SqliteConnection, id: Uuid) -> Result<bool, DbError> {
    let found: bool =
        sqlx::query_scalar(r#"SELECT EXISTS(SELECT 1 FROM playbooks WHERE id = ?)"#)
            .bind(id.to_string())
            .fetch_one(&mut *conn)
            .await?;

    Ok(found)
}

/// Return all playbooks ordered by name, case-insensitively.
pub async fn list_playbooks(conn: &mut SqliteConnection) -> Result<Vec<PlaybookRow>, DbError> {
    let rows: Vec<RawPlaybookRow> = sqlx::query_as(
        r#"SELECT id, name, created_at FROM playbooks ORDER BY name COLLATE NOCASE ASC, name ASC"#,
    )
    .fetch_all(&mut *conn)
    .await?;

    decode_all(rows)
}

/// Change a playbook's name.
///
/// Returns `DbError::NotFound` if no row was updated and `DbError::Conflict`
/// if the new name is taken.
pub async fn rename_playbook(
    conn: &mut SqliteConnection,
    id: Uuid,
    name: &str,
) -> Result<(), DbError> {
    let result = sqlx::query("UPDATE playbooks SET name = ? WHERE id = ?")
        .bind(name)
        .bind(id.to_string())
        .execute(&mut *conn)
        .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }

    Ok(())
}

/// Permanently delete a playbook together with every workflow it owns.
///
/// Children go first, then the parent, both on the caller's transaction.
/// Returns the number of workflows removed, or `DbError::NotFound` if the
/// playbook did not exist.
pub async fn delete_playbook(conn: &mut SqliteConnection, id: Uuid) -> Result<u64, DbError> {
    let key = id.to_string();

    let workflows = sqlx::query("DELETE FROM workflows WHERE playbook_id = ?")
        .bind(&key)
        .execute(&mut *conn)
        .await?;

    let result = sqlx::query("DELETE FROM playbooks WHERE id = ?")
        .bind(&key)
        .execute(&mut *conn)
        .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }

    Ok(workflows.rows_affected())
}
