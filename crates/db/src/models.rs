//! Row structs that map 1-to-1 onto database tables.
//!
//! These are *persistence* models and carry no domain behaviour.
//! Domain types live in the `engine` crate.  SQLite stores identifiers as
//! hyphenated UUID text and timestamps as RFC 3339 text; the `Raw*` structs
//! mirror the columns and are decoded into the typed rows on the way out.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::DbError;

// ---------------------------------------------------------------------------
// playbooks
// ---------------------------------------------------------------------------

/// A persisted playbook row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaybookRow {
    pub id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, FromRow)]
pub(crate) struct RawPlaybookRow {
    pub id: String,
    pub name: String,
    pub created_at: String,
}

impl TryFrom<RawPlaybookRow> for PlaybookRow {
    type Error = DbError;

    fn try_from(raw: RawPlaybookRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Uuid::parse_str(&raw.id)?,
            name: raw.name,
            created_at: parse_timestamp(&raw.created_at)?,
        })
    }
}

// ---------------------------------------------------------------------------
// workflows
// ---------------------------------------------------------------------------

/// A persisted workflow row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowRow {
    pub id: Uuid,
    pub playbook_id: Uuid,
    pub name: String,
    /// JSON workflow graph (start, actions, branches).
    pub definition: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, FromRow)]
pub(crate) struct RawWorkflowRow {
    pub id: String,
    pub playbook_id: String,
    pub name: String,
    pub definition: String,
    pub created_at: String,
}

impl TryFrom<RawWorkflowRow> for WorkflowRow {
    type Error = DbError;

    fn try_from(raw: RawWorkflowRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Uuid::parse_str(&raw.id)?,
            playbook_id: Uuid::parse_str(&raw.playbook_id)?,
            name: raw.name,
            definition: serde_json::from_str(&raw.definition)?,
            created_at: parse_timestamp(&raw.created_at)?,
        })
    }
}

/// Id and name only, used to build summary listings without decoding graphs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowNameRow {
    pub id: Uuid,
    pub playbook_id: Uuid,
    pub name: String,
}

#[derive(Debug, FromRow)]
pub(crate) struct RawWorkflowNameRow {
    pub id: String,
    pub playbook_id: String,
    pub name: String,
}

impl TryFrom<RawWorkflowNameRow> for WorkflowNameRow {
    type Error = DbError;

    fn try_from(raw: RawWorkflowNameRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Uuid::parse_str(&raw.id)?,
            playbook_id: Uuid::parse_str(&raw.playbook_id)?,
            name: raw.name,
        })
    }
}

fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, DbError> {
    DateTime::parse_from_rfc3339(value)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| DbError::Corrupt(format!("bad timestamp '{value}': {e}")))
}

/// Decode a batch of raw rows, failing on the first corrupt one.
pub(crate) fn decode_all<R, T>(rows: Vec<R>) -> Result<Vec<T>, DbError>
where
    T: TryFrom<R, Error = DbError>,
{
    rows.into_iter().map(T::try_from).collect()
}
