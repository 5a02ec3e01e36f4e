//! Containment upkeep: a playbook never outlives its last workflow.
//!
//! The cascade is one-way.  Removing the last workflow removes the playbook;
//! creating a workflow never brings a playbook back.

use db::repository::{playbooks as pb_repo, workflows as wf_repo};
use db::Session;
use tracing::debug;
use uuid::Uuid;

use crate::EngineError;

/// What a workflow delete removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CascadeReport {
    pub workflow_id: Uuid,
    pub playbook_id: Uuid,
    /// True when the parent playbook was removed because it became empty.
    pub playbook_removed: bool,
}

/// Delete `playbook_id` if it no longer owns any workflow.
///
/// Runs on the caller's session, so the check and the removal commit or roll
/// back together with the workflow delete that triggered them.
pub async fn collapse_if_empty(session: &mut Session, playbook_id: Uuid) -> Result<bool, EngineError> {
    let remaining = wf_repo::count_workflows(session.conn(), playbook_id).await?;
    if remaining > 0 {
        return Ok(false);
    }

    debug!(%playbook_id, "Removing playbook since it is empty");
    pb_repo::delete_playbook(session.conn(), playbook_id).await?;
    Ok(true)
}

/// Delete a workflow, then its parent if that left the parent empty.
pub async fn remove_workflow(
    session: &mut Session,
    playbook_id: Uuid,
    workflow_id: Uuid,
) -> Result<CascadeReport, EngineError> {
    wf_repo::delete_workflow(session.conn(), playbook_id, workflow_id)
        .await
        .map_err(|err| match err {
            db::DbError::NotFound => EngineError::NotFound {
                kind: crate::ResourceKind::Workflow,
                id: workflow_id,
            },
            err => err.into(),
        })?;

    let playbook_removed = collapse_if_empty(session, playbook_id).await?;

    Ok(CascadeReport {
        workflow_id,
        playbook_id,
        playbook_removed,
    })
}
