//! Resource resolution: turn validated identifiers into loaded entities.
//!
//! The set of resource kinds is closed.  Each [`Target`] variant carries the
//! identifiers its kind needs and picks its own lookup and existence check.

use std::fmt;

use db::repository::{playbooks as pb_repo, workflows as wf_repo};
use db::Session;
use uuid::Uuid;

use crate::{catalog, EngineError, ids, models::{Playbook, Workflow}};

/// The kinds of resource the gateway can resolve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    Playbook,
    Workflow,
}

impl ResourceKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Playbook => "playbook",
            Self::Workflow => "workflow",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A fully identified resource, ready to be looked up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    Playbook(Uuid),
    /// Workflows are only ever addressed through their owning playbook.
    Workflow { playbook_id: Uuid, workflow_id: Uuid },
}

impl Target {
    /// Validate raw identifiers for a playbook.  `None` if malformed.
    pub fn playbook(raw_id: &str) -> Option<Self> {
        ids::parse_uid(raw_id).map(Self::Playbook)
    }

    /// Validate raw identifiers for a workflow.  `None` if either is malformed.
    pub fn workflow(raw_playbook_id: &str, raw_workflow_id: &str) -> Option<Self> {
        Some(Self::Workflow {
            playbook_id: ids::parse_uid(raw_playbook_id)?,
            workflow_id: ids::parse_uid(raw_workflow_id)?,
        })
    }

    pub fn kind(&self) -> ResourceKind {
        match self {
            Self::Playbook(_) => ResourceKind::Playbook,
            Self::Workflow { .. } => ResourceKind::Workflow,
        }
    }

    /// The identifier of the resource itself (not its parent).
    pub fn id(&self) -> Uuid {
        match self {
            Self::Playbook(id) => *id,
            Self::Workflow { workflow_id, .. } => *workflow_id,
        }
    }

    pub fn not_found(&self) -> EngineError {
        EngineError::NotFound {
            kind: self.kind(),
            id: self.id(),
        }
    }
}

/// An entity located by [`resolve`].
#[derive(Debug, Clone, PartialEq)]
pub enum Resolved {
    Playbook(Playbook),
    Workflow(Workflow),
}

/// Whether the target exists.  A workflow under the wrong playbook does not.
pub async fn exists(session: &mut Session, target: Target) -> Result<bool, EngineError> {
    let found = match target {
        Target::Playbook(id) => pb_repo::playbook_exists(session.conn(), id).await?,
        Target::Workflow { playbook_id, workflow_id } => {
            wf_repo::workflow_exists(session.conn(), playbook_id, workflow_id).await?
        }
    };
    Ok(found)
}

/// Load the target, or `None` if it is absent.
///
/// A workflow id that exists under a different playbook resolves as `None`.
pub async fn resolve(session: &mut Session, target: Target) -> Result<Option<Resolved>, EngineError> {
    match target {
        Target::Playbook(id) => {
            let Some(row) = pb_repo::get_playbook(session.conn(), id).await? else {
                return Ok(None);
            };
            let playbook = catalog::hydrate_playbook(session, row).await?;
            Ok(Some(Resolved::Playbook(playbook)))
        }
        Target::Workflow { playbook_id, workflow_id } => {
            let row = wf_repo::get_workflow(session.conn(), playbook_id, workflow_id).await?;
            row.map(|row| catalog::workflow_from_row(row).map(Resolved::Workflow))
                .transpose()
        }
    }
}
