//! Access gateway for resource operations.
//!
//! Every operation passes the same checks, in this order, before its own
//! logic runs:
//!
//! 1. [`Gateway::authenticate`]: a verified caller, or 401.
//! 2. [`Authenticated::authorize`]: every required permission, or 403.
//! 3. [`Authorized::playbook`] / [`Authorized::workflow`]: well-formed ids
//!    that resolve to existing entities, or 404.
//!
//! Each step consumes the previous one, so the only way to reach an entity is
//! through all of them.  Resolution opens the request's [`Session`], a write
//! session unless the operation only reads; the handler finishes it with
//! [`Tx::settle`].

use axum::http::HeaderMap;
use db::{DbPool, Session};
use engine::resolver::{self, Resolved, ResourceKind, Target};
use engine::{is_valid_uid, EngineError, Playbook, Workflow};
use tracing::{error, warn};

use crate::auth::{bearer_token, Caller};
use crate::error::ApiError;
use crate::permissions::{Action, ResourcePermissions};
use crate::state::AppState;

pub struct Gateway<'a> {
    state: &'a AppState,
    operation: &'static str,
}

impl<'a> Gateway<'a> {
    /// `operation` names the request in log lines, e.g. `"copy playbook"`.
    pub fn new(state: &'a AppState, operation: &'static str) -> Self {
        Self { state, operation }
    }

    pub async fn authenticate(self, headers: &HeaderMap) -> Result<Authenticated<'a>, ApiError> {
        let verified = match bearer_token(headers) {
            Ok(token) => self.state.authenticator.authenticate(token).await,
            Err(err) => Err(err),
        };

        match verified {
            Ok(caller) => Ok(Authenticated {
                state: self.state,
                operation: self.operation,
                caller,
            }),
            Err(err) => {
                warn!(operation = self.operation, error = %err, "Unauthenticated request");
                Err(ApiError::Unauthenticated(err.to_string()))
            }
        }
    }
}

pub struct Authenticated<'a> {
    state: &'a AppState,
    operation: &'static str,
    caller: Caller,
}

impl<'a> Authenticated<'a> {
    /// Require every action in `required`.
    pub fn authorize(self, required: &ResourcePermissions) -> Result<Authorized<'a>, ApiError> {
        if !self.state.permissions.allows(&self.caller, required) {
            warn!(
                operation = self.operation,
                subject = %self.caller.subject,
                resource = required.resource,
                "Permission denied"
            );
            return Err(ApiError::Forbidden(format!(
                "Insufficient permissions to {}",
                self.operation
            )));
        }

        Ok(Authorized {
            state: self.state,
            operation: self.operation,
            caller: self.caller,
            writes: required.actions.iter().any(|action| *action != Action::Read),
        })
    }
}

pub struct Authorized<'a> {
    state: &'a AppState,
    operation: &'static str,
    caller: Caller,
    /// Anything beyond read access opens a write session.
    writes: bool,
}

/// An authorized request together with its resolved entity and open session.
pub struct Access<E> {
    pub caller: Caller,
    pub entity: E,
    pub tx: Tx,
}

impl<'a> Authorized<'a> {
    /// For operations that address no existing resource (listing, creating).
    pub async fn unscoped(self) -> Result<Access<()>, ApiError> {
        let tx = Tx::begin(&self.state.pool, self.writes, self.operation, "playbooks".to_string()).await?;
        Ok(Access {
            caller: self.caller,
            entity: (),
            tx,
        })
    }

    pub async fn playbook(self, raw_id: &str) -> Result<Access<Playbook>, ApiError> {
        let Some(target) = Target::playbook(raw_id) else {
            return Err(self.invalid_id(ResourceKind::Playbook, raw_id));
        };

        let Access { caller, entity, tx } = self.resolve(target).await?;
        match entity {
            Resolved::Playbook(playbook) => Ok(Access {
                caller,
                entity: playbook,
                tx,
            }),
            Resolved::Workflow(_) => Err(tx.mismatch(target).await),
        }
    }

    /// A workflow addressed through the playbook that should own it.
    pub async fn workflow(self, raw_playbook_id: &str, raw_workflow_id: &str) -> Result<Access<Workflow>, ApiError> {
        let Some(target) = Target::workflow(raw_playbook_id, raw_workflow_id) else {
            let (kind, raw) = if is_valid_uid([raw_playbook_id]) {
                (ResourceKind::Workflow, raw_workflow_id)
            } else {
                (ResourceKind::Playbook, raw_playbook_id)
            };
            return Err(self.invalid_id(kind, raw));
        };

        let Access { caller, entity, tx } = self.resolve(target).await?;
        match entity {
            Resolved::Workflow(workflow) => Ok(Access {
                caller,
                entity: workflow,
                tx,
            }),
            Resolved::Playbook(_) => Err(tx.mismatch(target).await),
        }
    }

    fn invalid_id(&self, kind: ResourceKind, raw: &str) -> ApiError {
        warn!(operation = self.operation, %kind, id = raw, "Invalid identifier");
        EngineError::InvalidIdentifier {
            kind,
            raw: raw.to_string(),
        }
        .into()
    }

    async fn resolve(self, target: Target) -> Result<Access<Resolved>, ApiError> {
        let resource = format!("{} {}", target.kind(), target.id());
        let mut tx = Tx::begin(&self.state.pool, self.writes, self.operation, resource).await?;

        let resolved = resolver::resolve(tx.session(), target).await;
        match resolved {
            Ok(Some(entity)) => Ok(Access {
                caller: self.caller,
                entity,
                tx,
            }),
            Ok(None) => {
                warn!(operation = self.operation, resource = %tx.resource, "Resource does not exist");
                tx.abandon().await;
                Err(target.not_found().into())
            }
            Err(err) => {
                error!(operation = self.operation, resource = %tx.resource, error = %err, "Could not resolve resource");
                tx.abandon().await;
                Err(err.into())
            }
        }
    }
}

/// The request's open session.
///
/// Dropping a `Tx` rolls back, but handlers are expected to close it with
/// [`Tx::settle`].
pub struct Tx {
    session: Session,
    operation: &'static str,
    resource: String,
}

impl Tx {
    async fn begin(pool: &DbPool, writes: bool, operation: &'static str, resource: String) -> Result<Self, ApiError> {
        let session = if writes {
            Session::begin_write(pool).await
        } else {
            Session::begin(pool).await
        };

        match session {
            Ok(session) => Ok(Self {
                session,
                operation,
                resource,
            }),
            Err(err) => {
                error!(operation, error = %err, "Could not open session");
                Err(EngineError::from(err).into())
            }
        }
    }

    pub fn session(&mut self) -> &mut Session {
        &mut self.session
    }

    /// Commit on success, roll back on failure.
    ///
    /// A commit that fails is reported like any other failure; the
    /// transaction is gone either way.
    pub async fn settle<T>(self, outcome: Result<T, EngineError>) -> Result<T, ApiError> {
        let err = match outcome {
            Ok(value) => match self.session.commit().await {
                Ok(()) => return Ok(value),
                Err(err) => {
                    let err = EngineError::from(err);
                    error!(operation = self.operation, resource = %self.resource, error = %err, "Could not commit");
                    return Err(err.into());
                }
            },
            Err(err) => err,
        };

        let rejected = err.is_invalid_input()
            || matches!(
                err,
                EngineError::InvalidIdentifier { .. }
                    | EngineError::NotFound { .. }
                    | EngineError::Conflict(_)
                    | EngineError::Busy(_)
            );
        if rejected {
            warn!(operation = self.operation, resource = %self.resource, error = %err, "Request rejected");
        } else {
            error!(operation = self.operation, resource = %self.resource, error = %err, "Request failed");
        }

        if let Err(rollback) = self.session.rollback().await {
            error!(operation = self.operation, error = %rollback, "Could not roll back");
        }
        Err(err.into())
    }

    async fn abandon(self) {
        if let Err(err) = self.session.rollback().await {
            error!(operation = self.operation, error = %err, "Could not roll back");
        }
    }

    async fn mismatch(self, target: Target) -> ApiError {
        error!(operation = self.operation, kind = %target.kind(), "Resolved entity has the wrong kind");
        self.abandon().await;
        ApiError::Internal("Internal error.".to_string())
    }
}
