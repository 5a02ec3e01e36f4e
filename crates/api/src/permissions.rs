//! Role-based permission checks.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::auth::Caller;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Create,
    Read,
    Update,
    Delete,
}

/// The permissions an operation requires: every listed action on `resource`.
#[derive(Debug, Clone, Copy)]
pub struct ResourcePermissions {
    pub resource: &'static str,
    pub actions: &'static [Action],
}

impl ResourcePermissions {
    pub const fn new(resource: &'static str, actions: &'static [Action]) -> Self {
        Self { resource, actions }
    }
}

/// Decides whether a caller holds a set of permissions.
pub trait PermissionEvaluator: Send + Sync {
    fn allows(&self, caller: &Caller, required: &ResourcePermissions) -> bool;
}

/// Role → resource → granted actions.
///
/// A caller holds an action if any of its roles grants it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RolePermissions {
    roles: HashMap<String, HashMap<String, HashSet<Action>>>,
}

impl RolePermissions {
    /// `admin` may do everything to playbooks, `guest` may only read them.
    pub fn with_defaults() -> Self {
        Self::default()
            .grant(
                "admin",
                "playbooks",
                &[Action::Create, Action::Read, Action::Update, Action::Delete],
            )
            .grant("guest", "playbooks", &[Action::Read])
    }

    pub fn grant(mut self, role: &str, resource: &str, actions: &[Action]) -> Self {
        self.roles
            .entry(role.to_string())
            .or_default()
            .entry(resource.to_string())
            .or_default()
            .extend(actions.iter().copied());
        self
    }

    /// Parse a role table such as `{"admin": {"playbooks": ["read", "create"]}}`.
    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }

    fn holds(&self, roles: &[String], resource: &str, action: Action) -> bool {
        roles.iter().any(|role| {
            self.roles
                .get(role)
                .and_then(|resources| resources.get(resource))
                .is_some_and(|actions| actions.contains(&action))
        })
    }
}

impl PermissionEvaluator for RolePermissions {
    fn allows(&self, caller: &Caller, required: &ResourcePermissions) -> bool {
        required
            .actions
            .iter()
            .all(|action| self.holds(&caller.roles, required.resource, *action))
    }
}
