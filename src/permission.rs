//! Role/action authorization and row ownership scoping.
//!
//! The two checks are independent: a role granted `read` still only sees its own
//! rows on an owned model unless it is Admin.

use crate::error::AppError;
use crate::identity::Identity;
use crate::model::{Action, ModelDefinition, Rbac, ADMIN_ROLE};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny,
}

/// Admin is always allowed; other roles need the action or `all` in their grant list.
pub fn authorize(rbac: &Rbac, role: &str, action: Action) -> Decision {
    if role == ADMIN_ROLE {
        return Decision::Allow;
    }
    let granted = rbac
        .get(role)
        .map(|grants| grants.iter().any(|g| g.covers(action)))
        .unwrap_or(false);
    if granted {
        Decision::Allow
    } else {
        Decision::Deny
    }
}

/// `authorize` as a result: Deny becomes PermissionDenied.
pub fn require(rbac: &Rbac, role: &str, action: Action) -> Result<(), AppError> {
    match authorize(rbac, role, action) {
        Decision::Allow => Ok(()),
        Decision::Deny => Err(AppError::PermissionDenied(format!(
            "access denied: '{}' permission required for this resource",
            action
        ))),
    }
}

/// Ownership predicate applied to reads and mutations.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OwnerScope<'a> {
    pub column: &'a str,
    pub owner_id: i64,
}

/// Rows visible to `caller`: restricted to its own when the model is owned and the caller is not Admin.
pub fn owner_scope<'a>(def: &'a ModelDefinition, caller: &Identity) -> Option<OwnerScope<'a>> {
    let column = def.owner_field.as_deref()?;
    if caller.is_admin() {
        return None;
    }
    Some(OwnerScope {
        column,
        owner_id: caller.id,
    })
}

/// Model management gate: caller's role must be one of `roles`.
pub fn require_role(caller: &Identity, roles: &[&str]) -> Result<(), AppError> {
    if roles.contains(&caller.role.as_str()) {
        Ok(())
    } else {
        Err(AppError::PermissionDenied(format!(
            "access denied: requires one of roles {}",
            roles.join(", ")
        )))
    }
}
