use super::Capability;
use crate::common::{AccountId, AppError};
use crate::domains::accounts::models::{Account, RoleKind};

/// Entry point for authorization checks.
pub struct Actor {
    actor_id: AccountId,
    role: RoleKind,
}

impl Actor {
    /// `role` must come from the live account record, not from token claims,
    /// so role changes apply without re-login.
    pub fn new(actor_id: AccountId, role: RoleKind) -> Self {
        Self { actor_id, role }
    }

    pub fn from_account(account: &Account) -> Self {
        Self::new(account.id, account.role.kind())
    }

    pub fn can(self, capability: Capability<'_>) -> CapabilityBuilder<'_> {
        CapabilityBuilder {
            actor_id: self.actor_id,
            role: self.role,
            capability,
        }
    }
}

pub struct CapabilityBuilder<'a> {
    actor_id: AccountId,
    role: RoleKind,
    capability: Capability<'a>,
}

impl CapabilityBuilder<'_> {
    pub fn check(self) -> Result<(), AppError> {
        match self.capability {
            Capability::HoldRole(allowed) => {
                if allowed.contains(&self.role) {
                    Ok(())
                } else {
                    Err(AppError::forbidden("Access denied: insufficient permissions"))
                }
            }
            Capability::ManageListing { owner_id } => {
                if owner_id == self.actor_id || self.role == RoleKind::Admin {
                    Ok(())
                } else {
                    Err(AppError::forbidden("Access denied: you do not own this listing"))
                }
            }
        }
    }
}
