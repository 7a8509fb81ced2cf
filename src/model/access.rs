use crate::{
    model::error::{DatabaseError, DatabaseResult},
    web::{AuthenticatedUser, UserRole},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    /// Author courses, modules and items.
    UseStudio,
    /// Write checkout and offer fields on items.
    ManageUpsell,
}

impl UserRole {
    pub fn can(&self, capability: Capability) -> bool {
        match (self, capability) {
            (UserRole::Admin, _) => true,
            (UserRole::Editor, Capability::UseStudio) => true,
            (UserRole::Editor, Capability::ManageUpsell) => false,
            (UserRole::Member, _) => false,
        }
    }
}

pub fn check_capability(actor: &AuthenticatedUser, capability: Capability) -> DatabaseResult<()> {
    if actor.user_role().can(capability) {
        Ok(())
    } else {
        Err(DatabaseError::Forbidden)
    }
}
