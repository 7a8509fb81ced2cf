use serde::{Deserialize, Serialize};

use crate::model::{Capability, entity::UserEntity};

#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct SessionResponse {
    pub user: UserEntity,
    /// Send back in the `X-Nexus-Token` header.
    pub token: String,
}

/// Current user with the capabilities the studio UI gates on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct MeResponse {
    pub id: i64,
    pub username: String,
    pub role: String,
    pub can_use_studio: bool,
    pub can_manage_upsell: bool,
}

impl From<&UserEntity> for MeResponse {
    fn from(user: &UserEntity) -> Self {
        let role = user.role();
        Self {
            id: user.id(),
            username: user.username().to_string(),
            role: role.to_string(),
            can_use_studio: role.can(Capability::UseStudio),
            can_manage_upsell: role.can(Capability::ManageUpsell),
        }
    }
}
