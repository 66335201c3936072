use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    dao::models::{AccountEntity, Role},
    dto::{format_system_time, validation::validate_username},
};

/// Credentials posted to `/auth/login`.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct LoginRequest {
    #[validate(custom(function = "validate_username"))]
    pub username: String,
    #[validate(length(min = 8, max = 128))]
    pub password: String,
}

/// Public projection of an account; never carries the hash or session token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AccountSummary {
    pub id: Uuid,
    pub username: String,
    pub name: Option<String>,
    pub role: Role,
    pub team_id: Option<Uuid>,
    pub created_at: String,
}

impl From<AccountEntity> for AccountSummary {
    fn from(value: AccountEntity) -> Self {
        Self {
            id: value.id,
            username: value.username,
            name: value.name,
            role: value.role,
            team_id: value.team_id,
            created_at: format_system_time(value.created_at),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LoginResponse {
    /// Bearer token for the new session; previous sessions are revoked.
    pub token: String,
    pub account: AccountSummary,
}
