//! Authentication primitives and request extractors.

pub mod jwt;
pub mod password;

use axum::{extract::FromRequestParts, http::request::Parts};
use uuid::Uuid;

use crate::{
    dao::models::Role,
    error::{AppError, ServiceError},
    services::auth_service,
    state::SharedState,
};

/// Roles allowed to administer the contest.
pub const ADMIN_ROLES: &[Role] = &[Role::Admin, Role::Master];

/// Authenticated caller, resolved from a bearer token with an active session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub account_id: Uuid,
    pub username: String,
    pub role: Role,
    pub team_id: Option<Uuid>,
}

impl Actor {
    pub fn has_role(&self, allowed: &[Role]) -> bool {
        allowed.contains(&self.role)
    }
}

/// Capability check: the actor must hold one of `allowed`.
pub fn require_role(actor: &Actor, allowed: &[Role]) -> Result<(), ServiceError> {
    if actor.has_role(allowed) {
        Ok(())
    } else {
        Err(ServiceError::Forbidden(format!(
            "role {:?} is not allowed to perform this action",
            actor.role
        )))
    }
}

/// Extract the raw token from an `Authorization: Bearer <token>` header.
fn bearer_token(parts: &Parts) -> Result<&str, ServiceError> {
    let header = parts
        .headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| ServiceError::Unauthorized("missing bearer token".into()))?;

    header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| ServiceError::Unauthorized("malformed authorization header".into()))
}

impl FromRequestParts<SharedState> for Actor {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &SharedState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)?;
        Ok(auth_service::authenticate(state, token).await?)
    }
}

#[cfg(test)]
mod tests {
    use axum::http::Request;

    use super::*;

    fn actor(role: Role) -> Actor {
        Actor {
            account_id: Uuid::new_v4(),
            username: "someone".into(),
            role,
            team_id: None,
        }
    }

    #[test]
    fn only_admin_and_master_pass_admin_check() {
        assert!(require_role(&actor(Role::Admin), ADMIN_ROLES).is_ok());
        assert!(require_role(&actor(Role::Master), ADMIN_ROLES).is_ok());
        for role in [Role::User, Role::Operator, Role::Judge] {
            assert!(matches!(
                require_role(&actor(role), ADMIN_ROLES),
                Err(ServiceError::Forbidden(_))
            ));
        }
    }

    #[test]
    fn bearer_token_requires_scheme() {
        let (parts, _) = Request::builder()
            .header("Authorization", "Bearer abc.def")
            .body(())
            .unwrap()
            .into_parts();
        assert_eq!(bearer_token(&parts).unwrap(), "abc.def");

        let (parts, _) = Request::builder()
            .header("Authorization", "Basic abc")
            .body(())
            .unwrap()
            .into_parts();
        assert!(matches!(
            bearer_token(&parts),
            Err(ServiceError::Unauthorized(_))
        ));
    }
}
