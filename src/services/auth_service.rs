//! Credential login with a single active session per account.
//!
//! Every login stores a fresh session id on the account and embeds it in the
//! signed token; a token is only accepted while its session id matches.

use std::{env, time::SystemTime};

use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    auth::{
        Actor,
        jwt::Claims,
        password::{hash_password, verify_password},
    },
    dao::models::{AccountEntity, Role},
    dto::{
        auth::{AccountSummary, LoginRequest, LoginResponse},
        validation::validate_username,
    },
    error::ServiceError,
    state::SharedState,
};

/// Environment variable holding `username:password` for the first MASTER account.
const BOOTSTRAP_ADMIN_ENV: &str = "CT_CONTEST_BOOTSTRAP_ADMIN";

const INVALID_CREDENTIALS: &str = "invalid username or password";

/// Resolve a bearer token into the [`Actor`] it belongs to.
pub async fn authenticate(state: &SharedState, token: &str) -> Result<Actor, ServiceError> {
    let claims = state
        .jwt()
        .verify(token)
        .map_err(|_| ServiceError::Unauthorized("invalid or expired token".into()))?;
    let account_id = claims
        .account_id()
        .ok_or_else(|| ServiceError::Unauthorized("malformed token subject".into()))?;

    let store = state.require_store().await?;
    let account = store
        .find_account(account_id)
        .await?
        .ok_or_else(|| ServiceError::Unauthorized("account no longer exists".into()))?;

    if account.session_token.as_deref() != Some(claims.sid.as_str()) {
        return Err(ServiceError::Unauthorized(
            "session was replaced by a newer login".into(),
        ));
    }

    Ok(Actor {
        account_id: account.id,
        username: account.username,
        role: account.role,
        team_id: account.team_id,
    })
}

/// Check credentials, replace the account's session and issue a token.
pub async fn login(
    state: &SharedState,
    request: LoginRequest,
) -> Result<LoginResponse, ServiceError> {
    let store = state.require_store().await?;
    let Some(account) = store.find_account_by_username(request.username).await? else {
        return Err(ServiceError::Unauthorized(INVALID_CREDENTIALS.into()));
    };

    let hash = account.password_hash.clone();
    let password = request.password;
    let valid = tokio::task::spawn_blocking(move || verify_password(&password, &hash))
        .await
        .map_err(|err| ServiceError::Internal(format!("password check panicked: {err}")))?;
    if !valid {
        warn!(username = %account.username, "rejected login attempt");
        return Err(ServiceError::Unauthorized(INVALID_CREDENTIALS.into()));
    }

    let sid = Uuid::new_v4().simple().to_string();
    store.set_session_token(account.id, Some(sid.clone())).await?;

    let claims = Claims::new(&account, sid, state.config().session_ttl, SystemTime::now());
    let token = state
        .jwt()
        .sign(&claims)
        .map_err(|err| ServiceError::Internal(format!("failed to sign token: {err}")))?;

    info!(account_id = %account.id, role = ?account.role, "account logged in");
    Ok(LoginResponse {
        token,
        account: account.into(),
    })
}

/// Revoke the caller's session; the current token stops working immediately.
pub async fn logout(state: &SharedState, actor: &Actor) -> Result<(), ServiceError> {
    let store = state.require_store().await?;
    store.set_session_token(actor.account_id, None).await?;
    info!(account_id = %actor.account_id, "account logged out");
    Ok(())
}

/// Account behind the current session.
pub async fn current_account(
    state: &SharedState,
    actor: &Actor,
) -> Result<AccountSummary, ServiceError> {
    let store = state.require_store().await?;
    store
        .find_account(actor.account_id)
        .await?
        .map(Into::into)
        .ok_or_else(|| ServiceError::NotFound(format!("account `{}`", actor.account_id)))
}

/// Parse `username:password` from [`BOOTSTRAP_ADMIN_ENV`].
pub fn bootstrap_credentials_from_env() -> Option<(String, String)> {
    let raw = env::var(BOOTSTRAP_ADMIN_ENV).ok()?;
    match raw.split_once(':') {
        Some((username, password)) if !username.is_empty() && !password.is_empty() => {
            Some((username.to_string(), password.to_string()))
        }
        _ => {
            warn!("{BOOTSTRAP_ADMIN_ENV} must look like `username:password`; ignoring it");
            None
        }
    }
}

/// Create a MASTER account when the store holds no account at all.
///
/// Returns `true` when an account was created.
pub async fn bootstrap_master(
    state: &SharedState,
    username: String,
    password: String,
) -> Result<bool, ServiceError> {
    validate_username(&username)
        .map_err(|err| ServiceError::InvalidInput(format!("bootstrap username: {err}")))?;

    let store = state.require_store().await?;
    if !store.list_accounts().await?.is_empty() {
        return Ok(false);
    }

    let password_hash = tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|err| ServiceError::Internal(format!("password hashing panicked: {err}")))??;

    let account = AccountEntity {
        id: Uuid::new_v4(),
        username,
        name: None,
        password_hash,
        role: Role::Master,
        team_id: None,
        session_token: None,
        created_at: SystemTime::now(),
    };
    store.insert_account(account.clone()).await?;
    info!(username = %account.username, "created bootstrap master account");
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        dao::contest_store::ContestStore,
        test_support::{memory_state, seed_account},
    };

    fn credentials(username: &str, password: &str) -> LoginRequest {
        LoginRequest {
            username: username.into(),
            password: password.into(),
        }
    }

    #[tokio::test]
    async fn login_issues_token_resolving_to_actor() {
        let (state, store) = memory_state().await;
        let account = seed_account(&store, "judge_1", "secret-pass", Role::Judge, None).await;

        let response = login(&state, credentials("judge_1", "secret-pass"))
            .await
            .unwrap();
        assert_eq!(response.account.id, account.id);

        let actor = authenticate(&state, &response.token).await.unwrap();
        assert_eq!(actor.account_id, account.id);
        assert_eq!(actor.role, Role::Judge);
    }

    #[tokio::test]
    async fn wrong_password_is_unauthorized() {
        let (state, store) = memory_state().await;
        seed_account(&store, "judge_1", "secret-pass", Role::Judge, None).await;

        let err = login(&state, credentials("judge_1", "wrong-pass"))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Unauthorized(_)));

        let err = login(&state, credentials("nobody", "secret-pass"))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn new_login_revokes_previous_token() {
        let (state, store) = memory_state().await;
        seed_account(&store, "admin_1", "secret-pass", Role::Admin, None).await;

        let first = login(&state, credentials("admin_1", "secret-pass"))
            .await
            .unwrap();
        let second = login(&state, credentials("admin_1", "secret-pass"))
            .await
            .unwrap();

        assert!(matches!(
            authenticate(&state, &first.token).await,
            Err(ServiceError::Unauthorized(_))
        ));
        assert!(authenticate(&state, &second.token).await.is_ok());
    }

    #[tokio::test]
    async fn logout_clears_session() {
        let (state, store) = memory_state().await;
        seed_account(&store, "admin_1", "secret-pass", Role::Admin, None).await;
        let response = login(&state, credentials("admin_1", "secret-pass"))
            .await
            .unwrap();
        let actor = authenticate(&state, &response.token).await.unwrap();

        logout(&state, &actor).await.unwrap();

        assert!(authenticate(&state, &response.token).await.is_err());
    }

    #[tokio::test]
    async fn garbage_token_is_rejected() {
        let (state, _store) = memory_state().await;
        assert!(matches!(
            authenticate(&state, "not.a.jwt").await,
            Err(ServiceError::Unauthorized(_))
        ));
    }

    #[tokio::test]
    async fn bootstrap_only_runs_on_empty_store() {
        let (state, store) = memory_state().await;

        assert!(
            bootstrap_master(&state, "root".into(), "root-password".into())
                .await
                .unwrap()
        );
        assert!(
            !bootstrap_master(&state, "other".into(), "other-password".into())
                .await
                .unwrap()
        );

        let accounts = store.list_accounts().await.unwrap();
        assert_eq!(accounts.len(), 1);
        assert_eq!(accounts[0].role, Role::Master);
    }
}
