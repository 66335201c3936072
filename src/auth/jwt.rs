//! HS256 session tokens.

use std::{
    env,
    time::{Duration, SystemTime, UNIX_EPOCH},
};

use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

use crate::dao::models::{AccountEntity, Role};

/// Environment variable holding the signing secret.
const SECRET_ENV: &str = "CT_CONTEST_JWT_SECRET";

/// Claims carried by a session token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Account id.
    pub sub: String,
    pub username: String,
    pub role: Role,
    /// Session id; must match the account's active session token.
    pub sid: String,
    pub iat: u64,
    pub exp: u64,
}

impl Claims {
    /// Build claims for `account` valid for `ttl` starting at `now`.
    pub fn new(account: &AccountEntity, sid: String, ttl: Duration, now: SystemTime) -> Self {
        let iat = now
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();
        Self {
            sub: account.id.to_string(),
            username: account.username.clone(),
            role: account.role,
            sid,
            iat,
            exp: iat.saturating_add(ttl.as_secs()),
        }
    }

    pub fn account_id(&self) -> Option<Uuid> {
        Uuid::parse_str(&self.sub).ok()
    }
}

/// Signing and verification keys derived from one shared secret.
pub struct JwtKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl JwtKeys {
    pub fn from_secret(secret: &[u8]) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
        }
    }

    /// Read the secret from the environment, generating an ephemeral one when unset.
    pub fn from_env() -> Self {
        match env::var(SECRET_ENV) {
            Ok(secret) if !secret.is_empty() => Self::from_secret(secret.as_bytes()),
            _ => {
                warn!(
                    var = SECRET_ENV,
                    "no JWT secret configured; sessions will not survive a restart"
                );
                let mut secret = [0u8; 32];
                rand::rng().fill(&mut secret);
                Self::from_secret(&secret)
            }
        }
    }

    pub fn sign(&self, claims: &Claims) -> Result<String, jsonwebtoken::errors::Error> {
        encode(&Header::default(), claims, &self.encoding)
    }

    /// Verify signature and expiry, returning the embedded claims.
    pub fn verify(&self, token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
        decode::<Claims>(token, &self.decoding, &Validation::default()).map(|data| data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account() -> AccountEntity {
        AccountEntity {
            id: Uuid::new_v4(),
            username: "judge_1".into(),
            name: None,
            password_hash: String::new(),
            role: Role::Judge,
            team_id: None,
            session_token: None,
            created_at: SystemTime::now(),
        }
    }

    #[test]
    fn signed_token_round_trips_claims() {
        let keys = JwtKeys::from_secret(b"secret");
        let account = account();
        let claims = Claims::new(&account, "sid".into(), Duration::from_secs(60), SystemTime::now());

        let token = keys.sign(&claims).unwrap();
        let verified = keys.verify(&token).unwrap();
        assert_eq!(verified, claims);
        assert_eq!(verified.account_id(), Some(account.id));
    }

    #[test]
    fn token_from_other_secret_is_rejected() {
        let claims = Claims::new(&account(), "sid".into(), Duration::from_secs(60), SystemTime::now());
        let token = JwtKeys::from_secret(b"one").sign(&claims).unwrap();
        assert!(JwtKeys::from_secret(b"two").verify(&token).is_err());
    }

    #[test]
    fn expired_token_is_rejected() {
        let keys = JwtKeys::from_secret(b"secret");
        let issued = SystemTime::now() - Duration::from_secs(48 * 3600);
        let claims = Claims::new(&account(), "sid".into(), Duration::from_secs(3600), issued);
        let token = keys.sign(&claims).unwrap();
        assert!(keys.verify(&token).is_err());
    }
}
