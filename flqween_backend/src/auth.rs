//! Signed, expiring bearer tokens.
//!
//! Tokens are HS256 JWTs carrying the user id in `sub`. Nothing is persisted
//! server-side; a token stays valid until `exp`.

use crate::config::{AuthConfig, FlqweenPaths};
use crate::error::ServiceError;
use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

const SECRET_LEN: usize = 32;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Clone)]
pub struct TokenSigner {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl TokenSigner {
    pub fn new(secret: &[u8], ttl: Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            ttl,
        }
    }

    /// Builds the signer from startup configuration, generating and
    /// persisting a secret on first boot when none is configured.
    pub fn from_config(auth: &AuthConfig, paths: &FlqweenPaths) -> Result<Self> {
        let secret = match &auth.jwt_secret {
            Some(secret) => secret.as_bytes().to_vec(),
            None => load_or_generate_secret(&paths.jwt_secret_path)?,
        };
        Ok(Self::new(&secret, Duration::days(auth.token_ttl_days)))
    }

    pub fn issue(&self, user_id: &str) -> Result<String> {
        self.issue_at(user_id, Utc::now())
    }

    pub fn issue_at(&self, user_id: &str, issued_at: DateTime<Utc>) -> Result<String> {
        let claims = Claims {
            sub: user_id.to_string(),
            iat: issued_at.timestamp(),
            exp: (issued_at + self.ttl).timestamp(),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .context("failed to sign token")
    }

    /// Returns the user id embedded in a valid, unexpired token.
    pub fn verify(&self, token: &str) -> Result<String, ServiceError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        let data = decode::<Claims>(token, &self.decoding, &validation).map_err(|err| {
            tracing::debug!(error = %err, "rejected bearer token");
            ServiceError::Unauthorized("token invalid".into())
        })?;
        Ok(data.claims.sub)
    }
}

/// Loads the raw signing secret, or writes a fresh random one when the file
/// is missing or has the wrong length.
pub fn load_or_generate_secret(path: &Path) -> Result<Vec<u8>> {
    if path.exists() {
        let key = fs::read(path)
            .with_context(|| format!("failed to read signing secret {}", path.display()))?;
        if key.len() == SECRET_LEN {
            tracing::info!(path = %path.display(), "token signing secret loaded");
            return Ok(key);
        }
        tracing::warn!(len = key.len(), "signing secret has wrong size, regenerating");
    }

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create key directory {}", parent.display()))?;
    }
    let key: [u8; SECRET_LEN] = rand::rng().random();
    fs::write(path, key)
        .with_context(|| format!("failed to write signing secret {}", path.display()))?;
    tracing::info!(path = %path.display(), "token signing secret generated");
    Ok(key.to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn signer() -> TokenSigner {
        TokenSigner::new(b"test-secret-test-secret-test-sec", Duration::days(7))
    }

    #[test]
    fn issued_token_verifies_to_user_id() {
        let signer = signer();
        let token = signer.issue("user-1").unwrap();
        assert_eq!(signer.verify(&token).unwrap(), "user-1");
    }

    #[test]
    fn token_expires_after_seven_days() {
        let signer = signer();
        let stale = signer
            .issue_at("user-1", Utc::now() - Duration::days(8))
            .unwrap();
        assert!(matches!(
            signer.verify(&stale),
            Err(ServiceError::Unauthorized(_))
        ));

        let fresh = signer
            .issue_at("user-1", Utc::now() - Duration::days(6))
            .unwrap();
        assert!(signer.verify(&fresh).is_ok());
    }

    #[test]
    fn tampered_token_is_rejected() {
        let signer = signer();
        let mine = signer.issue("user-1").unwrap();
        let theirs = signer.issue("user-2").unwrap();

        let mine_parts: Vec<&str> = mine.split('.').collect();
        let theirs_parts: Vec<&str> = theirs.split('.').collect();
        let forged = format!("{}.{}.{}", mine_parts[0], theirs_parts[1], mine_parts[2]);

        assert!(signer.verify(&forged).is_err());
        assert!(signer.verify("not-a-token").is_err());
    }

    #[test]
    fn token_from_other_secret_is_rejected() {
        let other = TokenSigner::new(b"another-secret-another-secret-an", Duration::days(7));
        let token = other.issue("user-1").unwrap();
        assert!(signer().verify(&token).is_err());
    }

    #[test]
    fn generated_secret_is_persisted_and_reused() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("keys").join("jwt_secret");
        let first = load_or_generate_secret(&path).unwrap();
        assert_eq!(first.len(), SECRET_LEN);
        let second = load_or_generate_secret(&path).unwrap();
        assert_eq!(first, second);
    }
}
