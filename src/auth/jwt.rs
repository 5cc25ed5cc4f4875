//! Admin session tokens and identity-provider token checks

use anyhow::{Context, Result as AnyResult};
use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::auth::password;
use crate::config::{AdminConfig, IdentityConfig};
use crate::{Error, Result};

pub const ADMIN_ROLE: &str = "admin";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminClaims {
    pub sub: String,
    pub role: String,
    pub exp: usize,
    pub iat: usize,
}

/// The subset of identity-provider claims the shop uses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomerClaims {
    pub sub: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub phone_number: Option<String>,
}

struct IdentityVerifier {
    key: DecodingKey,
    validation: Validation,
}

pub struct AuthKeys {
    admin_email: Option<String>,
    admin_password_hash: Option<String>,
    admin_encoding: EncodingKey,
    admin_decoding: DecodingKey,
    admin_ttl: chrono::Duration,
    identity: Option<IdentityVerifier>,
}

impl AuthKeys {
    pub fn new(admin: &AdminConfig, identity: &IdentityConfig) -> AnyResult<Self> {
        Ok(Self {
            admin_email: admin.email.clone(),
            admin_password_hash: admin.password_hash.clone(),
            admin_encoding: EncodingKey::from_secret(admin.jwt_secret.as_bytes()),
            admin_decoding: DecodingKey::from_secret(admin.jwt_secret.as_bytes()),
            admin_ttl: chrono::Duration::hours(admin.token_ttl_hours),
            identity: identity_verifier(identity)?,
        })
    }

    pub fn customer_accounts_enabled(&self) -> bool { self.identity.is_some() }

    pub fn admin_token_ttl(&self) -> chrono::Duration { self.admin_ttl }

    /// Checks the configured admin credentials and issues a session token.
    pub fn login(&self, email: &str, password: &str) -> Result<String> {
        let (Some(expected), Some(hash)) = (&self.admin_email, &self.admin_password_hash) else {
            tracing::warn!("admin login attempted but ADMIN_EMAIL / ADMIN_PASSWORD_HASH are not configured");
            return Err(Error::Unauthorized);
        };
        if !expected.eq_ignore_ascii_case(email.trim()) || !password::verify_password(password, hash) {
            tracing::info!(email = %email, "admin login rejected");
            return Err(Error::Unauthorized);
        }
        self.issue_admin_token(expected)
    }

    pub fn issue_admin_token(&self, subject: &str) -> Result<String> {
        let now = Utc::now();
        let claims = AdminClaims {
            sub: subject.to_string(),
            role: ADMIN_ROLE.to_string(),
            exp: (now + self.admin_ttl).timestamp() as usize,
            iat: now.timestamp() as usize,
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.admin_encoding)
            .map_err(|e| Error::Internal(format!("failed to encode admin token: {e}")))
    }

    pub fn verify_admin(&self, token: &str) -> Result<AdminClaims> {
        let data = decode::<AdminClaims>(token, &self.admin_decoding, &Validation::new(Algorithm::HS256))
            .map_err(|_| Error::Unauthorized)?;
        if data.claims.role != ADMIN_ROLE {
            return Err(Error::Forbidden);
        }
        Ok(data.claims)
    }

    pub fn verify_customer(&self, token: &str) -> Result<CustomerClaims> {
        let verifier = self.identity.as_ref().ok_or(Error::Unauthorized)?;
        decode::<CustomerClaims>(token, &verifier.key, &verifier.validation)
            .map(|data| data.claims)
            .map_err(|e| {
                tracing::debug!(error = %e, "identity token rejected");
                Error::Unauthorized
            })
    }
}

fn identity_verifier(config: &IdentityConfig) -> AnyResult<Option<IdentityVerifier>> {
    let (key, algorithm) = match (&config.public_key_pem, &config.jwt_secret) {
        (Some(pem), _) => (DecodingKey::from_rsa_pem(pem.as_bytes()).context("IDP_PUBLIC_KEY_PEM is not a valid RSA public key")?, Algorithm::RS256),
        (None, Some(secret)) => (DecodingKey::from_secret(secret.as_bytes()), Algorithm::HS256),
        (None, None) => return Ok(None),
    };
    let mut validation = Validation::new(algorithm);
    if let Some(issuer) = &config.issuer {
        validation.set_issuer(&[issuer]);
    }
    match &config.audience {
        Some(audience) => validation.set_audience(&[audience]),
        None => validation.validate_aud = false,
    }
    Ok(Some(IdentityVerifier { key, validation }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn admin_config() -> AdminConfig {
        AdminConfig {
            email: Some("owner@shop.test".into()),
            password_hash: Some(password::hash_password("letmein").unwrap()),
            jwt_secret: "admin-secret".into(),
            token_ttl_hours: 1,
        }
    }

    fn identity_config() -> IdentityConfig {
        IdentityConfig { jwt_secret: Some("idp-secret".into()), issuer: Some("https://id.shop.test".into()), ..Default::default() }
    }

    fn idp_token(secret: &str, iss: &str, offset_secs: i64) -> String {
        let claims = serde_json::json!({
            "sub": "user-42", "email": "amina@shop.test", "iss": iss,
            "exp": Utc::now().timestamp() + offset_secs,
        });
        encode(&Header::new(Algorithm::HS256), &claims, &EncodingKey::from_secret(secret.as_bytes())).unwrap()
    }

    #[test]
    fn test_admin_login() {
        let keys = AuthKeys::new(&admin_config(), &IdentityConfig::default()).unwrap();
        let token = keys.login(" Owner@Shop.test", "letmein").unwrap();
        let claims = keys.verify_admin(&token).unwrap();
        assert_eq!(claims.sub, "owner@shop.test");
        assert_eq!(claims.role, ADMIN_ROLE);

        assert!(matches!(keys.login("owner@shop.test", "wrong"), Err(Error::Unauthorized)));
        assert!(matches!(keys.login("other@shop.test", "letmein"), Err(Error::Unauthorized)));
        assert!(matches!(keys.verify_admin("garbage"), Err(Error::Unauthorized)));
    }

    #[test]
    fn test_login_without_credentials_configured() {
        let keys = AuthKeys::new(&AdminConfig { jwt_secret: "s".into(), token_ttl_hours: 1, ..Default::default() }, &IdentityConfig::default()).unwrap();
        assert!(matches!(keys.login("", ""), Err(Error::Unauthorized)));
    }

    #[test]
    fn test_customer_tokens() {
        let keys = AuthKeys::new(&admin_config(), &identity_config()).unwrap();
        assert!(keys.customer_accounts_enabled());

        let claims = keys.verify_customer(&idp_token("idp-secret", "https://id.shop.test", 600)).unwrap();
        assert_eq!(claims.sub, "user-42");
        assert_eq!(claims.email.as_deref(), Some("amina@shop.test"));

        assert!(keys.verify_customer(&idp_token("other", "https://id.shop.test", 600)).is_err());
        assert!(keys.verify_customer(&idp_token("idp-secret", "https://evil.test", 600)).is_err());
        assert!(keys.verify_customer(&idp_token("idp-secret", "https://id.shop.test", -600)).is_err());
        // Admin tokens are signed with a different key.
        assert!(keys.verify_customer(&keys.issue_admin_token("owner").unwrap()).is_err());
    }

    #[test]
    fn test_customer_accounts_disabled() {
        let keys = AuthKeys::new(&admin_config(), &IdentityConfig::default()).unwrap();
        assert!(!keys.customer_accounts_enabled());
        assert!(matches!(keys.verify_customer(&idp_token("idp-secret", "x", 600)), Err(Error::Unauthorized)));
    }

    #[test]
    fn test_bad_public_key_is_rejected() {
        let identity = IdentityConfig { public_key_pem: Some("not a pem".into()), ..Default::default() };
        assert!(AuthKeys::new(&admin_config(), &identity).is_err());
    }
}
