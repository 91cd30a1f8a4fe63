//! Bearer-token authentication.
//!
//! Tokens are HS256 JWTs signed with the shared `JWT_SECRET`. Handlers
//! declare their requirement through extractors: `Identity` for any
//! authenticated caller, `AdminIdentity` for admin-only routes, and
//! `OptionalIdentity` where anonymous access is allowed but authenticated
//! callers get extra behavior (activity recording).

use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use vitrine_core::models::UserRole;
use vitrine_core::AppError;

use crate::error::HttpAppError;
use crate::state::AppState;

/// JWT claims structure
#[derive(Debug, Serialize, Deserialize)]
pub struct JwtClaims {
    pub sub: Uuid,
    pub role: String,
    pub exp: i64,
    pub iat: i64,
}

/// Authenticated caller, extracted from the Authorization header.
#[derive(Debug, Clone, Copy)]
pub struct Identity {
    pub user_id: Uuid,
    pub role: UserRole,
}

/// Identity when present, `None` for anonymous requests. A present but
/// invalid token is still rejected; absence is the only anonymous case.
#[derive(Debug, Clone, Copy)]
pub struct OptionalIdentity(pub Option<Identity>);

/// Identity that must carry the admin role.
#[derive(Debug, Clone, Copy)]
pub struct AdminIdentity(pub Identity);

fn bearer_token(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get(axum::http::header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}

pub fn decode_token(secret: &str, token: &str) -> Result<JwtClaims, AppError> {
    let data = decode::<JwtClaims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::new(Algorithm::HS256),
    )
    .map_err(|e| AppError::Unauthorized(format!("Invalid token: {}", e)))?;
    Ok(data.claims)
}

fn identity_from_claims(claims: JwtClaims) -> Result<Identity, AppError> {
    let role = match claims.role.as_str() {
        "admin" => UserRole::Admin,
        "user" => UserRole::User,
        other => {
            return Err(AppError::Unauthorized(format!(
                "Unknown role in token: {}",
                other
            )))
        }
    };
    Ok(Identity {
        user_id: claims.sub,
        role,
    })
}

impl FromRequestParts<Arc<AppState>> for Identity {
    type Rejection = HttpAppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts).ok_or_else(|| {
            HttpAppError(AppError::Unauthorized(
                "Missing Authorization header".to_string(),
            ))
        })?;
        let claims = decode_token(&state.config.jwt_secret, token)?;
        Ok(identity_from_claims(claims)?)
    }
}

impl FromRequestParts<Arc<AppState>> for OptionalIdentity {
    type Rejection = HttpAppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        match bearer_token(parts) {
            None => Ok(OptionalIdentity(None)),
            Some(token) => {
                let claims = decode_token(&state.config.jwt_secret, token)?;
                Ok(OptionalIdentity(Some(identity_from_claims(claims)?)))
            }
        }
    }
}

impl FromRequestParts<Arc<AppState>> for AdminIdentity {
    type Rejection = HttpAppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let identity = Identity::from_request_parts(parts, state).await?;
        if !identity.role.is_admin() {
            return Err(HttpAppError(AppError::Forbidden(
                "Admin access required".to_string(),
            )));
        }
        Ok(AdminIdentity(identity))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};

    const SECRET: &str = "0123456789abcdef0123456789abcdef";

    fn make_token(role: &str, exp_offset_secs: i64) -> String {
        let now = chrono::Utc::now().timestamp();
        let claims = JwtClaims {
            sub: Uuid::new_v4(),
            role: role.to_string(),
            exp: now + exp_offset_secs,
            iat: now,
        };
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .expect("encode token")
    }

    #[test]
    fn test_decode_valid_token() {
        let token = make_token("admin", 3600);
        let claims = decode_token(SECRET, &token).expect("decode");
        assert_eq!(claims.role, "admin");
    }

    #[test]
    fn test_decode_rejects_wrong_secret() {
        let token = make_token("user", 3600);
        assert!(decode_token("another-secret-another-secret!!", &token).is_err());
    }

    #[test]
    fn test_decode_rejects_expired_token() {
        let token = make_token("user", -3600);
        assert!(decode_token(SECRET, &token).is_err());
    }

    #[test]
    fn test_identity_from_claims_maps_roles() {
        let now = chrono::Utc::now().timestamp();
        let claims = JwtClaims {
            sub: Uuid::new_v4(),
            role: "admin".to_string(),
            exp: now + 3600,
            iat: now,
        };
        let identity = identity_from_claims(claims).expect("identity");
        assert!(identity.role.is_admin());

        let claims = JwtClaims {
            sub: Uuid::new_v4(),
            role: "superuser".to_string(),
            exp: now + 3600,
            iat: now,
        };
        assert!(identity_from_claims(claims).is_err());
    }
}
