use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{request::Parts, StatusCode},
};
use tracing::warn;
use uuid::Uuid;

use super::{claims::TokenKind, jwt::JwtKeys};

/// Resolves whose collection an operation applies to.
pub trait IdentityResolver: Send + Sync {
    fn current_user_id(&self) -> Option<Uuid>;
}

impl IdentityResolver for Option<Uuid> {
    fn current_user_id(&self) -> Option<Uuid> {
        *self
    }
}

/// Caller authenticated by a valid access token.
#[derive(Debug, Clone, Copy)]
pub struct AuthUser(pub Uuid);

impl IdentityResolver for AuthUser {
    fn current_user_id(&self) -> Option<Uuid> {
        Some(self.0)
    }
}

impl IdentityResolver for Option<AuthUser> {
    fn current_user_id(&self) -> Option<Uuid> {
        self.map(|u| u.0)
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    JwtKeys: FromRef<S>,
{
    type Rejection = (StatusCode, String);

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let keys = JwtKeys::from_ref(state);
        let auth_header = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or((
                StatusCode::UNAUTHORIZED,
                "Missing Authorization header".to_string(),
            ))?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .or_else(|| auth_header.strip_prefix("bearer "))
            .ok_or((
                StatusCode::UNAUTHORIZED,
                "Invalid Authorization header".to_string(),
            ))?;

        let claims = match keys.verify(token) {
            Ok(c) => c,
            Err(_) => {
                warn!("invalid or expired token");
                return Err((
                    StatusCode::UNAUTHORIZED,
                    "Invalid or expired token".to_string(),
                ));
            }
        };

        if claims.kind != TokenKind::Access {
            return Err((
                StatusCode::UNAUTHORIZED,
                "Access token required".to_string(),
            ));
        }

        Ok(AuthUser(claims.sub))
    }
}
