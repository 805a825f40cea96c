use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use tower_sessions::Session;
use tracing::debug;

use crate::{auth::session, error::AppError};

/// Caller identity, resolved once per request from the session record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthContext(pub Option<i64>);

impl AuthContext {
    pub fn user_id(&self) -> Option<i64> {
        self.0
    }

    pub fn require(&self) -> Result<i64, AppError> {
        self.0.ok_or_else(AppError::not_logged_in)
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthContext
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        if let Some(ctx) = parts.extensions.get::<AuthContext>() {
            return Ok(*ctx);
        }

        let current = parts
            .extensions
            .get::<Session>()
            .cloned()
            .ok_or_else(|| AppError::Store(anyhow::anyhow!("session layer not installed")))?;
        let ctx = AuthContext(session::resolve(&current).await?);
        if ctx.0.is_none() {
            debug!("request without a live session");
        }
        parts.extensions.insert(ctx);
        Ok(ctx)
    }
}

/// Same as [`AuthContext`] but rejects with `401` when nobody is logged in.
pub struct AuthUser(pub i64);

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let ctx = AuthContext::from_request_parts(parts, state).await?;
        Ok(AuthUser(ctx.require()?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    #[test]
    fn require_maps_absence_to_unauthorized() {
        assert_eq!(AuthContext(Some(9)).require().unwrap(), 9);
        assert!(matches!(
            AuthContext(None).require(),
            Err(AppError::Unauthorized(_))
        ));
    }

    #[tokio::test]
    async fn cached_context_short_circuits() {
        let (mut parts, _) = Request::new(()).into_parts();
        parts.extensions.insert(AuthContext(Some(3)));
        let ctx = AuthContext::from_request_parts(&mut parts, &()).await.unwrap();
        assert_eq!(ctx.user_id(), Some(3));
    }

    #[tokio::test]
    async fn missing_session_layer_is_a_server_error() {
        let (mut parts, _) = Request::new(()).into_parts();
        let err = AuthContext::from_request_parts(&mut parts, &()).await.unwrap_err();
        assert!(matches!(err, AppError::Store(_)));
    }
}
