//! Request identity.
//!
//! The authenticated actor is resolved once at the boundary and passed
//! explicitly into lifecycle operations; nothing below the HTTP layer reads
//! session state.

use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts},
};
use std::future::Future;

use super::session::Sessions;
use crate::error::PlanholdError;
use crate::store::Role;

/// The authenticated identity performing an action.
#[derive(Debug, Clone)]
pub struct Actor {
    pub id: i64,
    pub name: String,
    pub role: Role,
}

impl Actor {
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// Axum extractor requiring an authenticated actor.
///
/// Rejects with 401 "Login required" when the session cookie is missing,
/// unknown, or expired. Carries the session id so logout can revoke it.
pub struct CurrentActor {
    pub actor: Actor,
    pub session_id: String,
}

fn session_id_from_cookies(parts: &Parts, cookie_name: &str) -> Option<String> {
    let header = parts.headers.get(header::COOKIE)?.to_str().ok()?;
    for raw in header.split(';') {
        if let Ok(parsed) = cookie::Cookie::parse(raw.trim()) {
            if parsed.name() == cookie_name {
                return Some(parsed.value().to_string());
            }
        }
    }
    None
}

async fn resolve_actor(parts: &mut Parts) -> Result<CurrentActor, PlanholdError> {
    let sessions = parts
        .extensions
        .get::<Sessions>()
        .ok_or_else(|| PlanholdError::internal("Session manager not found in request extensions"))?
        .clone();

    let session_id = session_id_from_cookies(parts, &sessions.config().cookie_name)
        .ok_or_else(|| PlanholdError::unauthorized("Login required"))?;

    let data = sessions
        .resolve(&session_id)
        .await?
        .ok_or_else(|| PlanholdError::unauthorized("Login required"))?;

    Ok(CurrentActor {
        actor: Actor {
            id: data.user_id,
            name: data.name,
            role: data.role,
        },
        session_id,
    })
}

impl<S> FromRequestParts<S> for CurrentActor
where
    S: Send + Sync,
{
    type Rejection = PlanholdError;

    fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> impl Future<Output = Result<Self, Self::Rejection>> + Send {
        Box::pin(async move { resolve_actor(parts).await })
    }
}

/// Axum extractor requiring an authenticated admin.
///
/// Rejects with 401 when unauthenticated and 403 for non-admin actors.
pub struct RequireAdmin(pub Actor);

impl<S> FromRequestParts<S> for RequireAdmin
where
    S: Send + Sync,
{
    type Rejection = PlanholdError;

    fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> impl Future<Output = Result<Self, Self::Rejection>> + Send {
        Box::pin(async move {
            let current = resolve_actor(parts).await?;
            if !current.actor.is_admin() {
                return Err(PlanholdError::forbidden("Admins only"));
            }
            Ok(RequireAdmin(current.actor))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_actor_is_admin() {
        let admin = Actor {
            id: 1,
            name: "Root".to_string(),
            role: Role::Admin,
        };
        let user = Actor {
            id: 2,
            name: "Ada".to_string(),
            role: Role::User,
        };
        assert!(admin.is_admin());
        assert!(!user.is_admin());
    }

    #[test]
    fn test_session_id_from_cookies() {
        let request = axum::http::Request::builder()
            .header(
                header::COOKIE,
                "other=1; planhold_session=abc-123; theme=dark",
            )
            .body(())
            .unwrap();
        let (parts, ()) = request.into_parts();

        assert_eq!(
            session_id_from_cookies(&parts, "planhold_session"),
            Some("abc-123".to_string())
        );
        assert_eq!(session_id_from_cookies(&parts, "missing"), None);
    }

    #[test]
    fn test_session_id_absent_without_cookie_header() {
        let request = axum::http::Request::builder().body(()).unwrap();
        let (parts, ()) = request.into_parts();
        assert_eq!(session_id_from_cookies(&parts, "planhold_session"), None);
    }
}
