use crate::api::ErrorResponse;
use crate::models::User;
use axum::{
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use seasonal_core::{Caller, SubscriptionTier};

/// The signed-in user, placed in request extensions by [`super::require_auth`].
#[derive(Debug, Clone)]
pub struct AuthUser(pub User);

impl AuthUser {
    /// Identity and tier as the generation pipeline sees them.
    pub fn caller(&self) -> Caller {
        Caller {
            user_id: self.0.id,
            tier: SubscriptionTier::parse(&self.0.subscription_tier)
                .unwrap_or(SubscriptionTier::Free),
        }
    }
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts.extensions.get::<AuthUser>().cloned().ok_or_else(|| {
            (
                StatusCode::UNAUTHORIZED,
                Json(ErrorResponse::new("Authentication required")),
            )
                .into_response()
        })
    }
}
