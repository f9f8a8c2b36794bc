use std::sync::Arc;

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use chrono::Utc;
use histoury_data_management::DataManagerError;
use histoury_lib::user::User;

use crate::{error::AppError, server_state::ServerState};

/// The user behind the request's bearer token.
pub struct CurrentUser(pub User);

impl FromRequestParts<Arc<ServerState>> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &Arc<ServerState>) -> Result<Self, Self::Rejection> {
        let token = parts.headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .ok_or(AppError::Unauthorized("Token is missing"))?;

        let claims = state.tokens.verify(token, Utc::now()).map_err(|err| {
            tracing::debug!("Rejected token: {err}");
            AppError::Unauthorized("Invalid token")
        })?;

        match state.data_manager.get_user(&claims.user_id).await {
            Ok(user) => Ok(CurrentUser(user)),
            Err(DataManagerError::NotFound(_)) => Err(AppError::Unauthorized("User not found")),
            Err(err) => Err(err.into()),
        }
    }
}
