use std::sync::Arc;

use axum::{
    extract::{Query, State},
    response::Redirect,
    Json,
};
use axum_extra::extract::Host;
use chrono::Utc;
use histoury_lib::user::User;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::{auth::CurrentUser, error::AppError, server_state::ServerState};

pub const CALLBACK_PATH: &str = "/auth/login/callback";

#[derive(Deserialize)]
pub struct CallbackParams {
    code: Option<String>,
    state: Option<String>,
    error: Option<String>,
}

pub async fn login(State(state): State<Arc<ServerState>>, Host(host): Host) -> Result<Redirect, AppError> {
    let redirect_uri = redirect_uri(&state, &host);
    let login_state = state.pending_logins.issue(Utc::now()).await;

    let url = state.identity.authorization_url(&redirect_uri, &login_state).await?;
    Ok(Redirect::temporary(&url))
}

pub async fn callback(State(state): State<Arc<ServerState>>, Host(host): Host, Query(params): Query<CallbackParams>) -> Redirect {
    let frontend = &state.config.frontend_url;

    match finish_login(&state, &host, params).await {
        Ok(token) => Redirect::temporary(&format!("{frontend}/auth/callback?token={token}")),
        Err(reason) => {
            tracing::warn!("Login failed: {reason}");
            Redirect::temporary(&format!("{frontend}/login?error=auth_failed"))
        }
    }
}

async fn finish_login(state: &ServerState, host: &str, params: CallbackParams) -> Result<String, String> {
    if let Some(error) = params.error {
        return Err(format!("provider returned {error}"));
    }

    let login_state = params.state.ok_or("missing state")?;
    if !state.pending_logins.consume(&login_state, Utc::now()).await {
        return Err("unknown or expired state".to_string());
    }

    let code = params.code.ok_or("missing code")?;
    let profile = state.identity
        .exchange_code(&code, &redirect_uri(state, host))
        .await
        .map_err(|err| err.to_string())?;

    let user = state.data_manager.upsert_user(&profile).await
        .map_err(|err| format!("{err:?}"))?;

    tracing::info!("User {} logged in", user.user_id);
    Ok(state.tokens.issue(&user, Utc::now()))
}

/// Must be identical for the authorization request and the code exchange.
fn redirect_uri(state: &ServerState, host: &str) -> String {
    match &state.config.public_url {
        Some(base) => format!("{base}{CALLBACK_PATH}"),
        None => {
            let scheme = if state.config.tls.is_some() { "https" } else { "http" };
            format!("{scheme}://{host}{CALLBACK_PATH}")
        }
    }
}

pub async fn current_user(CurrentUser(user): CurrentUser) -> Json<User> {
    Json(user)
}

pub async fn verify_token(CurrentUser(user): CurrentUser) -> Json<Value> {
    Json(json!({ "valid": true, "user": user }))
}

/// Tokens are not tracked server side, clients just drop theirs.
pub async fn logout() -> Json<Value> {
    Json(json!({ "message": "Logged out successfully" }))
}
