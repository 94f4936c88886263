//! Admin login

use axum::{extract::State, Json};
use tracing::{info, warn};
use validator::Validate;

use crate::auth::{authenticate_admin, sign_claims};
use crate::dto::auth::*;
use crate::error::ApiError;
use crate::AppState;

/// Exchanges the configured admin credentials for a Bearer token
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    request
        .validate()
        .map_err(|e| ApiError::Validation(e.to_string()))?;

    let claims = authenticate_admin(&state.config, &request.username, &request.password).map_err(|e| {
        warn!(username = %request.username, "Admin login rejected");
        ApiError::from(e)
    })?;
    let access_token = sign_claims(&claims, &state.config.jwt_secret)?;

    info!(user = %claims.sub, "Admin logged in");
    Ok(Json(TokenResponse {
        access_token,
        token_type: "Bearer",
        expires_in: state.config.jwt_expiration_secs,
    }))
}
