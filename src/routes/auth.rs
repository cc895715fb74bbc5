use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use validator::Validate;

use crate::{
    dto::auth_dto::{
        IdTokenPayload, MessageResponse, ProtectedResponse, SessionResponse, SessionUser,
        SignUpPayload,
    },
    error::{Error, Result},
    services::session::SessionClaims,
    AppState,
};

fn json_body<T>(payload: std::result::Result<Json<T>, JsonRejection>) -> Result<T> {
    payload
        .map(|Json(value)| value)
        .map_err(|rejection| Error::BadRequest(rejection.body_text()))
}

#[utoipa::path(
    post,
    path = "/api/auth/google-signin",
    request_body = IdTokenPayload,
    responses(
        (status = 200, description = "Session issued", body = SessionResponse),
        (status = 400, description = "idToken missing"),
        (status = 401, description = "Identity token rejected"),
    ),
    tag = "auth"
)]
#[axum::debug_handler]
pub async fn google_sign_in(
    State(state): State<AppState>,
    payload: std::result::Result<Json<IdTokenPayload>, JsonRejection>,
) -> Result<impl IntoResponse> {
    let payload = json_body(payload)?;
    payload.validate()?;
    let issued = state.auth_service.sign_in(&payload.id_token).await?;
    Ok(Json(SessionResponse::from(issued)))
}

#[utoipa::path(
    post,
    path = "/api/auth/email-password-signin",
    request_body = IdTokenPayload,
    responses(
        (status = 200, description = "Session issued", body = SessionResponse),
        (status = 400, description = "idToken missing"),
        (status = 401, description = "Identity token rejected"),
    ),
    tag = "auth"
)]
#[axum::debug_handler]
pub async fn email_password_sign_in(
    State(state): State<AppState>,
    payload: std::result::Result<Json<IdTokenPayload>, JsonRejection>,
) -> Result<impl IntoResponse> {
    let payload = json_body(payload)?;
    payload.validate()?;
    let issued = state.auth_service.sign_in(&payload.id_token).await?;
    Ok(Json(SessionResponse::from(issued)))
}

#[utoipa::path(
    post,
    path = "/api/auth/email-password-signup",
    request_body = SignUpPayload,
    responses(
        (status = 201, description = "Account created and session issued", body = SessionResponse),
        (status = 400, description = "Invalid payload"),
        (status = 409, description = "Email already in use"),
    ),
    tag = "auth"
)]
#[axum::debug_handler]
pub async fn email_password_sign_up(
    State(state): State<AppState>,
    payload: std::result::Result<Json<SignUpPayload>, JsonRejection>,
) -> Result<impl IntoResponse> {
    let payload = json_body(payload)?;
    let issued = state.auth_service.sign_up(&payload).await?;
    Ok((StatusCode::CREATED, Json(SessionResponse::from(issued))))
}

/// Sessions are stateless, so logging out only tells the client to drop
/// its token.
#[utoipa::path(
    post,
    path = "/api/auth/logout",
    responses(
        (status = 200, description = "Client should discard its session token", body = MessageResponse),
        (status = 401, description = "Missing or invalid session"),
    ),
    security(("bearer" = [])),
    tag = "auth"
)]
#[axum::debug_handler]
pub async fn logout(Extension(claims): Extension<SessionClaims>) -> Result<impl IntoResponse> {
    tracing::info!(uid = %claims.sub, "Logout requested");
    Ok(Json(MessageResponse {
        message: "Logged out. Discard the session token on the client.".to_string(),
    }))
}

#[utoipa::path(
    get,
    path = "/api/auth/protected",
    responses(
        (status = 200, description = "Admin session verified", body = ProtectedResponse),
        (status = 401, description = "Missing or invalid session"),
        (status = 403, description = "Admin role required"),
    ),
    security(("bearer" = [])),
    tag = "auth"
)]
#[axum::debug_handler]
pub async fn protected(Extension(claims): Extension<SessionClaims>) -> Result<impl IntoResponse> {
    Ok(Json(ProtectedResponse {
        message: "Access granted to admin data".to_string(),
        user: SessionUser::from(&claims),
    }))
}
