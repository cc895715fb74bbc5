use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::Response,
};

use crate::error::{Error, Result};
use crate::models::role::Role;
use crate::services::session::{SessionClaims, SessionSigner};
use crate::AppState;

pub fn bearer_token(headers: &HeaderMap) -> Result<&str> {
    let header = headers
        .get(AUTHORIZATION)
        .ok_or_else(|| Error::Unauthorized("Missing authorization header".to_string()))?;
    let value = header
        .to_str()
        .map_err(|_| Error::Unauthorized("Malformed authorization header".to_string()))?;
    value
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| Error::Unauthorized("Unsupported authorization scheme".to_string()))
}

pub fn authenticate(sessions: &SessionSigner, headers: &HeaderMap) -> Result<SessionClaims> {
    sessions.verify(bearer_token(headers)?)
}

/// Passes iff the session holds at least one of `required`. An empty
/// `required` admits nobody.
pub fn authorize(
    sessions: &SessionSigner,
    headers: &HeaderMap,
    required: &[Role],
) -> Result<SessionClaims> {
    let claims = authenticate(sessions, headers)?;
    if !claims.has_any_role(required) {
        tracing::warn!(uid = %claims.sub, ?required, "Session lacks required role");
        return Err(Error::Forbidden(
            "You do not have the required permissions".to_string(),
        ));
    }
    Ok(claims)
}

pub async fn require_session(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response> {
    let claims = authenticate(&state.sessions, req.headers())?;
    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}

pub async fn require_admin(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response> {
    let claims = authorize(&state.sessions, req.headers(), &[Role::Admin])?;
    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::role::RoleSet;
    use crate::models::user::User;
    use axum::http::HeaderValue;
    use chrono::Utc;

    fn signer() -> SessionSigner {
        SessionSigner::new("middleware-secret-123")
    }

    fn headers_for(roles: RoleSet) -> HeaderMap {
        let now = Utc::now();
        let user = User {
            uid: "u1".into(),
            email: "u1@example.com".into(),
            name: None,
            roles,
            created_at: now,
            last_login_at: now,
        };
        let token = signer().issue(&user).unwrap().token;
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", token)).unwrap(),
        );
        headers
    }

    #[test]
    fn missing_or_foreign_scheme_is_unauthorized() {
        assert!(matches!(
            bearer_token(&HeaderMap::new()),
            Err(Error::Unauthorized(_))
        ));

        let mut basic = HeaderMap::new();
        basic.insert(AUTHORIZATION, HeaderValue::from_static("Basic dXNlcjpwYXNz"));
        assert!(matches!(bearer_token(&basic), Err(Error::Unauthorized(_))));
    }

    #[test]
    fn role_intersection_decides_authorization() {
        let user_headers = headers_for(RoleSet::initial());
        assert!(matches!(
            authorize(&signer(), &user_headers, &[Role::Admin]),
            Err(Error::Forbidden(_))
        ));
        assert!(authorize(&signer(), &user_headers, &[Role::User, Role::Admin]).is_ok());

        let admin_headers = headers_for(RoleSet::from_iter([Role::Admin]));
        assert!(authorize(&signer(), &admin_headers, &[Role::Admin]).is_ok());
        assert!(matches!(
            authorize(&signer(), &admin_headers, &[]),
            Err(Error::Forbidden(_))
        ));
    }
}
