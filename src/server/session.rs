use super::state::ServerState;
use crate::user::{AuthTokenValue, Role};

use axum::{
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
    response::IntoResponse,
};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use tracing::debug;

#[derive(Debug)]
pub struct Session {
    pub email: String,
    pub role: Role,
    pub token: String,
}

pub const COOKIE_SESSION_TOKEN_KEY: &str = "session_token";
pub const HEADER_SESSION_TOKEN_KEY: &str = "Authorization";

pub enum SessionExtractionError {
    Unauthenticated,
    WrongRole,
}

impl IntoResponse for SessionExtractionError {
    fn into_response(self) -> axum::response::Response {
        match self {
            SessionExtractionError::Unauthenticated => StatusCode::UNAUTHORIZED.into_response(),
            SessionExtractionError::WrongRole => StatusCode::FORBIDDEN.into_response(),
        }
    }
}

async fn extract_session_token_from_cookies(
    parts: &mut Parts,
    ctx: &ServerState,
) -> Option<String> {
    CookieJar::from_request_parts(parts, &ctx)
        .await
        .expect("Could not read cookies into CookieJar.")
        .get(COOKIE_SESSION_TOKEN_KEY)
        .map(Cookie::value)
        .map(|s| s.to_string())
}

fn extract_session_token_from_headers(parts: &mut Parts) -> Option<String> {
    parts
        .headers
        .get(HEADER_SESSION_TOKEN_KEY)
        .map(|v| v.as_bytes().to_owned())
        .map(|b| String::from_utf8_lossy(&b).into_owned())
}

async fn extract_session_from_request_parts(
    parts: &mut Parts,
    ctx: &ServerState,
) -> Option<Session> {
    debug!("extracting session from request parts...");
    let token = match extract_session_token_from_cookies(parts, ctx)
        .await
        .or_else(|| extract_session_token_from_headers(parts))
    {
        None => {
            debug!("No token in cookies nor headers.");
            return None;
        }
        Some(x) => x,
    };

    debug!("Got session token {}", token);
    let user_manager = ctx.user_manager.lock().unwrap();
    let auth_token_value = AuthTokenValue(token.clone());
    let user = match user_manager.resolve_session(&auth_token_value, ctx.config.session_ttl_days) {
        Ok(Some(user)) => {
            debug!("Resolved session for {}", user.email);
            user
        }
        Ok(None) => {
            debug!("Session token not valid");
            return None;
        }
        Err(e) => {
            debug!("Failed to resolve session token: {}", e);
            return None;
        }
    };

    Some(Session {
        email: user.email,
        role: user.role,
        token,
    })
}

impl FromRequestParts<ServerState> for Session {
    type Rejection = SessionExtractionError;

    async fn from_request_parts(
        parts: &mut Parts,
        ctx: &ServerState,
    ) -> Result<Self, Self::Rejection> {
        extract_session_from_request_parts(parts, ctx)
            .await
            .ok_or(SessionExtractionError::Unauthenticated)
    }
}

impl FromRequestParts<ServerState> for Option<Session> {
    type Rejection = SessionExtractionError;

    async fn from_request_parts(
        parts: &mut Parts,
        ctx: &ServerState,
    ) -> Result<Self, Self::Rejection> {
        Ok(extract_session_from_request_parts(parts, ctx).await)
    }
}

/// Session that is only granted to admin accounts.
pub struct AdminSession(pub Session);

impl FromRequestParts<ServerState> for AdminSession {
    type Rejection = SessionExtractionError;

    async fn from_request_parts(
        parts: &mut Parts,
        ctx: &ServerState,
    ) -> Result<Self, Self::Rejection> {
        let session = Session::from_request_parts(parts, ctx).await?;
        match session.role {
            Role::Admin => Ok(AdminSession(session)),
            Role::Influencer | Role::Collaborator => Err(SessionExtractionError::WrongRole),
        }
    }
}

/// Session that is only granted to influencer accounts.
pub struct InfluencerSession(pub Session);

impl FromRequestParts<ServerState> for InfluencerSession {
    type Rejection = SessionExtractionError;

    async fn from_request_parts(
        parts: &mut Parts,
        ctx: &ServerState,
    ) -> Result<Self, Self::Rejection> {
        let session = Session::from_request_parts(parts, ctx).await?;
        match session.role {
            Role::Influencer => Ok(InfluencerSession(session)),
            Role::Admin | Role::Collaborator => Err(SessionExtractionError::WrongRole),
        }
    }
}

/// Session that is only granted to collaborator accounts.
pub struct CollaboratorSession(pub Session);

impl FromRequestParts<ServerState> for CollaboratorSession {
    type Rejection = SessionExtractionError;

    async fn from_request_parts(
        parts: &mut Parts,
        ctx: &ServerState,
    ) -> Result<Self, Self::Rejection> {
        let session = Session::from_request_parts(parts, ctx).await?;
        match session.role {
            Role::Collaborator => Ok(CollaboratorSession(session)),
            Role::Admin | Role::Influencer => Err(SessionExtractionError::WrongRole),
        }
    }
}
