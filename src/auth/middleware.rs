use crate::auth::token::{Payload, TokenError, TokenMaker};
use axum::{
    extract::{FromRequestParts, Request},
    http::{header, request::Parts, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;
use tracing::{debug, warn};

/// The only authorization scheme this service accepts.
pub const AUTHORIZATION_TYPE_BEARER: &str = "Bearer";

/// Why a request was turned away before reaching a handler.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("authorization header is not provided")]
    MissingCredential,

    #[error("{0}")]
    MalformedCredential(String),

    #[error(transparent)]
    Unauthorized(#[from] TokenError),
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let body = serde_json::json!({ "error": self.to_string() });
        (StatusCode::UNAUTHORIZED, Json(body)).into_response()
    }
}

/// Identity established for one request.
///
/// Inserted into the request extensions by [`auth_middleware`] and pulled
/// out by handlers as an extractor.
#[derive(Debug, Clone)]
pub struct AuthContext {
    payload: Payload,
}

impl AuthContext {
    pub fn new(payload: Payload) -> Self {
        Self { payload }
    }

    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    /// Shorthand for the authenticated username.
    pub fn username(&self) -> &str {
        self.payload.username()
    }
}

/// Resolves an `Authorization` header value to an authenticated identity.
///
/// Pure and synchronous: no I/O, no store access. Every path other than a
/// well-formed `Bearer <token>` whose token verifies ends in an error.
pub fn authorize(header: Option<&str>, maker: &dyn TokenMaker) -> Result<AuthContext, AuthError> {
    let header = header.ok_or(AuthError::MissingCredential)?;

    let fields: Vec<&str> = header.split_whitespace().collect();
    let [scheme, token] = fields.as_slice() else {
        return Err(AuthError::MalformedCredential(
            "invalid authorization header format".to_string(),
        ));
    };

    if *scheme != AUTHORIZATION_TYPE_BEARER {
        return Err(AuthError::MalformedCredential(format!(
            "unsupported authorization type {}",
            scheme
        )));
    }

    match maker.verify_token(token) {
        Ok(payload) => {
            debug!(username = payload.username(), "request authenticated");
            Ok(AuthContext::new(payload))
        }
        Err(TokenError::Expired) => {
            warn!("rejected expired token");
            Err(AuthError::Unauthorized(TokenError::Expired))
        }
        Err(err) => {
            warn!(reason = %err, "rejected invalid token");
            Err(AuthError::Unauthorized(TokenError::Invalid))
        }
    }
}

/// Axum middleware guarding protected routes.
///
/// On success the [`AuthContext`] is attached to the request extensions;
/// on failure the request is answered with 401 and never reaches the
/// inner service.
pub async fn auth_middleware(
    token_maker: Arc<dyn TokenMaker>,
    mut req: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let header = match req.headers().get(header::AUTHORIZATION) {
        Some(value) => Some(value.to_str().map_err(|_| {
            AuthError::MalformedCredential("invalid authorization header format".to_string())
        })?),
        None => None,
    };

    let context = authorize(header, token_maker.as_ref())?;
    req.extensions_mut().insert(context);

    Ok(next.run(req).await)
}

impl<S> FromRequestParts<S> for AuthContext
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthContext>()
            .cloned()
            .ok_or(AuthError::MissingCredential)
    }
}
