//! Bearer-token middleware for the `/api` routes.
//!
//! The verified owner id is attached to the request as an [`Owner`] extension.

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::header::AUTHORIZATION;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;
use pitch_core::{bearer_token, AuthError};

use crate::http::{error_reply, HttpState};

/// Owner id of the authenticated caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Owner(pub String);

/// Rejection returned when a request cannot be authenticated.
#[derive(Debug)]
pub struct AuthRejection(pub AuthError);

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        let (status, body) = error_reply(self.0);
        (status, Json(body)).into_response()
    }
}

pub async fn require_owner(
    State(state): State<Arc<HttpState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, AuthRejection> {
    let header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok());
    let token = bearer_token(header).map_err(AuthRejection)?.to_string();

    let owner = state.identity.verify(&token).await.map_err(|e| {
        tracing::warn!(error = %e, path = %request.uri().path(), "Authentication failed");
        AuthRejection(e)
    })?;

    request.extensions_mut().insert(Owner(owner));
    Ok(next.run(request).await)
}
