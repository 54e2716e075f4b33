pub mod jwt;
pub mod password;

use crate::domain::user::driven_ports::UserReader;
use crate::external_connections::ExternalConnectivity;
use crate::routing_utils::ApiError;
use crate::{SharedData, persistence};
use anyhow::Context;
use axum::extract::{Request, State};
use axum::http::{HeaderMap, header};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use derive_more::Display;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error};

/// The identity a bearer token resolved to. Inserted into request extensions by
/// [require_bearer_user] so handlers behind the gate can read who is calling.
#[derive(Clone, Debug, Display)]
#[display("{username} (user {id})")]
pub struct AuthenticatedUser {
    pub id: i32,
    pub username: String,
}

/// Ways a request can fail to get through the authentication gate
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("authorization header was missing or not a bearer token")]
    MissingCredentials,

    #[error("the bearer token was not accepted")]
    BadToken,

    #[error("the token's subject is not a known user")]
    UnknownSubject,

    #[error(transparent)]
    LookupFailure(#[from] anyhow::Error),
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        match self {
            AuthError::LookupFailure(lookup_err) => {
                error!("Failed to resolve the user behind a bearer token: {lookup_err}");
                ApiError::Internal.into_response()
            }

            rejection => {
                debug!("Rejected request credentials: {rejection}");
                ApiError::Unauthorized("Could not validate credentials".to_owned()).into_response()
            }
        }
    }
}

/// Middleware guarding the task routes. Requests must carry a verifiable bearer token
/// whose subject is a registered user, otherwise they are turned away with a 401 before
/// reaching a handler.
pub async fn require_bearer_user(
    State(app_state): State<Arc<SharedData>>,
    mut request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let bearer_token = extract_bearer_token(request.headers())?;

    let mut ext_cxn = app_state.ext_cxn.clone();
    let user_reader = persistence::db_user_driven_ports::DbReadUsers {};
    let current_user =
        resolve_bearer_user(bearer_token, &app_state.tokens, &mut ext_cxn, &user_reader).await?;

    request.extensions_mut().insert(current_user);
    Ok(next.run(request).await)
}

/// Pulls the token out of an `Authorization: Bearer <token>` header
fn extract_bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let auth_header = headers
        .get(header::AUTHORIZATION)
        .ok_or(AuthError::MissingCredentials)?;
    let header_text = auth_header
        .to_str()
        .map_err(|_| AuthError::MissingCredentials)?;

    header_text
        .strip_prefix("Bearer ")
        .ok_or(AuthError::MissingCredentials)
}

/// Verifies a bearer token and resolves its subject to a live user account
async fn resolve_bearer_user(
    token: &str,
    tokens: &jwt::TokenAuthority,
    ext_cxn: &mut impl ExternalConnectivity,
    user_read: &impl UserReader,
) -> Result<AuthenticatedUser, AuthError> {
    let claims = tokens.verify(token).map_err(|_| AuthError::BadToken)?;

    let matching_user = user_read
        .by_username(&claims.sub, ext_cxn)
        .await
        .context("Resolving a token subject to a user")?;
    let Some(user) = matching_user else {
        return Err(AuthError::UnknownSubject);
    };

    Ok(AuthenticatedUser {
        id: user.id,
        username: user.username,
    })
}
