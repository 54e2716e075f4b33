use crate::auth::jwt::TokenAuthority;
use crate::domain::user::driving_ports::{AuthenticateError, CreateUserError, UserPort};
use crate::dto::user::{AccessToken, LoginParams, NewUser, UserResponse};
use crate::dto::Envelope;
use crate::external_connections::{ExternalConnectivity, Transactable};
use crate::routing_utils::{
    begin_transaction, commit_transaction, ApiError, BasicErrorResponse, GenericErrorResponse,
    Json, ValidationErrorResponse,
};
use crate::{domain, persistence, AppState, SharedData};
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::ErrorResponse;
use axum::routing::post;
use axum::Router;
use std::sync::Arc;
use tracing::info;
use utoipa::OpenApi;
use validator::Validate;

/// Builds a router for user registration and login
pub fn user_routes() -> Router<Arc<SharedData>> {
    Router::new()
        .route(
            "/users",
            post(
                |State(app_data): AppState, Json(new_user): Json<NewUser>| async move {
                    let user_service = domain::user::UserService {};

                    register_user(new_user, &app_data.ext_cxn, &user_service).await
                },
            ),
        )
        .route(
            "/token",
            post(
                |State(app_data): AppState, Query(credentials): Query<LoginParams>| async move {
                    let mut ext_cxn = app_data.ext_cxn.clone();
                    let user_service = domain::user::UserService {};

                    log_in(credentials, &mut ext_cxn, &user_service, &app_data.tokens).await
                },
            ),
        )
}

/// OpenAPI definitions for user registration and login
#[derive(OpenApi)]
#[openapi(paths(register_user, log_in))]
pub struct UsersApi;

/// Registers a new user account.
#[utoipa::path(
    post,
    path = "/api/users",
    tag = "users",
    request_body = NewUser,
    responses(
        (status = 201, description = "User registered successfully", body = UserResponse),
        (status = 400, response = BasicErrorResponse),
        (status = 500, response = BasicErrorResponse),
    ),
)]
async fn register_user(
    new_user: NewUser,
    ext_cxn: &impl Transactable,
    user_service: &impl UserPort,
) -> Result<(StatusCode, Json<Envelope<UserResponse>>), ErrorResponse> {
    info!("Attempt to register user: {new_user}");
    new_user.validate().map_err(ValidationErrorResponse::from)?;

    let mut txn = begin_transaction(ext_cxn).await?;
    let user_detect = persistence::db_user_driven_ports::DbDetectUser {};
    let user_write = persistence::db_user_driven_ports::DbWriteUsers {};

    let domain_user = domain::user::CreateUser::from(new_user);
    let registration_result = user_service
        .register(&domain_user, &mut txn, &user_detect, &user_write)
        .await;
    let registered_user = match registration_result {
        Ok(user) => user,
        Err(CreateUserError::UsernameTaken) => {
            return Err(ApiError::BadRequest("Username already exists".to_owned()).into());
        }
        Err(CreateUserError::PortError(port_err)) => {
            return Err(GenericErrorResponse(port_err).into());
        }
    };
    commit_transaction(txn).await?;

    Ok((
        StatusCode::CREATED,
        Json(Envelope::ok(
            UserResponse::from(registered_user),
            "User registered successfully",
        )),
    ))
}

/// Exchanges a username and password for a bearer token.
#[utoipa::path(
    post,
    path = "/api/token",
    tag = "users",
    params(LoginParams),
    responses(
        (status = 200, description = "Login successful", body = AccessToken),
        (status = 401, response = BasicErrorResponse),
        (status = 500, response = BasicErrorResponse),
    ),
)]
async fn log_in(
    credentials: LoginParams,
    ext_cxn: &mut impl ExternalConnectivity,
    user_service: &impl UserPort,
    tokens: &TokenAuthority,
) -> Result<Json<Envelope<AccessToken>>, ErrorResponse> {
    info!("Login attempt for user {}", credentials.username);
    let user_read = persistence::db_user_driven_ports::DbReadUsers {};

    let login_result = user_service
        .authenticate(
            &credentials.username,
            &credentials.password,
            &mut *ext_cxn,
            &user_read,
        )
        .await;
    let user = match login_result {
        Ok(user) => user,
        Err(AuthenticateError::BadCredentials) => {
            return Err(
                ApiError::Unauthorized("Incorrect username or password".to_owned()).into(),
            );
        }
        Err(AuthenticateError::PortError(port_err)) => {
            return Err(GenericErrorResponse(port_err).into());
        }
    };

    let signed_token = tokens
        .issue(&user.username)
        .map_err(|token_err| GenericErrorResponse(token_err.into()))?;

    Ok(Json(Envelope::ok(
        AccessToken::bearer(signed_token),
        "Login successful",
    )))
}
