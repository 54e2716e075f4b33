use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{ErrorResponse, IntoResponse, Response};
use axum_macros::FromRequest;

use serde::Serialize;
use tracing::error;
use utoipa::ToResponse;

use crate::external_connections::{Transactable, TransactionHandle};
use validator::ValidationErrors;

/// Failure envelope rendered for every API error
#[derive(Serialize, Debug, ToResponse)]
#[cfg_attr(test, derive(serde::Deserialize))]
#[response(examples(
    ("Not Found" = (
        summary = "Entity could not be found (404)",
        value = json!({
            "success": false,
            "message": "Request failed",
            "error": "Todo item 42 does not exist"
        })
    )),

    ("Unauthorized" = (
        summary = "Credentials were missing or rejected (401)",
        value = json!({
            "success": false,
            "message": "Request failed",
            "error": "Could not validate credentials"
        })
    )),

    ("Internal Failure" = (
        summary = "Something unexpected went wrong inside the server (500)",
        value = json!({
            "success": false,
            "message": "Request failed",
            "error": "An internal error occurred"
        })
    )),

    ("Invalid Input" = (
        summary = "Invalid request data was passed (400)",
        value = json!({
            "success": false,
            "message": "Request failed",
            "error": "Submitted data was invalid: username: length"
        })
    ))
))]
pub struct BasicErrorResponse {
    pub success: bool,
    pub message: String,
    pub error: String,
}

impl BasicErrorResponse {
    fn new(cause: impl Into<String>) -> BasicErrorResponse {
        BasicErrorResponse {
            success: false,
            message: "Request failed".to_owned(),
            error: cause.into(),
        }
    }
}

/// API failures that map directly onto an HTTP status and a [BasicErrorResponse] body
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    Unauthorized(String),
    Forbidden(String),
    NotFound(String),
    Internal,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, cause) = match self {
            Self::BadRequest(cause) => (StatusCode::BAD_REQUEST, cause),
            Self::Unauthorized(cause) => (StatusCode::UNAUTHORIZED, cause),
            Self::Forbidden(cause) => (StatusCode::FORBIDDEN, cause),
            Self::NotFound(cause) => (StatusCode::NOT_FOUND, cause),
            Self::Internal => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "An internal error occurred".to_owned(),
            ),
        };

        (status, Json(BasicErrorResponse::new(cause))).into_response()
    }
}

/// Response type for unanticipated failures. Logs the full error chain, then renders
/// a 500 without leaking internal detail to the caller.
pub struct GenericErrorResponse(pub anyhow::Error);

impl IntoResponse for GenericErrorResponse {
    fn into_response(self) -> Response {
        error!("Unexpected error during request processing: {:#}", self.0);
        ApiError::Internal.into_response()
    }
}

/// Response type that wraps validation errors and turns them into [BasicErrorResponse]s
pub struct ValidationErrorResponse(ValidationErrors);

impl IntoResponse for ValidationErrorResponse {
    fn into_response(self) -> Response {
        ApiError::BadRequest(format!("Submitted data was invalid: {}", self.0)).into_response()
    }
}

impl From<ValidationErrors> for ValidationErrorResponse {
    fn from(value: ValidationErrors) -> Self {
        Self(value)
    }
}

/// Starts a database transaction against the given connectivity source, logging and
/// rendering a 500 if one could not be opened.
pub async fn begin_transaction<Cxn>(transactable_cxn: &Cxn) -> Result<Cxn::Handle, ErrorResponse>
where
    Cxn: Transactable,
{
    match transactable_cxn.start_transaction().await {
        Ok(txn) => Ok(txn),
        Err(txn_err) => {
            error!("Failed to open a database transaction: {txn_err}");
            Err(ApiError::Internal.into())
        }
    }
}

/// Commits a database transaction, logging and rendering a 500 if the commit fails.
/// Dropping the handle without calling this rolls the transaction back.
pub async fn commit_transaction(txn: impl TransactionHandle) -> Result<(), ErrorResponse> {
    match txn.commit().await {
        Ok(()) => Ok(()),
        Err(commit_err) => {
            error!("Failed to commit a database transaction: {commit_err}");
            Err(ApiError::Internal.into())
        }
    }
}

/// Wrapper for [axum::Json] which customizes the error response to use the API's
/// failure envelope
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(JsonErrorResponse))]
pub struct Json<T>(pub T);

impl<T: Serialize> IntoResponse for Json<T> {
    fn into_response(self) -> Response {
        axum::Json(self.0).into_response()
    }
}

/// Response type representing JSON parse errors
pub struct JsonErrorResponse {
    parse_problem: String,
}

impl From<JsonRejection> for JsonErrorResponse {
    fn from(value: JsonRejection) -> Self {
        JsonErrorResponse {
            parse_problem: value.body_text(),
        }
    }
}

impl IntoResponse for JsonErrorResponse {
    fn into_response(self) -> Response {
        ApiError::BadRequest(format!(
            "The request body contained malformed JSON: {}",
            self.parse_problem
        ))
        .into_response()
    }
}
