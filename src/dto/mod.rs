use serde::Serialize;
use utoipa::OpenApi;

pub mod task;
pub mod user;

/// Wrapper applied to every successful API response body. Failed requests render
/// [crate::routing_utils::BasicErrorResponse] instead, which carries `success: false`
/// and the failure cause.
#[derive(Serialize)]
#[cfg_attr(test, derive(serde::Deserialize, Debug))]
pub struct Envelope<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T> Envelope<T> {
    /// Wraps a response payload in a success envelope with the given status message.
    pub fn ok(data: T, message: &str) -> Envelope<T> {
        Envelope {
            success: true,
            data: Some(data),
            message: Some(message.to_owned()),
        }
    }
}

/// Registers schemas for API DTOs in the OpenAPI documentation
#[derive(OpenApi)]
#[openapi(components(
    schemas(
        user::NewUser,
        user::UserResponse,
        user::AccessToken,
        task::NewTodo,
        task::UpdateTodo,
        task::TodoResponse,
        task::DeletedTodo,
    ),
    responses(crate::routing_utils::BasicErrorResponse)
))]
pub struct OpenApiSchemas;
