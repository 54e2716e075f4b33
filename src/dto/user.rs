use crate::domain;
use chrono::{DateTime, Utc};
use derive_more::Display;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

/// DTO for registering a new user via the API. The Display implementation leaves out
/// the password so registration attempts can be logged.
#[derive(Deserialize, Display, Validate, ToSchema)]
#[display("{username}")]
#[cfg_attr(test, derive(Serialize))]
pub struct NewUser {
    #[validate(length(min = 3, max = 255))]
    #[schema(example = "alice")]
    pub username: String,
    #[schema(example = "correct horse battery staple")]
    pub password: String,
}

impl From<NewUser> for domain::user::CreateUser {
    fn from(value: NewUser) -> Self {
        domain::user::CreateUser {
            username: value.username,
            password: value.password,
        }
    }
}

/// DTO for a registered user on the API. Never carries password material.
#[derive(Serialize, ToSchema)]
#[cfg_attr(test, derive(Deserialize, PartialEq, Eq, Debug))]
pub struct UserResponse {
    #[schema(example = 4)]
    pub id: i32,
    #[schema(example = "alice")]
    pub username: String,
    pub created_at: DateTime<Utc>,
}

impl From<domain::user::User> for UserResponse {
    fn from(value: domain::user::User) -> Self {
        UserResponse {
            id: value.id,
            username: value.username,
            created_at: value.created_at,
        }
    }
}

/// DTO for the bearer token issued on a successful login
#[derive(Serialize, ToSchema)]
#[cfg_attr(test, derive(Deserialize, Debug))]
pub struct AccessToken {
    pub access_token: String,
    #[schema(example = "bearer")]
    pub token_type: String,
}

impl AccessToken {
    pub fn bearer(token: String) -> AccessToken {
        AccessToken {
            access_token: token,
            token_type: "bearer".to_owned(),
        }
    }
}

/// Query parameters accepted by the login endpoint
#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct LoginParams {
    pub username: String,
    pub password: String,
}
