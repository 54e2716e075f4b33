use super::Count;
use crate::domain;
use crate::domain::user::User;
use crate::domain::user::driven_ports::HashedCredentials;
use crate::external_connections::{ConnectionHandle, ExternalConnectivity};
use anyhow::{Context, Error};
use chrono::{DateTime, Utc};
use sqlx::query_as;

/// Implements user detection against PostgreSQL
pub struct DbDetectUser {}

impl domain::user::driven_ports::DetectUser for DbDetectUser {
    async fn username_taken(
        &self,
        username: &str,
        ext_cxn: &mut impl ExternalConnectivity,
    ) -> Result<bool, Error> {
        let mut connection = ext_cxn.database_cxn().await.map_err(super::anyhowify)?;

        let users_with_name = query_as::<_, Count>(
            "SELECT count(*) AS count FROM todo_user tu WHERE tu.username = $1",
        )
        .bind(username)
        .fetch_one(connection.borrow_connection())
        .await
        .context("Detecting user via username")?;

        Ok(users_with_name.count() > 0)
    }
}

/// Implements user lookup against PostgreSQL
pub struct DbReadUsers {}

#[derive(sqlx::FromRow)]
struct TodoUserRow {
    id: i32,
    username: String,
    password_hash: String,
    created_at: DateTime<Utc>,
}

impl From<TodoUserRow> for User {
    fn from(value: TodoUserRow) -> Self {
        User {
            id: value.id,
            username: value.username,
            password_hash: value.password_hash,
            created_at: value.created_at,
        }
    }
}

impl domain::user::driven_ports::UserReader for DbReadUsers {
    async fn by_username(
        &self,
        username: &str,
        ext_cxn: &mut impl ExternalConnectivity,
    ) -> Result<Option<User>, Error> {
        let mut cxn_handle = ext_cxn.database_cxn().await.map_err(super::anyhowify)?;

        let user = query_as::<_, TodoUserRow>(
            "SELECT tu.id, tu.username, tu.password_hash, tu.created_at \
             FROM todo_user tu WHERE tu.username = $1",
        )
        .bind(username)
        .fetch_optional(cxn_handle.borrow_connection())
        .await
        .context("Fetching a user by username")?;

        Ok(user.map(User::from))
    }
}

/// Implements user creation against PostgreSQL
pub struct DbWriteUsers {}

impl domain::user::driven_ports::UserWriter for DbWriteUsers {
    async fn create_user(
        &self,
        credentials: HashedCredentials<'_>,
        ext_cxn: &mut impl ExternalConnectivity,
    ) -> Result<User, Error> {
        let mut cxn_handle = ext_cxn.database_cxn().await.map_err(super::anyhowify)?;

        let created_user = query_as::<_, TodoUserRow>(
            "INSERT INTO todo_user(username, password_hash) VALUES ($1, $2) \
             RETURNING id, username, password_hash, created_at",
        )
        .bind(credentials.username)
        .bind(credentials.password_hash)
        .fetch_one(cxn_handle.borrow_connection())
        .await
        .context("Inserting new user")?;

        Ok(User::from(created_user))
    }
}
