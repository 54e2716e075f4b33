use crate::auth;
use crate::domain::user::driven_ports::{DetectUser, UserReader, UserWriter};
use crate::domain::user::driving_ports::{AuthenticateError, CreateUserError};
use crate::external_connections::ExternalConnectivity;
use anyhow::Context;
use chrono::{DateTime, Utc};

/// A registered account. The password hash stays inside the domain and persistence
/// layers and is never handed to the API surface.
#[derive(PartialEq, Eq, Debug)]
#[cfg_attr(test, derive(Clone))]
pub struct User {
    pub id: i32,
    pub username: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

/// Data required to register a new account. The password is still plaintext here;
/// [UserService] hashes it before anything is persisted.
#[cfg_attr(test, derive(Clone))]
pub struct CreateUser {
    pub username: String,
    pub password: String,
}

pub mod driven_ports {
    use super::*;
    use crate::external_connections::ExternalConnectivity;

    /// Borrowed credential pair persisted for a new account. The password has already
    /// been hashed by the time it reaches a driven port.
    pub struct HashedCredentials<'cred> {
        pub username: &'cred str,
        pub password_hash: &'cred str,
    }

    pub trait UserReader {
        async fn by_username(
            &self,
            username: &str,
            ext_cxn: &mut impl ExternalConnectivity,
        ) -> Result<Option<User>, anyhow::Error>;
    }

    pub trait UserWriter {
        async fn create_user(
            &self,
            credentials: HashedCredentials<'_>,
            ext_cxn: &mut impl ExternalConnectivity,
        ) -> Result<User, anyhow::Error>;
    }

    pub trait DetectUser {
        async fn username_taken(
            &self,
            username: &str,
            ext_cxn: &mut impl ExternalConnectivity,
        ) -> Result<bool, anyhow::Error>;
    }
}

pub mod driving_ports {
    use super::*;
    use crate::external_connections::ExternalConnectivity;
    use thiserror::Error;

    #[derive(Debug, Error)]
    pub enum CreateUserError {
        #[error("A user with that username already exists.")]
        UsernameTaken,
        #[error(transparent)]
        PortError(#[from] anyhow::Error),
    }

    #[derive(Debug, Error)]
    pub enum AuthenticateError {
        /// An unknown username and a wrong password both land here so login failures
        /// are indistinguishable to callers
        #[error("The username or password was incorrect.")]
        BadCredentials,
        #[error(transparent)]
        PortError(#[from] anyhow::Error),
    }


    pub trait UserPort {
        async fn register(
            &self,
            new_user: &CreateUser,
            ext_cxn: &mut impl ExternalConnectivity,
            u_detect: &impl driven_ports::DetectUser,
            u_write: &impl driven_ports::UserWriter,
        ) -> Result<User, CreateUserError>;

        async fn authenticate(
            &self,
            username: &str,
            password: &str,
            ext_cxn: &mut impl ExternalConnectivity,
            u_read: &impl driven_ports::UserReader,
        ) -> Result<User, AuthenticateError>;
    }
}

pub struct UserService {}

impl driving_ports::UserPort for UserService {
    async fn register(
        &self,
        new_user: &CreateUser,
        ext_cxn: &mut impl ExternalConnectivity,
        u_detect: &impl DetectUser,
        u_write: &impl UserWriter,
    ) -> Result<User, CreateUserError> {
        let name_taken = u_detect
            .username_taken(&new_user.username, &mut *ext_cxn)
            .await
            .context("Checking username availability during registration")?;
        if name_taken {
            return Err(CreateUserError::UsernameTaken);
        }

        let password_hash = auth::password::hash_password(&new_user.password)
            .context("Hashing a new user's password")?;
        let saved_user = u_write
            .create_user(
                driven_ports::HashedCredentials {
                    username: &new_user.username,
                    password_hash: &password_hash,
                },
                &mut *ext_cxn,
            )
            .await
            .context("Persisting a newly registered user")?;

        Ok(saved_user)
    }

    async fn authenticate(
        &self,
        username: &str,
        password: &str,
        ext_cxn: &mut impl ExternalConnectivity,
        u_read: &impl UserReader,
    ) -> Result<User, AuthenticateError> {
        let matching_user = u_read
            .by_username(username, &mut *ext_cxn)
            .await
            .context("Looking up a user at login")?;
        let Some(user) = matching_user else {
            return Err(AuthenticateError::BadCredentials);
        };

        let password_matches = auth::password::verify_password(password, &user.password_hash)
            .context("Verifying login credentials")?;
        if !password_matches {
            return Err(AuthenticateError::BadCredentials);
        }

        Ok(user)
    }
}
