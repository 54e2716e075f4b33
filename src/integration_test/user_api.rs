use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use tower::ServiceExt;

use crate::api::test_util::deserialize_body;
use crate::dto::user::{AccessToken, NewUser, UserResponse};
use crate::dto::Envelope;
use crate::routing_utils::BasicErrorResponse;

use super::test_util;

fn registration_request(username: &str, password: &str) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri("/api/users")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(
            serde_json::to_string(&NewUser {
                username: username.to_owned(),
                password: password.to_owned(),
            })
            .expect("Could not serialize the registration payload"),
        ))
        .expect("Could not build the registration request")
}

fn login_request(username: &str, password: &str) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(format!("/api/token?username={username}&password={password}"))
        .body(Body::empty())
        .expect("Could not build the login request")
}

#[test]
#[cfg_attr(not(feature = "integration_test"), ignore)]
fn can_register_and_log_in() {
    test_util::prepare_db_and_test(|db| async move {
        let app = test_util::test_app(db);

        let register_response = app
            .clone()
            .oneshot(registration_request("alice", "password1"))
            .await
            .expect("Registration request did not complete");
        assert_eq!(StatusCode::CREATED, register_response.status());

        let register_envelope: Envelope<UserResponse> =
            deserialize_body(register_response.into_body()).await;
        assert!(register_envelope.success);
        let registered_user = register_envelope
            .data
            .expect("Registration should return the new user");
        assert_eq!("alice", registered_user.username);

        let login_response = app
            .clone()
            .oneshot(login_request("alice", "password1"))
            .await
            .expect("Login request did not complete");
        assert_eq!(StatusCode::OK, login_response.status());

        let login_envelope: Envelope<AccessToken> =
            deserialize_body(login_response.into_body()).await;
        let token = login_envelope.data.expect("Login should return a token");
        assert_eq!("bearer", token.token_type);
        assert!(!token.access_token.is_empty());
    });
}

#[test]
#[cfg_attr(not(feature = "integration_test"), ignore)]
fn duplicate_usernames_are_rejected() {
    test_util::prepare_db_and_test(|db| async move {
        let app = test_util::test_app(db);

        let first_response = app
            .clone()
            .oneshot(registration_request("alice", "password1"))
            .await
            .expect("Registration request did not complete");
        assert_eq!(StatusCode::CREATED, first_response.status());

        let second_response = app
            .clone()
            .oneshot(registration_request("alice", "different-password"))
            .await
            .expect("Second registration request did not complete");
        assert_eq!(StatusCode::BAD_REQUEST, second_response.status());

        let error_body: BasicErrorResponse =
            deserialize_body(second_response.into_body()).await;
        assert!(!error_body.success);
        assert_eq!("Username already exists", error_body.error);
    });
}

#[test]
#[cfg_attr(not(feature = "integration_test"), ignore)]
fn bad_credentials_are_rejected() {
    test_util::prepare_db_and_test(|db| async move {
        let app = test_util::test_app(db);

        let register_response = app
            .clone()
            .oneshot(registration_request("alice", "password1"))
            .await
            .expect("Registration request did not complete");
        assert_eq!(StatusCode::CREATED, register_response.status());

        let wrong_password_response = app
            .clone()
            .oneshot(login_request("alice", "not-the-password"))
            .await
            .expect("Login request did not complete");
        assert_eq!(StatusCode::UNAUTHORIZED, wrong_password_response.status());

        let error_body: BasicErrorResponse =
            deserialize_body(wrong_password_response.into_body()).await;
        assert_eq!("Incorrect username or password", error_body.error);

        let unknown_user_response = app
            .clone()
            .oneshot(login_request("nobody", "password1"))
            .await
            .expect("Login request did not complete");
        assert_eq!(StatusCode::UNAUTHORIZED, unknown_user_response.status());
    });
}
