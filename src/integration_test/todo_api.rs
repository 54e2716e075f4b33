use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use chrono::NaiveDate;
use tower::ServiceExt;

use crate::api::test_util::deserialize_body;
use crate::dto::task::{DeletedTodo, NewTodo, TodoResponse, UpdateTodo};
use crate::dto::user::{AccessToken, NewUser};
use crate::dto::Envelope;
use crate::routing_utils::BasicErrorResponse;

use super::test_util;

/// Registers the given user and returns a bearer token for them
async fn register_and_log_in(app: &Router, username: &str) -> String {
    let register_response = app
        .clone()
        .oneshot(
            Request::builder()
                .method(Method::POST)
                .uri("/api/users")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(
                    serde_json::to_string(&NewUser {
                        username: username.to_owned(),
                        password: "password1".to_owned(),
                    })
                    .expect("Could not serialize the registration payload"),
                ))
                .expect("Could not build the registration request"),
        )
        .await
        .expect("Registration request did not complete");
    assert_eq!(StatusCode::CREATED, register_response.status());

    let login_response = app
        .clone()
        .oneshot(
            Request::builder()
                .method(Method::POST)
                .uri(format!("/api/token?username={username}&password=password1"))
                .body(Body::empty())
                .expect("Could not build the login request"),
        )
        .await
        .expect("Login request did not complete");
    assert_eq!(StatusCode::OK, login_response.status());

    let login_envelope: Envelope<AccessToken> =
        deserialize_body(login_response.into_body()).await;
    login_envelope
        .data
        .expect("Login should return a token")
        .access_token
}

/// Starts a request builder carrying the given bearer token
fn bearer_request(method: Method, uri: &str, token: &str) -> axum::http::request::Builder {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
}

fn new_todo_body(text: &str, due_date: Option<NaiveDate>) -> Body {
    Body::from(
        serde_json::to_string(&NewTodo {
            text: text.to_owned(),
            completed: false,
            due_date,
        })
        .expect("Could not serialize the new todo"),
    )
}

#[test]
#[cfg_attr(not(feature = "integration_test"), ignore)]
fn todos_can_be_managed_end_to_end() {
    test_util::prepare_db_and_test(|db| async move {
        let app = test_util::test_app(db);
        let token = register_and_log_in(&app, "alice").await;
        let grocery_deadline =
            NaiveDate::from_ymd_opt(2025, 12, 31).expect("Could not build the due date");

        let create_response = app
            .clone()
            .oneshot(
                bearer_request(Method::POST, "/api/todos", &token)
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(new_todo_body("  Buy groceries  ", Some(grocery_deadline)))
                    .expect("Could not build the create request"),
            )
            .await
            .expect("Create request did not complete");
        assert_eq!(StatusCode::CREATED, create_response.status());
        let create_envelope: Envelope<TodoResponse> =
            deserialize_body(create_response.into_body()).await;
        let created = create_envelope
            .data
            .expect("Creation should return the todo");
        assert_eq!("Buy groceries", created.text);
        assert!(!created.completed);
        assert_eq!(Some(grocery_deadline), created.due_date);

        let list_response = app
            .clone()
            .oneshot(
                bearer_request(Method::GET, "/api/todos", &token)
                    .body(Body::empty())
                    .expect("Could not build the list request"),
            )
            .await
            .expect("List request did not complete");
        assert_eq!(StatusCode::OK, list_response.status());
        let list_envelope: Envelope<Vec<TodoResponse>> =
            deserialize_body(list_response.into_body()).await;
        let listed = list_envelope.data.expect("Listing should return todos");
        assert_eq!(1, listed.len());
        assert_eq!(created.id, listed[0].id);

        // Flipping the completion flag leaves the other fields alone
        let update_response = app
            .clone()
            .oneshot(
                bearer_request(Method::PUT, &format!("/api/todos/{}", created.id), &token)
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(
                        serde_json::to_string(&UpdateTodo {
                            text: None,
                            completed: Some(true),
                            due_date: None,
                        })
                        .expect("Could not serialize the update"),
                    ))
                    .expect("Could not build the update request"),
            )
            .await
            .expect("Update request did not complete");
        assert_eq!(StatusCode::OK, update_response.status());
        let update_envelope: Envelope<TodoResponse> =
            deserialize_body(update_response.into_body()).await;
        let updated = update_envelope
            .data
            .expect("Updating should return the todo");
        assert_eq!("Buy groceries", updated.text);
        assert!(updated.completed);
        assert_eq!(Some(grocery_deadline), updated.due_date);

        let delete_response = app
            .clone()
            .oneshot(
                bearer_request(Method::DELETE, &format!("/api/todos/{}", created.id), &token)
                    .body(Body::empty())
                    .expect("Could not build the delete request"),
            )
            .await
            .expect("Delete request did not complete");
        assert_eq!(StatusCode::OK, delete_response.status());
        let delete_envelope: Envelope<DeletedTodo> =
            deserialize_body(delete_response.into_body()).await;
        assert_eq!(Some(DeletedTodo { id: created.id }), delete_envelope.data);

        let final_list_response = app
            .clone()
            .oneshot(
                bearer_request(Method::GET, "/api/todos", &token)
                    .body(Body::empty())
                    .expect("Could not build the list request"),
            )
            .await
            .expect("List request did not complete");
        let final_list: Envelope<Vec<TodoResponse>> =
            deserialize_body(final_list_response.into_body()).await;
        assert_eq!(Some(Vec::new()), final_list.data);
    });
}

#[test]
#[cfg_attr(not(feature = "integration_test"), ignore)]
fn listing_returns_newest_todos_first() {
    test_util::prepare_db_and_test(|db| async move {
        let app = test_util::test_app(db);
        let token = register_and_log_in(&app, "alice").await;

        for item_text in ["First chore", "Second chore", "Third chore"] {
            let create_response = app
                .clone()
                .oneshot(
                    bearer_request(Method::POST, "/api/todos", &token)
                        .header(header::CONTENT_TYPE, "application/json")
                        .body(new_todo_body(item_text, None))
                        .expect("Could not build the create request"),
                )
                .await
                .expect("Create request did not complete");
            assert_eq!(StatusCode::CREATED, create_response.status());
        }

        let list_response = app
            .clone()
            .oneshot(
                bearer_request(Method::GET, "/api/todos", &token)
                    .body(Body::empty())
                    .expect("Could not build the list request"),
            )
            .await
            .expect("List request did not complete");
        let list_envelope: Envelope<Vec<TodoResponse>> =
            deserialize_body(list_response.into_body()).await;
        let listed_texts: Vec<String> = list_envelope
            .data
            .expect("Listing should return todos")
            .into_iter()
            .map(|todo| todo.text)
            .collect();
        assert_eq!(
            vec!["Third chore", "Second chore", "First chore"],
            listed_texts
        );
    });
}

#[test]
#[cfg_attr(not(feature = "integration_test"), ignore)]
fn users_cannot_touch_each_others_todos() {
    test_util::prepare_db_and_test(|db| async move {
        let app = test_util::test_app(db);
        let alice_token = register_and_log_in(&app, "alice").await;
        let bob_token = register_and_log_in(&app, "bob").await;

        let create_response = app
            .clone()
            .oneshot(
                bearer_request(Method::POST, "/api/todos", &alice_token)
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(new_todo_body("Alice's secret plans", None))
                    .expect("Could not build the create request"),
            )
            .await
            .expect("Create request did not complete");
        assert_eq!(StatusCode::CREATED, create_response.status());
        let create_envelope: Envelope<TodoResponse> =
            deserialize_body(create_response.into_body()).await;
        let created = create_envelope
            .data
            .expect("Creation should return the todo");

        // Bob's own list stays empty
        let bob_list_response = app
            .clone()
            .oneshot(
                bearer_request(Method::GET, "/api/todos", &bob_token)
                    .body(Body::empty())
                    .expect("Could not build the list request"),
            )
            .await
            .expect("List request did not complete");
        let bob_list: Envelope<Vec<TodoResponse>> =
            deserialize_body(bob_list_response.into_body()).await;
        assert_eq!(Some(Vec::new()), bob_list.data);

        // Bob can't update Alice's todo
        let update_response = app
            .clone()
            .oneshot(
                bearer_request(
                    Method::PUT,
                    &format!("/api/todos/{}", created.id),
                    &bob_token,
                )
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(
                    serde_json::to_string(&UpdateTodo {
                        text: Some("Hijacked".to_owned()),
                        completed: None,
                        due_date: None,
                    })
                    .expect("Could not serialize the update"),
                ))
                .expect("Could not build the update request"),
            )
            .await
            .expect("Update request did not complete");
        assert_eq!(StatusCode::FORBIDDEN, update_response.status());
        let forbidden_body: BasicErrorResponse =
            deserialize_body(update_response.into_body()).await;
        assert_eq!(
            "You do not have permission to modify this todo",
            forbidden_body.error
        );

        // Bob can't delete it either
        let delete_response = app
            .clone()
            .oneshot(
                bearer_request(
                    Method::DELETE,
                    &format!("/api/todos/{}", created.id),
                    &bob_token,
                )
                .body(Body::empty())
                .expect("Could not build the delete request"),
            )
            .await
            .expect("Delete request did not complete");
        assert_eq!(StatusCode::FORBIDDEN, delete_response.status());

        // A todo that doesn't exist at all reads as missing, not forbidden
        let missing_response = app
            .clone()
            .oneshot(
                bearer_request(Method::DELETE, "/api/todos/9999", &bob_token)
                    .body(Body::empty())
                    .expect("Could not build the delete request"),
            )
            .await
            .expect("Delete request did not complete");
        assert_eq!(StatusCode::NOT_FOUND, missing_response.status());
        let missing_body: BasicErrorResponse =
            deserialize_body(missing_response.into_body()).await;
        assert_eq!("Todo item 9999 does not exist", missing_body.error);
    });
}

#[test]
#[cfg_attr(not(feature = "integration_test"), ignore)]
fn unauthenticated_requests_are_turned_away() {
    test_util::prepare_db_and_test(|db| async move {
        let app = test_util::test_app(db);

        let missing_header_response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method(Method::GET)
                    .uri("/api/todos")
                    .body(Body::empty())
                    .expect("Could not build the list request"),
            )
            .await
            .expect("List request did not complete");
        assert_eq!(StatusCode::UNAUTHORIZED, missing_header_response.status());
        let error_body: BasicErrorResponse =
            deserialize_body(missing_header_response.into_body()).await;
        assert_eq!("Could not validate credentials", error_body.error);

        let garbage_token_response = app
            .clone()
            .oneshot(
                bearer_request(Method::GET, "/api/todos", "not-a-real-token")
                    .body(Body::empty())
                    .expect("Could not build the list request"),
            )
            .await
            .expect("List request did not complete");
        assert_eq!(StatusCode::UNAUTHORIZED, garbage_token_response.status());
    });
}
