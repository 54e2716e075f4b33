use crate::auth::AuthenticatedUser;
use crate::domain::todo::driving_ports::{TaskError, TaskPort};
use crate::dto::task::{DeletedTodo, NewTodo, TodoResponse, UpdateTodo};
use crate::dto::Envelope;
use crate::external_connections::{ExternalConnectivity, Transactable};
use crate::routing_utils::{
    begin_transaction, commit_transaction, ApiError, BasicErrorResponse, GenericErrorResponse,
    Json,
};
use crate::{domain, persistence, AppState, SharedData};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::ErrorResponse;
use axum::routing::{delete, get, post, put};
use axum::{Extension, Router};
use std::sync::Arc;
use tracing::info;
use utoipa::OpenApi;

/// Builds a router for the todo item routes. Every route expects
/// [AuthenticatedUser] to have been attached by the bearer auth middleware.
pub fn todo_routes() -> Router<Arc<SharedData>> {
    Router::new()
        .route(
            "/todos",
            get(
                |State(app_state): AppState,
                 Extension(user): Extension<AuthenticatedUser>| async move {
                    let mut ext_cxn = app_state.ext_cxn.clone();
                    let task_service = domain::todo::TaskService {};

                    list_todos(&user, &mut ext_cxn, &task_service).await
                },
            ),
        )
        .route(
            "/todos",
            post(
                |State(app_state): AppState,
                 Extension(user): Extension<AuthenticatedUser>,
                 Json(new_todo): Json<NewTodo>| async move {
                    let task_service = domain::todo::TaskService {};

                    create_todo(&user, new_todo, &app_state.ext_cxn, &task_service).await
                },
            ),
        )
        .route(
            "/todos/:todo_id",
            put(
                |State(app_state): AppState,
                 Extension(user): Extension<AuthenticatedUser>,
                 Path(todo_id): Path<i32>,
                 Json(patch): Json<UpdateTodo>| async move {
                    let task_service = domain::todo::TaskService {};

                    update_todo(todo_id, &user, patch, &app_state.ext_cxn, &task_service).await
                },
            ),
        )
        .route(
            "/todos/:todo_id",
            delete(
                |State(app_state): AppState,
                 Extension(user): Extension<AuthenticatedUser>,
                 Path(todo_id): Path<i32>| async move {
                    let task_service = domain::todo::TaskService {};

                    delete_todo(todo_id, &user, &app_state.ext_cxn, &task_service).await
                },
            ),
        )
}

/// OpenAPI definitions for the todo item routes
#[derive(OpenApi)]
#[openapi(paths(list_todos, create_todo, update_todo, delete_todo))]
pub struct TasksApi;

/// Maps task lookup failures onto API responses for routes addressing a single todo
fn render_task_error(todo_id: i32, error: TaskError) -> ErrorResponse {
    match error {
        TaskError::NotFound => {
            ApiError::NotFound(format!("Todo item {todo_id} does not exist")).into()
        }
        TaskError::NotOwner => {
            ApiError::Forbidden("You do not have permission to modify this todo".to_owned()).into()
        }
        TaskError::InvalidText(cause) => ApiError::BadRequest(cause.to_string()).into(),
        TaskError::PortError(port_err) => GenericErrorResponse(port_err).into(),
    }
}

/// Lists the authenticated user's todo items, newest first.
#[utoipa::path(
    get,
    path = "/api/todos",
    tag = "todos",
    security(("bearer_token" = [])),
    responses(
        (status = 200, description = "Todos retrieved successfully", body = Vec<TodoResponse>),
        (status = 401, response = BasicErrorResponse),
        (status = 500, response = BasicErrorResponse),
    ),
)]
async fn list_todos(
    user: &AuthenticatedUser,
    ext_cxn: &mut impl ExternalConnectivity,
    task_service: &impl TaskPort,
) -> Result<Json<Envelope<Vec<TodoResponse>>>, ErrorResponse> {
    info!("Listing todos for {user}");
    let task_read = persistence::db_todo_driven_ports::DbTaskReader {};

    let tasks = task_service
        .tasks_for_user(user.id, &mut *ext_cxn, &task_read)
        .await
        .map_err(|task_err| GenericErrorResponse(task_err.into()))?;
    let task_dtos: Vec<TodoResponse> = tasks.into_iter().map(TodoResponse::from).collect();

    Ok(Json(Envelope::ok(
        task_dtos,
        "Todos retrieved successfully",
    )))
}

/// Creates a todo item owned by the authenticated user.
#[utoipa::path(
    post,
    path = "/api/todos",
    tag = "todos",
    security(("bearer_token" = [])),
    request_body = NewTodo,
    responses(
        (status = 201, description = "Todo created successfully", body = TodoResponse),
        (status = 400, response = BasicErrorResponse),
        (status = 401, response = BasicErrorResponse),
        (status = 500, response = BasicErrorResponse),
    ),
)]
async fn create_todo(
    user: &AuthenticatedUser,
    new_todo: NewTodo,
    ext_cxn: &impl Transactable,
    task_service: &impl TaskPort,
) -> Result<(StatusCode, Json<Envelope<TodoResponse>>), ErrorResponse> {
    info!("Creating todo for {user}");
    let mut txn = begin_transaction(ext_cxn).await?;
    let task_write = persistence::db_todo_driven_ports::DbTaskWriter {};

    let domain_task = domain::todo::NewTask::from(new_todo);
    let create_result = task_service
        .create_task_for_user(user.id, &domain_task, &mut txn, &task_write)
        .await;
    let created_task = match create_result {
        Ok(task) => task,
        Err(TaskError::InvalidText(cause)) => {
            return Err(ApiError::BadRequest(cause.to_string()).into());
        }
        Err(task_err) => {
            return Err(GenericErrorResponse(task_err.into()).into());
        }
    };
    commit_transaction(txn).await?;

    Ok((
        StatusCode::CREATED,
        Json(Envelope::ok(
            TodoResponse::from(created_task),
            "Todo created successfully",
        )),
    ))
}

/// Applies a partial update to one of the authenticated user's todo items.
#[utoipa::path(
    put,
    path = "/api/todos/{todo_id}",
    tag = "todos",
    security(("bearer_token" = [])),
    params(("todo_id" = i32, Path, description = "ID of the todo item to update")),
    request_body = UpdateTodo,
    responses(
        (status = 200, description = "Todo updated successfully", body = TodoResponse),
        (status = 400, response = BasicErrorResponse),
        (status = 401, response = BasicErrorResponse),
        (status = 403, response = BasicErrorResponse),
        (status = 404, response = BasicErrorResponse),
        (status = 500, response = BasicErrorResponse),
    ),
)]
async fn update_todo(
    todo_id: i32,
    user: &AuthenticatedUser,
    patch: UpdateTodo,
    ext_cxn: &impl Transactable,
    task_service: &impl TaskPort,
) -> Result<Json<Envelope<TodoResponse>>, ErrorResponse> {
    info!("Updating todo {todo_id} for {user}");
    let mut txn = begin_transaction(ext_cxn).await?;
    let task_read = persistence::db_todo_driven_ports::DbTaskReader {};
    let task_write = persistence::db_todo_driven_ports::DbTaskWriter {};

    let domain_update = domain::todo::UpdateTask::from(patch);
    let updated_task = task_service
        .update_task(
            todo_id,
            user.id,
            &domain_update,
            &mut txn,
            &task_read,
            &task_write,
        )
        .await
        .map_err(|task_err| render_task_error(todo_id, task_err))?;
    commit_transaction(txn).await?;

    Ok(Json(Envelope::ok(
        TodoResponse::from(updated_task),
        "Todo updated successfully",
    )))
}

/// Removes one of the authenticated user's todo items.
#[utoipa::path(
    delete,
    path = "/api/todos/{todo_id}",
    tag = "todos",
    security(("bearer_token" = [])),
    params(("todo_id" = i32, Path, description = "ID of the todo item to remove")),
    responses(
        (status = 200, description = "Todo deleted successfully", body = DeletedTodo),
        (status = 401, response = BasicErrorResponse),
        (status = 403, response = BasicErrorResponse),
        (status = 404, response = BasicErrorResponse),
        (status = 500, response = BasicErrorResponse),
    ),
)]
async fn delete_todo(
    todo_id: i32,
    user: &AuthenticatedUser,
    ext_cxn: &impl Transactable,
    task_service: &impl TaskPort,
) -> Result<Json<Envelope<DeletedTodo>>, ErrorResponse> {
    info!("Deleting todo {todo_id} for {user}");
    let mut txn = begin_transaction(ext_cxn).await?;
    let task_read = persistence::db_todo_driven_ports::DbTaskReader {};
    let task_write = persistence::db_todo_driven_ports::DbTaskWriter {};

    task_service
        .delete_task(todo_id, user.id, &mut txn, &task_read, &task_write)
        .await
        .map_err(|task_err| render_task_error(todo_id, task_err))?;
    commit_transaction(txn).await?;

    Ok(Json(Envelope::ok(
        DeletedTodo { id: todo_id },
        "Todo deleted successfully",
    )))
}
