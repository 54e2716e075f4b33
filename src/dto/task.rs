use crate::domain;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// DTO for creating a new todo item via the API. Text bounds are enforced by
/// [crate::domain::todo::TaskService] after trimming, so no rules live here.
#[derive(Deserialize, ToSchema)]
#[cfg_attr(test, derive(Serialize))]
pub struct NewTodo {
    #[schema(example = "Buy groceries")]
    pub text: String,
    #[serde(default)]
    pub completed: bool,
    #[schema(example = "2025-12-31")]
    pub due_date: Option<NaiveDate>,
}

impl From<NewTodo> for domain::todo::NewTask {
    fn from(value: NewTodo) -> Self {
        domain::todo::NewTask {
            item_text: value.text,
            completed: value.completed,
            due_date: value.due_date,
        }
    }
}

/// DTO for partially updating a todo item via the API. Absent and null fields keep
/// their stored values.
#[derive(Debug, Deserialize, ToSchema)]
#[cfg_attr(test, derive(Serialize))]
pub struct UpdateTodo {
    #[schema(example = "Buy more groceries")]
    pub text: Option<String>,
    pub completed: Option<bool>,
    pub due_date: Option<NaiveDate>,
}

impl From<UpdateTodo> for domain::todo::UpdateTask {
    fn from(value: UpdateTodo) -> Self {
        domain::todo::UpdateTask {
            item_text: value.text,
            completed: value.completed,
            due_date: value.due_date,
        }
    }
}

/// DTO for a returned todo item on the API
#[derive(Serialize, ToSchema)]
#[cfg_attr(test, derive(Deserialize, PartialEq, Eq, Debug))]
pub struct TodoResponse {
    #[schema(example = 10)]
    pub id: i32,
    #[schema(example = 4)]
    pub owner_id: i32,
    #[schema(example = "Buy groceries")]
    pub text: String,
    pub completed: bool,
    #[schema(example = "2025-12-31")]
    pub due_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<domain::todo::TodoTask> for TodoResponse {
    fn from(value: domain::todo::TodoTask) -> Self {
        TodoResponse {
            id: value.id,
            owner_id: value.owner_user_id,
            text: value.item_text,
            completed: value.completed,
            due_date: value.due_date,
            created_at: value.created_at,
            updated_at: value.updated_at,
        }
    }
}

/// DTO confirming which todo item was removed
#[derive(Serialize, ToSchema)]
#[cfg_attr(test, derive(Deserialize, PartialEq, Eq, Debug))]
pub struct DeletedTodo {
    #[schema(example = 10)]
    pub id: i32,
}
