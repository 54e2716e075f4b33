use crate::domain;
use crate::domain::todo::{NewTask, TodoTask, UpdateTask};
use crate::external_connections::{ConnectionHandle, ExternalConnectivity};
use anyhow::{Context, Error};
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{query, query_as};

pub struct DbTaskReader;

#[derive(sqlx::FromRow)]
struct TodoItemRow {
    id: i32,
    user_id: i32,
    item_text: String,
    completed: bool,
    due_date: Option<NaiveDate>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<TodoItemRow> for domain::todo::TodoTask {
    fn from(value: TodoItemRow) -> Self {
        TodoTask {
            id: value.id,
            owner_user_id: value.user_id,
            item_text: value.item_text,
            completed: value.completed,
            due_date: value.due_date,
            created_at: value.created_at,
            updated_at: value.updated_at,
        }
    }
}

const TODO_ITEM_COLUMNS: &str =
    "ti.id, ti.user_id, ti.item_text, ti.completed, ti.due_date, ti.created_at, ti.updated_at";

impl domain::todo::driven_ports::TaskReader for DbTaskReader {
    async fn tasks_for_user(
        &self,
        user_id: i32,
        ext_cxn: &mut impl ExternalConnectivity,
    ) -> Result<Vec<TodoTask>, Error> {
        let mut cxn = ext_cxn.database_cxn().await.map_err(super::anyhowify)?;

        let todo_items: Vec<TodoTask> = query_as::<_, TodoItemRow>(&format!(
            "SELECT {TODO_ITEM_COLUMNS} FROM todo_item ti WHERE ti.user_id = $1 ORDER BY ti.id DESC"
        ))
        .bind(user_id)
        .fetch_all(cxn.borrow_connection())
        .await
        .context("trying to fetch todo items for a user")?
        .into_iter()
        .map(domain::todo::TodoTask::from)
        .collect();

        Ok(todo_items)
    }

    async fn task_by_id(
        &self,
        task_id: i32,
        ext_cxn: &mut impl ExternalConnectivity,
    ) -> Result<Option<TodoTask>, Error> {
        let mut cxn = ext_cxn.database_cxn().await.map_err(super::anyhowify)?;

        let todo_item: Option<TodoTask> = query_as::<_, TodoItemRow>(&format!(
            "SELECT {TODO_ITEM_COLUMNS} FROM todo_item ti WHERE ti.id = $1"
        ))
        .bind(task_id)
        .fetch_optional(cxn.borrow_connection())
        .await
        .context("trying to fetch a todo item by ID")?
        .map(domain::todo::TodoTask::from);

        Ok(todo_item)
    }
}

pub struct DbTaskWriter;

impl domain::todo::driven_ports::TaskWriter for DbTaskWriter {
    async fn create_task_for_user(
        &self,
        user_id: i32,
        new_task: &NewTask,
        ext_cxn: &mut impl ExternalConnectivity,
    ) -> Result<TodoTask, Error> {
        let mut cxn = ext_cxn.database_cxn().await.map_err(super::anyhowify)?;

        let created_item = query_as::<_, TodoItemRow>(
            "INSERT INTO todo_item(user_id, item_text, completed, due_date) \
             VALUES ($1, $2, $3, $4) \
             RETURNING id, user_id, item_text, completed, due_date, created_at, updated_at",
        )
        .bind(user_id)
        .bind(&new_task.item_text)
        .bind(new_task.completed)
        .bind(new_task.due_date)
        .fetch_one(cxn.borrow_connection())
        .await
        .context("trying to insert a new task into the database")?;

        Ok(TodoTask::from(created_item))
    }

    async fn update_task(
        &self,
        task_id: i32,
        update: &UpdateTask,
        ext_cxn: &mut impl ExternalConnectivity,
    ) -> Result<Option<TodoTask>, Error> {
        let mut cxn = ext_cxn.database_cxn().await.map_err(super::anyhowify)?;

        // NULL binds leave the matching column untouched
        let updated_item = query_as::<_, TodoItemRow>(
            "UPDATE todo_item SET \
                item_text = COALESCE($1, item_text), \
                completed = COALESCE($2, completed), \
                due_date = COALESCE($3, due_date), \
                updated_at = now() \
             WHERE id = $4 \
             RETURNING id, user_id, item_text, completed, due_date, created_at, updated_at",
        )
        .bind(update.item_text.as_deref())
        .bind(update.completed)
        .bind(update.due_date)
        .bind(task_id)
        .fetch_optional(cxn.borrow_connection())
        .await
        .context("trying to update a task in the database")?
        .map(TodoTask::from);

        Ok(updated_item)
    }

    async fn delete_task(
        &self,
        task_id: i32,
        ext_cxn: &mut impl ExternalConnectivity,
    ) -> Result<bool, Error> {
        let mut cxn = ext_cxn.database_cxn().await.map_err(super::anyhowify)?;

        let delete_outcome = query("DELETE FROM todo_item WHERE id = $1")
            .bind(task_id)
            .execute(cxn.borrow_connection())
            .await
            .context("trying to remove a task from the database")?;

        Ok(delete_outcome.rows_affected() > 0)
    }
}
