use crate::domain::todo::driven_ports::{TaskReader, TaskWriter};
use crate::domain::todo::driving_ports::TaskError;
use crate::external_connections::ExternalConnectivity;
use anyhow::Context;
use chrono::{DateTime, NaiveDate, Utc};
use thiserror::Error;

/// Upper bound on stored task text, counted in characters after trimming.
pub const MAX_TASK_TEXT_CHARS: usize = 500;

#[derive(PartialEq, Eq, Debug)]
#[cfg_attr(test, derive(Clone))]
pub struct TodoTask {
    pub id: i32,
    pub owner_user_id: i32,
    pub item_text: String,
    pub completed: bool,
    pub due_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[cfg_attr(test, derive(Clone))]
pub struct NewTask {
    pub item_text: String,
    pub completed: bool,
    pub due_date: Option<NaiveDate>,
}

/// A partial change to a task. Fields left as [None] keep their current value.
#[cfg_attr(test, derive(Clone))]
pub struct UpdateTask {
    pub item_text: Option<String>,
    pub completed: Option<bool>,
    pub due_date: Option<NaiveDate>,
}

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum InvalidTaskText {
    #[error("Task text cannot be empty.")]
    Empty,
    #[error("Task text cannot be longer than {} characters.", MAX_TASK_TEXT_CHARS)]
    TooLong,
}

/// Trims surrounding whitespace and enforces the character bound, returning the text
/// as it should be stored.
fn validated_text(raw_text: &str) -> Result<String, InvalidTaskText> {
    let trimmed = raw_text.trim();
    if trimmed.is_empty() {
        return Err(InvalidTaskText::Empty);
    }
    if trimmed.chars().count() > MAX_TASK_TEXT_CHARS {
        return Err(InvalidTaskText::TooLong);
    }

    Ok(trimmed.to_owned())
}

pub mod driven_ports {
    use super::*;
    use crate::external_connections::ExternalConnectivity;

    pub trait TaskReader {
        /// Tasks owned by the given user, newest ID first
        async fn tasks_for_user(
            &self,
            user_id: i32,
            ext_cxn: &mut impl ExternalConnectivity,
        ) -> Result<Vec<TodoTask>, anyhow::Error>;

        /// Looks up a task regardless of who owns it
        async fn task_by_id(
            &self,
            task_id: i32,
            ext_cxn: &mut impl ExternalConnectivity,
        ) -> Result<Option<TodoTask>, anyhow::Error>;
    }

    pub trait TaskWriter {
        async fn create_task_for_user(
            &self,
            user_id: i32,
            new_task: &NewTask,
            ext_cxn: &mut impl ExternalConnectivity,
        ) -> Result<TodoTask, anyhow::Error>;

        /// Applies the set fields of the update, returning the task as stored
        /// afterwards or [None] if the task no longer exists
        async fn update_task(
            &self,
            task_id: i32,
            update: &UpdateTask,
            ext_cxn: &mut impl ExternalConnectivity,
        ) -> Result<Option<TodoTask>, anyhow::Error>;

        /// Returns true if a task was actually removed
        async fn delete_task(
            &self,
            task_id: i32,
            ext_cxn: &mut impl ExternalConnectivity,
        ) -> Result<bool, anyhow::Error>;
    }
}

pub mod driving_ports {
    use super::*;
    use crate::external_connections::ExternalConnectivity;
    use thiserror::Error;

    #[derive(Debug, Error)]
    pub enum TaskError {
        #[error("The specified task did not exist.")]
        NotFound,
        #[error("The specified task belongs to another user.")]
        NotOwner,
        #[error(transparent)]
        InvalidText(#[from] InvalidTaskText),
        #[error(transparent)]
        PortError(#[from] anyhow::Error),
    }


    pub trait TaskPort {
        async fn tasks_for_user(
            &self,
            user_id: i32,
            ext_cxn: &mut impl ExternalConnectivity,
            task_read: &impl driven_ports::TaskReader,
        ) -> Result<Vec<TodoTask>, TaskError>;

        async fn create_task_for_user(
            &self,
            user_id: i32,
            task: &NewTask,
            ext_cxn: &mut impl ExternalConnectivity,
            task_write: &impl driven_ports::TaskWriter,
        ) -> Result<TodoTask, TaskError>;

        /// Existence is checked before ownership, so a missing task reports
        /// [TaskError::NotFound] even when the caller would not have owned it.
        async fn update_task(
            &self,
            task_id: i32,
            acting_user_id: i32,
            update: &UpdateTask,
            ext_cxn: &mut impl ExternalConnectivity,
            task_read: &impl driven_ports::TaskReader,
            task_write: &impl driven_ports::TaskWriter,
        ) -> Result<TodoTask, TaskError>;

        /// Existence is checked before ownership, same as [TaskPort::update_task].
        async fn delete_task(
            &self,
            task_id: i32,
            acting_user_id: i32,
            ext_cxn: &mut impl ExternalConnectivity,
            task_read: &impl driven_ports::TaskReader,
            task_write: &impl driven_ports::TaskWriter,
        ) -> Result<(), TaskError>;
    }
}

pub struct TaskService {}

impl driving_ports::TaskPort for TaskService {
    async fn tasks_for_user(
        &self,
        user_id: i32,
        ext_cxn: &mut impl ExternalConnectivity,
        task_read: &impl TaskReader,
    ) -> Result<Vec<TodoTask>, TaskError> {
        let tasks = task_read
            .tasks_for_user(user_id, &mut *ext_cxn)
            .await
            .context("Fetching a user's tasks")?;

        Ok(tasks)
    }

    async fn create_task_for_user(
        &self,
        user_id: i32,
        task: &NewTask,
        ext_cxn: &mut impl ExternalConnectivity,
        task_write: &impl TaskWriter,
    ) -> Result<TodoTask, TaskError> {
        let sanitized_task = NewTask {
            item_text: validated_text(&task.item_text)?,
            completed: task.completed,
            due_date: task.due_date,
        };
        let created_task = task_write
            .create_task_for_user(user_id, &sanitized_task, &mut *ext_cxn)
            .await
            .context("Creating a new task")?;

        Ok(created_task)
    }

    async fn update_task(
        &self,
        task_id: i32,
        acting_user_id: i32,
        update: &UpdateTask,
        ext_cxn: &mut impl ExternalConnectivity,
        task_read: &impl TaskReader,
        task_write: &impl TaskWriter,
    ) -> Result<TodoTask, TaskError> {
        let existing_task = task_read
            .task_by_id(task_id, &mut *ext_cxn)
            .await
            .context("Fetching a task before updating it")?;
        let Some(task) = existing_task else {
            return Err(TaskError::NotFound);
        };
        if task.owner_user_id != acting_user_id {
            return Err(TaskError::NotOwner);
        }

        let sanitized_update = UpdateTask {
            item_text: match &update.item_text {
                Some(raw_text) => Some(validated_text(raw_text)?),
                None => None,
            },
            completed: update.completed,
            due_date: update.due_date,
        };
        let updated_task = task_write
            .update_task(task_id, &sanitized_update, &mut *ext_cxn)
            .await
            .context("Updating a task")?;

        // The task can vanish between the ownership check and the write
        updated_task.ok_or(TaskError::NotFound)
    }

    async fn delete_task(
        &self,
        task_id: i32,
        acting_user_id: i32,
        ext_cxn: &mut impl ExternalConnectivity,
        task_read: &impl TaskReader,
        task_write: &impl TaskWriter,
    ) -> Result<(), TaskError> {
        let existing_task = task_read
            .task_by_id(task_id, &mut *ext_cxn)
            .await
            .context("Fetching a task before deleting it")?;
        let Some(task) = existing_task else {
            return Err(TaskError::NotFound);
        };
        if task.owner_user_id != acting_user_id {
            return Err(TaskError::NotOwner);
        }

        let removed = task_write
            .delete_task(task_id, &mut *ext_cxn)
            .await
            .context("Deleting a task")?;
        if !removed {
            return Err(TaskError::NotFound);
        }

        Ok(())
    }
}
