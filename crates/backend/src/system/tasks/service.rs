use anyhow::Result;
use chrono::{DateTime, Utc};
use contracts::system::tasks::aggregate::{ScheduledTask, ScheduledTaskId};

use super::repository;

pub async fn list_all_tasks() -> Result<Vec<ScheduledTask>> {
    Ok(repository::list_all().await?)
}

pub async fn list_enabled_tasks() -> Result<Vec<ScheduledTask>> {
    Ok(repository::list_enabled().await?)
}

/// Обновить данные последнего/следующего запуска задания
pub async fn update_run_status(
    task_id: &ScheduledTaskId,
    last_run_at: Option<DateTime<Utc>>,
    next_run_at: Option<DateTime<Utc>>,
    log_file: Option<String>,
    status: Option<String>,
) -> Result<()> {
    let tasks = repository::list_all().await?;
    let Some(mut task) = tasks.into_iter().find(|t| t.base.id == *task_id) else {
        return Ok(());
    };
    if last_run_at.is_some() {
        task.last_run_at = last_run_at;
    }
    task.next_run_at = next_run_at;
    if log_file.is_some() {
        task.last_run_log_file = log_file;
    }
    if status.is_some() {
        task.last_run_status = status;
    }
    repository::save(&task).await?;
    Ok(())
}

/// Зарегистрировать задание, если его ещё нет (идемпотентный seed)
pub async fn ensure_task(
    code: &str,
    description: &str,
    task_type: &str,
    schedule_cron: &str,
) -> Result<()> {
    if repository::get_by_code(code).await?.is_some() {
        return Ok(());
    }
    let task = ScheduledTask::new_for_insert(
        code.to_string(),
        description.to_string(),
        task_type.to_string(),
        Some(schedule_cron.to_string()),
        true,
        "{}".to_string(),
    );
    repository::save(&task).await?;
    tracing::info!(code, task_type, cron = schedule_cron, "Scheduled task registered");
    Ok(())
}
