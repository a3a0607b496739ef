use axum::Json;
use contracts::domain::errors::SettlementError;
use contracts::system::tasks::aggregate::ScheduledTask;

use super::ApiResult;
use crate::system::tasks::service;

/// GET /api/sys/tasks — регламентные задания и их последние запуски
pub async fn list() -> ApiResult<Vec<ScheduledTask>> {
    let tasks = service::list_all_tasks()
        .await
        .map_err(SettlementError::Internal)?;
    Ok(Json(tasks))
}
