use axum::{extract::Path, Extension};
use chrono::Utc;
use std::sync::Arc;

use crate::auth::Operation;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::scheduler::{Rule, RunReport, ScheduleEntry, SchedulerEngine};

/// GET /api/scheduler/rules - each rule with its cron and next fire time
pub async fn rules(
    Extension(user): Extension<AuthUser>,
    Extension(engine): Extension<Arc<SchedulerEngine>>,
) -> ApiResult<Vec<ScheduleEntry>> {
    user.require(Operation::ManageScheduler)?;
    Ok(ApiResponse::success(engine.describe(Utc::now())))
}

/// POST /api/scheduler/rules/:rule/run - evaluate one rule immediately
pub async fn run(
    Extension(user): Extension<AuthUser>,
    Extension(engine): Extension<Arc<SchedulerEngine>>,
    Path(rule): Path<String>,
) -> ApiResult<RunReport> {
    user.require(Operation::ManageScheduler)?;
    let rule: Rule = rule.parse()?;
    tracing::info!("Manual run of '{}' requested by '{}'", rule, user.username);
    let report = engine.scheduler().run(rule).await?;
    Ok(ApiResponse::success(report))
}
