//! Handlers for `/toolbox`: talks, schedules, and assignments.
//!
//! | Path | Read | Write |
//! |------|------|-------|
//! | `/toolbox/talks` | `Toolbox.View` | `Toolbox.Edit` |
//! | `/toolbox/schedules` | `Toolbox.View` | `Toolbox.Schedule` |
//! | `/toolbox/assignments` | `Toolbox.View` | `Toolbox.Edit`, or the assignee |
//!
//! Callers without `Toolbox.Edit` only see their own assignments, found via
//! the employee record linked to their user.

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::Response,
};
use chrono::{NaiveDate, Utc};
use fieldops_core::{
  common::{ListQuery, Page},
  store::Store,
  tenancy::{CurrentUser, Permission},
  toolbox::{
    AssignmentCompletion, AssignmentFilter, AssignmentOutcome, Schedule,
    ScheduleFilter, ScheduleInput, ScheduleRun, ScheduledTalk, ToolboxTalk,
    ToolboxTalkInput,
  },
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{ApiState, auth::Authenticated, created, error::ApiError, found};

fn today() -> NaiveDate { Utc::now().date_naive() }

// ─── Talks ───────────────────────────────────────────────────────────────────

/// `GET /toolbox/talks`
pub async fn list_talks<S: Store>(
  State(state): State<ApiState<S>>,
  auth: Authenticated,
  Query(query): Query<ListQuery>,
) -> Result<Json<Page<ToolboxTalk>>, ApiError> {
  let user = auth.require(Permission::ToolboxView)?;
  Ok(Json(state.store.list_talks(user.tenant_id, query).await?))
}

/// `GET /toolbox/talks/{id}`
pub async fn get_talk<S: Store>(
  State(state): State<ApiState<S>>,
  auth: Authenticated,
  Path(id): Path<Uuid>,
) -> Result<Json<ToolboxTalk>, ApiError> {
  let user = auth.require(Permission::ToolboxView)?;
  found(state.store.get_talk(user.tenant_id, id).await?, "toolbox talk", id)
}

/// `POST /toolbox/talks`
pub async fn create_talk<S: Store>(
  State(state): State<ApiState<S>>,
  auth: Authenticated,
  Json(body): Json<ToolboxTalkInput>,
) -> Result<Response, ApiError> {
  let user = auth.require(Permission::ToolboxEdit)?;
  let talk = state.store.create_talk(user.tenant_id, body).await?;
  Ok(created("toolbox/talks", talk.id, talk))
}

/// `PUT /toolbox/talks/{id}`
pub async fn update_talk<S: Store>(
  State(state): State<ApiState<S>>,
  auth: Authenticated,
  Path(id): Path<Uuid>,
  Json(body): Json<ToolboxTalkInput>,
) -> Result<Json<ToolboxTalk>, ApiError> {
  let user = auth.require(Permission::ToolboxEdit)?;
  Ok(Json(state.store.update_talk(user.tenant_id, id, body).await?))
}

/// `DELETE /toolbox/talks/{id}` also cancels the talk's active schedules.
pub async fn delete_talk<S: Store>(
  State(state): State<ApiState<S>>,
  auth: Authenticated,
  Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
  let user = auth.require(Permission::ToolboxEdit)?;
  state.store.delete_talk(user.tenant_id, id).await?;
  Ok(StatusCode::NO_CONTENT)
}

// ─── Schedules ───────────────────────────────────────────────────────────────

/// `GET /toolbox/schedules[?status=&talk_id=]`
pub async fn list_schedules<S: Store>(
  State(state): State<ApiState<S>>,
  auth: Authenticated,
  Query(filter): Query<ScheduleFilter>,
  Query(query): Query<ListQuery>,
) -> Result<Json<Page<Schedule>>, ApiError> {
  let user = auth.require(Permission::ToolboxView)?;
  Ok(Json(state.store.list_schedules(user.tenant_id, filter, query).await?))
}

/// `GET /toolbox/schedules/{id}`
pub async fn get_schedule<S: Store>(
  State(state): State<ApiState<S>>,
  auth: Authenticated,
  Path(id): Path<Uuid>,
) -> Result<Json<Schedule>, ApiError> {
  let user = auth.require(Permission::ToolboxView)?;
  found(state.store.get_schedule(user.tenant_id, id).await?, "schedule", id)
}

/// `POST /toolbox/schedules`
pub async fn create_schedule<S: Store>(
  State(state): State<ApiState<S>>,
  auth: Authenticated,
  Json(body): Json<ScheduleInput>,
) -> Result<Response, ApiError> {
  let user = auth.require(Permission::ToolboxSchedule)?;
  let schedule = state.store.create_schedule(user.tenant_id, body).await?;
  Ok(created("toolbox/schedules", schedule.id, schedule))
}

/// `PUT /toolbox/schedules/{id}`
pub async fn update_schedule<S: Store>(
  State(state): State<ApiState<S>>,
  auth: Authenticated,
  Path(id): Path<Uuid>,
  Json(body): Json<ScheduleInput>,
) -> Result<Json<Schedule>, ApiError> {
  let user = auth.require(Permission::ToolboxSchedule)?;
  Ok(Json(state.store.update_schedule(user.tenant_id, id, body).await?))
}

/// `DELETE /toolbox/schedules/{id}`
pub async fn delete_schedule<S: Store>(
  State(state): State<ApiState<S>>,
  auth: Authenticated,
  Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
  let user = auth.require(Permission::ToolboxSchedule)?;
  state.store.delete_schedule(user.tenant_id, id).await?;
  Ok(StatusCode::NO_CONTENT)
}

/// `POST /toolbox/schedules/{id}/cancel`
pub async fn cancel_schedule<S: Store>(
  State(state): State<ApiState<S>>,
  auth: Authenticated,
  Path(id): Path<Uuid>,
) -> Result<Json<Schedule>, ApiError> {
  let user = auth.require(Permission::ToolboxSchedule)?;
  Ok(Json(state.store.cancel_schedule(user.tenant_id, id).await?))
}

/// `POST /toolbox/schedules/{id}/process` runs the schedule now, whether or
/// not it is due.
pub async fn process_schedule<S: Store>(
  State(state): State<ApiState<S>>,
  auth: Authenticated,
  Path(id): Path<Uuid>,
) -> Result<Json<ScheduleRun>, ApiError> {
  let user = auth.require(Permission::ToolboxSchedule)?;
  Ok(Json(state.store.process_schedule(user.tenant_id, id).await?))
}

#[derive(Debug, Default, Deserialize)]
pub struct ProcessDueParams {
  /// Defaults to the current UTC date.
  pub today: Option<NaiveDate>,
}

/// `POST /toolbox/schedules/process-due[?today=YYYY-MM-DD]` sweeps the
/// caller's tenant.
pub async fn process_due<S: Store>(
  State(state): State<ApiState<S>>,
  auth: Authenticated,
  Query(params): Query<ProcessDueParams>,
) -> Result<Json<Vec<ScheduleRun>>, ApiError> {
  let user = auth.require(Permission::ToolboxSchedule)?;
  let today = params.today.unwrap_or_else(today);
  let runs = state
    .store
    .process_due_schedules(Some(user.tenant_id), today)
    .await?;
  Ok(Json(runs))
}

// ─── Assignments ─────────────────────────────────────────────────────────────

/// The employee a caller is limited to, or `None` for unrestricted access.
fn assignee_scope(user: &CurrentUser) -> Result<Option<Uuid>, ApiError> {
  if user.can(Permission::ToolboxEdit) {
    return Ok(None);
  }
  user
    .employee_id
    .map(Some)
    .ok_or(ApiError::Forbidden(Permission::ToolboxEdit))
}

/// Load an assignment the caller may act on. Other employees' assignments
/// are reported as missing.
async fn visible_assignment<S: Store>(
  state: &ApiState<S>,
  user: &CurrentUser,
  id: Uuid,
) -> Result<ScheduledTalk, ApiError> {
  let scope = assignee_scope(user)?;
  state
    .store
    .get_assignment(user.tenant_id, id)
    .await?
    .filter(|a| scope.is_none_or(|employee| a.employee_id == employee))
    .ok_or_else(|| {
      ApiError::NotFound(format!("toolbox talk assignment not found: {id}"))
    })
}

/// `GET /toolbox/assignments[?employee_id=&schedule_id=&status=&overdue=true]`
pub async fn list_assignments<S: Store>(
  State(state): State<ApiState<S>>,
  auth: Authenticated,
  Query(mut filter): Query<AssignmentFilter>,
  Query(query): Query<ListQuery>,
) -> Result<Json<Page<ScheduledTalk>>, ApiError> {
  let user = auth.require(Permission::ToolboxView)?;
  if let Some(employee) = assignee_scope(user)? {
    filter.employee_id = Some(employee);
  }
  let page = state
    .store
    .list_assignments(user.tenant_id, filter, today(), query)
    .await?;
  Ok(Json(page))
}

/// `GET /toolbox/assignments/{id}`
pub async fn get_assignment<S: Store>(
  State(state): State<ApiState<S>>,
  auth: Authenticated,
  Path(id): Path<Uuid>,
) -> Result<Json<ScheduledTalk>, ApiError> {
  let user = auth.require(Permission::ToolboxView)?;
  Ok(Json(visible_assignment(&state, user, id).await?))
}

/// `POST /toolbox/assignments/{id}/start`
pub async fn start_assignment<S: Store>(
  State(state): State<ApiState<S>>,
  auth: Authenticated,
  Path(id): Path<Uuid>,
) -> Result<Json<ScheduledTalk>, ApiError> {
  let user = auth.require(Permission::ToolboxView)?;
  visible_assignment(&state, user, id).await?;
  Ok(Json(state.store.start_assignment(user.tenant_id, id).await?))
}

/// `POST /toolbox/assignments/{id}/complete` with `{"answers":[2,0,…]}`,
/// one option index per question in order.
pub async fn complete_assignment<S: Store>(
  State(state): State<ApiState<S>>,
  auth: Authenticated,
  Path(id): Path<Uuid>,
  Json(body): Json<AssignmentCompletion>,
) -> Result<Json<AssignmentOutcome>, ApiError> {
  let user = auth.require(Permission::ToolboxView)?;
  visible_assignment(&state, user, id).await?;
  let outcome = state
    .store
    .complete_assignment(user.tenant_id, id, body)
    .await?;
  Ok(Json(outcome))
}

#[cfg(test)]
mod tests {
  use fieldops_core::tenancy::Role;

  use super::*;

  fn user(role: Role, employee_id: Option<Uuid>) -> CurrentUser {
    CurrentUser {
      user_id: Uuid::new_v4(),
      tenant_id: Uuid::new_v4(),
      username: "amy".into(),
      role,
      employee_id,
    }
  }

  #[test]
  fn editors_see_every_assignment() {
    let scope = assignee_scope(&user(Role::Supervisor, None)).unwrap();
    assert_eq!(scope, None);
  }

  #[test]
  fn operatives_are_limited_to_their_employee() {
    let employee = Uuid::new_v4();
    let scope = assignee_scope(&user(Role::Operative, Some(employee))).unwrap();
    assert_eq!(scope, Some(employee));
  }

  #[test]
  fn operatives_without_an_employee_are_refused() {
    let err = assignee_scope(&user(Role::Operative, None)).unwrap_err();
    assert!(matches!(err, ApiError::Forbidden(Permission::ToolboxEdit)));
  }
}
