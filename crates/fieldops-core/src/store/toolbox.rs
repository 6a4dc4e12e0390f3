use std::future::Future;

use chrono::NaiveDate;
use uuid::Uuid;

use super::StoreBase;
use crate::{
  common::{ListQuery, Page},
  toolbox::{
    AssignmentCompletion, AssignmentFilter, AssignmentOutcome, Schedule,
    ScheduleFilter, ScheduleInput, ScheduleRun, ScheduledTalk, ToolboxTalk,
    ToolboxTalkInput,
  },
};

/// Toolbox talks, schedules, and assignments.
pub trait ToolboxStore: StoreBase {
  // ── Talks ─────────────────────────────────────────────────────────────

  fn list_talks(
    &self,
    tenant_id: Uuid,
    query: ListQuery,
  ) -> impl Future<Output = Result<Page<ToolboxTalk>, Self::Error>> + Send + '_;

  fn get_talk(
    &self,
    tenant_id: Uuid,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<ToolboxTalk>, Self::Error>> + Send + '_;

  fn create_talk(
    &self,
    tenant_id: Uuid,
    input: ToolboxTalkInput,
  ) -> impl Future<Output = Result<ToolboxTalk, Self::Error>> + Send + '_;

  fn update_talk(
    &self,
    tenant_id: Uuid,
    id: Uuid,
    input: ToolboxTalkInput,
  ) -> impl Future<Output = Result<ToolboxTalk, Self::Error>> + Send + '_;

  fn delete_talk(
    &self,
    tenant_id: Uuid,
    id: Uuid,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  // ── Schedules ─────────────────────────────────────────────────────────

  fn list_schedules(
    &self,
    tenant_id: Uuid,
    filter: ScheduleFilter,
    query: ListQuery,
  ) -> impl Future<Output = Result<Page<Schedule>, Self::Error>> + Send + '_;

  fn get_schedule(
    &self,
    tenant_id: Uuid,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Schedule>, Self::Error>> + Send + '_;

  /// Create an Active schedule whose first run is `start_date`.
  fn create_schedule(
    &self,
    tenant_id: Uuid,
    input: ScheduleInput,
  ) -> impl Future<Output = Result<Schedule, Self::Error>> + Send + '_;

  /// Replace an Active schedule's rule and employees. A schedule that has
  /// never run restarts from the new `start_date`.
  fn update_schedule(
    &self,
    tenant_id: Uuid,
    id: Uuid,
    input: ScheduleInput,
  ) -> impl Future<Output = Result<Schedule, Self::Error>> + Send + '_;

  fn delete_schedule(
    &self,
    tenant_id: Uuid,
    id: Uuid,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Stop an Active schedule from producing further runs.
  fn cancel_schedule(
    &self,
    tenant_id: Uuid,
    id: Uuid,
  ) -> impl Future<Output = Result<Schedule, Self::Error>> + Send + '_;

  /// Materialise the assignments for the schedule's next run and advance it.
  fn process_schedule(
    &self,
    tenant_id: Uuid,
    id: Uuid,
  ) -> impl Future<Output = Result<ScheduleRun, Self::Error>> + Send + '_;

  /// Process, once each, every Active schedule with `next_run_date <= today`.
  /// With `tenant_id = None` the sweep covers every tenant.
  fn process_due_schedules(
    &self,
    tenant_id: Option<Uuid>,
    today: NaiveDate,
  ) -> impl Future<Output = Result<Vec<ScheduleRun>, Self::Error>> + Send + '_;

  // ── Assignments ───────────────────────────────────────────────────────

  fn list_assignments(
    &self,
    tenant_id: Uuid,
    filter: AssignmentFilter,
    today: NaiveDate,
    query: ListQuery,
  ) -> impl Future<Output = Result<Page<ScheduledTalk>, Self::Error>> + Send + '_;

  fn get_assignment(
    &self,
    tenant_id: Uuid,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<ScheduledTalk>, Self::Error>> + Send + '_;

  fn start_assignment(
    &self,
    tenant_id: Uuid,
    id: Uuid,
  ) -> impl Future<Output = Result<ScheduledTalk, Self::Error>> + Send + '_;

  /// Mark the answers against the talk and record the attempt.
  fn complete_assignment(
    &self,
    tenant_id: Uuid,
    id: Uuid,
    completion: AssignmentCompletion,
  ) -> impl Future<Output = Result<AssignmentOutcome, Self::Error>> + Send + '_;
}
