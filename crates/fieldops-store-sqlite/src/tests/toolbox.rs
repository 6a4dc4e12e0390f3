use chrono::NaiveDate;
use fieldops_core::{
  common::ListQuery,
  directory::EmployeeInput,
  store::{DirectoryStore, ToolboxStore},
  toolbox::{
    AssignmentCompletion, AssignmentFilter, AssignmentStatus, Frequency,
    ScheduleFilter, ScheduleInput, ScheduleStatus, TalkQuestionInput,
    TalkSectionInput, ToolboxTalkInput,
  },
};
use uuid::Uuid;

use super::*;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
  NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn talk_input() -> ToolboxTalkInput {
  ToolboxTalkInput {
    title:     "Ladder safety".into(),
    summary:   Some("Short-duration work at height".into()),
    category:  Some("Access".into()),
    pass_mark: 50,
    is_active: true,
    sections:  vec![
      TalkSectionInput { heading: "Inspection".into(), body: "Check the feet.".into() },
      TalkSectionInput { heading: "Use".into(), body: "Three points of contact.".into() },
    ],
    questions: vec![
      TalkQuestionInput {
        text:           "Points of contact?".into(),
        options:        vec!["One".into(), "Two".into(), "Three".into()],
        correct_option: 2,
      },
      TalkQuestionInput {
        text:           "Inspect before use?".into(),
        options:        vec!["Yes".into(), "No".into()],
        correct_option: 0,
      },
    ],
  }
}

struct Setup {
  s:         SqliteStore,
  tenant:    Uuid,
  talk:      Uuid,
  employees: Vec<Uuid>,
}

async fn setup() -> Setup {
  let (s, tenant) = tenant_store().await;
  let talk = s.create_talk(tenant, talk_input()).await.unwrap().id;
  let mut employees = Vec::new();
  for name in ["Amy", "Ben"] {
    employees.push(employee(&s, tenant, name).await);
  }
  Setup { s, tenant, talk, employees }
}

fn schedule_input(setup: &Setup, frequency: Frequency, start: NaiveDate) -> ScheduleInput {
  ScheduleInput {
    talk_id: setup.talk,
    frequency,
    start_date: start,
    end_date: None,
    due_days: 7,
    employee_ids: setup.employees.clone(),
  }
}

async fn first_assignment(setup: &Setup) -> Uuid {
  let schedule = setup
    .s
    .create_schedule(
      setup.tenant,
      schedule_input(setup, Frequency::Once, date(2026, 3, 2)),
    )
    .await
    .unwrap();
  let run = setup
    .s
    .process_schedule(setup.tenant, schedule.id)
    .await
    .unwrap();
  run.assignments[0].id
}

// ─── Talks ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn talk_round_trips_sections_and_questions() {
  let setup = setup().await;
  let talk = setup.s.get_talk(setup.tenant, setup.talk).await.unwrap().unwrap();
  assert_eq!(talk.sections.len(), 2);
  assert_eq!(talk.sections[1].heading, "Use");
  assert_eq!(talk.questions[0].options, ["One", "Two", "Three"]);
  assert_eq!(talk.questions[0].correct_option, 2);
}

#[tokio::test]
async fn updating_a_talk_replaces_its_questions() {
  let setup = setup().await;
  let mut input = talk_input();
  input.questions.truncate(1);
  let talk = setup
    .s
    .update_talk(setup.tenant, setup.talk, input)
    .await
    .unwrap();
  assert_eq!(talk.questions.len(), 1);
}

#[tokio::test]
async fn deleting_a_talk_cancels_its_schedules() {
  let setup = setup().await;
  let schedule = setup
    .s
    .create_schedule(
      setup.tenant,
      schedule_input(&setup, Frequency::Weekly, date(2026, 3, 2)),
    )
    .await
    .unwrap();

  setup.s.delete_talk(setup.tenant, setup.talk).await.unwrap();
  let schedule = setup
    .s
    .get_schedule(setup.tenant, schedule.id)
    .await
    .unwrap()
    .unwrap();
  assert_eq!(schedule.status, ScheduleStatus::Cancelled);
}

// ─── Schedules ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn schedule_starts_active_at_start_date() {
  let setup = setup().await;
  let schedule = setup
    .s
    .create_schedule(
      setup.tenant,
      schedule_input(&setup, Frequency::Weekly, date(2026, 3, 2)),
    )
    .await
    .unwrap();
  assert_eq!(schedule.status, ScheduleStatus::Active);
  assert_eq!(schedule.next_run_date, date(2026, 3, 2));
  assert_eq!(schedule.employee_ids.len(), 2);
}

#[tokio::test]
async fn schedule_rejects_unknown_employee() {
  let setup = setup().await;
  let mut input = schedule_input(&setup, Frequency::Weekly, date(2026, 3, 2));
  input.employee_ids.push(Uuid::new_v4());
  let err = setup.s.create_schedule(setup.tenant, input).await.unwrap_err();
  assert!(is_not_found(&err));
}

#[tokio::test]
async fn once_schedule_completes_after_processing() {
  let setup = setup().await;
  let schedule = setup
    .s
    .create_schedule(
      setup.tenant,
      schedule_input(&setup, Frequency::Once, date(2026, 3, 2)),
    )
    .await
    .unwrap();

  let run = setup
    .s
    .process_schedule(setup.tenant, schedule.id)
    .await
    .unwrap();
  assert_eq!(run.run_date, date(2026, 3, 2));
  assert_eq!(run.assignments.len(), 2);
  assert!(run.assignments.iter().all(|a| a.due_date == date(2026, 3, 9)));
  assert_eq!(run.schedule.status, ScheduleStatus::Completed);
  assert_eq!(run.schedule.last_run_date, Some(date(2026, 3, 2)));

  let err = setup
    .s
    .process_schedule(setup.tenant, schedule.id)
    .await
    .unwrap_err();
  assert!(is_invalid_transition(&err));
}

#[tokio::test]
async fn weekly_schedule_advances_seven_days() {
  let setup = setup().await;
  let schedule = setup
    .s
    .create_schedule(
      setup.tenant,
      schedule_input(&setup, Frequency::Weekly, date(2026, 3, 2)),
    )
    .await
    .unwrap();
  let run = setup
    .s
    .process_schedule(setup.tenant, schedule.id)
    .await
    .unwrap();
  assert_eq!(run.schedule.status, ScheduleStatus::Active);
  assert_eq!(run.schedule.next_run_date, date(2026, 3, 9));
}

#[tokio::test]
async fn weekly_schedule_runs_until_end_date() {
  let setup = setup().await;
  let mut input = schedule_input(&setup, Frequency::Weekly, date(2026, 3, 2));
  input.end_date = Some(date(2026, 3, 16));
  let schedule = setup.s.create_schedule(setup.tenant, input).await.unwrap();

  let mut run_dates = Vec::new();
  for _ in 0..3 {
    let run = setup
      .s
      .process_schedule(setup.tenant, schedule.id)
      .await
      .unwrap();
    assert_eq!(run.assignments.len(), 2);
    run_dates.push(run.run_date);
    if run.run_date < date(2026, 3, 16) {
      assert_eq!(run.schedule.status, ScheduleStatus::Active);
    } else {
      assert_eq!(run.schedule.status, ScheduleStatus::Completed);
    }
  }
  assert_eq!(run_dates, [date(2026, 3, 2), date(2026, 3, 9), date(2026, 3, 16)]);

  let err = setup
    .s
    .process_schedule(setup.tenant, schedule.id)
    .await
    .unwrap_err();
  assert!(is_invalid_transition(&err));
}

#[tokio::test]
async fn monthly_schedule_clamps_to_month_end() {
  let setup = setup().await;
  let schedule = setup
    .s
    .create_schedule(
      setup.tenant,
      schedule_input(&setup, Frequency::Monthly, date(2026, 1, 31)),
    )
    .await
    .unwrap();

  let run = setup
    .s
    .process_schedule(setup.tenant, schedule.id)
    .await
    .unwrap();
  assert_eq!(run.run_date, date(2026, 1, 31));
  assert_eq!(run.schedule.next_run_date, date(2026, 2, 28));

  let run = setup
    .s
    .process_schedule(setup.tenant, schedule.id)
    .await
    .unwrap();
  assert_eq!(run.run_date, date(2026, 2, 28));
  assert!(run.assignments.iter().all(|a| a.scheduled_date == date(2026, 2, 28)));
  assert!(run.assignments.iter().all(|a| a.due_date == date(2026, 3, 7)));
  assert_eq!(run.schedule.next_run_date, date(2026, 3, 28));
}

#[tokio::test]
async fn moving_end_date_before_next_run_completes_schedule() {
  let setup = setup().await;
  let input = schedule_input(&setup, Frequency::Weekly, date(2026, 3, 2));
  let schedule = setup.s.create_schedule(setup.tenant, input.clone()).await.unwrap();
  for _ in 0..2 {
    setup
      .s
      .process_schedule(setup.tenant, schedule.id)
      .await
      .unwrap();
  }

  let edited = setup
    .s
    .update_schedule(setup.tenant, schedule.id, ScheduleInput {
      end_date: Some(date(2026, 3, 3)),
      ..input
    })
    .await
    .unwrap();
  assert_eq!(edited.status, ScheduleStatus::Completed);

  let runs = setup
    .s
    .process_due_schedules(Some(setup.tenant), date(2026, 3, 31))
    .await
    .unwrap();
  assert!(runs.is_empty());

  let page = setup
    .s
    .list_assignments(
      setup.tenant,
      AssignmentFilter { schedule_id: Some(schedule.id), ..Default::default() },
      date(2026, 3, 31),
      ListQuery::default(),
    )
    .await
    .unwrap();
  assert_eq!(page.total_count, 4);
  assert!(page.items.iter().all(|a| a.scheduled_date <= date(2026, 3, 9)));
}

#[tokio::test]
async fn inactive_employees_are_skipped() {
  let setup = setup().await;
  let amy = setup.employees[0];
  setup
    .s
    .update_employee(setup.tenant, amy, EmployeeInput {
      is_active: false,
      ..employee_input("Amy", "Smith")
    })
    .await
    .unwrap();

  let schedule = setup
    .s
    .create_schedule(
      setup.tenant,
      schedule_input(&setup, Frequency::Once, date(2026, 3, 2)),
    )
    .await
    .unwrap();
  let run = setup
    .s
    .process_schedule(setup.tenant, schedule.id)
    .await
    .unwrap();
  assert_eq!(run.assignments.len(), 1);
  assert_eq!(run.assignments[0].employee_id, setup.employees[1]);
}

#[tokio::test]
async fn sweep_runs_each_due_schedule_once() {
  let setup = setup().await;
  let due = setup
    .s
    .create_schedule(
      setup.tenant,
      schedule_input(&setup, Frequency::Weekly, date(2026, 3, 2)),
    )
    .await
    .unwrap();
  setup
    .s
    .create_schedule(
      setup.tenant,
      schedule_input(&setup, Frequency::Weekly, date(2026, 4, 1)),
    )
    .await
    .unwrap();

  // Three weeks behind, but one sweep only performs one run.
  let runs = setup
    .s
    .process_due_schedules(None, date(2026, 3, 20))
    .await
    .unwrap();
  assert_eq!(runs.len(), 1);
  assert_eq!(runs[0].schedule.id, due.id);
  assert_eq!(runs[0].schedule.next_run_date, date(2026, 3, 9));
}

#[tokio::test]
async fn sweep_can_be_limited_to_a_tenant() {
  let setup = setup().await;
  setup
    .s
    .create_schedule(
      setup.tenant,
      schedule_input(&setup, Frequency::Once, date(2026, 3, 2)),
    )
    .await
    .unwrap();
  let other = second_tenant(&setup.s).await;

  let runs = setup
    .s
    .process_due_schedules(Some(other), date(2026, 3, 20))
    .await
    .unwrap();
  assert!(runs.is_empty());
}

#[tokio::test]
async fn cancelled_schedule_is_not_processed() {
  let setup = setup().await;
  let schedule = setup
    .s
    .create_schedule(
      setup.tenant,
      schedule_input(&setup, Frequency::Weekly, date(2026, 3, 2)),
    )
    .await
    .unwrap();
  setup.s.cancel_schedule(setup.tenant, schedule.id).await.unwrap();

  let runs = setup
    .s
    .process_due_schedules(Some(setup.tenant), date(2026, 3, 20))
    .await
    .unwrap();
  assert!(runs.is_empty());

  let err = setup
    .s
    .cancel_schedule(setup.tenant, schedule.id)
    .await
    .unwrap_err();
  assert!(is_invalid_transition(&err));
}

#[tokio::test]
async fn list_schedules_filters_by_status() {
  let setup = setup().await;
  let schedule = setup
    .s
    .create_schedule(
      setup.tenant,
      schedule_input(&setup, Frequency::Once, date(2026, 3, 2)),
    )
    .await
    .unwrap();
  setup
    .s
    .process_schedule(setup.tenant, schedule.id)
    .await
    .unwrap();

  let active = setup
    .s
    .list_schedules(
      setup.tenant,
      ScheduleFilter { status: Some(ScheduleStatus::Active), ..Default::default() },
      ListQuery::default(),
    )
    .await
    .unwrap();
  assert_eq!(active.total_count, 0);
}

// ─── Assignments ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn failed_attempt_keeps_assignment_open() {
  let setup = setup().await;
  let id = first_assignment(&setup).await;

  let outcome = setup
    .s
    .complete_assignment(setup.tenant, id, AssignmentCompletion { answers: vec![0, 1] })
    .await
    .unwrap();
  assert!(!outcome.result.passed);
  assert_eq!(outcome.result.score, 0);
  assert_eq!(outcome.assignment.status, AssignmentStatus::InProgress);
  assert_eq!(outcome.assignment.attempts, 1);
  assert!(outcome.assignment.completed_at.is_none());
}

#[tokio::test]
async fn passing_attempt_completes_assignment() {
  let setup = setup().await;
  let id = first_assignment(&setup).await;

  setup
    .s
    .complete_assignment(setup.tenant, id, AssignmentCompletion { answers: vec![0, 1] })
    .await
    .unwrap();
  let outcome = setup
    .s
    .complete_assignment(setup.tenant, id, AssignmentCompletion { answers: vec![2, 1] })
    .await
    .unwrap();
  assert!(outcome.result.passed);
  assert_eq!(outcome.result.score, 50);
  assert_eq!(outcome.assignment.status, AssignmentStatus::Completed);
  assert_eq!(outcome.assignment.attempts, 2);
  assert_eq!(outcome.assignment.score, Some(50));
  assert!(outcome.assignment.completed_at.is_some());

  let err = setup
    .s
    .complete_assignment(setup.tenant, id, AssignmentCompletion { answers: vec![2, 0] })
    .await
    .unwrap_err();
  assert!(is_invalid_transition(&err));
}

#[tokio::test]
async fn completed_assignment_refuses_any_further_attempt() {
  let setup = setup().await;
  let id = first_assignment(&setup).await;
  setup
    .s
    .complete_assignment(setup.tenant, id, AssignmentCompletion { answers: vec![2, 0] })
    .await
    .unwrap();

  let err = setup
    .s
    .complete_assignment(setup.tenant, id, AssignmentCompletion { answers: vec![2] })
    .await
    .unwrap_err();
  assert!(is_invalid_transition(&err));
}

#[tokio::test]
async fn assignment_can_be_completed_after_its_talk_is_deleted() {
  let setup = setup().await;
  let id = first_assignment(&setup).await;
  setup.s.delete_talk(setup.tenant, setup.talk).await.unwrap();

  let a = setup.s.get_assignment(setup.tenant, id).await.unwrap().unwrap();
  assert_eq!(a.status, AssignmentStatus::Pending);

  let outcome = setup
    .s
    .complete_assignment(setup.tenant, id, AssignmentCompletion { answers: vec![2, 0] })
    .await
    .unwrap();
  assert!(outcome.result.passed);
  assert_eq!(outcome.assignment.status, AssignmentStatus::Completed);
}

#[tokio::test]
async fn wrong_answer_count_is_rejected() {
  let setup = setup().await;
  let id = first_assignment(&setup).await;
  let err = setup
    .s
    .complete_assignment(setup.tenant, id, AssignmentCompletion { answers: vec![2] })
    .await
    .unwrap_err();
  assert!(is_validation(&err));

  let a = setup.s.get_assignment(setup.tenant, id).await.unwrap().unwrap();
  assert_eq!(a.attempts, 0);
}

#[tokio::test]
async fn start_moves_to_in_progress() {
  let setup = setup().await;
  let id = first_assignment(&setup).await;
  let a = setup.s.start_assignment(setup.tenant, id).await.unwrap();
  assert_eq!(a.status, AssignmentStatus::InProgress);
}

#[tokio::test]
async fn overdue_filter_excludes_completed() {
  let setup = setup().await;
  let id = first_assignment(&setup).await;
  setup
    .s
    .complete_assignment(setup.tenant, id, AssignmentCompletion { answers: vec![2, 0] })
    .await
    .unwrap();

  let overdue = AssignmentFilter { overdue: true, ..Default::default() };
  let page = setup
    .s
    .list_assignments(setup.tenant, overdue.clone(), date(2026, 3, 10), ListQuery::default())
    .await
    .unwrap();
  assert_eq!(page.total_count, 1);
  assert_ne!(page.items[0].id, id);

  let page = setup
    .s
    .list_assignments(setup.tenant, overdue, date(2026, 3, 9), ListQuery::default())
    .await
    .unwrap();
  assert_eq!(page.total_count, 0);
}

#[tokio::test]
async fn assignments_filter_by_employee() {
  let setup = setup().await;
  first_assignment(&setup).await;
  let page = setup
    .s
    .list_assignments(
      setup.tenant,
      AssignmentFilter {
        employee_id: Some(setup.employees[1]),
        ..Default::default()
      },
      date(2026, 3, 2),
      ListQuery::default(),
    )
    .await
    .unwrap();
  assert_eq!(page.total_count, 1);
  assert_eq!(page.items[0].employee_id, setup.employees[1]);
}
