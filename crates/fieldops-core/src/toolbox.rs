//! Toolbox talks, their recurring schedules, and the assignments that
//! schedules produce.
//!
//! Processing a schedule materialises one [`ScheduledTalk`] per target
//! employee for the schedule's `next_run_date`, then advances the schedule by
//! its recurrence. The date arithmetic lives here in [`Schedule::advance`];
//! the store performs the inserts and the advance in one transaction.

use chrono::{DateTime, Days, Months, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use uuid::Uuid;

use crate::{Error, Result, common::require_text};

// ─── Talks ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TalkSection {
  pub id:         Uuid,
  pub heading:    String,
  pub body:       String,
  pub sort_order: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TalkQuestion {
  pub id:             Uuid,
  pub text:           String,
  pub options:        Vec<String>,
  /// Index into `options`.
  pub correct_option: usize,
  pub sort_order:     i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolboxTalk {
  pub id:         Uuid,
  pub tenant_id:  Uuid,
  pub title:      String,
  pub summary:    Option<String>,
  pub category:   Option<String>,
  /// Percentage of questions that must be answered correctly.
  pub pass_mark:  u8,
  pub is_active:  bool,
  pub sections:   Vec<TalkSection>,
  pub questions:  Vec<TalkQuestion>,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

/// The outcome of marking a set of answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizResult {
  pub correct: usize,
  pub total:   usize,
  /// Whole-number percentage, rounded down.
  pub score:   u8,
  pub passed:  bool,
}

impl ToolboxTalk {
  /// Mark `answers` (one option index per question, in question order).
  ///
  /// A talk without questions always passes with a score of 100.
  pub fn mark(&self, answers: &[usize]) -> Result<QuizResult> {
    let total = self.questions.len();
    if total == 0 {
      return Ok(QuizResult { correct: 0, total: 0, score: 100, passed: true });
    }
    if answers.len() != total {
      return Err(Error::validation(format!(
        "expected {total} answers, got {}",
        answers.len()
      )));
    }
    let correct = self
      .questions
      .iter()
      .zip(answers)
      .filter(|(q, a)| q.correct_option == **a)
      .count();
    let score = (correct * 100 / total) as u8;
    Ok(QuizResult { correct, total, score, passed: score >= self.pass_mark })
  }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TalkSectionInput {
  pub heading: String,
  #[serde(default)]
  pub body:    String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TalkQuestionInput {
  pub text:           String,
  pub options:        Vec<String>,
  pub correct_option: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolboxTalkInput {
  pub title:     String,
  pub summary:   Option<String>,
  pub category:  Option<String>,
  #[serde(default = "default_pass_mark")]
  pub pass_mark: u8,
  #[serde(default = "default_true")]
  pub is_active: bool,
  #[serde(default)]
  pub sections:  Vec<TalkSectionInput>,
  #[serde(default)]
  pub questions: Vec<TalkQuestionInput>,
}

fn default_pass_mark() -> u8 { 80 }

fn default_true() -> bool { true }

impl ToolboxTalkInput {
  pub fn validate(&self) -> Result<()> {
    require_text("title", &self.title)?;
    if self.pass_mark > 100 {
      return Err(Error::validation("pass_mark must be between 0 and 100"));
    }
    for section in &self.sections {
      require_text("section heading", &section.heading)?;
    }
    for question in &self.questions {
      require_text("question", &question.text)?;
      if question.options.len() < 2 {
        return Err(Error::validation(format!(
          "question {:?} needs at least two options",
          question.text
        )));
      }
      if question.correct_option >= question.options.len() {
        return Err(Error::validation(format!(
          "question {:?} has no option {}",
          question.text, question.correct_option
        )));
      }
    }
    Ok(())
  }
}

// ─── Schedules ───────────────────────────────────────────────────────────────

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Frequency {
  Once,
  Weekly,
  Monthly,
}

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ScheduleStatus {
  Active,
  Completed,
  Cancelled,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Schedule {
  pub id:            Uuid,
  pub tenant_id:     Uuid,
  pub talk_id:       Uuid,
  pub frequency:     Frequency,
  pub start_date:    NaiveDate,
  /// The date the next run will be stamped with.
  pub next_run_date: NaiveDate,
  /// Last date a run may fall on; open-ended when `None`.
  pub end_date:      Option<NaiveDate>,
  pub last_run_date: Option<NaiveDate>,
  /// Days after the run date an assignment falls due.
  pub due_days:      u32,
  pub status:        ScheduleStatus,
  pub employee_ids:  Vec<Uuid>,
  pub created_at:    DateTime<Utc>,
  pub updated_at:    DateTime<Utc>,
}

/// The state a schedule moves to after one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduleAdvance {
  pub run_date:      NaiveDate,
  pub due_date:      NaiveDate,
  pub next_run_date: NaiveDate,
  pub status:        ScheduleStatus,
}

impl Schedule {
  pub fn is_due(&self, today: NaiveDate) -> bool {
    self.status == ScheduleStatus::Active && self.next_run_date <= today
  }

  /// Status after `end_date` is edited on a schedule that has already run.
  /// A schedule whose next run now falls past its end has nothing left to do.
  pub fn status_after_end_change(&self, end_date: Option<NaiveDate>) -> ScheduleStatus {
    match end_date {
      Some(end) if self.last_run_date.is_some() && self.next_run_date > end => {
        ScheduleStatus::Completed
      }
      _ => self.status,
    }
  }

  /// Work out the run being processed now and where the schedule goes next.
  ///
  /// Once schedules complete after their single run. Recurring schedules
  /// step forward by seven days or one calendar month (clamped to the end
  /// of shorter months) and complete once the next date is past `end_date`.
  pub fn advance(&self) -> Result<ScheduleAdvance> {
    if self.status != ScheduleStatus::Active {
      return Err(Error::InvalidTransition {
        entity: "schedule",
        from:   self.status.to_string(),
        action: "process",
      });
    }

    let run_date = self.next_run_date;
    if let Some(end) = self.end_date
      && run_date > end
    {
      return Err(Error::validation(format!(
        "schedule ended on {end}; next run {run_date} is past it"
      )));
    }
    let due_date = add_days(run_date, self.due_days)?;

    let (next_run_date, mut status) = match self.frequency {
      Frequency::Once => (run_date, ScheduleStatus::Completed),
      Frequency::Weekly => (add_days(run_date, 7)?, ScheduleStatus::Active),
      Frequency::Monthly => (
        run_date
          .checked_add_months(Months::new(1))
          .ok_or_else(|| Error::validation("schedule date out of range"))?,
        ScheduleStatus::Active,
      ),
    };

    if let Some(end) = self.end_date
      && next_run_date > end
    {
      status = ScheduleStatus::Completed;
    }

    Ok(ScheduleAdvance { run_date, due_date, next_run_date, status })
  }
}

fn add_days(date: NaiveDate, days: u32) -> Result<NaiveDate> {
  date
    .checked_add_days(Days::new(u64::from(days)))
    .ok_or_else(|| Error::validation("schedule date out of range"))
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleInput {
  pub talk_id:      Uuid,
  pub frequency:    Frequency,
  pub start_date:   NaiveDate,
  pub end_date:     Option<NaiveDate>,
  #[serde(default = "default_due_days")]
  pub due_days:     u32,
  pub employee_ids: Vec<Uuid>,
}

fn default_due_days() -> u32 { 7 }

impl ScheduleInput {
  pub fn validate(&self) -> Result<()> {
    if self.employee_ids.is_empty() {
      return Err(Error::validation("a schedule needs at least one employee"));
    }
    if let Some(end) = self.end_date
      && end < self.start_date
    {
      return Err(Error::validation("end_date is before start_date"));
    }
    Ok(())
  }
}

/// Result of processing one schedule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleRun {
  pub schedule:    Schedule,
  pub run_date:    NaiveDate,
  /// Assignments created by this run; employees who already had one for the
  /// run date are skipped.
  pub assignments: Vec<ScheduledTalk>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScheduleFilter {
  pub status:  Option<ScheduleStatus>,
  pub talk_id: Option<Uuid>,
}

// ─── Assignments ─────────────────────────────────────────────────────────────

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AssignmentStatus {
  Pending,
  InProgress,
  Completed,
}

/// A talk assigned to one employee for one run date.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduledTalk {
  pub id:             Uuid,
  pub tenant_id:      Uuid,
  pub schedule_id:    Option<Uuid>,
  pub talk_id:        Uuid,
  pub employee_id:    Uuid,
  pub scheduled_date: NaiveDate,
  pub due_date:       NaiveDate,
  pub status:         AssignmentStatus,
  pub attempts:       u32,
  pub score:          Option<u8>,
  pub completed_at:   Option<DateTime<Utc>>,
  pub created_at:     DateTime<Utc>,
  pub updated_at:     DateTime<Utc>,
}

impl ScheduledTalk {
  pub fn is_overdue(&self, today: NaiveDate) -> bool {
    self.status != AssignmentStatus::Completed && self.due_date < today
  }

  pub fn start(&self) -> Result<AssignmentStatus> {
    match self.status {
      AssignmentStatus::Pending | AssignmentStatus::InProgress => {
        Ok(AssignmentStatus::InProgress)
      }
      AssignmentStatus::Completed => Err(self.already_completed("start")),
    }
  }

  /// Mark `answers` against `talk` and work out the status after the
  /// attempt. A completed assignment refuses before anything is marked.
  pub fn record_attempt(
    &self,
    talk: &ToolboxTalk,
    answers: &[usize],
  ) -> Result<(AssignmentStatus, QuizResult)> {
    if self.status == AssignmentStatus::Completed {
      return Err(self.already_completed("complete"));
    }
    let result = talk.mark(answers)?;
    let next = if result.passed {
      AssignmentStatus::Completed
    } else {
      AssignmentStatus::InProgress
    };
    Ok((next, result))
  }

  fn already_completed(&self, action: &'static str) -> Error {
    Error::InvalidTransition {
      entity: "toolbox talk assignment",
      from:   self.status.to_string(),
      action,
    }
  }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssignmentCompletion {
  #[serde(default)]
  pub answers: Vec<usize>,
}

/// An assignment after a completion attempt, with the marking result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssignmentOutcome {
  pub assignment: ScheduledTalk,
  pub result:     QuizResult,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AssignmentFilter {
  pub employee_id: Option<Uuid>,
  pub schedule_id: Option<Uuid>,
  pub status:      Option<AssignmentStatus>,
  /// Only assignments past their due date and not completed, as of `today`.
  #[serde(default)]
  pub overdue:     bool,
}

#[cfg(test)]
mod tests {
  use super::*;

  fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
  }

  fn schedule(frequency: Frequency, next: NaiveDate, end: Option<NaiveDate>) -> Schedule {
    Schedule {
      id: Uuid::new_v4(),
      tenant_id: Uuid::new_v4(),
      talk_id: Uuid::new_v4(),
      frequency,
      start_date: next,
      next_run_date: next,
      end_date: end,
      last_run_date: None,
      due_days: 7,
      status: ScheduleStatus::Active,
      employee_ids: vec![Uuid::new_v4()],
      created_at: Utc::now(),
      updated_at: Utc::now(),
    }
  }

  fn talk(pass_mark: u8, correct: &[usize]) -> ToolboxTalk {
    ToolboxTalk {
      id: Uuid::new_v4(),
      tenant_id: Uuid::new_v4(),
      title: "Manual handling".into(),
      summary: None,
      category: None,
      pass_mark,
      is_active: true,
      sections: vec![],
      questions: correct
        .iter()
        .enumerate()
        .map(|(i, c)| TalkQuestion {
          id: Uuid::new_v4(),
          text: format!("Q{i}"),
          options: vec!["a".into(), "b".into(), "c".into()],
          correct_option: *c,
          sort_order: i as i64,
        })
        .collect(),
      created_at: Utc::now(),
      updated_at: Utc::now(),
    }
  }

  // ── Recurrence ────────────────────────────────────────────────────────────

  #[test]
  fn once_completes_after_single_run() {
    let s = schedule(Frequency::Once, date(2026, 3, 2), None);
    let adv = s.advance().unwrap();
    assert_eq!(adv.run_date, date(2026, 3, 2));
    assert_eq!(adv.due_date, date(2026, 3, 9));
    assert_eq!(adv.status, ScheduleStatus::Completed);
  }

  #[test]
  fn weekly_advances_seven_days() {
    let s = schedule(Frequency::Weekly, date(2026, 3, 2), Some(date(2026, 3, 31)));
    let adv = s.advance().unwrap();
    assert_eq!(adv.next_run_date, date(2026, 3, 9));
    assert_eq!(adv.status, ScheduleStatus::Active);
  }

  #[test]
  fn weekly_completes_past_end_date() {
    let s = schedule(Frequency::Weekly, date(2026, 3, 30), Some(date(2026, 4, 5)));
    let adv = s.advance().unwrap();
    assert_eq!(adv.next_run_date, date(2026, 4, 6));
    assert_eq!(adv.status, ScheduleStatus::Completed);
  }

  #[test]
  fn run_on_end_date_stays_active_until_passed() {
    let s = schedule(Frequency::Weekly, date(2026, 3, 23), Some(date(2026, 3, 30)));
    let adv = s.advance().unwrap();
    assert_eq!(adv.next_run_date, date(2026, 3, 30));
    assert_eq!(adv.status, ScheduleStatus::Active);
  }

  #[test]
  fn monthly_clamps_to_month_end() {
    let s = schedule(Frequency::Monthly, date(2026, 1, 31), None);
    assert_eq!(s.advance().unwrap().next_run_date, date(2026, 2, 28));
  }

  #[test]
  fn completed_schedule_cannot_be_processed() {
    let mut s = schedule(Frequency::Weekly, date(2026, 3, 2), None);
    s.status = ScheduleStatus::Completed;
    assert!(matches!(s.advance(), Err(Error::InvalidTransition { .. })));
  }

  #[test]
  fn run_past_end_date_is_refused() {
    let mut s = schedule(Frequency::Weekly, date(2026, 3, 16), Some(date(2026, 3, 3)));
    s.last_run_date = Some(date(2026, 3, 9));
    assert!(matches!(s.advance(), Err(Error::Validation(_))));
  }

  #[test]
  fn pulling_end_date_before_next_run_completes() {
    let mut s = schedule(Frequency::Weekly, date(2026, 3, 16), None);
    assert_eq!(
      s.status_after_end_change(Some(date(2026, 3, 3))),
      ScheduleStatus::Active,
    );
    s.last_run_date = Some(date(2026, 3, 9));
    assert_eq!(
      s.status_after_end_change(Some(date(2026, 3, 3))),
      ScheduleStatus::Completed,
    );
    assert_eq!(
      s.status_after_end_change(Some(date(2026, 3, 16))),
      ScheduleStatus::Active,
    );
    assert_eq!(s.status_after_end_change(None), ScheduleStatus::Active);
  }

  #[test]
  fn due_only_when_active_and_reached() {
    let s = schedule(Frequency::Weekly, date(2026, 3, 2), None);
    assert!(!s.is_due(date(2026, 3, 1)));
    assert!(s.is_due(date(2026, 3, 2)));
  }

  // ── Marking ───────────────────────────────────────────────────────────────

  #[test]
  fn marking_against_pass_mark() {
    let t = talk(75, &[0, 1, 2, 0]);
    let r = t.mark(&[0, 1, 2, 1]).unwrap();
    assert_eq!((r.correct, r.score, r.passed), (3, 75, true));
    let r = t.mark(&[0, 1, 0, 1]).unwrap();
    assert_eq!((r.correct, r.score, r.passed), (2, 50, false));
  }

  #[test]
  fn wrong_number_of_answers_rejected() {
    let t = talk(80, &[0, 1]);
    assert!(t.mark(&[0]).is_err());
  }

  #[test]
  fn talk_without_questions_passes() {
    let t = talk(80, &[]);
    assert!(t.mark(&[]).unwrap().passed);
  }

  fn assignment(status: AssignmentStatus) -> ScheduledTalk {
    ScheduledTalk {
      id: Uuid::new_v4(),
      tenant_id: Uuid::new_v4(),
      schedule_id: None,
      talk_id: Uuid::new_v4(),
      employee_id: Uuid::new_v4(),
      scheduled_date: date(2026, 3, 2),
      due_date: date(2026, 3, 9),
      status,
      attempts: 0,
      score: None,
      completed_at: None,
      created_at: Utc::now(),
      updated_at: Utc::now(),
    }
  }

  #[test]
  fn attempt_on_completed_assignment_refused_before_marking() {
    let t = talk(80, &[0, 1]);
    let err = assignment(AssignmentStatus::Completed)
      .record_attempt(&t, &[0])
      .unwrap_err();
    assert!(matches!(err, Error::InvalidTransition { action: "complete", .. }));
  }

  #[test]
  fn failed_attempt_leaves_assignment_in_progress() {
    let t = talk(80, &[0, 1]);
    let a = assignment(AssignmentStatus::Pending);
    let (next, result) = a.record_attempt(&t, &[1, 1]).unwrap();
    assert_eq!((next, result.score), (AssignmentStatus::InProgress, 50));
    let (next, _) = a.record_attempt(&t, &[0, 1]).unwrap();
    assert_eq!(next, AssignmentStatus::Completed);
  }

  #[test]
  fn question_needs_valid_correct_option() {
    let input = ToolboxTalkInput {
      title:     "Ladders".into(),
      summary:   None,
      category:  None,
      pass_mark: 80,
      is_active: true,
      sections:  vec![],
      questions: vec![TalkQuestionInput {
        text:           "Three points of contact?".into(),
        options:        vec!["yes".into(), "no".into()],
        correct_option: 2,
      }],
    };
    assert!(input.validate().is_err());
  }
}
