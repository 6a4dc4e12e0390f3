//! Toolbox talks, schedules, and the assignments schedules produce.

use chrono::{NaiveDate, Utc};
use fieldops_core::{
  Error as CoreError,
  common::{ListQuery, Page},
  store::ToolboxStore,
  toolbox::{
    AssignmentCompletion, AssignmentFilter, AssignmentOutcome, AssignmentStatus,
    Schedule, ScheduleFilter, ScheduleInput, ScheduleRun, ScheduleStatus,
    ScheduledTalk, TalkQuestion, TalkSection, ToolboxTalk, ToolboxTalkInput,
  },
};
use rusqlite::{Connection, Row};
use uuid::Uuid;

use super::{
  SqliteStore, TxError,
  directory::EMPLOYEES,
  query::{
    Table, fetch as fetch_row, get_any_row, get_row, list_page, not_found, now,
    push_uuid, require_ref, soft_delete, text, uuid_value,
  },
};
use crate::{
  Result,
  encode::{
    encode_date, encode_dt, encode_opt_date, encode_uuid, int_col, json_col, parse_col,
    parse_opt_col,
  },
};

const TALKS: Table = Table {
  name:          "toolbox_talks",
  entity:        "toolbox talk",
  search:        &["title", "summary", "category"],
  sorts:         &[
    ("title", "title"),
    ("category", "category"),
    ("created_at", "created_at"),
  ],
  default_order: "title",
  soft_delete:   true,
};

const SCHEDULES: Table = Table {
  name:          "toolbox_schedules",
  entity:        "schedule",
  search:        &[],
  sorts:         &[
    ("next_run_date", "next_run_date"),
    ("start_date", "start_date"),
    ("status", "status"),
    ("created_at", "created_at"),
  ],
  default_order: "next_run_date",
  soft_delete:   true,
};

const ASSIGNMENTS: Table = Table {
  name:          "scheduled_talks",
  entity:        "toolbox talk assignment",
  search:        &[],
  sorts:         &[
    ("scheduled_date", "scheduled_date"),
    ("due_date", "due_date"),
    ("status", "status"),
    ("created_at", "created_at"),
  ],
  default_order: "due_date",
  soft_delete:   false,
};

// ─── Talks ───────────────────────────────────────────────────────────────────

fn talk_from_row(row: &Row<'_>) -> rusqlite::Result<ToolboxTalk> {
  Ok(ToolboxTalk {
    id:         parse_col(row, "id")?,
    tenant_id:  parse_col(row, "tenant_id")?,
    title:      row.get("title")?,
    summary:    row.get("summary")?,
    category:   row.get("category")?,
    pass_mark:  int_col(row, "pass_mark")?,
    is_active:  row.get("is_active")?,
    sections:   Vec::new(),
    questions:  Vec::new(),
    created_at: parse_col(row, "created_at")?,
    updated_at: parse_col(row, "updated_at")?,
  })
}

fn load_talk_children(conn: &Connection, talk: &mut ToolboxTalk) -> rusqlite::Result<()> {
  let talk_id = encode_uuid(talk.id);
  talk.sections = conn
    .prepare("SELECT * FROM talk_sections WHERE talk_id = ?1 ORDER BY sort_order")?
    .query_map(rusqlite::params![talk_id], |row| {
      Ok(TalkSection {
        id:         parse_col(row, "id")?,
        heading:    row.get("heading")?,
        body:       row.get("body")?,
        sort_order: row.get("sort_order")?,
      })
    })?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  talk.questions = conn
    .prepare("SELECT * FROM talk_questions WHERE talk_id = ?1 ORDER BY sort_order")?
    .query_map(rusqlite::params![talk_id], |row| {
      Ok(TalkQuestion {
        id:             parse_col(row, "id")?,
        text:           row.get("text")?,
        options:        json_col(row, "options")?,
        correct_option: int_col(row, "correct_option")?,
        sort_order:     row.get("sort_order")?,
      })
    })?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  Ok(())
}

fn get_talk(conn: &Connection, tenant_id: Uuid, id: Uuid) -> rusqlite::Result<Option<ToolboxTalk>> {
  let Some(mut talk) = get_row(conn, &TALKS, tenant_id, id, talk_from_row)? else {
    return Ok(None);
  };
  load_talk_children(conn, &mut talk)?;
  Ok(Some(talk))
}

fn fetch_talk(conn: &Connection, tenant_id: Uuid, id: Uuid) -> Result<ToolboxTalk, TxError> {
  get_talk(conn, tenant_id, id)?.ok_or_else(|| not_found(&TALKS, id).into())
}

/// The talk an assignment was made for, even if it has since been deleted.
fn fetch_assigned_talk(
  conn: &Connection,
  tenant_id: Uuid,
  id: Uuid,
) -> Result<ToolboxTalk, TxError> {
  let mut talk = get_any_row(conn, &TALKS, tenant_id, id, talk_from_row)?
    .ok_or_else(|| not_found(&TALKS, id))?;
  load_talk_children(conn, &mut talk)?;
  Ok(talk)
}

/// Question options are stored as a JSON array; encoded before entering the
/// transaction.
struct EncodedTalk {
  input:   ToolboxTalkInput,
  options: Vec<String>,
}

fn encode_talk(input: ToolboxTalkInput) -> Result<EncodedTalk> {
  input.validate()?;
  let options = input
    .questions
    .iter()
    .map(|q| serde_json::to_string(&q.options))
    .collect::<Result<Vec<_>, _>>()?;
  Ok(EncodedTalk { input, options })
}

fn replace_talk_children(
  conn: &Connection,
  talk_id: Uuid,
  talk: &EncodedTalk,
) -> rusqlite::Result<()> {
  let id = encode_uuid(talk_id);
  conn.execute("DELETE FROM talk_sections WHERE talk_id = ?1", rusqlite::params![id])?;
  conn.execute("DELETE FROM talk_questions WHERE talk_id = ?1", rusqlite::params![id])?;

  for (sort_order, section) in talk.input.sections.iter().enumerate() {
    conn.execute(
      "INSERT INTO talk_sections (id, talk_id, heading, body, sort_order)
       VALUES (?1, ?2, ?3, ?4, ?5)",
      rusqlite::params![
        encode_uuid(Uuid::new_v4()),
        id,
        section.heading,
        section.body,
        sort_order as i64,
      ],
    )?;
  }
  for (sort_order, (question, options)) in
    talk.input.questions.iter().zip(&talk.options).enumerate()
  {
    conn.execute(
      "INSERT INTO talk_questions (id, talk_id, text, options, correct_option, sort_order)
       VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
      rusqlite::params![
        encode_uuid(Uuid::new_v4()),
        id,
        question.text,
        options,
        question.correct_option as i64,
        sort_order as i64,
      ],
    )?;
  }
  Ok(())
}

// ─── Schedules ───────────────────────────────────────────────────────────────

fn schedule_from_row(row: &Row<'_>) -> rusqlite::Result<Schedule> {
  Ok(Schedule {
    id:            parse_col(row, "id")?,
    tenant_id:     parse_col(row, "tenant_id")?,
    talk_id:       parse_col(row, "talk_id")?,
    frequency:     parse_col(row, "frequency")?,
    start_date:    parse_col(row, "start_date")?,
    next_run_date: parse_col(row, "next_run_date")?,
    end_date:      parse_opt_col(row, "end_date")?,
    last_run_date: parse_opt_col(row, "last_run_date")?,
    due_days:      int_col(row, "due_days")?,
    status:        parse_col(row, "status")?,
    employee_ids:  Vec::new(),
    created_at:    parse_col(row, "created_at")?,
    updated_at:    parse_col(row, "updated_at")?,
  })
}

fn load_employee_ids(conn: &Connection, schedule: &mut Schedule) -> rusqlite::Result<()> {
  schedule.employee_ids = conn
    .prepare(
      "SELECT employee_id FROM schedule_employees
       WHERE schedule_id = ?1 ORDER BY employee_id",
    )?
    .query_map(rusqlite::params![encode_uuid(schedule.id)], |row| {
      parse_col(row, "employee_id")
    })?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  Ok(())
}

fn get_schedule(
  conn: &Connection,
  tenant_id: Uuid,
  id: Uuid,
) -> rusqlite::Result<Option<Schedule>> {
  let Some(mut schedule) = get_row(conn, &SCHEDULES, tenant_id, id, schedule_from_row)?
  else {
    return Ok(None);
  };
  load_employee_ids(conn, &mut schedule)?;
  Ok(Some(schedule))
}

fn fetch_schedule(conn: &Connection, tenant_id: Uuid, id: Uuid) -> Result<Schedule, TxError> {
  get_schedule(conn, tenant_id, id)?.ok_or_else(|| not_found(&SCHEDULES, id).into())
}

fn check_schedule_refs(
  conn: &Connection,
  tenant_id: Uuid,
  input: &ScheduleInput,
) -> Result<(), TxError> {
  require_ref(conn, &TALKS, tenant_id, input.talk_id)?;
  for employee_id in &input.employee_ids {
    require_ref(conn, &EMPLOYEES, tenant_id, *employee_id)?;
  }
  Ok(())
}

fn replace_employees(
  conn: &Connection,
  schedule_id: Uuid,
  employee_ids: &[Uuid],
) -> rusqlite::Result<()> {
  let id = encode_uuid(schedule_id);
  conn.execute(
    "DELETE FROM schedule_employees WHERE schedule_id = ?1",
    rusqlite::params![id],
  )?;
  for employee_id in employee_ids {
    conn.execute(
      "INSERT OR IGNORE INTO schedule_employees (schedule_id, employee_id) VALUES (?1, ?2)",
      rusqlite::params![id, encode_uuid(*employee_id)],
    )?;
  }
  Ok(())
}

fn refuse_schedule(schedule: &Schedule, action: &'static str) -> TxError {
  CoreError::InvalidTransition {
    entity: "schedule",
    from: schedule.status.to_string(),
    action,
  }
  .into()
}

/// Materialise one run of `schedule` and advance it.
fn run_schedule(conn: &Connection, schedule: Schedule) -> Result<ScheduleRun, TxError> {
  let advance = schedule.advance()?;
  require_ref(conn, &TALKS, schedule.tenant_id, schedule.talk_id)?;

  let targets: Vec<String> = conn
    .prepare(
      "SELECT e.id FROM schedule_employees se
       JOIN employees e ON e.id = se.employee_id
       WHERE se.schedule_id = ?1 AND e.is_deleted = 0 AND e.is_active = 1
       ORDER BY e.id",
    )?
    .query_map(rusqlite::params![encode_uuid(schedule.id)], |row| row.get(0))?
    .collect::<rusqlite::Result<Vec<_>>>()?;

  let at = now();
  let mut created = Vec::new();
  for employee_id in targets {
    let id = Uuid::new_v4();
    let inserted = conn.execute(
      "INSERT OR IGNORE INTO scheduled_talks (
         id, tenant_id, schedule_id, talk_id, employee_id, scheduled_date,
         due_date, status, attempts, created_at, updated_at
       ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, 0, ?9, ?9)",
      rusqlite::params![
        encode_uuid(id),
        encode_uuid(schedule.tenant_id),
        encode_uuid(schedule.id),
        encode_uuid(schedule.talk_id),
        employee_id,
        encode_date(advance.run_date),
        encode_date(advance.due_date),
        AssignmentStatus::Pending.to_string(),
        at,
      ],
    )?;
    if inserted == 1 {
      created.push(id);
    }
  }

  conn.execute(
    "UPDATE toolbox_schedules
     SET next_run_date = ?1, last_run_date = ?2, status = ?3, updated_at = ?4
     WHERE id = ?5",
    rusqlite::params![
      encode_date(advance.next_run_date),
      encode_date(advance.run_date),
      advance.status.to_string(),
      at,
      encode_uuid(schedule.id),
    ],
  )?;

  let assignments = created
    .into_iter()
    .map(|id| fetch_row(conn, &ASSIGNMENTS, schedule.tenant_id, id, assignment_from_row))
    .collect::<Result<Vec<_>, _>>()?;

  Ok(ScheduleRun {
    schedule: fetch_schedule(conn, schedule.tenant_id, schedule.id)?,
    run_date: advance.run_date,
    assignments,
  })
}

// ─── Assignments ─────────────────────────────────────────────────────────────

fn assignment_from_row(row: &Row<'_>) -> rusqlite::Result<ScheduledTalk> {
  Ok(ScheduledTalk {
    id:             parse_col(row, "id")?,
    tenant_id:      parse_col(row, "tenant_id")?,
    schedule_id:    parse_opt_col(row, "schedule_id")?,
    talk_id:        parse_col(row, "talk_id")?,
    employee_id:    parse_col(row, "employee_id")?,
    scheduled_date: parse_col(row, "scheduled_date")?,
    due_date:       parse_col(row, "due_date")?,
    status:         parse_col(row, "status")?,
    attempts:       int_col(row, "attempts")?,
    score:          row
      .get::<_, Option<i64>>("score")?
      .map(|s| s.clamp(0, 100) as u8),
    completed_at:   parse_opt_col(row, "completed_at")?,
    created_at:     parse_col(row, "created_at")?,
    updated_at:     parse_col(row, "updated_at")?,
  })
}

// ─── ToolboxStore impl ───────────────────────────────────────────────────────

impl ToolboxStore for SqliteStore {
  // ── Talks ─────────────────────────────────────────────────────────────────

  async fn list_talks(&self, tenant_id: Uuid, query: ListQuery) -> Result<Page<ToolboxTalk>> {
    let q = query.clone();
    let (items, total) = self
      .read(move |conn| {
        let (mut talks, total) =
          list_page(conn, &TALKS, tenant_id, Vec::new(), &q, talk_from_row)?;
        for talk in &mut talks {
          load_talk_children(conn, talk)?;
        }
        Ok((talks, total))
      })
      .await?;
    Ok(Page::new(items, total, &query))
  }

  async fn get_talk(&self, tenant_id: Uuid, id: Uuid) -> Result<Option<ToolboxTalk>> {
    self.read(move |conn| get_talk(conn, tenant_id, id)).await
  }

  async fn create_talk(
    &self,
    tenant_id: Uuid,
    input: ToolboxTalkInput,
  ) -> Result<ToolboxTalk> {
    let talk = encode_talk(input)?;
    self
      .write(move |tx| {
        let id = Uuid::new_v4();
        tx.execute(
          "INSERT INTO toolbox_talks (
             id, tenant_id, title, summary, category, pass_mark, is_active,
             created_at, updated_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?8)",
          rusqlite::params![
            encode_uuid(id),
            encode_uuid(tenant_id),
            talk.input.title,
            talk.input.summary,
            talk.input.category,
            talk.input.pass_mark,
            talk.input.is_active,
            now(),
          ],
        )?;
        replace_talk_children(tx, id, &talk)?;
        fetch_talk(tx, tenant_id, id)
      })
      .await
  }

  async fn update_talk(
    &self,
    tenant_id: Uuid,
    id: Uuid,
    input: ToolboxTalkInput,
  ) -> Result<ToolboxTalk> {
    let talk = encode_talk(input)?;
    self
      .write(move |tx| {
        let changed = tx.execute(
          "UPDATE toolbox_talks
           SET title = ?1, summary = ?2, category = ?3, pass_mark = ?4,
               is_active = ?5, updated_at = ?6
           WHERE tenant_id = ?7 AND id = ?8 AND is_deleted = 0",
          rusqlite::params![
            talk.input.title,
            talk.input.summary,
            talk.input.category,
            talk.input.pass_mark,
            talk.input.is_active,
            now(),
            encode_uuid(tenant_id),
            encode_uuid(id),
          ],
        )?;
        if changed == 0 {
          return Err(not_found(&TALKS, id).into());
        }
        replace_talk_children(tx, id, &talk)?;
        fetch_talk(tx, tenant_id, id)
      })
      .await
  }

  async fn delete_talk(&self, tenant_id: Uuid, id: Uuid) -> Result<()> {
    self
      .write(move |tx| {
        let at = now();
        soft_delete(tx, &TALKS, tenant_id, id, &at)?;
        // A deleted talk cannot be assigned any more.
        tx.execute(
          "UPDATE toolbox_schedules SET status = ?1, updated_at = ?2
           WHERE tenant_id = ?3 AND talk_id = ?4 AND status = ?5",
          rusqlite::params![
            ScheduleStatus::Cancelled.to_string(),
            at,
            encode_uuid(tenant_id),
            encode_uuid(id),
            ScheduleStatus::Active.to_string(),
          ],
        )?;
        Ok(())
      })
      .await
  }

  // ── Schedules ─────────────────────────────────────────────────────────────

  async fn list_schedules(
    &self,
    tenant_id: Uuid,
    filter: ScheduleFilter,
    query: ListQuery,
  ) -> Result<Page<Schedule>> {
    let q = query.clone();
    let (items, total) = self
      .read(move |conn| {
        let mut filters = Vec::new();
        if let Some(status) = filter.status {
          filters.push(("status = ?", text(status.to_string())));
        }
        push_uuid(&mut filters, "talk_id = ?", filter.talk_id);
        let (mut schedules, total) =
          list_page(conn, &SCHEDULES, tenant_id, filters, &q, schedule_from_row)?;
        for schedule in &mut schedules {
          load_employee_ids(conn, schedule)?;
        }
        Ok((schedules, total))
      })
      .await?;
    Ok(Page::new(items, total, &query))
  }

  async fn get_schedule(&self, tenant_id: Uuid, id: Uuid) -> Result<Option<Schedule>> {
    self.read(move |conn| get_schedule(conn, tenant_id, id)).await
  }

  async fn create_schedule(
    &self,
    tenant_id: Uuid,
    input: ScheduleInput,
  ) -> Result<Schedule> {
    input.validate()?;
    let schedule = self
      .write(move |tx| {
        check_schedule_refs(tx, tenant_id, &input)?;
        let id = Uuid::new_v4();
        tx.execute(
          "INSERT INTO toolbox_schedules (
             id, tenant_id, talk_id, frequency, start_date, next_run_date, end_date,
             due_days, status, created_at, updated_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?5, ?6, ?7, ?8, ?9, ?9)",
          rusqlite::params![
            encode_uuid(id),
            encode_uuid(tenant_id),
            encode_uuid(input.talk_id),
            input.frequency.to_string(),
            encode_date(input.start_date),
            encode_opt_date(input.end_date),
            input.due_days,
            ScheduleStatus::Active.to_string(),
            now(),
          ],
        )?;
        replace_employees(tx, id, &input.employee_ids)?;
        fetch_schedule(tx, tenant_id, id)
      })
      .await?;
    tracing::info!(
      schedule = %schedule.id,
      frequency = %schedule.frequency,
      employees = schedule.employee_ids.len(),
      "schedule created"
    );
    Ok(schedule)
  }

  async fn update_schedule(
    &self,
    tenant_id: Uuid,
    id: Uuid,
    input: ScheduleInput,
  ) -> Result<Schedule> {
    input.validate()?;
    self
      .write(move |tx| {
        let schedule = fetch_schedule(tx, tenant_id, id)?;
        if schedule.status != ScheduleStatus::Active {
          return Err(refuse_schedule(&schedule, "edit"));
        }
        check_schedule_refs(tx, tenant_id, &input)?;
        let next_run_date = match schedule.last_run_date {
          None => input.start_date,
          Some(_) => schedule.next_run_date,
        };
        let status = schedule.status_after_end_change(input.end_date);
        tx.execute(
          "UPDATE toolbox_schedules
           SET talk_id = ?1, frequency = ?2, start_date = ?3, next_run_date = ?4,
               end_date = ?5, due_days = ?6, status = ?7, updated_at = ?8
           WHERE id = ?9",
          rusqlite::params![
            encode_uuid(input.talk_id),
            input.frequency.to_string(),
            encode_date(input.start_date),
            encode_date(next_run_date),
            encode_opt_date(input.end_date),
            input.due_days,
            status.to_string(),
            now(),
            encode_uuid(id),
          ],
        )?;
        replace_employees(tx, id, &input.employee_ids)?;
        fetch_schedule(tx, tenant_id, id)
      })
      .await
  }

  async fn delete_schedule(&self, tenant_id: Uuid, id: Uuid) -> Result<()> {
    self
      .write(move |tx| soft_delete(tx, &SCHEDULES, tenant_id, id, &now()))
      .await
  }

  async fn cancel_schedule(&self, tenant_id: Uuid, id: Uuid) -> Result<Schedule> {
    self
      .write(move |tx| {
        let schedule = fetch_schedule(tx, tenant_id, id)?;
        if schedule.status != ScheduleStatus::Active {
          return Err(refuse_schedule(&schedule, "cancel"));
        }
        tx.execute(
          "UPDATE toolbox_schedules SET status = ?1, updated_at = ?2 WHERE id = ?3",
          rusqlite::params![
            ScheduleStatus::Cancelled.to_string(),
            now(),
            encode_uuid(id)
          ],
        )?;
        fetch_schedule(tx, tenant_id, id)
      })
      .await
  }

  async fn process_schedule(&self, tenant_id: Uuid, id: Uuid) -> Result<ScheduleRun> {
    let run = self
      .write(move |tx| {
        let schedule = fetch_schedule(tx, tenant_id, id)?;
        run_schedule(tx, schedule)
      })
      .await?;
    tracing::info!(
      schedule = %id,
      run_date = %run.run_date,
      created = run.assignments.len(),
      status = %run.schedule.status,
      "schedule processed"
    );
    Ok(run)
  }

  async fn process_due_schedules(
    &self,
    tenant_id: Option<Uuid>,
    today: NaiveDate,
  ) -> Result<Vec<ScheduleRun>> {
    let due: Vec<(Uuid, Uuid)> = self
      .read(move |conn| {
        let mut sql = String::from(
          "SELECT tenant_id, id FROM toolbox_schedules
           WHERE is_deleted = 0 AND status = ? AND next_run_date <= ?",
        );
        let mut params = vec![
          text(ScheduleStatus::Active.to_string()),
          text(encode_date(today)),
        ];
        if let Some(tenant_id) = tenant_id {
          sql.push_str(" AND tenant_id = ?");
          params.push(uuid_value(tenant_id));
        }
        sql.push_str(" ORDER BY next_run_date, id");
        conn
          .prepare(&sql)?
          .query_map(rusqlite::params_from_iter(params.iter()), |row| {
            Ok((parse_col(row, "tenant_id")?, parse_col(row, "id")?))
          })?
          .collect::<rusqlite::Result<Vec<_>>>()
      })
      .await?;

    let mut runs = Vec::with_capacity(due.len());
    for (tenant_id, id) in due {
      match self.process_schedule(tenant_id, id).await {
        Ok(run) => runs.push(run),
        Err(e) => tracing::warn!(schedule = %id, error = %e, "schedule run failed"),
      }
    }
    tracing::info!(%today, processed = runs.len(), "schedule sweep finished");
    Ok(runs)
  }

  // ── Assignments ───────────────────────────────────────────────────────────

  async fn list_assignments(
    &self,
    tenant_id: Uuid,
    filter: AssignmentFilter,
    today: NaiveDate,
    query: ListQuery,
  ) -> Result<Page<ScheduledTalk>> {
    let q = query.clone();
    let (items, total) = self
      .read(move |conn| {
        let mut filters = Vec::new();
        push_uuid(&mut filters, "employee_id = ?", filter.employee_id);
        push_uuid(&mut filters, "schedule_id = ?", filter.schedule_id);
        if let Some(status) = filter.status {
          filters.push(("status = ?", text(status.to_string())));
        }
        if filter.overdue {
          filters.push(("due_date < ?", text(encode_date(today))));
          filters.push(("status <> ?", text(AssignmentStatus::Completed.to_string())));
        }
        list_page(conn, &ASSIGNMENTS, tenant_id, filters, &q, assignment_from_row)
      })
      .await?;
    Ok(Page::new(items, total, &query))
  }

  async fn get_assignment(
    &self,
    tenant_id: Uuid,
    id: Uuid,
  ) -> Result<Option<ScheduledTalk>> {
    self
      .read(move |conn| get_row(conn, &ASSIGNMENTS, tenant_id, id, assignment_from_row))
      .await
  }

  async fn start_assignment(&self, tenant_id: Uuid, id: Uuid) -> Result<ScheduledTalk> {
    self
      .write(move |tx| {
        let assignment = fetch_row(tx, &ASSIGNMENTS, tenant_id, id, assignment_from_row)?;
        let next = assignment.start()?;
        tx.execute(
          "UPDATE scheduled_talks SET status = ?1, updated_at = ?2 WHERE id = ?3",
          rusqlite::params![next.to_string(), now(), encode_uuid(id)],
        )?;
        fetch_row(tx, &ASSIGNMENTS, tenant_id, id, assignment_from_row)
      })
      .await
  }

  async fn complete_assignment(
    &self,
    tenant_id: Uuid,
    id: Uuid,
    completion: AssignmentCompletion,
  ) -> Result<AssignmentOutcome> {
    let outcome = self
      .write(move |tx| {
        let assignment = fetch_row(tx, &ASSIGNMENTS, tenant_id, id, assignment_from_row)?;
        let talk = fetch_assigned_talk(tx, tenant_id, assignment.talk_id)?;
        let (next, result) = assignment.record_attempt(&talk, &completion.answers)?;

        let at = Utc::now();
        let completed_at = (next == AssignmentStatus::Completed).then_some(at);
        tx.execute(
          "UPDATE scheduled_talks
           SET status = ?1, attempts = attempts + 1, score = ?2, completed_at = ?3,
               updated_at = ?4
           WHERE id = ?5",
          rusqlite::params![
            next.to_string(),
            result.score,
            completed_at.map(encode_dt),
            encode_dt(at),
            encode_uuid(id),
          ],
        )?;
        Ok(AssignmentOutcome {
          assignment: fetch_row(tx, &ASSIGNMENTS, tenant_id, id, assignment_from_row)?,
          result,
        })
      })
      .await?;
    tracing::info!(
      assignment = %id,
      score = outcome.result.score,
      passed = outcome.result.passed,
      "toolbox talk attempt recorded"
    );
    Ok(outcome)
  }
}
