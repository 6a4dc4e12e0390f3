//! RAMS documents: risk assessments with controls, and method statements.

use fieldops_core::{
  Error as CoreError,
  common::{ListQuery, Page, document_number, require_text},
  rams::{
    MethodStep, RamsAction, RamsDocument, RamsFilter, RamsInput, RamsStatus,
    RiskAssessment, RiskControl, RiskRating,
  },
  store::RamsStore,
};
use rusqlite::{Connection, Row};
use uuid::Uuid;

use super::{
  SqliteStore, TxError,
  directory::SITES,
  query::{
    Table, get_row, list_page, next_sequence, not_found, now, push_uuid, require_opt_ref,
    soft_delete, text,
  },
};
use crate::{
  Result,
  encode::{encode_dt, encode_opt_uuid, encode_uuid, int_col, parse_col, parse_opt_col},
};

const RAMS: Table = Table {
  name:          "rams_documents",
  entity:        "RAMS document",
  search:        &["reference", "title", "scope"],
  sorts:         &[
    ("reference", "reference"),
    ("title", "title"),
    ("status", "status"),
    ("created_at", "created_at"),
  ],
  default_order: "created_at DESC",
  soft_delete:   true,
};

fn rams_from_row(row: &Row<'_>) -> rusqlite::Result<RamsDocument> {
  Ok(RamsDocument {
    id:               parse_col(row, "id")?,
    tenant_id:        parse_col(row, "tenant_id")?,
    reference:        row.get("reference")?,
    title:            row.get("title")?,
    site_id:          parse_opt_col(row, "site_id")?,
    scope:            row.get("scope")?,
    revision:         row.get("revision")?,
    status:           parse_col(row, "status")?,
    submitted_at:     parse_opt_col(row, "submitted_at")?,
    approved_by:      parse_opt_col(row, "approved_by")?,
    approved_at:      parse_opt_col(row, "approved_at")?,
    rejection_reason: row.get("rejection_reason")?,
    risk_assessments: Vec::new(),
    method_steps:     Vec::new(),
    created_at:       parse_col(row, "created_at")?,
    updated_at:       parse_col(row, "updated_at")?,
  })
}

fn assessment_from_row(row: &Row<'_>) -> rusqlite::Result<RiskAssessment> {
  Ok(RiskAssessment {
    id:          parse_col(row, "id")?,
    hazard:      row.get("hazard")?,
    who_at_risk: row.get("who_at_risk")?,
    initial:     RiskRating {
      likelihood: int_col(row, "likelihood")?,
      severity:   int_col(row, "severity")?,
    },
    residual:    RiskRating {
      likelihood: int_col(row, "residual_likelihood")?,
      severity:   int_col(row, "residual_severity")?,
    },
    controls:    Vec::new(),
  })
}

fn load_children(conn: &Connection, doc: &mut RamsDocument) -> rusqlite::Result<()> {
  let doc_id = encode_uuid(doc.id);

  let mut assessments = conn
    .prepare(
      "SELECT * FROM rams_risk_assessments WHERE rams_id = ?1 ORDER BY sort_order",
    )?
    .query_map(rusqlite::params![doc_id], assessment_from_row)?
    .collect::<rusqlite::Result<Vec<_>>>()?;

  let mut controls = conn.prepare(
    "SELECT id, description FROM rams_controls
     WHERE assessment_id = ?1 ORDER BY sort_order",
  )?;
  for ra in &mut assessments {
    ra.controls = controls
      .query_map(rusqlite::params![encode_uuid(ra.id)], |row| {
        Ok(RiskControl {
          id:          parse_col(row, "id")?,
          description: row.get("description")?,
        })
      })?
      .collect::<rusqlite::Result<Vec<_>>>()?;
  }

  doc.method_steps = conn
    .prepare(
      "SELECT * FROM rams_method_steps WHERE rams_id = ?1 ORDER BY step_number",
    )?
    .query_map(rusqlite::params![doc_id], |row| {
      Ok(MethodStep {
        id:          parse_col(row, "id")?,
        step_number: row.get("step_number")?,
        description: row.get("description")?,
        responsible: row.get("responsible")?,
      })
    })?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  doc.risk_assessments = assessments;
  Ok(())
}

fn get(conn: &Connection, tenant_id: Uuid, id: Uuid) -> rusqlite::Result<Option<RamsDocument>> {
  let Some(mut doc) = get_row(conn, &RAMS, tenant_id, id, rams_from_row)? else {
    return Ok(None);
  };
  load_children(conn, &mut doc)?;
  Ok(Some(doc))
}

fn fetch(conn: &Connection, tenant_id: Uuid, id: Uuid) -> Result<RamsDocument, TxError> {
  get(conn, tenant_id, id)?.ok_or_else(|| not_found(&RAMS, id).into())
}

fn replace_children(
  conn: &Connection,
  rams_id: Uuid,
  input: &RamsInput,
) -> rusqlite::Result<()> {
  let doc_id = encode_uuid(rams_id);
  conn.execute(
    "DELETE FROM rams_risk_assessments WHERE rams_id = ?1",
    rusqlite::params![doc_id],
  )?;
  conn.execute(
    "DELETE FROM rams_method_steps WHERE rams_id = ?1",
    rusqlite::params![doc_id],
  )?;

  for (sort_order, ra) in input.risk_assessments.iter().enumerate() {
    let ra_id = Uuid::new_v4();
    conn.execute(
      "INSERT INTO rams_risk_assessments (
         id, rams_id, hazard, who_at_risk, likelihood, severity,
         residual_likelihood, residual_severity, sort_order
       ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
      rusqlite::params![
        encode_uuid(ra_id),
        doc_id,
        ra.hazard,
        ra.who_at_risk,
        ra.initial.likelihood,
        ra.initial.severity,
        ra.residual.likelihood,
        ra.residual.severity,
        sort_order as i64,
      ],
    )?;
    for (control_order, control) in ra.controls.iter().enumerate() {
      conn.execute(
        "INSERT INTO rams_controls (id, assessment_id, description, sort_order)
         VALUES (?1, ?2, ?3, ?4)",
        rusqlite::params![
          encode_uuid(Uuid::new_v4()),
          encode_uuid(ra_id),
          control,
          control_order as i64,
        ],
      )?;
    }
  }

  for (idx, step) in input.method_steps.iter().enumerate() {
    conn.execute(
      "INSERT INTO rams_method_steps (id, rams_id, step_number, description, responsible)
       VALUES (?1, ?2, ?3, ?4, ?5)",
      rusqlite::params![
        encode_uuid(Uuid::new_v4()),
        doc_id,
        idx as i64 + 1,
        step.description,
        step.responsible,
      ],
    )?;
  }
  Ok(())
}

fn refuse(doc: &RamsDocument, action: &'static str) -> TxError {
  CoreError::InvalidTransition {
    entity: "RAMS document",
    from: doc.status.to_string(),
    action,
  }
  .into()
}

impl RamsStore for SqliteStore {
  async fn list_rams(
    &self,
    tenant_id: Uuid,
    filter: RamsFilter,
    query: ListQuery,
  ) -> Result<Page<RamsDocument>> {
    let q = query.clone();
    let (items, total) = self
      .read(move |conn| {
        let mut filters = Vec::new();
        if let Some(status) = filter.status {
          filters.push(("status = ?", text(status.to_string())));
        }
        push_uuid(&mut filters, "site_id = ?", filter.site_id);
        let (mut docs, total) =
          list_page(conn, &RAMS, tenant_id, filters, &q, rams_from_row)?;
        for doc in &mut docs {
          load_children(conn, doc)?;
        }
        Ok((docs, total))
      })
      .await?;
    Ok(Page::new(items, total, &query))
  }

  async fn get_rams(&self, tenant_id: Uuid, id: Uuid) -> Result<Option<RamsDocument>> {
    self.read(move |conn| get(conn, tenant_id, id)).await
  }

  async fn create_rams(&self, tenant_id: Uuid, input: RamsInput) -> Result<RamsDocument> {
    input.validate()?;
    let doc = self
      .write(move |tx| {
        require_opt_ref(tx, &SITES, tenant_id, input.site_id)?;
        let id = Uuid::new_v4();
        let reference = document_number("RAMS", next_sequence(tx, &RAMS, tenant_id)?);
        tx.execute(
          "INSERT INTO rams_documents (
             id, tenant_id, reference, title, site_id, scope, revision, status,
             created_at, updated_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, 1, ?7, ?8, ?8)",
          rusqlite::params![
            encode_uuid(id),
            encode_uuid(tenant_id),
            reference,
            input.title,
            encode_opt_uuid(input.site_id),
            input.scope,
            RamsStatus::Draft.to_string(),
            now(),
          ],
        )?;
        replace_children(tx, id, &input)?;
        fetch(tx, tenant_id, id)
      })
      .await?;
    tracing::info!(rams = %doc.reference, "RAMS document created");
    Ok(doc)
  }

  async fn update_rams(
    &self,
    tenant_id: Uuid,
    id: Uuid,
    input: RamsInput,
  ) -> Result<RamsDocument> {
    input.validate()?;
    self
      .write(move |tx| {
        let doc = fetch(tx, tenant_id, id)?;
        if !doc.status.is_editable() {
          return Err(refuse(&doc, "edit"));
        }
        require_opt_ref(tx, &SITES, tenant_id, input.site_id)?;
        tx.execute(
          "UPDATE rams_documents
           SET title = ?1, site_id = ?2, scope = ?3, updated_at = ?4
           WHERE id = ?5",
          rusqlite::params![
            input.title,
            encode_opt_uuid(input.site_id),
            input.scope,
            now(),
            encode_uuid(id),
          ],
        )?;
        replace_children(tx, id, &input)?;
        fetch(tx, tenant_id, id)
      })
      .await
  }

  async fn delete_rams(&self, tenant_id: Uuid, id: Uuid) -> Result<()> {
    self
      .write(move |tx| {
        let doc = fetch(tx, tenant_id, id)?;
        if doc.status == RamsStatus::PendingReview {
          return Err(refuse(&doc, "delete"));
        }
        soft_delete(tx, &RAMS, tenant_id, id, &now())
      })
      .await
  }

  async fn transition_rams(
    &self,
    tenant_id: Uuid,
    id: Uuid,
    action: RamsAction,
    actor: Uuid,
  ) -> Result<RamsDocument> {
    if let RamsAction::Reject { reason } = &action {
      require_text("reason", reason)?;
    }
    let action_name: &'static str = (&action).into();

    let doc = self
      .write(move |tx| {
        let mut doc = fetch(tx, tenant_id, id)?;
        if action == RamsAction::Submit {
          doc.check_complete()?;
        }
        let next = doc.status.apply(&action)?;
        let at = chrono::Utc::now();

        match action {
          RamsAction::Submit => {
            doc.submitted_at = Some(at);
            doc.rejection_reason = None;
          }
          RamsAction::Approve => {
            doc.approved_by = Some(actor);
            doc.approved_at = Some(at);
          }
          RamsAction::Reject { reason } => doc.rejection_reason = Some(reason),
          RamsAction::Revise => {
            doc.revision += 1;
            doc.submitted_at = None;
            doc.approved_by = None;
            doc.approved_at = None;
          }
        }
        doc.status = next;

        tx.execute(
          "UPDATE rams_documents
           SET status = ?1, revision = ?2, submitted_at = ?3, approved_by = ?4,
               approved_at = ?5, rejection_reason = ?6, updated_at = ?7
           WHERE id = ?8",
          rusqlite::params![
            doc.status.to_string(),
            doc.revision,
            doc.submitted_at.map(encode_dt),
            encode_opt_uuid(doc.approved_by),
            doc.approved_at.map(encode_dt),
            doc.rejection_reason,
            encode_dt(at),
            encode_uuid(id),
          ],
        )?;
        fetch(tx, tenant_id, id)
      })
      .await?;

    tracing::info!(
      rams = %doc.reference,
      action = action_name,
      to = %doc.status,
      revision = doc.revision,
      "RAMS transition"
    );
    Ok(doc)
  }
}
