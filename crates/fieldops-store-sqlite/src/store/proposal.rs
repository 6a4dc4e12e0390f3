//! Proposals with their priced sections.

use fieldops_core::{
  Error as CoreError,
  common::{ListQuery, Page, document_number},
  proposal::{
    Proposal, ProposalAction, ProposalFilter, ProposalInput, ProposalLineItem,
    ProposalSection, ProposalStatus, ProposalTotals,
  },
  store::ProposalStore,
};
use rusqlite::{Connection, Row};
use uuid::Uuid;

use super::{
  SqliteStore, TxError,
  directory::{COMPANIES, CONTACTS, SITES},
  query::{
    Table, get_row, list_page, next_sequence, not_found, now, push_uuid, require_opt_ref,
    require_ref, soft_delete, text,
  },
};
use crate::{
  Result,
  encode::{encode_opt_date, encode_opt_uuid, encode_uuid, parse_col, parse_opt_col},
};

const PROPOSALS: Table = Table {
  name:          "proposals",
  entity:        "proposal",
  search:        &["reference", "title"],
  sorts:         &[
    ("reference", "reference"),
    ("title", "title"),
    ("status", "status"),
    ("valid_until", "valid_until"),
    ("created_at", "created_at"),
  ],
  default_order: "created_at DESC",
  soft_delete:   true,
};

fn proposal_from_row(row: &Row<'_>) -> rusqlite::Result<Proposal> {
  Ok(Proposal {
    id:               parse_col(row, "id")?,
    tenant_id:        parse_col(row, "tenant_id")?,
    reference:        row.get("reference")?,
    title:            row.get("title")?,
    company_id:       parse_col(row, "company_id")?,
    contact_id:       parse_opt_col(row, "contact_id")?,
    site_id:          parse_opt_col(row, "site_id")?,
    valid_until:      parse_opt_col(row, "valid_until")?,
    status:           parse_col(row, "status")?,
    discount_percent: row.get("discount_percent")?,
    vat_percent:      row.get("vat_percent")?,
    sections:         Vec::new(),
    totals:           ProposalTotals::default(),
    created_at:       parse_col(row, "created_at")?,
    updated_at:       parse_col(row, "updated_at")?,
  })
}

fn load_sections(conn: &Connection, proposal: &mut Proposal) -> rusqlite::Result<()> {
  let mut sections = conn
    .prepare(
      "SELECT id, title, sort_order FROM proposal_sections
       WHERE proposal_id = ?1 ORDER BY sort_order",
    )?
    .query_map(rusqlite::params![encode_uuid(proposal.id)], |row| {
      Ok(ProposalSection {
        id:         parse_col(row, "id")?,
        title:      row.get("title")?,
        sort_order: row.get("sort_order")?,
        items:      Vec::new(),
      })
    })?
    .collect::<rusqlite::Result<Vec<_>>>()?;

  let mut items = conn.prepare(
    "SELECT id, description, quantity, unit_price FROM proposal_items
     WHERE section_id = ?1 ORDER BY sort_order",
  )?;
  for section in &mut sections {
    section.items = items
      .query_map(rusqlite::params![encode_uuid(section.id)], |row| {
        Ok(ProposalLineItem {
          id:          parse_col(row, "id")?,
          description: row.get("description")?,
          quantity:    row.get("quantity")?,
          unit_price:  row.get("unit_price")?,
        })
      })?
      .collect::<rusqlite::Result<Vec<_>>>()?;
  }

  proposal.totals = ProposalTotals::compute(
    &sections,
    proposal.discount_percent,
    proposal.vat_percent,
  );
  proposal.sections = sections;
  Ok(())
}

fn get(conn: &Connection, tenant_id: Uuid, id: Uuid) -> rusqlite::Result<Option<Proposal>> {
  let Some(mut proposal) = get_row(conn, &PROPOSALS, tenant_id, id, proposal_from_row)?
  else {
    return Ok(None);
  };
  load_sections(conn, &mut proposal)?;
  Ok(Some(proposal))
}

fn fetch(conn: &Connection, tenant_id: Uuid, id: Uuid) -> Result<Proposal, TxError> {
  get(conn, tenant_id, id)?.ok_or_else(|| not_found(&PROPOSALS, id).into())
}

fn check_refs(
  conn: &Connection,
  tenant_id: Uuid,
  input: &ProposalInput,
) -> Result<(), TxError> {
  require_ref(conn, &COMPANIES, tenant_id, input.company_id)?;
  require_opt_ref(conn, &CONTACTS, tenant_id, input.contact_id)?;
  require_opt_ref(conn, &SITES, tenant_id, input.site_id)
}

fn replace_sections(
  conn: &Connection,
  proposal_id: Uuid,
  input: &ProposalInput,
) -> rusqlite::Result<()> {
  conn.execute(
    "DELETE FROM proposal_sections WHERE proposal_id = ?1",
    rusqlite::params![encode_uuid(proposal_id)],
  )?;
  for (sort_order, section) in input.sections.iter().enumerate() {
    let section_id = Uuid::new_v4();
    conn.execute(
      "INSERT INTO proposal_sections (id, proposal_id, title, sort_order)
       VALUES (?1, ?2, ?3, ?4)",
      rusqlite::params![
        encode_uuid(section_id),
        encode_uuid(proposal_id),
        section.title,
        sort_order as i64,
      ],
    )?;
    for (item_order, item) in section.items.iter().enumerate() {
      conn.execute(
        "INSERT INTO proposal_items (
           id, section_id, description, quantity, unit_price, sort_order
         ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        rusqlite::params![
          encode_uuid(Uuid::new_v4()),
          encode_uuid(section_id),
          item.description,
          item.quantity,
          item.unit_price,
          item_order as i64,
        ],
      )?;
    }
  }
  Ok(())
}

fn refuse(proposal: &Proposal, action: &'static str) -> TxError {
  CoreError::InvalidTransition {
    entity: "proposal",
    from: proposal.status.to_string(),
    action,
  }
  .into()
}

impl ProposalStore for SqliteStore {
  async fn list_proposals(
    &self,
    tenant_id: Uuid,
    filter: ProposalFilter,
    query: ListQuery,
  ) -> Result<Page<Proposal>> {
    let q = query.clone();
    let (items, total) = self
      .read(move |conn| {
        let mut filters = Vec::new();
        if let Some(status) = filter.status {
          filters.push(("status = ?", text(status.to_string())));
        }
        push_uuid(&mut filters, "company_id = ?", filter.company_id);
        let (mut proposals, total) =
          list_page(conn, &PROPOSALS, tenant_id, filters, &q, proposal_from_row)?;
        for proposal in &mut proposals {
          load_sections(conn, proposal)?;
        }
        Ok((proposals, total))
      })
      .await?;
    Ok(Page::new(items, total, &query))
  }

  async fn get_proposal(&self, tenant_id: Uuid, id: Uuid) -> Result<Option<Proposal>> {
    self.read(move |conn| get(conn, tenant_id, id)).await
  }

  async fn create_proposal(
    &self,
    tenant_id: Uuid,
    input: ProposalInput,
  ) -> Result<Proposal> {
    input.validate()?;
    let proposal = self
      .write(move |tx| {
        check_refs(tx, tenant_id, &input)?;
        let id = Uuid::new_v4();
        let reference =
          document_number("PR", next_sequence(tx, &PROPOSALS, tenant_id)?);
        tx.execute(
          "INSERT INTO proposals (
             id, tenant_id, reference, title, company_id, contact_id, site_id,
             valid_until, status, discount_percent, vat_percent, created_at, updated_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?12)",
          rusqlite::params![
            encode_uuid(id),
            encode_uuid(tenant_id),
            reference,
            input.title,
            encode_uuid(input.company_id),
            encode_opt_uuid(input.contact_id),
            encode_opt_uuid(input.site_id),
            encode_opt_date(input.valid_until),
            ProposalStatus::Draft.to_string(),
            input.discount_percent,
            input.vat_percent,
            now(),
          ],
        )?;
        replace_sections(tx, id, &input)?;
        fetch(tx, tenant_id, id)
      })
      .await?;
    tracing::info!(proposal = %proposal.reference, "proposal created");
    Ok(proposal)
  }

  async fn update_proposal(
    &self,
    tenant_id: Uuid,
    id: Uuid,
    input: ProposalInput,
  ) -> Result<Proposal> {
    input.validate()?;
    self
      .write(move |tx| {
        let proposal = fetch(tx, tenant_id, id)?;
        if !proposal.status.is_editable() {
          return Err(refuse(&proposal, "edit"));
        }
        check_refs(tx, tenant_id, &input)?;
        tx.execute(
          "UPDATE proposals
           SET title = ?1, company_id = ?2, contact_id = ?3, site_id = ?4,
               valid_until = ?5, discount_percent = ?6, vat_percent = ?7,
               updated_at = ?8
           WHERE id = ?9",
          rusqlite::params![
            input.title,
            encode_uuid(input.company_id),
            encode_opt_uuid(input.contact_id),
            encode_opt_uuid(input.site_id),
            encode_opt_date(input.valid_until),
            input.discount_percent,
            input.vat_percent,
            now(),
            encode_uuid(id),
          ],
        )?;
        replace_sections(tx, id, &input)?;
        fetch(tx, tenant_id, id)
      })
      .await
  }

  async fn delete_proposal(&self, tenant_id: Uuid, id: Uuid) -> Result<()> {
    self
      .write(move |tx| {
        let proposal = fetch(tx, tenant_id, id)?;
        if !matches!(proposal.status, ProposalStatus::Draft | ProposalStatus::Cancelled) {
          return Err(refuse(&proposal, "delete"));
        }
        soft_delete(tx, &PROPOSALS, tenant_id, id, &now())
      })
      .await
  }

  async fn transition_proposal(
    &self,
    tenant_id: Uuid,
    id: Uuid,
    action: ProposalAction,
  ) -> Result<Proposal> {
    let proposal = self
      .write(move |tx| {
        let proposal = fetch(tx, tenant_id, id)?;
        if action == ProposalAction::Submit && proposal.item_count() == 0 {
          return Err(
            CoreError::validation(
              "a proposal needs at least one line item to be submitted",
            )
            .into(),
          );
        }
        let next = proposal.status.apply(action)?;
        tx.execute(
          "UPDATE proposals SET status = ?1, updated_at = ?2 WHERE id = ?3",
          rusqlite::params![next.to_string(), now(), encode_uuid(id)],
        )?;
        fetch(tx, tenant_id, id)
      })
      .await?;
    tracing::info!(
      proposal = %proposal.reference,
      %action,
      to = %proposal.status,
      "proposal transition"
    );
    Ok(proposal)
  }
}
