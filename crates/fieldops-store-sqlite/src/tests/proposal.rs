use fieldops_core::{
  common::ListQuery,
  proposal::{
    ProposalAction, ProposalFilter, ProposalInput, ProposalLineItemInput,
    ProposalSectionInput, ProposalStatus,
  },
  store::ProposalStore,
};
use uuid::Uuid;

use super::*;

fn proposal_input(company_id: Uuid, items: Vec<ProposalLineItemInput>) -> ProposalInput {
  ProposalInput {
    title: "Roof replacement".into(),
    company_id,
    contact_id: None,
    site_id: None,
    valid_until: None,
    discount_percent: 10.0,
    vat_percent: 20.0,
    sections: vec![ProposalSectionInput { title: "Labour".into(), items }],
  }
}

fn item(quantity: i64, unit_price: i64) -> ProposalLineItemInput {
  ProposalLineItemInput {
    description: "Day rate".into(),
    quantity,
    unit_price,
  }
}

#[tokio::test]
async fn totals_apply_discount_then_vat() {
  let (s, tenant) = tenant_store().await;
  let company = company(&s, tenant).await;
  let p = s
    .create_proposal(tenant, proposal_input(company, vec![item(4, 25_000)]))
    .await
    .unwrap();

  assert_eq!(p.reference, "PR-000001");
  assert_eq!(p.totals.subtotal, 100_000);
  assert_eq!(p.totals.discount, 10_000);
  assert_eq!(p.totals.vat, 18_000);
  assert_eq!(p.totals.total, 108_000);
}

#[tokio::test]
async fn proposal_needs_company_in_tenant() {
  let (s, tenant) = tenant_store().await;
  let err = s
    .create_proposal(tenant, proposal_input(Uuid::new_v4(), vec![]))
    .await
    .unwrap_err();
  assert!(is_not_found(&err));
}

#[tokio::test]
async fn proposal_without_items_cannot_be_submitted() {
  let (s, tenant) = tenant_store().await;
  let company = company(&s, tenant).await;
  let p = s
    .create_proposal(tenant, proposal_input(company, vec![]))
    .await
    .unwrap();
  let err = s
    .transition_proposal(tenant, p.id, ProposalAction::Submit)
    .await
    .unwrap_err();
  assert!(is_validation(&err));
}

#[tokio::test]
async fn reject_then_revise_reopens_for_editing() {
  let (s, tenant) = tenant_store().await;
  let company = company(&s, tenant).await;
  let p = s
    .create_proposal(tenant, proposal_input(company, vec![item(1, 5_000)]))
    .await
    .unwrap();

  s.transition_proposal(tenant, p.id, ProposalAction::Submit)
    .await
    .unwrap();
  let err = s
    .update_proposal(tenant, p.id, proposal_input(company, vec![item(2, 5_000)]))
    .await
    .unwrap_err();
  assert!(is_invalid_transition(&err));

  s.transition_proposal(tenant, p.id, ProposalAction::Reject)
    .await
    .unwrap();
  let revised = s
    .transition_proposal(tenant, p.id, ProposalAction::Revise)
    .await
    .unwrap();
  assert_eq!(revised.status, ProposalStatus::Draft);

  let updated = s
    .update_proposal(tenant, p.id, proposal_input(company, vec![item(2, 5_000)]))
    .await
    .unwrap();
  assert_eq!(updated.totals.subtotal, 10_000);
}

#[tokio::test]
async fn accepted_proposal_cannot_be_deleted() {
  let (s, tenant) = tenant_store().await;
  let company = company(&s, tenant).await;
  let p = s
    .create_proposal(tenant, proposal_input(company, vec![item(1, 5_000)]))
    .await
    .unwrap();
  for action in [ProposalAction::Submit, ProposalAction::Accept] {
    s.transition_proposal(tenant, p.id, action).await.unwrap();
  }
  let err = s.delete_proposal(tenant, p.id).await.unwrap_err();
  assert!(is_invalid_transition(&err));
}

#[tokio::test]
async fn list_filters_by_status() {
  let (s, tenant) = tenant_store().await;
  let company = company(&s, tenant).await;
  let submitted = s
    .create_proposal(tenant, proposal_input(company, vec![item(1, 5_000)]))
    .await
    .unwrap();
  s.create_proposal(tenant, proposal_input(company, vec![]))
    .await
    .unwrap();
  s.transition_proposal(tenant, submitted.id, ProposalAction::Submit)
    .await
    .unwrap();

  let page = s
    .list_proposals(
      tenant,
      ProposalFilter { status: Some(ProposalStatus::Submitted), ..Default::default() },
      ListQuery::default(),
    )
    .await
    .unwrap();
  assert_eq!(page.total_count, 1);
  assert_eq!(page.items[0].id, submitted.id);
}
