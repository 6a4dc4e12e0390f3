use fieldops_core::{
  common::ListQuery,
  stock::{
    StockAdjustment, StockLevelFilter, StockOrderAction, StockOrderInput,
    StockOrderLineInput, StockOrderStatus, StockTransactionKind, TransactionFilter,
  },
  store::StockStore,
};
use uuid::Uuid;

use super::*;

struct Setup {
  s:        SqliteStore,
  tenant:   Uuid,
  site:     Uuid,
  location: Uuid,
  bolts:    Uuid,
  nuts:     Uuid,
}

async fn setup() -> Setup {
  let (s, tenant) = tenant_store().await;
  let site = site(&s, tenant).await;
  let location = location(&s, tenant).await;
  let bolts = product(&s, tenant, "BOLT-10").await;
  let nuts = product(&s, tenant, "NUT-10").await;
  stock_up(&s, tenant, bolts, location, 100).await;
  stock_up(&s, tenant, nuts, location, 20).await;
  Setup { s, tenant, site, location, bolts, nuts }
}

fn order_input(setup: &Setup, lines: &[(Uuid, i64)]) -> StockOrderInput {
  StockOrderInput {
    site_id:       setup.site,
    location_id:   setup.location,
    required_date: None,
    notes:         None,
    lines:         lines
      .iter()
      .map(|(product_id, quantity)| StockOrderLineInput {
        product_id: *product_id,
        quantity:   *quantity,
      })
      .collect(),
  }
}

async fn available(setup: &Setup, product: Uuid) -> i64 {
  let page = setup
    .s
    .list_stock_levels(
      setup.tenant,
      StockLevelFilter { product_id: Some(product), ..Default::default() },
      ListQuery::default(),
    )
    .await
    .unwrap();
  page.items[0].available
}

/// A submitted and approved order for 30 bolts and 5 nuts.
async fn approved_order(setup: &Setup) -> Uuid {
  let order = setup
    .s
    .create_stock_order(
      setup.tenant,
      order_input(setup, &[(setup.bolts, 30), (setup.nuts, 5)]),
      Uuid::new_v4(),
    )
    .await
    .unwrap();
  for action in [StockOrderAction::Submit, StockOrderAction::Approve] {
    setup
      .s
      .transition_stock_order(setup.tenant, order.id, action, Uuid::new_v4())
      .await
      .unwrap();
  }
  order.id
}

// ─── Levels & adjustments ────────────────────────────────────────────────────

#[tokio::test]
async fn adjustment_records_a_transaction() {
  let setup = setup().await;
  let page = setup
    .s
    .list_stock_transactions(
      setup.tenant,
      TransactionFilter { product_id: Some(setup.bolts), ..Default::default() },
      ListQuery::default(),
    )
    .await
    .unwrap();
  assert_eq!(page.total_count, 1);
  let tx = &page.items[0];
  assert_eq!(tx.kind, StockTransactionKind::Adjustment);
  assert_eq!(tx.quantity, 100);
  assert_eq!(tx.reference.as_deref(), Some("opening stock"));
}

#[tokio::test]
async fn adjustment_cannot_go_negative() {
  let setup = setup().await;
  let err = setup
    .s
    .adjust_stock(
      setup.tenant,
      StockAdjustment {
        product_id:     setup.nuts,
        location_id:    setup.location,
        quantity_delta: -21,
        reason:         "write off".into(),
      },
      Uuid::new_v4(),
    )
    .await
    .unwrap_err();
  assert!(is_validation(&err));
  assert_eq!(available(&setup, setup.nuts).await, 20);
}

#[tokio::test]
async fn adjustment_overflow_leaves_level_untouched() {
  let setup = setup().await;
  let err = setup
    .s
    .adjust_stock(
      setup.tenant,
      StockAdjustment {
        product_id:     setup.nuts,
        location_id:    setup.location,
        quantity_delta: i64::MAX,
        reason:         "count".into(),
      },
      Uuid::new_v4(),
    )
    .await
    .unwrap_err();
  assert!(is_validation(&err));
  assert_eq!(available(&setup, setup.nuts).await, 20);
}

#[tokio::test]
async fn low_stock_filter() {
  let setup = setup().await;
  setup
    .s
    .adjust_stock(
      setup.tenant,
      StockAdjustment {
        product_id:     setup.nuts,
        location_id:    setup.location,
        quantity_delta: -16,
        reason:         "damaged".into(),
      },
      Uuid::new_v4(),
    )
    .await
    .unwrap();

  let page = setup
    .s
    .list_stock_levels(
      setup.tenant,
      StockLevelFilter { low_stock: true, ..Default::default() },
      ListQuery::default(),
    )
    .await
    .unwrap();
  assert_eq!(page.total_count, 1);
  assert_eq!(page.items[0].sku, "NUT-10");
  assert!(page.items[0].low_stock);
}

#[tokio::test]
async fn duplicate_sku_is_a_conflict() {
  let setup = setup().await;
  let err = setup
    .s
    .create_product(setup.tenant, product_input("BOLT-10"))
    .await
    .unwrap_err();
  assert!(matches!(err, Error::Core(fieldops_core::Error::Conflict(_))));
}

// ─── Stock orders ────────────────────────────────────────────────────────────

#[tokio::test]
async fn order_numbers_are_sequential_per_tenant() {
  let setup = setup().await;
  let first = setup
    .s
    .create_stock_order(setup.tenant, order_input(&setup, &[]), Uuid::new_v4())
    .await
    .unwrap();
  let second = setup
    .s
    .create_stock_order(setup.tenant, order_input(&setup, &[]), Uuid::new_v4())
    .await
    .unwrap();
  assert_eq!(first.order_number, "SO-000001");
  assert_eq!(second.order_number, "SO-000002");
  assert_eq!(first.status, StockOrderStatus::Draft);
}

#[tokio::test]
async fn empty_order_cannot_be_submitted() {
  let setup = setup().await;
  let order = setup
    .s
    .create_stock_order(setup.tenant, order_input(&setup, &[]), Uuid::new_v4())
    .await
    .unwrap();
  let err = setup
    .s
    .transition_stock_order(
      setup.tenant,
      order.id,
      StockOrderAction::Submit,
      Uuid::new_v4(),
    )
    .await
    .unwrap_err();
  assert!(is_validation(&err));
}

#[tokio::test]
async fn approval_reserves_stock() {
  let setup = setup().await;
  let id = approved_order(&setup).await;

  let order = setup.s.get_stock_order(setup.tenant, id).await.unwrap().unwrap();
  assert_eq!(order.status, StockOrderStatus::Approved);
  assert!(order.stock_reserved);
  assert!(order.approved_by.is_some());
  assert_eq!(available(&setup, setup.bolts).await, 70);
  assert_eq!(available(&setup, setup.nuts).await, 15);
}

#[tokio::test]
async fn cancelling_an_approved_order_releases_stock() {
  let setup = setup().await;
  let id = approved_order(&setup).await;

  let order = setup
    .s
    .transition_stock_order(
      setup.tenant,
      id,
      StockOrderAction::Cancel { reason: Some("job postponed".into()) },
      Uuid::new_v4(),
    )
    .await
    .unwrap();
  assert_eq!(order.status, StockOrderStatus::Cancelled);
  assert!(!order.stock_reserved);
  assert_eq!(order.cancellation_reason.as_deref(), Some("job postponed"));
  assert_eq!(available(&setup, setup.bolts).await, 100);
}

#[tokio::test]
async fn collection_consumes_stock() {
  let setup = setup().await;
  let id = approved_order(&setup).await;
  for action in [StockOrderAction::ReadyForCollection, StockOrderAction::Collect] {
    setup
      .s
      .transition_stock_order(setup.tenant, id, action, Uuid::new_v4())
      .await
      .unwrap();
  }

  let order = setup.s.get_stock_order(setup.tenant, id).await.unwrap().unwrap();
  assert_eq!(order.status, StockOrderStatus::Collected);
  assert!(order.collected_at.is_some());

  let page = setup
    .s
    .list_stock_levels(
      setup.tenant,
      StockLevelFilter { product_id: Some(setup.bolts), ..Default::default() },
      ListQuery::default(),
    )
    .await
    .unwrap();
  let level = &page.items[0];
  assert_eq!(level.level.quantity_on_hand, 70);
  assert_eq!(level.level.quantity_reserved, 0);

  let issues = setup
    .s
    .list_stock_transactions(
      setup.tenant,
      TransactionFilter { product_id: Some(setup.bolts), ..Default::default() },
      ListQuery::default(),
    )
    .await
    .unwrap();
  assert!(
    issues
      .items
      .iter()
      .any(|t| t.kind == StockTransactionKind::Issue && t.quantity == -30)
  );
}

#[tokio::test]
async fn collect_is_refused_while_awaiting_pick() {
  let setup = setup().await;
  let id = approved_order(&setup).await;
  setup
    .s
    .transition_stock_order(setup.tenant, id, StockOrderAction::StartPicking, Uuid::new_v4())
    .await
    .unwrap();
  let err = setup
    .s
    .transition_stock_order(setup.tenant, id, StockOrderAction::Collect, Uuid::new_v4())
    .await
    .unwrap_err();
  assert!(is_invalid_transition(&err));
}

#[tokio::test]
async fn insufficient_stock_rolls_back_every_line() {
  let setup = setup().await;
  let order = setup
    .s
    .create_stock_order(
      setup.tenant,
      order_input(&setup, &[(setup.bolts, 10), (setup.nuts, 50)]),
      Uuid::new_v4(),
    )
    .await
    .unwrap();
  setup
    .s
    .transition_stock_order(setup.tenant, order.id, StockOrderAction::Submit, Uuid::new_v4())
    .await
    .unwrap();

  let err = setup
    .s
    .transition_stock_order(setup.tenant, order.id, StockOrderAction::Approve, Uuid::new_v4())
    .await
    .unwrap_err();
  assert!(matches!(
    err,
    Error::Core(fieldops_core::Error::InsufficientStock { requested: 50, available: 20, .. })
  ));

  let order = setup
    .s
    .get_stock_order(setup.tenant, order.id)
    .await
    .unwrap()
    .unwrap();
  assert_eq!(order.status, StockOrderStatus::PendingApproval);
  assert_eq!(available(&setup, setup.bolts).await, 100);
}

#[tokio::test]
async fn rejected_order_returns_to_draft_and_is_editable() {
  let setup = setup().await;
  let order = setup
    .s
    .create_stock_order(
      setup.tenant,
      order_input(&setup, &[(setup.bolts, 10)]),
      Uuid::new_v4(),
    )
    .await
    .unwrap();
  setup
    .s
    .transition_stock_order(setup.tenant, order.id, StockOrderAction::Submit, Uuid::new_v4())
    .await
    .unwrap();

  let err = setup
    .s
    .update_stock_order(setup.tenant, order.id, order_input(&setup, &[(setup.bolts, 5)]))
    .await
    .unwrap_err();
  assert!(is_invalid_transition(&err));

  let rejected = setup
    .s
    .transition_stock_order(
      setup.tenant,
      order.id,
      StockOrderAction::Reject { reason: Some("wrong site".into()) },
      Uuid::new_v4(),
    )
    .await
    .unwrap();
  assert_eq!(rejected.status, StockOrderStatus::Draft);
  assert_eq!(rejected.rejection_reason.as_deref(), Some("wrong site"));

  let updated = setup
    .s
    .update_stock_order(setup.tenant, order.id, order_input(&setup, &[(setup.bolts, 5)]))
    .await
    .unwrap();
  assert_eq!(updated.total_quantity(), 5);
}

#[tokio::test]
async fn approved_order_cannot_be_deleted() {
  let setup = setup().await;
  let id = approved_order(&setup).await;
  let err = setup.s.delete_stock_order(setup.tenant, id).await.unwrap_err();
  assert!(is_invalid_transition(&err));
}
