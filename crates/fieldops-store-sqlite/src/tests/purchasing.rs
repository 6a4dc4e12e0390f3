use fieldops_core::{
  common::ListQuery,
  purchasing::{
    PurchaseOrderAction, PurchaseOrderInput, PurchaseOrderLineInput,
    PurchaseOrderStatus, PurchaseReceipt, ReceiptLine,
  },
  stock::StockLevelFilter,
  store::{PurchasingStore, StockStore},
};
use uuid::Uuid;

use super::*;

struct Setup {
  s:        SqliteStore,
  tenant:   Uuid,
  supplier: Uuid,
  location: Uuid,
  bolts:    Uuid,
}

async fn setup() -> Setup {
  let (s, tenant) = tenant_store().await;
  let supplier = supplier(&s, tenant).await;
  let location = location(&s, tenant).await;
  let bolts = product(&s, tenant, "BOLT-10").await;
  Setup { s, tenant, supplier, location, bolts }
}

fn po_input(setup: &Setup, quantity: i64) -> PurchaseOrderInput {
  PurchaseOrderInput {
    supplier_id:   setup.supplier,
    location_id:   setup.location,
    expected_date: None,
    notes:         None,
    lines:         vec![PurchaseOrderLineInput {
      product_id:       setup.bolts,
      quantity_ordered: quantity,
      unit_cost:        120,
    }],
  }
}

async fn on_hand(setup: &Setup) -> i64 {
  let page = setup
    .s
    .list_stock_levels(
      setup.tenant,
      StockLevelFilter { product_id: Some(setup.bolts), ..Default::default() },
      ListQuery::default(),
    )
    .await
    .unwrap();
  page.items.first().map_or(0, |l| l.level.quantity_on_hand)
}

#[tokio::test]
async fn create_computes_total_and_number() {
  let setup = setup().await;
  let po = setup
    .s
    .create_purchase_order(setup.tenant, po_input(&setup, 10), Uuid::new_v4())
    .await
    .unwrap();
  assert_eq!(po.order_number, "PO-000001");
  assert_eq!(po.status, PurchaseOrderStatus::Draft);
  assert_eq!(po.total, 1_200);
}

#[tokio::test]
async fn oversized_line_is_rejected_and_store_keeps_working() {
  let setup = setup().await;
  let mut input = po_input(&setup, 1_000_000_000_000);
  input.lines[0].unit_cost = 100_000_000_000;
  let err = setup
    .s
    .create_purchase_order(setup.tenant, input, Uuid::new_v4())
    .await
    .unwrap_err();
  assert!(is_validation(&err));

  let po = setup
    .s
    .create_purchase_order(setup.tenant, po_input(&setup, 2), Uuid::new_v4())
    .await
    .unwrap();
  assert_eq!(po.total, 240);
}

#[tokio::test]
async fn draft_order_cannot_be_received() {
  let setup = setup().await;
  let po = setup
    .s
    .create_purchase_order(setup.tenant, po_input(&setup, 10), Uuid::new_v4())
    .await
    .unwrap();
  let err = setup
    .s
    .receive_purchase_order(
      setup.tenant,
      po.id,
      PurchaseReceipt {
        lines: vec![ReceiptLine { line_id: po.lines[0].id, quantity: 1 }],
      },
      Uuid::new_v4(),
    )
    .await
    .unwrap_err();
  assert!(is_invalid_transition(&err));
}

#[tokio::test]
async fn partial_then_full_receipt() {
  let setup = setup().await;
  let po = setup
    .s
    .create_purchase_order(setup.tenant, po_input(&setup, 10), Uuid::new_v4())
    .await
    .unwrap();
  setup
    .s
    .transition_purchase_order(setup.tenant, po.id, PurchaseOrderAction::Submit)
    .await
    .unwrap();
  let line_id = po.lines[0].id;

  let partial = setup
    .s
    .receive_purchase_order(
      setup.tenant,
      po.id,
      PurchaseReceipt { lines: vec![ReceiptLine { line_id, quantity: 4 }] },
      Uuid::new_v4(),
    )
    .await
    .unwrap();
  assert_eq!(partial.status, PurchaseOrderStatus::PartiallyReceived);
  assert_eq!(partial.lines[0].quantity_received, 4);
  assert_eq!(on_hand(&setup).await, 4);

  let full = setup
    .s
    .receive_purchase_order(
      setup.tenant,
      po.id,
      PurchaseReceipt { lines: vec![ReceiptLine { line_id, quantity: 6 }] },
      Uuid::new_v4(),
    )
    .await
    .unwrap();
  assert_eq!(full.status, PurchaseOrderStatus::Received);
  assert_eq!(on_hand(&setup).await, 10);
}

#[tokio::test]
async fn over_receipt_is_rejected() {
  let setup = setup().await;
  let po = setup
    .s
    .create_purchase_order(setup.tenant, po_input(&setup, 10), Uuid::new_v4())
    .await
    .unwrap();
  setup
    .s
    .transition_purchase_order(setup.tenant, po.id, PurchaseOrderAction::Submit)
    .await
    .unwrap();
  let err = setup
    .s
    .receive_purchase_order(
      setup.tenant,
      po.id,
      PurchaseReceipt {
        lines: vec![ReceiptLine { line_id: po.lines[0].id, quantity: 11 }],
      },
      Uuid::new_v4(),
    )
    .await
    .unwrap_err();
  assert!(is_validation(&err));
  assert_eq!(on_hand(&setup).await, 0);
}

#[tokio::test]
async fn submitted_order_is_locked() {
  let setup = setup().await;
  let po = setup
    .s
    .create_purchase_order(setup.tenant, po_input(&setup, 10), Uuid::new_v4())
    .await
    .unwrap();
  setup
    .s
    .transition_purchase_order(setup.tenant, po.id, PurchaseOrderAction::Submit)
    .await
    .unwrap();

  let err = setup
    .s
    .update_purchase_order(setup.tenant, po.id, po_input(&setup, 5))
    .await
    .unwrap_err();
  assert!(is_invalid_transition(&err));
  let err = setup
    .s
    .delete_purchase_order(setup.tenant, po.id)
    .await
    .unwrap_err();
  assert!(is_invalid_transition(&err));

  let cancelled = setup
    .s
    .transition_purchase_order(setup.tenant, po.id, PurchaseOrderAction::Cancel)
    .await
    .unwrap();
  assert_eq!(cancelled.status, PurchaseOrderStatus::Cancelled);
  setup.s.delete_purchase_order(setup.tenant, po.id).await.unwrap();
}
