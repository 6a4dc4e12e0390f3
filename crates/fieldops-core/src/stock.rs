//! Products, stock levels, and the stock-order workflow.
//!
//! A stock order is an internal request to move stock from a location
//! (warehouse) to a site. Its status changes only through
//! [`StockOrderStatus::apply`], which also says which side effect the store
//! must perform against [`StockLevel`] in the same transaction.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use uuid::Uuid;

use crate::{
  Error, Result,
  common::{Pence, require_non_negative, require_positive, require_text, too_large},
};

// ─── Catalogue ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
  pub id:          Uuid,
  pub tenant_id:   Uuid,
  pub name:        String,
  pub description: Option<String>,
  pub created_at:  DateTime<Utc>,
  pub updated_at:  DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryInput {
  pub name:        String,
  pub description: Option<String>,
}

impl CategoryInput {
  pub fn validate(&self) -> Result<()> { require_text("name", &self.name) }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Supplier {
  pub id:           Uuid,
  pub tenant_id:    Uuid,
  pub name:         String,
  pub contact_name: Option<String>,
  pub email:        Option<String>,
  pub phone:        Option<String>,
  /// Our account reference with the supplier.
  pub account_ref:  Option<String>,
  pub created_at:   DateTime<Utc>,
  pub updated_at:   DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SupplierInput {
  pub name:         String,
  pub contact_name: Option<String>,
  pub email:        Option<String>,
  pub phone:        Option<String>,
  pub account_ref:  Option<String>,
}

impl SupplierInput {
  pub fn validate(&self) -> Result<()> { require_text("name", &self.name) }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
  pub id:            Uuid,
  pub tenant_id:     Uuid,
  /// Unique per tenant.
  pub sku:           String,
  pub name:          String,
  pub description:   Option<String>,
  pub category_id:   Option<Uuid>,
  pub supplier_id:   Option<Uuid>,
  /// Unit of measure, e.g. "each", "box", "m".
  pub unit:          String,
  pub unit_cost:     Pence,
  /// Available quantity at or below which the product counts as low stock.
  pub reorder_level: i64,
  pub created_at:    DateTime<Utc>,
  pub updated_at:    DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductInput {
  pub sku:           String,
  pub name:          String,
  pub description:   Option<String>,
  pub category_id:   Option<Uuid>,
  pub supplier_id:   Option<Uuid>,
  #[serde(default = "default_unit")]
  pub unit:          String,
  #[serde(default)]
  pub unit_cost:     Pence,
  #[serde(default)]
  pub reorder_level: i64,
}

fn default_unit() -> String { "each".to_string() }

impl ProductInput {
  pub fn validate(&self) -> Result<()> {
    require_text("sku", &self.sku)?;
    require_text("name", &self.name)?;
    require_non_negative("unit_cost", self.unit_cost)?;
    require_non_negative("reorder_level", self.reorder_level)
  }
}

/// A warehouse or store that holds stock.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockLocation {
  pub id:         Uuid,
  pub tenant_id:  Uuid,
  pub name:       String,
  pub code:       Option<String>,
  pub is_active:  bool,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockLocationInput {
  pub name:      String,
  pub code:      Option<String>,
  #[serde(default = "default_true")]
  pub is_active: bool,
}

fn default_true() -> bool { true }

impl StockLocationInput {
  pub fn validate(&self) -> Result<()> { require_text("name", &self.name) }
}

// ─── Stock levels ────────────────────────────────────────────────────────────

/// Quantity of one product held at one location.
///
/// Invariant: `0 <= quantity_reserved <= quantity_on_hand`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockLevel {
  pub id:                Uuid,
  pub tenant_id:         Uuid,
  pub product_id:        Uuid,
  pub location_id:       Uuid,
  pub quantity_on_hand:  i64,
  pub quantity_reserved: i64,
  pub updated_at:        DateTime<Utc>,
}

impl StockLevel {
  /// Available-to-promise: on hand minus reserved.
  pub fn available(&self) -> i64 {
    self.quantity_on_hand - self.quantity_reserved
  }

  /// Hold `quantity` for an approved order.
  pub fn reserve(&mut self, quantity: i64) -> Result<()> {
    if self.available() < quantity {
      return Err(Error::InsufficientStock {
        product_id: self.product_id,
        requested:  quantity,
        available:  self.available(),
      });
    }
    self.quantity_reserved += quantity;
    Ok(())
  }

  /// Give back a reservation. Never drives `quantity_reserved` below zero.
  pub fn release(&mut self, quantity: i64) {
    self.quantity_reserved = (self.quantity_reserved - quantity).max(0);
  }

  /// Remove reserved stock that has been physically collected.
  pub fn consume(&mut self, quantity: i64) -> Result<()> {
    if self.quantity_on_hand < quantity {
      return Err(Error::InsufficientStock {
        product_id: self.product_id,
        requested:  quantity,
        available:  self.quantity_on_hand,
      });
    }
    self.quantity_on_hand -= quantity;
    self.quantity_reserved = (self.quantity_reserved - quantity).max(0);
    Ok(())
  }

  /// Book goods received into stock.
  pub fn receive(&mut self, quantity: i64) -> Result<()> {
    self.quantity_on_hand = self
      .quantity_on_hand
      .checked_add(quantity)
      .ok_or_else(|| too_large("stock on hand"))?;
    Ok(())
  }

  /// Apply a manual correction to the on-hand figure.
  pub fn adjust(&mut self, delta: i64) -> Result<()> {
    let next = self
      .quantity_on_hand
      .checked_add(delta)
      .ok_or_else(|| too_large("stock on hand"))?;
    if next < 0 {
      return Err(Error::validation("stock on hand cannot go negative"));
    }
    if next < self.quantity_reserved {
      return Err(Error::validation(format!(
        "stock on hand cannot drop below the {} units reserved",
        self.quantity_reserved
      )));
    }
    self.quantity_on_hand = next;
    Ok(())
  }
}

/// A stock level joined with the product fields needed for display and the
/// low-stock check.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockLevelView {
  #[serde(flatten)]
  pub level:         StockLevel,
  pub sku:           String,
  pub product_name:  String,
  pub location_name: String,
  pub reorder_level: i64,
  pub available:     i64,
  pub low_stock:     bool,
}

impl StockLevelView {
  pub fn new(
    level: StockLevel,
    sku: String,
    product_name: String,
    location_name: String,
    reorder_level: i64,
  ) -> Self {
    let available = level.available();
    Self {
      level,
      sku,
      product_name,
      location_name,
      reorder_level,
      available,
      low_stock: available <= reorder_level,
    }
  }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StockLevelFilter {
  pub product_id:  Option<Uuid>,
  pub location_id: Option<Uuid>,
  #[serde(default)]
  pub low_stock:   bool,
}

// ─── Transactions ────────────────────────────────────────────────────────────

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum StockTransactionKind {
  Receipt,
  Issue,
  Adjustment,
  Reservation,
  Release,
}

/// An append-only record of a stock movement. `quantity` is signed relative
/// to the figure the kind affects (on hand for receipts, issues and
/// adjustments; reserved for reservations and releases).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockTransaction {
  pub id:          Uuid,
  pub tenant_id:   Uuid,
  pub product_id:  Uuid,
  pub location_id: Uuid,
  pub kind:        StockTransactionKind,
  pub quantity:    i64,
  /// Document number or free-text reason.
  pub reference:   Option<String>,
  pub created_by:  Option<Uuid>,
  pub created_at:  DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TransactionFilter {
  pub product_id:  Option<Uuid>,
  pub location_id: Option<Uuid>,
}

/// Input to a manual stock adjustment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockAdjustment {
  pub product_id:     Uuid,
  pub location_id:    Uuid,
  pub quantity_delta: i64,
  pub reason:         String,
}

impl StockAdjustment {
  pub fn validate(&self) -> Result<()> {
    require_text("reason", &self.reason)?;
    if self.quantity_delta == 0 {
      return Err(Error::validation("quantity_delta must not be zero"));
    }
    Ok(())
  }
}

// ─── Stock orders ────────────────────────────────────────────────────────────

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Serialize,
  Deserialize,
  Display,
  EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum StockOrderStatus {
  Draft,
  PendingApproval,
  Approved,
  AwaitingPick,
  ReadyForCollection,
  Collected,
  Cancelled,
}

/// A request to move the order through its workflow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum StockOrderAction {
  Submit,
  Approve,
  Reject { reason: Option<String> },
  StartPicking,
  ReadyForCollection,
  Collect,
  Cancel { reason: Option<String> },
}

impl StockOrderAction {
  pub fn name(&self) -> &'static str {
    match self {
      Self::Submit => "submit",
      Self::Approve => "approve",
      Self::Reject { .. } => "reject",
      Self::StartPicking => "start picking",
      Self::ReadyForCollection => "mark ready for collection",
      Self::Collect => "collect",
      Self::Cancel { .. } => "cancel",
    }
  }
}

/// What the store must do to stock levels when a transition is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StockEffect {
  None,
  /// Reserve every line's quantity at the order's location.
  Reserve,
  /// Release the reservation made on approval, if one is held.
  Release,
  /// Take every line's quantity off hand and out of reserved.
  Consume,
}

impl StockOrderStatus {
  /// The transition table. Returns the next status and the stock side effect
  /// or [`Error::InvalidTransition`] when `action` is not allowed from `self`.
  pub fn apply(
    self,
    action: &StockOrderAction,
  ) -> Result<(StockOrderStatus, StockEffect)> {
    use StockOrderAction as A;
    use StockOrderStatus as S;

    let next = match (self, action) {
      (S::Draft, A::Submit) => (S::PendingApproval, StockEffect::None),
      (S::PendingApproval, A::Approve) => (S::Approved, StockEffect::Reserve),
      (S::PendingApproval, A::Reject { .. }) => (S::Draft, StockEffect::None),
      (S::Approved, A::StartPicking) => (S::AwaitingPick, StockEffect::None),
      (S::Approved | S::AwaitingPick, A::ReadyForCollection) => {
        (S::ReadyForCollection, StockEffect::None)
      }
      (S::Approved | S::ReadyForCollection, A::Collect) => {
        (S::Collected, StockEffect::Consume)
      }
      (
        S::Draft
        | S::PendingApproval
        | S::Approved
        | S::AwaitingPick
        | S::ReadyForCollection,
        A::Cancel { .. },
      ) => (S::Cancelled, StockEffect::Release),
      (from, action) => {
        return Err(Error::InvalidTransition {
          entity: "stock order",
          from:   from.to_string(),
          action: action.name(),
        });
      }
    };
    Ok(next)
  }

  pub fn is_editable(self) -> bool { self == Self::Draft }

  pub fn is_deletable(self) -> bool {
    matches!(self, Self::Draft | Self::Cancelled)
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockOrderLine {
  pub id:         Uuid,
  pub product_id: Uuid,
  pub quantity:   i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockOrder {
  pub id:                  Uuid,
  pub tenant_id:           Uuid,
  /// Per-tenant sequence, e.g. `SO-000001`.
  pub order_number:        String,
  pub site_id:             Uuid,
  /// The location stock is picked from.
  pub location_id:         Uuid,
  pub required_date:       Option<NaiveDate>,
  pub status:              StockOrderStatus,
  pub notes:               Option<String>,
  pub requested_by:        Option<Uuid>,
  pub approved_by:         Option<Uuid>,
  pub approved_at:         Option<DateTime<Utc>>,
  pub collected_at:        Option<DateTime<Utc>>,
  pub rejection_reason:    Option<String>,
  pub cancellation_reason: Option<String>,
  /// Whether a reservation is currently held against stock levels.
  pub stock_reserved:      bool,
  pub lines:               Vec<StockOrderLine>,
  pub created_at:          DateTime<Utc>,
  pub updated_at:          DateTime<Utc>,
}

impl StockOrder {
  pub fn total_quantity(&self) -> i64 {
    self.lines.iter().map(|l| l.quantity).fold(0, i64::saturating_add)
  }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockOrderLineInput {
  pub product_id: Uuid,
  pub quantity:   i64,
}

/// Editable fields of a stock order; used for create and (Draft-only) update.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockOrderInput {
  pub site_id:       Uuid,
  pub location_id:   Uuid,
  pub required_date: Option<NaiveDate>,
  pub notes:         Option<String>,
  #[serde(default)]
  pub lines:         Vec<StockOrderLineInput>,
}

impl StockOrderInput {
  pub fn validate(&self) -> Result<()> {
    for line in &self.lines {
      require_positive("line quantity", line.quantity)?;
    }
    let mut seen = std::collections::HashSet::new();
    for line in &self.lines {
      if !seen.insert(line.product_id) {
        return Err(Error::validation(format!(
          "product {} appears on more than one line",
          line.product_id
        )));
      }
    }
    Ok(())
  }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StockOrderFilter {
  pub status:  Option<StockOrderStatus>,
  pub site_id: Option<Uuid>,
}

#[cfg(test)]
mod tests {
  use super::*;

  fn level(on_hand: i64, reserved: i64) -> StockLevel {
    StockLevel {
      id:                Uuid::new_v4(),
      tenant_id:         Uuid::new_v4(),
      product_id:        Uuid::new_v4(),
      location_id:       Uuid::new_v4(),
      quantity_on_hand:  on_hand,
      quantity_reserved: reserved,
      updated_at:        Utc::now(),
    }
  }

  // ── Transition table ──────────────────────────────────────────────────────

  #[test]
  fn happy_path_through_collection() {
    let s = StockOrderStatus::Draft;
    let (s, e) = s.apply(&StockOrderAction::Submit).unwrap();
    assert_eq!((s, e), (StockOrderStatus::PendingApproval, StockEffect::None));
    let (s, e) = s.apply(&StockOrderAction::Approve).unwrap();
    assert_eq!((s, e), (StockOrderStatus::Approved, StockEffect::Reserve));
    let (s, _) = s.apply(&StockOrderAction::StartPicking).unwrap();
    assert_eq!(s, StockOrderStatus::AwaitingPick);
    let (s, _) = s.apply(&StockOrderAction::ReadyForCollection).unwrap();
    assert_eq!(s, StockOrderStatus::ReadyForCollection);
    let (s, e) = s.apply(&StockOrderAction::Collect).unwrap();
    assert_eq!((s, e), (StockOrderStatus::Collected, StockEffect::Consume));
  }

  #[test]
  fn reject_returns_to_draft() {
    let (s, _) = StockOrderStatus::PendingApproval
      .apply(&StockOrderAction::Reject { reason: None })
      .unwrap();
    assert_eq!(s, StockOrderStatus::Draft);
  }

  #[test]
  fn collect_only_from_approved_or_ready() {
    use StockOrderStatus::*;
    for from in [Draft, PendingApproval, AwaitingPick, Collected, Cancelled] {
      let err = from.apply(&StockOrderAction::Collect).unwrap_err();
      assert!(matches!(err, Error::InvalidTransition { .. }), "{from}");
    }
    assert!(Approved.apply(&StockOrderAction::Collect).is_ok());
    assert!(ReadyForCollection.apply(&StockOrderAction::Collect).is_ok());
  }

  #[test]
  fn cancel_allowed_before_collection_only() {
    use StockOrderStatus::*;
    let cancel = StockOrderAction::Cancel { reason: None };
    for from in [Draft, PendingApproval, Approved, AwaitingPick, ReadyForCollection] {
      let (s, e) = from.apply(&cancel).unwrap();
      assert_eq!((s, e), (Cancelled, StockEffect::Release));
    }
    assert!(Collected.apply(&cancel).is_err());
    assert!(Cancelled.apply(&cancel).is_err());
  }

  #[test]
  fn approve_requires_pending_approval() {
    let err = StockOrderStatus::Draft
      .apply(&StockOrderAction::Approve)
      .unwrap_err();
    assert_eq!(
      err.to_string(),
      "cannot approve stock order in status draft"
    );
  }

  // ── Stock level arithmetic ────────────────────────────────────────────────

  #[test]
  fn reserve_then_release_restores_available() {
    let mut l = level(10, 2);
    l.reserve(5).unwrap();
    assert_eq!(l.available(), 3);
    l.release(5);
    assert_eq!(l.available(), 8);
  }

  #[test]
  fn reserve_beyond_available_fails() {
    let mut l = level(10, 8);
    let err = l.reserve(3).unwrap_err();
    assert!(matches!(
      err,
      Error::InsufficientStock { requested: 3, available: 2, .. }
    ));
    assert_eq!(l.quantity_reserved, 8);
  }

  #[test]
  fn consume_decrements_both_figures() {
    let mut l = level(10, 4);
    l.consume(4).unwrap();
    assert_eq!((l.quantity_on_hand, l.quantity_reserved), (6, 0));
  }

  #[test]
  fn adjust_cannot_drop_below_reserved() {
    let mut l = level(10, 6);
    assert!(l.adjust(-5).is_err());
    l.adjust(-4).unwrap();
    assert_eq!(l.quantity_on_hand, 6);
  }

  #[test]
  fn on_hand_overflow_is_a_validation_error() {
    let mut l = level(10, 0);
    assert!(matches!(l.adjust(i64::MAX), Err(Error::Validation(_))));
    assert!(matches!(l.receive(i64::MAX), Err(Error::Validation(_))));
    assert_eq!(l.quantity_on_hand, 10);
    l.receive(5).unwrap();
    assert_eq!(l.quantity_on_hand, 15);
  }

  #[test]
  fn duplicate_products_rejected() {
    let product_id = Uuid::new_v4();
    let input = StockOrderInput {
      site_id:       Uuid::new_v4(),
      location_id:   Uuid::new_v4(),
      required_date: None,
      notes:         None,
      lines:         vec![
        StockOrderLineInput { product_id, quantity: 1 },
        StockOrderLineInput { product_id, quantity: 2 },
      ],
    };
    assert!(input.validate().is_err());
  }
}
