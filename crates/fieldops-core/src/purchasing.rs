//! Purchase orders raised against suppliers and received into stock.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use uuid::Uuid;

use crate::{
  Error, Result,
  common::{Pence, checked_total, require_non_negative, require_positive},
};

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PurchaseOrderStatus {
  Draft,
  Submitted,
  PartiallyReceived,
  Received,
  Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PurchaseOrderAction {
  Submit,
  Cancel,
}

impl PurchaseOrderStatus {
  pub fn apply(self, action: PurchaseOrderAction) -> Result<Self> {
    use PurchaseOrderAction as A;
    use PurchaseOrderStatus as S;
    match (self, action) {
      (S::Draft, A::Submit) => Ok(S::Submitted),
      (S::Draft | S::Submitted, A::Cancel) => Ok(S::Cancelled),
      (from, action) => Err(Error::InvalidTransition {
        entity: "purchase order",
        from:   from.to_string(),
        action: match action {
          A::Submit => "submit",
          A::Cancel => "cancel",
        },
      }),
    }
  }

  pub fn can_receive(self) -> bool {
    matches!(self, Self::Submitted | Self::PartiallyReceived)
  }

  pub fn is_editable(self) -> bool { self == Self::Draft }

  pub fn is_deletable(self) -> bool {
    matches!(self, Self::Draft | Self::Cancelled)
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseOrderLine {
  pub id:                Uuid,
  pub product_id:        Uuid,
  pub quantity_ordered:  i64,
  pub quantity_received: i64,
  pub unit_cost:         Pence,
}

impl PurchaseOrderLine {
  pub fn outstanding(&self) -> i64 {
    self.quantity_ordered - self.quantity_received
  }

  pub fn line_total(&self) -> Pence {
    self.quantity_ordered.saturating_mul(self.unit_cost)
  }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PurchaseOrder {
  pub id:            Uuid,
  pub tenant_id:     Uuid,
  pub order_number:  String,
  pub supplier_id:   Uuid,
  /// Where received goods are booked in.
  pub location_id:   Uuid,
  pub expected_date: Option<NaiveDate>,
  pub status:        PurchaseOrderStatus,
  pub notes:         Option<String>,
  pub created_by:    Option<Uuid>,
  pub lines:         Vec<PurchaseOrderLine>,
  pub total:         Pence,
  pub created_at:    DateTime<Utc>,
  pub updated_at:    DateTime<Utc>,
}

impl PurchaseOrder {
  pub fn compute_total(lines: &[PurchaseOrderLine]) -> Pence {
    lines
      .iter()
      .map(PurchaseOrderLine::line_total)
      .fold(0, Pence::saturating_add)
  }

  pub fn fully_received(&self) -> bool {
    self.lines.iter().all(|l| l.outstanding() == 0)
  }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PurchaseOrderLineInput {
  pub product_id:       Uuid,
  pub quantity_ordered: i64,
  #[serde(default)]
  pub unit_cost:        Pence,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PurchaseOrderInput {
  pub supplier_id:   Uuid,
  pub location_id:   Uuid,
  pub expected_date: Option<NaiveDate>,
  pub notes:         Option<String>,
  #[serde(default)]
  pub lines:         Vec<PurchaseOrderLineInput>,
}

impl PurchaseOrderInput {
  pub fn validate(&self) -> Result<()> {
    for line in &self.lines {
      require_positive("quantity_ordered", line.quantity_ordered)?;
      require_non_negative("unit_cost", line.unit_cost)?;
    }
    checked_total(
      "purchase order total",
      self.lines.iter().map(|l| (l.quantity_ordered, l.unit_cost)),
    )?;
    Ok(())
  }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReceiptLine {
  pub line_id:  Uuid,
  pub quantity: i64,
}

/// Goods received against a purchase order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PurchaseReceipt {
  pub lines: Vec<ReceiptLine>,
}

impl PurchaseReceipt {
  pub fn validate(&self) -> Result<()> {
    if self.lines.is_empty() {
      return Err(Error::validation("a receipt needs at least one line"));
    }
    for line in &self.lines {
      require_positive("received quantity", line.quantity)?;
    }
    Ok(())
  }

  /// Check the receipt against the order's lines and return the updated
  /// lines. Fails without touching anything if a line is unknown or would be
  /// over-received.
  pub fn apply_to(
    &self,
    lines: &[PurchaseOrderLine],
  ) -> Result<Vec<PurchaseOrderLine>> {
    let mut updated = lines.to_vec();
    for receipt in &self.lines {
      let line = updated
        .iter_mut()
        .find(|l| l.id == receipt.line_id)
        .ok_or(Error::NotFound {
          entity: "purchase order line",
          id:     receipt.line_id,
        })?;
      if receipt.quantity > line.outstanding() {
        return Err(Error::validation(format!(
          "cannot receive {} against line {}; only {} outstanding",
          receipt.quantity,
          line.id,
          line.outstanding()
        )));
      }
      line.quantity_received += receipt.quantity;
    }
    Ok(updated)
  }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PurchaseOrderFilter {
  pub status:      Option<PurchaseOrderStatus>,
  pub supplier_id: Option<Uuid>,
}

#[cfg(test)]
mod tests {
  use super::*;

  fn line(ordered: i64, received: i64) -> PurchaseOrderLine {
    PurchaseOrderLine {
      id:                Uuid::new_v4(),
      product_id:        Uuid::new_v4(),
      quantity_ordered:  ordered,
      quantity_received: received,
      unit_cost:         250,
    }
  }

  #[test]
  fn submit_and_cancel_rules() {
    use PurchaseOrderStatus::*;
    assert_eq!(Draft.apply(PurchaseOrderAction::Submit).unwrap(), Submitted);
    assert_eq!(Submitted.apply(PurchaseOrderAction::Cancel).unwrap(), Cancelled);
    assert!(Submitted.apply(PurchaseOrderAction::Submit).is_err());
    assert!(Received.apply(PurchaseOrderAction::Cancel).is_err());
    assert!(PartiallyReceived.apply(PurchaseOrderAction::Cancel).is_err());
  }

  #[test]
  fn receipt_accumulates_and_caps() {
    let lines = vec![line(10, 4)];
    let receipt = PurchaseReceipt {
      lines: vec![ReceiptLine { line_id: lines[0].id, quantity: 6 }],
    };
    let updated = receipt.apply_to(&lines).unwrap();
    assert_eq!(updated[0].quantity_received, 10);

    let over = PurchaseReceipt {
      lines: vec![ReceiptLine { line_id: lines[0].id, quantity: 7 }],
    };
    assert!(over.apply_to(&lines).is_err());
  }

  #[test]
  fn unknown_receipt_line_is_not_found() {
    let lines = vec![line(1, 0)];
    let receipt = PurchaseReceipt {
      lines: vec![ReceiptLine { line_id: Uuid::new_v4(), quantity: 1 }],
    };
    assert!(matches!(
      receipt.apply_to(&lines),
      Err(Error::NotFound { .. })
    ));
  }

  #[test]
  fn oversized_lines_fail_validation() {
    let input = PurchaseOrderInput {
      supplier_id:   Uuid::new_v4(),
      location_id:   Uuid::new_v4(),
      expected_date: None,
      notes:         None,
      lines:         vec![PurchaseOrderLineInput {
        product_id:       Uuid::new_v4(),
        quantity_ordered: 1_000_000_000_000,
        unit_cost:        100_000_000_000,
      }],
    };
    assert!(matches!(input.validate(), Err(Error::Validation(_))));
  }

  #[test]
  fn total_sums_lines() {
    let lines = vec![line(2, 0), line(3, 0)];
    assert_eq!(PurchaseOrder::compute_total(&lines), 1_250);
  }
}
