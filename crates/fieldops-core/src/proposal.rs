//! Proposals (quotes) made up of priced sections.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, IntoStaticStr};
use uuid::Uuid;

use crate::{
  Error, Result,
  common::{
    Pence, checked_total, percent_of, require_non_negative, require_percent,
    require_text, too_large,
  },
};

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ProposalStatus {
  Draft,
  Submitted,
  Accepted,
  Rejected,
  Cancelled,
}

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ProposalAction {
  Submit,
  Accept,
  Reject,
  Cancel,
  Revise,
}

impl ProposalStatus {
  pub fn apply(self, action: ProposalAction) -> Result<Self> {
    use ProposalAction as A;
    use ProposalStatus as S;
    match (self, action) {
      (S::Draft, A::Submit) => Ok(S::Submitted),
      (S::Submitted, A::Accept) => Ok(S::Accepted),
      (S::Submitted, A::Reject) => Ok(S::Rejected),
      (S::Draft | S::Submitted, A::Cancel) => Ok(S::Cancelled),
      (S::Rejected, A::Revise) => Ok(S::Draft),
      (from, action) => Err(Error::InvalidTransition {
        entity: "proposal",
        from:   from.to_string(),
        action: action.into(),
      }),
    }
  }

  pub fn is_editable(self) -> bool { self == Self::Draft }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProposalLineItem {
  pub id:          Uuid,
  pub description: String,
  pub quantity:    i64,
  pub unit_price:  Pence,
}

impl ProposalLineItem {
  pub fn line_total(&self) -> Pence {
    self.quantity.saturating_mul(self.unit_price)
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProposalSection {
  pub id:         Uuid,
  pub title:      String,
  pub sort_order: i64,
  pub items:      Vec<ProposalLineItem>,
}

/// Derived money figures for a proposal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ProposalTotals {
  pub subtotal: Pence,
  pub discount: Pence,
  pub vat:      Pence,
  pub total:    Pence,
}

impl ProposalTotals {
  pub fn compute(
    sections: &[ProposalSection],
    discount_percent: f64,
    vat_percent: f64,
  ) -> Self {
    let subtotal: Pence = sections
      .iter()
      .flat_map(|s| s.items.iter())
      .map(ProposalLineItem::line_total)
      .fold(0, Pence::saturating_add);
    let discount = percent_of(subtotal, discount_percent);
    let vat = percent_of(subtotal.saturating_sub(discount), vat_percent);
    Self {
      subtotal,
      discount,
      vat,
      total: subtotal.saturating_sub(discount).saturating_add(vat),
    }
  }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Proposal {
  pub id:               Uuid,
  pub tenant_id:        Uuid,
  /// Per-tenant sequence, e.g. `PR-000001`.
  pub reference:        String,
  pub title:            String,
  pub company_id:       Uuid,
  pub contact_id:       Option<Uuid>,
  pub site_id:          Option<Uuid>,
  pub valid_until:      Option<NaiveDate>,
  pub status:           ProposalStatus,
  pub discount_percent: f64,
  pub vat_percent:      f64,
  pub sections:         Vec<ProposalSection>,
  pub totals:           ProposalTotals,
  pub created_at:       DateTime<Utc>,
  pub updated_at:       DateTime<Utc>,
}

impl Proposal {
  pub fn item_count(&self) -> usize {
    self.sections.iter().map(|s| s.items.len()).sum()
  }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProposalLineItemInput {
  pub description: String,
  pub quantity:    i64,
  pub unit_price:  Pence,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProposalSectionInput {
  pub title: String,
  #[serde(default)]
  pub items: Vec<ProposalLineItemInput>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProposalInput {
  pub title:            String,
  pub company_id:       Uuid,
  pub contact_id:       Option<Uuid>,
  pub site_id:          Option<Uuid>,
  pub valid_until:      Option<NaiveDate>,
  #[serde(default)]
  pub discount_percent: f64,
  #[serde(default = "default_vat")]
  pub vat_percent:      f64,
  #[serde(default)]
  pub sections:         Vec<ProposalSectionInput>,
}

fn default_vat() -> f64 { 20.0 }

impl ProposalInput {
  pub fn validate(&self) -> Result<()> {
    require_text("title", &self.title)?;
    require_percent("discount_percent", self.discount_percent)?;
    require_percent("vat_percent", self.vat_percent)?;
    for section in &self.sections {
      require_text("section title", &section.title)?;
      for item in &section.items {
        require_text("item description", &item.description)?;
        if item.quantity <= 0 {
          return Err(Error::validation("item quantity must be greater than zero"));
        }
        require_non_negative("unit_price", item.unit_price)?;
      }
    }
    let subtotal = checked_total(
      "proposal subtotal",
      self
        .sections
        .iter()
        .flat_map(|s| s.items.iter())
        .map(|i| (i.quantity, i.unit_price)),
    )?;
    let net = subtotal.saturating_sub(percent_of(subtotal, self.discount_percent));
    net
      .checked_add(percent_of(net, self.vat_percent))
      .ok_or_else(|| too_large("proposal total"))?;
    Ok(())
  }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProposalFilter {
  pub status:     Option<ProposalStatus>,
  pub company_id: Option<Uuid>,
}

#[cfg(test)]
mod tests {
  use super::*;

  fn section(items: &[(i64, Pence)]) -> ProposalSection {
    ProposalSection {
      id:         Uuid::new_v4(),
      title:      "Groundworks".into(),
      sort_order: 0,
      items:      items
        .iter()
        .map(|(q, p)| ProposalLineItem {
          id:          Uuid::new_v4(),
          description: "item".into(),
          quantity:    *q,
          unit_price:  *p,
        })
        .collect(),
    }
  }

  #[test]
  fn totals_apply_discount_before_vat() {
    let sections = vec![section(&[(2, 5_000)]), section(&[(1, 10_000)])];
    let t = ProposalTotals::compute(&sections, 10.0, 20.0);
    assert_eq!(t.subtotal, 20_000);
    assert_eq!(t.discount, 2_000);
    assert_eq!(t.vat, 3_600);
    assert_eq!(t.total, 21_600);
  }

  #[test]
  fn empty_proposal_totals_zero() {
    assert_eq!(ProposalTotals::compute(&[], 5.0, 20.0), ProposalTotals::default());
  }

  #[test]
  fn workflow_transitions() {
    use ProposalStatus::*;
    assert_eq!(Draft.apply(ProposalAction::Submit).unwrap(), Submitted);
    assert_eq!(Submitted.apply(ProposalAction::Accept).unwrap(), Accepted);
    assert_eq!(Rejected.apply(ProposalAction::Revise).unwrap(), Draft);
    assert!(Accepted.apply(ProposalAction::Cancel).is_err());
    assert!(Draft.apply(ProposalAction::Accept).is_err());
  }

  #[test]
  fn total_that_cannot_be_represented_is_rejected() {
    let input = ProposalInput {
      title:            "Extension".into(),
      company_id:       Uuid::new_v4(),
      contact_id:       None,
      site_id:          None,
      valid_until:      None,
      discount_percent: 0.0,
      vat_percent:      20.0,
      sections:         vec![ProposalSectionInput {
        title: "Groundworks".into(),
        items: vec![ProposalLineItemInput {
          description: "Excavation".into(),
          quantity:    1,
          unit_price:  i64::MAX - 10,
        }],
      }],
    };
    assert!(matches!(input.validate(), Err(Error::Validation(_))));
  }

  #[test]
  fn discount_over_hundred_percent_rejected() {
    let input = ProposalInput {
      title:            "Extension".into(),
      company_id:       Uuid::new_v4(),
      contact_id:       None,
      site_id:          None,
      valid_until:      None,
      discount_percent: 120.0,
      vat_percent:      20.0,
      sections:         vec![],
    };
    assert!(input.validate().is_err());
  }
}
