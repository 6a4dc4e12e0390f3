//! RAMS: risk assessment and method statement documents.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, IntoStaticStr};
use uuid::Uuid;

use crate::{Error, Result, common::require_text};

// ─── Risk scoring ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
  Low,
  Medium,
  High,
  VeryHigh,
}

impl RiskLevel {
  /// Band a 5×5 matrix score.
  pub fn from_score(score: u8) -> Self {
    match score {
      0..=4 => Self::Low,
      5..=9 => Self::Medium,
      10..=16 => Self::High,
      _ => Self::VeryHigh,
    }
  }
}

/// Likelihood and severity on a 1–5 scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskRating {
  pub likelihood: u8,
  pub severity:   u8,
}

impl RiskRating {
  pub fn score(self) -> u8 { self.likelihood.saturating_mul(self.severity) }

  pub fn level(self) -> RiskLevel { RiskLevel::from_score(self.score()) }

  fn validate(self, label: &str) -> Result<()> {
    for (name, value) in [("likelihood", self.likelihood), ("severity", self.severity)] {
      if !(1..=5).contains(&value) {
        return Err(Error::validation(format!(
          "{label} {name} must be between 1 and 5"
        )));
      }
    }
    Ok(())
  }
}

// ─── Document ────────────────────────────────────────────────────────────────

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum RamsStatus {
  Draft,
  PendingReview,
  Approved,
  Rejected,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, IntoStaticStr)]
#[serde(tag = "action", rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum RamsAction {
  Submit,
  Approve,
  Reject { reason: String },
  Revise,
}

impl RamsStatus {
  pub fn apply(self, action: &RamsAction) -> Result<Self> {
    use RamsAction as A;
    use RamsStatus as S;
    match (self, action) {
      (S::Draft, A::Submit) => Ok(S::PendingReview),
      (S::PendingReview, A::Approve) => Ok(S::Approved),
      (S::PendingReview, A::Reject { .. }) => Ok(S::Rejected),
      (S::Approved | S::Rejected, A::Revise) => Ok(S::Draft),
      (from, action) => Err(Error::InvalidTransition {
        entity: "RAMS document",
        from:   from.to_string(),
        action: action.into(),
      }),
    }
  }

  pub fn is_editable(self) -> bool { self == Self::Draft }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskControl {
  pub id:          Uuid,
  pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskAssessment {
  pub id:          Uuid,
  pub hazard:      String,
  pub who_at_risk: Option<String>,
  pub initial:     RiskRating,
  /// Rating once the controls are in place.
  pub residual:    RiskRating,
  pub controls:    Vec<RiskControl>,
}

impl RiskAssessment {
  pub fn initial_level(&self) -> RiskLevel { self.initial.level() }

  pub fn residual_level(&self) -> RiskLevel { self.residual.level() }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodStep {
  pub id:          Uuid,
  pub step_number: i64,
  pub description: String,
  pub responsible: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RamsDocument {
  pub id:               Uuid,
  pub tenant_id:        Uuid,
  /// Per-tenant sequence, e.g. `RAMS-000001`.
  pub reference:        String,
  pub title:            String,
  pub site_id:          Option<Uuid>,
  pub scope:            Option<String>,
  /// Starts at 1; incremented every time an approved or rejected document is
  /// reopened for editing.
  pub revision:         i64,
  pub status:           RamsStatus,
  pub submitted_at:     Option<DateTime<Utc>>,
  pub approved_by:      Option<Uuid>,
  pub approved_at:      Option<DateTime<Utc>>,
  pub rejection_reason: Option<String>,
  pub risk_assessments: Vec<RiskAssessment>,
  pub method_steps:     Vec<MethodStep>,
  pub created_at:       DateTime<Utc>,
  pub updated_at:       DateTime<Utc>,
}

impl RamsDocument {
  /// The worst residual risk across all assessments.
  pub fn highest_residual_level(&self) -> Option<RiskLevel> {
    self.risk_assessments.iter().map(|r| r.residual_level()).max()
  }

  /// A document can only go to review once it says what the risks are and
  /// how the work will be done.
  pub fn check_complete(&self) -> Result<()> {
    if self.risk_assessments.is_empty() {
      return Err(Error::validation(
        "a RAMS document needs at least one risk assessment",
      ));
    }
    if self.method_steps.is_empty() {
      return Err(Error::validation(
        "a RAMS document needs at least one method step",
      ));
    }
    Ok(())
  }
}

// ─── Inputs ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskAssessmentInput {
  pub hazard:      String,
  pub who_at_risk: Option<String>,
  pub initial:     RiskRating,
  pub residual:    RiskRating,
  #[serde(default)]
  pub controls:    Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MethodStepInput {
  pub description: String,
  pub responsible: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RamsInput {
  pub title:            String,
  pub site_id:          Option<Uuid>,
  pub scope:            Option<String>,
  #[serde(default)]
  pub risk_assessments: Vec<RiskAssessmentInput>,
  /// Numbered in the order given.
  #[serde(default)]
  pub method_steps:     Vec<MethodStepInput>,
}

impl RamsInput {
  pub fn validate(&self) -> Result<()> {
    require_text("title", &self.title)?;
    for ra in &self.risk_assessments {
      require_text("hazard", &ra.hazard)?;
      ra.initial.validate("initial")?;
      ra.residual.validate("residual")?;
      if ra.residual.score() > ra.initial.score() {
        return Err(Error::validation(format!(
          "residual risk for {:?} exceeds the initial risk",
          ra.hazard
        )));
      }
      for control in &ra.controls {
        require_text("control", control)?;
      }
    }
    for step in &self.method_steps {
      require_text("method step", &step.description)?;
    }
    Ok(())
  }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RamsFilter {
  pub status:  Option<RamsStatus>,
  pub site_id: Option<Uuid>,
}

#[cfg(test)]
mod tests {
  use super::*;

  fn rating(likelihood: u8, severity: u8) -> RiskRating {
    RiskRating { likelihood, severity }
  }

  #[test]
  fn risk_bands() {
    assert_eq!(rating(2, 2).level(), RiskLevel::Low);
    assert_eq!(rating(1, 5).level(), RiskLevel::Medium);
    assert_eq!(rating(3, 3).level(), RiskLevel::Medium);
    assert_eq!(rating(4, 4).level(), RiskLevel::High);
    assert_eq!(rating(4, 5).level(), RiskLevel::VeryHigh);
  }

  #[test]
  fn residual_cannot_exceed_initial() {
    let input = RamsInput {
      title:            "Roof works".into(),
      site_id:          None,
      scope:            None,
      risk_assessments: vec![RiskAssessmentInput {
        hazard:      "Fall from height".into(),
        who_at_risk: None,
        initial:     rating(2, 3),
        residual:    rating(3, 3),
        controls:    vec!["Edge protection".into()],
      }],
      method_steps:     vec![],
    };
    assert!(input.validate().is_err());
  }

  #[test]
  fn out_of_range_rating_rejected() {
    let input = RamsInput {
      title:            "Excavation".into(),
      site_id:          None,
      scope:            None,
      risk_assessments: vec![RiskAssessmentInput {
        hazard:      "Collapse".into(),
        who_at_risk: None,
        initial:     rating(6, 1),
        residual:    rating(1, 1),
        controls:    vec![],
      }],
      method_steps:     vec![],
    };
    assert!(input.validate().is_err());
  }

  #[test]
  fn workflow_transitions() {
    use RamsStatus::*;
    assert_eq!(Draft.apply(&RamsAction::Submit).unwrap(), PendingReview);
    assert_eq!(PendingReview.apply(&RamsAction::Approve).unwrap(), Approved);
    assert_eq!(
      PendingReview
        .apply(&RamsAction::Reject { reason: "missing lifting plan".into() })
        .unwrap(),
      Rejected
    );
    assert_eq!(Approved.apply(&RamsAction::Revise).unwrap(), Draft);
    let err = Draft.apply(&RamsAction::Approve).unwrap_err();
    assert_eq!(err.to_string(), "cannot approve RAMS document in status draft");
  }
}
