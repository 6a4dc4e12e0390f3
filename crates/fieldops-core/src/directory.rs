//! Company, contact, site, and employee records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use uuid::Uuid;

use crate::{Result, common::require_text};

// ─── Companies ───────────────────────────────────────────────────────────────

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum CompanyKind {
  #[default]
  Client,
  Supplier,
  Subcontractor,
  Other,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Company {
  pub id:         Uuid,
  pub tenant_id:  Uuid,
  pub name:       String,
  pub kind:       CompanyKind,
  pub phone:      Option<String>,
  pub email:      Option<String>,
  pub address:    Option<String>,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompanyInput {
  pub name:    String,
  #[serde(default)]
  pub kind:    CompanyKind,
  pub phone:   Option<String>,
  pub email:   Option<String>,
  pub address: Option<String>,
}

impl CompanyInput {
  pub fn validate(&self) -> Result<()> { require_text("name", &self.name) }
}

// ─── Contacts ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Contact {
  pub id:         Uuid,
  pub tenant_id:  Uuid,
  pub company_id: Option<Uuid>,
  pub first_name: String,
  pub last_name:  String,
  pub email:      Option<String>,
  pub phone:      Option<String>,
  pub job_title:  Option<String>,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContactInput {
  pub company_id: Option<Uuid>,
  pub first_name: String,
  pub last_name:  String,
  pub email:      Option<String>,
  pub phone:      Option<String>,
  pub job_title:  Option<String>,
}

impl ContactInput {
  pub fn validate(&self) -> Result<()> {
    require_text("first_name", &self.first_name)?;
    require_text("last_name", &self.last_name)
  }
}

// ─── Sites ───────────────────────────────────────────────────────────────────

/// A construction or service site that stock is delivered to and employees
/// work at.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Site {
  pub id:         Uuid,
  pub tenant_id:  Uuid,
  pub name:       String,
  pub code:       Option<String>,
  pub address:    Option<String>,
  pub postcode:   Option<String>,
  pub is_active:  bool,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteInput {
  pub name:      String,
  pub code:      Option<String>,
  pub address:   Option<String>,
  pub postcode:  Option<String>,
  #[serde(default = "default_true")]
  pub is_active: bool,
}

impl SiteInput {
  pub fn validate(&self) -> Result<()> { require_text("name", &self.name) }
}

// ─── Employees ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Employee {
  pub id:            Uuid,
  pub tenant_id:     Uuid,
  pub employee_code: Option<String>,
  pub first_name:    String,
  pub last_name:     String,
  pub email:         Option<String>,
  pub phone:         Option<String>,
  pub job_title:     Option<String>,
  /// Primary site, if the employee is based at one.
  pub site_id:       Option<Uuid>,
  pub is_active:     bool,
  pub created_at:    DateTime<Utc>,
  pub updated_at:    DateTime<Utc>,
}

impl Employee {
  pub fn full_name(&self) -> String {
    format!("{} {}", self.first_name, self.last_name)
  }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmployeeInput {
  pub employee_code: Option<String>,
  pub first_name:    String,
  pub last_name:     String,
  pub email:         Option<String>,
  pub phone:         Option<String>,
  pub job_title:     Option<String>,
  pub site_id:       Option<Uuid>,
  #[serde(default = "default_true")]
  pub is_active:     bool,
}

impl EmployeeInput {
  pub fn validate(&self) -> Result<()> {
    require_text("first_name", &self.first_name)?;
    require_text("last_name", &self.last_name)
  }
}

fn default_true() -> bool { true }
