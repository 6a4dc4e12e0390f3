//! Tenants, users, roles, and the named authorization policies.
//!
//! Every record in the system belongs to exactly one tenant. A user's role
//! maps to a fixed set of [`Permission`]s; HTTP handlers check the permission
//! they need before calling the store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoEnumIterator, IntoStaticStr};
use uuid::Uuid;

use crate::{Result, common::require_text};

// ─── Tenant ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tenant {
  pub id:         Uuid,
  pub name:       String,
  /// URL-safe identifier used at login.
  pub slug:       String,
  pub created_at: DateTime<Utc>,
}

// ─── Permissions ─────────────────────────────────────────────────────────────

/// A named authorization policy. The string form is what appears in error
/// messages and in `GET /api/auth/me`.
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
  EnumIter,
  IntoStaticStr,
)]
pub enum Permission {
  #[serde(rename = "Core.View")]
  #[strum(serialize = "Core.View")]
  CoreView,
  #[serde(rename = "Core.Edit")]
  #[strum(serialize = "Core.Edit")]
  CoreEdit,
  #[serde(rename = "StockManagement.View")]
  #[strum(serialize = "StockManagement.View")]
  StockView,
  #[serde(rename = "StockManagement.Edit")]
  #[strum(serialize = "StockManagement.Edit")]
  StockEdit,
  #[serde(rename = "StockManagement.Approve")]
  #[strum(serialize = "StockManagement.Approve")]
  StockApprove,
  #[serde(rename = "Purchasing.View")]
  #[strum(serialize = "Purchasing.View")]
  PurchasingView,
  #[serde(rename = "Purchasing.Edit")]
  #[strum(serialize = "Purchasing.Edit")]
  PurchasingEdit,
  #[serde(rename = "Proposals.View")]
  #[strum(serialize = "Proposals.View")]
  ProposalsView,
  #[serde(rename = "Proposals.Edit")]
  #[strum(serialize = "Proposals.Edit")]
  ProposalsEdit,
  #[serde(rename = "Rams.View")]
  #[strum(serialize = "Rams.View")]
  RamsView,
  #[serde(rename = "Rams.Edit")]
  #[strum(serialize = "Rams.Edit")]
  RamsEdit,
  #[serde(rename = "Rams.Approve")]
  #[strum(serialize = "Rams.Approve")]
  RamsApprove,
  #[serde(rename = "Toolbox.View")]
  #[strum(serialize = "Toolbox.View")]
  ToolboxView,
  #[serde(rename = "Toolbox.Edit")]
  #[strum(serialize = "Toolbox.Edit")]
  ToolboxEdit,
  #[serde(rename = "Toolbox.Schedule")]
  #[strum(serialize = "Toolbox.Schedule")]
  ToolboxSchedule,
  #[serde(rename = "Users.Manage")]
  #[strum(serialize = "Users.Manage")]
  UsersManage,
}

// ─── Roles ───────────────────────────────────────────────────────────────────

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
  EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Role {
  Admin,
  Manager,
  Supervisor,
  Storekeeper,
  Operative,
}

impl Role {
  /// Whether this role grants `permission`.
  pub fn allows(self, permission: Permission) -> bool {
    use Permission::*;
    match self {
      Role::Admin => true,
      Role::Manager => permission != UsersManage,
      Role::Supervisor => matches!(
        permission,
        CoreView
          | StockView
          | StockEdit
          | PurchasingView
          | ProposalsView
          | RamsView
          | RamsEdit
          | ToolboxView
          | ToolboxEdit
          | ToolboxSchedule
      ),
      Role::Storekeeper => matches!(
        permission,
        CoreView
          | StockView
          | StockEdit
          | StockApprove
          | PurchasingView
          | PurchasingEdit
      ),
      Role::Operative => {
        matches!(permission, CoreView | StockView | RamsView | ToolboxView)
      }
    }
  }

  pub fn permissions(self) -> Vec<Permission> {
    Permission::iter().filter(|p| self.allows(*p)).collect()
  }
}

// ─── Users ───────────────────────────────────────────────────────────────────

/// A login account within a tenant. The password hash is never part of this
/// type; see [`UserCredentials`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
  pub id:           Uuid,
  pub tenant_id:    Uuid,
  pub username:     String,
  pub display_name: String,
  pub email:        Option<String>,
  pub role:         Role,
  /// The employee record this login belongs to, if any. Used to let
  /// operatives complete their own toolbox-talk assignments.
  pub employee_id:  Option<Uuid>,
  pub is_active:    bool,
  pub created_at:   DateTime<Utc>,
  pub updated_at:   DateTime<Utc>,
}

/// A user together with the argon2 PHC string used to verify logins.
#[derive(Debug, Clone)]
pub struct UserCredentials {
  pub user:          User,
  pub password_hash: String,
}

/// Input to [`crate::store::IdentityStore::create_user`]. The password must
/// already be hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
  pub username:      String,
  pub display_name:  String,
  pub email:         Option<String>,
  pub role:          Role,
  pub employee_id:   Option<Uuid>,
  pub password_hash: String,
}

/// Editable fields of a user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserUpdate {
  pub display_name: String,
  pub email:        Option<String>,
  pub role:         Role,
  pub employee_id:  Option<Uuid>,
  #[serde(default = "default_true")]
  pub is_active:    bool,
}

fn default_true() -> bool { true }

impl NewUser {
  pub fn validate(&self) -> Result<()> {
    require_text("username", &self.username)?;
    require_text("display_name", &self.display_name)?;
    if self.username.contains(char::is_whitespace) {
      return Err(crate::Error::validation(
        "username must not contain whitespace",
      ));
    }
    Ok(())
  }
}

impl UserUpdate {
  pub fn validate(&self) -> Result<()> {
    require_text("display_name", &self.display_name)
  }
}

// ─── Authenticated caller ────────────────────────────────────────────────────

/// The identity behind a valid bearer token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentUser {
  pub user_id:     Uuid,
  pub tenant_id:   Uuid,
  pub username:    String,
  pub role:        Role,
  pub employee_id: Option<Uuid>,
}

impl CurrentUser {
  pub fn can(&self, permission: Permission) -> bool {
    self.role.allows(permission)
  }
}
