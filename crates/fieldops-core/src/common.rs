//! Types shared by every resource: paging, list queries, and money helpers.

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Integer minor currency units (pence).
pub type Pence = i64;

// ─── List query ──────────────────────────────────────────────────────────────

/// Paging, search, and sort parameters accepted by every list endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListQuery {
  /// 1-based page number.
  pub page:      Option<u32>,
  pub page_size: Option<u32>,
  /// Substring filter over the resource's text columns.
  pub search:    Option<String>,
  /// Public column name; unknown names fall back to the default order.
  pub sort_by:   Option<String>,
  #[serde(default)]
  pub sort_desc: bool,
}

impl ListQuery {
  pub const DEFAULT_PAGE_SIZE: u32 = 25;
  pub const MAX_PAGE_SIZE: u32 = 100;

  pub fn page(&self) -> u32 { self.page.unwrap_or(1).max(1) }

  pub fn page_size(&self) -> u32 {
    self
      .page_size
      .unwrap_or(Self::DEFAULT_PAGE_SIZE)
      .clamp(1, Self::MAX_PAGE_SIZE)
  }

  pub fn offset(&self) -> u64 {
    u64::from(self.page() - 1) * u64::from(self.page_size())
  }

  /// `%term%` for SQL `LIKE ... ESCAPE '\'`, or `None` when the search is
  /// blank. Wildcards in the term match literally.
  pub fn search_pattern(&self) -> Option<String> {
    let term = self.search.as_deref().map(str::trim).filter(|s| !s.is_empty())?;
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for c in term.chars() {
      if matches!(c, '%' | '_' | '\\') {
        pattern.push('\\');
      }
      pattern.push(c);
    }
    pattern.push('%');
    Some(pattern)
  }
}

// ─── Page ────────────────────────────────────────────────────────────────────

/// One page of a list result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
  pub items:       Vec<T>,
  pub total_count: u64,
  pub page:        u32,
  pub page_size:   u32,
  pub total_pages: u32,
}

impl<T> Page<T> {
  pub fn new(items: Vec<T>, total_count: u64, query: &ListQuery) -> Self {
    let page_size = query.page_size();
    let total_pages = total_count.div_ceil(u64::from(page_size)) as u32;
    Self {
      items,
      total_count,
      page: query.page(),
      page_size,
      total_pages,
    }
  }
}

// ─── Money & validation helpers ──────────────────────────────────────────────

/// `amount * percent / 100`, rounded half away from zero.
pub fn percent_of(amount: Pence, percent: f64) -> Pence {
  (amount as f64 * percent / 100.0).round() as Pence
}

/// Sum of `quantity * unit` over `lines`. Fails with a validation error
/// naming `field` when the figure does not fit in [`Pence`].
pub fn checked_total(
  field: &str,
  lines: impl IntoIterator<Item = (i64, Pence)>,
) -> Result<Pence> {
  lines
    .into_iter()
    .try_fold(0 as Pence, |total, (quantity, unit)| {
      quantity.checked_mul(unit).and_then(|line| total.checked_add(line))
    })
    .ok_or_else(|| too_large(field))
}

pub fn too_large(field: &str) -> Error {
  Error::validation(format!("{field} is too large"))
}

pub fn require_text(field: &str, value: &str) -> Result<()> {
  if value.trim().is_empty() {
    return Err(Error::validation(format!("{field} must not be empty")));
  }
  Ok(())
}

pub fn require_positive(field: &str, value: i64) -> Result<()> {
  if value <= 0 {
    return Err(Error::validation(format!(
      "{field} must be greater than zero"
    )));
  }
  Ok(())
}

pub fn require_non_negative(field: &str, value: i64) -> Result<()> {
  if value < 0 {
    return Err(Error::validation(format!("{field} must not be negative")));
  }
  Ok(())
}

pub fn require_percent(field: &str, value: f64) -> Result<()> {
  if !(0.0..=100.0).contains(&value) {
    return Err(Error::validation(format!(
      "{field} must be between 0 and 100"
    )));
  }
  Ok(())
}

/// Formats a per-tenant document number, e.g. `SO-000042`.
pub fn document_number(prefix: &str, sequence: u64) -> String {
  format!("{prefix}-{sequence:06}")
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn page_size_is_clamped() {
    let q = ListQuery { page_size: Some(1000), ..Default::default() };
    assert_eq!(q.page_size(), ListQuery::MAX_PAGE_SIZE);
    let q = ListQuery { page_size: Some(0), ..Default::default() };
    assert_eq!(q.page_size(), 1);
  }

  #[test]
  fn offset_uses_one_based_pages() {
    let q = ListQuery { page: Some(3), page_size: Some(10), ..Default::default() };
    assert_eq!(q.offset(), 20);
    let q = ListQuery { page: Some(0), ..Default::default() };
    assert_eq!(q.offset(), 0);
  }

  #[test]
  fn blank_search_is_ignored() {
    let q = ListQuery { search: Some("   ".into()), ..Default::default() };
    assert_eq!(q.search_pattern(), None);
    let q = ListQuery { search: Some(" bolt ".into()), ..Default::default() };
    assert_eq!(q.search_pattern().as_deref(), Some("%bolt%"));
  }

  #[test]
  fn search_wildcards_are_escaped() {
    let q = ListQuery { search: Some(r"50%_a\b".into()), ..Default::default() };
    assert_eq!(q.search_pattern().as_deref(), Some(r"%50\%\_a\\b%"));
  }

  #[test]
  fn total_pages_rounds_up() {
    let q = ListQuery { page_size: Some(10), ..Default::default() };
    let page = Page::new(Vec::<u8>::new(), 21, &q);
    assert_eq!(page.total_pages, 3);
  }

  #[test]
  fn percent_rounds_half_up() {
    assert_eq!(percent_of(1_005, 10.0), 101);
    assert_eq!(percent_of(10_000, 20.0), 2_000);
  }

  #[test]
  fn checked_total_rejects_overflow() {
    assert_eq!(checked_total("total", [(2, 250), (3, 100)]).unwrap(), 800);
    let err = checked_total("total", [(1_000_000_000_000, 100_000_000_000)])
      .unwrap_err();
    assert!(matches!(err, Error::Validation(m) if m == "total is too large"));
    assert!(checked_total("total", [(1, i64::MAX), (1, 1)]).is_err());
  }

  #[test]
  fn document_numbers_are_zero_padded() {
    assert_eq!(document_number("SO", 42), "SO-000042");
  }
}
