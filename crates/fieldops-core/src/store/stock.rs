use std::future::Future;

use uuid::Uuid;

use super::StoreBase;
use crate::{
  common::{ListQuery, Page},
  stock::{
    Category, CategoryInput, Product, ProductInput, StockAdjustment, StockLevel,
    StockLevelFilter, StockLevelView, StockLocation, StockLocationInput,
    StockOrder, StockOrderAction, StockOrderFilter, StockOrderInput,
    StockTransaction, Supplier, SupplierInput, TransactionFilter,
  },
};

/// Catalogue, stock levels, and stock orders.
pub trait StockStore: StoreBase {
  // ── Categories ────────────────────────────────────────────────────────
  fn list_categories(
    &self,
    tenant_id: Uuid,
    query: ListQuery,
  ) -> impl Future<Output = Result<Page<Category>, Self::Error>> + Send + '_;

  fn get_category(
    &self,
    tenant_id: Uuid,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Category>, Self::Error>> + Send + '_;

  fn create_category(
    &self,
    tenant_id: Uuid,
    input: CategoryInput,
  ) -> impl Future<Output = Result<Category, Self::Error>> + Send + '_;

  fn update_category(
    &self,
    tenant_id: Uuid,
    id: Uuid,
    input: CategoryInput,
  ) -> impl Future<Output = Result<Category, Self::Error>> + Send + '_;

  fn delete_category(
    &self,
    tenant_id: Uuid,
    id: Uuid,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  // ── Suppliers ─────────────────────────────────────────────────────────
  fn list_suppliers(
    &self,
    tenant_id: Uuid,
    query: ListQuery,
  ) -> impl Future<Output = Result<Page<Supplier>, Self::Error>> + Send + '_;

  fn get_supplier(
    &self,
    tenant_id: Uuid,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Supplier>, Self::Error>> + Send + '_;

  fn create_supplier(
    &self,
    tenant_id: Uuid,
    input: SupplierInput,
  ) -> impl Future<Output = Result<Supplier, Self::Error>> + Send + '_;

  fn update_supplier(
    &self,
    tenant_id: Uuid,
    id: Uuid,
    input: SupplierInput,
  ) -> impl Future<Output = Result<Supplier, Self::Error>> + Send + '_;

  fn delete_supplier(
    &self,
    tenant_id: Uuid,
    id: Uuid,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  // ── Products ──────────────────────────────────────────────────────────
  fn list_products(
    &self,
    tenant_id: Uuid,
    category_id: Option<Uuid>,
    query: ListQuery,
  ) -> impl Future<Output = Result<Page<Product>, Self::Error>> + Send + '_;

  fn get_product(
    &self,
    tenant_id: Uuid,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Product>, Self::Error>> + Send + '_;

  fn create_product(
    &self,
    tenant_id: Uuid,
    input: ProductInput,
  ) -> impl Future<Output = Result<Product, Self::Error>> + Send + '_;

  fn update_product(
    &self,
    tenant_id: Uuid,
    id: Uuid,
    input: ProductInput,
  ) -> impl Future<Output = Result<Product, Self::Error>> + Send + '_;

  fn delete_product(
    &self,
    tenant_id: Uuid,
    id: Uuid,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  // ── Stock locations ───────────────────────────────────────────────────
  fn list_stock_locations(
    &self,
    tenant_id: Uuid,
    query: ListQuery,
  ) -> impl Future<Output = Result<Page<StockLocation>, Self::Error>> + Send + '_;

  fn get_stock_location(
    &self,
    tenant_id: Uuid,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<StockLocation>, Self::Error>> + Send + '_;

  fn create_stock_location(
    &self,
    tenant_id: Uuid,
    input: StockLocationInput,
  ) -> impl Future<Output = Result<StockLocation, Self::Error>> + Send + '_;

  fn update_stock_location(
    &self,
    tenant_id: Uuid,
    id: Uuid,
    input: StockLocationInput,
  ) -> impl Future<Output = Result<StockLocation, Self::Error>> + Send + '_;

  fn delete_stock_location(
    &self,
    tenant_id: Uuid,
    id: Uuid,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  // ── Levels & transactions ─────────────────────────────────────────────

  fn list_stock_levels(
    &self,
    tenant_id: Uuid,
    filter: StockLevelFilter,
    query: ListQuery,
  ) -> impl Future<Output = Result<Page<StockLevelView>, Self::Error>> + Send + '_;

  /// Apply a manual correction to on-hand stock and record an adjustment
  /// transaction. The level row is created on first use.
  fn adjust_stock(
    &self,
    tenant_id: Uuid,
    adjustment: StockAdjustment,
    actor: Uuid,
  ) -> impl Future<Output = Result<StockLevel, Self::Error>> + Send + '_;

  /// Newest first.
  fn list_stock_transactions(
    &self,
    tenant_id: Uuid,
    filter: TransactionFilter,
    query: ListQuery,
  ) -> impl Future<Output = Result<Page<StockTransaction>, Self::Error>> + Send + '_;

  // ── Stock orders ──────────────────────────────────────────────────────

  fn list_stock_orders(
    &self,
    tenant_id: Uuid,
    filter: StockOrderFilter,
    query: ListQuery,
  ) -> impl Future<Output = Result<Page<StockOrder>, Self::Error>> + Send + '_;

  fn get_stock_order(
    &self,
    tenant_id: Uuid,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<StockOrder>, Self::Error>> + Send + '_;

  /// Create a Draft order with the next `SO-` number for the tenant.
  fn create_stock_order(
    &self,
    tenant_id: Uuid,
    input: StockOrderInput,
    requested_by: Uuid,
  ) -> impl Future<Output = Result<StockOrder, Self::Error>> + Send + '_;

  /// Replace the header fields and lines of a Draft order.
  fn update_stock_order(
    &self,
    tenant_id: Uuid,
    id: Uuid,
    input: StockOrderInput,
  ) -> impl Future<Output = Result<StockOrder, Self::Error>> + Send + '_;

  /// Soft-delete a Draft or Cancelled order.
  fn delete_stock_order(
    &self,
    tenant_id: Uuid,
    id: Uuid,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Move an order through its workflow, applying the stock side effect of
  /// the transition (reserve, release, consume) in the same transaction.
  fn transition_stock_order(
    &self,
    tenant_id: Uuid,
    id: Uuid,
    action: StockOrderAction,
    actor: Uuid,
  ) -> impl Future<Output = Result<StockOrder, Self::Error>> + Send + '_;
}
