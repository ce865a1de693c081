//! Repository traits.
//!
//! Backends must be thread-safe (`Send + Sync`); every method takes `&self`
//! and is safe to call concurrently.

use async_trait::async_trait;
use common::{AccountManagerId, CompanyId, OrderId, OrderItemId, ProductId, TransactionId};
use domain::{
    AccountManager, Company, FulfillmentStatus, Inventory, LoyaltyTransaction, OrderItem, Product,
    RedemptionOrder,
};

use crate::Result;

/// Persistence for orders and their line items.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Persists a new order together with its items.
    ///
    /// The write is atomic: either the order and every item land, or none
    /// do. Fails with `DuplicateOrderNumber` on an order-number collision.
    async fn insert_order(&self, order: &RedemptionOrder, items: &[OrderItem]) -> Result<()>;

    /// Loads an order by id.
    async fn get_order(&self, order_id: OrderId) -> Result<Option<RedemptionOrder>>;

    /// Loads an order by its human-facing order number.
    async fn get_order_by_number(&self, order_number: &str) -> Result<Option<RedemptionOrder>>;

    /// Writes back a mutated order. Fails with `OrderNotFound` if it was
    /// never inserted.
    async fn update_order(&self, order: &RedemptionOrder) -> Result<()>;

    /// Returns all orders for a company, newest first.
    async fn orders_for_company(&self, company_id: CompanyId) -> Result<Vec<RedemptionOrder>>;

    /// Returns an order's items in creation order.
    async fn items_for_order(&self, order_id: OrderId) -> Result<Vec<OrderItem>>;

    /// Loads a single line item by id.
    async fn get_item(&self, item_id: OrderItemId) -> Result<Option<OrderItem>>;

    /// Writes back a mutated line item. Fails with `ItemNotFound` if it was
    /// never inserted.
    async fn update_item(&self, item: &OrderItem) -> Result<()>;

    /// Returns every item currently in the given fulfillment status.
    async fn items_with_status(&self, status: FulfillmentStatus) -> Result<Vec<OrderItem>>;
}

/// Stock bookkeeping for physical products.
///
/// Each mutation is linearizable per product: two racing reservations can
/// never both succeed against the same stock.
#[async_trait]
pub trait InventoryLedger: Send + Sync {
    /// Creates the stock record for a product.
    async fn initialize(
        &self,
        product_id: ProductId,
        quantity: u32,
        reorder_point: Option<u32>,
    ) -> Result<()>;

    /// Loads the stock record for a product.
    async fn get_inventory(&self, product_id: ProductId) -> Result<Option<Inventory>>;

    /// Returns true if `quantity` units are free to reserve. A product with
    /// no stock record has nothing available.
    async fn check_availability(&self, product_id: ProductId, quantity: u32) -> Result<bool>;

    /// Moves stock from available to reserved.
    async fn reserve(&self, product_id: ProductId, quantity: u32) -> Result<()>;

    /// Moves stock from reserved back to available.
    async fn release(&self, product_id: ProductId, quantity: u32) -> Result<()>;

    /// Consumes reserved stock permanently.
    async fn confirm(&self, product_id: ProductId, quantity: u32) -> Result<()>;

    /// Adds new stock to the available bucket.
    async fn add_stock(&self, product_id: ProductId, quantity: u32) -> Result<()>;

    /// Sets or clears a product's reorder threshold.
    async fn set_reorder_point(&self, product_id: ProductId, reorder_point: Option<u32>)
    -> Result<()>;

    /// Returns every record at or below its reorder point.
    async fn low_stock(&self) -> Result<Vec<Inventory>>;
}

/// Persistence for loyalty points transactions.
#[async_trait]
pub trait TransactionStore: Send + Sync {
    /// Persists a new transaction.
    async fn insert(&self, transaction: &LoyaltyTransaction) -> Result<()>;

    /// Writes back a mutated transaction. Fails with `TransactionNotFound`
    /// if it was never inserted.
    async fn update(&self, transaction: &LoyaltyTransaction) -> Result<()>;

    /// Loads a transaction by id.
    async fn get_transaction(
        &self,
        transaction_id: TransactionId,
    ) -> Result<Option<LoyaltyTransaction>>;

    /// Returns all transactions for an order, oldest first.
    async fn for_order(&self, order_id: OrderId) -> Result<Vec<LoyaltyTransaction>>;

    /// Returns failed transactions with retry budget remaining.
    async fn retryable(&self) -> Result<Vec<LoyaltyTransaction>>;
}

/// Read/write access to catalog reference data.
#[async_trait]
pub trait Catalog: Send + Sync {
    /// Inserts or replaces a product.
    async fn upsert_product(&self, product: &Product) -> Result<()>;

    /// Loads a product by id.
    async fn get_product(&self, product_id: ProductId) -> Result<Option<Product>>;

    /// Returns all products.
    async fn list_products(&self) -> Result<Vec<Product>>;

    /// Inserts or replaces a company.
    async fn upsert_company(&self, company: &Company) -> Result<()>;

    /// Loads a company by id.
    async fn get_company(&self, company_id: CompanyId) -> Result<Option<Company>>;

    /// Inserts or replaces an account manager.
    async fn upsert_account_manager(&self, manager: &AccountManager) -> Result<()>;

    /// Loads an account manager by id.
    async fn get_account_manager(
        &self,
        manager_id: AccountManagerId,
    ) -> Result<Option<AccountManager>>;
}
