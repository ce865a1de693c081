//! In-memory storage backend.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use common::{AccountManagerId, CompanyId, OrderId, OrderItemId, ProductId, TransactionId};
use domain::{
    AccountManager, Company, FulfillmentStatus, Inventory, LoyaltyTransaction, OrderItem, Product,
    RedemptionOrder,
};
use tokio::sync::RwLock;

use crate::error::StoreError;
use crate::traits::{Catalog, InventoryLedger, OrderStore, TransactionStore};
use crate::Result;

#[derive(Debug, Default)]
struct State {
    orders: HashMap<OrderId, RedemptionOrder>,
    items: HashMap<OrderItemId, OrderItem>,
    inventory: HashMap<ProductId, Inventory>,
    transactions: HashMap<TransactionId, LoyaltyTransaction>,
    products: HashMap<ProductId, Product>,
    companies: HashMap<CompanyId, Company>,
    account_managers: HashMap<AccountManagerId, AccountManager>,
}

/// In-memory store for tests and local runs.
///
/// All state lives behind one `RwLock`, so every mutation is linearizable,
/// matching the per-product atomicity the PostgreSQL backend gets from
/// conditional updates.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    state: Arc<RwLock<State>>,
}

impl InMemoryStore {
    /// Creates a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Removes all stored data.
    pub async fn clear(&self) {
        let mut state = self.state.write().await;
        *state = State::default();
    }

    /// Returns the number of stored orders.
    pub async fn order_count(&self) -> usize {
        self.state.read().await.orders.len()
    }

    /// Returns the number of stored transactions.
    pub async fn transaction_count(&self) -> usize {
        self.state.read().await.transactions.len()
    }
}

#[async_trait]
impl OrderStore for InMemoryStore {
    async fn insert_order(&self, order: &RedemptionOrder, items: &[OrderItem]) -> Result<()> {
        let mut state = self.state.write().await;

        if state
            .orders
            .values()
            .any(|o| o.order_number == order.order_number)
        {
            return Err(StoreError::DuplicateOrderNumber {
                order_number: order.order_number.clone(),
            });
        }

        state.orders.insert(order.id, order.clone());
        for item in items {
            state.items.insert(item.id, item.clone());
        }
        Ok(())
    }

    async fn get_order(&self, order_id: OrderId) -> Result<Option<RedemptionOrder>> {
        Ok(self.state.read().await.orders.get(&order_id).cloned())
    }

    async fn get_order_by_number(&self, order_number: &str) -> Result<Option<RedemptionOrder>> {
        Ok(self
            .state
            .read()
            .await
            .orders
            .values()
            .find(|o| o.order_number == order_number)
            .cloned())
    }

    async fn update_order(&self, order: &RedemptionOrder) -> Result<()> {
        let mut state = self.state.write().await;
        match state.orders.get_mut(&order.id) {
            Some(existing) => {
                *existing = order.clone();
                Ok(())
            }
            None => Err(StoreError::OrderNotFound { order_id: order.id }),
        }
    }

    async fn orders_for_company(&self, company_id: CompanyId) -> Result<Vec<RedemptionOrder>> {
        let state = self.state.read().await;
        let mut orders: Vec<_> = state
            .orders
            .values()
            .filter(|o| o.company_id == company_id)
            .cloned()
            .collect();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(orders)
    }

    async fn items_for_order(&self, order_id: OrderId) -> Result<Vec<OrderItem>> {
        let state = self.state.read().await;
        let mut items: Vec<_> = state
            .items
            .values()
            .filter(|i| i.order_id == order_id)
            .cloned()
            .collect();
        items.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(items)
    }

    async fn get_item(&self, item_id: OrderItemId) -> Result<Option<OrderItem>> {
        Ok(self.state.read().await.items.get(&item_id).cloned())
    }

    async fn update_item(&self, item: &OrderItem) -> Result<()> {
        let mut state = self.state.write().await;
        match state.items.get_mut(&item.id) {
            Some(existing) => {
                *existing = item.clone();
                Ok(())
            }
            None => Err(StoreError::ItemNotFound { item_id: item.id }),
        }
    }

    async fn items_with_status(&self, status: FulfillmentStatus) -> Result<Vec<OrderItem>> {
        let state = self.state.read().await;
        let mut items: Vec<_> = state
            .items
            .values()
            .filter(|i| i.fulfillment_status == status)
            .cloned()
            .collect();
        items.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(items)
    }
}

#[async_trait]
impl InventoryLedger for InMemoryStore {
    async fn initialize(
        &self,
        product_id: ProductId,
        quantity: u32,
        reorder_point: Option<u32>,
    ) -> Result<()> {
        let mut state = self.state.write().await;
        if state.inventory.contains_key(&product_id) {
            return Err(StoreError::InventoryAlreadyExists { product_id });
        }
        state
            .inventory
            .insert(product_id, Inventory::new(product_id, quantity, reorder_point));
        Ok(())
    }

    async fn get_inventory(&self, product_id: ProductId) -> Result<Option<Inventory>> {
        Ok(self.state.read().await.inventory.get(&product_id).cloned())
    }

    async fn check_availability(&self, product_id: ProductId, quantity: u32) -> Result<bool> {
        let state = self.state.read().await;
        Ok(state
            .inventory
            .get(&product_id)
            .is_some_and(|inv| inv.check_availability(quantity)))
    }

    async fn reserve(&self, product_id: ProductId, quantity: u32) -> Result<()> {
        let mut state = self.state.write().await;
        let inventory = state
            .inventory
            .get_mut(&product_id)
            .ok_or(StoreError::InventoryNotFound { product_id })?;
        inventory.reserve(quantity)?;
        Ok(())
    }

    async fn release(&self, product_id: ProductId, quantity: u32) -> Result<()> {
        let mut state = self.state.write().await;
        let inventory = state
            .inventory
            .get_mut(&product_id)
            .ok_or(StoreError::InventoryNotFound { product_id })?;
        inventory.release(quantity)?;
        Ok(())
    }

    async fn confirm(&self, product_id: ProductId, quantity: u32) -> Result<()> {
        let mut state = self.state.write().await;
        let inventory = state
            .inventory
            .get_mut(&product_id)
            .ok_or(StoreError::InventoryNotFound { product_id })?;
        inventory.confirm(quantity)?;
        Ok(())
    }

    async fn add_stock(&self, product_id: ProductId, quantity: u32) -> Result<()> {
        let mut state = self.state.write().await;
        let inventory = state
            .inventory
            .get_mut(&product_id)
            .ok_or(StoreError::InventoryNotFound { product_id })?;
        inventory.add_stock(quantity)?;
        Ok(())
    }

    async fn set_reorder_point(
        &self,
        product_id: ProductId,
        reorder_point: Option<u32>,
    ) -> Result<()> {
        let mut state = self.state.write().await;
        let inventory = state
            .inventory
            .get_mut(&product_id)
            .ok_or(StoreError::InventoryNotFound { product_id })?;
        inventory.set_reorder_point(reorder_point);
        Ok(())
    }

    async fn low_stock(&self) -> Result<Vec<Inventory>> {
        let state = self.state.read().await;
        let mut records: Vec<_> = state
            .inventory
            .values()
            .filter(|inv| inv.is_below_reorder_point())
            .cloned()
            .collect();
        records.sort_by_key(|inv| inv.quantity_available);
        Ok(records)
    }
}

#[async_trait]
impl TransactionStore for InMemoryStore {
    async fn insert(&self, transaction: &LoyaltyTransaction) -> Result<()> {
        let mut state = self.state.write().await;
        state.transactions.insert(transaction.id, transaction.clone());
        Ok(())
    }

    async fn update(&self, transaction: &LoyaltyTransaction) -> Result<()> {
        let mut state = self.state.write().await;
        match state.transactions.get_mut(&transaction.id) {
            Some(existing) => {
                *existing = transaction.clone();
                Ok(())
            }
            None => Err(StoreError::TransactionNotFound {
                transaction_id: transaction.id,
            }),
        }
    }

    async fn get_transaction(
        &self,
        transaction_id: TransactionId,
    ) -> Result<Option<LoyaltyTransaction>> {
        Ok(self
            .state
            .read()
            .await
            .transactions
            .get(&transaction_id)
            .cloned())
    }

    async fn for_order(&self, order_id: OrderId) -> Result<Vec<LoyaltyTransaction>> {
        let state = self.state.read().await;
        let mut transactions: Vec<_> = state
            .transactions
            .values()
            .filter(|t| t.order_id == order_id)
            .cloned()
            .collect();
        transactions.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(transactions)
    }

    async fn retryable(&self) -> Result<Vec<LoyaltyTransaction>> {
        let state = self.state.read().await;
        let mut transactions: Vec<_> = state
            .transactions
            .values()
            .filter(|t| t.is_retryable())
            .cloned()
            .collect();
        transactions.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(transactions)
    }
}

#[async_trait]
impl Catalog for InMemoryStore {
    async fn upsert_product(&self, product: &Product) -> Result<()> {
        let mut state = self.state.write().await;
        state.products.insert(product.id, product.clone());
        Ok(())
    }

    async fn get_product(&self, product_id: ProductId) -> Result<Option<Product>> {
        Ok(self.state.read().await.products.get(&product_id).cloned())
    }

    async fn list_products(&self) -> Result<Vec<Product>> {
        let state = self.state.read().await;
        let mut products: Vec<_> = state.products.values().cloned().collect();
        products.sort_by(|a, b| a.sku.cmp(&b.sku));
        Ok(products)
    }

    async fn upsert_company(&self, company: &Company) -> Result<()> {
        let mut state = self.state.write().await;
        state.companies.insert(company.id, company.clone());
        Ok(())
    }

    async fn get_company(&self, company_id: CompanyId) -> Result<Option<Company>> {
        Ok(self.state.read().await.companies.get(&company_id).cloned())
    }

    async fn upsert_account_manager(&self, manager: &AccountManager) -> Result<()> {
        let mut state = self.state.write().await;
        state.account_managers.insert(manager.id, manager.clone());
        Ok(())
    }

    async fn get_account_manager(
        &self,
        manager_id: AccountManagerId,
    ) -> Result<Option<AccountManager>> {
        Ok(self
            .state
            .read()
            .await
            .account_managers
            .get(&manager_id)
            .cloned())
    }
}
