//! PostgreSQL storage backend.
//!
//! All queries are runtime-checked `sqlx::query` calls; enum columns are
//! stored as their `as_str` text form. Inventory mutations use conditional
//! updates so two racing reservations can never both succeed.

use async_trait::async_trait;
use common::{
    AccountManagerId, CompanyId, OrderId, OrderItemId, Points, ProductId, TransactionId,
};
use domain::{
    AccountManager, Company, FulfillmentStatus, Inventory, LoyaltyTransaction, OrderItem, Product,
    ProductType, OrderStatus, RedemptionOrder, TransactionStatus, TransactionType, MAX_RETRIES,
};
use sqlx::{PgPool, Row, postgres::PgRow};
use uuid::Uuid;

use crate::error::StoreError;
use crate::traits::{Catalog, InventoryLedger, OrderStore, TransactionStore};
use crate::Result;

/// PostgreSQL-backed store.
#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Creates a new PostgreSQL store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> std::result::Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("../../migrations").run(&self.pool).await
    }
}

fn to_u32(value: i64, column: &'static str) -> Result<u32> {
    u32::try_from(value).map_err(|_| StoreError::InvalidValue {
        column,
        value: value.to_string(),
    })
}

fn opt_to_u32(value: Option<i64>, column: &'static str) -> Result<Option<u32>> {
    value.map(|v| to_u32(v, column)).transpose()
}

fn parse_order_status(value: &str) -> Result<OrderStatus> {
    match value {
        "Pending" => Ok(OrderStatus::Pending),
        "Processing" => Ok(OrderStatus::Processing),
        "Completed" => Ok(OrderStatus::Completed),
        "Cancelled" => Ok(OrderStatus::Cancelled),
        "Failed" => Ok(OrderStatus::Failed),
        other => Err(StoreError::InvalidValue {
            column: "status",
            value: other.to_string(),
        }),
    }
}

fn parse_fulfillment_status(value: &str) -> Result<FulfillmentStatus> {
    match value {
        "Pending" => Ok(FulfillmentStatus::Pending),
        "Processing" => Ok(FulfillmentStatus::Processing),
        "Fulfilled" => Ok(FulfillmentStatus::Fulfilled),
        "Shipped" => Ok(FulfillmentStatus::Shipped),
        "Delivered" => Ok(FulfillmentStatus::Delivered),
        "Failed" => Ok(FulfillmentStatus::Failed),
        other => Err(StoreError::InvalidValue {
            column: "fulfillment_status",
            value: other.to_string(),
        }),
    }
}

fn parse_product_type(value: &str) -> Result<ProductType> {
    match value {
        "Physical" => Ok(ProductType::Physical),
        "Virtual" => Ok(ProductType::Virtual),
        other => Err(StoreError::InvalidValue {
            column: "product_type",
            value: other.to_string(),
        }),
    }
}

fn parse_transaction_status(value: &str) -> Result<TransactionStatus> {
    match value {
        "Pending" => Ok(TransactionStatus::Pending),
        "Processing" => Ok(TransactionStatus::Processing),
        "Completed" => Ok(TransactionStatus::Completed),
        "Failed" => Ok(TransactionStatus::Failed),
        "Refunded" => Ok(TransactionStatus::Refunded),
        other => Err(StoreError::InvalidValue {
            column: "status",
            value: other.to_string(),
        }),
    }
}

fn parse_transaction_type(value: &str) -> Result<TransactionType> {
    match value {
        "Debit" => Ok(TransactionType::Debit),
        "Credit" => Ok(TransactionType::Credit),
        "Refund" => Ok(TransactionType::Refund),
        other => Err(StoreError::InvalidValue {
            column: "transaction_type",
            value: other.to_string(),
        }),
    }
}

fn row_to_order(row: PgRow) -> Result<RedemptionOrder> {
    let status: String = row.try_get("status")?;
    Ok(RedemptionOrder {
        id: OrderId::from_uuid(row.try_get::<Uuid, _>("id")?),
        order_number: row.try_get("order_number")?,
        company_id: CompanyId::from_uuid(row.try_get::<Uuid, _>("company_id")?),
        account_manager_id: AccountManagerId::from_uuid(
            row.try_get::<Uuid, _>("account_manager_id")?,
        ),
        total_points: Points::new(row.try_get("total_points")?),
        status: parse_order_status(&status)?,
        shipping_address: row.try_get("shipping_address")?,
        special_instructions: row.try_get("special_instructions")?,
        created_at: row.try_get("created_at")?,
        completed_at: row.try_get("completed_at")?,
        cancelled_at: row.try_get("cancelled_at")?,
        cancellation_reason: row.try_get("cancellation_reason")?,
    })
}

fn row_to_item(row: PgRow) -> Result<OrderItem> {
    let product_type: String = row.try_get("product_type")?;
    let status: String = row.try_get("fulfillment_status")?;
    Ok(OrderItem {
        id: OrderItemId::from_uuid(row.try_get::<Uuid, _>("id")?),
        order_id: OrderId::from_uuid(row.try_get::<Uuid, _>("order_id")?),
        product_id: ProductId::from_uuid(row.try_get::<Uuid, _>("product_id")?),
        sku: row.try_get("sku")?,
        product_type: parse_product_type(&product_type)?,
        quantity: to_u32(row.try_get("quantity")?, "quantity")?,
        points_per_item: Points::new(row.try_get("points_per_item")?),
        fulfillment_status: parse_fulfillment_status(&status)?,
        fulfillment_reference: row.try_get("fulfillment_reference")?,
        tracking_number: row.try_get("tracking_number")?,
        delivered_at: row.try_get("delivered_at")?,
        created_at: row.try_get("created_at")?,
    })
}

fn row_to_inventory(row: PgRow) -> Result<Inventory> {
    Ok(Inventory {
        product_id: ProductId::from_uuid(row.try_get::<Uuid, _>("product_id")?),
        quantity_available: to_u32(row.try_get("quantity_available")?, "quantity_available")?,
        quantity_reserved: to_u32(row.try_get("quantity_reserved")?, "quantity_reserved")?,
        reorder_point: opt_to_u32(row.try_get("reorder_point")?, "reorder_point")?,
        max_quantity: opt_to_u32(row.try_get("max_quantity")?, "max_quantity")?,
        last_updated: row.try_get("last_updated")?,
    })
}

fn row_to_transaction(row: PgRow) -> Result<LoyaltyTransaction> {
    let transaction_type: String = row.try_get("transaction_type")?;
    let status: String = row.try_get("status")?;
    Ok(LoyaltyTransaction {
        id: TransactionId::from_uuid(row.try_get::<Uuid, _>("id")?),
        order_id: OrderId::from_uuid(row.try_get::<Uuid, _>("order_id")?),
        company_id: CompanyId::from_uuid(row.try_get::<Uuid, _>("company_id")?),
        transaction_type: parse_transaction_type(&transaction_type)?,
        points_amount: Points::new(row.try_get("points_amount")?),
        reference: row.try_get("reference")?,
        external_transaction_id: row.try_get("external_transaction_id")?,
        status: parse_transaction_status(&status)?,
        error_message: row.try_get("error_message")?,
        retry_count: to_u32(row.try_get("retry_count")?, "retry_count")?,
        processed_at: row.try_get("processed_at")?,
        created_at: row.try_get("created_at")?,
    })
}

fn row_to_product(row: PgRow) -> Result<Product> {
    let product_type: String = row.try_get("product_type")?;
    Ok(Product {
        id: ProductId::from_uuid(row.try_get::<Uuid, _>("id")?),
        sku: row.try_get("sku")?,
        name: row.try_get("name")?,
        description: row.try_get("description")?,
        points_cost: Points::new(row.try_get("points_cost")?),
        product_type: parse_product_type(&product_type)?,
        is_active: row.try_get("is_active")?,
        created_at: row.try_get("created_at")?,
    })
}

fn row_to_company(row: PgRow) -> Result<Company> {
    Ok(Company {
        id: CompanyId::from_uuid(row.try_get::<Uuid, _>("id")?),
        name: row.try_get("name")?,
        loyalty_account_id: row.try_get("loyalty_account_id")?,
        is_active: row.try_get("is_active")?,
        created_at: row.try_get("created_at")?,
    })
}

fn row_to_manager(row: PgRow) -> Result<AccountManager> {
    Ok(AccountManager {
        id: AccountManagerId::from_uuid(row.try_get::<Uuid, _>("id")?),
        company_id: CompanyId::from_uuid(row.try_get::<Uuid, _>("company_id")?),
        name: row.try_get("name")?,
        email: row.try_get("email")?,
        is_active: row.try_get("is_active")?,
        created_at: row.try_get("created_at")?,
    })
}

const SELECT_ORDER: &str = r#"
    SELECT id, order_number, company_id, account_manager_id, total_points, status,
           shipping_address, special_instructions, created_at, completed_at,
           cancelled_at, cancellation_reason
    FROM orders
"#;

const SELECT_ITEM: &str = r#"
    SELECT id, order_id, product_id, sku, product_type, quantity, points_per_item,
           fulfillment_status, fulfillment_reference, tracking_number, delivered_at,
           created_at
    FROM order_items
"#;

const SELECT_TRANSACTION: &str = r#"
    SELECT id, order_id, company_id, transaction_type, points_amount, reference,
           external_transaction_id, status, error_message, retry_count, processed_at,
           created_at
    FROM loyalty_transactions
"#;

const SELECT_INVENTORY: &str = r#"
    SELECT product_id, quantity_available, quantity_reserved, reorder_point,
           max_quantity, last_updated
    FROM inventory
"#;

#[async_trait]
impl OrderStore for PostgresStore {
    async fn insert_order(&self, order: &RedemptionOrder, items: &[OrderItem]) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO orders (id, order_number, company_id, account_manager_id, total_points,
                                status, shipping_address, special_instructions, created_at,
                                completed_at, cancelled_at, cancellation_reason)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            "#,
        )
        .bind(order.id.as_uuid())
        .bind(&order.order_number)
        .bind(order.company_id.as_uuid())
        .bind(order.account_manager_id.as_uuid())
        .bind(order.total_points.value())
        .bind(order.status.as_str())
        .bind(&order.shipping_address)
        .bind(&order.special_instructions)
        .bind(order.created_at)
        .bind(order.completed_at)
        .bind(order.cancelled_at)
        .bind(&order.cancellation_reason)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.constraint() == Some("unique_order_number")
            {
                return StoreError::DuplicateOrderNumber {
                    order_number: order.order_number.clone(),
                };
            }
            StoreError::Database(e)
        })?;

        for item in items {
            sqlx::query(
                r#"
                INSERT INTO order_items (id, order_id, product_id, sku, product_type, quantity,
                                         points_per_item, fulfillment_status, fulfillment_reference,
                                         tracking_number, delivered_at, created_at)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
                "#,
            )
            .bind(item.id.as_uuid())
            .bind(item.order_id.as_uuid())
            .bind(item.product_id.as_uuid())
            .bind(&item.sku)
            .bind(item.product_type.as_str())
            .bind(i64::from(item.quantity))
            .bind(item.points_per_item.value())
            .bind(item.fulfillment_status.as_str())
            .bind(&item.fulfillment_reference)
            .bind(&item.tracking_number)
            .bind(item.delivered_at)
            .bind(item.created_at)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn get_order(&self, order_id: OrderId) -> Result<Option<RedemptionOrder>> {
        let row = sqlx::query(&format!("{SELECT_ORDER} WHERE id = $1"))
            .bind(order_id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;
        row.map(row_to_order).transpose()
    }

    async fn get_order_by_number(&self, order_number: &str) -> Result<Option<RedemptionOrder>> {
        let row = sqlx::query(&format!("{SELECT_ORDER} WHERE order_number = $1"))
            .bind(order_number)
            .fetch_optional(&self.pool)
            .await?;
        row.map(row_to_order).transpose()
    }

    async fn update_order(&self, order: &RedemptionOrder) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE orders
            SET status = $2, completed_at = $3, cancelled_at = $4, cancellation_reason = $5
            WHERE id = $1
            "#,
        )
        .bind(order.id.as_uuid())
        .bind(order.status.as_str())
        .bind(order.completed_at)
        .bind(order.cancelled_at)
        .bind(&order.cancellation_reason)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::OrderNotFound { order_id: order.id });
        }
        Ok(())
    }

    async fn orders_for_company(&self, company_id: CompanyId) -> Result<Vec<RedemptionOrder>> {
        let rows = sqlx::query(&format!(
            "{SELECT_ORDER} WHERE company_id = $1 ORDER BY created_at DESC"
        ))
        .bind(company_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(row_to_order).collect()
    }

    async fn items_for_order(&self, order_id: OrderId) -> Result<Vec<OrderItem>> {
        let rows = sqlx::query(&format!(
            "{SELECT_ITEM} WHERE order_id = $1 ORDER BY created_at ASC"
        ))
        .bind(order_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(row_to_item).collect()
    }

    async fn get_item(&self, item_id: OrderItemId) -> Result<Option<OrderItem>> {
        let row = sqlx::query(&format!("{SELECT_ITEM} WHERE id = $1"))
            .bind(item_id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;
        row.map(row_to_item).transpose()
    }

    async fn update_item(&self, item: &OrderItem) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE order_items
            SET fulfillment_status = $2, fulfillment_reference = $3, tracking_number = $4,
                delivered_at = $5
            WHERE id = $1
            "#,
        )
        .bind(item.id.as_uuid())
        .bind(item.fulfillment_status.as_str())
        .bind(&item.fulfillment_reference)
        .bind(&item.tracking_number)
        .bind(item.delivered_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::ItemNotFound { item_id: item.id });
        }
        Ok(())
    }

    async fn items_with_status(&self, status: FulfillmentStatus) -> Result<Vec<OrderItem>> {
        let rows = sqlx::query(&format!(
            "{SELECT_ITEM} WHERE fulfillment_status = $1 ORDER BY created_at ASC"
        ))
        .bind(status.as_str())
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(row_to_item).collect()
    }
}

#[async_trait]
impl InventoryLedger for PostgresStore {
    async fn initialize(
        &self,
        product_id: ProductId,
        quantity: u32,
        reorder_point: Option<u32>,
    ) -> Result<()> {
        let result = sqlx::query(
            r#"
            INSERT INTO inventory (product_id, quantity_available, quantity_reserved,
                                   reorder_point, max_quantity, last_updated)
            VALUES ($1, $2, 0, $3, NULL, NOW())
            ON CONFLICT (product_id) DO NOTHING
            "#,
        )
        .bind(product_id.as_uuid())
        .bind(i64::from(quantity))
        .bind(reorder_point.map(i64::from))
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::InventoryAlreadyExists { product_id });
        }
        Ok(())
    }

    async fn get_inventory(&self, product_id: ProductId) -> Result<Option<Inventory>> {
        let row = sqlx::query(&format!("{SELECT_INVENTORY} WHERE product_id = $1"))
            .bind(product_id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;
        row.map(row_to_inventory).transpose()
    }

    async fn check_availability(&self, product_id: ProductId, quantity: u32) -> Result<bool> {
        Ok(self
            .get_inventory(product_id)
            .await?
            .is_some_and(|inv| inv.check_availability(quantity)))
    }

    async fn reserve(&self, product_id: ProductId, quantity: u32) -> Result<()> {
        if quantity == 0 {
            return Err(domain::InventoryError::InvalidQuantity { quantity }.into());
        }

        // The availability guard in the WHERE clause makes the reservation
        // atomic: of two racing calls, at most one can match.
        let result = sqlx::query(
            r#"
            UPDATE inventory
            SET quantity_available = quantity_available - $2,
                quantity_reserved = quantity_reserved + $2,
                last_updated = NOW()
            WHERE product_id = $1 AND quantity_available >= $2
            "#,
        )
        .bind(product_id.as_uuid())
        .bind(i64::from(quantity))
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            let inventory = self
                .get_inventory(product_id)
                .await?
                .ok_or(StoreError::InventoryNotFound { product_id })?;
            return Err(domain::InventoryError::InsufficientStock {
                requested: quantity,
                available: inventory.quantity_available,
            }
            .into());
        }
        Ok(())
    }

    async fn release(&self, product_id: ProductId, quantity: u32) -> Result<()> {
        if quantity == 0 {
            return Err(domain::InventoryError::InvalidQuantity { quantity }.into());
        }

        let result = sqlx::query(
            r#"
            UPDATE inventory
            SET quantity_available = quantity_available + $2,
                quantity_reserved = quantity_reserved - $2,
                last_updated = NOW()
            WHERE product_id = $1 AND quantity_reserved >= $2
            "#,
        )
        .bind(product_id.as_uuid())
        .bind(i64::from(quantity))
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            let inventory = self
                .get_inventory(product_id)
                .await?
                .ok_or(StoreError::InventoryNotFound { product_id })?;
            return Err(domain::InventoryError::OverRelease {
                requested: quantity,
                reserved: inventory.quantity_reserved,
            }
            .into());
        }
        Ok(())
    }

    async fn confirm(&self, product_id: ProductId, quantity: u32) -> Result<()> {
        if quantity == 0 {
            return Err(domain::InventoryError::InvalidQuantity { quantity }.into());
        }

        let result = sqlx::query(
            r#"
            UPDATE inventory
            SET quantity_reserved = quantity_reserved - $2,
                last_updated = NOW()
            WHERE product_id = $1 AND quantity_reserved >= $2
            "#,
        )
        .bind(product_id.as_uuid())
        .bind(i64::from(quantity))
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            let inventory = self
                .get_inventory(product_id)
                .await?
                .ok_or(StoreError::InventoryNotFound { product_id })?;
            return Err(domain::InventoryError::OverConfirm {
                requested: quantity,
                reserved: inventory.quantity_reserved,
            }
            .into());
        }
        Ok(())
    }

    async fn add_stock(&self, product_id: ProductId, quantity: u32) -> Result<()> {
        if quantity == 0 {
            return Err(domain::InventoryError::InvalidQuantity { quantity }.into());
        }

        let result = sqlx::query(
            r#"
            UPDATE inventory
            SET quantity_available = quantity_available + $2,
                last_updated = NOW()
            WHERE product_id = $1
              AND (max_quantity IS NULL
                   OR quantity_available + quantity_reserved + $2 <= max_quantity)
            "#,
        )
        .bind(product_id.as_uuid())
        .bind(i64::from(quantity))
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            let inventory = self
                .get_inventory(product_id)
                .await?
                .ok_or(StoreError::InventoryNotFound { product_id })?;
            return Err(domain::InventoryError::ExceedsCapacity {
                requested: quantity,
                capacity: inventory.max_quantity.unwrap_or_default(),
            }
            .into());
        }
        Ok(())
    }

    async fn set_reorder_point(
        &self,
        product_id: ProductId,
        reorder_point: Option<u32>,
    ) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE inventory
            SET reorder_point = $2, last_updated = NOW()
            WHERE product_id = $1
            "#,
        )
        .bind(product_id.as_uuid())
        .bind(reorder_point.map(i64::from))
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::InventoryNotFound { product_id });
        }
        Ok(())
    }

    async fn low_stock(&self) -> Result<Vec<Inventory>> {
        let rows = sqlx::query(&format!(
            "{SELECT_INVENTORY} WHERE reorder_point IS NOT NULL \
             AND quantity_available <= reorder_point ORDER BY quantity_available ASC"
        ))
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(row_to_inventory).collect()
    }
}

#[async_trait]
impl TransactionStore for PostgresStore {
    async fn insert(&self, transaction: &LoyaltyTransaction) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO loyalty_transactions (id, order_id, company_id, transaction_type,
                                              points_amount, reference, external_transaction_id,
                                              status, error_message, retry_count, processed_at,
                                              created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            "#,
        )
        .bind(transaction.id.as_uuid())
        .bind(transaction.order_id.as_uuid())
        .bind(transaction.company_id.as_uuid())
        .bind(transaction.transaction_type.as_str())
        .bind(transaction.points_amount.value())
        .bind(&transaction.reference)
        .bind(&transaction.external_transaction_id)
        .bind(transaction.status.as_str())
        .bind(&transaction.error_message)
        .bind(i64::from(transaction.retry_count))
        .bind(transaction.processed_at)
        .bind(transaction.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn update(&self, transaction: &LoyaltyTransaction) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE loyalty_transactions
            SET status = $2, external_transaction_id = $3, error_message = $4,
                retry_count = $5, processed_at = $6
            WHERE id = $1
            "#,
        )
        .bind(transaction.id.as_uuid())
        .bind(transaction.status.as_str())
        .bind(&transaction.external_transaction_id)
        .bind(&transaction.error_message)
        .bind(i64::from(transaction.retry_count))
        .bind(transaction.processed_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::TransactionNotFound {
                transaction_id: transaction.id,
            });
        }
        Ok(())
    }

    async fn get_transaction(
        &self,
        transaction_id: TransactionId,
    ) -> Result<Option<LoyaltyTransaction>> {
        let row = sqlx::query(&format!("{SELECT_TRANSACTION} WHERE id = $1"))
            .bind(transaction_id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;
        row.map(row_to_transaction).transpose()
    }

    async fn for_order(&self, order_id: OrderId) -> Result<Vec<LoyaltyTransaction>> {
        let rows = sqlx::query(&format!(
            "{SELECT_TRANSACTION} WHERE order_id = $1 ORDER BY created_at ASC"
        ))
        .bind(order_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(row_to_transaction).collect()
    }

    async fn retryable(&self) -> Result<Vec<LoyaltyTransaction>> {
        let rows = sqlx::query(&format!(
            "{SELECT_TRANSACTION} WHERE status = 'Failed' AND retry_count < $1 \
             ORDER BY created_at ASC"
        ))
        .bind(i64::from(MAX_RETRIES))
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(row_to_transaction).collect()
    }
}

#[async_trait]
impl Catalog for PostgresStore {
    async fn upsert_product(&self, product: &Product) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO products (id, sku, name, description, points_cost, product_type,
                                  is_active, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (id) DO UPDATE
            SET sku = $2, name = $3, description = $4, points_cost = $5,
                product_type = $6, is_active = $7
            "#,
        )
        .bind(product.id.as_uuid())
        .bind(&product.sku)
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.points_cost.value())
        .bind(product.product_type.as_str())
        .bind(product.is_active)
        .bind(product.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_product(&self, product_id: ProductId) -> Result<Option<Product>> {
        let row = sqlx::query(
            "SELECT id, sku, name, description, points_cost, product_type, is_active, \
             created_at FROM products WHERE id = $1",
        )
        .bind(product_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;
        row.map(row_to_product).transpose()
    }

    async fn list_products(&self) -> Result<Vec<Product>> {
        let rows = sqlx::query(
            "SELECT id, sku, name, description, points_cost, product_type, is_active, \
             created_at FROM products ORDER BY sku ASC",
        )
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(row_to_product).collect()
    }

    async fn upsert_company(&self, company: &Company) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO companies (id, name, loyalty_account_id, is_active, created_at)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (id) DO UPDATE
            SET name = $2, loyalty_account_id = $3, is_active = $4
            "#,
        )
        .bind(company.id.as_uuid())
        .bind(&company.name)
        .bind(&company.loyalty_account_id)
        .bind(company.is_active)
        .bind(company.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_company(&self, company_id: CompanyId) -> Result<Option<Company>> {
        let row = sqlx::query(
            "SELECT id, name, loyalty_account_id, is_active, created_at \
             FROM companies WHERE id = $1",
        )
        .bind(company_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;
        row.map(row_to_company).transpose()
    }

    async fn upsert_account_manager(&self, manager: &AccountManager) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO account_managers (id, company_id, name, email, is_active, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (id) DO UPDATE
            SET company_id = $2, name = $3, email = $4, is_active = $5
            "#,
        )
        .bind(manager.id.as_uuid())
        .bind(manager.company_id.as_uuid())
        .bind(&manager.name)
        .bind(&manager.email)
        .bind(manager.is_active)
        .bind(manager.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_account_manager(
        &self,
        manager_id: AccountManagerId,
    ) -> Result<Option<AccountManager>> {
        let row = sqlx::query(
            "SELECT id, company_id, name, email, is_active, created_at \
             FROM account_managers WHERE id = $1",
        )
        .bind(manager_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;
        row.map(row_to_manager).transpose()
    }
}
