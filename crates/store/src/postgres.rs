use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{Money, OrderId, ProductId, UserId};
use sqlx::{PgPool, Row, postgres::PgRow};
use uuid::Uuid;

use crate::{
    NewOrder, Order, OrderItem, OrderStatus, Product, Recipient, Result, StoreError,
    store::ShopStore,
};

/// PostgreSQL-backed shop store.
///
/// Atomicity of `commit_order` and `mark_cancelled` comes from sqlx
/// transactions; conditional `stock >= quantity` updates inside those
/// transactions detect concurrent stock mutations, so two orders racing
/// for the last unit can never both commit.
#[derive(Clone)]
pub struct PostgresShopStore {
    pool: PgPool,
}

impl PostgresShopStore {
    /// Creates a new PostgreSQL shop store.
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

    fn row_to_product(row: &PgRow) -> Result<Product> {
        Ok(Product {
            id: ProductId::from_uuid(row.try_get::<Uuid, _>("id")?),
            name: row.try_get("name")?,
            description: row.try_get("description")?,
            price: Money::from_cents(row.try_get("price_cents")?),
            stock: row.try_get::<i64, _>("stock")? as u32,
            active: row.try_get("active")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    fn row_to_order(row: &PgRow, items: Vec<OrderItem>) -> Result<Order> {
        let status: String = row.try_get("status")?;
        let status: OrderStatus = status
            .parse()
            .map_err(|_| StoreError::InvalidStatus(status))?;

        Ok(Order {
            id: OrderId::from_uuid(row.try_get::<Uuid, _>("id")?),
            order_number: row.try_get("order_number")?,
            user: row
                .try_get::<Option<Uuid>, _>("user_id")?
                .map(UserId::from_uuid),
            recipient: Recipient {
                first_name: row.try_get("first_name")?,
                last_name: row.try_get("last_name")?,
                phone: row.try_get("phone")?,
                email: row.try_get("email")?,
                address: row.try_get("address")?,
                note: row.try_get("note")?,
            },
            status,
            total_amount: Money::from_cents(row.try_get("total_amount_cents")?),
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
            items,
        })
    }

    fn row_to_item(row: &PgRow) -> Result<OrderItem> {
        Ok(OrderItem {
            id: row.try_get("id")?,
            product: row
                .try_get::<Option<Uuid>, _>("product_id")?
                .map(ProductId::from_uuid),
            product_name: row.try_get("product_name")?,
            price: Money::from_cents(row.try_get("price_cents")?),
            quantity: row.try_get::<i64, _>("quantity")? as u32,
        })
    }

    async fn load_items(&self, order_id: OrderId) -> Result<Vec<OrderItem>> {
        let rows = sqlx::query(
            r#"
            SELECT id, product_id, product_name, price_cents, quantity
            FROM order_items
            WHERE order_id = $1
            ORDER BY id
            "#,
        )
        .bind(order_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(Self::row_to_item).collect()
    }

    async fn load_order(&self, row: Option<PgRow>) -> Result<Option<Order>> {
        match row {
            Some(row) => {
                let order_id = OrderId::from_uuid(row.try_get::<Uuid, _>("id")?);
                let items = self.load_items(order_id).await?;
                Ok(Some(Self::row_to_order(&row, items)?))
            }
            None => Ok(None),
        }
    }
}

const ORDER_COLUMNS: &str = "id, order_number, user_id, first_name, last_name, phone, email, \
                             address, note, status, total_amount_cents, created_at, updated_at";

#[async_trait]
impl ShopStore for PostgresShopStore {
    fn backend_name(&self) -> &'static str {
        "postgres"
    }

    async fn find_orderable(&self, product_id: ProductId) -> Result<Option<Product>> {
        let row = sqlx::query(
            r#"
            SELECT id, name, description, price_cents, stock, active, created_at, updated_at
            FROM products
            WHERE id = $1 AND active
            "#,
        )
        .bind(product_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(Self::row_to_product).transpose()
    }

    async fn list_active_products(&self) -> Result<Vec<Product>> {
        let rows = sqlx::query(
            r#"
            SELECT id, name, description, price_cents, stock, active, created_at, updated_at
            FROM products
            WHERE active
            ORDER BY created_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(Self::row_to_product).collect()
    }

    async fn insert_product(&self, product: Product) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO products (id, name, description, price_cents, stock, active, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(product.id.as_uuid())
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.price.cents())
        .bind(i64::from(product.stock))
        .bind(product.active)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn adjust_stock(&self, product_id: ProductId, delta: i64) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE products
            SET stock = stock + $2, updated_at = NOW()
            WHERE id = $1 AND stock + $2 >= 0
            "#,
        )
        .bind(product_id.as_uuid())
        .bind(delta)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn order_number_exists(&self, order_number: &str) -> Result<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM orders WHERE order_number = $1)")
                .bind(order_number)
                .fetch_one(&self.pool)
                .await?;

        Ok(exists)
    }

    async fn commit_order(&self, new_order: NewOrder) -> Result<Order> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query(
            r#"
            INSERT INTO orders (id, order_number, user_id, first_name, last_name, phone, email,
                                address, note, status, total_amount_cents)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, 'pending', $10)
            RETURNING created_at, updated_at
            "#,
        )
        .bind(new_order.id.as_uuid())
        .bind(&new_order.order_number)
        .bind(new_order.user.map(|u| u.as_uuid()))
        .bind(&new_order.recipient.first_name)
        .bind(&new_order.recipient.last_name)
        .bind(&new_order.recipient.phone)
        .bind(&new_order.recipient.email)
        .bind(&new_order.recipient.address)
        .bind(&new_order.recipient.note)
        .bind(new_order.total_amount.cents())
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.constraint() == Some("orders_order_number_key")
            {
                return StoreError::DuplicateOrderNumber(new_order.order_number.clone());
            }
            StoreError::Database(e)
        })?;

        let created_at: DateTime<Utc> = row.try_get("created_at")?;
        let updated_at: DateTime<Utc> = row.try_get("updated_at")?;

        let mut items = Vec::with_capacity(new_order.items.len());
        for item in &new_order.items {
            // Conditional decrement: zero rows affected means the stock
            // snapshot from validation is stale, which aborts the whole
            // transaction on drop.
            let result = sqlx::query(
                r#"
                UPDATE products
                SET stock = stock - $2, updated_at = NOW()
                WHERE id = $1 AND active AND stock >= $2
                "#,
            )
            .bind(item.product_id.as_uuid())
            .bind(i64::from(item.quantity))
            .execute(&mut *tx)
            .await?;

            if result.rows_affected() == 0 {
                return Err(StoreError::StockConflict {
                    product_id: item.product_id,
                });
            }

            let item_id = Uuid::new_v4();
            sqlx::query(
                r#"
                INSERT INTO order_items (id, order_id, product_id, product_name, price_cents, quantity)
                VALUES ($1, $2, $3, $4, $5, $6)
                "#,
            )
            .bind(item_id)
            .bind(new_order.id.as_uuid())
            .bind(item.product_id.as_uuid())
            .bind(&item.product_name)
            .bind(item.price.cents())
            .bind(i64::from(item.quantity))
            .execute(&mut *tx)
            .await?;

            items.push(OrderItem {
                id: item_id,
                product: Some(item.product_id),
                product_name: item.product_name.clone(),
                price: item.price,
                quantity: item.quantity,
            });
        }

        tx.commit().await?;

        Ok(Order {
            id: new_order.id,
            order_number: new_order.order_number,
            user: new_order.user,
            recipient: new_order.recipient,
            status: OrderStatus::Pending,
            total_amount: new_order.total_amount,
            created_at,
            updated_at,
            items,
        })
    }

    async fn get_order(&self, order_id: OrderId) -> Result<Option<Order>> {
        let row = sqlx::query(&format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1"))
            .bind(order_id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;

        self.load_order(row).await
    }

    async fn get_order_owned(&self, order_id: OrderId, user: UserId) -> Result<Option<Order>> {
        let row = sqlx::query(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1 AND user_id = $2"
        ))
        .bind(order_id.as_uuid())
        .bind(user.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        self.load_order(row).await
    }

    async fn list_orders_for_user(&self, user: UserId) -> Result<Vec<Order>> {
        let rows = sqlx::query(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE user_id = $1 ORDER BY created_at DESC"
        ))
        .bind(user.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        let mut orders = Vec::with_capacity(rows.len());
        for row in rows {
            let order_id = OrderId::from_uuid(row.try_get::<Uuid, _>("id")?);
            let items = self.load_items(order_id).await?;
            orders.push(Self::row_to_order(&row, items)?);
        }
        Ok(orders)
    }

    async fn mark_cancelled(&self, order_id: OrderId) -> Result<Order> {
        let mut tx = self.pool.begin().await?;

        // Row lock serializes this against concurrent cancellation and
        // status updates of the same order.
        let row = sqlx::query(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1 FOR UPDATE"
        ))
        .bind(order_id.as_uuid())
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(StoreError::OrderNotFound(order_id))?;

        let status: String = row.try_get("status")?;
        let status: OrderStatus = status
            .parse()
            .map_err(|_| StoreError::InvalidStatus(status))?;
        if !status.can_cancel() {
            return Err(StoreError::StatusConflict { current: status });
        }

        let item_rows = sqlx::query(
            r#"
            SELECT id, product_id, product_name, price_cents, quantity
            FROM order_items
            WHERE order_id = $1
            ORDER BY id
            "#,
        )
        .bind(order_id.as_uuid())
        .fetch_all(&mut *tx)
        .await?;
        let items: Vec<OrderItem> = item_rows
            .iter()
            .map(Self::row_to_item)
            .collect::<Result<_>>()?;

        for item in &items {
            // Lines whose product was deleted carry a NULL reference and
            // are skipped; a vanished row likewise affects zero rows.
            if let Some(product_id) = item.product {
                sqlx::query(
                    r#"
                    UPDATE products
                    SET stock = stock + $2, updated_at = NOW()
                    WHERE id = $1
                    "#,
                )
                .bind(product_id.as_uuid())
                .bind(i64::from(item.quantity))
                .execute(&mut *tx)
                .await?;
            }
        }

        let updated_row = sqlx::query(
            "UPDATE orders SET status = 'cancelled', updated_at = NOW() WHERE id = $1 \
             RETURNING updated_at",
        )
        .bind(order_id.as_uuid())
        .fetch_one(&mut *tx)
        .await?;
        let updated_at: DateTime<Utc> = updated_row.try_get("updated_at")?;

        tx.commit().await?;

        let mut order = Self::row_to_order(&row, items)?;
        order.status = OrderStatus::Cancelled;
        order.updated_at = updated_at;
        Ok(order)
    }

    async fn update_status(&self, order_id: OrderId, status: OrderStatus) -> Result<Order> {
        let row = sqlx::query(&format!(
            "UPDATE orders SET status = $2, updated_at = NOW() WHERE id = $1 \
             RETURNING {ORDER_COLUMNS}"
        ))
        .bind(order_id.as_uuid())
        .bind(status.as_str())
        .fetch_optional(&self.pool)
        .await?
        .ok_or(StoreError::OrderNotFound(order_id))?;

        let items = self.load_items(order_id).await?;
        Self::row_to_order(&row, items)
    }

    async fn add_favorite(&self, user: UserId, product_id: ProductId) -> Result<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO favorites (user_id, product_id)
            VALUES ($1, $2)
            ON CONFLICT (user_id, product_id) DO NOTHING
            "#,
        )
        .bind(user.as_uuid())
        .bind(product_id.as_uuid())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.constraint() == Some("favorites_product_id_fkey")
            {
                return StoreError::ProductNotFound(product_id);
            }
            StoreError::Database(e)
        })?;

        Ok(result.rows_affected() > 0)
    }

    async fn remove_favorite(&self, user: UserId, product_id: ProductId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM favorites WHERE user_id = $1 AND product_id = $2")
            .bind(user.as_uuid())
            .bind(product_id.as_uuid())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_favorites(&self, user: UserId) -> Result<Vec<Product>> {
        let rows = sqlx::query(
            r#"
            SELECT p.id, p.name, p.description, p.price_cents, p.stock, p.active,
                   p.created_at, p.updated_at
            FROM products p
            JOIN favorites f ON f.product_id = p.id
            WHERE f.user_id = $1
            ORDER BY f.created_at DESC
            "#,
        )
        .bind(user.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(Self::row_to_product).collect()
    }
}
