//! Postgres repository

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::types::Json;
use sqlx::{Postgres, QueryBuilder, Transaction};
use std::collections::HashMap;
use uuid::Uuid;

use super::{OrderQuery, Page, ProductQuery, Repository};
use crate::domain::aggregates::{
    Cart, CartItem, Category, CustomerDetails, LineItem, Order, OrderStatus, PaymentMethod, Product,
    ProductStatus, Settings, StockReservation, StockSource, Store, StoreStock, Variant,
};
use crate::domain::pricing::MultiBuyOffer;
use crate::domain::value_objects::Quantity;
use crate::{Error, Result};

#[derive(Clone)]
pub struct PgRepository { pool: PgPool }

impl PgRepository {
    pub async fn connect(url: &str, max_connections: u32) -> anyhow::Result<Self> {
        let pool = PgPoolOptions::new().max_connections(max_connections).connect(url).await?;
        sqlx::migrate!("./migrations").run(&pool).await?;
        Ok(Self { pool })
    }
}

/// Maps unique-index violations to a conflict carrying `message`.
fn unique_violation(e: sqlx::Error, message: impl FnOnce() -> String) -> Error {
    match &e {
        sqlx::Error::Database(db) if db.code().as_deref() == Some("23505") => Error::Conflict(message()),
        _ => Error::from(e),
    }
}

fn to_quantity(stock: i32) -> Quantity { Quantity::new(u32::try_from(stock).unwrap_or(0)) }

fn to_db_count(value: u32) -> Result<i32> {
    i32::try_from(value).map_err(|_| Error::Validation(format!("quantity {value} is too large")))
}

#[derive(sqlx::FromRow)]
struct CategoryRow { id: Uuid, name: String, slug: String, description: Option<String>, image_url: Option<String>, created_at: DateTime<Utc>, updated_at: DateTime<Utc> }

impl From<CategoryRow> for Category {
    fn from(r: CategoryRow) -> Self {
        Self { id: r.id, name: r.name, slug: r.slug, description: r.description, image_url: r.image_url, created_at: r.created_at, updated_at: r.updated_at }
    }
}

#[derive(sqlx::FromRow)]
struct ProductRow {
    id: Uuid, name: String, slug: String, description: Option<String>, price: Decimal, compare_at_price: Option<Decimal>,
    category_id: Option<Uuid>, images: Json<Vec<String>>, variants: Json<Vec<Variant>>, offers: Json<Vec<MultiBuyOffer>>,
    stock: i32, featured: bool, status: String, created_at: DateTime<Utc>, updated_at: DateTime<Utc>,
}

impl ProductRow {
    fn into_product(self, store_stock: Vec<StoreStock>) -> Product {
        Product {
            id: self.id, name: self.name, slug: self.slug, description: self.description, price: self.price,
            compare_at_price: self.compare_at_price, category_id: self.category_id, images: self.images.0,
            variants: self.variants.0, offers: self.offers.0, stock: to_quantity(self.stock), store_stock,
            featured: self.featured, status: ProductStatus::parse(&self.status).unwrap_or(ProductStatus::Draft),
            created_at: self.created_at, updated_at: self.updated_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct StoreStockRow { product_id: Uuid, store_id: Uuid, stock: i32 }

#[derive(sqlx::FromRow)]
struct StoreRow { id: Uuid, name: String, address: Option<String>, phone: Option<String>, whatsapp: Option<String>, active: bool, created_at: DateTime<Utc>, updated_at: DateTime<Utc> }

impl From<StoreRow> for Store {
    fn from(r: StoreRow) -> Self {
        Self { id: r.id, name: r.name, address: r.address, phone: r.phone, whatsapp: r.whatsapp, active: r.active, created_at: r.created_at, updated_at: r.updated_at }
    }
}

#[derive(sqlx::FromRow)]
struct PaymentMethodRow { id: Uuid, name: String, instructions: Option<String>, active: bool, position: i32, created_at: DateTime<Utc>, updated_at: DateTime<Utc> }

impl From<PaymentMethodRow> for PaymentMethod {
    fn from(r: PaymentMethodRow) -> Self {
        Self { id: r.id, name: r.name, instructions: r.instructions, active: r.active, position: r.position, created_at: r.created_at, updated_at: r.updated_at }
    }
}

#[derive(sqlx::FromRow)]
struct SettingsRow { shop_name: String, currency: String, whatsapp_number: Option<String>, contact_email: Option<String>, delivery_fee: Decimal, updated_at: DateTime<Utc> }

impl From<SettingsRow> for Settings {
    fn from(r: SettingsRow) -> Self {
        Self { shop_name: r.shop_name, currency: r.currency, whatsapp_number: r.whatsapp_number, contact_email: r.contact_email, delivery_fee: r.delivery_fee, updated_at: r.updated_at }
    }
}

#[derive(sqlx::FromRow)]
struct OrderRow {
    id: Uuid, order_number: String, customer: Json<CustomerDetails>, customer_id: Option<String>, store_id: Option<Uuid>,
    payment_method_id: Option<Uuid>, items: Json<Vec<LineItem>>, reservations: Json<Vec<StockReservation>>, currency: String,
    subtotal: Decimal, savings: Decimal, delivery_fee: Decimal, total: Decimal, status: String, notes: Option<String>,
    created_at: DateTime<Utc>, updated_at: DateTime<Utc>,
}

impl From<OrderRow> for Order {
    fn from(r: OrderRow) -> Self {
        let mut order = Order::create(r.order_number, r.customer.0, &r.currency);
        order.id = r.id;
        order.customer_id = r.customer_id;
        order.store_id = r.store_id;
        order.payment_method_id = r.payment_method_id;
        order.items = r.items.0;
        order.reservations = r.reservations.0;
        order.subtotal = r.subtotal;
        order.savings = r.savings;
        order.delivery_fee = r.delivery_fee;
        order.total = r.total;
        order.status = OrderStatus::parse(&r.status).unwrap_or_default();
        order.notes = r.notes;
        order.created_at = r.created_at;
        order.updated_at = r.updated_at;
        order
    }
}

#[derive(sqlx::FromRow)]
struct CartRow { session_id: String, items: Json<Vec<CartItem>>, updated_at: DateTime<Utc> }

fn push_product_filters(qb: &mut QueryBuilder<'_, Postgres>, query: &ProductQuery) {
    if let Some(status) = query.status {
        qb.push(" AND status = ").push_bind(status.as_str());
    }
    if let Some(category_id) = query.category_id {
        qb.push(" AND category_id = ").push_bind(category_id);
    }
    if let Some(featured) = query.featured {
        qb.push(" AND featured = ").push_bind(featured);
    }
    if let Some(search) = query.search.as_deref() {
        let pattern = format!("%{}%", search.replace('\\', "\\\\").replace('%', "\\%").replace('_', "\\_"));
        qb.push(" AND (name ILIKE ").push_bind(pattern.clone()).push(" OR description ILIKE ").push_bind(pattern).push(")");
    }
}

fn push_order_filters(qb: &mut QueryBuilder<'_, Postgres>, query: &OrderQuery) {
    if let Some(status) = query.status {
        qb.push(" AND status = ").push_bind(status.as_str());
    }
    if let Some(customer_id) = query.customer_id.clone() {
        qb.push(" AND customer_id = ").push_bind(customer_id);
    }
}

impl PgRepository {
    async fn with_store_stock(&self, rows: Vec<ProductRow>) -> Result<Vec<Product>> {
        let ids: Vec<Uuid> = rows.iter().map(|r| r.id).collect();
        let stock_rows = sqlx::query_as::<_, StoreStockRow>("SELECT product_id, store_id, stock FROM product_store_stock WHERE product_id = ANY($1) ORDER BY store_id")
            .bind(&ids).fetch_all(&self.pool).await?;
        let mut by_product: HashMap<Uuid, Vec<StoreStock>> = HashMap::new();
        for s in stock_rows {
            by_product.entry(s.product_id).or_default().push(StoreStock { store_id: s.store_id, stock: to_quantity(s.stock) });
        }
        Ok(rows.into_iter().map(|r| { let stock = by_product.remove(&r.id).unwrap_or_default(); r.into_product(stock) }).collect())
    }

    /// Takes `reservation` out of stock and returns what is left on that counter,
    /// or reports what is actually available.
    async fn reserve(tx: &mut Transaction<'_, Postgres>, reservation: &StockReservation) -> Result<u32> {
        let quantity = to_db_count(reservation.quantity)?;
        let remaining: Option<(i32,)> = match reservation.source {
            StockSource::Global => sqlx::query_as("UPDATE products SET stock = stock - $2, updated_at = NOW() WHERE id = $1 AND stock >= $2 RETURNING stock")
                .bind(reservation.product_id).bind(quantity).fetch_optional(&mut **tx).await?,
            StockSource::Store(store_id) => sqlx::query_as("UPDATE product_store_stock SET stock = stock - $3 WHERE product_id = $1 AND store_id = $2 AND stock >= $3 RETURNING stock")
                .bind(reservation.product_id).bind(store_id).bind(quantity).fetch_optional(&mut **tx).await?,
        };
        if let Some((stock,)) = remaining {
            return Ok(to_quantity(stock).value());
        }

        let name: Option<(String,)> = sqlx::query_as("SELECT name FROM products WHERE id = $1")
            .bind(reservation.product_id).fetch_optional(&mut **tx).await?;
        let Some((name,)) = name else { return Err(Error::NotFound("Product")) };
        let available: Option<(i32,)> = match reservation.source {
            StockSource::Global => sqlx::query_as("SELECT stock FROM products WHERE id = $1")
                .bind(reservation.product_id).fetch_optional(&mut **tx).await?,
            StockSource::Store(store_id) => sqlx::query_as("SELECT stock FROM product_store_stock WHERE product_id = $1 AND store_id = $2")
                .bind(reservation.product_id).bind(store_id).fetch_optional(&mut **tx).await?,
        };
        Err(Error::InsufficientStock { product: name, requested: reservation.quantity, available: available.map_or(0, |(s,)| to_quantity(s).value()) })
    }

    async fn release(tx: &mut Transaction<'_, Postgres>, reservation: &StockReservation) -> Result<()> {
        let quantity = to_db_count(reservation.quantity)?;
        match reservation.source {
            StockSource::Global => {
                sqlx::query("UPDATE products SET stock = stock + $2, updated_at = NOW() WHERE id = $1")
                    .bind(reservation.product_id).bind(quantity).execute(&mut **tx).await?;
            }
            StockSource::Store(store_id) => {
                // The store row may have been removed since; it is recreated only if both ends still exist.
                sqlx::query("INSERT INTO product_store_stock (product_id, store_id, stock) SELECT $1, $2, $3 WHERE EXISTS (SELECT 1 FROM products WHERE id = $1) AND EXISTS (SELECT 1 FROM stores WHERE id = $2) ON CONFLICT (product_id, store_id) DO UPDATE SET stock = product_store_stock.stock + EXCLUDED.stock")
                    .bind(reservation.product_id).bind(store_id).bind(quantity).execute(&mut **tx).await?;
            }
        }
        Ok(())
    }

    async fn write_order(tx: &mut Transaction<'_, Postgres>, order: &Order) -> Result<()> {
        sqlx::query("INSERT INTO orders (id, order_number, customer, customer_id, store_id, payment_method_id, items, reservations, currency, subtotal, savings, delivery_fee, total, status, notes, created_at, updated_at) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17) ON CONFLICT (id) DO UPDATE SET customer = EXCLUDED.customer, items = EXCLUDED.items, reservations = EXCLUDED.reservations, subtotal = EXCLUDED.subtotal, savings = EXCLUDED.savings, delivery_fee = EXCLUDED.delivery_fee, total = EXCLUDED.total, status = EXCLUDED.status, notes = EXCLUDED.notes, updated_at = EXCLUDED.updated_at")
            .bind(order.id).bind(&order.order_number).bind(Json(&order.customer)).bind(&order.customer_id).bind(order.store_id)
            .bind(order.payment_method_id).bind(Json(&order.items)).bind(Json(&order.reservations)).bind(&order.currency)
            .bind(order.subtotal).bind(order.savings).bind(order.delivery_fee).bind(order.total).bind(order.status.as_str())
            .bind(&order.notes).bind(order.created_at).bind(order.updated_at)
            .execute(&mut **tx).await
            .map_err(|e| unique_violation(e, || format!("Order number {} already used", order.order_number)))?;
        Ok(())
    }
}

#[async_trait]
impl Repository for PgRepository {
    async fn list_categories(&self) -> Result<Vec<Category>> {
        let rows = sqlx::query_as::<_, CategoryRow>("SELECT * FROM categories ORDER BY name").fetch_all(&self.pool).await?;
        Ok(rows.into_iter().map(Category::from).collect())
    }

    async fn get_category(&self, id: Uuid) -> Result<Option<Category>> {
        let row = sqlx::query_as::<_, CategoryRow>("SELECT * FROM categories WHERE id = $1").bind(id).fetch_optional(&self.pool).await?;
        Ok(row.map(Category::from))
    }

    async fn save_category(&self, c: &Category) -> Result<()> {
        sqlx::query("INSERT INTO categories (id, name, slug, description, image_url, created_at, updated_at) VALUES ($1, $2, $3, $4, $5, $6, $7) ON CONFLICT (id) DO UPDATE SET name = EXCLUDED.name, slug = EXCLUDED.slug, description = EXCLUDED.description, image_url = EXCLUDED.image_url, updated_at = EXCLUDED.updated_at")
            .bind(c.id).bind(&c.name).bind(&c.slug).bind(&c.description).bind(&c.image_url).bind(c.created_at).bind(c.updated_at)
            .execute(&self.pool).await
            .map_err(|e| unique_violation(e, || format!("Category slug '{}' already exists", c.slug)))?;
        Ok(())
    }

    async fn delete_category(&self, id: Uuid) -> Result<bool> {
        // products.category_id is ON DELETE SET NULL
        let result = sqlx::query("DELETE FROM categories WHERE id = $1").bind(id).execute(&self.pool).await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_products(&self, query: &ProductQuery) -> Result<Page<Product>> {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT * FROM products WHERE TRUE");
        push_product_filters(&mut qb, query);
        qb.push(" ORDER BY created_at DESC, id DESC LIMIT ").push_bind(i64::from(query.paging.per_page))
            .push(" OFFSET ").push_bind(query.paging.offset() as i64);
        let rows: Vec<ProductRow> = qb.build_query_as().fetch_all(&self.pool).await?;

        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM products WHERE TRUE");
        push_product_filters(&mut count, query);
        let (total,): (i64,) = count.build_query_as().fetch_one(&self.pool).await?;

        Ok(Page { data: self.with_store_stock(rows).await?, total, page: query.paging.page, per_page: query.paging.per_page })
    }

    async fn get_product(&self, id: Uuid) -> Result<Option<Product>> {
        Ok(self.get_products(&[id]).await?.pop())
    }

    async fn get_products(&self, ids: &[Uuid]) -> Result<Vec<Product>> {
        let rows = sqlx::query_as::<_, ProductRow>("SELECT * FROM products WHERE id = ANY($1)").bind(ids).fetch_all(&self.pool).await?;
        self.with_store_stock(rows).await
    }

    async fn save_product(&self, p: &Product) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("INSERT INTO products (id, name, slug, description, price, compare_at_price, category_id, images, variants, offers, stock, featured, status, created_at, updated_at) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15) ON CONFLICT (id) DO UPDATE SET name = EXCLUDED.name, slug = EXCLUDED.slug, description = EXCLUDED.description, price = EXCLUDED.price, compare_at_price = EXCLUDED.compare_at_price, category_id = EXCLUDED.category_id, images = EXCLUDED.images, variants = EXCLUDED.variants, offers = EXCLUDED.offers, stock = EXCLUDED.stock, featured = EXCLUDED.featured, status = EXCLUDED.status, updated_at = EXCLUDED.updated_at")
            .bind(p.id).bind(&p.name).bind(&p.slug).bind(&p.description).bind(p.price).bind(p.compare_at_price).bind(p.category_id)
            .bind(Json(&p.images)).bind(Json(&p.variants)).bind(Json(&p.offers)).bind(to_db_count(p.stock.value())?)
            .bind(p.featured).bind(p.status.as_str()).bind(p.created_at).bind(p.updated_at)
            .execute(&mut *tx).await
            .map_err(|e| unique_violation(e, || format!("Product slug '{}' already exists", p.slug)))?;

        sqlx::query("DELETE FROM product_store_stock WHERE product_id = $1").bind(p.id).execute(&mut *tx).await?;
        for entry in &p.store_stock {
            sqlx::query("INSERT INTO product_store_stock (product_id, store_id, stock) VALUES ($1, $2, $3)")
                .bind(p.id).bind(entry.store_id).bind(to_db_count(entry.stock.value())?)
                .execute(&mut *tx).await?;
        }
        tx.commit().await?;
        Ok(())
    }

    async fn list_stores(&self, active_only: bool) -> Result<Vec<Store>> {
        let rows = sqlx::query_as::<_, StoreRow>("SELECT * FROM stores WHERE active OR NOT $1 ORDER BY name")
            .bind(active_only).fetch_all(&self.pool).await?;
        Ok(rows.into_iter().map(Store::from).collect())
    }

    async fn get_store(&self, id: Uuid) -> Result<Option<Store>> {
        let row = sqlx::query_as::<_, StoreRow>("SELECT * FROM stores WHERE id = $1").bind(id).fetch_optional(&self.pool).await?;
        Ok(row.map(Store::from))
    }

    async fn save_store(&self, s: &Store) -> Result<()> {
        sqlx::query("INSERT INTO stores (id, name, address, phone, whatsapp, active, created_at, updated_at) VALUES ($1, $2, $3, $4, $5, $6, $7, $8) ON CONFLICT (id) DO UPDATE SET name = EXCLUDED.name, address = EXCLUDED.address, phone = EXCLUDED.phone, whatsapp = EXCLUDED.whatsapp, active = EXCLUDED.active, updated_at = EXCLUDED.updated_at")
            .bind(s.id).bind(&s.name).bind(&s.address).bind(&s.phone).bind(&s.whatsapp).bind(s.active).bind(s.created_at).bind(s.updated_at)
            .execute(&self.pool).await?;
        Ok(())
    }

    async fn delete_store(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM stores WHERE id = $1").bind(id).execute(&self.pool).await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_payment_methods(&self, active_only: bool) -> Result<Vec<PaymentMethod>> {
        let rows = sqlx::query_as::<_, PaymentMethodRow>("SELECT * FROM payment_methods WHERE active OR NOT $1 ORDER BY position, name")
            .bind(active_only).fetch_all(&self.pool).await?;
        Ok(rows.into_iter().map(PaymentMethod::from).collect())
    }

    async fn get_payment_method(&self, id: Uuid) -> Result<Option<PaymentMethod>> {
        let row = sqlx::query_as::<_, PaymentMethodRow>("SELECT * FROM payment_methods WHERE id = $1").bind(id).fetch_optional(&self.pool).await?;
        Ok(row.map(PaymentMethod::from))
    }

    async fn save_payment_method(&self, m: &PaymentMethod) -> Result<()> {
        sqlx::query("INSERT INTO payment_methods (id, name, instructions, active, position, created_at, updated_at) VALUES ($1, $2, $3, $4, $5, $6, $7) ON CONFLICT (id) DO UPDATE SET name = EXCLUDED.name, instructions = EXCLUDED.instructions, active = EXCLUDED.active, position = EXCLUDED.position, updated_at = EXCLUDED.updated_at")
            .bind(m.id).bind(&m.name).bind(&m.instructions).bind(m.active).bind(m.position).bind(m.created_at).bind(m.updated_at)
            .execute(&self.pool).await?;
        Ok(())
    }

    async fn delete_payment_method(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM payment_methods WHERE id = $1").bind(id).execute(&self.pool).await?;
        Ok(result.rows_affected() > 0)
    }

    async fn get_settings(&self) -> Result<Option<Settings>> {
        let row = sqlx::query_as::<_, SettingsRow>("SELECT shop_name, currency, whatsapp_number, contact_email, delivery_fee, updated_at FROM settings WHERE id = 1")
            .fetch_optional(&self.pool).await?;
        Ok(row.map(Settings::from))
    }

    async fn save_settings(&self, s: &Settings) -> Result<()> {
        sqlx::query("INSERT INTO settings (id, shop_name, currency, whatsapp_number, contact_email, delivery_fee, updated_at) VALUES (1, $1, $2, $3, $4, $5, $6) ON CONFLICT (id) DO UPDATE SET shop_name = EXCLUDED.shop_name, currency = EXCLUDED.currency, whatsapp_number = EXCLUDED.whatsapp_number, contact_email = EXCLUDED.contact_email, delivery_fee = EXCLUDED.delivery_fee, updated_at = EXCLUDED.updated_at")
            .bind(&s.shop_name).bind(&s.currency).bind(&s.whatsapp_number).bind(&s.contact_email).bind(s.delivery_fee).bind(s.updated_at)
            .execute(&self.pool).await?;
        Ok(())
    }

    async fn place_order(&self, order: &Order) -> Result<Vec<StockReservation>> {
        let mut tx = self.pool.begin().await?;
        let mut remaining: Vec<(StockReservation, u32)> = Vec::with_capacity(order.reservations.len());
        for reservation in &order.reservations {
            let left = Self::reserve(&mut tx, reservation).await?;
            remaining.retain(|(r, _)| r.product_id != reservation.product_id || r.source != reservation.source);
            remaining.push((*reservation, left));
        }
        Self::write_order(&mut tx, order).await?;
        tx.commit().await?;
        Ok(remaining.into_iter().filter(|(_, left)| *left == 0).map(|(r, _)| r).collect())
    }

    async fn get_order(&self, id: Uuid) -> Result<Option<Order>> {
        let row = sqlx::query_as::<_, OrderRow>("SELECT * FROM orders WHERE id = $1").bind(id).fetch_optional(&self.pool).await?;
        Ok(row.map(Order::from))
    }

    async fn list_orders(&self, query: &OrderQuery) -> Result<Page<Order>> {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT * FROM orders WHERE TRUE");
        push_order_filters(&mut qb, query);
        qb.push(" ORDER BY created_at DESC, id DESC LIMIT ").push_bind(i64::from(query.paging.per_page))
            .push(" OFFSET ").push_bind(query.paging.offset() as i64);
        let rows: Vec<OrderRow> = qb.build_query_as().fetch_all(&self.pool).await?;

        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM orders WHERE TRUE");
        push_order_filters(&mut count, query);
        let (total,): (i64,) = count.build_query_as().fetch_one(&self.pool).await?;

        Ok(Page { data: rows.into_iter().map(Order::from).collect(), total, page: query.paging.page, per_page: query.paging.per_page })
    }

    async fn update_order(&self, order: &Order, previous: OrderStatus, release: &[StockReservation]) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        let stored: Option<(String,)> = sqlx::query_as("SELECT status FROM orders WHERE id = $1 FOR UPDATE")
            .bind(order.id).fetch_optional(&mut *tx).await?;
        match stored {
            None => return Err(Error::NotFound("Order")),
            Some((status,)) if status != previous.as_str() => return Err(Error::Conflict("Order was changed concurrently".to_string())),
            Some(_) => {}
        }
        for reservation in release {
            Self::release(&mut tx, reservation).await?;
        }
        Self::write_order(&mut tx, order).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn get_cart(&self, session_id: &str) -> Result<Option<Cart>> {
        let row = sqlx::query_as::<_, CartRow>("SELECT session_id, items, updated_at FROM carts WHERE session_id = $1")
            .bind(session_id).fetch_optional(&self.pool).await?;
        Ok(row.map(|r| Cart { session_id: r.session_id, items: r.items.0, updated_at: r.updated_at }))
    }

    async fn save_cart(&self, cart: &Cart) -> Result<()> {
        sqlx::query("INSERT INTO carts (session_id, items, updated_at) VALUES ($1, $2, $3) ON CONFLICT (session_id) DO UPDATE SET items = EXCLUDED.items, updated_at = EXCLUDED.updated_at")
            .bind(&cart.session_id).bind(Json(&cart.items)).bind(cart.updated_at)
            .execute(&self.pool).await?;
        Ok(())
    }

    async fn delete_cart(&self, session_id: &str) -> Result<()> {
        sqlx::query("DELETE FROM carts WHERE session_id = $1").bind(session_id).execute(&self.pool).await?;
        Ok(())
    }
}
