//! Persistence seam. Handlers and services only talk to [`Repository`]; `main` picks Postgres or
//! the in-memory store depending on configuration.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use serde::Serialize;
use uuid::Uuid;

use crate::domain::aggregates::{Cart, Category, Order, OrderStatus, PaymentMethod, Product, ProductStatus, Settings, StockReservation, Store};
use crate::Result;

pub use memory::MemoryRepository;
pub use postgres::PgRepository;

pub const DEFAULT_PER_PAGE: u32 = 20;
pub const MAX_PER_PAGE: u32 = 100;

#[derive(Debug, Clone, Serialize)]
pub struct Page<T> { pub data: Vec<T>, pub total: i64, pub page: u32, pub per_page: u32 }

/// 1-based page number and clamped page size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Paging { pub page: u32, pub per_page: u32 }

impl Paging {
    pub fn new(page: Option<u32>, per_page: Option<u32>) -> Self {
        Self { page: page.unwrap_or(1).max(1), per_page: per_page.unwrap_or(DEFAULT_PER_PAGE).clamp(1, MAX_PER_PAGE) }
    }
    pub fn offset(&self) -> u64 { u64::from(self.page - 1) * u64::from(self.per_page) }
}

impl Default for Paging {
    fn default() -> Self { Self::new(None, None) }
}

#[derive(Debug, Clone, Default)]
pub struct ProductQuery {
    pub status: Option<ProductStatus>,
    pub category_id: Option<Uuid>,
    pub featured: Option<bool>,
    /// Case-insensitive match on name or description.
    pub search: Option<String>,
    pub paging: Paging,
}

#[derive(Debug, Clone, Default)]
pub struct OrderQuery {
    pub status: Option<OrderStatus>,
    pub customer_id: Option<String>,
    pub paging: Paging,
}

#[async_trait]
pub trait Repository: Send + Sync {
    async fn list_categories(&self) -> Result<Vec<Category>>;
    async fn get_category(&self, id: Uuid) -> Result<Option<Category>>;
    /// Inserts or replaces; a slug taken by another category is a conflict.
    async fn save_category(&self, category: &Category) -> Result<()>;
    /// Products in the category stay, with their category cleared.
    async fn delete_category(&self, id: Uuid) -> Result<bool>;

    async fn list_products(&self, query: &ProductQuery) -> Result<Page<Product>>;
    async fn get_product(&self, id: Uuid) -> Result<Option<Product>>;
    async fn get_products(&self, ids: &[Uuid]) -> Result<Vec<Product>>;
    /// Inserts or replaces, including per-store stock; a slug taken by another product is a conflict.
    async fn save_product(&self, product: &Product) -> Result<()>;

    async fn list_stores(&self, active_only: bool) -> Result<Vec<Store>>;
    async fn get_store(&self, id: Uuid) -> Result<Option<Store>>;
    async fn save_store(&self, store: &Store) -> Result<()>;
    async fn delete_store(&self, id: Uuid) -> Result<bool>;

    async fn list_payment_methods(&self, active_only: bool) -> Result<Vec<PaymentMethod>>;
    async fn get_payment_method(&self, id: Uuid) -> Result<Option<PaymentMethod>>;
    async fn save_payment_method(&self, method: &PaymentMethod) -> Result<()>;
    async fn delete_payment_method(&self, id: Uuid) -> Result<bool>;

    async fn get_settings(&self) -> Result<Option<Settings>>;
    async fn save_settings(&self, settings: &Settings) -> Result<()>;

    /// Applies `order.reservations` and stores the order as one unit: if any reservation no
    /// longer fits the stock, nothing is written and `Error::InsufficientStock` is returned.
    /// A taken order number gives `Error::Conflict`. On success, returns the reservations
    /// that left their stock counter at zero.
    async fn place_order(&self, order: &Order) -> Result<Vec<StockReservation>>;
    async fn get_order(&self, id: Uuid) -> Result<Option<Order>>;
    async fn list_orders(&self, query: &OrderQuery) -> Result<Page<Order>>;
    /// Stores the order and hands `release` back to stock in the same unit of work, provided the
    /// stored order is still in `previous` status; otherwise `Error::Conflict`.
    async fn update_order(&self, order: &Order, previous: OrderStatus, release: &[StockReservation]) -> Result<()>;

    async fn get_cart(&self, session_id: &str) -> Result<Option<Cart>>;
    async fn save_cart(&self, cart: &Cart) -> Result<()>;
    async fn delete_cart(&self, session_id: &str) -> Result<()>;
}
