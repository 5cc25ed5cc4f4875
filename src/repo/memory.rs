//! In-memory repository for tests and database-less runs.

use async_trait::async_trait;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{OrderQuery, Page, Paging, ProductQuery, Repository};
use crate::domain::aggregates::{Cart, Category, Order, OrderStatus, PaymentMethod, Product, Settings, StockReservation, Store};
use crate::{Error, Result};

#[derive(Default)]
struct State {
    categories: HashMap<Uuid, Category>,
    products: HashMap<Uuid, Product>,
    stores: HashMap<Uuid, Store>,
    payment_methods: HashMap<Uuid, PaymentMethod>,
    settings: Option<Settings>,
    orders: HashMap<Uuid, Order>,
    carts: HashMap<String, Cart>,
}

/// One lock over everything, so order placement is atomic the same way a transaction is.
#[derive(Default)]
pub struct MemoryRepository { state: RwLock<State> }

impl MemoryRepository {
    pub fn new() -> Self { Self::default() }
}

fn paginate<T>(items: Vec<T>, paging: Paging) -> Page<T> {
    let total = items.len() as i64;
    let data = items.into_iter().skip(paging.offset() as usize).take(paging.per_page as usize).collect();
    Page { data, total, page: paging.page, per_page: paging.per_page }
}

fn matches_search(product: &Product, needle: &str) -> bool {
    let needle = needle.to_lowercase();
    product.name.to_lowercase().contains(&needle)
        || product.description.as_deref().is_some_and(|d| d.to_lowercase().contains(&needle))
}

#[async_trait]
impl Repository for MemoryRepository {
    async fn list_categories(&self) -> Result<Vec<Category>> {
        let state = self.state.read().await;
        let mut categories: Vec<Category> = state.categories.values().cloned().collect();
        categories.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(categories)
    }

    async fn get_category(&self, id: Uuid) -> Result<Option<Category>> {
        Ok(self.state.read().await.categories.get(&id).cloned())
    }

    async fn save_category(&self, category: &Category) -> Result<()> {
        let mut state = self.state.write().await;
        if state.categories.values().any(|c| c.slug == category.slug && c.id != category.id) {
            return Err(Error::Conflict(format!("Category slug '{}' already exists", category.slug)));
        }
        state.categories.insert(category.id, category.clone());
        Ok(())
    }

    async fn delete_category(&self, id: Uuid) -> Result<bool> {
        let mut state = self.state.write().await;
        let removed = state.categories.remove(&id).is_some();
        if removed {
            for product in state.products.values_mut().filter(|p| p.category_id == Some(id)) {
                product.category_id = None;
            }
        }
        Ok(removed)
    }

    async fn list_products(&self, query: &ProductQuery) -> Result<Page<Product>> {
        let state = self.state.read().await;
        let mut products: Vec<Product> = state.products.values()
            .filter(|p| query.status.map_or(true, |s| p.status == s))
            .filter(|p| query.category_id.map_or(true, |c| p.category_id == Some(c)))
            .filter(|p| query.featured.map_or(true, |f| p.featured == f))
            .filter(|p| query.search.as_deref().map_or(true, |s| matches_search(p, s)))
            .cloned()
            .collect();
        products.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(paginate(products, query.paging))
    }

    async fn get_product(&self, id: Uuid) -> Result<Option<Product>> {
        Ok(self.state.read().await.products.get(&id).cloned())
    }

    async fn get_products(&self, ids: &[Uuid]) -> Result<Vec<Product>> {
        let state = self.state.read().await;
        Ok(ids.iter().filter_map(|id| state.products.get(id).cloned()).collect())
    }

    async fn save_product(&self, product: &Product) -> Result<()> {
        let mut state = self.state.write().await;
        if state.products.values().any(|p| p.slug == product.slug && p.id != product.id) {
            return Err(Error::Conflict(format!("Product slug '{}' already exists", product.slug)));
        }
        state.products.insert(product.id, product.clone());
        Ok(())
    }

    async fn list_stores(&self, active_only: bool) -> Result<Vec<Store>> {
        let state = self.state.read().await;
        let mut stores: Vec<Store> = state.stores.values().filter(|s| !active_only || s.active).cloned().collect();
        stores.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(stores)
    }

    async fn get_store(&self, id: Uuid) -> Result<Option<Store>> {
        Ok(self.state.read().await.stores.get(&id).cloned())
    }

    async fn save_store(&self, store: &Store) -> Result<()> {
        self.state.write().await.stores.insert(store.id, store.clone());
        Ok(())
    }

    async fn delete_store(&self, id: Uuid) -> Result<bool> {
        let mut state = self.state.write().await;
        let removed = state.stores.remove(&id).is_some();
        if removed {
            for product in state.products.values_mut() {
                product.store_stock.retain(|s| s.store_id != id);
            }
        }
        Ok(removed)
    }

    async fn list_payment_methods(&self, active_only: bool) -> Result<Vec<PaymentMethod>> {
        let state = self.state.read().await;
        let mut methods: Vec<PaymentMethod> = state.payment_methods.values().filter(|m| !active_only || m.active).cloned().collect();
        methods.sort_by(|a, b| a.position.cmp(&b.position).then(a.name.cmp(&b.name)));
        Ok(methods)
    }

    async fn get_payment_method(&self, id: Uuid) -> Result<Option<PaymentMethod>> {
        Ok(self.state.read().await.payment_methods.get(&id).cloned())
    }

    async fn save_payment_method(&self, method: &PaymentMethod) -> Result<()> {
        self.state.write().await.payment_methods.insert(method.id, method.clone());
        Ok(())
    }

    async fn delete_payment_method(&self, id: Uuid) -> Result<bool> {
        Ok(self.state.write().await.payment_methods.remove(&id).is_some())
    }

    async fn get_settings(&self) -> Result<Option<Settings>> {
        Ok(self.state.read().await.settings.clone())
    }

    async fn save_settings(&self, settings: &Settings) -> Result<()> {
        self.state.write().await.settings = Some(settings.clone());
        Ok(())
    }

    async fn place_order(&self, order: &Order) -> Result<Vec<StockReservation>> {
        let mut state = self.state.write().await;
        // Check everything before touching anything.
        let mut staged: HashMap<Uuid, Product> = HashMap::new();
        for reservation in &order.reservations {
            let product = match staged.entry(reservation.product_id) {
                Entry::Occupied(e) => e.into_mut(),
                Entry::Vacant(e) => e.insert(state.products.get(&reservation.product_id).cloned().ok_or(Error::NotFound("Product"))?),
            };
            let name = product.name.clone();
            product.reserve(reservation).map_err(|e| Error::product(&name, e))?;
        }
        if state.orders.values().any(|o| o.order_number == order.order_number) {
            return Err(Error::Conflict(format!("Order number {} already used", order.order_number)));
        }
        let mut depleted: Vec<StockReservation> = Vec::new();
        for reservation in &order.reservations {
            let drained = staged.get(&reservation.product_id).is_some_and(|p| p.available(reservation.source) == 0);
            if drained && !depleted.iter().any(|d| d.product_id == reservation.product_id && d.source == reservation.source) {
                depleted.push(*reservation);
            }
        }
        state.products.extend(staged);
        state.orders.insert(order.id, order.clone());
        Ok(depleted)
    }

    async fn get_order(&self, id: Uuid) -> Result<Option<Order>> {
        Ok(self.state.read().await.orders.get(&id).cloned())
    }

    async fn list_orders(&self, query: &OrderQuery) -> Result<Page<Order>> {
        let state = self.state.read().await;
        let mut orders: Vec<Order> = state.orders.values()
            .filter(|o| query.status.map_or(true, |s| o.status == s))
            .filter(|o| query.customer_id.as_ref().map_or(true, |c| o.customer_id.as_ref() == Some(c)))
            .cloned()
            .collect();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(paginate(orders, query.paging))
    }

    async fn update_order(&self, order: &Order, previous: OrderStatus, release: &[StockReservation]) -> Result<()> {
        let mut state = self.state.write().await;
        match state.orders.get(&order.id) {
            None => return Err(Error::NotFound("Order")),
            Some(stored) if stored.status != previous => return Err(Error::Conflict("Order was changed concurrently".to_string())),
            Some(_) => {}
        }
        for reservation in release {
            // Stock for products deleted since the order was placed has nowhere to go.
            if let Some(product) = state.products.get_mut(&reservation.product_id) {
                product.release(reservation);
            }
        }
        state.orders.insert(order.id, order.clone());
        Ok(())
    }

    async fn get_cart(&self, session_id: &str) -> Result<Option<Cart>> {
        Ok(self.state.read().await.carts.get(session_id).cloned())
    }

    async fn save_cart(&self, cart: &Cart) -> Result<()> {
        self.state.write().await.carts.insert(cart.session_id.clone(), cart.clone());
        Ok(())
    }

    async fn delete_cart(&self, session_id: &str) -> Result<()> {
        self.state.write().await.carts.remove(session_id);
        Ok(())
    }
}
