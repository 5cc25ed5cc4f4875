use axum::{extract::{Path, Query, State}, http::StatusCode, Json};
use chrono::Utc;
use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::api::admin::money;
use crate::api::AppState;
use crate::domain::aggregates::{Category, Product, ProductStatus, Variant};
use crate::domain::pricing::{validate_offers, MultiBuyOffer};
use crate::domain::value_objects::{Quantity, Slug};
use crate::repo::{Page, Paging, ProductQuery};
use crate::{Error, Result};

#[derive(Debug, Default, Deserialize)]
pub struct AdminProductParams {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    pub status: Option<String>,
    pub category: Option<Uuid>,
    pub search: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct VariantRequest {
    /// Kept on update so existing carts keep pointing at the variant.
    pub id: Option<Uuid>,
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    pub price: Decimal,
    #[validate(length(max = 64))]
    pub sku: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ProductRequest {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    pub slug: Option<String>,
    #[validate(length(max = 5000))]
    pub description: Option<String>,
    pub price: Decimal,
    pub compare_at_price: Option<Decimal>,
    pub category_id: Option<Uuid>,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    #[validate]
    pub variants: Vec<VariantRequest>,
    #[serde(default)]
    pub offers: Vec<MultiBuyOffer>,
    /// Global stock; left unchanged on update when omitted.
    pub stock: Option<u32>,
    #[serde(default)]
    pub featured: bool,
    pub status: Option<ProductStatus>,
}

#[derive(Debug, Deserialize)]
pub struct StoreStockRequest { pub store_id: Uuid, pub stock: u32 }

#[derive(Debug, Deserialize)]
pub struct StockRequest {
    pub stock: Option<u32>,
    #[serde(default)]
    pub stores: Vec<StoreStockRequest>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CategoryRequest {
    #[validate(length(min = 1, max = 120))]
    pub name: String,
    pub slug: Option<String>,
    #[validate(length(max = 2000))]
    pub description: Option<String>,
    #[validate(url)]
    pub image_url: Option<String>,
}


impl ProductRequest {
    async fn check(&self, s: &AppState) -> Result<Slug> {
        self.validate()?;
        money("price", self.price)?;
        if let Some(compare) = self.compare_at_price {
            money("compare_at_price", compare)?;
        }
        for v in &self.variants {
            money("variant price", v.price)?;
        }
        validate_offers(&self.offers)?;
        for o in &self.offers {
            money("offer price", o.price)?;
        }
        if let Some(id) = self.category_id {
            s.repo.get_category(id).await?.ok_or(Error::NotFound("Category"))?;
        }
        Ok(Slug::new(self.slug.as_deref().unwrap_or(&self.name))?)
    }

    fn apply(self, product: &mut Product, slug: Slug) {
        product.name = self.name;
        product.slug = slug.into_inner();
        product.description = self.description;
        product.price = self.price;
        product.compare_at_price = self.compare_at_price;
        product.category_id = self.category_id;
        product.images = self.images;
        product.variants = self.variants.into_iter()
            .map(|v| Variant { id: v.id.unwrap_or_else(Uuid::new_v4), name: v.name, price: v.price, sku: v.sku })
            .collect();
        product.offers = self.offers;
        if let Some(stock) = self.stock {
            product.stock = Quantity::new(stock);
        }
        product.featured = self.featured;
        if let Some(status) = self.status {
            product.status = status;
        }
        product.touch();
    }
}

pub async fn list_products(State(s): State<AppState>, Query(p): Query<AdminProductParams>) -> Result<Json<Page<Product>>> {
    let status = match p.status.as_deref() {
        None | Some("") => None,
        Some(raw) => Some(ProductStatus::parse(raw).ok_or_else(|| Error::Validation(format!("Unknown product status: {raw}")))?),
    };
    let query = ProductQuery { status, category_id: p.category, featured: None, search: p.search, paging: Paging::new(p.page, p.per_page) };
    Ok(Json(s.repo.list_products(&query).await?))
}

pub async fn create_product(State(s): State<AppState>, Json(r): Json<ProductRequest>) -> Result<(StatusCode, Json<Product>)> {
    let slug = r.check(&s).await?;
    let mut product = Product::create(&r.name, slug.as_str(), r.price);
    r.apply(&mut product, slug);
    s.repo.save_product(&product).await?;
    tracing::info!(product_id = %product.id, name = %product.name, "product created");
    Ok((StatusCode::CREATED, Json(product)))
}

pub async fn update_product(State(s): State<AppState>, Path(id): Path<Uuid>, Json(r): Json<ProductRequest>) -> Result<Json<Product>> {
    let slug = r.check(&s).await?;
    let mut product = s.repo.get_product(id).await?.ok_or(Error::NotFound("Product"))?;
    r.apply(&mut product, slug);
    s.repo.save_product(&product).await?;
    Ok(Json(product))
}

/// Archives rather than deletes, so past orders keep resolving.
pub async fn delete_product(State(s): State<AppState>, Path(id): Path<Uuid>) -> Result<StatusCode> {
    let mut product = s.repo.get_product(id).await?.ok_or(Error::NotFound("Product"))?;
    product.archive();
    s.repo.save_product(&product).await?;
    tracing::info!(product_id = %id, "product archived");
    Ok(StatusCode::NO_CONTENT)
}

pub async fn set_stock(State(s): State<AppState>, Path(id): Path<Uuid>, Json(r): Json<StockRequest>) -> Result<Json<Product>> {
    let mut product = s.repo.get_product(id).await?.ok_or(Error::NotFound("Product"))?;
    for entry in &r.stores {
        s.repo.get_store(entry.store_id).await?.ok_or(Error::NotFound("Store"))?;
    }
    if let Some(stock) = r.stock {
        product.stock = Quantity::new(stock);
        product.touch();
    }
    for entry in r.stores {
        product.set_store_stock(entry.store_id, entry.stock);
    }
    s.repo.save_product(&product).await?;
    tracing::info!(product_id = %id, stock = product.stock.value(), stores = product.store_stock.len(), "stock updated");
    Ok(Json(product))
}

impl CategoryRequest {
    fn check(&self) -> Result<Slug> {
        self.validate()?;
        Ok(Slug::new(self.slug.as_deref().unwrap_or(&self.name))?)
    }

    fn apply(self, category: &mut Category, slug: Slug) {
        category.name = self.name;
        category.slug = slug.into_inner();
        category.description = self.description;
        category.image_url = self.image_url;
        category.updated_at = Utc::now();
    }
}

pub async fn create_category(State(s): State<AppState>, Json(r): Json<CategoryRequest>) -> Result<(StatusCode, Json<Category>)> {
    let slug = r.check()?;
    let mut category = Category::create(&r.name, slug.as_str());
    r.apply(&mut category, slug);
    s.repo.save_category(&category).await?;
    Ok((StatusCode::CREATED, Json(category)))
}

pub async fn update_category(State(s): State<AppState>, Path(id): Path<Uuid>, Json(r): Json<CategoryRequest>) -> Result<Json<Category>> {
    let slug = r.check()?;
    let mut category = s.repo.get_category(id).await?.ok_or(Error::NotFound("Category"))?;
    r.apply(&mut category, slug);
    s.repo.save_category(&category).await?;
    Ok(Json(category))
}

pub async fn delete_category(State(s): State<AppState>, Path(id): Path<Uuid>) -> Result<StatusCode> {
    if !s.repo.delete_category(id).await? {
        return Err(Error::NotFound("Category"));
    }
    Ok(StatusCode::NO_CONTENT)
}
