//! Public catalogue: products and categories

use axum::{extract::{Path, Query, State}, routing::get, Json, Router};
use serde::Deserialize;
use uuid::Uuid;

use crate::api::{AppState, PageParams};
use crate::domain::aggregates::{Category, Product, ProductStatus};
use crate::repo::{Page, ProductQuery};
use crate::{Error, Result};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/products", get(list_products))
        .route("/products/:id", get(get_product))
        .route("/categories", get(list_categories))
        .route("/categories/:id", get(get_category))
}

#[derive(Debug, Default, Deserialize)]
pub struct ProductListParams {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    pub category: Option<Uuid>,
    pub search: Option<String>,
    pub featured: Option<bool>,
}

async fn list_products(State(s): State<AppState>, Query(p): Query<ProductListParams>) -> Result<Json<Page<Product>>> {
    let query = ProductQuery {
        status: Some(ProductStatus::Active),
        category_id: p.category,
        featured: p.featured,
        search: p.search.filter(|q| !q.trim().is_empty()),
        paging: (&PageParams { page: p.page, per_page: p.per_page }).into(),
    };
    Ok(Json(s.repo.list_products(&query).await?))
}

async fn get_product(State(s): State<AppState>, Path(id): Path<Uuid>) -> Result<Json<Product>> {
    s.repo.get_product(id).await?.filter(Product::is_active).map(Json).ok_or(Error::NotFound("Product"))
}

async fn list_categories(State(s): State<AppState>) -> Result<Json<Vec<Category>>> {
    Ok(Json(s.repo.list_categories().await?))
}

async fn get_category(State(s): State<AppState>, Path(id): Path<Uuid>) -> Result<Json<Category>> {
    s.repo.get_category(id).await?.map(Json).ok_or(Error::NotFound("Category"))
}
