//! HTTP surface, mounted under `/api/v1`

pub mod account;
pub mod admin;
pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod shop;

use std::sync::Arc;

use axum::{extract::FromRef, routing::get, Json, Router};
use serde::Deserialize;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::auth::AuthKeys;
use crate::domain::events::EventPublisher;
use crate::repo::{Paging, Repository};

#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<dyn Repository>,
    pub auth: Arc<AuthKeys>,
    pub events: EventPublisher,
}

impl FromRef<AppState> for Arc<AuthKeys> {
    fn from_ref(state: &AppState) -> Self { state.auth.clone() }
}

/// `?page=&per_page=`, shared by every paginated listing.
#[derive(Debug, Default, Deserialize)]
pub struct PageParams { pub page: Option<u32>, pub per_page: Option<u32> }

impl From<&PageParams> for Paging {
    fn from(p: &PageParams) -> Self { Paging::new(p.page, p.per_page) }
}

pub fn router(state: AppState) -> Router {
    let api = Router::new()
        .merge(catalog::routes())
        .merge(shop::routes())
        .merge(cart::routes())
        .merge(checkout::routes())
        .merge(account::routes())
        .nest("/admin", admin::routes(state.auth.clone()));

    Router::new()
        .route("/health", get(|| async { Json(serde_json::json!({"status": "healthy", "service": "storefront"})) }))
        .nest("/api/v1", api)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
