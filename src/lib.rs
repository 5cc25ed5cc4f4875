//! Storefront Platform
//!
//! Backend for a small shop that sells over WhatsApp.
//!
//! ## Features
//! - Product catalogue with variants, multi-buy offers and per-store stock
//! - Server-side carts priced live against the catalogue
//! - Checkout that reserves stock and hands the order off to WhatsApp
//! - Customer accounts verified against an external identity provider
//! - Admin API for products, categories, orders, payment methods, stores and settings

pub mod api;
pub mod auth;
pub mod config;
pub mod domain;
pub mod repo;
pub mod services;

use axum::{http::StatusCode, response::{IntoResponse, Response}, Json};
use thiserror::Error;

use crate::domain::aggregates::{CartError, OrderError, ProductError};
use crate::domain::pricing::OfferError;
use crate::domain::value_objects::{PhoneError, SlugError};

pub use config::Config;

// =============================================================================
// Error Types
// =============================================================================

#[derive(Error, Debug)]
pub enum Error {
    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("{0}")]
    Validation(String),

    #[error("Insufficient stock for {product}: requested {requested}, available {available}")]
    InsufficientStock { product: String, requested: u32, available: u32 },

    #[error("{0}")]
    Conflict(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Forbidden")]
    Forbidden,

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Attaches the product name to an aggregate-level product error.
    pub fn product(name: &str, err: ProductError) -> Self {
        match err {
            ProductError::InsufficientStock { requested, available } => {
                Self::InsufficientStock { product: name.to_string(), requested, available }
            }
            other => Self::Validation(format!("{name}: {other}")),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::InsufficientStock { .. } | Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::Storage(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            Self::Storage(detail) | Self::Internal(detail) => {
                tracing::error!(error = %detail, "request failed");
                "Internal server error".to_string()
            }
            _ => self.to_string(),
        };
        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}

impl From<sqlx::Error> for Error {
    fn from(e: sqlx::Error) -> Self { Self::Storage(e.to_string()) }
}

impl From<validator::ValidationErrors> for Error {
    fn from(e: validator::ValidationErrors) -> Self { Self::Validation(e.to_string()) }
}

impl From<OrderError> for Error {
    fn from(e: OrderError) -> Self {
        match e {
            OrderError::NoItems => Self::Validation(e.to_string()),
            OrderError::InvalidTransition { .. } => Self::Conflict(e.to_string()),
        }
    }
}

impl From<CartError> for Error {
    fn from(e: CartError) -> Self {
        match e {
            CartError::ItemNotFound => Self::NotFound("Cart item"),
            CartError::QuantityTooLarge { .. } => Self::Validation(e.to_string()),
        }
    }
}

impl From<OfferError> for Error {
    fn from(e: OfferError) -> Self { Self::Validation(e.to_string()) }
}

impl From<SlugError> for Error {
    fn from(e: SlugError) -> Self { Self::Validation(e.to_string()) }
}

impl From<PhoneError> for Error {
    fn from(e: PhoneError) -> Self { Self::Validation(e.to_string()) }
}
