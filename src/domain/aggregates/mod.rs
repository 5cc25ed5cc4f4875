//! Aggregates module
pub mod cart;
pub mod category;
pub mod order;
pub mod payment_method;
pub mod product;
pub mod settings;
pub mod store;

pub use cart::{Cart, CartError, CartItem, CartView, MAX_LINE_QUANTITY};
pub use category::Category;
pub use order::{CustomerDetails, LineItem, Order, OrderError, OrderStatus};
pub use payment_method::PaymentMethod;
pub use product::{Product, ProductError, ProductStatus, StockReservation, StockSource, StoreStock, Variant};
pub use settings::Settings;
pub use store::Store;
