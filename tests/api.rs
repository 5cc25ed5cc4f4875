use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use chrono::Utc;
use jsonwebtoken::{encode, EncodingKey, Header};
use rust_decimal::Decimal;
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

use storefront::{
    api::{router, AppState},
    auth::{password, AuthKeys},
    domain::{
        aggregates::{Product, ProductStatus, Settings, Store},
        events::EventPublisher,
        pricing::MultiBuyOffer,
        value_objects::Quantity,
    },
    repo::{MemoryRepository, Repository},
    Config,
};

const IDP_SECRET: &str = "idp-test-secret";

struct TestApp {
    app: Router,
    repo: Arc<MemoryRepository>,
}

fn setup() -> TestApp {
    let hash = password::hash_password("hunter2").unwrap();
    let env = [
        ("ADMIN_EMAIL", "owner@duka.test".to_string()),
        ("ADMIN_PASSWORD_HASH", hash),
        ("ADMIN_JWT_SECRET", "admin-test-secret".to_string()),
        ("IDP_JWT_SECRET", IDP_SECRET.to_string()),
    ];
    let config = Config::from_lookup(|key| env.iter().find(|(k, _)| *k == key).map(|(_, v)| v.clone())).unwrap();
    let auth = AuthKeys::new(&config.admin, &config.identity).unwrap();
    let repo = Arc::new(MemoryRepository::new());
    let state = AppState {
        repo: repo.clone() as Arc<dyn Repository>,
        auth: Arc::new(auth),
        events: EventPublisher::default(),
    };
    TestApp { app: router(state), repo }
}

fn customer_token(sub: &str) -> String {
    let claims = json!({ "sub": sub, "email": format!("{sub}@mail.test"), "exp": Utc::now().timestamp() + 3600 });
    encode(&Header::default(), &claims, &EncodingKey::from_secret(IDP_SECRET.as_bytes())).unwrap()
}

async fn send(app: &Router, method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    let request = match body {
        Some(body) => builder.header("content-type", "application/json").body(Body::from(body.to_string())).unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap() };
    (status, value)
}

async fn admin_token(app: &Router) -> String {
    let (status, body) = send(app, "POST", "/api/v1/admin/login", None, Some(json!({"email": "owner@duka.test", "password": "hunter2"}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["token_type"], "Bearer");
    body["access_token"].as_str().unwrap().to_string()
}

async fn seed_soap(repo: &MemoryRepository, stock: u32) -> Product {
    let mut soap = Product::create("Bar Soap", "bar-soap", Decimal::new(50, 0));
    soap.stock = Quantity::new(stock);
    soap.offers = vec![MultiBuyOffer::new(3, Decimal::new(120, 0))];
    repo.save_product(&soap).await.unwrap();
    repo.save_settings(&Settings {
        shop_name: "Duka".into(),
        currency: "KES".into(),
        whatsapp_number: Some("+254 700 000 000".into()),
        delivery_fee: Decimal::new(100, 0),
        ..Settings::default()
    }).await.unwrap();
    soap
}

fn customer() -> Value {
    json!({"name": "Wanjiku", "phone": "0722 000 111", "address": "Moi Avenue"})
}

#[tokio::test]
async fn test_health() {
    let t = setup();
    let (status, body) = send(&t.app, "GET", "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": "healthy", "service": "storefront"}));
}

#[tokio::test]
async fn test_public_catalogue_hides_inactive_products() {
    let t = setup();
    let soap = seed_soap(&t.repo, 5).await;
    let mut draft = Product::create("Candle", "candle", Decimal::new(80, 0));
    draft.status = ProductStatus::Draft;
    t.repo.save_product(&draft).await.unwrap();

    let (status, body) = send(&t.app, "GET", "/api/v1/products?search=SOAP", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 1);
    assert_eq!(body["data"][0]["id"], soap.id.to_string());

    let (status, body) = send(&t.app, "GET", "/api/v1/products", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 1);

    let (status, body) = send(&t.app, "GET", &format!("/api/v1/products/{}", draft.id), None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Product not found");
}

#[tokio::test]
async fn test_checkout_prices_offers_and_builds_whatsapp_link() {
    let t = setup();
    let soap = seed_soap(&t.repo, 10).await;

    let (status, body) = send(&t.app, "POST", "/api/v1/checkout", None, Some(json!({
        "customer": customer(),
        "items": [{"product_id": soap.id, "quantity": 7}],
    }))).await;
    assert_eq!(status, StatusCode::CREATED);

    // 7 = two bundles of 3 for 120 plus one at 50
    let order = &body["order"];
    assert_eq!(order["items"][0]["total"].as_f64(), Some(290.0));
    assert_eq!(order["items"][0]["savings"].as_f64(), Some(60.0));
    assert_eq!(order["subtotal"].as_f64(), Some(290.0));
    assert_eq!(order["delivery_fee"].as_f64(), Some(100.0));
    assert_eq!(order["total"].as_f64(), Some(390.0));
    assert_eq!(order["status"], "pending");
    assert!(order["order_number"].as_str().unwrap().starts_with("ORD-"));
    assert!(order["customer_id"].is_null());

    let message = body["message"].as_str().unwrap();
    assert!(message.starts_with("Hello Duka"));
    assert!(message.contains("7 x Bar Soap = KES 290.00"));
    let url = body["whatsapp_url"].as_str().unwrap();
    assert!(url.starts_with("https://wa.me/254700000000?text=Hello%20Duka"));

    assert_eq!(t.repo.get_product(soap.id).await.unwrap().unwrap().stock.value(), 3);
}

#[tokio::test]
async fn test_checkout_insufficient_stock_is_conflict() {
    let t = setup();
    let soap = seed_soap(&t.repo, 2).await;

    let (status, body) = send(&t.app, "POST", "/api/v1/checkout", None, Some(json!({
        "customer": customer(),
        "items": [{"product_id": soap.id, "quantity": 3}],
    }))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["error"].as_str().unwrap().contains("Insufficient stock for Bar Soap"));
    assert_eq!(t.repo.get_product(soap.id).await.unwrap().unwrap().stock.value(), 2);
}

#[tokio::test]
async fn test_checkout_validation() {
    let t = setup();
    let soap = seed_soap(&t.repo, 2).await;

    let (status, _) = send(&t.app, "POST", "/api/v1/checkout", None, Some(json!({"customer": customer()}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&t.app, "POST", "/api/v1/checkout", None, Some(json!({
        "customer": {"name": "Wanjiku", "phone": "call me"},
        "items": [{"product_id": soap.id, "quantity": 1}],
    }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&t.app, "POST", "/api/v1/checkout", Some("not-a-token"), Some(json!({
        "customer": customer(),
        "items": [{"product_id": soap.id, "quantity": 1}],
    }))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_cart_then_checkout_from_session() {
    let t = setup();
    let soap = seed_soap(&t.repo, 10).await;
    let item = json!({"product_id": soap.id, "quantity": 2});

    send(&t.app, "POST", "/api/v1/cart/sess-1/items", None, Some(item.clone())).await;
    let (status, view) = send(&t.app, "POST", "/api/v1/cart/sess-1/items", None, Some(item)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(view["lines"].as_array().unwrap().len(), 1);
    assert_eq!(view["item_count"], 4);
    assert_eq!(view["subtotal"].as_f64(), Some(170.0));
    assert_eq!(view["currency"], "KES");

    let (status, view) = send(&t.app, "PUT", "/api/v1/cart/sess-1/items", None, Some(json!({"product_id": soap.id, "quantity": 3}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(view["subtotal"].as_f64(), Some(120.0));

    let (status, _) = send(&t.app, "PUT", "/api/v1/cart/sess-1/items", None, Some(json!({"product_id": Uuid::new_v4(), "quantity": 1}))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = send(&t.app, "POST", "/api/v1/checkout", None, Some(json!({"customer": customer(), "session_id": "sess-1"}))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["order"]["items"][0]["quantity"], 3);

    let (_, view) = send(&t.app, "GET", "/api/v1/cart/sess-1", None, None).await;
    assert_eq!(view["lines"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_admin_routes_require_admin_token() {
    let t = setup();

    let (status, _) = send(&t.app, "GET", "/api/v1/admin/orders", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(&t.app, "GET", "/api/v1/admin/orders", Some(&customer_token("amina")), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(&t.app, "POST", "/api/v1/admin/login", None, Some(json!({"email": "owner@duka.test", "password": "wrong"}))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let token = admin_token(&t.app).await;
    let (status, body) = send(&t.app, "GET", "/api/v1/admin/orders", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 0);
}

#[tokio::test]
async fn test_admin_product_lifecycle() {
    let t = setup();
    let token = admin_token(&t.app).await;
    let product = json!({
        "name": "Green Tea", "price": 200, "stock": 12,
        "offers": [{"quantity": 2, "price": 350}],
        "variants": [{"name": "Loose leaf", "price": 260}],
    });

    let (status, created) = send(&t.app, "POST", "/api/v1/admin/products", Some(&token), Some(product.clone())).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["slug"], "green-tea");
    assert_eq!(created["stock"], 12);
    let id = created["id"].as_str().unwrap().to_string();

    let (status, _) = send(&t.app, "POST", "/api/v1/admin/products", Some(&token), Some(product)).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = send(&t.app, "POST", "/api/v1/admin/products", Some(&token), Some(json!({
        "name": "Bad offer", "price": 10, "offers": [{"quantity": 1, "price": 5}],
    }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let mut store = Store::create("Westlands");
    store.whatsapp = Some("+254711000000".into());
    t.repo.save_store(&store).await.unwrap();
    let (status, stocked) = send(&t.app, "PUT", &format!("/api/v1/admin/products/{id}/stock"), Some(&token), Some(json!({
        "stores": [{"store_id": store.id, "stock": 4}],
    }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stocked["store_stock"][0]["stock"], 4);

    let (status, _) = send(&t.app, "DELETE", &format!("/api/v1/admin/products/{id}"), Some(&token), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = send(&t.app, "GET", &format!("/api/v1/products/{id}"), None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (_, listed) = send(&t.app, "GET", "/api/v1/admin/products?status=archived", Some(&token), None).await;
    assert_eq!(listed["total"], 1);
}

#[tokio::test]
async fn test_store_checkout_and_cancel_restocks() {
    let t = setup();
    let token = admin_token(&t.app).await;
    let mut soap = seed_soap(&t.repo, 10).await;
    let mut store = Store::create("Westlands");
    store.whatsapp = Some("+254711000000".into());
    t.repo.save_store(&store).await.unwrap();
    soap.set_store_stock(store.id, 5);
    t.repo.save_product(&soap).await.unwrap();

    let (status, body) = send(&t.app, "POST", "/api/v1/checkout", None, Some(json!({
        "customer": customer(), "store_id": store.id,
        "items": [{"product_id": soap.id, "quantity": 4}],
    }))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert!(body["whatsapp_url"].as_str().unwrap().starts_with("https://wa.me/254711000000?"));
    let order_id = body["order"]["id"].as_str().unwrap().to_string();

    let stored = t.repo.get_product(soap.id).await.unwrap().unwrap();
    assert_eq!(stored.store_stock[0].stock.value(), 1);
    assert_eq!(stored.stock.value(), 10);

    let uri = format!("/api/v1/admin/orders/{order_id}/status");
    let (status, _) = send(&t.app, "PUT", &uri, Some(&token), Some(json!({"status": "delivered"}))).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, order) = send(&t.app, "PUT", &uri, Some(&token), Some(json!({"status": "cancelled"}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(order["status"], "cancelled");
    assert_eq!(t.repo.get_product(soap.id).await.unwrap().unwrap().store_stock[0].stock.value(), 5);

    let (status, _) = send(&t.app, "PUT", &uri, Some(&token), Some(json!({"status": "bogus"}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_customer_sees_only_own_orders() {
    let t = setup();
    let soap = seed_soap(&t.repo, 10).await;
    let amina = customer_token("amina");
    let baraka = customer_token("baraka");

    let (status, _) = send(&t.app, "GET", "/api/v1/me", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, me) = send(&t.app, "GET", "/api/v1/me", Some(&amina), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["sub"], "amina");

    let checkout = json!({"customer": customer(), "items": [{"product_id": soap.id, "quantity": 1}]});
    let (_, placed) = send(&t.app, "POST", "/api/v1/checkout", Some(&amina), Some(checkout.clone())).await;
    assert_eq!(placed["order"]["customer_id"], "amina");
    assert_eq!(placed["order"]["customer"]["email"], "amina@mail.test");
    send(&t.app, "POST", "/api/v1/checkout", Some(&baraka), Some(checkout.clone())).await;
    send(&t.app, "POST", "/api/v1/checkout", None, Some(checkout)).await;

    let (status, mine) = send(&t.app, "GET", "/api/v1/me/orders", Some(&amina), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(mine["total"], 1);

    let order_id = placed["order"]["id"].as_str().unwrap();
    let (status, _) = send(&t.app, "GET", &format!("/api/v1/me/orders/{order_id}"), Some(&amina), None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = send(&t.app, "GET", &format!("/api/v1/me/orders/{order_id}"), Some(&baraka), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_settings_and_shop_listings() {
    let t = setup();
    let token = admin_token(&t.app).await;

    let (_, settings) = send(&t.app, "GET", "/api/v1/settings", None, None).await;
    assert_eq!(settings["shop_name"], "Storefront");

    let (status, _) = send(&t.app, "PUT", "/api/v1/admin/settings", Some(&token), Some(json!({
        "shop_name": "Duka", "currency": "kes", "whatsapp_number": "not a number",
    }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, settings) = send(&t.app, "PUT", "/api/v1/admin/settings", Some(&token), Some(json!({
        "shop_name": "Duka", "currency": "kes", "delivery_fee": 150,
    }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(settings["currency"], "KES");

    send(&t.app, "POST", "/api/v1/admin/payment-methods", Some(&token), Some(json!({"name": "Cash", "position": 2}))).await;
    send(&t.app, "POST", "/api/v1/admin/payment-methods", Some(&token), Some(json!({"name": "M-Pesa", "instructions": "Till 123456", "position": 1}))).await;
    send(&t.app, "POST", "/api/v1/admin/payment-methods", Some(&token), Some(json!({"name": "Cheque", "active": false}))).await;

    let (_, methods) = send(&t.app, "GET", "/api/v1/payment-methods", None, None).await;
    let names: Vec<&str> = methods.as_array().unwrap().iter().map(|m| m["name"].as_str().unwrap()).collect();
    assert_eq!(names, ["M-Pesa", "Cash"]);

    let (status, store) = send(&t.app, "POST", "/api/v1/admin/stores", Some(&token), Some(json!({"name": "CBD", "active": false}))).await;
    assert_eq!(status, StatusCode::CREATED);
    let (_, stores) = send(&t.app, "GET", "/api/v1/stores", None, None).await;
    assert_eq!(stores.as_array().unwrap().len(), 0);

    let (status, _) = send(&t.app, "DELETE", &format!("/api/v1/admin/stores/{}", store["id"].as_str().unwrap()), Some(&token), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = send(&t.app, "DELETE", &format!("/api/v1/admin/stores/{}", Uuid::new_v4()), Some(&token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_cart_line_quantity_is_capped() {
    let t = setup();
    let soap = seed_soap(&t.repo, 10).await;

    let (status, _) = send(&t.app, "POST", "/api/v1/cart/bulk/items", None, Some(json!({"product_id": soap.id, "quantity": 10000}))).await;
    assert_eq!(status, StatusCode::OK);
    let (status, body) = send(&t.app, "POST", "/api/v1/cart/bulk/items", None, Some(json!({"product_id": soap.id, "quantity": 10000}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Quantity per line cannot exceed 10000");

    let (status, view) = send(&t.app, "GET", "/api/v1/cart/bulk", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(view["item_count"], 10000);
}

#[tokio::test]
async fn test_admin_rejects_amounts_that_cannot_be_stored() {
    let t = setup();
    let token = admin_token(&t.app).await;

    for price in [json!(1.0049), json!(99_999_999_999_999_999u64), json!(-5)] {
        let (status, _) = send(&t.app, "POST", "/api/v1/admin/products", Some(&token), Some(json!({"name": "Lamp", "price": price}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "price {price}");
    }
    let (status, body) = send(&t.app, "POST", "/api/v1/admin/products", Some(&token), Some(json!({
        "name": "Lamp", "price": 20, "offers": [{"quantity": 2, "price": 35.555}],
    }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "offer price must have at most 2 decimal places");

    let (status, created) = send(&t.app, "POST", "/api/v1/admin/products", Some(&token), Some(json!({"name": "Lamp", "price": 19.99}))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["price"].as_f64(), Some(19.99));

    let (status, body) = send(&t.app, "PUT", "/api/v1/admin/settings", Some(&token), Some(json!({
        "shop_name": "Duka", "currency": "KES", "delivery_fee": 1.005,
    }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "delivery_fee must have at most 2 decimal places");
}
