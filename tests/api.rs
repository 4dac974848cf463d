use std::sync::Arc;

use axum::{body::Body, http::{Method, Request, StatusCode}, Router};
use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use serde_json::{json, Value};
use tower::ServiceExt;

use storefront::api::{router, AppState};
use storefront::config::Config;
use storefront::events::EventPublisher;
use storefront::store::MemoryStore;

fn app() -> Router {
    app_with(Config::default())
}

fn app_with(config: Config) -> Router {
    router(AppState::new(Arc::new(MemoryStore::new()), EventPublisher::disabled(), config))
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let request = Request::builder().method(method).uri(uri).header("content-type", "application/json");
    let request = match body {
        Some(body) => request.body(Body::from(body.to_string())).unwrap(),
        None => request.body(Body::empty()).unwrap(),
    };
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap() };
    (status, value)
}

async fn create_product(app: &Router, sku: &str, price: f64, inventory: u32) -> String {
    let (status, body) = send(app, Method::POST, "/api/v1/products", Some(json!({
        "sku": sku, "name": format!("Product {sku}"), "price": price, "inventory": inventory,
    }))).await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body["id"].as_str().unwrap().to_string()
}

async fn create_discount(app: &Router, body: Value) -> String {
    let (status, body) = send(app, Method::POST, "/api/v1/discounts", Some(body)).await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body["id"].as_str().unwrap().to_string()
}

fn live_window() -> (String, String) {
    ((Utc::now() - Duration::days(1)).to_rfc3339(), (Utc::now() + Duration::days(1)).to_rfc3339())
}

fn address() -> Value {
    json!({ "fullName": "Ada Lovelace", "line1": "1 Analytical Way", "city": "London", "postalCode": "N1 9GU", "country": "gb" })
}

#[tokio::test]
async fn test_health() {
    let (status, body) = send(&app(), Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn test_product_without_discount_keeps_base_price() {
    let app = app();
    let id = create_product(&app, "tee-1", 25.0, 5).await;
    let (status, body) = send(&app, Method::GET, &format!("/api/v1/products/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["sku"], "TEE-1");
    assert_eq!(body["finalPrice"].as_f64(), Some(25.0));
    assert!(body["discountInfo"].is_null());
}

#[tokio::test]
async fn test_percentage_discount_is_applied_to_listing() {
    let app = app();
    let id = create_product(&app, "shoe-1", 100.0, 5).await;
    let (start, end) = live_window();
    create_discount(&app, json!({
        "title": "Spring sale", "type": "percentage", "value": 20,
        "applicableProducts": [id], "startDate": start, "endDate": end,
    })).await;

    let (status, body) = send(&app, Method::GET, "/api/v1/products", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 1);
    let product = &body["data"][0];
    assert_eq!(product["finalPrice"].as_f64(), Some(80.0));
    assert_eq!(product["discountInfo"]["discountAmount"].as_f64(), Some(20.0));
    assert_eq!(product["discountInfo"]["discount"]["type"], "percentage");
}

#[tokio::test]
async fn test_expired_discount_never_applies() {
    let app = app();
    let id = create_product(&app, "hat-1", 40.0, 5).await;
    create_discount(&app, json!({
        "title": "Last year", "type": "fixed", "value": 10,
        "startDate": (Utc::now() - Duration::days(30)).to_rfc3339(),
        "endDate": (Utc::now() - Duration::days(1)).to_rfc3339(),
    })).await;

    let (_, body) = send(&app, Method::GET, &format!("/api/v1/products/{id}"), None).await;
    assert_eq!(body["finalPrice"].as_f64(), Some(40.0));
    let (_, active) = send(&app, Method::GET, "/api/v1/discounts/active", None).await;
    assert_eq!(active.as_array().map(Vec::len), Some(0));
}

#[tokio::test]
async fn test_home_discounts_filter() {
    let app = app();
    let (start, end) = live_window();
    create_discount(&app, json!({ "title": "Banner", "type": "fixed", "value": 5, "startDate": start, "endDate": end, "showOnHomePage": true })).await;
    create_discount(&app, json!({ "title": "Quiet", "type": "fixed", "value": 5, "startDate": start, "endDate": end })).await;

    let (_, home) = send(&app, Method::GET, "/api/v1/discounts/home", None).await;
    let titles: Vec<&str> = home.as_array().unwrap().iter().filter_map(|d| d["title"].as_str()).collect();
    assert_eq!(titles, vec!["Banner"]);
}

#[tokio::test]
async fn test_invalid_discounts_are_rejected() {
    let app = app();
    let (start, end) = live_window();
    let (status, _) = send(&app, Method::POST, "/api/v1/discounts", Some(json!({
        "title": "Too much", "type": "percentage", "value": 150, "startDate": start, "endDate": end,
    }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&app, Method::POST, "/api/v1/discounts", Some(json!({
        "title": "Backwards", "type": "fixed", "value": 5, "startDate": end, "endDate": start,
    }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_missing_resources_are_not_found() {
    let app = app();
    let id = uuid::Uuid::now_v7();
    for uri in [format!("/api/v1/products/{id}"), format!("/api/v1/discounts/{id}"), format!("/api/v1/orders/{id}")] {
        let (status, body) = send(&app, Method::GET, &uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{uri}");
        assert!(body["error"].is_string());
    }
}

#[tokio::test]
async fn test_cart_merges_lines_and_prices_them() {
    let app = app();
    let id = create_product(&app, "mug-1", 12.5, 10).await;
    let uri = "/api/v1/cart/session-1";
    send(&app, Method::POST, uri, Some(json!({ "productId": id, "quantity": 1 }))).await;
    let (status, cart) = send(&app, Method::POST, uri, Some(json!({ "productId": id, "quantity": 2 }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cart["lines"].as_array().map(Vec::len), Some(1));
    assert_eq!(cart["itemCount"], 3);
    assert_eq!(cart["subtotal"].as_f64(), Some(37.5));

    let (status, cart) = send(&app, Method::PUT, &format!("{uri}/items/{id}"), Some(json!({ "quantity": 0 }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cart["lines"].as_array().map(Vec::len), Some(0));
}

#[tokio::test]
async fn test_cart_rejects_unknown_size() {
    let app = app();
    let (_, body) = send(&app, Method::POST, "/api/v1/products", Some(json!({
        "sku": "jacket", "name": "Jacket", "price": 80, "sizes": ["S", "M"], "inventory": 3,
    }))).await;
    let id = body["id"].as_str().unwrap();
    let (status, _) = send(&app, Method::POST, "/api/v1/cart/s", Some(json!({ "productId": id, "size": "XL", "quantity": 1 }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, _) = send(&app, Method::POST, "/api/v1/cart/s", Some(json!({ "productId": id, "size": "M", "quantity": 1 }))).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_cart_sizes_ignore_case() {
    let app = app();
    let (_, body) = send(&app, Method::POST, "/api/v1/products", Some(json!({
        "sku": "boot", "name": "Boot", "price": 60, "sizes": ["S", "M"], "inventory": 5,
    }))).await;
    let id = body["id"].as_str().unwrap();
    send(&app, Method::POST, "/api/v1/cart/feet", Some(json!({ "productId": id, "size": "m", "quantity": 1 }))).await;
    let (status, cart) = send(&app, Method::POST, "/api/v1/cart/feet", Some(json!({ "productId": id, "size": "M", "quantity": 2 }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cart["lines"].as_array().map(Vec::len), Some(1));
    assert_eq!(cart["lines"][0]["size"], "M");
    assert_eq!(cart["lines"][0]["quantity"], 3);

    let (status, cart) = send(&app, Method::DELETE, &format!("/api/v1/cart/feet/items/{id}?size=m"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cart["lines"].as_array().map(Vec::len), Some(0));
}

#[tokio::test]
async fn test_oversized_price_is_rejected() {
    let app = app();
    let (status, body) = send(&app, Method::POST, "/api/v1/products", Some(json!({
        "sku": "yacht", "name": "Yacht", "price": 1e28, "inventory": 1,
    }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");

    let id = create_product(&app, "dinghy", 100.0, 1).await;
    let (status, _) = send(&app, Method::PUT, &format!("/api/v1/products/{id}"), Some(json!({
        "sku": "dinghy", "name": "Dinghy", "price": 1e28,
    }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, body) = send(&app, Method::GET, "/api/v1/products", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"][0]["price"].as_f64(), Some(100.0));
}

#[tokio::test]
async fn test_category_discount_only_reaches_its_category() {
    let app = app();
    let (status, category) = send(&app, Method::POST, "/api/v1/categories", Some(json!({ "name": "Outerwear" }))).await;
    assert_eq!(status, StatusCode::CREATED);
    let category_id = category["id"].as_str().unwrap();
    let (status, coat) = send(&app, Method::POST, "/api/v1/products", Some(json!({
        "sku": "coat", "name": "Coat", "price": 200, "categoryId": category_id, "inventory": 2,
    }))).await;
    assert_eq!(status, StatusCode::CREATED);
    let coat_id = coat["id"].as_str().unwrap();
    let sock_id = create_product(&app, "sock", 8.0, 20).await;
    let (start, end) = live_window();
    create_discount(&app, json!({
        "title": "Outerwear week", "type": "percentage", "value": 25,
        "applicableCategories": [category_id], "startDate": start, "endDate": end,
    })).await;

    let (_, coat) = send(&app, Method::GET, &format!("/api/v1/products/{coat_id}"), None).await;
    assert_eq!(coat["finalPrice"].as_f64(), Some(150.0));
    assert_eq!(coat["discountInfo"]["discount"]["title"], "Outerwear week");
    let (_, sock) = send(&app, Method::GET, &format!("/api/v1/products/{sock_id}"), None).await;
    assert_eq!(sock["finalPrice"].as_f64(), Some(8.0));
    assert!(sock["discountInfo"].is_null());
}

#[tokio::test]
async fn test_best_of_several_discounts_wins() {
    let app = app();
    let id = create_product(&app, "kettle", 40.0, 5).await;
    let (start, end) = live_window();
    create_discount(&app, json!({ "title": "Five off", "type": "fixed", "value": 5, "startDate": start, "endDate": end })).await;
    create_discount(&app, json!({ "title": "Quarter off", "type": "percentage", "value": 25, "startDate": start, "endDate": end })).await;
    create_discount(&app, json!({ "title": "Two off", "type": "fixed", "value": 2, "startDate": start, "endDate": end })).await;

    let (_, body) = send(&app, Method::GET, "/api/v1/products", None).await;
    let product = &body["data"][0];
    assert_eq!(product["id"], id.as_str());
    assert_eq!(product["finalPrice"].as_f64(), Some(30.0));
    assert_eq!(product["discountInfo"]["discount"]["title"], "Quarter off");

    // 25% of 40 is 10; the newer fixed 10 ties and takes over.
    create_discount(&app, json!({ "title": "Ten off", "type": "fixed", "value": 10, "startDate": start, "endDate": end })).await;
    let (_, product) = send(&app, Method::GET, &format!("/api/v1/products/{id}"), None).await;
    assert_eq!(product["finalPrice"].as_f64(), Some(30.0));
    assert_eq!(product["discountInfo"]["discount"]["title"], "Ten off");
}

#[tokio::test]
async fn test_checkout_places_order_and_decrements_inventory() {
    let mut config = Config::default();
    config.shipping.fee = Decimal::new(5, 0);
    let app = app_with(config);
    let id = create_product(&app, "lamp-1", 50.0, 3).await;
    let (start, end) = live_window();
    create_discount(&app, json!({ "title": "Ten off", "type": "fixed", "value": 10, "startDate": start, "endDate": end })).await;
    send(&app, Method::POST, "/api/v1/cart/checkout-1", Some(json!({ "productId": id, "quantity": 2 }))).await;

    let (status, order) = send(&app, Method::POST, "/api/v1/checkout", Some(json!({
        "sessionId": "checkout-1", "customerId": "cust-1", "email": "ada@example.com", "shippingAddress": address(),
    }))).await;
    assert_eq!(status, StatusCode::CREATED, "{order}");
    assert_eq!(order["status"], "pending");
    assert_eq!(order["currency"], "USD");
    assert_eq!(order["subtotal"].as_f64(), Some(100.0));
    assert_eq!(order["discountTotal"].as_f64(), Some(20.0));
    assert_eq!(order["shipping"].as_f64(), Some(5.0));
    assert_eq!(order["total"].as_f64(), Some(85.0));
    assert_eq!(order["items"][0]["discountTitle"], "Ten off");

    let (_, product) = send(&app, Method::GET, &format!("/api/v1/products/{id}"), None).await;
    assert_eq!(product["inventory"], 1);
    let (_, cart) = send(&app, Method::GET, "/api/v1/cart/checkout-1", None).await;
    assert_eq!(cart["lines"].as_array().map(Vec::len), Some(0));

    let (_, orders) = send(&app, Method::GET, "/api/v1/orders?customer=cust-1", None).await;
    assert_eq!(orders.as_array().map(Vec::len), Some(1));
}

#[tokio::test]
async fn test_order_total_matches_cart_quote() {
    let app = app();
    let id = create_product(&app, "pen-1", 10.10, 4).await;
    let (start, end) = live_window();
    create_discount(&app, json!({ "title": "Nickel off", "type": "percentage", "value": 5, "startDate": start, "endDate": end })).await;
    let (_, cart) = send(&app, Method::POST, "/api/v1/cart/pens", Some(json!({ "productId": id, "quantity": 1 }))).await;
    assert_eq!(cart["total"].as_f64(), Some(9.6));

    let (status, order) = send(&app, Method::POST, "/api/v1/checkout", Some(json!({
        "sessionId": "pens", "customerId": "p", "email": "p@example.com", "shippingAddress": address(),
    }))).await;
    assert_eq!(status, StatusCode::CREATED, "{order}");
    for field in ["currency", "subtotal", "discountTotal", "shipping", "total"] {
        assert_eq!(order[field], cart[field], "{field}");
    }
    assert_eq!(order["discountTotal"].as_f64(), Some(0.5));
    assert_eq!(order["items"][0]["total"].as_f64(), Some(9.6));
}

#[tokio::test]
async fn test_checkout_failures() {
    let app = app();
    let (status, _) = send(&app, Method::POST, "/api/v1/checkout", Some(json!({
        "sessionId": "nobody", "customerId": "c", "email": "c@example.com", "shippingAddress": address(),
    }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let id = create_product(&app, "rare-1", 10.0, 1).await;
    send(&app, Method::POST, "/api/v1/cart/greedy", Some(json!({ "productId": id, "quantity": 2 }))).await;
    let (status, _) = send(&app, Method::POST, "/api/v1/checkout", Some(json!({
        "sessionId": "greedy", "customerId": "c", "email": "c@example.com", "shippingAddress": address(),
    }))).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = send(&app, Method::POST, "/api/v1/checkout", Some(json!({
        "sessionId": "greedy", "customerId": "c", "email": "c@example.com",
    }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_cancelling_order_restocks() {
    let app = app();
    let id = create_product(&app, "book-1", 15.0, 4).await;
    send(&app, Method::POST, "/api/v1/cart/reader", Some(json!({ "productId": id, "quantity": 3 }))).await;
    let (_, order) = send(&app, Method::POST, "/api/v1/checkout", Some(json!({
        "sessionId": "reader", "customerId": "r", "email": "r@example.com", "shippingAddress": address(),
    }))).await;
    let order_id = order["id"].as_str().unwrap();

    let (status, _) = send(&app, Method::POST, &format!("/api/v1/orders/{order_id}/status"), Some(json!({ "status": "delivered" }))).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, order) = send(&app, Method::POST, &format!("/api/v1/orders/{order_id}/status"), Some(json!({ "status": "cancelled" }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(order["paymentStatus"], "voided");
    let (_, product) = send(&app, Method::GET, &format!("/api/v1/products/{id}"), None).await;
    assert_eq!(product["inventory"], 4);
}

#[tokio::test]
async fn test_address_book_keeps_one_default() {
    let app = app();
    let uri = "/api/v1/customers/cust-9/addresses";
    let (status, list) = send(&app, Method::POST, uri, Some(address())).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(list[0]["isDefault"], true);
    assert_eq!(list[0]["country"], "GB");

    let (_, list) = send(&app, Method::POST, uri, Some(address())).await;
    let second = list[1]["id"].as_str().unwrap().to_string();
    let (_, list) = send(&app, Method::PUT, &format!("{uri}/{second}/default"), None).await;
    let defaults: Vec<bool> = list.as_array().unwrap().iter().map(|a| a["isDefault"].as_bool().unwrap()).collect();
    assert_eq!(defaults, vec![false, true]);

    let (status, _) = send(&app, Method::DELETE, &format!("{uri}/{second}"), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (_, list) = send(&app, Method::GET, uri, None).await;
    assert_eq!(list[0]["isDefault"], true);
}

#[tokio::test]
async fn test_wishlist_lists_priced_products() {
    let app = app();
    let id = create_product(&app, "scarf-1", 30.0, 2).await;
    let uri = "/api/v1/customers/w/wishlist";
    let (status, _) = send(&app, Method::POST, uri, Some(json!({ "productId": id }))).await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, _) = send(&app, Method::POST, uri, Some(json!({ "productId": id }))).await;
    assert_eq!(status, StatusCode::OK);

    let (_, list) = send(&app, Method::GET, uri, None).await;
    assert_eq!(list[0]["finalPrice"].as_f64(), Some(30.0));

    send(&app, Method::DELETE, &format!("{uri}/{id}"), None).await;
    let (_, list) = send(&app, Method::GET, uri, None).await;
    assert_eq!(list.as_array().map(Vec::len), Some(0));
}
