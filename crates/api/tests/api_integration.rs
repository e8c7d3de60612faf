//! Integration tests for the API server.

use std::sync::{Arc, OnceLock};
use std::time::Duration;

use api::AppState;
use api::auth::{USER_ID_HEADER, USER_ROLE_HEADER};
use axum::body::Body;
use axum::http::{Request, StatusCode};
use common::UserId;
use metrics_exporter_prometheus::PrometheusHandle;
use serde_json::{Value, json};
use store::InMemoryStore;
use tower::ServiceExt;

static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

fn get_metrics_handle() -> PrometheusHandle {
    METRICS_HANDLE
        .get_or_init(|| {
            let builder = metrics_exporter_prometheus::PrometheusBuilder::new();
            builder
                .install_recorder()
                .expect("failed to install Prometheus recorder")
        })
        .clone()
}

fn setup() -> (axum::Router, InMemoryStore) {
    let store = InMemoryStore::new();
    let state = Arc::new(AppState::new(
        store.clone(),
        Duration::from_secs(10),
        "test",
    ));
    let app = api::create_app(state, get_metrics_handle(), api::cors_layer(None));
    (app, store)
}

/// Who is calling.
#[derive(Clone, Copy)]
enum As {
    Anonymous,
    Customer(UserId),
    Admin(UserId),
}

async fn send(
    app: &axum::Router,
    method: &str,
    uri: &str,
    caller: As,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    match caller {
        As::Anonymous => {}
        As::Customer(id) => builder = builder.header(USER_ID_HEADER, id.to_string()),
        As::Admin(id) => {
            builder = builder
                .header(USER_ID_HEADER, id.to_string())
                .header(USER_ROLE_HEADER, "admin")
        }
    }
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_string(&body).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, json)
}

async fn create_product(app: &axum::Router, admin: UserId, name: &str, price: f64, stock: u32) -> String {
    let (status, json) = send(
        app,
        "POST",
        "/api/products",
        As::Admin(admin),
        Some(json!({
            "name": name,
            "description": format!("{name} description"),
            "price": price,
            "image": "https://img.example/item.jpg",
            "category": "Electronics",
            "stock": stock,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{json}");
    json["_id"].as_str().unwrap().to_string()
}

fn address() -> Value {
    json!({
        "fullName": "Ada Lovelace",
        "street": "12 Analytical Row",
        "city": "London",
        "state": "LDN",
        "zipCode": "N1 9GU",
        "country": "UK",
        "phone": "555-0100"
    })
}

#[tokio::test]
async fn test_health_check() {
    let (app, _) = setup();

    let (status, json) = send(&app, "GET", "/api/health", As::Anonymous, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
    assert_eq!(json["message"], "Server is running");
    assert_eq!(json["environment"], "test");
    assert!(json["timestamp"].as_str().is_some());
}

#[tokio::test]
async fn test_unknown_route_is_json_404() {
    let (app, _) = setup();

    let (status, json) = send(&app, "GET", "/api/nowhere", As::Anonymous, None).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json, json!({ "message": "Not Found - /api/nowhere" }));
}

#[tokio::test]
async fn test_protected_routes_require_identity() {
    let (app, _) = setup();

    let (status, json) = send(&app, "GET", "/api/cart", As::Anonymous, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["message"], "Not authorized, no token");

    let (status, json) = send(
        &app,
        "POST",
        "/api/products",
        As::Customer(UserId::new()),
        Some(json!({ "name": "Nope" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(json["message"], "Not authorized as an admin");
}

#[tokio::test]
async fn test_product_crud() {
    let (app, _) = setup();
    let admin = UserId::new();

    let id = create_product(&app, admin, "Desk Lamp", 39.99, 12).await;

    let (status, json) = send(&app, "GET", &format!("/api/products/{id}"), As::Anonymous, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["name"], "Desk Lamp");
    assert_eq!(json["price"], 39.99);
    assert_eq!(json["category"], "Electronics");
    assert_eq!(json["stock"], 12);

    let (status, json) = send(
        &app,
        "PUT",
        &format!("/api/products/{id}"),
        As::Admin(admin),
        Some(json!({ "price": 34.5, "featured": true })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["price"], 34.5);
    assert_eq!(json["name"], "Desk Lamp");

    let (_, featured) = send(&app, "GET", "/api/products/featured", As::Anonymous, None).await;
    assert_eq!(featured.as_array().unwrap().len(), 1);

    let (status, json) = send(
        &app,
        "DELETE",
        &format!("/api/products/{id}"),
        As::Admin(admin),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["message"], "Product removed");

    let (status, json) = send(&app, "GET", &format!("/api/products/{id}"), As::Anonymous, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["message"], "Product not found");
}

#[tokio::test]
async fn test_product_listing_filters_and_pages() {
    let (app, _) = setup();
    let admin = UserId::new();
    create_product(&app, admin, "Cheap Cable", 5.0, 10).await;
    create_product(&app, admin, "Mid Mouse", 25.0, 10).await;
    create_product(&app, admin, "Pricey Monitor", 300.0, 10).await;

    let (status, json) = send(
        &app,
        "GET",
        "/api/products?sort=price-low&limit=2",
        As::Anonymous,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["total"], 3);
    assert_eq!(json["pages"], 2);
    assert_eq!(json["page"], 1);
    assert_eq!(json["products"][0]["name"], "Cheap Cable");
    assert_eq!(json["products"][1]["name"], "Mid Mouse");

    let (_, json) = send(&app, "GET", "/api/products?search=MOUSE", As::Anonymous, None).await;
    assert_eq!(json["total"], 1);

    let (_, json) = send(&app, "GET", "/api/products?category=Books", As::Anonymous, None).await;
    assert_eq!(json["total"], 0);

    let (status, _) = send(&app, "GET", "/api/products?category=Nope", As::Anonymous, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, json) = send(&app, "GET", "/api/products/categories", As::Anonymous, None).await;
    assert_eq!(json.as_array().unwrap().len(), 9);
    assert_eq!(json[2], "Home & Garden");
}

#[tokio::test]
async fn test_invalid_ids_and_bodies_are_bad_requests() {
    let (app, _) = setup();
    let admin = UserId::new();

    let (status, json) = send(&app, "GET", "/api/products/not-a-uuid", As::Anonymous, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["message"].as_str().is_some());

    let request = Request::builder()
        .method("POST")
        .uri("/api/products")
        .header(USER_ID_HEADER, admin.to_string())
        .header(USER_ROLE_HEADER, "admin")
        .header("content-type", "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert!(json["message"].as_str().is_some());
}

#[tokio::test]
async fn test_cart_flow() {
    let (app, _) = setup();
    let admin = UserId::new();
    let user = UserId::new();
    let lamp = create_product(&app, admin, "Desk Lamp", 20.0, 5).await;
    let mug = create_product(&app, admin, "Mug", 8.0, 50).await;

    let (status, json) = send(&app, "GET", "/api/cart", As::Customer(user), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["user"], user.to_string());
    assert_eq!(json["items"].as_array().unwrap().len(), 0);

    // Adding the same product twice merges the line.
    send(&app, "POST", "/api/cart/add", As::Customer(user), Some(json!({ "productId": lamp }))).await;
    let (status, json) = send(
        &app,
        "POST",
        "/api/cart/add",
        As::Customer(user),
        Some(json!({ "productId": lamp, "quantity": 2 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["items"].as_array().unwrap().len(), 1);
    assert_eq!(json["items"][0]["quantity"], 3);
    assert_eq!(json["items"][0]["product"]["name"], "Desk Lamp");

    let (status, json) = send(
        &app,
        "POST",
        "/api/cart/add",
        As::Customer(user),
        Some(json!({ "productId": lamp, "quantity": 6 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["message"], "Insufficient stock");

    let (status, _) = send(
        &app,
        "POST",
        "/api/cart/add",
        As::Customer(user),
        Some(json!({ "productId": mug, "quantity": 0 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    send(&app, "POST", "/api/cart/add", As::Customer(user), Some(json!({ "productId": mug }))).await;
    let (status, json) = send(
        &app,
        "PUT",
        "/api/cart/update",
        As::Customer(user),
        Some(json!({ "productId": mug, "quantity": 4 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["items"][1]["quantity"], 4);

    let (status, json) = send(
        &app,
        "PUT",
        "/api/cart/update",
        As::Customer(user),
        Some(json!({ "productId": UserId::new().to_string(), "quantity": 1 })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["message"], "Item not found in cart");

    let (status, json) = send(
        &app,
        "DELETE",
        &format!("/api/cart/remove/{lamp}"),
        As::Customer(user),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["items"].as_array().unwrap().len(), 1);

    let (status, json) = send(&app, "DELETE", "/api/cart/clear", As::Customer(user), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["message"], "Cart cleared");

    let (_, json) = send(&app, "GET", "/api/cart", As::Customer(user), None).await;
    assert_eq!(json["items"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_update_without_cart_is_not_found() {
    let (app, _) = setup();
    let (status, json) = send(
        &app,
        "PUT",
        "/api/cart/update",
        As::Customer(UserId::new()),
        Some(json!({ "productId": UserId::new().to_string(), "quantity": 1 })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["message"], "Cart not found");
}

#[tokio::test]
async fn test_checkout_prices_order_and_decrements_stock() {
    let (app, _) = setup();
    let admin = UserId::new();
    let user = UserId::new();
    let lamp = create_product(&app, admin, "Desk Lamp", 20.0, 5).await;
    let mug = create_product(&app, admin, "Mug", 15.0, 10).await;

    send(&app, "POST", "/api/cart/add", As::Customer(user), Some(json!({ "productId": lamp, "quantity": 2 }))).await;
    send(&app, "POST", "/api/cart/add", As::Customer(user), Some(json!({ "productId": mug, "quantity": 3 }))).await;

    let (status, order) = send(
        &app,
        "POST",
        "/api/orders",
        As::Customer(user),
        Some(json!({ "shippingAddress": address(), "paymentMethod": "Credit Card" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{order}");
    assert_eq!(order["itemsPrice"], 85.0);
    assert_eq!(order["shippingPrice"], 10.0);
    assert_eq!(order["taxPrice"], 15.3);
    assert_eq!(order["totalPrice"], 110.3);
    assert_eq!(order["orderStatus"], "Processing");
    assert_eq!(order["paymentStatus"], "Pending");
    assert_eq!(order["paymentMethod"], "Credit Card");
    assert_eq!(order["shippingAddress"]["zipCode"], "N1 9GU");
    assert_eq!(order["items"].as_array().unwrap().len(), 2);

    let (_, product) = send(&app, "GET", &format!("/api/products/{lamp}"), As::Anonymous, None).await;
    assert_eq!(product["stock"], 3);
    let (_, product) = send(&app, "GET", &format!("/api/products/{mug}"), As::Anonymous, None).await;
    assert_eq!(product["stock"], 7);

    let (_, cart) = send(&app, "GET", "/api/cart", As::Customer(user), None).await;
    assert_eq!(cart["items"].as_array().unwrap().len(), 0);

    let (status, mine) = send(&app, "GET", "/api/orders/myorders", As::Customer(user), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(mine.as_array().unwrap().len(), 1);
    assert_eq!(mine[0]["_id"], order["_id"]);
}

#[tokio::test]
async fn test_checkout_rejections() {
    let (app, _) = setup();
    let admin = UserId::new();
    let user = UserId::new();

    let (status, json) = send(
        &app,
        "POST",
        "/api/orders",
        As::Customer(user),
        Some(json!({ "shippingAddress": address(), "paymentMethod": "PayPal" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["message"], "Cart is empty");

    let lamp = create_product(&app, admin, "Desk Lamp", 20.0, 5).await;
    send(&app, "POST", "/api/cart/add", As::Customer(user), Some(json!({ "productId": lamp }))).await;

    let (status, _) = send(
        &app,
        "POST",
        "/api/orders",
        As::Customer(user),
        Some(json!({ "shippingAddress": address(), "paymentMethod": "Bitcoin" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let mut incomplete = address();
    incomplete["city"] = json!("  ");
    let (status, _) = send(
        &app,
        "POST",
        "/api/orders",
        As::Customer(user),
        Some(json!({ "shippingAddress": incomplete, "paymentMethod": "PayPal" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Nothing was reserved by the rejected attempts.
    let (_, product) = send(&app, "GET", &format!("/api/products/{lamp}"), As::Anonymous, None).await;
    assert_eq!(product["stock"], 5);
}

#[tokio::test]
async fn test_order_visibility_and_admin_status_updates() {
    let (app, _) = setup();
    let admin = UserId::new();
    let owner = UserId::new();
    let stranger = UserId::new();
    let lamp = create_product(&app, admin, "Desk Lamp", 120.0, 5).await;

    send(&app, "POST", "/api/cart/add", As::Customer(owner), Some(json!({ "productId": lamp }))).await;
    let (_, order) = send(
        &app,
        "POST",
        "/api/orders",
        As::Customer(owner),
        Some(json!({ "shippingAddress": address(), "paymentMethod": "Debit Card" })),
    )
    .await;
    let id = order["_id"].as_str().unwrap().to_string();
    assert_eq!(order["shippingPrice"], 0.0);

    let (status, _) = send(&app, "GET", &format!("/api/orders/{id}"), As::Customer(owner), None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, json) = send(&app, "GET", &format!("/api/orders/{id}"), As::Customer(stranger), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(json["message"], "Not authorized to view this order");
    let (status, _) = send(&app, "GET", &format!("/api/orders/{id}"), As::Admin(admin), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(&app, "GET", "/api/orders", As::Customer(owner), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, all) = send(&app, "GET", "/api/orders", As::Admin(admin), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(all.as_array().unwrap().len(), 1);

    let (status, updated) = send(
        &app,
        "PUT",
        &format!("/api/orders/{id}/status"),
        As::Admin(admin),
        Some(json!({ "orderStatus": "Delivered", "paymentStatus": "Completed" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{updated}");
    assert_eq!(updated["orderStatus"], "Delivered");
    assert_eq!(updated["paymentStatus"], "Completed");
    assert!(updated["paidAt"].as_str().is_some());
    assert!(updated["deliveredAt"].as_str().is_some());

    let (status, _) = send(
        &app,
        "PUT",
        &format!("/api/orders/{id}/status"),
        As::Admin(admin),
        Some(json!({ "orderStatus": "Cancelled" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = send(
        &app,
        "PUT",
        &format!("/api/orders/{id}/status"),
        As::Admin(admin),
        Some(json!({ "orderStatus": "Lost" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, stats) = send(&app, "GET", "/api/orders/stats/summary", As::Admin(admin), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stats["totalOrders"], 1);
    assert_eq!(stats["totalRevenue"], 141.6);
    assert_eq!(stats["ordersByStatus"], json!([{ "_id": "Delivered", "count": 1 }]));
}

#[tokio::test]
async fn test_missing_order_is_not_found() {
    let (app, _) = setup();
    let (status, json) = send(
        &app,
        "GET",
        &format!("/api/orders/{}", UserId::new()),
        As::Customer(UserId::new()),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["message"], "Order not found");
}

#[tokio::test]
async fn test_checkout_persist_failure_is_500_and_restores_stock() {
    let (app, store) = setup();
    let admin = UserId::new();
    let user = UserId::new();
    let lamp = create_product(&app, admin, "Desk Lamp", 20.0, 5).await;
    send(&app, "POST", "/api/cart/add", As::Customer(user), Some(json!({ "productId": lamp, "quantity": 2 }))).await;

    store.set_fail_order_inserts(true).await;
    let (status, json) = send(
        &app,
        "POST",
        "/api/orders",
        As::Customer(user),
        Some(json!({ "shippingAddress": address(), "paymentMethod": "PayPal" })),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(json["message"].as_str().is_some());

    let (_, product) = send(&app, "GET", &format!("/api/products/{lamp}"), As::Anonymous, None).await;
    assert_eq!(product["stock"], 5);
    let (_, cart) = send(&app, "GET", "/api/cart", As::Customer(user), None).await;
    assert_eq!(cart["items"][0]["quantity"], 2);
}

#[tokio::test]
async fn test_metrics_endpoint() {
    let (app, _) = setup();
    let user = UserId::new();

    send(&app, "GET", "/api/cart", As::Customer(user), None).await;
    send(&app, "DELETE", "/api/cart/clear", As::Customer(user), None).await;

    let response = app
        .oneshot(
            Request::builder()
                .uri("/metrics")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response
        .headers()
        .get("content-type")
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(content_type.starts_with("text/plain"));

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let text = String::from_utf8(body.to_vec()).unwrap();
    assert!(text.contains("cart_mutations_total"));
}
