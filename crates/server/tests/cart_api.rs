mod common;

use common::TestServer;
use serde_json::json;
use services::services::config::{CartStoreKind, StorefrontConfig};

#[tokio::test]
async fn repeated_add_merges_into_one_line() {
    let server = TestServer::start().await;

    let (status, first) = server
        .post("/cart/add", "s1", json!({ "productId": 1, "size": "M" }))
        .await;
    assert_eq!(status, 200);
    assert_eq!(first["success"], true);
    assert_eq!(first["message"], "Item added to cart");
    assert_eq!(first["cartCount"], 1);
    assert_eq!(first["item"]["title"], "Classic Cotton Tee");
    assert_eq!(first["item"]["color"], "White");

    let (status, second) = server
        .post("/cart/add", "s1", json!({ "productId": 1, "size": "M" }))
        .await;
    assert_eq!(status, 200);
    assert_eq!(second["message"], "Cart item quantity updated");
    assert_eq!(second["cartCount"], 2);

    let (status, cart) = server.get("/cart", "s1").await;
    assert_eq!(status, 200);
    assert_eq!(cart["success"], true);
    assert_eq!(cart["items"].as_array().unwrap().len(), 1);
    assert_eq!(cart["items"][0]["quantity"], 2);
    assert_eq!(cart["totalItems"], 2);
    assert_eq!(cart["totalValue"], "49.98");
}

#[tokio::test]
async fn missing_fields_are_rejected_without_mutation() {
    let server = TestServer::start().await;

    for body in [
        json!({ "size": "M" }),
        json!({ "productId": 1 }),
        json!({ "productId": 1, "size": "  " }),
    ] {
        let (status, res) = server.post("/cart/add", "s1", body).await;
        assert_eq!(status, 400);
        assert_eq!(res["success"], false);
        assert_eq!(res["message"], "Product ID and size are required");
    }

    let (_, cart) = server.get("/cart", "s1").await;
    assert_eq!(cart["totalItems"], 0);
    assert_eq!(cart["totalValue"], "0.00");
}

#[tokio::test]
async fn unavailable_size_is_rejected() {
    let server = TestServer::start().await;
    let (status, res) = server
        .post("/cart/add", "s1", json!({ "productId": 1, "size": "XXS" }))
        .await;
    assert_eq!(status, 400);
    assert_eq!(res["success"], false);
}

#[tokio::test]
async fn malformed_json_gets_the_error_envelope() {
    let server = TestServer::start().await;
    let res = server
        .client
        .post(server.url("/cart/add"))
        .header("content-type", "application/json")
        .body("{ not json")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status().as_u16(), 400);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["success"], false);
    assert!(body["message"].as_str().unwrap().starts_with("Invalid JSON body"));
}

#[tokio::test]
async fn quick_add_selects_the_only_size() {
    let server = TestServer::start().await;
    let (status, res) = server
        .post("/cart/quick-add", "s1", json!({ "productId": 105, "type": "dress" }))
        .await;
    assert_eq!(status, 200);
    assert_eq!(res["success"], true);
    assert_eq!(res["item"]["size"], "M");
    assert_eq!(res["item"]["type"], "dress");
    assert_eq!(res["cartCount"], 1);
}

#[tokio::test]
async fn quick_add_asks_for_a_size_when_there_are_several() {
    let server = TestServer::start().await;
    let (status, res) = server
        .post("/cart/quick-add", "s1", json!({ "productId": 101, "type": "dress" }))
        .await;
    assert_eq!(status, 200);
    assert_eq!(res["success"], false);
    assert_eq!(res["requiresSizeSelection"], true);
    assert_eq!(res["sizes"], json!(["XS", "S", "M", "L"]));
    assert_eq!(res["product"]["id"], 101);

    let (_, cart) = server.get("/cart", "s1").await;
    assert_eq!(cart["totalItems"], 0);
}

#[tokio::test]
async fn quick_add_unknown_product_without_size_is_not_found() {
    let server = TestServer::start().await;
    let (status, res) = server
        .post("/cart/quick-add", "s1", json!({ "productId": 9999 }))
        .await;
    assert_eq!(status, 404);
    assert_eq!(res["success"], false);
}

#[tokio::test]
async fn unknown_product_is_stored_with_placeholders() {
    let server = TestServer::start().await;
    let (status, res) = server
        .post("/cart/add", "s1", json!({ "productId": 9999, "size": "M" }))
        .await;
    assert_eq!(status, 200);
    assert_eq!(res["item"]["title"], "Product 9999");
    assert_eq!(res["item"]["image"], "/images/placeholder.jpg");
    assert_eq!(res["item"]["priceDisplay"], "$0.00");
}

#[tokio::test]
async fn sessions_are_isolated() {
    let server = TestServer::start().await;
    server
        .post("/cart/add", "alice", json!({ "productId": 1, "size": "M", "quantity": 3 }))
        .await;

    let (_, bob) = server.get("/cart", "bob").await;
    assert_eq!(bob["totalItems"], 0);
    let (_, alice) = server.get("/cart/count", "alice").await;
    assert_eq!(alice["cartCount"], 3);
}

#[tokio::test]
async fn update_remove_and_clear() {
    let server = TestServer::spawn(StorefrontConfig {
        cart_store: CartStoreKind::Memory,
        ..Default::default()
    })
    .await;

    let (_, added) = server
        .post("/cart/add", "s1", json!({ "productId": 1, "size": "L" }))
        .await;
    let composite_id = added["item"]["compositeId"].as_str().unwrap().to_string();
    server
        .post("/cart/add", "s1", json!({ "productId": 2, "size": "M" }))
        .await;

    let res = server
        .client
        .patch(server.url(&format!("/cart/{composite_id}")))
        .header("x-session-id", "s1")
        .json(&json!({ "quantity": 5 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status().as_u16(), 200);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["item"]["quantity"], 5);
    assert_eq!(body["cartCount"], 6);

    let (status, removed) = server.delete(&format!("/cart/{composite_id}"), "s1").await;
    assert_eq!(status, 200);
    assert_eq!(removed["cartCount"], 1);

    let (status, _) = server.delete(&format!("/cart/{composite_id}"), "s1").await;
    assert_eq!(status, 404);

    let (status, cleared) = server.delete("/cart", "s1").await;
    assert_eq!(status, 200);
    assert_eq!(cleared["cartCount"], 0);
    let (_, cart) = server.get("/cart", "s1").await;
    assert!(cart["items"].as_array().unwrap().is_empty());
}
