//! HTTP tests for order creation, cancellation, listing and item mutation.

#![allow(clippy::unwrap_used)]

mod common;

use axum::http::StatusCode;
use serde_json::{Value, json};

use common::TestApp;

fn item(quantity: i64, unit_price: f64) -> Value {
    json!({
        "quantity": quantity,
        "flavor": "mango",
        "size": "large",
        "unit_price": unit_price,
    })
}

#[tokio::test]
async fn test_orders_require_bearer() {
    let app = TestApp::new();

    for (method, uri) in [
        ("GET", "/orders/"),
        ("GET", "/orders/list"),
        ("POST", "/orders/order/cancel/1"),
        ("POST", "/orders/order/remove-item/1"),
    ] {
        let response = if method == "GET" {
            app.get(uri, None).await
        } else {
            app.post_empty(uri, None).await
        };
        assert_eq!(response.status, StatusCode::UNAUTHORIZED, "{method} {uri}");
    }

    let create = app
        .post_json("/orders/order", None, &json!({ "owner_user_id": 1 }))
        .await;
    assert_eq!(create.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_create_order_starts_pending_with_zero_total() {
    let app = TestApp::new();
    let alice = app.signup("alice@example.com", false).await;
    let admin = app.signup("admin@example.com", true).await;

    let created = app
        .post_json(
            "/orders/order",
            Some(&alice),
            &json!({ "owner_user_id": app.user_id(&alice) }),
        )
        .await;
    assert_eq!(created.status, StatusCode::CREATED);
    assert!(created.body["message"].is_string());
    let order_id = created.body["order_id"].as_i64().unwrap();

    let listed = app.get("/orders/list", Some(&admin)).await;
    let order = &listed.body["orders"][0];
    assert_eq!(order["id"], order_id);
    assert_eq!(order["owner_user_id"], app.user_id(&alice));
    assert_eq!(order["status"], "PENDING");
    assert_eq!(order["total_price"], 0.0);
}

#[tokio::test]
async fn test_create_order_for_unknown_owner_is_not_found() {
    let app = TestApp::new();
    let alice = app.signup("alice@example.com", false).await;

    let response = app
        .post_json("/orders/order", Some(&alice), &json!({ "owner_user_id": 4242 }))
        .await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(response.body["kind"], "not_found");
}

#[tokio::test]
async fn test_add_and_remove_items_scenario() {
    let app = TestApp::new();
    let a = app.signup("a@example.com", false).await;
    let b = app.signup("b@example.com", true).await;
    let c = app.signup("c@example.com", false).await;

    let order_a = app.create_order_for(&a, app.user_id(&a)).await;
    let order_c = app.create_order_for(&c, app.user_id(&c)).await;

    // Admin B adds to A's order.
    let added = app
        .post_json(
            &format!("/orders/order/add-item/{order_a}"),
            Some(&b),
            &item(2, 10.0),
        )
        .await;
    assert_eq!(added.status, StatusCode::OK, "{:?}", added.body);
    assert_eq!(added.body["order_total"], 20.0);
    let a_item = added.body["item_id"].as_i64().unwrap();

    let c_item = app
        .post_json(
            &format!("/orders/order/add-item/{order_c}"),
            Some(&c),
            &item(1, 5.5),
        )
        .await
        .body["item_id"]
        .as_i64()
        .unwrap();

    // A may not touch C's item.
    let denied = app
        .post_empty(&format!("/orders/order/remove-item/{c_item}"), Some(&a))
        .await;
    assert_eq!(denied.status, StatusCode::FORBIDDEN);
    assert_eq!(denied.body["kind"], "forbidden");

    // A removes the item on A's own order.
    let removed = app
        .post_empty(&format!("/orders/order/remove-item/{a_item}"), Some(&a))
        .await;
    assert_eq!(removed.status, StatusCode::OK, "{:?}", removed.body);
    assert_eq!(removed.body["remaining_item_count"], 0);
    assert_eq!(removed.body["order"]["total_price"], 0.0);
    assert_eq!(removed.body["order"]["id"], order_a);

    // C's order is untouched.
    let listed = app.get("/orders/list", Some(&b)).await;
    let c_order = listed.body["orders"]
        .as_array()
        .unwrap()
        .iter()
        .find(|o| o["id"] == order_c)
        .unwrap()
        .clone();
    assert_eq!(c_order["total_price"], 5.5);
}

#[tokio::test]
async fn test_total_is_exact_over_many_items() {
    let app = TestApp::new();
    let a = app.signup("a@example.com", false).await;
    let order = app.create_order_for(&a, app.user_id(&a)).await;
    let uri = format!("/orders/order/add-item/{order}");

    app.post_json(&uri, Some(&a), &item(3, 0.1)).await;
    let second = app.post_json(&uri, Some(&a), &item(1, 0.2)).await;
    assert_eq!(second.body["order_total"], 0.5);

    let third = app.post_json(&uri, Some(&a), &item(4, 12.25)).await;
    assert_eq!(third.body["order_total"], 49.5);
    let third_id = third.body["item_id"].as_i64().unwrap();

    let removed = app
        .post_empty(&format!("/orders/order/remove-item/{third_id}"), Some(&a))
        .await;
    assert_eq!(removed.body["order"]["total_price"], 0.5);
    assert_eq!(removed.body["remaining_item_count"], 2);
}

#[tokio::test]
async fn test_add_item_validates_body() {
    let app = TestApp::new();
    let a = app.signup("a@example.com", false).await;
    let order = app.create_order_for(&a, app.user_id(&a)).await;
    let uri = format!("/orders/order/add-item/{order}");

    let zero = app.post_json(&uri, Some(&a), &item(0, 1.0)).await;
    assert_eq!(zero.status, StatusCode::BAD_REQUEST);
    assert_eq!(zero.body["kind"], "bad_request");

    let negative = app.post_json(&uri, Some(&a), &item(1, -1.0)).await;
    assert_eq!(negative.status, StatusCode::BAD_REQUEST);

    let bad_path = app
        .post_json("/orders/order/add-item/abc", Some(&a), &item(1, 1.0))
        .await;
    assert_eq!(bad_path.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_add_item_total_out_of_range() {
    let app = TestApp::new();
    let a = app.signup("a@example.com", false).await;
    let admin = app.signup("admin@example.com", true).await;
    let order = app.create_order_for(&a, app.user_id(&a)).await;
    let uri = format!("/orders/order/add-item/{order}");

    let line = app.post_json(&uri, Some(&a), &item(2_147_483_647, 7.0e28)).await;
    assert_eq!(line.status, StatusCode::BAD_REQUEST, "{:?}", line.body);
    assert_eq!(line.body["kind"], "bad_request");

    let first = app.post_json(&uri, Some(&a), &item(1, 5.0e28)).await;
    assert_eq!(first.status, StatusCode::OK, "{:?}", first.body);
    let second = app.post_json(&uri, Some(&a), &item(1, 5.0e28)).await;
    assert_eq!(second.status, StatusCode::BAD_REQUEST, "{:?}", second.body);
    assert_eq!(second.body["kind"], "bad_request");

    // Only the first 5e28 item was stored.
    let listed = app.get("/orders/list", Some(&admin)).await;
    assert_eq!(listed.body["orders"][0]["total_price"], first.body["order_total"]);

    let removed = app
        .post_empty(
            &format!("/orders/order/remove-item/{}", first.body["item_id"]),
            Some(&a),
        )
        .await;
    assert_eq!(removed.status, StatusCode::OK);
    assert_eq!(removed.body["remaining_item_count"], 0);
}

#[tokio::test]
async fn test_stranger_forbidden_owner_and_admin_allowed() {
    let app = TestApp::new();
    let owner = app.signup("owner@example.com", false).await;
    let stranger = app.signup("stranger@example.com", false).await;
    let admin = app.signup("admin@example.com", true).await;
    let order = app.create_order_for(&owner, app.user_id(&owner)).await;

    let add_uri = format!("/orders/order/add-item/{order}");
    let cancel_uri = format!("/orders/order/cancel/{order}");

    let denied_add = app.post_json(&add_uri, Some(&stranger), &item(1, 1.0)).await;
    assert_eq!(denied_add.status, StatusCode::FORBIDDEN);
    let denied_cancel = app.post_empty(&cancel_uri, Some(&stranger)).await;
    assert_eq!(denied_cancel.status, StatusCode::FORBIDDEN);

    let owner_add = app.post_json(&add_uri, Some(&owner), &item(1, 1.0)).await;
    assert_eq!(owner_add.status, StatusCode::OK);
    let admin_add = app.post_json(&add_uri, Some(&admin), &item(1, 1.0)).await;
    assert_eq!(admin_add.status, StatusCode::OK);
    assert_eq!(admin_add.body["order_total"], 2.0);

    let cancelled = app.post_empty(&cancel_uri, Some(&admin)).await;
    assert_eq!(cancelled.status, StatusCode::OK);
    assert_eq!(cancelled.body["order"]["status"], "CANCELLED");
    assert!(cancelled.body["message"].is_string());
}

#[tokio::test]
async fn test_not_found_wins_over_forbidden() {
    let app = TestApp::new();
    let stranger = app.signup("stranger@example.com", false).await;

    let cancel = app
        .post_empty("/orders/order/cancel/999", Some(&stranger))
        .await;
    assert_eq!(cancel.status, StatusCode::NOT_FOUND);

    let add = app
        .post_json("/orders/order/add-item/999", Some(&stranger), &item(1, 1.0))
        .await;
    assert_eq!(add.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_remove_missing_item_is_not_found() {
    let app = TestApp::new();
    let admin = app.signup("admin@example.com", true).await;

    let response = app
        .post_empty("/orders/order/remove-item/31337", Some(&admin))
        .await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(response.body["kind"], "not_found");
    assert_eq!(response.body["message"], "item 31337 not found");
}

#[tokio::test]
async fn test_cancel_twice_is_ok() {
    let app = TestApp::new();
    let owner = app.signup("owner@example.com", false).await;
    let order = app.create_order_for(&owner, app.user_id(&owner)).await;
    let uri = format!("/orders/order/cancel/{order}");

    assert_eq!(app.post_empty(&uri, Some(&owner)).await.status, StatusCode::OK);
    let again = app.post_empty(&uri, Some(&owner)).await;
    assert_eq!(again.status, StatusCode::OK);
    assert_eq!(again.body["order"]["status"], "CANCELLED");
}

#[tokio::test]
async fn test_list_orders_admin_only_includes_cancelled() {
    let app = TestApp::new();
    let user = app.signup("user@example.com", false).await;
    let admin = app.signup("admin@example.com", true).await;

    let first = app.create_order_for(&user, app.user_id(&user)).await;
    let second = app.create_order_for(&user, app.user_id(&user)).await;
    app.post_empty(&format!("/orders/order/cancel/{first}"), Some(&user))
        .await;

    let denied = app.get("/orders/list", Some(&user)).await;
    assert_eq!(denied.status, StatusCode::FORBIDDEN);

    let listed = app.get("/orders/list", Some(&admin)).await;
    assert_eq!(listed.status, StatusCode::OK);
    let orders = listed.body["orders"].as_array().unwrap();
    assert_eq!(orders.len(), 2);
    assert_eq!(orders[0]["id"], first);
    assert_eq!(orders[0]["status"], "CANCELLED");
    assert_eq!(orders[1]["id"], second);
    assert_eq!(orders[1]["status"], "PENDING");
}
