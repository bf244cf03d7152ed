use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use bigdecimal::BigDecimal;
use http_body_util::BodyExt;
use invoice_editor_rust::{create_pool, router, AppConfig, AppState};
use serde_json::{json, Value};
use std::str::FromStr;
use tower::ServiceExt;

fn app() -> Router {
    let config = AppConfig::default();
    let pool = create_pool(&config.database).unwrap();
    router(AppState::new(config, pool))
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| {
            Value::String(String::from_utf8_lossy(&bytes).into_owned())
        })
    };
    (status, value)
}

fn decimal(value: &Value) -> BigDecimal {
    BigDecimal::from_str(value.as_str().unwrap()).unwrap()
}

async fn new_session(app: &Router, template: &str) -> String {
    let (status, body) = send(app, "POST", "/api/sessions", Some(json!({ "templateId": template }))).await;
    assert_eq!(status, StatusCode::CREATED);
    body["session"]["id"].as_str().unwrap().to_string()
}

fn color_of<'a>(session: &'a Value, id: &str) -> &'a Value {
    let at = session["items"]
        .as_array()
        .unwrap()
        .iter()
        .position(|item| item["id"] == id)
        .unwrap();
    &session["colors"][at]
}

fn product(parent: &str, child: &str, price: i64) -> Value {
    json!({
        "parent": { "id": parent, "name": format!("商品グループ{parent}") },
        "child": { "id": child, "parentId": parent, "name": format!("商品{child}"), "price": price },
    })
}

#[tokio::test]
async fn health_check() {
    let (status, body) = send(&app(), "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, Value::String("OK".into()));
}

#[tokio::test]
async fn session_starts_empty_with_template_layout() {
    let app = app();
    let (status, body) = send(&app, "POST", "/api/sessions", Some(json!({ "templateId": "with-tax" }))).await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["success"], true);
    assert_eq!(body["session"]["template"], "tax-inclusive");
    assert_eq!(body["session"]["items"], json!([]));
    let columns = body["session"]["columns"].as_array().unwrap();
    assert!(columns.iter().any(|c| c["type"] == "taxRate"));
    let currencies = body["session"]["currencies"].as_array().unwrap();
    assert_eq!(currencies.len(), 3);
    assert_eq!(currencies[0]["code"], "CNY");
}

#[tokio::test]
async fn building_and_dragging_items() {
    let app = app();
    let id = new_session(&app, "basic").await;
    let base = format!("/api/sessions/{id}");

    send(&app, "POST", &format!("{base}/products"), Some(product("P1", "a1", 1000))).await;
    let (status, body) = send(&app, "POST", &format!("{base}/products"), Some(product("P2", "b1", 2000))).await;
    assert_eq!(status, StatusCode::OK);

    let session = &body["session"];
    assert_eq!(session["items"].as_array().unwrap().len(), 4);
    assert_eq!(*color_of(session, "P1"), "blue");
    assert_eq!(*color_of(session, "b1"), "green");
    assert_eq!(decimal(&session["totals"]["grandTotal"]), BigDecimal::from(3000));

    // 子商品拖出自己的组: 忽略
    let (status, body) = send(
        &app,
        "POST",
        &format!("{base}/reorder"),
        Some(json!({ "source": 1, "destination": 3 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["accepted"], false);
    assert_eq!(body["session"]["items"][1]["id"], "a1");

    let (_, body) = send(
        &app,
        "POST",
        &format!("{base}/reorder"),
        Some(json!({ "source": 2, "destination": 0 })),
    )
    .await;
    assert_eq!(body["accepted"], true);
    let order: Vec<_> = body["session"]["items"]
        .as_array()
        .unwrap()
        .iter()
        .map(|item| item["id"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(order, vec!["P2", "b1", "P1", "a1"]);
    assert_eq!(body["session"]["items"][0]["groupOrder"], 0);
    assert_eq!(*color_of(&body["session"], "P2"), "green");
}

#[tokio::test]
async fn options_attach_and_ungroup() {
    let app = app();
    let id = new_session(&app, "basic").await;
    let base = format!("/api/sessions/{id}");

    send(&app, "POST", &format!("{base}/products"), Some(product("P1", "a1", 1000))).await;
    let option = json!({ "id": "opt-1", "name": "通常検品", "price": 500, "category": "検品" });
    let (_, body) = send(
        &app,
        "POST",
        &format!("{base}/options"),
        Some(json!({ "option": option, "attachTo": "P1" })),
    )
    .await;

    let attached = body["session"]["items"][2].clone();
    assert_eq!(attached["type"], "option");
    assert_eq!(attached["parentId"], "P1");
    assert_eq!(decimal(&body["session"]["totals"]["inspection"]), BigDecimal::from(500));
    let option_id = attached["id"].as_str().unwrap().to_string();

    send(
        &app,
        "POST",
        &format!("{base}/custom-items"),
        Some(json!({ "title": "特急対応", "unitPrice": 1200 })),
    )
    .await;

    let (_, body) = send(
        &app,
        "POST",
        &format!("{base}/ungroup"),
        Some(json!({ "itemId": option_id })),
    )
    .await;
    assert_eq!(body["accepted"], true);
    let items = body["session"]["items"].as_array().unwrap();
    assert_eq!(items.last().unwrap()["id"], option_id.as_str());
    assert!(items.last().unwrap().get("parentId").is_none());
}

#[tokio::test]
async fn editing_fields_and_switching_templates() {
    let app = app();
    let id = new_session(&app, "tax-inclusive").await;
    let base = format!("/api/sessions/{id}");
    send(&app, "POST", &format!("{base}/products"), Some(product("P1", "a1", 1000))).await;

    let (status, body) = send(
        &app,
        "PATCH",
        &format!("{base}/items/a1"),
        Some(json!({ "quantity": 2, "taxRate": 10, "splitRatio": 50 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let totals = &body["session"]["totals"];
    assert_eq!(decimal(&totals["taxAmount"]), BigDecimal::from(200));
    assert_eq!(decimal(&totals["grandTotal"]), BigDecimal::from(2200));

    let (_, body) = send(
        &app,
        "PUT",
        &format!("{base}/template"),
        Some(json!({ "templateId": "split-billing" })),
    )
    .await;
    assert_eq!(body["session"]["template"], "split-payment");
    assert_eq!(decimal(&body["session"]["totals"]["grandTotal"]), BigDecimal::from(1000));

    let (status, body) = send(
        &app,
        "PATCH",
        &format!("{base}/items/a1"),
        Some(json!({ "quantity": 0 })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["success"], false);

    let (status, _) = send(
        &app,
        "PATCH",
        &format!("{base}/items/missing"),
        Some(json!({ "title": "x" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn removing_items() {
    let app = app();
    let id = new_session(&app, "basic").await;
    let base = format!("/api/sessions/{id}");
    send(&app, "POST", &format!("{base}/products"), Some(product("P1", "a1", 1000))).await;
    send(&app, "POST", &format!("{base}/products"), Some(product("P2", "b1", 2000))).await;

    let (_, body) = send(&app, "DELETE", &format!("{base}/items/P1"), None).await;
    assert_eq!(body["session"]["items"].as_array().unwrap().len(), 2);

    let (_, body) = send(&app, "DELETE", &format!("{base}/items/all"), None).await;
    assert_eq!(body["session"]["items"], json!([]));
    assert_eq!(decimal(&body["session"]["totals"]["grandTotal"]), BigDecimal::from(0));
}

#[tokio::test]
async fn unknown_session_is_not_found() {
    let app = app();
    let id = uuid::Uuid::new_v4();

    let (status, body) = send(&app, "GET", &format!("/api/sessions/{id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);

    let (status, _) = send(
        &app,
        "POST",
        &format!("/api/sessions/{id}/reorder"),
        Some(json!({ "source": 0, "destination": 1 })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, "DELETE", &format!("/api/sessions/{id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn mismatched_product_is_rejected() {
    let app = app();
    let id = new_session(&app, "basic").await;
    let body = json!({
        "parent": { "id": "P1", "name": "A" },
        "child": { "id": "b1", "parentId": "P2", "name": "B", "price": 100 },
    });
    let (status, _) = send(&app, "POST", &format!("/api/sessions/{id}/products"), Some(body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn negative_prices_are_unprocessable() {
    let app = app();
    let id = new_session(&app, "basic").await;
    let base = format!("/api/sessions/{id}");

    let (status, body) = send(&app, "POST", &format!("{base}/products"), Some(product("P1", "a1", -1000))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["success"], false);

    let option = json!({ "id": "opt-1", "name": "値引き", "price": -500, "category": "その他" });
    let (status, _) = send(&app, "POST", &format!("{base}/options"), Some(json!({ "option": option }))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, _) = send(
        &app,
        "POST",
        &format!("{base}/custom-items"),
        Some(json!({ "title": "値引き", "unitPrice": -500 })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (_, body) = send(&app, "GET", &base, None).await;
    assert_eq!(body["session"]["items"], json!([]));
}

#[tokio::test]
async fn malformed_json_bodies_are_bad_requests() {
    let app = app();
    let id = new_session(&app, "basic").await;

    for uri in ["/api/sessions".to_string(), format!("/api/sessions/{id}/draft")] {
        let request = Request::builder()
            .method("POST")
            .uri(&uri)
            .header("content-type", "application/json")
            .body(Body::from("{\"title\": "))
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{uri}");
    }

    // 会话未被保存, 也未关联草稿
    let (_, body) = send(&app, "GET", &format!("/api/sessions/{id}"), None).await;
    assert_eq!(body["session"]["draftId"], Value::Null);
}
