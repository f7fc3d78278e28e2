//! API integration tests
//!
//! Drive the full router in-process against the in-memory store.

use axum::{
    body::Body,
    http::{
        header::{CONTENT_TYPE, COOKIE, SET_COOKIE},
        Request, StatusCode,
    },
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use bookstore_server::{api, repository::Repository, AppConfig, AppState};

const ADMIN: &str = "admin@bookstore.test";
const READER: &str = "reader@bookstore.test";
const OTHER_READER: &str = "other@bookstore.test";

fn app() -> Router {
    api::router(AppState::new(AppConfig::default(), Repository::in_memory()))
}

struct TestResponse {
    status: StatusCode,
    set_cookie: Option<String>,
    body: Value,
}

async fn send(app: &Router, request: Request<Body>) -> TestResponse {
    let response = app
        .clone()
        .oneshot(request)
        .await
        .expect("Failed to send request");

    let status = response.status();
    let set_cookie = response
        .headers()
        .get(SET_COOKIE)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Failed to read body");
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("Failed to parse response")
    };

    TestResponse {
        status,
        set_cookie,
        body,
    }
}

fn get(uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(COOKIE, cookie);
    }
    builder.body(Body::empty()).unwrap()
}

fn json_request(method: &str, uri: &str, cookie: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(CONTENT_TYPE, "application/json");
    if let Some(cookie) = cookie {
        builder = builder.header(COOKIE, cookie);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

/// Sign in and return the `name=value` part of the auth cookie
async fn sign_in(app: &Router, email: &str) -> String {
    let response = send(app, json_request("POST", "/auth", None, json!({ "email": email }))).await;
    assert_eq!(response.status, StatusCode::OK);

    let set_cookie = response.set_cookie.expect("No auth cookie set");
    assert!(set_cookie.contains("HttpOnly"));
    set_cookie
        .split(';')
        .next()
        .expect("Empty cookie")
        .to_string()
}

async fn add_book(app: &Router, admin: &str, name: &str, quantity: i32) -> String {
    let response = send(
        app,
        json_request(
            "POST",
            &format!("/addbook?email={}", ADMIN),
            Some(admin),
            json!({ "name": name, "category": "Fiction", "quantity": quantity, "author": "Anon" }),
        ),
    )
    .await;
    assert_eq!(response.status, StatusCode::CREATED);
    response.body["bookId"]
        .as_str()
        .expect("No book ID")
        .to_string()
}

async fn borrow(app: &Router, cookie: &str, book_id: &str, email: &str) -> TestResponse {
    send(
        app,
        json_request(
            "POST",
            "/borrow-book",
            Some(cookie),
            json!({ "bookId": book_id, "userEmail": email, "returnDate": "2025-01-01" }),
        ),
    )
    .await
}

async fn quantity(app: &Router, book_id: &str) -> i64 {
    let response = send(app, get(&format!("/book-details/{}", book_id), None)).await;
    assert_eq!(response.status, StatusCode::OK);
    response.body["quantity"].as_i64().expect("No quantity")
}

#[tokio::test]
async fn test_health_check() {
    let app = app();

    let response = send(&app, get("/health", None)).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["status"], "healthy");

    let response = send(&app, get("/ready", None)).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["status"], "ready");
}

#[tokio::test]
async fn test_unauthorized_access() {
    let app = app();

    let response = send(&app, get("/all-books", None)).await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.body["message"], "Unauthorized: No token provided");

    let response = send(&app, get("/borrowedbooks", Some("authToken=garbage"))).await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.body["message"], "Unauthorized: Invalid token");
}

#[tokio::test]
async fn test_bearer_header_is_accepted() {
    let app = app();
    let cookie = sign_in(&app, READER).await;
    let token = cookie.trim_start_matches("authToken=");

    let request = Request::builder()
        .method("GET")
        .uri("/borrowedbooks")
        .header("Authorization", format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap();
    let response = send(&app, request).await;
    assert_eq!(response.status, StatusCode::OK);
    assert!(response.body.is_array());
}

#[tokio::test]
async fn test_sign_in_requires_email() {
    let app = app();
    let response = send(&app, json_request("POST", "/auth", None, json!({ "email": "nope" }))).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert!(response.body["message"].is_string());
}

#[tokio::test]
async fn test_logout_clears_cookie() {
    let app = app();
    let reader = sign_in(&app, READER).await;
    let response = send(&app, json_request("POST", "/logout", Some(&reader), json!({}))).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["message"], "Cookie cleared");

    let set_cookie = response.set_cookie.expect("No cookie removal");
    assert!(set_cookie.starts_with("authToken="));
    assert!(set_cookie.contains("Max-Age=0"));
}

#[tokio::test]
async fn test_catalog_endpoints() {
    let app = app();
    let admin = sign_in(&app, ADMIN).await;
    let dune = add_book(&app, &admin, "Dune", 2).await;
    add_book(&app, &admin, "Empty Shelf", 0).await;

    let response = send(&app, get(&format!("/all-books?email={}", ADMIN), Some(&admin))).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body.as_array().map(Vec::len), Some(2));

    let response = send(&app, get("/books?cat=Fiction", None)).await;
    assert_eq!(response.body.as_array().map(Vec::len), Some(2));

    let response = send(&app, get("/available-books", None)).await;
    let available = response.body.as_array().cloned().unwrap_or_default();
    assert_eq!(available.len(), 1);
    assert_eq!(available[0]["_id"], dune.as_str());

    let response = send(&app, get(&format!("/book-details/{}", dune), None)).await;
    assert_eq!(response.body["name"], "Dune");
    assert_eq!(response.body["author"], "Anon");

    let response = send(
        &app,
        json_request(
            "PATCH",
            &format!("/all-books/{}", dune),
            Some(&admin),
            json!({ "_id": "ignored", "quantity": 7 }),
        ),
    )
    .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(quantity(&app, &dune).await, 7);

    let response = send(
        &app,
        Request::builder()
            .method("DELETE")
            .uri(format!("/all-books/{}", dune))
            .header(COOKIE, &admin)
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(response.status, StatusCode::OK);

    let response = send(&app, get(&format!("/book-details/{}", dune), None)).await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(response.body["message"], "Book not found");
}

#[tokio::test]
async fn test_admin_endpoints_check_email() {
    let app = app();
    let admin = sign_in(&app, ADMIN).await;

    let response = send(&app, get(&format!("/all-books?email={}", READER), Some(&admin))).await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);
    assert_eq!(response.body["message"], "Unauthorized");
}

#[tokio::test]
async fn test_add_book_validation() {
    let app = app();
    let admin = sign_in(&app, ADMIN).await;

    let response = send(
        &app,
        json_request("POST", "/addbook", Some(&admin), json!({ "name": "No quantity" })),
    )
    .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(
        response.body["message"],
        "Book name and numeric quantity are required."
    );
}

#[tokio::test]
async fn test_borrow_and_return_flow() {
    let app = app();
    let admin = sign_in(&app, ADMIN).await;
    let reader = sign_in(&app, READER).await;
    let other = sign_in(&app, OTHER_READER).await;
    let book_id = add_book(&app, &admin, "Dune", 1).await;

    let response = borrow(&app, &reader, &book_id, READER).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["message"], "Book borrowed successfully");
    let borrowed_id = response.body["borrowedId"].as_str().expect("No borrowed ID").to_string();
    assert_ne!(borrowed_id, book_id);
    assert_eq!(quantity(&app, &book_id).await, 0);

    let response = send(&app, get(&format!("/borrowedbooks?email={}", READER), Some(&reader))).await;
    assert_eq!(response.status, StatusCode::OK);
    let records = response.body.as_array().cloned().unwrap_or_default();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["_id"], borrowed_id.as_str());
    assert_eq!(records[0]["bookId"], book_id.as_str());
    assert_eq!(records[0]["name"], "Dune");
    assert_eq!(records[0]["returnDate"], "2025-01-01");

    let response = borrow(&app, &reader, &book_id, READER).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["message"], "You have already borrowed this book.");

    let response = borrow(&app, &other, &book_id, OTHER_READER).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["message"], "Book is out of stock");

    let response = send(
        &app,
        json_request(
            "POST",
            "/return-book",
            Some(&reader),
            json!({ "bookId": book_id, "userEmail": READER }),
        ),
    )
    .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["message"], "Book returned successfully");
    assert_eq!(quantity(&app, &book_id).await, 1);

    let response = send(&app, get("/borrowedbooks", Some(&reader))).await;
    assert_eq!(response.body.as_array().map(Vec::len), Some(0));
}

#[tokio::test]
async fn test_borrow_limit() {
    let app = app();
    let admin = sign_in(&app, ADMIN).await;
    let reader = sign_in(&app, READER).await;

    for name in ["One", "Two", "Three"] {
        let id = add_book(&app, &admin, name, 1).await;
        assert_eq!(borrow(&app, &reader, &id, READER).await.status, StatusCode::OK);
    }
    let fourth = add_book(&app, &admin, "Four", 1).await;

    let response = borrow(&app, &reader, &fourth, READER).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["message"], "You cannot borrow more than 3 books.");
}

#[tokio::test]
async fn test_borrow_validation() {
    let app = app();
    let reader = sign_in(&app, READER).await;

    let response = send(
        &app,
        json_request("POST", "/borrow-book", Some(&reader), json!({ "userEmail": READER })),
    )
    .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["message"], "All fields are required");

    let request = Request::builder()
        .method("POST")
        .uri("/borrow-book")
        .header(CONTENT_TYPE, "application/json")
        .header(COOKIE, &reader)
        .body(Body::from("{not json"))
        .unwrap();
    let response = send(&app, request).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert!(response.body["message"].is_string());
}

#[tokio::test]
async fn test_cannot_borrow_for_someone_else() {
    let app = app();
    let admin = sign_in(&app, ADMIN).await;
    let reader = sign_in(&app, READER).await;
    let book_id = add_book(&app, &admin, "Dune", 1).await;

    let response = borrow(&app, &reader, &book_id, OTHER_READER).await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);
    assert_eq!(quantity(&app, &book_id).await, 1);
}

#[tokio::test]
async fn test_return_without_borrow_is_not_found() {
    let app = app();
    let admin = sign_in(&app, ADMIN).await;
    let reader = sign_in(&app, READER).await;
    let book_id = add_book(&app, &admin, "Dune", 1).await;

    let response = send(
        &app,
        json_request(
            "POST",
            "/return-book",
            Some(&reader),
            json!({ "bookId": book_id, "userEmail": READER }),
        ),
    )
    .await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(response.body["message"], "No borrowed record found");
    assert_eq!(quantity(&app, &book_id).await, 1);
}

#[tokio::test]
async fn test_quantity_must_be_numeric() {
    let app = app();
    let admin = sign_in(&app, ADMIN).await;

    let response = send(
        &app,
        json_request("POST", "/addbook", Some(&admin), json!({ "name": "Dune", "quantity": "3" })),
    )
    .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(
        response.body["message"],
        "Book name and numeric quantity are required."
    );

    let dune = add_book(&app, &admin, "Dune", 2).await;
    for quantity in [json!("3"), json!(-1), json!(i32::MAX)] {
        let response = send(
            &app,
            json_request(
                "PATCH",
                &format!("/all-books/{}", dune),
                Some(&admin),
                json!({ "quantity": quantity }),
            ),
        )
        .await;
        assert_eq!(response.status, StatusCode::BAD_REQUEST);
        assert_eq!(response.body["message"], "Quantity must be a numeric value.");
    }
    assert_eq!(quantity(&app, &dune).await, 2);
}

#[tokio::test]
async fn test_borrowed_record_fields_are_not_overridden_by_book_fields() {
    let app = app();
    let admin = sign_in(&app, ADMIN).await;
    let reader = sign_in(&app, READER).await;

    let response = send(
        &app,
        json_request(
            "POST",
            &format!("/addbook?email={}", ADMIN),
            Some(&admin),
            json!({
                "name": "Dune",
                "quantity": 1,
                "userEmail": "evil@x.com",
                "bookId": "not-the-book",
                "returnDate": "never"
            }),
        ),
    )
    .await;
    assert_eq!(response.status, StatusCode::CREATED);
    let book_id = response.body["bookId"].as_str().expect("No book ID").to_string();

    let response = borrow(&app, &reader, &book_id, READER).await;
    assert_eq!(response.status, StatusCode::OK);

    let response = send(&app, get(&format!("/borrowedbooks?email={}", READER), Some(&reader))).await;
    assert_eq!(response.status, StatusCode::OK);
    let records = response.body.as_array().cloned().unwrap_or_default();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["userEmail"], READER);
    assert_eq!(records[0]["bookId"], book_id.as_str());
    assert_eq!(records[0]["returnDate"], "2025-01-01");
    assert_eq!(records[0]["name"], "Dune");
}

#[tokio::test]
async fn test_openapi_document_is_served() {
    let app = app();

    let response = send(&app, get("/api-docs/openapi.json", None)).await;
    assert_eq!(response.status, StatusCode::OK);
    assert!(response.body["paths"]["/borrow-book"]["post"].is_object());
    assert_eq!(
        response.body["components"]["schemas"]["Book"]["additionalProperties"],
        true
    );
}
