use actix_web::{http::StatusCode, test::TestRequest};
use serde_json::{json, Value};
use storefront_engine::GatewayError;

use super::{
    helpers::{as_user, billing, TestApp},
    mocks::{accepting_gateway, failing_gateway, GOOD_SIGNATURE},
};

const USER: i64 = 7;

/// Fills the user's cart with two shirts at 10.00 and a pair of socks at 5.00. Returns the product ids.
async fn fill_cart(app: &TestApp) -> (i64, i64) {
    let shirt = app.seed_product("Blue Shirt", 1000, 10).await;
    let socks = app.seed_product("Socks", 500, 1).await;
    for id in [shirt.id, shirt.id, socks.id] {
        let req = as_user(TestRequest::get().uri(&format!("/cart/add/{id}")), USER);
        let res = app.send(accepting_gateway(), req).await;
        assert_eq!(res.status, StatusCode::SEE_OTHER);
    }
    (shirt.id, socks.id)
}

async fn place_order(app: &TestApp) -> Value {
    let req = TestRequest::post().uri("/orders/place_order/").set_form(billing());
    let res = app.send(accepting_gateway(), as_user(req, USER)).await;
    assert_eq!(res.status, StatusCode::OK);
    res.json()
}

fn verification(order_number: &str, payment_id: &str, signature: &str) -> Value {
    json!({
        "razorpay_order_id": "order_abc",
        "razorpay_payment_id": payment_id,
        "razorpay_signature": signature,
        "django_order_number": order_number,
    })
}

async fn verify(app: &TestApp, user: Option<i64>, body: Value) -> (StatusCode, Value) {
    let req = TestRequest::post().uri("/orders/verify_payment/").set_json(body);
    let req = match user {
        Some(id) => as_user(req, id),
        None => req,
    };
    let res = app.send(accepting_gateway(), req).await;
    (res.status, res.json())
}

//-----------------------------------------------  Place order  ------------------------------------------------------

#[actix_web::test]
async fn place_order_shows_payment_page() {
    let app = TestApp::new().await;
    fill_cart(&app).await;
    let page = place_order(&app).await;
    assert_eq!(page["grand_total_paisa"], 2550);
    assert_eq!(page["razorpay_key_id"], "rzp_test_key");
    assert_eq!(page["currency"], "INR");
    assert_eq!(page["totals"]["total"], 2500);
    assert_eq!(page["totals"]["tax"], 50);
    assert_eq!(page["cart_items"].as_array().unwrap().len(), 2);
    assert_eq!(page["order"]["order_total"], 2550);
    assert_eq!(page["order"]["is_ordered"], false);
    let number = page["order_number"].as_str().unwrap();
    let id = page["order"]["id"].as_i64().unwrap();
    assert_eq!(number.len(), 8 + id.to_string().len());
    assert!(number.ends_with(&id.to_string()));
}

#[actix_web::test]
async fn place_order_requires_login() {
    let app = TestApp::new().await;
    let req = TestRequest::post().uri("/orders/place_order/").set_form(billing());
    let res = app.send(accepting_gateway(), req).await;
    assert_eq!(res.status, StatusCode::SEE_OTHER);
    assert_eq!(res.location.as_deref(), Some("/accounts/login/?next=/checkout/"));
}

#[actix_web::test]
async fn place_order_with_empty_cart() {
    let app = TestApp::new().await;
    let req = TestRequest::post().uri("/orders/place_order/").set_form(billing());
    let res = app.send(accepting_gateway(), as_user(req, USER)).await;
    assert_eq!(res.status, StatusCode::SEE_OTHER);
    assert_eq!(res.location.as_deref(), Some("/store/"));
}

#[actix_web::test]
async fn place_order_with_bad_billing_details() {
    let app = TestApp::new().await;
    fill_cart(&app).await;
    let mut details = billing();
    details.email = "not-an-email".into();
    details.city = String::new();
    let req = TestRequest::post().uri("/orders/place_order/").set_form(details);
    let res = app.send(accepting_gateway(), as_user(req, USER)).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    let body = res.json();
    assert_eq!(body["errors"]["email"], json!(["Enter a valid email address."]));
    assert_eq!(body["errors"]["city"], json!(["This field is required."]));
    assert_eq!(body["cart"]["totals"]["grand_total"], 2550);
}

#[actix_web::test]
async fn get_place_order_goes_back_to_checkout() {
    let app = TestApp::new().await;
    let res = app.send(accepting_gateway(), as_user(TestRequest::get().uri("/orders/place_order/"), USER)).await;
    assert_eq!(res.status, StatusCode::SEE_OTHER);
    assert_eq!(res.location.as_deref(), Some("/checkout/"));
}

//-----------------------------------------------  Start payment  ----------------------------------------------------

#[actix_web::test]
async fn start_payment() {
    let app = TestApp::new().await;
    let body = json!({"amount": 2550, "receipt": "2024060542"});
    let req = TestRequest::post().uri("/orders/start_payment/").set_json(body);
    let res = app.send(accepting_gateway(), req).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.json(), json!({"order_id": "order_2024060542_2550"}));
}

#[actix_web::test]
async fn start_payment_bad_requests() {
    let app = TestApp::new().await;
    let cases = [
        ("{oops", "Invalid JSON data provided"),
        (r#"{"receipt": "2024060542"}"#, "Missing key: 'amount'"),
        (r#"{"amount": 0, "receipt": "2024060542"}"#, "Amount must be greater than zero"),
        (r#"{"amount": 2550, "receipt": "  "}"#, "Receipt (order number) is required"),
    ];
    for (body, error) in cases {
        let req = TestRequest::post()
            .uri("/orders/start_payment/")
            .insert_header(("Content-Type", "application/json"))
            .set_payload(body);
        let res = app.send(accepting_gateway(), req).await;
        assert_eq!(res.status, StatusCode::BAD_REQUEST, "{body}");
        assert_eq!(res.json()["error"], error);
    }
}

#[actix_web::test]
async fn start_payment_gateway_failures() {
    let app = TestApp::new().await;
    let body = json!({"amount": 100, "receipt": "2024060542"});
    let gateway = failing_gateway(GatewayError::Rejected("Order amount less than minimum amount allowed".into()));
    let res = app.send(gateway, TestRequest::post().uri("/orders/start_payment/").set_json(body.clone())).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.json()["error"], "Order amount less than minimum amount allowed");

    let gateway = failing_gateway(GatewayError::Unavailable("connection refused".into()));
    let res = app.send(gateway, TestRequest::post().uri("/orders/start_payment/").set_json(body)).await;
    assert_eq!(res.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(res.json()["error"], "An internal server error occurred while initiating payment.");
}

#[actix_web::test]
async fn payment_endpoints_only_accept_posts() {
    let app = TestApp::new().await;
    for uri in ["/orders/start_payment/", "/orders/verify_payment/"] {
        let res = app.send(accepting_gateway(), TestRequest::get().uri(uri)).await;
        assert_eq!(res.status, StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(res.json(), json!({"error": "Invalid request method. Only POST is allowed."}));
    }
}

//-----------------------------------------------  Verify payment  ---------------------------------------------------

#[actix_web::test]
async fn verify_payment_completes_the_order() {
    let app = TestApp::new().await;
    let (shirt, socks) = fill_cart(&app).await;
    let page = place_order(&app).await;
    let number = page["order_number"].as_str().unwrap();

    let (status, body) = verify(&app, Some(USER), verification(number, "pay_1", GOOD_SIGNATURE)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"success": true, "order_number": number, "transID": "pay_1"}));
    assert_eq!(app.stock_of(shirt).await, 8);
    assert_eq!(app.stock_of(socks).await, 0);
    let cart = app.send(accepting_gateway(), as_user(TestRequest::get().uri("/cart/"), USER)).await.json();
    assert!(cart["lines"].as_array().unwrap().is_empty());

    // A second submission changes nothing
    let (status, body) = verify(&app, Some(USER), verification(number, "pay_2", GOOD_SIGNATURE)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({"success": false, "error": "Order not found or already processed"}));
    assert_eq!(app.stock_of(shirt).await, 8);
}

#[actix_web::test]
async fn verify_payment_accepts_a_numeric_order_number() {
    let app = TestApp::new().await;
    let (shirt, _) = fill_cart(&app).await;
    let page = place_order(&app).await;
    let number = page["order_number"].as_str().unwrap().to_string();
    let mut body = verification(&number, "pay_1", GOOD_SIGNATURE);
    body["django_order_number"] = json!(number.parse::<i64>().unwrap());

    let (status, body) = verify(&app, Some(USER), body).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"success": true, "order_number": number, "transID": "pay_1"}));
    assert_eq!(app.stock_of(shirt).await, 8);
}

#[actix_web::test]
async fn verify_payment_for_someone_elses_order() {
    let app = TestApp::new().await;
    let (shirt, _) = fill_cart(&app).await;
    let page = place_order(&app).await;
    let number = page["order_number"].as_str().unwrap();
    let (status, body) = verify(&app, Some(8), verification(number, "pay_1", GOOD_SIGNATURE)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Order not found or already processed");
    assert_eq!(app.stock_of(shirt).await, 10);
}

#[actix_web::test]
async fn verify_payment_with_bad_signature() {
    let app = TestApp::new().await;
    let (shirt, _) = fill_cart(&app).await;
    let page = place_order(&app).await;
    let number = page["order_number"].as_str().unwrap();
    let (status, body) = verify(&app, Some(USER), verification(number, "pay_1", "forged")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"success": false, "error": "Payment signature verification failed"}));
    assert_eq!(app.stock_of(shirt).await, 10);
    let cart = app.send(accepting_gateway(), as_user(TestRequest::get().uri("/cart/"), USER)).await.json();
    assert_eq!(cart["lines"].as_array().unwrap().len(), 2);
}

#[actix_web::test]
async fn verify_payment_bad_requests() {
    let app = TestApp::new().await;
    let (status, body) = verify(&app, Some(USER), json!({"razorpay_order_id": "order_abc"})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Missing required payment details");

    let (status, body) = verify(&app, None, verification("2024060542", "pay_1", GOOD_SIGNATURE)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, json!({"success": false, "error": "Authentication required"}));

    let req = as_user(TestRequest::post().uri("/orders/verify_payment/").set_payload("not json"), USER);
    let res = app.send(accepting_gateway(), req).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.json(), json!({"success": false, "error": "Invalid JSON data"}));
}

//-----------------------------------------------  Order complete  ---------------------------------------------------

#[actix_web::test]
async fn order_complete_page() {
    let app = TestApp::new().await;
    fill_cart(&app).await;
    let page = place_order(&app).await;
    let number = page["order_number"].as_str().unwrap();
    let (status, _) = verify(&app, Some(USER), verification(number, "pay_1", GOOD_SIGNATURE)).await;
    assert_eq!(status, StatusCode::OK);

    let uri = format!("/orders/order_complete/?order_number={number}&payment_id=pay_1");
    let res = app.send(accepting_gateway(), as_user(TestRequest::get().uri(&uri), USER)).await;
    assert_eq!(res.status, StatusCode::OK);
    let body = res.json();
    assert_eq!(body["order_number"], number);
    assert_eq!(body["transID"], "pay_1");
    assert_eq!(body["subtotal"], 2500);
    assert_eq!(body["payment"]["amount_paid"], 2550);
    assert_eq!(body["ordered_products"].as_array().unwrap().len(), 2);

    // Wrong payment, wrong user, missing parameters: all go home
    for (uri, user) in [
        (format!("/orders/order_complete/?order_number={number}&payment_id=pay_999"), Some(USER)),
        (uri.clone(), Some(8)),
        (uri.clone(), None),
        ("/orders/order_complete/?payment_id=pay_1".to_string(), Some(USER)),
    ] {
        let req = TestRequest::get().uri(&uri);
        let req = match user {
            Some(id) => as_user(req, id),
            None => req,
        };
        let res = app.send(accepting_gateway(), req).await;
        assert_eq!(res.status, StatusCode::SEE_OTHER, "{uri}");
        assert_eq!(res.location.as_deref(), Some("/"));
    }
}

#[actix_web::test]
async fn order_complete_before_payment() {
    let app = TestApp::new().await;
    fill_cart(&app).await;
    let page = place_order(&app).await;
    let number = page["order_number"].as_str().unwrap();
    let uri = format!("/orders/order_complete/?order_number={number}&payment_id=pay_1");
    let res = app.send(accepting_gateway(), as_user(TestRequest::get().uri(&uri), USER)).await;
    assert_eq!(res.status, StatusCode::SEE_OTHER);
    assert_eq!(res.location.as_deref(), Some("/"));
}
