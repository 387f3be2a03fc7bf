use actix_web::{http::StatusCode, test::TestRequest};

use super::{
    helpers::{as_user, with_session, TestApp},
    mocks::accepting_gateway,
};
use crate::middleware::{USER_HEADER, USER_SIGNATURE_HEADER};

#[actix_web::test]
async fn health_check() {
    let app = TestApp::new().await;
    let res = app.send(accepting_gateway(), TestRequest::get().uri("/health")).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body, "👍️\n");
}

#[actix_web::test]
async fn anonymous_add_starts_a_session() {
    let app = TestApp::new().await;
    let shirt = app.seed_product("Blue Shirt", 1000, 10).await;
    let res = app.send(accepting_gateway(), TestRequest::get().uri(&format!("/cart/add/{}", shirt.id))).await;
    assert_eq!(res.status, StatusCode::SEE_OTHER);
    assert_eq!(res.location.as_deref(), Some("/cart/"));
    let token = res.session_cookie.expect("No session cookie was set");
    assert_eq!(token.len(), 43);

    // The same session adds to the same line, and no new cookie is handed out
    let req = with_session(TestRequest::get().uri(&format!("/cart/add/{}", shirt.id)), &token);
    let res = app.send(accepting_gateway(), req).await;
    assert_eq!(res.status, StatusCode::SEE_OTHER);
    assert!(res.session_cookie.is_none());

    let res = app.send(accepting_gateway(), with_session(TestRequest::get().uri("/cart/"), &token)).await;
    assert_eq!(res.status, StatusCode::OK);
    let cart = res.json();
    assert_eq!(cart["lines"].as_array().unwrap().len(), 1);
    assert_eq!(cart["lines"][0]["quantity"], 2);
    assert_eq!(cart["totals"]["total"], 2000);
    assert_eq!(cart["totals"]["tax"], 40);
    assert_eq!(cart["totals"]["grand_total"], 2040);

    // A different visitor has an empty cart
    let res = app.send(accepting_gateway(), TestRequest::get().uri("/cart/")).await;
    assert!(res.session_cookie.is_some());
    assert!(res.json()["lines"].as_array().unwrap().is_empty());
}

#[actix_web::test]
async fn add_unknown_product() {
    let app = TestApp::new().await;
    let res = app.send(accepting_gateway(), TestRequest::get().uri("/cart/add/999")).await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
    assert!(res.json()["error"].as_str().unwrap().contains("999"));
}

#[actix_web::test]
async fn variation_choices_stay_on_one_line() {
    let app = TestApp::new().await;
    let shirt = app.seed_product("Blue Shirt", 1000, 10).await;
    let red = app.seed_variation(shirt.id, "color", "red").await;
    let blue = app.seed_variation(shirt.id, "color", "blue").await;
    let large = app.seed_variation(shirt.id, "size", "large").await;
    let uri = format!("/cart/add/{}?variations={},{}", shirt.id, red.id, large.id);
    app.send(accepting_gateway(), as_user(TestRequest::get().uri(&uri), 7)).await;
    let uri = format!("/cart/add/{}?variations={}", shirt.id, blue.id);
    app.send(accepting_gateway(), as_user(TestRequest::get().uri(&uri), 7)).await;

    let cart = app.send(accepting_gateway(), as_user(TestRequest::get().uri("/cart/"), 7)).await.json();
    let lines = cart["lines"].as_array().unwrap();
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0]["quantity"], 2);
    let mut values = lines[0]["variations"]
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v["value"].as_str().unwrap().to_string())
        .collect::<Vec<_>>();
    values.sort();
    assert_eq!(values, vec!["blue", "large"]);
}

#[actix_web::test]
async fn bad_variation_list() {
    let app = TestApp::new().await;
    let shirt = app.seed_product("Blue Shirt", 1000, 10).await;
    let uri = format!("/cart/add/{}?variations=red", shirt.id);
    let res = app.send(accepting_gateway(), TestRequest::get().uri(&uri)).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.json()["error"], "Invalid variation id: red");
}

#[actix_web::test]
async fn users_do_not_get_session_cookies() {
    let app = TestApp::new().await;
    let shirt = app.seed_product("Blue Shirt", 1000, 10).await;
    let req = as_user(TestRequest::get().uri(&format!("/cart/add/{}", shirt.id)), 7);
    let res = app.send(accepting_gateway(), req).await;
    assert_eq!(res.status, StatusCode::SEE_OTHER);
    assert!(res.session_cookie.is_none());
    let cart = app.send(accepting_gateway(), as_user(TestRequest::get().uri("/cart/"), 7)).await.json();
    assert_eq!(cart["lines"].as_array().unwrap().len(), 1);
    // Another user sees nothing
    let cart = app.send(accepting_gateway(), as_user(TestRequest::get().uri("/cart/"), 8)).await.json();
    assert!(cart["lines"].as_array().unwrap().is_empty());
}

#[actix_web::test]
async fn forged_identity_is_rejected() {
    let app = TestApp::new().await;
    let req = TestRequest::get()
        .uri("/cart/")
        .insert_header((USER_HEADER, "7"))
        .insert_header((USER_SIGNATURE_HEADER, "00".repeat(32)));
    let res = app.send(accepting_gateway(), req).await;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
    assert_eq!(res.json()["error"], "Authentication Error. The identity signature is missing or invalid.");

    let req = TestRequest::get().uri("/cart/").insert_header((USER_HEADER, "7"));
    let res = app.send(accepting_gateway(), req).await;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn remove_one_and_remove_line() {
    let app = TestApp::new().await;
    let shirt = app.seed_product("Blue Shirt", 1000, 10).await;
    let add = format!("/cart/add/{}", shirt.id);
    app.send(accepting_gateway(), as_user(TestRequest::get().uri(&add), 7)).await;
    app.send(accepting_gateway(), as_user(TestRequest::get().uri(&add), 7)).await;
    let cart = app.send(accepting_gateway(), as_user(TestRequest::get().uri("/cart/"), 7)).await.json();
    let line_id = cart["lines"][0]["id"].as_i64().unwrap();

    let uri = format!("/cart/remove/{}/{line_id}", shirt.id);
    let res = app.send(accepting_gateway(), as_user(TestRequest::post().uri(&uri), 7)).await;
    assert_eq!(res.status, StatusCode::SEE_OTHER);
    assert_eq!(res.location.as_deref(), Some("/cart/"));
    let cart = app.send(accepting_gateway(), as_user(TestRequest::get().uri("/cart/"), 7)).await.json();
    assert_eq!(cart["lines"][0]["quantity"], 1);

    // Someone else cannot touch the line, and it is not an error for them
    let res = app.send(accepting_gateway(), as_user(TestRequest::get().uri(&uri), 8)).await;
    assert_eq!(res.status, StatusCode::SEE_OTHER);
    let cart = app.send(accepting_gateway(), as_user(TestRequest::get().uri("/cart/"), 7)).await.json();
    assert_eq!(cart["lines"][0]["quantity"], 1);

    let uri = format!("/cart/remove_cart_item/{}/{line_id}", shirt.id);
    let res = app.send(accepting_gateway(), as_user(TestRequest::get().uri(&uri), 7)).await;
    assert_eq!(res.status, StatusCode::SEE_OTHER);
    let cart = app.send(accepting_gateway(), as_user(TestRequest::get().uri("/cart/"), 7)).await.json();
    assert!(cart["lines"].as_array().unwrap().is_empty());

    // The line is gone now
    let res = app.send(accepting_gateway(), as_user(TestRequest::get().uri(&uri), 7)).await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn remove_from_unknown_product() {
    let app = TestApp::new().await;
    let res = app.send(accepting_gateway(), as_user(TestRequest::get().uri("/cart/remove/999/1"), 7)).await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn checkout_requires_login() {
    let app = TestApp::new().await;
    let res = app.send(accepting_gateway(), TestRequest::get().uri("/checkout/")).await;
    assert_eq!(res.status, StatusCode::SEE_OTHER);
    assert_eq!(res.location.as_deref(), Some("/accounts/login/?next=/checkout/"));

    let res = app.send(accepting_gateway(), as_user(TestRequest::get().uri("/checkout/"), 7)).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.json()["totals"]["grand_total"], 0);
}
