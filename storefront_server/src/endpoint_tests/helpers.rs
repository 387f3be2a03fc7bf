use actix_web::{
    cookie::Cookie,
    http::{header, StatusCode},
    test,
    test::TestRequest,
    web,
    App,
};
use log::debug;
use serde_json::Value;
use sfs_common::Secret;
use storefront_engine::{
    db_types::{BillingDetails, Money, NewProduct, Product, Variation},
    events::EventProducers,
    test_utils::prepare_env::new_test_db,
    CartApi,
    CatalogManagement,
    CheckoutApi,
    OrderFlowApi,
    SqliteDatabase,
};

use super::mocks::MockPaymentGateway;
use crate::{
    config::{ServerOptions, DEFAULT_SESSION_COOKIE},
    helpers::calculate_hmac,
    middleware::{IdentityMiddlewareFactory, USER_HEADER, USER_SIGNATURE_HEADER},
    server::configure_routes,
};

// Only used to sign test identities. DO NOT re-use it anywhere.
pub const TEST_IDENTITY_SECRET: &str = "test-identity-secret";

pub struct TestResponse {
    pub status: StatusCode,
    pub location: Option<String>,
    pub session_cookie: Option<String>,
    pub body: String,
}

impl TestResponse {
    pub fn json(&self) -> Value {
        serde_json::from_str(&self.body).expect("Response body is not JSON")
    }
}

/// A storefront backed by a fresh SQLite database. Every request gets a new app over the same database, so state
/// carries over between calls the way it would between real requests.
pub struct TestApp {
    pub db: SqliteDatabase,
    pub options: ServerOptions,
}

impl TestApp {
    pub async fn new() -> Self {
        let db = new_test_db().await;
        Self { db, options: ServerOptions { razorpay_key_id: "rzp_test_key".into(), ..ServerOptions::default() } }
    }

    pub async fn send(&self, gateway: MockPaymentGateway, req: TestRequest) -> TestResponse {
        let app = App::new()
            .wrap(IdentityMiddlewareFactory::new(Secret::new(TEST_IDENTITY_SECRET.to_string())))
            .app_data(web::Data::new(CartApi::new(self.db.clone())))
            .app_data(web::Data::new(CheckoutApi::new(self.db.clone())))
            .app_data(web::Data::new(OrderFlowApi::new(self.db.clone(), gateway, EventProducers::default())))
            .app_data(web::Data::new(self.options.clone()))
            .configure(|cfg| {
                configure_routes::<SqliteDatabase, MockPaymentGateway>(cfg, DEFAULT_SESSION_COOKIE, false)
            });
        let service = test::init_service(app).await;
        let res = test::call_service(&service, req.to_request()).await;
        let status = res.status();
        let location = res.headers().get(header::LOCATION).and_then(|v| v.to_str().ok()).map(|s| s.to_string());
        let session_cookie =
            res.response().cookies().find(|c| c.name() == DEFAULT_SESSION_COOKIE).map(|c| c.value().to_string());
        let body = String::from_utf8_lossy(&test::read_body(res).await).into_owned();
        debug!("🚀️ Response: {status} {body}");
        TestResponse { status, location, session_cookie, body }
    }

    pub async fn seed_product(&self, name: &str, price: i64, stock: i64) -> Product {
        self.db.insert_product(NewProduct::new(name, Money::from(price), stock)).await.expect("Error inserting product")
    }

    pub async fn seed_variation(&self, product_id: i64, category: &str, value: &str) -> Variation {
        self.db.insert_variation(product_id, category, value).await.expect("Error inserting variation")
    }

    pub async fn stock_of(&self, product_id: i64) -> i64 {
        self.db.fetch_product(product_id).await.expect("Error fetching product").expect("Product not found").stock
    }
}

/// Adds a validly signed identity for `user_id`, as the upstream login service would.
pub fn as_user(req: TestRequest, user_id: i64) -> TestRequest {
    let user = user_id.to_string();
    let signature = calculate_hmac(TEST_IDENTITY_SECRET, user.as_bytes()).expect("Could not sign identity");
    req.insert_header((USER_HEADER, user)).insert_header((USER_SIGNATURE_HEADER, signature))
}

pub fn with_session(req: TestRequest, token: &str) -> TestRequest {
    req.cookie(Cookie::new(DEFAULT_SESSION_COOKIE, token.to_string()))
}

pub fn billing() -> BillingDetails {
    BillingDetails {
        first_name: "Asha".into(),
        last_name: "Rao".into(),
        phone: "9876543210".into(),
        email: "asha@example.com".into(),
        address_line_1: "12 MG Road".into(),
        address_line_2: "Indiranagar".into(),
        country: "India".into(),
        state: "Karnataka".into(),
        city: "Bengaluru".into(),
        order_note: String::new(),
    }
}
