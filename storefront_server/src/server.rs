use std::{sync::Arc, time::Duration};

use actix_web::{dev::Server, http::KeepAlive, middleware::Logger, web, App, HttpServer};
use log::*;
use storefront_engine::{
    events::EventProducers,
    CartApi,
    CartManagement,
    CatalogManagement,
    CheckoutApi,
    CheckoutDatabase,
    OrderFlowApi,
    PaymentGateway,
    SqliteDatabase,
};

use crate::{
    config::{ServerConfig, ServerOptions},
    errors::ServerError,
    integrations::razorpay::RazorpayGateway,
    middleware::{IdentityMiddlewareFactory, SessionMiddlewareFactory},
    notifications::{create_notification_event_handlers, LoggingMailTransport},
    routes::{
        health,
        place_order_redirect,
        post_only,
        AddToCartRoute,
        CartRoute,
        CheckoutRoute,
        OrderCompleteRoute,
        PlaceOrderRoute,
        RemoveCartItemRoute,
        RemoveCartRoute,
        StartPaymentRoute,
        VerifyPaymentRoute,
    },
};

const MAX_DB_CONNECTIONS: u32 = 25;

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let db = SqliteDatabase::new_with_url(&config.database_url, MAX_DB_CONNECTIONS)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    db.migrate().await.map_err(|e| ServerError::InitializeError(format!("Database migration failed. {e}")))?;
    let gateway =
        RazorpayGateway::new(config.razorpay.clone()).map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let handlers = create_notification_event_handlers(Arc::new(LoggingMailTransport), &config.mail_from);
    let producers = handlers.producers();
    handlers.start_handlers().await;
    let srv = create_server_instance(config, db, gateway, producers)?;
    srv.await.map_err(|e| ServerError::Unspecified(e.to_string()))
}

pub fn create_server_instance(
    config: ServerConfig,
    db: SqliteDatabase,
    gateway: RazorpayGateway,
    producers: EventProducers,
) -> Result<Server, ServerError> {
    let options = ServerOptions::from_config(&config, gateway.key_id());
    info!("🪛️ Payment intents will be opened in {} by default", options.currency);
    let srv = HttpServer::new(move || {
        let cart_api = CartApi::new(db.clone());
        let checkout_api = CheckoutApi::new(db.clone());
        let order_flow_api = OrderFlowApi::new(db.clone(), gateway.clone(), producers.clone());
        let session_cookie = config.session_cookie.clone();
        let secure_cookies = config.secure_cookies;
        App::new()
            .wrap(IdentityMiddlewareFactory::new(config.identity_secret.clone()))
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("sfs::access_log"))
            .app_data(web::Data::new(cart_api))
            .app_data(web::Data::new(checkout_api))
            .app_data(web::Data::new(order_flow_api))
            .app_data(web::Data::new(options.clone()))
            .configure(|cfg| {
                configure_routes::<SqliteDatabase, RazorpayGateway>(cfg, &session_cookie, secure_cookies)
            })
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((config.host.as_str(), config.port))?
    .run();
    Ok(srv)
}

/// Registers every storefront route. The APIs and [`ServerOptions`] must already be available as app data, and the
/// app must be wrapped in the identity middleware.
pub fn configure_routes<B, G>(cfg: &mut web::ServiceConfig, session_cookie: &str, secure_cookies: bool)
where
    B: CatalogManagement + CartManagement + CheckoutDatabase + 'static,
    G: PaymentGateway + 'static,
{
    let cart_scope = web::scope("/cart")
        .wrap(SessionMiddlewareFactory::new(session_cookie, secure_cookies))
        .service(AddToCartRoute::<B>::new())
        .service(RemoveCartRoute::<B>::new())
        .service(RemoveCartItemRoute::<B>::new())
        .service(CartRoute::<B>::new());
    cfg.service(health)
        .service(cart_scope)
        .service(CheckoutRoute::<B>::new())
        .service(PlaceOrderRoute::<B>::new())
        .service(web::resource("/orders/place_order/").route(web::get().to(place_order_redirect)))
        .service(StartPaymentRoute::<B, G>::new())
        .service(web::resource("/orders/start_payment/").to(post_only))
        .service(VerifyPaymentRoute::<B, G>::new())
        .service(web::resource("/orders/verify_payment/").to(post_only))
        .service(OrderCompleteRoute::<B, G>::new());
}
