//! Request handler definitions
//!
//! Define each route and its handler here.
//! Handlers that are more than a few lines should push their logic into the engine APIs or `data_objects`. Keep this
//! module neat and tidy 🙏
//!
//! A note about performance:
//! Since each worker thread processes its requests sequentially, handlers which block the current thread will cause the
//! current worker to stop processing new requests. Any long, non-cpu-bound operation (e.g. I/O, database operations,
//! gateway calls) must be expressed as futures or asynchronous functions.
use actix_web::{get, web, HttpRequest, HttpResponse, Responder};
use log::*;
use storefront_engine::{
    db_types::{Actor, BillingDetails},
    CartApi,
    CartManagement,
    CatalogManagement,
    CheckoutApi,
    CheckoutDatabase,
    CheckoutError,
    OrderFlowApi,
    OrderFlowError,
    OrderManagement,
    PaymentGateway,
};

use crate::{
    auth::{AuthenticatedUser, RequestActor},
    config::ServerOptions,
    data_objects::{
        parse_start_payment,
        parse_verify_payment,
        AddToCartParams,
        CheckoutFormErrors,
        OrderCompleteParams,
        OrderCompletePage,
        PaymentPage,
        StartPaymentResponse,
        VerifyPaymentResponse,
    },
    errors::{payment_error_status, ServerError},
    helpers::{get_remote_ip, see_other},
};

pub const CART_URL: &str = "/cart/";
pub const CHECKOUT_URL: &str = "/checkout/";
pub const STORE_URL: &str = "/store/";
pub const HOME_URL: &str = "/";

// Web-actix cannot handle generics in handlers, so it's implemented manually using the `route!` macro.
// `impl` gives every bound its own type parameter; `where` puts all the bounds on a single backend parameter.
#[macro_export]
macro_rules! route {
    ($name:ident => $method:ident $(| $alt:ident)* $path:literal impl $($bounds:ty),+) => {
        paste::paste! { pub struct [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ >( $( core::marker::PhantomData<fn() -> [< T $bounds:camel> ] >,)+ );}
        paste::paste! { impl< $( [< T $bounds:camel> ],)+ > [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ > {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self($( core::marker::PhantomData::<fn() -> [< T $bounds:camel> ] >,)+)
            }
        }}
        paste::paste! { impl<$( [< T $bounds:camel >] , )+> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<$([<T $bounds:camel>],)+>
        where
            $([<T $bounds:camel>]: $bounds + 'static,)+
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::Any(actix_web::guard::$method())$(.or(actix_web::guard::$alt()))*)
                    .to($name::< $( [< T $bounds:camel >], )+>);
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };

    ($name:ident => $method:ident $(| $alt:ident)* $path:literal where $($bounds:ty),+) => {
        paste::paste! { pub struct [<$name:camel Route>]<A>(core::marker::PhantomData<fn() -> A>);}
        paste::paste! { impl<A> [<$name:camel Route>]<A> {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self(core::marker::PhantomData::<fn() -> A>)
            }
        }}
        paste::paste! { impl<A> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<A>
        where
            A: $($bounds +)+ 'static,
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::Any(actix_web::guard::$method())$(.or(actix_web::guard::$alt()))*)
                    .to($name::<A>);
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };
}

// ----------------------------------------------   Health  ----------------------------------------------------
#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().body("👍️\n")
}

// ----------------------------------------------   Cart  ----------------------------------------------------
// These are mounted under the `/cart` scope, which hands out anonymous sessions.
route!(add_to_cart => Get "/add/{product_id}" where CatalogManagement, CartManagement);
pub async fn add_to_cart<B>(
    path: web::Path<i64>,
    params: web::Query<AddToCartParams>,
    actor: RequestActor,
    api: web::Data<CartApi<B>>,
) -> Result<HttpResponse, ServerError>
where
    B: CatalogManagement + CartManagement,
{
    let product_id = path.into_inner();
    let variations = params.variation_ids()?;
    debug!("💻️ Add to cart request for product {product_id} from {}", actor.0);
    api.add_item(&actor.0, product_id, &variations).await?;
    Ok(see_other(CART_URL))
}

route!(remove_cart => Get | Post "/remove/{product_id}/{cart_item_id}" where CatalogManagement, CartManagement);
pub async fn remove_cart<B>(
    path: web::Path<(i64, i64)>,
    actor: RequestActor,
    api: web::Data<CartApi<B>>,
) -> Result<HttpResponse, ServerError>
where
    B: CatalogManagement + CartManagement,
{
    let (product_id, cart_item_id) = path.into_inner();
    debug!("💻️ Remove one of cart line {cart_item_id} request from {}", actor.0);
    api.remove_one(&actor.0, product_id, cart_item_id).await?;
    Ok(see_other(CART_URL))
}

route!(remove_cart_item => Get | Post "/remove_cart_item/{product_id}/{cart_item_id}" where CatalogManagement, CartManagement);
pub async fn remove_cart_item<B>(
    path: web::Path<(i64, i64)>,
    actor: RequestActor,
    api: web::Data<CartApi<B>>,
) -> Result<HttpResponse, ServerError>
where
    B: CatalogManagement + CartManagement,
{
    let (product_id, cart_item_id) = path.into_inner();
    debug!("💻️ Remove cart line {cart_item_id} request from {}", actor.0);
    api.remove_line(&actor.0, product_id, cart_item_id).await?;
    Ok(see_other(CART_URL))
}

route!(cart => Get "/" where CatalogManagement, CartManagement);
pub async fn cart<B>(actor: RequestActor, api: web::Data<CartApi<B>>) -> Result<HttpResponse, ServerError>
where B: CatalogManagement + CartManagement {
    trace!("💻️ Cart request from {}", actor.0);
    let summary = api.cart(&actor.0).await?;
    Ok(HttpResponse::Ok().json(summary))
}

// ----------------------------------------------   Checkout  ----------------------------------------------------
route!(checkout => Get "/checkout/" where CatalogManagement, CartManagement);
pub async fn checkout<B>(
    user: Option<AuthenticatedUser>,
    options: web::Data<ServerOptions>,
    api: web::Data<CartApi<B>>,
) -> Result<HttpResponse, ServerError>
where
    B: CatalogManagement + CartManagement,
{
    let Some(AuthenticatedUser(user_id)) = user else {
        debug!("💻️ Anonymous checkout request. Redirecting to login");
        return Ok(login_redirect(&options, CHECKOUT_URL));
    };
    let summary = api.cart(&Actor::User(user_id)).await?;
    Ok(HttpResponse::Ok().json(summary))
}

route!(place_order => Post "/orders/place_order/" where CartManagement, OrderManagement);
pub async fn place_order<B>(
    req: HttpRequest,
    user: Option<AuthenticatedUser>,
    form: web::Form<BillingDetails>,
    options: web::Data<ServerOptions>,
    api: web::Data<CheckoutApi<B>>,
) -> Result<HttpResponse, ServerError>
where
    B: CartManagement + OrderManagement,
{
    let Some(AuthenticatedUser(user_id)) = user else {
        return Ok(login_redirect(&options, CHECKOUT_URL));
    };
    let ip = get_remote_ip(&req, options.use_x_forwarded_for, options.use_forwarded).map(|ip| ip.to_string());
    debug!("💻️ Place order request from user #{user_id}");
    match api.place_order(user_id, form.into_inner(), ip).await {
        Ok(placed) => {
            let page = PaymentPage::new(placed, &options.razorpay_key_id, &options.currency);
            Ok(HttpResponse::Ok().json(page))
        },
        Err(CheckoutError::EmptyCart) => Ok(see_other(STORE_URL)),
        Err(CheckoutError::InvalidBilling { errors, summary }) => {
            Ok(HttpResponse::BadRequest().json(CheckoutFormErrors { errors, cart: summary }))
        },
        Err(e) => Err(e.into()),
    }
}

/// The checkout form only accepts posts. Anything else goes back to the checkout page.
pub async fn place_order_redirect() -> HttpResponse {
    see_other(CHECKOUT_URL)
}

// ----------------------------------------------   Payments  ----------------------------------------------------
route!(start_payment => Post "/orders/start_payment/" impl CheckoutDatabase, PaymentGateway);
pub async fn start_payment<B, G>(
    body: web::Bytes,
    options: web::Data<ServerOptions>,
    api: web::Data<OrderFlowApi<B, G>>,
) -> Result<HttpResponse, ServerError>
where
    B: CheckoutDatabase,
    G: PaymentGateway,
{
    let request = parse_start_payment(&body, &options.currency)?;
    debug!("💻️ Start payment request for receipt '{}' ({} {})", request.receipt, request.amount, request.currency);
    let order_id = api.start_payment(request).await?;
    Ok(HttpResponse::Ok().json(StartPaymentResponse { order_id }))
}

route!(verify_payment => Post "/orders/verify_payment/" impl CheckoutDatabase, PaymentGateway);
pub async fn verify_payment<B, G>(
    body: web::Bytes,
    user: Option<AuthenticatedUser>,
    api: web::Data<OrderFlowApi<B, G>>,
) -> HttpResponse
where
    B: CheckoutDatabase,
    G: PaymentGateway,
{
    let Ok(data) = serde_json::from_slice::<serde_json::Value>(&body) else {
        return HttpResponse::BadRequest().json(VerifyPaymentResponse::failed("Invalid JSON data"));
    };
    let Some(AuthenticatedUser(user_id)) = user else {
        debug!("💻️ Payment verification from an anonymous visitor");
        return HttpResponse::Unauthorized().json(VerifyPaymentResponse::failed("Authentication required"));
    };
    let verification = parse_verify_payment(&data);
    match api.verify_payment(user_id, verification).await {
        Ok(committed) => {
            let body = VerifyPaymentResponse::completed(committed.order.number(), &committed.payment.payment_id);
            HttpResponse::Ok().json(body)
        },
        Err(e) => {
            let status = payment_error_status(&e);
            HttpResponse::build(status).json(VerifyPaymentResponse::failed(verification_error(&e)))
        },
    }
}

/// The start and verify payment endpoints only accept posts.
pub async fn post_only() -> Result<HttpResponse, ServerError> {
    Err(ServerError::MethodNotAllowed)
}

route!(order_complete => Get "/orders/order_complete/" impl CheckoutDatabase, PaymentGateway);
pub async fn order_complete<B, G>(
    user: Option<AuthenticatedUser>,
    params: web::Query<OrderCompleteParams>,
    api: web::Data<OrderFlowApi<B, G>>,
) -> HttpResponse
where
    B: CheckoutDatabase,
    G: PaymentGateway,
{
    let OrderCompleteParams { order_number, payment_id } = params.into_inner();
    let (Some(AuthenticatedUser(user_id)), Some(order_number), Some(payment_id)) = (user, order_number, payment_id)
    else {
        debug!("💻️ Incomplete order confirmation request. Redirecting home");
        return see_other(HOME_URL);
    };
    match api.order_receipt(user_id, &order_number, &payment_id).await {
        Ok(receipt) => HttpResponse::Ok().json(OrderCompletePage::from(receipt)),
        Err(e) => {
            info!("💻️ Could not show order {order_number} to user #{user_id}. {e}");
            see_other(HOME_URL)
        },
    }
}

/// What the customer is told when verification fails. Internal failures other than a failed commit get a generic
/// message.
fn verification_error(e: &OrderFlowError) -> String {
    match e {
        OrderFlowError::FinalizationFailed(_) => e.to_string(),
        e if payment_error_status(e).is_server_error() => {
            "An internal server error occurred during verification".to_string()
        },
        e => e.to_string(),
    }
}

fn login_redirect(options: &ServerOptions, next: &str) -> HttpResponse {
    see_other(&format!("{}?next={next}", options.login_url))
}
