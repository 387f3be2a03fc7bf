use storefront_engine::{
    db_types::{Actor, Money, PaymentStatus, RAZORPAY_PAYMENT_METHOD},
    events::EventProducers,
    order_objects::{PaymentIntentRequest, PaymentVerification},
    test_utils::prepare_env::{new_test_db, tear_down},
    CartApi,
    CatalogManagement,
    CheckoutApi,
    OrderFlowApi,
    OrderFlowError,
    SqliteDatabase,
};
use support::fixtures::{billing, count_rows, seed_product, stock_of, StaticGateway, GOOD_SIGNATURE};

mod support;

struct Scenario {
    db: SqliteDatabase,
    shirt_id: i64,
    socks_id: i64,
    order_number: String,
}

/// User 7 buys 3 shirts (red, large) with only 2 in stock, and one pair of socks. The order is placed but not paid.
async fn pending_order() -> Scenario {
    let db = new_test_db().await;
    let shirt = seed_product(&db, "Blue Shirt", 1000, 2).await;
    let socks = seed_product(&db, "Socks", 500, 10).await;
    let red = db.insert_variation(shirt.id, "color", "red").await.unwrap();
    let large = db.insert_variation(shirt.id, "size", "large").await.unwrap();
    let cart = CartApi::new(db.clone());
    let alice = Actor::User(7);
    for _ in 0..3 {
        cart.add_item(&alice, shirt.id, &[red.id, large.id]).await.unwrap();
    }
    cart.add_item(&alice, socks.id, &[]).await.unwrap();
    let placed = CheckoutApi::new(db.clone()).place_order(7, billing(), None).await.unwrap();
    Scenario { db, shirt_id: shirt.id, socks_id: socks.id, order_number: placed.order.number().to_string() }
}

fn verification(order_number: &str, payment_id: &str, signature: &str) -> PaymentVerification {
    PaymentVerification {
        razorpay_order_id: "order_IluGWxBm9U8zJ8".into(),
        razorpay_payment_id: payment_id.into(),
        razorpay_signature: signature.into(),
        order_number: order_number.into(),
    }
}

fn flow_api(db: &SqliteDatabase) -> OrderFlowApi<SqliteDatabase, StaticGateway> {
    OrderFlowApi::new(db.clone(), StaticGateway::default(), EventProducers::default())
}

#[tokio::test]
async fn a_verified_payment_completes_the_order() {
    let Scenario { db, shirt_id, socks_id, order_number } = pending_order().await;
    let api = flow_api(&db);
    let committed =
        api.verify_payment(7, verification(&order_number, "pay_1", GOOD_SIGNATURE)).await.expect("Error verifying");

    assert!(committed.order.is_ordered);
    assert_eq!(committed.order.payment_id, Some(committed.payment.id));
    assert_eq!(committed.payment.payment_id, "pay_1");
    assert_eq!(committed.payment.payment_method, RAZORPAY_PAYMENT_METHOD);
    assert_eq!(committed.payment.status, PaymentStatus::Completed);
    assert_eq!(committed.payment.amount_paid, Money::from(3570));
    assert_eq!(committed.payment.amount_paid, committed.order.order_total);

    assert_eq!(committed.lines.len(), 2);
    let shirts = &committed.lines[0];
    assert_eq!(shirts.product_id, shirt_id);
    assert_eq!(shirts.quantity, 3);
    assert_eq!(shirts.product_price, Money::from(1000));
    assert!(shirts.ordered);
    let values = shirts.variations.iter().map(|v| v.value.as_str()).collect::<Vec<_>>();
    assert_eq!(values, vec!["red", "large"]);
    assert!(committed.lines[1].variations.is_empty());

    // Stock is allowed to go negative
    assert_eq!(stock_of(&db, shirt_id).await, -1);
    assert_eq!(stock_of(&db, socks_id).await, 9);
    assert_eq!(count_rows(&db, "cart_items").await, 0);
    assert_eq!(count_rows(&db, "payments").await, 1);
    assert_eq!(count_rows(&db, "order_line_variations").await, 2);

    let receipt = api.order_receipt(7, &order_number, "pay_1").await.expect("Error fetching receipt");
    assert_eq!(receipt.subtotal, Money::from(3500));
    assert_eq!(receipt.lines.len(), 2);
    assert_eq!(receipt.lines[0].variations.len(), 2);
    tear_down(db).await;
}

#[tokio::test]
async fn a_second_submission_changes_nothing() {
    let Scenario { db, shirt_id, order_number, .. } = pending_order().await;
    let api = flow_api(&db);
    api.verify_payment(7, verification(&order_number, "pay_1", GOOD_SIGNATURE)).await.unwrap();
    let err = api.verify_payment(7, verification(&order_number, "pay_2", GOOD_SIGNATURE)).await.unwrap_err();
    assert!(matches!(err, OrderFlowError::OrderNotFoundOrProcessed(_)));
    assert_eq!(err.to_string(), "Order not found or already processed");
    assert_eq!(count_rows(&db, "payments").await, 1);
    assert_eq!(count_rows(&db, "order_lines").await, 2);
    assert_eq!(stock_of(&db, shirt_id).await, -1);
    tear_down(db).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_submissions_commit_once() {
    let Scenario { db, shirt_id, order_number, .. } = pending_order().await;
    let mut tasks = Vec::new();
    for i in 0..4 {
        let api = flow_api(&db);
        let v = verification(&order_number, &format!("pay_{i}"), GOOD_SIGNATURE);
        tasks.push(tokio::spawn(async move { api.verify_payment(7, v).await }));
    }
    let mut successes = 0;
    for task in tasks {
        if task.await.unwrap().is_ok() {
            successes += 1;
        }
    }
    assert_eq!(successes, 1);
    assert_eq!(count_rows(&db, "payments").await, 1);
    assert_eq!(count_rows(&db, "order_lines").await, 2);
    assert_eq!(stock_of(&db, shirt_id).await, -1);
    tear_down(db).await;
}

#[tokio::test]
async fn a_bad_signature_is_rejected_without_side_effects() {
    let Scenario { db, shirt_id, order_number, .. } = pending_order().await;
    let api = flow_api(&db);
    let err = api.verify_payment(7, verification(&order_number, "pay_1", "forged")).await.unwrap_err();
    assert!(matches!(err, OrderFlowError::InvalidSignature));
    assert_eq!(err.to_string(), "Payment signature verification failed");
    assert_eq!(count_rows(&db, "payments").await, 0);
    assert_eq!(count_rows(&db, "order_lines").await, 0);
    assert_eq!(count_rows(&db, "cart_items").await, 2);
    assert_eq!(stock_of(&db, shirt_id).await, 2);
    // The order can still be paid
    assert!(api.verify_payment(7, verification(&order_number, "pay_1", GOOD_SIGNATURE)).await.is_ok());
    tear_down(db).await;
}

#[tokio::test]
async fn incomplete_verifications_are_rejected() {
    let Scenario { db, order_number, .. } = pending_order().await;
    let api = flow_api(&db);
    let err = api.verify_payment(7, verification(&order_number, "", GOOD_SIGNATURE)).await.unwrap_err();
    assert!(matches!(err, OrderFlowError::MissingPaymentDetails));
    let err = api.verify_payment(7, verification("", "pay_1", GOOD_SIGNATURE)).await.unwrap_err();
    assert!(matches!(err, OrderFlowError::MissingPaymentDetails));
    assert_eq!(count_rows(&db, "payments").await, 0);
    tear_down(db).await;
}

#[tokio::test]
async fn another_users_order_cannot_be_completed() {
    let Scenario { db, order_number, .. } = pending_order().await;
    let api = flow_api(&db);
    let err = api.verify_payment(8, verification(&order_number, "pay_1", GOOD_SIGNATURE)).await.unwrap_err();
    assert!(matches!(err, OrderFlowError::OrderNotFoundOrProcessed(_)));
    let err = api.verify_payment(7, verification("not-a-number", "pay_1", GOOD_SIGNATURE)).await.unwrap_err();
    assert!(matches!(err, OrderFlowError::OrderNotFoundOrProcessed(_)));
    assert_eq!(count_rows(&db, "payments").await, 0);
    tear_down(db).await;
}

#[tokio::test]
async fn a_payment_reference_cannot_pay_for_two_orders() {
    let Scenario { db, shirt_id, order_number, .. } = pending_order().await;
    let api = flow_api(&db);
    api.verify_payment(7, verification(&order_number, "pay_1", GOOD_SIGNATURE)).await.unwrap();
    CartApi::new(db.clone()).add_item(&Actor::User(7), shirt_id, &[]).await.unwrap();
    let second = CheckoutApi::new(db.clone()).place_order(7, billing(), None).await.unwrap();
    let err = api.verify_payment(7, verification(second.order.number(), "pay_1", GOOD_SIGNATURE)).await.unwrap_err();
    assert!(matches!(err, OrderFlowError::OrderNotFoundOrProcessed(_)));
    // The failed commit was rolled back, so the second order is still pending and its cart intact
    assert_eq!(count_rows(&db, "payments").await, 1);
    assert_eq!(count_rows(&db, "cart_items").await, 1);
    assert!(api.verify_payment(7, verification(second.order.number(), "pay_2", GOOD_SIGNATURE)).await.is_ok());
    tear_down(db).await;
}

#[tokio::test]
async fn receipts_need_the_matching_payment() {
    let Scenario { db, order_number, .. } = pending_order().await;
    let api = flow_api(&db);
    let err = api.order_receipt(7, &order_number, "pay_1").await.unwrap_err();
    assert!(matches!(err, OrderFlowError::OrderNotFound(_)), "an unpaid order has no receipt");
    api.verify_payment(7, verification(&order_number, "pay_1", GOOD_SIGNATURE)).await.unwrap();
    assert!(matches!(api.order_receipt(7, &order_number, "pay_x").await, Err(OrderFlowError::PaymentNotFound(_))));
    assert!(matches!(api.order_receipt(8, &order_number, "pay_1").await, Err(OrderFlowError::OrderNotFound(_))));
    assert!(api.order_receipt(7, &order_number, "pay_1").await.is_ok());
    tear_down(db).await;
}

#[tokio::test]
async fn start_payment_validates_and_maps_gateway_errors() {
    let db = new_test_db().await;
    let api = flow_api(&db);
    let request = |amount: i64, receipt: &str| PaymentIntentRequest {
        amount,
        currency: "INR".into(),
        receipt: receipt.into(),
    };
    let id = api.start_payment(request(2550, "2024060542")).await.unwrap();
    assert_eq!(id, "order_2024060542_2550");
    assert!(matches!(api.start_payment(request(0, "2024060542")).await, Err(OrderFlowError::InvalidAmount)));
    assert!(matches!(api.start_payment(request(-5, "2024060542")).await, Err(OrderFlowError::InvalidAmount)));
    assert!(matches!(api.start_payment(request(100, " ")).await, Err(OrderFlowError::MissingReceipt)));

    let rejecting = StaticGateway { reject_with: Some("The amount must be atleast INR 1.00".into()), unavailable: false };
    let api = OrderFlowApi::new(db.clone(), rejecting, EventProducers::default());
    let err = api.start_payment(request(50, "2024060542")).await.unwrap_err();
    assert_eq!(err.to_string(), "The amount must be atleast INR 1.00");

    let down = StaticGateway { reject_with: None, unavailable: true };
    let api = OrderFlowApi::new(db.clone(), down, EventProducers::default());
    let err = api.start_payment(request(5000, "2024060542")).await.unwrap_err();
    assert!(matches!(err, OrderFlowError::GatewayFailure(_)));
    assert_eq!(err.to_string(), "An internal server error occurred while initiating payment.");
    tear_down(db).await;
}
