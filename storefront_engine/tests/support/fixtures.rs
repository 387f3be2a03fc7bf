use storefront_engine::{
    db_types::{BillingDetails, Money, NewProduct, Product},
    CatalogManagement,
    GatewayError,
    PaymentGateway,
    SqliteDatabase,
};

pub const GOOD_SIGNATURE: &str = "valid-signature";

pub async fn seed_product(db: &SqliteDatabase, name: &str, price: i64, stock: i64) -> Product {
    db.insert_product(NewProduct::new(name, Money::from(price), stock)).await.expect("Error inserting product")
}

pub async fn count_rows(db: &SqliteDatabase, table: &str) -> i64 {
    sqlx::query_scalar::<_, i64>(&format!("SELECT COUNT(*) FROM {table}"))
        .fetch_one(db.pool())
        .await
        .expect("Error counting rows")
}

pub async fn stock_of(db: &SqliteDatabase, product_id: i64) -> i64 {
    db.fetch_product(product_id).await.expect("Error fetching product").expect("Product not found").stock
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
        order_note: "Leave at the door".into(),
    }
}

/// A gateway that accepts exactly one signature and hands out predictable intent ids.
#[derive(Debug, Clone, Default)]
pub struct StaticGateway {
    pub reject_with: Option<String>,
    pub unavailable: bool,
}

impl PaymentGateway for StaticGateway {
    fn key_id(&self) -> String {
        "rzp_test_key".into()
    }

    async fn create_payment_intent(&self, amount: Money, _currency: &str, receipt: &str) -> Result<String, GatewayError> {
        if let Some(msg) = &self.reject_with {
            return Err(GatewayError::Rejected(msg.clone()));
        }
        if self.unavailable {
            return Err(GatewayError::Unavailable("connection refused".into()));
        }
        Ok(format!("order_{receipt}_{}", amount.value()))
    }

    fn verify_payment_signature(&self, _order_id: &str, _payment_id: &str, signature: &str) -> bool {
        signature == GOOD_SIGNATURE
    }
}
