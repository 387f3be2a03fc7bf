use std::sync::Arc;

use log::*;
use reqwest::{
    header::{HeaderMap, HeaderValue},
    Client,
    Method,
    StatusCode,
};
use serde::{de::DeserializeOwned, Serialize};

use crate::{
    config::RazorpayConfig,
    data_objects::{NewRazorpayOrder, RazorpayErrorResponse, RazorpayOrder},
    signature::verify_payment_signature,
    RazorpayApiError,
};

#[derive(Clone)]
pub struct RazorpayApi {
    config: RazorpayConfig,
    client: Arc<Client>,
}

impl RazorpayApi {
    pub fn new(config: RazorpayConfig) -> Result<Self, RazorpayApiError> {
        let mut headers = HeaderMap::with_capacity(1);
        headers.insert("Content-Type", HeaderValue::from_static("application/json"));
        let client = Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()
            .map_err(|e| RazorpayApiError::Initialization(e.to_string()))?;
        Ok(Self { config, client: Arc::new(client) })
    }

    pub fn key_id(&self) -> &str {
        self.config.key_id.as_str()
    }

    pub async fn rest_query<T: DeserializeOwned, B: Serialize>(
        &self,
        method: Method,
        path: &str,
        body: Option<B>,
    ) -> Result<T, RazorpayApiError> {
        let url = self.url(path);
        trace!("💳️ Sending REST query: {url}");
        let mut req = self
            .client
            .request(method, url)
            .basic_auth(self.config.key_id.as_str(), Some(self.config.key_secret.reveal()));
        if let Some(body) = body {
            req = req.json(&body);
        }
        let response = req.send().await.map_err(|e| RazorpayApiError::RestRequestError(e.to_string()))?;
        let status = response.status();
        if status.is_success() {
            trace!("💳️ REST query successful. {status}");
            return response.json::<T>().await.map_err(|e| RazorpayApiError::JsonError(e.to_string()));
        }
        let message = response.text().await.map_err(|e| RazorpayApiError::RestResponseError(e.to_string()))?;
        Err(classify_failure(status, message))
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.config.api_url.trim_end_matches('/'))
    }

    /// Creates a payment intent ("order" in Razorpay's terms) for the given amount.
    pub async fn create_order(&self, order: &NewRazorpayOrder) -> Result<RazorpayOrder, RazorpayApiError> {
        debug!("💳️ Creating Razorpay order for receipt {} ({} {})", order.receipt, order.amount, order.currency);
        let result = self.rest_query::<RazorpayOrder, _>(Method::POST, "/orders", Some(order)).await?;
        info!("💳️ Created Razorpay order {} for receipt {}", result.id, order.receipt);
        Ok(result)
    }

    pub fn verify_payment_signature(&self, order_id: &str, payment_id: &str, signature: &str) -> bool {
        verify_payment_signature(self.config.key_secret.reveal(), order_id, payment_id, signature)
    }
}

/// Razorpay reports client mistakes as a 400 with `{"error": {"description": ...}}`. Those become `BadRequest`
/// carrying the provider's description. Everything else is a generic query error.
fn classify_failure(status: StatusCode, message: String) -> RazorpayApiError {
    if status == StatusCode::BAD_REQUEST {
        let description = serde_json::from_str::<RazorpayErrorResponse>(&message)
            .map(|r| r.error.description)
            .unwrap_or_else(|_| message.clone());
        warn!("💳️ Razorpay rejected the request: {description}");
        return RazorpayApiError::BadRequest(description);
    }
    warn!("💳️ Razorpay query failed. {status}. {message}");
    RazorpayApiError::QueryError { status: status.as_u16(), message }
}
