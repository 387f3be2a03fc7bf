use actix_web::{
    error::ResponseError,
    http::{header::ContentType, StatusCode},
    HttpResponse,
};
use storefront_engine::{CartApiError, CheckoutError, OrderFlowError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Could not initialize server. {0}")]
    InitializeError(String),
    #[error("An error occurred on the backend of the server. {0}")]
    BackendError(String),
    #[error("{0}")]
    InvalidRequestBody(String),
    #[error("An I/O error happened in the server. {0}")]
    IOError(#[from] std::io::Error),
    #[error("UnspecifiedError. {0}")]
    Unspecified(String),
    #[error("Authentication Error. {0}")]
    AuthenticationError(#[from] AuthError),
    #[error("The data was not found. {0}")]
    NoRecordFound(String),
    #[error("Invalid request method. Only POST is allowed.")]
    MethodNotAllowed,
    #[error(transparent)]
    PaymentError(#[from] OrderFlowError),
}

impl ResponseError for ServerError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequestBody(_) => StatusCode::BAD_REQUEST,
            Self::AuthenticationError(_) => StatusCode::UNAUTHORIZED,
            Self::NoRecordFound(_) => StatusCode::NOT_FOUND,
            Self::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            Self::PaymentError(e) => payment_error_status(e),
            Self::InitializeError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::BackendError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::IOError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Unspecified(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code())
            .insert_header(ContentType::json())
            .body(serde_json::json!({ "error": self.to_string() }).to_string())
    }
}

/// The HTTP status for each payment flow failure. Customer mistakes and provider refusals are 400s, unknown or spent
/// orders are 404s, and everything on our side is a 500.
pub fn payment_error_status(e: &OrderFlowError) -> StatusCode {
    use OrderFlowError::*;
    match e {
        InvalidAmount | MissingReceipt | ProviderRejected(_) | MissingPaymentDetails | InvalidSignature => {
            StatusCode::BAD_REQUEST
        },
        OrderNotFoundOrProcessed(_) | OrderNotFound(_) | PaymentNotFound(_) | PaymentMismatch { .. } => {
            StatusCode::NOT_FOUND
        },
        GatewayFailure(_) | FinalizationFailed(_) | DatabaseError(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

#[derive(Debug, Clone, Error)]
pub enum AuthError {
    #[error("The identity signature is missing or invalid.")]
    InvalidIdentity,
    #[error("The identity header does not hold a valid user id.")]
    MalformedIdentity,
    #[error("You must be logged in to do that.")]
    LoginRequired,
    #[error("No cart session was found for this request.")]
    NoSession,
}

impl From<CartApiError> for ServerError {
    fn from(e: CartApiError) -> Self {
        match e {
            CartApiError::ProductNotFound(_) => Self::NoRecordFound(e.to_string()),
            CartApiError::CartItemNotFound { .. } => Self::NoRecordFound(e.to_string()),
            CartApiError::DatabaseError(e) => Self::BackendError(format!("Database error: {e}")),
        }
    }
}

impl From<CheckoutError> for ServerError {
    fn from(e: CheckoutError) -> Self {
        match e {
            CheckoutError::EmptyCart => Self::InvalidRequestBody(e.to_string()),
            CheckoutError::InvalidBilling { errors, .. } => Self::InvalidRequestBody(errors.to_string()),
            CheckoutError::DatabaseError(e) => Self::BackendError(format!("Database error: {e}")),
        }
    }
}
