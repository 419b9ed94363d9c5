//! Order submission client for checkout.
//!
//! The cart store itself never talks to the network; checkout takes a
//! snapshot of the cart (id + quantity pairs) and submits it to the order
//! endpoint together with an externally supplied delivery address and
//! payment method.
//!
//! The order endpoint has two request generations. [`OrderClient`] submits
//! the canonical shape first and, when the failure signature marks a
//! rejected request field, retries once with the compatibility shape. The
//! negotiation keys off structured failure codes, never off error text.

use std::fmt;

use reqwest::header::{HeaderMap, HeaderValue};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use fernway_core::{OrderId, ProductId};

use crate::config::OrdersConfig;
use crate::storage::CartStorage;
use crate::store::CartStore;

/// Errors that can occur when submitting an order.
#[derive(Debug, Error)]
pub enum OrderError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned a non-validation error response.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// The order was rejected by backend validation.
    #[error("order rejected: {0}")]
    Rejected(ValidationFailure),

    /// There is nothing to order.
    #[error("cart is empty")]
    EmptyCart,

    /// Client configuration is invalid.
    #[error("invalid configuration: {0}")]
    Config(String),
}

/// A structured validation failure from the order endpoint.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationFailure {
    /// Human-readable description of the violated constraint.
    pub message: String,
    /// Request field the failure applies to, if any.
    #[serde(default)]
    pub field: Option<String>,
    /// Machine-readable failure code.
    #[serde(default)]
    pub code: Option<String>,
    /// Product the backend refused (e.g. identifier format it does not
    /// accept), if the failure is item-scoped.
    #[serde(default)]
    pub rejected_product_id: Option<String>,
}

impl fmt::Display for ValidationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)?;
        if let Some(field) = &self.field {
            write!(f, " (field: {field})")?;
        }
        Ok(())
    }
}

/// One ordered product: id + quantity, derived from a cart line item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLine {
    /// Product identifier.
    pub product_id: ProductId,
    /// Units ordered.
    pub quantity: u32,
}

/// Delivery address supplied by the checkout form.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryAddress {
    /// Recipient full name.
    pub recipient: String,
    /// Street and house number.
    pub street: String,
    /// City.
    pub city: String,
    /// Postal code.
    pub postal_code: String,
    /// Country name or code, as collected by the form.
    pub country: String,
}

impl DeliveryAddress {
    /// Single-line rendering used by the compatibility payload.
    #[must_use]
    pub fn formatted(&self) -> String {
        format!(
            "{}, {}, {} {}, {}",
            self.recipient, self.street, self.postal_code, self.city, self.country
        )
    }
}

/// Canonical order request shape.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct OrderPayload<'a> {
    items: &'a [OrderLine],
    delivery_address: &'a DeliveryAddress,
    payment_method: &'a str,
}

/// Compatibility shape for backends predating structured addresses.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct LegacyOrderPayload<'a> {
    items: &'a [OrderLine],
    address: String,
    payment: &'a str,
}

/// Success response body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreatedOrder {
    order_id: String,
}

/// Error response body.
#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    errors: Vec<ValidationFailure>,
}

/// Whether a validation failure means the endpoint does not understand the
/// canonical request shape and the compatibility shape should be tried.
fn wants_legacy_payload(failure: &ValidationFailure) -> bool {
    matches!(
        failure.code.as_deref(),
        Some("unknown_field" | "unexpected_field")
    )
}

/// An order submission collaborator.
///
/// Accepts a payload derived from cart items plus delivery details and
/// returns the created order's identifier or a validation failure describing
/// which constraint was violated.
#[allow(async_fn_in_trait)]
pub trait OrderApi {
    /// Submit an order.
    ///
    /// # Errors
    ///
    /// Returns [`OrderError::Rejected`] for backend validation failures and
    /// [`OrderError::Http`]/[`OrderError::Api`] for transport-level problems.
    async fn submit(
        &self,
        items: &[OrderLine],
        address: &DeliveryAddress,
        payment_method: &str,
    ) -> Result<OrderId, OrderError>;
}

/// HTTP client for the order endpoint.
#[derive(Debug, Clone)]
pub struct OrderClient {
    client: reqwest::Client,
    endpoint: String,
}

enum SubmitOutcome {
    Created(OrderId),
    Failed(ValidationFailure),
}

impl OrderClient {
    /// Create a new order client.
    ///
    /// # Errors
    ///
    /// Returns [`OrderError::Config`] if the API key cannot be used as a
    /// header value, or [`OrderError::Http`] if the HTTP client fails to
    /// build.
    pub fn new(config: &OrdersConfig) -> Result<Self, OrderError> {
        let mut headers = HeaderMap::new();

        let auth_value = format!("Bearer {}", config.api_key.expose_secret());
        let mut auth_value = HeaderValue::from_str(&auth_value)
            .map_err(|e| OrderError::Config(format!("invalid API key format: {e}")))?;
        auth_value.set_sensitive(true);
        headers.insert("Authorization", auth_value);

        let client = reqwest::Client::builder().default_headers(headers).build()?;

        Ok(Self {
            client,
            endpoint: config.endpoint.to_string(),
        })
    }

    async fn post<T: Serialize + ?Sized>(&self, body: &T) -> Result<SubmitOutcome, OrderError> {
        let response = self.client.post(&self.endpoint).json(body).send().await?;
        let status = response.status();

        if status.is_success() {
            let created: CreatedOrder = response.json().await?;
            return Ok(SubmitOutcome::Created(OrderId::new(created.order_id)));
        }

        let message = response.text().await.unwrap_or_default();
        if status.is_client_error() {
            if let Ok(body) = serde_json::from_str::<ApiErrorBody>(&message) {
                if let Some(failure) = body.errors.into_iter().next() {
                    return Ok(SubmitOutcome::Failed(failure));
                }
            }
        }

        Err(OrderError::Api {
            status: status.as_u16(),
            message,
        })
    }
}

impl OrderApi for OrderClient {
    async fn submit(
        &self,
        items: &[OrderLine],
        address: &DeliveryAddress,
        payment_method: &str,
    ) -> Result<OrderId, OrderError> {
        let payload = OrderPayload {
            items,
            delivery_address: address,
            payment_method,
        };

        let failure = match self.post(&payload).await? {
            SubmitOutcome::Created(order_id) => return Ok(order_id),
            SubmitOutcome::Failed(failure) => failure,
        };

        if !wants_legacy_payload(&failure) {
            return Err(OrderError::Rejected(failure));
        }

        warn!(
            field = failure.field.as_deref(),
            "order endpoint rejected canonical request shape, retrying with compatibility payload"
        );
        let legacy = LegacyOrderPayload {
            items,
            address: address.formatted(),
            payment: payment_method,
        };
        match self.post(&legacy).await? {
            SubmitOutcome::Created(order_id) => Ok(order_id),
            SubmitOutcome::Failed(failure) => Err(OrderError::Rejected(failure)),
        }
    }
}

/// Submit the current cart as an order, evicting items the backend refuses.
///
/// Takes a snapshot of the cart, submits it, and on an item-scoped validation
/// failure removes the offending item and retries. The loop is bounded: each
/// retry removes one item, so it ends after at most as many attempts as there
/// are items. On success the cart is cleared and the created order id is
/// returned.
///
/// # Errors
///
/// Returns [`OrderError::EmptyCart`] when there is nothing to order (also
/// when evictions emptied the cart), and propagates any failure the eviction
/// loop cannot resolve.
pub async fn submit_order<S, A>(
    cart: &mut CartStore<S>,
    api: &A,
    address: &DeliveryAddress,
    payment_method: &str,
) -> Result<OrderId, OrderError>
where
    S: CartStorage,
    A: OrderApi,
{
    loop {
        if cart.items().is_empty() {
            return Err(OrderError::EmptyCart);
        }

        let lines: Vec<OrderLine> = cart
            .items()
            .iter()
            .map(|item| OrderLine {
                product_id: item.id.clone(),
                quantity: item.quantity,
            })
            .collect();

        match api.submit(&lines, address, payment_method).await {
            Ok(order_id) => {
                cart.clear();
                return Ok(order_id);
            }
            Err(OrderError::Rejected(failure)) => {
                let Some(raw_id) = failure.rejected_product_id.clone() else {
                    return Err(OrderError::Rejected(failure));
                };
                let id = ProductId::new(raw_id);
                warn!(product = %id, "removing item rejected by the order endpoint");
                if !cart.remove_item(&id) {
                    // The backend named an item we do not hold; retrying
                    // would loop forever.
                    return Err(OrderError::Rejected(failure));
                }
            }
            Err(e) => return Err(e),
        }
    }
}
