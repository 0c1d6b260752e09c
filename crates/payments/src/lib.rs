//! Client for the payment processor's refund endpoint.
//!
//! The pipeline never charges; it only issues full refunds against a
//! payment the checkout flow already captured. The processor is assumed
//! to fail closed: an error here means no money moved.

use std::time::Duration;

use serde::Deserialize;

/// HTTP request timeout for a single refund call.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(20);

/// Errors from the payment processor layer.
#[derive(Debug, thiserror::Error)]
pub enum PaymentApiError {
    /// The HTTP request itself failed (network, DNS, TLS, timeout).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The processor returned a non-2xx status code.
    #[error("Payment API error ({status}): {body}")]
    ApiError {
        /// HTTP status code.
        status: u16,
        /// Raw response body for debugging.
        body: String,
    },

    /// The processor acknowledged the call but did not confirm the refund.
    #[error("Refund not confirmed, processor reported status '{status}'")]
    NotConfirmed {
        /// Status string reported by the processor.
        status: String,
    },
}

/// Response from a refund call.
#[derive(Debug, Deserialize)]
struct RefundResponse {
    status: String,
}

/// HTTP client for the payment processor.
pub struct PaymentGateway {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
}

impl PaymentGateway {
    /// Create a new client for the processor at `api_url`.
    pub fn new(api_url: String, api_key: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_url,
            api_key,
        }
    }

    /// Issue a full refund for a payment, in the payment's own
    /// currency and amount. Succeeds only when the processor confirms
    /// the refund (`succeeded` or `pending` settlement).
    pub async fn refund(
        &self,
        provider_payment_id: &str,
        amount_minor: i64,
        currency: &str,
    ) -> Result<(), PaymentApiError> {
        let body = serde_json::json!({
            "payment_id": provider_payment_id,
            "amount": amount_minor,
            "currency": currency,
        });

        let response = self
            .client
            .post(format!("{}/v1/refunds", self.api_url))
            .bearer_auth(&self.api_key)
            .timeout(REQUEST_TIMEOUT)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(PaymentApiError::ApiError {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: RefundResponse = response.json().await?;
        match parsed.status.as_str() {
            "succeeded" | "pending" => Ok(()),
            other => Err(PaymentApiError::NotConfirmed {
                status: other.to_string(),
            }),
        }
    }
}
