//! # Stripe Payment Intents
//!
//! Implementation of the Stripe Payment Intents API.
//! The browser completes the payment with Stripe.js using the returned
//! client secret; nothing is stored on our side.

use crate::config::StripeConfig;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use shop_core::{
    Currency, PaymentGateway, PaymentIntent, PaymentIntentRequest, ShopError, ShopResult,
};
use tracing::{debug, error, info, instrument};
use uuid::Uuid;

const PROVIDER: &str = "stripe";

/// Stripe Payment Intents gateway
pub struct StripePaymentGateway {
    config: StripeConfig,
    client: Client,
}

impl StripePaymentGateway {
    /// Create a new gateway with a 30 second request timeout
    pub fn new(config: StripeConfig) -> ShopResult<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .map_err(|e| ShopError::Configuration(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { config, client })
    }

    /// Create from environment variables
    pub fn from_env() -> ShopResult<Self> {
        let config = StripeConfig::from_env()?;
        Self::new(config)
    }

    pub fn config(&self) -> &StripeConfig {
        &self.config
    }

    /// Form body for `POST /v1/payment_intents`
    fn form_params(request: &PaymentIntentRequest) -> Vec<(String, String)> {
        let mut params = vec![
            ("amount".to_string(), request.amount.to_string()),
            ("currency".to_string(), request.currency.as_str().to_string()),
        ];

        let mut metadata: Vec<_> = request.metadata.iter().collect();
        metadata.sort();
        for (key, value) in metadata {
            params.push((format!("metadata[{}]", key), value.clone()));
        }

        params
    }
}

#[async_trait]
impl PaymentGateway for StripePaymentGateway {
    #[instrument(skip(self, request), fields(amount = request.amount, currency = %request.currency))]
    async fn create_payment_intent(
        &self,
        request: &PaymentIntentRequest,
    ) -> ShopResult<PaymentIntent> {
        let url = format!("{}/v1/payment_intents", self.config.api_base_url);
        let idempotency_key = Uuid::new_v4().to_string();

        debug!("Creating Stripe payment intent: idempotency_key={}", idempotency_key);

        let response = self
            .client
            .post(&url)
            .header("Authorization", self.config.auth_header())
            .header("Stripe-Version", &self.config.api_version)
            .header("Idempotency-Key", &idempotency_key)
            .form(&Self::form_params(request))
            .send()
            .await
            .map_err(|e| upstream(format!("Network error: {}", e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| upstream(format!("Network error: {}", e)))?;

        if !status.is_success() {
            error!("Stripe API error: status={}, body={}", status, body);

            // Parse Stripe error
            if let Ok(error_response) = serde_json::from_str::<StripeErrorResponse>(&body) {
                return Err(upstream(error_response.error.message));
            }

            return Err(upstream(format!("HTTP {}: {}", status, body)));
        }

        let intent: StripePaymentIntentResponse = serde_json::from_str(&body).map_err(|e| {
            ShopError::Serialization(format!("Failed to parse Stripe response: {}", e))
        })?;

        let client_secret = intent
            .client_secret
            .filter(|s| !s.is_empty())
            .ok_or_else(|| upstream("Stripe returned no client_secret"))?;

        let currency = intent
            .currency
            .parse::<Currency>()
            .unwrap_or_else(|_| request.currency.clone());

        info!("Created Stripe payment intent: id={}, status={}", intent.id, intent.status);

        Ok(PaymentIntent {
            id: intent.id,
            client_secret,
            amount: intent.amount,
            currency,
            status: intent.status,
        })
    }

    fn provider_name(&self) -> &'static str {
        PROVIDER
    }
}

fn upstream(message: impl Into<String>) -> ShopError {
    ShopError::Upstream {
        provider: PROVIDER.to_string(),
        message: message.into(),
    }
}

// =============================================================================
// Stripe API Types
// =============================================================================

#[derive(Debug, Deserialize)]
struct StripePaymentIntentResponse {
    id: String,
    #[serde(default)]
    client_secret: Option<String>,
    amount: i64,
    currency: String,
    status: String,
}

#[derive(Debug, Deserialize)]
struct StripeErrorResponse {
    error: StripeError,
}

#[derive(Debug, Deserialize)]
struct StripeError {
    message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use wiremock::matchers::{body_string_contains, header, header_exists, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn request(amount: i64) -> PaymentIntentRequest {
        let mut metadata = HashMap::new();
        metadata.insert("order".to_string(), "Chocolate Order".to_string());
        PaymentIntentRequest {
            amount,
            currency: Currency::default(),
            metadata,
        }
    }

    fn gateway(server: &MockServer) -> StripePaymentGateway {
        let config = StripeConfig::new("sk_test_abc123").with_api_base_url(server.uri());
        StripePaymentGateway::new(config).unwrap()
    }

    #[test]
    fn test_form_params() {
        let params = StripePaymentGateway::form_params(&request(500));
        assert_eq!(
            params,
            vec![
                ("amount".to_string(), "500".to_string()),
                ("currency".to_string(), "usd".to_string()),
                ("metadata[order]".to_string(), "Chocolate Order".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_create_payment_intent() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/payment_intents"))
            .and(header("Authorization", "Bearer sk_test_abc123"))
            .and(header_exists("Idempotency-Key"))
            .and(body_string_contains("amount=500"))
            .and(body_string_contains("currency=usd"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "pi_123",
                "object": "payment_intent",
                "amount": 500,
                "currency": "usd",
                "client_secret": "pi_123_secret_456",
                "status": "requires_payment_method"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let intent = gateway(&server).create_payment_intent(&request(500)).await.unwrap();

        assert_eq!(intent.id, "pi_123");
        assert_eq!(intent.client_secret, "pi_123_secret_456");
        assert_eq!(intent.amount, 500);
        assert_eq!(intent.currency.as_str(), "usd");
    }

    #[tokio::test]
    async fn test_stripe_error_is_upstream() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/payment_intents"))
            .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
                "error": {
                    "type": "invalid_request_error",
                    "message": "Amount must be at least $0.50 usd"
                }
            })))
            .mount(&server)
            .await;

        let err = gateway(&server).create_payment_intent(&request(10)).await.unwrap_err();

        match err {
            ShopError::Upstream { provider, message } => {
                assert_eq!(provider, "stripe");
                assert_eq!(message, "Amount must be at least $0.50 usd");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_unknown_currency_rejected_by_stripe() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/payment_intents"))
            .and(body_string_contains("currency=zzz"))
            .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
                "error": {
                    "type": "invalid_request_error",
                    "param": "currency",
                    "message": "Invalid currency: zzz"
                }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let mut request = request(500);
        request.currency = Currency::parse("ZZZ").unwrap();
        let err = gateway(&server).create_payment_intent(&request).await.unwrap_err();

        assert!(matches!(err, ShopError::Upstream { .. }));
        assert!(err.to_string().contains("Invalid currency: zzz"));
    }

    #[tokio::test]
    async fn test_unparseable_error_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
            .mount(&server)
            .await;

        let err = gateway(&server).create_payment_intent(&request(500)).await.unwrap_err();
        assert_eq!(err.status_code(), 500);
        assert!(err.to_string().contains("bad gateway"));
    }

    #[tokio::test]
    async fn test_missing_client_secret() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "pi_123",
                "amount": 500,
                "currency": "usd",
                "status": "requires_payment_method"
            })))
            .mount(&server)
            .await;

        let err = gateway(&server).create_payment_intent(&request(500)).await.unwrap_err();
        assert!(matches!(err, ShopError::Upstream { .. }));
    }
}
