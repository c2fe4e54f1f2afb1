//! # Payment Gateway
//!
//! Gateway trait for payment processors and the validating service that
//! sits in front of it.
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │             PaymentGateway (trait)           │
//! │  ├── create_payment_intent()                 │
//! │  └── provider_name()                         │
//! └──────────────────────────────────────────────┘
//!                       ▲
//!             ┌─────────┴─────────┐
//!     ┌───────┴───────┐   ┌───────┴───────┐
//!     │ StripePayment │   │  test doubles │
//!     │    Gateway    │   │               │
//!     └───────────────┘   └───────────────┘
//! ```

use crate::error::{ShopError, ShopResult};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, instrument};

/// Default metadata label attached to every payment intent
pub const DEFAULT_METADATA_LABEL: &str = "Storefront Order";

/// Lower-case ISO 4217 currency code.
///
/// Only normalized here; whether the processor supports the code is the
/// processor's call.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Currency(String);

impl Currency {
    /// Normalize a client-supplied code. Blank input is rejected.
    pub fn parse(raw: &str) -> ShopResult<Self> {
        let code = raw.trim().to_ascii_lowercase();
        if code.is_empty() {
            return Err(ShopError::validation("Currency must not be blank"));
        }
        Ok(Self(code))
    }

    /// Returns the lower-case code as sent to the processor
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for Currency {
    fn default() -> Self {
        Self("usd".to_string())
    }
}

impl std::fmt::Display for Currency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.to_uppercase())
    }
}

impl std::str::FromStr for Currency {
    type Err = ShopError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// A validated request to open a payment intent
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentIntentRequest {
    /// Amount in smallest currency unit, always positive
    pub amount: i64,
    pub currency: Currency,
    /// Key/value tags forwarded to the processor
    pub metadata: HashMap<String, String>,
}

/// A payment intent opened at the processor
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentIntent {
    /// Processor's intent id (`pi_...`)
    pub id: String,

    /// Secret the browser uses to confirm the payment
    pub client_secret: String,

    pub amount: i64,

    pub currency: Currency,

    /// Processor status string (e.g. `requires_payment_method`)
    pub status: String,
}

/// Core trait for payment processor adapters.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Open a payment intent and return its client handle.
    async fn create_payment_intent(
        &self,
        request: &PaymentIntentRequest,
    ) -> ShopResult<PaymentIntent>;

    /// Get the provider name (for logging).
    fn provider_name(&self) -> &'static str;
}

/// Type alias for a shared payment gateway (dynamic dispatch)
pub type BoxedPaymentGateway = Arc<dyn PaymentGateway>;

/// Validates payment requests and forwards them to the gateway.
///
/// Stateless: nothing about the intent is kept locally.
pub struct PaymentService {
    gateway: BoxedPaymentGateway,
    metadata_label: String,
}

impl PaymentService {
    pub fn new(gateway: BoxedPaymentGateway) -> Self {
        Self {
            gateway,
            metadata_label: DEFAULT_METADATA_LABEL.to_string(),
        }
    }

    /// Builder: set the `order` metadata label sent with each intent
    pub fn with_metadata_label(mut self, label: impl Into<String>) -> Self {
        self.metadata_label = label.into();
        self
    }

    /// Validate `amount`/`currency` and open a payment intent.
    ///
    /// `amount` is in the smallest currency unit; `currency` defaults to USD.
    #[instrument(skip(self), fields(provider = self.gateway.provider_name()))]
    pub async fn create_payment_intent(
        &self,
        amount: Option<i64>,
        currency: Option<&str>,
    ) -> ShopResult<PaymentIntent> {
        let amount = match amount {
            None | Some(0) => return Err(ShopError::validation("Amount is required")),
            Some(a) if a < 0 => {
                return Err(ShopError::validation("Amount must be a positive integer"))
            }
            Some(a) => a,
        };

        let currency = match currency {
            Some(c) => Currency::parse(c)?,
            None => Currency::default(),
        };

        let mut metadata = HashMap::new();
        metadata.insert("order".to_string(), self.metadata_label.clone());

        let request = PaymentIntentRequest {
            amount,
            currency,
            metadata,
        };

        let intent = self.gateway.create_payment_intent(&request).await?;

        info!(
            "Created payment intent: id={}, amount={} {}",
            intent.id, intent.amount, intent.currency
        );

        Ok(intent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Records every request and answers with a fixed secret
    struct RecordingGateway {
        seen: Mutex<Vec<PaymentIntentRequest>>,
    }

    #[async_trait]
    impl PaymentGateway for RecordingGateway {
        async fn create_payment_intent(
            &self,
            request: &PaymentIntentRequest,
        ) -> ShopResult<PaymentIntent> {
            self.seen.lock().unwrap().push(request.clone());
            Ok(PaymentIntent {
                id: "pi_test".into(),
                client_secret: "pi_test_secret_abc".into(),
                amount: request.amount,
                currency: request.currency.clone(),
                status: "requires_payment_method".into(),
            })
        }

        fn provider_name(&self) -> &'static str {
            "recording"
        }
    }

    fn service() -> (Arc<RecordingGateway>, PaymentService) {
        let gateway = Arc::new(RecordingGateway {
            seen: Mutex::new(Vec::new()),
        });
        let service = PaymentService::new(gateway.clone()).with_metadata_label("Chocolate Order");
        (gateway, service)
    }

    #[tokio::test]
    async fn test_creates_intent_with_defaults() {
        let (gateway, service) = service();

        let intent = service.create_payment_intent(Some(500), None).await.unwrap();

        assert!(!intent.client_secret.is_empty());
        let seen = gateway.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].currency.as_str(), "usd");
        assert_eq!(seen[0].metadata.get("order").unwrap(), "Chocolate Order");
    }

    #[tokio::test]
    async fn test_missing_or_zero_amount_never_reaches_gateway() {
        let (gateway, service) = service();

        for amount in [None, Some(0), Some(-5)] {
            let err = service.create_payment_intent(amount, Some("usd")).await.unwrap_err();
            assert!(matches!(err, ShopError::Validation(_)));
        }
        assert!(gateway.seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_currency_passed_through() {
        let (gateway, service) = service();

        let intent = service.create_payment_intent(Some(500), Some(" EUR ")).await.unwrap();
        assert_eq!(intent.currency.as_str(), "eur");

        // Codes outside any local list still reach the processor
        for code in ["inr", "sgd", "brl"] {
            service.create_payment_intent(Some(500), Some(code)).await.unwrap();
        }
        let seen = gateway.seen.lock().unwrap();
        assert_eq!(seen.len(), 4);
        assert_eq!(seen[1].currency.as_str(), "inr");
    }

    #[tokio::test]
    async fn test_blank_currency_rejected() {
        let (gateway, service) = service();

        let err = service.create_payment_intent(Some(500), Some("  ")).await.unwrap_err();
        assert_eq!(err.status_code(), 400);
        assert!(gateway.seen.lock().unwrap().is_empty());
    }

    #[test]
    fn test_currency_display() {
        let currency = Currency::parse("Usd").unwrap();
        assert_eq!(currency.as_str(), "usd");
        assert_eq!(currency.to_string(), "USD");
        assert_eq!(Currency::default(), currency);
    }
}
