//! # shop-stripe
//!
//! Stripe payment gateway for the storefront backend.
//!
//! Opens Stripe Payment Intents and hands the client secret back to the
//! browser, which finishes the payment with Stripe.js.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use shop_stripe::StripePaymentGateway;
//! use shop_core::PaymentService;
//!
//! // Create gateway from environment
//! let gateway = StripePaymentGateway::from_env()?;
//! let payments = PaymentService::new(Arc::new(gateway));
//!
//! let intent = payments.create_payment_intent(Some(500), Some("usd")).await?;
//! // Send intent.client_secret to the browser
//! ```

pub mod config;
pub mod intents;

// Re-exports
pub use config::StripeConfig;
pub use intents::StripePaymentGateway;
