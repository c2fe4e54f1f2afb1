//! # shop-api
//!
//! HTTP API layer for storefront-rs.
//!
//! This crate provides:
//! - Axum-based HTTP server
//! - Combined login/registration with JWT cookies
//! - Payment intent creation and order recording
//!
//! ## Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | GET | `/health` | Health check |
//! | POST | `/api/loginOrRegister` | Log in, or register a new customer |
//! | POST | `/api/create-payment-intent` | Create a payment intent |
//! | POST | `/payment/create-payment-intent` | Create a payment intent |
//! | POST | `/order/create` | Record an order (authenticated) |
//! | POST | `/user/patient/register` | Customer self-registration |
//! | POST | `/user/admin/addnew` | Create an admin (admin only) |
//! | POST | `/user/doctor/addnew` | Create a doctor (admin only) |
//! | GET | `/user/doctors` | List doctors (admin only) |
//! | GET | `/user/patient/me` | Current customer |
//! | GET | `/user/admin/me` | Current admin |
//! | GET | `/user/patient/logout` | Clear the auth cookie |
//! | GET | `/user/admin/logout` | Clear the auth cookie |

pub mod cookies;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod routes;
pub mod state;

pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use state::{AppConfig, AppState};
