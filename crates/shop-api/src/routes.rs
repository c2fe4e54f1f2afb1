//! # Routes
//!
//! Axum router configuration for the storefront API.

use crate::handlers;
use crate::state::AppState;
use axum::{
    http::{header, HeaderValue, Method},
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};
use tracing::warn;

/// Create the main application router
///
/// Routes:
/// - GET  /health, GET / - Health check
/// - POST /api/loginOrRegister - Combined login / customer registration
/// - POST /api/create-payment-intent - Payment intent for checkout
/// - POST /payment/create-payment-intent - Same, under the payment prefix
/// - POST /order/create - Record an order (authenticated)
/// - /user/* - Account routes (registration, staff, profile, logout)
pub fn create_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config.allowed_origins);

    let api_routes = Router::new()
        .route("/loginOrRegister", post(handlers::login_or_register))
        .route("/create-payment-intent", post(handlers::create_payment_intent));

    let user_routes = Router::new()
        .route("/loginOrRegister", post(handlers::login_or_register))
        .route("/patient/register", post(handlers::register_customer))
        .route("/admin/addnew", post(handlers::add_admin))
        .route("/doctor/addnew", post(handlers::add_doctor))
        .route("/doctors", get(handlers::list_doctors))
        .route("/patient/me", get(handlers::customer_details))
        .route("/admin/me", get(handlers::admin_details))
        .route("/patient/logout", get(handlers::logout_customer))
        .route("/admin/logout", get(handlers::logout_admin));

    let payment_routes =
        Router::new().route("/create-payment-intent", post(handlers::create_payment_intent));

    let order_routes = Router::new().route("/create", post(handlers::create_order));

    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/", get(handlers::health_check))
        .nest("/api", api_routes)
        .nest("/user", user_routes)
        .nest("/payment", payment_routes)
        .nest("/order", order_routes)
        // Middleware
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        // State
        .with_state(state)
}

/// Credentialed CORS restricted to the configured frontend origins
fn cors_layer(origins: &[String]) -> CorsLayer {
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed))
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .allow_credentials(true)
}
