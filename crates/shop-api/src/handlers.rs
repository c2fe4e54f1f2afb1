//! # Request Handlers
//!
//! Axum request handlers for the storefront API.
//! Handlers stay thin: parse, call a service, shape the envelope.

use crate::cookies::{auth_cookie, removal_cookie};
use crate::error::ApiResult;
use crate::extract::{ApiJson, CurrentUser, RequireAdmin, RequireCustomer};
use crate::state::AppState;
use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use shop_auth::{AuthOutcome, LoginOrRegister, Registration};
use shop_core::{NewOrderRequest, Order, Role, User};
use tracing::{info, instrument};

// =============================================================================
// Request/Response Types
// =============================================================================

/// Create payment intent request
#[derive(Debug, Deserialize)]
pub struct CreatePaymentIntentRequest {
    /// Amount in the smallest currency unit
    #[serde(default)]
    pub amount: Option<i64>,
    /// ISO currency code (defaults to "usd")
    #[serde(default)]
    pub currency: Option<String>,
}

/// Create payment intent response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentIntentResponse {
    pub success: bool,
    pub client_secret: String,
}

/// Login / registration response
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub success: bool,
    pub message: String,
    pub token: String,
    pub user: User,
}

/// Staff creation response (no token: the caller stays logged in as admin)
#[derive(Debug, Serialize)]
pub struct UserCreatedResponse {
    pub success: bool,
    pub message: String,
    pub user: User,
}

/// Order creation response
#[derive(Debug, Serialize)]
pub struct OrderResponse {
    pub success: bool,
    pub message: String,
    pub order: Order,
}

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub success: bool,
    pub user: User,
}

#[derive(Debug, Serialize)]
pub struct DoctorsResponse {
    pub success: bool,
    pub doctors: Vec<User>,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub success: bool,
    pub message: String,
}

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
}

// =============================================================================
// Handlers
// =============================================================================

/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    Json(HealthResponse {
        status: "healthy",
        service: "storefront",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Log in an existing user or register a new customer
///
/// POST /api/loginOrRegister
#[instrument(skip_all)]
pub async fn login_or_register(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<LoginOrRegister>,
) -> ApiResult<impl IntoResponse> {
    let outcome = state.auth.login_or_register(payload).await?;

    let message = if outcome.created {
        "User Registered Successfully!"
    } else {
        "Login Successful!"
    };
    Ok(token_response(&state, outcome, message))
}

/// Explicit customer registration
///
/// POST /user/patient/register
#[instrument(skip_all)]
pub async fn register_customer(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<Registration>,
) -> ApiResult<impl IntoResponse> {
    let outcome = state.auth.register_customer(payload).await?;
    Ok(token_response(&state, outcome, "User Registered Successfully!"))
}

/// POST /user/admin/addnew
#[instrument(skip_all, fields(admin = %admin.id))]
pub async fn add_admin(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    ApiJson(payload): ApiJson<Registration>,
) -> ApiResult<impl IntoResponse> {
    add_staff(&state, Role::Admin, payload).await
}

/// POST /user/doctor/addnew
#[instrument(skip_all, fields(admin = %admin.id))]
pub async fn add_doctor(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    ApiJson(payload): ApiJson<Registration>,
) -> ApiResult<impl IntoResponse> {
    add_staff(&state, Role::Doctor, payload).await
}

async fn add_staff(
    state: &AppState,
    role: Role,
    payload: Registration,
) -> ApiResult<(StatusCode, Json<UserCreatedResponse>)> {
    let user = state.auth.add_staff(role, payload).await?;

    Ok((
        StatusCode::CREATED,
        Json(UserCreatedResponse {
            success: true,
            message: format!("New {} Registered", role),
            user,
        }),
    ))
}

/// GET /user/doctors
pub async fn list_doctors(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
) -> ApiResult<Json<DoctorsResponse>> {
    let doctors = state.auth.list_by_role(Role::Doctor).await?;
    Ok(Json(DoctorsResponse {
        success: true,
        doctors,
    }))
}

/// GET /user/patient/me
pub async fn customer_details(RequireCustomer(user): RequireCustomer) -> Json<UserResponse> {
    Json(UserResponse {
        success: true,
        user,
    })
}

/// GET /user/admin/me
pub async fn admin_details(RequireAdmin(user): RequireAdmin) -> Json<UserResponse> {
    Json(UserResponse {
        success: true,
        user,
    })
}

/// GET /user/patient/logout
pub async fn logout_customer(
    State(state): State<AppState>,
    RequireCustomer(user): RequireCustomer,
) -> impl IntoResponse {
    logout(&state, &user, "Patient Logged Out Successfully.")
}

/// GET /user/admin/logout
pub async fn logout_admin(
    State(state): State<AppState>,
    RequireAdmin(user): RequireAdmin,
) -> impl IntoResponse {
    logout(&state, &user, "Admin Logged Out Successfully.")
}

fn logout(state: &AppState, user: &User, message: &str) -> impl IntoResponse {
    info!("Logout: id={}", user.id);
    (
        [(header::SET_COOKIE, removal_cookie(&state.cookie).to_string())],
        Json(MessageResponse {
            success: true,
            message: message.to_string(),
        }),
    )
}

/// Create a payment intent and hand its client secret to the browser
///
/// POST /api/create-payment-intent
#[instrument(skip_all)]
pub async fn create_payment_intent(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<CreatePaymentIntentRequest>,
) -> ApiResult<Json<PaymentIntentResponse>> {
    let intent = state
        .payments
        .create_payment_intent(payload.amount, payload.currency.as_deref())
        .await?;

    Ok(Json(PaymentIntentResponse {
        success: true,
        client_secret: intent.client_secret,
    }))
}

/// Record an order for the authenticated user
///
/// POST /order/create
#[instrument(skip_all, fields(user = %user.id))]
pub async fn create_order(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiJson(payload): ApiJson<NewOrderRequest>,
) -> ApiResult<Json<OrderResponse>> {
    let order = state.orders.create_order(user.id, payload).await?;

    Ok(Json(OrderResponse {
        success: true,
        message: "Order placed successfully!".to_string(),
        order,
    }))
}

// =============================================================================
// Helpers
// =============================================================================

fn token_response(state: &AppState, outcome: AuthOutcome, message: &str) -> impl IntoResponse {
    let status = if outcome.created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    let cookie = auth_cookie(&state.cookie, &outcome.token);

    (
        status,
        [(header::SET_COOKIE, cookie.to_string())],
        Json(AuthResponse {
            success: true,
            message: message.to_string(),
            token: outcome.token,
            user: outcome.user,
        }),
    )
}
