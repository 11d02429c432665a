use crate::controller::ApiResponse;
use crate::params::autopay::PaymentParams;
use crate::{AppState, Error};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use domain::error::validation_error;
use domain::subscription::{InitiateRequest, PaymentRequest, RedemptionParams};

use log::*;

/// POST initiate a new AutoPay subscription
///
/// When the customer supplies a UPI id it is checked with the gateway first.
#[utoipa::path(
    post,
    path = "/api/autopay/initiate",
    request_body = InitiateRequest,
    responses(
        (status = 200, description = "Subscription setup accepted by the gateway"),
        (status = 400, description = "Missing or malformed fields, or an unknown UPI id"),
        (status = 502, description = "Gateway rejected the request"),
        (status = 504, description = "Gateway did not answer in time")
    )
)]
pub async fn initiate(
    State(app_state): State<AppState>,
    Json(params): Json<InitiateRequest>,
) -> Result<impl IntoResponse, Error> {
    let request = params.validate()?;
    debug!(
        "POST initiate subscription: {} x {}",
        request.installments, request.installment_amount
    );

    if let Some(vpa) = request.upi_id.as_deref() {
        let verdict = app_state.autopay.validate_vpa(vpa).await?;
        if !verdict.valid {
            warn!("Gateway does not recognize the supplied UPI id");
            return Err(validation_error("Invalid UPI ID").into());
        }
    }

    let outcome = app_state.autopay.setup_subscription(&request).await?;

    Ok(Json(ApiResponse::new(StatusCode::OK.into(), outcome)))
}

/// GET the status of a setup order.
#[utoipa::path(
    get,
    path = "/api/autopay/orders/{id}/status",
    params(
        ("id" = String, Path, description = "Merchant order id")
    ),
    responses(
        (status = 200, description = "Order status as reported by the gateway"),
        (status = 502, description = "Gateway rejected the request")
    )
)]
pub async fn order_status(
    State(app_state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, Error> {
    debug!("GET order status for: {id}");
    let status = app_state.autopay.order_status(&id).await?;

    Ok(Json(ApiResponse::new(StatusCode::OK.into(), status)))
}

/// GET the status of a subscription.
#[utoipa::path(
    get,
    path = "/api/autopay/subscriptions/{id}/status",
    params(
        ("id" = String, Path, description = "Merchant subscription id")
    ),
    responses(
        (status = 200, description = "Subscription status as reported by the gateway"),
        (status = 502, description = "Gateway rejected the request")
    )
)]
pub async fn subscription_status(
    State(app_state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, Error> {
    debug!("GET subscription status for: {id}");
    let status = app_state.autopay.subscription_status(&id).await?;

    Ok(Json(ApiResponse::new(StatusCode::OK.into(), status)))
}

/// POST notify the customer of an upcoming debit
#[utoipa::path(
    post,
    path = "/api/autopay/subscriptions/{id}/notify",
    params(
        ("id" = String, Path, description = "Merchant subscription id")
    ),
    request_body = RedemptionParams,
    responses(
        (status = 200, description = "Redemption notification accepted"),
        (status = 400, description = "Missing order id or amount"),
        (status = 502, description = "Gateway rejected the request")
    )
)]
pub async fn notify(
    State(app_state): State<AppState>,
    Path(id): Path<String>,
    Json(params): Json<RedemptionParams>,
) -> Result<impl IntoResponse, Error> {
    let request = params.validate(&id)?;
    debug!("POST redemption notify for subscription: {id}");

    let result = app_state.autopay.notify_redemption(&request).await?;

    Ok(Json(ApiResponse::new(StatusCode::OK.into(), result)))
}

/// POST execute a notified debit
#[utoipa::path(
    post,
    path = "/api/autopay/subscriptions/{id}/redeem",
    params(
        ("id" = String, Path, description = "Merchant subscription id")
    ),
    request_body = RedemptionParams,
    responses(
        (status = 200, description = "Redemption accepted"),
        (status = 400, description = "Missing order id or amount"),
        (status = 502, description = "Gateway rejected the request")
    )
)]
pub async fn redeem(
    State(app_state): State<AppState>,
    Path(id): Path<String>,
    Json(params): Json<RedemptionParams>,
) -> Result<impl IntoResponse, Error> {
    let request = params.validate(&id)?;
    debug!("POST redemption execute for subscription: {id}");

    let result = app_state.autopay.execute_redemption(&request).await?;

    Ok(Json(ApiResponse::new(StatusCode::OK.into(), result)))
}

/// POST cancel a subscription
#[utoipa::path(
    post,
    path = "/api/autopay/subscriptions/{id}/cancel",
    params(
        ("id" = String, Path, description = "Merchant subscription id")
    ),
    responses(
        (status = 200, description = "Cancellation accepted"),
        (status = 502, description = "Gateway rejected the request")
    )
)]
pub async fn cancel(
    State(app_state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, Error> {
    info!("POST cancel subscription: {id}");
    let result = app_state.autopay.cancel_subscription(&id).await?;

    Ok(Json(ApiResponse::new(StatusCode::OK.into(), result)))
}

/// GET the status of a transaction created through a signed call.
#[utoipa::path(
    get,
    path = "/api/autopay/transactions/{id}/status",
    params(
        ("id" = String, Path, description = "Merchant transaction id")
    ),
    responses(
        (status = 200, description = "Transaction status, with the decoded response attached when present"),
        (status = 502, description = "Gateway rejected the request")
    )
)]
pub async fn transaction_status(
    State(app_state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, Error> {
    debug!("GET transaction status for: {id}");
    let status = app_state.autopay.transaction_status(&id).await?;

    Ok(Json(ApiResponse::new(StatusCode::OK.into(), status)))
}

/// GET the status of a recurring init or debit transaction.
#[utoipa::path(
    get,
    path = "/api/autopay/recurring/transactions/{id}/status",
    params(
        ("id" = String, Path, description = "Merchant transaction id returned by a recurring setup or debit")
    ),
    responses(
        (status = 200, description = "Transaction status, with the decoded response attached when present"),
        (status = 502, description = "Gateway rejected the request"),
        (status = 504, description = "Gateway did not answer in time")
    )
)]
pub async fn recurring_transaction_status(
    State(app_state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, Error> {
    debug!("GET recurring transaction status for: {id}");
    let status = app_state.autopay.recurring_transaction_status(&id).await?;

    Ok(Json(ApiResponse::new(StatusCode::OK.into(), status)))
}

/// POST a one-off collect payment
#[utoipa::path(
    post,
    path = "/api/autopay/payments",
    request_body = PaymentParams,
    responses(
        (status = 200, description = "Payment request accepted by the gateway"),
        (status = 400, description = "Missing or malformed phone or amount"),
        (status = 502, description = "Gateway rejected the request")
    )
)]
pub async fn pay(
    State(app_state): State<AppState>,
    Json(params): Json<PaymentParams>,
) -> Result<impl IntoResponse, Error> {
    let request = PaymentRequest::try_from(params)?;
    debug!("POST one-off payment of {}", request.amount);

    let outcome = app_state.autopay.legacy_pay(&request).await?;

    Ok(Json(ApiResponse::new(StatusCode::OK.into(), outcome)))
}
