use crate::{controller::health_check_controller, params, AppState};
use axum::{
    http::{header, HeaderValue, Method},
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;

use crate::controller::{autopay_controller, callback_controller, webhook_controller};

use log::*;
use utoipa::OpenApi;
use utoipa_rapidoc::RapiDoc;

// This is the global definition of our OpenAPI spec. To be a part
// of the rendered spec, a path and schema must be listed here.
#[derive(OpenApi)]
#[openapi(
        info(
            title = "AutoPay Gateway API"
        ),
        paths(
            health_check_controller::health_check,
            autopay_controller::initiate,
            autopay_controller::order_status,
            autopay_controller::subscription_status,
            autopay_controller::notify,
            autopay_controller::redeem,
            autopay_controller::cancel,
            autopay_controller::transaction_status,
            autopay_controller::recurring_transaction_status,
            autopay_controller::pay,
            webhook_controller::receive,
            callback_controller::callback,
        ),
        components(
            schemas(
                domain::subscription::InitiateRequest,
                domain::subscription::RedemptionParams,
                domain::webhook::WebhookEnvelope,
                domain::webhook::WebhookAck,
                params::autopay::CallbackParams,
                params::autopay::PaymentParams,
            )
        ),
        tags(
            (name = "autopay_gateway", description = "UPI AutoPay subscription API")
        )
    )]
struct ApiDoc;

pub fn define_routes(app_state: AppState) -> Router {
    let cors = cors_layer(&app_state.config.allowed_origins);

    Router::new()
        .merge(health_routes())
        .merge(autopay_routes(app_state.clone()))
        .merge(gateway_notification_routes(app_state))
        .merge(RapiDoc::with_openapi("/api-docs/openapi.json", ApiDoc::openapi()).path("/api/docs"))
        .layer(cors)
}

fn health_routes() -> Router {
    Router::new().route("/health", get(health_check_controller::health_check))
}

fn autopay_routes(app_state: AppState) -> Router {
    Router::new()
        .route("/api/autopay/initiate", post(autopay_controller::initiate))
        .route("/api/autopay/payments", post(autopay_controller::pay))
        .route(
            "/api/autopay/orders/{id}/status",
            get(autopay_controller::order_status),
        )
        .route(
            "/api/autopay/subscriptions/{id}/status",
            get(autopay_controller::subscription_status),
        )
        .route(
            "/api/autopay/subscriptions/{id}/notify",
            post(autopay_controller::notify),
        )
        .route(
            "/api/autopay/subscriptions/{id}/redeem",
            post(autopay_controller::redeem),
        )
        .route(
            "/api/autopay/subscriptions/{id}/cancel",
            post(autopay_controller::cancel),
        )
        .route(
            "/api/autopay/transactions/{id}/status",
            get(autopay_controller::transaction_status),
        )
        .route(
            "/api/autopay/recurring/transactions/{id}/status",
            get(autopay_controller::recurring_transaction_status),
        )
        .with_state(app_state)
}

// Called by the gateway and the customer's browser, never by our own frontend.
fn gateway_notification_routes(app_state: AppState) -> Router {
    Router::new()
        .route("/api/autopay/webhook", post(webhook_controller::receive))
        .route("/api/autopay/callback", post(callback_controller::callback))
        .with_state(app_state)
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring malformed CORS origin: {origin}");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
}
