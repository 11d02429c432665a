use std::sync::Arc;

use domain::gateway::autopay::AutoPayClient;
use domain::webhook::{EventSink, LoggingEventSink};
use gateway_auth::webhook::WebhookValidator;
use log::*;
use service::config::Config;
use tokio::net::TcpListener;

pub(crate) mod controller;
mod error;
pub(crate) mod extractors;
pub(crate) mod params;
pub mod router;

pub use error::{Error, Result};

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub autopay: Arc<AutoPayClient>,
    pub webhook_validator: Arc<dyn WebhookValidator>,
    pub event_sink: Arc<dyn EventSink>,
}

impl AppState {
    /// State with a validator keyed by the client's own credentials and a logging sink.
    pub fn new(config: Config, autopay: AutoPayClient) -> Self {
        let webhook_validator = Arc::new(autopay.webhook_validator());
        Self {
            config,
            autopay: Arc::new(autopay),
            webhook_validator,
            event_sink: Arc::new(LoggingEventSink),
        }
    }

    pub fn with_event_sink(mut self, event_sink: Arc<dyn EventSink>) -> Self {
        self.event_sink = event_sink;
        self
    }
}

pub async fn init_server(app_state: AppState) -> std::io::Result<()> {
    let interface = app_state
        .config
        .interface
        .clone()
        .unwrap_or_else(|| "127.0.0.1".to_string());
    let server_url = format!("{}:{}", interface, app_state.config.port);

    let listener = TcpListener::bind(&server_url).await?;
    info!("Server starting... listening for connections on http://{server_url}");

    axum::serve(listener, router::define_routes(app_state)).await
}
