use domain::gateway::autopay::AutoPayClient;
use log::{error, info};
use service::{config::Config, logging::Logger};

#[tokio::main]
async fn main() {
    let config = Config::new();
    Logger::init_logger(&config as &Config);

    info!(
        "Starting AutoPay gateway service [{:?}] against {}",
        config.runtime_env(),
        config.api_base_url()
    );

    let autopay = match AutoPayClient::new(&config) {
        Ok(client) => client,
        Err(e) => {
            error!("Failed to configure the gateway client: {e}");
            std::process::exit(1);
        }
    };

    let app_state = web::AppState::new(config, autopay);

    if let Err(e) = web::init_server(app_state).await {
        error!("Server stopped: {e}");
        std::process::exit(1);
    }
}
