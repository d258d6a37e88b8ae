use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use training_bff_server::{
    app,
    auth::{AppState, ProviderClient},
    config::ServerConfig,
    trainings::GatewayClient,
};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration from environment
    let config = ServerConfig::from_env().expect("failed to load configuration");
    config.validate().expect("invalid configuration");
    tracing::info!(
        realm = config.keycloak.realm(),
        keycloak = config.keycloak.base_url(),
        gateway = config.api_gateway_url,
        "Loaded configuration"
    );

    let provider = ProviderClient::new(config.keycloak.clone(), config.redirect_uri())
        .expect("failed to create identity provider client");

    let gateway =
        GatewayClient::new(&config.api_gateway_url).expect("failed to create gateway client");

    let addr = format!("{}:{}", config.host, config.port);
    let state = AppState::new(config, provider, gateway);
    let app = app::router(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("failed to bind to address");

    tracing::info!("listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("server error");
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("failed to install Ctrl+C handler");
    tracing::info!("Shutting down");
}
