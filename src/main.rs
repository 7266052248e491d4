use std::collections::HashMap;
use std::sync::Arc;

use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use telegram_connector::config::Config;
use telegram_connector::connector::TelegramConnector;
use telegram_connector::routes::{AppState, app};

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "telegram_connector=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = match Config::from_env() {
        Ok(c) => Arc::new(c),
        Err(e) => {
            error!(error = %e, "Failed to load configuration");
            eprintln!("Error: Failed to load configuration: {}", e);
            eprintln!("\nRequired environment variables:");
            eprintln!("  BOT_TOKEN        - Telegram bot token issued by @BotFather");
            eprintln!("  INBOUND_CONTEXT  - Unique path segment of the webhook URL");
            eprintln!("\nOptional environment variables:");
            eprintln!(
                "  WEBHOOK_BASE_URL            - Externally reachable base URL (Self-Managed / local)"
            );
            eprintln!(
                "  TELEGRAM_WEBHOOK_BASE_URL   - Environment override for the base URL"
            );
            eprintln!(
                "  WEBHOOK_SECRET_TOKEN        - Shared secret echoed by Telegram on every update"
            );
            eprintln!(
                "  TELEGRAM_API_URL            - Bot API origin (default: https://api.telegram.org)"
            );
            eprintln!("  LISTEN_ADDR                 - Address to bind (default: 0.0.0.0:3000)");
            eprintln!("  ON_UNRESOLVED_BASE_URL      - skip | fail (default: skip)");
            eprintln!(
                "  ON_DEACTIVATE               - always_deregister | deregister_if_credential_present"
            );
            eprintln!("  REGISTER_ON_CLOUD_INFERENCE - true | false (default: true)");
            std::process::exit(1);
        }
    };

    info!(
        listen_addr = %config.listen_addr,
        context = %config.inbound_context,
        "Starting Telegram connector runtime"
    );

    // Create the connector instance and activate it (resolving the callback
    // URL and registering the webhook where configuration allows)
    let connector = Arc::new(TelegramConnector::new(config.clone()));

    let env: HashMap<String, String> = std::env::vars().collect();
    if let Err(e) = connector.activate(&env).await {
        error!(error = %e, "Failed to activate Telegram webhook connector");
        eprintln!("Error: Failed to activate Telegram webhook connector: {}", e);
        std::process::exit(1);
    }

    // Build the HTTP router
    let app_state = Arc::new(AppState {
        connector: connector.clone(),
        config: config.clone(),
    });
    let router = app(app_state);

    // Start the server
    let listener = tokio::net::TcpListener::bind(&config.listen_addr)
        .await
        .expect("Failed to bind to address");

    info!(address = %config.listen_addr, "Server listening");
    info!(
        "Inbound webhook URL: http://<your-host>/inbound/{}",
        config.inbound_context
    );

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server failed to start");

    // Deactivation is best-effort and always completes
    connector.deactivate().await;
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install Ctrl+C handler");
    info!("Shutdown signal received");
}
