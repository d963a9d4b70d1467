use std::{fs::OpenOptions, net::SocketAddr, sync::Arc};

use axum_server::tls_rustls::RustlsConfig;
use server::{config::ServerConfig, server_state::ServerState, visit_endpoint};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use visit_tracker_data_management::DataManager;

#[tokio::main]
async fn main() {
    std::fs::create_dir_all("server/log").unwrap();
    let log_file = "server/log/server.log";

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_file)
        .unwrap();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| format!("{}=trace", env!("CARGO_CRATE_NAME")).into())
        )
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::fmt::layer().with_ansi(false).with_writer(file))
        .init();

    tracing::info!("Starting server...");

    let config = ServerConfig::load();
    let data_manager = DataManager::start(config.data_manager_config()).await.unwrap();

    let server_state = Arc::new(ServerState {
        config: config.clone(),
        data_manager,
    });

    let app = visit_endpoint::build_router(server_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));

    match &config.tls {
        Some(tls) => {
            let rustls_config = RustlsConfig::from_pem_file(&tls.cert_path, &tls.key_path)
                .await
                .unwrap();

            tracing::info!("Listening on {} (TLS)", addr);
            axum_server::bind_rustls(addr, rustls_config)
                .serve(app.into_make_service_with_connect_info::<SocketAddr>())
                .await
                .unwrap();
        }
        None => {
            let listener = tokio::net::TcpListener::bind(addr).await.unwrap();

            tracing::info!("Listening on {}", listener.local_addr().unwrap());
            axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
                .await
                .unwrap();
        }
    }
}
