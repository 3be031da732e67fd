use anyhow::Result;
use feed_service::app::build_router;
use feed_service::config::Config;
use feed_service::logger::Logger;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Arc::new(Config::load()?);
    let logger = Logger::new("feed-service");

    if matches!(std::env::args().nth(1).as_deref(), Some("check-config")) {
        logger.info(
            "config.check_passed",
            serde_json::json!({
                "port": config.port,
                "cacheTtlSeconds": config.cache_ttl.as_secs(),
                "dataDir": config.data_dir.display().to_string(),
            }),
        );
        return Ok(());
    }

    let router = build_router(config.clone(), logger.clone());

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    logger.info(
        "server.starting",
        serde_json::json!({ "port": config.port }),
    );

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        router.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    logger.info("server.stopped", serde_json::json!({}));
    Ok(())
}

async fn shutdown_signal() {
    let _ = signal::ctrl_c().await;
}
