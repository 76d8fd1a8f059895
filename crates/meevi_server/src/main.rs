use log::{error, info};
use meevi_core::db::open_db;
use meevi_server::config::ServerConfig;
use meevi_server::photo_store::PhotoStore;
use meevi_server::{router, AppState};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    if let Err(err) = meevi_core::logging::init_from_env() {
        eprintln!("logging disabled: {err}");
    }

    let config = ServerConfig::from_env()?;
    std::fs::create_dir_all(&config.photo_dir)?;
    let conn = open_db(&config.db_path)?;
    let photos = PhotoStore::new(&config.photo_dir, config.public_base_url.clone());
    let app = router(AppState::new(conn, photos));

    info!(
        "event=server_start module=server status=ok bind_addr={} db_path={} photo_dir={}",
        config.bind_addr,
        config.db_path.display(),
        config.photo_dir.display()
    );
    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("event=server_stop module=server status=ok");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!("event=server_signal module=server status=error message={err}");
    }
}
