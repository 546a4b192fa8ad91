use reactor_http::config::Config;
use reactor_http::server::Server;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true)
        .init();

    let cfg = Config::load()?;
    let handle = Server::start(cfg)?;
    tracing::info!("Serving on {}", handle.local_addr());

    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutdown signal received");

    handle.shutdown()?;
    tokio::task::spawn_blocking(move || handle.join()).await??;

    Ok(())
}
