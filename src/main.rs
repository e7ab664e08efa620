use tracing_subscriber::EnvFilter;
use waypoint::config::Config;
use waypoint::server;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .with_level(true)
        .init();

    let cfg = Config::load()?;

    if !cfg.backend.looks_valid() {
        tracing::warn!(
            backend = %cfg.backend,
            "Backend address is not an absolute URL; forwarded requests will fail"
        );
    }

    let router = waypoint::build_router(&cfg)?;
    tracing::info!(backend = %cfg.backend, "Resolved backend address");
    for rule in router.rules() {
        tracing::info!(rule = %rule, "Rewrite rule");
    }

    tokio::select! {
        res = server::listener::run(&cfg.server, router) => {
            res?;
        }

        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutdown signal received");
        }
    }

    Ok(())
}
