use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::info;

use crate::config::ServerConfig;
use crate::http::connection::Connection;
use crate::proxy::Router;

/// Bind the configured address and serve connections until the task is dropped.
pub async fn run(server: &ServerConfig, router: Arc<Router>) -> anyhow::Result<()> {
    let listener = TcpListener::bind(&server.listen_addr).await?;
    info!("Listening on {}", listener.local_addr()?);

    serve(listener, router, server.max_body_bytes).await
}

/// Accept loop over an already-bound listener.
pub async fn serve(
    listener: TcpListener,
    router: Arc<Router>,
    max_body_bytes: usize,
) -> anyhow::Result<()> {
    loop {
        let (socket, peer) = listener.accept().await?;
        tracing::debug!("Accepted connection from {}", peer);

        let router = Arc::clone(&router);
        tokio::spawn(async move {
            let mut conn = Connection::new(socket, peer, router, max_body_bytes);
            if let Err(e) = conn.run().await {
                tracing::error!("Connection error from {}: {}", peer, e);
            }
        });
    }
}
