use tip_server::{Config, Server, ServerState, setup_environment};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. .env before anything reads the environment
    dotenv::dotenv().ok();

    // 2. Config + logging
    let config = Config::from_env();
    setup_environment(&config);

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "Tip server starting...");

    // 3. Engine state
    let state = ServerState::initialize(&config);

    // 4. HTTP server (until ctrl-c)
    let server = Server::with_state(config, state);
    if let Err(e) = server.run().await {
        tracing::error!("Server error: {}", e);
        return Err(e);
    }

    Ok(())
}
