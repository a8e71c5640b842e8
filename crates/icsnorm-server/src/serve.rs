//! HTTP listener lifecycle.

use tokio::net::TcpListener;
use tracing::info;

use crate::config::ServerConfig;
use crate::error::ServerResult;
use crate::handler::{AppState, router};
use crate::pipeline::Pipeline;
use crate::signals::{ShutdownSignal, SignalHandler};

/// Binds `config.bind` and serves until SIGTERM or Ctrl+C.
pub async fn serve(config: ServerConfig) -> ServerResult<()> {
    config.validate()?;
    let pipeline = Pipeline::from_config(&config)?;
    let listener = TcpListener::bind(config.bind).await?;

    let signals = SignalHandler::new();
    signals.spawn_listener();

    serve_on(listener, AppState::new(pipeline, config), signals.shutdown()).await
}

/// Serves on an already bound listener until `shutdown` fires.
pub async fn serve_on(
    listener: TcpListener,
    state: AppState,
    shutdown: ShutdownSignal,
) -> ServerResult<()> {
    let addr = listener.local_addr()?;
    info!(
        %addr,
        environment = %state.config.environment,
        tzid = %state.config.tzid,
        "Listening"
    );

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown.wait())
        .await?;

    info!("Server stopped");
    Ok(())
}
