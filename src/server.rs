//! HTTP listener lifecycle and bounded graceful shutdown

use axum::Router;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use crate::error::Result;

/// Serve `router` on `listener` until `shutdown` is cancelled.
///
/// Once cancelled the listener stops accepting and in-flight requests get
/// `grace` to finish. Anything still running after that is aborted.
pub async fn run(
    listener: TcpListener,
    router: Router,
    shutdown: CancellationToken,
    grace: Duration,
) -> Result<()> {
    let token = shutdown.clone();
    let mut server = tokio::spawn(async move {
        axum::serve(listener, router)
            .with_graceful_shutdown(async move { token.cancelled().await })
            .await
    });

    tokio::select! {
        joined = &mut server => {
            joined??;
            return Ok(());
        }
        () = shutdown.cancelled() => {
            tracing::info!("Shutting down...");
        }
    }

    match tokio::time::timeout(grace, &mut server).await {
        Ok(joined) => {
            joined??;
            tracing::info!("Server successfully closed");
        }
        Err(_) => {
            tracing::warn!(
                "In-flight requests still running after {:?}, forcing shutdown",
                grace
            );
            server.abort();
        }
    }

    Ok(())
}

/// Cancel `token` on Ctrl-C, or SIGTERM on Unix
pub async fn cancel_on_signal(token: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }

    token.cancel();
}
