//! HTTP server lifecycle.
//!
//! [`ServerHandle::start`] binds the socket and runs an accept loop on a
//! background task. Every connection is served on its own task inside a
//! [`JoinSet`] owned by that loop. [`ServerHandle::stop`] consumes the handle,
//! stops accepting connections and waits a bounded time for in-flight
//! requests; connections still open after that are aborted.

use std::{io, net::SocketAddr, time::Duration};

use axum::Router;
use hyper_util::{
    rt::{TokioExecutor, TokioIo},
    server::conn::auto,
    service::TowerToHyperService,
};
use tokio::{
    net::{TcpListener, TcpStream},
    task::{JoinHandle, JoinSet},
};
use tokio_util::sync::CancellationToken;

/// A running server. Dropping the handle without calling [`stop`](Self::stop)
/// does not cancel anything: the server keeps running until the runtime shuts
/// down.
pub struct ServerHandle {
    local_addr: SocketAddr,
    shutdown: CancellationToken,
    task: JoinHandle<()>,
}

impl ServerHandle {
    /// Bind `addr` and start serving `app`
    pub async fn start(addr: SocketAddr, app: Router) -> io::Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        let local_addr = listener.local_addr()?;
        let shutdown = CancellationToken::new();

        let task = tokio::spawn(accept_loop(listener, app, shutdown.clone()));

        tracing::info!("Server listening on http://{}", local_addr);

        Ok(Self {
            local_addr,
            shutdown,
            task,
        })
    }

    /// Address actually bound, useful when started on port 0
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Stop accepting connections and drain in-flight requests for at most
    /// `deadline`. Requests still running after that are abandoned: their
    /// connections are closed before this returns.
    pub async fn stop(self, deadline: Duration) -> io::Result<()> {
        tracing::info!("Shutting down server gracefully");

        self.shutdown.cancel();
        let mut task = self.task;

        match tokio::time::timeout(deadline, &mut task).await {
            Ok(Ok(())) => {
                tracing::info!("Server stopped");
                Ok(())
            }
            Ok(Err(e)) => Err(io::Error::new(io::ErrorKind::Other, e)),
            Err(_) => {
                tracing::warn!(
                    "In-flight requests did not finish within {:?}, abandoning them",
                    deadline
                );
                // Dropping the loop's JoinSet aborts every connection task
                task.abort();
                let _ = task.await;
                tracing::info!("Server stopped");
                Ok(())
            }
        }
    }
}

async fn accept_loop(listener: TcpListener, app: Router, shutdown: CancellationToken) {
    let mut connections = JoinSet::new();

    loop {
        tokio::select! {
            () = shutdown.cancelled() => break,
            accepted = listener.accept() => match accepted {
                Ok((stream, remote)) => {
                    tracing::trace!("Accepted connection from {}", remote);
                    connections.spawn(serve_connection(stream, app.clone(), shutdown.clone()));
                }
                Err(e) => {
                    tracing::warn!("Failed to accept connection: {}", e);
                    tokio::time::sleep(Duration::from_millis(50)).await;
                }
            },
            Some(_) = connections.join_next(), if !connections.is_empty() => {}
        }
    }

    drop(listener);

    while connections.join_next().await.is_some() {}
}

async fn serve_connection(stream: TcpStream, app: Router, shutdown: CancellationToken) {
    let builder = auto::Builder::new(TokioExecutor::new());
    let connection = builder.serve_connection(TokioIo::new(stream), TowerToHyperService::new(app));
    tokio::pin!(connection);

    let result = tokio::select! {
        result = connection.as_mut() => result,
        () = shutdown.cancelled() => {
            // Finish the request in progress, then close
            connection.as_mut().graceful_shutdown();
            connection.await
        }
    };

    if let Err(e) = result {
        tracing::debug!("Connection closed with error: {}", e);
    }
}

/// Wait for SIGINT, or SIGTERM on Unix
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => tracing::info!("Received SIGINT"),
        () = terminate => tracing::info!("Received SIGTERM"),
    }
}
