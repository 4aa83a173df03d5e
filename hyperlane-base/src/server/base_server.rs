use std::future::Future;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use derive_new::new;
use tokio::net::TcpListener;

use crate::ExporterMetrics;

/// A server that serves the exporter's routes on an already bound listener
#[derive(new, Debug)]
pub struct Server {
    listener: TcpListener,
    metrics: Arc<ExporterMetrics>,
}

impl Server {
    /// Bind `host:port` and build a server exposing `metrics`.
    ///
    /// Binding happens eagerly so that a busy port is reported before any
    /// other startup work.
    pub async fn bind(host: &str, port: u16, metrics: Arc<ExporterMetrics>) -> io::Result<Self> {
        let listener = TcpListener::bind((host, port)).await?;
        Ok(Self::new(listener, metrics))
    }

    /// The address the server is listening on.
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Serve until `shutdown` resolves.
    pub async fn serve<F>(self, shutdown: F) -> io::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.serve_with_custom_router(Router::new(), shutdown).await
    }

    /// Serve the exporter routes plus `router` until `shutdown` resolves.
    ///
    /// routes:
    ///  - metrics - serving Prometheus text format reports on `/metrics`
    ///  - custom_routes - additional routes merged in by the agent
    pub async fn serve_with_custom_router<F>(self, router: Router, shutdown: F) -> io::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = self.listener.local_addr()?;
        tracing::info!(%addr, "starting server");

        let metrics = self.metrics.clone();
        let app = Router::new()
            .route("/metrics", get(move || Self::gather_metrics(metrics)))
            .merge(router);

        axum::serve(self.listener, app)
            .with_graceful_shutdown(shutdown)
            .await?;
        tracing::info!(%addr, "server stopped");
        Ok(())
    }

    /// Gather available metrics into an encoded (plaintext, Prometheus text
    /// format) report.
    async fn gather_metrics(metrics: Arc<ExporterMetrics>) -> Response {
        tracing::debug!("Traversing route for /metrics endpoint for serving Prometheus metrics");
        let report = match metrics.gather() {
            Ok(report) => report,
            Err(err) => {
                tracing::warn!(error = %err, "Failed to gather metrics");
                return (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Failed to gather metrics",
                )
                    .into_response();
            }
        };
        match String::from_utf8(report) {
            Ok(body) => (
                StatusCode::OK,
                [(header::CONTENT_TYPE, metrics.content_type())],
                body,
            )
                .into_response(),
            Err(_) => (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response(),
        }
    }
}
