//! Read-only HTTP status server
//!
//! Exposes two endpoints on `127.0.0.1:9190` (configurable):
//! - `GET /status`: `{"conflicts": <int>, "alerts": <int>}`
//! - `GET /metrics`: Prometheus text exposition format
//!
//! Both are projections of [`PerfMetrics`]; nothing here mutates engine state.

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::header::{HeaderValue, CONTENT_TYPE};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::metrics::PerfMetrics;

/// Body of `GET /status`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusSnapshot {
    pub conflicts: u64,
    pub alerts: u64,
}

impl StatusSnapshot {
    /// Reads the current counts from `metrics`.
    pub fn from_metrics(metrics: &PerfMetrics) -> Self {
        Self {
            conflicts: metrics.conflicts_detected.get(),
            alerts: metrics.alerts_total.get(),
        }
    }
}

/// HTTP server exposing engine status and metrics.
pub struct StatusServer {
    metrics: Arc<PerfMetrics>,
    addr: SocketAddr,
}

impl StatusServer {
    /// Creates a new `StatusServer`.
    ///
    /// # Arguments
    /// * `metrics` - The shared engine counters
    /// * `endpoint` - Address to bind, e.g. `"127.0.0.1:9190"`
    pub fn new(metrics: Arc<PerfMetrics>, endpoint: &str) -> anyhow::Result<Self> {
        let addr: SocketAddr = endpoint.parse()?;
        Ok(Self { metrics, addr })
    }

    /// Binds the listener and serves until `shutdown` is cancelled.
    pub async fn run(&self, shutdown: CancellationToken) -> anyhow::Result<()> {
        let listener = TcpListener::bind(self.addr).await?;
        self.serve(listener, shutdown).await
    }

    /// Serves on an already-bound listener until `shutdown` is cancelled.
    pub async fn serve(
        &self,
        listener: TcpListener,
        shutdown: CancellationToken,
    ) -> anyhow::Result<()> {
        info!(addr = %listener.local_addr()?, "Status server listening");

        loop {
            tokio::select! {
                result = listener.accept() => {
                    let (stream, _) = result?;
                    let io = TokioIo::new(stream);
                    let metrics = Arc::clone(&self.metrics);

                    tokio::spawn(async move {
                        let service = service_fn(move |req| {
                            let metrics = Arc::clone(&metrics);
                            async move { handle_request(req, &metrics) }
                        });

                        if let Err(e) = http1::Builder::new().serve_connection(io, service).await {
                            error!(error = %e, "Status HTTP connection error");
                        }
                    });
                }
                _ = shutdown.cancelled() => {
                    info!("Status server shutting down");
                    break;
                }
            }
        }

        Ok(())
    }
}

/// Handle a single HTTP request.
fn handle_request<B>(
    req: Request<B>,
    metrics: &PerfMetrics,
) -> Result<Response<Full<Bytes>>, Infallible> {
    if req.method() != Method::GET {
        return Ok(respond(StatusCode::METHOD_NOT_ALLOWED, None, "Method Not Allowed"));
    }

    let resp = match req.uri().path() {
        "/status" => {
            let snapshot = StatusSnapshot::from_metrics(metrics);
            match serde_json::to_vec(&snapshot) {
                Ok(body) => respond(StatusCode::OK, Some("application/json"), body),
                Err(e) => respond(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    None,
                    format!("Failed to encode status: {e}"),
                ),
            }
        }
        "/metrics" => match metrics.encode() {
            Ok(body) => respond(
                StatusCode::OK,
                Some("text/plain; version=0.0.4; charset=utf-8"),
                body,
            ),
            Err(e) => respond(
                StatusCode::INTERNAL_SERVER_ERROR,
                None,
                format!("Failed to encode metrics: {e}"),
            ),
        },
        _ => respond(StatusCode::NOT_FOUND, None, "Not Found"),
    };

    Ok(resp)
}

fn respond(
    status: StatusCode,
    content_type: Option<&'static str>,
    body: impl Into<Bytes>,
) -> Response<Full<Bytes>> {
    let mut resp = Response::new(Full::new(body.into()));
    *resp.status_mut() = status;
    if let Some(content_type) = content_type {
        resp.headers_mut()
            .insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
    }
    resp
}
