use std::future::Future;

use axum::extract::Request;
use axum::middleware::{self, Next};
use axum::routing::get;
use axum::Router;
use tokio::net::TcpListener;
use tracing::instrument::WithSubscriber;
use tracing::Dispatch;
use tower_http::trace::TraceLayer;
use tower_http::trace::{DefaultOnFailure, DefaultOnResponse};
use tower_http::LatencyUnit;

mod config;
mod handlers;

pub use config::Config;
pub use handlers::NOT_FOUND_BODY;

use crate::ServiceState;

pub const ROOT_PATH: &str = "/";
pub const READY_PATH: &str = "/_ready";
pub const LIVE_PATH: &str = "/_live";
pub const VERSION_PATH: &str = "/_version";

/// The fixed endpoints every service exposes; unknown paths get a 404.
pub fn router(state: ServiceState, trace_level: tracing::Level) -> Router {
    let trace_layer = TraceLayer::new_for_http()
        .on_response(
            DefaultOnResponse::new()
                .include_headers(false)
                .level(trace_level)
                .latency_unit(LatencyUnit::Micros),
        )
        .on_failure(DefaultOnFailure::new().latency_unit(LatencyUnit::Micros));

    Router::new()
        .route(ROOT_PATH, get(handlers::root))
        .route(READY_PATH, get(handlers::ready))
        .route(LIVE_PATH, get(handlers::live))
        .route(VERSION_PATH, get(handlers::version))
        .fallback(handlers::not_found)
        .with_state(state)
        .layer(trace_layer)
}

/// Route every request's handling, request traces included, to `dispatch`.
///
/// Connections are served on their own tasks, so the subscriber of the
/// task running [`run`] does not reach them.
pub fn with_dispatch(router: Router, dispatch: Dispatch) -> Router {
    router.layer(middleware::from_fn(move |request: Request, next: Next| {
        next.run(request).with_subscriber(dispatch.clone())
    }))
}

pub async fn run<F>(listener: TcpListener, router: Router, shutdown: F) -> Result<(), HttpServerError>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr = listener.local_addr()?;
    tracing::debug!(addr = %addr, "server listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown)
        .await?;

    Ok(())
}

#[derive(Debug, thiserror::Error)]
pub enum HttpServerError {
    #[error("an error occurred running the HTTP server: {0}")]
    ServingFailed(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use common::logger::{Logger, MemoryWriter};
    use http::{Method, Request, StatusCode};
    use tower::ServiceExt;

    use super::*;

    async fn call(router: Router, method: Method, path: &str) -> (StatusCode, String) {
        let request = Request::builder()
            .method(method)
            .uri(path)
            .body(Body::empty())
            .unwrap();
        let response = router.oneshot(request).await.unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, String::from_utf8(body.to_vec()).unwrap())
    }

    fn order_router() -> Router {
        router(
            ServiceState::new("order", "test-version"),
            tracing::Level::DEBUG,
        )
    }

    #[tokio::test]
    async fn test_fixed_routes() {
        let cases = [
            ("/", "order service"),
            ("/_ready", "order service is ready"),
            ("/_live", "order service is alive"),
            ("/_version", "test-version"),
        ];

        for (path, expected) in cases {
            let (status, body) = call(order_router(), Method::GET, path).await;
            assert_eq!(status, StatusCode::OK, "GET {}", path);
            assert_eq!(body, expected, "GET {}", path);
        }
    }

    #[tokio::test]
    async fn test_unknown_paths_are_not_found() {
        for path in ["/unknown", "/_ready/extra", "/_status", "/version"] {
            let (status, body) = call(order_router(), Method::GET, path).await;
            assert_eq!(status, StatusCode::NOT_FOUND, "GET {}", path);
            assert_eq!(body, NOT_FOUND_BODY);
            assert_eq!(body, "404 page not found\n");
        }
    }

    #[tokio::test]
    async fn test_request_traces_reach_dispatch() {
        let writer = MemoryWriter::new();
        let logger = Logger::with_writer("debug", writer.clone()).unwrap();
        let router = with_dispatch(order_router(), logger.dispatch().clone());

        let (status, _) = call(router, Method::GET, "/unknown").await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        let finished = writer
            .lines()
            .iter()
            .any(|l| l.contains("finished processing request"));
        assert!(finished, "request trace missing: {:?}", writer.lines());
    }

    #[tokio::test]
    async fn test_head_is_served_without_body() {
        let (status, body) = call(order_router(), Method::HEAD, "/_live").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.is_empty());
    }

    #[tokio::test]
    async fn test_non_get_on_known_path_is_rejected() {
        let (status, _) = call(order_router(), Method::POST, "/_ready").await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn test_empty_version_is_served_as_empty_body() {
        let router = router(ServiceState::new("billing", ""), tracing::Level::DEBUG);
        let (status, body) = call(router, Method::GET, "/_version").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "");
    }
}
