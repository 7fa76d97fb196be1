use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::http::StatusCode;
use axum::routing::get;
use axum::Router;
use tasks_core::{RepoError, TaskRepository};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tower::ServiceBuilder;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn, Span};

use crate::config::ServerConfig;
use crate::error::CallError;
use crate::handlers;
use crate::middleware::{handle_panic, timeout_envelope, AccessLog};

/// Shared state accessible from Axum handlers.
#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<dyn TaskRepository>,
}

impl AppState {
    pub fn new(repo: Arc<dyn TaskRepository>) -> Self {
        Self { repo }
    }

    /// Run a repository call on the blocking pool, inside the caller's span.
    pub async fn run<T, F>(&self, f: F) -> Result<T, CallError>
    where
        T: Send + 'static,
        F: FnOnce(&dyn TaskRepository) -> Result<T, RepoError> + Send + 'static,
    {
        let repo = Arc::clone(&self.repo);
        let span = Span::current();
        tokio::task::spawn_blocking(move || span.in_scope(|| f(repo.as_ref())))
            .await
            .map_err(CallError::Aborted)?
            .map_err(CallError::Repo)
    }
}

/// Build the Axum router with all routes and the middleware stack.
pub fn build_router(state: AppState, config: &ServerConfig) -> Router {
    Router::new()
        .route("/", get(handlers::list_tasks).post(handlers::create_task))
        .route(
            "/{id}",
            get(handlers::retrieve_task)
                .patch(handlers::update_task)
                .delete(handlers::delete_task),
        )
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(AccessLog)
                        .on_response(AccessLog),
                )
                .layer(PropagateRequestIdLayer::x_request_id())
                .layer(CatchPanicLayer::custom(handle_panic))
                .layer(axum::middleware::map_response(timeout_envelope))
                .layer(TimeoutLayer::with_status_code(
                    StatusCode::GATEWAY_TIMEOUT,
                    config.request_timeout(),
                )),
        )
}

/// Bind, spawn the server task and return immediately.
pub async fn start(
    config: ServerConfig,
    repo: Arc<dyn TaskRepository>,
) -> Result<ServerHandle, std::io::Error> {
    let router = build_router(AppState::new(repo), &config);
    let listener = tokio::net::TcpListener::bind(config.bind_addr()).await?;
    let addr = listener.local_addr()?;

    info!(%addr, "tasks server started");

    let shutdown = CancellationToken::new();
    let token = shutdown.clone();
    let server = tokio::spawn(async move {
        axum::serve(listener, router)
            .with_graceful_shutdown(async move { token.cancelled().await })
            .await
    });

    Ok(ServerHandle {
        addr,
        shutdown,
        grace: config.shutdown_timeout(),
        server,
    })
}

/// Handle returned by [`start`]. Dropping it leaves the server running.
pub struct ServerHandle {
    addr: SocketAddr,
    shutdown: CancellationToken,
    grace: Duration,
    server: JoinHandle<std::io::Result<()>>,
}

impl ServerHandle {
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn port(&self) -> u16 {
        self.addr.port()
    }

    /// Token that stops the server when cancelled.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Stop accepting connections and wait for in-flight requests.
    ///
    /// Requests still running after the configured grace period are aborted.
    pub async fn shutdown(self) -> std::io::Result<()> {
        self.shutdown.cancel();
        info!(grace_secs = self.grace.as_secs(), "waiting for in-flight requests");
        self.join().await
    }

    /// Block until the shutdown token is cancelled elsewhere, then drain.
    pub async fn wait(self) -> std::io::Result<()> {
        self.shutdown.cancelled().await;
        self.join().await
    }

    async fn join(mut self) -> std::io::Result<()> {
        match tokio::time::timeout(self.grace, &mut self.server).await {
            Ok(joined) => joined.map_err(std::io::Error::other)?,
            Err(_) => {
                warn!("shutdown timed out after {:?}, aborting server task", self.grace);
                self.server.abort();
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tasks_store::MemoryTaskRepo;
    use tower::ServiceExt;

    fn make_router() -> Router {
        let state = AppState::new(Arc::new(MemoryTaskRepo::new()));
        build_router(state, &ServerConfig::default())
    }

    fn local_config() -> ServerConfig {
        ServerConfig {
            bind: "127.0.0.1:0".into(),
            ..ServerConfig::default()
        }
    }

    #[tokio::test]
    async fn unknown_route_returns_404() {
        let req = Request::builder()
            .uri("/a/b/c")
            .body(Body::empty())
            .unwrap();
        let resp = make_router().oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn unsupported_method_returns_405() {
        let req = Request::builder()
            .method("PUT")
            .uri("/")
            .body(Body::empty())
            .unwrap();
        let resp = make_router().oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn run_passes_repo_errors_through() {
        let state = AppState::new(Arc::new(MemoryTaskRepo::new()));
        let id = tasks_core::TaskId::new();
        let err = state.run(move |repo| repo.retrieve(&id)).await.unwrap_err();
        assert!(matches!(err, CallError::Repo(RepoError::NotFound(_))));
    }

    #[tokio::test]
    async fn run_reports_panics_as_aborted() {
        let state = AppState::new(Arc::new(MemoryTaskRepo::new()));
        let err = state
            .run(|_repo| -> Result<(), RepoError> { panic!("repository exploded") })
            .await
            .unwrap_err();
        assert!(matches!(err, CallError::Aborted(ref e) if e.is_panic()));
    }

    #[tokio::test]
    async fn server_starts_on_random_port() {
        let handle = start(local_config(), Arc::new(MemoryTaskRepo::new()))
            .await
            .unwrap();
        assert!(handle.port() > 0);
        assert!(handle.addr().ip().is_loopback());
        handle.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn shutdown_token_stops_server() {
        let handle = start(local_config(), Arc::new(MemoryTaskRepo::new()))
            .await
            .unwrap();
        let token = handle.shutdown_token();
        assert!(!token.is_cancelled());
        token.cancel();
        handle.wait().await.unwrap();
    }

    #[tokio::test]
    async fn bind_conflict_is_an_error() {
        let first = start(local_config(), Arc::new(MemoryTaskRepo::new()))
            .await
            .unwrap();
        let taken = ServerConfig {
            bind: first.addr().to_string(),
            ..ServerConfig::default()
        };
        assert!(start(taken, Arc::new(MemoryTaskRepo::new())).await.is_err());
        first.shutdown().await.unwrap();
    }
}
