use std::net::SocketAddr;

use axum::{
    Router,
    middleware,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

use kenni_auth::{AuthState, auth_routes, session_layer};

use crate::pages;

async fn healthz() -> &'static str {
    "ok"
}

/// Assembles the application: auth routes, pages, session lookup and
/// request tracing.
pub fn build_app(auth: AuthState) -> Router {
    let pages = Router::new()
        .route("/", get(pages::home))
        .route("/login", get(pages::login_page))
        .route("/notices/{id}/dismiss", post(pages::dismiss_notice))
        .route("/dashboard", get(pages::dashboard))
        .route("/profile", get(pages::profile))
        .route("/admin", get(pages::admin))
        .with_state(auth.clone());

    Router::new()
        .route("/healthz", get(healthz))
        .merge(auth_routes(auth.clone()))
        .merge(pages)
        .layer(middleware::from_fn_with_state(auth, session_layer))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &axum::http::Request<_>| {
                    use tracing::field::Empty;
                    // Query strings carry OAuth codes and state; log the path only.
                    tracing::info_span!(
                        "http.request",
                        http.method = %req.method(),
                        http.target = %req.uri().path(),
                        http.status_code = Empty
                    )
                })
                .on_response(
                    |res: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     span: &tracing::Span| {
                        span.record(
                            "http.status_code",
                            tracing::field::display(res.status().as_u16()),
                        );
                        tracing::info!(
                            http.status = %res.status().as_u16(),
                            elapsed_ms = %latency.as_millis(),
                            "request handled"
                        );
                    },
                ),
        )
}

pub struct KenniServer {
    addr: SocketAddr,
    app: Router,
}

impl KenniServer {
    pub fn new(addr: SocketAddr, auth: AuthState) -> Self {
        Self {
            addr,
            app: build_app(auth),
        }
    }

    pub async fn run(self) -> anyhow::Result<()> {
        let listener = tokio::net::TcpListener::bind(self.addr).await?;
        tracing::info!("listening on {}", self.addr);
        axum::serve(listener, self.app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;
        Ok(())
    }
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    tracing::info!("shutdown signal received");
}
