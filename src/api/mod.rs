use crate::{code::CodeGenerator, directory::Authenticator, session::SessionStore};
use anyhow::{Context, Result};
use axum::{
    body::Body,
    extract::{ConnectInfo, MatchedPath},
    http::{HeaderName, HeaderValue, Request, Uri},
    routing::{get, post},
    Extension, Router,
};
use std::{net::SocketAddr, sync::Arc};
use tokio::{net::TcpListener, signal};
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer, request_id::PropagateRequestIdLayer,
    set_header::SetRequestHeaderLayer, trace::TraceLayer,
};
use tracing::{error, info, info_span, Span};
use ulid::Ulid;

pub mod handlers;
mod openapi;

pub use openapi::openapi;

const REQUEST_ID: &str = "x-request-id";

/// The three components every handler works with.
pub struct Services {
    pub auth: Arc<dyn Authenticator>,
    pub codes: Arc<dyn CodeGenerator>,
    pub sessions: Arc<dyn SessionStore>,
}

impl Services {
    #[must_use]
    pub fn new(
        auth: Arc<dyn Authenticator>,
        codes: Arc<dyn CodeGenerator>,
        sessions: Arc<dyn SessionStore>,
    ) -> Arc<Self> {
        Arc::new(Self {
            auth,
            codes,
            sessions,
        })
    }
}

/// Build the application router, mounted below `prefix` when one is given.
///
/// `prefix` is expected without a trailing slash, e.g. `/safeexam`.
pub fn router(services: Arc<Services>, prefix: Option<&str>) -> Router {
    let prefix = prefix
        .map(|prefix| prefix.trim_end_matches('/'))
        .filter(|prefix| !prefix.is_empty());

    let routes = Router::new()
        .route(
            "/api/2.0/auth",
            post(handlers::auth).fallback(handlers::not_found),
        )
        .route(
            "/api/2.0/code",
            get(handlers::code).fallback(handlers::not_found),
        )
        .route(
            "/api/2.0/check",
            post(handlers::check).fallback(handlers::not_found),
        )
        .route("/check", get(handlers::legacy_check))
        .route("/default/check", get(handlers::legacy_check))
        .route("/health", get(handlers::health).options(handlers::health));

    let app = match prefix {
        Some(prefix) => Router::new().nest(prefix, routes),
        None => routes,
    };

    let api_root = format!("{}/api", prefix.unwrap_or_default());

    app.fallback(move |uri: Uri| {
        let api_root = api_root.clone();
        async move { handlers::not_found::fallback(&api_root, uri.path()) }
    })
    .layer(
        ServiceBuilder::new()
            .layer(SetRequestHeaderLayer::if_not_present(
                HeaderName::from_static(REQUEST_ID),
                |_req: &_| HeaderValue::from_str(Ulid::new().to_string().as_str()).ok(),
            ))
            .layer(PropagateRequestIdLayer::new(HeaderName::from_static(
                REQUEST_ID,
            )))
            .layer(TraceLayer::new_for_http().make_span_with(make_span))
            .layer(CompressionLayer::new())
            .layer(Extension(services)),
    )
}

/// Start the server
/// # Errors
/// Return error if failed to bind or serve
pub async fn new(listen: SocketAddr, prefix: Option<String>, services: Arc<Services>) -> Result<()> {
    let app = router(services, prefix.as_deref());

    let listener = TcpListener::bind(listen)
        .await
        .with_context(|| format!("Failed to bind {listen}"))?;

    info!("Listening on {}", listener.local_addr()?);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    Ok(())
}

fn make_span(request: &Request<Body>) -> Span {
    let request_id = request
        .headers()
        .get(REQUEST_ID)
        .and_then(|val| val.to_str().ok())
        .unwrap_or("none");
    let matched_path = request
        .extensions()
        .get::<MatchedPath>()
        .map_or_else(|| request.uri().path(), MatchedPath::as_str);

    info_span!(
        "http.request",
        http.method = %request.method(),
        http.route = matched_path,
        client.address = %client_address(request),
        request_id
    )
}

/// `X-Forwarded-For` when a proxy set it, otherwise the peer address.
fn client_address(request: &Request<Body>) -> String {
    request
        .headers()
        .get("x-forwarded-for")
        .and_then(|val| val.to_str().ok())
        .and_then(|val| val.split(',').next())
        .map(str::trim)
        .filter(|val| !val.is_empty())
        .map(ToString::to_string)
        .or_else(|| {
            request
                .extensions()
                .get::<ConnectInfo<SocketAddr>>()
                .map(|ConnectInfo(addr)| addr.ip().to_string())
        })
        .unwrap_or_else(|| "unknown".to_string())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            error!("Failed to listen for ctrl-c: {}", err);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                error!("Failed to listen for SIGTERM: {}", err);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    info!("Gracefully shutdown");
}
