//! HTTP server wiring for Markpad (API, handlers, and shared state).

/// HTTP error mapping for API handlers.
pub mod error;
/// Upstream text generation providers.
pub mod generator;
/// HTTP handlers for documents, images and AI generation.
pub mod handlers;
/// Per-client rate limiting.
pub mod rate_limit;

pub use generator::{DisabledGenerator, OpenAiGenerator, TextGenerator};
pub use markpad_core::{config, db, models, naming, AppError, Config, Database, DEFAULT_PORT};
pub use rate_limit::RateLimiter;

use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method},
    middleware,
    routing::{get, post},
    Router,
};
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{
    compression::CompressionLayer, cors::CorsLayer, set_header::SetResponseHeaderLayer,
    trace::TraceLayer,
};

/// Extra room for JSON framing around a maximum-size document.
const BODY_ENVELOPE_BYTES: usize = 64 * 1024;

const CONTENT_SECURITY_POLICY: &str = "default-src 'self'; script-src 'self'; style-src 'self' 'unsafe-inline'; img-src 'self' data:; font-src 'self'; connect-src 'self'; frame-ancestors 'none'; base-uri 'self'; form-action 'self'";

/// Shared state passed to HTTP handlers.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Database>,
    pub config: Arc<Config>,
    pub limiter: Arc<RateLimiter>,
    pub generator: Arc<dyn TextGenerator>,
}

impl AppState {
    /// Construct shared application state, choosing the AI provider from
    /// configuration.
    pub fn new(config: Config, db: Database) -> Self {
        let generator: Arc<dyn TextGenerator> = if config.ai.is_enabled() {
            Arc::new(OpenAiGenerator::new(config.ai.clone()))
        } else {
            tracing::info!("AI_API_KEY not set; AI generation disabled");
            Arc::new(DisabledGenerator)
        };
        Self::with_generator(config, db, generator)
    }

    /// Construct shared application state with an explicit generator.
    pub fn with_generator(config: Config, db: Database, generator: Arc<dyn TextGenerator>) -> Self {
        let limiter = Arc::new(RateLimiter::new(
            config.rate_limit_max_requests,
            config.rate_limit_window(),
        ));
        Self {
            db: Arc::new(db),
            config: Arc::new(config),
            limiter,
            generator,
        }
    }
}

/// Create the application router with all routes and middleware.
///
/// # Arguments
/// - `state`: Shared application state.
/// - `allow_public_access`: Whether to allow cross-origin requests from any origin.
///
/// # Returns
/// Configured `axum::Router`.
pub fn create_app(state: AppState, allow_public_access: bool) -> Router {
    let cors_port = state.config.port;
    create_app_with_cors_port(state, allow_public_access, cors_port)
}

/// Resolve the listener address from the `BIND` override and security policy.
///
/// # Returns
/// A validated socket address that enforces loopback when public access is disabled.
pub fn resolve_bind_address(config: &Config, allow_public_access: bool) -> SocketAddr {
    let requested = std::env::var("BIND").ok();
    resolve_bind_address_from(config, requested.as_deref(), allow_public_access)
}

fn resolve_bind_address_from(
    config: &Config,
    requested: Option<&str>,
    allow_public_access: bool,
) -> SocketAddr {
    let default_bind = SocketAddr::from(([127, 0, 0, 1], config.port));
    let requested = match requested {
        Some(value) => match value.trim().parse::<SocketAddr>() {
            Ok(addr) => addr,
            Err(err) => {
                tracing::warn!(
                    "Invalid BIND='{}': {}. Falling back to {}",
                    value,
                    err,
                    default_bind
                );
                default_bind
            }
        },
        None => default_bind,
    };

    if allow_public_access || requested.ip().is_loopback() {
        return requested;
    }

    tracing::warn!(
        "Non-loopback bind {} requested without ALLOW_PUBLIC_ACCESS; forcing 127.0.0.1",
        requested
    );
    SocketAddr::from(([127, 0, 0, 1], requested.port()))
}

fn request_body_limit(config: &Config) -> usize {
    config.max_document_size.max(config.max_image_size) + BODY_ENVELOPE_BYTES
}

fn cors_layer(allow_public_access: bool, cors_port: u16) -> CorsLayer {
    let methods = [Method::GET, Method::POST];
    if allow_public_access {
        CorsLayer::new()
            .allow_origin(tower_http::cors::Any)
            .allow_methods(methods)
            .allow_headers(tower_http::cors::Any)
    } else {
        let origins: Vec<HeaderValue> = [
            format!("http://localhost:{}", cors_port),
            format!("http://127.0.0.1:{}", cors_port),
        ]
        .iter()
        .filter_map(|origin| HeaderValue::from_str(origin).ok())
        .collect();
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(methods)
            .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
    }
}

fn create_app_with_cors_port(state: AppState, allow_public_access: bool, cors_port: u16) -> Router {
    let body_limit = request_body_limit(&state.config);

    let mutations = Router::new()
        .route("/api/documents", post(handlers::document::create_document))
        .route("/api/ai/generate", post(handlers::ai::generate))
        .route("/api/images", post(handlers::image::upload_image))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            rate_limit::enforce,
        ));

    Router::new()
        .route("/api/documents/:token", get(handlers::document::get_document))
        .route("/api/images/:id", get(handlers::image::get_image))
        .merge(mutations)
        .with_state(state)
        .layer(
            tower::ServiceBuilder::new()
                .layer(DefaultBodyLimit::max(body_limit))
                .layer(TraceLayer::new_for_http())
                .layer(CompressionLayer::new())
                .layer(cors_layer(allow_public_access, cors_port))
                .layer(SetResponseHeaderLayer::overriding(
                    header::CONTENT_SECURITY_POLICY,
                    HeaderValue::from_static(CONTENT_SECURITY_POLICY),
                ))
                .layer(SetResponseHeaderLayer::overriding(
                    header::X_CONTENT_TYPE_OPTIONS,
                    HeaderValue::from_static("nosniff"),
                ))
                .layer(SetResponseHeaderLayer::overriding(
                    header::X_FRAME_OPTIONS,
                    HeaderValue::from_static("DENY"),
                )),
        )
}

fn listener_cors_port(listener: &tokio::net::TcpListener, fallback_port: u16) -> u16 {
    listener
        .local_addr()
        .map(|addr| addr.port())
        .unwrap_or(fallback_port)
}

/// Run the Axum server with graceful shutdown support.
///
/// Peer addresses are attached to requests for rate limiting.
///
/// # Errors
/// Returns any I/O error produced by `axum::serve`.
pub async fn serve_router(
    listener: tokio::net::TcpListener,
    state: AppState,
    allow_public_access: bool,
    shutdown_signal: impl Future<Output = ()> + Send + 'static,
) -> Result<(), std::io::Error> {
    let cors_port = listener_cors_port(&listener, state.config.port);
    let app = create_app_with_cors_port(state, allow_public_access, cors_port);
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal)
    .await
}
