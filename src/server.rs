//! HTTP surface for the gateway.
//!
//! ## Endpoints
//!
//! - `POST /` and `POST /search-with-gemini`: resolve `{"query": ".."}`
//! - `OPTIONS` on both: CORS preflight, empty 200
//! - `GET /health`: liveness plus the active mode
//!
//! Every response, errors included, carries the CORS headers.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::{ConnectInfo, Request, State};
use axum::http::{HeaderMap, HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{get, post};
use axum::{Router, middleware};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tracing::info;

use crate::config::ServerConfig;
use crate::error::{GatewayError, QUERY_REQUIRED, Result};
use crate::gateway::Gateway;
use crate::identity::IdentityResolver;
use crate::types::{ClientMetadata, ErrorBody, SearchBody, SearchRequest, UNKNOWN};

/// Path of the original function-style route, kept for existing front-ends.
pub const LEGACY_ROUTE: &str = "/search-with-gemini";

/// Largest accepted request body.
const MAX_BODY_BYTES: usize = 64 * 1024;

const CORS_ALLOW_HEADERS: &str = "authorization, x-client-info, apikey, content-type";
const CORS_ALLOW_METHODS: &str = "POST, GET, OPTIONS";

#[derive(Clone)]
struct AppState {
    gateway: Arc<Gateway>,
    identity: Arc<IdentityResolver>,
}

/// Build the router. Exposed separately from [`GatewayServer`] so it can be
/// mounted elsewhere.
pub fn router(gateway: Arc<Gateway>, identity: IdentityResolver) -> Router {
    let state = AppState {
        gateway,
        identity: Arc::new(identity),
    };

    Router::new()
        .route("/", post(handle_search).options(handle_preflight))
        .route(LEGACY_ROUTE, post(handle_search).options(handle_preflight))
        .route("/health", get(handle_health).options(handle_preflight))
        .layer(middleware::map_response(add_cors_headers))
        .with_state(state)
}

/// A running gateway HTTP server.
pub struct GatewayServer {
    addr: SocketAddr,
    handle: JoinHandle<()>,
}

impl GatewayServer {
    /// Bind `{config.host}:{config.port}` (port `0` picks a free port) and
    /// serve in a background task.
    ///
    /// # Errors
    ///
    /// Returns an error if the listener cannot bind.
    pub async fn start(
        config: &ServerConfig,
        gateway: Arc<Gateway>,
        identity: IdentityResolver,
    ) -> Result<Self> {
        let mode = gateway.mode();
        let app = router(gateway, identity);

        let bind_addr = format!("{}:{}", config.host, config.port);
        let listener = TcpListener::bind(&bind_addr).await.map_err(|e| {
            GatewayError::Configuration(format!("cannot bind {bind_addr}: {e}"))
        })?;
        let addr = listener.local_addr().map_err(|e| {
            GatewayError::Configuration(format!("failed to get local addr: {e}"))
        })?;

        info!(%mode, "touchline gateway listening on http://{addr}");

        let handle = tokio::spawn(async move {
            let service = app.into_make_service_with_connect_info::<SocketAddr>();
            if let Err(e) = axum::serve(listener, service).await {
                tracing::error!("gateway server error: {e}");
            }
        });

        Ok(Self { addr, handle })
    }

    /// Returns the address the server is listening on.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Returns the port the server is listening on.
    pub fn port(&self) -> u16 {
        self.addr.port()
    }

    /// Abort the server task.
    pub fn shutdown(&self) {
        self.handle.abort();
    }
}

impl Drop for GatewayServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

async fn handle_search(State(state): State<AppState>, request: Request) -> Response {
    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|info| info.0);
    let (parts, body) = request.into_parts();
    let metadata = client_metadata(&parts.headers, peer);

    let bytes = match axum::body::to_bytes(body, MAX_BODY_BYTES).await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::debug!("unreadable request body: {e}");
            return error_response(&GatewayError::InvalidInput(QUERY_REQUIRED.into()));
        }
    };
    let Some(query) = parse_query(&bytes) else {
        return error_response(&GatewayError::InvalidInput(QUERY_REQUIRED.into()));
    };

    let authorization = parts
        .headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());
    let requester = state.identity.resolve(authorization).await;

    match state
        .gateway
        .resolve(SearchRequest::new(query, requester), metadata)
        .await
    {
        Ok(response) => (StatusCode::OK, Json(response)).into_response(),
        Err(e) => error_response(&e),
    }
}

async fn handle_preflight() -> StatusCode {
    StatusCode::OK
}

async fn handle_health(State(state): State<AppState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "mode": state.gateway.mode().name(),
    }))
}

async fn add_cors_headers(mut response: Response) -> Response {
    let headers = response.headers_mut();
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_static("*"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static(CORS_ALLOW_HEADERS),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static(CORS_ALLOW_METHODS),
    );
    response
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// JSON error body with the status for `err`. Only the generic client
/// message is sent.
pub fn error_response(err: &GatewayError) -> Response {
    let body = ErrorBody {
        error: err.client_message().to_owned(),
    };
    (err.status(), Json(body)).into_response()
}

/// The `query` field of a JSON body, if present. Blank queries are left to
/// the gateway to reject.
/// The `query` field, if present and not blank. Blank queries are rejected
/// here, before identity resolution makes any outbound call.
fn parse_query(bytes: &[u8]) -> Option<String> {
    serde_json::from_slice::<SearchBody>(bytes)
        .ok()?
        .query
        .filter(|q| !q.trim().is_empty())
}

/// Client IP and user agent from forwarding headers, then the socket peer.
pub fn client_metadata(headers: &HeaderMap, peer: Option<SocketAddr>) -> ClientMetadata {
    let header_str = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
    };

    let ip_address = header_str("x-forwarded-for")
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .or_else(|| header_str("x-real-ip"))
        .map(str::to_owned)
        .or_else(|| peer.map(|p| p.ip().to_string()))
        .unwrap_or_else(|| UNKNOWN.to_owned());

    let user_agent = header_str(header::USER_AGENT.as_str())
        .map(str::to_owned)
        .unwrap_or_else(|| UNKNOWN.to_owned());

    ClientMetadata {
        ip_address,
        user_agent,
    }
}
