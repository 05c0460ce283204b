//! HTTP server implementation
//!
//! Uses hyper http1 with TokioIo for async handling. Routing is split from
//! the connection handling so it can be driven without a socket.

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{HeaderMap, Method, Request, Response};
use hyper_util::rt::TokioIo;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tokio::net::TcpListener;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::auth::{OAuthConfig, TokenManager};
use crate::config::Args;
use crate::graph::GraphClient;
use crate::logging;
use crate::routes::{self, QueryParams};
use crate::store::TokenStore;
use crate::types::Result;

type BoxBody = http_body_util::combinators::BoxBody<Bytes, hyper::Error>;

/// Shared application state
pub struct AppState {
    pub args: Args,
    /// Graph client scoped to the configured drive and base directory
    pub graph: GraphClient,
    /// Access token source backed by the configured token store
    pub tokens: TokenManager,
    /// Protected folders parsed from configuration
    pub protected_routes: Vec<String>,
    pub started_at: Instant,
}

impl AppState {
    /// Build state with the token store selected in configuration
    pub fn new(args: Args) -> Result<Self> {
        let store = TokenStore::from_args(&args.store, args.request_timeout())?;
        Self::with_store(args, store)
    }

    /// Build state around an existing token store
    pub fn with_store(args: Args, store: TokenStore) -> Result<Self> {
        let timeout = args.request_timeout();
        let graph = GraphClient::new(args.drive_api(), &args.base_directory, timeout)?;
        let tokens = TokenManager::new(store, OAuthConfig::from_args(&args), timeout)?;
        let protected_routes = args.protected_route_list();

        Ok(Self {
            args,
            graph,
            tokens,
            protected_routes,
            started_at: Instant::now(),
        })
    }
}

pub async fn run(state: Arc<AppState>) -> Result<()> {
    let listener = TcpListener::bind(state.args.listen).await?;

    info!(
        "odindex listening on {} as node {}",
        state.args.listen, state.args.node_id
    );
    info!(
        base_directory = %state.args.base_directory,
        token_store = state.tokens.store().backend(),
        protected_routes = state.protected_routes.len(),
        "Serving OneDrive index"
    );

    if state.args.client_secret.is_none() {
        warn!("CLIENT_SECRET is not set - token refresh will be rejected by the OAuth endpoint");
    }

    loop {
        match listener.accept().await {
            Ok((stream, addr)) => {
                let state = Arc::clone(&state);
                tokio::spawn(async move {
                    let io = TokioIo::new(stream);

                    let service = service_fn(move |req| {
                        let state = Arc::clone(&state);
                        async move { handle_request(state, addr, req).await }
                    });

                    if let Err(err) = http1::Builder::new()
                        .preserve_header_case(true)
                        .title_case_headers(true)
                        .serve_connection(io, service)
                        .await
                    {
                        error!("Error serving connection from {}: {:?}", addr, err);
                    }
                });
            }
            Err(e) => {
                error!("Error accepting connection: {:?}", e);
            }
        }
    }
}

/// Handle one request and write the access log line
async fn handle_request(
    state: Arc<AppState>,
    addr: SocketAddr,
    req: Request<Incoming>,
) -> std::result::Result<Response<BoxBody>, hyper::Error> {
    let started = Instant::now();
    let request_id = Uuid::new_v4().to_string();
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let query = req.uri().query().map(str::to_string);

    debug!(request_id = %request_id, peer = %addr, "{} {}", method, path);

    let response = route(&state, &method, &path, query.as_deref(), req.headers()).await;

    logging::log_request(&request_id, &method, &path, response.status(), started.elapsed());
    Ok(to_boxed(response))
}

/// Dispatch a request to its route handler
pub async fn route(
    state: &AppState,
    method: &Method,
    path: &str,
    query: Option<&str>,
    headers: &HeaderMap,
) -> Response<Full<Bytes>> {
    let params = QueryParams::parse(query);

    match (method, path) {
        (&Method::GET, "/health") | (&Method::GET, "/healthz") => routes::health_check(state),

        (&Method::GET, "/version") => routes::version_info(),

        // CORS preflight
        (&Method::OPTIONS, _) => routes::preflight_response(),

        (&Method::GET, "/api") | (&Method::GET, "/api/") => {
            routes::handle_index(state, &params, headers).await
        }

        (&Method::GET, "/api/item") => routes::handle_item(state, &params).await,

        (&Method::GET, "/api/raw") => routes::handle_raw(state, &params, headers).await,

        // The name segment only shapes the URL
        (&Method::GET, p) if p.starts_with("/api/name/") && p.len() > "/api/name/".len() => {
            routes::handle_raw(state, &params, headers).await
        }

        (&Method::GET, "/api/search") => routes::handle_search(state, &params).await,

        (&Method::GET, "/api/thumbnail") => routes::handle_thumbnail(state, &params, headers).await,

        (&Method::GET, "/api/preview") => routes::handle_preview(state, &params, headers).await,

        _ => routes::not_found_response(path),
    }
}

/// Convert a Full<Bytes> body to BoxBody
fn to_boxed(response: Response<Full<Bytes>>) -> Response<BoxBody> {
    response.map(|body| body.map_err(|never| match never {}).boxed())
}
