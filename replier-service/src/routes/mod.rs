use axum::{
    extract::Request,
    middleware::{self, Next},
    response::IntoResponse,
    routing::{get, post, put},
    Router,
};
use log::{debug, info, warn};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use crate::handlers::{
    health,
    replier_handlers::{
        create_replier, delete_replier, get_my_repliers, get_replied_repliers, get_replier,
        get_tally, reply, withdraw_reply,
    },
};
use party_shared::auth::auth_middleware;
use party_shared::store::{dynamo::DynamoReplierStore, ReplierStore};

/// Route prefix: `/Prod` behind API Gateway, empty when `REMOVE_BASE_PATH=true`
pub fn route_prefix() -> &'static str {
    let remove_base_path = std::env::var("REMOVE_BASE_PATH")
        .map(|v| v.eq_ignore_ascii_case("true"))
        .unwrap_or(false);

    if remove_base_path {
        ""
    } else {
        "/Prod"
    }
}

/// Creates a router with the DynamoDB store
pub async fn create_router() -> Router {
    info!("Creating router with DynamoDB store");

    let dynamo_store = Arc::new(DynamoReplierStore::new().await);
    let prefix = route_prefix();
    info!("Using API route prefix: '{}'", prefix);

    create_router_with_store(dynamo_store, prefix)
}

// Logging middleware to trace all requests
async fn logging_middleware(req: Request, next: Next) -> impl IntoResponse {
    info!(
        "Router received request: method={}, uri={}",
        req.method(),
        req.uri()
    );
    next.run(req).await
}

/// Creates a router with a given store implementation
pub fn create_router_with_store<S>(store: Arc<S>, prefix: &str) -> Router
where
    S: ReplierStore + ?Sized,
{
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_routes = Router::new()
        .route("/health", get(health))
        .route("/repliers", post(create_replier::<S>))
        .route("/repliers/me", get(get_my_repliers::<S>))
        .route("/repliers/replied", get(get_replied_repliers::<S>))
        .route(
            "/repliers/:id",
            get(get_replier::<S>).delete(delete_replier::<S>),
        )
        .route("/repliers/:id/tally", get(get_tally::<S>))
        .route(
            "/repliers/:id/reply",
            put(reply::<S>).delete(withdraw_reply::<S>),
        )
        .layer(middleware::from_fn(auth_middleware))
        .with_state(store);

    // An empty prefix cannot be nested
    let router = if prefix.is_empty() {
        api_routes
    } else {
        Router::new().nest(prefix, api_routes)
    };
    debug!("Router configured with prefix: '{}'", prefix);

    router
        .fallback(|req: Request| async move {
            warn!("No route matched for: {} {}", req.method(), req.uri());
            (
                axum::http::StatusCode::NOT_FOUND,
                "The requested resource was not found".to_string(),
            )
        })
        .layer(cors)
        .layer(middleware::from_fn(logging_middleware))
}
