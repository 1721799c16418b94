use axum::{
    http::HeaderValue,
    routing::{get, post},
    Router,
};
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::{AllowOrigin, Any, CorsLayer},
    trace::{DefaultMakeSpan, TraceLayer},
};
use tracing::warn;

use crate::config::CorsConfig;
use crate::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    let cors = cors_layer(&state.settings.cors);

    // Public routes
    let public_routes = Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/health/ready", get(handlers::health::readiness_check))
        .route("/api/user/health", get(handlers::health::user_health_check))
        .route("/api/auth/public", get(handlers::auth::public_endpoint));

    // Protected routes: every handler takes an `AuthUser`
    let protected_routes = Router::new()
        .route("/api/auth/protected", get(handlers::auth::protected_endpoint))
        .route("/api/auth/profile", get(handlers::auth::profile))
        .route("/api/user/data", post(handlers::user::post_data))
        .route(
            "/api/user/onboarding",
            get(handlers::user::get_onboarding).post(handlers::user::save_onboarding),
        )
        .route(
            "/api/chat/conversations",
            get(handlers::chat::list_conversations).post(handlers::chat::create_conversation),
        )
        .route(
            "/api/chat/conversations/{id}",
            get(handlers::chat::get_conversation).delete(handlers::chat::delete_conversation),
        )
        .route(
            "/api/chat/conversations/{id}/messages",
            post(handlers::chat::send_message),
        )
        .route("/api/chat/generate", post(handlers::chat::generate));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(state)
        .layer(CatchPanicLayer::new())
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::default().include_headers(false)),
        )
}

fn cors_layer(config: &CorsConfig) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if config.allowed_origins.is_empty() {
        return layer.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin {:?}", origin);
                None
            }
        })
        .collect();
    layer.allow_origin(AllowOrigin::list(origins))
}
