use axum::http::HeaderValue;
use axum::routing::get;
use axum::{middleware, Router};
use serde_json::{json, Value};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::middleware::auth::jwt_auth_middleware;
use crate::middleware::rate_limit::{credential_rate_limit_middleware, rate_limit_middleware};
use crate::middleware::security_headers::security_headers_middleware;

/// Full application router. Serve with
/// `into_make_service_with_connect_info::<SocketAddr>()` so the rate
/// limiter can see client addresses.
pub fn app() -> Router {
    Router::new()
        // Public
        .route("/", get(root))
        .route("/health", get(health))
        .merge(auth_public_routes())
        // Protected API
        .merge(
            Router::new()
                .merge(auth_routes())
                .merge(user_routes())
                .merge(site_routes())
                .merge(artifact_routes())
                .merge(document_routes())
                .merge(forum_routes())
                .merge(quiz_routes())
                .merge(translation_routes())
                .merge(notification_routes())
                .route_layer(middleware::from_fn(jwt_auth_middleware)),
        )
        // Global middleware
        .layer(middleware::from_fn(rate_limit_middleware))
        .layer(middleware::from_fn(security_headers_middleware))
        .layer(cors_layer())
        .layer(TraceLayer::new_for_http())
}

fn cors_layer() -> CorsLayer {
    let origins = &crate::config::config().security.cors_origins;

    if origins.iter().any(|o| o == "*") {
        return CorsLayer::permissive();
    }

    let parsed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| o.parse::<HeaderValue>().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(parsed))
        .allow_methods(tower_http::cors::Any)
        .allow_headers(tower_http::cors::Any)
}

fn auth_public_routes() -> Router {
    use axum::routing::post;
    use crate::handlers::public::auth;

    Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/refresh", post(auth::refresh))
        // Credential endpoints are the brute-force target; limited even
        // when the global limiter is off
        .route_layer(middleware::from_fn(credential_rate_limit_middleware))
}

fn auth_routes() -> Router {
    use crate::handlers::protected::auth;

    Router::new().route("/api/auth/whoami", get(auth::whoami))
}

fn user_routes() -> Router {
    use axum::routing::put;
    use crate::handlers::protected::users;

    Router::new()
        .route("/api/users", get(users::list))
        .route("/api/users/me", put(users::update_me))
        .route("/api/users/:id", get(users::get))
        .route("/api/users/:id/status", put(users::set_status))
        .route("/api/users/:id/role", put(users::set_role))
}

fn site_routes() -> Router {
    use axum::routing::post;
    use crate::handlers::protected::sites;

    Router::new()
        .route("/api/sites", get(sites::list).post(sites::create))
        .route(
            "/api/sites/:id",
            get(sites::get).put(sites::update).delete(sites::delete),
        )
        .route("/api/sites/:id/status", post(sites::transition))
        .route("/api/sites/:id/restore", post(sites::restore))
}

fn artifact_routes() -> Router {
    use axum::routing::post;
    use crate::handlers::protected::artifacts;

    Router::new()
        .route("/api/artifacts", get(artifacts::list).post(artifacts::create))
        .route(
            "/api/artifacts/:id",
            get(artifacts::get)
                .put(artifacts::update)
                .delete(artifacts::delete),
        )
        .route("/api/artifacts/:id/restore", post(artifacts::restore))
}

fn document_routes() -> Router {
    use crate::handlers::protected::documents;

    Router::new()
        .route("/api/documents", get(documents::list).post(documents::create))
        .route(
            "/api/documents/:id",
            get(documents::get)
                .put(documents::update)
                .delete(documents::delete),
        )
}

fn forum_routes() -> Router {
    use axum::routing::post;
    use crate::handlers::protected::forum;

    Router::new()
        .route(
            "/api/forum/topics",
            get(forum::list_topics).post(forum::create_topic),
        )
        .route("/api/forum/topics/:id", get(forum::get_topic))
        .route("/api/forum/topics/:id/lock", post(forum::lock_topic))
        .route("/api/forum/topics/:id/unlock", post(forum::unlock_topic))
        .route(
            "/api/forum/topics/:id/posts",
            get(forum::list_posts).post(forum::create_post),
        )
        .route(
            "/api/forum/posts/:id",
            get(forum::get_post)
                .put(forum::update_post)
                .delete(forum::delete_post),
        )
        .route("/api/forum/posts/:id/flag", post(forum::flag_post))
        .route("/api/forum/posts/:id/moderate", post(forum::moderate_post))
        .route("/api/forum/posts/:id/history", get(forum::post_history))
}

fn quiz_routes() -> Router {
    use axum::routing::{post, put};
    use crate::handlers::protected::quizzes;

    Router::new()
        .route("/api/quizzes", get(quizzes::list).post(quizzes::create))
        .route(
            "/api/quizzes/:id",
            get(quizzes::get).put(quizzes::update).delete(quizzes::delete),
        )
        .route("/api/quizzes/:id/publish", post(quizzes::publish))
        .route("/api/quizzes/:id/questions", post(quizzes::add_question))
        .route(
            "/api/quizzes/questions/:id",
            put(quizzes::update_question).delete(quizzes::delete_question),
        )
        .route("/api/quizzes/:id/attempts", post(quizzes::start_attempt))
        .route("/api/quizzes/attempts/:id/submit", post(quizzes::submit_attempt))
        .route("/api/quizzes/:id/results", get(quizzes::own_results))
        .route("/api/quizzes/:id/results/all", get(quizzes::all_results))
}

fn translation_routes() -> Router {
    use crate::handlers::protected::translations;

    Router::new()
        .route(
            "/api/translations",
            get(translations::list).post(translations::create),
        )
        .route(
            "/api/translations/:id",
            get(translations::get)
                .put(translations::update)
                .delete(translations::delete),
        )
}

fn notification_routes() -> Router {
    use axum::routing::post;
    use crate::handlers::protected::notifications;

    Router::new()
        .route("/api/notifications", get(notifications::list))
        .route("/api/notifications/unread-count", get(notifications::unread_count))
        .route("/api/notifications/read-all", post(notifications::mark_all_read))
        .route("/api/notifications/:id/read", post(notifications::mark_read))
}

async fn root() -> axum::response::Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    axum::response::Json(json!({
        "success": true,
        "data": {
            "name": "Heritage API",
            "version": version,
            "description": "Backend API for a cultural-heritage content platform",
            "endpoints": {
                "home": "/ (public)",
                "health": "/health (public)",
                "public_auth": "/auth/register, /auth/login, /auth/refresh (public)",
                "auth": "/api/auth/whoami (protected)",
                "users": "/api/users[/:id] (protected, admin)",
                "sites": "/api/sites[/:id] (protected)",
                "artifacts": "/api/artifacts[/:id] (protected)",
                "documents": "/api/documents[/:id] (protected)",
                "forum": "/api/forum/topics[/:id], /api/forum/posts/:id (protected)",
                "quizzes": "/api/quizzes[/:id] (protected)",
                "translations": "/api/translations[/:id] (protected)",
                "notifications": "/api/notifications (protected)",
            }
        }
    }))
}

async fn health() -> impl axum::response::IntoResponse {
    let now = chrono::Utc::now();

    match crate::database::Database::health_check().await {
        Ok(_) => (
            axum::http::StatusCode::OK,
            axum::response::Json(json!({
                "success": true,
                "data": {
                    "status": "ok",
                    "timestamp": now,
                    "database": "ok"
                }
            })),
        ),
        Err(e) => (
            axum::http::StatusCode::SERVICE_UNAVAILABLE,
            axum::response::Json(json!({
                "success": false,
                "error": "database unavailable",
                "data": {
                    "status": "degraded",
                    "timestamp": now,
                    "database_error": e.to_string()
                }
            })),
        ),
    }
}
