// src/routes.rs

use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method, header},
    middleware,
    response::IntoResponse,
    routing::{get, patch, post, put},
};
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};

use crate::{
    docs::docs_routes,
    handlers::{auth, courses, modules, users},
    models::response::ApiResponse,
    state::AppState,
    utils::jwt::{admin_middleware, auth_middleware},
};

async fn health() -> impl IntoResponse {
    ApiResponse::message("OK")
}

/// Assembles the main application router.
///
/// * Public auth routes, bearer routes and admin routes share the `/api` prefix.
/// * Admin routes pass the auth check first, then the role check.
/// * Locally stored uploads are served under `/uploads`.
pub fn create_router(state: AppState) -> Router {
    let origins: Vec<HeaderValue> = state
        .config
        .allowed_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    let public_routes = Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login));

    let member_routes = Router::new()
        .route("/auth/self", get(auth::get_self))
        .route("/courses", get(courses::list_courses))
        .route("/courses/my-courses", get(courses::list_my_courses))
        .route("/courses/{id}", get(courses::get_course))
        .route("/courses/{id}/buy", post(courses::buy_course))
        .route("/courses/{id}/buy-status", get(courses::buy_status))
        .route("/courses/{id}/modules", get(modules::list_course_modules))
        .route("/modules/{id}", get(modules::get_module))
        .route("/modules/{id}/complete", patch(modules::complete_module))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    let admin_routes = Router::new()
        .route("/courses", post(courses::create_course))
        .route(
            "/courses/{id}",
            put(courses::update_course).delete(courses::delete_course),
        )
        .route("/courses/{id}/modules", post(modules::create_module))
        .route(
            "/courses/{id}/modules/reorder",
            patch(modules::reorder_modules),
        )
        .route(
            "/modules/{id}",
            put(modules::update_module).delete(modules::delete_module),
        )
        .route("/users", get(users::list_users))
        .route(
            "/users/{id}",
            get(users::get_user)
                .put(users::update_user)
                .delete(users::delete_user),
        )
        .route("/users/{id}/balance", post(users::increment_balance))
        .layer(DefaultBodyLimit::max(state.config.max_upload_bytes))
        // Double middleware protection: Auth first, then Admin check
        .layer(middleware::from_fn(admin_middleware))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    let api_routes = Router::new()
        .merge(docs_routes())
        .merge(public_routes)
        .merge(member_routes)
        .merge(admin_routes);

    Router::new()
        .route("/health", get(health))
        .nest("/api", api_routes)
        .nest_service("/uploads", ServeDir::new(&state.config.upload_dir))
        // Global Middleware
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
