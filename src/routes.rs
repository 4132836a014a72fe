// src/routes.rs

use axum::{
    Router, http::Method, middleware,
    routing::{get, post},
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    handlers::{attempts, auth, progress, students, trends},
    state::AppState,
    utils::jwt::auth_middleware,
};

/// Assembles the main application router.
///
/// * Merges all sub-routers (auth, students, progress, attempts, trends).
/// * Applies global middleware (Trace, CORS).
/// * Injects global state (pool, content store, config).
pub fn create_router(state: AppState) -> Router {
    let origins = [
        "http://localhost:3000".parse().unwrap(),
        "http://127.0.0.1:3000".parse().unwrap(),
    ];

    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([
            axum::http::header::AUTHORIZATION,
            axum::http::header::CONTENT_TYPE,
        ]);

    let auth_routes = Router::new()
        .route("/teacher/login", post(auth::teacher_login))
        .route("/university-admin/login", post(auth::university_admin_login))
        .route("/super-admin/login", post(auth::super_admin_login));

    let student_routes = Router::new()
        .route("/", get(students::list))
        .route("/{id}", get(students::get));

    let course_routes =
        Router::new().route("/{course_id}/students", get(students::course_students));

    let progress_routes = Router::new()
        .route("/practice", post(progress::practice))
        .route("/exam", post(progress::exam))
        .route("/unit", post(progress::unit));

    let attempt_routes = Router::new().route("/deep-dive", get(attempts::deep_dive));

    let trend_routes = Router::new().route("/summary", post(trends::summary));

    // Everything except login requires a valid staff token.
    let protected = Router::new()
        .nest("/api/students", student_routes)
        .nest("/api/courses", course_routes)
        .nest("/api/progress", progress_routes)
        .nest("/api/attempts", attempt_routes)
        .nest("/api/trends", trend_routes)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new()
        .nest("/api/auth", auth_routes)
        .merge(protected)
        // Global Middleware (applied from outside in)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
