use crate::auth;
use crate::handlers;
use crate::state::AppState;
use axum::{
    Router, middleware,
    routing::{get, post, put},
};

pub fn router(state: AppState) -> Router {
    let protected = Router::new()
        .route("/api/tasks", get(handlers::list_tasks).post(handlers::create_task))
        .route(
            "/api/tasks/:id",
            put(handlers::update_task).delete(handlers::delete_task),
        )
        .route("/api/habits", get(handlers::list_habits).post(handlers::create_habit))
        .route(
            "/api/habits/:id",
            put(handlers::update_habit).delete(handlers::delete_habit),
        )
        .route("/api/habits/:id/toggle", post(handlers::toggle_habit))
        .route("/api/stats/dashboard", get(handlers::dashboard_stats))
        .route("/api/stats/habits", get(handlers::habit_stats))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth::require_auth));

    Router::new()
        .route("/api/health", get(handlers::health))
        .route("/api/register", post(auth::register))
        .route("/api/login", post(auth::login))
        .merge(protected)
        .with_state(state)
}
