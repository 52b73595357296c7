use crate::handlers;
use crate::state::AppState;
use axum::{routing::{get, post}, Router};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/login", get(handlers::login_page).post(handlers::login))
        .route("/logout", post(handlers::logout))
        .route("/dashboard", get(handlers::dashboard))
        .route("/dashboard/refresh", post(handlers::refresh_revenue))
        .route("/dashboard/users/refresh", post(handlers::refresh_users))
        .route("/dashboard/users/:user_id", get(handlers::user_detail))
        .with_state(state)
}
