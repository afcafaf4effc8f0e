use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use state::AppState;

pub mod actions;
pub mod assignments;
pub mod availabilities;
pub mod categories;
pub mod clubs;
pub mod commands;
pub mod config;
pub mod db;
pub mod dispatch;
pub mod export;
pub mod institutional_emails;
pub mod letter_templates;
pub mod letterheads;
pub mod mail;
pub mod notifications;
pub mod pagination;
pub mod response;
pub mod state;
pub mod tournaments;
pub mod users;
pub mod zones;

fn api_router() -> Router<AppState> {
    Router::new()
        .merge(zones::router())
        .merge(clubs::router())
        .merge(users::router())
        .merge(categories::router())
        .merge(tournaments::router())
        .merge(availabilities::router())
        .merge(assignments::router())
        .merge(institutional_emails::router())
        .merge(letter_templates::router())
        .merge(letterheads::router())
        .merge(notifications::router())
}

pub async fn app_with_state(state: AppState) -> Router {
    Router::new()
        .nest("/api", api_router())
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

pub async fn app() -> Result<Router, sea_orm::DbErr> {
    let state = AppState::new(config::read_config()).await?;
    Ok(app_with_state(state).await)
}
