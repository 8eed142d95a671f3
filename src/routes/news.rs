use std::sync::Arc;

use axum::{routing::get, Router};

use crate::{handlers::news::get_news, routes::preflight, utils::state::AppState};

pub fn news_routes() -> Router<Arc<AppState>> {
    Router::new().route("/news", get(get_news).options(preflight))
}
