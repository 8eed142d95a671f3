use std::sync::Arc;

use axum::{routing::get, Router};

use crate::{
    handlers::market::{get_long_short_ratio, get_sentiment_index, get_trending},
    routes::preflight,
    utils::state::AppState,
};

pub fn market_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/trending", get(get_trending).options(preflight))
        .route("/sentiment-index", get(get_sentiment_index).options(preflight))
        .route("/long-short-ratio", get(get_long_short_ratio).options(preflight))
}
