use std::sync::Arc;

use crate::{
    models::{error::Error, market::SortMode},
    utils::state::AppState,
};
use axum::{
    extract::{Query, State},
    response::IntoResponse,
    Json,
};
use http::StatusCode;
use serde::Deserialize;

#[derive(Deserialize)]
pub struct TrendingQuery {
    sort: Option<String>,
}

pub async fn get_trending(
    State(state): State<Arc<AppState>>,
    Query(params): Query<TrendingQuery>,
) -> Result<impl IntoResponse, Error> {
    let sort = match params.sort.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        None => SortMode::default(),
        Some(raw) => raw
            .parse()
            .map_err(|e: String| Error::new(StatusCode::BAD_REQUEST, &e))?,
    };

    let result = state.aggregator.fetch_trending(sort).await?;
    Ok((StatusCode::OK, Json(result)))
}

pub async fn get_sentiment_index(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, Error> {
    let index = state.aggregator.fetch_sentiment().await?;
    Ok((StatusCode::OK, Json(index)))
}

pub async fn get_long_short_ratio(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, Error> {
    let ratio = state.aggregator.fetch_long_short().await?;
    Ok((StatusCode::OK, Json(ratio)))
}
