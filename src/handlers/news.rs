use std::sync::Arc;

use crate::{
    models::{error::Error, news::SourceFilter},
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
pub struct NewsQuery {
    source: Option<String>,
}

pub async fn get_news(
    State(state): State<Arc<AppState>>,
    Query(params): Query<NewsQuery>,
) -> Result<impl IntoResponse, Error> {
    let filter: SourceFilter = params
        .source
        .as_deref()
        .map(str::trim)
        .filter(|source| !source.is_empty())
        .unwrap_or("All")
        .parse()
        .map_err(|e: String| Error::new(StatusCode::BAD_REQUEST, &e))?;

    let items = state.aggregator.fetch_news(filter).await?;
    if items.is_empty() {
        return Err(Error::new(StatusCode::NOT_FOUND, "No news items found"));
    }

    Ok((StatusCode::OK, Json(items)))
}
