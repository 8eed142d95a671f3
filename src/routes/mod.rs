pub mod market;
pub mod news;
use axum::{extract::State, response::IntoResponse, routing::get, Json, Router};
use http::{
    header::{AUTHORIZATION, CONTENT_TYPE},
    Method, StatusCode,
};
use serde_json::json;
use std::{error::Error, sync::Arc};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{info, Level};
use tracing_subscriber::{filter, layer::SubscriberExt, util::SubscriberInitExt, Registry};

pub use market::market_routes;
pub use news::news_routes;

use crate::utils::{config::Config, state::AppState};

pub fn init_tracing() {
    let log_level = std::env::var("LOG_LEVEL")
        .unwrap_or_else(|_| "info".to_string())
        .to_lowercase();

    let level = match log_level.as_str() {
        "error" => Level::ERROR,
        "warn" => Level::WARN,
        "info" => Level::INFO,
        "debug" => Level::DEBUG,
        "trace" => Level::TRACE,
        _ => Level::INFO,
    };

    let filter = filter::Targets::new()
        .with_target("tower_http::trace::on_response", Level::TRACE)
        .with_target("tower_http::trace::on_request", Level::TRACE)
        .with_target("tower_http::trace::make_span", Level::DEBUG)
        .with_target("axum::rejection", Level::TRACE)
        .with_target(env!("CARGO_CRATE_NAME"), level)
        .with_default(Level::INFO);

    let tracing_layer = tracing_subscriber::fmt::layer();

    Registry::default().with(tracing_layer).with(filter).init();
}

pub fn make_app(config: Config) -> Result<Router, Box<dyn Error>> {
    info!("Initializing application...");
    let state = Arc::new(AppState::init(config)?);
    info!("Upstream clients and caches initialized");

    let app = build_router(state);
    info!("Application initialized successfully");

    Ok(app)
}

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(health_check))
        .merge(news_routes())
        .merge(market_routes())
        .layer(cors_layer())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION])
}

/// Empty 200 for `OPTIONS`; the CORS layer adds the headers.
pub async fn preflight() -> StatusCode {
    StatusCode::OK
}

async fn health_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(json!({
            "message": "ok",
            "cryptocompare_configured": state.config.cryptocompare_api_key.is_some(),
        })),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregator::tests::Fixture;
    use axum::{
        body::{to_bytes, Body},
        http::Request,
        response::Response,
    };
    use serde_json::Value;
    use tower::ServiceExt;

    fn router(fixture: &Fixture) -> Router {
        let state = AppState::with_aggregator(Config::default(), fixture.aggregator());
        build_router(Arc::new(state))
    }

    async fn get(app: &Router, uri: &str) -> Response {
        app.clone()
            .oneshot(
                Request::builder()
                    .uri(uri)
                    .header("Origin", "https://dashboard.example")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap()
    }

    async fn body_bytes(response: Response) -> Vec<u8> {
        to_bytes(response.into_body(), usize::MAX).await.unwrap().to_vec()
    }

    #[tokio::test]
    async fn news_is_served_from_cache_on_second_call() {
        let fixture = Fixture::new();
        let app = router(&fixture);

        let first = get(&app, "/news?source=All").await;
        assert_eq!(first.status(), StatusCode::OK);
        assert_eq!(
            first.headers().get("access-control-allow-origin").unwrap(),
            "*"
        );
        let first = body_bytes(first).await;

        let second = get(&app, "/news?source=All").await;
        assert_eq!(second.status(), StatusCode::OK);
        let second = body_bytes(second).await;

        assert_eq!(first, second);
        assert_eq!(fixture.cryptocompare.calls(), 1);
        assert_eq!(fixture.cointelegraph.calls(), 1);

        let items: Vec<Value> = serde_json::from_slice(&first).unwrap();
        assert_eq!(items.len(), 3);
        assert_eq!(items[0]["id"], "ct-2");
        assert!(items[0].get("publishedAt").is_some());
    }

    #[tokio::test]
    async fn news_defaults_to_all_sources() {
        let fixture = Fixture::new();
        let app = router(&fixture);

        assert_eq!(get(&app, "/news").await.status(), StatusCode::OK);
        assert_eq!(fixture.cryptocompare.calls(), 1);
        assert_eq!(fixture.cointelegraph.calls(), 1);
    }

    #[tokio::test]
    async fn blank_query_values_mean_the_default() {
        let fixture = Fixture::new();
        let app = router(&fixture);

        let response = get(&app, "/news?source=").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(fixture.cryptocompare.calls(), 1);
        assert_eq!(fixture.cointelegraph.calls(), 1);

        let response = get(&app, "/trending?sort=").await;
        assert_eq!(response.status(), StatusCode::OK);
        let body: Value = serde_json::from_slice(&body_bytes(response).await).unwrap();
        assert_eq!(body["coins"].as_array().unwrap().len(), 21);
    }

    #[tokio::test]
    async fn news_status_codes() {
        let fixture = Fixture::new();
        let app = router(&fixture);

        let bad = get(&app, "/news?source=Nitter").await;
        assert_eq!(bad.status(), StatusCode::BAD_REQUEST);

        // Registered sources but nothing to return.
        let empty = Fixture {
            cryptocompare: crate::sources::mock::MockAdapter::ok("CryptoCompare", vec![]),
            ..Fixture::new()
        };
        let empty_app = router(&empty);
        let response = get(&empty_app, "/news?source=CryptoCompare").await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body: Value = serde_json::from_slice(&body_bytes(response).await).unwrap();
        assert_eq!(body["error"], "No news items found");

        fixture.cryptocompare.set_failing(true);
        fixture.cointelegraph.set_failing(true);
        let response = get(&app, "/news?source=CoinTelegraph").await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body: Value = serde_json::from_slice(&body_bytes(response).await).unwrap();
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn trending_endpoint_shapes() {
        let fixture = Fixture::new();
        let app = router(&fixture);

        let response = get(&app, "/trending").await;
        assert_eq!(response.status(), StatusCode::OK);
        let body: Value = serde_json::from_slice(&body_bytes(response).await).unwrap();
        assert_eq!(body["coins"].as_array().unwrap().len(), 21);
        assert_eq!(body["coins"][20]["score"], 0);
        assert_eq!(body["coins"][20]["isTrending"], false);
        assert_eq!(body["market_data"].as_array().unwrap().len(), 250);

        let response = get(&app, "/trending?sort=market_cap").await;
        let body: Value = serde_json::from_slice(&body_bytes(response).await).unwrap();
        assert!(body.get("coins").is_none());

        let response = get(&app, "/trending?sort=volume").await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn sentiment_and_ratio_endpoints() {
        let fixture = Fixture::new();
        let app = router(&fixture);

        let response = get(&app, "/sentiment-index").await;
        assert_eq!(response.status(), StatusCode::OK);
        let body: Value = serde_json::from_slice(&body_bytes(response).await).unwrap();
        assert_eq!(body["value"], 55);
        assert_eq!(body["classification"], "Greed");
        assert_eq!(body["timeUntilUpdate"], 3600);

        let response = get(&app, "/long-short-ratio").await;
        let body: Value = serde_json::from_slice(&body_bytes(response).await).unwrap();
        assert_eq!(body["longShortRatio"], 1.25);

        let failing = Fixture::new();
        failing.long_short.set_failing(true);
        let response = get(&router(&failing), "/long-short-ratio").await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn options_returns_empty_ok_with_cors_headers() {
        let fixture = Fixture::new();
        let app = router(&fixture);

        for uri in ["/news", "/trending", "/sentiment-index", "/long-short-ratio"] {
            let response = app
                .clone()
                .oneshot(
                    Request::builder()
                        .method(Method::OPTIONS)
                        .uri(uri)
                        .header("Origin", "https://dashboard.example")
                        .body(Body::empty())
                        .unwrap(),
                )
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK, "{uri}");
            assert_eq!(
                response.headers().get("access-control-allow-origin").unwrap(),
                "*"
            );
            assert!(body_bytes(response).await.is_empty());
        }

        let preflight = app
            .clone()
            .oneshot(
                Request::builder()
                    .method(Method::OPTIONS)
                    .uri("/news")
                    .header("Origin", "https://dashboard.example")
                    .header("Access-Control-Request-Method", "GET")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(preflight.status(), StatusCode::OK);
        let methods = preflight
            .headers()
            .get("access-control-allow-methods")
            .unwrap()
            .to_str()
            .unwrap()
            .to_string();
        assert!(methods.contains("GET") && methods.contains("OPTIONS"));
        assert_eq!(fixture.cryptocompare.calls(), 0);
    }
}
