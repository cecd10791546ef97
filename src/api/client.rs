use std::time::{Duration, Instant};

use reqwest::{RequestBuilder, Url};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use crate::dashboard::filter::Filters;
use crate::dashboard::scrape::ScrapeRequest;
use crate::error::{AppError, Result};
use crate::types::{
    parse_scraper_health, ScrapeResponse, ScraperHealth, Stats, TrendTile, Vehicle, VehicleUpdate,
};

/// Error bodies are cut to this many bytes before they land in logs or messages.
const MAX_ERROR_BODY: usize = 200;

/// Typed client for the FlipBot backend. One method per endpoint; every call
/// maps a non-2xx response to `AppError::Status`.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    scrape_timeout: Duration,
}

impl ApiClient {
    /// `base_url` is the backend origin; the `/api` prefix is added here.
    pub fn new(
        base_url: impl Into<String>,
        request_timeout: Duration,
        scrape_timeout: Duration,
    ) -> Result<Self> {
        let http = reqwest::Client::builder().timeout(request_timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            scrape_timeout,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api{}", self.base_url, path)
    }

    /// GET /api/deals?limit=N
    pub async fn deals(&self, limit: usize) -> Result<Vec<Vehicle>> {
        let req = self
            .http
            .get(self.url("/deals"))
            .query(&[("limit", limit.to_string())]);
        send_json(req).await
    }

    /// GET /api/trending
    pub async fn trending(&self) -> Result<Vec<TrendTile>> {
        send_json(self.http.get(self.url("/trending"))).await
    }

    /// GET /api/stats
    pub async fn stats(&self) -> Result<Stats> {
        send_json(self.http.get(self.url("/stats"))).await
    }

    /// GET /api/search?q=...; unset filters are not sent.
    pub async fn search(&self, query: &str, filters: &Filters) -> Result<Vec<Vehicle>> {
        let mut params: Vec<(&'static str, String)> = vec![("q", query.trim().to_string())];
        params.extend(filters.query_params());
        let req = self.http.get(self.url("/search")).query(&params);
        send_json(req).await
    }

    /// PUT /api/vehicles/{id}. The updated record is not used beyond success.
    pub async fn update_vehicle(&self, id: &str, update: &VehicleUpdate) -> Result<()> {
        let mut url = Url::parse(&self.url("/vehicles"))
            .map_err(|e| AppError::Config(format!("invalid API url: {e}")))?;
        url.path_segments_mut()
            .map_err(|_| AppError::Config("API url cannot carry a path".to_string()))?
            .push(id);
        let _: Value = send_json(self.http.put(url).json(update)).await?;
        Ok(())
    }

    /// POST /api/scrape/{kind}; parameters travel in the query string.
    pub async fn scrape(&self, req: &ScrapeRequest) -> Result<ScrapeResponse> {
        let started = Instant::now();
        let builder = self
            .http
            .post(self.url(req.kind.path()))
            .query(&req.query_params())
            .timeout(self.scrape_timeout);
        let resp: ScrapeResponse = send_json(builder).await?;
        debug!(
            kind = %req.kind,
            vehicles = resp.vehicles.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "scrape returned"
        );
        Ok(resp)
    }

    /// GET /api/scrape/test: live probe of each scraper.
    pub async fn scrape_test(&self) -> Result<ScraperHealth> {
        let v: Value = send_json(self.http.get(self.url("/scrape/test")).timeout(self.scrape_timeout)).await?;
        Ok(parse_scraper_health(&v))
    }

    /// GET /api/scrape/sources: static list of configured sources.
    pub async fn scrape_sources(&self) -> Result<ScraperHealth> {
        let v: Value = send_json(self.http.get(self.url("/scrape/sources"))).await?;
        Ok(parse_scraper_health(&v))
    }
}

async fn send_json<T: DeserializeOwned>(req: RequestBuilder) -> Result<T> {
    let resp = req.send().await?;
    let status = resp.status();
    debug!(url = %resp.url(), status = status.as_u16(), "backend response");
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(AppError::Status { status, body: clip(&body, MAX_ERROR_BODY) });
    }
    let bytes = resp.bytes().await?;
    Ok(serde_json::from_slice(&bytes)?)
}

fn clip(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    s[..end].to_string()
}

#[cfg(test)]
pub(crate) mod tests {
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    use axum::{
        extract::{Path, Query},
        http::StatusCode,
        routing::{get, post, put},
        Json, Router,
    };
    use serde_json::json;

    use super::*;
    use crate::dashboard::scrape::ScrapeKind;

    /// Serve `router` on an ephemeral port and return its origin.
    pub(crate) async fn serve(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}")
    }

    pub(crate) fn client(base: &str) -> ApiClient {
        ApiClient::new(base, Duration::from_secs(5), Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn deals_sends_limit() {
        let seen: Arc<Mutex<Option<String>>> = Arc::default();
        let seen_in = seen.clone();
        let router = Router::new().route(
            "/api/deals",
            get(move |Query(q): Query<HashMap<String, String>>| async move {
                *seen_in.lock().unwrap() = q.get("limit").cloned();
                Json(json!([{"id": "a", "asking_price": 1000}]))
            }),
        );
        let api = client(&serve(router).await);

        let deals = api.deals(20).await.unwrap();
        assert_eq!(deals.len(), 1);
        assert_eq!(seen.lock().unwrap().as_deref(), Some("20"));
    }

    #[tokio::test]
    async fn search_forwards_only_set_filters() {
        let seen: Arc<Mutex<HashMap<String, String>>> = Arc::default();
        let seen_in = seen.clone();
        let router = Router::new().route(
            "/api/search",
            get(move |Query(q): Query<HashMap<String, String>>| async move {
                *seen_in.lock().unwrap() = q;
                Json(json!([]))
            }),
        );
        let api = client(&serve(router).await);

        let filters = Filters {
            zip_code: Some("90210".to_string()),
            price_max: Some(50000.0),
            min_profit: Some(3000.0),
            ..Default::default()
        };
        api.search("  ram trx ", &filters).await.unwrap();

        let q = seen.lock().unwrap().clone();
        assert_eq!(q.get("q").map(String::as_str), Some("ram trx"));
        assert_eq!(q.get("zip_code").map(String::as_str), Some("90210"));
        assert_eq!(q.get("price_max").map(String::as_str), Some("50000"));
        assert_eq!(q.get("min_profit").map(String::as_str), Some("3000"));
        assert!(!q.contains_key("distance"));
        assert!(!q.contains_key("year_min"));
    }

    #[tokio::test]
    async fn update_vehicle_puts_status_body() {
        let seen: Arc<Mutex<Option<(String, Value)>>> = Arc::default();
        let seen_in = seen.clone();
        let router = Router::new().route(
            "/api/vehicles/:id",
            put(move |Path(id): Path<String>, Json(body): Json<Value>| async move {
                *seen_in.lock().unwrap() = Some((id.clone(), body));
                Json(json!({"id": id, "status": "watching"}))
            }),
        );
        let api = client(&serve(router).await);

        let update = VehicleUpdate { status: Some(crate::types::ListingStatus::Watching) };
        api.update_vehicle("veh-42", &update).await.unwrap();

        let (id, body) = seen.lock().unwrap().clone().unwrap();
        assert_eq!(id, "veh-42");
        assert_eq!(body, json!({"status": "watching"}));
    }

    #[tokio::test]
    async fn non_success_maps_to_status_error() {
        let router = Router::new().route(
            "/api/vehicles/:id",
            put(|| async { (StatusCode::NOT_FOUND, "Vehicle not found") }),
        );
        let api = client(&serve(router).await);

        let err = api
            .update_vehicle("missing", &VehicleUpdate::default())
            .await
            .unwrap_err();
        match err {
            AppError::Status { status, body } => {
                assert_eq!(status, StatusCode::NOT_FOUND);
                assert_eq!(body, "Vehicle not found");
            }
            other => panic!("expected Status error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn scrape_posts_query_params() {
        let seen: Arc<Mutex<HashMap<String, String>>> = Arc::default();
        let seen_in = seen.clone();
        let router = Router::new().route(
            "/api/scrape/enthusiast",
            post(move |Query(q): Query<HashMap<String, String>>| async move {
                *seen_in.lock().unwrap() = q;
                Json(json!({"vehicles_found": 1, "duration": 2.5, "vehicles": [{"id": "bat-1"}]}))
            }),
        );
        let api = client(&serve(router).await);

        let req = ScrapeRequest::new(ScrapeKind::Enthusiast, "porsche 911", Some("Austin, TX".to_string()));
        let resp = api.scrape(&req).await.unwrap();
        assert_eq!(resp.vehicles.len(), 1);

        let q = seen.lock().unwrap().clone();
        assert_eq!(q.get("query").map(String::as_str), Some("porsche 911"));
        assert_eq!(q.get("max_results").map(String::as_str), Some("15"));
        // Enthusiast auctions are nationwide.
        assert!(!q.contains_key("location"));
    }

    #[tokio::test]
    async fn malformed_body_is_json_error() {
        let router = Router::new().route("/api/stats", get(|| async { "not json" }));
        let api = client(&serve(router).await);
        assert!(matches!(api.stats().await, Err(AppError::Json(_))));
    }

    #[test]
    fn clip_respects_char_boundaries() {
        assert_eq!(clip("héllo", 2), "h");
        assert_eq!(clip("short", 200), "short");
    }
}
