//! Links/search backend client.
//!
//! [`WikiApi`] is the seam the explorer fetches through; [`HttpWikiApi`] is
//! the production implementation over `reqwest`.

use std::time::Duration;

use futures::future::{BoxFuture, FutureExt};
use reqwest::Url;
use tracing::{debug, warn};

use crate::config::schema::ApiConfig;
use crate::error::{Result, WikiGraphError};
use crate::title::normalize_title;
use crate::types::{LinksResult, SearchResult};

/// Backend collaborator used by the explorer.
pub trait WikiApi: Send + Sync {
    /// Outbound links for an article, looked up by its normalized title.
    fn fetch_links<'a>(&'a self, title: &'a str) -> BoxFuture<'a, Result<LinksResult>>;

    /// Title search; at most `limit` results are returned.
    fn fetch_search<'a>(&'a self, query: &'a str, limit: usize)
        -> BoxFuture<'a, Result<SearchResult>>;
}

// ---------------------------------------------------------------------------
// HttpWikiApi
// ---------------------------------------------------------------------------

/// `GET {base}/links/{title}` and `GET {base}/search?q=..&limit=..`.
#[derive(Debug, Clone)]
pub struct HttpWikiApi {
    client: reqwest::Client,
    base: Url,
}

impl HttpWikiApi {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let base = Url::parse(base_url.trim())
            .map_err(|e| WikiGraphError::Config(format!("api base url {base_url:?}: {e}")))?;
        if base.cannot_be_a_base() {
            return Err(WikiGraphError::Config(format!(
                "api base url {base_url:?} cannot carry a path"
            )));
        }
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client, base })
    }

    pub fn from_config(config: &ApiConfig) -> Result<Self> {
        Self::new(&config.base_url, config.timeout())
    }

    pub fn base_url(&self) -> &str {
        self.base.as_str()
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| WikiGraphError::Config(format!("api base url {} cannot carry a path", self.base)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    pub async fn links(&self, title: &str) -> Result<LinksResult> {
        let normalized = normalize_title(title);
        let url = self.endpoint(&["links", normalized.as_str()])?;
        debug!(%url, "fetching links");

        let resp = self.client.get(url).send().await?;
        if !resp.status().is_success() {
            warn!(title = %normalized, status = %resp.status(), "links request failed");
            return Err(WikiGraphError::Links(format!(
                "HTTP {} for {normalized}",
                resp.status()
            )));
        }
        Ok(resp.json::<LinksResult>().await?)
    }

    pub async fn search(&self, query: &str, limit: usize) -> Result<SearchResult> {
        let mut url = self.endpoint(&["search"])?;
        url.query_pairs_mut()
            .append_pair("q", query)
            .append_pair("limit", &limit.to_string());
        debug!(%url, "searching");

        let resp = self.client.get(url).send().await?;
        if !resp.status().is_success() {
            warn!(query, status = %resp.status(), "search request failed");
            return Err(WikiGraphError::Search(format!("HTTP {}", resp.status())));
        }
        let mut result = resp.json::<SearchResult>().await?;
        result.search.truncate(limit);
        Ok(result)
    }
}

impl WikiApi for HttpWikiApi {
    fn fetch_links<'a>(&'a self, title: &'a str) -> BoxFuture<'a, Result<LinksResult>> {
        self.links(title).boxed()
    }

    fn fetch_search<'a>(
        &'a self,
        query: &'a str,
        limit: usize,
    ) -> BoxFuture<'a, Result<SearchResult>> {
        self.search(query, limit).boxed()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::{Path, Query};
    use axum::http::StatusCode;
    use axum::response::IntoResponse;
    use axum::routing::get;
    use axum::{Json, Router};
    use std::collections::HashMap;

    async fn links(Path(title): Path<String>) -> axum::response::Response {
        match title.as_str() {
            "Missing" => StatusCode::NOT_FOUND.into_response(),
            "Garbled" => "not json".into_response(),
            _ => Json(serde_json::json!({
                "count": 2,
                "title": title,
                "linkedArticles": ["Vertex (graph theory)", "Edge (graph theory)"],
            }))
            .into_response(),
        }
    }

    async fn search(Query(params): Query<HashMap<String, String>>) -> axum::response::Response {
        let q = params.get("q").cloned().unwrap_or_default();
        if q == "boom" {
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
        let limit = params.get("limit").cloned().unwrap_or_default();
        // Deliberately ignores the limit to exercise client-side truncation.
        let hits: Vec<String> = (0..15).map(|i| format!("{q} {i}")).collect();
        Json(serde_json::json!({
            "search": hits,
            "totalhits": 1500,
            "echoLimit": limit,
        }))
        .into_response()
    }

    async fn backend() -> String {
        let app = Router::new()
            .route("/links/{title}", get(links))
            .route("/search", get(search));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}")
    }

    fn client(base: &str) -> HttpWikiApi {
        HttpWikiApi::new(base, Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn fetch_links_normalizes_title() {
        let api = client(&backend().await);
        let result = api.fetch_links("Graph theory").await.unwrap();
        assert_eq!(result.title, "Graph_theory");
        assert_eq!(result.count, 2);
        assert_eq!(result.linked_articles[1], "Edge (graph theory)");
    }

    #[tokio::test]
    async fn fetch_links_escapes_path_separators() {
        let api = client(&backend().await);
        let result = api.fetch_links("AC/DC").await.unwrap();
        assert_eq!(result.title, "AC/DC");
    }

    #[tokio::test]
    async fn fetch_links_maps_http_status_to_links_error() {
        let api = client(&backend().await);
        let err = api.fetch_links("Missing").await.unwrap_err();
        assert!(matches!(err, WikiGraphError::Links(_)), "got {err}");
        assert!(err.to_string().contains("404"));
        assert!(err.is_fetch_failure());
    }

    #[tokio::test]
    async fn fetch_links_bad_body_is_http_error() {
        let api = client(&backend().await);
        let err = api.fetch_links("Garbled").await.unwrap_err();
        assert!(matches!(err, WikiGraphError::Http(_)), "got {err}");
    }

    #[tokio::test]
    async fn fetch_search_truncates_to_limit() {
        let api = client(&backend().await);
        let result = api.fetch_search("graph", 10).await.unwrap();
        assert_eq!(result.search.len(), 10);
        assert_eq!(result.search[0], "graph 0");
        assert_eq!(result.totalhits, 1500);
    }

    #[tokio::test]
    async fn fetch_search_maps_http_status_to_search_error() {
        let api = client(&backend().await);
        let err = api.fetch_search("boom", 10).await.unwrap_err();
        assert!(matches!(err, WikiGraphError::Search(_)), "got {err}");
    }

    #[tokio::test]
    async fn unreachable_backend_is_fetch_failure() {
        // Bind then drop to get a port nothing listens on.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        let api = client(&format!("http://{addr}"));
        let err = api.fetch_links("Anything").await.unwrap_err();
        assert!(err.is_fetch_failure());
    }

    #[test]
    fn base_url_with_trailing_path_is_preserved() {
        let api = client("http://localhost:8080/api/");
        let url = api.endpoint(&["links", "Graph_theory"]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:8080/api/links/Graph_theory");
    }

    #[test]
    fn rejects_unusable_base_url() {
        assert!(HttpWikiApi::new("not a url", Duration::from_secs(1)).is_err());
        assert!(HttpWikiApi::new("mailto:x@example.com", Duration::from_secs(1)).is_err());
    }
}
