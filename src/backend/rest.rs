//! Backend over the hosted REST API
//!
//! Table reads use PostgREST query syntax (`column=eq.value`), mutations go
//! through the stored procedures under `/rest/v1/rpc/`. Every request carries
//! the project `apikey` header and a bearer token: the signed-in user's
//! access token when there is one, the anonymous key otherwise.
//!
//! Real-time delivery is not wired up. Change notifications are published
//! for this client's own mutations only.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::json;
use url::Url;

use super::{Backend, BackendError, ChangeEvent, ChangeFeed, FetchCriteria, ResourceKind};
use crate::config::RemoteConfig;
use crate::models::{Category, Entry, EntryId};

const ENTRY_SELECT: &str = "*,categories(id,name,slug,color)";

/// Client for the hosted catalog
pub struct RestBackend {
    client: Client,
    base: Url,
    api_key: String,
    access_token: Option<String>,
    feed: ChangeFeed,
}

#[derive(Deserialize)]
struct SavedLinksRow {
    #[serde(default)]
    saved_links: Vec<EntryId>,
}

impl RestBackend {
    /// Build a client for the service described by `config`
    ///
    /// # Errors
    ///
    /// Returns `BackendError::Auth` when no API key is configured and
    /// `BackendError::Network` if the URL is invalid or the HTTP client
    /// cannot be built.
    pub fn new(config: &RemoteConfig) -> Result<Self, BackendError> {
        let api_key = config
            .api_key
            .clone()
            .filter(|key| !key.is_empty())
            .ok_or_else(|| BackendError::Auth("no API key configured".into()))?;

        let base = Url::parse(&config.url)
            .map_err(|e| BackendError::Network(format!("invalid service URL '{}': {e}", config.url)))?;

        let client = Client::builder()
            .user_agent(concat!("linkshelf/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(transport)?;

        Ok(Self {
            client,
            base,
            api_key,
            access_token: config.access_token.clone(),
            feed: ChangeFeed::new(),
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url, BackendError> {
        self.base
            .join(path)
            .map_err(|e| BackendError::Network(format!("invalid endpoint '{path}': {e}")))
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        let token = self.access_token.as_deref().unwrap_or(&self.api_key);
        request.header("apikey", &self.api_key).bearer_auth(token)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, BackendError> {
        let url = self.endpoint(path)?;
        log::debug!("GET {url}");
        let response = self
            .authorized(self.client.get(url).query(query))
            .send()
            .await
            .map_err(transport)?;
        decode(check_status(response).await?).await
    }

    async fn post_rpc(&self, name: &str, body: serde_json::Value) -> Result<Response, BackendError> {
        let url = self.endpoint(&format!("rest/v1/rpc/{name}"))?;
        log::debug!("POST {url}");
        let response = self
            .authorized(self.client.post(url).json(&body))
            .send()
            .await
            .map_err(transport)?;
        check_status(response).await
    }

    async fn rpc<T: DeserializeOwned>(
        &self,
        name: &str,
        body: serde_json::Value,
    ) -> Result<T, BackendError> {
        decode(self.post_rpc(name, body).await?).await
    }

    /// Call a procedure returning `void`; the service answers `204 No Content`
    async fn rpc_void(&self, name: &str, body: serde_json::Value) -> Result<(), BackendError> {
        self.post_rpc(name, body).await?;
        Ok(())
    }

    async fn single<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
        what: String,
    ) -> Result<T, BackendError> {
        let rows: Vec<T> = self.get_json(path, query).await?;
        rows.into_iter()
            .next()
            .ok_or(BackendError::NotFound(what))
    }
}

/// PostgREST query for `criteria`
fn entries_query(criteria: &FetchCriteria) -> Vec<(&'static str, String)> {
    let mut query = vec![
        ("select", ENTRY_SELECT.to_string()),
        ("status", format!("eq.{}", criteria.status)),
        ("order", "created_at.desc".to_string()),
    ];
    if let Some(category) = &criteria.category {
        query.push(("category_id", format!("eq.{category}")));
    }
    if let Some(featured) = criteria.featured {
        query.push(("featured", format!("eq.{featured}")));
    }
    if let Some(limit) = criteria.limit {
        query.push(("limit", limit.to_string()));
    }
    query
}

fn transport(err: reqwest::Error) -> BackendError {
    BackendError::Network(err.to_string())
}

/// Map a non-success status to the matching error
fn status_error(status: StatusCode, body: &str) -> BackendError {
    let message = if body.is_empty() {
        status.to_string()
    } else {
        format!("{status}: {body}")
    };
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => BackendError::Auth(message),
        StatusCode::NOT_FOUND => BackendError::NotFound(message),
        s if s.is_client_error() => BackendError::Decode(message),
        _ => BackendError::Network(message),
    }
}

async fn check_status(response: Response) -> Result<Response, BackendError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    log::warn!("request failed with {status}");
    Err(status_error(status, body.trim()))
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, BackendError> {
    response
        .json::<T>()
        .await
        .map_err(|e| BackendError::Decode(e.to_string()))
}

#[async_trait]
impl Backend for RestBackend {
    async fn fetch_entries(&self, criteria: &FetchCriteria) -> Result<Vec<Entry>, BackendError> {
        let entries: Vec<Entry> = self
            .get_json("rest/v1/links", &entries_query(criteria))
            .await?;
        Ok(entries.into_iter().map(Entry::normalized).collect())
    }

    async fn fetch_entry(&self, id: &str) -> Result<Entry, BackendError> {
        let query = [("select", ENTRY_SELECT.to_string()), ("id", format!("eq.{id}"))];
        let entry: Entry = self
            .single("rest/v1/links", &query, format!("entry {id}"))
            .await?;
        Ok(entry.normalized())
    }

    async fn fetch_categories(&self) -> Result<Vec<Category>, BackendError> {
        let query = [
            ("select", "*".to_string()),
            ("order", "order_index.asc".to_string()),
        ];
        self.get_json("rest/v1/categories", &query).await
    }

    async fn fetch_category_by_slug(&self, slug: &str) -> Result<Category, BackendError> {
        let query = [("select", "*".to_string()), ("slug", format!("eq.{slug}"))];
        self.single("rest/v1/categories", &query, format!("category '{slug}'"))
            .await
    }

    async fn track_click(
        &self,
        entry_id: &str,
        user_id: Option<&str>,
    ) -> Result<(), BackendError> {
        let body = json!({
            "p_link_id": entry_id,
            "p_user_id": user_id,
            "p_ip_address": null,
            "p_user_agent": concat!("linkshelf/", env!("CARGO_PKG_VERSION")),
            "p_referrer": null,
        });
        self.rpc_void("increment_click_count", body).await?;
        self.feed
            .publish(&ChangeEvent::new(ResourceKind::Entries, entry_id));
        Ok(())
    }

    async fn toggle_saved_link(
        &self,
        user_id: &str,
        entry_id: &str,
    ) -> Result<bool, BackendError> {
        let body = json!({ "p_user_id": user_id, "p_link_id": entry_id });
        let saved: bool = self.rpc("toggle_saved_link", body).await?;
        self.feed
            .publish(&ChangeEvent::new(ResourceKind::SavedLinks, entry_id));
        Ok(saved)
    }

    async fn saved_links(&self, user_id: &str) -> Result<Vec<EntryId>, BackendError> {
        let query = [
            ("select", "saved_links".to_string()),
            ("id", format!("eq.{user_id}")),
        ];
        let row: SavedLinksRow = self
            .single("rest/v1/user_profiles", &query, format!("user {user_id}"))
            .await?;
        Ok(row.saved_links)
    }

    fn changes(&self) -> &ChangeFeed {
        &self.feed
    }
}

#[cfg(test)]
mod tests {
    use std::io::{BufRead, BufReader, Read, Write};
    use std::net::TcpListener;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;

    use super::*;
    use crate::models::EntryStatus;

    /// Serve one request with a canned `status_line` and empty body; returns the base URL
    fn serve_once(status_line: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            let mut reader = BufReader::new(stream);
            let mut content_length = 0;
            loop {
                let mut line = String::new();
                reader.read_line(&mut line).unwrap();
                let line = line.trim_end();
                if line.is_empty() {
                    break;
                }
                if let Some((name, value)) = line.split_once(':')
                    && name.eq_ignore_ascii_case("content-length")
                {
                    content_length = value.trim().parse().unwrap();
                }
            }
            let mut body = vec![0; content_length];
            reader.read_exact(&mut body).unwrap();

            let mut stream = reader.into_inner();
            write!(
                stream,
                "{status_line}\r\nContent-Length: 0\r\nConnection: close\r\n\r\n"
            )
            .unwrap();
        });
        format!("http://{addr}/")
    }

    fn backend_at(url: String) -> RestBackend {
        RestBackend::new(&RemoteConfig {
            url,
            api_key: Some("anon".into()),
            ..RemoteConfig::default()
        })
        .unwrap()
    }

    fn config(api_key: Option<&str>) -> RemoteConfig {
        RemoteConfig {
            url: "https://project.example.co/".into(),
            api_key: api_key.map(str::to_string),
            ..RemoteConfig::default()
        }
    }

    #[test]
    fn test_missing_api_key_is_auth_error() {
        assert!(matches!(
            RestBackend::new(&config(None)),
            Err(BackendError::Auth(_))
        ));
        assert!(matches!(
            RestBackend::new(&config(Some(""))),
            Err(BackendError::Auth(_))
        ));
    }

    #[test]
    fn test_invalid_url_is_network_error() {
        let mut config = config(Some("anon"));
        config.url = "not a url".into();
        assert!(matches!(
            RestBackend::new(&config),
            Err(BackendError::Network(_))
        ));
    }

    #[test]
    fn test_endpoint_joins_base() {
        let backend = RestBackend::new(&config(Some("anon"))).unwrap();
        assert_eq!(
            backend.endpoint("rest/v1/links").unwrap().as_str(),
            "https://project.example.co/rest/v1/links"
        );
    }

    #[test]
    fn test_entries_query() {
        let criteria = FetchCriteria {
            category: Some("c1".into()),
            featured: Some(true),
            status: EntryStatus::Approved,
            limit: Some(6),
        };
        let query = entries_query(&criteria);
        assert!(query.contains(&("status", "eq.approved".to_string())));
        assert!(query.contains(&("category_id", "eq.c1".to_string())));
        assert!(query.contains(&("featured", "eq.true".to_string())));
        assert!(query.contains(&("limit", "6".to_string())));
        assert!(query.contains(&("order", "created_at.desc".to_string())));

        let plain = entries_query(&FetchCriteria::default());
        assert_eq!(plain.len(), 3);
    }

    #[test]
    fn test_status_mapping() {
        assert!(matches!(
            status_error(StatusCode::UNAUTHORIZED, ""),
            BackendError::Auth(_)
        ));
        assert!(matches!(
            status_error(StatusCode::FORBIDDEN, "denied"),
            BackendError::Auth(_)
        ));
        assert!(matches!(
            status_error(StatusCode::BAD_GATEWAY, ""),
            BackendError::Network(_)
        ));
        assert!(matches!(
            status_error(StatusCode::NOT_FOUND, ""),
            BackendError::NotFound(_)
        ));
        assert!(matches!(
            status_error(StatusCode::BAD_REQUEST, "bad filter"),
            BackendError::Decode(_)
        ));
    }

    #[tokio::test]
    async fn test_click_on_no_content_succeeds_and_publishes() {
        let backend = backend_at(serve_once("HTTP/1.1 204 No Content"));
        let seen = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&seen);
        let _subscription = backend.subscribe_to_changes(
            ResourceKind::Entries,
            Box::new(move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
            }),
        );

        backend.track_click("1", None).await.unwrap();
        assert_eq!(seen.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_click_rejected_by_service() {
        let backend = backend_at(serve_once("HTTP/1.1 401 Unauthorized"));
        assert!(matches!(
            backend.track_click("1", None).await,
            Err(BackendError::Auth(_))
        ));
    }
}
