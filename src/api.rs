use std::num::NonZeroU32;
use std::time::Duration;

use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;

use crate::feed::FeedItem;

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("unexpected status code: {0}")]
    Status(u16),
    #[error("malformed payload: {0}")]
    Decode(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Newsletter {
    pub id: String,
    pub title: String,
    pub excerpt: String,
    pub date: String,
    pub read_time: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Podcast {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub duration: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ApiStatus {
    pub version: String,
}

/// Typed client for the content API. Every call is a single request:
/// nothing is cached and nothing is retried.
pub struct DataService {
    client: Client,
    base_url: String,
}

impl DataService {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent("FormaggioWeb/1.0")
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn get_newsletters(&self, limit: NonZeroU32) -> Result<Vec<Newsletter>, FetchError> {
        self.get_feed(limit).await
    }

    pub async fn get_podcasts(&self, limit: NonZeroU32) -> Result<Vec<Podcast>, FetchError> {
        self.get_feed(limit).await
    }

    /// Fetch at most `limit` items of one feed, in the order the backend returns them.
    pub async fn get_feed<T: FeedItem>(&self, limit: NonZeroU32) -> Result<Vec<T>, FetchError> {
        self.get_json(T::KIND.api_path(), &[("limit", limit.get())])
            .await
    }

    pub async fn get_status(&self) -> Result<ApiStatus, FetchError> {
        self.get_json("/status", &[]).await
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, u32)],
    ) -> Result<T, FetchError> {
        let url = format!("{}{}", self.base_url, path);
        debug!("GET {}", url);

        let response = self.client.get(&url).query(query).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn limit(n: u32) -> NonZeroU32 {
        NonZeroU32::new(n).unwrap()
    }

    fn service(server: &MockServer) -> DataService {
        DataService::new(&server.uri(), Duration::from_secs(5)).unwrap()
    }

    fn newsletter_json(id: &str) -> serde_json::Value {
        json!({
            "id": id,
            "title": format!("Issue {}", id),
            "excerpt": "All about cheese",
            "date": "2024-11-01",
            "readTime": "5 min read"
        })
    }

    mod newsletters_tests {
        use super::*;

        #[tokio::test]
        async fn test_get_newsletters_sends_limit_and_preserves_order() {
            let server = MockServer::start().await;
            Mock::given(method("GET"))
                .and(path("/newsletters"))
                .and(query_param("limit", "4"))
                .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                    newsletter_json("9"),
                    newsletter_json("2"),
                    newsletter_json("7"),
                ])))
                .expect(1)
                .mount(&server)
                .await;

            let items = service(&server).get_newsletters(limit(4)).await.unwrap();

            let ids: Vec<&str> = items.iter().map(|n| n.id.as_str()).collect();
            assert_eq!(ids, vec!["9", "2", "7"]);
            assert_eq!(items[0].read_time, "5 min read");
            assert_eq!(items[0].title, "Issue 9");
        }

        #[tokio::test]
        async fn test_get_newsletters_empty_list() {
            let server = MockServer::start().await;
            Mock::given(method("GET"))
                .and(path("/newsletters"))
                .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
                .mount(&server)
                .await;

            let items = service(&server).get_newsletters(limit(4)).await.unwrap();
            assert!(items.is_empty());
        }

        #[tokio::test]
        async fn test_get_newsletters_missing_field_is_decode_error() {
            let server = MockServer::start().await;
            Mock::given(method("GET"))
                .and(path("/newsletters"))
                .respond_with(
                    ResponseTemplate::new(200).set_body_json(json!([{ "id": "1", "title": "x" }])),
                )
                .mount(&server)
                .await;

            let result = service(&server).get_newsletters(limit(4)).await;
            assert!(matches!(result, Err(FetchError::Decode(_))));
        }
    }

    mod podcasts_tests {
        use super::*;

        #[tokio::test]
        async fn test_get_podcasts_with_optional_fields() {
            let server = MockServer::start().await;
            Mock::given(method("GET"))
                .and(path("/podcasts"))
                .and(query_param("limit", "2"))
                .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                    { "id": "p1", "title": "Brie in French", "duration": "32:10" },
                    { "id": "p2", "title": "Gouda in Dutch" }
                ])))
                .mount(&server)
                .await;

            let items = service(&server).get_podcasts(limit(2)).await.unwrap();

            assert_eq!(items.len(), 2);
            assert_eq!(items[0].duration, "32:10");
            assert_eq!(items[1].id, "p2");
            assert_eq!(items[1].description, "");
        }
    }

    mod status_tests {
        use super::*;

        #[tokio::test]
        async fn test_get_status() {
            let server = MockServer::start().await;
            Mock::given(method("GET"))
                .and(path("/status"))
                .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "version": "3.0" })))
                .mount(&server)
                .await;

            let status = service(&server).get_status().await.unwrap();
            assert_eq!(status.version, "3.0");
        }

        #[tokio::test]
        async fn test_get_status_server_error() {
            let server = MockServer::start().await;
            Mock::given(method("GET"))
                .and(path("/status"))
                .respond_with(ResponseTemplate::new(503))
                .mount(&server)
                .await;

            let result = service(&server).get_status().await;
            assert!(matches!(result, Err(FetchError::Status(503))));
        }

        #[tokio::test]
        async fn test_get_status_not_json() {
            let server = MockServer::start().await;
            Mock::given(method("GET"))
                .and(path("/status"))
                .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
                .mount(&server)
                .await;

            let result = service(&server).get_status().await;
            assert!(matches!(result, Err(FetchError::Decode(_))));
        }
    }

    mod transport_tests {
        use super::*;

        #[tokio::test]
        async fn test_connection_refused_is_request_error() {
            let service = DataService::new("http://127.0.0.1:1", Duration::from_secs(2)).unwrap();

            let result = service.get_status().await;
            assert!(matches!(result, Err(FetchError::Request(_))));
        }

        #[test]
        fn test_base_url_trailing_slash_trimmed() {
            let service = DataService::new("http://api.local/", Duration::from_secs(2)).unwrap();
            assert_eq!(service.base_url(), "http://api.local");
        }
    }
}
