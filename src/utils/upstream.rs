#![forbid(unsafe_code)]

use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use reqwest::{header, Client};
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::utils::config::Config;
use crate::utils::models::{Artist, Date, Index, Location, Relation};

// ***************************************************************************
//                                Constants
// ***************************************************************************
pub const DEFAULT_UPSTREAM_BASE_URL: &str = "https://groupietrackers.herokuapp.com/api";

// ***************************************************************************
//                                  Errors
// ***************************************************************************
#[derive(Error, Debug)]
pub enum UpstreamError {
    #[error("upstream request to {url} failed: {msg}")]
    Transport { url: String, msg: String },

    #[error("upstream {url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("unable to decode upstream response from {url}: {msg}")]
    Decode { url: String, msg: String },

    #[error("unable to build upstream client: {0}")]
    Client(String),
}

// ***************************************************************************
//                                  Trait
// ***************************************************************************
/** Read-only access to the artists API.  The page handlers only see this
 * trait so a stub can stand in for the real service.
 */
#[async_trait]
pub trait UpstreamClient: Send + Sync {
    async fn artists(&self) -> Result<Vec<Artist>, UpstreamError>;
    async fn artist(&self, id: i32) -> Result<Artist, UpstreamError>;
    async fn locations(&self, id: i32) -> Result<Location, UpstreamError>;
    async fn dates(&self, id: i32) -> Result<Date, UpstreamError>;
    async fn relation(&self, id: i32) -> Result<Relation, UpstreamError>;

    async fn all_locations(&self) -> Result<Vec<Location>, UpstreamError>;
    async fn all_dates(&self) -> Result<Vec<Date>, UpstreamError>;
    async fn all_relations(&self) -> Result<Vec<Relation>, UpstreamError>;
}

// ***************************************************************************
//                              HTTP Client
// ***************************************************************************
#[derive(Debug, Clone)]
pub struct GroupieClient {
    http: Client,
    base: String,
}

impl GroupieClient {
    pub fn new(base: &str, timeout: Duration, connect_timeout: Duration) -> Result<Self, UpstreamError> {
        let mut h = header::HeaderMap::new();
        h.insert(header::ACCEPT, header::HeaderValue::from_static("application/json"));
        let http = Client::builder()
            .timeout(timeout)
            .connect_timeout(connect_timeout)
            .default_headers(h)
            .build()
            .map_err(|e| UpstreamError::Client(e.to_string()))?;

        Ok(Self { http, base: base.trim_end_matches('/').to_string() })
    }

    pub fn from_config(config: &Config) -> Result<Self, UpstreamError> {
        Self::new(&config.upstream_base_url,
                  Duration::from_secs(config.upstream_timeout_secs),
                  Duration::from_secs(config.upstream_connect_timeout_secs))
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base, path)
    }

    /// GET a path below the base url and decode the JSON body.
    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, UpstreamError> {
        let url = self.url(path);
        debug!("GET {}", url);

        let resp = self.http.get(&url).send().await
            .map_err(|e| UpstreamError::Transport { url: url.clone(), msg: e.to_string() })?;
        let status = resp.status();
        if !status.is_success() {
            return Err(UpstreamError::Status { url, status: status.as_u16() });
        }

        // Read the body first so transport and decode failures stay distinct.
        let bytes = resp.bytes().await
            .map_err(|e| UpstreamError::Transport { url: url.clone(), msg: e.to_string() })?;
        serde_json::from_slice(&bytes)
            .map_err(|e| UpstreamError::Decode { url, msg: e.to_string() })
    }
}

#[async_trait]
impl UpstreamClient for GroupieClient {
    async fn artists(&self) -> Result<Vec<Artist>, UpstreamError> {
        self.get_json("artists").await
    }

    async fn artist(&self, id: i32) -> Result<Artist, UpstreamError> {
        self.get_json(&format!("artists/{}", id)).await
    }

    async fn locations(&self, id: i32) -> Result<Location, UpstreamError> {
        self.get_json(&format!("locations/{}", id)).await
    }

    async fn dates(&self, id: i32) -> Result<Date, UpstreamError> {
        self.get_json(&format!("dates/{}", id)).await
    }

    async fn relation(&self, id: i32) -> Result<Relation, UpstreamError> {
        self.get_json(&format!("relation/{}", id)).await
    }

    async fn all_locations(&self) -> Result<Vec<Location>, UpstreamError> {
        Ok(self.get_json::<Index<Location>>("locations").await?.index)
    }

    async fn all_dates(&self) -> Result<Vec<Date>, UpstreamError> {
        Ok(self.get_json::<Index<Date>>("dates").await?.index)
    }

    async fn all_relations(&self) -> Result<Vec<Relation>, UpstreamError> {
        Ok(self.get_json::<Index<Relation>>("relation").await?.index)
    }
}

// ***************************************************************************
//                                  Tests
// ***************************************************************************
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_is_normalized() {
        let c = GroupieClient::new("http://localhost:9/api/", Duration::from_secs(1),
                                   Duration::from_secs(1)).unwrap();
        assert_eq!(c.url("artists/3"), "http://localhost:9/api/artists/3");
    }

    #[tokio::test]
    async fn unreachable_upstream_is_a_transport_error() {
        // Port 9 (discard) is not expected to be listening.
        let c = GroupieClient::new("http://127.0.0.1:9/api", Duration::from_secs(2),
                                   Duration::from_secs(1)).unwrap();
        match c.artists().await {
            Err(UpstreamError::Transport { url, .. }) => assert!(url.ends_with("/artists")),
            other => panic!("expected transport error, got {:?}", other),
        }
    }

    #[test]
    fn index_envelope_decodes() {
        let json = r#"{"index":[{"id":1,"dates":["*23-08-2019","22-08-2019"]}]}"#;
        let idx: Index<Date> = serde_json::from_str(json).unwrap();
        assert_eq!(idx.index[0].dates.len(), 2);
    }
}
