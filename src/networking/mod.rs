use std::time::Duration;

use async_trait::async_trait;
use log::{debug, warn};
use reqwest::{Client, Url};

use crate::config::PanelConfig;
use crate::engine::models::{AppRecord, Manifest};
use crate::error::FetchError;

const DETAIL_SUFFIX: &str = ".json";
const USER_AGENT: &str = concat!("other-apps/", env!("CARGO_PKG_VERSION"));

/// A detail document both decoded and as received, so the cache keeps the bytes as served.
#[derive(Clone, Debug)]
pub struct DetailPayload {
    pub record: AppRecord,
    pub raw: Vec<u8>,
}

/// Where the sync engine gets remote catalog data from.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    async fn fetch_manifest(&self) -> Result<Manifest, FetchError>;

    async fn fetch_detail(&self, identifier: &str) -> Result<DetailPayload, FetchError>;
}

#[derive(Clone)]
pub struct CatalogClient {
    client: Client,
    manifest_url: String,
    detail_base_url: String,
}

impl CatalogClient {
    pub fn new(config: &PanelConfig) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .user_agent(USER_AGENT)
            .build()
            .unwrap_or_else(|err| {
                warn!("catalog: falling back to default HTTP client configuration ({err})");
                Client::new()
            });
        Self {
            client,
            manifest_url: config.manifest_url.clone(),
            detail_base_url: config.detail_base_url.clone(),
        }
    }

    async fn get_bytes(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        debug!("catalog: GET {url}");
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::Request {
                url: url.to_owned(),
                details: e.to_string(),
            })?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_owned(),
                status: status.as_u16(),
            });
        }
        let body = response.bytes().await.map_err(|e| FetchError::Request {
            url: url.to_owned(),
            details: e.to_string(),
        })?;
        Ok(body.to_vec())
    }
}

#[async_trait]
impl CatalogSource for CatalogClient {
    async fn fetch_manifest(&self) -> Result<Manifest, FetchError> {
        let bytes = self.get_bytes(&self.manifest_url).await?;
        serde_json::from_slice(&bytes).map_err(|e| FetchError::Decode {
            url: self.manifest_url.clone(),
            details: e.to_string(),
        })
    }

    async fn fetch_detail(&self, identifier: &str) -> Result<DetailPayload, FetchError> {
        let url = detail_url(&self.detail_base_url, identifier)?;
        let raw = self.get_bytes(url.as_str()).await?;
        let record = AppRecord::from_slice(&raw).map_err(|e| FetchError::Decode {
            url: url.to_string(),
            details: e.to_string(),
        })?;
        Ok(DetailPayload { record, raw })
    }
}

/// `<base>/<identifier>.json`, each `/`-separated part of the identifier percent-encoded
/// as one path segment.
pub fn detail_url(base: &str, identifier: &str) -> Result<Url, FetchError> {
    let invalid = |details: String| FetchError::InvalidUrl {
        url: base.to_owned(),
        details,
    };
    let mut url = Url::parse(base).map_err(|e| invalid(e.to_string()))?;
    let mut parts: Vec<String> = identifier.split('/').map(str::to_owned).collect();
    if let Some(last) = parts.last_mut() {
        last.push_str(DETAIL_SUFFIX);
    }
    url.path_segments_mut()
        .map_err(|()| invalid("base URL cannot carry a path".into()))?
        .pop_if_empty()
        .extend(parts);
    Ok(url)
}
