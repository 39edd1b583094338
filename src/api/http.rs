//! reqwest-backed [`ResourceClient`] for the laboratory REST API.
//!
//! # Security Note - Logging
//!
//! The API token is kept in a [`SecretBox`] and only turned into a header
//! value inside [`RedactedHeader`], whose `Display` and `Debug` print
//! `[REDACTED]`. The header value itself is marked sensitive so reqwest and
//! hyper skip it in their own debug output.

use std::fmt;
use std::time::Duration;

use reqwest::header::{self, HeaderValue};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use secrecy::{ExposeSecret, SecretBox};
use url::Url;

use crate::config::Config;
use crate::error::{LabdeskError, Result};
use crate::resources::Resource;
use crate::types::{Page, RecordId};

use super::error::parse_api_error_text;
use super::{Changes, ListResponse, PageRequest, ResourceClient};

/// Wrapper for the Authorization header that never formats its value
struct RedactedHeader {
    value: String,
}

impl RedactedHeader {
    fn new(scheme: &str, token: &str) -> Self {
        Self {
            value: format!("{scheme} {token}"),
        }
    }

    fn as_header_value(&self) -> Result<HeaderValue> {
        let mut value = HeaderValue::from_str(&self.value).map_err(|_| {
            LabdeskError::Config("API token contains invalid characters".to_string())
        })?;
        value.set_sensitive(true);
        Ok(value)
    }
}

impl fmt::Display for RedactedHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[REDACTED]")
    }
}

impl fmt::Debug for RedactedHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedactedHeader")
            .field("value", &"[REDACTED]")
            .finish()
    }
}

/// HTTP client for the laboratory API
pub struct HttpClient {
    client: Client,
    base_url: Url,
    token: Option<SecretBox<String>>,
    auth_scheme: String,
}

impl HttpClient {
    /// Create a client from configuration.
    ///
    /// Fails when no API URL is configured.
    pub fn from_config(config: &Config) -> Result<Self> {
        let base_url = config.api_url().ok_or_else(|| {
            LabdeskError::Config(
                "API URL not configured. Set LABDESK_API_URL or run: labdesk config set api.url <url>"
                    .to_string(),
            )
        })?;

        let mut client = Self::new(&base_url, config.request_timeout())?;
        if let Some(token) = config.api_token() {
            client = client.with_token(config.auth_scheme(), &token);
        }
        Ok(client)
    }

    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self {
            client,
            base_url: normalize_base(base_url)?,
            token: None,
            auth_scheme: "Bearer".to_string(),
        })
    }

    pub fn with_token(mut self, scheme: &str, token: &str) -> Self {
        self.auth_scheme = scheme.to_string();
        self.token = Some(SecretBox::new(Box::new(token.to_string())));
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn collection_url(&self, collection: &str) -> Result<Url> {
        Ok(self.base_url.join(&format!("{}/", collection.trim_matches('/')))?)
    }

    fn record_url(&self, collection: &str, id: RecordId) -> Result<Url> {
        Ok(self
            .base_url
            .join(&format!("{}/{id}/", collection.trim_matches('/')))?)
    }

    /// URL for one page of a collection query.
    ///
    /// Continuations follow the server's `next` URL verbatim; page one is
    /// built from the search term, limit and filters.
    pub fn list_url(&self, collection: &str, request: &PageRequest) -> Result<Url> {
        if let Some(cursor) = &request.cursor {
            return Ok(self.base_url.join(cursor.as_str())?);
        }

        let mut url = self.collection_url(collection)?;
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("limit", &request.limit.to_string());
            query.append_pair("offset", "0");
            let search = request.search_term.trim();
            if !search.is_empty() {
                query.append_pair("search", search);
            }
            for (key, value) in &request.filters {
                query.append_pair(key, value);
            }
        }
        Ok(url)
    }

    fn authorize(&self, builder: RequestBuilder) -> Result<RequestBuilder> {
        let builder = builder.header(header::ACCEPT, HeaderValue::from_static("application/json"));
        match &self.token {
            Some(token) => {
                let auth = RedactedHeader::new(&self.auth_scheme, token.expose_secret());
                Ok(builder.header(header::AUTHORIZATION, auth.as_header_value()?))
            }
            None => Ok(builder),
        }
    }

    /// Send a request, turning non-2xx responses into API errors
    async fn send(&self, builder: RequestBuilder) -> Result<Response> {
        let response = self.authorize(builder)?.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let kind = parse_api_error_text(&body);
        tracing::debug!(status = status.as_u16(), ?kind, "API request failed");
        Err(LabdeskError::Api {
            status: status.as_u16(),
            kind,
        })
    }
}

fn normalize_base(base_url: &str) -> Result<Url> {
    let trimmed = base_url.trim();
    let with_slash = if trimmed.ends_with('/') {
        trimmed.to_string()
    } else {
        format!("{trimmed}/")
    };
    Ok(Url::parse(&with_slash)?)
}

#[async_trait::async_trait]
impl<R: Resource> ResourceClient<R> for HttpClient {
    async fn fetch_page(&self, request: &PageRequest) -> Result<Page<R>> {
        let url = self.list_url(R::COLLECTION, request)?;
        tracing::debug!(collection = R::COLLECTION, %url, "fetching page");

        let response = self.send(self.client.get(url)).await?;
        let body: ListResponse<R> = response.json().await?;
        Ok(body.into())
    }

    async fn fetch_one(&self, id: RecordId) -> Result<R> {
        let url = self.record_url(R::COLLECTION, id)?;
        let result = self.send(self.client.get(url)).await;
        match result {
            Err(LabdeskError::Api { status: 404, .. }) => Err(LabdeskError::RecordNotFound(id)),
            Err(e) => Err(e),
            Ok(response) => Ok(response.json().await?),
        }
    }

    async fn create(&self, draft: &Changes) -> Result<R> {
        let url = self.collection_url(R::COLLECTION)?;
        tracing::debug!(collection = R::COLLECTION, "creating record");

        let response = self.send(self.client.post(url).json(draft)).await?;
        Ok(response.json().await?)
    }

    async fn update(&self, id: RecordId, changes: &Changes) -> Result<Option<R>> {
        let url = self.record_url(R::COLLECTION, id)?;
        tracing::debug!(collection = R::COLLECTION, id, fields = changes.len(), "patching record");

        let response = self.send(self.client.patch(url).json(changes)).await?;
        if response.status() == StatusCode::NO_CONTENT {
            return Ok(None);
        }

        let bytes = response.bytes().await?;
        if bytes.is_empty() {
            return Ok(None);
        }
        match serde_json::from_slice::<R>(&bytes) {
            Ok(record) => Ok(Some(record)),
            Err(e) => {
                // Some endpoints answer with a status envelope instead of the record
                tracing::debug!(id, "update response is not a record: {e}");
                Ok(None)
            }
        }
    }

    async fn delete(&self, id: RecordId) -> Result<()> {
        let url = self.record_url(R::COLLECTION, id)?;
        tracing::debug!(collection = R::COLLECTION, id, "deleting record");

        match self.send(self.client.delete(url)).await {
            Err(LabdeskError::Api { status: 404, .. }) => Err(LabdeskError::RecordNotFound(id)),
            Err(e) => Err(e),
            Ok(_) => Ok(()),
        }
    }
}
