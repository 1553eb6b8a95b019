//! HTTP client for the competitor product API.

mod fetch_all;

use std::time::Duration;

use compwatch_core::{ApiSettings, PaginationMode};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, StatusCode, Url};

use crate::error::CollectionError;
use crate::parse::{parse_page, Page};
use crate::retry::{retry_with_backoff, RetryPolicy};

pub use fetch_all::Collected;

/// Client for one configured product endpoint.
///
/// Non-2xx responses become typed errors: 429 and 5xx are retried with
/// back-off, any other status aborts the collection.
#[derive(Debug)]
pub struct ApiClient {
    pub(super) client: Client,
    pub(super) endpoint: Url,
    pub(super) page_size: u32,
    pub(super) pagination: PaginationMode,
    pub(super) records_field: String,
    pub(super) max_pages: usize,
    pub(super) retry: RetryPolicy,
}

impl ApiClient {
    /// Builds a client from the `api` config section, using its
    /// `request_timeout_secs`.
    ///
    /// # Errors
    ///
    /// Returns [`CollectionError::InvalidUrl`] for an unusable base URL,
    /// [`CollectionError::InvalidAuthHeader`] for a header that cannot be
    /// sent, or [`CollectionError::Http`] if the `reqwest::Client` cannot be
    /// constructed.
    pub fn new(settings: &ApiSettings) -> Result<Self, CollectionError> {
        Self::with_request_timeout(settings, Duration::from_secs(settings.request_timeout_secs))
    }

    /// Same as [`ApiClient::new`] with an explicit per-request timeout.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::new`].
    pub fn with_request_timeout(
        settings: &ApiSettings,
        timeout: Duration,
    ) -> Result<Self, CollectionError> {
        let endpoint = endpoint_url(settings)?;
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout.min(Duration::from_secs(10)))
            .user_agent(&settings.user_agent)
            .default_headers(auth_headers(settings)?)
            .build()?;

        Ok(Self {
            client,
            endpoint,
            page_size: settings.page_size,
            pagination: settings.pagination,
            records_field: settings.records_field.clone(),
            max_pages: settings.max_pages,
            retry: RetryPolicy::from_settings(settings),
        })
    }

    /// Fetches and validates one page, retrying transient failures.
    ///
    /// Returns the page, the raw `Link` header if present, and the number of
    /// retries spent.
    ///
    /// # Errors
    ///
    /// - [`CollectionError::Rejected`]: 4xx other than 429 (not retried).
    /// - [`CollectionError::RetriesExhausted`]: transient failures outlasted the budget.
    /// - [`CollectionError::Deserialize`]: body is not JSON (not retried).
    /// - [`CollectionError::InvalidResponse`]: JSON of the wrong shape (not retried).
    pub async fn fetch_page(
        &self,
        url: &Url,
    ) -> Result<(Page, Option<String>, u32), CollectionError> {
        let ((page, link), retries) =
            retry_with_backoff(self.retry, || self.fetch_page_once(url)).await?;
        Ok((page, link, retries))
    }

    async fn fetch_page_once(
        &self,
        url: &Url,
    ) -> Result<(Page, Option<String>), CollectionError> {
        let response = self
            .client
            .get(url.clone())
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await?;
        let status = response.status();

        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(CollectionError::RateLimited {
                url: url.to_string(),
            });
        }
        if status.is_server_error() {
            return Err(CollectionError::ServerError {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }
        if !status.is_success() {
            return Err(CollectionError::Rejected {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let link_header = response
            .headers()
            .get(reqwest::header::LINK)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned);

        let body = response.text().await?;
        let value = serde_json::from_str::<serde_json::Value>(&body).map_err(|e| {
            CollectionError::Deserialize {
                context: format!("page {url}"),
                source: e,
            }
        })?;
        let page = parse_page(value, &self.records_field).map_err(|reason| {
            CollectionError::InvalidResponse {
                url: url.to_string(),
                reason,
            }
        })?;

        Ok((page, link_header))
    }

    /// URL of an offset page: `endpoint?limit=<page_size>&skip=<offset>`.
    pub(crate) fn offset_url(&self, offset: usize) -> Url {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut()
            .append_pair("limit", &self.page_size.to_string())
            .append_pair("skip", &offset.to_string());
        url
    }

    /// First URL of a `Link`-paginated sequence: `endpoint?limit=<page_size>`.
    pub(crate) fn first_link_url(&self) -> Url {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut()
            .append_pair("limit", &self.page_size.to_string());
        url
    }
}

/// Joins `base_url` and `endpoint`, keeping any path prefix on the base.
fn endpoint_url(settings: &ApiSettings) -> Result<Url, CollectionError> {
    let base = settings.base_url.as_deref().unwrap_or_default().trim();
    let invalid = |reason: String| CollectionError::InvalidUrl {
        url: base.to_owned(),
        reason,
    };

    let mut base_url = Url::parse(base).map_err(|e| invalid(e.to_string()))?;
    if !matches!(base_url.scheme(), "http" | "https") {
        return Err(invalid("scheme must be http or https".to_owned()));
    }
    if !base_url.path().ends_with('/') {
        let path = format!("{}/", base_url.path());
        base_url.set_path(&path);
    }
    base_url
        .join(settings.endpoint.trim_start_matches('/'))
        .map_err(|e| invalid(format!("endpoint \"{}\": {e}", settings.endpoint)))
}

/// Auth header attached to every request. `Authorization` gets a `Bearer`
/// prefix; any other header name carries the raw token.
fn auth_headers(settings: &ApiSettings) -> Result<HeaderMap, CollectionError> {
    let mut headers = HeaderMap::new();
    let Some(token) = settings.auth_token.as_deref().filter(|t| !t.is_empty()) else {
        return Ok(headers);
    };

    let name = HeaderName::from_bytes(settings.auth_header.trim().as_bytes()).map_err(|e| {
        CollectionError::InvalidAuthHeader {
            reason: format!("name \"{}\": {e}", settings.auth_header),
        }
    })?;
    let raw = if name == reqwest::header::AUTHORIZATION {
        format!("Bearer {token}")
    } else {
        token.to_owned()
    };
    let mut value = HeaderValue::from_str(&raw).map_err(|e| CollectionError::InvalidAuthHeader {
        reason: format!("value: {e}"),
    })?;
    value.set_sensitive(true);
    headers.insert(name, value);
    Ok(headers)
}

#[cfg(test)]
#[path = "../client_test.rs"]
mod tests;
