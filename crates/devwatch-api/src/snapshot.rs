// Snapshot endpoint HTTP client
//
// Issues `GET <endpoint>?n=<count>` requests and hands the decoded JSON
// body back untouched. Deciding whether the body is a usable device array
// is the caller's job; this module only separates transport failures from
// successful responses.

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};
use url::Url;

use crate::error::Error;
use crate::transport::TransportConfig;

/// Query parameter carrying the requested device count.
pub const COUNT_PARAM: &str = "n";
/// Query parameter carrying the optional generator seed.
pub const SEED_PARAM: &str = "seed";

/// Body of the `/health` probe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
}

impl HealthStatus {
    pub fn is_ok(&self) -> bool {
        self.status.eq_ignore_ascii_case("ok")
    }
}

/// HTTP client for the device snapshot endpoint.
///
/// Cheap to clone: the inner `reqwest::Client` is reference counted, so
/// each in-flight request can own its own handle.
#[derive(Debug, Clone)]
pub struct SnapshotClient {
    http: reqwest::Client,
    endpoint: Url,
}

impl SnapshotClient {
    /// Create a client for `endpoint` (e.g. `http://127.0.0.1:8000/devices`).
    pub fn new(endpoint: Url, transport: &TransportConfig) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Ok(Self { http, endpoint })
    }

    /// Create a client around a pre-built `reqwest::Client`.
    pub fn with_client(http: reqwest::Client, endpoint: Url) -> Self {
        Self { http, endpoint }
    }

    /// The configured snapshot endpoint.
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Build the request URL for a given count (and optional seed).
    ///
    /// Any `n` or `seed` already present on the configured endpoint is
    /// replaced; other query parameters are kept in order.
    pub fn request_url(&self, count: u16, seed: Option<i64>) -> Url {
        let mut url = self.endpoint.clone();
        let kept: Vec<(String, String)> = url
            .query_pairs()
            .filter(|(k, _)| k != COUNT_PARAM && k != SEED_PARAM)
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();

        {
            let mut pairs = url.query_pairs_mut();
            pairs.clear();
            for (k, v) in &kept {
                pairs.append_pair(k, v);
            }
            pairs.append_pair(COUNT_PARAM, &count.to_string());
            if let Some(seed) = seed {
                pairs.append_pair(SEED_PARAM, &seed.to_string());
            }
        }
        url
    }

    /// Fetch one device snapshot.
    ///
    /// Any non-success status is an [`Error::Status`]. A success body that
    /// is not JSON is an [`Error::Deserialization`]. Any JSON value is
    /// returned as-is, array or not.
    pub async fn fetch_devices(
        &self,
        count: u16,
        seed: Option<i64>,
    ) -> Result<serde_json::Value, Error> {
        let url = self.request_url(count, seed);
        debug!("GET {}", url);

        let resp = self
            .http
            .get(url)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Status {
                status: status.as_u16(),
                body: body.chars().take(200).collect(),
            });
        }

        let body = resp.text().await?;
        trace!(bytes = body.len(), "snapshot body received");

        serde_json::from_str(&body).map_err(|e| Error::Deserialization {
            message: e.to_string(),
            body,
        })
    }

    /// Probe the server's `/health` route (same origin as the endpoint).
    pub async fn health(&self) -> Result<HealthStatus, Error> {
        let url = self.endpoint.join("/health")?;
        debug!("GET {}", url);

        let resp = self
            .http
            .get(url)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(Error::Status {
                status: status.as_u16(),
                body: String::new(),
            });
        }

        let body = resp.text().await?;
        serde_json::from_str(&body).map_err(|e| Error::Deserialization {
            message: e.to_string(),
            body,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn client(endpoint: &str) -> SnapshotClient {
        SnapshotClient::with_client(reqwest::Client::new(), Url::parse(endpoint).unwrap())
    }

    #[test]
    fn request_url_appends_count() {
        let c = client("http://localhost:8000/devices");
        assert_eq!(
            c.request_url(25, None).as_str(),
            "http://localhost:8000/devices?n=25"
        );
    }

    #[test]
    fn request_url_replaces_existing_count_and_keeps_other_params() {
        let c = client("http://localhost:8000/devices?n=3&site=lab");
        assert_eq!(
            c.request_url(7, Some(42)).as_str(),
            "http://localhost:8000/devices?site=lab&n=7&seed=42"
        );
    }

    #[test]
    fn health_status_is_case_insensitive() {
        let h = HealthStatus {
            status: "OK".into(),
        };
        assert!(h.is_ok());
    }
}
