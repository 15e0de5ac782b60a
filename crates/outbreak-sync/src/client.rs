//! Async HTTP client for the disease.sh country endpoints.

use std::time::Duration;

use outbreak_core::{shift::DaySelector, snapshot::RawCountrySnapshot};
use reqwest::Client;
use serde::de::DeserializeOwned;

use crate::{FetchError, SnapshotSource};

/// Connection settings for the upstream API.
#[derive(Debug, Clone)]
pub struct UpstreamConfig {
  /// Scheme and host, e.g. `https://disease.sh`.
  pub base_url: String,
  pub timeout:  Duration,
}

/// Client for `{base_url}/v3/covid-19/countries`.
///
/// Cheap to clone, as the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Debug, Clone)]
pub struct DiseaseShClient {
  client: Client,
  config: UpstreamConfig,
}

impl DiseaseShClient {
  pub fn new(config: UpstreamConfig) -> Result<Self, FetchError> {
    let client = Client::builder()
      .timeout(config.timeout)
      .user_agent(concat!("outbreak/", env!("CARGO_PKG_VERSION")))
      .build()?;
    Ok(Self { client, config })
  }

  fn url(&self, path: &str) -> String {
    format!(
      "{}/v3/covid-19{}",
      self.config.base_url.trim_end_matches('/'),
      path
    )
  }

  async fn get_json<T: DeserializeOwned>(
    &self,
    url: String,
    query: &[(&str, &str)],
  ) -> Result<T, FetchError> {
    let resp = self.client.get(&url).query(query).send().await?;

    let status = resp.status();
    if !status.is_success() {
      return Err(FetchError::Status {
        status: status.as_u16(),
        url,
      });
    }
    Ok(resp.json().await?)
  }
}

impl SnapshotSource for DiseaseShClient {
  type Error = FetchError;

  /// `GET /countries?allowNull=true[&yesterday=true|&twoDaysAgo=true]`
  async fn countries(&self, selector: DaySelector) -> Result<Vec<RawCountrySnapshot>, FetchError> {
    // Without allowNull the source reports unknown values as 0.
    let mut query = vec![("allowNull", "true")];
    if let Some(flag) = selector.query_flag() {
      query.push((flag, "true"));
    }
    self.get_json(self.url("/countries"), &query).await
  }

  /// `GET /countries/{name}?allowNull=true`
  async fn country(&self, name: String) -> Result<RawCountrySnapshot, FetchError> {
    self
      .get_json(self.url(&format!("/countries/{name}")), &[("allowNull", "true")])
      .await
  }
}
