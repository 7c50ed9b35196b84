//! `reqwest`-backed [`SalesApi`] implementation.
//!
//! Endpoint paths are relative to a configurable base URL and built with
//! the same shapes the backend routes expect. Every request and response
//! is logged at debug level. The client carries a 15 second timeout; slow
//! windows fail the fetch and the layer keeps its previous dataset.

use std::time::Duration;

use async_trait::async_trait;
use immo_map_api_models::{
    BoundedCities, BoundedTransactions, CityInfo, DepartmentInfo, PoiFilterBody, RegionInfo,
    TransactionPoi, ViewportBounds,
};

use crate::{ApiError, SalesApi};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// HTTP client for the sales backend.
#[derive(Debug, Clone)]
pub struct HttpSalesApi {
    client: reqwest::Client,
    base_url: String,
}

impl HttpSalesApi {
    /// Creates a client for the backend at `base_url`
    /// (e.g. `"http://localhost:8080"`).
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] if the underlying HTTP client cannot be built.
    pub fn new(base_url: &str) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self::with_client(client, base_url))
    }

    /// Creates a client reusing an existing `reqwest::Client`.
    #[must_use]
    pub fn with_client(client: reqwest::Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: &str) -> Result<T, ApiError> {
        log::debug!("GET {url}");
        let resp = self.client.get(url).send().await?;
        decode(url, resp).await
    }

    async fn post_json<B: serde::Serialize + Sync, T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        log::debug!("POST {url}");
        let resp = self.client.post(url).json(body).send().await?;
        decode(url, resp).await
    }
}

async fn decode<T: serde::de::DeserializeOwned>(
    url: &str,
    resp: reqwest::Response,
) -> Result<T, ApiError> {
    let status = resp.status();
    if !status.is_success() {
        log::debug!("{url} -> {status}");
        return Err(ApiError::Status { status });
    }
    let value = resp.json::<T>().await?;
    log::debug!("{url} -> {status}");
    Ok(value)
}

// URL builders are kept separate so the exact wire shapes are testable
// without a running backend.

fn regions_url(base_url: &str) -> String {
    format!("{base_url}/api/regions")
}

fn departments_url(base_url: &str) -> String {
    format!("{base_url}/api/departments")
}

fn cities_url(base_url: &str, limit: u32, department: &str) -> String {
    if department.is_empty() {
        format!("{base_url}/api/cities?limit={limit}")
    } else {
        format!("{base_url}/api/cities?limit={limit}&dep={department}")
    }
}

fn cities_filter_url(base_url: &str, limit: u32) -> String {
    format!("{base_url}/api/cities?limit={limit}")
}

fn pois_url(base_url: &str, limit: u32) -> String {
    format!("{base_url}/api/pois?limit={limit}")
}

fn pois_filter_url(base_url: &str, limit: u32, year: i32) -> String {
    format!("{base_url}/api/pois/filter?limit={limit}&year={year}")
}

#[async_trait]
impl SalesApi for HttpSalesApi {
    async fn regions(&self) -> Result<Vec<RegionInfo>, ApiError> {
        self.get_json(&regions_url(&self.base_url)).await
    }

    async fn departments(&self) -> Result<Vec<DepartmentInfo>, ApiError> {
        self.get_json(&departments_url(&self.base_url)).await
    }

    async fn cities(&self, limit: u32, department: &str) -> Result<Vec<CityInfo>, ApiError> {
        self.get_json(&cities_url(&self.base_url, limit, department))
            .await
    }

    async fn pois(&self, limit: u32) -> Result<Vec<TransactionPoi>, ApiError> {
        self.get_json(&pois_url(&self.base_url, limit)).await
    }

    async fn cities_in_bounds(
        &self,
        bounds: ViewportBounds,
        limit: u32,
    ) -> Result<BoundedCities, ApiError> {
        self.post_json(&cities_filter_url(&self.base_url, limit), &bounds)
            .await
    }

    async fn pois_in_bounds(
        &self,
        body: &PoiFilterBody,
        limit: u32,
        year: i32,
    ) -> Result<BoundedTransactions, ApiError> {
        self.post_json(&pois_filter_url(&self.base_url, limit, year), body)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn poi_filter_url_includes_limit_and_year() {
        assert_eq!(
            pois_filter_url("http://localhost:8080", 100, -1),
            "http://localhost:8080/api/pois/filter?limit=100&year=-1"
        );
        assert_eq!(
            pois_filter_url("http://localhost:8080", 50, 2020),
            "http://localhost:8080/api/pois/filter?limit=50&year=2020"
        );
    }

    #[test]
    fn city_listing_url_includes_department_when_set() {
        assert_eq!(
            cities_url("http://localhost:8080", 600, "29"),
            "http://localhost:8080/api/cities?limit=600&dep=29"
        );
        assert_eq!(
            cities_url("http://localhost:8080", 600, ""),
            "http://localhost:8080/api/cities?limit=600"
        );
    }

    #[test]
    fn listing_urls_have_no_parameters() {
        assert_eq!(
            regions_url("http://localhost:8080"),
            "http://localhost:8080/api/regions"
        );
        assert_eq!(
            departments_url("http://localhost:8080"),
            "http://localhost:8080/api/departments"
        );
    }

    #[test]
    fn pois_listing_url_includes_limit() {
        assert_eq!(
            pois_url("http://localhost:8080", 50),
            "http://localhost:8080/api/pois?limit=50"
        );
    }

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let api = HttpSalesApi::with_client(reqwest::Client::new(), "http://localhost:8080/");
        assert_eq!(api.base_url, "http://localhost:8080");
    }
}
