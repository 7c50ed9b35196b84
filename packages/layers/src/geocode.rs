//! Address search seam.
//!
//! The engine depends on this trait rather than on a concrete geocoder
//! so tests can resolve addresses without the network.

use std::time::Duration;

use async_trait::async_trait;
use immo_map_geocoder::{ban, GeocodeError, GeocodedPoint, DEFAULT_BASE_URL};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Resolves a free-form address to a map point.
#[async_trait]
pub trait AddressSearch: Send + Sync {
    /// Returns the best match for `query`, or `None` when nothing matched.
    ///
    /// # Errors
    ///
    /// * If the geocoder request fails
    /// * If the geocoder response fails to parse
    async fn resolve(&self, query: &str) -> Result<Option<GeocodedPoint>, GeocodeError>;
}

/// `AddressSearch` backed by the BAN geocoding endpoint.
#[derive(Debug, Clone)]
pub struct BanAddressSearch {
    client: reqwest::Client,
    base_url: String,
}

impl BanAddressSearch {
    /// Creates a search client against the public BAN endpoint.
    ///
    /// # Errors
    ///
    /// * If the HTTP client fails to build
    pub fn new() -> Result<Self, GeocodeError> {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    /// Creates a search client against a custom endpoint.
    ///
    /// # Errors
    ///
    /// * If the HTTP client fails to build
    pub fn with_base_url(base_url: &str) -> Result<Self, GeocodeError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.to_string(),
        })
    }
}

#[async_trait]
impl AddressSearch for BanAddressSearch {
    async fn resolve(&self, query: &str) -> Result<Option<GeocodedPoint>, GeocodeError> {
        ban::search(&self.client, &self.base_url, query).await
    }
}
