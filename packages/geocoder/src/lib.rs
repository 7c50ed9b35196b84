#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Address search against the BAN, the French national address base.
//!
//! The map's search box forwards free-form queries to the Géoplateforme
//! geocoding endpoint (`data.geopf.fr`), which answers with `GeoJSON`
//! `FeatureCollection` responses. Only the first feature is used; its
//! `[longitude, latitude]` coordinates are swapped into the
//! latitude-first convention the map works in.

pub mod ban;

use thiserror::Error;

/// Default Géoplateforme geocoding endpoint.
pub const DEFAULT_BASE_URL: &str = "https://data.geopf.fr/geocodage/search/";

/// A resolved address with map-ready coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct GeocodedPoint {
    /// Latitude (WGS84).
    pub lat: f64,
    /// Longitude (WGS84).
    pub lng: f64,
    /// The canonical address label returned by the geocoder.
    pub label: Option<String>,
}

/// Errors from address search operations.
#[derive(Debug, Error)]
pub enum GeocodeError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Response parsing failed.
    #[error("Parse error: {message}")]
    Parse {
        /// Description of the parsing failure.
        message: String,
    },
}
