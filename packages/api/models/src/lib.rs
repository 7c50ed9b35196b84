#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Request and response types for the immotep sales API.
//!
//! These types mirror the JSON shapes served by the backend. Contours are
//! opaque [`geojson::Feature`] payloads; this crate carries them through to
//! the rendering surface without touching the geometry. Numeric fields the
//! backend may omit carry `serde(default)` so a partial response decodes to
//! an absent value instead of a decode error.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A WGS84 coordinate pair as used in viewport bounds and filter bodies.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    /// Latitude.
    pub lat: f64,
    /// Longitude.
    pub lng: f64,
}

impl LatLng {
    /// Creates a coordinate pair.
    #[must_use]
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

/// The visible map window at viewport-settle time.
///
/// Serialized as `{"northEast":{"lat":..,"lng":..},"southWest":{..}}`, the
/// body shape the bounds-filtered endpoints expect.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewportBounds {
    /// North-east corner of the visible window.
    pub north_east: LatLng,
    /// South-west corner of the visible window.
    pub south_west: LatLng,
}

impl ViewportBounds {
    /// Creates bounds from the two corners.
    #[must_use]
    pub const fn new(north_east: LatLng, south_west: LatLng) -> Self {
        Self {
            north_east,
            south_west,
        }
    }

    /// Center of the window, for layers that need a representative point.
    #[must_use]
    pub fn center(&self) -> LatLng {
        LatLng::new(
            (self.north_east.lat + self.south_west.lat) / 2.0,
            (self.north_east.lng + self.south_west.lng) / 2.0,
        )
    }
}

/// Body of `POST api/pois/filter`: bounds plus the committed department code.
///
/// `code` is always present; an empty string means "no department filter",
/// matching what the original client sent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PoiFilterBody {
    /// North-east corner of the query window.
    pub north_east: LatLng,
    /// South-west corner of the query window.
    pub south_west: LatLng,
    /// Department code filter (e.g. `"29"`), empty for none.
    pub code: String,
}

/// A region with its contour and average price, from `GET api/regions`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionInfo {
    /// INSEE region code.
    pub code: String,
    /// Region name, the stable rendering key for this layer.
    pub name: String,
    /// Average sale price per m² (€), `0` when the backend has none.
    #[serde(default)]
    pub avgprice: f64,
    /// Opaque contour geometry; the backend injects `avgprice` into its
    /// GeoJSON properties for choropleth styling.
    #[serde(default)]
    pub contour: Option<geojson::Feature>,
    /// Year → pre-formatted statistic line (e.g. `"2500€/m² (3.2%)"`).
    #[serde(default)]
    pub stat: Option<BTreeMap<i32, String>>,
}

/// A department with its contour and average price, from
/// `GET api/departments`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DepartmentInfo {
    /// Department name, the stable rendering key for this layer.
    pub name: String,
    /// INSEE department code (e.g. `"29"`).
    pub code: String,
    /// Average sale price per m² (€), `0` when the backend has none.
    #[serde(default)]
    pub avgprice: f64,
    /// Opaque contour geometry with `avgprice` in its properties.
    #[serde(default)]
    pub contour: Option<geojson::Feature>,
    /// Year → pre-formatted statistic line.
    #[serde(default)]
    pub stat: Option<BTreeMap<i32, String>>,
}

/// A city (commune) with contour, population and yearly statistics, from
/// `GET api/cities` or the bounds-filtered `POST api/cities`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CityInfo {
    /// City name, the stable rendering key for this layer.
    pub name: String,
    /// INSEE commune code.
    pub code: String,
    /// Postal code. The backend serializes this as an integer.
    #[serde(default)]
    pub zip: u32,
    /// Average sale price per m² (€), `0` when the backend has none.
    #[serde(default)]
    pub avgprice: f64,
    /// Opaque contour geometry with `avgprice`, `city` and `population`
    /// injected into its properties.
    #[serde(default)]
    pub contour: Option<geojson::Feature>,
    /// Population count.
    #[serde(default)]
    pub population: i64,
    /// Year → pre-formatted statistic line.
    #[serde(default)]
    pub stat: Option<BTreeMap<i32, String>>,
}

/// A single sale record, from `GET api/pois` or `POST api/pois/filter`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionPoi {
    /// Transaction identifier, the stable rendering key for markers.
    pub id: u64,
    /// Sale date.
    pub date: DateTime<Utc>,
    /// Street address.
    #[serde(default)]
    pub address: String,
    /// City name.
    #[serde(default)]
    pub city: String,
    /// Sale price (€).
    #[serde(default)]
    pub price: f64,
    /// Living area (m²).
    #[serde(default)]
    pub area: i64,
    /// Latitude.
    pub lat: f64,
    /// Longitude.
    pub long: f64,
    /// Price per m² (€).
    #[serde(default)]
    pub pricepsqm: f64,
    /// Full parcel area (m²).
    #[serde(default)]
    pub fullarea: i64,
    /// Number of rooms.
    #[serde(default)]
    pub nbroom: i64,
    /// Cadastre parcel reference.
    #[serde(default)]
    pub cadastre: String,
}

/// Response of `POST api/pois/filter`: sales inside the window plus the
/// aggregate prices computed over them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoundedTransactions {
    /// Sales inside the query window.
    #[serde(default)]
    pub transactions: Vec<TransactionPoi>,
    /// Average sale price (€); `0` or negative means "no data".
    #[serde(default)]
    pub avgprice: f64,
    /// Average price per m² (€); `0` or negative means "no data".
    #[serde(default)]
    pub avgprice_sqm: f64,
}

/// Response of `POST api/cities`: cities intersecting the window plus the
/// aggregate prices computed over them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoundedCities {
    /// Cities intersecting the query window.
    #[serde(default)]
    pub cities: Vec<CityInfo>,
    /// Average sale price (€); `0` or negative means "no data".
    #[serde(default)]
    pub avgprice: f64,
    /// Average price per m² (€); `0` or negative means "no data".
    #[serde(default)]
    pub avgprice_sqm: f64,
}

/// Reads the `avgprice` the backend injects into a contour's GeoJSON
/// properties.
///
/// Returns `None` when the feature has no such property or it is not a
/// number; the caller maps that to the neutral fallback color, never an
/// error.
#[must_use]
pub fn contour_avgprice(contour: &geojson::Feature) -> Option<f64> {
    contour.property("avgprice").and_then(serde_json::Value::as_f64)
}
