#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Async client for the immotep sales statistics backend.
//!
//! Layer synchronizers talk to the backend only through the [`SalesApi`]
//! trait so engine tests can run against an in-memory fake. The production
//! implementation is [`HttpSalesApi`].

pub mod client;

pub use client::HttpSalesApi;

use async_trait::async_trait;
use immo_map_api_models::{
    BoundedCities, BoundedTransactions, CityInfo, DepartmentInfo, PoiFilterBody, RegionInfo,
    TransactionPoi, ViewportBounds,
};
use thiserror::Error;

/// Errors from backend requests.
#[derive(Debug, Error)]
pub enum ApiError {
    /// HTTP transport or JSON decode failure.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Backend answered with a non-success status.
    #[error("backend returned status {status}")]
    Status {
        /// The HTTP status code.
        status: reqwest::StatusCode,
    },
}

/// The backend endpoint set the map layers fetch from.
///
/// One method per endpoint; all of them decode into
/// [`immo_map_api_models`] types.
#[async_trait]
pub trait SalesApi: Send + Sync {
    /// Lists all regions with contours and price averages.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] if the request or decoding fails.
    async fn regions(&self) -> Result<Vec<RegionInfo>, ApiError>;

    /// Lists all departments with contours and price averages.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] if the request or decoding fails.
    async fn departments(&self) -> Result<Vec<DepartmentInfo>, ApiError>;

    /// Lists cities, optionally restricted to one department
    /// (`""` = no restriction).
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] if the request or decoding fails.
    async fn cities(&self, limit: u32, department: &str) -> Result<Vec<CityInfo>, ApiError>;

    /// Lists sale records without a spatial filter.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] if the request or decoding fails.
    async fn pois(&self, limit: u32) -> Result<Vec<TransactionPoi>, ApiError>;

    /// Cities intersecting the window, plus aggregates computed over them.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] if the request or decoding fails.
    async fn cities_in_bounds(
        &self,
        bounds: ViewportBounds,
        limit: u32,
    ) -> Result<BoundedCities, ApiError>;

    /// Sales inside the window, plus aggregates computed over them.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] if the request or decoding fails.
    async fn pois_in_bounds(
        &self,
        body: &PoiFilterBody,
        limit: u32,
        year: i32,
    ) -> Result<BoundedTransactions, ApiError>;
}
