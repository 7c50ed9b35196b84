//! Contour style payloads handed to the rendering surface.
//!
//! The surface is a passive consumer: it receives one of these next to the
//! opaque GeoJSON contour and applies it verbatim. Field names serialize in
//! the camelCase form path-style renderers expect.

use serde::Serialize;

use crate::PriceScale;

/// Stroke and fill styling for one contour.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContourStyle {
    /// Fill color, classified from the feature's average price.
    pub fill_color: &'static str,
    /// Stroke color.
    pub color: &'static str,
    /// Stroke weight in pixels.
    pub weight: u32,
    /// Stroke opacity.
    pub opacity: f64,
    /// Fill opacity.
    pub fill_opacity: f64,
}

/// Style for city contours: classified fill under a fixed red stroke.
#[must_use]
pub fn city_contour_style(scale: &PriceScale, avgprice: Option<f64>) -> ContourStyle {
    ContourStyle {
        fill_color: scale.classify(avgprice),
        color: "red",
        weight: 1,
        opacity: 1.0,
        fill_opacity: 0.5,
    }
}

/// Style for region and department contours: stroke and fill both carry the
/// classified color.
#[must_use]
pub fn area_contour_style(scale: &PriceScale, avgprice: Option<f64>) -> ContourStyle {
    let color = scale.classify(avgprice);
    ContourStyle {
        fill_color: color,
        color,
        weight: 1,
        opacity: 1.0,
        fill_opacity: 0.5,
    }
}
