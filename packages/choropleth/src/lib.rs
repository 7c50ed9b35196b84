#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Price-to-color classification for choropleth rendering.
//!
//! Maps a continuous average price (€/m²) onto a fixed ordered palette of
//! nine `OrRd` colors so that every contour layer shades consistently.
//! Classification is pure and deterministic: no I/O, no panics, and a
//! missing price always resolves to the neutral fallback color.

pub mod style;

pub use style::{area_contour_style, city_contour_style, ContourStyle};

/// The ordered shading palette, lightest to darkest (`ColorBrewer` `OrRd`-9).
pub const PALETTE: [&str; 9] = [
    "#fff7ec", "#fee8c8", "#fdd49e", "#fdbb84", "#fc8d59", "#ef6548", "#d7301f", "#b30000",
    "#7f0000",
];

/// Color used when a feature carries no usable price.
pub const FALLBACK_COLOR: &str = "#808080";

/// A configured price range mapped onto [`PALETTE`].
///
/// Prices below `min_value` take the first color, prices at or above
/// `max_value` take the last, and interior prices fall into
/// `PALETTE.len() - 2` equal-width bins indexed by
/// `floor((price - min_value) / bin_width)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriceScale {
    min_value: f64,
    max_value: f64,
}

impl Default for PriceScale {
    fn default() -> Self {
        Self::new(500.0, 3000.0)
    }
}

impl PriceScale {
    /// Creates a scale over `[min_value, max_value]`.
    ///
    /// `min_value` must be strictly below `max_value`.
    #[must_use]
    pub const fn new(min_value: f64, max_value: f64) -> Self {
        Self {
            min_value,
            max_value,
        }
    }

    /// Width of one interior bin.
    #[allow(clippy::cast_precision_loss)]
    fn bin_width(&self) -> f64 {
        (self.max_value - self.min_value) / (PALETTE.len() - 2) as f64
    }

    /// Classifies a price into its palette color.
    ///
    /// `None` and non-finite values resolve to [`FALLBACK_COLOR`]; every
    /// real price maps to a palette entry, so callers never need an error
    /// path.
    #[must_use]
    pub fn classify(&self, price: Option<f64>) -> &'static str {
        let Some(v) = price else {
            return FALLBACK_COLOR;
        };
        if !v.is_finite() {
            return FALLBACK_COLOR;
        }
        if v < self.min_value {
            return PALETTE[0];
        }
        if v >= self.max_value {
            return PALETTE[PALETTE.len() - 1];
        }

        // Interior bins; the cast is safe because v < max_value bounds the
        // quotient below PALETTE.len() - 2.
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let bin = ((v - self.min_value) / self.bin_width()).floor() as usize;
        PALETTE[bin.min(PALETTE.len() - 1)]
    }
}
