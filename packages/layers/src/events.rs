//! Events from the rendering surface and commands back into it.

use immo_map_api_models::{LatLng, ViewportBounds};

/// Notifications the engine consumes.
///
/// The surface and the filter panel push these; the engine never polls.
/// Filter events carry committed values only (the panel commits on blur
/// or enter), never keystroke-level edits.
#[derive(Debug, Clone, PartialEq)]
pub enum MapEvent {
    /// The viewport came to rest after a pan or zoom.
    MoveSettled {
        /// The settled window.
        bounds: ViewportBounds,
        /// The settled center.
        center: LatLng,
        /// The settled zoom level.
        zoom: f64,
    },
    /// A click on the map surface.
    Click {
        /// The clicked coordinate.
        at: LatLng,
    },
    /// The department filter was committed.
    DepartmentCommitted {
        /// INSEE department code, empty to clear the filter.
        code: String,
    },
    /// A year was picked in the year menu.
    YearSelected {
        /// The selected year, `-1` for all years.
        year: i32,
    },
    /// The result-size limit was committed.
    LimitCommitted {
        /// The new limit, always positive.
        limit: u32,
    },
    /// The theme button was pressed.
    ThemeToggled,
    /// The interface language changed.
    LanguageChanged {
        /// Language tag, empty for the system default.
        lang: String,
    },
    /// An address was submitted in the search box.
    AddressSubmitted {
        /// Free-form address query.
        query: String,
    },
    /// A geolocation fix arrived from the platform.
    PositionFix {
        /// The fixed coordinate.
        at: LatLng,
    },
}

/// Commands the engine sends back to the rendering surface.
///
/// Fire-and-forget; a missing or slow surface never stalls the engine.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MapCommand {
    /// Recenter the view on a point, keeping the current zoom.
    FlyTo {
        /// Target latitude.
        lat: f64,
        /// Target longitude.
        lng: f64,
    },
}
