#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Viewport-driven fetch engine for the immotep map.
//!
//! The rendering surface reports settle, click and filter-commit events;
//! the engine composes backend queries from the committed filters, keeps
//! one dataset per statistical layer, guards against stale responses, and
//! publishes window aggregates to the parameter store. All layer mutation
//! happens on a single engine task; network fetches are the only
//! suspension points.

pub mod composer;
pub mod engine;
pub mod events;
pub mod geocode;
pub mod sync;

pub use engine::{Engine, EngineConfig, EngineHandle, LayerSnapshot};
pub use events::{MapCommand, MapEvent};

use strum_macros::{Display, EnumString};

/// The four statistical layers the map renders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum Layer {
    /// Region contours with price averages.
    Region,
    /// Department contours with price averages.
    Department,
    /// City (commune) contours with price averages and population.
    City,
    /// Individual sale markers.
    Sales,
}
