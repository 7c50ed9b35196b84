#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Persisted UI/query parameter store shared by the map layers.
//!
//! One injectable container owns the committed query filter (department,
//! limit, year), the UI theme and language, the last-known map center/zoom,
//! and the session aggregates (average price, average price per m²). Layer
//! synchronizers and the menubar all read through typed accessors and write
//! through one named operation per field; there is no global singleton.
//!
//! Writes to the persisted subset mirror to the storage backend before the
//! operation returns, so a crash after a commit never loses it. Aggregates
//! and the year filter are session-only and reset on restore.

pub mod storage;

use std::sync::{Arc, PoisonError, RwLock};

use strum_macros::{Display, EnumString};

use crate::storage::ParamStorage;

/// Storage key for the committed query limit.
pub const KEY_QUERY_LIMIT: &str = "query_limit";
/// Storage key for the committed department code.
pub const KEY_QUERY_DEPARTMENT: &str = "query_department";
/// Storage key for the UI theme.
pub const KEY_UI_THEME: &str = "ui_theme";
/// Storage key for the UI language.
pub const KEY_UI_LANG: &str = "ui_lang";
/// Storage key for the map center, stored as a JSON `[lat, lng]` pair.
pub const KEY_UI_CENTER: &str = "ui_center";
/// Storage key for the map zoom level.
pub const KEY_UI_ZOOM: &str = "ui_zoom";

/// Default map center (Brittany) used before any position is known.
pub const DEFAULT_CENTER: [f64; 2] = [48.6007, -4.0451];
/// Default map zoom.
pub const DEFAULT_ZOOM: f64 = 10.0;
/// Default maximum number of results per query.
pub const DEFAULT_LIMIT: u32 = 50;
/// Year filter value meaning "all years".
pub const ALL_YEARS: i32 = -1;
/// Sentinel aggregate meaning "no data"; consumers suppress display and
/// never feed it into further arithmetic.
pub const UNKNOWN_AGGREGATE: f64 = -1.0;

/// UI color theme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum Theme {
    /// Dark mode (the default).
    #[default]
    Dark,
    /// Light mode.
    Light,
}

/// The store's current field values.
///
/// Obtainable as a copy through [`ParamStore::snapshot`] for display code
/// that wants one consistent view.
#[derive(Debug, Clone, PartialEq)]
pub struct UiParams {
    /// Committed maximum number of results per query.
    pub limit: u32,
    /// Committed department code filter, empty for none.
    pub department: String,
    /// UI color theme.
    pub theme: Theme,
    /// UI language tag, empty for the browser/system default.
    pub lang: String,
    /// Last-known map center as `[lat, lng]`.
    pub position: [f64; 2],
    /// Last-known map zoom.
    pub zoom: f64,
    /// Committed year filter, [`ALL_YEARS`] for no year restriction.
    pub year: i32,
    /// Average sale price over the current window, or [`UNKNOWN_AGGREGATE`].
    pub avg_price: f64,
    /// Average price per m² over the current window, or
    /// [`UNKNOWN_AGGREGATE`].
    pub avg_price_sqm: f64,
}

impl Default for UiParams {
    fn default() -> Self {
        Self {
            limit: DEFAULT_LIMIT,
            department: String::new(),
            theme: Theme::default(),
            lang: String::new(),
            position: DEFAULT_CENTER,
            zoom: DEFAULT_ZOOM,
            year: ALL_YEARS,
            avg_price: UNKNOWN_AGGREGATE,
            avg_price_sqm: UNKNOWN_AGGREGATE,
        }
    }
}

/// The shared parameter store.
///
/// Restoration happens once, in [`ParamStore::restore`], before anything
/// reads the fields; unparsable stored values fall back to defaults
/// silently. A failed storage mirror is logged and otherwise ignored;
/// nothing in this store is fatal.
pub struct ParamStore {
    params: RwLock<UiParams>,
    storage: Arc<dyn ParamStorage>,
}

impl ParamStore {
    /// Builds the store from `storage`, restoring the persisted subset.
    #[must_use]
    pub fn restore(storage: Arc<dyn ParamStorage>) -> Self {
        let mut params = UiParams::default();

        if let Some(raw) = storage.get(KEY_QUERY_LIMIT) {
            match raw.parse() {
                Ok(v) => params.limit = v,
                Err(_) => log::debug!("Ignoring stored {KEY_QUERY_LIMIT}: {raw:?}"),
            }
        }
        if let Some(v) = storage.get(KEY_QUERY_DEPARTMENT) {
            params.department = v;
        }
        if let Some(raw) = storage.get(KEY_UI_THEME) {
            match raw.parse() {
                Ok(v) => params.theme = v,
                Err(_) => log::debug!("Ignoring stored {KEY_UI_THEME}: {raw:?}"),
            }
        }
        if let Some(v) = storage.get(KEY_UI_LANG) {
            params.lang = v;
        }
        if let Some(raw) = storage.get(KEY_UI_CENTER) {
            match serde_json::from_str::<[f64; 2]>(&raw) {
                Ok(v) => params.position = v,
                Err(_) => log::debug!("Ignoring stored {KEY_UI_CENTER}: {raw:?}"),
            }
        }
        if let Some(raw) = storage.get(KEY_UI_ZOOM) {
            match raw.parse() {
                Ok(v) => params.zoom = v,
                Err(_) => log::debug!("Ignoring stored {KEY_UI_ZOOM}: {raw:?}"),
            }
        }

        Self {
            params: RwLock::new(params),
            storage,
        }
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, UiParams> {
        self.params.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, UiParams> {
        self.params.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn mirror(&self, key: &str, value: &str) {
        if let Err(e) = self.storage.set(key, value) {
            log::warn!("Failed to persist {key}: {e}");
        }
    }

    // ── Write operations (one per mutable field) ────────────────────────

    /// Commits a new query limit and persists it.
    pub fn set_limit(&self, limit: u32) {
        self.write().limit = limit;
        self.mirror(KEY_QUERY_LIMIT, &limit.to_string());
    }

    /// Commits a new department code and persists it.
    pub fn set_department(&self, department: &str) {
        self.write().department = department.to_string();
        self.mirror(KEY_QUERY_DEPARTMENT, department);
    }

    /// Switches the UI theme and persists it.
    pub fn set_theme(&self, theme: Theme) {
        self.write().theme = theme;
        self.mirror(KEY_UI_THEME, &theme.to_string());
    }

    /// Switches the UI language and persists it.
    pub fn set_lang(&self, lang: &str) {
        self.write().lang = lang.to_string();
        self.mirror(KEY_UI_LANG, lang);
    }

    /// Records the map center and persists it as `[lat, lng]`.
    pub fn set_position(&self, position: [f64; 2]) {
        self.write().position = position;
        match serde_json::to_string(&position) {
            Ok(raw) => self.mirror(KEY_UI_CENTER, &raw),
            Err(e) => log::warn!("Failed to encode {KEY_UI_CENTER}: {e}"),
        }
    }

    /// Records the map zoom and persists it.
    pub fn set_zoom(&self, zoom: f64) {
        self.write().zoom = zoom;
        self.mirror(KEY_UI_ZOOM, &zoom.to_string());
    }

    /// Commits a year filter ([`ALL_YEARS`] for none). Session-only.
    pub fn set_year(&self, year: i32) {
        self.write().year = year;
    }

    /// Publishes the average sale price for the current window.
    ///
    /// Only strictly positive values are accepted; anything else sets the
    /// [`UNKNOWN_AGGREGATE`] sentinel so stale or bogus backend values can
    /// never surface as a price. Session-only.
    pub fn set_avg_price(&self, value: f64) {
        self.write().avg_price = if value > 0.0 { value } else { UNKNOWN_AGGREGATE };
    }

    /// Publishes the average price per m² for the current window.
    ///
    /// Same acceptance rule as [`ParamStore::set_avg_price`]. Session-only.
    pub fn set_avg_price_sqm(&self, value: f64) {
        self.write().avg_price_sqm = if value > 0.0 { value } else { UNKNOWN_AGGREGATE };
    }

    // ── Read accessors ──────────────────────────────────────────────────

    /// Committed maximum number of results per query.
    #[must_use]
    pub fn limit(&self) -> u32 {
        self.read().limit
    }

    /// Committed department code, empty for none.
    #[must_use]
    pub fn department(&self) -> String {
        self.read().department.clone()
    }

    /// Current UI theme.
    #[must_use]
    pub fn theme(&self) -> Theme {
        self.read().theme
    }

    /// Current UI language tag.
    #[must_use]
    pub fn lang(&self) -> String {
        self.read().lang.clone()
    }

    /// Last-known map center as `[lat, lng]`.
    #[must_use]
    pub fn position(&self) -> [f64; 2] {
        self.read().position
    }

    /// Last-known map zoom.
    #[must_use]
    pub fn zoom(&self) -> f64 {
        self.read().zoom
    }

    /// Committed year filter.
    #[must_use]
    pub fn year(&self) -> i32 {
        self.read().year
    }

    /// Average sale price, or [`UNKNOWN_AGGREGATE`] when none applies.
    #[must_use]
    pub fn avg_price(&self) -> f64 {
        self.read().avg_price
    }

    /// Average price per m², or [`UNKNOWN_AGGREGATE`] when none applies.
    #[must_use]
    pub fn avg_price_sqm(&self) -> f64 {
        self.read().avg_price_sqm
    }

    /// One consistent copy of every field.
    #[must_use]
    pub fn snapshot(&self) -> UiParams {
        self.read().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;

    fn empty_store() -> ParamStore {
        ParamStore::restore(Arc::new(MemoryStorage::new()))
    }

    #[test]
    fn empty_storage_restores_defaults() {
        let store = empty_store();
        assert_eq!(store.limit(), DEFAULT_LIMIT);
        assert_eq!(store.department(), "");
        assert_eq!(store.theme(), Theme::Dark);
        assert_eq!(store.position(), DEFAULT_CENTER);
        assert!((store.zoom() - DEFAULT_ZOOM).abs() < 1e-9);
        assert_eq!(store.year(), ALL_YEARS);
        assert!((store.avg_price() - UNKNOWN_AGGREGATE).abs() < 1e-9);
    }

    #[test]
    fn committed_department_reads_back_and_mirrors() {
        let storage = Arc::new(MemoryStorage::new());
        let store = ParamStore::restore(storage.clone());

        store.set_department("75");

        assert_eq!(store.department(), "75");
        assert_eq!(storage.get(KEY_QUERY_DEPARTMENT).as_deref(), Some("75"));
    }

    #[test]
    fn restart_restores_committed_filters() {
        let storage = Arc::new(MemoryStorage::seeded(&[
            (KEY_QUERY_DEPARTMENT, "75"),
            (KEY_QUERY_LIMIT, "200"),
            (KEY_UI_THEME, "light"),
            (KEY_UI_ZOOM, "12.5"),
            (KEY_UI_CENTER, "[48.85,2.35]"),
        ]));

        let store = ParamStore::restore(storage);
        assert_eq!(store.department(), "75");
        assert_eq!(store.limit(), 200);
        assert_eq!(store.theme(), Theme::Light);
        assert!((store.zoom() - 12.5).abs() < 1e-9);
        assert_eq!(store.position(), [48.85, 2.35]);
    }

    #[test]
    fn corrupt_stored_values_fall_back_silently() {
        let storage = Arc::new(MemoryStorage::seeded(&[
            (KEY_QUERY_LIMIT, "not-a-number"),
            (KEY_UI_CENTER, "{broken"),
            (KEY_UI_THEME, "sepia"),
        ]));
        let store = ParamStore::restore(storage);
        assert_eq!(store.limit(), DEFAULT_LIMIT);
        assert_eq!(store.position(), DEFAULT_CENTER);
        assert_eq!(store.theme(), Theme::Dark);
    }

    #[test]
    fn aggregates_accept_only_positive_values() {
        let store = empty_store();

        store.set_avg_price(2500.0);
        assert!((store.avg_price() - 2500.0).abs() < 1e-9);

        store.set_avg_price(-5.0);
        assert!((store.avg_price() - UNKNOWN_AGGREGATE).abs() < 1e-9);

        store.set_avg_price_sqm(0.0);
        assert!((store.avg_price_sqm() - UNKNOWN_AGGREGATE).abs() < 1e-9);
    }

    #[test]
    fn aggregates_are_session_only() {
        let storage = Arc::new(MemoryStorage::new());

        let first = ParamStore::restore(storage.clone());
        first.set_department("29");
        first.set_avg_price(1800.0);
        drop(first);

        let second = ParamStore::restore(storage);
        assert_eq!(second.department(), "29");
        assert!((second.avg_price() - UNKNOWN_AGGREGATE).abs() < 1e-9);
    }

    #[test]
    fn writes_mirror_to_storage_before_returning() {
        let storage = Arc::new(MemoryStorage::new());
        let store = ParamStore::restore(storage.clone());

        store.set_limit(150);
        store.set_position([47.0, -1.5]);
        store.set_zoom(9.0);

        assert_eq!(storage.get(KEY_QUERY_LIMIT).as_deref(), Some("150"));
        assert_eq!(storage.get(KEY_UI_CENTER).as_deref(), Some("[47.0,-1.5]"));
        assert_eq!(storage.get(KEY_UI_ZOOM).as_deref(), Some("9"));
    }

    #[test]
    fn theme_round_trips_through_its_string_form() {
        assert_eq!(Theme::Dark.to_string(), "dark");
        assert_eq!("light".parse::<Theme>().unwrap(), Theme::Light);
        assert!("sepia".parse::<Theme>().is_err());
    }
}
