//! Pure composition of backend queries from viewport and filter state.
//!
//! One request shape per settle event and per listing refetch. No I/O
//! happens here, so query construction is testable in isolation.

use immo_map_api_models::{PoiFilterBody, ViewportBounds};

/// Fixed result cap for city queries. The sale-record limit is
/// user-committed; the city cap is not exposed in the filter panel.
pub const CITY_LISTING_LIMIT: u32 = 600;

/// The committed query filters, read from the parameter store at compose
/// time.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryFilter {
    /// Committed department code, empty for none.
    pub department: String,
    /// Committed year, `-1` for all years.
    pub year: i32,
    /// Committed result-size limit.
    pub limit: u32,
}

/// A composed `POST api/pois/filter` request.
#[derive(Debug, Clone, PartialEq)]
pub struct PoiFilterRequest {
    /// `limit` query parameter.
    pub limit: u32,
    /// `year` query parameter, `-1` for all years.
    pub year: i32,
    /// JSON body: the settled window plus the committed department code.
    pub body: PoiFilterBody,
}

/// A composed `POST api/cities` bounds request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CityBoundsRequest {
    /// `limit` query parameter.
    pub limit: u32,
    /// JSON body: the settled window.
    pub body: ViewportBounds,
}

/// A composed `GET api/cities` listing request.
#[derive(Debug, Clone, PartialEq)]
pub struct CityListingRequest {
    /// `limit` query parameter.
    pub limit: u32,
    /// `dep` query parameter, empty for no department restriction.
    pub department: String,
}

/// Sale-record query for one settled viewport.
#[must_use]
pub fn poi_filter_request(bounds: ViewportBounds, filter: &QueryFilter) -> PoiFilterRequest {
    PoiFilterRequest {
        limit: filter.limit,
        year: filter.year,
        body: PoiFilterBody {
            north_east: bounds.north_east,
            south_west: bounds.south_west,
            code: filter.department.clone(),
        },
    }
}

/// City query for one settled viewport.
#[must_use]
pub const fn city_bounds_request(bounds: ViewportBounds) -> CityBoundsRequest {
    CityBoundsRequest {
        limit: CITY_LISTING_LIMIT,
        body: bounds,
    }
}

/// Department-wide city listing, used on mount and department commits.
#[must_use]
pub fn city_listing_request(filter: &QueryFilter) -> CityListingRequest {
    CityListingRequest {
        limit: CITY_LISTING_LIMIT,
        department: filter.department.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use immo_map_api_models::LatLng;

    fn settled_bounds() -> ViewportBounds {
        ViewportBounds::new(LatLng::new(49.0, -3.0), LatLng::new(48.0, -5.0))
    }

    fn committed_filter() -> QueryFilter {
        QueryFilter {
            department: "29".to_string(),
            year: -1,
            limit: 100,
        }
    }

    #[test]
    fn poi_filter_matches_settled_viewport() {
        let req = poi_filter_request(settled_bounds(), &committed_filter());
        assert_eq!(req.limit, 100);
        assert_eq!(req.year, -1);
        assert_eq!(
            serde_json::to_value(&req.body).unwrap(),
            serde_json::json!({
                "northEast": { "lat": 49.0, "lng": -3.0 },
                "southWest": { "lat": 48.0, "lng": -5.0 },
                "code": "29"
            })
        );
    }

    #[test]
    fn empty_department_composes_empty_code() {
        let mut filter = committed_filter();
        filter.department.clear();
        let req = poi_filter_request(settled_bounds(), &filter);
        assert_eq!(req.body.code, "");
    }

    #[test]
    fn city_bounds_uses_the_fixed_city_cap() {
        let req = city_bounds_request(settled_bounds());
        assert_eq!(req.limit, CITY_LISTING_LIMIT);
        assert_eq!(req.body, settled_bounds());
    }

    #[test]
    fn city_listing_carries_committed_department() {
        let req = city_listing_request(&committed_filter());
        assert_eq!(req.limit, 600);
        assert_eq!(req.department, "29");
    }
}
