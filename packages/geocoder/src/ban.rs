//! BAN search client.
//!
//! The BAN endpoint accepts a single `q` parameter with the free-form
//! query and responds with a `GeoJSON` `FeatureCollection` ordered by
//! relevance. Results outside France are never returned, so no country
//! filter is needed.
//!
//! See <https://geoservices.ign.fr/documentation/services/services-geoplateforme/geocodage>

use crate::{GeocodeError, GeocodedPoint};

/// Resolves a single free-form address query against the BAN.
///
/// Returns `Ok(None)` when the query matches no address at all.
///
/// # Errors
///
/// Returns [`GeocodeError`] if the HTTP request or response parsing fails.
pub async fn search(
    client: &reqwest::Client,
    base_url: &str,
    query: &str,
) -> Result<Option<GeocodedPoint>, GeocodeError> {
    log::debug!("geocoding {query:?}");

    let resp = client.get(base_url).query(&[("q", query)]).send().await?;

    if !resp.status().is_success() {
        return Err(GeocodeError::Parse {
            message: format!("geocoder returned status {}", resp.status()),
        });
    }

    let body: serde_json::Value = resp.json().await?;
    parse_response(&body)
}

/// Parses a BAN `GeoJSON` `FeatureCollection` response.
///
/// Only the first feature is considered; BAN orders features by match
/// score, best first.
fn parse_response(body: &serde_json::Value) -> Result<Option<GeocodedPoint>, GeocodeError> {
    let features = body
        .get("features")
        .and_then(serde_json::Value::as_array)
        .ok_or_else(|| GeocodeError::Parse {
            message: "BAN response missing 'features' array".to_string(),
        })?;

    let Some(first) = features.first() else {
        return Ok(None);
    };

    let coords = first
        .pointer("/geometry/coordinates")
        .and_then(serde_json::Value::as_array)
        .ok_or_else(|| GeocodeError::Parse {
            message: "Feature missing geometry.coordinates".to_string(),
        })?;

    if coords.len() < 2 {
        return Err(GeocodeError::Parse {
            message: "coordinates array has fewer than 2 elements".to_string(),
        });
    }

    // GeoJSON order is [longitude, latitude].
    let lng = coords[0].as_f64().ok_or_else(|| GeocodeError::Parse {
        message: "longitude is not a number".to_string(),
    })?;
    let lat = coords[1].as_f64().ok_or_else(|| GeocodeError::Parse {
        message: "latitude is not a number".to_string(),
    })?;

    let label = first
        .pointer("/properties/label")
        .and_then(serde_json::Value::as_str)
        .map(String::from);

    Ok(Some(GeocodedPoint { lat, lng, label }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_ban_feature_latitude_first() {
        let body = serde_json::json!({
            "type": "FeatureCollection",
            "features": [{
                "type": "Feature",
                "geometry": {
                    "type": "Point",
                    "coordinates": [2.294_844, 48.857_739]
                },
                "properties": {
                    "label": "Avenue Gustave Eiffel 75007 Paris",
                    "score": 0.87
                }
            }]
        });
        let result = parse_response(&body).unwrap().unwrap();
        assert!((result.lat - 48.857_739).abs() < 1e-9);
        assert!((result.lng - 2.294_844).abs() < 1e-9);
        assert_eq!(
            result.label.as_deref(),
            Some("Avenue Gustave Eiffel 75007 Paris")
        );
    }

    #[test]
    fn takes_first_feature_only() {
        let body = serde_json::json!({
            "type": "FeatureCollection",
            "features": [
                {
                    "type": "Feature",
                    "geometry": { "type": "Point", "coordinates": [-4.486_076, 48.390_394] },
                    "properties": { "label": "Brest" }
                },
                {
                    "type": "Feature",
                    "geometry": { "type": "Point", "coordinates": [2.3522, 48.8566] },
                    "properties": { "label": "Rue de Brest 75000 Paris" }
                }
            ]
        });
        let result = parse_response(&body).unwrap().unwrap();
        assert_eq!(result.label.as_deref(), Some("Brest"));
        assert!((result.lng - -4.486_076).abs() < 1e-9);
    }

    #[test]
    fn no_match_is_none() {
        let body = serde_json::json!({
            "type": "FeatureCollection",
            "features": []
        });
        assert!(parse_response(&body).unwrap().is_none());
    }

    #[test]
    fn missing_features_is_parse_error() {
        let body = serde_json::json!({ "type": "FeatureCollection" });
        let err = parse_response(&body).unwrap_err();
        assert!(matches!(err, GeocodeError::Parse { .. }));
    }

    #[test]
    fn missing_coordinates_is_parse_error() {
        let body = serde_json::json!({
            "type": "FeatureCollection",
            "features": [{
                "type": "Feature",
                "properties": { "label": "somewhere" }
            }]
        });
        let err = parse_response(&body).unwrap_err();
        assert!(matches!(err, GeocodeError::Parse { .. }));
    }

    #[test]
    fn missing_label_is_tolerated() {
        let body = serde_json::json!({
            "type": "FeatureCollection",
            "features": [{
                "type": "Feature",
                "geometry": { "type": "Point", "coordinates": [6.1844, 48.6921] }
            }]
        });
        let result = parse_response(&body).unwrap().unwrap();
        assert!(result.label.is_none());
    }
}
