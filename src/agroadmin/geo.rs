//! Distances between coordinates and map deep links.

use crate::error::{AdminError, Result};
use crate::model::Row;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use url::Url;

pub const EARTH_RADIUS_KM: f64 = 6371.0;
pub const DEFAULT_MAPS_BASE_URL: &str = "https://www.google.com/maps/";

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lng: f64) -> Result<Self> {
        if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lng) {
            return Err(AdminError::Validation(format!(
                "Coordinates out of range: {}, {}",
                lat, lng
            )));
        }
        Ok(Self { lat, lng })
    }

    /// Reads `latitude`/`longitude` columns. Rows without both yield `None`.
    pub fn from_row(row: &Row) -> Option<Self> {
        let coord = |key: &str| match row.get(key)? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().replace(',', ".").parse().ok(),
            _ => None,
        };
        GeoPoint::new(coord("latitude")?, coord("longitude")?).ok()
    }
}

impl fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.6},{:.6}", self.lat, self.lng)
    }
}

impl FromStr for GeoPoint {
    type Err = AdminError;

    /// Parses `"lat,lng"`.
    fn from_str(s: &str) -> Result<Self> {
        let invalid = || AdminError::Validation(format!("Expected \"lat,lng\", got \"{}\"", s));
        let (lat, lng) = s.split_once(',').ok_or_else(invalid)?;
        let lat = lat.trim().parse().map_err(|_| invalid())?;
        let lng = lng.trim().parse().map_err(|_| invalid())?;
        GeoPoint::new(lat, lng)
    }
}

/// Great-circle distance in kilometres.
pub fn haversine_km(a: GeoPoint, b: GeoPoint) -> f64 {
    let (lat1, lat2) = (a.lat.to_radians(), b.lat.to_radians());
    let dlat = (b.lat - a.lat).to_radians();
    let dlng = (b.lng - a.lng).to_radians();

    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlng / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_KM * h.sqrt().atan2((1.0 - h).sqrt())
}

/// `"850 m"` below one kilometre, `"12.3 km"` above.
pub fn format_distance(km: f64) -> String {
    let metres = (km * 1000.0).round();
    if metres < 1000.0 {
        format!("{} m", metres as i64)
    } else {
        format!("{:.1} km", km)
    }
}

/// Route to `destination`, from `origin` or the viewer's location.
pub fn directions_link(base: &str, destination: GeoPoint, origin: Option<GeoPoint>) -> Result<Url> {
    let mut url = Url::parse(base)?.join("dir/")?;
    {
        let mut query = url.query_pairs_mut();
        query.append_pair("api", "1");
        if let Some(origin) = origin {
            query.append_pair("origin", &origin.to_string());
        }
        query.append_pair("destination", &destination.to_string());
    }
    Ok(url)
}

/// Free-text place search, e.g. a company name and city.
pub fn search_link(base: &str, query: &str) -> Result<Url> {
    let mut url = Url::parse(base)?.join("search/")?;
    url.query_pairs_mut()
        .append_pair("api", "1")
        .append_pair("query", query.trim());
    Ok(url)
}

/// Candidates ordered by distance from `origin`, closest first.
pub fn nearest<T>(
    origin: GeoPoint,
    candidates: impl IntoIterator<Item = (T, GeoPoint)>,
) -> Vec<(T, f64)> {
    let mut ranked: Vec<(T, f64)> = candidates
        .into_iter()
        .map(|(item, point)| (item, haversine_km(origin, point)))
        .collect();
    ranked.sort_by(|a, b| a.1.total_cmp(&b.1));
    ranked
}
