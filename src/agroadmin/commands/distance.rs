use crate::commands::{CmdMessage, CmdResult, DistanceEntry};
use crate::config::AdminConfig;
use crate::error::Result;
use crate::geo::{self, GeoPoint};
use crate::model::Row;
use crate::store::{Query, RecordStore};
use serde_json::Value;

/// Distance between two points, with a directions link to the destination.
pub fn between(config: &AdminConfig, origin: GeoPoint, destination: GeoPoint) -> Result<CmdResult> {
    let km = geo::haversine_km(origin, destination);
    let link = geo::directions_link(&config.maps_base_url, destination, Some(origin))?;

    let mut result = CmdResult::default();
    result.distances.push(DistanceEntry {
        label: destination.to_string(),
        km,
        link,
    });
    Ok(result)
}

/// The companies closest to `origin`. Companies without coordinates are skipped.
pub fn nearest_companies<S: RecordStore>(
    store: &S,
    config: &AdminConfig,
    origin: GeoPoint,
    limit: usize,
) -> Result<CmdResult> {
    let rows = store.select(&config.companies_table, &Query::new())?;
    let located: Vec<((String, GeoPoint), GeoPoint)> = rows
        .iter()
        .filter_map(|row| {
            let point = GeoPoint::from_row(row)?;
            Some(((company_name(row), point), point))
        })
        .collect();
    let unlocated = rows.len() - located.len();

    let mut result = CmdResult::default();
    for ((label, destination), km) in geo::nearest(origin, located).into_iter().take(limit) {
        let link = geo::directions_link(&config.maps_base_url, destination, Some(origin))?;
        result.distances.push(DistanceEntry { label, km, link });
    }

    if result.distances.is_empty() {
        result.add_message(CmdMessage::info("No companies with coordinates found."));
    }
    if unlocated > 0 {
        result.add_message(CmdMessage::info(format!(
            "{} compan{} without coordinates skipped",
            unlocated,
            if unlocated == 1 { "y" } else { "ies" }
        )));
    }
    Ok(result)
}

fn company_name(row: &Row) -> String {
    row.get("name")
        .and_then(Value::as_str)
        .unwrap_or("(unnamed)")
        .to_string()
}
