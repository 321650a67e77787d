//! Tile indexer - fixed-size metric grid laid over lat/lng

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::geo::{meters_per_degree_lat, meters_per_degree_lng, GeoPoint};

pub const DEFAULT_TILE_SIZE_M: f64 = 100.0;

/// Position samples beyond this latitude are rejected. Longitude scale
/// collapses toward the poles and tile centers stop being valid coordinates.
pub const MAX_TILED_LAT: f64 = 85.0;

const ZONE_ID_PREFIX: &str = "zone_";

/// Integer grid position of a tile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TileCoordinate {
    pub x: i64,
    pub y: i64,
}

impl TileCoordinate {
    pub fn new(x: i64, y: i64) -> Self {
        Self { x, y }
    }

    pub fn offset(self, dx: i64, dy: i64) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }

    pub fn zone_id(self) -> String {
        zone_id(self.x, self.y)
    }
}

impl fmt::Display for TileCoordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.x, self.y)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub north: f64,
    pub south: f64,
    pub east: f64,
    pub west: f64,
}

impl BoundingBox {
    /// Inclusive on every edge.
    pub fn contains(&self, point: GeoPoint) -> bool {
        point.lat >= self.south
            && point.lat <= self.north
            && point.lng >= self.west
            && point.lng <= self.east
    }

    /// True when the interiors intersect; shared edges do not count.
    pub fn overlaps(&self, other: &BoundingBox) -> bool {
        self.south < other.north
            && other.south < self.north
            && self.west < other.east
            && other.west < self.east
    }

    pub fn centroid(&self) -> GeoPoint {
        GeoPoint {
            lat: (self.north + self.south) / 2.0,
            lng: (self.east + self.west) / 2.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ZoneIdError {
    #[error("zone id '{0}' is missing the 'zone_' prefix")]
    MissingPrefix(String),
    #[error("zone id '{0}' must look like zone_<x>_<y>")]
    Malformed(String),
}

/// Maps a point to the tile containing it.
///
/// Latitude uses a constant meters-per-degree; longitude is scaled by the
/// cosine of the point's own latitude. `floor` keeps negative coordinates
/// on the same lattice as positive ones.
pub fn point_to_tile(point: GeoPoint, tile_size_m: f64) -> TileCoordinate {
    let x = (point.lng * meters_per_degree_lng(point.lat) / tile_size_m).floor();
    let y = (point.lat * meters_per_degree_lat() / tile_size_m).floor();
    TileCoordinate::new(x as i64, y as i64)
}

/// Center of `tile`. `reference_lat` must match the latitude the tile was
/// indexed around or the longitude will drift.
///
/// Near the poles `meters_per_degree_lng` approaches zero and the returned
/// longitude leaves -180..=180 (around 1e12 degrees at exactly ±90). Callers
/// keep `reference_lat` within `MAX_TILED_LAT`.
pub fn tile_to_point(tile: TileCoordinate, reference_lat: f64, tile_size_m: f64) -> GeoPoint {
    GeoPoint {
        lat: (tile.y as f64 + 0.5) * tile_size_m / meters_per_degree_lat(),
        lng: (tile.x as f64 + 0.5) * tile_size_m / meters_per_degree_lng(reference_lat),
    }
}

pub fn tile_bounds(tile: TileCoordinate, reference_lat: f64, tile_size_m: f64) -> BoundingBox {
    let lat_scale = meters_per_degree_lat();
    let lng_scale = meters_per_degree_lng(reference_lat);
    BoundingBox {
        north: (tile.y + 1) as f64 * tile_size_m / lat_scale,
        south: tile.y as f64 * tile_size_m / lat_scale,
        east: (tile.x + 1) as f64 * tile_size_m / lng_scale,
        west: tile.x as f64 * tile_size_m / lng_scale,
    }
}

pub fn zone_id(tile_x: i64, tile_y: i64) -> String {
    format!("{ZONE_ID_PREFIX}{tile_x}_{tile_y}")
}

pub fn parse_zone_id(id: &str) -> Result<TileCoordinate, ZoneIdError> {
    let rest = id
        .strip_prefix(ZONE_ID_PREFIX)
        .ok_or_else(|| ZoneIdError::MissingPrefix(id.to_string()))?;
    let (x, y) = rest
        .split_once('_')
        .ok_or_else(|| ZoneIdError::Malformed(id.to_string()))?;
    match (x.parse::<i64>(), y.parse::<i64>()) {
        (Ok(x), Ok(y)) => Ok(TileCoordinate::new(x, y)),
        _ => Err(ZoneIdError::Malformed(id.to_string())),
    }
}
