//! In-memory map of every zone discovered so far.

use std::collections::HashMap;

use crate::geo::GeoPoint;
use crate::tile::{parse_zone_id, point_to_tile, ZoneIdError};
use crate::zone::{generate_zones_around, CoverRating, Zone, ZoneSummary};
use crate::Timestamp;

/// Zones are only ever added. Existing entries win over freshly generated
/// neutral placeholders so in-flight ownership is never clobbered.
#[derive(Debug, Clone)]
pub struct ZoneRegistry {
    tile_size_m: f64,
    zones: HashMap<String, Zone>,
}

impl ZoneRegistry {
    pub fn new(tile_size_m: f64) -> Self {
        Self {
            tile_size_m,
            zones: HashMap::new(),
        }
    }

    /// Inserts zones whose id is not yet tracked. Returns how many were new.
    pub fn merge(&mut self, generated: impl IntoIterator<Item = Zone>) -> usize {
        let mut inserted = 0;
        for zone in generated {
            if !self.zones.contains_key(&zone.id) {
                self.zones.insert(zone.id.clone(), zone);
                inserted += 1;
            }
        }
        inserted
    }

    /// Generates the grid around `center` and merges it in.
    pub fn discover_around(&mut self, center: GeoPoint, radius: u32, now: Timestamp) -> usize {
        let generated = generate_zones_around(center, radius, self.tile_size_m, now);
        self.merge(generated)
    }

    pub fn zone_id_at(&self, position: GeoPoint) -> String {
        point_to_tile(position, self.tile_size_m).zone_id()
    }

    /// `None` means the player is standing in undiscovered territory.
    pub fn current_zone(&self, position: GeoPoint) -> Option<&Zone> {
        self.zones.get(&self.zone_id_at(position))
    }

    /// The `count` zones closest to `position` by degree-space Manhattan distance.
    pub fn zones_near(&self, position: GeoPoint, count: usize) -> Vec<&Zone> {
        let mut ranked: Vec<(f64, &Zone)> = self
            .zones
            .values()
            .map(|zone| {
                let d = (zone.center.lat - position.lat).abs()
                    + (zone.center.lng - position.lng).abs();
                (d, zone)
            })
            .collect();
        ranked.sort_by(|a, b| a.0.total_cmp(&b.0).then_with(|| a.1.id.cmp(&b.1.id)));
        ranked.into_iter().take(count).map(|(_, zone)| zone).collect()
    }

    /// Collaborator payload for the `count` nearest zones.
    pub fn summaries(&self, position: GeoPoint, count: usize) -> Vec<ZoneSummary> {
        self.zones_near(position, count)
            .into_iter()
            .map(Zone::summary)
            .collect()
    }

    pub fn get(&self, id: &str) -> Option<&Zone> {
        self.zones.get(id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut Zone> {
        self.zones.get_mut(id)
    }

    pub fn len(&self) -> usize {
        self.zones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.zones.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Zone> {
        self.zones.values()
    }

    /// Ids in a stable order, for passes that must not depend on hash order.
    pub fn ids(&self) -> Vec<String> {
        let mut ids: Vec<_> = self.zones.keys().cloned().collect();
        ids.sort();
        ids
    }

    pub fn owned_by(&self, player_id: &str) -> Vec<&Zone> {
        let mut owned: Vec<_> = self
            .zones
            .values()
            .filter(|zone| zone.is_owned_by(player_id))
            .collect();
        owned.sort_by(|a, b| a.id.cmp(&b.id));
        owned
    }

    /// Rejects ids that are not `zone_<x>_<y>`. `Ok(false)` means the id is
    /// well formed but the zone has not been discovered.
    pub fn set_cover_rating(&mut self, id: &str, rating: CoverRating) -> Result<bool, ZoneIdError> {
        parse_zone_id(id)?;
        Ok(match self.zones.get_mut(id) {
            Some(zone) => {
                zone.cover_rating = rating;
                true
            }
            None => false,
        })
    }
}
