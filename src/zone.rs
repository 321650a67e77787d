//! Zone records, the grid generator and the per-zone HP rules.

use serde::{Deserialize, Serialize};

use crate::geo::GeoPoint;
use crate::tile::{point_to_tile, tile_bounds, tile_to_point, BoundingBox, TileCoordinate};
use crate::Timestamp;

pub const DEFAULT_MAX_HP: f64 = 100.0;

const MS_PER_MINUTE: f64 = 60_000.0;

/// Defensibility of the terrain under a zone, supplied by the tactical analyst.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CoverRating {
    High,
    Medium,
    Low,
    #[default]
    Unknown,
}

impl CoverRating {
    pub fn as_str(&self) -> &'static str {
        match self {
            CoverRating::High => "high",
            CoverRating::Medium => "medium",
            CoverRating::Low => "low",
            CoverRating::Unknown => "unknown",
        }
    }

    /// Anything the analyst sends outside the four known values collapses to `Unknown`.
    pub fn from_untrusted(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "high" => CoverRating::High,
            "medium" => CoverRating::Medium,
            "low" => CoverRating::Low,
            _ => CoverRating::Unknown,
        }
    }
}

/// Result of settling decay on one zone.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DecayOutcome {
    Unchanged,
    Decayed { hp: f64 },
    Neutralized,
}

/// Result of a reinforcement attempt.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ReinforceOutcome {
    Reinforced { hp: f64 },
    /// The zone had already decayed to nothing and reverted to neutral.
    Lost,
    NotOwned,
}

/// One cell of the grid and the unit of ownership.
///
/// Ownership fields are private so that `owner`, `owner_name` and
/// `captured_at` always change together.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Zone {
    pub id: String,
    pub tile: TileCoordinate,
    pub center: GeoPoint,
    pub bounds: BoundingBox,
    /// Latitude whose longitude scale produced `center` and `bounds`.
    pub reference_lat: f64,
    pub max_hp: f64,
    pub capture_progress: f64,
    pub cover_rating: CoverRating,
    owner: Option<String>,
    owner_name: Option<String>,
    hp: f64,
    /// HP as of `last_reinforced`; decay is always measured from this pair.
    anchor_hp: f64,
    last_reinforced: Timestamp,
    captured_at: Option<Timestamp>,
}

impl Zone {
    pub fn neutral(tile: TileCoordinate, reference_lat: f64, tile_size_m: f64, now: Timestamp) -> Self {
        Self {
            id: tile.zone_id(),
            tile,
            center: tile_to_point(tile, reference_lat, tile_size_m),
            bounds: tile_bounds(tile, reference_lat, tile_size_m),
            reference_lat,
            max_hp: DEFAULT_MAX_HP,
            capture_progress: 0.0,
            cover_rating: CoverRating::Unknown,
            owner: None,
            owner_name: None,
            hp: 0.0,
            anchor_hp: 0.0,
            last_reinforced: now,
            captured_at: None,
        }
    }

    pub fn owner(&self) -> Option<&str> {
        self.owner.as_deref()
    }

    pub fn owner_name(&self) -> Option<&str> {
        self.owner_name.as_deref()
    }

    pub fn hp(&self) -> f64 {
        self.hp
    }

    pub fn last_reinforced(&self) -> Timestamp {
        self.last_reinforced
    }

    pub fn captured_at(&self) -> Option<Timestamp> {
        self.captured_at
    }

    pub fn is_neutral(&self) -> bool {
        self.owner.is_none()
    }

    pub fn is_owned_by(&self, player_id: &str) -> bool {
        self.owner.as_deref() == Some(player_id)
    }

    /// Share of max HP still held; what map tinting keys off. Zero when neutral.
    pub fn control_ratio(&self) -> f64 {
        if self.is_neutral() || self.max_hp <= 0.0 {
            return 0.0;
        }
        (self.hp / self.max_hp).clamp(0.0, 1.0)
    }

    pub fn set_capture_progress(&mut self, progress: f64) {
        self.capture_progress = progress.clamp(0.0, 100.0);
    }

    pub fn capture(&mut self, player_id: &str, display_name: &str, now: Timestamp) {
        self.owner = Some(player_id.to_string());
        self.owner_name = Some(display_name.to_string());
        self.hp = self.max_hp;
        self.anchor_hp = self.max_hp;
        self.captured_at = Some(now);
        self.last_reinforced = now;
        self.capture_progress = 100.0;
    }

    /// Rehydrates ownership known to an external store (e.g. after a restart).
    pub fn restore_ownership(
        &mut self,
        player_id: &str,
        display_name: &str,
        hp: f64,
        captured_at: Timestamp,
        last_reinforced: Timestamp,
    ) {
        let hp = hp.clamp(0.0, self.max_hp);
        self.owner = Some(player_id.to_string());
        self.owner_name = Some(display_name.to_string());
        self.hp = hp;
        self.anchor_hp = hp;
        self.captured_at = Some(captured_at);
        self.last_reinforced = last_reinforced;
    }

    /// Reverts to neutral. Capture progress and cover rating are left alone.
    pub fn neutralize(&mut self) {
        self.owner = None;
        self.owner_name = None;
        self.hp = 0.0;
        self.anchor_hp = 0.0;
        self.captured_at = None;
    }

    pub fn apply_decay(&mut self, now: Timestamp, decay_rate_per_minute: f64) -> DecayOutcome {
        if self.is_neutral() {
            return DecayOutcome::Unchanged;
        }
        let next = calculate_decay(self, now, decay_rate_per_minute);
        if next == self.hp {
            return DecayOutcome::Unchanged;
        }
        if next <= 0.0 {
            self.neutralize();
            return DecayOutcome::Neutralized;
        }
        self.hp = next;
        DecayOutcome::Decayed { hp: next }
    }

    /// Adds `amount` HP on top of whatever decay has eaten since the last
    /// reinforcement, then restarts the decay clock.
    pub fn reinforce(
        &mut self,
        amount: f64,
        now: Timestamp,
        decay_rate_per_minute: f64,
    ) -> ReinforceOutcome {
        if self.is_neutral() {
            return ReinforceOutcome::NotOwned;
        }
        let current = calculate_decay(self, now, decay_rate_per_minute);
        if current <= 0.0 {
            self.neutralize();
            return ReinforceOutcome::Lost;
        }
        let hp = (current + amount).min(self.max_hp);
        self.hp = hp;
        self.anchor_hp = hp;
        self.last_reinforced = now;
        ReinforceOutcome::Reinforced { hp }
    }

    pub fn summary(&self) -> ZoneSummary {
        ZoneSummary {
            id: self.id.clone(),
            center: self.center,
            owner: self.owner.clone(),
            hp: self.hp,
            cover_rating: self.cover_rating,
        }
    }
}

/// The slice of a zone that leaves the core in collaborator payloads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ZoneSummary {
    pub id: String,
    pub center: GeoPoint,
    pub owner: Option<String>,
    pub hp: f64,
    pub cover_rating: CoverRating,
}

/// HP left on an owned zone at `now`, rounded to two decimals and floored at 0.
///
/// Always measured from the HP held at the last reinforcement, so the result
/// depends only on elapsed time and never on how often it is evaluated.
/// Neutral zones report 0.
pub fn calculate_decay(zone: &Zone, now: Timestamp, decay_rate_per_minute: f64) -> f64 {
    if zone.owner.is_none() || zone.captured_at.is_none() {
        return 0.0;
    }
    let elapsed_ms = (now - zone.last_reinforced).num_milliseconds().max(0) as f64;
    let minutes = elapsed_ms / MS_PER_MINUTE;
    let decayed = (zone.anchor_hp - minutes * decay_rate_per_minute).max(0.0);
    (decayed * 100.0).round() / 100.0
}

pub fn is_point_in_zone(point: GeoPoint, zone: &Zone) -> bool {
    zone.bounds.contains(point)
}

/// Every zone in the `(2r+1)²` square centred on the tile containing `center`.
pub fn generate_zones_around(
    center: GeoPoint,
    radius: u32,
    tile_size_m: f64,
    now: Timestamp,
) -> Vec<Zone> {
    let origin = point_to_tile(center, tile_size_m);
    let r = radius as i64;
    let side = (2 * radius as usize) + 1;
    let mut zones = Vec::with_capacity(side * side);
    for dx in -r..=r {
        for dy in -r..=r {
            zones.push(Zone::neutral(origin.offset(dx, dy), center.lat, tile_size_m, now));
        }
    }
    zones
}
