use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::RuleConfig;
use crate::events::ZoneEvent;
use crate::geo::{GeoError, GeoPoint};
use crate::registry::ZoneRegistry;
use crate::session::{CaptureAttempt, Occupancy, PlayerSession, PlayerStanding};
use crate::tile::MAX_TILED_LAT;
use crate::zone::Zone;
use crate::Timestamp;

/// One GPS fix as delivered by the device.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PositionSample {
    pub point: GeoPoint,
    pub accuracy_m: f64,
    pub timestamp: Timestamp,
}

impl PositionSample {
    pub fn new(lat: f64, lng: f64, accuracy_m: f64, timestamp: Timestamp) -> Result<Self, GeoError> {
        let point = GeoPoint::new(lat, lng)?;
        if lat.abs() > MAX_TILED_LAT {
            return Err(GeoError::Polar(lat));
        }
        if !accuracy_m.is_finite() || accuracy_m < 0.0 {
            return Err(GeoError::Accuracy(accuracy_m));
        }
        Ok(Self {
            point,
            accuracy_m,
            timestamp,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorldSnapshot {
    pub tick: u64,
    pub player: PlayerStanding,
    pub position: Option<GeoPoint>,
    pub current_zone: Option<String>,
    pub capture_progress: Option<f64>,
    pub zones_discovered: usize,
    pub zones_owned: usize,
    pub zones: Vec<Zone>,
}

/// Everything the engine mutates: the registry and the acting player's session.
pub struct World {
    tick: u64,
    discovery_radius: u32,
    pub(crate) registry: ZoneRegistry,
    pub(crate) session: PlayerSession,
    pub(crate) position: Option<PositionSample>,
    pub(crate) pending_events: Vec<ZoneEvent>,
}

impl World {
    pub fn new(session: PlayerSession, rules: &RuleConfig) -> Self {
        Self {
            tick: 0,
            discovery_radius: rules.discovery_radius,
            registry: ZoneRegistry::new(rules.tile_size_m),
            session,
            position: None,
            pending_events: Vec::new(),
        }
    }

    /// Records the latest fix and lazily grows the grid around it.
    /// Returns the number of newly discovered zones.
    ///
    /// A fix outside the zone of the in-flight capture or occupancy ends it
    /// immediately, even if the player is back before the next tick. Entering
    /// a zone starts its timer at the fix's own timestamp.
    pub fn observe(&mut self, sample: PositionSample) -> usize {
        self.position = Some(sample);
        let discovered =
            self.registry
                .discover_around(sample.point, self.discovery_radius, sample.timestamp);
        if discovered > 0 {
            debug!(
                target: "areacontrol::world",
                discovered,
                total = self.registry.len(),
                position = %sample.point,
                "zones.discovered"
            );
        }
        self.follow_presence(&sample);
        discovered
    }

    fn follow_presence(&mut self, sample: &PositionSample) {
        let player_id = self.session.player_id().to_string();
        let here = self
            .registry
            .current_zone(sample.point)
            .map(|zone| (zone.id.clone(), zone.is_owned_by(&player_id)));
        let here_id = here.as_ref().map(|(id, _)| id.as_str());

        let left_occupancy = self
            .session
            .occupancy
            .as_ref()
            .is_some_and(|occupancy| here_id != Some(occupancy.zone_id.as_str()));
        if left_occupancy {
            if let Some(occupancy) = self.session.occupancy.take() {
                debug!(target: "areacontrol::reinforcement", zone = %occupancy.zone_id, "occupancy.ended");
            }
        }
        let left_capture = self
            .session
            .capture
            .as_ref()
            .is_some_and(|attempt| here_id != Some(attempt.zone_id.as_str()));
        if left_capture {
            self.cancel_capture();
        }

        match here {
            Some((zone_id, true)) if self.session.occupancy.is_none() => {
                debug!(target: "areacontrol::reinforcement", zone = %zone_id, "occupancy.started");
                self.session.occupancy = Some(Occupancy {
                    zone_id,
                    anchor: sample.timestamp,
                });
            }
            Some((zone_id, false)) if self.session.capture.is_none() => {
                self.start_capture(zone_id, sample.timestamp);
            }
            _ => {}
        }
    }

    /// Drops the in-flight capture and clears the progress it left on its zone.
    pub(crate) fn cancel_capture(&mut self) {
        let Some(attempt) = self.session.capture.take() else {
            return;
        };
        if let Some(zone) = self.registry.get_mut(&attempt.zone_id) {
            if !zone.is_owned_by(self.session.player_id()) {
                zone.set_capture_progress(0.0);
            }
        }
        debug!(
            target: "areacontrol::capture",
            zone = %attempt.zone_id,
            progress = attempt.progress,
            "capture.cancelled"
        );
    }

    /// Replaces any in-flight capture with a fresh one on `zone_id`.
    pub(crate) fn start_capture(&mut self, zone_id: String, started_at: Timestamp) {
        self.cancel_capture();
        if let Some(zone) = self.registry.get_mut(&zone_id) {
            zone.set_capture_progress(0.0);
        }
        debug!(target: "areacontrol::capture", zone = %zone_id, "capture.started");
        self.session.capture = Some(CaptureAttempt {
            zone_id,
            started_at,
            progress: 0.0,
        });
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn advance_tick(&mut self) {
        self.tick += 1;
    }

    pub fn registry(&self) -> &ZoneRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut ZoneRegistry {
        &mut self.registry
    }

    pub fn session(&self) -> &PlayerSession {
        &self.session
    }

    pub fn position(&self) -> Option<&PositionSample> {
        self.position.as_ref()
    }

    pub fn current_zone(&self) -> Option<&Zone> {
        self.position
            .as_ref()
            .and_then(|sample| self.registry.current_zone(sample.point))
    }

    pub(crate) fn push_event(&mut self, event: ZoneEvent) {
        self.pending_events.push(event);
    }

    pub(crate) fn drain_events(&mut self) -> Vec<ZoneEvent> {
        std::mem::take(&mut self.pending_events)
    }

    pub fn snapshot(&self) -> WorldSnapshot {
        let mut zones: Vec<Zone> = self.registry.iter().cloned().collect();
        zones.sort_by(|a, b| a.tile.cmp(&b.tile));
        WorldSnapshot {
            tick: self.tick,
            player: self.session.standing(),
            position: self.position.map(|sample| sample.point),
            current_zone: self.current_zone().map(|zone| zone.id.clone()),
            capture_progress: self.session.capture_progress(),
            zones_discovered: self.registry.len(),
            zones_owned: self.registry.owned_by(self.session.player_id()).len(),
            zones,
        }
    }
}
