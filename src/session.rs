//! Per-player transient state: score, capture count and the in-flight timers.

use serde::{Deserialize, Serialize};

use crate::Timestamp;

/// A capture in progress. At most one exists per player and it always
/// refers to the zone the player is currently standing in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptureAttempt {
    pub zone_id: String,
    pub started_at: Timestamp,
    pub progress: f64,
}

/// Continuous presence in an owned zone; reinforcement is counted from `anchor`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Occupancy {
    pub zone_id: String,
    pub anchor: Timestamp,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerStanding {
    pub player_id: String,
    pub display_name: String,
    pub score: u64,
    pub zones_captured: u64,
}

#[derive(Debug, Clone)]
pub struct PlayerSession {
    player_id: String,
    display_name: String,
    score: u64,
    zones_captured: u64,
    pub(crate) capture: Option<CaptureAttempt>,
    pub(crate) occupancy: Option<Occupancy>,
}

impl PlayerSession {
    pub fn new(player_id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            player_id: player_id.into(),
            display_name: display_name.into(),
            score: 0,
            zones_captured: 0,
            capture: None,
            occupancy: None,
        }
    }

    pub fn player_id(&self) -> &str {
        &self.player_id
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn score(&self) -> u64 {
        self.score
    }

    pub fn zones_captured(&self) -> u64 {
        self.zones_captured
    }

    pub fn capture(&self) -> Option<&CaptureAttempt> {
        self.capture.as_ref()
    }

    /// `None` while not capturing.
    pub fn capture_progress(&self) -> Option<f64> {
        self.capture.as_ref().map(|attempt| attempt.progress)
    }

    pub fn occupancy(&self) -> Option<&Occupancy> {
        self.occupancy.as_ref()
    }

    pub(crate) fn record_capture(&mut self, reward: u64) {
        self.score += reward;
        self.zones_captured += 1;
    }

    pub fn standing(&self) -> PlayerStanding {
        PlayerStanding {
            player_id: self.player_id.clone(),
            display_name: self.display_name.clone(),
            score: self.score,
            zones_captured: self.zones_captured,
        }
    }
}
