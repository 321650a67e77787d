use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{ensure, Context, Result};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    config::RuleConfig,
    engine::{Engine, TickSummary},
    events::ZoneEventKind,
    session::{PlayerSession, PlayerStanding},
    world::{PositionSample, World},
    Timestamp,
};

fn default_tick_ms() -> u64 {
    500
}

fn default_accuracy() -> f64 {
    10.0
}

fn default_start() -> Timestamp {
    DateTime::<Utc>::default()
}

/// A recorded (or scripted) GPS walk, replayed against the engine.
#[derive(Debug, Clone, Deserialize)]
pub struct Track {
    pub name: String,
    pub description: Option<String>,
    pub player: TrackPlayer,
    #[serde(default = "default_start")]
    pub start: Timestamp,
    #[serde(default = "default_tick_ms")]
    pub tick_ms: u64,
    /// Extra time simulated after the last sample.
    #[serde(default)]
    pub tail_ms: u64,
    pub samples: Vec<TrackSample>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TrackPlayer {
    pub id: String,
    pub display_name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TrackSample {
    /// Milliseconds since `start`.
    pub at_ms: u64,
    pub lat: f64,
    pub lng: f64,
    #[serde(default = "default_accuracy")]
    pub accuracy: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplaySummary {
    pub track: String,
    pub ticks: u64,
    pub duration_ms: u64,
    pub zones_discovered: usize,
    pub zones_owned: usize,
    pub captured_events: usize,
    pub reinforced_events: usize,
    pub neutralized_events: usize,
    pub player: PlayerStanding,
}

pub struct TrackLoader {
    base_dir: PathBuf,
}

impl TrackLoader {
    pub fn new(base_dir: impl AsRef<Path>) -> Self {
        Self {
            base_dir: base_dir.as_ref().to_path_buf(),
        }
    }

    pub fn load(&self, file: impl AsRef<Path>) -> Result<Track> {
        let path = self.base_dir.join(file);
        let data = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read track file {}", path.display()))?;
        let track: Track = serde_yaml::from_str(&data)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        track
            .validate()
            .with_context(|| format!("Invalid track {}", path.display()))?;
        Ok(track)
    }
}

impl Track {
    pub fn validate(&self) -> Result<()> {
        ensure!(self.tick_ms > 0, "tick_ms must be positive");
        ensure!(!self.samples.is_empty(), "track has no samples");
        for pair in self.samples.windows(2) {
            ensure!(
                pair[0].at_ms <= pair[1].at_ms,
                "samples out of order at {} ms",
                pair[1].at_ms
            );
        }
        for sample in &self.samples {
            self.position(sample)
                .with_context(|| format!("sample at {} ms", sample.at_ms))?;
        }
        Ok(())
    }

    pub fn build_world(&self, rules: &RuleConfig) -> World {
        let session = PlayerSession::new(&self.player.id, &self.player.display_name);
        World::new(session, rules)
    }

    pub fn duration_ms(&self) -> u64 {
        self.samples.last().map_or(0, |sample| sample.at_ms) + self.tail_ms
    }

    fn at(&self, ms: u64) -> Timestamp {
        self.start + Duration::milliseconds(ms as i64)
    }

    fn position(&self, sample: &TrackSample) -> Result<PositionSample> {
        Ok(PositionSample::new(
            sample.lat,
            sample.lng,
            sample.accuracy,
            self.at(sample.at_ms),
        )?)
    }

    /// Feeds every sample to the world when its time comes and ticks the
    /// engine every `tick_ms` until the track (plus tail) is exhausted.
    /// `hook` sees each tick's summary.
    pub fn replay(
        &self,
        engine: &mut Engine,
        world: &mut World,
        tick_ms: Option<u64>,
        mut hook: impl FnMut(&TickSummary),
    ) -> Result<ReplaySummary> {
        let step = tick_ms.unwrap_or(self.tick_ms).max(1);
        let end = self.duration_ms();
        let mut pending = self.samples.iter().peekable();
        let (mut captured, mut reinforced, mut neutralized) = (0, 0, 0);
        let mut ticks = 0;

        let mut elapsed = 0;
        loop {
            while let Some(sample) = pending.next_if(|sample| sample.at_ms <= elapsed) {
                world.observe(self.position(sample)?);
            }
            let summary = engine.tick(world, self.at(elapsed))?;
            ticks += 1;
            for event in &summary.events {
                match event.kind {
                    ZoneEventKind::Captured => captured += 1,
                    ZoneEventKind::Reinforced => reinforced += 1,
                    ZoneEventKind::Neutralized => neutralized += 1,
                }
            }
            hook(&summary);

            if elapsed >= end {
                break;
            }
            elapsed = (elapsed + step).min(end);
        }

        let snapshot = world.snapshot();
        Ok(ReplaySummary {
            track: self.name.clone(),
            ticks,
            duration_ms: end,
            zones_discovered: snapshot.zones_discovered,
            zones_owned: snapshot.zones_owned,
            captured_events: captured,
            reinforced_events: reinforced,
            neutralized_events: neutralized,
            player: snapshot.player,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WALK: &str = r#"
name: short walk
player:
  id: p1
  display_name: Scout
start: 2026-03-01T09:00:00Z
tick_ms: 1000
tail_ms: 3000
samples:
  - { at_ms: 0, lat: 28.6139, lng: 77.2090 }
"#;

    #[test]
    fn test_validation_rejects_bad_tracks() {
        let mut track: Track = serde_yaml::from_str(WALK).unwrap();
        assert!(track.validate().is_ok());

        track.samples.push(TrackSample {
            at_ms: 100,
            lat: 95.0,
            lng: 0.0,
            accuracy: 5.0,
        });
        let err = track.validate().unwrap_err();
        assert!(format!("{err:#}").contains("100 ms"));

        track.samples.clear();
        assert!(track.validate().is_err());
    }

    #[test]
    fn test_replay_ticks_through_tail() {
        let track: Track = serde_yaml::from_str(WALK).unwrap();
        let rules = RuleConfig::default();
        let mut engine = Engine::standard(rules.clone()).build();
        let mut world = track.build_world(&rules);

        let mut seen = Vec::new();
        let summary = track
            .replay(&mut engine, &mut world, None, |tick| seen.push(tick.tick))
            .unwrap();

        assert_eq!(summary.ticks, 4);
        assert_eq!(seen, vec![1, 2, 3, 4]);
        assert_eq!(summary.captured_events, 1);
        assert_eq!(summary.player.score, 10);
        assert_eq!(summary.zones_discovered, 121);
    }
}
