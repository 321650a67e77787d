use anyhow::Result;
use tracing::info;

use crate::{
    engine::{System, SystemContext},
    events::{ZoneEvent, ZoneEventKind},
    world::World,
    zone::DecayOutcome,
    Timestamp,
};

/// Settles decay on every owned zone on a fixed cadence.
///
/// The cadence only controls when the stored HP catches up; the amount lost
/// is always derived from the time since the last reinforcement.
pub struct DecaySystem {
    last_run: Option<Timestamp>,
}

impl DecaySystem {
    pub fn new() -> Self {
        Self { last_run: None }
    }

    fn due(&self, now: Timestamp, interval_ms: u64) -> bool {
        match self.last_run {
            None => true,
            Some(last) => (now - last).num_milliseconds() >= interval_ms as i64,
        }
    }
}

impl Default for DecaySystem {
    fn default() -> Self {
        Self::new()
    }
}

impl System for DecaySystem {
    fn name(&self) -> &str {
        "decay"
    }

    fn run(&mut self, ctx: &SystemContext, world: &mut World) -> Result<()> {
        if !self.due(ctx.now, ctx.rules.decay_interval_ms) {
            return Ok(());
        }
        self.last_run = Some(ctx.now);

        for id in world.registry.ids() {
            let Some(zone) = world.registry.get_mut(&id) else {
                continue;
            };
            let Some(owner) = zone.owner().map(str::to_string) else {
                continue;
            };
            let owner_name = zone.owner_name().unwrap_or_default().to_string();

            if zone.apply_decay(ctx.now, ctx.rules.decay_rate_per_minute) == DecayOutcome::Neutralized {
                info!(
                    target: "areacontrol::decay",
                    zone = %id,
                    previous_owner = %owner,
                    "zone.neutralized"
                );
                let event = ZoneEvent {
                    kind: ZoneEventKind::Neutralized,
                    zone_id: id.clone(),
                    player_id: owner,
                    display_name: owner_name,
                    position: zone.center,
                    cover_rating: zone.cover_rating,
                    hp: 0.0,
                    timestamp: ctx.now,
                };
                world.push_event(event);
            }
        }
        Ok(())
    }
}
