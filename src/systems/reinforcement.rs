use anyhow::Result;
use tracing::{debug, info};

use crate::{
    engine::{System, SystemContext},
    events::{ZoneEvent, ZoneEventKind},
    session::Occupancy,
    world::World,
    zone::ReinforceOutcome,
};

/// Restores HP on the zone the owner is standing in, once per full
/// reinforcement interval of continuous presence.
pub struct ReinforcementSystem;

impl ReinforcementSystem {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ReinforcementSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl System for ReinforcementSystem {
    fn name(&self) -> &str {
        "reinforcement"
    }

    fn run(&mut self, ctx: &SystemContext, world: &mut World) -> Result<()> {
        let interval_ms = ctx.rules.reinforce_interval_ms as i64;
        let player_id = world.session.player_id().to_string();

        let (zone_id, position) = match world.position {
            Some(sample) => match world.registry.current_zone(sample.point) {
                Some(zone) if zone.is_owned_by(&player_id) => (zone.id.clone(), sample.point),
                _ => {
                    world.session.occupancy = None;
                    return Ok(());
                }
            },
            None => {
                world.session.occupancy = None;
                return Ok(());
            }
        };

        let anchor = world
            .session
            .occupancy
            .as_ref()
            .filter(|occupancy| occupancy.zone_id == zone_id)
            .map(|occupancy| occupancy.anchor);
        let Some(anchor) = anchor else {
            debug!(target: "areacontrol::reinforcement", zone = %zone_id, "occupancy.started");
            world.session.occupancy = Some(Occupancy {
                zone_id,
                anchor: ctx.now,
            });
            return Ok(());
        };

        if interval_ms <= 0 {
            return Ok(());
        }
        let cycles = (ctx.now - anchor).num_milliseconds() / interval_ms;
        if cycles <= 0 {
            return Ok(());
        }

        let Some(zone) = world.registry.get_mut(&zone_id) else {
            return Ok(());
        };
        let amount = ctx.rules.reinforce_amount * cycles as f64;
        match zone.reinforce(amount, ctx.now, ctx.rules.decay_rate_per_minute) {
            ReinforceOutcome::Reinforced { hp } => {
                debug!(target: "areacontrol::reinforcement", zone = %zone_id, hp, cycles, "zone.reinforced");
                let event = ZoneEvent {
                    kind: ZoneEventKind::Reinforced,
                    zone_id: zone_id.clone(),
                    player_id: player_id.clone(),
                    display_name: world.session.display_name().to_string(),
                    position,
                    cover_rating: zone.cover_rating,
                    hp,
                    timestamp: ctx.now,
                };
                world.session.occupancy = Some(Occupancy {
                    zone_id,
                    anchor: anchor + chrono::Duration::milliseconds(cycles * interval_ms),
                });
                world.push_event(event);
            }
            ReinforceOutcome::Lost => {
                info!(target: "areacontrol::reinforcement", zone = %zone_id, "zone.neutralized");
                let event = ZoneEvent {
                    kind: ZoneEventKind::Neutralized,
                    zone_id,
                    player_id,
                    display_name: world.session.display_name().to_string(),
                    position: zone.center,
                    cover_rating: zone.cover_rating,
                    hp: 0.0,
                    timestamp: ctx.now,
                };
                world.session.occupancy = None;
                world.push_event(event);
            }
            ReinforceOutcome::NotOwned => {
                world.session.occupancy = None;
            }
        }
        Ok(())
    }
}
