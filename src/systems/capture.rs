use anyhow::Result;
use tracing::info;

use crate::{
    engine::{System, SystemContext},
    events::{ZoneEvent, ZoneEventKind},
    session::Occupancy,
    world::World,
};

/// Converts a zone the player does not own after continuous presence for
/// the capture duration, counted from the fix that entered it. Attempts
/// normally begin in `World::observe`; a tick only starts one when the zone
/// underfoot became capturable while the player stood still.
pub struct CaptureSystem;

impl CaptureSystem {
    pub fn new() -> Self {
        Self
    }
}

impl Default for CaptureSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl System for CaptureSystem {
    fn name(&self) -> &str {
        "capture"
    }

    fn run(&mut self, ctx: &SystemContext, world: &mut World) -> Result<()> {
        let player_id = world.session.player_id().to_string();
        let target = world.position.and_then(|sample| {
            world
                .registry
                .current_zone(sample.point)
                .filter(|zone| !zone.is_owned_by(&player_id))
                .map(|zone| (zone.id.clone(), sample.point))
        });
        let Some((zone_id, position)) = target else {
            world.cancel_capture();
            return Ok(());
        };

        let started_at = match &world.session.capture {
            Some(attempt) if attempt.zone_id == zone_id => attempt.started_at,
            _ => {
                world.start_capture(zone_id, ctx.now);
                return Ok(());
            }
        };

        let duration_ms = ctx.rules.capture_duration_ms.max(1) as f64;
        let elapsed_ms = (ctx.now - started_at).num_milliseconds().max(0) as f64;
        let progress = (elapsed_ms / duration_ms * 100.0).min(100.0);

        if let Some(attempt) = world.session.capture.as_mut() {
            attempt.progress = progress;
        }
        let Some(zone) = world.registry.get_mut(&zone_id) else {
            return Ok(());
        };
        zone.set_capture_progress(progress);
        if progress < 100.0 {
            return Ok(());
        }

        let display_name = world.session.display_name().to_string();
        let previous_owner = zone.owner().map(str::to_string);
        zone.capture(&player_id, &display_name, ctx.now);
        let event = ZoneEvent {
            kind: ZoneEventKind::Captured,
            zone_id: zone_id.clone(),
            player_id,
            display_name,
            position,
            cover_rating: zone.cover_rating,
            hp: zone.hp(),
            timestamp: ctx.now,
        };

        world.session.capture = None;
        world.session.record_capture(ctx.rules.capture_reward);
        world.session.occupancy = Some(Occupancy {
            zone_id: zone_id.clone(),
            anchor: ctx.now,
        });
        info!(
            target: "areacontrol::capture",
            zone = %zone_id,
            previous_owner = previous_owner.as_deref().unwrap_or("neutral"),
            score = world.session.score(),
            "zone.captured"
        );
        world.push_event(event);
        Ok(())
    }
}
