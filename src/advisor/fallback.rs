//! Local stand-ins used whenever the collaborator cannot be reached or
//! replies with something unusable.

use chrono::Duration;

use super::schema::{Commentary, Mission, MissionKind, MissionObjective};
use super::AdvisorContext;
use crate::rng::RngManager;
use crate::Timestamp;

const EXPANSION_TARGET: u32 = 2;
const RECON_TARGET: u32 = 5;

pub fn missions(ctx: &AdvisorContext, now: Timestamp) -> Vec<Mission> {
    let captured = u32::try_from(ctx.zones_captured).unwrap_or(u32::MAX);
    let discovered = u32::try_from(ctx.zones_discovered).unwrap_or(u32::MAX);
    vec![
        progress_mission(
            "fallback-1",
            "Territory Expansion",
            "Capture 2 nearby neutral zones to expand your territory.",
            MissionKind::Capture,
            "Capture neutral zones",
            EXPANSION_TARGET,
            captured,
            20,
            now + Duration::minutes(5),
        ),
        progress_mission(
            "fallback-2",
            "Area Recon",
            "Explore the surrounding area. Walk to discover new zones.",
            MissionKind::Exploration,
            "Discover new zones",
            RECON_TARGET,
            discovered,
            15,
            now + Duration::minutes(10),
        ),
    ]
}

#[allow(clippy::too_many_arguments)]
fn progress_mission(
    id: &str,
    title: &str,
    description: &str,
    kind: MissionKind,
    objective: &str,
    target: u32,
    achieved: u32,
    reward: u64,
    expires_at: Timestamp,
) -> Mission {
    let completed = achieved >= target;
    Mission {
        id: id.to_string(),
        title: title.to_string(),
        description: description.to_string(),
        kind,
        objectives: vec![MissionObjective {
            description: objective.to_string(),
            target,
            current: achieved.min(target),
            completed,
        }],
        reward,
        expires_at,
        completed,
    }
}

pub fn commentary(ctx: &AdvisorContext, rng: &mut RngManager) -> Commentary {
    let lines = [
        "Area scanned. Zone grid generated around your position.".to_string(),
        "Move into neutral zones to begin capture sequence.".to_string(),
        "Remember: captured zones decay over time. Reinforce by standing nearby.".to_string(),
        "Strategic tip: Focus on high-cover zones for better defense.".to_string(),
        format!("You're controlling {} zones. Keep pushing!", ctx.zones_captured),
    ];
    let line = rng
        .pick("advisor.commentary", &lines)
        .cloned()
        .unwrap_or_default();
    Commentary::info(line)
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::advisor::MessageKind;
    use crate::geo::GeoPoint;

    fn ctx(captured: u64, discovered: usize) -> AdvisorContext {
        AdvisorContext {
            position: GeoPoint::new(28.6139, 77.2090).unwrap(),
            current_zone: None,
            nearby: Vec::new(),
            zones_captured: captured,
            zones_discovered: discovered,
        }
    }

    #[test]
    fn test_mission_progress_reflects_session() {
        let now = Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap();
        let missions = missions(&ctx(1, 121), now);
        assert_eq!(missions.len(), 2);

        let expansion = &missions[0];
        assert_eq!(expansion.title, "Territory Expansion");
        assert_eq!(expansion.objectives[0].current, 1);
        assert!(!expansion.completed);
        assert_eq!(expansion.expires_at, now + Duration::minutes(5));

        let recon = &missions[1];
        assert_eq!(recon.reward, 15);
        assert_eq!(recon.objectives[0].current, 5);
        assert!(recon.completed);
    }

    #[test]
    fn test_commentary_is_reproducible() {
        let mut a = RngManager::new(3);
        let mut b = RngManager::new(3);
        for _ in 0..5 {
            let x = commentary(&ctx(4, 0), &mut a);
            assert_eq!(x, commentary(&ctx(4, 0), &mut b));
            assert_eq!(x.kind, MessageKind::Info);
            assert!(!x.message.is_empty());
        }
    }
}
