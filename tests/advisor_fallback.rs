use std::future::Future;
use std::sync::{Arc, Mutex};

use chrono::{TimeZone, Utc};

use areacontrol::{
    advisor::{
        Advisor, AdvisorContext, AdvisorError, AdvisorService, CommentaryRequest, CoverRequest,
        MessageKind, MissionKind, MissionRequest,
    },
    config::{AdvisorConfig, RuleConfig},
    session::PlayerSession,
    CoverRating, PositionSample, World,
};

/// Records what it was asked and answers from a fixed script.
#[derive(Default, Clone)]
struct Recorder {
    cover_reply: Option<String>,
    mission_reply: Option<String>,
    nearby_seen: Arc<Mutex<Vec<usize>>>,
}

impl Recorder {
    fn reply(text: Option<&str>) -> Result<String, AdvisorError> {
        text.map(str::to_string)
            .ok_or_else(|| AdvisorError::Unavailable("offline".into()))
    }
}

impl AdvisorService for Recorder {
    fn analyze_cover(
        &self,
        _request: &CoverRequest,
    ) -> impl Future<Output = Result<String, AdvisorError>> + Send {
        let reply = Self::reply(self.cover_reply.as_deref());
        async move { reply }
    }

    fn generate_missions(
        &self,
        request: &MissionRequest,
    ) -> impl Future<Output = Result<String, AdvisorError>> + Send {
        self.nearby_seen.lock().unwrap().push(request.nearby_zones.len());
        let reply = Self::reply(self.mission_reply.as_deref());
        async move { reply }
    }

    fn generate_commentary(
        &self,
        request: &CommentaryRequest,
    ) -> impl Future<Output = Result<String, AdvisorError>> + Send {
        self.nearby_seen.lock().unwrap().push(request.nearby_zones.len());
        let reply = Self::reply(None);
        async move { reply }
    }
}

fn world() -> World {
    let mut world = World::new(PlayerSession::new("player-1", "Runner"), &RuleConfig::default());
    let now = Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap();
    world.observe(PositionSample::new(28.6139, 77.2090, 5.0, now).unwrap());
    world
}

#[tokio::test]
async fn cover_rating_lands_on_the_zone() {
    let mut world = world();
    let zone = world.current_zone().unwrap();
    let request = CoverRequest {
        zone_id: zone.id.clone(),
        position: zone.center,
    };
    let service = Recorder {
        cover_reply: Some("```json\n{\"coverRating\": \"low\", \"tacticalAdvice\": \"Keep moving\"}\n```".into()),
        ..Recorder::default()
    };
    let advisor = Advisor::new(service, AdvisorConfig::default(), 7);

    let report = advisor.analyze_cover(&request).await;
    assert_eq!(report.tactical_advice.as_deref(), Some("Keep moving"));
    assert_eq!(
        world.registry_mut().set_cover_rating(&request.zone_id, report.cover_rating),
        Ok(true)
    );
    assert_eq!(world.current_zone().unwrap().cover_rating, CoverRating::Low);
}

#[tokio::test]
async fn payloads_respect_nearby_limits() {
    let world = world();
    let ctx = AdvisorContext::from_world(&world, 50).unwrap();
    let service = Recorder {
        mission_reply: Some(
            r#"{"missions": [{"id": "m1", "title": "Ring Road", "description": "Hold three blocks",
               "type": "strategic", "objectives": [{"description": "Hold", "target": 3}],
               "reward": 30, "expiresAt": 1772355600000}]}"#
                .into(),
        ),
        ..Recorder::default()
    };
    let seen = service.nearby_seen.clone();
    let mut advisor = Advisor::new(service, AdvisorConfig::default(), 7);

    let missions = advisor
        .missions(&ctx, Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap())
        .await;
    assert_eq!(missions.len(), 1);
    assert_eq!(missions[0].kind, MissionKind::Strategic);

    let commentary = advisor.commentary(&ctx).await;
    assert_eq!(commentary.kind, MessageKind::Info);

    assert_eq!(*seen.lock().unwrap(), vec![10, 8]);
}

#[tokio::test]
async fn offline_advisor_never_blocks_play() {
    let world = world();
    let ctx = AdvisorContext::from_world(&world, 10).unwrap();
    let mut advisor = Advisor::new(Recorder::default(), AdvisorConfig::default(), 7);

    let report = advisor
        .analyze_cover(&CoverRequest {
            zone_id: ctx.current_zone.clone().unwrap().id,
            position: ctx.position,
        })
        .await;
    assert_eq!(report.cover_rating, CoverRating::Unknown);

    let now = Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap();
    let missions = advisor.missions(&ctx, now).await;
    assert_eq!(missions.len(), 2);
    assert_eq!(missions[1].objectives[0].current, 5);
    assert!(missions[1].completed);

    let line = advisor.commentary(&ctx).await;
    assert!(!line.message.is_empty());
}
