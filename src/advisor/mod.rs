//! Supplementary text from an external collaborator: cover analysis,
//! missions and tactical commentary.
//!
//! Everything here is advisory. Replies are untrusted text, validated
//! against a fixed schema, and any failure degrades to a local fallback
//! without touching game state beyond the cover rating.

mod fallback;
mod schema;

use std::future::Future;
use std::time::Duration;

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, warn};

pub use schema::{
    extract_json, Commentary, CoverReport, MessageKind, Mission, MissionBoard, MissionKind,
    MissionObjective,
};

use crate::config::AdvisorConfig;
use crate::geo::GeoPoint;
use crate::rng::RngManager;
use crate::world::World;
use crate::zone::ZoneSummary;
use crate::Timestamp;

#[derive(Debug, Error)]
pub enum AdvisorError {
    #[error("advisor did not answer within {0:?}")]
    Timeout(Duration),
    #[error("advisor unavailable: {0}")]
    Unavailable(String),
    #[error("advisor reply contained no JSON object")]
    NoJson,
    #[error("advisor reply did not match the schema: {0}")]
    Schema(#[source] serde_json::Error),
    #[error("advisor reply rejected: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CoverRequest {
    pub zone_id: String,
    pub position: GeoPoint,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MissionRequest {
    pub position: GeoPoint,
    pub nearby_zones: Vec<ZoneSummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentaryRequest {
    pub position: GeoPoint,
    pub current_zone: Option<ZoneSummary>,
    pub nearby_zones: Vec<ZoneSummary>,
}

/// Transport to the text collaborator. Implementations return the raw reply.
pub trait AdvisorService: Send + Sync {
    fn analyze_cover(
        &self,
        request: &CoverRequest,
    ) -> impl Future<Output = Result<String, AdvisorError>> + Send;

    fn generate_missions(
        &self,
        request: &MissionRequest,
    ) -> impl Future<Output = Result<String, AdvisorError>> + Send;

    fn generate_commentary(
        &self,
        request: &CommentaryRequest,
    ) -> impl Future<Output = Result<String, AdvisorError>> + Send;
}

/// Service for hosts with no collaborator configured. Every call fails, so
/// the advisor always answers from its local fallbacks.
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineAdvisor;

impl OfflineAdvisor {
    fn unavailable() -> std::future::Ready<Result<String, AdvisorError>> {
        std::future::ready(Err(AdvisorError::Unavailable("offline".into())))
    }
}

impl AdvisorService for OfflineAdvisor {
    fn analyze_cover(
        &self,
        _request: &CoverRequest,
    ) -> impl Future<Output = Result<String, AdvisorError>> + Send {
        Self::unavailable()
    }

    fn generate_missions(
        &self,
        _request: &MissionRequest,
    ) -> impl Future<Output = Result<String, AdvisorError>> + Send {
        Self::unavailable()
    }

    fn generate_commentary(
        &self,
        _request: &CommentaryRequest,
    ) -> impl Future<Output = Result<String, AdvisorError>> + Send {
        Self::unavailable()
    }
}

/// Owned copy of the state the advisor needs, so requests can be built
/// and awaited without holding the world.
#[derive(Debug, Clone, PartialEq)]
pub struct AdvisorContext {
    pub position: GeoPoint,
    pub current_zone: Option<ZoneSummary>,
    pub nearby: Vec<ZoneSummary>,
    pub zones_captured: u64,
    pub zones_discovered: usize,
}

impl AdvisorContext {
    /// `None` until the world has seen a position.
    pub fn from_world(world: &World, nearby_limit: usize) -> Option<Self> {
        let sample = world.position()?;
        Some(Self {
            position: sample.point,
            current_zone: world.current_zone().map(|zone| zone.summary()),
            nearby: world.registry().summaries(sample.point, nearby_limit),
            zones_captured: world.session().zones_captured(),
            zones_discovered: world.registry().len(),
        })
    }
}

pub struct Advisor<S> {
    service: S,
    config: AdvisorConfig,
    rng: RngManager,
}

impl<S: AdvisorService> Advisor<S> {
    pub fn new(service: S, config: AdvisorConfig, seed: u64) -> Self {
        Self {
            service,
            config,
            rng: RngManager::new(seed),
        }
    }

    fn timeout(&self) -> Duration {
        Duration::from_millis(self.config.timeout_ms)
    }

    async fn call<F>(&self, call: F) -> Result<String, AdvisorError>
    where
        F: Future<Output = Result<String, AdvisorError>>,
    {
        let limit = self.timeout();
        tokio::time::timeout(limit, call)
            .await
            .map_err(|_| AdvisorError::Timeout(limit))?
    }

    /// A failed analysis leaves the zone at `unknown`.
    pub async fn analyze_cover(&self, request: &CoverRequest) -> CoverReport {
        let reply = self.call(self.service.analyze_cover(request)).await;
        match reply.and_then(|text| CoverReport::parse(&text)) {
            Ok(report) => {
                debug!(
                    target: "areacontrol::advisor",
                    zone = %request.zone_id,
                    rating = report.cover_rating.as_str(),
                    "advisor.cover"
                );
                report
            }
            Err(err) => {
                warn!(target: "areacontrol::advisor", call = "cover", error = %err, "advisor.fallback");
                CoverReport::unknown()
            }
        }
    }

    pub async fn missions(&self, ctx: &AdvisorContext, now: Timestamp) -> Vec<Mission> {
        let request = MissionRequest {
            position: ctx.position,
            nearby_zones: ctx
                .nearby
                .iter()
                .take(self.config.mission_nearby_zones)
                .cloned()
                .collect(),
        };
        let reply = self.call(self.service.generate_missions(&request)).await;
        match reply.and_then(|text| MissionBoard::parse(&text)) {
            Ok(board) => board.missions,
            Err(err) => {
                warn!(target: "areacontrol::advisor", call = "missions", error = %err, "advisor.fallback");
                fallback::missions(ctx, now)
            }
        }
    }

    pub async fn commentary(&mut self, ctx: &AdvisorContext) -> Commentary {
        let request = CommentaryRequest {
            position: ctx.position,
            current_zone: ctx.current_zone.clone(),
            nearby_zones: ctx
                .nearby
                .iter()
                .take(self.config.commentary_nearby_zones)
                .cloned()
                .collect(),
        };
        let reply = self.call(self.service.generate_commentary(&request)).await;
        match reply.and_then(|text| Commentary::parse(&text)) {
            Ok(commentary) => commentary,
            Err(err) => {
                warn!(target: "areacontrol::advisor", call = "commentary", error = %err, "advisor.fallback");
                fallback::commentary(ctx, &mut self.rng)
            }
        }
    }
}

/// Throttles mission and commentary requests to their refresh intervals.
#[derive(Debug, Clone)]
pub struct AdvisorSchedule {
    mission_every: chrono::Duration,
    commentary_every: chrono::Duration,
    last_mission: Option<Timestamp>,
    last_commentary: Option<Timestamp>,
}

impl AdvisorSchedule {
    pub fn new(config: &AdvisorConfig) -> Self {
        Self {
            mission_every: chrono::Duration::milliseconds(config.mission_refresh_ms as i64),
            commentary_every: chrono::Duration::milliseconds(config.commentary_refresh_ms as i64),
            last_mission: None,
            last_commentary: None,
        }
    }

    /// True, and records the request, when missions are due at `now`.
    pub fn take_missions(&mut self, now: Timestamp) -> bool {
        Self::take(&mut self.last_mission, self.mission_every, now)
    }

    pub fn take_commentary(&mut self, now: Timestamp) -> bool {
        Self::take(&mut self.last_commentary, self.commentary_every, now)
    }

    fn take(last: &mut Option<Timestamp>, every: chrono::Duration, now: Timestamp) -> bool {
        match *last {
            Some(previous) if now - previous < every => false,
            _ => {
                *last = Some(now);
                true
            }
        }
    }
}
