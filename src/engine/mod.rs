use anyhow::{Context, Result};
use tracing::{trace, warn};

use crate::{
    config::RuleConfig,
    events::{EventSink, NullSink, ZoneEvent},
    systems::{CaptureSystem, DecaySystem, ReinforcementSystem},
    world::World,
    Timestamp,
};

pub struct EngineBuilder {
    rules: RuleConfig,
    systems: Vec<Box<dyn System>>,
    sink: Box<dyn EventSink>,
}

impl EngineBuilder {
    pub fn new(rules: RuleConfig) -> Self {
        Self {
            rules,
            systems: Vec::new(),
            sink: Box::new(NullSink),
        }
    }

    pub fn with_system(mut self, system: impl System + 'static) -> Self {
        self.systems.push(Box::new(system));
        self
    }

    pub fn with_sink(mut self, sink: impl EventSink + 'static) -> Self {
        self.sink = Box::new(sink);
        self
    }

    pub fn build(self) -> Engine {
        Engine {
            rules: self.rules,
            systems: self.systems,
            sink: self.sink,
        }
    }
}

/// Runs the zone systems over a `World`, one tick at a time.
///
/// Systems run in insertion order and each runs to completion before the
/// next starts, so no system ever observes a half-applied update.
pub struct Engine {
    rules: RuleConfig,
    systems: Vec<Box<dyn System>>,
    sink: Box<dyn EventSink>,
}

impl Engine {
    /// Decay, then reinforcement, then capture: the canonical order.
    pub fn standard(rules: RuleConfig) -> EngineBuilder {
        EngineBuilder::new(rules)
            .with_system(DecaySystem::new())
            .with_system(ReinforcementSystem::new())
            .with_system(CaptureSystem::new())
    }

    pub fn tick(&mut self, world: &mut World, now: Timestamp) -> Result<TickSummary> {
        world.advance_tick();
        let ctx = SystemContext {
            tick: world.tick(),
            now,
            rules: &self.rules,
        };
        for system in &mut self.systems {
            system
                .run(&ctx, world)
                .with_context(|| format!("system '{}' failed on tick {}", system.name(), ctx.tick))?;
        }

        let events = world.drain_events();
        for event in &events {
            if let Err(err) = self.sink.publish(event) {
                warn!(
                    target: "areacontrol::engine",
                    zone = %event.zone_id,
                    kind = ?event.kind,
                    error = %err,
                    "event.publish_failed"
                );
            }
        }
        trace!(target: "areacontrol::engine", tick = ctx.tick, events = events.len(), "tick.done");

        Ok(TickSummary {
            tick: ctx.tick,
            now,
            current_zone: world.current_zone().map(|zone| zone.id.clone()),
            capture_progress: world.session().capture_progress(),
            events,
        })
    }
}

#[derive(Debug, Clone)]
pub struct TickSummary {
    pub tick: u64,
    pub now: Timestamp,
    pub current_zone: Option<String>,
    pub capture_progress: Option<f64>,
    pub events: Vec<ZoneEvent>,
}

pub struct SystemContext<'a> {
    pub tick: u64,
    pub now: Timestamp,
    pub rules: &'a RuleConfig,
}

pub trait System: Send {
    fn name(&self) -> &str;
    fn run(&mut self, ctx: &SystemContext, world: &mut World) -> Result<()>;
}
