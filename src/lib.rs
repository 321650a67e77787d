//! Geospatial tiling and zone lifecycle engine for a GPS territory-control game.

pub mod advisor;
pub mod config;
pub mod engine;
pub mod events;
pub mod geo;
pub mod registry;
pub mod rng;
pub mod runtime;
pub mod session;
pub mod systems;
pub mod tile;
pub mod track;
pub mod world;
pub mod zone;

/// Wall-clock instant used for every timer in the engine.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

pub use config::Config;
pub use engine::{Engine, EngineBuilder, TickSummary};
pub use geo::GeoPoint;
pub use registry::ZoneRegistry;
pub use world::{PositionSample, World};
pub use zone::{CoverRating, Zone};
