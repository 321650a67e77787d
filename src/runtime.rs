//! Single-owner game loop for multi-threaded hosts.
//!
//! The `World` lives inside one task; every mutation arrives as a command
//! on a bounded queue and is applied in arrival order, so capture, decay
//! and reinforcement never interleave.

use anyhow::{anyhow, Result};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::advisor::AdvisorContext;
use crate::engine::{Engine, TickSummary};
use crate::tile::ZoneIdError;
use crate::world::{PositionSample, World, WorldSnapshot};
use crate::zone::CoverRating;
use crate::Timestamp;

enum Command {
    Observe {
        sample: PositionSample,
        reply: oneshot::Sender<usize>,
    },
    Tick {
        now: Timestamp,
        reply: oneshot::Sender<Result<TickSummary>>,
    },
    SetCover {
        zone_id: String,
        rating: CoverRating,
        reply: oneshot::Sender<Result<bool, ZoneIdError>>,
    },
    Snapshot {
        reply: oneshot::Sender<WorldSnapshot>,
    },
    Context {
        nearby: usize,
        reply: oneshot::Sender<Option<AdvisorContext>>,
    },
    Shutdown,
}

/// Cloneable front door to a running `GameLoop`.
#[derive(Clone)]
pub struct GameHandle {
    tx: mpsc::Sender<Command>,
}

impl GameHandle {
    async fn request<T>(&self, build: impl FnOnce(oneshot::Sender<T>) -> Command) -> Result<T> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(build(reply))
            .await
            .map_err(|_| anyhow!("game loop has stopped"))?;
        rx.await.map_err(|_| anyhow!("game loop dropped the request"))
    }

    /// Returns the number of newly discovered zones.
    pub async fn observe(&self, sample: PositionSample) -> Result<usize> {
        self.request(|reply| Command::Observe { sample, reply }).await
    }

    pub async fn tick(&self, now: Timestamp) -> Result<TickSummary> {
        self.request(|reply| Command::Tick { now, reply }).await?
    }

    /// False when the zone is not tracked; an error when the id is malformed.
    pub async fn set_cover(&self, zone_id: impl Into<String>, rating: CoverRating) -> Result<bool> {
        let zone_id = zone_id.into();
        let updated = self
            .request(|reply| Command::SetCover {
                zone_id,
                rating,
                reply,
            })
            .await?;
        Ok(updated?)
    }

    pub async fn snapshot(&self) -> Result<WorldSnapshot> {
        self.request(|reply| Command::Snapshot { reply }).await
    }

    pub async fn advisor_context(&self, nearby: usize) -> Result<Option<AdvisorContext>> {
        self.request(|reply| Command::Context { nearby, reply })
            .await
    }

    /// Asks the loop to stop after the commands already queued.
    pub async fn shutdown(&self) -> Result<()> {
        self.tx
            .send(Command::Shutdown)
            .await
            .map_err(|_| anyhow!("game loop has stopped"))
    }
}

pub struct GameLoop {
    engine: Engine,
    world: World,
    rx: mpsc::Receiver<Command>,
}

impl GameLoop {
    /// Starts the loop on the current tokio runtime. The join handle yields
    /// the final world once every handle is dropped or shutdown is requested.
    pub fn spawn(engine: Engine, world: World, capacity: usize) -> (GameHandle, JoinHandle<World>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let game = GameLoop { engine, world, rx };
        (GameHandle { tx }, tokio::spawn(game.run()))
    }

    async fn run(mut self) -> World {
        info!(target: "areacontrol::runtime", player = self.world.session().player_id(), "loop.started");
        while let Some(command) = self.rx.recv().await {
            match command {
                Command::Observe { sample, reply } => {
                    let _ = reply.send(self.world.observe(sample));
                }
                Command::Tick { now, reply } => {
                    let _ = reply.send(self.engine.tick(&mut self.world, now));
                }
                Command::SetCover {
                    zone_id,
                    rating,
                    reply,
                } => {
                    let updated = self.world.registry_mut().set_cover_rating(&zone_id, rating);
                    match &updated {
                        Ok(found) => {
                            debug!(target: "areacontrol::runtime", zone = %zone_id, rating = rating.as_str(), found = *found, "zone.cover");
                        }
                        Err(err) => {
                            warn!(target: "areacontrol::runtime", error = %err, "zone.cover_rejected");
                        }
                    }
                    let _ = reply.send(updated);
                }
                Command::Snapshot { reply } => {
                    let _ = reply.send(self.world.snapshot());
                }
                Command::Context { nearby, reply } => {
                    let _ = reply.send(AdvisorContext::from_world(&self.world, nearby));
                }
                Command::Shutdown => break,
            }
        }
        info!(target: "areacontrol::runtime", tick = self.world.tick(), "loop.stopped");
        self.world
    }
}
