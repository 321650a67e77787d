use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use areacontrol::{
    advisor::{Advisor, AdvisorContext, OfflineAdvisor},
    config::Config,
    events::MemorySink,
    track::TrackLoader,
    Engine, World,
};

#[derive(Debug, Parser)]
#[command(author, version, about = "Replays a GPS track through the zone engine")]
struct Cli {
    /// Path to the track YAML file
    #[arg(long, default_value = "tracks/connaught_place.yaml")]
    track: PathBuf,

    /// Optional config YAML (built-in rules when omitted)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override the track's tick interval in milliseconds
    #[arg(long)]
    tick_ms: Option<u64>,

    /// Print the summary as JSON instead of text
    #[arg(long)]
    json: bool,

    /// End the text summary with offline missions and a commentary line
    #[arg(long)]
    briefing: bool,
}

fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn print_briefing(config: &Config, world: &World) {
    let nearby = config
        .advisor
        .mission_nearby_zones
        .max(config.advisor.commentary_nearby_zones);
    let (Some(ctx), Some(sample)) = (AdvisorContext::from_world(world, nearby), world.position()) else {
        return;
    };
    let mut advisor = Advisor::new(OfflineAdvisor, config.advisor.clone(), config.random_seed);
    for mission in advisor.missions(&ctx, sample.timestamp).await {
        let done = if mission.completed { "done" } else { "open" };
        println!("  [{done}] {} (+{}): {}", mission.title, mission.reward, mission.description);
    }
    println!("  > {}", advisor.commentary(&ctx).await.message);
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => Config::from_yaml(path)?,
        None => Config::default(),
    };
    init_tracing(&config.logging.level);

    let track = TrackLoader::new(".").load(&cli.track)?;
    let sink = MemorySink::new();
    let mut engine = Engine::standard(config.rules.clone())
        .with_sink(sink.clone())
        .build();
    let mut world = track.build_world(&config.rules);

    info!(target: "areacontrol::cli", track = %track.name, samples = track.samples.len(), "replay.started");
    let summary = track.replay(&mut engine, &mut world, cli.tick_ms, |_| {})?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    println!("Track '{}' replayed over {} ms ({} ticks)", summary.track, summary.duration_ms, summary.ticks);
    for event in sink.events() {
        println!(
            "  {} {:<11} {:<16} hp {:>6.2}  by {}",
            event.timestamp.format("%H:%M:%S%.3f"),
            format!("{:?}", event.kind).to_lowercase(),
            event.zone_id,
            event.hp,
            event.display_name
        );
    }
    println!(
        "{}: score {}, {} captures, {} of {} discovered zones held",
        summary.player.display_name,
        summary.player.score,
        summary.player.zones_captured,
        summary.zones_owned,
        summary.zones_discovered
    );
    if cli.briefing {
        print_briefing(&config, &world).await;
    }
    Ok(())
}
