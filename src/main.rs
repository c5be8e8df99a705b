//! Powerslide Simulator
//!
//! Headless demo: rides a scripted session over a floor and a ramp,
//! logs the cues the core fires, then replays the script and checks the
//! final state hash.
//!
//! Usage: `powerslide-sim [config.json]`

use anyhow::{bail, Context};
use glam::{Vec2, Vec3};
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use powerslide::{
    TICK_RATE, VERSION,
    game::{
        collision::{GroundSlab, TrackGeometry},
        config::SkaterConfig,
        events::{SkaterEvent, SkaterEventData},
        input::{InputEvent, InputEventKind},
        state::Skater,
        tick::{replay_script, tick},
    },
};

/// Seconds simulated by the demo.
const DEMO_SECONDS: u32 = 12;

fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = FmtSubscriber::builder().with_env_filter(filter).finish();
    tracing::subscriber::set_global_default(subscriber).context("failed to set tracing subscriber")?;

    info!("Powerslide Core v{}", VERSION);

    let config = match std::env::args().nth(1) {
        Some(path) => SkaterConfig::load(&path).with_context(|| format!("loading config from {}", path))?,
        None => SkaterConfig::default(),
    };
    info!("Tick Rate: {} Hz (default {})", config.tick_rate, TICK_RATE);

    demo_session(config)
}

/// Floor with a ramp straight ahead of the spawn point.
fn demo_track() -> TrackGeometry {
    let mut track = TrackGeometry::flat_floor(500.0);
    let angle = 0.2f32;
    let half_length = 10.0;
    // Lower edge of the ramp sits on the floor
    let center = Vec3::new(0.0, half_length * angle.sin(), -40.0);
    track.add(GroundSlab::ramp(center, Vec2::new(3.0, half_length), angle));
    track
}

/// Scripted input, sorted by time.
fn demo_script() -> Vec<InputEvent> {
    use InputEventKind::*;

    vec![
        InputEvent::new(0.0, Accelerate(1.0)),
        InputEvent::new(3.5, Look(Vec2::new(0.0, -1.0))),
        InputEvent::new(3.55, Look(Vec2::new(1.0, 0.0))),
        InputEvent::new(3.6, Look(Vec2::ZERO)),
        InputEvent::new(4.0, Trick(true)),
        InputEvent::new(4.05, Trick(false)),
        InputEvent::new(5.0, Move(Vec2::new(0.7, 0.0))),
        InputEvent::new(5.05, Drift(true)),
        InputEvent::new(7.4, Drift(false)),
        InputEvent::new(7.5, Move(Vec2::ZERO)),
        InputEvent::new(8.0, Boost(true)),
        InputEvent::new(8.05, Boost(false)),
        InputEvent::new(8.5, Dash(true)),
        InputEvent::new(8.55, Dash(false)),
        InputEvent::new(9.5, Accelerate(0.0)),
        InputEvent::new(9.5, Brake(true)),
        InputEvent::new(10.5, Brake(false)),
    ]
}

fn log_event(event: &SkaterEvent) {
    match event.data {
        SkaterEventData::TrickPerformed { kind } => info!("[{}] trick: {:?}", event.tick, kind),
        SkaterEventData::Landed { combo } => info!("[{}] landed (combo {})", event.tick, combo),
        SkaterEventData::DriftStarted { direction } => {
            info!("[{}] drift {}", event.tick, if direction < 0.0 { "left" } else { "right" })
        }
        SkaterEventData::DriftStopped { duration } => info!("[{}] drift ended after {:.2}s", event.tick, duration),
        SkaterEventData::BoostCredited { source, points } => {
            info!("[{}] boost +{:.1} from {:?}", event.tick, points, source)
        }
    }
}

/// Run the scripted session live, then verify it replays identically.
fn demo_session(config: SkaterConfig) -> anyhow::Result<()> {
    info!("=== Starting Demo Session ===");

    let spawn = Vec3::new(0.0, config.locomotion.ride_height, 0.0);
    let script = demo_script();
    let tick_count = DEMO_SECONDS * config.tick_rate;

    let mut skater = Skater::new(config.clone(), demo_track(), spawn)?;
    skater.subscribe(log_event);

    let mut next = 0;
    let mut expired = 0;
    for t in 0..tick_count {
        let horizon = skater.now() + skater.dt() * 0.5;
        let start = next;
        while next < script.len() && script[next].at <= horizon {
            next += 1;
        }

        let result = tick(&mut skater, &script[start..next]);
        expired += result.expired;

        if (t + 1) % config.tick_rate == 0 {
            let snapshot = skater.snapshot();
            info!(
                "t={:>2}s pos=({:6.1}, {:4.1}, {:6.1}) speed={:5.1} grounded={} {:?} boost={:.1}",
                (t + 1) / config.tick_rate,
                snapshot.position.x,
                snapshot.position.y,
                snapshot.position.z,
                snapshot.horizontal_speed,
                snapshot.is_grounded,
                snapshot.locomotion,
                snapshot.boost_points,
            );
        }
    }

    info!("=== Session Results ===");
    let hash = skater.compute_hash();
    info!("Final State Hash: {}", hex::encode(hash));
    info!("Expired commands: {}", expired);
    info!("Final snapshot: {}", serde_json::to_string(&skater.snapshot())?);

    info!("=== Verifying Determinism ===");
    let (replayed, _) = replay_script(config, demo_track(), spawn, &script, tick_count)?;
    let replay_hash = replayed.compute_hash();
    info!("Replay State Hash: {}", hex::encode(replay_hash));

    if hash != replay_hash {
        bail!("determinism failure: replay hash differs");
    }
    info!("DETERMINISM VERIFIED: Hashes match!");
    Ok(())
}
