use std::sync::Arc;

use clap::Args;
use felines_core::{Clock, Config, EngagementOrchestrator, ManualClock, VirtualBackend};

use super::print_event;

#[derive(Args)]
pub struct SimulateArgs {
    /// Number of likes to perform
    #[arg(default_value = "5")]
    pub likes: u64,
    /// Simulated milliseconds between likes
    #[arg(long, default_value = "500")]
    pub gap_ms: u64,
    /// Seed for cue selection
    #[arg(long)]
    pub seed: Option<u64>,
    /// Run without a playback backend
    #[arg(long)]
    pub no_audio: bool,
}

/// Prints every event, then lets the display window run out so the hide
/// shows up too.
pub fn run(args: SimulateArgs) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = Config::load()?;
    if args.seed.is_some() {
        config.audio.seed = args.seed;
    }

    let clock = ManualClock::new(0);
    let shared: Arc<dyn Clock> = Arc::new(clock.clone());
    let backend = (!args.no_audio).then(|| {
        Box::new(VirtualBackend::new(shared.clone())) as Box<dyn felines_core::PlaybackBackend>
    });
    let mut engine = EngagementOrchestrator::from_config(&config, shared, backend)?;

    for _ in 0..args.likes {
        for event in &engine.user_liked().events {
            print_event(event)?;
        }
        clock.advance(args.gap_ms);
        if let Some(event) = engine.tick() {
            print_event(&event)?;
        }
    }

    if let Some(remaining) = engine.notifications().remaining_ms() {
        clock.advance(remaining);
        if let Some(event) = engine.tick() {
            print_event(&event)?;
        }
    }

    println!("{}", serde_json::to_string_pretty(&engine.snapshot())?);
    Ok(())
}
