use anyhow::Result;
use clap::{Parser, Subcommand};
use matchmaker::{
    InitialRoster, MatchmakerHandle, QueueDepths, SchedulerConfig, SlotEvent, SlotSnapshot,
};
use serde::Serialize;
use tracing::{info, Level};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "matchmaker")]
#[command(about = "Role-queue matchmaking scheduler")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Match the given participants into groups and run them to completion
    Run {
        /// Maximum number of concurrently running groups
        #[arg(long, default_value_t = 3, env = "MATCHMAKER_CAP")]
        cap: usize,
        /// Number of tank participants to queue
        #[arg(long, default_value_t = 0)]
        tanks: u32,
        /// Number of healer participants to queue
        #[arg(long, default_value_t = 0)]
        healers: u32,
        /// Number of damage participants to queue
        #[arg(long, default_value_t = 0)]
        damage: u32,
        /// Minimum run duration in seconds
        #[arg(long, default_value_t = 1)]
        min_duration: u64,
        /// Maximum run duration in seconds
        #[arg(long, default_value_t = 5)]
        max_duration: u64,
        /// Emit the final report as JSON instead of text
        #[arg(long, default_value_t = false)]
        json: bool,
    },
}

/// Final statistics assembled from the handle's snapshots once Stopped.
#[derive(Debug, Serialize)]
struct FinalReport {
    slots: Vec<SlotSnapshot>,
    total_runs: u64,
    total_secs: u64,
    unmatched: QueueDepths,
}

impl FinalReport {
    async fn collect(handle: &MatchmakerHandle) -> Self {
        let slots = handle.slot_snapshot().await;
        let total_runs = slots.iter().map(|slot| slot.completed_runs).sum();
        let total_secs = slots.iter().map(|slot| slot.cumulative_secs).sum();
        let unmatched = handle.queue_depths().await;
        Self {
            slots,
            total_runs,
            total_secs,
            unmatched,
        }
    }

    fn print_text(&self) {
        println!();
        println!("Final statistics");
        println!("----------------");
        for slot in &self.slots {
            println!(
                "  slot {} | {} groups | {}s total",
                slot.id, slot.completed_runs, slot.cumulative_secs
            );
        }
        println!("  total groups: {}", self.total_runs);
        println!("  combined time: {}s", self.total_secs);

        if self.unmatched.total() > 0 {
            println!();
            println!("Participants still queued");
            println!("  tanks:   {}", self.unmatched.tanks);
            println!("  healers: {}", self.unmatched.healers);
            println!("  damage:  {}", self.unmatched.damage);
        } else {
            println!("  all participants matched");
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("matchmaker=info".parse()?),
        )
        .with_max_level(Level::INFO)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            cap,
            tanks,
            healers,
            damage,
            min_duration,
            max_duration,
            json,
        } => {
            let config = SchedulerConfig::new(cap, min_duration, max_duration)?;
            let roster = InitialRoster::new(tanks, healers, damage);

            let handle = matchmaker::start(config, roster)?;

            // Event-driven status display: one line per slot transition
            // instead of polling the slot table on an interval.
            let mut events = handle.subscribe();
            let display = tokio::spawn(async move {
                loop {
                    match events.recv().await {
                        Ok(SlotEvent::Occupied { slot_id, group_id }) => {
                            println!("[>] group {group_id} -> slot {slot_id}");
                        }
                        Ok(SlotEvent::Released {
                            slot_id,
                            group_id,
                            elapsed_secs,
                        }) => {
                            println!("[=] group {group_id} cleared slot {slot_id} ({elapsed_secs}s)");
                        }
                        Ok(SlotEvent::Stopped) => break,
                        // A lagged display skips ahead; a closed channel means
                        // the scheduler is gone either way.
                        Err(tokio::sync::broadcast::error::RecvError::Lagged(_)) => continue,
                        Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
                    }
                }
            });

            // No participants arrive after start, so drain immediately: the
            // scheduler keeps launching until the queues can no longer
            // produce a full group, then stops.
            handle.request_shutdown().await;
            handle.await_stopped().await;
            display.await?;

            info!("matchmaking complete");

            let report = FinalReport::collect(&handle).await;
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                report.print_text();
            }
        }
    }

    Ok(())
}
