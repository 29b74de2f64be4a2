use clap::{Parser, Subcommand};
use lane_watch::ad_log::PlaybackLog;
use lane_watch::catalog::{self, AdsConfig};
use lane_watch::config::{PortalPaths, StreamsConfig};
use lane_watch::playback::ObsSink;
use lane_watch::watchdog::Watchdog;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "lanewatch", about = "Bowling broadcast ad watchdog")]
struct Cli {
    /// Portal directory holding config, ads, and logs.
    #[arg(long, env = "LANEWATCH_PORTAL")]
    portal: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the watchdog for one lane pair until killed
    Run {
        /// Lane-pair index into the stream configuration (0-based)
        #[arg(long)]
        pair: usize,
    },
    /// Show configuration and catalog summary
    Status,
    /// Show playback-log play counts, or export the raw log
    Log {
        /// Emit the full log as CSV on stdout
        #[arg(long)]
        csv: bool,
    },
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let paths = cli.portal.map(PortalPaths::new).unwrap_or_default();

    match cli.command {
        Commands::Run { pair } => {
            let streams = StreamsConfig::load(&paths.streams_config());
            let Some(lane_pair) = streams.lane_pairs.get(pair).cloned() else {
                eprintln!(
                    "Error: pair index {} out of range ({} pair(s) configured)",
                    pair,
                    streams.lane_pairs.len()
                );
                std::process::exit(1);
            };

            let cfg = AdsConfig::load(&paths.ads_config());
            let ads = catalog::load_ads(&paths.ads_metadata());
            log::info!(
                "Pair {} ({}): {:?} mode, {} ad(s) in catalog",
                pair,
                lane_pair.name,
                cfg.mode,
                ads.len()
            );

            let mut sink = ObsSink::new(
                streams.obs.clone(),
                paths.ads_dir(),
                PlaybackLog::new(paths.playback_log()),
            );
            let mut watchdog = match Watchdog::new(lane_pair, cfg, ads, paths.ads_dir()) {
                Ok(w) => w,
                Err(e) => {
                    eprintln!("Error: {}", e);
                    std::process::exit(1);
                }
            };
            watchdog.run(&mut sink);
        }
        Commands::Status => {
            let streams = StreamsConfig::load(&paths.streams_config());
            let cfg = AdsConfig::load(&paths.ads_config());
            let ads = catalog::load_ads(&paths.ads_metadata());

            println!("lanewatch v{}", env!("CARGO_PKG_VERSION"));
            println!(
                "Portal: {} | Mode: {:?} | Ads: {}",
                paths.root.display(),
                cfg.mode,
                ads.len()
            );
            if streams.lane_pairs.is_empty() {
                println!("No lane pairs configured.");
                return;
            }
            println!(
                "{:<4} {:<8} {:<9} {:<12} Sources",
                "Idx", "Pair", "Enabled", "Scoring"
            );
            for (i, pair) in streams.lane_pairs.iter().enumerate() {
                let enabled = if pair.enabled { "on" } else { "off" };
                println!(
                    "{:<4} {:<8} {:<9} {:<12} {} | {}",
                    i,
                    pair.name,
                    enabled,
                    pair.scoring_type,
                    pair.odd_lane_scoring_source,
                    pair.even_lane_scoring_source
                );
            }
        }
        Commands::Log { csv } => {
            let log = PlaybackLog::new(paths.playback_log());
            if csv {
                print!("{}", log.export_csv());
                return;
            }
            let counts = log.play_counts();
            if counts.is_empty() {
                println!("No ad playbacks recorded.");
                return;
            }
            println!("{:<30} Plays", "Ad");
            println!("{}", "-".repeat(40));
            for (name, count) in counts {
                println!("{:<30} {}", name, count);
            }
        }
    }
}
