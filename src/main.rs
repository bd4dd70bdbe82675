use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info};

use skyreplay::adapters::inbound::JsonEpisodeFile;
use skyreplay::adapters::outbound::{
    init_console_logger, init_file_logger, KinematicSimStub, SpawnSettingsFile, TcpSimulator,
};
use skyreplay::application::{
    PlaybackService, ReplayRequest, SpawnConfigService, TransformOverrides,
};
use skyreplay::common::ApplicationResult;
use skyreplay::domains::episode::EpisodeSource;
use skyreplay::domains::logger::DynLogger;
use skyreplay::domains::replay::{DynSimulator, FrameRange, SpawnConfigSink};
use skyreplay::Config;

#[derive(Parser)]
#[command(name = "skyreplay")]
#[command(about = "Replay recorded multi-agent flight episodes inside an external simulator")]
#[command(version)]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(long, default_value = "config.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Project spawn poses from an episode and merge them into the
    /// simulator's settings file (run before starting the simulator)
    SpawnConfig {
        /// Path to the episode JSON file
        episode: PathBuf,

        /// Override the derived scale factor
        #[arg(long)]
        scale: Option<f64>,

        /// Override the derived vertical-axis inversion
        #[arg(long)]
        invert_z: Option<bool>,

        /// Write to this settings file instead of the configured one
        #[arg(long)]
        settings_path: Option<PathBuf>,
    },
    /// Replay an episode against the running simulator
    Play {
        /// Path to the episode JSON file
        episode: PathBuf,

        /// Playback speed multiplier (1.0 = real-time)
        #[arg(long)]
        speed: Option<f64>,

        /// Override the derived scale factor
        #[arg(long)]
        scale: Option<f64>,

        /// Override the derived vertical-axis inversion
        #[arg(long)]
        invert_z: Option<bool>,

        /// First frame index to replay
        #[arg(long, default_value_t = 0)]
        start_frame: usize,

        /// Frame index to stop before (defaults to the last frame)
        #[arg(long)]
        end_frame: Option<usize>,

        /// Disable trajectory trails
        #[arg(long)]
        no_trails: bool,

        /// Disable identification markers
        #[arg(long)]
        no_markers: bool,

        /// Run against the in-memory simulator stub instead of a live
        /// connection
        #[arg(long)]
        dry_run: bool,

        /// Save the playback report to this JSON file
        #[arg(long)]
        report: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();

    let config = load_config(&cli.config).await;

    // Domain logger: file with console fallback.
    let logger: DynLogger = match init_file_logger("./replay.log") {
        Ok(logger) => logger,
        Err(err) => {
            eprintln!("Failed to initialize file logger: {}", err);
            init_console_logger()
        }
    };

    if let Err(err) = run(cli.command, config, logger).await {
        error!("replay failed: {}", err);
        std::process::exit(1);
    }
}

async fn load_config(path: &Path) -> Config {
    match Config::from_file(path).await {
        Ok(config) => {
            info!("configuration loaded from {}", path.display());
            config
        }
        Err(err) => {
            info!("using default configuration ({})", err);
            Config::default()
        }
    }
}

async fn run(command: Commands, config: Config, logger: DynLogger) -> ApplicationResult<()> {
    let episodes: Arc<dyn EpisodeSource> = Arc::new(JsonEpisodeFile::new());

    match command {
        Commands::SpawnConfig {
            episode,
            scale,
            invert_z,
            settings_path,
        } => {
            let sink: Arc<dyn SpawnConfigSink> = Arc::new(SpawnSettingsFile::new());
            let service = SpawnConfigService::new(config, episodes, sink, logger);
            let overrides = TransformOverrides { scale, invert_z };
            let poses = service
                .project_and_write(&episode, &overrides, settings_path.as_deref())
                .await?;
            info!("projected spawn poses for {} entities", poses.len());
            Ok(())
        }
        Commands::Play {
            episode,
            speed,
            scale,
            invert_z,
            start_frame,
            end_frame,
            no_trails,
            no_markers,
            dry_run,
            report,
        } => {
            let sim: DynSimulator = if dry_run {
                info!("dry run: using the in-memory simulator stub");
                Arc::new(KinematicSimStub::new())
            } else {
                Arc::new(
                    TcpSimulator::connect(&config.simulator.host, config.simulator.port).await?,
                )
            };

            let service = PlaybackService::new(config, episodes, sim, logger);
            let request = ReplayRequest {
                episode_path: episode,
                overrides: TransformOverrides { scale, invert_z },
                speed,
                range: FrameRange::new(start_frame, end_frame),
                show_trails: no_trails.then_some(false),
                show_markers: no_markers.then_some(false),
            };

            let playback = service.replay(&request).await?;
            info!(
                "run {} finished in state {:?} after {} ticks ({} failed agents)",
                playback.run_id,
                playback.state,
                playback.ticks_issued,
                playback.failed_agents.len()
            );
            if let Some(path) = report {
                service.save_report(&playback, &path).await?;
            }
            Ok(())
        }
    }
}
