use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Parser, Subcommand};
use rand::rngs::SmallRng;
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use memory_galaxy::io::{load_config, read_items};
use memory_galaxy::{
    CameraPose, GalaxyConfig, GalaxyScene, MediaKind, Placement, RngSource, SceneEvent,
};

mod server;

/// Spatial layout and interaction engine for a personal memory galaxy.
#[derive(Parser)]
#[command(name = "galaxy")]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file (.yaml or .json)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Seed for reproducible fallback placement and dreaming
    #[arg(long, global = true)]
    seed: Option<u64>,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve node positions and the framed camera pose
    Layout {
        /// Item list (.json or .yaml)
        #[arg(short, long)]
        input: PathBuf,

        /// Write the layout here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Run the scene headless and report dreaming statistics
    Simulate {
        /// Item list (.json or .yaml)
        #[arg(short, long)]
        input: PathBuf,

        /// Simulated scene time in seconds
        #[arg(long, default_value = "120")]
        seconds: u64,

        /// Frames per simulated second
        #[arg(long, default_value = "30")]
        fps: u32,
    },
    /// Start development server with a live scene
    Serve {
        /// Item list (.json or .yaml), reloaded on change
        #[arg(short, long)]
        input: PathBuf,

        /// Port to run the server on
        #[arg(short, long, default_value = "3000")]
        port: u16,

        /// Directory of static front-end assets
        #[arg(long)]
        assets: Option<PathBuf>,
    },
}

#[derive(Debug, Serialize)]
struct LayoutNode {
    id: String,
    kind: MediaKind,
    coordinate: [f32; 3],
    placement: Placement,
}

#[derive(Debug, Serialize)]
struct LayoutReport {
    camera: CameraPose,
    nodes: Vec<LayoutNode>,
}

#[derive(Debug, Serialize)]
struct SimulationReport {
    nodes: usize,
    seconds: u64,
    frames: u64,
    polls: u64,
    camera: CameraPose,
    entry_probability: f64,
    /// Attention entries per node per poll
    observed_entry_rate: f64,
    max_simultaneous: usize,
    attention_entries: BTreeMap<String, u64>,
}

fn rng(seed: Option<u64>) -> RngSource<SmallRng> {
    seed.map(RngSource::seeded)
        .unwrap_or_else(RngSource::from_entropy)
}

fn mount(config: GalaxyConfig, seed: Option<u64>) -> GalaxyScene {
    GalaxyScene::mount(config, rng(seed), |_| {})
}

fn layout(
    input: &Path,
    config: GalaxyConfig,
    seed: Option<u64>,
    output: Option<&Path>,
) -> anyhow::Result<()> {
    let items = read_items(input)?;
    let mut scene = mount(config, seed);
    scene.load(items);

    let report = LayoutReport {
        camera: scene.camera().pose(),
        nodes: scene
            .nodes()
            .iter()
            .map(|n| LayoutNode {
                id: n.id().to_string(),
                kind: n.item.kind,
                coordinate: n.coordinate,
                placement: n.placement,
            })
            .collect(),
    };
    let json = serde_json::to_string_pretty(&report)?;

    match output {
        Some(path) => {
            fs::write(path, json)?;
            println!(
                "Wrote layout for {} nodes to {}",
                report.nodes.len(),
                path.display()
            );
        }
        None => println!("{json}"),
    }
    Ok(())
}

fn simulate(
    input: &Path,
    mut config: GalaxyConfig,
    seed: Option<u64>,
    seconds: u64,
    fps: u32,
) -> anyhow::Result<()> {
    anyhow::ensure!(fps > 0, "fps must be positive");
    // Stars are irrelevant headless
    config.backdrop.star_count = 0;
    let interval = config.attention.interval();
    let entry_probability = config.attention.entry_probability();

    let items = read_items(input)?;
    let mut scene = mount(config, seed);
    scene.load(items);

    let mut entries: BTreeMap<String, u64> = scene
        .nodes()
        .iter()
        .map(|n| (n.id().to_string(), 0))
        .collect();
    let mut max_simultaneous = 0;

    let frames = seconds * u64::from(fps);
    for frame in 0..=frames {
        let now = frame_time(seconds, frame, frames);
        scene.advance(now);
        for event in scene.drain_events() {
            if let SceneEvent::AttentionStarted { id, .. } = event {
                *entries.entry(id).or_default() += 1;
            }
        }
        let shown = scene.states().iter().filter(|s| s.attention()).count();
        max_simultaneous = max_simultaneous.max(shown);
    }

    let polls = (seconds * 1000) / interval.as_millis().max(1) as u64;
    let total: u64 = entries.values().sum();
    let trials = polls * scene.nodes().len() as u64;
    let report = SimulationReport {
        nodes: scene.nodes().len(),
        seconds,
        frames,
        polls,
        camera: scene.camera().pose(),
        entry_probability,
        observed_entry_rate: if trials == 0 {
            0.0
        } else {
            total as f64 / trials as f64
        },
        max_simultaneous,
        attention_entries: entries,
    };
    scene.teardown();

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

/// Scene time of `frame` out of `frames` spread evenly over `seconds`;
/// the last frame lands exactly on `seconds`
fn frame_time(seconds: u64, frame: u64, frames: u64) -> Duration {
    if frames == 0 {
        return Duration::ZERO;
    }
    let nanos = u128::from(seconds) * 1_000_000_000 * u128::from(frame) / u128::from(frames);
    Duration::from_nanos(u64::try_from(nanos).unwrap_or(u64::MAX))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Layout { input, output } => {
            layout(&input, config, cli.seed, output.as_deref())?;
        }
        Commands::Simulate {
            input,
            seconds,
            fps,
        } => {
            simulate(&input, config, cli.seed, seconds, fps)?;
        }
        Commands::Serve {
            input,
            port,
            assets,
        } => {
            server::serve(&input, config, rng(cli.seed), port, assets.as_deref()).await?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_layout_command() {
        let cli = Cli::try_parse_from(["galaxy", "layout", "-i", "items.json", "--seed", "7"])
            .unwrap();
        assert_eq!(cli.seed, Some(7));
        match cli.command {
            Commands::Layout { input, output } => {
                assert_eq!(input, PathBuf::from("items.json"));
                assert!(output.is_none());
            }
            _ => panic!("expected layout"),
        }
    }

    #[test]
    fn simulate_has_defaults() {
        let cli = Cli::try_parse_from(["galaxy", "simulate", "--input", "items.yaml"]).unwrap();
        match cli.command {
            Commands::Simulate { seconds, fps, .. } => {
                assert_eq!(seconds, 120);
                assert_eq!(fps, 30);
            }
            _ => panic!("expected simulate"),
        }
    }

    #[test]
    fn serve_accepts_port_and_assets() {
        let cli = Cli::try_parse_from([
            "galaxy", "serve", "-i", "items.json", "-p", "8080", "--assets", "web",
        ])
        .unwrap();
        match cli.command {
            Commands::Serve { port, assets, .. } => {
                assert_eq!(port, 8080);
                assert_eq!(assets, Some(PathBuf::from("web")));
            }
            _ => panic!("expected serve"),
        }
    }

    #[test]
    fn config_flag_is_global() {
        let cli = Cli::try_parse_from(["galaxy", "layout", "-i", "a.json", "-c", "galaxy.yaml"])
            .unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("galaxy.yaml")));
    }

    #[test]
    fn last_frame_lands_on_end_time() {
        assert_eq!(frame_time(60, 1800, 1800), Duration::from_secs(60));
        assert_eq!(frame_time(1, 1, 3), Duration::from_nanos(333_333_333));
        assert_eq!(frame_time(0, 0, 0), Duration::ZERO);
    }

    #[test]
    fn input_is_required() {
        assert!(Cli::try_parse_from(["galaxy", "layout"]).is_err());
    }
}
