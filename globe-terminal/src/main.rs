/// Globe Terminal Demo - rotating wireframe cube and earth sphere
///
/// Controls:
///   - Left-drag: Spin the globe
///   - Q/ESC/Ctrl-C: Quit
///
/// Log output goes to stderr; redirect it (`2>globe.log`) when raising
/// `RUST_LOG` above the default.
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use globe_core::texture::load_ppm;
use globe_terminal::{AppConfig, TerminalApp};
use log::{info, warn};

#[derive(Parser)]
#[command(name = "globe-terminal", about = "Rotating globe rendered in the terminal")]
struct Cli {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Earth texture (binary or ASCII PPM); overrides `scene.texture`
    #[arg(short, long)]
    texture: Option<PathBuf>,

    /// Target frames per second; overrides `terminal.target_fps`
    #[arg(long)]
    fps: Option<u32>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let mut config = match &cli.config {
        Some(path) => AppConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => AppConfig::default(),
    };
    if let Some(texture) = &cli.texture {
        config.globe.scene.texture = texture.display().to_string();
    }
    if let Some(fps) = cli.fps {
        config.terminal.target_fps = fps;
    }

    // A missing texture leaves the sphere untextured rather than aborting
    let texture = match load_ppm(&config.globe.scene.texture) {
        Ok(texture) => {
            info!(
                "loaded texture {} ({}x{})",
                config.globe.scene.texture,
                texture.width(),
                texture.height()
            );
            Some(texture)
        }
        Err(err) => {
            warn!("texture unavailable, drawing sphere untextured: {}", err);
            None
        }
    };

    let mut app = TerminalApp::new(config, texture).context("initializing terminal")?;
    app.run().context("running frame loop")?;

    Ok(())
}
