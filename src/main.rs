use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use stellar::{SceneConfig, demo};

/// Render the stellar scene in a window.
#[derive(Debug, Parser)]
#[command(name = "stellar", version, about)]
struct Args {
    /// Scene configuration file (defaults to ./stellar.toml when present)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Window width in logical pixels
    #[arg(long)]
    width: Option<u32>,

    /// Window height in logical pixels
    #[arg(long)]
    height: Option<u32>,

    /// Number of ambient particles
    #[arg(long, value_name = "COUNT")]
    particles: Option<u32>,

    /// Seed for the particle cloud and the generated starfield
    #[arg(long)]
    seed: Option<u64>,

    /// Print the effective configuration as TOML and exit
    #[arg(long)]
    dump_config: bool,
}

impl Args {
    fn apply(&self, config: &mut SceneConfig) {
        if let Some(width) = self.width.filter(|w| *w > 0) {
            config.window.width = width;
        }
        if let Some(height) = self.height.filter(|h| *h > 0) {
            config.window.height = height;
        }
        if let Some(count) = self.particles {
            config.particles.count = count;
        }
        if let Some(seed) = self.seed {
            config.particles.seed = seed;
            config.background.seed = seed;
        }
    }
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("stellar=info"))
        .init();

    let args = Args::parse();

    let mut config = match SceneConfig::discover(args.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            log::error!("{e}");
            return ExitCode::FAILURE;
        }
    };
    args.apply(&mut config);

    if args.dump_config {
        return match config.to_toml_string() {
            Ok(text) => {
                print!("{text}");
                ExitCode::SUCCESS
            }
            Err(e) => {
                log::error!("{e}");
                ExitCode::FAILURE
            }
        };
    }

    log::info!("starting {}", config.window.title);
    match stellar::run(config, demo::setup) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{e}");
            ExitCode::FAILURE
        }
    }
}
