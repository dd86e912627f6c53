use std::path::PathBuf;

use auto_clicker::{Config, load_image, match_image, match_image_multi_scale};
use clap::{Parser, Subcommand};
use color_print::cprintln;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(version, about = "Template matching for screen automation")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Find TEMPLATE inside SOURCE and print the best score and location
    Match {
        source: PathBuf,
        template: PathBuf,
        /// TOML file with `[matcher]` and `[multi_scale]` tables
        #[arg(long)]
        config: Option<PathBuf>,
        /// Overrides the configured threshold
        #[arg(long)]
        threshold: Option<f32>,
        /// Also try the template at the configured scales
        #[arg(long)]
        multi_scale: bool,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Match {
            source,
            template,
            config,
            threshold,
            multi_scale,
        } => {
            let mut config = match config {
                Some(path) => Config::load(path)?,
                None => Config::default(),
            };
            if let Some(threshold) = threshold {
                config.matcher.threshold = threshold;
            }
            debug!("{config:?}");

            let screen = load_image(&source)?;
            let template = load_image(&template)?;
            info!(
                "matching {}x{} template on {}x{} source using {}",
                template.width(),
                template.height(),
                screen.width(),
                screen.height(),
                config.matcher.method
            );

            if multi_scale {
                let res = match_image_multi_scale(&screen, &template, &config)?;
                let found = config.matcher.accepts(res.score);
                print_result(found, res.score, res.x, res.y);
                cprintln!("<dim>scale: {}</dim>", res.scale);
            } else {
                let res = match_image(&screen, &template, &config.matcher)?;
                let found = config.matcher.accepts(res.score);
                print_result(found, res.score, res.x, res.y);
            }
        }
    }
    Ok(())
}

fn print_result(found: bool, score: f32, x: f32, y: f32) {
    if found {
        cprintln!("<green>found</green> score: {score:.4} at ({x}, {y})");
    } else {
        cprintln!("<yellow>not found</yellow> best score: {score:.4} at ({x}, {y})");
    }
}
