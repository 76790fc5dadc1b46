use batch_watermark::config::{self, Overrides, Settings};
use batch_watermark::export::{self, BatchJob};
use batch_watermark::imaging::{ImageBackend, RustBackend};
use batch_watermark::{output, preview, scan};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::{Level, info};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "batch-watermark")]
#[command(about = "Stamp a watermark onto a batch of images")]
#[command(long_about = "\
Stamp a watermark onto a batch of images

The watermark is scaled to a fraction of each image's width, faded to the
requested opacity and placed in one corner with a margin of 2% of the image
width. Results are written next to each other in the output directory:

  photos/dawn.jpg   →  out/dawn_watermarked.jpg
  photos/dusk.png   →  out/dusk_watermarked.png

Inputs may be files or directories. Directories contribute the png, jpg,
jpeg, bmp and gif files directly inside them.

Run 'batch-watermark gen-config' to generate a documented config.toml.")]
#[command(version)]
struct Cli {
    /// Settings file (defaults apply when omitted)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "warn", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

/// Watermark parameters that override the settings file.
#[derive(clap::Args, Clone)]
struct WatermarkArgs {
    /// Watermark image (PNG with transparency recommended)
    #[arg(long, short = 'w')]
    watermark: PathBuf,

    /// Watermark width as a fraction of image width, in (0, 1]
    #[arg(long)]
    scale: Option<f64>,

    /// Opacity from 0 (invisible) to 255 (as drawn)
    #[arg(long, allow_negative_numbers = true)]
    opacity: Option<i64>,

    /// top-left, top-right, bottom-left or bottom-right
    #[arg(long)]
    corner: Option<String>,
}

#[derive(Subcommand)]
enum Command {
    /// Watermark every input image into the output directory
    Export {
        #[command(flatten)]
        watermark: WatermarkArgs,

        /// Output directory (created if missing)
        #[arg(long, short = 'o')]
        output: PathBuf,

        /// JPEG quality (1-100)
        #[arg(long)]
        quality: Option<u32>,

        /// Write a JSON report of per-image outcomes to this file
        #[arg(long)]
        report: Option<PathBuf>,

        /// Image files or directories
        #[arg(required = true)]
        inputs: Vec<PathBuf>,
    },
    /// Render the first input with the watermark, shrunk to the preview box
    Preview {
        #[command(flatten)]
        watermark: WatermarkArgs,

        /// Where to write the preview image
        #[arg(long, default_value = "preview.png")]
        out: PathBuf,

        /// Image files or directories
        #[arg(required = true)]
        inputs: Vec<PathBuf>,
    },
    /// Print a stock config.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let level = match cli.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "error" => Level::ERROR,
        _ => Level::WARN,
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Command::Export {
            watermark,
            output: output_dir,
            quality,
            report,
            inputs,
        } => {
            let settings = resolve_settings(cli.config.as_deref(), &watermark, quality)?;
            let config = settings.watermark_config()?;
            let sources = scan::expand_inputs(&inputs)?;
            info!(count = sources.len(), "starting export");

            output::print_settings(&config);
            println!();

            let handle = export::spawn_batch(BatchJob {
                sources,
                watermark: watermark.watermark,
                config,
                output_dir: output_dir.clone(),
                quality: settings.quality(),
            });
            for event in handle.events.iter() {
                output::print_progress(&event);
            }
            let result = handle.join()?;
            output::print_summary(&result, &output_dir);

            if let Some(report) = report {
                let json = serde_json::to_string_pretty(&result)?;
                std::fs::write(&report, json)?;
                info!(path = %report.display(), "wrote report");
            }

            if result.failed > 0 {
                std::process::exit(1);
            }
        }
        Command::Preview {
            watermark,
            out,
            inputs,
        } => {
            let settings = resolve_settings(cli.config.as_deref(), &watermark, None)?;
            let config = settings.watermark_config()?;
            let sources = scan::expand_inputs(&inputs)?;

            output::print_settings(&config);
            let image = preview::render_preview(
                &sources,
                &watermark.watermark,
                &config,
                settings.preview_size(),
            )?;
            // same flattening as export, so JPEG previews encode
            let flat = image::DynamicImage::ImageRgb8(image.to_rgb8());
            RustBackend::new().save(&flat, &out, settings.quality())?;
            println!("Preview: {}", out.display());
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Load the settings file and apply command-line overrides.
fn resolve_settings(
    path: Option<&Path>,
    args: &WatermarkArgs,
    quality: Option<u32>,
) -> Result<Settings, Box<dyn std::error::Error>> {
    let overrides = Overrides {
        scale: args.scale,
        opacity: args.opacity,
        corner: args.corner.clone(),
        quality,
    };
    let settings = config::load_config(path)?.with_overrides(&overrides);
    settings.validate()?;
    Ok(settings)
}
