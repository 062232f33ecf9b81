//! Command-line interface for rastervec-core
//!
//! Loads an image, thresholds it into a binary raster, traces it, and
//! writes the result as SVG.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use rastervec_core::{trace_bitmap, Bitmap, TraceConfig, TurnPolicy};

mod svg;

#[derive(Parser)]
#[command(name = "rastervec")]
#[command(about = "Trace bitmap images into vector outlines")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Number of threads to use (default: auto-detect)
    #[arg(short, long)]
    threads: Option<usize>,
}

#[derive(Subcommand)]
enum Commands {
    /// Trace an image into an SVG file
    Trace {
        /// Input image file
        input: PathBuf,

        /// Output SVG file
        output: PathBuf,

        /// Configuration JSON file (optional)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Luminance threshold (0-255); darker pixels are foreground
        #[arg(long, default_value = "128")]
        threshold: u8,

        /// Treat lighter pixels as foreground instead
        #[arg(long)]
        invert: bool,

        /// Drop contours with area up to this many pixels
        #[arg(long)]
        turdsize: Option<i64>,

        /// Ambiguity policy: black, white, left, right, majority, minority, random
        #[arg(long)]
        turnpolicy: Option<String>,

        /// Corner threshold (0 = polygon, 1.334 = no corners)
        #[arg(long)]
        alphamax: Option<f64>,

        /// Curve optimization tolerance (0 disables optimization)
        #[arg(long)]
        opttolerance: Option<f64>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    // Configure rayon thread pool if specified
    if let Some(threads) = cli.threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
            .context("Failed to initialize thread pool")?;
        log::info!("Using {threads} threads for parallel processing");
    }

    match cli.command {
        Commands::Trace {
            input,
            output,
            config,
            threshold,
            invert,
            turdsize,
            turnpolicy,
            alphamax,
            opttolerance,
        } => trace_command(
            input,
            output,
            config,
            threshold,
            invert,
            turdsize,
            turnpolicy,
            alphamax,
            opttolerance,
        ),
    }
}

#[allow(clippy::too_many_arguments)]
fn trace_command(
    input: PathBuf,
    output: PathBuf,
    config_path: Option<PathBuf>,
    threshold: u8,
    invert: bool,
    turdsize: Option<i64>,
    turnpolicy: Option<String>,
    alphamax: Option<f64>,
    opttolerance: Option<f64>,
) -> Result<()> {
    log::info!("Loading image: {}", input.display());
    let img = image::open(&input)
        .with_context(|| format!("Failed to open image: {}", input.display()))?
        .to_luma8();
    let (width, height) = img.dimensions();

    // Load or create configuration, then apply CLI overrides
    let mut config = if let Some(config_path) = config_path {
        load_config(&config_path)?
    } else {
        TraceConfig::default()
    };
    if let Some(v) = turdsize {
        config.turdsize = v;
    }
    if let Some(name) = turnpolicy {
        config.turnpolicy = parse_turnpolicy(&name)?;
    }
    if let Some(v) = alphamax {
        config.alphamax = v;
    }
    if let Some(v) = opttolerance {
        config.opttolerance = v;
    }

    let bitmap = threshold_to_bitmap(&img, threshold, invert)?;
    log::info!(
        "Thresholded {}x{} image at {} ({} foreground pixels)",
        width,
        height,
        threshold,
        bitmap.count_set()
    );

    let start = Instant::now();
    let trace = trace_bitmap(&bitmap, &config).context("Tracing failed")?;
    log::info!(
        "Traced {} outlines in {:.2}ms",
        trace.node_count(),
        start.elapsed().as_secs_f64() * 1000.0
    );

    let svg = svg::render_document(&trace, width, height);
    fs::write(&output, svg)
        .with_context(|| format!("Failed to write SVG: {}", output.display()))?;
    log::info!("Wrote {}", output.display());
    Ok(())
}

/// Pack a grayscale image into a bit-packed raster. The image's top row is
/// the bitmap's highest row: the core's y axis points up.
fn threshold_to_bitmap(
    img: &image::GrayImage,
    threshold: u8,
    invert: bool,
) -> Result<Bitmap> {
    let (width, height) = img.dimensions();
    let mut bitmap = Bitmap::new(width as usize, height as usize)
        .map_err(|e| anyhow::anyhow!("{e}"))?;
    for (x, y, pixel) in img.enumerate_pixels() {
        let dark = pixel.0[0] < threshold;
        if dark != invert {
            bitmap.set(x as i32, (height - 1 - y) as i32);
        }
    }
    Ok(bitmap)
}

fn parse_turnpolicy(name: &str) -> Result<TurnPolicy> {
    Ok(match name.to_ascii_lowercase().as_str() {
        "black" => TurnPolicy::Black,
        "white" => TurnPolicy::White,
        "left" => TurnPolicy::Left,
        "right" => TurnPolicy::Right,
        "majority" => TurnPolicy::Majority,
        "minority" => TurnPolicy::Minority,
        "random" => TurnPolicy::Random,
        other => bail!("Unknown turn policy: {other}"),
    })
}

fn load_config(path: &PathBuf) -> Result<TraceConfig> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config: {}", path.display()))?;
    let config: TraceConfig = serde_json::from_str(&contents)
        .with_context(|| format!("Failed to parse config: {}", path.display()))?;
    Ok(config)
}
