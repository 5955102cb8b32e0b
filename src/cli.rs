// ============================================================================
// rasterlayers CLI — stack image files as layers and write the flattened result
// ============================================================================
//
// Usage examples:
//   rasterlayers -l base.png -l overlay.png@40 -o out.png
//   rasterlayers -l "frames/*.png@25" --size 640x480 --gamma -o out.webp
//   rasterlayers -l bg.jpg -l logo.png:12,8 --tiled -o debug.png
//
// Layers are stacked in the order given, first one at the bottom.

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Instant;

use clap::Parser;

use crate::error::{Error, Result};
use crate::image::Image;
use crate::io::{self, ExportFormat};
use crate::layer::Layer;
use crate::raster::{Raster, Size};
use crate::settings::{ComposerKind, Settings};
use crate::{log_err, log_info, logger};

// ============================================================================
// CLI argument definition (clap Derive)
// ============================================================================

/// One `--layer` argument: a path or glob, an optional opacity and offset.
#[derive(Clone, Debug, PartialEq)]
pub struct LayerSpec {
    pub pattern: String,
    pub opacity: f32,
    pub offset: (i32, i32),
}

/// Layer stack compositor.
#[derive(Parser, Debug)]
#[command(
    name = "rasterlayers",
    version,
    about = "Stack image files as layers and export the merged result",
    long_about = "Load image files as layers (bottom to top), blend them with per-layer\n\
                  opacity and write the flattened image. Supports PNG, JPEG, GIF,\n\
                  WebP and BMP output.\n\n\
                  Example:\n  \
                  rasterlayers -l base.png -l overlay.png@40 -o out.png\n  \
                  rasterlayers -l \"tiles/*.png\" --tiled -o overview.png"
)]
pub struct CliArgs {
    /// Layer input as PATH[@OPACITY][:X,Y]. Repeatable; glob patterns accepted.
    #[arg(short, long = "layer", required = true, value_name = "SPEC", value_parser = parse_layer_spec)]
    pub layers: Vec<LayerSpec>,

    /// Output file path.
    #[arg(short, long, value_name = "FILE")]
    pub output: PathBuf,

    /// Output format: png, jpeg, gif, webp, bmp. Inferred from --output when omitted.
    #[arg(short, long, value_name = "FORMAT")]
    pub format: Option<String>,

    /// JPEG quality (1–100).
    #[arg(short, long, default_value_t = io::DEFAULT_JPEG_QUALITY, value_name = "1-100")]
    pub quality: u8,

    /// Canvas size as WxH. Defaults to the first layer's size.
    #[arg(long, value_name = "WxH", value_parser = parse_size)]
    pub size: Option<Size>,

    /// Blend partial opacities in linear light.
    #[arg(long)]
    pub gamma: bool,

    /// Lay layers out side by side instead of blending them.
    #[arg(long)]
    pub tiled: bool,

    /// Settings file (key=value). Command-line flags take precedence.
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Print per-layer and timing information.
    #[arg(short, long)]
    pub verbose: bool,
}

// ============================================================================
// Public entry point
// ============================================================================

/// Run the CLI and return an OS exit code: `0` on success, `1` on failure.
pub fn run(args: CliArgs) -> ExitCode {
    let settings = match effective_settings(&args) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = logger::init(settings.log_file.as_deref()) {
        eprintln!("warning: could not open log file: {}", e);
    }

    let started = Instant::now();
    match compose(&args, &settings) {
        Ok(format) => {
            log_info!("cli: wrote {} in {:.0}ms", args.output.display(), started.elapsed().as_secs_f64() * 1000.0);
            if args.verbose {
                println!(
                    "  → {} [{}] ({:.0}ms)",
                    args.output.display(),
                    format,
                    started.elapsed().as_secs_f64() * 1000.0
                );
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            log_err!("cli: {}", e);
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

// ============================================================================
// Pipeline
// ============================================================================

/// Settings file (if any) with command-line overrides applied.
fn effective_settings(args: &CliArgs) -> Result<Settings> {
    let mut settings = match &args.config {
        Some(path) => Settings::load(path)?,
        None => Settings::default(),
    };
    if args.gamma {
        settings.gamma_blending = true;
    }
    if args.tiled {
        settings.composer = ComposerKind::Tiled;
    }
    Ok(settings)
}

fn compose(args: &CliArgs, settings: &Settings) -> Result<ExportFormat> {
    let format = match &args.format {
        Some(name) => name.parse()?,
        None => ExportFormat::from_path(&args.output).unwrap_or_default(),
    };

    let mut inputs: Vec<(PathBuf, Raster, &LayerSpec)> = Vec::new();
    for spec in &args.layers {
        for path in resolve_inputs(&spec.pattern) {
            let raster = io::decode_file(&path)?;
            inputs.push((path, raster, spec));
        }
    }
    let Some((_, first, _)) = inputs.first() else {
        return Err(Error::invalid("no input files matched the given layer pattern(s)"));
    };

    let size = args.size.unwrap_or_else(|| first.size());
    let mut image = Image::blank(size.width, size.height)?;
    image.set_composer_boxed(settings.build_composer());

    let total = inputs.len();
    for (idx, (path, raster, spec)) in inputs.into_iter().enumerate() {
        if args.verbose {
            println!("[{}/{}] {} @ {}%", idx + 1, total, path.display(), spec.opacity);
        }
        let (x, y) = spec.offset;
        let mut layer = Layer::from_raster(raster);
        layer.name = display_name(&path);
        layer.set_opacity(spec.opacity);
        // Attaching crops to the canvas, so the offset has to be known first.
        let placed = layer.dimensions();
        layer.set_surface_dimensions(placed.width, placed.height, x, y);
        image.layer_put_top(layer);
    }

    image.export()?.as_file(&args.output, format, Some(args.quality))?;
    Ok(format)
}

// ============================================================================
// Helpers
// ============================================================================

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Expand a glob pattern, or pass a literal path through unchanged.
fn resolve_inputs(pattern: &str) -> Vec<PathBuf> {
    let as_path = Path::new(pattern);
    if as_path.exists() {
        return vec![as_path.to_path_buf()];
    }

    match glob::glob(pattern) {
        Ok(entries) => {
            let mut result: Vec<PathBuf> = entries.flatten().collect();
            result.sort();
            if result.is_empty() {
                // Let the decoder report the missing file.
                result.push(as_path.to_path_buf());
            }
            result
        }
        Err(e) => {
            eprintln!("warning: invalid glob '{}': {}", pattern, e);
            vec![as_path.to_path_buf()]
        }
    }
}

/// Parse `PATH[@OPACITY][:X,Y]`. Suffixes are only taken when they parse, so
/// paths containing `@` or `:` survive.
pub fn parse_layer_spec(s: &str) -> std::result::Result<LayerSpec, String> {
    let mut rest = s.trim();
    if rest.is_empty() {
        return Err("empty layer spec".to_string());
    }

    let mut offset = (0, 0);
    if let Some((head, tail)) = rest.rsplit_once(':')
        && let Some((x, y)) = tail.split_once(',')
        && let (Ok(x), Ok(y)) = (x.trim().parse::<i32>(), y.trim().parse::<i32>())
    {
        offset = (x, y);
        rest = head;
    }

    let mut opacity = 100.0;
    if let Some((head, tail)) = rest.rsplit_once('@')
        && let Ok(pct) = tail.trim().trim_end_matches('%').parse::<f32>()
    {
        if !(0.0..=100.0).contains(&pct) {
            return Err(format!("opacity {} is outside 0–100", pct));
        }
        opacity = pct;
        rest = head;
    }

    if rest.is_empty() {
        return Err(format!("layer spec '{}' has no path", s));
    }
    Ok(LayerSpec { pattern: rest.to_string(), opacity, offset })
}

/// Parse `WxH` (also accepts `×`).
pub fn parse_size(s: &str) -> std::result::Result<Size, String> {
    let lower = s.trim().to_ascii_lowercase();
    let (w, h) = lower
        .split_once('x')
        .or_else(|| lower.split_once('×'))
        .ok_or_else(|| format!("size '{}' is not WxH", s))?;
    let w: u32 = w.trim().parse().map_err(|_| format!("bad width in '{}'", s))?;
    let h: u32 = h.trim().parse().map_err(|_| format!("bad height in '{}'", s))?;
    if w == 0 || h == 0 {
        return Err(format!("size '{}' must be non-zero", s));
    }
    Ok(Size::new(w, h))
}
