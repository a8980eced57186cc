use std::path::PathBuf;

use anyhow::Context as _;
use clap::Parser;
use slidecast::{PipelineOpts, PiperSynthesizer, RenderConfig, run_pipeline};

/// Turn a folder of images and a narration script into a narrated slideshow
/// video (requires `ffmpeg` and a Piper TTS install).
#[derive(Parser, Debug)]
#[command(name = "slidecast", version)]
struct Cli {
    /// Folder of source images (.jpg/.jpeg/.png/.webp), ordered by path.
    #[arg(long)]
    images: PathBuf,

    /// Narration script JSON: {"script_lines": ["...", ...]}.
    #[arg(long)]
    script: PathBuf,

    /// Output video path.
    #[arg(long, default_value = "final_video.mp4")]
    out: PathBuf,

    /// Piper voice model (.onnx).
    #[arg(long)]
    model: PathBuf,

    /// Explicit piper binary; searched on PATH when unset.
    #[arg(long)]
    piper_bin: Option<PathBuf>,

    /// Speaker id for multi-speaker voice models.
    #[arg(long, default_value = "")]
    voice: String,

    /// Output width in pixels.
    #[arg(long, default_value_t = 1920)]
    width: u32,

    /// Output height in pixels.
    #[arg(long, default_value_t = 1080)]
    height: u32,

    /// Output frame rate.
    #[arg(long, default_value_t = 24)]
    fps: u32,

    /// Final factor of the slow zoom-in (1.05 subtle, 1.15 stronger).
    #[arg(long, default_value_t = 1.05)]
    zoom: f64,

    /// Caption font size in pixels.
    #[arg(long, default_value_t = 46)]
    font_size: u32,

    /// Explicit caption font file; system fonts when unset.
    #[arg(long)]
    font_file: Option<PathBuf>,

    /// Parent directory for the run workspace; system temp dir when unset.
    #[arg(long)]
    work_dir: Option<PathBuf>,

    /// Leave the run workspace on disk (debugging aid).
    #[arg(long)]
    keep_workspace: bool,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();

    let synth = match &cli.piper_bin {
        Some(bin) => PiperSynthesizer::with_binary(bin, &cli.model),
        None => PiperSynthesizer::new(&cli.model).context("locate speech engine")?,
    };

    let cfg = RenderConfig {
        width: cli.width,
        height: cli.height,
        fps: cli.fps,
        zoom_factor: cli.zoom,
        font_size: cli.font_size,
        font_file: cli.font_file,
        overwrite: true,
    };
    let opts = PipelineOpts {
        voice: cli.voice,
        work_dir: cli.work_dir,
        keep_workspace: cli.keep_workspace,
    };

    run_pipeline(&cli.images, &cli.script, &cli.out, &synth, &cfg, &opts)?;
    eprintln!("wrote {}", cli.out.display());
    Ok(())
}
