use std::{
    ffi::OsString,
    path::{Path, PathBuf},
    process::{Command, Stdio},
};

use anyhow::Context as _;
use tracing::{info, warn};

use crate::{
    caption::{escape_drawtext, wrap_caption},
    error::{SlidecastError, SlidecastResult},
    model::{RenderConfig, SceneDescriptor},
    workspace::Workspace,
};

/// How the concat demuxer joins the per-scene segments.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConcatMode {
    /// Join without re-encoding; valid only while all segments share
    /// compatible codec parameters.
    StreamCopy,
    /// Full re-encode; slower, but tolerates parameter mismatches.
    Reencode,
}

pub fn is_ffmpeg_on_path() -> bool {
    Command::new("ffmpeg")
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

pub fn ensure_parent_dir(path: &Path) -> SlidecastResult<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create output directory '{}'", parent.display()))?;
    }
    Ok(())
}

/// Renders per-scene MP4 segments through an ffmpeg subprocess and
/// concatenates them into the final output.
///
/// We intentionally use the system `ffmpeg` binary rather than `ffmpeg-next`
/// to avoid native FFmpeg dev header/lib requirements.
pub struct FfmpegRenderer {
    cfg: RenderConfig,
    ffmpeg: PathBuf,
}

impl FfmpegRenderer {
    pub fn new(cfg: RenderConfig) -> SlidecastResult<Self> {
        cfg.validate()?;
        if !is_ffmpeg_on_path() {
            return Err(SlidecastError::encoding(
                "ffmpeg is required for MP4 encoding, but was not found on PATH",
            ));
        }
        Ok(Self {
            cfg,
            ffmpeg: PathBuf::from("ffmpeg"),
        })
    }

    /// Use an explicit encoder binary instead of `ffmpeg` from PATH.
    pub fn with_ffmpeg_binary(mut self, binary: impl Into<PathBuf>) -> Self {
        self.ffmpeg = binary.into();
        self
    }

    /// Encode every scene to a segment, then concatenate into `out_path`.
    ///
    /// Segments are rendered one at a time and each scene's still is deleted
    /// as soon as its segment exists, so peak disk stays bounded by a single
    /// scene. Stream-copy concatenation is tried first; on failure one full
    /// re-encode is attempted, and a failure of the fallback is fatal.
    pub fn render(
        &self,
        scenes: &[SceneDescriptor],
        workspace: &Workspace,
        out_path: &Path,
    ) -> SlidecastResult<()> {
        if scenes.is_empty() {
            return Err(SlidecastError::validation("no scenes to render"));
        }
        ensure_parent_dir(out_path)?;
        if !self.cfg.overwrite && out_path.exists() {
            return Err(SlidecastError::validation(format!(
                "output file '{}' already exists",
                out_path.display()
            )));
        }

        let mut segments = Vec::with_capacity(scenes.len());
        for (idx, scene) in scenes.iter().enumerate() {
            let segment = workspace
                .scenes_dir()
                .join(format!("scene_{:03}.mp4", idx + 1));
            info!(
                scene = idx + 1,
                total = scenes.len(),
                segment = %segment.display(),
                "rendering scene segment"
            );
            self.encode_segment(scene, &segment)?;

            // The still is not needed once its segment exists.
            if let Err(e) = std::fs::remove_file(&scene.still) {
                warn!(still = %scene.still.display(), error = %e, "failed to delete scene still");
            }
            segments.push(segment);
        }

        let manifest_path = workspace.manifest_path();
        std::fs::write(&manifest_path, concat_manifest(&segments)?)
            .with_context(|| format!("write concat manifest '{}'", manifest_path.display()))?;

        info!(segments = segments.len(), out = %out_path.display(), "concatenating segments");
        if let Err(e) = self.concat_segments(&manifest_path, out_path, ConcatMode::StreamCopy) {
            warn!(error = %e, "stream-copy concat failed, falling back to re-encode");
            self.concat_segments(&manifest_path, out_path, ConcatMode::Reencode)?;
        }
        Ok(())
    }

    /// Encode one scene: the still expanded into a zooming clip with a
    /// caption overlay, muxed with the scene's narration.
    pub fn encode_segment(
        &self,
        scene: &SceneDescriptor,
        segment_path: &Path,
    ) -> SlidecastResult<()> {
        let mut cmd = Command::new(&self.ffmpeg);
        cmd.stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped());
        cmd.args(["-y", "-hide_banner", "-loglevel", "error"]);
        cmd.arg("-i").arg(&scene.still);
        cmd.arg("-i").arg(&scene.audio);
        cmd.arg("-filter_complex").arg(self.scene_filter(scene));
        cmd.args(["-map", "[v]", "-map", "1:a"]);
        cmd.args(["-c:v", "libx264", "-pix_fmt", "yuv420p", "-c:a", "aac", "-shortest"]);
        cmd.arg(segment_path);

        run_encoder(cmd, "segment encode")
    }

    /// Filter graph for one scene: zoompan for the slow zoom-in, drawtext
    /// for the caption overlay.
    fn scene_filter(&self, scene: &SceneDescriptor) -> String {
        let frames = self.cfg.frame_count(scene.duration_sec);
        let zoom_span = self.cfg.zoom_factor - 1.0;
        // `on` is the output frame index; zoom grows linearly and reaches the
        // target factor on the final frame.
        let denom = frames.saturating_sub(1).max(1);
        let zoompan = format!(
            "zoompan=z='1+{zoom_span:.4}*on/{denom}':d={frames}:x='iw/2-(iw/zoom/2)':y='ih/2-(ih/zoom/2)':s={}x{}:fps={}",
            self.cfg.width, self.cfg.height, self.cfg.fps
        );

        let caption =
            escape_drawtext(&wrap_caption(&scene.text, self.cfg.width, self.cfg.font_size));
        let font = self
            .cfg
            .font_file
            .as_ref()
            .map(|f| format!(":fontfile={}", f.display()))
            .unwrap_or_default();
        let drawtext = format!(
            "drawtext=text='{caption}'{font}:fontsize={}:fontcolor=white:borderw=2:bordercolor=black:x=(w-text_w)/2:y=h-text_h-60",
            self.cfg.font_size
        );

        format!("[0:v]{zoompan},{drawtext}[v]")
    }

    /// One concat invocation over the manifest.
    pub fn concat_segments(
        &self,
        manifest_path: &Path,
        out_path: &Path,
        mode: ConcatMode,
    ) -> SlidecastResult<()> {
        let mut cmd = Command::new(&self.ffmpeg);
        cmd.stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped());
        cmd.args(concat_args(manifest_path, out_path, mode));
        run_encoder(cmd, "concat")
    }
}

/// Argument list for a concat invocation; split out so the codec selection
/// per mode is testable without running the encoder.
pub(crate) fn concat_args(manifest_path: &Path, out_path: &Path, mode: ConcatMode) -> Vec<OsString> {
    let mut args: Vec<OsString> = ["-y", "-hide_banner", "-loglevel", "error", "-f", "concat", "-safe", "0", "-i"]
        .into_iter()
        .map(OsString::from)
        .collect();
    args.push(manifest_path.into());
    match mode {
        ConcatMode::StreamCopy => {
            args.extend(["-c", "copy"].into_iter().map(OsString::from));
        }
        ConcatMode::Reencode => {
            args.extend(
                ["-c:v", "libx264", "-c:a", "aac", "-movflags", "+faststart"]
                    .into_iter()
                    .map(OsString::from),
            );
        }
    }
    args.push(out_path.into());
    args
}

/// Concat demuxer manifest: one `file '<absolute-path>'` line per segment,
/// with single quotes escaped.
pub(crate) fn concat_manifest(segments: &[PathBuf]) -> SlidecastResult<String> {
    let mut out = String::new();
    for segment in segments {
        let abs = segment
            .canonicalize()
            .with_context(|| format!("resolve segment path '{}'", segment.display()))?;
        let quoted = abs.to_string_lossy().replace('\'', "'\\''");
        out.push_str(&format!("file '{quoted}'\n"));
    }
    Ok(out)
}

fn run_encoder(mut cmd: Command, what: &str) -> SlidecastResult<()> {
    let output = cmd
        .output()
        .map_err(|e| SlidecastError::encoding(format!("failed to run ffmpeg for {what}: {e}")))?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(SlidecastError::encoding(format!(
            "ffmpeg {what} exited with status {}: {}",
            output.status,
            stderr.trim()
        )));
    }
    Ok(())
}

/// Container duration of an encoded file in seconds, via ffprobe.
pub fn probe_duration_sec(path: &Path) -> SlidecastResult<f64> {
    #[derive(serde::Deserialize)]
    struct ProbeFormat {
        duration: Option<String>,
    }
    #[derive(serde::Deserialize)]
    struct ProbeOut {
        format: Option<ProbeFormat>,
    }

    let out = Command::new("ffprobe")
        .args(["-v", "error", "-print_format", "json", "-show_format"])
        .arg(path)
        .output()
        .map_err(|e| SlidecastError::encoding(format!("failed to run ffprobe: {e}")))?;
    if !out.status.success() {
        return Err(SlidecastError::encoding(format!(
            "ffprobe failed for '{}': {}",
            path.display(),
            String::from_utf8_lossy(&out.stderr).trim()
        )));
    }

    let parsed: ProbeOut = serde_json::from_slice(&out.stdout)
        .map_err(|e| SlidecastError::encoding(format!("ffprobe json parse failed: {e}")))?;
    parsed
        .format
        .and_then(|f| f.duration)
        .and_then(|d| d.parse::<f64>().ok())
        .ok_or_else(|| {
            SlidecastError::encoding(format!(
                "missing container duration for '{}'",
                path.display()
            ))
        })
}
