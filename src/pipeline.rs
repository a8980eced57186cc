use std::path::{Path, PathBuf};

use tracing::info;

use crate::{
    encode_ffmpeg::FfmpegRenderer,
    error::SlidecastResult,
    inputs::{collect_images, load_script},
    model::RenderConfig,
    scenes::build_scenes,
    speech::SpeechSynthesizer,
    workspace::Workspace,
};

/// Run-level options that are not per-frame render settings.
#[derive(Clone, Debug, Default)]
pub struct PipelineOpts {
    /// Speaker/voice identifier passed to the speech engine.
    pub voice: String,
    /// Parent directory for the run workspace; system temp dir when unset.
    pub work_dir: Option<PathBuf>,
    /// Leave the run workspace on disk for debugging.
    pub keep_workspace: bool,
}

/// End-to-end run: discover inputs, build scenes, render, clean up.
///
/// Fully sequential: each scene is synthesized, resized, and encoded before
/// the next one starts, trading throughput for bounded peak memory and
/// disk. The workspace is cleaned on success and on failure alike; cleanup
/// problems are logged and never override the primary result.
pub fn run_pipeline(
    images_dir: &Path,
    script_path: &Path,
    out_path: &Path,
    synth: &dyn SpeechSynthesizer,
    cfg: &RenderConfig,
    opts: &PipelineOpts,
) -> SlidecastResult<()> {
    let images = collect_images(images_dir)?;
    let lines = load_script(script_path)?;
    info!(images = images.len(), lines = lines.len(), "inputs loaded");

    let mut workspace = match &opts.work_dir {
        Some(parent) => Workspace::create_in(parent)?,
        None => Workspace::create()?,
    };
    if opts.keep_workspace {
        workspace.keep();
    }

    let result = render_run(&images, &lines, synth, cfg, opts, &workspace, out_path);
    workspace.cleanup();
    result
}

fn render_run(
    images: &[PathBuf],
    lines: &[String],
    synth: &dyn SpeechSynthesizer,
    cfg: &RenderConfig,
    opts: &PipelineOpts,
    workspace: &Workspace,
    out_path: &Path,
) -> SlidecastResult<()> {
    let scenes = build_scenes(images, lines, synth, &opts.voice, workspace, cfg)?;
    let narration_sec: f64 = scenes.iter().map(|s| s.duration_sec).sum();
    info!(scenes = scenes.len(), narration_sec, "scenes built");

    let renderer = FfmpegRenderer::new(cfg.clone())?;
    renderer.render(&scenes, workspace, out_path)?;
    info!(out = %out_path.display(), "final video written");
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;
    use crate::error::{SlidecastError, SlidecastResult};

    struct CountingSynthesizer {
        calls: Cell<usize>,
    }

    impl SpeechSynthesizer for CountingSynthesizer {
        fn synthesize(&self, _text: &str, _voice: &str, _out_path: &Path) -> SlidecastResult<()> {
            self.calls.set(self.calls.get() + 1);
            Err(SlidecastError::synthesis("stub"))
        }
    }

    #[test]
    fn mismatched_inputs_fail_fast_and_leave_no_workspace_behind() {
        let root = tempfile::tempdir().unwrap();
        let images_dir = root.path().join("images");
        std::fs::create_dir(&images_dir).unwrap();
        for name in ["a.png", "b.png"] {
            let img = image::RgbaImage::from_pixel(8, 8, image::Rgba([0, 0, 0, 255]));
            img.save(images_dir.join(name)).unwrap();
        }
        let script = root.path().join("script.json");
        std::fs::write(&script, r#"{"script_lines": ["only one"]}"#).unwrap();

        let work_parent = root.path().join("work");
        let synth = CountingSynthesizer {
            calls: Cell::new(0),
        };
        let opts = PipelineOpts {
            work_dir: Some(work_parent.clone()),
            ..PipelineOpts::default()
        };

        let err = run_pipeline(
            &images_dir,
            &script,
            &root.path().join("out.mp4"),
            &synth,
            &RenderConfig::default(),
            &opts,
        )
        .unwrap_err();

        assert!(matches!(err, SlidecastError::Validation(_)));
        assert_eq!(synth.calls.get(), 0);

        // The run workspace is swept even though the run failed.
        let leftovers: Vec<_> = std::fs::read_dir(&work_parent).unwrap().collect();
        assert!(leftovers.is_empty(), "workspace not cleaned: {leftovers:?}");
    }
}
