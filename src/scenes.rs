use std::path::PathBuf;

use anyhow::Context as _;
use tracing::info;
use uuid::Uuid;

use crate::{
    crop::center_crop_resize,
    error::{SlidecastError, SlidecastResult},
    model::{RenderConfig, SceneDescriptor},
    speech::{SpeechSynthesizer, wav_duration_sec},
    workspace::Workspace,
};

/// Build one scene per (image, narration line) pair, in input order.
///
/// Each scene synthesizes its narration to a workspace WAV, measures the
/// resulting duration, and writes a center-cropped still at the target
/// resolution. Written files are owned by the workspace; the renderer
/// deletes each still once its segment is encoded.
///
/// Fails before any synthesis when the two inputs differ in length. There is
/// no retry: a synthesis or image failure aborts the run.
pub fn build_scenes(
    images: &[PathBuf],
    lines: &[String],
    synth: &dyn SpeechSynthesizer,
    voice: &str,
    workspace: &Workspace,
    cfg: &RenderConfig,
) -> SlidecastResult<Vec<SceneDescriptor>> {
    cfg.validate()?;
    if images.len() != lines.len() {
        return Err(SlidecastError::validation(format!(
            "image and script counts differ: {} images vs {} lines",
            images.len(),
            lines.len()
        )));
    }

    let mut scenes = Vec::with_capacity(images.len());
    for (idx, (image, text)) in images.iter().zip(lines).enumerate() {
        info!(scene = idx + 1, total = images.len(), text = %text, "building scene");

        let audio = workspace
            .audio_dir()
            .join(format!("{}.wav", Uuid::new_v4().simple()));
        synth.synthesize(text, voice, &audio)?;
        let duration_sec = wav_duration_sec(&audio)?;

        let still = workspace
            .stills_dir()
            .join(format!("still_{}.png", Uuid::new_v4().simple()));
        let frame = center_crop_resize(image, cfg.width, cfg.height)?;
        frame
            .save(&still)
            .with_context(|| format!("write resized still '{}'", still.display()))?;

        scenes.push(SceneDescriptor {
            still,
            audio,
            text: text.clone(),
            duration_sec,
            width: cfg.width,
            height: cfg.height,
        });
    }

    Ok(scenes)
}

#[cfg(test)]
mod tests {
    use std::{cell::Cell, path::Path};

    use super::*;

    struct StubSynthesizer {
        duration_sec: f64,
        calls: Cell<usize>,
    }

    impl StubSynthesizer {
        fn new(duration_sec: f64) -> Self {
            Self {
                duration_sec,
                calls: Cell::new(0),
            }
        }
    }

    impl SpeechSynthesizer for StubSynthesizer {
        fn synthesize(&self, _text: &str, _voice: &str, out_path: &Path) -> SlidecastResult<()> {
            self.calls.set(self.calls.get() + 1);

            let spec = hound::WavSpec {
                channels: 1,
                sample_rate: 22_050,
                bits_per_sample: 16,
                sample_format: hound::SampleFormat::Int,
            };
            let mut writer = hound::WavWriter::create(out_path, spec)
                .map_err(|e| SlidecastError::synthesis(e.to_string()))?;
            for _ in 0..((22_050.0 * self.duration_sec) as u32) {
                writer
                    .write_sample(0i16)
                    .map_err(|e| SlidecastError::synthesis(e.to_string()))?;
            }
            writer
                .finalize()
                .map_err(|e| SlidecastError::synthesis(e.to_string()))?;
            Ok(())
        }
    }

    fn fixture_image(dir: &Path, name: &str, w: u32, h: u32) -> PathBuf {
        let path = dir.join(name);
        let img = image::RgbaImage::from_fn(w, h, |x, y| {
            image::Rgba([(x % 256) as u8, (y % 256) as u8, 64, 255])
        });
        img.save(&path).unwrap();
        path
    }

    fn small_cfg() -> RenderConfig {
        RenderConfig {
            width: 64,
            height: 48,
            ..RenderConfig::default()
        }
    }

    #[test]
    fn mismatched_inputs_fail_before_any_synthesis() {
        let parent = tempfile::tempdir().unwrap();
        let ws = Workspace::create_in(parent.path()).unwrap();
        let synth = StubSynthesizer::new(0.25);

        let images = vec![fixture_image(parent.path(), "a.png", 64, 48)];
        let lines = vec!["one".to_string(), "two".to_string()];

        let err = build_scenes(&images, &lines, &synth, "", &ws, &small_cfg()).unwrap_err();
        assert!(matches!(err, SlidecastError::Validation(_)));
        assert_eq!(synth.calls.get(), 0);
    }

    #[test]
    fn scenes_come_back_in_input_order_with_measured_durations() {
        let parent = tempfile::tempdir().unwrap();
        let ws = Workspace::create_in(parent.path()).unwrap();
        let synth = StubSynthesizer::new(0.25);

        // Mixed aspect ratios; both must land at the exact target size.
        let images = vec![
            fixture_image(parent.path(), "wide.png", 200, 50),
            fixture_image(parent.path(), "tall.png", 50, 200),
        ];
        let lines = vec!["first".to_string(), "second".to_string()];

        let scenes = build_scenes(&images, &lines, &synth, "", &ws, &small_cfg()).unwrap();
        assert_eq!(scenes.len(), 2);
        assert_eq!(synth.calls.get(), 2);
        assert_eq!(scenes[0].text, "first");
        assert_eq!(scenes[1].text, "second");

        for scene in &scenes {
            assert!((scene.duration_sec - 0.25).abs() < 1e-3);
            assert!(scene.audio.starts_with(ws.audio_dir()));
            assert!(scene.still.starts_with(ws.stills_dir()));

            let still = image::open(&scene.still).unwrap();
            assert_eq!((still.width(), still.height()), (64, 48));
        }
    }

    #[test]
    fn broken_image_aborts_the_run() {
        let parent = tempfile::tempdir().unwrap();
        let ws = Workspace::create_in(parent.path()).unwrap();
        let synth = StubSynthesizer::new(0.25);

        let broken = parent.path().join("broken.png");
        std::fs::write(&broken, b"not a png").unwrap();

        let result = build_scenes(
            &[broken],
            &["line".to_string()],
            &synth,
            "",
            &ws,
            &small_cfg(),
        );
        assert!(result.is_err());
    }
}
