use std::{
    io::Write as _,
    path::{Path, PathBuf},
    process::{Command, Stdio},
};

use anyhow::Context as _;
use tracing::debug;

use crate::error::{SlidecastError, SlidecastResult};

/// A speech-synthesis engine: renders one narration line to a WAV file at
/// `out_path`, synchronously.
///
/// `voice` is an engine-specific speaker identifier; engines with a single
/// voice may ignore it.
pub trait SpeechSynthesizer {
    fn synthesize(&self, text: &str, voice: &str, out_path: &Path) -> SlidecastResult<()>;
}

/// Subprocess adapter for the Piper TTS engine.
///
/// Piper reads the text on stdin and writes a WAV file; multi-speaker
/// models select the voice with `--speaker`.
pub struct PiperSynthesizer {
    binary: PathBuf,
    model: PathBuf,
}

impl PiperSynthesizer {
    /// Locate `piper` on PATH and use the given voice model.
    pub fn new(model: impl Into<PathBuf>) -> SlidecastResult<Self> {
        let binary = which::which("piper").map_err(|e| {
            SlidecastError::synthesis(format!("piper binary not found on PATH: {e}"))
        })?;
        Ok(Self {
            binary,
            model: model.into(),
        })
    }

    /// Use an explicit engine binary instead of searching PATH.
    pub fn with_binary(binary: impl Into<PathBuf>, model: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
            model: model.into(),
        }
    }
}

impl SpeechSynthesizer for PiperSynthesizer {
    fn synthesize(&self, text: &str, voice: &str, out_path: &Path) -> SlidecastResult<()> {
        debug!(voice, out = %out_path.display(), "synthesizing narration");

        let mut cmd = Command::new(&self.binary);
        cmd.arg("--model")
            .arg(&self.model)
            .arg("--output_file")
            .arg(out_path)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped());
        if !voice.is_empty() {
            cmd.arg("--speaker").arg(voice);
        }

        let mut child = cmd.spawn().map_err(|e| {
            SlidecastError::synthesis(format!(
                "failed to spawn '{}': {e}",
                self.binary.display()
            ))
        })?;

        let mut stdin = child.stdin.take().ok_or_else(|| {
            SlidecastError::synthesis("failed to open speech engine stdin (unexpected)")
        })?;
        stdin.write_all(text.as_bytes()).map_err(|e| {
            SlidecastError::synthesis(format!("failed to write text to speech engine: {e}"))
        })?;
        drop(stdin);

        let output = child.wait_with_output().map_err(|e| {
            SlidecastError::synthesis(format!("failed to wait for speech engine: {e}"))
        })?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(SlidecastError::synthesis(format!(
                "speech engine exited with status {}: {}",
                output.status,
                stderr.trim()
            )));
        }
        Ok(())
    }
}

/// Duration of a WAV file in seconds, read from its header.
pub fn wav_duration_sec(path: &Path) -> SlidecastResult<f64> {
    let reader = hound::WavReader::open(path)
        .with_context(|| format!("open wav '{}'", path.display()))?;
    let spec = reader.spec();
    Ok(f64::from(reader.duration()) / f64::from(spec.sample_rate))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_silence(path: &Path, sample_rate: u32, seconds: f64) {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(path, spec).unwrap();
        for _ in 0..((f64::from(sample_rate) * seconds) as u32) {
            writer.write_sample(0i16).unwrap();
        }
        writer.finalize().unwrap();
    }

    #[test]
    fn wav_duration_matches_written_samples() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tone.wav");
        write_silence(&path, 22_050, 1.5);

        let d = wav_duration_sec(&path).unwrap();
        assert!((d - 1.5).abs() < 1e-6, "got {d}");
    }

    #[test]
    fn wav_duration_missing_file_errors() {
        let dir = tempfile::tempdir().unwrap();
        assert!(wav_duration_sec(&dir.path().join("nope.wav")).is_err());
    }

    #[test]
    fn failed_engine_maps_to_synthesis_error() {
        let dir = tempfile::tempdir().unwrap();
        let synth = PiperSynthesizer::with_binary("/nonexistent/piper", "voice.onnx");
        let err = synth
            .synthesize("hello", "", &dir.path().join("out.wav"))
            .unwrap_err();
        assert!(matches!(err, SlidecastError::Synthesis(_)));
    }
}
