use std::path::PathBuf;

use crate::error::{SlidecastError, SlidecastResult};

/// One (image, narration line) pair after scene building: lightweight paths
/// plus the measured narration duration.
///
/// The `still` and `audio` paths are workspace-owned temporaries. The
/// renderer deletes each still as soon as its segment is encoded; the
/// workspace sweeps everything else when the run ends.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct SceneDescriptor {
    pub still: PathBuf,
    pub audio: PathBuf,
    pub text: String,
    pub duration_sec: f64,
    pub width: u32,
    pub height: u32,
}

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct RenderConfig {
    pub width: u32,
    pub height: u32,
    pub fps: u32,
    /// Final factor of the slow zoom-in. 1.05 is subtle, 1.15 stronger.
    pub zoom_factor: f64,
    pub font_size: u32,
    /// Explicit caption font file. When unset the encoder resolves a system
    /// font through fontconfig.
    pub font_file: Option<PathBuf>,
    pub overwrite: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            width: 1920,
            height: 1080,
            fps: 24,
            zoom_factor: 1.05,
            font_size: 46,
            font_file: None,
            overwrite: true,
        }
    }
}

impl RenderConfig {
    pub fn validate(&self) -> SlidecastResult<()> {
        if self.width == 0 || self.height == 0 {
            return Err(SlidecastError::validation(
                "render width/height must be non-zero",
            ));
        }
        if !self.width.is_multiple_of(2) || !self.height.is_multiple_of(2) {
            // Segments target yuv420p output for maximum player compatibility.
            return Err(SlidecastError::validation(
                "render width/height must be even (required for yuv420p mp4 output)",
            ));
        }
        if self.fps == 0 {
            return Err(SlidecastError::validation("render fps must be non-zero"));
        }
        if self.zoom_factor < 1.0 {
            return Err(SlidecastError::validation("zoom factor must be >= 1.0"));
        }
        if self.font_size == 0 {
            return Err(SlidecastError::validation("caption font size must be non-zero"));
        }
        Ok(())
    }

    /// Number of video frames a scene of `duration_sec` occupies. Never zero,
    /// so even an empty narration produces a visible frame.
    pub fn frame_count(&self, duration_sec: f64) -> u64 {
        ((duration_sec * f64::from(self.fps)).round() as u64).max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg() -> RenderConfig {
        RenderConfig::default()
    }

    #[test]
    fn validation_catches_bad_values() {
        assert!(RenderConfig { width: 0, ..cfg() }.validate().is_err());
        assert!(RenderConfig { width: 11, ..cfg() }.validate().is_err());
        assert!(RenderConfig { fps: 0, ..cfg() }.validate().is_err());
        assert!(
            RenderConfig {
                zoom_factor: 0.9,
                ..cfg()
            }
            .validate()
            .is_err()
        );
        assert!(
            RenderConfig {
                font_size: 0,
                ..cfg()
            }
            .validate()
            .is_err()
        );
        assert!(cfg().validate().is_ok());
    }

    #[test]
    fn frame_count_rounds_and_never_returns_zero() {
        let c = RenderConfig {
            fps: 24,
            ..RenderConfig::default()
        };
        assert_eq!(c.frame_count(1.0), 24);
        assert_eq!(c.frame_count(0.51), 12);
        assert_eq!(c.frame_count(0.0), 1);
    }
}
