#![forbid(unsafe_code)]

pub mod caption;
pub mod crop;
pub mod encode_ffmpeg;
pub mod error;
pub mod inputs;
pub mod model;
pub mod pipeline;
pub mod scenes;
pub mod speech;
pub mod workspace;

pub use encode_ffmpeg::{ConcatMode, FfmpegRenderer, is_ffmpeg_on_path, probe_duration_sec};
pub use error::{SlidecastError, SlidecastResult};
pub use model::{RenderConfig, SceneDescriptor};
pub use pipeline::{PipelineOpts, run_pipeline};
pub use scenes::build_scenes;
pub use speech::{PiperSynthesizer, SpeechSynthesizer, wav_duration_sec};
pub use workspace::Workspace;
