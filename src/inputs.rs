use std::{
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
};

use anyhow::Context as _;

use crate::error::{SlidecastError, SlidecastResult};

/// Extensions the pipeline accepts as source images (compared
/// case-insensitively).
const IMAGE_EXTENSIONS: [&str; 4] = ["jpg", "jpeg", "png", "webp"];

/// List the source images in `dir`, sorted lexicographically by path.
pub fn collect_images(dir: &Path) -> SlidecastResult<Vec<PathBuf>> {
    let entries = std::fs::read_dir(dir)
        .with_context(|| format!("read image folder '{}'", dir.display()))?;

    let mut images = Vec::new();
    for entry in entries {
        let entry = entry.with_context(|| format!("read image folder '{}'", dir.display()))?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
            continue;
        };
        if IMAGE_EXTENSIONS.iter().any(|want| ext.eq_ignore_ascii_case(want)) {
            images.push(path);
        }
    }
    images.sort();
    Ok(images)
}

#[derive(Debug, serde::Deserialize)]
struct ScriptDoc {
    script_lines: Vec<String>,
}

/// Load the narration script: a JSON document with an ordered `script_lines`
/// array, one entry per scene.
pub fn load_script(path: &Path) -> SlidecastResult<Vec<String>> {
    let f = File::open(path).with_context(|| format!("open script '{}'", path.display()))?;
    let doc: ScriptDoc = serde_json::from_reader(BufReader::new(f)).map_err(|e| {
        SlidecastError::validation(format!("parse script '{}': {e}", path.display()))
    })?;
    Ok(doc.script_lines)
}
