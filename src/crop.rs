use std::path::Path;

use anyhow::Context as _;
use image::{RgbaImage, imageops::FilterType};

use crate::error::SlidecastResult;

/// Crop box `(x, y, w, h)` that trims a `src_w x src_h` source to the target
/// aspect ratio, centered. Whichever axis has excess is cropped; the other
/// is kept whole. The ratio comparison uses integer cross-products so large
/// dimensions lose no precision.
pub(crate) fn crop_box(src_w: u32, src_h: u32, target_w: u32, target_h: u32) -> (u32, u32, u32, u32) {
    let wider = u64::from(src_w) * u64::from(target_h) > u64::from(target_w) * u64::from(src_h);
    if wider {
        // Source too wide: crop the sides.
        let new_w = ((u64::from(src_h) * u64::from(target_w) / u64::from(target_h)) as u32).max(1);
        let offset = (src_w - new_w) / 2;
        (offset, 0, new_w, src_h)
    } else {
        // Source too tall (or exact): crop top and bottom.
        let new_h = ((u64::from(src_w) * u64::from(target_h) / u64::from(target_w)) as u32).max(1);
        let offset = (src_h - new_h) / 2;
        (0, offset, src_w, new_h)
    }
}

/// Center-crop `path` to the target aspect ratio, then scale to exactly
/// `target_w x target_h`. Never letterboxes.
pub fn center_crop_resize(path: &Path, target_w: u32, target_h: u32) -> SlidecastResult<RgbaImage> {
    let img = image::open(path).with_context(|| format!("decode image '{}'", path.display()))?;
    let (x, y, w, h) = crop_box(img.width(), img.height(), target_w, target_h);
    let resized = img
        .crop_imm(x, y, w, h)
        .resize_exact(target_w, target_h, FilterType::Lanczos3);
    Ok(resized.to_rgba8())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wide_source_crops_sides() {
        assert_eq!(crop_box(400, 100, 100, 100), (150, 0, 100, 100));
    }

    #[test]
    fn tall_source_crops_top_and_bottom() {
        assert_eq!(crop_box(100, 400, 100, 100), (0, 150, 100, 100));
    }

    #[test]
    fn exact_ratio_keeps_full_frame() {
        assert_eq!(crop_box(200, 100, 100, 50), (0, 0, 200, 100));
    }

    #[test]
    fn one_pixel_excess_still_centers() {
        // 101x100 against a square target: one column of excess.
        assert_eq!(crop_box(101, 100, 100, 100), (0, 0, 100, 100));
    }

    #[test]
    fn resize_always_hits_exact_target_dimensions() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("odd.png");
        let img = RgbaImage::from_fn(37, 91, |x, y| {
            image::Rgba([(x * 7) as u8, (y * 3) as u8, 128, 255])
        });
        img.save(&path).unwrap();

        let out = center_crop_resize(&path, 64, 64).unwrap();
        assert_eq!(out.dimensions(), (64, 64));

        let out = center_crop_resize(&path, 128, 32).unwrap();
        assert_eq!(out.dimensions(), (128, 32));
    }

    #[test]
    fn unreadable_image_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.png");
        std::fs::write(&path, b"not a png").unwrap();
        assert!(center_crop_resize(&path, 64, 64).is_err());
    }
}
