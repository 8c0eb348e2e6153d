//! Loading and saving rasters by file extension.

use std::path::Path;
use image::{DynamicImage, ImageEncoder};
use image::codecs::webp::WebPEncoder;
use tracing::debug;

use crate::utils::{ImageFormat, format_from_extension};
use crate::worker::{TaskError, TaskResult};

pub fn load_image(path: &Path) -> TaskResult<DynamicImage> {
    image::open(path).map_err(|e| TaskError::decode(path, e))
}

/// Saves `image` in the format implied by the extension of `path`.
///
/// WebP is always written lossless and JPEG drops the alpha channel.
pub fn save_image(image: &DynamicImage, path: &Path) -> TaskResult<()> {
    let format = format_from_extension(path).map_err(|e| TaskError::Image(e.to_string()))?;
    debug!("Saving {} as {:?}", path.display(), format);

    match format {
        ImageFormat::Jpeg => {
            DynamicImage::ImageRgb8(image.to_rgb8()).save_with_format(path, format.codec())?;
        }
        ImageFormat::WebP => {
            let rgba = image.to_rgba8();
            let file = std::fs::File::create(path)?;
            let writer = std::io::BufWriter::new(file);
            WebPEncoder::new_lossless(writer).write_image(
                rgba.as_raw(),
                rgba.width(),
                rgba.height(),
                image::ExtendedColorType::Rgba8,
            )?;
        }
        ImageFormat::Png | ImageFormat::Gif => {
            image.save_with_format(path, format.codec())?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    #[test]
    fn test_save_and_reload_each_format() {
        let dir = tempfile::tempdir().unwrap();
        let image = DynamicImage::ImageRgba8(RgbaImage::from_pixel(8, 6, Rgba([200, 10, 10, 255])));

        for name in ["a.png", "a.webp", "a.jpg", "a.jpeg"] {
            let path = dir.path().join(name);
            save_image(&image, &path).unwrap();
            let loaded = load_image(&path).unwrap();
            assert_eq!((loaded.width(), loaded.height()), (8, 6), "{name}");
        }
    }

    #[test]
    fn test_unknown_extension_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let image = DynamicImage::new_rgb8(2, 2);
        assert!(save_image(&image, &dir.path().join("a.bmp")).is_err());
    }

    #[test]
    fn test_load_garbage_is_decode_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.png");
        std::fs::write(&path, b"not a png").unwrap();
        assert!(matches!(load_image(&path), Err(TaskError::Decode { .. })));
    }
}
