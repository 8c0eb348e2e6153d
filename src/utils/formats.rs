use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;
use crate::utils::UpscaleError;

/// Image formats accepted as input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    Jpeg,
    Png,
    WebP,
    Gif,
}

impl ImageFormat {
    /// Multi-frame inputs are decomposed into per-frame jobs
    pub fn is_animated(&self) -> bool {
        matches!(self, Self::Gif)
    }

    /// Encoder used by the `image` crate for this format.
    pub fn codec(&self) -> image::ImageFormat {
        match self {
            Self::Jpeg => image::ImageFormat::Jpeg,
            Self::Png => image::ImageFormat::Png,
            Self::WebP => image::ImageFormat::WebP,
            Self::Gif => image::ImageFormat::Gif,
        }
    }
}

impl FromStr for ImageFormat {
    type Err = UpscaleError;

    fn from_str(ext: &str) -> Result<Self, Self::Err> {
        let ext = ext.to_lowercase();
        match ext.as_str() {
            "jpg" | "jpeg" => Ok(Self::Jpeg),
            "png" => Ok(Self::Png),
            "webp" => Ok(Self::WebP),
            "gif" => Ok(Self::Gif),
            _ => Err(UpscaleError::format(format!(
                "Unsupported image format: {}", ext
            ))),
        }
    }
}

/// Get format from file extension
pub fn format_from_extension(path: &Path) -> Result<ImageFormat, UpscaleError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .ok_or_else(|| UpscaleError::format(
            format!("File has no extension: {}", path.display())
        ))?;

    ImageFormat::from_str(ext)
}

/// True for `.jpg/.jpeg/.png/.gif/.webp`, any case.
pub fn is_supported_image(path: &Path) -> bool {
    format_from_extension(path).is_ok()
}
