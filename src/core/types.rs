//! Core types describing one processing run.

use std::fmt;
use std::str::FromStr;
use serde::{Deserialize, Serialize};
use crate::utils::UpscaleError;

/// How the final output size is computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResizeMode {
    /// Multiply both dimensions by an integer factor
    Ratio,
    /// Scale proportionally to a target width
    Width,
    /// Scale proportionally to a target height
    Height,
}

impl ResizeMode {
    /// Letter used in output file names (`x4`, `w1920`, `h1080`)
    pub fn suffix_prefix(&self) -> char {
        match self {
            Self::Ratio => 'x',
            Self::Width => 'w',
            Self::Height => 'h',
        }
    }
}

impl fmt::Display for ResizeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ratio => write!(f, "ratio"),
            Self::Width => write!(f, "width"),
            Self::Height => write!(f, "height"),
        }
    }
}

impl FromStr for ResizeMode {
    type Err = UpscaleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "ratio" | "x" => Ok(Self::Ratio),
            "width" | "w" => Ok(Self::Width),
            "height" | "h" => Ok(Self::Height),
            other => Err(UpscaleError::invalid_value(format!(
                "Unknown resize mode: {other} (expected ratio, width or height)"
            ))),
        }
    }
}

/// Resampling filter for the resize-after-upscale step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DownsampleFilter {
    #[default]
    Lanczos,
    Bicubic,
    Hamming,
    Bilinear,
    Box,
    Nearest,
}

impl fmt::Display for DownsampleFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Lanczos => "lanczos",
            Self::Bicubic => "bicubic",
            Self::Hamming => "hamming",
            Self::Bilinear => "bilinear",
            Self::Box => "box",
            Self::Nearest => "nearest",
        };
        f.write_str(name)
    }
}

impl FromStr for DownsampleFilter {
    type Err = UpscaleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "lanczos" => Ok(Self::Lanczos),
            "bicubic" => Ok(Self::Bicubic),
            "hamming" => Ok(Self::Hamming),
            "bilinear" => Ok(Self::Bilinear),
            "box" => Ok(Self::Box),
            "nearest" => Ok(Self::Nearest),
            other => Err(UpscaleError::invalid_value(format!("Unknown filter: {other}"))),
        }
    }
}

/// Parameters of one processing run.
///
/// Built once per run and shared read-only (behind an `Arc`) by every task
/// derived from it. Nothing reads mutable state after construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigParams {
    /// Model name passed to the upscaler (`-n`)
    pub model: String,
    /// Fixed integer factor the model upscales by (`-s`)
    pub model_scale_factor: u32,
    /// How the final size is computed
    pub resize_mode: ResizeMode,
    /// Ratio factor, target width or target height depending on `resize_mode`
    pub resize_value: u32,
    /// Filter for the post-upscale resize
    pub downsample_filter: DownsampleFilter,
    /// Upscaler tile size; 0 lets the upscaler decide
    pub tile_size: u32,
    /// GPU index (`-g`)
    pub gpu_id: u32,
    /// Test-time augmentation (`-x`)
    #[serde(rename = "useTTA")]
    pub use_tta: bool,
    /// Save PNG outputs as lossless WebP instead
    #[serde(rename = "preferLosslessWebP")]
    pub prefer_lossless_webp: bool,
}

impl ConfigParams {
    /// True when the model's own factor already yields the requested size,
    /// without looking at the image.
    pub fn is_native_ratio(&self) -> bool {
        self.resize_mode == ResizeMode::Ratio && self.resize_value == self.model_scale_factor
    }
}
