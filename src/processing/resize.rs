//! Resize-after-upscale.
//!
//! The upscaler always multiplies both sides by the model's factor. When the
//! requested size differs, the model output is resampled to the exact target.

use image::DynamicImage;
use image::imageops::FilterType;
use crate::core::{ConfigParams, DownsampleFilter, ResizeMode};

/// `value * num / den`, rounded half up, never below 1.
fn scale_rounded(value: u32, num: u32, den: u32) -> u32 {
    let (value, num, den) = (value as u64, num as u64, den.max(1) as u64);
    let scaled = (2 * value * num + den) / (2 * den);
    scaled.clamp(1, u32::MAX as u64) as u32
}

/// Final dimensions for a source image of `width` x `height`.
///
/// Width and height modes keep the aspect ratio; ratio mode multiplies both
/// sides by the literal factor.
pub fn target_dimensions(width: u32, height: u32, config: &ConfigParams) -> (u32, u32) {
    let value = config.resize_value.max(1);
    match config.resize_mode {
        ResizeMode::Ratio => (
            width.saturating_mul(value).max(1),
            height.saturating_mul(value).max(1),
        ),
        ResizeMode::Width => (value, scale_rounded(height, value, width)),
        ResizeMode::Height => (scale_rounded(width, value, height), value),
    }
}

/// Dimensions the model produces for a source image.
pub fn model_output_dimensions(width: u32, height: u32, config: &ConfigParams) -> (u32, u32) {
    let factor = config.model_scale_factor;
    (width.saturating_mul(factor), height.saturating_mul(factor))
}

/// Target size when the model output has to be resampled, `None` when the
/// model already produces the requested size.
pub fn resize_target(width: u32, height: u32, config: &ConfigParams) -> Option<(u32, u32)> {
    let target = target_dimensions(width, height, config);
    (target != model_output_dimensions(width, height, config)).then_some(target)
}

fn filter_type(filter: DownsampleFilter) -> FilterType {
    match filter {
        DownsampleFilter::Lanczos => FilterType::Lanczos3,
        DownsampleFilter::Bicubic => FilterType::CatmullRom,
        DownsampleFilter::Hamming | DownsampleFilter::Bilinear | DownsampleFilter::Box => {
            FilterType::Triangle
        }
        DownsampleFilter::Nearest => FilterType::Nearest,
    }
}

/// Resamples `image` to exactly `width` x `height`.
///
/// Box shrinks with the area-averaging sampler; when it would enlarge either
/// side it falls back to the triangle filter.
pub fn apply_resize(
    image: DynamicImage,
    (width, height): (u32, u32),
    filter: DownsampleFilter,
) -> DynamicImage {
    if image.width() == width && image.height() == height {
        return image;
    }

    let shrinking = width <= image.width() && height <= image.height();
    if filter == DownsampleFilter::Box && shrinking {
        return image.thumbnail_exact(width, height);
    }

    image.resize_exact(width, height, filter_type(filter))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(mode: ResizeMode, value: u32, factor: u32) -> ConfigParams {
        ConfigParams {
            model: "realesrgan-x4plus".to_string(),
            model_scale_factor: factor,
            resize_mode: mode,
            resize_value: value,
            downsample_filter: DownsampleFilter::Lanczos,
            tile_size: 0,
            gpu_id: 0,
            use_tta: false,
            prefer_lossless_webp: false,
        }
    }

    #[test]
    fn test_native_ratio_needs_no_resize() {
        assert_eq!(resize_target(100, 50, &config(ResizeMode::Ratio, 4, 4)), None);
    }

    #[test]
    fn test_ratio_differs_from_model_factor() {
        assert_eq!(resize_target(100, 50, &config(ResizeMode::Ratio, 2, 4)), Some((200, 100)));
        assert_eq!(resize_target(100, 50, &config(ResizeMode::Ratio, 3, 2)), Some((300, 150)));
    }

    #[test]
    fn test_width_mode_rounds_half_up() {
        // 3 * 5 / 2 = 7.5 -> 8
        assert_eq!(target_dimensions(2, 3, &config(ResizeMode::Width, 5, 4)), (5, 8));
        // 7 * 10 / 3 = 23.33 -> 23
        assert_eq!(target_dimensions(3, 7, &config(ResizeMode::Width, 10, 4)), (10, 23));
    }

    #[test]
    fn test_height_mode_keeps_aspect() {
        assert_eq!(target_dimensions(1920, 1080, &config(ResizeMode::Height, 720, 4)), (1280, 720));
    }

    #[test]
    fn test_dimensions_never_collapse_to_zero() {
        assert_eq!(target_dimensions(1000, 1, &config(ResizeMode::Width, 10, 4)), (10, 1));
    }

    #[test]
    fn test_width_target_equal_to_model_output_is_skipped() {
        assert_eq!(resize_target(50, 20, &config(ResizeMode::Width, 200, 4)), None);
    }

    #[test]
    fn test_apply_resize_hits_exact_size() {
        let image = DynamicImage::new_rgba8(40, 20);
        for filter in [DownsampleFilter::Lanczos, DownsampleFilter::Box, DownsampleFilter::Nearest] {
            let out = apply_resize(image.clone(), (10, 5), filter);
            assert_eq!((out.width(), out.height()), (10, 5));
            let out = apply_resize(image.clone(), (60, 30), filter);
            assert_eq!((out.width(), out.height()), (60, 30));
        }
    }
}
