use std::path::PathBuf;
use clap::Parser;
use image_upscaler_lib::core::{ConfigParams, DownsampleFilter, ResizeMode, model_scale_factor};

#[derive(Parser, Debug, Clone)]
#[command(version, about = "Batch upscaling of images and animated GIFs with Real-ESRGAN")]
pub struct Args {
    /// Image, animated GIF or directory to upscale
    #[arg(required_unless_present = "list_models")]
    pub input: Option<PathBuf>,

    /// Output file, or output root for a directory input
    pub output: Option<PathBuf>,

    /// Model name, as found in the models directory
    #[arg(short = 'n', long, default_value = "realesrgan-x4plus")]
    pub model: String,

    /// Native factor of the model; inferred from its name when omitted
    #[arg(short = 's', long)]
    pub scale_factor: Option<u32>,

    /// How the final size is computed: ratio, width or height
    #[arg(long, default_value = "ratio")]
    pub resize_mode: ResizeMode,

    /// Ratio factor, target width or target height
    #[arg(long, default_value_t = 4)]
    pub resize_value: u32,

    /// Filter used when the model output has to be resized
    #[arg(long, default_value = "lanczos")]
    pub filter: DownsampleFilter,

    /// Tile size, 0 for automatic
    #[arg(short = 't', long, default_value_t = 0)]
    pub tile_size: u32,

    /// GPU index
    #[arg(short = 'g', long, default_value_t = 0)]
    pub gpu_id: u32,

    /// Enable test-time augmentation (slower, slightly better)
    #[arg(short = 'x', long)]
    pub tta: bool,

    /// Save PNG outputs as lossless WebP
    #[arg(long)]
    pub webp: bool,

    /// Path of the upscaler; defaults to realesrgan-ncnn-vulkan next to this binary
    #[arg(long, env = "UPSCALER_EXECUTABLE")]
    pub executable: Option<PathBuf>,

    /// Models directory for --list-models; defaults to models/ next to the upscaler
    #[arg(long)]
    pub models_dir: Option<PathBuf>,

    /// Directory the upscaler runs in; defaults to the upscaler's own directory
    #[arg(long)]
    pub working_dir: Option<PathBuf>,

    /// Kill an upscaler run after this many seconds
    #[arg(long)]
    pub timeout_secs: Option<u64>,

    /// Print run events as JSON lines
    #[arg(long)]
    pub json: bool,

    /// Debug logging
    #[arg(short = 'v', long)]
    pub verbose: bool,

    /// List installed models and exit
    #[arg(long)]
    pub list_models: bool,
}

impl Args {
    pub fn config(&self) -> ConfigParams {
        ConfigParams {
            model: self.model.clone(),
            model_scale_factor: self
                .scale_factor
                .unwrap_or_else(|| model_scale_factor(&self.model)),
            resize_mode: self.resize_mode,
            resize_value: self.resize_value,
            downsample_filter: self.filter,
            tile_size: self.tile_size,
            gpu_id: self.gpu_id,
            use_tta: self.tta,
            prefer_lossless_webp: self.webp,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let args = Args::try_parse_from(["image-upscaler", "photo.jpg"]).unwrap();
        let config = args.config();
        assert_eq!(config.model, "realesrgan-x4plus");
        assert_eq!(config.model_scale_factor, 4);
        assert_eq!(config.resize_mode, ResizeMode::Ratio);
        assert_eq!(config.resize_value, 4);
        assert_eq!(config.downsample_filter, DownsampleFilter::Lanczos);
        assert!(!config.use_tta);
    }

    #[test]
    fn test_scale_factor_follows_model_name() {
        let args = Args::try_parse_from([
            "image-upscaler",
            "in",
            "-n",
            "realesr-animevideov3-x2",
            "--resize-mode",
            "width",
            "--resize-value",
            "1920",
            "--filter",
            "box",
            "-x",
            "--webp",
        ])
        .unwrap();
        let config = args.config();
        assert_eq!(config.model_scale_factor, 2);
        assert_eq!(config.resize_mode, ResizeMode::Width);
        assert_eq!(config.downsample_filter, DownsampleFilter::Box);
        assert!(config.use_tta);
        assert!(config.prefer_lossless_webp);
    }

    #[test]
    fn test_input_required_unless_listing_models() {
        assert!(Args::try_parse_from(["image-upscaler"]).is_err());
        assert!(Args::try_parse_from(["image-upscaler", "--list-models"]).is_ok());
    }

    #[test]
    fn test_working_dir_is_optional() {
        let args = Args::try_parse_from(["image-upscaler", "in"]).unwrap();
        assert_eq!(args.working_dir, None);

        let args = Args::try_parse_from(["image-upscaler", "in", "--working-dir", "/opt/esrgan"]).unwrap();
        assert_eq!(args.working_dir, Some(PathBuf::from("/opt/esrgan")));
    }

    #[test]
    fn test_unknown_resize_mode_is_rejected() {
        assert!(Args::try_parse_from(["image-upscaler", "in", "--resize-mode", "diagonal"]).is_err());
    }
}
