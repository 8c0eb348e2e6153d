use std::path::Path;
use crate::core::ConfigParams;
use crate::utils::{UpscaleError, UpscaleResult, ValidationError, format_from_extension};

/// Smallest tile the upscaler accepts; 0 means automatic.
const MIN_TILE_SIZE: u32 = 32;

/// Validates the input path: an existing directory, or an existing supported image
pub fn validate_input_path(path: &Path) -> UpscaleResult<()> {
    if !path.exists() {
        return Err(ValidationError::path_not_found(path).into());
    }

    if path.is_dir() {
        return Ok(());
    }

    // This will validate the extension and format
    format_from_extension(path)?;
    Ok(())
}

/// Validates a run configuration before any job is planned
pub fn validate_config(config: &ConfigParams) -> UpscaleResult<()> {
    if config.model.trim().is_empty() {
        return Err(UpscaleError::settings("Model name cannot be empty"));
    }

    if config.model_scale_factor < 2 {
        return Err(UpscaleError::settings(format!(
            "Invalid model scale factor: {}. Must be at least 2",
            config.model_scale_factor
        )));
    }

    if config.resize_value == 0 {
        return Err(UpscaleError::settings(format!(
            "{} target cannot be 0",
            config.resize_mode
        )));
    }

    if config.tile_size != 0 && config.tile_size < MIN_TILE_SIZE {
        return Err(UpscaleError::settings(format!(
            "Invalid tile size: {}. Use 0 (auto) or at least {}",
            config.tile_size, MIN_TILE_SIZE
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{DownsampleFilter, ResizeMode};

    fn config() -> ConfigParams {
        ConfigParams {
            model: "realesrgan-x4plus".to_string(),
            model_scale_factor: 4,
            resize_mode: ResizeMode::Ratio,
            resize_value: 4,
            downsample_filter: DownsampleFilter::Lanczos,
            tile_size: 0,
            gpu_id: 0,
            use_tta: false,
            prefer_lossless_webp: false,
        }
    }

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&config()).is_ok());
    }

    #[test]
    fn test_rejects_zero_resize_target() {
        let config = ConfigParams { resize_mode: ResizeMode::Width, resize_value: 0, ..config() };
        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("width"));
    }

    #[test]
    fn test_rejects_tiny_tiles_but_accepts_auto() {
        assert!(validate_config(&ConfigParams { tile_size: 16, ..config() }).is_err());
        assert!(validate_config(&ConfigParams { tile_size: 32, ..config() }).is_ok());
    }

    #[test]
    fn test_rejects_empty_model_and_unit_scale() {
        assert!(validate_config(&ConfigParams { model: " ".to_string(), ..config() }).is_err());
        assert!(validate_config(&ConfigParams { model_scale_factor: 1, ..config() }).is_err());
    }

    #[test]
    fn test_input_path_checks() {
        let dir = tempfile::tempdir().unwrap();
        assert!(validate_input_path(dir.path()).is_ok());
        assert!(validate_input_path(&dir.path().join("missing.png")).is_err());

        let text = dir.path().join("notes.txt");
        std::fs::write(&text, b"x").unwrap();
        assert!(matches!(validate_input_path(&text), Err(UpscaleError::Format(_))));
    }
}
