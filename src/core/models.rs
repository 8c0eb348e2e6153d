//! Model discovery.
//!
//! A model is usable when both its `.param` and `.bin` files are present in the
//! models directory next to the upscaler.

use std::collections::BTreeSet;
use std::path::Path;
use tracing::debug;
use crate::utils::UpscaleResult;

/// Listed first, in this order, when installed.
const PREFERRED_MODELS: [&str; 2] = ["realesrgan-x4plus", "realesrgan-x4plus-anime"];

/// Factor used when the model name does not carry one.
pub const DEFAULT_SCALE_FACTOR: u32 = 4;

/// Native factor of a model, read from an `x2`/`x3`/`x4` token in its name.
///
/// Tokens are checked in increasing order and the first match wins.
pub fn model_scale_factor(model: &str) -> u32 {
    (2..=4)
        .find(|i| model.contains(&format!("x{i}")))
        .unwrap_or(DEFAULT_SCALE_FACTOR)
}

/// Lists installed models, preferred ones first, the rest sorted by name.
pub fn discover_models(models_dir: &Path) -> UpscaleResult<Vec<String>> {
    let mut files = BTreeSet::new();
    for entry in std::fs::read_dir(models_dir)? {
        let entry = entry?;
        files.insert(entry.file_name().to_string_lossy().into_owned());
    }

    let mut models: Vec<String> = files
        .iter()
        .filter_map(|name| name.strip_suffix(".param"))
        .filter(|stem| files.contains(&format!("{stem}.bin")))
        .map(str::to_string)
        .collect();

    for preferred in PREFERRED_MODELS.iter().rev() {
        if let Some(pos) = models.iter().position(|m| m == preferred) {
            let model = models.remove(pos);
            models.insert(0, model);
        }
    }

    debug!("Discovered {} models in {}", models.len(), models_dir.display());
    Ok(models)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scale_factor_from_name() {
        assert_eq!(model_scale_factor("realesrgan-x4plus"), 4);
        assert_eq!(model_scale_factor("realesr-animevideov3-x2"), 2);
        assert_eq!(model_scale_factor("realesr-animevideov3-x3"), 3);
        assert_eq!(model_scale_factor("custom-model"), DEFAULT_SCALE_FACTOR);
        assert_eq!(model_scale_factor("x2-to-x4"), 2);
        assert_eq!(model_scale_factor("realesr-x2-from-x4"), 2);
        assert_eq!(model_scale_factor("net-x4-distilled-x3"), 3);
    }

    #[test]
    fn test_discovery_requires_both_files_and_orders_preferred_first() {
        let dir = tempfile::tempdir().unwrap();
        for name in [
            "aaa-x2.bin",
            "aaa-x2.param",
            "realesrgan-x4plus-anime.bin",
            "realesrgan-x4plus-anime.param",
            "realesrgan-x4plus.bin",
            "realesrgan-x4plus.param",
            "orphan.bin",
            "lonely.param",
        ] {
            std::fs::write(dir.path().join(name), b"").unwrap();
        }

        let models = discover_models(dir.path()).unwrap();
        assert_eq!(models, vec!["realesrgan-x4plus", "realesrgan-x4plus-anime", "aaa-x2"]);
    }

    #[test]
    fn test_missing_models_dir_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(discover_models(&dir.path().join("models")).is_err());
    }
}
