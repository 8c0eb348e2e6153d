//! Output naming policy.
//!
//! `photo.jpg` with a 4x ratio becomes `photo-x4.png`; a width target of 1920
//! gives `photo-w1920.png`. Directories get the suffix on the directory name and
//! their files keep their own names.

use std::path::{Path, PathBuf};
use crate::core::ConfigParams;

/// `x<ratio>`, `w<width>` or `h<height>`.
pub fn output_suffix(config: &ConfigParams) -> String {
    format!("{}{}", config.resize_mode.suffix_prefix(), config.resize_value)
}

/// Applies the extension policy: `jpg` becomes `png`, and `png` becomes `webp`
/// when lossless WebP is preferred. Anything else is kept as written.
pub fn output_extension(ext: &str, prefer_lossless_webp: bool) -> String {
    let mut ext = ext.to_string();
    if ext.eq_ignore_ascii_case("jpg") {
        ext = "png".to_string();
    }
    if ext.eq_ignore_ascii_case("png") && prefer_lossless_webp {
        ext = "webp".to_string();
    }
    ext
}

/// Output path for a single file input: `<base>-<suffix>.<ext>`.
///
/// Pure: only the path text is inspected.
pub fn output_path(input: &Path, config: &ConfigParams) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let suffix = output_suffix(config);

    let file_name = match input.extension().and_then(|e| e.to_str()) {
        Some(ext) => format!(
            "{stem}-{suffix}.{}",
            output_extension(ext, config.prefer_lossless_webp)
        ),
        None => format!("{stem}-{suffix}"),
    };

    input.with_file_name(file_name)
}

/// Output root for a directory input: `<dir>-<suffix>`.
pub fn output_dir_path(dir: &Path, config: &ConfigParams) -> PathBuf {
    let name = dir
        .file_name()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    dir.with_file_name(format!("{name}-{}", output_suffix(config)))
}

/// Destination of a file found inside a directory input.
///
/// The relative location under `input_root` is kept under `output_root`; only
/// the extension policy applies to the file name.
pub fn nested_output_path(
    file: &Path,
    input_root: &Path,
    output_root: &Path,
    config: &ConfigParams,
) -> PathBuf {
    let relative = file.strip_prefix(input_root).unwrap_or(file);
    let target = output_root.join(relative);
    match target.extension().and_then(|e| e.to_str()) {
        Some(ext) => {
            let ext = output_extension(ext, config.prefer_lossless_webp);
            target.with_extension(ext)
        }
        None => target,
    }
}
