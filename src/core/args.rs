//! Argument vector for the external upscaler.

use std::ffi::OsString;
use std::path::Path;
use crate::core::ConfigParams;

/// Builds `-i <input> -o <output> -n <model> -s <scale> [-t <tile>] -g <gpu> [-x]`.
///
/// Pure and total. A tile size of 0 omits `-t` so the upscaler picks one itself.
pub fn executable_args(config: &ConfigParams, input: &Path, output: &Path) -> Vec<OsString> {
    let mut args: Vec<OsString> = vec![
        "-i".into(),
        input.into(),
        "-o".into(),
        output.into(),
        "-n".into(),
        config.model.clone().into(),
        "-s".into(),
        config.model_scale_factor.to_string().into(),
    ];

    if config.tile_size != 0 {
        args.push("-t".into());
        args.push(config.tile_size.to_string().into());
    }

    args.push("-g".into());
    args.push(config.gpu_id.to_string().into());

    if config.use_tta {
        args.push("-x".into());
    }

    args
}
