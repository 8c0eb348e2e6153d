//! Single raster upscale: one upscaler run, then the optional resize step.

use std::path::Path;
use tracing::debug;

use crate::core::{ProgressSink, RunContext, UpscaleTask, executable_args};
use crate::utils::{ensure_parent_dir, file_exists, remove_file_if_exists};
use crate::worker::{TaskError, TaskResult};

use super::codec::{load_image, save_image};
use super::resize::{apply_resize, resize_target};

/// File name of the model output when it still has to be resized.
const MODEL_OUTPUT: &str = "model-output.png";

fn source_dimensions(path: &Path) -> TaskResult<(u32, u32)> {
    image::image_dimensions(path).map_err(|e| TaskError::decode(path, e))
}

pub async fn upscale(task: &UpscaleTask, ctx: &RunContext, sink: &ProgressSink) -> TaskResult<()> {
    let config = &task.config;
    ensure_parent_dir(&task.output_path).await?;
    // A leftover file would pass the output check even if this run writes nothing.
    remove_file_if_exists(&task.output_path).await?;

    let target = if config.is_native_ratio() {
        None
    } else {
        let input = task.input_path.clone();
        let (width, height) = tokio::task::spawn_blocking(move || source_dimensions(&input)).await??;
        resize_target(width, height, config)
    };

    let Some(target) = target else {
        let args = executable_args(config, &task.input_path, &task.output_path);
        return ctx
            .runner()
            .execute(&args, &task.output_path, sink, ctx.cancel_token())
            .await;
    };

    let scratch = tempfile::Builder::new().prefix("upscale-").tempdir()?;
    let model_output = scratch.path().join(MODEL_OUTPUT);
    let args = executable_args(config, &task.input_path, &model_output);
    ctx.runner()
        .execute(&args, &model_output, sink, ctx.cancel_token())
        .await?;

    debug!(
        "Resizing model output to {}x{} with {}",
        target.0, target.1, config.downsample_filter
    );
    let filter = config.downsample_filter;
    let output = task.output_path.clone();
    tokio::task::spawn_blocking(move || -> TaskResult<()> {
        let image = load_image(&model_output)?;
        let resized = apply_resize(image, target, filter);
        save_image(&resized, &output)
    })
    .await??;

    if !file_exists(&task.output_path).await {
        return Err(TaskError::MissingOutput(task.output_path.clone()));
    }

    sink.write(format!("Resized to {}x{}", target.0, target.1));
    Ok(())
}
