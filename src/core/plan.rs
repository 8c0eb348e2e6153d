use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

use crate::core::{ConfigParams, Task, nested_output_path, output_dir_path, output_path};
use crate::utils::{UpscaleResult, ValidationError, discover_images, validate_input_path};
use crate::worker::TaskQueue;

/// Plans the top-level tasks for a file or directory input.
///
/// A directory is walked recursively and yields one task per supported image,
/// mirrored under the output root. Every path is made absolute because the
/// upscaler runs from its own directory.
pub fn plan_jobs(
    input: &Path,
    output: Option<&Path>,
    config: Arc<ConfigParams>,
) -> UpscaleResult<TaskQueue> {
    validate_input_path(input)?;
    let input = std::path::absolute(input)?;

    let queue: TaskQueue = if input.is_dir() {
        let output_root: PathBuf = match output {
            Some(dir) => std::path::absolute(dir)?,
            None => output_dir_path(&input, &config),
        };

        let images = discover_images(&input)?;
        if images.is_empty() {
            return Err(ValidationError::no_images(&input).into());
        }

        debug!("Found {} images under {}", images.len(), input.display());
        images
            .into_iter()
            .map(|image| {
                let target = nested_output_path(&image, &input, &output_root, &config);
                Task::top_level(image, target, Arc::clone(&config))
            })
            .collect()
    } else {
        let target = match output {
            Some(file) => std::path::absolute(file)?,
            None => output_path(&input, &config),
        };
        let mut queue = TaskQueue::new();
        queue.push_back(Task::top_level(input, target, config));
        queue
    };

    info!("Planned {} top-level tasks", queue.len());
    Ok(queue)
}
