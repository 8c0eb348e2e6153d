//! Animated GIF decomposition and recombination.
//!
//! Decomposition writes every frame to a temporary workspace and returns one
//! frame task per frame followed by the recombination task. The workspace
//! travels with the recombination task, which removes it when done.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use image::codecs::gif::{GifDecoder, GifEncoder, Repeat};
use image::{AnimationDecoder, Frame};
use tempfile::TempDir;
use tracing::{debug, warn};

use crate::core::{
    AnimationTiming, DecomposeTask, FrameGroup, FrameSlot, ProgressSink, RecombineTask, Task,
    UpscaleTask,
};
use crate::worker::{TaskError, TaskResult};

use super::codec::load_image;

/// Speed of the GIF palette quantizer (1 best, 30 fastest).
const GIF_ENCODE_SPEED: i32 = 10;

/// Frames written to disk, with the workspace that owns them.
struct SplitFrames {
    workspace: TempDir,
    sources: Vec<PathBuf>,
    timing: AnimationTiming,
}

fn frame_source_path(workspace: &Path, index: usize) -> PathBuf {
    workspace.join(format!("frame-{index:05}.png"))
}

fn frame_output_path(workspace: &Path, index: usize) -> PathBuf {
    workspace.join(format!("frame-{index:05}-upscaled.png"))
}

/// Reads the loop setting; `None` when the file has no loop extension.
pub fn read_loop_count(path: &Path) -> TaskResult<Option<Repeat>> {
    let file = File::open(path)?;
    let mut options = gif::DecodeOptions::new();
    options.set_color_output(gif::ColorOutput::Indexed);
    let mut decoder = options
        .read_info(BufReader::new(file))
        .map_err(|e| TaskError::decode(path, e))?;

    // The loop extension precedes the first frame.
    decoder.next_frame_info().map_err(|e| TaskError::decode(path, e))?;

    Ok(match decoder.repeat() {
        gif::Repeat::Infinite => Some(Repeat::Infinite),
        gif::Repeat::Finite(0) => None,
        gif::Repeat::Finite(n) => Some(Repeat::Finite(n)),
    })
}

/// Decodes every frame composited onto the full canvas and writes them to a
/// fresh workspace. On any error the workspace is dropped, and with it every
/// file written so far.
fn split_frames(path: &Path) -> TaskResult<SplitFrames> {
    let repeat = read_loop_count(path)?;

    let file = BufReader::new(File::open(path)?);
    let decoder = GifDecoder::new(file).map_err(|e| TaskError::decode(path, e))?;
    let frames = decoder
        .into_frames()
        .collect_frames()
        .map_err(|e| TaskError::decode(path, e))?;

    if frames.is_empty() {
        return Err(TaskError::decode(path, "no frames"));
    }

    let workspace = tempfile::Builder::new().prefix("upscale-frames-").tempdir()?;
    let mut sources = Vec::with_capacity(frames.len());
    let mut delays = Vec::with_capacity(frames.len());

    for (index, frame) in frames.into_iter().enumerate() {
        delays.push(frame.delay());
        let source = frame_source_path(workspace.path(), index);
        frame
            .into_buffer()
            .save_with_format(&source, image::ImageFormat::Png)?;
        sources.push(source);
    }

    debug!(
        "Split {} into {} frames under {}",
        path.display(),
        sources.len(),
        workspace.path().display()
    );

    Ok(SplitFrames {
        workspace,
        sources,
        timing: AnimationTiming { delays, repeat },
    })
}

/// Expands a composite job into its frame tasks and the recombination task,
/// in execution order.
pub async fn decompose(task: &DecomposeTask, sink: &ProgressSink) -> TaskResult<Vec<Task>> {
    let input = task.input_path.clone();
    let split = tokio::task::spawn_blocking(move || split_frames(&input)).await??;

    let total = split.sources.len();
    let group = Arc::new(FrameGroup::new(&task.input_path, total));
    let outputs: Vec<PathBuf> = (0..total)
        .map(|index| frame_output_path(split.workspace.path(), index))
        .collect();

    let mut follow_ups: Vec<Task> = split
        .sources
        .into_iter()
        .zip(&outputs)
        .enumerate()
        .map(|(index, (input_path, output_path))| {
            Task::Upscale(UpscaleTask {
                input_path,
                output_path: output_path.clone(),
                config: Arc::clone(&task.config),
                frame: Some(FrameSlot { index, group: Arc::clone(&group) }),
            })
        })
        .collect();

    follow_ups.push(Task::Recombine(RecombineTask {
        source_path: task.input_path.clone(),
        output_path: task.output_path.clone(),
        frames: outputs,
        timing: split.timing,
        group,
        workspace: split.workspace,
    }));

    sink.write(format!("Extracted {total} frames"));
    Ok(follow_ups)
}

/// Encodes the whole animation in memory, then writes it in one go so a
/// failure never leaves a truncated file behind.
fn encode_animation(frames: &[PathBuf], timing: &AnimationTiming, output: &Path) -> TaskResult<()> {
    let mut buffer = Vec::new();
    {
        let mut encoder = GifEncoder::new_with_speed(&mut buffer, GIF_ENCODE_SPEED);
        if let Some(repeat) = timing.repeat {
            encoder.set_repeat(repeat)?;
        }
        for (path, delay) in frames.iter().zip(&timing.delays) {
            let image = load_image(path)?.to_rgba8();
            encoder.encode_frame(Frame::from_parts(image, 0, 0, *delay))?;
        }
    }

    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    if let Err(e) = std::fs::write(output, &buffer) {
        if output.exists() {
            if let Err(remove_err) = std::fs::remove_file(output) {
                warn!("Failed to remove partial output {}: {}", output.display(), remove_err);
            }
        }
        return Err(e.into());
    }
    Ok(())
}

/// Reassembles the upscaled frames with the source timing.
///
/// Refuses to run when any frame failed. The workspace is removed on every
/// path out of this function.
pub async fn recombine(task: RecombineTask, sink: &ProgressSink) -> TaskResult<()> {
    let RecombineTask { output_path, frames, timing, group, workspace, .. } = task;

    let failed = group.failed();
    let result = if failed > 0 {
        Err(TaskError::RecombineDependency { failed, total: group.total() })
    } else if frames.len() != timing.delays.len() {
        Err(TaskError::Image(format!(
            "Frame count mismatch: {} frames, {} delays",
            frames.len(),
            timing.delays.len()
        )))
    } else {
        let output = output_path.clone();
        let count = frames.len();
        match tokio::task::spawn_blocking(move || encode_animation(&frames, &timing, &output)).await {
            Ok(Ok(())) => {
                sink.write(format!("Recombined {count} frames"));
                Ok(())
            }
            Ok(Err(e)) => Err(e),
            Err(e) => Err(e.into()),
        }
    };

    let workspace_path = workspace.path().to_path_buf();
    if let Err(e) = workspace.close() {
        warn!("Failed to remove frame workspace {}: {}", workspace_path.display(), e);
    } else {
        debug!("Removed frame workspace {}", workspace_path.display());
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{ConfigParams, DownsampleFilter, ResizeMode};
    use image::{Delay, Rgba, RgbaImage};

    fn config() -> Arc<ConfigParams> {
        Arc::new(ConfigParams {
            model: "realesrgan-x4plus".to_string(),
            model_scale_factor: 4,
            resize_mode: ResizeMode::Ratio,
            resize_value: 4,
            downsample_filter: DownsampleFilter::Lanczos,
            tile_size: 0,
            gpu_id: 0,
            use_tta: false,
            prefer_lossless_webp: false,
        })
    }

    fn write_gif(path: &Path, delays_ms: &[u32], repeat: Option<Repeat>) {
        let file = File::create(path).unwrap();
        let mut encoder = GifEncoder::new(file);
        if let Some(repeat) = repeat {
            encoder.set_repeat(repeat).unwrap();
        }
        for (i, ms) in delays_ms.iter().enumerate() {
            let shade = (i as u8).wrapping_mul(80);
            let image = RgbaImage::from_pixel(6, 4, Rgba([shade, 255 - shade, 40, 255]));
            encoder
                .encode_frame(Frame::from_parts(image, 0, 0, Delay::from_numer_denom_ms(*ms, 1)))
                .unwrap();
        }
    }

    fn delays_of(path: &Path) -> Vec<(u32, u32)> {
        let decoder = GifDecoder::new(BufReader::new(File::open(path).unwrap())).unwrap();
        decoder
            .into_frames()
            .collect_frames()
            .unwrap()
            .iter()
            .map(|f| f.delay().numer_denom_ms())
            .collect()
    }

    #[test]
    fn test_loop_count_is_read() {
        let dir = tempfile::tempdir().unwrap();
        let looping = dir.path().join("loop.gif");
        write_gif(&looping, &[100, 100], Some(Repeat::Infinite));
        assert!(matches!(read_loop_count(&looping).unwrap(), Some(Repeat::Infinite)));

        let once = dir.path().join("once.gif");
        write_gif(&once, &[100, 100], None);
        assert!(!matches!(read_loop_count(&once).unwrap(), Some(Repeat::Infinite)));
    }

    #[tokio::test]
    async fn test_decompose_yields_frames_then_recombine() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("anim.gif");
        write_gif(&source, &[100, 200, 300], Some(Repeat::Infinite));

        let task = DecomposeTask {
            input_path: source.clone(),
            output_path: dir.path().join("anim-x4.gif"),
            config: config(),
        };
        let (sink, _rx) = ProgressSink::channel();
        let follow_ups = decompose(&task, &sink).await.unwrap();

        assert_eq!(follow_ups.len(), 4);
        for (i, task) in follow_ups.iter().take(3).enumerate() {
            match task {
                Task::Upscale(UpscaleTask { input_path, frame: Some(slot), .. }) => {
                    assert_eq!(slot.index, i);
                    assert!(input_path.exists());
                }
                other => panic!("unexpected task {other}"),
            }
        }
        match follow_ups.last() {
            Some(Task::Recombine(recombine)) => {
                assert_eq!(recombine.frames.len(), 3);
                assert_eq!(recombine.timing.delays.len(), 3);
                assert!(recombine.workspace_path().exists());
            }
            _ => panic!("last follow-up must be the recombination"),
        }
    }

    #[tokio::test]
    async fn test_round_trip_keeps_frame_count_delays_and_loop() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("anim.gif");
        let output = dir.path().join("anim-x4.gif");
        write_gif(&source, &[100, 200, 300], Some(Repeat::Infinite));

        let task = DecomposeTask {
            input_path: source.clone(),
            output_path: output.clone(),
            config: config(),
        };
        let (sink, _rx) = ProgressSink::channel();
        let mut follow_ups = decompose(&task, &sink).await.unwrap();

        // Stand in for the upscaler: copy every frame unchanged.
        for task in &follow_ups {
            if let Task::Upscale(frame) = task {
                std::fs::copy(&frame.input_path, &frame.output_path).unwrap();
            }
        }

        let Some(Task::Recombine(recombine_task)) = follow_ups.pop() else {
            panic!("missing recombination");
        };
        let workspace = recombine_task.workspace_path().to_path_buf();
        recombine(recombine_task, &sink).await.unwrap();

        assert_eq!(delays_of(&output), delays_of(&source));
        assert!(matches!(read_loop_count(&output).unwrap(), Some(Repeat::Infinite)));
        assert!(!workspace.exists());
    }

    #[tokio::test]
    async fn test_round_trip_keeps_finite_loop_count() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("thrice.gif");
        let output = dir.path().join("thrice-x4.gif");
        write_gif(&source, &[50, 50], Some(Repeat::Finite(3)));
        assert!(matches!(read_loop_count(&source).unwrap(), Some(Repeat::Finite(3))));

        let task = DecomposeTask {
            input_path: source,
            output_path: output.clone(),
            config: config(),
        };
        let (sink, _rx) = ProgressSink::channel();
        let mut follow_ups = decompose(&task, &sink).await.unwrap();
        for task in &follow_ups {
            if let Task::Upscale(frame) = task {
                std::fs::copy(&frame.input_path, &frame.output_path).unwrap();
            }
        }
        let Some(Task::Recombine(recombine_task)) = follow_ups.pop() else {
            panic!("missing recombination");
        };
        recombine(recombine_task, &sink).await.unwrap();

        assert!(matches!(read_loop_count(&output).unwrap(), Some(Repeat::Finite(3))));
    }

    #[tokio::test]
    async fn test_failed_frame_blocks_recombination_and_cleans_up() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("anim.gif");
        let output = dir.path().join("anim-x4.gif");
        write_gif(&source, &[100, 100], None);

        let task = DecomposeTask {
            input_path: source,
            output_path: output.clone(),
            config: config(),
        };
        let (sink, _rx) = ProgressSink::channel();
        let mut follow_ups = decompose(&task, &sink).await.unwrap();
        let Some(Task::Recombine(recombine_task)) = follow_ups.pop() else {
            panic!("missing recombination");
        };
        recombine_task.group.record_failure();
        let workspace = recombine_task.workspace_path().to_path_buf();

        let err = recombine(recombine_task, &sink).await.unwrap_err();
        assert!(matches!(err, TaskError::RecombineDependency { failed: 1, total: 2 }));
        assert!(!output.exists());
        assert!(!workspace.exists());
    }

    #[tokio::test]
    async fn test_garbage_gif_is_decode_error() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("broken.gif");
        std::fs::write(&source, b"GIF89a but not really").unwrap();

        let task = DecomposeTask {
            input_path: source,
            output_path: dir.path().join("broken-x4.gif"),
            config: config(),
        };
        let (sink, _rx) = ProgressSink::channel();
        let err = decompose(&task, &sink).await.unwrap_err();
        assert!(matches!(err, TaskError::Decode { .. }));
    }
}
