//! Image work performed by tasks: supervising the upscaler, resizing its
//! output and splitting or reassembling animations.

mod animation;
mod codec;
mod realesrgan;
mod resize;
mod upscale;

pub use animation::{decompose, read_loop_count, recombine};
pub use codec::{load_image, save_image};
pub use realesrgan::{ProcessResult, ProcessRunner, STDERR_TAIL_LINES, normalize_exit};
pub use resize::{apply_resize, model_output_dimensions, resize_target, target_dimensions};
pub use upscale::upscale;
