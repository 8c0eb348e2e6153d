pub mod error;
pub mod validation;
pub mod formats;
pub mod fs;

pub use error::{UpscaleError, UpscaleResult, ValidationError, PathError};
pub use validation::{validate_config, validate_input_path};
pub use formats::{ImageFormat, format_from_extension, is_supported_image};
pub use fs::{discover_images, ensure_parent_dir, file_exists, remove_file_if_exists};
