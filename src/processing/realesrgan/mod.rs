mod executor;
mod types;

pub use executor::{ProcessRunner, normalize_exit};
pub use types::{ProcessResult, STDERR_TAIL_LINES};
