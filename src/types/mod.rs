pub mod error;
pub mod utils;

pub use error::{ErrorCategory, ErrorClassifier, LlmError, RefinerError, Result};
pub use utils::{log_filter_warn, truncate_chars};
