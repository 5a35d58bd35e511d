pub mod commands;
pub mod ui;
pub mod util;

pub use ui::Output;
pub use util::{CommandContext, upload_from_path, uploads_from_paths};
