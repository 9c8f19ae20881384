//! Settings and filesystem layout

mod paths;
mod settings;

pub use paths::{RegoPaths, BACKUP_DIR_ENV, CONFIG_ENV};
pub use settings::{Settings, Timeouts, DEFAULT_DOTFILES};
