mod dirs;
mod settings;
mod validation;

pub use dirs::Directories;
pub use settings::{DEFAULT_VIEWER_URL, HelpConfig, SearchConfig};
pub use validation::warn_unknown_fields;
