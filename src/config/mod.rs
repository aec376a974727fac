mod environment;
mod loader;

pub use environment::{EnvironmentBuilder, EnvironmentContext};
pub use loader::{load_config, ApilabConfig, LoadedConfig, CONFIG_FILE_NAME};
