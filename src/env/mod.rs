use std::collections::HashMap;

pub type EnvMap = HashMap<String, String>;

mod loader;

pub use loader::{collect_credentials, credential_variable, load_env_file_sync};
