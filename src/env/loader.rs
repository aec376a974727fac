use std::{
    collections::HashMap,
    fs,
    io::Cursor,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};

use crate::env::EnvMap;

const CREDENTIAL_PREFIX: &str = "APILAB_KEY_";

pub fn load_env_file_sync(path: &Path, env: &mut EnvMap) -> Result<PathBuf> {
    let content =
        fs::read_to_string(path).with_context(|| format!("reading env file {}", path.display()))?;
    let iter = dotenvy::from_read_iter(Cursor::new(content));

    for item in iter {
        let (key, value) = item.with_context(|| format!("parsing env file {}", path.display()))?;
        env.insert(key, value);
    }

    Ok(path.to_path_buf())
}

/// Variable holding the credential for an API id, e.g. `news-api` -> `APILAB_KEY_NEWS_API`.
pub fn credential_variable(api_id: &str) -> String {
    let suffix: String = api_id
        .chars()
        .map(|ch| {
            if ch.is_ascii_alphanumeric() {
                ch.to_ascii_uppercase()
            } else {
                '_'
            }
        })
        .collect();
    format!("{CREDENTIAL_PREFIX}{suffix}")
}

/// Looks up a credential for each id, preferring `env` over the process environment.
pub fn collect_credentials<'a>(
    env: &EnvMap,
    api_ids: impl IntoIterator<Item = &'a str>,
) -> HashMap<String, String> {
    api_ids
        .into_iter()
        .filter_map(|id| {
            let key = credential_variable(id);
            env.get(&key)
                .cloned()
                .or_else(|| std::env::var(&key).ok())
                .filter(|value| !value.is_empty())
                .map(|value| (id.to_string(), value))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use tempfile::tempdir;

    #[test]
    fn load_env_file_sync_merges_values() -> Result<()> {
        let temp = tempdir()?;
        let env_path = temp.path().join("vars.env");
        fs::write(&env_path, "FOO=bar\nBAZ=qux\n")?;

        let mut env_map = EnvMap::new();
        load_env_file_sync(&env_path, &mut env_map)?;

        assert_eq!(env_map.get("FOO"), Some(&"bar".to_string()));
        assert_eq!(env_map.get("BAZ"), Some(&"qux".to_string()));
        Ok(())
    }

    #[test]
    fn load_env_file_sync_propagates_io_errors() {
        let mut env_map = EnvMap::new();
        let path = PathBuf::from("does-not-exist.env");
        let err = load_env_file_sync(&path, &mut env_map).unwrap_err();
        assert!(err.to_string().contains("reading env file"));
    }

    #[test]
    fn credential_variable_normalizes_ids() {
        assert_eq!(credential_variable("news-api"), "APILAB_KEY_NEWS_API");
        assert_eq!(credential_variable("openweathermap"), "APILAB_KEY_OPENWEATHERMAP");
    }

    #[test]
    fn collect_credentials_skips_missing_and_empty() {
        let mut env = EnvMap::new();
        env.insert("APILAB_KEY_WEATHER_TEST".into(), "w-1".into());
        env.insert("APILAB_KEY_EMPTY_TEST".into(), String::new());

        let credentials = collect_credentials(&env, ["weather-test", "empty-test", "absent-test"]);
        assert_eq!(credentials.len(), 1);
        assert_eq!(credentials.get("weather-test").map(String::as_str), Some("w-1"));
    }
}
