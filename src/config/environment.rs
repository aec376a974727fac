use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};

use anyhow::{Context, Result};
use tracing::debug;
use url::Url;

use crate::{
    catalog::Catalog,
    engine::{Engine, EngineConfig},
    env::{collect_credentials, load_env_file_sync, EnvMap},
    session::Session,
};

use super::LoadedConfig;

fn resolve_relative(base: &Path, value: &str) -> PathBuf {
    let candidate = Path::new(value);
    if candidate.is_absolute() {
        candidate.to_path_buf()
    } else {
        base.join(candidate)
    }
}

/// Everything a session needs, resolved from `apilab.json` and command-line overrides.
#[derive(Debug, Clone)]
pub struct EnvironmentContext {
    pub base_dir: PathBuf,
    pub config_dir: PathBuf,
    pub engine_config: EngineConfig,
    pub catalog: Arc<Catalog>,
    pub credentials: HashMap<String, String>,
    pub history_capacity: Option<usize>,
    pub env_files: Vec<PathBuf>,
}

impl EnvironmentContext {
    pub fn engine(&self) -> Engine {
        Engine::new(self.engine_config.clone())
    }

    pub fn session(&self) -> Session {
        Session::new(self.engine(), Arc::clone(&self.catalog))
            .with_credentials(self.credentials.clone())
            .with_history_capacity(self.history_capacity)
    }
}

#[derive(Debug, Clone)]
pub struct EnvironmentBuilder {
    base_dir: PathBuf,
    config_dir: PathBuf,
    config: Option<LoadedConfig>,
    explicit_catalog: Option<PathBuf>,
    explicit_env: Option<PathBuf>,
    proxy_base: Option<String>,
    no_delay: bool,
}

impl EnvironmentBuilder {
    pub fn new(
        base_dir: PathBuf,
        config_dir: PathBuf,
        config: Option<LoadedConfig>,
        explicit_catalog: Option<PathBuf>,
        explicit_env: Option<PathBuf>,
    ) -> Self {
        Self {
            base_dir,
            config_dir,
            config,
            explicit_catalog,
            explicit_env,
            proxy_base: None,
            no_delay: false,
        }
    }

    pub fn proxy_base(mut self, proxy_base: Option<String>) -> Self {
        self.proxy_base = proxy_base;
        self
    }

    pub fn no_delay(mut self, no_delay: bool) -> Self {
        self.no_delay = no_delay;
        self
    }

    pub fn build(&self) -> Result<EnvironmentContext> {
        let cfg = self.config.as_ref().map(|loaded| &loaded.config);

        let mut engine_config = EngineConfig::default();
        if let Some(base) = self
            .proxy_base
            .clone()
            .or_else(|| cfg.and_then(|c| c.proxy_base.clone()))
        {
            Url::parse(&base).with_context(|| format!("invalid proxy base {base}"))?;
            engine_config.proxy_base = base;
        }
        if let Some(ms) = cfg.and_then(|c| c.mock_delay_ms) {
            engine_config.mock_delay = Duration::from_millis(ms);
        }
        if let Some(secs) = cfg.and_then(|c| c.timeout_secs) {
            engine_config.timeout = (secs > 0).then(|| Duration::from_secs(secs));
        }
        if self.no_delay {
            engine_config.mock_delay = Duration::ZERO;
        }

        let mut catalog = if cfg.and_then(|c| c.include_builtin).unwrap_or(true) {
            Catalog::builtin()
        } else {
            Catalog::default()
        };

        let catalog_path = match &self.explicit_catalog {
            Some(explicit) => Some(explicit.clone()),
            None => cfg
                .and_then(|c| c.catalog.as_deref())
                .map(|path| resolve_relative(&self.config_dir, path)),
        };
        if let Some(path) = catalog_path {
            let extra = Catalog::load(&path)
                .with_context(|| format!("loading catalog {}", path.display()))?;
            debug!(path = %path.display(), apis = extra.len(), "loaded catalog");
            catalog.merge(extra);
        }

        let mut env = EnvMap::new();
        let mut env_files = Vec::new();
        let env_path = match &self.explicit_env {
            Some(explicit) => Some(explicit.clone()),
            None => cfg
                .and_then(|c| c.env.as_deref())
                .map(|path| resolve_relative(&self.config_dir, path)),
        };
        if let Some(path) = env_path {
            env_files.push(load_env_file_sync(&path, &mut env)?);
        }
        let credentials = collect_credentials(&env, catalog.ids());

        Ok(EnvironmentContext {
            base_dir: self.base_dir.clone(),
            config_dir: self.config_dir.clone(),
            engine_config,
            catalog: Arc::new(catalog),
            credentials,
            history_capacity: cfg
                .and_then(|c| c.history_capacity)
                .filter(|capacity| *capacity > 0),
            env_files,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::load_config;
    use anyhow::Result;
    use tempfile::tempdir;

    fn write_file(path: &Path, contents: &str) {
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, contents).unwrap();
    }

    #[test]
    fn environment_builder_applies_config_values() -> Result<()> {
        let temp = tempdir()?;
        let base_dir = temp.path().join("workspace");
        let config_dir = temp.path().join("config");
        std::fs::create_dir_all(&base_dir)?;

        write_file(
            &config_dir.join("apilab.json"),
            r#"{
  "proxyBase": "https://relay.example.com/raw",
  "mockDelayMs": 25,
  "timeoutSecs": 0,
  "historyCapacity": 3,
  "catalog": "apis",
  "env": "keys.env"
}
"#,
        );
        write_file(
            &config_dir.join("apis/local.json"),
            r#"[{"id":"local","endpoint":"http://localhost:9000/ping"}]"#,
        );
        write_file(
            &config_dir.join("keys.env"),
            "APILAB_KEY_OPENWEATHERMAP=owm-key\n",
        );

        let loaded = load_config(&config_dir)?.expect("config should be present");
        let environment =
            EnvironmentBuilder::new(base_dir, config_dir.clone(), Some(loaded), None, None)
                .build()?;

        assert_eq!(environment.engine_config.proxy_base, "https://relay.example.com/raw");
        assert_eq!(environment.engine_config.mock_delay, Duration::from_millis(25));
        assert_eq!(environment.engine_config.timeout, None);
        assert_eq!(environment.history_capacity, Some(3));
        assert!(environment.catalog.contains("local"));
        assert!(environment.catalog.contains("openweathermap"));
        assert_eq!(
            environment.credentials.get("openweathermap").map(String::as_str),
            Some("owm-key")
        );
        assert_eq!(environment.env_files, vec![config_dir.join("keys.env")]);
        Ok(())
    }

    #[test]
    fn explicit_overrides_win_over_config() -> Result<()> {
        let temp = tempdir()?;
        let base = temp.path();
        write_file(
            &base.join("apilab.json"),
            r#"{"includeBuiltin": false, "catalog": "missing.json", "mockDelayMs": 900}"#,
        );
        let explicit_catalog = base.join("explicit.json");
        write_file(
            &explicit_catalog,
            r#"{"id":"only","endpoint":"https://only.example.com"}"#,
        );

        let loaded = load_config(base)?;
        let environment = EnvironmentBuilder::new(
            base.to_path_buf(),
            base.to_path_buf(),
            loaded,
            Some(explicit_catalog),
            None,
        )
        .proxy_base(Some("http://127.0.0.1:9/raw".to_string()))
        .no_delay(true)
        .build()?;

        assert_eq!(environment.catalog.len(), 1);
        assert_eq!(environment.engine_config.mock_delay, Duration::ZERO);
        assert_eq!(environment.engine_config.proxy_base, "http://127.0.0.1:9/raw");
        Ok(())
    }

    #[tokio::test]
    async fn zero_history_capacity_means_unbounded() -> Result<()> {
        let temp = tempdir()?;
        write_file(
            &temp.path().join("apilab.json"),
            r#"{"historyCapacity": 0, "mockDelayMs": 0}"#,
        );

        let loaded = load_config(temp.path())?;
        let environment = EnvironmentBuilder::new(
            temp.path().to_path_buf(),
            temp.path().to_path_buf(),
            loaded,
            None,
            None,
        )
        .build()?;
        assert_eq!(environment.history_capacity, None);

        let mut session = environment.session();
        session.select("cat-facts")?;
        session.set_mock_mode(true);
        session.run().await?;
        session.run().await?;
        assert_eq!(session.history().len(), 2);
        Ok(())
    }

    #[test]
    fn rejects_invalid_proxy_base() {
        let temp = tempdir().unwrap();
        let err = EnvironmentBuilder::new(
            temp.path().to_path_buf(),
            temp.path().to_path_buf(),
            None,
            None,
            None,
        )
        .proxy_base(Some("not a url".to_string()))
        .build()
        .unwrap_err();
        assert!(err.to_string().contains("invalid proxy base"));
    }

    #[test]
    fn defaults_without_config() -> Result<()> {
        let temp = tempdir()?;
        let environment = EnvironmentBuilder::new(
            temp.path().to_path_buf(),
            temp.path().to_path_buf(),
            None,
            None,
            None,
        )
        .build()?;

        assert_eq!(environment.engine_config, EngineConfig::default());
        assert_eq!(environment.catalog.len(), Catalog::builtin().len());
        assert!(environment.env_files.is_empty());
        assert_eq!(environment.history_capacity, None);
        Ok(())
    }
}
