use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use apilab::config::{load_config, EnvironmentBuilder};
use apilab::interactive::run_interactive;
use apilab::printer::{render_catalog, render_descriptor};
use clap::{ArgAction, Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "apilab",
    version,
    about = "Console sandbox for inspecting, invoking and interpreting REST APIs",
    disable_help_subcommand = true
)]
struct Cli {
    /// Directory or file containing apilab.json
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Extra catalog file or directory, merged over the built-in one
    #[arg(long, global = true)]
    catalog: Option<PathBuf>,

    /// Override env file relative to config directory
    #[arg(short, long, global = true)]
    env: Option<PathBuf>,

    /// Override base directory used for resolving paths
    #[arg(long, global = true)]
    cwd: Option<PathBuf>,

    /// CORS relay base URL
    #[arg(long, global = true)]
    proxy_base: Option<String>,

    /// Skip the simulated latency of mock responses
    #[arg(long, global = true)]
    no_delay: bool,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List the APIs in the catalog
    List,
    /// Show the guide for an API
    Show {
        #[arg(value_name = "ID")]
        api: String,
    },
    /// Execute an API once and print the result
    Run {
        #[arg(value_name = "ID")]
        api: String,
        /// API key (defaults to APILAB_KEY_<ID>)
        #[arg(short, long)]
        key: Option<String>,
        /// Route the request through the CORS relay
        #[arg(long)]
        proxy: bool,
        /// Answer from the editable mock instead of the network
        #[arg(long)]
        mock: bool,
        /// Mock body to use (implies --mock)
        #[arg(long, value_name = "FILE")]
        mock_body: Option<PathBuf>,
        /// Print the raw execution result as JSON
        #[arg(long)]
        json: bool,
    },
    /// Export an API call using a named template
    Export {
        #[arg(value_name = "ID")]
        api: String,
        /// Export template name
        #[arg(short, long, default_value = "js-fetch")]
        template: String,
        /// API key to embed (defaults to APILAB_KEY_<ID>)
        #[arg(short, long)]
        key: Option<String>,
        /// Wrap the URL in the CORS relay
        #[arg(long)]
        proxy: bool,
        /// Output file (defaults to stdout)
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let base_dir = cli
        .cwd
        .as_ref()
        .map(|p| resolve_path(Path::new(p)))
        .transpose()?
        .unwrap_or(std::env::current_dir()?);

    let config_target = cli
        .config
        .as_ref()
        .map(|p| resolve_relative(&base_dir, p))
        .unwrap_or_else(|| base_dir.clone());

    let cfg = load_config(&config_target).context("loading configuration")?;
    let config_dir = cfg.as_ref().map(|c| c.dir.clone()).unwrap_or_else(|| {
        if config_target.is_dir() {
            config_target.clone()
        } else {
            config_target
                .parent()
                .map(|p| p.to_path_buf())
                .unwrap_or_else(|| config_target.clone())
        }
    });
    if let Some(loaded) = &cfg {
        debug!(path = %loaded.path.display(), "loaded configuration");
    }

    let environment = EnvironmentBuilder::new(
        base_dir.clone(),
        config_dir.clone(),
        cfg,
        cli.catalog.as_ref().map(|p| resolve_relative(&base_dir, p)),
        cli.env.as_ref().map(|p| resolve_relative(&config_dir, p)),
    )
    .proxy_base(cli.proxy_base.clone())
    .no_delay(cli.no_delay)
    .build()?;

    match cli.command {
        None => run_interactive(&environment).await,
        Some(Commands::List) => {
            println!("{}", render_catalog(&environment.catalog));
            Ok(())
        }
        Some(Commands::Show { api }) => {
            let descriptor = environment
                .catalog
                .get(&api)
                .with_context(|| format!("Unknown API: {api}"))?;
            println!("{}", render_descriptor(descriptor));
            Ok(())
        }
        Some(Commands::Run {
            api,
            key,
            proxy,
            mock,
            mock_body,
            json,
        }) => {
            commands::handle_run(
                &environment,
                commands::RunArgs {
                    api,
                    key,
                    proxy,
                    mock,
                    mock_body: mock_body.map(|p| resolve_relative(&base_dir, &p)),
                    json,
                },
            )
            .await
        }
        Some(Commands::Export {
            api,
            template,
            key,
            proxy,
            out,
        }) => commands::handle_export(
            &environment,
            &api,
            &template,
            key,
            proxy,
            out.map(|p| resolve_relative(&base_dir, &p)),
        ),
    }
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "apilab=debug",
        _ => "apilab=trace",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    // Fails only when a subscriber is already installed.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn resolve_path(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        Ok(std::env::current_dir()?.join(path))
    }
}

fn resolve_relative(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use apilab::catalog::{ApiDescriptor, AuthType, Catalog};
    use apilab::config::EnvironmentContext;
    use apilab::engine::EngineConfig;
    use serde_json::json;
    use std::{collections::HashMap, sync::Arc};
    use tempfile::tempdir;

    struct DirGuard {
        original: PathBuf,
    }

    impl DirGuard {
        fn new(new_dir: &Path) -> Result<Self> {
            let original = std::env::current_dir()?;
            std::env::set_current_dir(new_dir)?;
            Ok(Self { original })
        }
    }

    impl Drop for DirGuard {
        fn drop(&mut self) {
            let _ = std::env::set_current_dir(&self.original);
        }
    }

    fn environment() -> EnvironmentContext {
        let catalog = Catalog::from_descriptors(vec![ApiDescriptor::new(
            "weather",
            "https://api.example.com/weather?q=London",
        )
        .with_auth(AuthType::ApiKey, json!({ "temp": 280 }))])
        .unwrap();
        EnvironmentContext {
            base_dir: PathBuf::from("."),
            config_dir: PathBuf::from("."),
            engine_config: EngineConfig::default().without_delay(),
            catalog: Arc::new(catalog),
            credentials: HashMap::new(),
            history_capacity: None,
            env_files: Vec::new(),
        }
    }

    #[test]
    fn resolve_path_uses_current_directory() -> Result<()> {
        let temp = tempdir()?;
        let _guard = DirGuard::new(temp.path())?;
        let relative = Path::new("catalog/apis.json");
        std::fs::create_dir_all(temp.path().join("catalog"))?;
        std::fs::write(temp.path().join(relative), "[]")?;
        let resolved = resolve_path(relative)?;
        assert!(resolved.is_absolute());
        assert_eq!(
            resolved.canonicalize()?,
            temp.path().join(relative).canonicalize()?
        );
        Ok(())
    }

    #[test]
    fn resolve_relative_joins_when_needed() {
        let base = Path::new("/tmp/base");
        let relative = Path::new("sub/apis.json");
        assert_eq!(resolve_relative(base, relative), base.join(relative));

        let absolute = Path::new("/var/data/apis.json");
        assert_eq!(resolve_relative(base, absolute), absolute);
    }

    #[test]
    fn handle_export_writes_to_file() -> Result<()> {
        let temp = tempdir()?;
        let output_path = temp.path().join("weather.js");

        commands::handle_export(
            &environment(),
            "weather",
            "js-fetch",
            Some("k 1".to_string()),
            false,
            Some(output_path.clone()),
        )?;

        let exported = std::fs::read_to_string(output_path)?;
        assert!(exported.contains("https://api.example.com/weather?q=London&appid=k%201"));
        assert!(exported.contains("method: \"GET\""));
        Ok(())
    }

    #[test]
    fn handle_export_rejects_unknown_api() {
        let err = commands::handle_export(&environment(), "nope", "js-fetch", None, false, None)
            .unwrap_err();
        assert!(err.to_string().contains("Unknown API"));
    }

    #[tokio::test]
    async fn handle_run_reads_mock_body_file() -> Result<()> {
        let temp = tempdir()?;
        let body = temp.path().join("body.json");
        std::fs::write(&body, "{\"temp\": 1}")?;

        commands::handle_run(
            &environment(),
            commands::RunArgs {
                api: "weather".to_string(),
                key: None,
                proxy: false,
                mock: false,
                mock_body: Some(body),
                json: true,
            },
        )
        .await
    }

    #[tokio::test]
    async fn handle_run_reports_missing_mock_body() {
        let err = commands::handle_run(
            &environment(),
            commands::RunArgs {
                api: "weather".to_string(),
                key: None,
                proxy: false,
                mock: true,
                mock_body: Some(PathBuf::from("/definitely/missing.json")),
                json: false,
            },
        )
        .await
        .unwrap_err();
        assert!(err.to_string().contains("reading mock body"));
    }
}

mod commands {
    use std::{path::PathBuf, time::Duration};

    use anyhow::{Context, Result};
    use indicatif::{ProgressBar, ProgressStyle};

    use apilab::{
        config::EnvironmentContext, engine::RunOptions, printer::print_execution_result,
        template,
    };

    pub struct RunArgs {
        pub api: String,
        pub key: Option<String>,
        pub proxy: bool,
        pub mock: bool,
        pub mock_body: Option<PathBuf>,
        pub json: bool,
    }

    pub async fn handle_run(environment: &EnvironmentContext, args: RunArgs) -> Result<()> {
        let mut session = environment.session();
        session.select(&args.api)?;

        if let Some(key) = args.key {
            session.set_credential(Some(key));
        }
        if let Some(path) = &args.mock_body {
            let body = std::fs::read_to_string(path)
                .with_context(|| format!("reading mock body {}", path.display()))?;
            session.set_mock_body(body);
        }
        session.set_mock_mode(args.mock || args.mock_body.is_some());
        session.set_proxy(args.proxy);

        let spinner = (!args.json).then(|| {
            let spinner = ProgressBar::new_spinner();
            if let Ok(style) = ProgressStyle::with_template("{spinner} {msg}") {
                spinner.set_style(style);
            }
            spinner.set_message(format!("Running {}...", args.api));
            spinner.enable_steady_tick(Duration::from_millis(80));
            spinner
        });
        let result = session.run().await;
        if let Some(spinner) = spinner {
            spinner.finish_and_clear();
        }
        let result = result?;

        if args.json {
            println!("{}", serde_json::to_string_pretty(&result)?);
        } else {
            print_execution_result(&result, session.descriptor());
        }
        Ok(())
    }

    pub fn handle_export(
        environment: &EnvironmentContext,
        api: &str,
        template_name: &str,
        key: Option<String>,
        proxy: bool,
        out_path: Option<PathBuf>,
    ) -> Result<()> {
        let descriptor = environment
            .catalog
            .get(api)
            .with_context(|| format!("Unknown API: {api}"))?;
        let options = RunOptions {
            credential: key.or_else(|| environment.credentials.get(api).cloned()),
            proxy_enabled: proxy,
            ..RunOptions::default()
        };

        let rendered = template::render_export_template(
            template_name,
            descriptor,
            &options,
            &environment.engine_config.proxy_base,
        )?;

        if let Some(out) = out_path {
            std::fs::write(&out, rendered)
                .with_context(|| format!("writing export to {}", out.display()))?;
            println!("Export written to {}", out.display());
        } else {
            println!("{}", rendered);
        }
        Ok(())
    }
}
