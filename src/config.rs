use std::path::{Path, PathBuf};

use facet::Facet;

use crate::cli::Cli;
use crate::create::CreationPolicy;
use crate::error::VboxError;
use crate::paths;

pub const DEFAULT_TOOL: &str = "VBoxManage";

/// Optional `vboxmenu.toml`. Every key may be omitted.
#[derive(Debug, Clone, Default, Facet)]
#[facet(default)]
pub struct Config {
    /// VBoxManage executable, by name (looked up on PATH) or by path.
    pub tool: Option<String>,
    /// Root for per-VM directories.
    pub base_dir: Option<String>,
    /// `best-effort` or `abort-on-failure`.
    pub policy: Option<String>,
    pub log_file: Option<String>,
}

/// Resolved runtime settings: CLI flags over config file over defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub tool: PathBuf,
    pub base_dir: PathBuf,
    pub policy: CreationPolicy,
    pub log_file: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            tool: PathBuf::from(DEFAULT_TOOL),
            base_dir: PathBuf::from("."),
            policy: CreationPolicy::BestEffort,
            log_file: None,
        }
    }
}

/// Load the config file (if any) and merge CLI overrides on top.
pub fn load_settings(cli: &Cli) -> Result<Settings, VboxError> {
    let (config, source) = match &cli.config {
        Some(path) => (load_config(path)?, Some(path.clone())),
        None => match find_config() {
            Some(path) => (load_config(&path)?, Some(path)),
            None => (Config::default(), None),
        },
    };

    let settings = resolve(cli, &config, source.as_deref())?;
    tracing::debug!(config = ?source, ?settings, "resolved settings");
    Ok(settings)
}

/// First existing config among `./vboxmenu.toml` and the per-user file.
fn find_config() -> Option<PathBuf> {
    let local = PathBuf::from(paths::LOCAL_CONFIG);
    if local.is_file() {
        return Some(local);
    }
    paths::user_config_path().filter(|p| p.is_file())
}

pub fn load_config(path: &Path) -> Result<Config, VboxError> {
    let contents = std::fs::read_to_string(path).map_err(|source| VboxError::ConfigLoad {
        path: path.display().to_string(),
        source,
    })?;

    facet_toml::from_str(&contents).map_err(|e| VboxError::ConfigParse {
        path: path.display().to_string(),
        message: e.to_string(),
    })
}

fn resolve(cli: &Cli, config: &Config, source: Option<&Path>) -> Result<Settings, VboxError> {
    let defaults = Settings::default();

    let policy: CreationPolicy = match (cli.policy, config.policy.as_deref()) {
        (Some(arg), _) => arg.into(),
        (None, Some(text)) => {
            text.parse::<CreationPolicy>()
                .map_err(|message| VboxError::ConfigParse {
                    path: source.map_or_else(|| "<none>".into(), |p| p.display().to_string()),
                    message,
                })?
        }
        (None, None) => defaults.policy,
    };

    Ok(Settings {
        tool: cli
            .tool
            .clone()
            .or_else(|| config.tool.as_ref().map(PathBuf::from))
            .unwrap_or(defaults.tool),
        base_dir: cli
            .base_dir
            .clone()
            .or_else(|| config.base_dir.as_ref().map(PathBuf::from))
            .unwrap_or(defaults.base_dir),
        policy,
        log_file: cli
            .log_file
            .clone()
            .or_else(|| config.log_file.as_ref().map(PathBuf::from)),
    })
}
