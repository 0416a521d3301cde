use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, anyhow};
use serde::Deserialize;
use tracing::{debug, info};

pub const DEFAULT_MAX_TASKS: usize = 100;
pub const DEFAULT_PAGE_SIZE: usize = 10;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Hard cap on the collection size; creation beyond it is rejected.
    pub max_tasks: usize,
    pub page_size: usize,
    pub color: bool,
    pub calendar: CalendarConfig,
    pub data: DataConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CalendarConfig {
    pub max_tasks_per_day: usize,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct DataConfig {
    /// Path of the JSON task file. Defaults to the platform data dir.
    pub file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_tasks: DEFAULT_MAX_TASKS,
            page_size: DEFAULT_PAGE_SIZE,
            color: true,
            calendar: CalendarConfig::default(),
            data: DataConfig::default(),
        }
    }
}

impl Default for CalendarConfig {
    fn default() -> Self {
        Self {
            max_tasks_per_day: crate::calendar::DEFAULT_MAX_TASKS_PER_DAY,
        }
    }
}

impl Config {
    /// Loads the TOML config, falling back to defaults when no file exists.
    /// A present-but-invalid file is an error: silently ignoring a config
    /// the user wrote would be worse than failing.
    pub fn load(override_path: Option<&Path>) -> anyhow::Result<Self> {
        let path = match override_path {
            Some(path) => path.to_path_buf(),
            None => match default_config_path() {
                Some(path) => path,
                None => {
                    debug!("no config dir on this platform; using defaults");
                    return Ok(Self::default());
                }
            },
        };

        if !path.exists() {
            debug!(config = %path.display(), "no config file; using defaults");
            return Ok(Self::default());
        }

        let text = fs::read_to_string(&path)
            .with_context(|| format!("failed reading {}", path.display()))?;
        let cfg: Config = toml::from_str(&text)
            .with_context(|| format!("failed parsing {}", path.display()))?;

        info!(config = %path.display(), "loaded config");
        Ok(cfg)
    }

    pub fn apply_overrides<I>(&mut self, overrides: I) -> anyhow::Result<()>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        for (key, value) in overrides {
            debug!(key = %key, value = %value, "applying override");
            match key.as_str() {
                "max_tasks" => {
                    self.max_tasks = value
                        .parse()
                        .with_context(|| format!("max_tasks expects an integer, got {value}"))?;
                }
                "page_size" => {
                    self.page_size = value
                        .parse()
                        .with_context(|| format!("page_size expects an integer, got {value}"))?;
                }
                "color" => {
                    self.color = parse_bool(&value)
                        .ok_or_else(|| anyhow!("color expects a boolean, got {value}"))?;
                }
                "calendar.max_tasks_per_day" => {
                    self.calendar.max_tasks_per_day = value.parse().with_context(|| {
                        format!("calendar.max_tasks_per_day expects an integer, got {value}")
                    })?;
                }
                "data.file" => {
                    self.data.file = Some(PathBuf::from(value));
                }
                other => return Err(anyhow!("unknown config key: {other}")),
            }
        }
        Ok(())
    }
}

pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("dayboard").join("config.toml"))
}

/// CLI `--data` wins, then `data.file` from the config, then the platform
/// data dir.
pub fn resolve_data_file(cfg: &Config, cli_override: Option<&Path>) -> anyhow::Result<PathBuf> {
    if let Some(path) = cli_override {
        return Ok(path.to_path_buf());
    }
    if let Some(path) = &cfg.data.file {
        return Ok(expand_tilde(path));
    }
    dirs::data_dir()
        .map(|dir| dir.join("dayboard").join("tasks.json"))
        .ok_or_else(|| anyhow!("could not determine a data directory; set data.file in the config"))
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "on" | "yes" | "true" | "1" => Some(true),
        "off" | "no" | "false" | "0" => Some(false),
        _ => None,
    }
}

fn expand_tilde(path: &Path) -> PathBuf {
    let Some(raw) = path.to_str() else {
        return path.to_path_buf();
    };
    if let Some(rest) = raw.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    path.to_path_buf()
}
