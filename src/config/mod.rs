use std::env;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::view::{FilterMode, SortDirection, SortKey, ViewState};

const APP_DOMAIN: &str = "io";
const APP_ORG: &str = "LicenseTracker";
const APP_NAME: &str = "lictui";
const DEFAULT_LICENSES_FILE: &str = "licenses.toml";

pub struct ConfigLoader {
    paths: ConfigPaths,
}

impl ConfigLoader {
    pub fn discover() -> Result<Self> {
        let paths = ConfigPaths::discover()?;
        Ok(Self { paths })
    }

    pub fn with_paths(paths: ConfigPaths) -> Self {
        Self { paths }
    }

    pub fn paths(&self) -> &ConfigPaths {
        &self.paths
    }

    pub fn load_or_init(&self) -> Result<AppConfig> {
        self.paths.ensure_directories()?;
        if !self.paths.config_file.exists() {
            let default_cfg = AppConfig::default();
            self.write_default_config(&default_cfg)?;
            let mut cfg = default_cfg;
            cfg.post_load(&self.paths)?;
            return Ok(cfg);
        }

        self.load()
    }

    pub fn load(&self) -> Result<AppConfig> {
        let raw = fs::read_to_string(&self.paths.config_file)
            .with_context(|| format!("reading config {}", self.paths.config_file.display()))?;
        let mut cfg: AppConfig = toml::from_str(&raw).context("parsing config toml")?;
        cfg.post_load(&self.paths)?;
        Ok(cfg)
    }

    fn write_default_config(&self, cfg: &AppConfig) -> Result<()> {
        let toml = toml::to_string_pretty(cfg).context("serializing default config")?;
        if let Some(parent) = self.paths.config_file.parent() {
            fs::create_dir_all(parent).with_context(|| format!("creating {}", parent.display()))?;
        }
        let mut file = fs::File::create(&self.paths.config_file)
            .with_context(|| format!("creating config {}", self.paths.config_file.display()))?;
        file.write_all(toml.as_bytes())
            .context("writing default config")?;
        tracing::info!(path = %self.paths.config_file.display(), "wrote default config");
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct ConfigPaths {
    pub config_dir: PathBuf,
    pub config_file: PathBuf,
    pub data_dir: PathBuf,
    pub default_licenses_file: PathBuf,
}

impl ConfigPaths {
    pub fn discover() -> Result<Self> {
        let override_config = env::var("LICTUI_CONFIG").ok().map(PathBuf::from);

        let project_dirs = ProjectDirs::from(APP_DOMAIN, APP_ORG, APP_NAME)
            .context("resolving XDG project directories")?;

        let config_dir = override_config
            .clone()
            .map(|p| {
                if p.is_dir() {
                    p
                } else {
                    p.parent().map(Path::to_path_buf).unwrap_or(p)
                }
            })
            .unwrap_or_else(|| project_dirs.config_dir().to_path_buf());

        let config_file = override_config
            .filter(|p| p.is_file() || p.extension().is_some())
            .unwrap_or_else(|| config_dir.join("config.toml"));

        Ok(Self::rooted(
            config_dir,
            config_file,
            project_dirs.data_dir().to_path_buf(),
        ))
    }

    pub fn rooted(config_dir: PathBuf, config_file: PathBuf, data_dir: PathBuf) -> Self {
        let default_licenses_file = data_dir.join(DEFAULT_LICENSES_FILE);
        Self {
            config_dir,
            config_file,
            data_dir,
            default_licenses_file,
        }
    }

    pub fn ensure_directories(&self) -> Result<()> {
        for dir in [&self.config_dir, &self.data_dir] {
            fs::create_dir_all(dir)
                .with_context(|| format!("creating application directory {}", dir.display()))?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub view: ViewDefaults,
    pub alerts: AlertOptions,
    pub source: SourceOptions,
}

impl AppConfig {
    fn post_load(&mut self, paths: &ConfigPaths) -> Result<()> {
        self.source
            .resolve(paths)
            .context("resolving licenses source")?;
        if self.alerts.days > MAX_ALERT_DAYS {
            tracing::warn!(
                days = self.alerts.days,
                max = MAX_ALERT_DAYS,
                "alert window too large, clamping"
            );
            self.alerts.days = MAX_ALERT_DAYS;
        }
        Ok(())
    }
}

/// Initial view state of the dashboard and the `list` command.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewDefaults {
    pub filter: FilterMode,
    pub sort_key: SortKey,
    pub direction: SortDirection,
    pub show_keys: bool,
}

impl ViewDefaults {
    pub fn to_view_state(&self) -> ViewState {
        ViewState {
            search: String::new(),
            filter: self.filter,
            sort_key: self.sort_key,
            direction: self.direction,
            show_keys: self.show_keys,
        }
    }
}

const MAX_ALERT_DAYS: u32 = 3650;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertOptions {
    pub days: u32,
}

impl Default for AlertOptions {
    fn default() -> Self {
        Self { days: 30 }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceOptions {
    /// TOML or JSON licenses file; demo data is used when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

impl SourceOptions {
    fn resolve(&mut self, paths: &ConfigPaths) -> Result<()> {
        match &self.path {
            Some(path) if path.is_relative() => {
                self.path = Some(paths.config_dir.join(path));
            }
            Some(_) => {}
            None => {
                if paths.default_licenses_file.is_file() {
                    self.path = Some(paths.default_licenses_file.clone());
                }
            }
        }
        if let Some(path) = &self.path {
            if !path.exists() {
                tracing::warn!(path = %path.display(), "configured licenses file does not exist");
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn temp_paths(root: &TempDir) -> ConfigPaths {
        let root = root.path();
        ConfigPaths::rooted(
            root.join("config"),
            root.join("config/config.toml"),
            root.join("data"),
        )
    }

    #[test]
    fn first_run_writes_default_config() -> anyhow::Result<()> {
        let temp = TempDir::new()?;
        let loader = ConfigLoader::with_paths(temp_paths(&temp));
        let cfg = loader.load_or_init()?;
        assert!(loader.paths().config_file.is_file());
        assert_eq!(cfg.alerts.days, 30);
        assert_eq!(cfg.view.sort_key, SortKey::ExpiryDate);
        assert!(cfg.source.path.is_none());

        let written = fs::read_to_string(&loader.paths().config_file)?;
        assert!(written.contains("sort_key = \"expiry-date\""), "{written}");

        let reloaded = loader.load()?;
        assert_eq!(reloaded.view.filter, FilterMode::All);
        assert!(!reloaded.view.show_keys);
        Ok(())
    }

    #[test]
    fn reads_view_defaults_and_relative_source() -> anyhow::Result<()> {
        let temp = TempDir::new()?;
        let paths = temp_paths(&temp);
        paths.ensure_directories()?;
        fs::write(
            &paths.config_file,
            r#"
[view]
filter = "expiring-soon"
sort_key = "vendor"
direction = "descending"
show_keys = true

[alerts]
days = 14

[source]
path = "inventory/licenses.json"
"#,
        )?;
        let cfg = ConfigLoader::with_paths(paths.clone()).load()?;
        let view = cfg.view.to_view_state();
        assert_eq!(view.filter, FilterMode::ExpiringSoon);
        assert_eq!(view.sort_key, SortKey::Vendor);
        assert_eq!(view.direction, SortDirection::Descending);
        assert!(view.show_keys);
        assert!(view.search.is_empty());
        assert_eq!(cfg.alerts.days, 14);
        assert_eq!(
            cfg.source.path,
            Some(paths.config_dir.join("inventory/licenses.json"))
        );
        Ok(())
    }

    #[test]
    fn picks_up_licenses_file_in_data_dir() -> anyhow::Result<()> {
        let temp = TempDir::new()?;
        let paths = temp_paths(&temp);
        paths.ensure_directories()?;
        fs::write(&paths.default_licenses_file, "")?;
        let cfg = ConfigLoader::with_paths(paths.clone()).load_or_init()?;
        assert_eq!(cfg.source.path, Some(paths.default_licenses_file));
        Ok(())
    }

    #[test]
    fn clamps_oversized_alert_window() -> anyhow::Result<()> {
        let temp = TempDir::new()?;
        let paths = temp_paths(&temp);
        paths.ensure_directories()?;
        fs::write(&paths.config_file, "[alerts]\ndays = 100000\n")?;
        let cfg = ConfigLoader::with_paths(paths).load()?;
        assert_eq!(cfg.alerts.days, MAX_ALERT_DAYS);
        Ok(())
    }
}
