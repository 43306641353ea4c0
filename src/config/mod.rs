use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize)]
pub struct EffectiveConfig {
    pub identity: IdentityConfig,
    pub paths: PathsConfig,
    pub ui: UiConfig,
    pub run: RunConfig,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config_path: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct IdentityConfig {
    pub file: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PathsConfig {
    pub status_script: String,
    pub test_script: String,
    pub archive_dir: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct UiConfig {
    pub color: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunConfig {
    /// 0 waits for the external procedures indefinitely.
    pub timeout_secs: u64,
}

impl Default for EffectiveConfig {
    fn default() -> Self {
        Self {
            identity: IdentityConfig {
                file: "~/.bin/username".to_string(),
            },
            paths: PathsConfig {
                status_script: "./bcm_status.sh".to_string(),
                test_script: "./bcm_qa.sh".to_string(),
                archive_dir: "~/Desktop/Test_Results".to_string(),
            },
            ui: UiConfig { color: true },
            run: RunConfig { timeout_secs: 0 },
            config_path: None,
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawConfig {
    identity: Option<RawIdentityConfig>,
    paths: Option<RawPathsConfig>,
    ui: Option<RawUiConfig>,
    run: Option<RawRunConfig>,
}

#[derive(Debug, Deserialize)]
struct RawIdentityConfig {
    file: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawPathsConfig {
    status_script: Option<String>,
    test_script: Option<String>,
    archive_dir: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawUiConfig {
    color: Option<bool>,
}

#[derive(Debug, Deserialize)]
struct RawRunConfig {
    timeout_secs: Option<u64>,
}

pub fn default_config_path(home_dir: &Path) -> PathBuf {
    home_dir.join(".config/bcmqa/config.toml")
}

pub fn load(config_path: Option<&Path>, home_dir: &Path) -> Result<EffectiveConfig> {
    let mut cfg = EffectiveConfig::default();

    let path = config_path
        .map(ToOwned::to_owned)
        .unwrap_or_else(|| default_config_path(home_dir));

    if path.exists() {
        let s = std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;
        let raw: RawConfig = toml::from_str(&s)
            .with_context(|| format!("failed to parse config file (TOML): {}", path.display()))?;
        apply_raw_config(&mut cfg, raw);
        cfg.config_path = Some(path.display().to_string());
    } else if config_path.is_some() {
        return Err(anyhow::anyhow!(
            "config file not found: {}",
            path.display()
        ));
    }

    apply_env_overrides(&mut cfg)?;

    Ok(cfg)
}

fn apply_raw_config(cfg: &mut EffectiveConfig, raw: RawConfig) {
    if let Some(identity) = raw.identity {
        if let Some(file) = identity.file {
            cfg.identity.file = file;
        }
    }

    if let Some(paths) = raw.paths {
        if let Some(status_script) = paths.status_script {
            cfg.paths.status_script = status_script;
        }
        if let Some(test_script) = paths.test_script {
            cfg.paths.test_script = test_script;
        }
        if let Some(archive_dir) = paths.archive_dir {
            cfg.paths.archive_dir = archive_dir;
        }
    }

    if let Some(ui) = raw.ui {
        if let Some(color) = ui.color {
            cfg.ui.color = color;
        }
    }

    if let Some(run) = raw.run {
        if let Some(timeout_secs) = run.timeout_secs {
            cfg.run.timeout_secs = timeout_secs;
        }
    }
}

fn apply_env_overrides(cfg: &mut EffectiveConfig) -> Result<()> {
    if let Some(v) = non_empty_env("BCMQA_IDENTITY_FILE") {
        cfg.identity.file = v;
    }
    if let Some(v) = non_empty_env("BCMQA_STATUS_SCRIPT") {
        cfg.paths.status_script = v;
    }
    if let Some(v) = non_empty_env("BCMQA_TEST_SCRIPT") {
        cfg.paths.test_script = v;
    }
    if let Some(v) = non_empty_env("BCMQA_ARCHIVE_DIR") {
        cfg.paths.archive_dir = v;
    }
    if let Ok(v) = std::env::var("BCMQA_UI_COLOR") {
        cfg.ui.color = parse_bool(&v).with_context(|| "BCMQA_UI_COLOR")?;
    }
    if let Ok(v) = std::env::var("BCMQA_TIMEOUT_SECS") {
        cfg.run.timeout_secs = v
            .trim()
            .parse::<u64>()
            .with_context(|| "BCMQA_TIMEOUT_SECS")?;
    }

    Ok(())
}

fn non_empty_env(key: &str) -> Option<String> {
    let v = std::env::var(key).ok()?;
    let v = v.trim();
    if v.is_empty() {
        None
    } else {
        Some(v.to_string())
    }
}

fn parse_bool(s: &str) -> Result<bool> {
    let s = s.trim().to_ascii_lowercase();
    match s.as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(anyhow::anyhow!(
            "invalid boolean: {s} (expected true|false|1|0|yes|no|on|off)"
        )),
    }
}

pub fn expand_tilde(path: &str, home_dir: &Path) -> PathBuf {
    let path = path.trim();
    if path == "~" {
        return home_dir.to_path_buf();
    }
    if let Some(rest) = path.strip_prefix("~/") {
        return home_dir.join(rest);
    }
    PathBuf::from(path)
}

pub fn resolve_script(path: &str, home_dir: &Path, work_dir: &Path) -> PathBuf {
    let expanded = expand_tilde(path, home_dir);
    if expanded.is_absolute() {
        expanded
    } else {
        work_dir.join(expanded)
    }
}
