use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use caretracker_analysis::workload::StaffingParams;
use caretracker_export::styles::SheetStyles;
use caretracker_scoring::schemes::ppbv::Ppbv;

/// Current config version. Bump this when adding fields or changing shape.
/// Each bump requires a corresponding entry in [`migrate`].
const CURRENT_VERSION: u32 = 1;

const DEFAULT_BIND: &str = "0.0.0.0:8000";
const DEFAULT_CSRF_COOKIE: &str = "csrftoken";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Schema version. Missing or 0 = pre-versioned config.
    #[serde(default)]
    pub config_version: u32,
    #[serde(default = "default_bind")]
    pub bind: String,
    /// Where the store snapshot lives. Without one, data is kept in memory
    /// only and lost on shutdown.
    #[serde(default)]
    pub snapshot_path: Option<PathBuf>,
    #[serde(default = "default_csrf_cookie")]
    pub csrf_cookie: String,
    /// Minutes table and A4 gate thresholds.
    #[serde(default)]
    pub scheme: Ppbv,
    #[serde(default)]
    pub staffing: StaffingParams,
    #[serde(default)]
    pub sheet: SheetStyles,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            config_version: CURRENT_VERSION,
            bind: default_bind(),
            snapshot_path: default_snapshot_path(),
            csrf_cookie: default_csrf_cookie(),
            scheme: Ppbv::default(),
            staffing: StaffingParams::default(),
            sheet: SheetStyles::default(),
        }
    }
}

impl ServerConfig {
    /// Apply `CARETRACKER_BIND` / `CARETRACKER_SNAPSHOT` style overrides.
    pub fn with_overrides(mut self, bind: Option<String>, snapshot: Option<String>) -> Self {
        if let Some(bind) = bind.filter(|b| !b.trim().is_empty()) {
            self.bind = bind;
        }
        if let Some(snapshot) = snapshot.filter(|s| !s.trim().is_empty()) {
            self.snapshot_path = Some(PathBuf::from(snapshot));
        }
        self
    }
}

fn default_bind() -> String {
    DEFAULT_BIND.to_string()
}

fn default_csrf_cookie() -> String {
    DEFAULT_CSRF_COOKIE.to_string()
}

fn default_snapshot_path() -> Option<PathBuf> {
    dirs::data_dir().map(|d| d.join("caretracker").join("snapshot.json"))
}

/// `CARETRACKER_CONFIG`, else `<config dir>/caretracker/config.json`.
pub fn config_path(explicit: Option<String>) -> eyre::Result<PathBuf> {
    if let Some(path) = explicit.filter(|p| !p.trim().is_empty()) {
        return Ok(PathBuf::from(path));
    }
    let base = dirs::config_dir().ok_or_else(|| eyre::eyre!("no config directory found"))?;
    Ok(base.join("caretracker").join("config.json"))
}

/// Load the config at `path`, falling back to defaults when there is none.
pub fn load_config(path: &Path) -> eyre::Result<ServerConfig> {
    if !path.exists() {
        tracing::info!(path = %path.display(), "no config file, using defaults");
        return Ok(ServerConfig::default());
    }

    let contents = std::fs::read_to_string(path)
        .map_err(|e| eyre::eyre!("failed to read config at {}: {e}", path.display()))?;
    let config = parse_config(&contents)?;
    tracing::info!(path = %path.display(), "config loaded");
    Ok(config)
}

/// Parse a config file body, migrating older versions first.
pub fn parse_config(contents: &str) -> eyre::Result<ServerConfig> {
    // Parse as raw JSON so we can run migrations before deserializing.
    let json: serde_json::Value = serde_json::from_str(contents)?;
    let on_disk_version = json
        .get("config_version")
        .and_then(|v| v.as_u64())
        .unwrap_or(0) as u32;

    let migrated = migrate(json, on_disk_version)?;
    let config: ServerConfig = serde_json::from_value(migrated)?;
    Ok(config)
}

/// Run sequential migrations from `from_version` up to [`CURRENT_VERSION`].
fn migrate(mut json: serde_json::Value, from_version: u32) -> eyre::Result<serde_json::Value> {
    if from_version > CURRENT_VERSION {
        return Err(eyre::eyre!(
            "config_version {from_version} is newer than this build supports ({CURRENT_VERSION}). \
             Please update CareTracker."
        ));
    }

    // Files written before versioning carry no config_version.
    if from_version < 1 {
        let obj = json
            .as_object_mut()
            .ok_or_else(|| eyre::eyre!("config is not a JSON object"))?;
        obj.insert(
            "config_version".to_string(),
            serde_json::Value::Number(1.into()),
        );
        tracing::info!("stamped unversioned config as v1");
    }

    Ok(json)
}
