use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use anamnesis_gemini::client::{DEFAULT_BASE_URL, DEFAULT_MODEL};
use anamnesis_gemini::retry::{
    DEFAULT_INITIAL_DELAY, DEFAULT_MAX_JITTER, DEFAULT_MAX_RETRIES, RetryPolicy,
};

/// Current config version. Bump this when changing the shape of an existing
/// field; each bump requires a corresponding entry in [`migrate`]. Added
/// fields only need a default.
const CURRENT_VERSION: u32 = 1;

const CONFIG_FILE: &str = "config.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnamnesisConfig {
    /// Schema version. Hand-written files may omit it and are read as the
    /// current shape.
    pub config_version: u32,
    pub model: String,
    pub api_base_url: String,
    pub retry: RetrySettings,
    /// Overrides the platform data directory for saved cases and the key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,
    pub created_at: jiff::Timestamp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrySettings {
    pub max_retries: u32,
    pub initial_delay_ms: u64,
    pub max_jitter_ms: u64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            initial_delay_ms: DEFAULT_INITIAL_DELAY.as_millis() as u64,
            max_jitter_ms: DEFAULT_MAX_JITTER.as_millis() as u64,
        }
    }
}

impl RetrySettings {
    pub fn policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.max_retries,
            initial_delay: Duration::from_millis(self.initial_delay_ms),
            max_jitter: Duration::from_millis(self.max_jitter_ms),
        }
    }
}

impl Default for AnamnesisConfig {
    fn default() -> Self {
        Self {
            config_version: CURRENT_VERSION,
            model: DEFAULT_MODEL.to_string(),
            api_base_url: DEFAULT_BASE_URL.to_string(),
            retry: RetrySettings::default(),
            data_dir: None,
            created_at: jiff::Timestamp::now(),
        }
    }
}

/// Where the API key came from. Printed next to the redacted key hint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeySource {
    Flag,
    GeminiEnv,
    ApiKeyEnv,
    Stored,
}

impl KeySource {
    pub fn describe(self) -> &'static str {
        match self {
            KeySource::Flag => "--api-key",
            KeySource::GeminiEnv => "GEMINI_API_KEY",
            KeySource::ApiKeyEnv => "API_KEY",
            KeySource::Stored => "saved key",
        }
    }
}

pub fn config_dir() -> eyre::Result<PathBuf> {
    let base = dirs::config_dir().ok_or_else(|| eyre::eyre!("no config directory found"))?;
    Ok(base.join("com.anamnesis.cli"))
}

/// Directory for saved cases and the stored key: the configured override, or
/// the platform data directory.
pub fn data_dir(config: &AnamnesisConfig) -> eyre::Result<PathBuf> {
    if let Some(dir) = &config.data_dir {
        return Ok(dir.clone());
    }
    let base = dirs::data_dir().ok_or_else(|| eyre::eyre!("no data directory found"))?;
    Ok(base.join("com.anamnesis.cli"))
}

/// Load the config from `dir`, falling back to defaults when none exists.
pub fn load_config(dir: &Path) -> eyre::Result<AnamnesisConfig> {
    let path = dir.join(CONFIG_FILE);
    if !path.exists() {
        tracing::debug!(path = %path.display(), "no config file, using defaults");
        return Ok(AnamnesisConfig::default());
    }
    let contents = std::fs::read_to_string(&path)
        .map_err(|e| eyre::eyre!("failed to read config at {}: {e}", path.display()))?;

    // Parse as raw JSON so we can run migrations before deserializing.
    let json: serde_json::Value = serde_json::from_str(&contents)?;
    let on_disk_version = json
        .get("config_version")
        .and_then(|v| v.as_u64())
        .unwrap_or(u64::from(CURRENT_VERSION)) as u32;

    let migrated = migrate(json, on_disk_version)?;
    let config: AnamnesisConfig = serde_json::from_value(migrated)?;
    Ok(config)
}

/// Run sequential migrations from `from_version` up to [`CURRENT_VERSION`].
///
/// Each migration is a pure transform on the raw JSON value.
pub fn migrate(json: serde_json::Value, from_version: u32) -> eyre::Result<serde_json::Value> {
    if from_version > CURRENT_VERSION {
        return Err(eyre::eyre!(
            "config_version {from_version} is newer than this build supports ({CURRENT_VERSION}). \
             Please update anamnesis."
        ));
    }

    Ok(json)
}

pub fn save_config(dir: &Path, config: &AnamnesisConfig) -> eyre::Result<()> {
    std::fs::create_dir_all(dir)?;

    // Always write the current version, regardless of what was loaded.
    let mut stamped = config.clone();
    stamped.config_version = CURRENT_VERSION;

    let path = dir.join(CONFIG_FILE);
    let json = serde_json::to_string_pretty(&stamped)?;

    let tmp_path = dir.join("config.json.tmp");
    std::fs::write(&tmp_path, json.as_bytes())?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(&tmp_path, std::fs::Permissions::from_mode(0o600))?;
    }

    std::fs::rename(&tmp_path, &path)?;

    tracing::info!(path = %path.display(), "config saved");
    Ok(())
}

/// Pick the API key: the flag, then `GEMINI_API_KEY`, then `API_KEY`, then the
/// saved key. Blank values are skipped.
///
/// `env` is the variable lookup, normally `|name| std::env::var(name).ok()`.
pub fn resolve_api_key(
    flag: Option<&str>,
    env: impl Fn(&str) -> Option<String>,
    stored: Option<String>,
) -> Option<(String, KeySource)> {
    let candidates = [
        (flag.map(str::to_string), KeySource::Flag),
        (env("GEMINI_API_KEY"), KeySource::GeminiEnv),
        (env("API_KEY"), KeySource::ApiKeyEnv),
        (stored, KeySource::Stored),
    ];
    candidates.into_iter().find_map(|(value, source)| {
        let key = value?.trim().to_string();
        (!key.is_empty()).then_some((key, source))
    })
}

/// `AIza...wxyz`. Short keys are fully masked.
pub fn redact_api_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() <= 8 {
        return "****".to_string();
    }
    let prefix: String = chars[..4].iter().collect();
    let suffix: String = chars[chars.len() - 4..].iter().collect();
    format!("{prefix}...{suffix}")
}
