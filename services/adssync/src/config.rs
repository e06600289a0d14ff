//! Service configuration
//!
//! Loaded with figment: struct defaults, then the YAML file, then
//! `ADSSYNC_`-prefixed environment variables (`ADSSYNC_ADS__PORT=852`).
//!
//! ```yaml
//! ads:
//!   server_netid: "5.80.201.232.1.1"
//!   port: 851
//!   target_username: "Administrator"
//!   target_password: ""
//!   symbols_path: "config/adssymbols.yaml"
//! engine:
//!   cycle_interval_ms: 10
//! logging:
//!   level: info
//! ```
//!
//! The older layout (`ADS:` with `ads_server_netid`, `ads_target_username`,
//! `ads_target_pw`, `ads_var_list_path`) is accepted as well. It is rewritten
//! to the current keys before the environment is merged, so
//! `ADSSYNC_ADS__*` overrides apply to either layout.

use common::serde_helpers::deserialize_string_flexible;
use figment::{
    providers::{Env, Format, Serialized, Yaml},
    value::{Dict, Value},
    Figment, Profile, Provider,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{AdsSyncError, Result};
use crate::runtime::EngineConfig;
use crate::transport::{AdsTarget, AmsNetId, DEFAULT_ADS_PORT};

/// Environment variable prefix
pub const ENV_PREFIX: &str = "ADSSYNC_";

/// Default configuration file
pub const DEFAULT_CONFIG_PATH: &str = "config/adssync.yaml";

/// Top-level section name of the older layout
const LEGACY_ADS_SECTION: &str = "ADS";

/// Older `ads` keys and their current names
const LEGACY_ADS_KEYS: [(&str, &str); 4] = [
    ("ads_server_netid", "server_netid"),
    ("ads_target_username", "target_username"),
    ("ads_target_pw", "target_password"),
    ("ads_var_list_path", "symbols_path"),
];

/// Controller connection settings
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdsConfig {
    pub server_netid: String,
    pub port: u16,
    #[serde(deserialize_with = "deserialize_string_flexible")]
    pub target_username: String,
    #[serde(deserialize_with = "deserialize_string_flexible")]
    pub target_password: String,
    pub symbols_path: PathBuf,
}

impl Default for AdsConfig {
    fn default() -> Self {
        Self {
            server_netid: "127.0.0.1.1.1".to_string(),
            port: DEFAULT_ADS_PORT,
            target_username: String::new(),
            target_password: String::new(),
            symbols_path: PathBuf::from("config/adssymbols.yaml"),
        }
    }
}

impl fmt::Debug for AdsConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdsConfig")
            .field("server_netid", &self.server_netid)
            .field("port", &self.port)
            .field("target_username", &self.target_username)
            .field("target_password", &"<redacted>")
            .field("symbols_path", &self.symbols_path)
            .finish()
    }
}

/// Poll-cycle settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSection {
    pub cycle_interval_ms: u64,
}

impl Default for EngineSection {
    fn default() -> Self {
        Self {
            cycle_interval_ms: 10,
        }
    }
}

/// Logging settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    pub level: String,
    /// Directory for rolling log files; console only when absent
    pub dir: Option<PathBuf>,
    pub json: bool,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            dir: None,
            json: false,
        }
    }
}

/// Complete service configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub ads: AdsConfig,
    pub engine: EngineSection,
    pub logging: LoggingSection,
}

impl AppConfig {
    /// Load and validate the configuration file at `path`
    ///
    /// A missing or malformed file is a configuration error.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        Self::load_with_env_prefix(path.as_ref(), ENV_PREFIX)
    }

    fn load_with_env_prefix(path: &Path, env_prefix: &str) -> Result<Self> {
        if !path.is_file() {
            return Err(AdsSyncError::config(format!(
                "Configuration file not found: {}",
                path.display()
            )));
        }

        let mut file = Yaml::file(path).data().map_err(|e| {
            AdsSyncError::config(format!("Failed to load {}: {}", path.display(), e))
        })?;
        let mut dict = file.remove(&Profile::Default).unwrap_or_default();
        normalize_legacy_layout(&mut dict)?;

        let config: AppConfig = Figment::from(Serialized::defaults(dict))
            .merge(Env::prefixed(env_prefix).split("__"))
            .extract()
            .map_err(|e| {
                AdsSyncError::config(format!("Failed to load {}: {}", path.display(), e))
            })?;

        config.validate()?;
        Ok(config)
    }

    /// Check values that deserialize but cannot work
    pub fn validate(&self) -> Result<()> {
        if self.ads.server_netid.trim().is_empty() {
            return Err(AdsSyncError::config("ads.server_netid cannot be empty"));
        }
        self.ads.server_netid.parse::<AmsNetId>()?;

        if self.ads.port == 0 {
            return Err(AdsSyncError::config("ads.port cannot be 0"));
        }
        if self.ads.symbols_path.as_os_str().is_empty() {
            return Err(AdsSyncError::config("ads.symbols_path cannot be empty"));
        }
        if self.engine.cycle_interval_ms == 0 {
            return Err(AdsSyncError::config(
                "engine.cycle_interval_ms must be greater than 0",
            ));
        }
        Ok(())
    }

    /// Session parameters for the transport
    pub fn target(&self) -> Result<AdsTarget> {
        let net_id = self.ads.server_netid.parse::<AmsNetId>()?;
        Ok(AdsTarget::new(net_id, self.ads.port)
            .with_credentials(&self.ads.target_username, &self.ads.target_password))
    }

    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            cycle_interval: Duration::from_millis(self.engine.cycle_interval_ms),
        }
    }
}

/// Rewrite the older `ADS` section and its `ads_*` keys to the current names
fn normalize_legacy_layout(dict: &mut Dict) -> Result<()> {
    if let Some(legacy) = dict.remove(LEGACY_ADS_SECTION) {
        if dict.contains_key("ads") {
            return Err(AdsSyncError::config(
                "Both `ADS` and `ads` sections are present",
            ));
        }
        dict.insert("ads".to_string(), legacy);
    }

    let Some(Value::Dict(_, section)) = dict.get_mut("ads") else {
        return Ok(());
    };
    for (legacy, current) in LEGACY_ADS_KEYS {
        let Some(value) = section.remove(legacy) else {
            continue;
        };
        if section.contains_key(current) {
            return Err(AdsSyncError::config(format!(
                "Both `{}` and `{}` are set in the ads section",
                legacy, current
            )));
        }
        section.insert(current.to_string(), value);
    }
    Ok(())
}
