//! Shared configuration for wapi tools.
//!
//! TOML profiles, credential resolution (env + keyring + plaintext),
//! and translation to a WAPI base URL plus `wapi_api::TransportConfig`.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use wapi_api::{TlsMode, TransportConfig};

/// Keyring service name for stored passwords.
const KEYRING_SERVICE: &str = "wapi";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no credentials configured for profile '{profile}'")]
    NoCredentials { profile: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    /// Default profile name.
    pub default_profile: Option<String>,

    /// Global defaults.
    #[serde(default)]
    pub defaults: Defaults,

    /// Named grid manager profiles.
    #[serde(default)]
    pub profiles: HashMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            defaults: Defaults::default(),
            profiles: HashMap::new(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default)]
    pub insecure: bool,

    #[serde(default = "default_timeout")]
    pub timeout: u64,

    #[serde(default = "default_page_size")]
    pub page_size: u32,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            insecure: false,
            timeout: default_timeout(),
            page_size: default_page_size(),
        }
    }
}

fn default_timeout() -> u64 {
    30
}
fn default_page_size() -> u32 {
    wapi_api::DEFAULT_PAGE_SIZE
}

/// A named grid manager profile.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Profile {
    /// WAPI base URL including the version
    /// (e.g., "https://gm.example.com/wapi/v2.12").
    pub url: String,

    /// Username of an API-enabled account.
    pub username: Option<String>,

    /// Plaintext password; keyring or `WAPI_PASSWORD` take precedence.
    pub password: Option<String>,

    /// PEM bundle used to verify the grid manager certificate.
    pub ca_bundle: Option<PathBuf>,

    /// Disable certificate verification.
    pub insecure: Option<bool>,

    /// Override timeout (seconds).
    pub timeout: Option<u64>,

    /// Override page size for paged queries.
    pub page_size: Option<u32>,
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("com", "wapi", "wapi").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("wapi");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load config from `path`, overlaid with `WAPI_`-prefixed env vars
/// (`WAPI_DEFAULTS__TIMEOUT=60`, `WAPI_DEFAULT_PROFILE=lab`).
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("WAPI_").split("__").ignore(&[
            "username", "password", "profile", "url", "output",
        ]));

    let config: Config = figment.extract()?;
    Ok(config)
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<(), ConfigError> {
    save_config_to(cfg, &config_path())
}

pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Credential resolution ───────────────────────────────────────────

/// Username from the profile, falling back to `WAPI_USERNAME`.
pub fn resolve_username(profile: &Profile) -> Option<String> {
    profile
        .username
        .clone()
        .or_else(|| std::env::var("WAPI_USERNAME").ok())
}

/// Password from `WAPI_PASSWORD`, then the system keyring
/// (`wapi` / `<profile>/password`), then the plaintext profile value.
/// `None` if nothing is set.
pub fn resolve_password(profile: &Profile, profile_name: &str) -> Option<SecretString> {
    // 1. Env var
    if let Ok(pw) = std::env::var("WAPI_PASSWORD") {
        return Some(SecretString::from(pw));
    }

    // 2. Keyring
    if let Ok(entry) = keyring::Entry::new(KEYRING_SERVICE, &format!("{profile_name}/password")) {
        if let Ok(pw) = entry.get_password() {
            return Some(SecretString::from(pw));
        }
    }

    // 3. Plaintext in config
    profile.password.clone().map(SecretString::from)
}

/// Store a profile password in the system keyring.
pub fn store_password(profile_name: &str, password: &str) -> Result<(), ConfigError> {
    keyring::Entry::new(KEYRING_SERVICE, &format!("{profile_name}/password"))
        .and_then(|entry| entry.set_password(password))
        .map_err(|e| ConfigError::Validation {
            field: "keyring".into(),
            reason: e.to_string(),
        })
}

// ── Translation ─────────────────────────────────────────────────────

/// Validate a WAPI base URL and return it without a trailing slash.
pub fn validate_url(raw: &str) -> Result<String, ConfigError> {
    let url: url::Url = raw.parse().map_err(|_| ConfigError::Validation {
        field: "url".into(),
        reason: format!("invalid URL: {raw}"),
    })?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::Validation {
            field: "url".into(),
            reason: format!("expected http(s), got '{}'", url.scheme()),
        });
    }
    Ok(url.as_str().trim_end_matches('/').to_owned())
}

/// Build the transport settings for a profile.
///
/// `insecure` wins over a CA bundle; with neither set, verification
/// follows `defaults.insecure`, falling back to the system store.
pub fn profile_transport(profile: &Profile, defaults: &Defaults) -> TransportConfig {
    let tls = if profile.insecure.unwrap_or(defaults.insecure) {
        TlsMode::DangerAcceptInvalid
    } else if let Some(ref bundle) = profile.ca_bundle {
        TlsMode::CustomCa(bundle.clone())
    } else {
        TlsMode::System
    };

    let timeout = Duration::from_secs(profile.timeout.unwrap_or(defaults.timeout));
    TransportConfig::new(tls).with_timeout(timeout)
}

/// Page size for a profile, falling back to the global default.
pub fn profile_page_size(profile: &Profile, defaults: &Defaults) -> u32 {
    profile.page_size.unwrap_or(defaults.page_size)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
default_profile = "lab"

[defaults]
timeout = 45

[profiles.lab]
url = "https://gm.lab.example.com/wapi/v2.12"
username = "ddiapi"
ca_bundle = "/etc/ssl/gm-bundle.pem"
page_size = 200

[profiles.prod]
url = "https://gm.example.com/wapi/v2.12"
insecure = true
timeout = 10
"#;

    fn load(contents: &str) -> Config {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, contents).unwrap();
        load_config_from(&path).unwrap()
    }

    #[test]
    fn loads_profiles() {
        let cfg = load(SAMPLE);
        assert_eq!(cfg.default_profile.as_deref(), Some("lab"));
        assert_eq!(cfg.defaults.timeout, 45);
        assert_eq!(cfg.defaults.page_size, wapi_api::DEFAULT_PAGE_SIZE);

        let lab = &cfg.profiles["lab"];
        assert_eq!(lab.url, "https://gm.lab.example.com/wapi/v2.12");
        assert_eq!(lab.username.as_deref(), Some("ddiapi"));
        assert_eq!(profile_page_size(lab, &cfg.defaults), 200);
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = load_config_from(&dir.path().join("absent.toml")).unwrap();
        assert!(cfg.profiles.is_empty());
        assert_eq!(cfg.defaults.timeout, 30);
    }

    #[test]
    fn transport_prefers_insecure_then_bundle() {
        let cfg = load(SAMPLE);

        let lab = profile_transport(&cfg.profiles["lab"], &cfg.defaults);
        assert_eq!(
            lab.tls,
            TlsMode::CustomCa(PathBuf::from("/etc/ssl/gm-bundle.pem"))
        );
        assert_eq!(lab.timeout, Duration::from_secs(45));

        let prod = profile_transport(&cfg.profiles["prod"], &cfg.defaults);
        assert_eq!(prod.tls, TlsMode::DangerAcceptInvalid);
        assert_eq!(prod.timeout, Duration::from_secs(10));

        let bare = profile_transport(&Profile::default(), &Defaults::default());
        assert_eq!(bare.tls, TlsMode::System);
    }

    #[test]
    fn url_validation() {
        assert_eq!(
            validate_url("https://gm.example.com/wapi/v2.12/").unwrap(),
            "https://gm.example.com/wapi/v2.12"
        );
        assert!(matches!(
            validate_url("gm.example.com"),
            Err(ConfigError::Validation { .. })
        ));
        assert!(matches!(
            validate_url("ftp://gm.example.com/wapi"),
            Err(ConfigError::Validation { .. })
        ));
    }

    #[test]
    fn profile_username_wins() {
        let profile = Profile {
            username: Some("ddiapi".into()),
            ..Profile::default()
        };
        assert_eq!(resolve_username(&profile).as_deref(), Some("ddiapi"));
    }

    #[test]
    fn save_round_trips_profiles() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let mut cfg = Config::default();
        cfg.profiles.insert(
            "default".into(),
            Profile {
                url: "https://gm.example.com/wapi/v2.12".into(),
                username: Some("admin".into()),
                ..Profile::default()
            },
        );

        save_config_to(&cfg, &path).unwrap();
        let loaded = load_config_from(&path).unwrap();

        assert_eq!(
            loaded.profiles["default"].username.as_deref(),
            Some("admin")
        );
    }
}
