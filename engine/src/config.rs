use serde::Deserialize;
use std::{
    env, fs,
    path::{Path, PathBuf},
    time::Duration,
};
use thiserror::Error;
use url::Url;

use finlab_client::{BackendConfig, BackendConfigError};
use finlab_types::ApiKey;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8081";
/// Key the validator accepts in its test profile.
pub const DEFAULT_API_KEY: &str = "finlab-validator-test-api-key";
const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

const BASE_URL_ENV: &str = "FINLAB_BASE_URL";
const API_KEY_ENV: &str = "FINLAB_API_KEY";
const API_VERSION_ENV: &str = "FINLAB_API_VERSION";

/// Contents of `~/.finlab/config.toml`.
///
/// ```toml
/// [backend]
/// base_url = "http://localhost:8081"
/// api_key = "${FINLAB_API_KEY}"
/// connect_timeout_secs = 10
/// api_version = "v1"   # lookups go to /api/v1/accounts/{iban}
///
/// [app]
/// username = "alice"
/// high_contrast = false
/// ```
#[derive(Debug, Default, Deserialize)]
pub struct FinlabConfig {
    pub backend: Option<BackendSection>,
    pub app: Option<AppSection>,
}

#[derive(Default, Deserialize)]
pub struct BackendSection {
    pub base_url: Option<String>,
    /// May be a `${ENV_VAR}` reference.
    pub api_key: Option<String>,
    pub connect_timeout_secs: Option<u64>,
    /// Version segment for account lookups; unset keeps `/accounts/{iban}`.
    pub api_version: Option<String>,
}

// Manual Debug impl to prevent leaking the API key in logs.
impl std::fmt::Debug for BackendSection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendSection")
            .field("base_url", &self.base_url)
            .field(
                "api_key",
                &if self.api_key.is_some() {
                    "[REDACTED]"
                } else {
                    "None"
                },
            )
            .field("connect_timeout_secs", &self.connect_timeout_secs)
            .field("api_version", &self.api_version)
            .finish()
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct AppSection {
    /// Pre-filled login username.
    pub username: Option<String>,
    /// Enable a high-contrast color palette.
    #[serde(default)]
    pub high_contrast: bool,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config at {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config at {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("invalid {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Fully resolved runtime settings.
#[derive(Debug, Clone)]
pub struct Settings {
    pub backend: BackendConfig,
    pub username: Option<String>,
    pub high_contrast: bool,
}

/// Replace `${VAR}` references using `lookup`; unknown variables become empty.
pub fn expand_env_vars_with<F>(value: &str, lookup: F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    let mut out = String::with_capacity(value.len());
    let mut rest = value;

    while let Some(start) = rest.find("${") {
        let Some(len) = rest[start + 2..].find('}') else {
            break;
        };
        out.push_str(&rest[..start]);
        let var = &rest[start + 2..start + 2 + len];
        if !var.is_empty() {
            out.push_str(&lookup(var).unwrap_or_default());
        }
        rest = &rest[start + 3 + len..];
    }

    out.push_str(rest);
    out
}

pub fn expand_env_vars(value: &str) -> String {
    expand_env_vars_with(value, |var| env::var(var).ok())
}

impl FinlabConfig {
    /// Load from the default location. A missing file is `Ok(None)`.
    pub fn load() -> Result<Option<Self>, ConfigError> {
        match config_path() {
            Some(path) => Self::load_from(&path),
            None => Ok(None),
        }
    }

    pub fn load_from(path: &Path) -> Result<Option<Self>, ConfigError> {
        if !path.exists() {
            return Ok(None);
        }

        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(err) => {
                tracing::warn!("Failed to read config at {:?}: {}", path, err);
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source: err,
                });
            }
        };

        match toml::from_str(&content) {
            Ok(config) => Ok(Some(config)),
            Err(err) => {
                tracing::warn!("Failed to parse config at {:?}: {}", path, err);
                Err(ConfigError::Parse {
                    path: path.to_path_buf(),
                    source: err,
                })
            }
        }
    }

    #[must_use]
    pub fn path() -> Option<PathBuf> {
        config_path()
    }

    /// Apply defaults and `FINLAB_*` environment overrides.
    pub fn resolve(&self) -> Result<Settings, ConfigError> {
        self.resolve_with(|var| env::var(var).ok())
    }

    /// [`resolve`](Self::resolve) with an injectable environment.
    pub fn resolve_with<F>(&self, lookup: F) -> Result<Settings, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let backend = self.backend.as_ref();

        let base_url = lookup(BASE_URL_ENV)
            .filter(|v| !v.trim().is_empty())
            .or_else(|| {
                backend
                    .and_then(|b| b.base_url.as_deref())
                    .map(|raw| expand_env_vars_with(raw, &lookup))
            })
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        let api_key = lookup(API_KEY_ENV)
            .filter(|v| !v.trim().is_empty())
            .or_else(|| {
                backend
                    .and_then(|b| b.api_key.as_deref())
                    .map(|raw| expand_env_vars_with(raw, &lookup))
            })
            .unwrap_or_else(|| DEFAULT_API_KEY.to_string());

        let api_version = lookup(API_VERSION_ENV)
            .filter(|v| !v.trim().is_empty())
            .or_else(|| {
                backend
                    .and_then(|b| b.api_version.as_deref())
                    .map(|raw| expand_env_vars_with(raw, &lookup))
            });

        let timeout_secs = backend
            .and_then(|b| b.connect_timeout_secs)
            .unwrap_or(DEFAULT_CONNECT_TIMEOUT_SECS);
        if timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                field: "backend.connect_timeout_secs",
                reason: "must be greater than zero".to_string(),
            });
        }

        let url = Url::parse(base_url.trim()).map_err(|e| ConfigError::Invalid {
            field: "backend.base_url",
            reason: e.to_string(),
        })?;
        let api_key = ApiKey::new(api_key).map_err(|e| ConfigError::Invalid {
            field: "backend.api_key",
            reason: e.to_string(),
        })?;
        let backend = BackendConfig::new(url, api_key)
            .map_err(|e: BackendConfigError| ConfigError::Invalid {
                field: "backend.base_url",
                reason: e.to_string(),
            })?
            .with_connect_timeout(Duration::from_secs(timeout_secs))
            .with_api_version(api_version);

        let app = self.app.as_ref();
        Ok(Settings {
            backend,
            username: app
                .and_then(|a| a.username.as_deref())
                .map(str::trim)
                .filter(|u| !u.is_empty())
                .map(str::to_string),
            high_contrast: app.is_some_and(|a| a.high_contrast),
        })
    }
}

pub fn config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".finlab").join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    fn no_env(_: &str) -> Option<String> {
        None
    }

    // expand_env_vars tests

    #[test]
    fn expand_env_vars_no_vars() {
        assert_eq!(expand_env_vars_with("hello world", no_env), "hello world");
    }

    #[test]
    fn expand_env_vars_single_and_adjacent() {
        let env = env_of(&[("A", "alpha"), ("B", "beta")]);
        assert_eq!(expand_env_vars_with("x ${A} y", &env), "x alpha y");
        assert_eq!(expand_env_vars_with("${A}${B}", &env), "alphabeta");
    }

    #[test]
    fn expand_env_vars_missing_var_becomes_empty() {
        assert_eq!(
            expand_env_vars_with("before ${MISSING} after", no_env),
            "before  after"
        );
    }

    #[test]
    fn expand_env_vars_unclosed_brace_preserved() {
        assert_eq!(
            expand_env_vars_with("test ${UNCLOSED", no_env),
            "test ${UNCLOSED"
        );
    }

    #[test]
    fn expand_env_vars_empty_name_dropped() {
        assert_eq!(expand_env_vars_with("test ${} more", no_env), "test  more");
    }

    // resolve tests

    #[test]
    fn resolve_defaults_without_file() {
        let settings = FinlabConfig::default().resolve_with(no_env).unwrap();
        assert_eq!(
            settings.backend.base_url().as_str(),
            "http://localhost:8081/"
        );
        assert_eq!(settings.backend.api_key().expose(), DEFAULT_API_KEY);
        assert!(settings.username.is_none());
        assert!(!settings.high_contrast);
    }

    #[test]
    fn resolve_reads_file_values_and_expands_key() {
        let config: FinlabConfig = toml::from_str(
            r#"
            [backend]
            base_url = "https://risk.example.com/api/v1"
            api_key = "${SECRET_KEY}"
            connect_timeout_secs = 3

            [app]
            username = "  alice "
            high_contrast = true
            "#,
        )
        .unwrap();

        let settings = config
            .resolve_with(env_of(&[("SECRET_KEY", "from-env")]))
            .unwrap();
        assert_eq!(
            settings.backend.base_url().as_str(),
            "https://risk.example.com/api/v1"
        );
        assert_eq!(settings.backend.api_key().expose(), "from-env");
        assert_eq!(settings.username.as_deref(), Some("alice"));
        assert!(settings.high_contrast);
    }

    #[test]
    fn env_overrides_file() {
        let config: FinlabConfig = toml::from_str(
            r#"
            [backend]
            base_url = "http://file:1"
            api_key = "file-key"
            "#,
        )
        .unwrap();

        let settings = config
            .resolve_with(env_of(&[
                ("FINLAB_BASE_URL", "http://env:2"),
                ("FINLAB_API_KEY", "env-key"),
            ]))
            .unwrap();
        assert_eq!(settings.backend.base_url().as_str(), "http://env:2/");
        assert_eq!(settings.backend.api_key().expose(), "env-key");
    }

    #[test]
    fn api_version_unset_by_default() {
        let settings = FinlabConfig::default().resolve_with(no_env).unwrap();
        assert_eq!(settings.backend.api_version(), None);
    }

    #[test]
    fn api_version_from_file_and_env_override() {
        let config: FinlabConfig = toml::from_str(
            r#"
            [backend]
            base_url = "http://gateway:8080"
            api_version = "v1"
            "#,
        )
        .unwrap();

        let settings = config.resolve_with(no_env).unwrap();
        assert_eq!(settings.backend.api_version(), Some("v1"));
        assert_eq!(
            settings.backend.base_url().as_str(),
            "http://gateway:8080/"
        );

        let settings = config
            .resolve_with(env_of(&[("FINLAB_API_VERSION", "v2")]))
            .unwrap();
        assert_eq!(settings.backend.api_version(), Some("v2"));
    }

    #[test]
    fn empty_expanded_key_is_invalid() {
        let config: FinlabConfig = toml::from_str(
            r#"
            [backend]
            api_key = "${NOT_SET}"
            "#,
        )
        .unwrap();

        let err = config.resolve_with(no_env).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                field: "backend.api_key",
                ..
            }
        ));
    }

    #[test]
    fn bad_base_url_is_invalid() {
        let config: FinlabConfig = toml::from_str(
            r#"
            [backend]
            base_url = "mailto:ops@example.com"
            "#,
        )
        .unwrap();
        assert!(matches!(
            config.resolve_with(no_env).unwrap_err(),
            ConfigError::Invalid {
                field: "backend.base_url",
                ..
            }
        ));
    }

    #[test]
    fn zero_timeout_is_invalid() {
        let config: FinlabConfig = toml::from_str(
            r#"
            [backend]
            connect_timeout_secs = 0
            "#,
        )
        .unwrap();
        assert!(config.resolve_with(no_env).is_err());
    }

    #[test]
    fn debug_redacts_api_key() {
        let section = BackendSection {
            base_url: None,
            api_key: Some("super-secret".to_string()),
            connect_timeout_secs: None,
            api_version: None,
        };
        assert!(!format!("{section:?}").contains("super-secret"));
    }

    // load tests

    #[test]
    fn load_from_missing_file_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = FinlabConfig::load_from(&dir.path().join("config.toml")).unwrap();
        assert!(loaded.is_none());
    }

    #[test]
    fn load_from_parses_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[app]\nusername = \"bob\"\n").unwrap();

        let loaded = FinlabConfig::load_from(&path).unwrap().unwrap();
        assert_eq!(
            loaded.app.and_then(|a| a.username).as_deref(),
            Some("bob")
        );
    }

    #[test]
    fn load_from_reports_parse_errors_with_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[backend\nbase_url = 1").unwrap();

        match FinlabConfig::load_from(&path) {
            Err(ConfigError::Parse { path: reported, .. }) => assert_eq!(reported, path),
            other => panic!("expected parse error, got {other:?}"),
        }
    }
}
