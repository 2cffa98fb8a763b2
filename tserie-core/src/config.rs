//! Runtime configuration (TOML) and vendor credentials.
//!
//! Every section is optional; a missing file means defaults throughout.
//!
//! ```toml
//! [credentials]
//! api_key_file = "quandl_api.key"
//! policy = "require"
//!
//! [products]
//! NG = "CHRIS/CME_NG1"
//!
//! [analysis]
//! align = "strict"
//! returns = "log_diff"
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::data::column::DEFAULT_PRICE_COLUMNS;
use crate::data::AlignPolicy;
use crate::domain::Transform;

/// Looked up in the working directory when no `--config` is given.
pub const DEFAULT_CONFIG_FILE: &str = "tserie.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("no price column among {available:?} (looked for {priority:?})")]
    NoPriceColumn {
        available: Vec<String>,
        priority: Vec<String>,
    },

    #[error("no API key: set ${env} or create {}", file.display())]
    MissingApiKey { env: String, file: PathBuf },

    #[error("cannot read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// What to do when no API key can be found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyPolicy {
    /// Log a warning and send anonymous (rate-limited) requests.
    #[default]
    Warn,
    /// Refuse to build the primary-vendor provider.
    Require,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CredentialsConfig {
    pub api_key_file: PathBuf,
    pub api_key_env: String,
    pub policy: KeyPolicy,
}

impl Default for CredentialsConfig {
    fn default() -> Self {
        Self {
            api_key_file: PathBuf::from("quandl_api.key"),
            api_key_env: "QUANDL_API_KEY".into(),
            policy: KeyPolicy::Warn,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct VendorConfig {
    pub quandl_base_url: String,
    pub yahoo_base_url: String,
    pub timeout_secs: u64,
}

impl Default for VendorConfig {
    fn default() -> Self {
        Self {
            quandl_base_url: "https://data.nasdaq.com".into(),
            yahoo_base_url: "https://query2.finance.yahoo.com".into(),
            timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ColumnConfig {
    /// Candidate price columns, highest priority first.
    pub priority: Vec<String>,
}

impl Default for ColumnConfig {
    fn default() -> Self {
        Self {
            priority: DEFAULT_PRICE_COLUMNS.iter().map(|c| c.to_string()).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AnalysisConfig {
    pub rolling_window: usize,
    pub align: AlignPolicy,
    pub returns: Transform,
    pub nlags: usize,
    pub histogram_bins: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            rolling_window: 250,
            align: AlignPolicy::Inner,
            returns: Transform::PctChange,
            nlags: 40,
            histogram_bins: 30,
        }
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TserieConfig {
    pub credentials: CredentialsConfig,
    pub vendors: VendorConfig,
    pub columns: ColumnConfig,
    /// Extra `CODE = "DATABASE/DATASET"` primary-vendor products, merged
    /// over the built-in table.
    pub products: BTreeMap<String, String>,
    pub analysis: AnalysisConfig,
}

impl TserieConfig {
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Load `path` if given, else `./tserie.toml` if it exists, else defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => {
                tracing::debug!(path = %path.display(), "loading config");
                Self::from_file(path)
            }
            None => {
                let default = Path::new(DEFAULT_CONFIG_FILE);
                if default.is_file() {
                    tracing::debug!(path = DEFAULT_CONFIG_FILE, "loading config");
                    Self::from_file(default)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.columns.priority.is_empty() {
            return Err(ConfigError::Invalid("columns.priority is empty".into()));
        }
        if self.vendors.timeout_secs == 0 {
            return Err(ConfigError::Invalid("vendors.timeout_secs must be > 0".into()));
        }
        if self.analysis.rolling_window < 2 {
            return Err(ConfigError::Invalid(
                "analysis.rolling_window must be >= 2".into(),
            ));
        }
        if self.analysis.nlags == 0 {
            return Err(ConfigError::Invalid("analysis.nlags must be >= 1".into()));
        }
        if self.analysis.histogram_bins == 0 {
            return Err(ConfigError::Invalid(
                "analysis.histogram_bins must be >= 1".into(),
            ));
        }
        for (code, dataset) in &self.products {
            let well_formed = dataset
                .split_once('/')
                .is_some_and(|(db, ds)| !db.is_empty() && !ds.is_empty());
            if code.trim().is_empty() || !well_formed {
                return Err(ConfigError::Invalid(format!(
                    "products.{code} = '{dataset}': expected \"DATABASE/DATASET\""
                )));
            }
        }
        Ok(())
    }
}

/// The primary vendor's API key, resolved once and handed to the provider.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    api_key: Option<String>,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let key = self.api_key.as_ref().map(|_| "<redacted>");
        f.debug_struct("Credentials").field("api_key", &key).finish()
    }
}

impl Credentials {
    pub fn anonymous() -> Self {
        Self { api_key: None }
    }

    pub fn with_key(key: impl Into<String>) -> Self {
        Self {
            api_key: Some(key.into()),
        }
    }

    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref()
    }

    /// Environment variable first, then the key file.
    pub fn resolve(config: &CredentialsConfig) -> Result<Self, ConfigError> {
        Self::resolve_with(config, |name| std::env::var(name).ok())
    }

    /// [`Credentials::resolve`] with an injectable environment lookup.
    pub fn resolve_with(
        config: &CredentialsConfig,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        if let Some(key) = env(&config.api_key_env).and_then(non_blank) {
            tracing::debug!(source = %config.api_key_env, "API key from environment");
            return Ok(Self::with_key(key));
        }

        match fs::read_to_string(&config.api_key_file) {
            Ok(content) => {
                if let Some(key) = non_blank(content) {
                    tracing::debug!(source = %config.api_key_file.display(), "API key from file");
                    return Ok(Self::with_key(key));
                }
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(source) => {
                return Err(ConfigError::Read {
                    path: config.api_key_file.clone(),
                    source,
                })
            }
        }

        match config.policy {
            KeyPolicy::Require => Err(ConfigError::MissingApiKey {
                env: config.api_key_env.clone(),
                file: config.api_key_file.clone(),
            }),
            KeyPolicy::Warn => {
                tracing::warn!(
                    env = %config.api_key_env,
                    file = %config.api_key_file.display(),
                    "no API key found, primary vendor requests will be anonymous"
                );
                Ok(Self::anonymous())
            }
        }
    }
}

fn non_blank(raw: String) -> Option<String> {
    let trimmed = raw.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn key_file(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    fn creds_config(file: &Path, policy: KeyPolicy) -> CredentialsConfig {
        CredentialsConfig {
            api_key_file: file.to_path_buf(),
            api_key_env: "TSERIE_TEST_KEY".into(),
            policy,
        }
    }

    #[test]
    fn empty_toml_gives_defaults() {
        let config = TserieConfig::from_toml("").unwrap();
        assert_eq!(config, TserieConfig::default());
        assert_eq!(config.analysis.rolling_window, 250);
        assert_eq!(
            config.columns.priority,
            vec!["Adj Close", "Settle", "Value", "Last"]
        );
        assert_eq!(config.credentials.policy, KeyPolicy::Warn);
    }

    #[test]
    fn partial_sections_merge_with_defaults() {
        let config = TserieConfig::from_toml(
            r#"
            [analysis]
            align = "strict"
            returns = "log_diff"

            [products]
            NG = "CHRIS/CME_NG1"
            "#,
        )
        .unwrap();
        assert_eq!(config.analysis.align, AlignPolicy::Strict);
        assert_eq!(config.analysis.returns, Transform::LogDiff);
        assert_eq!(config.analysis.nlags, 40);
        assert_eq!(config.products["NG"], "CHRIS/CME_NG1");
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = TserieConfig::from_toml("[analysis]\nwindow = 3\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn malformed_product_is_invalid() {
        let err = TserieConfig::from_toml("[products]\nNG = \"NG1\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn tiny_window_is_invalid() {
        let err = TserieConfig::from_toml("[analysis]\nrolling_window = 1\n").unwrap_err();
        assert!(err.to_string().contains("rolling_window"));
    }

    #[test]
    fn load_reads_explicit_file() {
        let file = key_file("[vendors]\ntimeout_secs = 5\n");
        let config = TserieConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.vendors.timeout_secs, 5);
        assert!(matches!(
            TserieConfig::load(Some(Path::new("/nonexistent/tserie.toml"))),
            Err(ConfigError::Read { .. })
        ));
    }

    #[test]
    fn environment_wins_over_file() {
        let file = key_file("from-file\n");
        let config = creds_config(file.path(), KeyPolicy::Warn);
        let creds = Credentials::resolve_with(&config, |_| Some(" from-env ".into())).unwrap();
        assert_eq!(creds.api_key(), Some("from-env"));
    }

    #[test]
    fn key_file_is_trimmed() {
        let file = key_file("  abc123\n");
        let config = creds_config(file.path(), KeyPolicy::Require);
        let creds = Credentials::resolve_with(&config, |_| None).unwrap();
        assert_eq!(creds.api_key(), Some("abc123"));
    }

    #[test]
    fn missing_key_follows_policy() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("absent.key");

        let warn = creds_config(&missing, KeyPolicy::Warn);
        assert_eq!(
            Credentials::resolve_with(&warn, |_| None).unwrap(),
            Credentials::anonymous()
        );

        let require = creds_config(&missing, KeyPolicy::Require);
        assert!(matches!(
            Credentials::resolve_with(&require, |_| None),
            Err(ConfigError::MissingApiKey { .. })
        ));
    }

    #[test]
    fn debug_output_hides_the_key() {
        let rendered = format!("{:?}", Credentials::with_key("secret"));
        assert!(!rendered.contains("secret"));
    }
}
