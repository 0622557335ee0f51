//! Binding configuration.
//!
//! A [`BindConfig`] decides which sources the binder consults and what a
//! failure in each of them means. The named presets cover the usual
//! combinations; [`ConfigLoader`] reads one from TOML, JSON or the
//! environment.

use crate::ConfigError;
use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

/// Default maximum body size (1 MiB).
pub const DEFAULT_MAX_BODY_SIZE: usize = 1024 * 1024;

/// What to do with a decodable source (the JSON body or the query string).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DecodePolicy {
    /// Do not read the source.
    Ignore,
    /// Decode it; on failure keep going with whatever the record holds.
    BestEffort,
    /// Decode it; on failure answer 400 and skip the handler.
    Strict,
}

/// Which path parameters are written into the record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PathInjection {
    /// Ignore path parameters.
    None,
    /// Every path parameter is matched against the record's text fields.
    AllMatchingFields,
    /// Only the `id` parameter, written into the `id` field.
    IdentifierOnly,
}

/// What to do when a path parameter cannot be written into the record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MismatchPolicy {
    /// Ignore it.
    #[default]
    Silent,
    /// Ignore it but emit a `warn` event.
    Trace,
    /// Fail the request with a 500.
    Reject,
}

macro_rules! kebab_enum {
    ($ty:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl $ty {
            /// Returns the configuration spelling of this value.
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $text,)+
                }
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $ty {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.to_lowercase().replace('_', "-").as_str() {
                    $($text => Ok(Self::$variant),)+
                    other => Err(format!(
                        "unknown value '{other}', expected one of: {}",
                        [$($text),+].join(", ")
                    )),
                }
            }
        }
    };
}

kebab_enum!(DecodePolicy {
    Ignore => "ignore",
    BestEffort => "best-effort",
    Strict => "strict",
});

kebab_enum!(PathInjection {
    None => "none",
    AllMatchingFields => "all-matching-fields",
    IdentifierOnly => "identifier-only",
});

kebab_enum!(MismatchPolicy {
    Silent => "silent",
    Trace => "trace",
    Reject => "reject",
});

/// Binding configuration.
///
/// The default is the [`path`](Self::path) preset.
///
/// # Example
///
/// ```
/// use hermes_bind::{BindConfig, DecodePolicy, PathInjection};
///
/// let config = BindConfig::json_body();
/// assert_eq!(config.body, DecodePolicy::Strict);
/// assert_eq!(config.query, DecodePolicy::Ignore);
/// assert_eq!(config.path, PathInjection::IdentifierOnly);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BindConfig {
    /// JSON body policy.
    pub body: DecodePolicy,
    /// Query string policy.
    pub query: DecodePolicy,
    /// Path parameter injection.
    pub path: PathInjection,
    /// Handling of path parameters that match no writable field.
    pub mismatches: MismatchPolicy,
    /// Largest body, in bytes, the binder will decode.
    pub max_body_size: usize,
}

impl Default for BindConfig {
    fn default() -> Self {
        Self::path()
    }
}

impl BindConfig {
    fn preset(body: DecodePolicy, query: DecodePolicy, path: PathInjection) -> Self {
        Self {
            body,
            query,
            path,
            mismatches: MismatchPolicy::Silent,
            max_body_size: DEFAULT_MAX_BODY_SIZE,
        }
    }

    /// Everything best-effort: body, then query, then every path parameter.
    #[must_use]
    pub fn path() -> Self {
        Self::preset(
            DecodePolicy::BestEffort,
            DecodePolicy::BestEffort,
            PathInjection::AllMatchingFields,
        )
    }

    /// Strict JSON body plus the `id` path parameter.
    ///
    /// A record with a Data Bag receives the whole body there.
    #[must_use]
    pub fn json_body() -> Self {
        Self::preset(
            DecodePolicy::Strict,
            DecodePolicy::Ignore,
            PathInjection::IdentifierOnly,
        )
    }

    /// Strict query string plus the `id` path parameter.
    #[must_use]
    pub fn query() -> Self {
        Self::preset(
            DecodePolicy::Ignore,
            DecodePolicy::Strict,
            PathInjection::IdentifierOnly,
        )
    }

    /// Best-effort body and every path parameter, no query string.
    #[must_use]
    pub fn path_with_body() -> Self {
        Self::preset(
            DecodePolicy::BestEffort,
            DecodePolicy::Ignore,
            PathInjection::AllMatchingFields,
        )
    }

    /// Sets the body policy.
    #[must_use]
    pub fn with_body(mut self, policy: DecodePolicy) -> Self {
        self.body = policy;
        self
    }

    /// Sets the query policy.
    #[must_use]
    pub fn with_query(mut self, policy: DecodePolicy) -> Self {
        self.query = policy;
        self
    }

    /// Sets the path injection mode.
    #[must_use]
    pub fn with_path(mut self, injection: PathInjection) -> Self {
        self.path = injection;
        self
    }

    /// Sets the mismatch policy.
    #[must_use]
    pub fn with_mismatches(mut self, policy: MismatchPolicy) -> Self {
        self.mismatches = policy;
        self
    }

    /// Sets the body size limit.
    #[must_use]
    pub fn with_max_body_size(mut self, bytes: usize) -> Self {
        self.max_body_size = bytes;
        self
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_body_size == 0 {
            return Err(ConfigError::invalid_value(
                "max_body_size",
                "must be greater than zero",
            ));
        }
        Ok(())
    }
}

/// Layered loader for [`BindConfig`].
///
/// Layers, later ones overriding earlier ones:
/// 1. the base configuration (the default preset unless one is given)
/// 2. a TOML or JSON document
/// 3. environment variables under a prefix
///
/// # Example
///
/// ```
/// use hermes_bind::{ConfigLoader, DecodePolicy};
///
/// let config = ConfigLoader::new()
///     .with_string("body = \"strict\"\nmax_body_size = 4096", "toml")
///     .unwrap()
///     .load()
///     .unwrap();
///
/// assert_eq!(config.body, DecodePolicy::Strict);
/// assert_eq!(config.max_body_size, 4096);
/// ```
#[derive(Debug, Default)]
pub struct ConfigLoader {
    config: BindConfig,
    env_prefix: Option<String>,
}

impl ConfigLoader {
    /// Creates a loader starting from the default preset.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a loader starting from `base`.
    ///
    /// Documents loaded afterwards replace it entirely; keys a document omits
    /// take the default preset's values.
    #[must_use]
    pub fn from_preset(base: BindConfig) -> Self {
        Self {
            config: base,
            env_prefix: None,
        }
    }

    /// Loads a configuration file; the format follows its extension.
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigError::FileNotFound {
                path: path.to_path_buf(),
            });
        }

        let content = fs::read_to_string(path).map_err(|source| ConfigError::ReadError {
            path: path.to_path_buf(),
            source,
        })?;

        let format = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default();
        self.config = Self::parse(&content, format)?;
        Ok(self)
    }

    /// Loads a configuration file if it exists.
    pub fn with_optional_file<P: AsRef<Path>>(self, path: P) -> Result<Self, ConfigError> {
        if path.as_ref().exists() {
            self.with_file(path)
        } else {
            Ok(self)
        }
    }

    /// Loads configuration from a string in the given format (`toml` or `json`).
    pub fn with_string(mut self, content: &str, format: &str) -> Result<Self, ConfigError> {
        self.config = Self::parse(content, format)?;
        Ok(self)
    }

    /// Enables environment overrides.
    ///
    /// With prefix `HERMES`, the variables are `HERMES__BODY`,
    /// `HERMES__QUERY`, `HERMES__PATH`, `HERMES__MISMATCHES` and
    /// `HERMES__MAX_BODY_SIZE`.
    #[must_use]
    pub fn with_env_prefix(mut self, prefix: &str) -> Self {
        self.env_prefix = Some(prefix.to_string());
        self
    }

    /// Applies environment overrides and validates the result.
    pub fn load(mut self) -> Result<BindConfig, ConfigError> {
        if let Some(prefix) = self.env_prefix.take() {
            self.apply_env_vars(env::vars(), &prefix)?;
        }

        self.config.validate()?;
        tracing::debug!(
            body = %self.config.body,
            query = %self.config.query,
            path = %self.config.path,
            mismatches = %self.config.mismatches,
            max_body_size = self.config.max_body_size,
            "binding configuration loaded"
        );
        Ok(self.config)
    }

    fn parse(content: &str, format: &str) -> Result<BindConfig, ConfigError> {
        match format.to_lowercase().as_str() {
            "toml" => Ok(toml::from_str(content)?),
            "json" => Ok(serde_json::from_str(content)?),
            other => Err(ConfigError::UnsupportedFormat(other.to_string())),
        }
    }

    /// Applies every `PREFIX__KEY` variable; others, including ones that
    /// merely share the prefix (`PREFIX_HOME`), are skipped.
    fn apply_env_vars<I>(&mut self, vars: I, prefix: &str) -> Result<(), ConfigError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let scoped = format!("{prefix}__");
        for (key, value) in vars.into_iter().filter(|(k, _)| k.starts_with(&scoped)) {
            self.apply_env_var(&key, &value, prefix)?;
        }
        Ok(())
    }

    fn apply_env_var(&mut self, key: &str, value: &str, prefix: &str) -> Result<(), ConfigError> {
        let name = key
            .strip_prefix(prefix)
            .and_then(|k| k.strip_prefix("__"))
            .ok_or_else(|| ConfigError::env_parse_error(key, "invalid key format"))?;

        let invalid = |reason: String| ConfigError::env_parse_error(key, reason);

        match name {
            "BODY" => self.config.body = value.parse().map_err(invalid)?,
            "QUERY" => self.config.query = value.parse().map_err(invalid)?,
            "PATH" => self.config.path = value.parse().map_err(invalid)?,
            "MISMATCHES" => self.config.mismatches = value.parse().map_err(invalid)?,
            "MAX_BODY_SIZE" => {
                self.config.max_body_size = value
                    .parse()
                    .map_err(|_| invalid("expected integer".to_string()))?;
            }
            _ => tracing::debug!(var = key, "ignoring unknown binding variable"),
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_presets() {
        assert_eq!(BindConfig::default(), BindConfig::path());

        let path = BindConfig::path();
        assert_eq!(path.body, DecodePolicy::BestEffort);
        assert_eq!(path.query, DecodePolicy::BestEffort);
        assert_eq!(path.path, PathInjection::AllMatchingFields);

        let query = BindConfig::query();
        assert_eq!(query.body, DecodePolicy::Ignore);
        assert_eq!(query.query, DecodePolicy::Strict);
        assert_eq!(query.path, PathInjection::IdentifierOnly);

        let with_body = BindConfig::path_with_body();
        assert_eq!(with_body.body, DecodePolicy::BestEffort);
        assert_eq!(with_body.query, DecodePolicy::Ignore);
        assert_eq!(with_body.path, PathInjection::AllMatchingFields);

        assert_eq!(path.mismatches, MismatchPolicy::Silent);
        assert_eq!(path.max_body_size, DEFAULT_MAX_BODY_SIZE);
    }

    #[test]
    fn test_builder_methods() {
        let config = BindConfig::query()
            .with_body(DecodePolicy::BestEffort)
            .with_query(DecodePolicy::Ignore)
            .with_path(PathInjection::None)
            .with_mismatches(MismatchPolicy::Reject)
            .with_max_body_size(10);

        assert_eq!(config.body, DecodePolicy::BestEffort);
        assert_eq!(config.query, DecodePolicy::Ignore);
        assert_eq!(config.path, PathInjection::None);
        assert_eq!(config.mismatches, MismatchPolicy::Reject);
        assert_eq!(config.max_body_size, 10);
    }

    #[test]
    fn test_policy_parsing() {
        assert_eq!("best-effort".parse(), Ok(DecodePolicy::BestEffort));
        assert_eq!("BEST_EFFORT".parse(), Ok(DecodePolicy::BestEffort));
        assert_eq!("identifier-only".parse(), Ok(PathInjection::IdentifierOnly));
        assert_eq!("reject".parse(), Ok(MismatchPolicy::Reject));
        assert!("loose".parse::<DecodePolicy>().is_err());
        assert_eq!(PathInjection::AllMatchingFields.to_string(), "all-matching-fields");
    }

    #[test]
    fn test_load_toml() {
        let toml = r#"
            body = "strict"
            query = "ignore"
            path = "identifier-only"
            mismatches = "trace"
        "#;

        let config = ConfigLoader::new().with_string(toml, "toml").unwrap().load().unwrap();

        assert_eq!(config.body, DecodePolicy::Strict);
        assert_eq!(config.query, DecodePolicy::Ignore);
        assert_eq!(config.path, PathInjection::IdentifierOnly);
        assert_eq!(config.mismatches, MismatchPolicy::Trace);
        assert_eq!(config.max_body_size, DEFAULT_MAX_BODY_SIZE);
    }

    #[test]
    fn test_load_json() {
        let json = r#"{"query": "strict", "max_body_size": 2048}"#;

        let config = ConfigLoader::new().with_string(json, "JSON").unwrap().load().unwrap();

        assert_eq!(config.query, DecodePolicy::Strict);
        assert_eq!(config.body, DecodePolicy::BestEffort);
        assert_eq!(config.max_body_size, 2048);
    }

    #[test]
    fn test_unknown_field_rejected() {
        let result = ConfigLoader::new().with_string("bodyy = \"strict\"", "toml");
        assert!(matches!(result, Err(ConfigError::TomlError(_))));
    }

    #[test]
    fn test_unsupported_format() {
        let result = ConfigLoader::new().with_string("body: strict", "yaml");
        assert!(matches!(result, Err(ConfigError::UnsupportedFormat(f)) if f == "yaml"));
    }

    #[test]
    fn test_zero_body_size_rejected() {
        let result = ConfigLoader::new()
            .with_string("max_body_size = 0", "toml")
            .unwrap()
            .load();
        assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));
    }

    #[test]
    fn test_with_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "path = \"none\"").unwrap();

        let config = ConfigLoader::new().with_file(file.path()).unwrap().load().unwrap();
        assert_eq!(config.path, PathInjection::None);
    }

    #[test]
    fn test_with_file_not_found() {
        let result = ConfigLoader::new().with_file("/nonexistent/hermes-bind.toml");
        assert!(matches!(result, Err(ConfigError::FileNotFound { .. })));
    }

    #[test]
    fn test_with_optional_file_not_found() {
        let config = ConfigLoader::from_preset(BindConfig::json_body())
            .with_optional_file("/nonexistent/hermes-bind.toml")
            .unwrap()
            .load()
            .unwrap();
        assert_eq!(config, BindConfig::json_body());
    }

    // Environment overrides are exercised through apply_env_var directly:
    // mutating the process environment needs unsafe, which this crate forbids.

    #[test]
    fn test_apply_env_var() {
        let mut loader = ConfigLoader::new();
        loader.apply_env_var("TEST__BODY", "strict", "TEST").unwrap();
        loader.apply_env_var("TEST__PATH", "none", "TEST").unwrap();
        loader.apply_env_var("TEST__MAX_BODY_SIZE", "512", "TEST").unwrap();

        assert_eq!(loader.config.body, DecodePolicy::Strict);
        assert_eq!(loader.config.path, PathInjection::None);
        assert_eq!(loader.config.max_body_size, 512);
    }

    #[test]
    fn test_apply_env_var_invalid_value() {
        let mut loader = ConfigLoader::new();

        let result = loader.apply_env_var("TEST__QUERY", "sometimes", "TEST");
        assert!(matches!(result, Err(ConfigError::EnvParseError { .. })));

        let result = loader.apply_env_var("TEST__MAX_BODY_SIZE", "big", "TEST");
        assert!(matches!(result, Err(ConfigError::EnvParseError { .. })));
    }

    #[test]
    fn test_env_vars_outside_prefix_scope_ignored() {
        let vars = [
            ("TEST_HOME", "/srv/test"),
            ("TESTING__BODY", "bogus"),
            ("OTHER__BODY", "bogus"),
            ("TEST__QUERY", "strict"),
        ]
        .map(|(k, v)| (k.to_string(), v.to_string()));

        let mut loader = ConfigLoader::new();
        loader.apply_env_vars(vars, "TEST").unwrap();

        assert_eq!(loader.config.body, DecodePolicy::BestEffort);
        assert_eq!(loader.config.query, DecodePolicy::Strict);
    }

    #[test]
    fn test_apply_env_var_unknown_key_ignored() {
        let mut loader = ConfigLoader::new();
        loader.apply_env_var("TEST__COLOUR", "blue", "TEST").unwrap();
        assert_eq!(loader.config, BindConfig::default());
    }
}
