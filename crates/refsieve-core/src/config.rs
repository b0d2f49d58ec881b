//! Sieve configuration that callers can serialize/deserialize.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// How the sanitizer treats operator objects found in untrusted filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SanitizeMode {
    /// Reject the filter.
    Strict,
    /// Rewrite the offending value to `{$eq: value}`.
    #[default]
    Permissive,
}

impl std::str::FromStr for SanitizeMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "strict" | "throw" => Ok(SanitizeMode::Strict),
            "permissive" | "rewrite" => Ok(SanitizeMode::Permissive),
            other => Err(Error::Config(format!("unknown sanitize mode '{}'", other))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SieveConfig {
    pub sanitize_mode: SanitizeMode,

    /// Top-level operators rejected in both modes unless trust-marked.
    pub forbidden_operators: Vec<String>,

    /// Drop ids that fail to cast to the foreign field's type.
    pub skip_invalid_ids: bool,

    /// Also descend into `$nor` lists when sanitizing.
    pub recurse_nor: bool,
}

pub const DEFAULT_FORBIDDEN_OPERATORS: [&str; 3] = ["$where", "$text", "$jsonSchema"];

impl Default for SieveConfig {
    fn default() -> Self {
        Self {
            sanitize_mode: SanitizeMode::Permissive,
            forbidden_operators: DEFAULT_FORBIDDEN_OPERATORS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            skip_invalid_ids: false,
            recurse_nor: true,
        }
    }
}

impl SieveConfig {
    /// Create a config from environment variables, falling back to defaults.
    ///
    /// Environment variables:
    /// - `REFSIEVE_SANITIZE_MODE`: `strict` or `permissive`
    /// - `REFSIEVE_FORBIDDEN_OPERATORS`: comma-separated operator list
    /// - `REFSIEVE_SKIP_INVALID_IDS`: `true`/`false`
    /// - `REFSIEVE_RECURSE_NOR`: `true`/`false`
    ///
    /// Unparseable values are ignored.
    pub fn from_env() -> Self {
        let mut cfg = Self::default();

        if let Ok(s) = std::env::var("REFSIEVE_SANITIZE_MODE") {
            match s.parse::<SanitizeMode>() {
                Ok(v) => cfg.sanitize_mode = v,
                Err(_e) => {
                    #[cfg(feature = "tracing")]
                    tracing::trace!(error = %_e, "ignoring REFSIEVE_SANITIZE_MODE");
                }
            }
        }

        if let Ok(s) = std::env::var("REFSIEVE_FORBIDDEN_OPERATORS") {
            cfg.forbidden_operators = parse_operator_list(&s);
        }

        if let Ok(s) = std::env::var("REFSIEVE_SKIP_INVALID_IDS") {
            if let Ok(v) = s.parse::<bool>() {
                cfg.skip_invalid_ids = v;
            }
        }

        if let Ok(s) = std::env::var("REFSIEVE_RECURSE_NOR") {
            if let Ok(v) = s.parse::<bool>() {
                cfg.recurse_nor = v;
            }
        }

        cfg
    }

    /// Parse a YAML document; missing keys take their defaults.
    pub fn from_yaml_str(src: &str) -> Result<Self> {
        let cfg: SieveConfig = serde_yaml::from_str(src)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        if let Some(op) = self
            .forbidden_operators
            .iter()
            .find(|op| !op.starts_with(crate::filter::RESERVED_PREFIX))
        {
            return Err(Error::Config(format!(
                "forbidden operator '{}' must start with '{}'",
                op,
                crate::filter::RESERVED_PREFIX
            )));
        }
        Ok(())
    }

    pub fn is_forbidden(&self, key: &str) -> bool {
        self.forbidden_operators.iter().any(|op| op == key)
    }
}

fn parse_operator_list(s: &str) -> Vec<String> {
    s.split(',')
        .map(str::trim)
        .filter(|op| !op.is_empty())
        .map(str::to_string)
        .collect()
}
