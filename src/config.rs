//! Seeding knobs, targets and the YAML seeding plan.
//!
//! A plan file looks like:
//!
//! ```yaml
//! knobs:
//!   databases_per_target: 2
//!   rows_per_table: 100
//! targets:
//!   - engine: postgres
//!     security: tls
//!     host: pg.internal
//!     port: 5432
//!     prefix: pg_tls
//!   - engine: mongo
//!     security: hsm_tunnel
//!     host: mongo.internal
//!     port: 27017
//!     prefix: docs
//!     databases: 1
//! ```

use crate::error::ConfigError;
use once_cell::sync::Lazy;
use regex::Regex;
use seed_gen::{DocumentShape, EngineKind};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::ops::RangeInclusive;
use std::path::Path;

static PREFIX_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[a-z_][a-z0-9_]*$").unwrap());

/// Global knobs for a seeding run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Knobs {
    /// Databases created per target, unless the target overrides it
    pub databases_per_target: usize,
    /// Rows per table, and documents per collection
    pub rows_per_table: usize,
    pub min_tables: usize,
    pub max_tables: usize,
    /// Random columns per table, excluding `id` and `ref_id`
    pub min_columns: usize,
    pub max_columns: usize,
    /// Probability that a table gets the trailing `ref_id` column
    pub pass_through_probability: f64,
    pub document_max_depth: usize,
    /// Also commit every N rows inside a table
    pub commit_every: Option<usize>,
    pub document_shape: DocumentShape,
    /// Random seed; a fresh one is drawn when unset
    pub seed: Option<u64>,
}

impl Default for Knobs {
    fn default() -> Self {
        Self {
            databases_per_target: 3,
            rows_per_table: 500,
            min_tables: 4,
            max_tables: 10,
            min_columns: 6,
            max_columns: 10,
            pass_through_probability: 0.2,
            document_max_depth: seed_gen::value::DEFAULT_MAX_DEPTH,
            commit_every: None,
            document_shape: DocumentShape::Nested,
            seed: None,
        }
    }
}

impl Knobs {
    pub fn table_range(&self) -> RangeInclusive<usize> {
        self.min_tables..=self.max_tables
    }

    pub fn column_range(&self) -> RangeInclusive<usize> {
        self.min_columns..=self.max_columns
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.databases_per_target == 0 {
            return Err(invalid("databases_per_target", "must be at least 1"));
        }
        if self.min_tables == 0 || self.min_tables > self.max_tables {
            return Err(invalid(
                "min_tables",
                format!(
                    "need 1 <= min_tables <= max_tables, got {}..{}",
                    self.min_tables, self.max_tables
                ),
            ));
        }
        if self.min_columns == 0 || self.min_columns > self.max_columns {
            return Err(invalid(
                "min_columns",
                format!(
                    "need 1 <= min_columns <= max_columns, got {}..{}",
                    self.min_columns, self.max_columns
                ),
            ));
        }
        if !(0.0..=1.0).contains(&self.pass_through_probability) {
            return Err(invalid(
                "pass_through_probability",
                format!("{} is outside [0, 1]", self.pass_through_probability),
            ));
        }
        if self.commit_every == Some(0) {
            return Err(invalid("commit_every", "must be at least 1"));
        }
        Ok(())
    }
}

fn invalid(name: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::InvalidKnob {
        name,
        reason: reason.into(),
    }
}

/// Transport-security posture a target is reached under
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SecurityVariant {
    #[default]
    Plain,
    Tls,
    #[serde(alias = "mtls")]
    MutualTls,
    #[serde(alias = "hsm")]
    HsmTunnel,
}

impl fmt::Display for SecurityVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SecurityVariant::Plain => write!(f, "plain"),
            SecurityVariant::Tls => write!(f, "tls"),
            SecurityVariant::MutualTls => write!(f, "mutual_tls"),
            SecurityVariant::HsmTunnel => write!(f, "hsm_tunnel"),
        }
    }
}

impl std::str::FromStr for SecurityVariant {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "plain" => Ok(SecurityVariant::Plain),
            "tls" => Ok(SecurityVariant::Tls),
            "mutual_tls" | "mtls" => Ok(SecurityVariant::MutualTls),
            "hsm_tunnel" | "hsm" => Ok(SecurityVariant::HsmTunnel),
            _ => Err(format!(
                "Unknown security variant: {}. Valid options: plain, tls, mutual_tls, hsm_tunnel",
                s
            )),
        }
    }
}

/// One (engine, security variant) endpoint to seed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineTarget {
    pub engine: EngineKind,
    #[serde(default)]
    pub security: SecurityVariant,
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default)]
    pub port: u16,
    /// Database names are `<prefix>_<i>`
    pub prefix: String,
    /// Overrides `Knobs::databases_per_target`
    #[serde(default)]
    pub databases: Option<usize>,
}

fn default_host() -> String {
    "localhost".to_string()
}

impl EngineTarget {
    pub fn new(engine: EngineKind, security: SecurityVariant, prefix: impl Into<String>) -> Self {
        Self {
            engine,
            security,
            host: default_host(),
            port: 0,
            prefix: prefix.into(),
            databases: None,
        }
    }

    pub fn with_databases(mut self, count: usize) -> Self {
        self.databases = Some(count);
        self
    }

    /// `engine/security` identity used in logs and errors
    pub fn label(&self) -> String {
        format!("{}/{}", self.engine, self.security)
    }

    pub fn database_count(&self, knobs: &Knobs) -> usize {
        self.databases.unwrap_or(knobs.databases_per_target)
    }

    pub fn database_names(&self, knobs: &Knobs) -> Vec<String> {
        (1..=self.database_count(knobs))
            .map(|i| format!("{}_{}", self.prefix, i))
            .collect()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !PREFIX_RE.is_match(&self.prefix) {
            return Err(ConfigError::InvalidPrefix(self.prefix.clone()));
        }
        if self.databases == Some(0) {
            return Err(invalid("databases", "must be at least 1"));
        }
        Ok(())
    }
}

/// Complete YAML seeding plan
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SeedPlan {
    pub knobs: Knobs,
    pub targets: Vec<EngineTarget>,
}

impl SeedPlan {
    /// Load a plan from a YAML file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::parse(&content).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    /// Parse a plan from a YAML string
    pub fn parse(content: &str) -> Result<Self, serde_yaml_ng::Error> {
        serde_yaml_ng::from_str(content)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.knobs.validate()?;
        if self.targets.is_empty() {
            return Err(ConfigError::NoTargets);
        }
        for target in &self.targets {
            target.validate()?;
        }
        Ok(())
    }

    /// One target per engine, all plaintext, prefixed with the engine name
    pub fn default_targets() -> Vec<EngineTarget> {
        EngineKind::ALL
            .into_iter()
            .map(|engine| EngineTarget::new(engine, SecurityVariant::Plain, engine.to_string()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_knobs_are_valid() {
        let knobs = Knobs::default();
        assert!(knobs.validate().is_ok());
        assert_eq!(knobs.table_range(), 4..=10);
        assert_eq!(knobs.column_range(), 6..=10);
    }

    #[test]
    fn test_inverted_table_range_rejected() {
        let knobs = Knobs {
            min_tables: 5,
            max_tables: 4,
            ..Knobs::default()
        };
        assert!(matches!(
            knobs.validate(),
            Err(ConfigError::InvalidKnob {
                name: "min_tables",
                ..
            })
        ));
    }

    #[test]
    fn test_database_names() {
        let target = EngineTarget::new(EngineKind::MySql, SecurityVariant::Tls, "shop");
        let names = target.database_names(&Knobs::default());
        assert_eq!(names, vec!["shop_1", "shop_2", "shop_3"]);
        assert_eq!(target.label(), "mysql/tls");
    }

    #[test]
    fn test_prefix_validation() {
        let bad = EngineTarget::new(EngineKind::Postgres, SecurityVariant::Plain, "drop table;");
        assert!(matches!(bad.validate(), Err(ConfigError::InvalidPrefix(_))));
        let good = EngineTarget::new(EngineKind::Postgres, SecurityVariant::Plain, "_pg_1");
        assert!(good.validate().is_ok());
    }

    #[test]
    fn test_security_parsing() {
        assert_eq!(
            "mtls".parse::<SecurityVariant>().unwrap(),
            SecurityVariant::MutualTls
        );
        assert!("ssh".parse::<SecurityVariant>().is_err());
    }
}
