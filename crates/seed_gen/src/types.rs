//! Engine kinds, SQL dialects and the abstract column type catalog.
//!
//! Every generated column carries an [`AbstractColumnType`]. The catalog maps
//! it to a native spelling per [`Dialect`], and the translation table maps a
//! spelling from one dialect to another so a schema rendered for one engine
//! can be replayed against a connection that speaks a different dialect.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Engine-independent logical column type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AbstractColumnType {
    Integer,
    BigInteger,
    Float,
    ShortText,
    LongText,
    Date,
    Timestamp,
    Boolean,
    Binary,
    Document,
}

impl AbstractColumnType {
    /// All abstract types, in catalog order
    pub const ALL: [AbstractColumnType; 10] = [
        AbstractColumnType::Integer,
        AbstractColumnType::BigInteger,
        AbstractColumnType::Float,
        AbstractColumnType::ShortText,
        AbstractColumnType::LongText,
        AbstractColumnType::Date,
        AbstractColumnType::Timestamp,
        AbstractColumnType::Boolean,
        AbstractColumnType::Binary,
        AbstractColumnType::Document,
    ];
}

impl fmt::Display for AbstractColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AbstractColumnType::Integer => "integer",
            AbstractColumnType::BigInteger => "big_integer",
            AbstractColumnType::Float => "float",
            AbstractColumnType::ShortText => "short_text",
            AbstractColumnType::LongText => "long_text",
            AbstractColumnType::Date => "date",
            AbstractColumnType::Timestamp => "timestamp",
            AbstractColumnType::Boolean => "boolean",
            AbstractColumnType::Binary => "binary",
            AbstractColumnType::Document => "document",
        };
        f.write_str(name)
    }
}

/// How an engine manages the surrogate key, or whether it has typed columns at all
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineFamily {
    /// `SERIAL PRIMARY KEY` style engines
    RelationalSerial,
    /// `AUTO_INCREMENT PRIMARY KEY` style engines
    RelationalAutoIncrement,
    /// Schemaless document store
    Document,
}

/// Backend engine a target points at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineKind {
    #[serde(alias = "pg", alias = "postgresql")]
    Postgres,
    MySql,
    #[serde(alias = "maria")]
    MariaDb,
    #[serde(alias = "mongodb")]
    Mongo,
}

impl EngineKind {
    pub const ALL: [EngineKind; 4] = [
        EngineKind::Postgres,
        EngineKind::MySql,
        EngineKind::MariaDb,
        EngineKind::Mongo,
    ];

    pub fn family(&self) -> EngineFamily {
        match self {
            EngineKind::Postgres => EngineFamily::RelationalSerial,
            EngineKind::MySql | EngineKind::MariaDb => EngineFamily::RelationalAutoIncrement,
            EngineKind::Mongo => EngineFamily::Document,
        }
    }

    /// SQL dialect of the engine, `None` for the document store
    pub fn dialect(&self) -> Option<Dialect> {
        match self {
            EngineKind::Postgres => Some(Dialect::Postgres),
            EngineKind::MySql => Some(Dialect::MySql),
            EngineKind::MariaDb => Some(Dialect::MariaDb),
            EngineKind::Mongo => None,
        }
    }

    /// Abstract types a generated column may take on this engine.
    ///
    /// Empty for the document store: documents carry their own values and are
    /// never described by typed columns.
    pub fn allowed_types(&self) -> &'static [AbstractColumnType] {
        match self.family() {
            EngineFamily::RelationalSerial | EngineFamily::RelationalAutoIncrement => {
                &AbstractColumnType::ALL
            }
            EngineFamily::Document => &[],
        }
    }
}

impl fmt::Display for EngineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineKind::Postgres => write!(f, "postgres"),
            EngineKind::MySql => write!(f, "mysql"),
            EngineKind::MariaDb => write!(f, "mariadb"),
            EngineKind::Mongo => write!(f, "mongo"),
        }
    }
}

impl std::str::FromStr for EngineKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "postgres" | "postgresql" | "pg" => Ok(EngineKind::Postgres),
            "mysql" => Ok(EngineKind::MySql),
            "mariadb" | "maria" => Ok(EngineKind::MariaDb),
            "mongo" | "mongodb" => Ok(EngineKind::Mongo),
            _ => Err(format!(
                "Unknown engine: {}. Valid options: postgres, mysql, mariadb, mongo",
                s
            )),
        }
    }
}

/// SQL dialect spoken by a connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    Postgres,
    MySql,
    MariaDb,
    /// Embedded DuckDB, used by the local sandbox backend
    DuckDb,
}

impl Dialect {
    pub const ALL: [Dialect; 4] = [
        Dialect::Postgres,
        Dialect::MySql,
        Dialect::MariaDb,
        Dialect::DuckDb,
    ];

    /// Native column type spelling for an abstract type. Total over both enums.
    pub fn native_type(&self, ty: AbstractColumnType) -> &'static str {
        use AbstractColumnType as T;
        match (self, ty) {
            (Dialect::DuckDb, T::Integer) => "INTEGER",
            (_, T::Integer) => "INT",
            (_, T::BigInteger) => "BIGINT",
            (Dialect::Postgres, T::Float) => "DOUBLE PRECISION",
            (_, T::Float) => "DOUBLE",
            (Dialect::DuckDb, T::ShortText) => "VARCHAR",
            (_, T::ShortText) => "VARCHAR(255)",
            (_, T::LongText) => "TEXT",
            (_, T::Date) => "DATE",
            (_, T::Timestamp) => "TIMESTAMP",
            (Dialect::MySql | Dialect::MariaDb, T::Boolean) => "TINYINT(1)",
            (_, T::Boolean) => "BOOLEAN",
            (Dialect::Postgres, T::Binary) => "BYTEA",
            (_, T::Binary) => "BLOB",
            (Dialect::Postgres, T::Document) => "JSONB",
            (_, T::Document) => "JSON",
        }
    }

    /// Reverse catalog lookup: which abstract type does this spelling denote?
    ///
    /// Matching ignores case and collapses whitespace, so `double  precision`
    /// resolves like `DOUBLE PRECISION`.
    pub fn abstract_type_of(&self, spelling: &str) -> Option<AbstractColumnType> {
        let normalized = normalize_spelling(spelling);
        AbstractColumnType::ALL
            .into_iter()
            .find(|ty| self.native_type(*ty) == normalized)
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dialect::Postgres => write!(f, "postgres"),
            Dialect::MySql => write!(f, "mysql"),
            Dialect::MariaDb => write!(f, "mariadb"),
            Dialect::DuckDb => write!(f, "duckdb"),
        }
    }
}

impl std::str::FromStr for Dialect {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "postgres" | "postgresql" | "pg" => Ok(Dialect::Postgres),
            "mysql" => Ok(Dialect::MySql),
            "mariadb" | "maria" => Ok(Dialect::MariaDb),
            "duckdb" | "duck" => Ok(Dialect::DuckDb),
            _ => Err(format!(
                "Unknown dialect: {}. Valid options: postgres, mysql, mariadb, duckdb",
                s
            )),
        }
    }
}

fn normalize_spelling(spelling: &str) -> String {
    spelling
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_uppercase()
}

/// One row of the cross-dialect translation table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypeTranslation {
    pub ty: AbstractColumnType,
    pub from: &'static str,
    pub to: &'static str,
}

/// Translation for a single abstract type between two dialects
pub fn translate(from: Dialect, to: Dialect, ty: AbstractColumnType) -> TypeTranslation {
    TypeTranslation {
        ty,
        from: from.native_type(ty),
        to: to.native_type(ty),
    }
}

/// Full translation table between two dialects, one row per abstract type
pub fn translation_table(from: Dialect, to: Dialect) -> Vec<TypeTranslation> {
    AbstractColumnType::ALL
        .into_iter()
        .map(|ty| translate(from, to, ty))
        .collect()
}

/// Translate a native spelling of `from` into the spelling used by `to`.
///
/// Returns `None` when the spelling is not part of `from`'s catalog; callers
/// must never emit such a token.
pub fn translate_native(from: Dialect, to: Dialect, spelling: &str) -> Option<&'static str> {
    from.abstract_type_of(spelling)
        .map(|ty| translate(from, to, ty).to)
}
