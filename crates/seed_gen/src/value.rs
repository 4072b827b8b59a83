//! Value generation keyed on [`AbstractColumnType`].
//!
//! Generation dispatches on the abstract type only; native spellings never
//! influence what gets produced.

use crate::fake;
use crate::types::{AbstractColumnType, Dialect};
use chrono::{NaiveDate, NaiveDateTime};
use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

/// Upper bound (inclusive) for generated integers
pub const INT_MAX: i64 = 1_000_000;
/// Upper bound (exclusive) for generated floats
pub const FLOAT_MAX: f64 = 10_000.0;
/// Approximate length of short text values
pub const SHORT_TEXT_LEN: usize = 40;
/// Approximate length of long text values
pub const LONG_TEXT_LEN: usize = 80;
/// Size of generated binary blobs
pub const BINARY_LEN: usize = 32;
/// Default nesting bound for documents
pub const DEFAULT_MAX_DEPTH: usize = 2;

/// A generated value, ready to be bound as a statement parameter
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Null,
    Int(i64),
    Float(f64),
    String(String),
    Bool(bool),
    Date(NaiveDate),
    Timestamp(NaiveDateTime),
    Bytes(Vec<u8>),
    Json(JsonValue),
}

impl SqlValue {
    /// Render as a SQL literal for `dialect`.
    ///
    /// Only used for previews. Statements sent to a server always bind values
    /// as parameters.
    pub fn to_literal(&self, dialect: Dialect) -> String {
        match self {
            SqlValue::Null => "NULL".to_string(),
            SqlValue::Int(n) => n.to_string(),
            SqlValue::Float(n) => format!("{:.3}", n),
            SqlValue::String(s) => quote_string(s, dialect),
            SqlValue::Bool(b) => {
                let literal = match (dialect, *b) {
                    (Dialect::MySql | Dialect::MariaDb, true) => "1",
                    (Dialect::MySql | Dialect::MariaDb, false) => "0",
                    (Dialect::Postgres | Dialect::DuckDb, true) => "TRUE",
                    (Dialect::Postgres | Dialect::DuckDb, false) => "FALSE",
                };
                literal.to_string()
            }
            SqlValue::Date(d) => format!("'{}'", d.format("%Y-%m-%d")),
            SqlValue::Timestamp(ts) => format!("'{}'", ts.format("%Y-%m-%d %H:%M:%S")),
            SqlValue::Bytes(bytes) => {
                let hex: String = bytes.iter().map(|b| format!("{:02x}", b)).collect();
                match dialect {
                    Dialect::Postgres => format!("'\\x{}'", hex),
                    Dialect::MySql | Dialect::MariaDb => format!("X'{}'", hex),
                    Dialect::DuckDb => format!("from_hex('{}')", hex),
                }
            }
            SqlValue::Json(doc) => quote_string(&doc.to_string(), dialect),
        }
    }
}

fn quote_string(s: &str, dialect: Dialect) -> String {
    match dialect {
        Dialect::MySql | Dialect::MariaDb => format!("'{}'", escape_mysql_string(s)),
        Dialect::Postgres | Dialect::DuckDb => format!("'{}'", s.replace('\'', "''")),
    }
}

fn escape_mysql_string(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('\'', "\\'")
        .replace('\n', "\\n")
        .replace('\r', "\\r")
        .replace('\t', "\\t")
}

/// Shape of the top-level documents written to the document store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentShape {
    /// Recursively generated nested object
    #[default]
    Nested,
    /// Flat contact record: name, email, qty, price, ts, tags, opt
    Contact,
}

impl std::str::FromStr for DocumentShape {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "nested" => Ok(DocumentShape::Nested),
            "contact" => Ok(DocumentShape::Contact),
            _ => Err(format!(
                "Unknown document shape: {}. Valid options: nested, contact",
                s
            )),
        }
    }
}

#[derive(Clone, Copy)]
enum JsonKind {
    Int,
    Float,
    Str,
    Bool,
    Null,
    List,
    Map,
}

const LEAF_KINDS: [JsonKind; 5] = [
    JsonKind::Int,
    JsonKind::Float,
    JsonKind::Str,
    JsonKind::Bool,
    JsonKind::Null,
];

const ALL_KINDS: [JsonKind; 7] = [
    JsonKind::Int,
    JsonKind::Float,
    JsonKind::Str,
    JsonKind::Bool,
    JsonKind::Null,
    JsonKind::List,
    JsonKind::Map,
];

/// Produces one randomized value per abstract column type
#[derive(Debug, Clone, Copy)]
pub struct ValueGenerator {
    max_depth: usize,
}

impl Default for ValueGenerator {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl ValueGenerator {
    pub fn new(max_depth: usize) -> Self {
        Self { max_depth }
    }

    /// Generate a value compatible with every dialect's spelling of `ty`
    pub fn generate<R: Rng + ?Sized>(&self, ty: AbstractColumnType, rng: &mut R) -> SqlValue {
        match ty {
            AbstractColumnType::Integer | AbstractColumnType::BigInteger => {
                SqlValue::Int(rng.random_range(0..=INT_MAX))
            }
            AbstractColumnType::Float => SqlValue::Float(rng.random_range(0.0..FLOAT_MAX)),
            AbstractColumnType::ShortText => SqlValue::String(fake::text(rng, SHORT_TEXT_LEN)),
            AbstractColumnType::LongText => SqlValue::String(fake::text(rng, LONG_TEXT_LEN)),
            AbstractColumnType::Date => SqlValue::Date(fake::date(rng)),
            AbstractColumnType::Timestamp => SqlValue::Timestamp(fake::datetime(rng)),
            AbstractColumnType::Boolean => SqlValue::Bool(rng.random_bool(0.5)),
            AbstractColumnType::Binary => SqlValue::Bytes(fake::bytes(rng, BINARY_LEN)),
            AbstractColumnType::Document => SqlValue::Json(JsonValue::Object(self.document(rng))),
        }
    }

    /// Generate one value for every column type, in order
    pub fn generate_row<R: Rng + ?Sized>(
        &self,
        types: &[AbstractColumnType],
        rng: &mut R,
    ) -> Vec<SqlValue> {
        types.iter().map(|ty| self.generate(*ty, rng)).collect()
    }

    /// Top-level document: always an object whose values sit at depth 0
    pub fn document<R: Rng + ?Sized>(&self, rng: &mut R) -> Map<String, JsonValue> {
        self.object(rng, 0)
    }

    /// Top-level document of the requested shape
    pub fn shaped_document<R: Rng + ?Sized>(
        &self,
        shape: DocumentShape,
        rng: &mut R,
    ) -> Map<String, JsonValue> {
        match shape {
            DocumentShape::Nested => self.document(rng),
            DocumentShape::Contact => contact_document(rng),
        }
    }

    fn value_at<R: Rng + ?Sized>(&self, rng: &mut R, depth: usize) -> JsonValue {
        let kinds: &[JsonKind] = if depth < self.max_depth {
            &ALL_KINDS
        } else {
            &LEAF_KINDS
        };

        match kinds[rng.random_range(0..kinds.len())] {
            JsonKind::Int => JsonValue::from(rng.random_range(0..=INT_MAX)),
            JsonKind::Float => JsonValue::from(round3(rng.random_range(0.0..FLOAT_MAX))),
            JsonKind::Str => JsonValue::from(fake::text(rng, SHORT_TEXT_LEN)),
            JsonKind::Bool => JsonValue::from(rng.random_bool(0.5)),
            JsonKind::Null => JsonValue::Null,
            JsonKind::List => {
                let len = rng.random_range(1..=5);
                JsonValue::Array((0..len).map(|_| self.value_at(rng, depth + 1)).collect())
            }
            JsonKind::Map => JsonValue::Object(self.object(rng, depth + 1)),
        }
    }

    /// Object with 2..=6 distinct word keys whose values sit at `depth`
    fn object<R: Rng + ?Sized>(&self, rng: &mut R, depth: usize) -> Map<String, JsonValue> {
        let len = rng.random_range(2..=6);
        let mut map = Map::new();
        while map.len() < len {
            let key = fake::word(rng, fake::WORD_LEN);
            if map.contains_key(&key) {
                continue;
            }
            let value = self.value_at(rng, depth);
            map.insert(key, value);
        }
        map
    }
}

fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

fn contact_document<R: Rng + ?Sized>(rng: &mut R) -> Map<String, JsonValue> {
    let mut doc = Map::new();
    doc.insert("name".into(), JsonValue::from(fake::full_name(rng)));
    doc.insert("email".into(), JsonValue::from(fake::email(rng)));
    doc.insert("qty".into(), JsonValue::from(rng.random_range(1..=50)));
    doc.insert(
        "price".into(),
        JsonValue::from(fake::price(rng, 1.0, 9999.0)),
    );
    doc.insert(
        "ts".into(),
        JsonValue::from(fake::datetime(rng).format("%Y-%m-%d %H:%M:%S").to_string()),
    );
    let tag_count = rng.random_range(1..=5);
    let tags: Vec<JsonValue> = (0..tag_count)
        .map(|_| JsonValue::from(fake::word(rng, 5)))
        .collect();
    doc.insert("tags".into(), JsonValue::Array(tags));
    let opt = match rng.random_range(0..3) {
        0 => JsonValue::Null,
        1 => JsonValue::from(fake::sentence(rng)),
        _ => JsonValue::from(fake::url(rng)),
    };
    doc.insert("opt".into(), opt);
    doc
}
