//! Table schema and SQL type classification
//!
//! Engines report column types as free text with parametrized forms
//! (`varchar(255)`, `decimal(10,2)`, `int(11) unsigned`, `timestamp(6)`),
//! so classification is pattern based rather than an enumerated type list.

use std::collections::HashMap;
use std::sync::OnceLock;

use regex::Regex;

/// Substrings that mark a numeric column (case-insensitive)
const NUMERIC_TYPE_MARKERS: [&str; 8] = [
    "tinyint",
    "smallint",
    "mediumint",
    "int",
    "bigint",
    "decimal",
    "float",
    "double",
];

static STRING_TYPE_PATTERN: OnceLock<Regex> = OnceLock::new();
static DATE_TYPE_PATTERN: OnceLock<Regex> = OnceLock::new();

fn string_type_pattern() -> &'static Regex {
    STRING_TYPE_PATTERN.get_or_init(|| {
        Regex::new(r"(?i)^(var)?char(acter)?\b|^(tiny|medium|long)?text\b|^(var)?binary\b|^(tiny|medium|long)?blob\b")
            .expect("string type pattern is a valid regex")
    })
}

fn date_type_pattern() -> &'static Regex {
    DATE_TYPE_PATTERN.get_or_init(|| {
        Regex::new(r"(?i)^(date|datetime|timestamp|time|year)(\(\d+\))?(\s|$)")
            .expect("date type pattern is a valid regex")
    })
}

/// Whether the raw type text denotes a numeric column.
///
/// Substring match: `int(10) unsigned` and
/// `DECIMAL(10,2)` both qualify.
pub fn is_numeric_type(column_type: &str) -> bool {
    let lowered = column_type.to_ascii_lowercase();
    NUMERIC_TYPE_MARKERS
        .iter()
        .any(|marker| lowered.contains(marker))
}

/// Whether the raw type text denotes a character/binary column
pub fn is_string_type(column_type: &str) -> bool {
    string_type_pattern().is_match(column_type.trim())
}

/// Whether the raw type text denotes a date/time column
pub fn is_date_type(column_type: &str) -> bool {
    date_type_pattern().is_match(column_type.trim())
}

/// Coarse type family of a column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeClass {
    Numeric,
    String,
    Date,
    Other,
}

impl TypeClass {
    /// Classify raw type text. Numeric wins over the other families.
    pub fn classify(column_type: &str) -> Self {
        if is_numeric_type(column_type) {
            TypeClass::Numeric
        } else if is_date_type(column_type) {
            TypeClass::Date
        } else if is_string_type(column_type) {
            TypeClass::String
        } else {
            TypeClass::Other
        }
    }

    /// Returns the family name for error messages
    pub fn name(&self) -> &'static str {
        match self {
            TypeClass::Numeric => "numeric",
            TypeClass::String => "string",
            TypeClass::Date => "date",
            TypeClass::Other => "other",
        }
    }
}

/// Column name to raw SQL type for one table.
///
/// Loaded once per query and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schema {
    table: String,
    columns: HashMap<String, String>,
}

impl Schema {
    /// Create a schema from (name, type) pairs
    pub fn new<I, N, T>(table: impl Into<String>, columns: I) -> Self
    where
        I: IntoIterator<Item = (N, T)>,
        N: Into<String>,
        T: Into<String>,
    {
        Self {
            table: table.into(),
            columns: columns
                .into_iter()
                .map(|(name, ty)| (name.into(), ty.into()))
                .collect(),
        }
    }

    /// Returns the table this schema describes
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Returns the raw type text of a column
    pub fn column_type(&self, column: &str) -> Option<&str> {
        self.columns.get(column).map(String::as_str)
    }

    /// Returns true if the column exists
    pub fn has_column(&self, column: &str) -> bool {
        self.columns.contains_key(column)
    }

    /// Type family of a column, `None` if the column does not exist
    pub fn class(&self, column: &str) -> Option<TypeClass> {
        self.column_type(column).map(TypeClass::classify)
    }

    /// Number of columns
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_types() {
        for ty in [
            "int(11)",
            "INT(10) UNSIGNED",
            "bigint(20) unsigned",
            "decimal(10,2)",
            "DOUBLE",
            "float",
            "tinyint(1)",
        ] {
            assert!(is_numeric_type(ty), "{} should be numeric", ty);
        }
        assert!(!is_numeric_type("varchar(255)"));
        assert!(!is_numeric_type("datetime"));
    }

    #[test]
    fn test_string_types() {
        for ty in ["varchar(255)", "CHAR(2)", "longtext", "text", "varbinary(16)", "mediumblob"] {
            assert!(is_string_type(ty), "{} should be string", ty);
        }
        assert!(!is_string_type("datetime"));
        assert!(!is_string_type("decimal(10,2)"));
    }

    #[test]
    fn test_date_types() {
        for ty in ["date", "DATETIME", "timestamp(6)", "time", "year(4)", "datetime(3)"] {
            assert!(is_date_type(ty), "{} should be date", ty);
        }
        assert!(!is_date_type("varchar(20)"));
        assert!(!is_date_type("dateish"));
    }

    #[test]
    fn test_classify() {
        assert_eq!(TypeClass::classify("decimal(10,2)"), TypeClass::Numeric);
        assert_eq!(TypeClass::classify("varchar(20)"), TypeClass::String);
        assert_eq!(TypeClass::classify("datetime"), TypeClass::Date);
        assert_eq!(TypeClass::classify("json"), TypeClass::Other);
    }

    #[test]
    fn test_schema_lookup() {
        let schema = Schema::new(
            "orders",
            [("total", "decimal(10,2)"), ("status", "varchar(20)"), ("date_created", "datetime")],
        );
        assert_eq!(schema.table(), "orders");
        assert_eq!(schema.len(), 3);
        assert_eq!(schema.class("total"), Some(TypeClass::Numeric));
        assert_eq!(schema.class("status"), Some(TypeClass::String));
        assert_eq!(schema.class("date_created"), Some(TypeClass::Date));
        assert_eq!(schema.class("missing"), None);
        assert!(!schema.has_column("missing"));
        assert_eq!(schema.column_type("missing"), None);
    }
}
