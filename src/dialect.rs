//! Database kinds and their catalog conventions.
//!
//! The kind is chosen once when a snapshot is loaded. Nothing past the loader
//! looks at it.

/// Database kind a catalog snapshot was taken from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DatabaseKind {
    #[default]
    PostgreSQL,
    MySQL,
    /// Standard `information_schema` without vendor extensions
    Generic,
}

impl DatabaseKind {
    /// Parse kind from string.
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "postgres" | "postgresql" | "pg" => Some(Self::PostgreSQL),
            "mysql" | "mariadb" => Some(Self::MySQL),
            "generic" => Some(Self::Generic),
            _ => None,
        }
    }

    /// `data_type` the catalog reports for columns declared with a user-defined type.
    pub fn udt_placeholder(self) -> &'static str {
        match self {
            Self::PostgreSQL | Self::Generic => "USER-DEFINED",
            Self::MySQL => "enum",
        }
    }

    /// Short spelling of a verbose catalog type name.
    pub fn short_type_name(self, data_type: &str) -> String {
        let lower = data_type.trim().to_lowercase();
        let short = match self {
            Self::PostgreSQL => short_postgres_type(&lower),
            Self::MySQL => short_mysql_type(&lower),
            Self::Generic => short_generic_type(&lower),
        };
        short
            .map(str::to_string)
            .unwrap_or_else(|| data_type.to_string())
    }
}

fn short_postgres_type(lower: &str) -> Option<&'static str> {
    let short = match lower {
        "character varying" => "varchar",
        "character" => "char",
        "integer" => "int4",
        "smallint" => "int2",
        "bigint" => "int8",
        "double precision" => "float8",
        "real" => "float4",
        "boolean" => "bool",
        "timestamp with time zone" => "timestamptz",
        "timestamp without time zone" => "timestamp",
        "time with time zone" => "timetz",
        "time without time zone" => "time",
        "bit varying" => "varbit",
        _ => return None,
    };
    Some(short)
}

fn short_mysql_type(lower: &str) -> Option<&'static str> {
    let short = match lower {
        "integer" => "int",
        "boolean" => "tinyint",
        "character varying" => "varchar",
        "character" => "char",
        "double precision" => "double",
        _ => return None,
    };
    Some(short)
}

fn short_generic_type(lower: &str) -> Option<&'static str> {
    let short = match lower {
        "character varying" => "varchar",
        "character" => "char",
        "integer" => "int",
        "double precision" => "double",
        _ => return None,
    };
    Some(short)
}
