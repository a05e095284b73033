//! Identifier validation for table names interpolated into SQL text.

use std::fmt;

use billtext_core::{Error, Result};

/// Validate a PostgreSQL identifier for safety and correctness.
///
/// Identifiers must:
/// - Not be empty
/// - Not exceed 63 characters (PostgreSQL identifier limit)
/// - Contain only alphanumeric characters and underscores
/// - Not start with a digit
/// - Not be a SQL keyword (basic check)
///
/// # Examples
///
/// ```
/// use billtext_db::validate_identifier;
///
/// assert!(validate_identifier("councilmatic_core_billdocument").is_ok());
/// assert!(validate_identifier("123invalid").is_err());
/// assert!(validate_identifier("").is_err());
/// ```
pub fn validate_identifier(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(Error::InvalidInput(
            "Identifier cannot be empty".to_string(),
        ));
    }

    if name.len() > 63 {
        return Err(Error::InvalidInput(format!(
            "Identifier exceeds 63 character limit: {} characters",
            name.len()
        )));
    }

    if let Some(first) = name.chars().next() {
        if !first.is_ascii_alphabetic() && first != '_' {
            return Err(Error::InvalidInput(format!(
                "Identifier must start with a letter or underscore, found: '{}'",
                first
            )));
        }
    }

    for ch in name.chars() {
        if !ch.is_ascii_alphanumeric() && ch != '_' {
            return Err(Error::InvalidInput(format!(
                "Identifier contains invalid character: '{}'. Only alphanumeric and underscore allowed",
                ch
            )));
        }
    }

    let lowercase = name.to_lowercase();
    const RESERVED_KEYWORDS: &[&str] = &[
        "select", "insert", "update", "delete", "drop", "create", "alter", "grant", "revoke",
        "truncate", "table", "from", "where",
    ];

    if RESERVED_KEYWORDS.contains(&lowercase.as_str()) {
        return Err(Error::InvalidInput(format!(
            "Identifier '{}' is a reserved SQL keyword",
            name
        )));
    }

    Ok(())
}

/// A validated, optionally schema-qualified table name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableName {
    schema: Option<String>,
    table: String,
}

impl TableName {
    /// Parse `table` or `schema.table`, validating each part.
    pub fn parse(name: &str) -> Result<Self> {
        let (schema, table) = match name.split_once('.') {
            Some((schema, table)) => (Some(schema), table),
            None => (None, name),
        };

        if let Some(schema) = schema {
            validate_identifier(schema)?;
        }
        validate_identifier(table)?;

        Ok(Self {
            schema: schema.map(str::to_string),
            table: table.to_string(),
        })
    }

    /// Table name with a schema prefix.
    pub fn in_schema(schema: &str, table: &str) -> Result<Self> {
        validate_identifier(schema)?;
        validate_identifier(table)?;
        Ok(Self {
            schema: Some(schema.to_string()),
            table: table.to_string(),
        })
    }

    pub fn schema(&self) -> Option<&str> {
        self.schema.as_deref()
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    /// Quoted form for use in SQL text.
    pub fn quoted(&self) -> String {
        match &self.schema {
            Some(schema) => format!("\"{}\".\"{}\"", schema, self.table),
            None => format!("\"{}\"", self.table),
        }
    }
}

impl fmt::Display for TableName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.schema {
            Some(schema) => write!(f, "{}.{}", schema, self.table),
            None => write!(f, "{}", self.table),
        }
    }
}
