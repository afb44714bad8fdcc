//! Ingestion schema definitions
//!
//! The schema fixes the field set and field types of every canonical record
//! before ingestion begins. A raw row missing a required field is skipped by
//! the normalizer; a raw value of the wrong shape is coerced or defaulted per
//! the rules in [`crate::normalizer`].

use crate::{IngestionError, Result};
use serde::{Deserialize, Serialize};

/// Semantic type of a schema field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    Text,
    Int,
    Number,
    Date,
    TextArray,
    IntArray,
}

/// One named, typed field of the ingestion schema
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldSpec {
    /// Canonical field name
    pub name: String,
    /// Column name in the raw source row, when it differs from `name`
    pub source: Option<String>,
    pub field_type: FieldType,
    /// Required fields cause the whole row to be skipped when missing or null
    pub required: bool,
}

impl FieldSpec {
    pub fn required(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            source: None,
            field_type,
            required: true,
        }
    }

    pub fn optional(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            source: None,
            field_type,
            required: false,
        }
    }

    /// Read this field from a differently named raw column
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Raw column name this field is read from
    pub fn source_name(&self) -> &str {
        self.source.as_deref().unwrap_or(&self.name)
    }
}

/// Ordered, validated set of field specifications
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Schema {
    fields: Vec<FieldSpec>,
}

impl Schema {
    /// Build a schema, rejecting empty or self-contradictory definitions.
    ///
    /// This is the only fatal configuration check in the pipeline; it runs
    /// before any record is processed.
    pub fn new(fields: Vec<FieldSpec>) -> Result<Self> {
        if fields.is_empty() {
            return Err(IngestionError::ConfigError(
                "schema must declare at least one field".to_string(),
            ));
        }

        let mut seen = std::collections::HashSet::new();
        for field in &fields {
            if field.name.is_empty() {
                return Err(IngestionError::ConfigError(
                    "schema field names must not be empty".to_string(),
                ));
            }
            if !seen.insert(field.name.as_str()) {
                return Err(IngestionError::ConfigError(format!(
                    "duplicate schema field: {}",
                    field.name
                )));
            }
        }

        Ok(Self { fields })
    }

    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// The movie catalog schema used by the CineScope discovery collection.
    ///
    /// `movie_id` and `title` are the identity-bearing required fields; every
    /// other field is nullable or defaulted. `popularity` is always defaulted
    /// to 0.0, never required. The `movie_id` field is exported as `id` in the
    /// upstream dataset.
    pub fn movies() -> Self {
        let fields = vec![
            FieldSpec::required("movie_id", FieldType::Int).with_source("id"),
            FieldSpec::required("title", FieldType::Text),
            FieldSpec::optional("overview", FieldType::Text),
            FieldSpec::optional("original_language", FieldType::Text),
            FieldSpec::optional("tagline", FieldType::Text),
            FieldSpec::optional("poster_path", FieldType::Text),
            FieldSpec::optional("genres", FieldType::TextArray),
            FieldSpec::optional("keywords", FieldType::TextArray),
            FieldSpec::optional("credits", FieldType::TextArray),
            FieldSpec::optional("recommendations", FieldType::IntArray),
            FieldSpec::optional("budget", FieldType::Int),
            FieldSpec::optional("revenue", FieldType::Int),
            FieldSpec::optional("vote_average", FieldType::Number),
            FieldSpec::optional("vote_count", FieldType::Int),
            FieldSpec::optional("popularity", FieldType::Number),
            FieldSpec::optional("runtime", FieldType::Int),
            FieldSpec::optional("year", FieldType::Int),
            FieldSpec::optional("release_date", FieldType::Date),
        ];

        // The movie schema is statically well-formed.
        Self::new(fields).expect("movie schema is valid")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_schema_rejected() {
        let result = Schema::new(vec![]);
        assert!(matches!(result, Err(IngestionError::ConfigError(_))));
    }

    #[test]
    fn test_duplicate_field_rejected() {
        let result = Schema::new(vec![
            FieldSpec::required("title", FieldType::Text),
            FieldSpec::optional("title", FieldType::Text),
        ]);
        assert!(matches!(result, Err(IngestionError::ConfigError(_))));
    }

    #[test]
    fn test_movies_schema() {
        let schema = Schema::movies();
        assert_eq!(schema.len(), 18);

        let movie_id = &schema.fields()[0];
        assert_eq!(movie_id.name, "movie_id");
        assert_eq!(movie_id.source_name(), "id");
        assert!(movie_id.required);

        let required: Vec<&str> = schema
            .fields()
            .iter()
            .filter(|f| f.required)
            .map(|f| f.name.as_str())
            .collect();
        assert_eq!(required, vec!["movie_id", "title"]);
    }
}
