//! JSON Schema validation for write payloads.
//!
//! Two draft-07 schemas cover the movie API: the full create schema (all fields
//! required except `rate`) and the patch schema (same properties, nothing
//! required). Both are compiled once at first use. The poster URL constraint is
//! asserted separately with the `url` crate, since draft-07 treats `format` as
//! an annotation.

use jsonschema::{Draft, Validator};
use once_cell::sync::Lazy;
use serde::Serialize;
use serde_json::{json, Value};

const GENRES: [&str; 9] = [
    "Action",
    "Adventure",
    "Crime",
    "Comedy",
    "Drama",
    "Fantasy",
    "Horror",
    "Thriller",
    "Sci-Fi",
];

/// Which write schema a route validates its body against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodySchema {
    /// Full movie payload (`POST /movies`)
    MovieCreate,
    /// Partial movie payload (`PATCH /movies/{id}`)
    MoviePatch,
}

fn movie_properties() -> Value {
    json!({
        "title": { "type": "string" },
        "year": { "type": "integer", "minimum": 1900, "maximum": 2024 },
        "director": { "type": "string" },
        "duration": { "type": "integer", "minimum": 1 },
        "rate": { "type": "number", "minimum": 0, "maximum": 10 },
        "poster": { "type": "string" },
        "genre": { "type": "array", "items": { "enum": GENRES } }
    })
}

/// Schema for a full movie payload. `rate` is the only optional field; the
/// store substitutes its default of 5 when absent.
pub fn movie_schema() -> Value {
    json!({
        "$schema": "http://json-schema.org/draft-07/schema#",
        "type": "object",
        "properties": movie_properties(),
        "required": ["title", "year", "director", "duration", "poster", "genre"]
    })
}

/// Schema for a partial movie payload: every property optional.
pub fn movie_patch_schema() -> Value {
    json!({
        "$schema": "http://json-schema.org/draft-07/schema#",
        "type": "object",
        "properties": movie_properties()
    })
}

static MOVIE_SCHEMA: Lazy<Value> = Lazy::new(movie_schema);
static MOVIE_PATCH_SCHEMA: Lazy<Value> = Lazy::new(movie_patch_schema);

// Compiled at startup from static schemas; a failure here is a programming
// error, not a request error.
#[allow(clippy::expect_used)]
static MOVIE_VALIDATOR: Lazy<Validator> = Lazy::new(|| {
    jsonschema::options()
        .with_draft(Draft::Draft7)
        .build(&MOVIE_SCHEMA)
        .expect("movie schema is valid")
});

#[allow(clippy::expect_used)]
static MOVIE_PATCH_VALIDATOR: Lazy<Validator> = Lazy::new(|| {
    jsonschema::options()
        .with_draft(Draft::Draft7)
        .build(&MOVIE_PATCH_SCHEMA)
        .expect("movie patch schema is valid")
});

impl BodySchema {
    fn validator(&self) -> &'static Validator {
        match self {
            BodySchema::MovieCreate => &MOVIE_VALIDATOR,
            BodySchema::MoviePatch => &MOVIE_PATCH_VALIDATOR,
        }
    }
}

/// One field-level validation failure, in the shape clients receive.
#[derive(Debug, Clone, Serialize)]
pub struct ValidationIssue {
    /// JSON pointer to the offending value (`/year`, `/genre/0`, ...)
    pub location: String,
    /// Coarse classifier: `schema` for keyword violations, `format` for the
    /// poster URL check
    pub kind: String,
    pub message: String,
}

impl ValidationIssue {
    pub fn new(
        location: impl Into<String>,
        kind: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        ValidationIssue {
            location: location.into(),
            kind: kind.into(),
            message: message.into(),
        }
    }
}

/// Validate a write payload against the given schema.
///
/// Collects every schema violation rather than stopping at the first, then
/// checks that a present `poster` value parses as an absolute URL.
pub fn validate_body(schema: BodySchema, body: &Value) -> Result<(), Vec<ValidationIssue>> {
    let mut issues: Vec<ValidationIssue> = schema
        .validator()
        .iter_errors(body)
        .map(|err| {
            let location = match err.instance_path().to_string() {
                p if p.is_empty() => "/".to_string(),
                p => p,
            };
            ValidationIssue::new(location, "schema", err.to_string())
        })
        .collect();

    if let Some(poster) = body.get("poster").and_then(|p| p.as_str()) {
        if url::Url::parse(poster).is_err() {
            issues.push(ValidationIssue::new(
                "/poster",
                "format",
                "poster must be a valid URL",
            ));
        }
    }

    if issues.is_empty() {
        Ok(())
    } else {
        Err(issues)
    }
}

/// Render validation issues as the JSON array embedded in 400 responses.
pub fn issues_json(issues: &[ValidationIssue]) -> Value {
    serde_json::to_value(issues).unwrap_or_else(|_| json!([]))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_movie() -> Value {
        json!({
            "title": "Blade Runner",
            "year": 1982,
            "director": "Ridley Scott",
            "duration": 117,
            "rate": 8.1,
            "poster": "https://example.com/blade-runner.jpg",
            "genre": ["Sci-Fi", "Thriller"]
        })
    }

    #[test]
    fn accepts_a_complete_movie() {
        assert!(validate_body(BodySchema::MovieCreate, &valid_movie()).is_ok());
    }

    #[test]
    fn accepts_missing_rate() {
        let mut movie = valid_movie();
        movie.as_object_mut().unwrap().remove("rate");
        assert!(validate_body(BodySchema::MovieCreate, &movie).is_ok());
    }

    #[test]
    fn rejects_missing_title() {
        let mut movie = valid_movie();
        movie.as_object_mut().unwrap().remove("title");
        let issues = validate_body(BodySchema::MovieCreate, &movie).unwrap_err();
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].kind, "schema");
    }

    #[test]
    fn rejects_year_out_of_range() {
        let mut movie = valid_movie();
        movie["year"] = json!(1800);
        let issues = validate_body(BodySchema::MovieCreate, &movie).unwrap_err();
        assert_eq!(issues[0].location, "/year");
    }

    #[test]
    fn rejects_unknown_genre() {
        let mut movie = valid_movie();
        movie["genre"] = json!(["Western"]);
        let issues = validate_body(BodySchema::MovieCreate, &movie).unwrap_err();
        assert_eq!(issues[0].location, "/genre/0");
    }

    #[test]
    fn rejects_invalid_poster_url() {
        let mut movie = valid_movie();
        movie["poster"] = json!("not a url");
        let issues = validate_body(BodySchema::MovieCreate, &movie).unwrap_err();
        assert!(issues.iter().any(|i| i.kind == "format"));
    }

    #[test]
    fn collects_multiple_issues() {
        let movie = json!({ "year": "nineteen eighty two", "duration": -4 });
        let issues = validate_body(BodySchema::MovieCreate, &movie).unwrap_err();
        assert!(issues.len() >= 3, "issues: {issues:?}");
    }

    #[test]
    fn patch_allows_any_subset() {
        assert!(validate_body(BodySchema::MoviePatch, &json!({ "rate": 7.5 })).is_ok());
        assert!(validate_body(BodySchema::MoviePatch, &json!({})).is_ok());
    }

    #[test]
    fn patch_still_enforces_field_constraints() {
        let issues =
            validate_body(BodySchema::MoviePatch, &json!({ "rate": 11 })).unwrap_err();
        assert_eq!(issues[0].location, "/rate");
    }

    #[test]
    fn patch_checks_poster_url() {
        let issues =
            validate_body(BodySchema::MoviePatch, &json!({ "poster": "nope" })).unwrap_err();
        assert_eq!(issues[0].kind, "format");
    }
}
