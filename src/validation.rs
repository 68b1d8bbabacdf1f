//! Form field validation and sanitization
//!
//! A form declares an ordered list of [`FieldChain`]s. A chain is a list of
//! pure rules `&str -> Result<String, String>`: sanitizers always succeed and
//! return the transformed value, validators return the value unchanged or an
//! error message. Every rule of a chain runs, so the value handed back to a
//! re-rendered form is fully sanitized, but only the first failure of a chain
//! is reported.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use validator::ValidateLength;

/// Raw urlencoded form body, keeping repeated keys.
#[derive(Debug, Clone, Default)]
pub struct FormFields {
    pairs: Vec<(String, String)>,
}

impl From<Vec<(String, String)>> for FormFields {
    fn from(pairs: Vec<(String, String)>) -> Self {
        Self { pairs }
    }
}

impl FormFields {
    /// All submitted values for `name`
    pub fn get(&self, name: &str) -> FieldValue {
        let mut values: Vec<String> = self
            .pairs
            .iter()
            .filter(|(key, _)| key == name)
            .map(|(_, value)| value.clone())
            .collect();

        match values.len() {
            0 => FieldValue::Absent,
            1 => FieldValue::Scalar(values.remove(0)),
            _ => FieldValue::Many(values),
        }
    }

    /// Single value of a field; the last one wins when the key is repeated.
    pub fn scalar(&self, name: &str) -> Option<&str> {
        self.pairs
            .iter()
            .rev()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }
}

/// Shape of a submitted field before normalization
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Absent,
    Scalar(String),
    Many(Vec<String>),
}

/// Normalize a multi-valued field: absent → empty, scalar → one element,
/// collection → unchanged.
pub fn normalize_multi(value: FieldValue) -> Vec<String> {
    match value {
        FieldValue::Absent => Vec::new(),
        FieldValue::Scalar(value) => vec![value],
        FieldValue::Many(values) => values,
    }
}

/// A single sanitizer or validator
pub type Rule = Arc<dyn Fn(&str) -> Result<String, String> + Send + Sync>;

/// Ordered rules for one form field
#[derive(Clone)]
pub struct FieldChain {
    field: &'static str,
    multi: bool,
    optional: bool,
    rules: Vec<Rule>,
}

impl FieldChain {
    /// Chain over a single-valued field
    pub fn body(field: &'static str) -> Self {
        Self {
            field,
            multi: false,
            optional: false,
            rules: Vec::new(),
        }
    }

    /// Chain applied to every element of a multi-valued field
    pub fn each(field: &'static str) -> Self {
        Self {
            multi: true,
            ..Self::body(field)
        }
    }

    /// Skip the chain when the submitted value is empty
    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    pub fn rule(mut self, rule: Rule) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn trim(self) -> Self {
        self.rule(Arc::new(|value: &str| -> Result<String, String> {
            Ok(value.trim().to_string())
        }))
    }

    pub fn escape(self) -> Self {
        self.rule(Arc::new(|value: &str| -> Result<String, String> {
            Ok(escape_html(value))
        }))
    }

    pub fn min_length(self, min: u64, message: &'static str) -> Self {
        self.rule(Arc::new(move |value: &str| {
            check(value.to_string().validate_length(Some(min), None, None), value, message)
        }))
    }

    pub fn max_length(self, max: u64, message: &'static str) -> Self {
        self.rule(Arc::new(move |value: &str| {
            check(value.to_string().validate_length(None, Some(max), None), value, message)
        }))
    }

    /// ASCII letters and digits only, at least one character
    pub fn alphanumeric(self, message: &'static str) -> Self {
        self.rule(Arc::new(move |value: &str| {
            let valid = !value.is_empty() && value.chars().all(|c| c.is_ascii_alphanumeric());
            check(valid, value, message)
        }))
    }

    /// ISO 8601 date or RFC 3339 timestamp, normalized to its canonical form
    pub fn iso8601(self, message: &'static str) -> Self {
        self.rule(Arc::new(move |value: &str| {
            if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
                return Ok(date.format("%Y-%m-%d").to_string());
            }
            DateTime::parse_from_rfc3339(value)
                .map(|ts| ts.with_timezone(&Utc).to_rfc3339())
                .map_err(|_| message.to_string())
        }))
    }

    pub fn one_of(self, allowed: &'static [&'static str], message: &'static str) -> Self {
        self.rule(Arc::new(move |value: &str| {
            check(allowed.contains(&value), value, message)
        }))
    }

    /// Run every rule, remembering only the first failure.
    fn apply(&self, raw: &str) -> (String, Option<String>) {
        if self.optional && raw.trim().is_empty() {
            return (String::new(), None);
        }

        let mut value = raw.to_string();
        let mut error = None;
        for rule in &self.rules {
            match (**rule)(&value) {
                Ok(next) => value = next,
                Err(message) => {
                    error.get_or_insert(message);
                }
            }
        }
        (value, error)
    }
}

fn check(valid: bool, value: &str, message: &str) -> Result<String, String> {
    if valid {
        Ok(value.to_string())
    } else {
        Err(message.to_string())
    }
}

/// A message attached to one form field
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
    pub value: String,
}

/// Sanitized values of a submitted form plus the errors found on the way
#[derive(Debug, Clone, Default)]
pub struct Validated {
    values: BTreeMap<&'static str, String>,
    lists: BTreeMap<&'static str, Vec<String>>,
    errors: Vec<FieldError>,
}

impl Validated {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn errors(&self) -> &[FieldError] {
        &self.errors
    }

    /// Record an error found after the rule chains ran (e.g. a dangling reference)
    pub fn push_error(&mut self, field: &str, message: impl Into<String>) {
        let value = self
            .values
            .get(field)
            .cloned()
            .unwrap_or_default();
        self.errors.push(FieldError {
            field: field.to_string(),
            message: message.into(),
            value,
        });
    }

    /// Sanitized value of a single-valued field, empty when not declared
    pub fn value(&self, field: &str) -> &str {
        self.values.get(field).map(String::as_str).unwrap_or("")
    }

    /// Sanitized elements of a multi-valued field
    pub fn list(&self, field: &str) -> &[String] {
        self.lists.get(field).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn date(&self, field: &str) -> Option<NaiveDate> {
        parse_date(self.value(field))
    }

    pub fn datetime(&self, field: &str) -> Option<DateTime<Utc>> {
        parse_datetime(self.value(field))
    }

    /// Single-valued fields keyed by name, for re-rendering a form
    pub fn values(&self) -> &BTreeMap<&'static str, String> {
        &self.values
    }
}

/// Run `chains` in declared order over a submitted form.
pub fn validate(form: &FormFields, chains: &[FieldChain]) -> Validated {
    let mut validated = Validated::default();

    for chain in chains {
        if chain.multi {
            let mut sanitized = Vec::new();
            for raw in normalize_multi(form.get(chain.field)) {
                let (value, error) = chain.apply(&raw);
                if let Some(message) = error {
                    validated.errors.push(FieldError {
                        field: chain.field.to_string(),
                        message,
                        value: value.clone(),
                    });
                }
                sanitized.push(value);
            }
            validated.lists.insert(chain.field, sanitized);
        } else {
            let raw = form.scalar(chain.field).unwrap_or("");
            let (value, error) = chain.apply(raw);
            if let Some(message) = error {
                validated.errors.push(FieldError {
                    field: chain.field.to_string(),
                    message,
                    value: value.clone(),
                });
            }
            validated.values.insert(chain.field, value);
        }
    }

    validated
}

/// HTML-escape `& " ' < > / \ backtick` the way form sanitizers usually do
///
/// `tera::escape_html` leaves `\` and backtick alone, so it is not reused here.
pub fn escape_html(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#x27;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '/' => escaped.push_str("&#x2F;"),
            '\\' => escaped.push_str("&#x5C;"),
            '`' => escaped.push_str("&#96;"),
            c => escaped.push(c),
        }
    }
    escaped
}

pub fn parse_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(value).ok().map(|ts| ts.date_naive()))
}

/// Timestamp from an RFC 3339 string, or midnight UTC of a plain date
pub fn parse_datetime(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|ts| ts.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(value, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
                .map(|midnight| midnight.and_utc())
        })
}
