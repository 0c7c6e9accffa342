//! A small columnar expectation engine.
//!
//! Records are projected into a [`Batch`] of named columns, then each
//! [`Expectation`] is evaluated against one column and yields an
//! [`ExpectationResult`]. Apart from the not-null check, expectations skip
//! null cells.

use std::fmt;

use itertools::Itertools;
use regex::Regex;

/// Number of offending values kept on a failed result.
pub const PARTIAL_UNEXPECTED_LIMIT: usize = 20;

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Text(String),
    Integer(i64),
}

impl Value {
    pub fn kind(&self) -> Option<ValueKind> {
        match self {
            Value::Null => None,
            Value::Text(_) => Some(ValueKind::Text),
            Value::Integer(_) => Some(ValueKind::Integer),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Text(text) => write!(f, "{text:?}"),
            Value::Integer(n) => write!(f, "{n}"),
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Integer(value)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Null, Into::into)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Text,
    Integer,
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueKind::Text => f.write_str("text"),
            ValueKind::Integer => f.write_str("integer"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub values: Vec<Value>,
}

/// A named table of columns.
///
/// Columns are expected to have the same length. Nothing enforces this,
/// because each expectation only ever reads a single column.
#[derive(Debug, Clone, Default)]
pub struct Batch {
    name: String,
    columns: Vec<Column>,
}

impl Batch {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
        }
    }

    pub fn with_column<I, V>(mut self, name: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.columns.push(Column {
            name: name.into(),
            values: values.into_iter().map(Into::into).collect(),
        });
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn row_count(&self) -> usize {
        self.columns.first().map_or(0, |c| c.values.len())
    }

    pub fn validate(&self, expectations: &[Expectation]) -> ValidationReport {
        ValidationReport {
            batch: self.name.clone(),
            results: expectations.iter().map(|e| e.evaluate(self)).collect(),
        }
    }
}

#[derive(Debug, Clone)]
pub enum Expectation {
    ColumnValuesNotNull {
        column: String,
    },
    ColumnValuesMatchRegex {
        column: String,
        regex: Regex,
    },
    ColumnValuesOfType {
        column: String,
        kind: ValueKind,
    },
    /// Inclusive on both ends; a missing bound is open.
    ColumnValuesBetween {
        column: String,
        min: Option<i64>,
        max: Option<i64>,
    },
}

impl Expectation {
    pub fn not_null(column: impl Into<String>) -> Self {
        Expectation::ColumnValuesNotNull {
            column: column.into(),
        }
    }

    pub fn match_regex(column: impl Into<String>, regex: Regex) -> Self {
        Expectation::ColumnValuesMatchRegex {
            column: column.into(),
            regex,
        }
    }

    pub fn of_type(column: impl Into<String>, kind: ValueKind) -> Self {
        Expectation::ColumnValuesOfType {
            column: column.into(),
            kind,
        }
    }

    pub fn between(column: impl Into<String>, min: Option<i64>, max: Option<i64>) -> Self {
        Expectation::ColumnValuesBetween {
            column: column.into(),
            min,
            max,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Expectation::ColumnValuesNotNull { .. } => "expect_column_values_to_not_be_null",
            Expectation::ColumnValuesMatchRegex { .. } => "expect_column_values_to_match_regex",
            Expectation::ColumnValuesOfType { .. } => "expect_column_values_to_be_of_type",
            Expectation::ColumnValuesBetween { .. } => "expect_column_values_to_be_between",
        }
    }

    pub fn column(&self) -> &str {
        match self {
            Expectation::ColumnValuesNotNull { column }
            | Expectation::ColumnValuesMatchRegex { column, .. }
            | Expectation::ColumnValuesOfType { column, .. }
            | Expectation::ColumnValuesBetween { column, .. } => column,
        }
    }

    fn accepts(&self, value: &Value) -> bool {
        match (self, value) {
            (Expectation::ColumnValuesNotNull { .. }, value) => !value.is_null(),
            (_, Value::Null) => true,
            (Expectation::ColumnValuesMatchRegex { regex, .. }, Value::Text(text)) => {
                regex.is_match(text)
            }
            (Expectation::ColumnValuesMatchRegex { .. }, _) => false,
            (Expectation::ColumnValuesOfType { kind, .. }, value) => value.kind() == Some(*kind),
            (Expectation::ColumnValuesBetween { min, max, .. }, Value::Integer(n)) => {
                min.map_or(true, |min| *n >= min) && max.map_or(true, |max| *n <= max)
            }
            (Expectation::ColumnValuesBetween { .. }, _) => false,
        }
    }

    pub fn evaluate(&self, batch: &Batch) -> ExpectationResult {
        let Some(column) = batch.column(self.column()) else {
            return ExpectationResult {
                expectation: self.name(),
                column: self.column().to_string(),
                success: false,
                element_count: 0,
                unexpected_count: 0,
                partial_unexpected: Vec::new(),
                error: Some(format!("column {:?} not found in {}", self.column(), batch.name)),
            };
        };

        let unexpected = column
            .values
            .iter()
            .filter(|value| !self.accepts(value))
            .collect::<Vec<_>>();

        ExpectationResult {
            expectation: self.name(),
            column: column.name.clone(),
            success: unexpected.is_empty(),
            element_count: column.values.len(),
            unexpected_count: unexpected.len(),
            partial_unexpected: unexpected
                .into_iter()
                .take(PARTIAL_UNEXPECTED_LIMIT)
                .cloned()
                .collect(),
            error: None,
        }
    }
}

impl fmt::Display for Expectation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expectation::ColumnValuesMatchRegex { column, regex } => {
                write!(f, "{}({column}, {})", self.name(), regex.as_str())
            }
            Expectation::ColumnValuesOfType { column, kind } => {
                write!(f, "{}({column}, {kind})", self.name())
            }
            Expectation::ColumnValuesBetween { column, min, max } => write!(
                f,
                "{}({column}, min={}, max={})",
                self.name(),
                min.map_or("-".to_string(), |n| n.to_string()),
                max.map_or("-".to_string(), |n| n.to_string()),
            ),
            _ => write!(f, "{}({})", self.name(), self.column()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExpectationResult {
    pub expectation: &'static str,
    pub column: String,
    pub success: bool,
    pub element_count: usize,
    pub unexpected_count: usize,
    pub partial_unexpected: Vec<Value>,
    pub error: Option<String>,
}

impl fmt::Display for ExpectationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let outcome = if self.success { "passed" } else { "failed" };
        write!(f, "{} on {:?} {outcome}", self.expectation, self.column)?;
        if let Some(error) = &self.error {
            return write!(f, " ({error})");
        }
        if self.unexpected_count > 0 {
            write!(
                f,
                " ({} of {} unexpected: {})",
                self.unexpected_count,
                self.element_count,
                self.partial_unexpected.iter().join(", ")
            )?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ValidationReport {
    pub batch: String,
    pub results: Vec<ExpectationResult>,
}

impl ValidationReport {
    pub fn success(&self) -> bool {
        self.results.iter().all(|r| r.success)
    }

    pub fn failures(&self) -> impl Iterator<Item = &ExpectationResult> {
        self.results.iter().filter(|r| !r.success)
    }
}
