//! Query-string and filter-expression builders.
//!
//! `QueryString` renders ordered, percent-encoded `name=value` pairs.
//! `ListQuery` carries the standard read options of the service and
//! `SearchQuery` produces the `q` filter expression: criteria of the form
//! `FIELD op value` joined with ` and `.

use std::fmt;

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde::{Deserialize, Serialize};

use crate::error::{ApiError, Result};

/// Everything except ASCII alphanumerics and the RFC 3986 unreserved marks.
pub(crate) const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// Ordered query parameters. Names are emitted verbatim, values are encoded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryString {
    pairs: Vec<(String, String)>,
}

impl QueryString {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, name: &str, value: impl fmt::Display) -> &mut Self {
        self.pairs.push((name.to_string(), value.to_string()));
        self
    }

    /// Push `value` only when it is present.
    pub fn push_opt<T: fmt::Display>(&mut self, name: &str, value: Option<T>) -> &mut Self {
        if let Some(value) = value {
            self.push(name, value);
        }
        self
    }

    pub fn push_bool(&mut self, name: &str, value: bool) -> &mut Self {
        self.push(name, if value { "true" } else { "false" })
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Rendered form, `""` when empty, otherwise starting with `?`.
    pub fn to_query(&self) -> String {
        self.to_string()
    }

    pub fn pairs(&self) -> &[(String, String)] {
        &self.pairs
    }
}

impl fmt::Display for QueryString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut separator = '?';
        for (name, value) in &self.pairs {
            write!(f, "{separator}{name}={}", utf8_percent_encode(value, COMPONENT))?;
            separator = '&';
        }
        Ok(())
    }
}

/// Read options accepted by list and single-record endpoints.
///
/// Serializes to the JSON body used by `readwithbodyparamters`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub q: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expand_level: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub with_count: Option<bool>,
}

impl ListQuery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw filter expression. An empty string clears the filter.
    pub fn filter(mut self, expression: impl Into<String>) -> Self {
        let expression = expression.into();
        self.q = (!expression.trim().is_empty()).then_some(expression);
        self
    }

    pub fn fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let joined = fields
            .into_iter()
            .map(|f| f.as_ref().trim().to_string())
            .filter(|f| !f.is_empty())
            .collect::<Vec<_>>()
            .join(",");
        self.fields = (!joined.is_empty()).then_some(joined);
        self
    }

    pub fn sort(mut self, sort: impl Into<String>) -> Self {
        self.sort = Some(sort.into());
        self
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: u32) -> Self {
        self.offset = Some(offset);
        self
    }

    pub fn expand_level(mut self, level: u32) -> Self {
        self.expand_level = Some(level);
        self
    }

    pub fn with_count(mut self, with_count: bool) -> Self {
        self.with_count = Some(with_count);
        self
    }

    /// Render in the fixed order `q, fields, sort, limit, offset,
    /// expandLevel, withCount`, skipping unset options.
    pub fn to_query_string(&self) -> QueryString {
        let mut query = QueryString::new();
        query
            .push_opt("q", self.q.as_deref())
            .push_opt("fields", self.fields.as_deref())
            .push_opt("sort", self.sort.as_deref())
            .push_opt("limit", self.limit)
            .push_opt("offset", self.offset)
            .push_opt("expandLevel", self.expand_level)
            .push_opt("withCount", self.with_count);
        query
    }
}

/// A literal on the right-hand side of a criterion.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Str(s) => write!(f, "'{}'", s.replace('\'', "''")),
            Value::Int(n) => write!(f, "{n}"),
            Value::Float(n) => write!(f, "{n}"),
            Value::Bool(b) => write!(f, "{b}"),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Int(n.into())
    }
}

impl From<u32> for Value {
    fn from(n: u32) -> Self {
        Value::Int(n.into())
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Float(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

/// Comparison operators understood by the `q` parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Eq,
    Ne,
    Gt,
    Ge,
    Lt,
    Le,
    Like,
}

impl Op {
    pub fn as_str(self) -> &'static str {
        match self {
            Op::Eq => "eq",
            Op::Ne => "ne",
            Op::Gt => "gt",
            Op::Ge => "ge",
            Op::Lt => "lt",
            Op::Le => "le",
            Op::Like => "like",
        }
    }
}

/// One `FIELD op value` term.
#[derive(Debug, Clone, PartialEq)]
pub struct Criterion {
    pub field: String,
    pub op: Op,
    pub value: Value,
}

impl Criterion {
    pub fn new(field: impl Into<String>, op: Op, value: impl Into<Value>) -> Self {
        Self {
            field: field.into(),
            op,
            value: value.into(),
        }
    }

    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(field, Op::Eq, value)
    }

    pub fn ne(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(field, Op::Ne, value)
    }

    pub fn gt(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(field, Op::Gt, value)
    }

    pub fn ge(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(field, Op::Ge, value)
    }

    pub fn lt(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(field, Op::Lt, value)
    }

    pub fn le(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(field, Op::Le, value)
    }

    /// `pattern` is sent as given; `*` is the server-side wildcard.
    pub fn like(field: impl Into<String>, pattern: impl Into<String>) -> Self {
        Self::new(field, Op::Like, Value::Str(pattern.into()))
    }

    /// `FIELD like 'prefix*'`.
    pub fn starts_with(field: impl Into<String>, prefix: impl AsRef<str>) -> Self {
        Self::like(field, format!("{}*", prefix.as_ref()))
    }

    pub fn render(&self) -> Result<String> {
        validate_field(&self.field)?;
        if let Value::Float(n) = self.value {
            if !n.is_finite() {
                return Err(ApiError::InvalidArgument(format!(
                    "{} compares against non-finite {n}",
                    self.field
                )));
            }
        }
        Ok(format!("{} {} {}", self.field, self.op.as_str(), self.value))
    }
}

/// A conjunction of criteria rendered into the `q` parameter.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchQuery {
    criteria: Vec<Criterion>,
}

impl SearchQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn and(mut self, criterion: Criterion) -> Self {
        self.criteria.push(criterion);
        self
    }

    pub fn push(&mut self, criterion: Criterion) {
        self.criteria.push(criterion);
    }

    /// Search-by-example: text values become prefix matches, everything
    /// else an exact match. Blank text values are ignored.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        let mut search = Self::new();
        for (field, value) in pairs {
            match value.into() {
                Value::Str(s) if s.trim().is_empty() => {}
                Value::Str(s) => search.push(Criterion::starts_with(field, s)),
                other => search.push(Criterion::new(field, Op::Eq, other)),
            }
        }
        search
    }

    pub fn is_empty(&self) -> bool {
        self.criteria.is_empty()
    }

    pub fn criteria(&self) -> &[Criterion] {
        &self.criteria
    }

    /// `None` when there are no criteria, so no `q` parameter is sent.
    pub fn to_expression(&self) -> Result<Option<String>> {
        if self.criteria.is_empty() {
            return Ok(None);
        }
        let terms = self
            .criteria
            .iter()
            .map(Criterion::render)
            .collect::<Result<Vec<_>>>()?;
        Ok(Some(terms.join(" and ")))
    }
}

impl FromIterator<Criterion> for SearchQuery {
    fn from_iter<I: IntoIterator<Item = Criterion>>(iter: I) -> Self {
        Self {
            criteria: iter.into_iter().collect(),
        }
    }
}

pub(crate) fn validate_field(field: &str) -> Result<()> {
    let valid = !field.is_empty()
        && field
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.');
    if valid {
        Ok(())
    } else {
        Err(ApiError::InvalidArgument(format!("field name {field:?}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_query_string_renders_nothing() {
        assert_eq!(QueryString::new().to_string(), "");
        assert_eq!(ListQuery::new().to_query_string().to_string(), "");
    }

    #[test]
    fn query_string_keeps_insertion_order_and_encodes_values() {
        let mut query = QueryString::new();
        query.push("b", "x y").push("a", 1).push_opt::<u32>("skipped", None);
        assert_eq!(query.to_string(), "?b=x%20y&a=1");

        query.push_bool("withCount", false);
        assert_eq!(query.to_query(), "?b=x%20y&a=1&withCount=false");
    }

    #[test]
    fn list_query_renders_in_fixed_order() {
        let query = ListQuery::new()
            .with_count(true)
            .limit(10)
            .fields(["CODE", " TITLE "])
            .offset(20)
            .sort("CODE desc")
            .expand_level(2)
            .filter("CODE eq 'A'");
        assert_eq!(
            query.to_query_string().to_string(),
            "?q=CODE%20eq%20%27A%27&fields=CODE%2CTITLE&sort=CODE%20desc&limit=10&offset=20&expandLevel=2&withCount=true"
        );
    }

    #[test]
    fn blank_filter_and_fields_are_dropped() {
        let query = ListQuery::new().filter("  ").fields(Vec::<String>::new());
        assert!(query.q.is_none());
        assert!(query.fields.is_none());
    }

    #[test]
    fn list_query_serializes_camel_case_without_unset_options() {
        let body = serde_json::to_value(ListQuery::new().limit(5).expand_level(1)).unwrap();
        assert_eq!(body, serde_json::json!({"limit": 5, "expandLevel": 1}));
    }

    #[test]
    fn starts_with_appends_wildcard() {
        let c = Criterion::starts_with("CODE", "AB");
        assert_eq!(c.render().unwrap(), "CODE like 'AB*'");
    }

    #[test]
    fn numeric_and_boolean_values_are_bare() {
        assert_eq!(Criterion::eq("STATUS", 0).render().unwrap(), "STATUS eq 0");
        assert_eq!(Criterion::ge("PRICE", 9.5).render().unwrap(), "PRICE ge 9.5");
        assert_eq!(Criterion::ne("ACTIVE", true).render().unwrap(), "ACTIVE ne true");
    }

    #[test]
    fn single_quotes_are_doubled() {
        let c = Criterion::eq("TITLE", "O'Neil");
        assert_eq!(c.render().unwrap(), "TITLE eq 'O''Neil'");
    }

    #[test]
    fn criteria_join_with_and() {
        let search = SearchQuery::new()
            .and(Criterion::starts_with("CODE", "A"))
            .and(Criterion::eq("STATUS", 1));
        assert_eq!(
            search.to_expression().unwrap().as_deref(),
            Some("CODE like 'A*' and STATUS eq 1")
        );
    }

    #[test]
    fn empty_search_has_no_expression() {
        assert_eq!(SearchQuery::new().to_expression().unwrap(), None);
    }

    #[test]
    fn invalid_field_name_is_rejected() {
        let search = SearchQuery::new().and(Criterion::eq("CODE eq 1 or X", 1));
        assert!(matches!(
            search.to_expression(),
            Err(ApiError::InvalidArgument(_))
        ));
        assert!(Criterion::eq("", 1).render().is_err());
    }

    #[test]
    fn non_finite_floats_are_rejected() {
        for n in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            assert!(matches!(
                Criterion::eq("PRICE", n).render(),
                Err(ApiError::InvalidArgument(_))
            ));
        }
        let search = SearchQuery::from_pairs([("CODE", Value::from("K")), ("PRICE", Value::Float(f64::NAN))]);
        assert!(search.to_expression().is_err());
        assert_eq!(Criterion::gt("PRICE", 2.5).render().unwrap(), "PRICE gt 2.5");
    }

    #[test]
    fn from_pairs_uses_prefix_for_text_and_eq_otherwise() {
        let search = SearchQuery::from_pairs([
            ("CODE", Value::from("K")),
            ("TITLE", Value::from("   ")),
            ("STATUS", Value::from(0)),
        ]);
        assert_eq!(search.criteria().len(), 2);
        assert_eq!(
            search.to_expression().unwrap().as_deref(),
            Some("CODE like 'K*' and STATUS eq 0")
        );
    }
}
