//! Access to the rows a query is evaluated against.

use std::borrow::Cow;

use serde_json::{Map, Value};

/// Name of the field host globs are matched against.
pub const HOSTNAME_FIELD: &str = "hostname";

/// A row of a table: a mapping from field names to numbers or strings.
pub trait Record {
    /// Numeric value of `field`, if present and numeric.
    fn number(&self, field: &str) -> Option<f64>;

    /// Host name of the row, in string form.
    fn hostname(&self) -> Option<Cow<'_, str>>;
}

impl Record for Map<String, Value> {
    fn number(&self, field: &str) -> Option<f64> {
        self.get(field).and_then(Value::as_f64)
    }

    fn hostname(&self) -> Option<Cow<'_, str>> {
        match self.get(HOSTNAME_FIELD)? {
            Value::String(s) => Some(Cow::Borrowed(s.as_str())),
            Value::Number(n) => Some(Cow::Owned(n.to_string())),
            Value::Bool(b) => Some(Cow::Owned(b.to_string())),
            _ => None,
        }
    }
}

impl Record for Value {
    fn number(&self, field: &str) -> Option<f64> {
        self.as_object()?.number(field)
    }

    fn hostname(&self) -> Option<Cow<'_, str>> {
        self.as_object()?.hostname()
    }
}

impl<R: Record + ?Sized> Record for &R {
    fn number(&self, field: &str) -> Option<f64> {
        (**self).number(field)
    }

    fn hostname(&self) -> Option<Cow<'_, str>> {
        (**self).hostname()
    }
}
