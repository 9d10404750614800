//! Known field names and named operations available to a query.

use std::collections::BTreeMap;

use super::parser::compile_query;
use super::expr::Expr;
use crate::Result;

/// Entry in the known-fields table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldName {
    /// The name is itself a field of the records.
    Canonical,
    /// The name stands for another entry, possibly another alias.
    Alias(String),
}

/// Outcome of looking a word up in the field table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Resolved {
    /// A canonical field.
    Field(String),
    /// Not a field; the name reached after following any aliases.
    Name(String),
}

/// The environment a query is compiled under.
#[derive(Debug, Clone, Default)]
pub struct Vocabulary {
    fields: BTreeMap<String, FieldName>,
    operations: BTreeMap<String, Expr>,
}

impl Vocabulary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `name` as a field of the records.
    pub fn add_field(&mut self, name: impl Into<String>) -> &mut Self {
        self.fields.insert(name.into(), FieldName::Canonical);
        self
    }

    /// Register `name` as another name for `target`.
    pub fn add_alias(&mut self, name: impl Into<String>, target: impl Into<String>) -> &mut Self {
        self.fields.insert(name.into(), FieldName::Alias(target.into()));
        self
    }

    /// Register a pre-built expression under `name`.
    pub fn insert_operation(&mut self, name: impl Into<String>, expr: Expr) -> &mut Self {
        self.operations.insert(name.into(), expr);
        self
    }

    /// Compile `query` under this vocabulary and register it as `name`.
    ///
    /// The query may use any operation defined before it.
    pub fn define_operation(&mut self, name: impl Into<String>, query: &str) -> Result<()> {
        let expr = compile_query(query, self)?;
        self.operations.insert(name.into(), expr);
        Ok(())
    }

    /// Canonical field name for `name`, following aliases.
    ///
    /// Returns `None` if `name` does not lead to a field, including when the
    /// aliases form a cycle.
    pub fn resolve_field(&self, name: &str) -> Option<&str> {
        let mut t = name;
        for _ in 0..=self.fields.len() {
            match self.fields.get_key_value(t)? {
                (k, FieldName::Canonical) => return Some(k.as_str()),
                (_, FieldName::Alias(next)) => t = next.as_str(),
            }
        }
        None
    }

    // Lookups are bounded by the table size: a longer chain must revisit an
    // entry, so the aliases are cyclic.
    pub(crate) fn resolve(&self, name: &str) -> std::result::Result<Resolved, String> {
        let mut t = name;
        for _ in 0..=self.fields.len() {
            match self.fields.get(t) {
                None => return Ok(Resolved::Name(t.to_string())),
                Some(FieldName::Canonical) => return Ok(Resolved::Field(t.to_string())),
                Some(FieldName::Alias(next)) => t = next.as_str(),
            }
        }
        Err(format!("Cyclic field alias '{}'", name))
    }

    pub fn operation(&self, name: &str) -> Option<&Expr> {
        self.operations.get(name)
    }

    pub fn field(&self, name: &str) -> Option<&FieldName> {
        self.fields.get(name)
    }

    /// All entries of the field table, sorted by name.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &FieldName)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// All named operations, sorted by name.
    pub fn operations(&self) -> impl Iterator<Item = (&str, &Expr)> {
        self.operations.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty() && self.operations.is_empty()
    }
}
