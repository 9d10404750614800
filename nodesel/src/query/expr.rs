//! Query expression trees and their evaluation.

use std::fmt;

use crate::bitset::{intersection, union, Bitset};
use crate::hostglob::HostGlobber;
use crate::record::Record;

/// Relational operators on numeric fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelOp {
    /// `<`
    Lt,
    /// `<=`
    Le,
    /// `>`
    Gt,
    /// `>=`
    Ge,
    /// `=`
    Eq,
}

impl RelOp {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "<" => Some(RelOp::Lt),
            "<=" => Some(RelOp::Le),
            ">" => Some(RelOp::Gt),
            ">=" => Some(RelOp::Ge),
            "=" => Some(RelOp::Eq),
            _ => None,
        }
    }

    /// Compare a field value against the constant.
    #[inline]
    pub fn apply(self, a: f64, b: f64) -> bool {
        match self {
            RelOp::Lt => a < b,
            RelOp::Le => a <= b,
            RelOp::Gt => a > b,
            RelOp::Ge => a >= b,
            RelOp::Eq => a == b,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RelOp::Lt => "<",
            RelOp::Le => "<=",
            RelOp::Gt => ">",
            RelOp::Ge => ">=",
            RelOp::Eq => "=",
        }
    }
}

impl fmt::Display for RelOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Boolean connectives, evaluated as set operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetOp {
    /// `and`: intersection
    And,
    /// `or`: union
    Or,
}

impl SetOp {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "and" => Some(SetOp::And),
            "or" => Some(SetOp::Or),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SetOp::And => "and",
            SetOp::Or => "or",
        }
    }
}

impl fmt::Display for SetOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A compiled query.
///
/// Every node maps a set of candidate rows to the subset (or, for `Not`, the
/// complement) it selects. Trees are immutable once built and can be
/// evaluated any number of times.
#[derive(Debug, Clone)]
pub enum Expr {
    /// `field <op> value`
    Rel { op: RelOp, field: String, value: f64 },
    /// `~child`: complement relative to the whole table.
    Not(Box<Expr>),
    /// `left and right`, `left or right`
    Set {
        op: SetOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    /// Host name pattern, matched against each row's host name.
    Glob(HostGlobber),
}

impl Expr {
    /// Evaluate against `data`, testing only the rows whose index is in `elems`.
    pub fn eval<R: Record>(&self, data: &[R], elems: &Bitset) -> Bitset {
        match self {
            Expr::Rel { op, field, value } => {
                let mut result = Bitset::new(elems.len(), false);
                elems.enumerate(|n| {
                    let hit = data
                        .get(n)
                        .and_then(|r| r.number(field))
                        .is_some_and(|a| op.apply(a, *value));
                    if hit {
                        result.set_bit(n);
                    }
                });
                result
            }
            Expr::Not(child) => {
                // The universe is the whole table, not the incoming candidates.
                let mut result = Bitset::new(data.len(), true);
                child.eval(data, elems).enumerate(|n| result.clear_bit(n));
                result
            }
            Expr::Set { op, left, right } => {
                let a = left.eval(data, elems);
                let b = right.eval(data, elems);
                match op {
                    SetOp::And => intersection(&a, &b),
                    SetOp::Or => union(&a, &b),
                }
            }
            Expr::Glob(globber) => {
                let mut result = Bitset::new(elems.len(), false);
                elems.enumerate(|n| {
                    let hit = data
                        .get(n)
                        .and_then(|r| r.hostname())
                        .is_some_and(|h| globber.is_match(&h));
                    if hit {
                        result.set_bit(n);
                    }
                });
                result
            }
        }
    }

    /// Evaluate against every row of `data`.
    pub fn select<R: Record>(&self, data: &[R]) -> Bitset {
        let selected = self.eval(data, &Bitset::new(data.len(), true));
        tracing::trace!(rows = data.len(), selected = selected.count(), "evaluated query");
        selected
    }

    /// True iff the single row `record` is selected.
    pub fn matches<R: Record>(&self, record: &R) -> bool {
        self.eval(std::slice::from_ref(record), &Bitset::new(1, true))
            .is_set(0)
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Rel { op, field, value } => write!(f, "({} {} {})", op, field, value),
            Expr::Not(child) => write!(f, "(~ {})", child),
            Expr::Set { op, left, right } => write!(f, "({} {} {})", op, left, right),
            Expr::Glob(globber) => write!(f, "(node {})", globber),
        }
    }
}
