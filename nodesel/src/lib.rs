//! nodesel: node selection queries.
//!
//! Compiles compact textual queries (host globs, relational comparisons on named
//! fields, `and`/`or`/`~`) into expression trees and evaluates them against
//! in-memory tables of records, producing dense bitsets of matching rows.

pub mod bitset;
pub mod catalog;
pub mod config;
pub mod error;
pub mod hostglob;
pub mod query;
pub mod record;

pub use bitset::{intersection, union, Bitset};
pub use config::Config;
pub use error::{Error, Result};
pub use hostglob::{compress_hostnames, expand_pattern, split_multi_pattern, HostFilter, HostGlobber};
pub use query::{compile_query, Expr, FieldName, RelOp, SetOp, Vocabulary};
pub use record::Record;
