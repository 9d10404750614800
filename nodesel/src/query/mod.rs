//! Query micro-language for selecting rows of a node table.
//!
//! # Syntax Overview
//!
//! - **Host patterns**: `c1-*`, `gpu-[1-4]`, `login*`
//! - **Relations**: `field<op>number` with `<`, `<=`, `>`, `>=`, `=`
//! - **Connectives**: `and`, `or`, parentheses
//! - **Complement**: `~expr`, relative to the whole table
//! - **Named operations**: words defined in the [`Vocabulary`]
//!
//! Precedence from low to high: `or`, `and`, relations, `~`.

mod expr;
mod parser;
mod vocabulary;

pub use expr::{Expr, RelOp, SetOp};
pub use parser::compile_query;
pub use vocabulary::{FieldName, Vocabulary};

#[cfg(test)]
mod tests;
