//! Keyword interpretation: the predicate library and the rule-based interpreter.

pub mod filter;
pub mod interpreter;
pub mod predicates;

pub use filter::{ActiveFilter, Category, Filter, Rule};
pub use interpreter::{InterpretationResult, interpret, normalize_query};
pub use predicates::{Predicate, catalog};
