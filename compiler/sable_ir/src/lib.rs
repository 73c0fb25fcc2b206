//! Sable IR - leaf types shared across the Sable compiler.
//!
//! This crate holds the types every phase agrees on and nothing else:
//!
//! - `Name` / `StringInterner` / `SharedInterner`: interned identifiers,
//!   one interner per compile pass
//! - `StmtId` / `Block`: flat-AST statement handles, opaque to the evaluator
//! - `Selector`: fully nesting-resolved CSS selectors

mod ast;
mod interner;
mod name;
mod selector;

pub use ast::{Block, StmtId};
pub use interner::{InternError, SharedInterner, StringInterner, StringLookup};
pub use name::Name;
pub use selector::Selector;
