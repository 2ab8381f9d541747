//! Predicate evaluation interleaved with record hydration.
//!
//! - **token**: literal `system|code` match or vocabulary membership
//! - **date**: calendar-date comparison (`eq`, `gt`, `lt`, `ge`, `le`)
//! - **string**: case-insensitive containment or exact match
//!
//! Other predicate kinds, undeclared predicates and absent values pass.

#![deny(unsafe_code)]

pub mod date;
pub mod engine;
pub mod error;
pub mod text;
pub mod token;

pub use date::Comparator;
pub use engine::FilterEngine;
pub use error::FilterError;
pub use text::StringMode;
pub use token::{TokenLiteral, TokenMode, codings_in};
