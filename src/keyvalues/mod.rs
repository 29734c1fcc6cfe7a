//! KeyValues (VDF) text parsing and the document tree it produces.
//!
//! This module is the foundation the rest of the crate builds on:
//!
//! - [`parser`]: tokenizer and recursive parser turning KeyValues text into
//!   a tree, with positioned [`ParseError`]s for malformed input
//! - [`document`]: the ordered, duplicate-key-tolerant [`Node`] tree and
//!   the [`Document`] wrapper consumers query
//!
//! Serialization back to text and the binary VDF variant are deliberately
//! not supported; Steam writes these files, this crate only reads them.

pub mod document;
pub mod parser;

pub use document::{Document, Node};
pub use parser::{ParseError, ParseErrorKind, parse};
