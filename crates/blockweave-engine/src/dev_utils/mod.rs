//! Helpers for writing tests and fixtures: a markup notation for documents
//! and selections.

pub mod lexer;
pub mod notation;

pub use notation::{
    NotationError, get_data, parse, parse_elements, parse_fragment, set_data, stringify,
    stringify_elements,
};
