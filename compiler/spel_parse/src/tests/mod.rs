//! Parser tests.
//!
//! - `parser`: precedence, node shapes and error codes
//! - `roundtrip`: printed ASTs reparse to the same text
