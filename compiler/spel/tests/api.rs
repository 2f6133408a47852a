// Test code uses unwrap/expect for clarity - panics provide good test failure messages
#![allow(clippy::unwrap_used, clippy::expect_used)]

//! Tests of the public `spel` API.
//!
//! # Organization
//!
//! - `parser` - parsing, length limits and writable expressions
//! - `templates` - `#{...}` templates
//! - `modes` - compiler modes and the switch between interpreted and
//!   compiled evaluation
//! - `concurrency` - one expression shared between threads

#[path = "api/parser.rs"]
mod parser;

#[path = "api/templates.rs"]
mod templates;

#[path = "api/modes.rs"]
mod modes;

#[path = "api/concurrency.rs"]
mod concurrency;
