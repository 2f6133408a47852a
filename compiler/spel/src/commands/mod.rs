//! Command handlers for the `spel` CLI.
//!
//! Each submodule implements one command. Error reporting shared between
//! them lives here.

use std::io::IsTerminal;

use spel_diagnostic::emitter::{render, render_short, ColorMode};
use spel_diagnostic::Diagnostic;

mod debug;
mod eval;

pub use debug::{print_ast, print_tokens};
pub use eval::{eval_expression, parse_eval_args};

fn colors() -> bool {
    ColorMode::Auto.should_use_colors(std::io::stderr().is_terminal())
}

/// Print `diagnostic` as a caret report against `source`.
pub(crate) fn report(source: &str, diagnostic: &Diagnostic) {
    eprint!("{}", render(source, diagnostic, colors()));
}

/// Print `diagnostic` on one line, for spans that do not point into
/// the text the user typed.
pub(crate) fn report_short(diagnostic: &Diagnostic) {
    eprintln!("{}", render_short(diagnostic));
}

pub(crate) fn fail(message: impl std::fmt::Display) -> ! {
    eprintln!("error: {message}");
    std::process::exit(1);
}
