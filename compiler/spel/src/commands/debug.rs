//! Debug commands: `ast` and `tokens` for inspecting the front end.

use spel_ir::to_string_ast;
use spel_parse::parse_expression;

use super::{fail, report};

/// Parse an expression and print its canonical form and syntax tree.
pub fn print_ast(source: &str, max_length: usize) {
    match parse_expression(source, max_length) {
        Ok(expr) => {
            println!("{}", to_string_ast(&expr));
            println!();
            println!("{expr:#?}");
        }
        Err(err) => {
            report(source, err.diagnostic());
            fail("expression did not parse");
        }
    }
}

/// Tokenize an expression and print the token stream.
pub fn print_tokens(source: &str) {
    match spel_lexer::tokenize(source) {
        Ok(tokens) => {
            println!("Tokens ({}):", tokens.len());
            for token in tokens.iter() {
                println!("  {token:?}");
            }
        }
        Err(err) => {
            report(source, &err.0);
            fail("expression did not tokenize");
        }
    }
}
