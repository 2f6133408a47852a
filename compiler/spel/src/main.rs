//! SpEL CLI
//!
//! Evaluate and inspect expressions from the command line.

mod commands;

use commands::{eval_expression, parse_eval_args, print_ast, print_tokens};
use spel::SpelParserConfiguration;

/// Install a hierarchical subscriber when `SPEL_LOG` (or `RUST_LOG`) is set.
fn init_tracing() {
    use tracing_subscriber::{prelude::*, EnvFilter};

    let Some(directives) = std::env::var("SPEL_LOG")
        .ok()
        .or_else(|| std::env::var("RUST_LOG").ok())
    else {
        return;
    };
    tracing_subscriber::registry()
        .with(EnvFilter::new(directives))
        .with(tracing_tree::HierarchicalLayer::new(2).with_targets(true))
        .init();
}

fn main() {
    init_tracing();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        print_usage();
        return;
    }

    let command = &args[1];

    match command.as_str() {
        "eval" => {
            if args.len() < 3 {
                eprintln!("Usage: spel eval <expression> [options]");
                eprintln!();
                eprintln!("Options:");
                eprintln!("  --root <json>        Root object");
                eprintln!("  --var <name>=<json>  Define a variable (repeatable)");
                eprintln!("  --mode <mode>        Compiler mode: off, immediate, mixed");
                eprintln!("  --repeat <n>         Evaluate n times");
                eprintln!("  --template           Parse as a #{{...}} template");
                std::process::exit(1);
            }
            match parse_eval_args(&args[2..]) {
                Ok((source, options)) => eval_expression(&source, &options),
                Err(message) => {
                    eprintln!("error: {message}");
                    std::process::exit(1);
                }
            }
        }
        "ast" => {
            if args.len() < 3 {
                eprintln!("Usage: spel ast <expression>");
                std::process::exit(1);
            }
            let max_length = match SpelParserConfiguration::from_env() {
                Ok(config) => config.max_expression_length,
                Err(err) => {
                    eprintln!("error: {err}");
                    std::process::exit(1);
                }
            };
            print_ast(&args[2], max_length);
        }
        "tokens" => {
            if args.len() < 3 {
                eprintln!("Usage: spel tokens <expression>");
                std::process::exit(1);
            }
            print_tokens(&args[2]);
        }
        "help" | "--help" | "-h" => {
            print_usage();
        }
        "version" | "--version" | "-V" => {
            println!("SpEL {}", env!("CARGO_PKG_VERSION"));
        }
        _ => {
            eprintln!("Unknown command: {command}");
            eprintln!();
            print_usage();
            std::process::exit(1);
        }
    }
}

fn print_usage() {
    println!("SpEL expression engine");
    println!();
    println!("Usage: spel <command> [options]");
    println!();
    println!("Commands:");
    println!("  eval <expression>    Evaluate an expression and print the result");
    println!("  ast <expression>     Parse and display the syntax tree");
    println!("  tokens <expression>  Tokenize and display tokens");
    println!("  help                 Show this help message");
    println!("  version              Show version information");
    println!();
    println!("Eval options:");
    println!("  --root <json>        Root object");
    println!("  --var <name>=<json>  Define a variable (repeatable)");
    println!("  --mode <mode>        Compiler mode: off, immediate, mixed");
    println!("  --repeat <n>         Evaluate n times");
    println!("  --template           Parse as a #{{...}} template");
    println!();
    println!("Environment:");
    println!("  SPEL_COMPILER_MODE          Default compiler mode");
    println!("  SPEL_MAX_EXPRESSION_LENGTH  Longest accepted expression");
    println!("  SPEL_LOG                    Tracing filter (falls back to RUST_LOG)");
    println!();
    println!("Examples:");
    println!("  spel eval \"'Hello' + ' ' + 'World'\"");
    println!("  spel eval \"name.toUpperCase()\" --root '{{\"name\": \"ada\"}}'");
    println!("  spel eval \"#x * 2\" --var x=21 --mode immediate --repeat 5");
    println!("  spel eval \"Hi #{{#who}}!\" --template --var 'who=\"there\"'");
    println!("  spel ast \"a?.b ?: 'none'\"");
}
