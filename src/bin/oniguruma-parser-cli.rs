//! oniguruma-parser CLI - command-line front end for the parser/
//! optimizer library.
//!
//! # Usage
//!
//! ```bash
//! oniguruma-parser-cli parse <filepath>
//! oniguruma-parser-cli parse --stdin
//! oniguruma-parser-cli optimize --flags i <filepath>
//! ```

use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use oniguruma_parser::core::optimizer::{optimize, OptimizerOptions};
use oniguruma_parser::core::parser::{parse, ParserOptions};
use oniguruma_parser::generator::generate;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse source into an AST and print it as JSON.
    Parse {
        /// Input file path (omit for stdin)
        file: Option<PathBuf>,

        /// Read from stdin instead of a file
        #[arg(long)]
        stdin: bool,

        /// Initial flag letters (e.g. "im")
        #[arg(long, default_value = "")]
        flags: String,
    },

    /// Run the optimizer and print the rewritten pattern.
    Optimize {
        /// Input file path (omit for stdin)
        file: Option<PathBuf>,

        /// Read from stdin instead of a file
        #[arg(long)]
        stdin: bool,

        /// Initial flag letters (e.g. "im")
        #[arg(long, default_value = "")]
        flags: String,
    },
}

fn main() {
    let cli = Cli::parse();

    let result = match &cli.command {
        Commands::Parse { file, stdin, flags } => read_input(file, *stdin).map(|source| run_parse(&source, flags)),
        Commands::Optimize { file, stdin, flags } => {
            read_input(file, *stdin).map(|source| run_optimize(&source, flags))
        }
    };

    match result {
        Ok(Ok(output)) => println!("{output}"),
        Ok(Err(message)) | Err(message) => {
            eprintln!("{message}");
            std::process::exit(1);
        }
    }
}

fn run_parse(source: &str, flags: &str) -> Result<String, String> {
    let options = ParserOptions { flags: flags.to_string(), ..Default::default() };
    let ast = parse(source, options).map_err(|e| e.to_string())?;
    serde_json::to_string_pretty(&ast).map_err(|e| e.to_string())
}

fn run_optimize(source: &str, flags: &str) -> Result<String, String> {
    let options = OptimizerOptions { flags: flags.to_string(), ..Default::default() };
    let out = optimize(source, options).map_err(|e| e.to_string())?;
    let generated = generate(&out.ast).map_err(|e| e.to_string())?;
    Ok(format!("{}\nflags: {}", out.pattern, generated.flags))
}

fn read_input(file: &Option<PathBuf>, stdin: bool) -> Result<String, String> {
    if stdin || file.is_none() {
        read_stdin().map_err(|e| format!("Error reading stdin: {e}"))
    } else {
        read_file(file.as_ref().unwrap()).map_err(|e| format!("Error reading input: {e}"))
    }
}

fn read_stdin() -> io::Result<String> {
    let mut buffer = String::new();
    io::stdin().read_to_string(&mut buffer)?;
    Ok(buffer)
}

fn read_file(path: &PathBuf) -> io::Result<String> {
    fs::read_to_string(path)
}
