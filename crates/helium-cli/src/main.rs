//! Helium CLI
//!
//! Runs a Helium script: dumps its tokens, prints the parsed tree, then
//! executes it.

use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, ValueEnum};
use colored::Colorize;
use helium_core::diagnostics::{DiagnosticSeverity, Diagnostics, DiagnosticsOutput};
use helium_core::{AstPrinter, Config, Interpreter, Lexer};

#[derive(Parser)]
#[command(name = "helium")]
#[command(author, version, about = "Run a Helium script, showing its tokens and syntax tree", long_about = None)]
struct Cli {
    /// Path to the .he file
    file: PathBuf,

    /// Output format for the syntax tree
    #[arg(short, long, value_enum, default_value_t = Format::Human)]
    format: Format,

    /// Do not dump the token stream
    #[arg(long)]
    no_tokens: bool,

    /// Do not print the syntax tree
    #[arg(long)]
    no_ast: bool,

    /// Parse only, do not execute the program
    #[arg(long)]
    no_run: bool,

    /// Configuration file (defaults to helium.toml next to the source file)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Verbose mode - report each stage on stderr
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Format {
    Human,
    Json,
}

/// Which stages to report, after merging the config file with flags.
struct Stages {
    tokens: bool,
    ast: bool,
    evaluate: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let source = match fs::read_to_string(&cli.file) {
        Ok(s) => s,
        Err(e) => {
            eprintln!(
                "{} Failed to read file '{}': {}",
                "error:".red().bold(),
                cli.file.display(),
                e
            );
            return ExitCode::from(2);
        }
    };

    let config = match &cli.config {
        Some(path) => Config::load(path),
        None => Config::for_source(&cli.file),
    };
    let config = match config {
        Ok(c) => c,
        Err(e) => {
            eprintln!("{} {}", "error:".red().bold(), e);
            return ExitCode::from(2);
        }
    };

    let stages = Stages {
        tokens: config.output.tokens && !cli.no_tokens,
        ast: config.output.ast && !cli.no_ast,
        evaluate: config.output.evaluate && !cli.no_run,
    };

    match run(&cli, &source, &stages) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{} Failed to write output: {}", "error:".red().bold(), e);
            ExitCode::from(2)
        }
    }
}

fn run(cli: &Cli, source: &str, stages: &Stages) -> io::Result<ExitCode> {
    let file = cli.file.display().to_string();
    let stdout = io::stdout();
    let mut out = stdout.lock();

    if stages.tokens {
        let tokens = Lexer::new(source).tokenize();
        if cli.verbose {
            eprintln!("[verbose] {} tokens", tokens.len());
        }
        AstPrinter::new(&mut out).print_tokens(&tokens)?;
    }

    let (program, diagnostics) = helium_core::Parser::new(source, file.as_str()).parse();
    if cli.verbose {
        match &program {
            Some(p) => eprintln!(
                "[verbose] Parsed {} statements with {} diagnostics",
                p.statements.len(),
                diagnostics.len()
            ),
            None => eprintln!("[verbose] Parsing was abandoned"),
        }
    }

    if stages.ast {
        match cli.format {
            Format::Json => {
                let output = serde_json::json!({
                    "program": program,
                    "diagnostics": DiagnosticsOutput::from_diagnostics(&diagnostics),
                });
                writeln!(out, "{}", serde_json::to_string_pretty(&output)?)?;
            }
            Format::Human => {
                writeln!(out, "\nParser output:")?;
                AstPrinter::new(&mut out).print_program(program.as_ref())?;
            }
        }
    }
    out.flush()?;

    report_diagnostics(&diagnostics, &file);
    if diagnostics.has_errors() {
        if cli.verbose && stages.evaluate {
            eprintln!("[verbose] Skipping evaluation because of parse errors");
        }
        return Ok(ExitCode::from(1));
    }

    let Some(program) = program else {
        return Ok(ExitCode::from(1));
    };

    if stages.evaluate {
        if cli.verbose {
            eprintln!("[verbose] Evaluating `{}`", file);
        }
        let mut interpreter = Interpreter::new(&mut out);
        if let Err(e) = interpreter.run(&program) {
            eprintln!("{:?}", miette::Report::new(e));
            return Ok(ExitCode::from(1));
        }
    }

    Ok(ExitCode::SUCCESS)
}

fn report_diagnostics(diagnostics: &Diagnostics, file: &str) {
    for diag in diagnostics.iter() {
        let severity_str = match diag.severity {
            DiagnosticSeverity::Error => "error".red().bold(),
            DiagnosticSeverity::Warning => "warning".yellow().bold(),
        };

        eprintln!(
            "{}{} {} {}",
            severity_str,
            format!("[{}]", diag.code).dimmed(),
            ":".bold(),
            diag.message
        );
        eprintln!(
            "  {} {}:{}:{}",
            "-->".blue().bold(),
            diag.file,
            diag.span.start.line,
            diag.span.start.column
        );

        if let Some(ref context) = diag.context {
            eprintln!("   {}", "|".blue().bold());
            eprintln!(
                "{:>3} {} {}",
                diag.span.start.line.to_string().blue().bold(),
                "|".blue().bold(),
                context
            );
            eprintln!("   {}", "|".blue().bold());
        }

        if let Some(ref help) = diag.help {
            eprintln!("   {} {}: {}", "=".blue().bold(), "help".bold(), help);
        }
    }

    let error_count = diagnostics.errors().count();
    if error_count > 0 {
        eprintln!(
            "{}: could not parse `{}` due to {} previous error{}",
            "error".red().bold(),
            file,
            error_count,
            if error_count == 1 { "" } else { "s" }
        );
    }
}
