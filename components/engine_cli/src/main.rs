//! lazyeval CLI
//!
//! Entry point for the engine. Parses CLI arguments and delegates to the
//! Runtime for execution.

use clap::Parser as ClapParser;
use engine_cli::runtime::outcome;
use engine_cli::{init_tracing, Cli, CliError, CliResult, Runtime};
use notebook::EvaluationEvent;

fn print_events(runtime: &Runtime, result: CliResult<Vec<EvaluationEvent>>) -> CliResult<()> {
    let events = result?;
    for event in &events {
        println!("{}", runtime.render(event)?);
    }
    outcome(&events)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();
    let cli = Cli::parse();

    let mut runtime = Runtime::new().with_pretty(cli.pretty);

    let result = if let Some(file) = cli.file {
        let events = runtime.execute_file(&file);
        print_events(&runtime, events)
    } else if let Some(source) = cli.eval {
        let events = runtime.execute_string(&source);
        print_events(&runtime, events)
    } else if cli.repl {
        runtime.repl()
    } else {
        println!("lazyeval {}", env!("CARGO_PKG_VERSION"));
        println!();
        println!("Usage:");
        println!("  lazyeval --file <FILE>     Evaluate a JSON AST file");
        println!("  lazyeval --eval <JSON>     Evaluate an inline JSON AST");
        println!("  lazyeval --repl            Start interactive REPL");
        println!();
        println!("Run 'lazyeval --help' for more options.");
        Ok(())
    };

    match result {
        Ok(()) => Ok(()),
        Err(CliError::Failed(_)) => std::process::exit(1),
        Err(CliError::Io(e)) => {
            eprintln!("Error: could not read program: {}", e);
            std::process::exit(1);
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}
