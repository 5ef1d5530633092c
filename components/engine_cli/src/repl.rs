//! REPL (Read-Eval-Print Loop) implementation
//!
//! Each complete JSON AST entered becomes one evaluation in the shared
//! environment; its events are printed as they are collected.

use crate::error::{CliError, CliResult};
use crate::runtime::Runtime;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

/// Run the interactive REPL
///
/// # Arguments
/// * `runtime` - The Runtime instance to use for execution
///
/// # Returns
/// `Ok(())` when REPL exits normally
pub fn run_repl(runtime: &mut Runtime) -> CliResult<()> {
    let mut editor = DefaultEditor::new()
        .map_err(|e| CliError::Repl(format!("failed to initialize editor: {}", e)))?;

    println!("lazyeval {}", env!("CARGO_PKG_VERSION"));
    println!("Enter a JSON AST, or '.help' for commands.");
    println!();

    let mut line_buffer = String::new();

    loop {
        let prompt = if line_buffer.is_empty() { "> " } else { "... " };

        match editor.readline(prompt) {
            Ok(line) => {
                let trimmed = line.trim();

                if line_buffer.is_empty() {
                    if trimmed.is_empty() {
                        continue;
                    }
                    if trimmed == "exit" || trimmed == ".exit" || trimmed == "quit" {
                        println!("Goodbye!");
                        break;
                    }
                    if trimmed.starts_with('.') {
                        handle_repl_command(trimmed, runtime);
                        continue;
                    }
                } else {
                    line_buffer.push('\n');
                }
                line_buffer.push_str(&line);

                if !is_input_complete(&line_buffer) {
                    continue;
                }
                let _ = editor.add_history_entry(&line_buffer);

                match runtime.execute_string(&line_buffer) {
                    Ok(events) => {
                        for event in &events {
                            match runtime.render(event) {
                                Ok(text) => println!("{}", text),
                                Err(e) => eprintln!("Error: {}", e),
                            }
                        }
                        if events.is_empty() {
                            println!("(waiting on host work)");
                        }
                    }
                    Err(e) => eprintln!("Error: {}", e),
                }
                line_buffer.clear();
            }
            Err(ReadlineError::Interrupted) => {
                if line_buffer.is_empty() {
                    println!("Press Ctrl-D or type 'exit' to quit");
                } else {
                    println!("^C");
                    line_buffer.clear();
                }
            }
            Err(ReadlineError::Eof) => {
                println!("\nGoodbye!");
                break;
            }
            Err(err) => {
                return Err(CliError::Repl(format!("readline error: {}", err)));
            }
        }
    }

    Ok(())
}

/// Handle special REPL commands
fn handle_repl_command(command: &str, runtime: &mut Runtime) {
    match command {
        ".help" => {
            println!("REPL Commands:");
            println!("  .help     - Show this help message");
            println!("  .clear    - Clear the screen");
            println!("  .pretty   - Toggle pretty-printed events");
            println!("  .runs     - Show how many programs ran");
            println!("  .exit     - Exit the REPL");
        }
        ".clear" => {
            print!("\x1B[2J\x1B[1;1H");
        }
        ".pretty" => {
            let pretty = !runtime.is_pretty();
            runtime.set_pretty(pretty);
            println!("pretty printing {}", if pretty { "on" } else { "off" });
        }
        ".runs" => {
            println!("{} program(s) evaluated", runtime.executed());
        }
        _ => {
            println!("Unknown command: {}", command);
            println!("Type .help for available commands");
        }
    }
}

/// Check if the input appears to be a complete JSON document
///
/// Counts unbalanced braces and brackets outside string literals.
fn is_input_complete(input: &str) -> bool {
    let mut depth: i64 = 0;
    let mut in_string = false;
    let mut escape_next = false;

    for c in input.chars() {
        if escape_next {
            escape_next = false;
            continue;
        }
        if in_string {
            match c {
                '\\' => escape_next = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '{' | '[' => depth += 1,
            '}' | ']' => depth -= 1,
            _ => {}
        }
    }

    depth <= 0 && !in_string
}
