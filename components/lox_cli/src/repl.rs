//! REPL (Read-Eval-Print Loop) implementation

use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

use crate::error::{CliError, CliResult};
use crate::runtime::Runtime;

/// Run the interactive REPL
///
/// Each complete input runs against the same VM, so globals defined on one
/// line are visible on the next. Errors are reported and the loop goes on.
pub fn run_repl(runtime: &mut Runtime) -> CliResult<()> {
    let mut editor = DefaultEditor::new()
        .map_err(|e| CliError::Repl(format!("Failed to initialize editor: {}", e)))?;

    println!("Lox {}", env!("CARGO_PKG_VERSION"));
    println!("Type .help for commands, Ctrl-D to quit.");

    let mut line_buffer = String::new();

    loop {
        let prompt = if line_buffer.is_empty() { "> " } else { "... " };

        match editor.readline(prompt) {
            Ok(line) => {
                let trimmed = line.trim();

                if line_buffer.is_empty() && trimmed.starts_with('.') {
                    if !handle_repl_command(trimmed, runtime) {
                        break;
                    }
                    continue;
                }

                if !line_buffer.is_empty() {
                    line_buffer.push('\n');
                }
                line_buffer.push_str(&line);

                if !is_input_complete(&line_buffer) {
                    continue;
                }

                let _ = editor.add_history_entry(line_buffer.as_str());
                let result = runtime.interpret_line(&line_buffer);
                log::debug!("repl input finished: {:?}", result);
                line_buffer.clear();
            }
            Err(ReadlineError::Interrupted) => {
                // Ctrl-C drops a partial input
                if !line_buffer.is_empty() {
                    println!("^C");
                    line_buffer.clear();
                }
            }
            Err(ReadlineError::Eof) => {
                println!();
                break;
            }
            Err(err) => {
                return Err(CliError::Repl(format!("Readline error: {}", err)));
            }
        }
    }

    Ok(())
}

/// Handle a dot command. Returns `false` when the REPL should exit.
fn handle_repl_command(command: &str, runtime: &mut Runtime) -> bool {
    match command {
        ".help" => {
            println!("REPL Commands:");
            println!("  .help     - Show this help message");
            println!("  .gc       - Run a collection and show heap statistics");
            println!("  .exit     - Exit the REPL");
        }
        ".gc" => {
            let freed = runtime.vm_mut().collect_garbage();
            let heap = runtime.vm().heap();
            let stats = heap.stats();
            println!(
                "freed {} bytes; {} objects live, {} bytes allocated, next collection at {}",
                freed,
                heap.object_count(),
                heap.bytes_allocated(),
                heap.next_gc()
            );
            println!(
                "{} collections, {} objects allocated, {} freed",
                stats.collections, stats.objects_allocated, stats.objects_freed
            );
        }
        ".exit" => return false,
        _ => {
            println!("Unknown command: {}", command);
            println!("Type .help for available commands");
        }
    }
    true
}

/// Whether `input` can be run as is
///
/// Input with unclosed braces or parentheses, or an unterminated string,
/// continues on the next line.
fn is_input_complete(input: &str) -> bool {
    let mut depth: i32 = 0;
    let mut in_string = false;
    let mut in_comment = false;
    let mut chars = input.chars().peekable();

    while let Some(c) = chars.next() {
        if in_comment {
            if c == '\n' {
                in_comment = false;
            }
            continue;
        }
        if in_string {
            if c == '"' {
                in_string = false;
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '/' if chars.peek() == Some(&'/') => in_comment = true,
            '{' | '(' => depth += 1,
            '}' | ')' => depth -= 1,
            _ => {}
        }
    }

    depth <= 0 && !in_string
}
