//! Lox Runtime CLI
//!
//! Entry point for the `lox` binary. Parses CLI arguments and delegates to
//! the Runtime for execution.

use std::process::ExitCode;

use clap::Parser as ClapParser;
use lox_cli::{Cli, Runtime, EXIT_USAGE};

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let code = if err.use_stderr() { EXIT_USAGE } else { 0 };
            let _ = err.print();
            return exit_code(code);
        }
    };

    init_logging(cli.log_level.as_deref());

    let mut runtime = Runtime::new(cli.vm_config()).with_print_bytecode(cli.print_bytecode);

    let result = if let Some(source) = &cli.eval {
        runtime.execute_string(source)
    } else if let Some(file) = &cli.file {
        runtime.execute_file(file)
    } else {
        runtime.repl()
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{}", err.report());
            exit_code(err.exit_code())
        }
    }
}

fn init_logging(filter: Option<&str>) {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"));
    if let Some(filter) = filter {
        builder.parse_filters(filter);
    }
    builder.format_timestamp(None).init();
}

fn exit_code(code: i32) -> ExitCode {
    ExitCode::from(u8::try_from(code).unwrap_or(1))
}
