use std::fs;
use std::path::{Path, PathBuf};
use std::process;

use clap::Parser;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use tracing::debug;

use flint::error::InterpretError;
use flint::value::format_value;
use flint::vm::Vm;

/// Bytecode interpreter for the Flint scripting language.
#[derive(Parser, Debug)]
#[command(name = "flint", version, about)]
struct Args {
    /// Script to run; starts the REPL when omitted.
    path: Option<PathBuf>,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(err)
            if err.kind() == clap::error::ErrorKind::DisplayHelp
                || err.kind() == clap::error::ErrorKind::DisplayVersion =>
        {
            let _ = err.print();
            return;
        }
        Err(_) => {
            eprintln!("Usage: flint [path]");
            process::exit(64);
        }
    };

    match args.path {
        Some(path) => run_file(&path),
        None => repl(),
    }
}

fn run_file(path: &Path) {
    let source = fs::read_to_string(path).unwrap_or_else(|err| {
        eprintln!("Could not read file \"{}\": {}", path.display(), err);
        process::exit(74);
    });

    debug!(path = %path.display(), bytes = source.len(), "running script");

    let mut vm = Vm::new();
    match vm.interpret(&source) {
        Ok(()) => {}
        Err(err @ InterpretError::Compile(_)) => {
            eprintln!("{err}");
            process::exit(65);
        }
        Err(err @ InterpretError::Runtime(_)) => {
            eprintln!("{err}");
            process::exit(70);
        }
    }
}

fn repl() {
    let mut editor = DefaultEditor::new().unwrap_or_else(|err| {
        eprintln!("Could not start line editor: {err}");
        process::exit(74);
    });
    let mut vm = Vm::new();

    debug!("starting repl");

    loop {
        match editor.readline("> ") {
            Ok(line) => {
                if line.trim().is_empty() {
                    continue;
                }
                let _ = editor.add_history_entry(&line);
                match vm.interpret(&line) {
                    Ok(()) => {
                        // An expression leaves its value on the stack; echo it.
                        if let Some(value) = vm.stack_top() {
                            println!("{}", format_value(value, vm.heap()));
                        }
                    }
                    Err(err) => eprintln!("{err}"),
                }
            }
            // Ctrl-C abandons the current line, Ctrl-D leaves the REPL.
            Err(ReadlineError::Interrupted) => continue,
            Err(ReadlineError::Eof) => break,
            Err(err) => {
                eprintln!("{err}");
                break;
            }
        }
    }
}
