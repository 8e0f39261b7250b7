use clap::{Arg, ArgAction, Command};
use funlang::{runner, Debugger, Output};
use std::fs;
use std::io;
use std::path::Path;
use std::process;

fn main() {
    init_tracing();

    let matches = Command::new("funlang")
        .about("Interpreter and breakpoint debugger for the Fun language")
        .arg(
            Arg::new("file")
                .help("The program to execute")
                .value_name("FILE")
                .index(1),
        )
        .arg(
            Arg::new("debug")
                .short('d')
                .long("debug")
                .help("Start the debugger, loading FILE if given")
                .action(ArgAction::SetTrue),
        )
        .get_matches();

    let file = matches.get_one::<String>("file");
    match file {
        Some(path) if !matches.get_flag("debug") => run_file(path),
        _ => debug(file.map(String::as_str)),
    }
}

/// Install a stderr subscriber when `RUST_LOG` is set.
fn init_tracing() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    if std::env::var("RUST_LOG").is_ok() {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_writer(io::stderr)
                    .with_target(true)
                    .with_level(true),
            )
            .with(EnvFilter::from_default_env())
            .init();
    }
}

fn run_file(path: &str) {
    let path = Path::new(path);

    if !path.exists() {
        eprintln!("Error: File '{}' not found", path.display());
        process::exit(1);
    }

    match fs::read_to_string(path) {
        Ok(source) => {
            let filename = path.display().to_string();
            if runner::run(&source, Some(&filename)).is_err() {
                process::exit(1);
            }
        }
        Err(e) => {
            eprintln!("Error reading file '{}': {}", path.display(), e);
            process::exit(1);
        }
    }
}

fn debug(preload: Option<&str>) {
    let mut debugger = Debugger::new(Output::stdout());
    if let Some(path) = preload {
        debugger.execute_line(&format!("load {}", path));
    }

    if let Err(e) = debugger.run(io::stdin().lock()) {
        eprintln!("Error reading input: {}", e);
        process::exit(1);
    }
}
