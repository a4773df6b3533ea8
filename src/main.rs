use clap::{Arg, Command};
use std::fs;
use std::io::{self, BufRead, Write};
use std::process;

use treelox::ast::Value;
use treelox::diagnostics::Diagnostics;
use treelox::interpreter::Interpreter;
use treelox::{parser, scanner};

fn main() {
    let matches = Command::new("treelox")
        .about("A tree-walking interpreter for a small dynamically typed language")
        .arg(
            Arg::new("script")
                .help("Script file to run; omit to start a REPL")
                .value_name("FILE")
                .index(1),
        )
        .get_matches();

    match matches.get_one::<String>("script") {
        Some(path) => run_file(path),
        None => run_prompt(),
    }
}

fn run_file(path: &str) {
    let source = match fs::read_to_string(path) {
        Ok(source) => source,
        Err(e) => {
            eprintln!("Error reading '{}': {}", path, e);
            process::exit(1);
        }
    };
    let mut interpreter = Interpreter::new();
    let mut diagnostics = Diagnostics::new();
    run(&source, &mut interpreter, &mut diagnostics);
    for message in diagnostics.messages() {
        eprintln!("{}", message);
    }
    if diagnostics.had_error() {
        process::exit(65);
    }
    if diagnostics.had_runtime_error() {
        process::exit(70);
    }
}

fn run_prompt() {
    let mut interpreter = Interpreter::new();
    let stdin = io::stdin();
    loop {
        print!("> ");
        io::stdout().flush().expect("Failed to flush stdout");
        let mut line = String::new();
        match stdin.lock().read_line(&mut line) {
            Ok(0) | Err(_) => break,
            Ok(_) => (),
        }
        // A fresh Diagnostics per line: one bad line must not poison the
        // next, but the interpreter (and its variables) carries over.
        let mut diagnostics = Diagnostics::new();
        let results = run(&line, &mut interpreter, &mut diagnostics);
        for message in diagnostics.messages() {
            eprintln!("{}", message);
        }
        for value in results {
            if value != Value::Nil {
                println!("{}", value);
            }
        }
    }
}

fn run(source: &str, interpreter: &mut Interpreter, diagnostics: &mut Diagnostics) -> Vec<Value> {
    let tokens = scanner::scan_tokens(source, diagnostics);
    let statements = parser::parse(&tokens, diagnostics);
    if diagnostics.had_error() {
        return Vec::new();
    }
    let statements: Vec<_> = statements.into_iter().flatten().collect();
    interpreter.interpret(&statements, diagnostics)
}
