use crate::token::{Token, TokenKind};
use std::error::Error;
use std::fmt;
use std::fmt::Formatter;

/// An evaluation failure: a type mismatch or an undefined variable. Carries
/// the token it originated at so the report has an accurate line number.
#[derive(Debug, Clone)]
pub struct RuntimeError {
    pub token: Token,
    pub message: String,
}

impl RuntimeError {
    pub fn new(token: &Token, message: &str) -> RuntimeError {
        RuntimeError {
            token: token.clone(),
            message: message.to_string(),
        }
    }

    pub fn undefined_variable(name: &Token) -> RuntimeError {
        RuntimeError::new(name, &format!("Undefined variable '{}'.", name.lexeme))
    }
}

impl fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "[line {}] Error: {}", self.token.line, self.message)
    }
}

impl Error for RuntimeError {}

/// Error sink for one pipeline run. Passed `&mut` into scan, parse, and
/// interpret; the caller inspects the flags to decide exit status and
/// prints the collected messages. Replaces the usual global `had_error`
/// flags so repeated REPL invocations stay independent.
#[derive(Debug, Default)]
pub struct Diagnostics {
    messages: Vec<String>,
    had_error: bool,
    had_runtime_error: bool,
}

impl Diagnostics {
    pub fn new() -> Diagnostics {
        Diagnostics::default()
    }

    /// Scan-level or other positionless errors: `[line N] Error: msg`.
    pub fn error(&mut self, line: usize, message: &str) {
        self.report(line, "", message);
    }

    /// Parse errors, anchored at a token: `[line N] Error at 'x': msg`,
    /// or `at end` when the parser ran off the end of the input.
    pub fn error_at(&mut self, token: &Token, message: &str) {
        match token.kind {
            TokenKind::Eof => self.report(token.line, " at end", message),
            _ => {
                let location = format!(" at '{}'", token.lexeme);
                self.report(token.line, &location, message);
            }
        }
    }

    pub fn runtime_error(&mut self, error: &RuntimeError) {
        self.messages.push(error.to_string());
        self.had_runtime_error = true;
    }

    fn report(&mut self, line: usize, location: &str, message: &str) {
        self.messages
            .push(format!("[line {}] Error{}: {}", line, location, message));
        self.had_error = true;
    }

    /// True after any scan or parse error.
    pub fn had_error(&self) -> bool {
        self.had_error
    }

    /// True after any evaluation failure.
    pub fn had_runtime_error(&self) -> bool {
        self.had_runtime_error
    }

    pub fn messages(&self) -> &[String] {
        &self.messages
    }
}
