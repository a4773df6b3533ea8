pub mod ast;
pub mod diagnostics;
pub mod environment;
pub mod interpreter;
pub mod parser;
pub mod scanner;
pub mod token;

pub use ast::{AstPrinter, Expr, Stmt, Value};
pub use diagnostics::{Diagnostics, RuntimeError};
pub use interpreter::Interpreter;
pub use token::{Token, TokenKind};
