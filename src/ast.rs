use crate::token::Token;
use std::fmt;
use std::fmt::Formatter;

/// A runtime value. The language is dynamically typed over exactly these
/// four shapes.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Nil,
    Boolean(bool),
    Number(f64),
    String(String),
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil => write!(f, "nil"),
            Value::Boolean(x) => write!(f, "{}", x),
            Value::Number(x) => write!(f, "{}", x),
            Value::String(x) => write!(f, "{}", x),
        }
    }
}

#[derive(Debug, Clone)]
pub enum Expr {
    Binary {
        left: Box<Expr>,
        operator: Token,
        right: Box<Expr>,
    },
    Grouping(Box<Expr>),
    Literal(Value),
    Unary {
        operator: Token,
        right: Box<Expr>,
    },
    Variable(Token),
    Assign {
        name: Token,
        value: Box<Expr>,
    },
}

#[derive(Debug, Clone)]
pub enum Stmt {
    Expression(Expr),
    Print(Expr),
    Var {
        name: Token,
        initializer: Option<Expr>,
    },
    Block(Vec<Stmt>),
}

/// Renders an expression as a parenthesized prefix form, for debugging and
/// tests. Grouping is kept distinct from its child so the printed tree shows
/// the source's explicit parentheses.
pub struct AstPrinter;

impl AstPrinter {
    pub fn print(&self, expr: &Expr) -> String {
        match expr {
            Expr::Binary {
                left,
                operator,
                right,
            } => self.parenthesize(&operator.lexeme, &[left, right]),
            Expr::Grouping(x) => self.parenthesize("group", &[x]),
            Expr::Literal(value) => value.to_string(),
            Expr::Unary { operator, right } => self.parenthesize(&operator.lexeme, &[right]),
            Expr::Variable(name) => name.lexeme.clone(),
            Expr::Assign { name, value } => {
                format!("(assign {} {})", name.lexeme, self.print(value))
            }
        }
    }
    fn parenthesize(&self, name: &str, args: &[&Expr]) -> String {
        let mut x = String::from("(");
        x.push_str(name);
        for arg in args {
            x.push(' ');
            x.push_str(&self.print(arg));
        }
        x.push(')');
        x
    }
}
