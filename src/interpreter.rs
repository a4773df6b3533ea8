use crate::ast::{Expr, Stmt, Value};
use crate::diagnostics::{Diagnostics, RuntimeError};
use crate::environment::Environment;
use crate::token::{Token, TokenKind};

/// Tree-walking evaluator. The environment persists across `interpret`
/// calls, so a REPL host accumulates variables from one line to the next.
pub struct Interpreter {
    environment: Environment,
}

impl Interpreter {
    pub fn new() -> Interpreter {
        Interpreter {
            environment: Environment::new(),
        }
    }

    /// Executes statements in order, yielding one result value per
    /// statement (expression statements yield their value, everything else
    /// yields nil). A runtime error is reported through `diagnostics` and
    /// abandons the rest of this call; the interpreter and its environment
    /// remain valid for subsequent calls.
    pub fn interpret(&mut self, statements: &[Stmt], diagnostics: &mut Diagnostics) -> Vec<Value> {
        let mut results = Vec::new();
        for stmt in statements {
            match self.execute(stmt) {
                Ok(value) => results.push(value),
                Err(error) => {
                    diagnostics.runtime_error(&error);
                    break;
                }
            }
        }
        results
    }

    fn execute(&mut self, stmt: &Stmt) -> Result<Value, RuntimeError> {
        match stmt {
            Stmt::Expression(expr) => self.evaluate(expr),
            Stmt::Print(expr) => {
                let value = self.evaluate(expr)?;
                println!("{}", value);
                Ok(Value::Nil)
            }
            Stmt::Var { name, initializer } => {
                let value = match initializer {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Nil,
                };
                self.environment.define(&name.lexeme, value);
                Ok(Value::Nil)
            }
            Stmt::Block(statements) => {
                self.environment.push_scope();
                let result = self.execute_all(statements);
                // The scope comes off on the error path too, so the
                // enclosing scope is never left with a stale child.
                self.environment.pop_scope();
                result?;
                Ok(Value::Nil)
            }
        }
    }

    fn execute_all(&mut self, statements: &[Stmt]) -> Result<(), RuntimeError> {
        for stmt in statements {
            self.execute(stmt)?;
        }
        Ok(())
    }

    fn evaluate(&mut self, expr: &Expr) -> Result<Value, RuntimeError> {
        match expr {
            Expr::Literal(value) => Ok(value.clone()),
            Expr::Grouping(x) => self.evaluate(x),
            Expr::Unary { operator, right } => {
                let right = self.evaluate(right)?;
                match operator.kind {
                    TokenKind::Minus => match right {
                        Value::Number(r) => Ok(Value::Number(-r)),
                        _ => Err(RuntimeError::new(operator, "Operand must be a number.")),
                    },
                    TokenKind::Bang => Ok(Value::Boolean(!is_truthy(&right))),
                    _ => Err(RuntimeError::new(operator, "Unknown unary operator.")),
                }
            }
            Expr::Binary {
                left,
                operator,
                right,
            } => {
                let left = self.evaluate(left)?;
                let right = self.evaluate(right)?;
                binary(&left, operator, &right)
            }
            Expr::Variable(name) => self.environment.get(name),
            Expr::Assign { name, value } => {
                let value = self.evaluate(value)?;
                self.environment.assign(name, value.clone())?;
                Ok(value)
            }
        }
    }
}

impl Default for Interpreter {
    fn default() -> Interpreter {
        Interpreter::new()
    }
}

fn binary(left: &Value, operator: &Token, right: &Value) -> Result<Value, RuntimeError> {
    match operator.kind {
        TokenKind::EqualEqual => Ok(Value::Boolean(is_equal(left, right))),
        TokenKind::BangEqual => Ok(Value::Boolean(!is_equal(left, right))),
        TokenKind::Plus => match (left, right) {
            (Value::Number(l), Value::Number(r)) => Ok(Value::Number(l + r)),
            (Value::String(l), Value::String(r)) => {
                let mut joined = l.clone();
                joined.push_str(r);
                Ok(Value::String(joined))
            }
            _ => Err(RuntimeError::new(
                operator,
                "Operands must be two numbers or two strings.",
            )),
        },
        TokenKind::Minus => {
            let (l, r) = number_operands(operator, left, right)?;
            Ok(Value::Number(l - r))
        }
        TokenKind::Slash => {
            let (l, r) = number_operands(operator, left, right)?;
            Ok(Value::Number(l / r))
        }
        TokenKind::Star => {
            let (l, r) = number_operands(operator, left, right)?;
            Ok(Value::Number(l * r))
        }
        TokenKind::Greater => {
            let (l, r) = number_operands(operator, left, right)?;
            Ok(Value::Boolean(l > r))
        }
        TokenKind::GreaterEqual => {
            let (l, r) = number_operands(operator, left, right)?;
            Ok(Value::Boolean(l >= r))
        }
        TokenKind::Less => {
            let (l, r) = number_operands(operator, left, right)?;
            Ok(Value::Boolean(l < r))
        }
        TokenKind::LessEqual => {
            let (l, r) = number_operands(operator, left, right)?;
            Ok(Value::Boolean(l <= r))
        }
        _ => Err(RuntimeError::new(operator, "Unknown binary operator.")),
    }
}

fn number_operands(
    operator: &Token,
    left: &Value,
    right: &Value,
) -> Result<(f64, f64), RuntimeError> {
    match (left, right) {
        (Value::Number(l), Value::Number(r)) => Ok((*l, *r)),
        _ => Err(RuntimeError::new(operator, "Operands must be numbers.")),
    }
}

// Only nil and false are falsey.
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Nil => false,
        Value::Boolean(x) => *x,
        _ => true,
    }
}

// Equality with no implicit coercion; nil only equals nil.
fn is_equal(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Nil, Value::Nil) => true,
        (Value::Boolean(l), Value::Boolean(r)) => l == r,
        (Value::Number(l), Value::Number(r)) => l == r,
        (Value::String(l), Value::String(r)) => l == r,
        _ => false,
    }
}

#[cfg(test)]
mod interpreter_tests {
    use crate::ast::Value;
    use crate::diagnostics::Diagnostics;
    use crate::interpreter::Interpreter;
    use crate::parser;
    use crate::scanner;

    fn eval(source: &str) -> Vec<Value> {
        let mut interpreter = Interpreter::new();
        eval_with(&mut interpreter, source)
    }

    fn eval_with(interpreter: &mut Interpreter, source: &str) -> Vec<Value> {
        let mut diagnostics = Diagnostics::new();
        let tokens = scanner::scan_tokens(source, &mut diagnostics);
        let statements: Vec<_> = parser::parse(&tokens, &mut diagnostics)
            .into_iter()
            .flatten()
            .collect();
        assert!(!diagnostics.had_error(), "{:?}", diagnostics.messages());
        let results = interpreter.interpret(&statements, &mut diagnostics);
        assert!(
            !diagnostics.had_runtime_error(),
            "{:?}",
            diagnostics.messages()
        );
        results
    }

    fn eval_err(source: &str) -> String {
        let mut diagnostics = Diagnostics::new();
        let tokens = scanner::scan_tokens(source, &mut diagnostics);
        let statements: Vec<_> = parser::parse(&tokens, &mut diagnostics)
            .into_iter()
            .flatten()
            .collect();
        assert!(!diagnostics.had_error(), "{:?}", diagnostics.messages());
        let mut interpreter = Interpreter::new();
        interpreter.interpret(&statements, &mut diagnostics);
        assert!(diagnostics.had_runtime_error());
        diagnostics.messages().last().cloned().unwrap_or_default()
    }

    #[test]
    fn literals_evaluate_to_themselves() {
        assert_eq!(eval("123;"), vec![Value::Number(123.0)]);
        assert_eq!(eval("\"abc\";"), vec![Value::String("abc".to_string())]);
        assert_eq!(eval("true;"), vec![Value::Boolean(true)]);
        assert_eq!(eval("false;"), vec![Value::Boolean(false)]);
        assert_eq!(eval("nil;"), vec![Value::Nil]);
    }

    #[test]
    fn arithmetic_precedence() {
        assert_eq!(eval("1 + 2 * 3;"), vec![Value::Number(7.0)]);
        assert_eq!(eval("(1 + 2) * 3;"), vec![Value::Number(9.0)]);
        assert_eq!(eval("10 - 4 / 2;"), vec![Value::Number(8.0)]);
        assert_eq!(eval("-2 * 3;"), vec![Value::Number(-6.0)]);
    }

    #[test]
    fn comparison_and_equality() {
        assert_eq!(eval("1 < 2;"), vec![Value::Boolean(true)]);
        assert_eq!(eval("2 <= 2;"), vec![Value::Boolean(true)]);
        assert_eq!(eval("1 > 2;"), vec![Value::Boolean(false)]);
        assert_eq!(eval("1 == 1;"), vec![Value::Boolean(true)]);
        assert_eq!(eval("1 != 2;"), vec![Value::Boolean(true)]);
        assert_eq!(eval("\"a\" == \"a\";"), vec![Value::Boolean(true)]);
    }

    #[test]
    fn equality_does_not_coerce() {
        assert_eq!(eval("1 == \"1\";"), vec![Value::Boolean(false)]);
        assert_eq!(eval("0 == false;"), vec![Value::Boolean(false)]);
        assert_eq!(eval("nil == nil;"), vec![Value::Boolean(true)]);
        assert_eq!(eval("nil == false;"), vec![Value::Boolean(false)]);
    }

    #[test]
    fn truthiness() {
        assert_eq!(eval("!nil;"), vec![Value::Boolean(true)]);
        assert_eq!(eval("!false;"), vec![Value::Boolean(true)]);
        // Zero and the empty string are truthy.
        assert_eq!(eval("!0;"), vec![Value::Boolean(false)]);
        assert_eq!(eval("!\"\";"), vec![Value::Boolean(false)]);
    }

    #[test]
    fn string_concatenation() {
        assert_eq!(eval("\"a\" + \"b\";"), vec![Value::String("ab".to_string())]);
    }

    #[test]
    fn mixed_plus_is_a_type_error() {
        assert_eq!(
            eval_err("\"a\" + 1;"),
            "[line 1] Error: Operands must be two numbers or two strings."
        );
    }

    #[test]
    fn comparison_of_non_numbers_is_a_type_error() {
        assert_eq!(
            eval_err("\"a\" < \"b\";"),
            "[line 1] Error: Operands must be numbers."
        );
    }

    #[test]
    fn negating_a_string_is_a_type_error() {
        assert_eq!(eval_err("-\"a\";"), "[line 1] Error: Operand must be a number.");
    }

    #[test]
    fn variables_declare_read_and_assign() {
        assert_eq!(
            eval("var a = 1; a = a + 1; a;"),
            vec![Value::Nil, Value::Number(2.0), Value::Number(2.0)]
        );
    }

    #[test]
    fn var_without_initializer_is_nil() {
        assert_eq!(eval("var a; a;"), vec![Value::Nil, Value::Nil]);
    }

    #[test]
    fn assignment_is_an_expression_yielding_the_value() {
        assert_eq!(
            eval("var a; var b; a = b = 3;"),
            vec![Value::Nil, Value::Nil, Value::Number(3.0)]
        );
    }

    #[test]
    fn assignment_to_undeclared_name_fails() {
        assert_eq!(
            eval_err("a = 1;"),
            "[line 1] Error: Undefined variable 'a'."
        );
    }

    #[test]
    fn reading_undeclared_name_fails() {
        assert_eq!(eval_err("ghost;"), "[line 1] Error: Undefined variable 'ghost'.");
    }

    #[test]
    fn block_shadowing_restores_outer_binding() {
        assert_eq!(
            eval("var a = 5; { var a = 3; } a;"),
            vec![Value::Nil, Value::Nil, Value::Number(5.0)]
        );
    }

    #[test]
    fn assignment_inside_block_mutates_outer_binding() {
        assert_eq!(
            eval("var a = 1; { a = 2; } a;"),
            vec![Value::Nil, Value::Nil, Value::Number(2.0)]
        );
    }

    #[test]
    fn runtime_error_aborts_the_rest_of_the_call() {
        let mut diagnostics = Diagnostics::new();
        let tokens = scanner::scan_tokens("1; -\"a\"; 2;", &mut diagnostics);
        let statements: Vec<_> = parser::parse(&tokens, &mut diagnostics)
            .into_iter()
            .flatten()
            .collect();
        let mut interpreter = Interpreter::new();
        let results = interpreter.interpret(&statements, &mut diagnostics);
        assert!(diagnostics.had_runtime_error());
        assert_eq!(results, vec![Value::Number(1.0)]);
    }

    #[test]
    fn failing_block_still_restores_the_outer_scope() {
        let mut interpreter = Interpreter::new();
        let mut diagnostics = Diagnostics::new();
        let tokens = scanner::scan_tokens(
            "var a = 1; { var a = 2; -\"oops\"; }",
            &mut diagnostics,
        );
        let statements: Vec<_> = parser::parse(&tokens, &mut diagnostics)
            .into_iter()
            .flatten()
            .collect();
        interpreter.interpret(&statements, &mut diagnostics);
        assert!(diagnostics.had_runtime_error());
        // The outer `a` is visible again, not the shadowing one.
        assert_eq!(eval_with(&mut interpreter, "a;"), vec![Value::Number(1.0)]);
    }

    #[test]
    fn environment_persists_across_interpret_calls() {
        let mut interpreter = Interpreter::new();
        eval_with(&mut interpreter, "var a = 1;");
        assert_eq!(eval_with(&mut interpreter, "a + 1;"), vec![Value::Number(2.0)]);
    }

    #[test]
    fn interpreter_stays_usable_after_a_runtime_error() {
        let mut interpreter = Interpreter::new();
        let mut diagnostics = Diagnostics::new();
        let tokens = scanner::scan_tokens("missing;", &mut diagnostics);
        let statements: Vec<_> = parser::parse(&tokens, &mut diagnostics)
            .into_iter()
            .flatten()
            .collect();
        interpreter.interpret(&statements, &mut diagnostics);
        assert!(diagnostics.had_runtime_error());
        assert_eq!(eval_with(&mut interpreter, "1 + 1;"), vec![Value::Number(2.0)]);
    }
}
