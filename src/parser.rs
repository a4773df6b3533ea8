use crate::ast::{Expr, Stmt, Value};
use crate::diagnostics::Diagnostics;
use crate::token::{Token, TokenKind};

// Raised for a syntax error and caught at the declaration level, where the
// parser synchronizes to the next statement boundary. The error has already
// been reported through Diagnostics by the time it is constructed.
#[derive(Debug)]
struct ParseError;

/// Parses tokens into statements with a recursive-descent grammar:
///
/// ```text
/// program     → declaration* EOF
/// declaration → "var" IDENT ("=" expression)? ";"  |  statement
/// statement   → "print" expression ";"  |  block  |  expression ";"
/// block       → "{" declaration* "}"
/// expression  → assignment
/// assignment  → IDENT "=" assignment  |  equality
/// equality    → comparison (("!="|"==") comparison)*
/// comparison  → term ((">"|">="|"<"|"<=") term)*
/// term        → factor (("-"|"+") factor)*
/// factor      → unary (("/"|"*") unary)*
/// unary       → ("!"|"-") unary  |  primary
/// primary     → NUMBER | STRING | "true" | "false" | "nil" | IDENT
///             | "(" expression ")"
/// ```
///
/// A statement that fails to parse leaves a `None` in its slot and parsing
/// resumes at the next statement boundary, so one bad statement produces one
/// error instead of a cascade.
pub fn parse(tokens: &[Token], diagnostics: &mut Diagnostics) -> Vec<Option<Stmt>> {
    // The scanner always terminates its output with Eof, but don't rely on
    // callers having gone through it.
    if tokens.is_empty() {
        return Vec::new();
    }
    let mut parser = Parser {
        tokens,
        current: 0,
        diagnostics,
    };
    let mut statements: Vec<Option<Stmt>> = Vec::new();
    while !parser.is_at_end() {
        statements.push(parser.declaration());
    }
    statements
}

struct Parser<'a, 'd> {
    tokens: &'a [Token],
    current: usize,
    diagnostics: &'d mut Diagnostics,
}

impl<'a, 'd> Parser<'a, 'd> {
    fn declaration(&mut self) -> Option<Stmt> {
        let result = match self.peek().kind {
            TokenKind::Var => {
                self.advance();
                self.var_declaration()
            }
            _ => self.statement(),
        };
        match result {
            Ok(stmt) => Some(stmt),
            Err(ParseError) => {
                self.synchronize();
                None
            }
        }
    }
    fn var_declaration(&mut self) -> Result<Stmt, ParseError> {
        let name = match self.peek().kind {
            TokenKind::Identifier(_) => self.advance().clone(),
            _ => return Err(self.error("Expect variable name.")),
        };
        let initializer = match self.peek().kind {
            TokenKind::Equal => {
                self.advance();
                Some(self.expression()?)
            }
            _ => None,
        };
        match self.peek().kind {
            TokenKind::Semicolon => {
                self.advance();
                Ok(Stmt::Var { name, initializer })
            }
            _ => Err(self.error("Expect ';' after variable declaration.")),
        }
    }
    fn statement(&mut self) -> Result<Stmt, ParseError> {
        match self.peek().kind {
            TokenKind::Print => {
                self.advance();
                self.print_statement()
            }
            TokenKind::LeftBrace => {
                self.advance();
                self.block()
            }
            _ => self.expression_statement(),
        }
    }
    fn block(&mut self) -> Result<Stmt, ParseError> {
        let mut statements: Vec<Stmt> = Vec::new();
        while !self.is_at_end() {
            if let TokenKind::RightBrace = self.peek().kind {
                break;
            }
            // A failed statement has already been reported and recovered
            // from inside declaration(); drop it and keep parsing the
            // rest of the block.
            if let Some(stmt) = self.declaration() {
                statements.push(stmt);
            }
        }
        match self.peek().kind {
            TokenKind::RightBrace => {
                self.advance();
                Ok(Stmt::Block(statements))
            }
            _ => Err(self.error("Expect '}' after block.")),
        }
    }
    fn print_statement(&mut self) -> Result<Stmt, ParseError> {
        let expr = self.expression()?;
        match self.peek().kind {
            TokenKind::Semicolon => {
                self.advance();
                Ok(Stmt::Print(expr))
            }
            _ => Err(self.error("Expect ';' after value.")),
        }
    }
    fn expression_statement(&mut self) -> Result<Stmt, ParseError> {
        let expr = self.expression()?;
        match self.peek().kind {
            TokenKind::Semicolon => {
                self.advance();
                Ok(Stmt::Expression(expr))
            }
            _ => Err(self.error("Expect ';' after expression.")),
        }
    }
    fn expression(&mut self) -> Result<Expr, ParseError> {
        self.assignment()
    }
    fn assignment(&mut self) -> Result<Expr, ParseError> {
        let expr = self.equality()?;
        match self.peek().kind {
            TokenKind::Equal => {
                self.advance();
                let equals = self.previous();
                let value = self.assignment()?;
                match expr {
                    Expr::Variable(name) => Ok(Expr::Assign {
                        name,
                        value: Box::new(value),
                    }),
                    other => {
                        // Report, but hand back the left expression so later
                        // stages can still inspect it. No synchronization.
                        self.diagnostics
                            .error_at(equals, "Invalid assignment target.");
                        Ok(other)
                    }
                }
            }
            _ => Ok(expr),
        }
    }
    fn equality(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.comparison()?;
        loop {
            match self.peek().kind {
                TokenKind::BangEqual | TokenKind::EqualEqual => {
                    self.advance();
                    let operator = self.previous().clone();
                    let right = self.comparison()?;
                    expr = Expr::Binary {
                        left: Box::new(expr),
                        operator,
                        right: Box::new(right),
                    };
                }
                _ => break,
            }
        }
        Ok(expr)
    }
    fn comparison(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.term()?;
        loop {
            match self.peek().kind {
                TokenKind::Greater
                | TokenKind::GreaterEqual
                | TokenKind::Less
                | TokenKind::LessEqual => {
                    self.advance();
                    let operator = self.previous().clone();
                    let right = self.term()?;
                    expr = Expr::Binary {
                        left: Box::new(expr),
                        operator,
                        right: Box::new(right),
                    };
                }
                _ => break,
            }
        }
        Ok(expr)
    }
    fn term(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.factor()?;
        loop {
            match self.peek().kind {
                TokenKind::Minus | TokenKind::Plus => {
                    self.advance();
                    let operator = self.previous().clone();
                    let right = self.factor()?;
                    expr = Expr::Binary {
                        left: Box::new(expr),
                        operator,
                        right: Box::new(right),
                    };
                }
                _ => break,
            }
        }
        Ok(expr)
    }
    fn factor(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.unary()?;
        loop {
            match self.peek().kind {
                TokenKind::Slash | TokenKind::Star => {
                    self.advance();
                    let operator = self.previous().clone();
                    let right = self.unary()?;
                    expr = Expr::Binary {
                        left: Box::new(expr),
                        operator,
                        right: Box::new(right),
                    };
                }
                _ => break,
            }
        }
        Ok(expr)
    }
    fn unary(&mut self) -> Result<Expr, ParseError> {
        match self.peek().kind {
            TokenKind::Bang | TokenKind::Minus => {
                self.advance();
                let operator = self.previous().clone();
                let right = self.unary()?;
                Ok(Expr::Unary {
                    operator,
                    right: Box::new(right),
                })
            }
            _ => self.primary(),
        }
    }
    fn primary(&mut self) -> Result<Expr, ParseError> {
        match &self.peek().kind {
            TokenKind::False => {
                self.advance();
                Ok(Expr::Literal(Value::Boolean(false)))
            }
            TokenKind::True => {
                self.advance();
                Ok(Expr::Literal(Value::Boolean(true)))
            }
            TokenKind::Nil => {
                self.advance();
                Ok(Expr::Literal(Value::Nil))
            }
            TokenKind::Number(x) => {
                let value = *x;
                self.advance();
                Ok(Expr::Literal(Value::Number(value)))
            }
            TokenKind::String(x) => {
                let value = x.clone();
                self.advance();
                Ok(Expr::Literal(Value::String(value)))
            }
            TokenKind::Identifier(_) => Ok(Expr::Variable(self.advance().clone())),
            TokenKind::LeftParen => {
                self.advance();
                let expr = self.expression()?;
                match self.peek().kind {
                    TokenKind::RightParen => {
                        self.advance();
                        Ok(Expr::Grouping(Box::new(expr)))
                    }
                    _ => Err(self.error("Expect ')' after expression.")),
                }
            }
            _ => Err(self.error("Expect expression.")),
        }
    }
    // Discard tokens until a statement boundary: just past a ';', or in
    // front of a keyword that starts a statement.
    fn synchronize(&mut self) {
        self.advance();
        while !self.is_at_end() {
            if let TokenKind::Semicolon = self.previous().kind {
                return;
            }
            match self.peek().kind {
                TokenKind::Class
                | TokenKind::Fun
                | TokenKind::Var
                | TokenKind::For
                | TokenKind::If
                | TokenKind::While
                | TokenKind::Print
                | TokenKind::Return => return,
                _ => (),
            }
            self.advance();
        }
    }
    fn advance(&mut self) -> &'a Token {
        if !self.is_at_end() {
            self.current += 1;
        }
        self.previous()
    }
    fn is_at_end(&self) -> bool {
        matches!(self.peek().kind, TokenKind::Eof)
    }
    fn peek(&self) -> &'a Token {
        &self.tokens[self.current.min(self.tokens.len() - 1)]
    }
    fn previous(&self) -> &'a Token {
        &self.tokens[self.current.saturating_sub(1)]
    }
    fn error(&mut self, message: &str) -> ParseError {
        let token = self.peek();
        self.diagnostics.error_at(token, message);
        ParseError
    }
}
