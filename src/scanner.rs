use crate::diagnostics::Diagnostics;
use crate::token::{Token, TokenKind};
use phf::phf_map;
use std::iter::Peekable;
use std::str::CharIndices;

#[derive(Debug)]
struct ScanError {
    line: usize,
    message: String,
}

// Note: the current position is self.iter.peek()'s byte index.
struct Scanner<'a> {
    source: &'a str,
    iter: Peekable<CharIndices<'a>>,
    start: usize,
    line: usize,
}

/// Turns source text into tokens, always terminated by an `Eof` token
/// carrying the final line number. Malformed input is reported through
/// `diagnostics` and scanning continues at the next character, so one bad
/// token never aborts the lex.
pub fn scan_tokens(source: &str, diagnostics: &mut Diagnostics) -> Vec<Token> {
    let mut scanner = Scanner {
        source,
        iter: source.char_indices().peekable(),
        start: 0,
        line: 1,
    };
    let mut tokens: Vec<Token> = Vec::new();

    while let Some((idx, c)) = scanner.iter.next() {
        scanner.start = idx;
        match scanner.scan_token(c) {
            Ok(Some(token)) => tokens.push(token),
            Ok(None) => (),
            Err(e) => diagnostics.error(e.line, &e.message),
        }
    }
    tokens.push(Token {
        kind: TokenKind::Eof,
        lexeme: String::new(),
        line: scanner.line,
    });
    tokens
}

impl<'a> Scanner<'a> {
    fn scan_token(&mut self, c: char) -> Result<Option<Token>, ScanError> {
        match c {
            '(' => Ok(Some(self.token(TokenKind::LeftParen))),
            ')' => Ok(Some(self.token(TokenKind::RightParen))),
            '{' => Ok(Some(self.token(TokenKind::LeftBrace))),
            '}' => Ok(Some(self.token(TokenKind::RightBrace))),
            ',' => Ok(Some(self.token(TokenKind::Comma))),
            '.' => Ok(Some(self.token(TokenKind::Dot))),
            '-' => Ok(Some(self.token(TokenKind::Minus))),
            '+' => Ok(Some(self.token(TokenKind::Plus))),
            ';' => Ok(Some(self.token(TokenKind::Semicolon))),
            '*' => Ok(Some(self.token(TokenKind::Star))),
            '!' => {
                if self.next_if('=') {
                    Ok(Some(self.token(TokenKind::BangEqual)))
                } else {
                    Ok(Some(self.token(TokenKind::Bang)))
                }
            }
            '=' => {
                if self.next_if('=') {
                    Ok(Some(self.token(TokenKind::EqualEqual)))
                } else {
                    Ok(Some(self.token(TokenKind::Equal)))
                }
            }
            '<' => {
                if self.next_if('=') {
                    Ok(Some(self.token(TokenKind::LessEqual)))
                } else {
                    Ok(Some(self.token(TokenKind::Less)))
                }
            }
            '>' => {
                if self.next_if('=') {
                    Ok(Some(self.token(TokenKind::GreaterEqual)))
                } else {
                    Ok(Some(self.token(TokenKind::Greater)))
                }
            }
            '/' => {
                if self.next_if('/') {
                    // A comment runs to the end of the line.
                    while self.iter.next_if(|&(_, c)| c != '\n').is_some() {}
                    Ok(None)
                } else {
                    Ok(Some(self.token(TokenKind::Slash)))
                }
            }
            ' ' | '\r' | '\t' => Ok(None),
            '\n' => {
                self.line += 1;
                Ok(None)
            }
            '"' => Ok(Some(self.string()?)),
            '0'..='9' => Ok(Some(self.number()?)),
            'a'..='z' | 'A'..='Z' | '_' => Ok(Some(self.identifier())),
            _ => Err(ScanError {
                line: self.line,
                message: "Unexpected character.".to_string(),
            }),
        }
    }
    fn current(&mut self) -> usize {
        match self.iter.peek() {
            None => self.source.len(),
            Some((idx, _)) => *idx,
        }
    }
    fn token(&mut self, kind: TokenKind) -> Token {
        let current = self.current();
        Token {
            kind,
            lexeme: self.source[self.start..current].to_string(),
            line: self.line,
        }
    }
    fn next_if(&mut self, expected: char) -> bool {
        self.iter.next_if(|&(_, c)| c == expected).is_some()
    }
    fn string(&mut self) -> Result<Token, ScanError> {
        loop {
            match self.iter.peek() {
                Some((_, '"')) => break,
                Some((_, '\n')) => {
                    self.line += 1;
                    self.iter.next();
                }
                Some(_) => {
                    self.iter.next();
                }
                None => {
                    return Err(ScanError {
                        line: self.line,
                        message: "Unterminated string.".to_string(),
                    });
                }
            }
        }
        self.iter.next(); // the closing quote
        let current = self.current();
        Ok(self.token(TokenKind::String(
            self.source[self.start + 1..current - 1].to_string(),
        )))
    }
    fn number(&mut self) -> Result<Token, ScanError> {
        while self.iter.next_if(|&(_, c)| c.is_ascii_digit()).is_some() {}

        // Consume a fractional part only if a digit follows the dot, so
        // `1.foo` lexes as NUMBER DOT IDENTIFIER.
        if let Some((_, '.')) = self.iter.peek() {
            let mut lookahead = self.iter.clone();
            lookahead.next();
            if matches!(lookahead.peek(), Some((_, '0'..='9'))) {
                self.iter.next();
                while self.iter.next_if(|&(_, c)| c.is_ascii_digit()).is_some() {}
            }
        }

        let current = self.current();
        let value = self.source[self.start..current]
            .parse()
            .map_err(|_| ScanError {
                line: self.line,
                message: "Invalid number literal.".to_string(),
            })?;
        Ok(self.token(TokenKind::Number(value)))
    }
    fn identifier(&mut self) -> Token {
        while self
            .iter
            .next_if(|&(_, c)| c.is_ascii_alphanumeric() || c == '_')
            .is_some()
        {}
        let current = self.current();
        match KEYWORDS.get(&self.source[self.start..current]) {
            None => self.token(TokenKind::Identifier(
                self.source[self.start..current].to_string(),
            )),
            Some(kind) => {
                let kind = kind.clone();
                self.token(kind)
            }
        }
    }
}

static KEYWORDS: phf::Map<&'static str, TokenKind> = phf_map! {
    "and" => TokenKind::And,
    "class" => TokenKind::Class,
    "else" => TokenKind::Else,
    "false" => TokenKind::False,
    "for" => TokenKind::For,
    "fun" => TokenKind::Fun,
    "if" => TokenKind::If,
    "nil" => TokenKind::Nil,
    "or" => TokenKind::Or,
    "print" => TokenKind::Print,
    "return" => TokenKind::Return,
    "super" => TokenKind::Super,
    "this" => TokenKind::This,
    "true" => TokenKind::True,
    "var" => TokenKind::Var,
    "while" => TokenKind::While,
};
