use crate::ast::Value;
use crate::diagnostics::RuntimeError;
use crate::token::Token;

use std::collections::BTreeMap;

/// Name bindings for the scope chain, innermost scope last. Block entry
/// pushes a scope and block exit pops it; the global scope created in
/// `new()` is never popped and lives as long as the Environment.
#[derive(Debug)]
pub struct Environment {
    scopes: Vec<BTreeMap<String, Value>>,
}

impl Environment {
    pub fn new() -> Environment {
        Environment {
            scopes: vec![BTreeMap::new()],
        }
    }
    pub fn push_scope(&mut self) {
        self.scopes.push(BTreeMap::new());
    }
    pub fn pop_scope(&mut self) {
        self.scopes.pop();
    }
    /// Binds (or rebinds) `name` in the innermost scope. Never fails;
    /// redeclaring a name in the same scope just overwrites it.
    pub fn define(&mut self, name: &str, value: Value) {
        self.scopes
            .last_mut()
            .expect("the global scope is never popped")
            .insert(name.to_string(), value);
    }
    /// Chained lookup, innermost scope outward.
    pub fn get(&self, name: &Token) -> Result<Value, RuntimeError> {
        for scope in self.scopes.iter().rev() {
            if let Some(value) = scope.get(&name.lexeme) {
                return Ok(value.clone());
            }
        }
        Err(RuntimeError::undefined_variable(name))
    }
    /// Overwrites the nearest existing binding. Unlike `define`, assignment
    /// never creates a binding.
    pub fn assign(&mut self, name: &Token, value: Value) -> Result<(), RuntimeError> {
        for scope in self.scopes.iter_mut().rev() {
            if let Some(slot) = scope.get_mut(&name.lexeme) {
                *slot = value;
                return Ok(());
            }
        }
        Err(RuntimeError::undefined_variable(name))
    }
}

impl Default for Environment {
    fn default() -> Environment {
        Environment::new()
    }
}

#[cfg(test)]
mod environment_tests {
    use crate::ast::Value;
    use crate::environment::Environment;
    use crate::token::{Token, TokenKind};

    fn name(text: &str) -> Token {
        Token {
            kind: TokenKind::Identifier(text.to_string()),
            lexeme: text.to_string(),
            line: 1,
        }
    }

    #[test]
    fn define_then_get() {
        let mut env = Environment::new();
        env.define("a", Value::Number(1.0));
        assert_eq!(env.get(&name("a")).unwrap(), Value::Number(1.0));
    }

    #[test]
    fn get_of_undefined_name_fails() {
        let env = Environment::new();
        let err = env.get(&name("missing")).unwrap_err();
        assert_eq!(err.message, "Undefined variable 'missing'.");
    }

    #[test]
    fn assign_overwrites_but_never_creates() {
        let mut env = Environment::new();
        assert!(env.assign(&name("a"), Value::Number(1.0)).is_err());
        env.define("a", Value::Nil);
        assert!(env.assign(&name("a"), Value::Number(1.0)).is_ok());
        assert_eq!(env.get(&name("a")).unwrap(), Value::Number(1.0));
    }

    #[test]
    fn inner_scope_shadows_without_mutating_outer() {
        let mut env = Environment::new();
        env.define("a", Value::Number(5.0));
        env.push_scope();
        env.define("a", Value::Number(3.0));
        assert_eq!(env.get(&name("a")).unwrap(), Value::Number(3.0));
        env.pop_scope();
        assert_eq!(env.get(&name("a")).unwrap(), Value::Number(5.0));
    }

    #[test]
    fn assign_walks_out_to_the_defining_scope() {
        let mut env = Environment::new();
        env.define("a", Value::Number(1.0));
        env.push_scope();
        env.assign(&name("a"), Value::Number(2.0)).unwrap();
        env.pop_scope();
        assert_eq!(env.get(&name("a")).unwrap(), Value::Number(2.0));
    }
}
