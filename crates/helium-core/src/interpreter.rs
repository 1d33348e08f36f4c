//! Tree-walking interpreter for Helium programs.
//!
//! Executes a parsed [`Program`] without modifying it. `print` output goes
//! to the writer the interpreter was created with.

use std::collections::HashMap;
use std::fmt;
use std::io::{self, Write};

use miette::Diagnostic;
use thiserror::Error;

use crate::ast::*;
use crate::lexer::{unescape, Token, TokenKind};
use crate::span::Span;

/// A runtime value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int(i64),
    Float(f64),
    Str(String),
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "string",
        }
    }

    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Int(n) => *n != 0,
            Value::Float(f) => *f != 0.0,
            Value::Str(s) => !s.is_empty(),
        }
    }

    fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(n) => Some(*n as f64),
            Value::Float(f) => Some(*f),
            Value::Str(_) => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(n) => write!(f, "{}", n),
            Value::Float(x) => write!(f, "{}", x),
            Value::Str(s) => write!(f, "{}", s),
        }
    }
}

fn truth(b: bool) -> Value {
    Value::Int(b as i64)
}

/// Errors raised while executing a program.
#[derive(Debug, Error, Diagnostic)]
pub enum RuntimeError {
    #[error("line {line}: undefined variable '{name}'")]
    #[diagnostic(code(helium::runtime::undefined_variable))]
    UndefinedVariable { name: String, line: usize },

    #[error("line {line}: variable '{name}' is used before it is initialized")]
    #[diagnostic(
        code(helium::runtime::uninitialized),
        help("give it a value in its `let` statement or assign one first")
    )]
    Uninitialized { name: String, line: usize },

    #[error("line {line}: cannot apply '{operator}' to {left} and {right}")]
    #[diagnostic(code(helium::runtime::type_mismatch))]
    TypeMismatch {
        operator: String,
        left: &'static str,
        right: &'static str,
        line: usize,
    },

    #[error("line {line}: cannot apply '{operator}' to {operand}")]
    #[diagnostic(code(helium::runtime::type_mismatch))]
    UnaryTypeMismatch {
        operator: String,
        operand: &'static str,
        line: usize,
    },

    #[error("line {line}: '{operator}' needs a variable as its operand")]
    #[diagnostic(code(helium::runtime::not_assignable))]
    NotAssignable { operator: String, line: usize },

    #[error("line {line}: division by zero")]
    #[diagnostic(code(helium::runtime::division_by_zero))]
    DivisionByZero { line: usize },

    #[error("line {line}: integer overflow")]
    #[diagnostic(code(helium::runtime::overflow))]
    Overflow { line: usize },

    #[error("line {line}: invalid number literal '{literal}'")]
    #[diagnostic(code(helium::runtime::invalid_literal))]
    InvalidLiteral { literal: String, line: usize },

    #[error("line {line}: an expression is missing")]
    #[diagnostic(
        code(helium::runtime::missing_expression),
        help("fix the parse errors reported for this program")
    )]
    MissingExpression { line: usize },

    #[error("line {line}: cannot execute malformed code near '{text}'")]
    #[diagnostic(code(helium::runtime::invalid_node))]
    InvalidNode { text: String, line: usize },

    #[error("failed to write program output")]
    #[diagnostic(code(helium::runtime::io))]
    Io(#[from] io::Error),
}

pub type RuntimeResult<T> = Result<T, RuntimeError>;

enum Flow {
    Next,
    Return(Option<Value>),
}

fn text(token: &Token) -> String {
    token.literal().unwrap_or_default().to_string()
}

/// The Helium interpreter.
pub struct Interpreter<W: Write> {
    out: W,
    /// Innermost scope last. A `None` binding is declared but uninitialized.
    scopes: Vec<HashMap<String, Option<Value>>>,
}

impl<W: Write> Interpreter<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            scopes: vec![HashMap::new()],
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    /// Current value of a global variable, if it is declared and initialized.
    #[cfg(test)]
    fn global(&self, name: &str) -> Option<&Value> {
        self.scopes.first()?.get(name)?.as_ref()
    }

    /// Execute a program. Returns the value of a top-level `return`, if any.
    pub fn run(&mut self, program: &Program) -> RuntimeResult<Option<Value>> {
        for statement in &program.statements {
            if let Flow::Return(value) = self.execute(statement)? {
                self.out.flush()?;
                return Ok(value);
            }
        }
        self.out.flush()?;
        Ok(None)
    }

    fn execute(&mut self, statement: &Statement) -> RuntimeResult<Flow> {
        match statement {
            Statement::Let {
                identifier, value, ..
            } => {
                let value = value.as_ref().map(|v| self.evaluate(v)).transpose()?;
                if let Some(scope) = self.scopes.last_mut() {
                    scope.insert(identifier.name().to_string(), value);
                }
            }
            Statement::Assignment { identifier, value } => {
                let value = self.evaluate_required(value.as_ref(), || statement.span())?;
                self.assign(&text(identifier), value, identifier.line())?;
            }
            Statement::Return { value } => {
                let value = value.as_ref().map(|v| self.evaluate(v)).transpose()?;
                return Ok(Flow::Return(value));
            }
            Statement::Expression(expr) => {
                self.evaluate(expr)?;
            }
            Statement::If { condition, body } => {
                if self
                    .evaluate_required(condition.as_ref(), || statement.span())?
                    .is_truthy()
                {
                    self.scopes.push(HashMap::new());
                    let flow = self.execute_block(body);
                    self.scopes.pop();
                    return flow;
                }
            }
            Statement::Print { values } => {
                let mut rendered = Vec::with_capacity(values.len());
                // Gaps were reported by the parser and print nothing.
                for value in values.iter().flatten() {
                    rendered.push(self.evaluate(value)?.to_string());
                }
                writeln!(self.out, "{}", rendered.join(" "))?;
            }
            Statement::Invalid { token } => {
                return Err(RuntimeError::InvalidNode {
                    text: text(token),
                    line: token.line(),
                })
            }
        }

        Ok(Flow::Next)
    }

    fn execute_block(&mut self, body: &[Statement]) -> RuntimeResult<Flow> {
        for statement in body {
            if let Flow::Return(value) = self.execute(statement)? {
                return Ok(Flow::Return(value));
            }
        }
        Ok(Flow::Next)
    }

    /// Evaluate a child the parser may have left empty. `parent` locates
    /// the error when it is.
    fn evaluate_required(
        &mut self,
        expr: Option<&Expression>,
        parent: impl FnOnce() -> Span,
    ) -> RuntimeResult<Value> {
        match expr {
            Some(expr) => self.evaluate(expr),
            None => Err(RuntimeError::MissingExpression {
                line: parent().start.line,
            }),
        }
    }

    fn evaluate(&mut self, expr: &Expression) -> RuntimeResult<Value> {
        match expr {
            Expression::Identifier(id) => self.lookup(id),
            Expression::IntegerLiteral(token) => {
                let literal = text(token);
                literal
                    .parse()
                    .map(Value::Int)
                    .map_err(|_| RuntimeError::InvalidLiteral {
                        literal,
                        line: token.line(),
                    })
            }
            Expression::FloatLiteral(token) => {
                let literal = text(token);
                literal
                    .parse()
                    .map(Value::Float)
                    .map_err(|_| RuntimeError::InvalidLiteral {
                        literal,
                        line: token.line(),
                    })
            }
            Expression::StringLiteral(token) => Ok(Value::Str(unescape(&text(token)))),
            Expression::Infix {
                left,
                operator,
                right,
            } => match operator.kind {
                TokenKind::And => {
                    let result = self.evaluate_required(left.as_deref(), || expr.span())?.is_truthy()
                        && self.evaluate_required(right.as_deref(), || expr.span())?.is_truthy();
                    Ok(truth(result))
                }
                TokenKind::Or => {
                    let result = self.evaluate_required(left.as_deref(), || expr.span())?.is_truthy()
                        || self.evaluate_required(right.as_deref(), || expr.span())?.is_truthy();
                    Ok(truth(result))
                }
                _ => {
                    let left = self.evaluate_required(left.as_deref(), || expr.span())?;
                    let right = self.evaluate_required(right.as_deref(), || expr.span())?;
                    binary(operator, left, right)
                }
            },
            Expression::Prefix { operator, right } => match operator.kind {
                TokenKind::Increment | TokenKind::Decrement => {
                    self.step(operator, right.as_deref(), false)
                }
                _ => {
                    let operand = self.evaluate_required(right.as_deref(), || expr.span())?;
                    unary(operator, operand)
                }
            },
            Expression::Postfix { left, operator } => self.step(operator, left.as_deref(), true),
            Expression::Invalid(token) => Err(RuntimeError::InvalidNode {
                text: text(token),
                line: token.line(),
            }),
        }
    }

    /// `++`/`--` on a variable. Postfix yields the old value, prefix the new.
    fn step(
        &mut self,
        operator: &Token,
        operand: Option<&Expression>,
        postfix: bool,
    ) -> RuntimeResult<Value> {
        let line = operator.line();
        let Some(Expression::Identifier(id)) = operand else {
            return Err(RuntimeError::NotAssignable {
                operator: text(operator),
                line,
            });
        };

        let delta: i64 = if operator.kind == TokenKind::Increment { 1 } else { -1 };
        let current = self.lookup(id)?;
        let updated = match &current {
            Value::Int(n) => Value::Int(n.checked_add(delta).ok_or(RuntimeError::Overflow { line })?),
            Value::Float(f) => Value::Float(f + delta as f64),
            Value::Str(_) => {
                return Err(RuntimeError::UnaryTypeMismatch {
                    operator: text(operator),
                    operand: current.type_name(),
                    line,
                })
            }
        };
        self.assign(id.name(), updated.clone(), line)?;

        Ok(if postfix { current } else { updated })
    }

    fn lookup(&self, id: &Identifier) -> RuntimeResult<Value> {
        let name = id.name();
        let line = id.token.line();
        match self.scopes.iter().rev().find_map(|scope| scope.get(name)) {
            Some(Some(value)) => Ok(value.clone()),
            Some(None) => Err(RuntimeError::Uninitialized {
                name: name.to_string(),
                line,
            }),
            None => Err(RuntimeError::UndefinedVariable {
                name: name.to_string(),
                line,
            }),
        }
    }

    fn assign(&mut self, name: &str, value: Value, line: usize) -> RuntimeResult<()> {
        match self
            .scopes
            .iter_mut()
            .rev()
            .find_map(|scope| scope.get_mut(name))
        {
            Some(slot) => {
                *slot = Some(value);
                Ok(())
            }
            None => Err(RuntimeError::UndefinedVariable {
                name: name.to_string(),
                line,
            }),
        }
    }
}

fn unary(operator: &Token, operand: Value) -> RuntimeResult<Value> {
    let line = operator.line();
    match (operator.kind, &operand) {
        (TokenKind::Bang, _) => Ok(truth(!operand.is_truthy())),
        (TokenKind::Minus, Value::Int(n)) => {
            n.checked_neg().map(Value::Int).ok_or(RuntimeError::Overflow { line })
        }
        (TokenKind::Minus, Value::Float(f)) => Ok(Value::Float(-f)),
        _ => Err(RuntimeError::UnaryTypeMismatch {
            operator: text(operator),
            operand: operand.type_name(),
            line,
        }),
    }
}

fn binary(operator: &Token, left: Value, right: Value) -> RuntimeResult<Value> {
    let line = operator.line();
    let mismatch = || RuntimeError::TypeMismatch {
        operator: text(operator),
        left: left.type_name(),
        right: right.type_name(),
        line,
    };

    match (&left, &right) {
        (Value::Int(a), Value::Int(b)) => {
            int_op(operator.kind, *a, *b, line).ok_or_else(mismatch)?
        }
        (Value::Str(a), Value::Str(b)) => str_op(operator.kind, a, b).ok_or_else(mismatch),
        _ => match (left.as_f64(), right.as_f64()) {
            (Some(a), Some(b)) => float_op(operator.kind, a, b, line).ok_or_else(mismatch)?,
            _ => Err(mismatch()),
        },
    }
}

/// `None` means the operator does not apply to these operands.
fn int_op(kind: TokenKind, a: i64, b: i64, line: usize) -> Option<RuntimeResult<Value>> {
    let checked = |result: Option<i64>| result.map(Value::Int).ok_or(RuntimeError::Overflow { line });
    let result = match kind {
        TokenKind::Plus => checked(a.checked_add(b)),
        TokenKind::Minus => checked(a.checked_sub(b)),
        TokenKind::Star => checked(a.checked_mul(b)),
        TokenKind::Slash | TokenKind::Percent if b == 0 => {
            Err(RuntimeError::DivisionByZero { line })
        }
        TokenKind::Slash => checked(a.checked_div(b)),
        TokenKind::Percent => checked(a.checked_rem(b)),
        _ => return compare(kind, a.cmp(&b)).map(Ok),
    };
    Some(result)
}

fn float_op(kind: TokenKind, a: f64, b: f64, line: usize) -> Option<RuntimeResult<Value>> {
    let result = match kind {
        TokenKind::Plus => Ok(Value::Float(a + b)),
        TokenKind::Minus => Ok(Value::Float(a - b)),
        TokenKind::Star => Ok(Value::Float(a * b)),
        TokenKind::Slash | TokenKind::Percent if b == 0.0 => {
            Err(RuntimeError::DivisionByZero { line })
        }
        TokenKind::Slash => Ok(Value::Float(a / b)),
        TokenKind::Percent => Ok(Value::Float(a % b)),
        _ => return compare(kind, a.partial_cmp(&b)?).map(Ok),
    };
    Some(result)
}

fn str_op(kind: TokenKind, a: &str, b: &str) -> Option<Value> {
    match kind {
        TokenKind::Plus => Some(Value::Str(format!("{}{}", a, b))),
        _ => compare(kind, a.cmp(b)),
    }
}

fn compare(kind: TokenKind, ordering: std::cmp::Ordering) -> Option<Value> {
    use std::cmp::Ordering::*;
    let result = match kind {
        TokenKind::Equal => ordering == Equal,
        TokenKind::NotEqual => ordering != Equal,
        TokenKind::Less => ordering == Less,
        TokenKind::Greater => ordering == Greater,
        TokenKind::LessEqual => ordering != Greater,
        TokenKind::GreaterEqual => ordering != Less,
        _ => return None,
    };
    Some(truth(result))
}
