//! Abstract Syntax Tree for Helium.
//!
//! The tree is plain data. It is built once by the parser and only read
//! afterwards, by the diagnostic printer and the interpreter.

use serde::Serialize;

use crate::lexer::Token;
use crate::span::Span;

/// A complete Helium program.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Program {
    /// Top-level statements in source order
    pub statements: Vec<Statement>,
}

impl Program {
    pub fn new(statements: Vec<Statement>) -> Self {
        Self { statements }
    }
}

/// A statement.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Statement {
    /// Declaration: `let x: int = 5;` or `let x: int;`
    Let {
        identifier: Identifier,
        data_type: Token,
        /// `None` means declared but uninitialized
        value: Option<Expression>,
    },
    /// Assignment: `x = expr;`
    Assignment {
        identifier: Token,
        value: Option<Expression>,
    },
    /// Return: `return expr;` or `return;`
    Return { value: Option<Expression> },
    /// A bare expression: `x++;`
    Expression(Expression),
    /// Conditional block: `if cond { ... }`
    If {
        condition: Option<Expression>,
        body: Vec<Statement>,
    },
    /// Multi-value print: `print a, b, c;`
    ///
    /// `values[0]` is the head of the chain. A slot is `None` when the parser
    /// found no expression there. Never empty when built by the parser.
    Print { values: Vec<Option<Expression>> },
    /// A statement the parser could not make sense of.
    Invalid { token: Token },
}

impl Statement {
    pub fn span(&self) -> Span {
        match self {
            Statement::Let { identifier, .. } => identifier.token.span,
            Statement::Assignment { identifier, .. } => identifier.span,
            Statement::Return { value } => value.as_ref().map(Expression::span).unwrap_or_default(),
            Statement::Expression(expr) => expr.span(),
            Statement::If { condition, body } => condition
                .iter()
                .map(Expression::span)
                .chain(body.iter().map(Statement::span))
                .reduce(|a, b| a.merge(&b))
                .unwrap_or_default(),
            Statement::Print { values } => values
                .iter()
                .flatten()
                .map(Expression::span)
                .reduce(|a, b| a.merge(&b))
                .unwrap_or_default(),
            Statement::Invalid { token } => token.span,
        }
    }
}

/// An expression.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Expression {
    Identifier(Identifier),
    IntegerLiteral(Token),
    FloatLiteral(Token),
    StringLiteral(Token),
    /// Binary operator: `a + b`
    Infix {
        left: Option<Box<Expression>>,
        operator: Token,
        right: Option<Box<Expression>>,
    },
    /// Prefix operator: `-a`, `!a`, `++a`
    Prefix {
        operator: Token,
        right: Option<Box<Expression>>,
    },
    /// Postfix operator: `a++`
    Postfix {
        left: Option<Box<Expression>>,
        operator: Token,
    },
    /// An expression the parser could not classify.
    Invalid(Token),
}

impl Expression {
    /// The token that anchors this node in the source.
    pub fn token(&self) -> &Token {
        match self {
            Expression::Identifier(id) => &id.token,
            Expression::IntegerLiteral(token)
            | Expression::FloatLiteral(token)
            | Expression::StringLiteral(token)
            | Expression::Invalid(token) => token,
            Expression::Infix { operator, .. }
            | Expression::Prefix { operator, .. }
            | Expression::Postfix { operator, .. } => operator,
        }
    }

    pub fn span(&self) -> Span {
        let own = self.token().span;
        match self {
            Expression::Infix { left, right, .. } => [left, right]
                .into_iter()
                .flatten()
                .fold(own, |span, child| span.merge(&child.span())),
            Expression::Prefix { right: child, .. } | Expression::Postfix { left: child, .. } => {
                child.as_ref().map_or(own, |c| own.merge(&c.span()))
            }
            _ => own,
        }
    }

    pub fn infix(left: Option<Expression>, operator: Token, right: Option<Expression>) -> Self {
        Expression::Infix {
            left: left.map(Box::new),
            operator,
            right: right.map(Box::new),
        }
    }

    pub fn prefix(operator: Token, right: Option<Expression>) -> Self {
        Expression::Prefix {
            operator,
            right: right.map(Box::new),
        }
    }

    pub fn postfix(left: Option<Expression>, operator: Token) -> Self {
        Expression::Postfix {
            left: left.map(Box::new),
            operator,
        }
    }
}

/// An identifier.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Identifier {
    pub token: Token,
}

impl Identifier {
    pub fn new(token: Token) -> Self {
        Self { token }
    }

    /// The identifier's name, empty if the token has no literal.
    pub fn name(&self) -> &str {
        self.token.literal().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::TokenKind;
    use crate::parser::parse;

    fn first_statement(source: &str) -> Statement {
        let (program, _) = parse(source, "test.he");
        program.unwrap().statements.remove(0)
    }

    #[test]
    fn test_infix_span_covers_operands() {
        let Statement::Print { values } = first_statement("print a + bb;") else {
            panic!("Expected print statement");
        };
        let expr = values[0].as_ref().unwrap();

        assert_eq!(expr.token().kind, TokenKind::Plus);
        let span = expr.span();
        assert_eq!(span.start.column, 7);
        assert_eq!(span.end.column, 13);
    }

    #[test]
    fn test_if_span_without_condition_uses_body() {
        let statement = first_statement("if {\n  print a;\n}");
        assert!(matches!(statement, Statement::If { condition: None, .. }));
        assert_eq!(statement.span().start.line, 2);
    }

    #[test]
    fn test_statement_span_of_assignment() {
        let statement = first_statement("\n  total = 1;");
        let span = statement.span();
        assert_eq!((span.start.line, span.start.column), (2, 3));
    }
}
