//! Parser for the Helium language.
//!
//! Recursive descent for statements, precedence climbing for expressions.
//! Problems are collected as diagnostics and the parser resynchronises at
//! the next `;` or `}`, so the resulting tree may be partial: operands can
//! be missing and unparseable statements become [`Statement::Invalid`].

use crate::ast::*;
use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::lexer::{Lexer, Token, TokenKind};

/// Deepest nesting of parentheses, operators and `if` blocks accepted
/// before the whole parse is abandoned.
pub const MAX_NESTING_DEPTH: usize = 128;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Precedence {
    Lowest,
    Or,
    And,
    Equality,
    Comparison,
    Sum,
    Product,
    Prefix,
}

impl TokenKind {
    fn infix_precedence(&self) -> Option<Precedence> {
        match self {
            TokenKind::Or => Some(Precedence::Or),
            TokenKind::And => Some(Precedence::And),
            TokenKind::Equal | TokenKind::NotEqual => Some(Precedence::Equality),
            TokenKind::Less
            | TokenKind::Greater
            | TokenKind::LessEqual
            | TokenKind::GreaterEqual => Some(Precedence::Comparison),
            TokenKind::Plus | TokenKind::Minus => Some(Precedence::Sum),
            TokenKind::Star | TokenKind::Slash | TokenKind::Percent => Some(Precedence::Product),
            _ => None,
        }
    }

    fn starts_expression(&self) -> bool {
        matches!(
            self,
            TokenKind::Identifier
                | TokenKind::Integer
                | TokenKind::Float
                | TokenKind::String
                | TokenKind::Minus
                | TokenKind::Bang
                | TokenKind::Increment
                | TokenKind::Decrement
                | TokenKind::LParen
                | TokenKind::Illegal
        )
    }
}

enum ParseError {
    /// Skip to the next statement boundary and keep going.
    Recoverable(Diagnostic),
    /// Abandon the whole program.
    Fatal(Diagnostic),
}

impl From<Diagnostic> for ParseError {
    fn from(diagnostic: Diagnostic) -> Self {
        ParseError::Recoverable(diagnostic)
    }
}

type ParseResult<T> = Result<T, ParseError>;

/// Parser for the Helium language.
pub struct Parser<'a> {
    source: &'a str,
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
    diagnostics: Diagnostics,
    file_path: String,
}

impl<'a> Parser<'a> {
    pub fn new(source: &'a str, file_path: impl Into<String>) -> Self {
        let mut lexer = Lexer::new(source);
        let tokens = lexer.tokenize();

        Self {
            source,
            tokens,
            pos: 0,
            depth: 0,
            diagnostics: Diagnostics::new(),
            file_path: file_path.into(),
        }
    }

    /// Parse the entire program.
    ///
    /// Returns `None` for the program only when parsing had to be abandoned;
    /// the diagnostics then end with the reason.
    pub fn parse(mut self) -> (Option<Program>, Diagnostics) {
        let mut statements = Vec::new();

        while !self.is_at_end() {
            match self.parse_statement_recovering() {
                Ok(statement) => statements.push(statement),
                Err(fatal) => {
                    self.diagnostics.push(fatal);
                    return (None, self.diagnostics);
                }
            }
        }

        (Some(Program::new(statements)), self.diagnostics)
    }

    /// Parse one statement, replacing it with `Statement::Invalid` if it is
    /// malformed. `Err` carries a fatal diagnostic.
    fn parse_statement_recovering(&mut self) -> Result<Statement, Diagnostic> {
        let start = self.pos;
        let start_token = self.current().clone();

        match self.parse_statement() {
            Ok(statement) => Ok(statement),
            Err(ParseError::Recoverable(diag)) => {
                self.diagnostics.push(diag);
                self.recover(start);
                Ok(Statement::Invalid { token: start_token })
            }
            Err(ParseError::Fatal(diag)) => Err(diag),
        }
    }

    fn parse_statement(&mut self) -> ParseResult<Statement> {
        let kind = self.current().kind;
        match kind {
            TokenKind::Let => self.parse_let(),
            TokenKind::Return => self.parse_return(),
            TokenKind::If => self.parse_if(),
            TokenKind::Print => self.parse_print(),
            TokenKind::Identifier if self.peek_kind() == TokenKind::Assign => {
                self.parse_assignment()
            }
            kind if kind.starts_expression() => self.parse_expression_statement(),
            _ => {
                let token = self.current();
                Err(self
                    .error("E101", format!("Expected statement, found {}", describe(token)), token)
                    .build()
                    .into())
            }
        }
    }

    /// `let <ident> : <type> [= <expr>] ;`
    fn parse_let(&mut self) -> ParseResult<Statement> {
        self.expect(TokenKind::Let)?;
        let name = self.expect(TokenKind::Identifier)?;
        self.expect(TokenKind::Colon)?;
        let data_type = self.parse_type()?;

        let value = if self.check(TokenKind::Assign) {
            self.advance();
            self.parse_operand()?
        } else {
            None
        };
        self.expect(TokenKind::Semicolon)?;

        Ok(Statement::Let {
            identifier: Identifier::new(name),
            data_type,
            value,
        })
    }

    fn parse_type(&mut self) -> ParseResult<Token> {
        let kind = self.current().kind;
        if kind.is_type_keyword() || kind == TokenKind::Identifier {
            Ok(self.advance())
        } else {
            let token = self.current();
            Err(self
                .error("E102", format!("Expected type, found {}", describe(token)), token)
                .build()
                .into())
        }
    }

    /// `<ident> = <expr> ;`
    fn parse_assignment(&mut self) -> ParseResult<Statement> {
        let identifier = self.expect(TokenKind::Identifier)?;
        self.expect(TokenKind::Assign)?;
        let value = self.parse_operand()?;
        self.expect(TokenKind::Semicolon)?;

        Ok(Statement::Assignment { identifier, value })
    }

    /// `return [<expr>] ;`
    fn parse_return(&mut self) -> ParseResult<Statement> {
        self.expect(TokenKind::Return)?;
        let value = if self.check(TokenKind::Semicolon) {
            None
        } else {
            self.parse_operand()?
        };
        self.expect(TokenKind::Semicolon)?;

        Ok(Statement::Return { value })
    }

    /// `if <expr> { <statement>* }`
    fn parse_if(&mut self) -> ParseResult<Statement> {
        self.expect(TokenKind::If)?;
        let condition = self.parse_operand()?;
        self.expect(TokenKind::LBrace)?;
        let body = self.nested(|p| p.parse_block())?;

        Ok(Statement::If { condition, body })
    }

    /// Statements up to and including the closing `}`.
    fn parse_block(&mut self) -> ParseResult<Vec<Statement>> {
        let mut body = Vec::new();

        loop {
            if self.check(TokenKind::RBrace) {
                self.advance();
                break;
            }
            if self.is_at_end() {
                let token = self.current();
                let diag = self
                    .error("E106", "Expected '}' to close the if block", token)
                    .with_help("add a closing brace");
                let diag = diag.build();
                self.diagnostics.push(diag);
                break;
            }
            body.push(
                self.parse_statement_recovering()
                    .map_err(ParseError::Fatal)?,
            );
        }

        Ok(body)
    }

    /// `print [<expr>] (, [<expr>])* ;`
    fn parse_print(&mut self) -> ParseResult<Statement> {
        self.expect(TokenKind::Print)?;
        let mut values = Vec::new();

        loop {
            if self.check(TokenKind::Comma) || self.check(TokenKind::Semicolon) {
                // `print;` is a bare newline, anything else is a gap in the list.
                if !(values.is_empty() && self.check(TokenKind::Semicolon)) {
                    let token = self.current();
                    let diag = Diagnostic::warning("W101", "Empty value in print statement")
                        .with_file(&self.file_path)
                        .at(token)
                        .build();
                    self.diagnostics.push(diag);
                }
                values.push(None);
            } else {
                values.push(self.parse_operand()?);
            }

            if self.check(TokenKind::Comma) {
                self.advance();
            } else {
                break;
            }
        }
        self.expect(TokenKind::Semicolon)?;

        Ok(Statement::Print { values })
    }

    fn parse_expression_statement(&mut self) -> ParseResult<Statement> {
        let start = self.current().clone();
        let expr = self
            .parse_operand()?
            .unwrap_or(Expression::Invalid(start));
        self.expect(TokenKind::Semicolon)?;

        Ok(Statement::Expression(expr))
    }

    /// A full expression. `None` when no operand could be found, which has
    /// already been reported.
    fn parse_operand(&mut self) -> ParseResult<Option<Expression>> {
        self.parse_expression(Precedence::Lowest)
    }

    fn parse_expression(&mut self, min: Precedence) -> ParseResult<Option<Expression>> {
        self.nested(|p| {
            let outer = p.depth;
            let result = p.parse_operator_chain(min);
            p.depth = outer;
            result
        })
    }

    /// Left-associative infix and postfix operators. Each node wrapped
    /// around `left` is one level deeper than the last.
    fn parse_operator_chain(&mut self, min: Precedence) -> ParseResult<Option<Expression>> {
        let mut left = self.parse_prefix()?;

        loop {
            let kind = self.current().kind;
            if let Some(precedence) = kind.infix_precedence() {
                if precedence <= min {
                    break;
                }
                self.deepen()?;
                let operator = self.advance();
                let right = self.parse_expression(precedence)?;
                left = Some(Expression::infix(left, operator, right));
            } else if matches!(kind, TokenKind::Increment | TokenKind::Decrement) {
                self.deepen()?;
                let operator = self.advance();
                left = Some(Expression::postfix(left, operator));
            } else {
                break;
            }
        }

        Ok(left)
    }

    fn parse_prefix(&mut self) -> ParseResult<Option<Expression>> {
        let token = self.current().clone();

        let expr = match token.kind {
            TokenKind::Identifier => {
                self.advance();
                Expression::Identifier(Identifier::new(token))
            }
            TokenKind::Integer => {
                self.advance();
                Expression::IntegerLiteral(token)
            }
            TokenKind::Float => {
                self.advance();
                Expression::FloatLiteral(token)
            }
            TokenKind::String => {
                self.advance();
                Expression::StringLiteral(token)
            }
            TokenKind::Minus | TokenKind::Bang | TokenKind::Increment | TokenKind::Decrement => {
                self.advance();
                let right = self.parse_expression(Precedence::Prefix)?;
                Expression::prefix(token, right)
            }
            TokenKind::LParen => {
                self.advance();
                let inner = self.parse_operand()?;
                self.expect(TokenKind::RParen)?;
                return Ok(inner);
            }
            TokenKind::Illegal => {
                self.advance();
                let diag = self
                    .error("E104", format!("Unexpected character {}", describe(&token)), &token)
                    .build();
                self.diagnostics.push(diag);
                Expression::Invalid(token)
            }
            _ => {
                let diag = self
                    .error("E103", format!("Expected expression, found {}", describe(&token)), &token)
                    .build();
                self.diagnostics.push(diag);
                return Ok(None);
            }
        };

        Ok(Some(expr))
    }

    /// Run `f` one nesting level deeper, failing hard past the limit.
    fn nested<T>(&mut self, f: impl FnOnce(&mut Self) -> ParseResult<T>) -> ParseResult<T> {
        self.deepen()?;
        let result = f(self);
        self.depth -= 1;
        result
    }

    /// Go one level deeper without restoring; the caller resets `depth`.
    fn deepen(&mut self) -> ParseResult<()> {
        if self.depth >= MAX_NESTING_DEPTH {
            let token = self.current();
            let diag = self
                .error(
                    "E105",
                    format!("Nesting exceeds {} levels, giving up", MAX_NESTING_DEPTH),
                    token,
                )
                .build();
            return Err(ParseError::Fatal(diag));
        }

        self.depth += 1;
        Ok(())
    }

    // Helper methods

    fn error(
        &self,
        code: &str,
        message: impl Into<String>,
        token: &Token,
    ) -> crate::diagnostics::DiagnosticBuilder {
        let mut builder = Diagnostic::error(code, message)
            .with_file(&self.file_path)
            .at(token);
        if let Some(line) = self.source.lines().nth(token.line().saturating_sub(1)) {
            builder = builder.with_context(line);
        }
        builder
    }

    fn current(&self) -> &Token {
        self.tokens.get(self.pos).unwrap_or(&self.tokens[self.tokens.len() - 1])
    }

    fn peek_kind(&self) -> TokenKind {
        self.tokens
            .get(self.pos + 1)
            .map_or(TokenKind::Eof, |token| token.kind)
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.current().kind == kind
    }

    fn is_at_end(&self) -> bool {
        self.current().kind == TokenKind::Eof
    }

    fn advance(&mut self) -> Token {
        let token = self.current().clone();
        if !self.is_at_end() {
            self.pos += 1;
        }
        token
    }

    fn expect(&mut self, kind: TokenKind) -> Result<Token, Diagnostic> {
        if self.check(kind) {
            Ok(self.advance())
        } else {
            let token = self.current();
            Err(self
                .error(
                    "E102",
                    format!("Expected {}, found {}", kind.name(), describe(token)),
                    token,
                )
                .build())
        }
    }

    /// Skip past the end of the broken statement: through the next `;`, or
    /// up to a `}` or statement keyword. Always makes progress.
    fn recover(&mut self, start: usize) {
        if self.pos == start && !self.is_at_end() {
            self.advance();
        }
        while !self.is_at_end() {
            match self.current().kind {
                TokenKind::Semicolon => {
                    self.advance();
                    return;
                }
                TokenKind::RBrace
                | TokenKind::Let
                | TokenKind::If
                | TokenKind::Return
                | TokenKind::Print => return,
                _ => {
                    self.advance();
                }
            }
        }
    }
}

fn describe(token: &Token) -> String {
    match (token.kind, token.literal()) {
        (TokenKind::Eof, _) | (_, None) => "end of file".to_string(),
        (_, Some(text)) => format!("'{}'", text),
    }
}

/// Parse `source` in one call.
pub fn parse(source: &str, file_path: &str) -> (Option<Program>, Diagnostics) {
    Parser::new(source, file_path).parse()
}
