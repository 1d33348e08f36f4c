//! Lexer for the Helium language.
//!
//! Uses the `logos` crate for tokenization. Unlike a typical logos lexer,
//! unrecognised input is kept as [`TokenKind::Illegal`] so the parser can
//! report it at the right position.

use logos::Logos;
use serde::Serialize;

use crate::span::{LineIndex, Position, Span};

/// Token kinds for the Helium language.
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[logos(skip r"[ \t\r\n\f]+")]
#[logos(skip r"//[^\n]*")]
pub enum TokenKind {
    // Keywords
    #[token("let")]
    Let,

    #[token("if")]
    If,

    #[token("return")]
    Return,

    #[token("print")]
    Print,

    // Type keywords
    #[token("int")]
    IntType,

    #[token("float")]
    FloatType,

    #[token("string")]
    StringType,

    // Literals
    #[regex(r"[a-zA-Z_][a-zA-Z0-9_]*")]
    Identifier,

    #[regex(r"[0-9]+")]
    Integer,

    #[regex(r"[0-9]+\.[0-9]+")]
    Float,

    #[regex(r#""([^"\\]|\\.)*""#)]
    String,

    // Operators
    #[token("+")]
    Plus,

    #[token("-")]
    Minus,

    #[token("*")]
    Star,

    #[token("/")]
    Slash,

    #[token("%")]
    Percent,

    #[token("!")]
    Bang,

    #[token("=")]
    Assign,

    #[token("==")]
    Equal,

    #[token("!=")]
    NotEqual,

    #[token("<")]
    Less,

    #[token(">")]
    Greater,

    #[token("<=")]
    LessEqual,

    #[token(">=")]
    GreaterEqual,

    #[token("&&")]
    And,

    #[token("||")]
    Or,

    #[token("++")]
    Increment,

    #[token("--")]
    Decrement,

    // Punctuation
    #[token(":")]
    Colon,

    #[token(";")]
    Semicolon,

    #[token(",")]
    Comma,

    #[token("(")]
    LParen,

    #[token(")")]
    RParen,

    #[token("{")]
    LBrace,

    #[token("}")]
    RBrace,

    // Input the lexer could not match
    Illegal,

    // End of file
    Eof,
}

impl TokenKind {
    /// Stable display name used by the token dump.
    pub fn name(&self) -> &'static str {
        match self {
            TokenKind::Let => "LET",
            TokenKind::If => "IF",
            TokenKind::Return => "RETURN",
            TokenKind::Print => "PRINT",
            TokenKind::IntType => "TYPE_INT",
            TokenKind::FloatType => "TYPE_FLOAT",
            TokenKind::StringType => "TYPE_STRING",
            TokenKind::Identifier => "IDENTIFIER",
            TokenKind::Integer => "INTEGER",
            TokenKind::Float => "FLOAT",
            TokenKind::String => "STRING",
            TokenKind::Plus => "PLUS",
            TokenKind::Minus => "MINUS",
            TokenKind::Star => "MULTIPLY",
            TokenKind::Slash => "DIVIDE",
            TokenKind::Percent => "MODULO",
            TokenKind::Bang => "NOT",
            TokenKind::Assign => "ASSIGN",
            TokenKind::Equal => "EQUAL",
            TokenKind::NotEqual => "NOT_EQUAL",
            TokenKind::Less => "LESS_THAN",
            TokenKind::Greater => "GREATER_THAN",
            TokenKind::LessEqual => "LESS_EQUAL",
            TokenKind::GreaterEqual => "GREATER_EQUAL",
            TokenKind::And => "AND",
            TokenKind::Or => "OR",
            TokenKind::Increment => "INCREMENT",
            TokenKind::Decrement => "DECREMENT",
            TokenKind::Colon => "COLON",
            TokenKind::Semicolon => "SEMICOLON",
            TokenKind::Comma => "COMMA",
            TokenKind::LParen => "LEFT_PAREN",
            TokenKind::RParen => "RIGHT_PAREN",
            TokenKind::LBrace => "LEFT_BRACE",
            TokenKind::RBrace => "RIGHT_BRACE",
            TokenKind::Illegal => "ILLEGAL",
            TokenKind::Eof => "EOF",
        }
    }

    /// Whether this kind names a declared type in a `let` statement.
    pub fn is_type_keyword(&self) -> bool {
        matches!(
            self,
            TokenKind::IntType | TokenKind::FloatType | TokenKind::StringType
        )
    }
}

/// A token with its kind, literal text, and source span.
///
/// Tokens are never mutated after the lexer produces them.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Token {
    pub kind: TokenKind,
    /// Literal text. `None` for synthetic tokens such as end-of-file.
    pub literal: Option<String>,
    pub span: Span,
}

impl Token {
    pub fn new(kind: TokenKind, literal: impl Into<String>, span: Span) -> Self {
        Self {
            kind,
            literal: Some(literal.into()),
            span,
        }
    }

    /// A token that carries no literal text.
    pub fn synthetic(kind: TokenKind, span: Span) -> Self {
        Self {
            kind,
            literal: None,
            span,
        }
    }

    pub fn literal(&self) -> Option<&str> {
        self.literal.as_deref()
    }

    pub fn line(&self) -> usize {
        self.span.start.line
    }

    pub fn column(&self) -> usize {
        self.span.start.column
    }
}

/// Lexer for the Helium language.
pub struct Lexer<'a> {
    source: &'a str,
    inner: logos::Lexer<'a, TokenKind>,
    lines: LineIndex,
    finished: bool,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            inner: TokenKind::lexer(source),
            lines: LineIndex::new(source),
            finished: false,
        }
    }

    fn eof_token(&self) -> Token {
        let pos: Position = self.lines.position(self.source, self.source.len());
        Token::synthetic(TokenKind::Eof, Span::new(pos, pos))
    }

    /// Get the next token. Returns `Eof` forever once input is exhausted.
    pub fn next_token(&mut self) -> Token {
        if self.finished {
            return self.eof_token();
        }

        match self.inner.next() {
            Some(result) => {
                let range = self.inner.span();
                let span = self.lines.span(self.source, range.start, range.end);
                let text = self.inner.slice();

                match result {
                    Ok(TokenKind::String) => {
                        // Keep the raw contents, without the surrounding quotes.
                        Token::new(TokenKind::String, &text[1..text.len() - 1], span)
                    }
                    Ok(kind) => Token::new(kind, text, span),
                    Err(()) => Token::new(TokenKind::Illegal, text, span),
                }
            }
            None => {
                self.finished = true;
                self.eof_token()
            }
        }
    }

    /// Tokenize the entire source. The last token is always `Eof`.
    pub fn tokenize(&mut self) -> Vec<Token> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token();
            let is_eof = token.kind == TokenKind::Eof;
            tokens.push(token);
            if is_eof {
                break;
            }
        }
        tokens
    }
}

/// Resolve backslash escapes in the raw contents of a string literal.
pub fn unescape(raw: &str) -> String {
    let mut result = String::with_capacity(raw.len());
    let mut chars = raw.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '\\' {
            if let Some(&next) = chars.peek() {
                chars.next();
                match next {
                    'n' => result.push('\n'),
                    't' => result.push('\t'),
                    'r' => result.push('\r'),
                    '0' => result.push('\0'),
                    '\\' => result.push('\\'),
                    '"' => result.push('"'),
                    _ => {
                        result.push('\\');
                        result.push(next);
                    }
                }
            } else {
                result.push('\\');
            }
        } else {
            result.push(ch);
        }
    }

    result
}
