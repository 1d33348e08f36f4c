//! Diagnostic printer for tokens and the AST.
//!
//! Renders any program, statement or expression as line-oriented text.
//! Absent nodes and invalid nodes are not errors here: each one becomes a
//! fixed marker line and the walk carries on. The only failure a caller can
//! see is the output sink's own `io::Error`.

use std::io::{self, Write};

use crate::ast::{Expression, Program, Statement};
use crate::lexer::Token;

pub const NULL_PROGRAM: &str = "Parse program function returned nothing - NULL";
pub const NULL_STATEMENT: &str = "NULL Statement";
pub const NULL_EXPRESSION: &str = "NULL Expression";
pub const NULL_PRINT_VALUE: &str = "Left expression is NULL";
pub const UNKNOWN_STATEMENT: &str = "Unknown Statement Type";
pub const UNKNOWN_EXPRESSION: &str = "Unknown Expression Type";
pub const UNINITIALIZED: &str = "  Uninitialized";
pub const CHAIN_SEPARATOR: &str = " -> ";
pub const END_OF_TOKENS: &str = "Ended lexer output";

const BANNER_WIDTH: usize = 50;
const NULL_LITERAL: &str = "(null)";

fn literal(token: &Token) -> &str {
    token.literal().unwrap_or(NULL_LITERAL)
}

/// Writes diagnostic text for tokens and AST nodes to a sink.
pub struct AstPrinter<W: Write> {
    out: W,
}

impl<W: Write> AstPrinter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn banner(&mut self) -> io::Result<()> {
        writeln!(self.out, "{}", "-".repeat(BANNER_WIDTH))
    }

    /// Dump the raw token stream between two banners.
    pub fn print_tokens(&mut self, tokens: &[Token]) -> io::Result<()> {
        self.banner()?;
        for (i, token) in tokens.iter().enumerate() {
            match token.literal() {
                Some(text) => writeln!(
                    self.out,
                    "Token Type: {:<30} | Literal: {:<20} | Line : {}   Column : {}",
                    token.kind.name(),
                    text,
                    token.line(),
                    token.column()
                )?,
                None => writeln!(self.out, "Token {} has a NULL literal", i)?,
            }
        }
        self.banner()?;
        writeln!(self.out, "{}", END_OF_TOKENS)
    }

    /// Print a whole program, or the fixed marker when parsing produced none.
    pub fn print_program(&mut self, program: Option<&Program>) -> io::Result<()> {
        let Some(program) = program else {
            return writeln!(self.out, "{}", NULL_PROGRAM);
        };

        writeln!(self.out, "Program statements' count {}", program.statements.len())?;
        for (i, statement) in program.statements.iter().enumerate() {
            writeln!(self.out, "Statement {}:", i + 1)?;
            self.print_statement(Some(statement))?;
            writeln!(self.out)?;
        }
        Ok(())
    }

    pub fn print_statement(&mut self, statement: Option<&Statement>) -> io::Result<()> {
        let Some(statement) = statement else {
            return writeln!(self.out, "{}", NULL_STATEMENT);
        };

        match statement {
            Statement::Let {
                identifier,
                data_type,
                value,
            } => {
                writeln!(self.out, "Let Statement: {}", literal(&identifier.token))?;
                writeln!(self.out, "Data type: {}", literal(data_type))?;
                match value {
                    Some(value) => {
                        write!(self.out, "  Value: ")?;
                        self.print_expression(Some(value))
                    }
                    None => writeln!(self.out, "{}", UNINITIALIZED),
                }
            }
            Statement::Assignment { identifier, value } => {
                write!(self.out, "Assignment Statement: {} = ", literal(identifier))?;
                self.print_expression(value.as_ref())
            }
            Statement::Return { value } => {
                write!(self.out, "Return Statement: ")?;
                self.print_expression(value.as_ref())
            }
            Statement::Expression(expr) => {
                write!(self.out, "Expression Statement: ")?;
                self.print_expression(Some(expr))?;
                writeln!(self.out)
            }
            Statement::If { condition, body } => {
                writeln!(self.out, "If Statement:")?;
                write!(self.out, "  Condition: ")?;
                self.print_expression(condition.as_ref())?;
                write!(self.out, "\n  If Block:\n")?;
                for (i, statement) in body.iter().enumerate() {
                    writeln!(self.out, "    Statement {}:", i + 1)?;
                    self.print_statement(Some(statement))?;
                    writeln!(self.out)?;
                }
                Ok(())
            }
            Statement::Print { values } => self.print_chain(values),
            Statement::Invalid { .. } => writeln!(self.out, "{}", UNKNOWN_STATEMENT),
        }
    }

    /// Print statement values, head first, one separator per further link.
    ///
    /// Iterative so arbitrarily long argument lists cost no extra stack.
    fn print_chain(&mut self, values: &[Option<Expression>]) -> io::Result<()> {
        writeln!(self.out, "Print Statement: (")?;

        let mut links = values.iter();
        // An empty list still has a head, just without a value.
        let head = links.next().and_then(Option::as_ref);
        self.print_chain_value(head)?;
        for value in links {
            write!(self.out, "{}", CHAIN_SEPARATOR)?;
            self.print_chain_value(value.as_ref())?;
        }

        write!(self.out, "\n)\n")
    }

    fn print_chain_value(&mut self, value: Option<&Expression>) -> io::Result<()> {
        match value {
            Some(expr) => self.print_expression(Some(expr)),
            None => writeln!(self.out, "{}", NULL_PRINT_VALUE),
        }
    }

    /// Print an expression tree. Recursion depth follows the tree's nesting.
    pub fn print_expression(&mut self, expr: Option<&Expression>) -> io::Result<()> {
        let Some(expr) = expr else {
            return writeln!(self.out, "{}", NULL_EXPRESSION);
        };

        match expr {
            Expression::Identifier(id) => {
                writeln!(self.out, "Identifier: {}", literal(&id.token))
            }
            Expression::IntegerLiteral(token) => {
                writeln!(self.out, "Integer Literal: {}", literal(token))
            }
            Expression::FloatLiteral(token) => {
                writeln!(self.out, "Floating Literal: {}", literal(token))
            }
            Expression::StringLiteral(token) => {
                writeln!(self.out, "String literal: {}", literal(token))
            }
            Expression::Infix {
                left,
                operator,
                right,
            } => {
                write!(self.out, "Infix Expression: (")?;
                self.print_expression(left.as_deref())?;
                write!(self.out, " {} ", literal(operator))?;
                self.print_expression(right.as_deref())?;
                write!(self.out, ")")
            }
            Expression::Prefix { operator, right } => {
                write!(self.out, "Prefix Expression: ")?;
                write!(self.out, "{}(\n\t", literal(operator))?;
                self.print_expression(right.as_deref())?;
                write!(self.out, ")")
            }
            Expression::Postfix { left, operator } => {
                write!(self.out, "Postfix Expression: ")?;
                write!(self.out, "( ")?;
                self.print_expression(left.as_deref())?;
                write!(self.out, "){}", literal(operator))
            }
            Expression::Invalid(_) => writeln!(self.out, "{}", UNKNOWN_EXPRESSION),
        }
    }
}

fn render(print: impl FnOnce(&mut AstPrinter<Vec<u8>>) -> io::Result<()>) -> String {
    let mut printer = AstPrinter::new(Vec::new());
    // Writing into a Vec cannot fail.
    let _ = print(&mut printer);
    String::from_utf8_lossy(&printer.into_inner()).into_owned()
}

pub fn render_program(program: Option<&Program>) -> String {
    render(|p| p.print_program(program))
}

#[cfg(test)]
fn render_statement(statement: Option<&Statement>) -> String {
    render(|p| p.print_statement(statement))
}

#[cfg(test)]
fn render_expression(expr: Option<&Expression>) -> String {
    render(|p| p.print_expression(expr))
}

#[cfg(test)]
fn render_tokens(tokens: &[Token]) -> String {
    render(|p| p.print_tokens(tokens))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Identifier;
    use crate::lexer::TokenKind;
    use crate::span::Span;
    use insta::assert_snapshot;

    fn token(kind: TokenKind, text: &str) -> Token {
        Token::new(kind, text, Span::default())
    }

    fn ident(name: &str) -> Expression {
        Expression::Identifier(Identifier::new(token(TokenKind::Identifier, name)))
    }

    fn int(text: &str) -> Expression {
        Expression::IntegerLiteral(token(TokenKind::Integer, text))
    }

    fn let_stmt(name: &str, ty: &str, value: Option<Expression>) -> Statement {
        Statement::Let {
            identifier: Identifier::new(token(TokenKind::Identifier, name)),
            data_type: token(TokenKind::IntType, ty),
            value,
        }
    }

    #[test]
    fn test_absent_program_is_one_line() {
        assert_eq!(render_program(None), format!("{}\n", NULL_PROGRAM));
    }

    #[test]
    fn test_absent_expression_is_one_line() {
        assert_eq!(render_expression(None), "NULL Expression\n");
    }

    #[test]
    fn test_absent_statement_is_one_line() {
        assert_eq!(render_statement(None), "NULL Statement\n");
    }

    #[test]
    fn test_let_with_value() {
        let stmt = let_stmt("x", "int", Some(int("5")));
        assert_snapshot!(render_statement(Some(&stmt)), @r"
        Let Statement: x
        Data type: int
          Value: Integer Literal: 5
        ");
    }

    #[test]
    fn test_let_with_value_line_order() {
        let stmt = let_stmt("x", "int", Some(int("5")));
        let output = render_statement(Some(&stmt));
        let lines: Vec<_> = output.lines().collect();

        assert_eq!(lines.len(), 3);
        assert!(lines[0].contains('x'));
        assert!(lines[1].contains("int"));
        assert!(lines[2].contains("Value:") && lines[2].contains('5'));
    }

    #[test]
    fn test_uninitialized_let_has_no_value_line() {
        let stmt = let_stmt("count", "float", None);
        let output = render_statement(Some(&stmt));

        assert_eq!(
            output,
            "Let Statement: count\nData type: float\n  Uninitialized\n"
        );
        assert!(!output.contains("Value:"));
    }

    #[test]
    fn test_literal_kinds() {
        let float = Expression::FloatLiteral(token(TokenKind::Float, "2.5"));
        let string = Expression::StringLiteral(token(TokenKind::String, "hi"));

        assert_eq!(render_expression(Some(&ident("a"))), "Identifier: a\n");
        assert_eq!(render_expression(Some(&int("7"))), "Integer Literal: 7\n");
        assert_eq!(render_expression(Some(&float)), "Floating Literal: 2.5\n");
        assert_eq!(render_expression(Some(&string)), "String literal: hi\n");
    }

    #[test]
    fn test_infix_child_order() {
        let expr = Expression::infix(Some(ident("a")), token(TokenKind::Plus, "+"), Some(int("2")));
        assert_snapshot!(render_expression(Some(&expr)), @r"
        Infix Expression: (Identifier: a
         + Integer Literal: 2
        )
        ");
    }

    #[test]
    fn test_prefix_and_postfix() {
        let prefix = Expression::prefix(token(TokenKind::Minus, "-"), Some(ident("x")));
        let postfix = Expression::postfix(Some(ident("i")), token(TokenKind::Increment, "++"));

        assert_eq!(
            render_expression(Some(&prefix)),
            "Prefix Expression: -(\n\tIdentifier: x\n)"
        );
        assert_eq!(
            render_expression(Some(&postfix)),
            "Postfix Expression: ( Identifier: i\n)++"
        );
    }

    #[test]
    fn test_missing_operands_render_markers() {
        let infix = Expression::infix(None, token(TokenKind::Star, "*"), None);
        let prefix = Expression::prefix(token(TokenKind::Bang, "!"), None);

        assert_eq!(
            render_expression(Some(&infix)),
            "Infix Expression: (NULL Expression\n * NULL Expression\n)"
        );
        assert_eq!(
            render_expression(Some(&prefix)),
            "Prefix Expression: !(\n\tNULL Expression\n)"
        );
    }

    #[test]
    fn test_missing_operand_deep_in_tree() {
        let inner = Expression::postfix(None, token(TokenKind::Decrement, "--"));
        let outer = Expression::infix(Some(int("1")), token(TokenKind::Minus, "-"), Some(inner));
        let output = render_expression(Some(&outer));

        assert_eq!(output.matches(NULL_EXPRESSION).count(), 1);
        assert!(output.ends_with(")--)"));
    }

    #[test]
    fn test_unknown_expression() {
        let expr = Expression::Invalid(token(TokenKind::Illegal, "@"));
        assert_eq!(render_expression(Some(&expr)), "Unknown Expression Type\n");

        let nested = Expression::prefix(token(TokenKind::Minus, "-"), Some(expr));
        assert!(render_expression(Some(&nested)).contains(UNKNOWN_EXPRESSION));
    }

    #[test]
    fn test_unknown_statement() {
        let stmt = Statement::Invalid {
            token: token(TokenKind::Illegal, "#"),
        };
        assert_eq!(render_statement(Some(&stmt)), "Unknown Statement Type\n");
    }

    #[test]
    fn test_if_numbers_body_statements() {
        let stmt = Statement::If {
            condition: Some(ident("x")),
            body: vec![
                Statement::Expression(ident("a")),
                Statement::Expression(ident("b")),
            ],
        };
        let output = render_statement(Some(&stmt));

        let first = output.find("Statement 1:").unwrap();
        let second = output.find("Statement 2:").unwrap();
        assert!(first < second);
        assert!(output.starts_with("If Statement:\n  Condition: Identifier: x\n"));
        assert!(!output.contains("Statement 3:"));
    }

    #[test]
    fn test_if_with_absent_condition() {
        let stmt = Statement::If {
            condition: None,
            body: vec![],
        };
        assert_eq!(
            render_statement(Some(&stmt)),
            "If Statement:\n  Condition: NULL Expression\n\n  If Block:\n"
        );
    }

    #[test]
    fn test_print_chain() {
        let stmt = Statement::Print {
            values: vec![Some(ident("a")), None, Some(int("3"))],
        };
        assert_snapshot!(render_statement(Some(&stmt)), @r"
        Print Statement: (
        Identifier: a
         -> Left expression is NULL
         -> Integer Literal: 3

        )
        ");
    }

    #[test]
    fn test_print_single_absent_value() {
        let stmt = Statement::Print { values: vec![None] };
        let output = render_statement(Some(&stmt));

        assert_eq!(output.matches(NULL_PRINT_VALUE).count(), 1);
        assert!(!output.contains(CHAIN_SEPARATOR));
    }

    #[test]
    fn test_print_empty_values_still_prints_head() {
        let stmt = Statement::Print { values: vec![] };
        assert_eq!(
            render_statement(Some(&stmt)),
            render_statement(Some(&Statement::Print { values: vec![None] }))
        );
    }

    #[test]
    fn test_long_print_chain() {
        const N: usize = 100_000;
        let stmt = Statement::Print {
            values: (0..N).map(|_| Some(ident("v"))).collect(),
        };
        let output = render_statement(Some(&stmt));

        assert_eq!(output.matches("Identifier: v").count(), N);
        assert_eq!(output.matches(CHAIN_SEPARATOR).count(), N - 1);
    }

    #[test]
    fn test_assignment_and_return() {
        let assign = Statement::Assignment {
            identifier: token(TokenKind::Identifier, "y"),
            value: Some(int("1")),
        };
        let ret = Statement::Return { value: None };

        assert_eq!(
            render_statement(Some(&assign)),
            "Assignment Statement: y = Integer Literal: 1\n"
        );
        assert_eq!(
            render_statement(Some(&ret)),
            "Return Statement: NULL Expression\n"
        );
    }

    #[test]
    fn test_program_numbering() {
        let program = Program::new(vec![
            let_stmt("x", "int", None),
            Statement::Expression(ident("x")),
        ]);
        let output = render_program(Some(&program));

        assert!(output.starts_with("Program statements' count 2\nStatement 1:\nLet Statement: x\n"));
        assert!(output.contains("\nStatement 2:\nExpression Statement: Identifier: x\n\n"));
    }

    #[test]
    fn test_token_dump() {
        let tokens = vec![
            token(TokenKind::Identifier, "x"),
            Token::synthetic(TokenKind::Eof, Span::default()),
        ];
        let output = render_tokens(&tokens);
        let lines: Vec<_> = output.lines().collect();
        let banner = "-".repeat(50);

        assert_eq!(lines.len(), 5);
        assert_eq!(lines[0], banner);
        assert!(lines[1].starts_with("Token Type: IDENTIFIER"));
        assert!(lines[1].contains("| Literal: x"));
        assert!(lines[1].ends_with("| Line : 0   Column : 0"));
        assert_eq!(lines[2], "Token 1 has a NULL literal");
        assert_eq!(lines[3], banner);
        assert_eq!(lines[4], END_OF_TOKENS);
    }

    #[test]
    fn test_missing_literal_inside_node() {
        let id = Identifier::new(Token::synthetic(TokenKind::Identifier, Span::default()));
        assert_eq!(
            render_expression(Some(&Expression::Identifier(id))),
            "Identifier: (null)\n"
        );
    }
}
