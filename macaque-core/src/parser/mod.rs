pub mod error;
pub mod expressions;
pub mod statements;

use crate::ast::Program;
use crate::lexer::{Token, TokenKind, TokenStream};
pub use error::ParseError;
use statements::parse_statement;

/// Parses `input` into a program, continuing past recoverable errors.
/// The program is only meaningful when the returned error list is empty.
pub fn parse(input: &str) -> (Program, Vec<ParseError>) {
    let mut parser = Parser::new(input);
    let program = parser.parse_program();
    (program, parser.errors)
}

/// Cursor over the token stream. The parse functions leave the cursor on
/// the last token of the construct they consumed; the caller decides
/// whether to step past it.
pub struct Parser<'a> {
    tokens: TokenStream<'a>,
    errors: Vec<ParseError>,
}

impl<'a> Parser<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            tokens: TokenStream::new(input),
            errors: Vec::new(),
        }
    }

    pub(crate) fn current(&self) -> &Token {
        self.tokens.current()
    }

    pub(crate) fn peek(&mut self) -> &Token {
        self.tokens.lookahead(1)
    }

    pub(crate) fn next(&mut self) {
        self.tokens.advance()
    }

    /// Steps onto the next token only if it has the expected kind.
    pub(crate) fn expect_token(&mut self, kind: TokenKind) -> Result<(), ParseError> {
        if self.peek().kind == kind {
            self.next();
            Ok(())
        } else {
            Err(ParseError::unexpected_token(kind, self.peek()))
        }
    }

    pub(crate) fn skip_if(&mut self, kind: TokenKind) {
        if self.peek().kind == kind {
            self.next();
        }
    }

    pub(crate) fn report(&mut self, error: ParseError) {
        tracing::trace!(%error, "parse error");
        self.errors.push(error);
    }

    pub fn parse_program(&mut self) -> Program {
        tracing::trace!("parse_program");
        let mut statements = Vec::new();

        while self.current().kind != TokenKind::Eof {
            match parse_statement(self) {
                Ok(Some(statement)) => statements.push(statement),
                Ok(None) => {}
                Err(err) => self.report(err),
            }
            self.next();
        }

        Program { statements }
    }
}
