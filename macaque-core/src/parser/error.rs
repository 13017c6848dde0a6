use crate::lexer::{Token, TokenKind};

#[derive(Debug, PartialEq, Clone, thiserror::Error)]
pub enum ParseError {
    #[error("expected next token to be <{expected}> but was <{}>", .got.kind)]
    UnexpectedToken { expected: TokenKind, got: Token },
    #[error("expected token to be <RBRACE> but was <{}>", .got.kind)]
    UnterminatedBlock { got: Token },
    #[error("no prefix parse function defined for {}", .0.kind)]
    NoPrefixFunction(Token),
    #[error("unexpected lvalue type <{kind}>")]
    InvalidAssignmentTarget { kind: &'static str, token: Token },
    #[error("illegal token: <{}>", .0.literal)]
    IllegalToken(Token),
    #[error("cannot parse float {:?}", .0.literal.as_ref())]
    InvalidNumber(Token),
}

impl ParseError {
    pub fn unexpected_token(expected: TokenKind, got: &Token) -> Self {
        ParseError::UnexpectedToken {
            expected,
            got: got.clone(),
        }
    }
}
