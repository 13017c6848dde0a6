use std::fmt::Display;
use std::rc::Rc;

#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub enum TokenKind {
    Illegal,
    Eof,

    Ident,
    Number,
    String,

    // Operators
    Assign,
    Plus,
    Minus,
    Bang,
    Asterisk,
    Slash,
    LessThan,
    GreaterThan,
    Equal,
    NotEqual,

    // Delimiters
    Comma,
    SemiColon,
    Colon,
    LParen,
    RParen,
    LBrace,
    RBrace,
    LBracket,
    RBracket,

    // Keywords
    Function,
    Let,
    True,
    False,
    If,
    Else,
    Return,
    Null,
    And,
    Or,
    Macro,
}

impl TokenKind {
    /// Name used in diagnostics, e.g. `expected next token to be <ASSIGN>`.
    pub fn name(&self) -> &'static str {
        use TokenKind::*;
        match self {
            Illegal => "ILLEGAL",
            Eof => "EOF",
            Ident => "IDENT",
            Number => "NUMBER",
            String => "STRING",
            Assign => "ASSIGN",
            Plus => "PLUS",
            Minus => "MINUS",
            Bang => "BANG",
            Asterisk => "STAR",
            Slash => "SLASH",
            LessThan => "LT",
            GreaterThan => "GT",
            Equal => "EQ",
            NotEqual => "NOT_EQ",
            Comma => "COMMA",
            SemiColon => "SEMI",
            Colon => "COLON",
            LParen => "LPAREN",
            RParen => "RPAREN",
            LBrace => "LBRACE",
            RBrace => "RBRACE",
            LBracket => "LBRACK",
            RBracket => "RBRACK",
            Function => "FN",
            Let => "LET",
            True => "TRUE",
            False => "FALSE",
            If => "IF",
            Else => "ELSE",
            Return => "RETURN",
            Null => "NULL",
            And => "AND",
            Or => "OR",
            Macro => "MACRO",
        }
    }
}

impl Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Token {
    pub kind: TokenKind,
    pub literal: Rc<str>,
    pub start: usize,
    pub end: usize,
}

impl Token {
    /// A token that did not come from source text, e.g. one built for a
    /// node produced during macro expansion.
    pub fn synthesized(kind: TokenKind, literal: &str) -> Self {
        Token {
            kind,
            literal: literal.into(),
            start: 0,
            end: 0,
        }
    }
}

fn keywords(ident: &str) -> Option<TokenKind> {
    match ident {
        "fn" => Some(TokenKind::Function),
        "let" => Some(TokenKind::Let),
        "true" => Some(TokenKind::True),
        "false" => Some(TokenKind::False),
        "if" => Some(TokenKind::If),
        "else" => Some(TokenKind::Else),
        "return" => Some(TokenKind::Return),
        "null" => Some(TokenKind::Null),
        "and" => Some(TokenKind::And),
        "or" => Some(TokenKind::Or),
        "macro" => Some(TokenKind::Macro),
        _ => None,
    }
}

/// Produces tokens until the input is exhausted. The final token is always
/// a single `Eof`; after it the iterator returns `None`.
#[derive(Clone)]
pub struct Tokenizer<'a> {
    input: &'a str,
    iter: std::iter::Peekable<std::str::CharIndices<'a>>,
    finished: bool,
}

impl<'a> Tokenizer<'a> {
    pub fn new(input: &'a str) -> Self {
        let iter = input.char_indices().peekable();
        Self {
            input,
            iter,
            finished: false,
        }
    }

    fn is_letter(ch: char) -> bool {
        ch.is_ascii_alphabetic() || ch == '_'
    }

    fn token(&mut self, kind: TokenKind, start: usize) -> Token {
        let end = self.next_idx();
        Token {
            kind,
            literal: self.input[start..end].into(),
            start,
            end,
        }
    }

    fn read_identifier(&mut self, start: usize) -> Token {
        while self
            .iter
            .next_if(|(_, ch)| Self::is_letter(*ch) || ch.is_ascii_digit())
            .is_some()
        {}

        let end = self.next_idx();
        let ident = &self.input[start..end];
        self.token(keywords(ident).unwrap_or(TokenKind::Ident), start)
    }

    fn read_number(&mut self, start: usize) -> Token {
        while self.iter.next_if(|(_, ch)| ch.is_ascii_digit()).is_some() {}

        if self.iter.next_if(|(_, ch)| *ch == '.').is_some() {
            // a fraction needs at least one digit after the dot
            if self.iter.peek().map_or(true, |(_, ch)| !ch.is_ascii_digit()) {
                return self.token(TokenKind::Illegal, start);
            }
            while self.iter.next_if(|(_, ch)| ch.is_ascii_digit()).is_some() {}
        }

        self.token(TokenKind::Number, start)
    }

    fn read_string(&mut self, start: usize) -> Token {
        loop {
            match self.iter.next() {
                Some((_, '"')) => break,
                None => return self.token(TokenKind::Illegal, start),
                _ => {}
            }
        }

        self.token(TokenKind::String, start)
    }

    fn next_idx(&mut self) -> usize {
        self.iter
            .peek()
            .map(|(idx, _)| *idx)
            .unwrap_or(self.input.len())
    }
}

impl<'a> Iterator for Tokenizer<'a> {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        if self.finished {
            return None;
        }
        while self.iter.next_if(|(_, ch)| ch.is_whitespace()).is_some() {}

        let Some((idx, ch)) = self.iter.next() else {
            self.finished = true;
            let end = self.input.len();
            return Some(Token {
                kind: TokenKind::Eof,
                literal: "".into(),
                start: end,
                end,
            });
        };

        let tok = match ch {
            '=' => {
                if self.iter.next_if(|(_, ch)| *ch == '=').is_some() {
                    self.token(TokenKind::Equal, idx)
                } else {
                    self.token(TokenKind::Assign, idx)
                }
            }
            '!' => {
                if self.iter.next_if(|(_, ch)| *ch == '=').is_some() {
                    self.token(TokenKind::NotEqual, idx)
                } else {
                    self.token(TokenKind::Bang, idx)
                }
            }
            '+' => self.token(TokenKind::Plus, idx),
            '-' => self.token(TokenKind::Minus, idx),
            '*' => self.token(TokenKind::Asterisk, idx),
            '/' => self.token(TokenKind::Slash, idx),
            '<' => self.token(TokenKind::LessThan, idx),
            '>' => self.token(TokenKind::GreaterThan, idx),
            ',' => self.token(TokenKind::Comma, idx),
            ';' => self.token(TokenKind::SemiColon, idx),
            ':' => self.token(TokenKind::Colon, idx),
            '(' => self.token(TokenKind::LParen, idx),
            ')' => self.token(TokenKind::RParen, idx),
            '{' => self.token(TokenKind::LBrace, idx),
            '}' => self.token(TokenKind::RBrace, idx),
            '[' => self.token(TokenKind::LBracket, idx),
            ']' => self.token(TokenKind::RBracket, idx),
            '"' => self.read_string(idx),
            c if Tokenizer::is_letter(c) => self.read_identifier(idx),
            c if c.is_ascii_digit() => self.read_number(idx),
            _ => self.token(TokenKind::Illegal, idx),
        };
        Some(tok)
    }
}

/// Buffered view over a [`Tokenizer`] giving the parser indexable
/// lookahead. Once the end is reached `current` keeps returning `Eof`.
pub struct TokenStream<'a> {
    tokenizer: Tokenizer<'a>,
    buffer: std::collections::VecDeque<Token>,
}

impl<'a> TokenStream<'a> {
    pub fn new(input: &'a str) -> Self {
        let mut stream = TokenStream {
            tokenizer: Tokenizer::new(input),
            buffer: std::collections::VecDeque::new(),
        };
        stream.fill(0);
        stream
    }

    fn fill(&mut self, n: usize) {
        while self.buffer.len() <= n {
            match self.tokenizer.next() {
                Some(token) => self.buffer.push_back(token),
                None => {
                    let eof = self
                        .buffer
                        .back()
                        .cloned()
                        .unwrap_or_else(|| Token::synthesized(TokenKind::Eof, ""));
                    self.buffer.push_back(eof);
                }
            }
        }
    }

    pub fn current(&self) -> &Token {
        &self.buffer[0]
    }

    /// Token `n` positions past the current one; `lookahead(0)` is `current`.
    pub fn lookahead(&mut self, n: usize) -> &Token {
        self.fill(n);
        &self.buffer[n]
    }

    pub fn advance(&mut self) {
        if self.current().kind == TokenKind::Eof {
            return;
        }
        self.buffer.pop_front();
        self.fill(0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(input: &str) -> Vec<TokenKind> {
        Tokenizer::new(input).map(|token| token.kind).collect()
    }

    #[test]
    fn test_single_characters() {
        let input = "=+(){},;";
        let output = Tokenizer::new(input).collect::<Vec<_>>();

        assert_eq!(
            output[..3],
            [
                Token {
                    kind: TokenKind::Assign,
                    literal: "=".into(),
                    start: 0,
                    end: 1
                },
                Token {
                    kind: TokenKind::Plus,
                    literal: "+".into(),
                    start: 1,
                    end: 2
                },
                Token {
                    kind: TokenKind::LParen,
                    literal: "(".into(),
                    start: 2,
                    end: 3
                },
            ]
        );
        assert_eq!(
            output.iter().map(|token| token.kind).collect::<Vec<_>>(),
            vec![
                TokenKind::Assign,
                TokenKind::Plus,
                TokenKind::LParen,
                TokenKind::RParen,
                TokenKind::LBrace,
                TokenKind::RBrace,
                TokenKind::Comma,
                TokenKind::SemiColon,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_program() {
        let input = "let five = 5;
    let add = fn(x, y) {
    x + y;
    };
    let result = add(five, 10.5);
    ";
        let expected_output = vec![
            TokenKind::Let,
            TokenKind::Ident,
            TokenKind::Assign,
            TokenKind::Number,
            TokenKind::SemiColon,
            TokenKind::Let,
            TokenKind::Ident,
            TokenKind::Assign,
            TokenKind::Function,
            TokenKind::LParen,
            TokenKind::Ident,
            TokenKind::Comma,
            TokenKind::Ident,
            TokenKind::RParen,
            TokenKind::LBrace,
            TokenKind::Ident,
            TokenKind::Plus,
            TokenKind::Ident,
            TokenKind::SemiColon,
            TokenKind::RBrace,
            TokenKind::SemiColon,
            TokenKind::Let,
            TokenKind::Ident,
            TokenKind::Assign,
            TokenKind::Ident,
            TokenKind::LParen,
            TokenKind::Ident,
            TokenKind::Comma,
            TokenKind::Number,
            TokenKind::RParen,
            TokenKind::SemiColon,
            TokenKind::Eof,
        ];

        assert_eq!(kinds(input), expected_output)
    }

    #[test]
    fn test_operators_and_keywords() {
        let input = "!-/*5; 5 < 10 > 5; 10 == 10; 10 != 9; a and b or c; macro m() {}";

        assert_eq!(
            kinds(input),
            vec![
                TokenKind::Bang,
                TokenKind::Minus,
                TokenKind::Slash,
                TokenKind::Asterisk,
                TokenKind::Number,
                TokenKind::SemiColon,
                TokenKind::Number,
                TokenKind::LessThan,
                TokenKind::Number,
                TokenKind::GreaterThan,
                TokenKind::Number,
                TokenKind::SemiColon,
                TokenKind::Number,
                TokenKind::Equal,
                TokenKind::Number,
                TokenKind::SemiColon,
                TokenKind::Number,
                TokenKind::NotEqual,
                TokenKind::Number,
                TokenKind::SemiColon,
                TokenKind::Ident,
                TokenKind::And,
                TokenKind::Ident,
                TokenKind::Or,
                TokenKind::Ident,
                TokenKind::SemiColon,
                TokenKind::Macro,
                TokenKind::Ident,
                TokenKind::LParen,
                TokenKind::RParen,
                TokenKind::LBrace,
                TokenKind::RBrace,
                TokenKind::Eof,
            ]
        )
    }

    #[test]
    fn test_literals() {
        let tokens = Tokenizer::new(r#""foo bar" [1, 2] {"a": 1} x_1 3.25"#).collect::<Vec<_>>();
        let literals = tokens
            .iter()
            .map(|token| token.literal.as_ref())
            .collect::<Vec<_>>();

        assert_eq!(
            literals,
            vec![
                "\"foo bar\"",
                "[",
                "1",
                ",",
                "2",
                "]",
                "{",
                "\"a\"",
                ":",
                "1",
                "}",
                "x_1",
                "3.25",
                ""
            ]
        );
        assert_eq!(tokens[0].kind, TokenKind::String);
        assert_eq!(tokens[12].kind, TokenKind::Number);
    }

    #[test]
    fn test_illegal_tokens() {
        assert_eq!(
            kinds("\"open"),
            vec![TokenKind::Illegal, TokenKind::Eof]
        );
        assert_eq!(kinds("1."), vec![TokenKind::Illegal, TokenKind::Eof]);
        assert_eq!(
            kinds("@ 1"),
            vec![TokenKind::Illegal, TokenKind::Number, TokenKind::Eof]
        );
    }

    #[test]
    fn test_token_stream_lookahead() {
        let mut stream = TokenStream::new("let x");
        assert_eq!(stream.current().kind, TokenKind::Let);
        assert_eq!(stream.lookahead(1).kind, TokenKind::Ident);
        assert_eq!(stream.lookahead(2).kind, TokenKind::Eof);
        assert_eq!(stream.lookahead(5).kind, TokenKind::Eof);

        stream.advance();
        assert_eq!(stream.current().literal.as_ref(), "x");
        stream.advance();
        stream.advance();
        assert_eq!(stream.current().kind, TokenKind::Eof);
    }
}
