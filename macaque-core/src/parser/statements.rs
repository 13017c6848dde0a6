use crate::ast::{
    BlockStatement, ExpressionStatement, LetDeclaration, MacroStatement, ReturnStatement,
    Statement,
};
use crate::lexer::TokenKind;
use crate::parser::expressions::{identifier, parse_expression, parse_parameters, ASSIGNMENT_OPERAND};
use crate::parser::{ParseError, Parser};

/// Parses the statement at the cursor. A lone `;` (or a run of them)
/// produces no statement.
pub fn parse_statement(parser: &mut Parser) -> Result<Option<Statement>, ParseError> {
    let statement = match parser.current().kind {
        TokenKind::Let => Statement::Let(parse_let_statement(parser)?),
        TokenKind::Return => Statement::Return(parse_return_statement(parser)?),
        TokenKind::Macro => Statement::Macro(parse_macro_statement(parser)?),
        TokenKind::SemiColon => {
            while parser.peek().kind == TokenKind::SemiColon {
                parser.next();
            }
            return Ok(None);
        }
        _ => Statement::Expression(parse_expression_statement(parser)?),
    };
    Ok(Some(statement))
}

fn parse_let_statement(parser: &mut Parser) -> Result<LetDeclaration, ParseError> {
    tracing::trace!("parse_let_statement");
    let token = parser.current().clone();
    parser.expect_token(TokenKind::Ident)?;
    let name = identifier(parser);
    parser.expect_token(TokenKind::Assign)?;
    parser.next();
    let value = parse_expression(parser, ASSIGNMENT_OPERAND)?;
    parser.skip_if(TokenKind::SemiColon);

    Ok(LetDeclaration { token, name, value })
}

fn parse_return_statement(parser: &mut Parser) -> Result<ReturnStatement, ParseError> {
    tracing::trace!("parse_return_statement");
    let token = parser.current().clone();
    parser.next();
    let value = parse_expression(parser, ASSIGNMENT_OPERAND)?;
    parser.skip_if(TokenKind::SemiColon);

    Ok(ReturnStatement { token, value })
}

fn parse_expression_statement(parser: &mut Parser) -> Result<ExpressionStatement, ParseError> {
    let token = parser.current().clone();
    let expression = parse_expression(parser, ASSIGNMENT_OPERAND)?;
    parser.skip_if(TokenKind::SemiColon);

    Ok(ExpressionStatement { token, expression })
}

fn parse_macro_statement(parser: &mut Parser) -> Result<MacroStatement, ParseError> {
    tracing::trace!("parse_macro_statement");
    let token = parser.current().clone();
    parser.expect_token(TokenKind::Ident)?;
    let name = identifier(parser);
    parser.expect_token(TokenKind::LParen)?;
    let parameters = parse_parameters(parser)?;
    parser.expect_token(TokenKind::LBrace)?;
    let body = parse_block_statement(parser)?;

    Ok(MacroStatement {
        token,
        name,
        parameters,
        body,
    })
}

/// The cursor starts on the `{` and ends on the matching `}`. Errors in
/// inner statements are recorded and parsing of the block continues.
pub fn parse_block_statement(parser: &mut Parser) -> Result<BlockStatement, ParseError> {
    tracing::trace!("parse_block_statement");
    let token = parser.current().clone();
    parser.next();

    let mut statements = Vec::new();
    while !matches!(parser.current().kind, TokenKind::RBrace | TokenKind::Eof) {
        match parse_statement(parser) {
            Ok(Some(statement)) => statements.push(statement),
            Ok(None) => {}
            Err(err) => parser.report(err),
        }
        parser.next();
    }

    if parser.current().kind != TokenKind::RBrace {
        return Err(ParseError::UnterminatedBlock {
            got: parser.current().clone(),
        });
    }

    Ok(BlockStatement { token, statements })
}
