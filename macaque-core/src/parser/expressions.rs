use std::rc::Rc;

use super::error::ParseError;
use super::statements::parse_block_statement;
use super::Parser;
use crate::ast::{
    ArrayLiteral, AssignmentExpression, BinaryExpression, BinaryOperator, BooleanLiteral,
    CallExpression, ConditionalExpression, Expression, FunctionLiteral, HashLiteral, Identifier,
    LogicalExpression, LogicalOperator, NullLiteral, NumberLiteral, StringLiteral,
    SubscriptExpression, UnaryExpression, UnaryOperator,
};
use crate::lexer::TokenKind;
use crate::stack::ensure_sufficient_stack;

#[derive(PartialOrd, PartialEq, Debug, Clone, Copy)]
pub enum Precedence {
    None = 0,
    Assignment,
    Or,
    And,
    Equality,
    Comparison,
    Term,
    Factor,
    Unary,
    Call,
    Subscript,
}

/// Binding power for operands that may themselves be assignments. Anything
/// above `None` keeps extending the expression, so `a = b = c` nests to the
/// right.
pub const ASSIGNMENT_OPERAND: Precedence = Precedence::None;

type PrefixFn = fn(&mut Parser<'_>) -> Result<Expression, ParseError>;
type InfixFn = fn(&mut Parser<'_>, Expression) -> Result<Expression, ParseError>;

pub struct ParseRule {
    pub prefix: Option<PrefixFn>,
    pub infix: Option<InfixFn>,
    pub precedence: Precedence,
}

impl ParseRule {
    fn new(prefix: Option<PrefixFn>, infix: Option<InfixFn>, precedence: Precedence) -> Self {
        ParseRule {
            prefix,
            infix,
            precedence,
        }
    }
}

pub fn rule_of(kind: TokenKind) -> ParseRule {
    use Precedence as P;
    use TokenKind::*;
    match kind {
        Illegal => ParseRule::new(Some(report_illegal_token), None, P::None),
        Ident => ParseRule::new(Some(parse_identifier), None, P::None),
        Number => ParseRule::new(Some(parse_number_literal), None, P::None),
        String => ParseRule::new(Some(parse_string_literal), None, P::None),
        Assign => ParseRule::new(None, Some(parse_assignment_expression), P::Assignment),
        Plus => ParseRule::new(None, Some(parse_binary_expression), P::Term),
        Minus => ParseRule::new(
            Some(parse_unary_expression),
            Some(parse_binary_expression),
            P::Term,
        ),
        Bang => ParseRule::new(Some(parse_unary_expression), None, P::None),
        Asterisk | Slash => ParseRule::new(None, Some(parse_binary_expression), P::Factor),
        LessThan | GreaterThan => {
            ParseRule::new(None, Some(parse_binary_expression), P::Comparison)
        }
        Equal | NotEqual => ParseRule::new(None, Some(parse_binary_expression), P::Equality),
        LParen => ParseRule::new(
            Some(parse_grouping_expression),
            Some(parse_call_expression),
            P::Call,
        ),
        LBrace => ParseRule::new(Some(parse_hash_literal), None, P::None),
        LBracket => ParseRule::new(
            Some(parse_array_literal),
            Some(parse_subscript_expression),
            P::Subscript,
        ),
        Function => ParseRule::new(Some(parse_function_literal), None, P::None),
        True | False => ParseRule::new(Some(parse_boolean_literal), None, P::None),
        If => ParseRule::new(Some(parse_if_expression), None, P::None),
        Null => ParseRule::new(Some(parse_null_literal), None, P::None),
        Or => ParseRule::new(None, Some(parse_logical_expression), P::Or),
        And => ParseRule::new(None, Some(parse_logical_expression), P::And),
        Eof | Comma | SemiColon | Colon | RParen | RBrace | RBracket | Let | Else | Return
        | Macro => ParseRule::new(None, None, P::None),
    }
}

/// Parses the expression starting at the current token, absorbing infix
/// operators that bind tighter than `precedence`. Leaves the cursor on the
/// expression's last token.
pub fn parse_expression(
    parser: &mut Parser,
    precedence: Precedence,
) -> Result<Expression, ParseError> {
    ensure_sufficient_stack(|| {
        tracing::trace!(token = %parser.current().kind, ?precedence, "parse_expression");
        let Some(prefix) = rule_of(parser.current().kind).prefix else {
            return Err(ParseError::NoPrefixFunction(parser.current().clone()));
        };
        let mut left = prefix(parser)?;

        while precedence < rule_of(parser.peek().kind).precedence {
            parser.next();

            let Some(infix) = rule_of(parser.current().kind).infix else {
                return Ok(left);
            };
            left = infix(parser, left)?;
        }

        Ok(left)
    })
}

fn report_illegal_token(parser: &mut Parser) -> Result<Expression, ParseError> {
    Err(ParseError::IllegalToken(parser.current().clone()))
}

pub(crate) fn parse_identifier(parser: &mut Parser) -> Result<Expression, ParseError> {
    Ok(Expression::Identifier(identifier(parser)))
}

pub(crate) fn identifier(parser: &Parser) -> Identifier {
    let token = parser.current().clone();
    Identifier {
        name: token.literal.clone(),
        token,
    }
}

fn parse_number_literal(parser: &mut Parser) -> Result<Expression, ParseError> {
    let token = parser.current().clone();
    let value = token
        .literal
        .parse::<f64>()
        .map_err(|_| ParseError::InvalidNumber(token.clone()))?;
    Ok(Expression::Number(NumberLiteral { token, value }))
}

fn parse_string_literal(parser: &mut Parser) -> Result<Expression, ParseError> {
    let token = parser.current().clone();
    // the literal keeps its surrounding quotes
    let value: Rc<str> = token.literal[1..token.literal.len() - 1].into();
    Ok(Expression::String(StringLiteral { token, value }))
}

fn parse_boolean_literal(parser: &mut Parser) -> Result<Expression, ParseError> {
    let token = parser.current().clone();
    Ok(Expression::Boolean(BooleanLiteral {
        value: token.kind == TokenKind::True,
        token,
    }))
}

fn parse_null_literal(parser: &mut Parser) -> Result<Expression, ParseError> {
    Ok(Expression::Null(NullLiteral {
        token: parser.current().clone(),
    }))
}

fn parse_grouping_expression(parser: &mut Parser) -> Result<Expression, ParseError> {
    parser.next();
    let expression = parse_expression(parser, ASSIGNMENT_OPERAND)?;
    parser.expect_token(TokenKind::RParen)?;

    Ok(expression)
}

fn parse_unary_expression(parser: &mut Parser) -> Result<Expression, ParseError> {
    let token = parser.current().clone();
    let operator = match token.kind {
        TokenKind::Bang => UnaryOperator::Bang,
        _ => UnaryOperator::Minus,
    };
    parser.next();
    let right = parse_expression(parser, Precedence::Unary)?;

    Ok(Expression::Unary(UnaryExpression {
        token,
        operator,
        right: Box::new(right),
    }))
}

fn parse_binary_expression(
    parser: &mut Parser,
    left: Expression,
) -> Result<Expression, ParseError> {
    let token = parser.current().clone();
    let operator = match token.kind {
        TokenKind::Plus => BinaryOperator::Plus,
        TokenKind::Minus => BinaryOperator::Minus,
        TokenKind::Asterisk => BinaryOperator::Multiply,
        TokenKind::Slash => BinaryOperator::Divide,
        TokenKind::LessThan => BinaryOperator::LessThan,
        TokenKind::GreaterThan => BinaryOperator::GreaterThan,
        TokenKind::Equal => BinaryOperator::Equal,
        _ => BinaryOperator::NotEqual,
    };
    let precedence = rule_of(token.kind).precedence;
    parser.next();
    let right = parse_expression(parser, precedence)?;

    Ok(Expression::Binary(BinaryExpression {
        token,
        operator,
        left: Box::new(left),
        right: Box::new(right),
    }))
}

fn parse_logical_expression(
    parser: &mut Parser,
    left: Expression,
) -> Result<Expression, ParseError> {
    let token = parser.current().clone();
    let operator = match token.kind {
        TokenKind::And => LogicalOperator::And,
        _ => LogicalOperator::Or,
    };
    let precedence = rule_of(token.kind).precedence;
    parser.next();
    let right = parse_expression(parser, precedence)?;

    Ok(Expression::Logical(LogicalExpression {
        token,
        operator,
        left: Box::new(left),
        right: Box::new(right),
    }))
}

fn parse_assignment_expression(
    parser: &mut Parser,
    target: Expression,
) -> Result<Expression, ParseError> {
    let token = parser.current().clone();
    if !matches!(target, Expression::Identifier(_) | Expression::Subscript(_)) {
        return Err(ParseError::InvalidAssignmentTarget {
            kind: target.kind(),
            token,
        });
    }
    parser.next();
    let value = parse_expression(parser, ASSIGNMENT_OPERAND)?;

    Ok(Expression::Assignment(AssignmentExpression {
        token,
        target: Box::new(target),
        value: Box::new(value),
    }))
}

fn parse_if_expression(parser: &mut Parser) -> Result<Expression, ParseError> {
    tracing::trace!("parse_if_expression");
    let token = parser.current().clone();
    parser.expect_token(TokenKind::LParen)?;
    parser.next();
    let condition = parse_expression(parser, ASSIGNMENT_OPERAND)?;
    parser.expect_token(TokenKind::RParen)?;

    parser.expect_token(TokenKind::LBrace)?;
    let consequence = parse_block_statement(parser)?;

    let alternative = if parser.peek().kind == TokenKind::Else {
        parser.next();
        parser.expect_token(TokenKind::LBrace)?;
        Some(parse_block_statement(parser)?)
    } else {
        None
    };

    Ok(Expression::Conditional(ConditionalExpression {
        token,
        condition: Box::new(condition),
        consequence,
        alternative,
    }))
}

fn parse_function_literal(parser: &mut Parser) -> Result<Expression, ParseError> {
    tracing::trace!("parse_function_literal");
    let token = parser.current().clone();
    parser.expect_token(TokenKind::LParen)?;
    let parameters = parse_parameters(parser)?;

    parser.expect_token(TokenKind::LBrace)?;
    let body = parse_block_statement(parser)?;

    Ok(Expression::Function(Rc::new(FunctionLiteral {
        token,
        parameters,
        body,
    })))
}

fn parse_call_expression(
    parser: &mut Parser,
    callee: Expression,
) -> Result<Expression, ParseError> {
    let token = parser.current().clone();
    let arguments = parse_sequence(parser, TokenKind::RParen, |parser| {
        parse_expression(parser, ASSIGNMENT_OPERAND)
    })?;

    Ok(Expression::Call(CallExpression {
        token,
        callee: Box::new(callee),
        arguments,
    }))
}

fn parse_subscript_expression(
    parser: &mut Parser,
    base: Expression,
) -> Result<Expression, ParseError> {
    let token = parser.current().clone();
    parser.next();
    let subscript = parse_expression(parser, ASSIGNMENT_OPERAND)?;
    parser.expect_token(TokenKind::RBracket)?;

    Ok(Expression::Subscript(SubscriptExpression {
        token,
        base: Box::new(base),
        subscript: Box::new(subscript),
    }))
}

fn parse_array_literal(parser: &mut Parser) -> Result<Expression, ParseError> {
    let token = parser.current().clone();
    let elements = parse_sequence(parser, TokenKind::RBracket, |parser| {
        parse_expression(parser, ASSIGNMENT_OPERAND)
    })?;

    Ok(Expression::Array(ArrayLiteral { token, elements }))
}

/// Unlike the other lists, a hash literal stops at its first missing
/// separator with a single diagnostic.
fn parse_hash_literal(parser: &mut Parser) -> Result<Expression, ParseError> {
    let token = parser.current().clone();
    let mut pairs = Vec::new();

    while parser.peek().kind != TokenKind::RBrace {
        if !pairs.is_empty() {
            parser.expect_token(TokenKind::Comma)?;
        }
        parser.next();
        let key = parse_expression(parser, ASSIGNMENT_OPERAND)?;
        parser.expect_token(TokenKind::Colon)?;
        parser.next();
        let value = parse_expression(parser, ASSIGNMENT_OPERAND)?;
        pairs.push((key, value));
    }
    parser.expect_token(TokenKind::RBrace)?;

    Ok(Expression::Hash(HashLiteral { token, pairs }))
}

/// Parameter list of a function or macro; the cursor starts on the `(`.
pub(crate) fn parse_parameters(parser: &mut Parser) -> Result<Vec<Identifier>, ParseError> {
    parse_sequence(parser, TokenKind::RParen, |parser| {
        if parser.current().kind != TokenKind::Ident {
            return Err(ParseError::unexpected_token(
                TokenKind::Ident,
                parser.current(),
            ));
        }
        Ok(identifier(parser))
    })
}

/// Comma separated elements up to `terminator`. The cursor starts on the
/// opening delimiter and ends on the terminator. Each element is parsed
/// with the cursor on its first token. A missing separator is reported
/// before the missing terminator, so `[1, 2` yields both diagnostics.
fn parse_sequence<T>(
    parser: &mut Parser,
    terminator: TokenKind,
    parse_element: impl Fn(&mut Parser) -> Result<T, ParseError>,
) -> Result<Vec<T>, ParseError> {
    let mut elements = Vec::new();

    if parser.peek().kind != terminator {
        parser.next();
        elements.push(parse_element(parser)?);

        while parser.peek().kind != terminator {
            if let Err(error) = parser.expect_token(TokenKind::Comma) {
                parser.report(error);
                break;
            }
            parser.next();
            elements.push(parse_element(parser)?);
        }
    }
    parser.expect_token(terminator)?;

    Ok(elements)
}
