use std::fmt::Display;
use std::rc::Rc;

use crate::lexer::{Token, TokenKind};

#[derive(Debug, PartialEq, Clone)]
pub enum Statement {
    Let(LetDeclaration),
    Return(ReturnStatement),
    Expression(ExpressionStatement),
    Macro(MacroStatement),
}

#[derive(Debug, PartialEq, Clone)]
pub struct LetDeclaration {
    pub token: Token,
    pub name: Identifier,
    pub value: Expression,
}

#[derive(Debug, PartialEq, Clone)]
pub struct ReturnStatement {
    pub token: Token,
    pub value: Expression,
}

#[derive(Debug, PartialEq, Clone)]
pub struct ExpressionStatement {
    pub token: Token,
    pub expression: Expression,
}

#[derive(Debug, PartialEq, Clone)]
pub struct MacroStatement {
    pub token: Token,
    pub name: Identifier,
    pub parameters: Vec<Identifier>,
    pub body: BlockStatement,
}

#[derive(Debug, PartialEq, Clone)]
pub struct BlockStatement {
    pub token: Token,
    pub statements: Vec<Statement>,
}

#[derive(Debug, PartialEq, Clone, Default)]
pub struct Program {
    pub statements: Vec<Statement>,
}

#[derive(Debug, PartialEq, Clone)]
pub enum Expression {
    Identifier(Identifier),
    Number(NumberLiteral),
    Boolean(BooleanLiteral),
    String(StringLiteral),
    Null(NullLiteral),
    Array(ArrayLiteral),
    Hash(HashLiteral),
    Unary(UnaryExpression),
    Binary(BinaryExpression),
    Logical(LogicalExpression),
    Conditional(ConditionalExpression),
    Function(Rc<FunctionLiteral>),
    Call(CallExpression),
    Assignment(AssignmentExpression),
    Subscript(SubscriptExpression),
    Error(ErrorNode),
}

#[derive(Debug, PartialEq, Clone)]
pub struct Identifier {
    pub token: Token,
    pub name: Rc<str>,
}

#[derive(Debug, PartialEq, Clone)]
pub struct NumberLiteral {
    pub token: Token,
    pub value: f64,
}

#[derive(Debug, PartialEq, Clone)]
pub struct BooleanLiteral {
    pub token: Token,
    pub value: bool,
}

#[derive(Debug, PartialEq, Clone)]
pub struct StringLiteral {
    pub token: Token,
    pub value: Rc<str>,
}

#[derive(Debug, PartialEq, Clone)]
pub struct NullLiteral {
    pub token: Token,
}

#[derive(Debug, PartialEq, Clone)]
pub struct ArrayLiteral {
    pub token: Token,
    pub elements: Vec<Expression>,
}

/// Pairs keep their source order so that evaluation and printing are
/// deterministic.
#[derive(Debug, PartialEq, Clone)]
pub struct HashLiteral {
    pub token: Token,
    pub pairs: Vec<(Expression, Expression)>,
}

#[derive(Debug, PartialEq, Clone)]
pub struct UnaryExpression {
    pub token: Token,
    pub operator: UnaryOperator,
    pub right: Box<Expression>,
}

#[derive(Debug, PartialEq, Clone)]
pub struct BinaryExpression {
    pub token: Token,
    pub operator: BinaryOperator,
    pub left: Box<Expression>,
    pub right: Box<Expression>,
}

#[derive(Debug, PartialEq, Clone)]
pub struct LogicalExpression {
    pub token: Token,
    pub operator: LogicalOperator,
    pub left: Box<Expression>,
    pub right: Box<Expression>,
}

#[derive(Debug, PartialEq, Clone)]
pub struct ConditionalExpression {
    pub token: Token,
    pub condition: Box<Expression>,
    pub consequence: BlockStatement,
    pub alternative: Option<BlockStatement>,
}

#[derive(Debug, PartialEq, Clone)]
pub struct FunctionLiteral {
    pub token: Token,
    pub parameters: Vec<Identifier>,
    pub body: BlockStatement,
}

#[derive(Debug, PartialEq, Clone)]
pub struct CallExpression {
    pub token: Token,
    pub callee: Box<Expression>,
    pub arguments: Vec<Expression>,
}

/// `target` is always an [`Expression::Identifier`] or an
/// [`Expression::Subscript`]; the parser rejects anything else.
#[derive(Debug, PartialEq, Clone)]
pub struct AssignmentExpression {
    pub token: Token,
    pub target: Box<Expression>,
    pub value: Box<Expression>,
}

#[derive(Debug, PartialEq, Clone)]
pub struct SubscriptExpression {
    pub token: Token,
    pub base: Box<Expression>,
    pub subscript: Box<Expression>,
}

/// Sentinel left behind when a rewrite cannot produce a valid node.
/// Evaluating it yields an error carrying `message`.
#[derive(Debug, PartialEq, Clone)]
pub struct ErrorNode {
    pub message: Rc<str>,
}

#[derive(Debug, PartialEq, Clone, Copy)]
pub enum UnaryOperator {
    Minus,
    Bang,
}

#[derive(Debug, PartialEq, Clone, Copy)]
pub enum BinaryOperator {
    Plus,
    Minus,
    Multiply,
    Divide,
    LessThan,
    GreaterThan,
    Equal,
    NotEqual,
}

#[derive(Debug, PartialEq, Clone, Copy)]
pub enum LogicalOperator {
    And,
    Or,
}

/// Any node of the tree. This is the currency of [`crate::modify::modify`]
/// and of the evaluator's entry point.
#[derive(Debug, PartialEq, Clone)]
pub enum Node {
    Program(Program),
    Statement(Statement),
    Block(BlockStatement),
    Expression(Expression),
    Error(ErrorNode),
}

impl Node {
    /// Kind name used in rewrite diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Node::Program(_) => "Program",
            Node::Statement(statement) => statement.kind(),
            Node::Block(_) => "BlockStatement",
            Node::Expression(expression) => expression.kind(),
            Node::Error(_) => "Error",
        }
    }
}

impl Statement {
    pub fn kind(&self) -> &'static str {
        match self {
            Statement::Let(_) => "LetDeclaration",
            Statement::Return(_) => "ReturnStatement",
            Statement::Expression(_) => "ExpressionStatement",
            Statement::Macro(_) => "MacroStatement",
        }
    }
}

impl Expression {
    pub fn kind(&self) -> &'static str {
        use Expression::*;
        match self {
            Identifier(_) => "Identifier",
            Number(_) => "NumberLiteral",
            Boolean(_) => "BooleanLiteral",
            String(_) => "StringLiteral",
            Null(_) => "NullLiteral",
            Array(_) => "ArrayLiteral",
            Hash(_) => "HashLiteral",
            Unary(_) => "UnaryExpression",
            Binary(_) => "BinaryExpression",
            Logical(_) => "LogicalExpression",
            Conditional(_) => "ConditionalExpression",
            Function(_) => "FunctionLiteral",
            Call(_) => "CallExpression",
            Assignment(_) => "AssignmentExpression",
            Subscript(_) => "SubscriptExpression",
            Error(_) => "Error",
        }
    }

    /// The token the node was built from.
    pub fn token(&self) -> Option<&Token> {
        use Expression::*;
        match self {
            Identifier(node) => Some(&node.token),
            Number(node) => Some(&node.token),
            Boolean(node) => Some(&node.token),
            String(node) => Some(&node.token),
            Null(node) => Some(&node.token),
            Array(node) => Some(&node.token),
            Hash(node) => Some(&node.token),
            Unary(node) => Some(&node.token),
            Binary(node) => Some(&node.token),
            Logical(node) => Some(&node.token),
            Conditional(node) => Some(&node.token),
            Function(node) => Some(&node.token),
            Call(node) => Some(&node.token),
            Assignment(node) => Some(&node.token),
            Subscript(node) => Some(&node.token),
            Error(_) => None,
        }
    }

    /// Whether `Display` already wraps this node in parentheses.
    fn is_parenthesized(&self) -> bool {
        matches!(
            self,
            Expression::Unary(_)
                | Expression::Binary(_)
                | Expression::Logical(_)
                | Expression::Assignment(_)
                | Expression::Subscript(_)
        )
    }
}

impl Identifier {
    pub fn new(name: &str) -> Self {
        Identifier {
            token: Token::synthesized(TokenKind::Ident, name),
            name: name.into(),
        }
    }
}

impl NumberLiteral {
    pub fn new(value: f64) -> Self {
        NumberLiteral {
            token: Token::synthesized(TokenKind::Number, &value.to_string()),
            value,
        }
    }
}

impl Expression {
    /// Syntax that evaluates to `value`. Number literals are never negative
    /// or non-finite, so those values are spelled as operations instead.
    pub fn number(value: f64) -> Expression {
        if value.is_nan() {
            Expression::divide(0.0, 0.0)
        } else if value.is_sign_negative() {
            Expression::Unary(UnaryExpression {
                token: Token::synthesized(TokenKind::Minus, "-"),
                operator: UnaryOperator::Minus,
                right: Box::new(Expression::number(-value)),
            })
        } else if value.is_infinite() {
            Expression::divide(1.0, 0.0)
        } else {
            Expression::Number(NumberLiteral::new(value))
        }
    }

    fn divide(left: f64, right: f64) -> Expression {
        Expression::Binary(BinaryExpression {
            token: Token::synthesized(TokenKind::Slash, "/"),
            operator: BinaryOperator::Divide,
            left: Box::new(Expression::Number(NumberLiteral::new(left))),
            right: Box::new(Expression::Number(NumberLiteral::new(right))),
        })
    }
}

impl BooleanLiteral {
    pub fn new(value: bool) -> Self {
        let token = if value {
            Token::synthesized(TokenKind::True, "true")
        } else {
            Token::synthesized(TokenKind::False, "false")
        };
        BooleanLiteral { token, value }
    }
}

impl StringLiteral {
    pub fn new(value: &str) -> Self {
        StringLiteral {
            token: Token::synthesized(TokenKind::String, &format!("\"{}\"", value)),
            value: value.into(),
        }
    }
}

impl NullLiteral {
    pub fn new() -> Self {
        NullLiteral {
            token: Token::synthesized(TokenKind::Null, "null"),
        }
    }
}

impl Default for NullLiteral {
    fn default() -> Self {
        Self::new()
    }
}

impl ErrorNode {
    pub fn new(message: impl Into<Rc<str>>) -> Self {
        ErrorNode {
            message: message.into(),
        }
    }
}

impl UnaryOperator {
    pub fn to_str(&self) -> &'static str {
        match self {
            UnaryOperator::Minus => "-",
            UnaryOperator::Bang => "!",
        }
    }
}

impl BinaryOperator {
    pub fn to_str(&self) -> &'static str {
        use BinaryOperator::*;
        match self {
            Plus => "+",
            Minus => "-",
            Multiply => "*",
            Divide => "/",
            LessThan => "<",
            GreaterThan => ">",
            Equal => "==",
            NotEqual => "!=",
        }
    }
}

impl LogicalOperator {
    pub fn to_str(&self) -> &'static str {
        match self {
            LogicalOperator::And => "and",
            LogicalOperator::Or => "or",
        }
    }
}

fn write_separated<T: Display>(
    f: &mut std::fmt::Formatter<'_>,
    items: impl IntoIterator<Item = T>,
) -> std::fmt::Result {
    for (i, item) in items.into_iter().enumerate() {
        if i > 0 {
            write!(f, ",")?;
        }
        write!(f, "{}", item)?;
    }
    Ok(())
}

impl Display for Program {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for statement in &self.statements {
            write!(f, "{}", statement)?;
        }
        Ok(())
    }
}

impl Display for Statement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Statement::Let(statement) => {
                write!(f, "let {}={};", statement.name, statement.value)
            }
            Statement::Return(statement) => write!(f, "return {};", statement.value),
            Statement::Expression(statement) => write!(f, "{};", statement.expression),
            Statement::Macro(statement) => {
                write!(f, "macro {}(", statement.name)?;
                write_separated(f, &statement.parameters)?;
                write!(f, "){}", statement.body)
            }
        }
    }
}

impl Display for BlockStatement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{{")?;
        for statement in &self.statements {
            write!(f, "{}", statement)?;
        }
        write!(f, "}}")
    }
}

impl Display for Identifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}

impl Display for FunctionLiteral {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "fn(")?;
        write_separated(f, &self.parameters)?;
        write!(f, "){}", self.body)
    }
}

impl Display for Expression {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        use Expression::*;
        match self {
            Identifier(ident) => write!(f, "{}", ident),
            Number(number) => write!(f, "{}", number.token.literal),
            Boolean(boolean) => write!(f, "{}", boolean.value),
            String(string) => write!(f, "\"{}\"", string.value),
            Null(_) => write!(f, "null"),
            Array(array) => {
                write!(f, "[")?;
                write_separated(f, &array.elements)?;
                write!(f, "]")
            }
            Hash(hash) => {
                write!(f, "{{")?;
                write_separated(
                    f,
                    hash.pairs
                        .iter()
                        .map(|(key, value)| format!("{}:{}", key, value)),
                )?;
                write!(f, "}}")
            }
            Unary(unary) => write!(f, "({}{})", unary.operator.to_str(), unary.right),
            Binary(binary) => write!(
                f,
                "({}{}{})",
                binary.left,
                binary.operator.to_str(),
                binary.right
            ),
            Logical(logical) => write!(
                f,
                "({} {} {})",
                logical.left,
                logical.operator.to_str(),
                logical.right
            ),
            Conditional(conditional) => {
                if conditional.condition.is_parenthesized() {
                    write!(f, "if {} {}", conditional.condition, conditional.consequence)?;
                } else {
                    write!(
                        f,
                        "if ({}) {}",
                        conditional.condition, conditional.consequence
                    )?;
                }
                if let Some(alternative) = &conditional.alternative {
                    write!(f, " else {}", alternative)?;
                }
                Ok(())
            }
            Function(function) => write!(f, "{}", function),
            Call(call) => {
                write!(f, "{}(", call.callee)?;
                write_separated(f, &call.arguments)?;
                write!(f, ")")
            }
            Assignment(assignment) => write!(f, "({}={})", assignment.target, assignment.value),
            Subscript(subscript) => write!(f, "({}[{}])", subscript.base, subscript.subscript),
            Error(error) => write!(f, "<error: {}>", error.message),
        }
    }
}

impl Display for Node {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Node::Program(program) => write!(f, "{}", program),
            Node::Statement(statement) => write!(f, "{}", statement),
            Node::Block(block) => write!(f, "{}", block),
            Node::Expression(expression) => write!(f, "{}", expression),
            Node::Error(error) => write!(f, "<error: {}>", error.message),
        }
    }
}
