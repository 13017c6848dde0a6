//! Structural rewriting of the syntax tree.
//!
//! [`modify`] rebuilds a node bottom-up: every child is rewritten first,
//! then the modifier is applied to the rebuilt parent. A child that comes
//! back as a different category than its slot accepts (say, a statement
//! where an expression belongs) turns the parent into a [`Node::Error`],
//! and an error produced anywhere below is passed up unchanged.

use std::rc::Rc;

use crate::ast::{BlockStatement, ErrorNode, Expression, Identifier, Node, Statement};
use crate::stack::ensure_sufficient_stack;

type Modifier<'m> = &'m mut dyn FnMut(Node) -> Node;

pub fn modify(node: Node, modifier: Modifier<'_>) -> Node {
    ensure_sufficient_stack(|| match rebuild(node, modifier) {
        Ok(node) => modifier(node),
        Err(error) => error,
    })
}

fn mismatch(expected: &str, actual: Node) -> Node {
    match actual {
        Node::Error(_) => actual,
        _ => Node::Error(ErrorNode::new(format!(
            "unexpected node kind, expected: <{}> but was: <{}>",
            expected,
            actual.kind()
        ))),
    }
}

fn rebuild(node: Node, modifier: Modifier<'_>) -> Result<Node, Node> {
    match node {
        Node::Program(mut program) => {
            program.statements = modify_statements(program.statements, modifier)?;
            Ok(Node::Program(program))
        }
        Node::Statement(statement) => Ok(Node::Statement(rebuild_statement(statement, modifier)?)),
        Node::Block(mut block) => {
            block.statements = modify_statements(block.statements, modifier)?;
            Ok(Node::Block(block))
        }
        Node::Expression(expression) => {
            Ok(Node::Expression(rebuild_expression(expression, modifier)?))
        }
        Node::Error(_) => Err(node),
    }
}

fn rebuild_statement(statement: Statement, modifier: Modifier<'_>) -> Result<Statement, Node> {
    Ok(match statement {
        Statement::Let(mut declaration) => {
            declaration.name = modify_identifier(declaration.name, modifier)?;
            declaration.value = modify_expression(declaration.value, modifier)?;
            Statement::Let(declaration)
        }
        Statement::Return(mut statement) => {
            statement.value = modify_expression(statement.value, modifier)?;
            Statement::Return(statement)
        }
        Statement::Expression(mut statement) => {
            statement.expression = modify_expression(statement.expression, modifier)?;
            Statement::Expression(statement)
        }
        Statement::Macro(mut statement) => {
            statement.parameters = modify_identifiers(statement.parameters, modifier)?;
            statement.body = modify_block(statement.body, modifier)?;
            Statement::Macro(statement)
        }
    })
}

fn rebuild_expression(expression: Expression, modifier: Modifier<'_>) -> Result<Expression, Node> {
    Ok(match expression {
        Expression::Array(mut array) => {
            array.elements = modify_expressions(array.elements, modifier)?;
            Expression::Array(array)
        }
        Expression::Hash(mut hash) => {
            let mut pairs = Vec::with_capacity(hash.pairs.len());
            for (key, value) in hash.pairs {
                let key = modify_expression(key, modifier)?;
                let value = modify_expression(value, modifier)?;
                pairs.push((key, value));
            }
            hash.pairs = pairs;
            Expression::Hash(hash)
        }
        Expression::Unary(mut unary) => {
            unary.right = modify_boxed(unary.right, modifier)?;
            Expression::Unary(unary)
        }
        Expression::Binary(mut binary) => {
            binary.left = modify_boxed(binary.left, modifier)?;
            binary.right = modify_boxed(binary.right, modifier)?;
            Expression::Binary(binary)
        }
        Expression::Logical(mut logical) => {
            logical.left = modify_boxed(logical.left, modifier)?;
            logical.right = modify_boxed(logical.right, modifier)?;
            Expression::Logical(logical)
        }
        Expression::Conditional(mut conditional) => {
            conditional.condition = modify_boxed(conditional.condition, modifier)?;
            conditional.consequence = modify_block(conditional.consequence, modifier)?;
            conditional.alternative = match conditional.alternative {
                Some(alternative) => Some(modify_block(alternative, modifier)?),
                None => None,
            };
            Expression::Conditional(conditional)
        }
        Expression::Function(function) => {
            let mut function = Rc::unwrap_or_clone(function);
            function.parameters = modify_identifiers(function.parameters, modifier)?;
            function.body = modify_block(function.body, modifier)?;
            Expression::Function(Rc::new(function))
        }
        Expression::Call(mut call) => {
            call.callee = modify_boxed(call.callee, modifier)?;
            call.arguments = modify_expressions(call.arguments, modifier)?;
            Expression::Call(call)
        }
        Expression::Assignment(mut assignment) => {
            assignment.target = modify_boxed(assignment.target, modifier)?;
            assignment.value = modify_boxed(assignment.value, modifier)?;
            Expression::Assignment(assignment)
        }
        Expression::Subscript(mut subscript) => {
            subscript.base = modify_boxed(subscript.base, modifier)?;
            subscript.subscript = modify_boxed(subscript.subscript, modifier)?;
            Expression::Subscript(subscript)
        }
        leaf @ (Expression::Identifier(_)
        | Expression::Number(_)
        | Expression::Boolean(_)
        | Expression::String(_)
        | Expression::Null(_)
        | Expression::Error(_)) => leaf,
    })
}

fn modify_expression(expression: Expression, modifier: Modifier<'_>) -> Result<Expression, Node> {
    match modify(Node::Expression(expression), modifier) {
        Node::Expression(expression) => Ok(expression),
        other => Err(mismatch("Expression", other)),
    }
}

fn modify_boxed(
    expression: Box<Expression>,
    modifier: Modifier<'_>,
) -> Result<Box<Expression>, Node> {
    modify_expression(*expression, modifier).map(Box::new)
}

fn modify_expressions(
    expressions: Vec<Expression>,
    modifier: Modifier<'_>,
) -> Result<Vec<Expression>, Node> {
    expressions
        .into_iter()
        .map(|expression| modify_expression(expression, modifier))
        .collect()
}

fn modify_statements(
    statements: Vec<Statement>,
    modifier: Modifier<'_>,
) -> Result<Vec<Statement>, Node> {
    statements
        .into_iter()
        .map(|statement| match modify(Node::Statement(statement), modifier) {
            Node::Statement(statement) => Ok(statement),
            other => Err(mismatch("Statement", other)),
        })
        .collect()
}

fn modify_block(block: BlockStatement, modifier: Modifier<'_>) -> Result<BlockStatement, Node> {
    match modify(Node::Block(block), modifier) {
        Node::Block(block) => Ok(block),
        other => Err(mismatch("BlockStatement", other)),
    }
}

fn modify_identifier(identifier: Identifier, modifier: Modifier<'_>) -> Result<Identifier, Node> {
    match modify(Node::Expression(Expression::Identifier(identifier)), modifier) {
        Node::Expression(Expression::Identifier(identifier)) => Ok(identifier),
        other => Err(mismatch("Identifier", other)),
    }
}

fn modify_identifiers(
    identifiers: Vec<Identifier>,
    modifier: Modifier<'_>,
) -> Result<Vec<Identifier>, Node> {
    identifiers
        .into_iter()
        .map(|identifier| modify_identifier(identifier, modifier))
        .collect()
}
