//! Macro definition and expansion.
//!
//! Macros run before evaluation. [`define_macros`] pulls every top-level
//! `macro` statement out of a program and binds it in a macro environment;
//! [`expand_macros`] then replaces each call to a bound macro with the
//! syntax its body quotes.

use std::rc::Rc;

use macaque_core::ast::{
    ArrayLiteral, BooleanLiteral, ErrorNode, Expression, HashLiteral, Node, NullLiteral, Program,
    Statement, StringLiteral,
};
use macaque_core::lexer::{Token, TokenKind};
use macaque_core::modify::modify;
use macaque_core::stack::ensure_sufficient_stack;
use tracing::debug;

use crate::context::Context;
use crate::environment::Environment;
use crate::evaluator::eval_block_statement;
use crate::object::{EvaluationError, Interruption, Macro, Object};

/// Syntax form of a value, as spliced into quoted code by `unquote`.
pub fn to_node(object: &Rc<Object>) -> Expression {
    convert(object, &mut Vec::new())
}

/// `open` holds the containers being converted; meeting one again means the
/// value contains itself and has no finite syntax form.
fn convert(object: &Rc<Object>, open: &mut Vec<*const Object>) -> Expression {
    if matches!(object.as_ref(), Object::Array(_) | Object::Hash(_)) {
        if open.contains(&Rc::as_ptr(object)) {
            return Expression::Error(ErrorNode::new(format!(
                "cannot convert a self-referencing {} to a syntax node",
                object.kind()
            )));
        }
        open.push(Rc::as_ptr(object));
    }

    let expression = ensure_sufficient_stack(|| match object.as_ref() {
        Object::Number(value) => Expression::number(*value),
        Object::Boolean(value) => Expression::Boolean(BooleanLiteral::new(*value)),
        Object::String(value) => Expression::String(StringLiteral::new(value)),
        Object::Null => Expression::Null(NullLiteral::new()),
        Object::Array(elements) => Expression::Array(ArrayLiteral {
            token: Token::synthesized(TokenKind::LBracket, "["),
            elements: elements
                .borrow()
                .iter()
                .map(|element| convert(element, open))
                .collect(),
        }),
        Object::Hash(hash) => Expression::Hash(HashLiteral {
            token: Token::synthesized(TokenKind::LBrace, "{"),
            pairs: hash
                .borrow()
                .iter()
                .map(|pair| (convert(&pair.key, open), convert(&pair.value, open)))
                .collect(),
        }),
        Object::Function(function) => Expression::Function(function.literal.clone()),
        Object::Quote(expression) => expression.clone(),
        Object::Builtin(_) | Object::Macro(_) => Expression::Error(ErrorNode::new(format!(
            "cannot convert {} to a syntax node",
            object.kind()
        ))),
    });

    if matches!(object.as_ref(), Object::Array(_) | Object::Hash(_)) {
        open.pop();
    }
    expression
}

/// Removes the top-level macro statements from `program`, binding each one
/// in `environment`. Nested macro statements are left in place.
pub fn define_macros(program: Program, environment: &Environment) -> Program {
    let mut statements = Vec::with_capacity(program.statements.len());
    for statement in program.statements {
        match statement {
            Statement::Macro(statement) => {
                debug!(name = %statement.name, "defining macro");
                let name = statement.name.name.clone();
                let object = Object::Macro(Macro {
                    name: name.clone(),
                    parameters: statement.parameters,
                    body: statement.body,
                    environment: environment.clone(),
                });
                environment.set(name, Rc::new(object));
            }
            statement => statements.push(statement),
        }
    }
    Program { statements }
}

/// Replaces every call to a macro bound in `environment` with the quoted
/// syntax its body returns. A macro that cannot be expanded turns into an
/// error node.
pub fn expand_macros(node: Node, environment: &Environment, context: &mut Context) -> Node {
    modify(node, &mut |node: Node| expand_call(node, environment, context))
}

fn expand_call(node: Node, environment: &Environment, context: &mut Context) -> Node {
    let Node::Expression(Expression::Call(call)) = &node else {
        return node;
    };
    let Expression::Identifier(callee) = call.callee.as_ref() else {
        return node;
    };
    let Some(object) = environment.get(&callee.name) else {
        return node;
    };
    let Object::Macro(macro_object) = object.as_ref() else {
        return node;
    };

    debug!(name = %macro_object.name, "expanding macro");
    match apply_macro(macro_object, &call.arguments, context) {
        Ok(expression) => Node::Expression(expression),
        Err(message) => Node::Error(ErrorNode::new(message)),
    }
}

fn apply_macro(
    macro_object: &Macro,
    arguments: &[Expression],
    context: &mut Context,
) -> Result<Expression, String> {
    if macro_object.parameters.len() != arguments.len() {
        return Err(EvaluationError::WrongArgumentCount {
            expected: macro_object.parameters.len(),
            actual: arguments.len(),
        }
        .to_string());
    }

    let environment = Environment::new_enclosed(&macro_object.environment);
    for (parameter, argument) in macro_object.parameters.iter().zip(arguments) {
        environment.set(parameter.name.clone(), Object::quote(argument.clone()));
    }

    let value = match eval_block_statement(&macro_object.body, &environment, context) {
        Ok(value) | Err(Interruption::Return(value)) => value,
        Err(Interruption::Error(error)) => return Err(error.to_string()),
    };
    match value.as_ref() {
        Object::Quote(expression) => Ok(expression.clone()),
        other => Err(format!(
            "macro `{}` must return a quote, got {}",
            macro_object.name,
            other.kind()
        )),
    }
}
