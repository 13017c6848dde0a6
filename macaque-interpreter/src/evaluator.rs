use std::rc::Rc;

use macaque_core::ast::{
    self, BinaryOperator, Expression, LogicalOperator, Node, Statement, UnaryOperator,
};
use macaque_core::stack::ensure_sufficient_stack;

use crate::context::Context;
use crate::environment::Environment;
use crate::object::{
    BuiltinKind, EvaluationError, Function, HashObject, HashPair, Interruption, Object,
};

fn error(error: EvaluationError) -> Interruption {
    Interruption::Error(error)
}

/// Evaluates any node. A program unwraps `return` itself; for other nodes a
/// `return` surfaces as [`Interruption::Return`].
pub fn evaluate(
    node: &Node,
    environment: &Environment,
    context: &mut Context,
) -> Result<Rc<Object>, Interruption> {
    match node {
        Node::Program(program) => eval_program(program, environment, context).map_err(error),
        Node::Statement(statement) => eval_statement(statement, environment, context),
        Node::Block(block) => eval_block_statement(block, environment, context),
        Node::Expression(expression) => eval_expression(expression, environment, context),
        Node::Error(node) => Err(error(EvaluationError::Rewrite(node.message.clone()))),
    }
}

pub fn eval_program(
    program: &ast::Program,
    environment: &Environment,
    context: &mut Context,
) -> Result<Rc<Object>, EvaluationError> {
    let mut output = Object::null();
    for statement in &program.statements {
        match eval_statement(statement, environment, context) {
            Err(Interruption::Return(value)) => return Ok(value),
            Err(Interruption::Error(error)) => return Err(error),
            Ok(object) => output = object,
        };
    }
    Ok(output)
}

pub(crate) fn eval_block_statement(
    block: &ast::BlockStatement,
    environment: &Environment,
    context: &mut Context,
) -> Result<Rc<Object>, Interruption> {
    let mut output = Object::null();
    for statement in &block.statements {
        output = eval_statement(statement, environment, context)?;
    }
    Ok(output)
}

fn eval_statement(
    statement: &Statement,
    environment: &Environment,
    context: &mut Context,
) -> Result<Rc<Object>, Interruption> {
    match statement {
        Statement::Expression(statement) => {
            eval_expression(&statement.expression, environment, context)
        }
        Statement::Return(statement) => {
            let value = eval_expression(&statement.value, environment, context)?;
            Err(Interruption::Return(value))
        }
        Statement::Let(statement) => {
            let value = eval_expression(&statement.value, environment, context)?;
            environment.set(statement.name.name.clone(), value);
            Ok(Object::null())
        }
        // top-level definitions are extracted before evaluation
        Statement::Macro(statement) => Err(error(EvaluationError::MisplacedMacro(
            statement.name.name.clone(),
        ))),
    }
}

pub(crate) fn eval_expression(
    expression: &Expression,
    environment: &Environment,
    context: &mut Context,
) -> Result<Rc<Object>, Interruption> {
    ensure_sufficient_stack(|| match expression {
        Expression::Number(literal) => Ok(Object::number(literal.value)),
        Expression::Boolean(literal) => Ok(Object::boolean(literal.value)),
        Expression::String(literal) => Ok(Object::string(literal.value.clone())),
        Expression::Null(_) => Ok(Object::null()),
        Expression::Array(array) => Ok(Object::array(eval_expressions(
            &array.elements,
            environment,
            context,
        )?)),
        Expression::Hash(literal) => {
            let mut hash = HashObject::new();
            for (key, value) in &literal.pairs {
                let key = eval_expression(key, environment, context)?;
                let Some(hash_key) = key.hash_key() else {
                    return Err(error(EvaluationError::UnknownSubscriptOperator {
                        base: crate::object::ObjectType::Hash,
                        subscript: key.kind(),
                    }));
                };
                let value = eval_expression(value, environment, context)?;
                hash.insert(hash_key, HashPair { key, value });
            }
            Ok(Object::hash(hash))
        }
        Expression::Identifier(identifier) => environment
            .get(&identifier.name)
            .or_else(|| context.builtin(&identifier.name))
            .ok_or_else(|| error(EvaluationError::UnknownIdentifier(identifier.name.clone()))),
        Expression::Unary(unary) => {
            let right = eval_expression(&unary.right, environment, context)?;
            eval_unary_operation(unary.operator, right).map_err(error)
        }
        Expression::Binary(binary) => {
            let left = eval_expression(&binary.left, environment, context)?;
            let right = eval_expression(&binary.right, environment, context)?;
            eval_binary_operation(binary.operator, left, right).map_err(error)
        }
        Expression::Logical(logical) => {
            let left = eval_expression(&logical.left, environment, context)?;
            let decided = match logical.operator {
                LogicalOperator::And => !left.is_truthy(),
                LogicalOperator::Or => left.is_truthy(),
            };
            if decided {
                Ok(left)
            } else {
                eval_expression(&logical.right, environment, context)
            }
        }
        Expression::Conditional(conditional) => {
            let condition = eval_expression(&conditional.condition, environment, context)?;
            if condition.is_truthy() {
                eval_block_statement(&conditional.consequence, environment, context)
            } else if let Some(alternative) = &conditional.alternative {
                eval_block_statement(alternative, environment, context)
            } else {
                Ok(Object::null())
            }
        }
        Expression::Function(literal) => Ok(Object::function(literal.clone(), environment.clone())),
        Expression::Call(call) => {
            let callee = eval_expression(&call.callee, environment, context)?;
            match callee.as_ref() {
                Object::Function(function) => {
                    let expected = function.literal.parameters.len();
                    if expected != call.arguments.len() {
                        return Err(error(EvaluationError::WrongArgumentCount {
                            expected,
                            actual: call.arguments.len(),
                        }));
                    }
                    let arguments = eval_expressions(&call.arguments, environment, context)?;
                    apply_function(function, arguments, context)
                }
                Object::Builtin(builtin) => match builtin.kind {
                    BuiltinKind::Function(function) => {
                        let arguments = eval_expressions(&call.arguments, environment, context)?;
                        function(context, environment, arguments)
                    }
                    BuiltinKind::Macro(function) => {
                        let arguments = call
                            .arguments
                            .iter()
                            .map(|argument| Object::quote(argument.clone()))
                            .collect();
                        function(context, environment, arguments)
                    }
                },
                _ => Err(error(EvaluationError::NotCallable(callee.kind()))),
            }
        }
        Expression::Assignment(assignment) => {
            let value = eval_expression(&assignment.value, environment, context)?;
            match assignment.target.as_ref() {
                Expression::Identifier(identifier) => {
                    if environment.assign(&identifier.name, value.clone()) {
                        Ok(value)
                    } else {
                        Err(error(EvaluationError::UnknownIdentifier(
                            identifier.name.clone(),
                        )))
                    }
                }
                Expression::Subscript(target) => {
                    let base = eval_expression(&target.base, environment, context)?;
                    let subscript = eval_expression(&target.subscript, environment, context)?;
                    let limit = context.options().max_array_length;
                    assign_subscript(&base, &subscript, value.clone(), limit).map_err(error)?;
                    Ok(value)
                }
                other => Err(error(EvaluationError::InvalidAssignmentTarget(other.kind()))),
            }
        }
        Expression::Subscript(subscript) => {
            let base = eval_expression(&subscript.base, environment, context)?;
            let index = eval_expression(&subscript.subscript, environment, context)?;
            eval_subscript(&base, &index).map_err(error)
        }
        Expression::Error(node) => Err(error(EvaluationError::Rewrite(node.message.clone()))),
    })
}

fn eval_expressions(
    expressions: &[Expression],
    environment: &Environment,
    context: &mut Context,
) -> Result<Vec<Rc<Object>>, Interruption> {
    expressions
        .iter()
        .map(|expression| eval_expression(expression, environment, context))
        .collect()
}

fn apply_function(
    function: &Function,
    arguments: Vec<Rc<Object>>,
    context: &mut Context,
) -> Result<Rc<Object>, Interruption> {
    let environment = Environment::new_enclosed(&function.closure);
    for (parameter, argument) in function.literal.parameters.iter().zip(arguments) {
        environment.set(parameter.name.clone(), argument);
    }

    context.enter_call()?;
    let result = eval_block_statement(&function.literal.body, &environment, context);
    context.exit_call();

    match result {
        Err(Interruption::Return(value)) => Ok(value),
        result => result,
    }
}

fn eval_unary_operation(
    operator: UnaryOperator,
    right: Rc<Object>,
) -> Result<Rc<Object>, EvaluationError> {
    match (operator, right.as_ref()) {
        (UnaryOperator::Bang, object) => Ok(Object::boolean(!object.is_truthy())),
        (UnaryOperator::Minus, Object::Number(value)) => Ok(Object::number(-value)),
        (UnaryOperator::Minus, _) => Err(EvaluationError::UnknownPrefixOperator {
            operator: operator.to_str(),
            right: right.kind(),
        }),
    }
}

fn eval_binary_operation(
    operator: BinaryOperator,
    left: Rc<Object>,
    right: Rc<Object>,
) -> Result<Rc<Object>, EvaluationError> {
    use BinaryOperator::*;
    let unknown_operator = || EvaluationError::UnknownInfixOperator {
        left: left.kind(),
        operator: operator.to_str(),
        right: right.kind(),
    };

    match (left.as_ref(), right.as_ref()) {
        (Object::Number(l), Object::Number(r)) => Ok(match operator {
            Plus => Object::number(l + r),
            Minus => Object::number(l - r),
            Multiply => Object::number(l * r),
            Divide => Object::number(l / r),
            LessThan => Object::boolean(l < r),
            GreaterThan => Object::boolean(l > r),
            Equal => Object::boolean(l == r),
            NotEqual => Object::boolean(l != r),
        }),
        (Object::String(l), Object::String(r)) => match operator {
            Plus => Ok(Object::string(format!("{}{}", l, r))),
            Equal => Ok(Object::boolean(l == r)),
            NotEqual => Ok(Object::boolean(l != r)),
            _ => Err(unknown_operator()),
        },
        _ if left.kind() != right.kind() => Err(EvaluationError::TypeMismatch {
            left: left.kind(),
            operator: operator.to_str(),
            right: right.kind(),
        }),
        _ => match operator {
            Equal => Ok(Object::boolean(same_value(&left, &right))),
            NotEqual => Ok(Object::boolean(!same_value(&left, &right))),
            _ => Err(unknown_operator()),
        },
    }
}

/// Equality for same-typed operands that are neither numbers nor strings:
/// booleans and null compare by value, everything else by identity.
fn same_value(left: &Rc<Object>, right: &Rc<Object>) -> bool {
    match (left.as_ref(), right.as_ref()) {
        (Object::Boolean(l), Object::Boolean(r)) => l == r,
        (Object::Null, Object::Null) => true,
        _ => Rc::ptr_eq(left, right),
    }
}

/// Index for a number used as an array subscript, if it is a whole,
/// non-negative value.
fn whole_index(value: f64) -> Option<usize> {
    (value >= 0.0 && value.fract() == 0.0 && value <= usize::MAX as f64).then_some(value as usize)
}

fn eval_subscript(base: &Rc<Object>, subscript: &Rc<Object>) -> Result<Rc<Object>, EvaluationError> {
    match (base.as_ref(), subscript.as_ref()) {
        (Object::Array(elements), Object::Number(index)) => Ok(whole_index(*index)
            .and_then(|index| elements.borrow().get(index).cloned())
            .unwrap_or_else(Object::null)),
        (Object::Hash(hash), _) => {
            let key = subscript
                .hash_key()
                .ok_or(EvaluationError::UnknownSubscriptOperator {
                    base: base.kind(),
                    subscript: subscript.kind(),
                })?;
            Ok(hash
                .borrow()
                .get(&key)
                .map(|pair| pair.value.clone())
                .unwrap_or_else(Object::null))
        }
        _ => Err(EvaluationError::UnknownSubscriptOperator {
            base: base.kind(),
            subscript: subscript.kind(),
        }),
    }
}

fn assign_subscript(
    base: &Rc<Object>,
    subscript: &Rc<Object>,
    value: Rc<Object>,
    max_length: usize,
) -> Result<(), EvaluationError> {
    match (base.as_ref(), subscript.as_ref()) {
        (Object::Array(elements), Object::Number(number)) => {
            let index = whole_index(*number).ok_or(EvaluationError::InvalidSubscript(*number))?;
            let mut elements = elements.borrow_mut();
            if index >= elements.len() {
                let length = index
                    .checked_add(1)
                    .filter(|length| *length <= max_length)
                    .ok_or(EvaluationError::ArrayTooLarge {
                        index: *number,
                        limit: max_length,
                    })?;
                elements.resize_with(length, Object::null);
            }
            elements[index] = value;
            Ok(())
        }
        (Object::Hash(hash), _) => {
            let key = subscript
                .hash_key()
                .ok_or(EvaluationError::UnknownSubscriptOperator {
                    base: base.kind(),
                    subscript: subscript.kind(),
                })?;
            hash.borrow_mut().insert(
                key,
                HashPair {
                    key: subscript.clone(),
                    value,
                },
            );
            Ok(())
        }
        _ => Err(EvaluationError::UnknownSubscriptOperator {
            base: base.kind(),
            subscript: subscript.kind(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use macaque_core::parse;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::context::ContextOptions;

    fn run(input: &str) -> Result<Rc<Object>, EvaluationError> {
        let (program, errors) = parse(input);
        assert!(errors.is_empty(), "{}: {:?}", input, errors);
        let mut context = Context::with_output(ContextOptions::default(), Box::new(std::io::sink()));
        eval_program(&program, &Environment::new(), &mut context)
    }

    fn test_evaluation(inputs: Vec<(&str, Result<Rc<Object>, EvaluationError>)>) {
        for (input, output) in inputs {
            assert_eq!(run(input), output, "input: {}", input);
        }
    }

    fn test_inspection(inputs: Vec<(&str, &str)>) {
        for (input, output) in inputs {
            let result = run(input).map(|object| object.to_string());
            assert_eq!(result, Ok(output.to_owned()), "input: {}", input);
        }
    }

    fn test_errors(inputs: Vec<(&str, &str)>) {
        for (input, message) in inputs {
            let result = run(input).map_err(|error| error.to_string());
            assert_eq!(result, Err(message.to_owned()), "input: {}", input);
        }
    }

    #[test]
    fn test_literal() {
        let inputs = vec![
            ("5;", Ok(Object::number(5.0))),
            ("2.5", Ok(Object::number(2.5))),
            ("true;", Ok(Object::boolean(true))),
            ("false;", Ok(Object::boolean(false))),
            ("\"hello\";", Ok(Object::string("hello"))),
            ("null;", Ok(Object::null())),
            ("", Ok(Object::null())),
        ];

        test_evaluation(inputs);
    }

    #[test]
    fn test_arithmetic() {
        let inputs = vec![
            ("--5;", Ok(Object::number(5.0))),
            ("-10;", Ok(Object::number(-10.0))),
            ("5 + 5 + 5 + 5 - 10", Ok(Object::number(10.0))),
            ("2 * 2 * 2 * 2 * 2", Ok(Object::number(32.0))),
            ("-50 + 100 + -50", Ok(Object::number(0.0))),
            ("20 + 2 * -10", Ok(Object::number(0.0))),
            ("50 / 2 * 2 + 10", Ok(Object::number(60.0))),
            ("3 * (3 * 3) + 10", Ok(Object::number(37.0))),
            ("(5 + 10 * 2 + 15 / 3) * 2 + -10", Ok(Object::number(50.0))),
            ("7 / 2", Ok(Object::number(3.5))),
            ("\"Hello\" + \" \" + \"World!\"", Ok(Object::string("Hello World!"))),
        ];

        test_evaluation(inputs);
    }

    #[test]
    fn test_comparison_and_bang() {
        let inputs = vec![
            ("1 < 2", Ok(Object::boolean(true))),
            ("1 > 2", Ok(Object::boolean(false))),
            ("1 == 1", Ok(Object::boolean(true))),
            ("1 != 1", Ok(Object::boolean(false))),
            ("true == true", Ok(Object::boolean(true))),
            ("true != false", Ok(Object::boolean(true))),
            ("(1 < 2) == true", Ok(Object::boolean(true))),
            ("null == null", Ok(Object::boolean(true))),
            ("\"a\" == \"a\"", Ok(Object::boolean(true))),
            ("\"a\" != \"b\"", Ok(Object::boolean(true))),
            ("let a = [1]; a == a", Ok(Object::boolean(true))),
            ("[1] == [1]", Ok(Object::boolean(false))),
            ("!true", Ok(Object::boolean(false))),
            ("!5", Ok(Object::boolean(false))),
            ("!0", Ok(Object::boolean(true))),
            ("!!\"\"", Ok(Object::boolean(false))),
            ("![]", Ok(Object::boolean(true))),
            ("!{}", Ok(Object::boolean(true))),
            ("!null", Ok(Object::boolean(true))),
        ];

        test_evaluation(inputs);
    }

    #[test]
    fn test_logical_operators() {
        let inputs = vec![
            ("1 and 2", Ok(Object::number(2.0))),
            ("0 and 2", Ok(Object::number(0.0))),
            ("0 or \"x\"", Ok(Object::string("x"))),
            ("3 or y", Ok(Object::number(3.0))),
            ("false and y", Ok(Object::boolean(false))),
            ("null or false", Ok(Object::boolean(false))),
        ];

        test_evaluation(inputs);
    }

    #[test]
    fn test_conditionals() {
        let inputs = vec![
            ("if (true) { 10 }", Ok(Object::number(10.0))),
            ("if (false) { 10 }", Ok(Object::null())),
            ("if (1) { 10 }", Ok(Object::number(10.0))),
            ("if (0) { 10 } else { 20 }", Ok(Object::number(20.0))),
            ("if (\"\") { 10 } else { 20 }", Ok(Object::number(20.0))),
            ("if ([0]) { 10 } else { 20 }", Ok(Object::number(10.0))),
            ("if (1 > 2) { 10 } else { 20 }", Ok(Object::number(20.0))),
            ("if (true) { }", Ok(Object::null())),
        ];

        test_evaluation(inputs);
    }

    #[test]
    fn test_return_statements() {
        let inputs = vec![
            ("return 10;", Ok(Object::number(10.0))),
            ("return 10; 9;", Ok(Object::number(10.0))),
            ("9; return 2 * 5; 9;", Ok(Object::number(10.0))),
            (
                "if (10 > 1) { if (10 > 1) { return 10; } return 1; }",
                Ok(Object::number(10.0)),
            ),
            (
                "let f = fn(x) { return x; x + 10; }; f(10);",
                Ok(Object::number(10.0)),
            ),
        ];

        test_evaluation(inputs);
    }

    #[test]
    fn test_let_statements() {
        let inputs = vec![
            ("let a = 5; a;", Ok(Object::number(5.0))),
            ("let a = 5 * 5; a;", Ok(Object::number(25.0))),
            ("let a = 5; let b = a; b;", Ok(Object::number(5.0))),
            (
                "let a = 5; let b = a; let c = a + b + 5; c;",
                Ok(Object::number(15.0)),
            ),
            ("let a = 5;", Ok(Object::null())),
        ];

        test_evaluation(inputs);
    }

    #[test]
    fn test_assignment() {
        let inputs = vec![
            ("let a = 1; a = 2; a", Ok(Object::number(2.0))),
            ("let a = 1; a = 2", Ok(Object::number(2.0))),
            ("let a = 1; let b = 1; a = b = 5; a + b", Ok(Object::number(10.0))),
            (
                "let counter = 0; let inc = fn() { counter = counter + 1 }; inc(); inc(); counter",
                Ok(Object::number(2.0)),
            ),
            (
                "let x = 1; let shadow = fn() { let x = 5; x = 6; x }; shadow() + x",
                Ok(Object::number(7.0)),
            ),
        ];

        test_evaluation(inputs);
    }

    #[test]
    fn test_function_application() {
        let inputs = vec![
            ("let identity = fn(x) { x }; identity(5)", Ok(Object::number(5.0))),
            (
                "let identity = fn(x) { return x }; identity(5)",
                Ok(Object::number(5.0)),
            ),
            ("let double = fn(x) { x * 2 }; double(5)", Ok(Object::number(10.0))),
            ("let add = fn(x, y) { x + y }; add(5, 5)", Ok(Object::number(10.0))),
            (
                "let add = fn(x, y) { x + y }; add(5 + 5, add(5, 5))",
                Ok(Object::number(20.0)),
            ),
            ("fn(x) { x }(5)", Ok(Object::number(5.0))),
            ("fn() { }()", Ok(Object::null())),
            (
                "
                let factorial = fn(n) {
                    if (n < 2) { 1 }
                    else { factorial(n - 1) * n }
                };
                factorial(5)",
                Ok(Object::number(120.0)),
            ),
        ];

        test_evaluation(inputs);
    }

    #[test]
    fn test_closure() {
        let inputs = vec![
            (
                "let newAdder = fn(x) { fn(y) { x + y } }; let addTwo = newAdder(2); addTwo(3)",
                Ok(Object::number(5.0)),
            ),
            (
                "
                let counter = fn() {
                    let count = 0;
                    fn() { count = count + 1 }
                };
                let a = counter();
                let b = counter();
                a(); a(); b();
                a()",
                Ok(Object::number(3.0)),
            ),
        ];

        test_evaluation(inputs);
    }

    #[test]
    fn test_arrays() {
        test_inspection(vec![
            ("[1, 2 * 2, 3 + 3]", "[1, 4, 6]"),
            ("let a = [1]; a[3] = 9; a", "[1, null, null, 9]"),
            ("let a = [1, 2]; a[0] = 5; a", "[5, 2]"),
            ("let a = []; let b = a; b[0] = 1; a", "[1]"),
            ("let a = [1, 2]; a[1] = 3", "3"),
            ("let a = [1]; a[0] = a; a", "[[...]]"),
            ("let h = {}; h[\"h\"] = h; [h, h]", "[{\"h\": {...}}, {\"h\": {...}}]"),
        ]);

        test_evaluation(vec![
            ("[1, 2, 3][0]", Ok(Object::number(1.0))),
            ("[1, 2, 3][1 + 1]", Ok(Object::number(3.0))),
            ("let i = 0; [1][i]", Ok(Object::number(1.0))),
            ("[1, 2, 3][3]", Ok(Object::null())),
            ("[1, 2, 3][-1]", Ok(Object::null())),
            ("[1, 2, 3][0.5]", Ok(Object::null())),
        ]);
    }

    #[test]
    fn test_hashes() {
        test_inspection(vec![
            (
                "let two = \"two\"; {\"one\": 10 - 9, two: 1 + 1, \"thr\" + \"ee\": 6 / 2, 4: 4, true: 5, false: 6}",
                "{\"one\": 1, \"two\": 2, \"three\": 3, 4: 4, true: 5, false: 6}",
            ),
            ("let h = {}; h[\"a\"] = 1; h[2] = 3; h", "{\"a\": 1, 2: 3}"),
            ("let h = {1: 1}; h[1] = 2; h", "{1: 2}"),
        ]);

        test_evaluation(vec![
            ("{\"foo\": 5}[\"foo\"]", Ok(Object::number(5.0))),
            ("{\"foo\": 5}[\"bar\"]", Ok(Object::null())),
            ("let key = \"foo\"; {\"foo\": 5}[key]", Ok(Object::number(5.0))),
            ("{}[\"foo\"]", Ok(Object::null())),
            ("{5: 5}[5]", Ok(Object::number(5.0))),
            ("{true: 5}[true]", Ok(Object::number(5.0))),
            ("{1: \"number\", true: \"boolean\"}[1]", Ok(Object::string("number"))),
            ("{0: \"zero\"}[-0]", Ok(Object::string("zero"))),
        ]);
    }

    #[test]
    fn test_error_handling() {
        test_errors(vec![
            ("5 + true;", "type mismatch: NUMBER + BOOLEAN"),
            ("5 + true; 5;", "type mismatch: NUMBER + BOOLEAN"),
            ("1 == true", "type mismatch: NUMBER == BOOLEAN"),
            ("\"a\" < 1", "type mismatch: STRING < NUMBER"),
            ("-true", "unknown operator: -BOOLEAN"),
            ("true + false;", "unknown operator: BOOLEAN + BOOLEAN"),
            ("5; true + false; 5", "unknown operator: BOOLEAN + BOOLEAN"),
            ("if (10 > 1) { true + false; }", "unknown operator: BOOLEAN + BOOLEAN"),
            (
                "if (10 > 1) { if (10 > 1) { return true + false; } return 1; }",
                "unknown operator: BOOLEAN + BOOLEAN",
            ),
            ("\"Hello\" - \"World\"", "unknown operator: STRING - STRING"),
            ("[1] < [2]", "unknown operator: ARRAY < ARRAY"),
            ("foobar", "unknown identifier: foobar"),
            ("x = 5", "unknown identifier: x"),
            ("{\"name\": \"Monkey\"}[fn(x) { x }];", "unknown operator: HASH[FUNCTION]"),
            ("{[1]: 2}", "unknown operator: HASH[ARRAY]"),
            ("[1, 2][\"a\"]", "unknown operator: ARRAY[STRING]"),
            ("5[0]", "unknown operator: NUMBER[NUMBER]"),
            ("5()", "unknown operator: NUMBER()"),
            ("let a = [1]; a[1.5] = 2", "subscript value must be a positive whole number: 1.5"),
            ("let a = [1]; a[-1] = 2", "subscript value must be a positive whole number: -1"),
            ("let a = [1]; a[\"x\"] = 2", "unknown operator: ARRAY[STRING]"),
            ("let s = \"ab\"; s[0] = 1", "unknown operator: STRING[NUMBER]"),
            ("fn(x, y) { x }(1)", "wrong number of arguments: expected 2, got 1"),
            ("fn() { 1 }(1, 2)", "wrong number of arguments: expected 0, got 2"),
            (
                "let a = [1]; a[1000000000] = 2",
                "array index 1000000000 exceeds the maximum array length 16777216",
            ),
            (
                "let f = fn() { macro m(x) { x }; 1 }; f()",
                "macro `m` can only be defined at the top level",
            ),
            (
                "if (true) { macro m() { quote(1) } }",
                "macro `m` can only be defined at the top level",
            ),
        ]);

        test_evaluation(vec![
            (
                "let a = [1]; a[18446744073709551616] = 2",
                Err(EvaluationError::ArrayTooLarge {
                    index: 18446744073709551616.0,
                    limit: 16777216,
                }),
            ),
            (
                "let a = [1]; a[4611686018427387904] = 2",
                Err(EvaluationError::ArrayTooLarge {
                    index: 4611686018427387904.0,
                    limit: 16777216,
                }),
            ),
            ("let a = [1]; a[18446744073709551616]", Ok(Object::null())),
        ]);
    }

    #[test]
    fn test_array_growth_is_bounded() {
        let (program, _) = parse("let a = []; a[3] = 1; a[4] = 2; a");
        let options = ContextOptions {
            max_array_length: 4,
            ..ContextOptions::default()
        };
        let mut context = Context::with_output(options, Box::new(std::io::sink()));

        let result = eval_program(&program, &Environment::new(), &mut context);
        assert_eq!(
            result.map_err(|error| error.to_string()),
            Err("array index 4 exceeds the maximum array length 4".to_owned())
        );
    }

    #[test]
    fn test_call_depth_is_bounded() {
        let (program, _) = parse("let loop = fn(n) { loop(n + 1) }; loop(0)");
        let options = ContextOptions {
            max_call_depth: 64,
            ..ContextOptions::default()
        };
        let mut context = Context::with_output(options, Box::new(std::io::sink()));

        let result = eval_program(&program, &Environment::new(), &mut context);
        assert_eq!(result, Err(EvaluationError::CallDepthExceeded(64)));

        // the depth counter unwinds, so the context stays usable
        let (program, _) = parse("let f = fn(n) { if (n > 0) { f(n - 1) } else { 0 } }; f(60)");
        let result = eval_program(&program, &Environment::new(), &mut context);
        assert_eq!(result, Ok(Object::number(0.0)));
    }

    #[test]
    fn test_evaluate_nodes() {
        let mut context = Context::with_output(ContextOptions::default(), Box::new(std::io::sink()));
        let environment = Environment::new();

        let (program, _) = parse("return 1;");
        let statement = program.statements[0].clone();
        assert_eq!(
            evaluate(&Node::Statement(statement), &environment, &mut context),
            Err(Interruption::Return(Object::number(1.0)))
        );
        assert_eq!(
            evaluate(&Node::Program(program), &environment, &mut context),
            Ok(Object::number(1.0))
        );
        assert_eq!(
            evaluate(
                &Node::Error(ast::ErrorNode::new("broken")),
                &environment,
                &mut context
            ),
            Err(Interruption::Error(EvaluationError::Rewrite("broken".into())))
        );
    }
}
