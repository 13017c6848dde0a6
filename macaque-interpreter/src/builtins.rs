use std::io::Write;
use std::rc::Rc;

use macaque_core::ast::{ErrorNode, Expression, Node};
use macaque_core::modify::modify;

use crate::context::Context;
use crate::environment::Environment;
use crate::evaluator::eval_expression;
use crate::macros::to_node;
use crate::object::{Builtin, BuiltinFn, BuiltinKind, EvaluationError, Interruption, Object};

pub(crate) fn all() -> Vec<Builtin> {
    let functions = [
        ("len", builtin_len as BuiltinFn),
        ("first", builtin_first),
        ("last", builtin_last),
        ("rest", builtin_rest),
        ("push", builtin_push),
        ("puts", builtin_puts),
    ];
    let macros = [
        ("quote", builtin_quote as BuiltinFn),
        ("unquote", builtin_unquote),
    ];

    functions
        .into_iter()
        .map(|(name, function)| Builtin {
            name,
            kind: BuiltinKind::Function(function),
        })
        .chain(macros.into_iter().map(|(name, function)| Builtin {
            name,
            kind: BuiltinKind::Macro(function),
        }))
        .collect()
}

fn unsupported(name: &'static str, args: &[Rc<Object>]) -> Interruption {
    Interruption::Error(EvaluationError::unsupported_arguments(name, args))
}

fn builtin_len(
    _: &mut Context,
    _: &Environment,
    args: Vec<Rc<Object>>,
) -> Result<Rc<Object>, Interruption> {
    match args.as_slice() {
        [object] => match object.as_ref() {
            Object::String(s) => Ok(Object::number(s.chars().count() as f64)),
            Object::Array(elements) => Ok(Object::number(elements.borrow().len() as f64)),
            _ => Err(unsupported("len", &args)),
        },
        _ => Err(unsupported("len", &args)),
    }
}

fn builtin_first(
    _: &mut Context,
    _: &Environment,
    args: Vec<Rc<Object>>,
) -> Result<Rc<Object>, Interruption> {
    match args.as_slice() {
        [object] => match object.as_ref() {
            Object::Array(elements) => Ok(elements
                .borrow()
                .first()
                .cloned()
                .unwrap_or_else(Object::null)),
            _ => Err(unsupported("first", &args)),
        },
        _ => Err(unsupported("first", &args)),
    }
}

fn builtin_last(
    _: &mut Context,
    _: &Environment,
    args: Vec<Rc<Object>>,
) -> Result<Rc<Object>, Interruption> {
    match args.as_slice() {
        [object] => match object.as_ref() {
            Object::Array(elements) => Ok(elements
                .borrow()
                .last()
                .cloned()
                .unwrap_or_else(Object::null)),
            _ => Err(unsupported("last", &args)),
        },
        _ => Err(unsupported("last", &args)),
    }
}

/// Everything but the first element, as a new array. Null for an empty
/// array.
fn builtin_rest(
    _: &mut Context,
    _: &Environment,
    args: Vec<Rc<Object>>,
) -> Result<Rc<Object>, Interruption> {
    match args.as_slice() {
        [object] => match object.as_ref() {
            Object::Array(elements) => {
                let elements = elements.borrow();
                if elements.is_empty() {
                    return Ok(Object::null());
                }
                Ok(Object::array(elements[1..].to_vec()))
            }
            _ => Err(unsupported("rest", &args)),
        },
        _ => Err(unsupported("rest", &args)),
    }
}

/// Copy of the array with one more element; the argument is left untouched.
fn builtin_push(
    _: &mut Context,
    _: &Environment,
    args: Vec<Rc<Object>>,
) -> Result<Rc<Object>, Interruption> {
    match args.as_slice() {
        [array, value] => match array.as_ref() {
            Object::Array(elements) => {
                let mut elements = elements.borrow().clone();
                elements.push(value.clone());
                Ok(Object::array(elements))
            }
            _ => Err(unsupported("push", &args)),
        },
        _ => Err(unsupported("push", &args)),
    }
}

fn builtin_puts(
    context: &mut Context,
    _: &Environment,
    args: Vec<Rc<Object>>,
) -> Result<Rc<Object>, Interruption> {
    let output = context.output();
    for arg in &args {
        writeln!(output, "{}", arg)
            .map_err(|err| Interruption::Error(EvaluationError::Output(err.to_string())))?;
    }
    Ok(Object::null())
}

/// Returns its argument unevaluated, with every `unquote(x)` call inside it
/// replaced by the syntax form of the value of `x`.
fn builtin_quote(
    context: &mut Context,
    environment: &Environment,
    args: Vec<Rc<Object>>,
) -> Result<Rc<Object>, Interruption> {
    let [argument] = args.as_slice() else {
        return Err(unsupported("quote", &args));
    };
    let Object::Quote(expression) = argument.as_ref() else {
        return Err(unsupported("quote", &args));
    };

    let node = modify(Node::Expression(expression.clone()), &mut |node: Node| {
        splice_unquoted(node, environment, context)
    });
    let expression = match node {
        Node::Expression(expression) => expression,
        Node::Error(error) => Expression::Error(error),
        other => Expression::Error(ErrorNode::new(format!(
            "quote produced a {} instead of an expression",
            other.kind()
        ))),
    };
    Ok(Object::quote(expression))
}

fn splice_unquoted(node: Node, environment: &Environment, context: &mut Context) -> Node {
    let call = match node {
        Node::Expression(Expression::Call(call))
            if matches!(call.callee.as_ref(), Expression::Identifier(ident) if ident.name.as_ref() == "unquote") =>
        {
            Expression::Call(call)
        }
        node => return node,
    };

    let quoting = std::mem::replace(&mut context.quoting, true);
    let result = eval_expression(&call, environment, context);
    context.quoting = quoting;

    match result {
        Ok(value) | Err(Interruption::Return(value)) => Node::Expression(to_node(&value)),
        Err(Interruption::Error(error)) => Node::Error(ErrorNode::new(error.to_string())),
    }
}

fn builtin_unquote(
    context: &mut Context,
    environment: &Environment,
    args: Vec<Rc<Object>>,
) -> Result<Rc<Object>, Interruption> {
    if !context.is_quoting() {
        return Err(Interruption::Error(EvaluationError::UnquoteOutsideQuote));
    }
    let [argument] = args.as_slice() else {
        return Err(unsupported("unquote", &args));
    };
    let Object::Quote(expression) = argument.as_ref() else {
        return Err(unsupported("unquote", &args));
    };

    eval_expression(expression, environment, context)
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;
    use crate::context::ContextOptions;
    use pretty_assertions::assert_eq;

    fn call(name: &str, args: Vec<Rc<Object>>) -> Result<Rc<Object>, Interruption> {
        let mut context = Context::with_output(ContextOptions::default(), Box::new(std::io::sink()));
        let builtin = context.builtin(name).unwrap();
        let Object::Builtin(Builtin {
            kind: BuiltinKind::Function(function),
            ..
        }) = builtin.as_ref()
        else {
            panic!("{} is not a builtin function", name);
        };
        function(&mut context, &Environment::new(), args)
    }

    fn unsupported_error(message: &str) -> Result<String, String> {
        Err(message.to_owned())
    }

    fn render(result: Result<Rc<Object>, Interruption>) -> Result<String, String> {
        match result {
            Ok(object) => Ok(object.to_string()),
            Err(Interruption::Error(error)) => Err(error.to_string()),
            Err(Interruption::Return(object)) => Err(format!("unexpected return of {}", object)),
        }
    }

    #[test]
    fn test_len() {
        let tests = vec![
            (vec![Object::string("")], Ok("0".to_owned())),
            (vec![Object::string("four")], Ok("4".to_owned())),
            (vec![Object::string("hello world")], Ok("11".to_owned())),
            (
                vec![Object::array(vec![Object::null(), Object::null()])],
                Ok("2".to_owned()),
            ),
            (
                vec![Object::number(1.0)],
                unsupported_error("argument(s) to `len` not supported: (NUMBER)"),
            ),
            (
                vec![Object::string("one"), Object::string("two")],
                unsupported_error("argument(s) to `len` not supported: (STRING, STRING)"),
            ),
            (vec![], unsupported_error("argument(s) to `len` not supported: ()")),
        ];

        for (args, expected) in tests {
            assert_eq!(render(call("len", args)), expected);
        }
    }

    #[test]
    fn test_array_builtins() {
        let array = || Object::array(vec![Object::number(1.0), Object::number(2.0)]);
        let tests = vec![
            ("first", vec![array()], Ok("1".to_owned())),
            ("first", vec![Object::array(vec![])], Ok("null".to_owned())),
            ("last", vec![array()], Ok("2".to_owned())),
            ("last", vec![Object::array(vec![])], Ok("null".to_owned())),
            ("rest", vec![array()], Ok("[2]".to_owned())),
            ("rest", vec![Object::array(vec![])], Ok("null".to_owned())),
            (
                "push",
                vec![array(), Object::number(3.0)],
                Ok("[1, 2, 3]".to_owned()),
            ),
            (
                "push",
                vec![Object::number(1.0), Object::number(3.0)],
                unsupported_error("argument(s) to `push` not supported: (NUMBER, NUMBER)"),
            ),
            (
                "first",
                vec![Object::string("abc")],
                unsupported_error("argument(s) to `first` not supported: (STRING)"),
            ),
        ];

        for (name, args, expected) in tests {
            assert_eq!(render(call(name, args)), expected, "{}", name);
        }
    }

    #[test]
    fn test_push_does_not_mutate() {
        let original = Object::array(vec![Object::number(1.0)]);
        let pushed = call("push", vec![original.clone(), Object::number(2.0)]).unwrap();

        assert_eq!(original.to_string(), "[1]");
        assert_eq!(pushed.to_string(), "[1, 2]");
    }

    #[derive(Clone, Default)]
    struct SharedBuffer(Rc<RefCell<Vec<u8>>>);

    impl Write for SharedBuffer {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.borrow_mut().write(buf)
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_puts_writes_one_line_per_argument() {
        let buffer = SharedBuffer::default();
        let mut context = Context::with_output(ContextOptions::default(), Box::new(buffer.clone()));

        let result = builtin_puts(
            &mut context,
            &Environment::new(),
            vec![Object::number(1.0), Object::string("two"), Object::null()],
        );

        assert_eq!(result, Ok(Object::null()));
        let written = String::from_utf8(buffer.0.borrow().clone()).unwrap();
        assert_eq!(written, "1\n\"two\"\nnull\n");
    }
}
