use std::fmt::Write as _;
use std::io::Write;
use std::rc::Rc;

use macaque_core::ast::{Node, Program};
use macaque_core::{parse, ParseError};
use thiserror::Error;
use tracing::debug;

use crate::context::{Context, ContextOptions};
use crate::environment::Environment;
use crate::evaluator::evaluate;
use crate::macros::{define_macros, expand_macros};
use crate::object::{EvaluationError, Interruption, Object};

#[derive(Debug, PartialEq, Error)]
pub enum RunError {
    #[error("parser errors:\n{}", format_parse_errors(.0))]
    Parse(Vec<ParseError>),
    #[error(transparent)]
    Evaluation(#[from] EvaluationError),
}

fn format_parse_errors(errors: &[ParseError]) -> String {
    let mut output = String::new();
    for error in errors {
        let _ = writeln!(output, "\t{}", error);
    }
    output
}

/// Bindings, macros and context that persist across successive inputs,
/// as a REPL needs them.
pub struct Session {
    environment: Environment,
    macros: Environment,
    context: Context,
}

impl Session {
    pub fn new(options: ContextOptions) -> Self {
        Self::with_context(Context::new(options))
    }

    pub fn with_output(options: ContextOptions, output: Box<dyn Write>) -> Self {
        Self::with_context(Context::with_output(options, output))
    }

    fn with_context(context: Context) -> Self {
        Session {
            environment: Environment::new(),
            macros: Environment::new(),
            context,
        }
    }

    pub fn environment(&self) -> &Environment {
        &self.environment
    }

    /// Parses and runs `source`. Nothing is evaluated when parsing fails.
    pub fn run(&mut self, source: &str) -> Result<Rc<Object>, RunError> {
        let (program, errors) = parse(source);
        if !errors.is_empty() {
            debug!(count = errors.len(), "parsing failed");
            return Err(RunError::Parse(errors));
        }
        Ok(self.run_program(program)?)
    }

    /// Defines and expands the program's macros, then evaluates it.
    pub fn run_program(&mut self, program: Program) -> Result<Rc<Object>, EvaluationError> {
        debug!(statements = program.statements.len(), "running program");
        let program = define_macros(program, &self.macros);
        let expanded = expand_macros(Node::Program(program), &self.macros, &mut self.context);

        match evaluate(&expanded, &self.environment, &mut self.context) {
            Ok(value) | Err(Interruption::Return(value)) => Ok(value),
            Err(Interruption::Error(error)) => Err(error),
        }
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new(ContextOptions::default())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn session() -> Session {
        Session::with_output(ContextOptions::default(), Box::new(std::io::sink()))
    }

    #[test]
    fn test_bindings_persist_between_runs() {
        let mut session = session();
        let inputs = vec![
            ("let a = 5;", "null"),
            ("let double = fn(x) { x * 2 };", "null"),
            ("double(a)", "10"),
            ("a = a + 1; a", "6"),
            ("macro twice(x) { quote(unquote(x) + unquote(x)) }", "null"),
            ("twice(a)", "12"),
        ];

        for (input, expected) in inputs {
            let result = session.run(input).map(|object| object.to_string());
            assert_eq!(result, Ok(expected.to_owned()), "input: {}", input);
        }
        assert_eq!(session.environment().get("twice"), None);
    }

    #[test]
    fn test_run_errors() {
        let mut session = session();

        let Err(RunError::Parse(errors)) = session.run("let = 1;") else {
            panic!("expected parse errors");
        };
        assert!(!errors.is_empty());

        assert_eq!(
            session.run("1 + true"),
            Err(RunError::Evaluation(EvaluationError::TypeMismatch {
                left: crate::object::ObjectType::Number,
                operator: "+",
                right: crate::object::ObjectType::Boolean,
            }))
        );

        assert_eq!(
            session
                .run("macro bad() { 1 }; bad()")
                .map_err(|error| error.to_string()),
            Err("macro `bad` must return a quote, got NUMBER".to_owned())
        );
    }

    #[test]
    fn test_parse_error_message() {
        let error = RunError::Parse(vec![
            ParseError::NoPrefixFunction(macaque_core::lexer::Token::synthesized(
                macaque_core::lexer::TokenKind::Assign,
                "=",
            )),
        ]);

        assert_eq!(
            error.to_string(),
            "parser errors:\n\tno prefix parse function defined for ASSIGN\n"
        );
    }
}
