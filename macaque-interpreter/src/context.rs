use std::io::Write;
use std::rc::Rc;

use rustc_hash::FxHashMap;

use crate::builtins;
use crate::object::{EvaluationError, Object};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContextOptions {
    /// Nested user function calls allowed before evaluation fails.
    pub max_call_depth: usize,
    /// Largest length an array may grow to through subscript assignment.
    pub max_array_length: usize,
}

impl Default for ContextOptions {
    fn default() -> Self {
        ContextOptions {
            max_call_depth: 2048,
            max_array_length: 1 << 24,
        }
    }
}

/// Interpreter state that is not part of any scope: the built-in registry,
/// the quoting flag, where `puts` writes to and the call depth.
pub struct Context {
    builtins: FxHashMap<&'static str, Rc<Object>>,
    pub(crate) quoting: bool,
    output: Box<dyn Write>,
    depth: usize,
    options: ContextOptions,
}

impl Context {
    pub fn new(options: ContextOptions) -> Self {
        Self::with_output(options, Box::new(std::io::stdout()))
    }

    pub fn with_output(options: ContextOptions, output: Box<dyn Write>) -> Self {
        let builtins = builtins::all()
            .into_iter()
            .map(|builtin| (builtin.name, Rc::new(Object::Builtin(builtin))))
            .collect();
        Context {
            builtins,
            quoting: false,
            output,
            depth: 0,
            options,
        }
    }

    pub fn builtin(&self, name: &str) -> Option<Rc<Object>> {
        self.builtins.get(name).cloned()
    }

    pub fn options(&self) -> &ContextOptions {
        &self.options
    }

    pub fn is_quoting(&self) -> bool {
        self.quoting
    }

    pub(crate) fn output(&mut self) -> &mut dyn Write {
        self.output.as_mut()
    }

    pub(crate) fn enter_call(&mut self) -> Result<(), EvaluationError> {
        if self.depth >= self.options.max_call_depth {
            return Err(EvaluationError::CallDepthExceeded(
                self.options.max_call_depth,
            ));
        }
        self.depth += 1;
        Ok(())
    }

    pub(crate) fn exit_call(&mut self) {
        self.depth -= 1;
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new(ContextOptions::default())
    }
}
